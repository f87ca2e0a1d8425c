// THEORY:
// The reporter is the diagnostic view of one deficiency type. It does not decide
// anything; it lists every pair of groups that collapses under the chosen type, with
// both the original and the simulated distance, so a designer can see how close the
// pair was before and after.

use crate::core_modules::color_space::color_space::{RgbDistance, rgb_distance};
use crate::core_modules::grouping::GroupTable;
use crate::core_modules::simulation::simulation::{CvdKind, Simulator};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub color1: String,
    pub color2: String,
    pub original_distance: RgbDistance,
    pub cvd_distance: RgbDistance,
    pub affected_elements: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueReport {
    /// |members A| + |members B| summed over every pair of groups, conflicting or not.
    pub total_elements: usize,
    pub total_colors: usize,
    pub issue_count: usize,
    pub deficiency_type: String,
    pub issues: Vec<Issue>,
}

impl IssueReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn has_issues(&self) -> bool {
        self.issue_count > 0
    }
}

pub fn generate_report<H, S: Simulator + ?Sized>(
    table: &GroupTable<H>,
    kind: CvdKind,
    threshold: f64,
    simulator: &S,
) -> IssueReport {
    let ty = kind.base();
    let groups = table.groups();
    let simulated: Vec<_> = groups
        .iter()
        .map(|g| simulator.simulate(g.original_rgb, ty))
        .collect();

    let mut issues = Vec::new();
    let mut total_elements = 0;
    for i in 0..groups.len() {
        for j in (i + 1)..groups.len() {
            let pair_elements = groups[i].members.len() + groups[j].members.len();
            total_elements += pair_elements;

            let cvd_distance = rgb_distance(simulated[i], simulated[j]);
            if cvd_distance < threshold {
                issues.push(Issue {
                    color1: groups[i].original_rgb.to_hex(),
                    color2: groups[j].original_rgb.to_hex(),
                    original_distance: rgb_distance(groups[i].original_rgb, groups[j].original_rgb),
                    cvd_distance,
                    affected_elements: pair_elements,
                });
            }
        }
    }

    IssueReport {
        total_elements,
        total_colors: groups.len(),
        issue_count: issues.len(),
        deficiency_type: kind.id().to_string(),
        issues,
    }
}

/// Subjects of every group named by an issue, each group once, in table order.
pub fn issue_subjects<H: Clone>(table: &GroupTable<H>, report: &IssueReport) -> Vec<H> {
    let flagged: HashSet<&str> = report
        .issues
        .iter()
        .flat_map(|issue| [issue.color1.as_str(), issue.color2.as_str()])
        .collect();

    table
        .groups()
        .iter()
        .filter(|g| flagged.contains(g.original_rgb.to_hex().as_str()))
        .flat_map(|g| g.members.iter().cloned())
        .collect()
}
