// THEORY:
// The `replacement_engine` turns conflicts into decisions. It walks the configured
// deficiency types in order, detects conflicts for each, and for every conflicting pair
// (A, B) keeps A and replaces B with a palette search result.
//
// The resolution is greedy and single-pass:
// - The "others" a replacement must stay away from are the original colors of every
//   group except B and except groups already flagged for replacement in this pass.
// - A group is flagged at most once. A later conflict that names an already-flagged B,
//   under the same type or another, reuses the existing decision and records the new
//   type as an additional trigger.
// - Replacements are not compared against each other, so two replacements may end up
//   identical or mutually confusable. `check_replacements_mutually` adds the colors
//   already chosen to the "others" set and closes that gap.
//
// The output maps every member subject of a replaced group to the replacement's
// lowercase hex string, ready for the caller's color sinks.

use crate::core_modules::color::color::{CanonicalColorKey, Color};
use crate::core_modules::conflict_detector::{ConflictRecord, conflict_detector};
use crate::core_modules::grouping::GroupTable;
use crate::core_modules::palette::{PaletteEntry, PaletteSearch, ReplacementStrategy};
use crate::core_modules::simulation::simulation::{DeficiencyType, Simulator};
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::{info, warn};

/// Inputs of one resolution pass.
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions<'a> {
    pub fix_order: &'a [DeficiencyType],
    pub palette: &'a [PaletteEntry],
    pub threshold: f64,
    pub check_replacements_mutually: bool,
}

/// The decision for one replaced group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementAssignment {
    pub original_key: CanonicalColorKey,
    pub original_color: Color,
    pub replacement_color: Color,
    pub strategy: ReplacementStrategy,
    /// Types whose conflicts named this group, in first-trigger order, no repeats.
    pub triggering_types: Vec<DeficiencyType>,
    pub resolved: bool,
}

impl ReplacementAssignment {
    pub fn replacement_hex(&self) -> String {
        self.replacement_color.to_hex()
    }
}

/// Assignments in decision order, indexed by the replaced group's key.
#[derive(Debug, Clone, Default)]
pub struct AssignmentMap {
    entries: Vec<ReplacementAssignment>,
    index: HashMap<CanonicalColorKey, usize>,
}

impl AssignmentMap {
    pub fn get(&self, key: &str) -> Option<&ReplacementAssignment> {
        self.index.get(key).map(|&slot| &self.entries[slot])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReplacementAssignment> {
        self.entries.iter()
    }

    fn insert(&mut self, assignment: ReplacementAssignment) {
        self.index
            .insert(assignment.original_key.clone(), self.entries.len());
        self.entries.push(assignment);
    }

    /// Returns false when `key` has no assignment yet.
    fn add_trigger(&mut self, key: &str, ty: DeficiencyType) -> bool {
        match self.index.get(key) {
            Some(&slot) => {
                let triggers = &mut self.entries[slot].triggering_types;
                if !triggers.contains(&ty) {
                    triggers.push(ty);
                }
                true
            }
            None => false,
        }
    }

    pub fn into_vec(self) -> Vec<ReplacementAssignment> {
        self.entries
    }
}

/// Everything one fix pass decided.
#[derive(Debug, Clone, Serialize)]
pub struct FixOutcome<H: Eq + Hash> {
    pub assignments: Vec<ReplacementAssignment>,
    /// Subject -> `#rrggbb` for every member of a replaced group.
    pub replacements: HashMap<H, String>,
    /// Every conflict seen, grouped by type in `fix_order`.
    pub conflicts: Vec<ConflictRecord>,
}

impl<H: Eq + Hash> Default for FixOutcome<H> {
    fn default() -> Self {
        Self {
            assignments: Vec::new(),
            replacements: HashMap::new(),
            conflicts: Vec::new(),
        }
    }
}

impl<H: Eq + Hash> FixOutcome<H> {
    /// Assignments that fell back to the nearest palette entry.
    pub fn unresolved(&self) -> Vec<&ReplacementAssignment> {
        self.assignments.iter().filter(|a| !a.resolved).collect()
    }

    pub fn assignment(&self, key: &str) -> Option<&ReplacementAssignment> {
        self.assignments.iter().find(|a| a.original_key == key)
    }

    /// Original color -> replacement color.
    pub fn color_map(&self) -> HashMap<Color, Color> {
        self.assignments
            .iter()
            .map(|a| (a.original_color, a.replacement_color))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Run the greedy multi-type resolution over one group table.
pub fn resolve<H, S>(table: &GroupTable<H>, options: &ResolveOptions<'_>, simulator: &S) -> FixOutcome<H>
where
    H: Clone + Eq + Hash,
    S: Simulator + ?Sized,
{
    let search = PaletteSearch::new(options.palette, simulator, options.threshold);
    let mut assignments = AssignmentMap::default();
    let mut all_conflicts = Vec::new();

    for &ty in options.fix_order {
        let conflicts = conflict_detector::detect_conflicts(table, ty, options.threshold, simulator);
        info!(deficiency = %ty, conflicts = conflicts.len(), "conflict scan finished");

        for conflict in &conflicts {
            warn!(
                deficiency = %ty,
                key_a = %conflict.color_a_key,
                key_b = %conflict.color_b_key,
                distance = conflict.simulated_distance,
                "indistinguishable color pair"
            );

            if assignments.add_trigger(&conflict.color_b_key, ty) {
                continue;
            }

            let mut others: Vec<Color> = table
                .groups()
                .iter()
                .filter(|g| g.key != conflict.color_b_key && !assignments.contains(&g.key))
                .map(|g| g.original_rgb)
                .collect();
            if options.check_replacements_mutually {
                others.extend(assignments.iter().map(|a| a.replacement_color));
            }

            let replacement = search.find_replacement(conflict.color_b, &others, ty);
            if replacement.is_resolved() {
                info!(
                    key = %conflict.color_b_key,
                    replacement = %replacement.color,
                    strategy = ?replacement.strategy,
                    "replacement chosen"
                );
            } else {
                warn!(
                    key = %conflict.color_b_key,
                    replacement = %replacement.color,
                    strategy = ?replacement.strategy,
                    "no distinguishable replacement, using nearest palette entry"
                );
            }

            assignments.insert(ReplacementAssignment {
                original_key: conflict.color_b_key.clone(),
                original_color: conflict.color_b,
                replacement_color: replacement.color,
                strategy: replacement.strategy,
                triggering_types: vec![ty],
                resolved: replacement.is_resolved(),
            });
        }

        all_conflicts.extend(conflicts);
    }

    let mut replacements = HashMap::new();
    for assignment in assignments.iter() {
        if let Some(group) = table.get(&assignment.original_key) {
            let hex = assignment.replacement_hex();
            for member in &group.members {
                replacements.insert(member.clone(), hex.clone());
            }
        }
    }

    FixOutcome {
        assignments: assignments.into_vec(),
        replacements,
        conflicts: all_conflicts,
    }
}
