// THEORY:
// The `ConflictDetector` finds every pair of groups that a viewer with a given
// deficiency cannot tell apart. It is a plain all-pairs scan: each group color is
// simulated once, then every unordered pair (i < j, i outer) is compared by Euclidean
// distance in byte space. A pair is a conflict when that distance is strictly below the
// threshold; a pair exactly at the threshold is still distinguishable.
//
// Key architectural principles:
// 1.  **Group Order Preserved**: Conflicts come out in table order and are never sorted.
//     The replacement engine depends on this order to make repeatable choices.
// 2.  **Stateless Utility**: Like the grouping pass, the detector has no memory. It takes
//     a table for one pass and produces records for that same pass.
// 3.  **Quadratic by Design**: The number of distinct colors on a surface is small, so
//     no spatial index is used.

use crate::core_modules::color::color::{CanonicalColorKey, Color};
use crate::core_modules::color_space::color_space::{RgbDistance, rgb_distance};
use crate::core_modules::grouping::GroupTable;
use crate::core_modules::simulation::simulation::{DeficiencyType, Simulator};
use serde::{Deserialize, Serialize};

/// One indistinguishable pair. `color_b` is the member a fix would replace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRecord {
    pub color_a_key: CanonicalColorKey,
    pub color_b_key: CanonicalColorKey,
    pub color_a: Color,
    pub color_b: Color,
    pub simulated_distance: RgbDistance,
    pub deficiency_type: DeficiencyType,
}

pub mod conflict_detector {
    use super::*; // Make records from parent module available.

    /// All conflicting pairs of `table` under `ty`.
    pub fn detect_conflicts<H, S: Simulator + ?Sized>(
        table: &GroupTable<H>,
        ty: DeficiencyType,
        threshold: f64,
        simulator: &S,
    ) -> Vec<ConflictRecord> {
        let groups = table.groups();
        let simulated: Vec<Color> = groups
            .iter()
            .map(|g| simulator.simulate(g.original_rgb, ty))
            .collect();

        let mut conflicts = Vec::new();
        for i in 0..groups.len() {
            for j in (i + 1)..groups.len() {
                let distance = rgb_distance(simulated[i], simulated[j]);
                if distance < threshold {
                    conflicts.push(ConflictRecord {
                        color_a_key: groups[i].key.clone(),
                        color_b_key: groups[j].key.clone(),
                        color_a: groups[i].original_rgb,
                        color_b: groups[j].original_rgb,
                        simulated_distance: distance,
                        deficiency_type: ty,
                    });
                }
            }
        }
        conflicts
    }
}

#[cfg(test)]
mod tests {
    use super::conflict_detector::detect_conflicts;
    use super::*;
    use crate::config::FilterConfig;
    use crate::core_modules::simulation::simulation::BrettelSimulator;

    struct IdentitySimulator;

    impl Simulator for IdentitySimulator {
        fn simulate(&self, color: Color, _ty: DeficiencyType) -> Color {
            color
        }
    }

    fn table(colors: &[Color]) -> GroupTable<usize> {
        GroupTable::from_parsed(colors.iter().copied().enumerate(), &FilterConfig::default())
    }

    #[test]
    fn threshold_is_exclusive() {
        let at = table(&[Color::new(100, 0, 0), Color::new(135, 0, 0)]);
        assert!(detect_conflicts(&at, DeficiencyType::Protanopia, 35.0, &IdentitySimulator).is_empty());

        let below = table(&[Color::new(100, 0, 0), Color::new(134, 0, 0)]);
        let found = detect_conflicts(&below, DeficiencyType::Protanopia, 35.0, &IdentitySimulator);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].simulated_distance, 34.0);
    }

    #[test]
    fn red_and_lime_do_not_conflict_under_deuteranopia() {
        let t = table(&[Color::new(255, 0, 0), Color::new(0, 255, 0)]);
        assert!(detect_conflicts(&t, DeficiencyType::Deuteranopia, 35.0, &BrettelSimulator).is_empty());
    }

    #[test]
    fn reports_pairs_in_group_order() {
        let colors = [
            Color::new(230, 60, 60),
            Color::new(60, 140, 60),
            Color::new(200, 90, 30),
            Color::new(90, 90, 200),
            Color::new(120, 100, 220),
        ];
        let t = table(&colors);

        let protan = detect_conflicts(&t, DeficiencyType::Protanopia, 35.0, &BrettelSimulator);
        let pairs: Vec<(&str, &str)> = protan
            .iter()
            .map(|c| (c.color_a_key.as_str(), c.color_b_key.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("rgb(230,60,60)", "rgb(200,90,30)"),
                ("rgb(90,90,200)", "rgb(120,100,220)"),
            ]
        );
        assert!((protan[0].simulated_distance - 16.03).abs() < 0.01);
        assert!((protan[1].simulated_distance - 34.73).abs() < 0.01);

        let deutan = detect_conflicts(&t, DeficiencyType::Deuteranopia, 35.0, &BrettelSimulator);
        assert_eq!(deutan.len(), 1);
        assert_eq!(deutan[0].deficiency_type, DeficiencyType::Deuteranopia);
        assert!((deutan[0].simulated_distance - 18.36).abs() < 0.01);

        let tritan = detect_conflicts(&t, DeficiencyType::Tritanopia, 35.0, &BrettelSimulator);
        assert_eq!(tritan.len(), 1);
        assert!((tritan[0].simulated_distance - 27.31).abs() < 0.01);
    }

    #[test]
    fn empty_table_has_no_conflicts() {
        let t: GroupTable<usize> = table(&[]);
        for ty in DeficiencyType::ALL {
            assert!(detect_conflicts(&t, ty, 35.0, &BrettelSimulator).is_empty());
        }
    }
}
