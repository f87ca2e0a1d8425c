// THEORY (Dichromacy Simulation):
// A dichromat is missing one of the three cone classes. Their perceived color space
// collapses onto a plane, so two colors that differ only along the missing axis look the
// same. We model that collapse with one fixed 3x3 matrix per missing cone, applied
// directly to gamma-encoded sRGB bytes:
//
//     out[i] = clamp(round(Σ_j m[i][j] · c[j]), 0, 255)
//
// Key architectural principles:
// 1.  **Fixed transforms**: The matrices are constants. Severity is a configuration
//     value elsewhere in the engine but has no effect here; anomalous trichromacy
//     (the "-anomaly" identifiers) maps onto the matching dichromat matrix.
// 2.  **Never fails**: An unknown identifier resolves to protanopia with a `warn!`.
// 3.  **Injectable seam**: Everything above this module talks to a `Simulator` trait,
//     so the conflict detector and palette search can be driven by any model.
//
// Every matrix row sums to one, so neutral greys (v, v, v) are fixed points. The
// matrices are not projections: applying a simulation twice can drift a saturated color
// further.

pub mod simulation {
    use crate::core_modules::color::color::Color;
    use crate::core_modules::color_space::color_space::{RgbDistance, rgb_distance};
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::str::FromStr;
    use thiserror::Error;
    use tracing::warn;

    pub type SimulationMatrix = [[f64; 3]; 3];

    pub const PROTANOPIA_MATRIX: SimulationMatrix = [
        [0.56667, 0.43333, 0.0],
        [0.55833, 0.44167, 0.0],
        [0.0, 0.24167, 0.75833],
    ];

    pub const DEUTERANOPIA_MATRIX: SimulationMatrix =
        [[0.625, 0.375, 0.0], [0.7, 0.3, 0.0], [0.0, 0.3, 0.7]];

    pub const TRITANOPIA_MATRIX: SimulationMatrix = [
        [0.95, 0.05, 0.0],
        [0.0, 0.43333, 0.56667],
        [0.0, 0.475, 0.525],
    ];

    pub const IDENTITY_MATRIX: SimulationMatrix =
        [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    #[error("unknown deficiency type `{0}`")]
    pub struct DeficiencyParseError(pub String);

    /// The three dichromacies the engine simulates.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum DeficiencyType {
        #[serde(alias = "protanomaly")]
        Protanopia,
        #[serde(alias = "deuteranomaly")]
        Deuteranopia,
        #[serde(alias = "tritanomaly")]
        Tritanopia,
    }

    impl DeficiencyType {
        pub const ALL: [DeficiencyType; 3] = [
            DeficiencyType::Protanopia,
            DeficiencyType::Deuteranopia,
            DeficiencyType::Tritanopia,
        ];

        pub fn id(&self) -> &'static str {
            match self {
                DeficiencyType::Protanopia => "protanopia",
                DeficiencyType::Deuteranopia => "deuteranopia",
                DeficiencyType::Tritanopia => "tritanopia",
            }
        }

        pub fn matrix(&self) -> &'static SimulationMatrix {
            match self {
                DeficiencyType::Protanopia => &PROTANOPIA_MATRIX,
                DeficiencyType::Deuteranopia => &DEUTERANOPIA_MATRIX,
                DeficiencyType::Tritanopia => &TRITANOPIA_MATRIX,
            }
        }

        /// The cone class that is absent.
        pub fn missing_cone(&self) -> &'static str {
            match self {
                DeficiencyType::Protanopia => "L",
                DeficiencyType::Deuteranopia => "M",
                DeficiencyType::Tritanopia => "S",
            }
        }

        pub fn display_name(&self) -> &'static str {
            CvdKind::from(*self).display_name()
        }
    }

    impl fmt::Display for DeficiencyType {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.id())
        }
    }

    impl FromStr for DeficiencyType {
        type Err = DeficiencyParseError;
        fn from_str(s: &str) -> Result<Self, Self::Err> {
            s.parse::<CvdKind>().map(|kind| kind.base())
        }
    }

    /// Every legal identifier, including the anomalous-trichromacy aliases.
    ///
    /// Kept distinct from `DeficiencyType` so reports can echo back the exact identifier
    /// that was configured.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum CvdKind {
        Protanopia,
        Protanomaly,
        Deuteranopia,
        Deuteranomaly,
        Tritanopia,
        Tritanomaly,
    }

    impl CvdKind {
        pub const ALL: [CvdKind; 6] = [
            CvdKind::Protanopia,
            CvdKind::Protanomaly,
            CvdKind::Deuteranopia,
            CvdKind::Deuteranomaly,
            CvdKind::Tritanopia,
            CvdKind::Tritanomaly,
        ];

        pub fn id(&self) -> &'static str {
            match self {
                CvdKind::Protanopia => "protanopia",
                CvdKind::Protanomaly => "protanomaly",
                CvdKind::Deuteranopia => "deuteranopia",
                CvdKind::Deuteranomaly => "deuteranomaly",
                CvdKind::Tritanopia => "tritanopia",
                CvdKind::Tritanomaly => "tritanomaly",
            }
        }

        pub fn base(&self) -> DeficiencyType {
            match self {
                CvdKind::Protanopia | CvdKind::Protanomaly => DeficiencyType::Protanopia,
                CvdKind::Deuteranopia | CvdKind::Deuteranomaly => DeficiencyType::Deuteranopia,
                CvdKind::Tritanopia | CvdKind::Tritanomaly => DeficiencyType::Tritanopia,
            }
        }

        pub fn display_name(&self) -> &'static str {
            match self {
                CvdKind::Protanopia => "Protanopia (red-blind)",
                CvdKind::Protanomaly => "Protanomaly (red-weak)",
                CvdKind::Deuteranopia => "Deuteranopia (green-blind)",
                CvdKind::Deuteranomaly => "Deuteranomaly (green-weak)",
                CvdKind::Tritanopia => "Tritanopia (blue-yellow blind)",
                CvdKind::Tritanomaly => "Tritanomaly (blue-yellow weak)",
            }
        }
    }

    impl From<DeficiencyType> for CvdKind {
        fn from(ty: DeficiencyType) -> Self {
            match ty {
                DeficiencyType::Protanopia => CvdKind::Protanopia,
                DeficiencyType::Deuteranopia => CvdKind::Deuteranopia,
                DeficiencyType::Tritanopia => CvdKind::Tritanopia,
            }
        }
    }

    impl FromStr for CvdKind {
        type Err = DeficiencyParseError;
        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let wanted = s.trim().to_ascii_lowercase();
            CvdKind::ALL
                .into_iter()
                .find(|kind| kind.id() == wanted)
                .ok_or_else(|| DeficiencyParseError(s.to_string()))
        }
    }

    impl fmt::Display for CvdKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.id())
        }
    }

    /// Lenient identifier lookup: unknown names fall back to protanopia.
    pub fn resolve_kind(identifier: &str) -> CvdKind {
        identifier.parse().unwrap_or_else(|_| {
            warn!(identifier, "unknown deficiency type, falling back to protanopia");
            CvdKind::Protanopia
        })
    }

    pub fn apply_matrix(color: Color, matrix: &SimulationMatrix) -> Color {
        let input = [color.red as f64, color.green as f64, color.blue as f64];
        let row = |m: &[f64; 3]| {
            (m[0] * input[0] + m[1] * input[1] + m[2] * input[2])
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Color::new(row(&matrix[0]), row(&matrix[1]), row(&matrix[2]))
    }

    pub fn simulate(color: Color, ty: DeficiencyType) -> Color {
        apply_matrix(color, ty.matrix())
    }

    pub fn simulate_all(colors: &[Color], ty: DeficiencyType) -> Vec<Color> {
        colors.iter().map(|&c| simulate(c, ty)).collect()
    }

    /// Matrix for a textual identifier; identity when the name is unknown.
    pub fn simulation_matrix(identifier: &str) -> SimulationMatrix {
        identifier
            .parse::<DeficiencyType>()
            .map(|ty| *ty.matrix())
            .unwrap_or(IDENTITY_MATRIX)
    }

    /// The 4x5 `feColorMatrix` value list (row-major, alpha passed through) for
    /// whole-surface simulation filters on the host side.
    pub fn color_matrix_values(ty: DeficiencyType) -> String {
        let m = ty.matrix();
        let mut values: Vec<String> = Vec::with_capacity(20);
        for row in m {
            values.extend(row.iter().map(|v| v.to_string()));
            values.extend(["0".to_string(), "0".to_string()]);
        }
        values.extend(["0", "0", "0", "1", "0"].map(String::from));
        values.join(" ")
    }

    /// Injectable simulation model.
    pub trait Simulator {
        fn simulate(&self, color: Color, ty: DeficiencyType) -> Color;
    }

    /// The fixed-matrix model above.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct BrettelSimulator;

    impl Simulator for BrettelSimulator {
        fn simulate(&self, color: Color, ty: DeficiencyType) -> Color {
            simulate(color, ty)
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Distinguishability {
        pub distinguishable: bool,
        pub distance: RgbDistance,
        pub simulated_a: Color,
        pub simulated_b: Color,
        pub original_distance: RgbDistance,
    }

    pub fn check_distinguishability<S: Simulator + ?Sized>(
        simulator: &S,
        a: Color,
        b: Color,
        ty: DeficiencyType,
        threshold: f64,
    ) -> Distinguishability {
        let simulated_a = simulator.simulate(a, ty);
        let simulated_b = simulator.simulate(b, ty);
        let distance = rgb_distance(simulated_a, simulated_b);
        Distinguishability {
            distinguishable: distance >= threshold,
            distance,
            simulated_a,
            simulated_b,
            original_distance: rgb_distance(a, b),
        }
    }

    /// A pair checked under every base type.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PairAnalysis {
        pub protanopia: Distinguishability,
        pub deuteranopia: Distinguishability,
        pub tritanopia: Distinguishability,
        pub problematic_types: Vec<DeficiencyType>,
    }

    impl PairAnalysis {
        pub fn has_issue(&self) -> bool {
            !self.problematic_types.is_empty()
        }

        pub fn get(&self, ty: DeficiencyType) -> &Distinguishability {
            match ty {
                DeficiencyType::Protanopia => &self.protanopia,
                DeficiencyType::Deuteranopia => &self.deuteranopia,
                DeficiencyType::Tritanopia => &self.tritanopia,
            }
        }
    }

    pub fn analyze_pair<S: Simulator + ?Sized>(
        simulator: &S,
        a: Color,
        b: Color,
        threshold: f64,
    ) -> PairAnalysis {
        let check = |ty| check_distinguishability(simulator, a, b, ty, threshold);
        let protanopia = check(DeficiencyType::Protanopia);
        let deuteranopia = check(DeficiencyType::Deuteranopia);
        let tritanopia = check(DeficiencyType::Tritanopia);
        let problematic_types = [
            (DeficiencyType::Protanopia, &protanopia),
            (DeficiencyType::Deuteranopia, &deuteranopia),
            (DeficiencyType::Tritanopia, &tritanopia),
        ]
        .into_iter()
        .filter(|(_, result)| !result.distinguishable)
        .map(|(ty, _)| ty)
        .collect();

        PairAnalysis {
            protanopia,
            deuteranopia,
            tritanopia,
            problematic_types,
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SimulationPreview {
        pub original: Color,
        pub protanopia: Color,
        pub deuteranopia: Color,
        pub tritanopia: Color,
    }

    pub fn preview<S: Simulator + ?Sized>(simulator: &S, color: Color) -> SimulationPreview {
        SimulationPreview {
            original: color,
            protanopia: simulator.simulate(color, DeficiencyType::Protanopia),
            deuteranopia: simulator.simulate(color, DeficiencyType::Deuteranopia),
            tritanopia: simulator.simulate(color, DeficiencyType::Tritanopia),
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct SupportedType {
        pub id: &'static str,
        pub name: &'static str,
        pub missing_cone: &'static str,
    }

    pub fn supported_types() -> Vec<SupportedType> {
        DeficiencyType::ALL
            .into_iter()
            .map(|ty| SupportedType {
                id: ty.id(),
                name: ty.display_name(),
                missing_cone: ty.missing_cone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::simulation::*;
    use crate::core_modules::color::color::Color;

    const RED: Color = Color::new(255, 0, 0);
    const LIME: Color = Color::new(0, 255, 0);

    #[test]
    fn simulates_primaries_with_exact_matrices() {
        assert_eq!(simulate(RED, DeficiencyType::Protanopia), Color::new(145, 142, 0));
        assert_eq!(simulate(RED, DeficiencyType::Deuteranopia), Color::new(159, 179, 0));
        assert_eq!(simulate(RED, DeficiencyType::Tritanopia), Color::new(242, 0, 0));
        assert_eq!(simulate(LIME, DeficiencyType::Deuteranopia), Color::new(96, 77, 77));
    }

    #[test]
    fn matrix_rows_sum_to_one() {
        for ty in DeficiencyType::ALL {
            for row in ty.matrix() {
                assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn greys_are_fixed_points() {
        for ty in DeficiencyType::ALL {
            for v in 0..=255u8 {
                let grey = Color::new(v, v, v);
                assert_eq!(simulate(grey, ty), grey);
            }
        }
    }

    #[test]
    fn anomaly_identifiers_map_to_base_types() {
        assert_eq!("protanomaly".parse::<DeficiencyType>(), Ok(DeficiencyType::Protanopia));
        assert_eq!("Deuteranomaly".parse::<DeficiencyType>(), Ok(DeficiencyType::Deuteranopia));
        assert_eq!("tritanomaly".parse::<DeficiencyType>(), Ok(DeficiencyType::Tritanopia));
        assert_eq!(CvdKind::Deuteranomaly.base(), DeficiencyType::Deuteranopia);
        assert!("monochromacy".parse::<DeficiencyType>().is_err());
    }

    #[test]
    fn unknown_identifier_falls_back_to_protanopia() {
        assert_eq!(resolve_kind("achromatopsia"), CvdKind::Protanopia);
        assert_eq!(resolve_kind("tritanomaly"), CvdKind::Tritanomaly);
    }

    #[test]
    fn deserializes_aliases() {
        let parsed: Vec<DeficiencyType> =
            serde_json::from_str(r#"["protanopia","deuteranomaly","tritanomaly"]"#)
                .unwrap_or_default();
        assert_eq!(parsed, DeficiencyType::ALL.to_vec());
        let encoded = serde_json::to_string(&DeficiencyType::Tritanopia).unwrap_or_default();
        assert_eq!(encoded, r#""tritanopia""#);
    }

    #[test]
    fn simulation_matrix_is_identity_for_unknown_names() {
        assert_eq!(simulation_matrix("protanomaly"), PROTANOPIA_MATRIX);
        assert_eq!(simulation_matrix("none"), IDENTITY_MATRIX);
        assert_eq!(apply_matrix(RED, &IDENTITY_MATRIX), RED);
    }

    #[test]
    fn color_matrix_values_layout() {
        assert_eq!(
            color_matrix_values(DeficiencyType::Deuteranopia),
            "0.625 0.375 0 0 0 0.7 0.3 0 0 0 0 0.3 0.7 0 0 0 0 0 1 0"
        );
        let values = color_matrix_values(DeficiencyType::Protanopia);
        assert_eq!(values.split(' ').count(), 20);
    }

    #[test]
    fn red_and_green_stay_distinguishable_under_deuteranopia() {
        let result =
            check_distinguishability(&BrettelSimulator, RED, LIME, DeficiencyType::Deuteranopia, 35.0);
        assert!(result.distinguishable);
        assert!((result.distance - 142.485).abs() < 0.01);
        assert_eq!(result.simulated_a, Color::new(159, 179, 0));
        assert_eq!(result.simulated_b, Color::new(96, 77, 77));
    }

    #[test]
    fn analyze_pair_lists_problematic_types() {
        let near_red = Color::new(238, 17, 0);
        let analysis = analyze_pair(&BrettelSimulator, RED, near_red, 35.0);
        assert!(analysis.has_issue());
        assert_eq!(analysis.problematic_types, DeficiencyType::ALL.to_vec());
        assert!(analysis.get(DeficiencyType::Protanopia).distance < 6.0);

        let clean = analyze_pair(&BrettelSimulator, RED, Color::new(0, 0, 255), 35.0);
        assert!(!clean.has_issue());
    }

    #[test]
    fn preview_and_metadata() {
        let p = preview(&BrettelSimulator, RED);
        assert_eq!(p.original, RED);
        assert_eq!(p.tritanopia, Color::new(242, 0, 0));
        let types = supported_types();
        assert_eq!(types.len(), 3);
        assert_eq!(types[1].id, "deuteranopia");
        assert_eq!(types[1].missing_cone, "M");
        assert_eq!(CvdKind::Tritanomaly.display_name(), "Tritanomaly (blue-yellow weak)");
    }
}
