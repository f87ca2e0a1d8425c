use cvd_recolor::core_modules::color::color::Color;
use cvd_recolor::core_modules::color_space::color_space::rgb_distance;
use cvd_recolor::core_modules::palette::ReplacementStrategy;
use cvd_recolor::core_modules::simulation::simulation::simulate;
use cvd_recolor::{
    ColorSample, CvdKind, DeficiencyType, EngineConfig, RecolorPipeline, Simulator, SubjectRegistry,
};

fn samples(list: &[(&'static str, &str)]) -> Vec<ColorSample<&'static str>> {
    list.iter().map(|&(s, c)| ColorSample::new(s, c)).collect()
}

fn engine() -> RecolorPipeline {
    RecolorPipeline::new(EngineConfig::default()).expect("default config is valid")
}

#[test]
fn red_and_green_survive_deuteranopia() {
    let pipeline = engine();
    let table = pipeline.group(&samples(&[("a", "#FF0000"), ("b", "#00FF00")]));

    let red = simulate(Color::new(255, 0, 0), DeficiencyType::Deuteranopia);
    let green = simulate(Color::new(0, 255, 0), DeficiencyType::Deuteranopia);
    assert_eq!(red, Color::new(159, 179, 0));
    assert_eq!(green, Color::new(96, 77, 77));
    assert!((rgb_distance(red, green) - 142.485).abs() < 0.01);

    assert!(pipeline.detect(&table, DeficiencyType::Deuteranopia).is_empty());
    let report = pipeline.report_for(&table, CvdKind::Deuteranopia);
    assert_eq!(report.issue_count, 0);
    assert_eq!(report.total_colors, 2);
}

#[test]
fn near_identical_reds_are_separated() {
    let pipeline = engine();
    let analysis = pipeline.analyze(&samples(&[("keep", "#FF0000"), ("swap", "#EE1100")]));

    let conflicts = pipeline.detect(&analysis.table, DeficiencyType::Deuteranopia);
    assert_eq!(conflicts.len(), 1);
    assert!(conflicts[0].simulated_distance < 35.0);

    let assignment = analysis
        .outcome
        .assignment("rgb(238,17,0)")
        .expect("the second red is replaced");
    assert!(assignment.resolved);
    assert_eq!(assignment.strategy, ReplacementStrategy::Direct { index: 0 });

    for ty in DeficiencyType::ALL {
        let kept = simulate(Color::new(255, 0, 0), ty);
        let replaced = simulate(assignment.replacement_color, ty);
        assert!(rgb_distance(kept, replaced) >= 35.0);
    }
    assert_eq!(analysis.outcome.replacements.get("swap").map(String::as_str), Some("#000000"));
    assert!(!analysis.outcome.replacements.contains_key("keep"));
}

#[test]
fn neutrals_are_ignored() {
    let pipeline = engine();
    let analysis = pipeline.analyze(&samples(&[("ink", "#101010"), ("paper", "#F5F5F5")]));
    assert!(analysis.table.is_empty());
    assert_eq!(analysis.table.stats().filtered, 2);
    for ty in DeficiencyType::ALL {
        assert!(pipeline.detect(&analysis.table, ty).is_empty());
    }
    assert!(analysis.outcome.is_empty());
}

#[test]
fn empty_surface() {
    let pipeline = engine();
    let analysis = pipeline.analyze::<u64>(&[]);
    assert_eq!(analysis.report.total_colors, 0);
    assert_eq!(analysis.report.issue_count, 0);
    assert!(analysis.outcome.replacements.is_empty());
    assert!(analysis.outcome.unresolved().is_empty());
    assert!(pipeline.highlight(&analysis.table).is_empty());
}

#[test]
fn repeated_passes_are_identical() {
    let pipeline = engine();
    let input = samples(&[
        ("h1", "rgb(230,60,60)"),
        ("ok", "rgb(60,140,60)"),
        ("warn", "rgb(200,90,30)"),
        ("info", "#5a5ac8"),
        ("link", "rgb(120, 100, 220)"),
        ("bad", "inherit"),
    ]);
    let first = pipeline.analyze(&input);
    let second = pipeline.analyze(&input);
    assert_eq!(first.report, second.report);
    assert_eq!(first.outcome.assignments, second.outcome.assignments);
    assert_eq!(first.outcome.replacements, second.outcome.replacements);
    assert_eq!(first.outcome.conflicts, second.outcome.conflicts);
}

#[test]
fn greedy_replacements_are_not_checked_against_each_other() {
    let input = samples(&[
        ("h1", "rgb(230,60,60)"),
        ("ok", "rgb(60,140,60)"),
        ("warn", "rgb(200,90,30)"),
        ("info", "rgb(90,90,200)"),
        ("link", "rgb(120,100,220)"),
    ]);

    let greedy = engine().analyze(&input);
    assert_eq!(greedy.outcome.replacements.get("warn"), greedy.outcome.replacements.get("link"));
    assert_eq!(
        greedy.outcome.assignment("rgb(200,90,30)").map(|a| a.triggering_types.clone()),
        Some(DeficiencyType::ALL.to_vec())
    );

    let config = EngineConfig {
        check_replacements_mutually: true,
        ..EngineConfig::default()
    };
    let mutual = RecolorPipeline::new(config).expect("valid").analyze(&input);
    assert_eq!(mutual.outcome.replacements.get("warn").map(String::as_str), Some("#000000"));
    assert_eq!(mutual.outcome.replacements.get("link").map(String::as_str), Some("#e69f00"));
}

struct Identity;

impl Simulator for Identity {
    fn simulate(&self, color: Color, _ty: DeficiencyType) -> Color {
        color
    }
}

#[test]
fn threshold_boundary_with_injected_simulator() {
    let pipeline = RecolorPipeline::with_simulator(EngineConfig::default(), Identity).expect("valid");

    let at = pipeline.analyze(&samples(&[("a", "rgb(100,0,0)"), ("b", "rgb(135,0,0)")]));
    assert!(at.outcome.conflicts.is_empty());

    let below = pipeline.analyze(&samples(&[("a", "rgb(100,0,0)"), ("b", "rgb(134,0,0)")]));
    assert_eq!(below.outcome.conflicts.len(), 3);
    assert_eq!(below.outcome.assignments.len(), 1);
    assert_eq!(
        below.outcome.assignments[0].triggering_types,
        DeficiencyType::ALL.to_vec()
    );
}

#[test]
fn registry_round_trip_restores_the_surface() {
    let pipeline = engine();
    let mut registry = SubjectRegistry::new();
    registry.register(10u32, "#FF0000");
    registry.register(11u32, "#EE1100");
    registry.register(12u32, "#ee1100");

    let pass = pipeline.recolor(&mut registry);
    let mut changed: Vec<u32> = pass.changes.iter().map(|c| c.subject).collect();
    changed.sort_unstable();
    assert_eq!(changed, vec![11, 12]);

    let restored = registry.revert();
    assert_eq!(restored.len(), 2);
    assert!(restored.iter().all(|c| c.from == "#000000"));
    assert!(!registry.is_applied(&11));
}

#[test]
fn config_file_drives_the_pipeline() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("engine.toml");
    std::fs::write(
        &path,
        "deficiency = \"protanomaly\"\nfix_order = [\"tritanopia\"]\n",
    )
    .expect("write config");

    let config = EngineConfig::load(&path).expect("valid file");
    let pipeline = RecolorPipeline::new(config).expect("valid");
    let analysis = pipeline.analyze(&samples(&[("a", "#FF0000"), ("b", "#EE1100")]));
    assert_eq!(analysis.report.deficiency_type, "protanomaly");
    assert!(
        analysis
            .outcome
            .conflicts
            .iter()
            .all(|c| c.deficiency_type == DeficiencyType::Tritanopia)
    );
    assert_eq!(analysis.outcome.assignments[0].triggering_types, vec![DeficiencyType::Tritanopia]);
}
