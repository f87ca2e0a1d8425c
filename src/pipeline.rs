// THEORY:
// The `pipeline` module is the top-level API for the whole engine. It wraps the stack
// (grouping -> conflict detection -> replacement search -> reporting) behind one value,
// `RecolorPipeline`, constructed from a validated `EngineConfig` and an injected
// `Simulator`. There is no global state and no "is the model loaded yet" check: if a
// pipeline exists, it is ready.
//
// Every operation is synchronous and a pure function of its input. Two calls with the
// same samples produce the same groups, conflicts and assignments, and a pipeline can be
// shared across threads (it is `Send + Sync` whenever its simulator is).

use crate::config::EngineConfig;
use crate::core_modules::color::color::{Color, ColorParseError};
use crate::core_modules::conflict_detector::{ConflictRecord, conflict_detector};
use crate::core_modules::grouping::{ColorSample, GroupTable};
use crate::core_modules::inspector::{ColorInspection, inspect};
use crate::core_modules::palette::{PaletteSearch, Replacement};
use crate::core_modules::registry::{ColorChange, SubjectRegistry};
use crate::core_modules::replacement_engine::{ResolveOptions, resolve};
use crate::core_modules::reporter::{generate_report, issue_subjects};
use crate::core_modules::simulation::simulation::{BrettelSimulator, CvdKind, DeficiencyType};
use crate::core_modules::utils::image_helper::image_helper;
use crate::error::Result;
use image::RgbaImage;
use std::hash::Hash;
use tracing::debug;

// Re-export key data structures for the public API.
pub use crate::core_modules::replacement_engine::{FixOutcome, ReplacementAssignment};
pub use crate::core_modules::reporter::{Issue, IssueReport};
pub use crate::core_modules::simulation::simulation::Simulator;

/// Everything one analysis pass produced.
#[derive(Debug, Clone)]
pub struct Analysis<H: Eq + Hash> {
    pub table: GroupTable<H>,
    pub report: IssueReport,
    pub outcome: FixOutcome<H>,
}

/// An analysis applied to a registry: the plan of writes the host should execute.
#[derive(Debug, Clone)]
pub struct RecolorPass<H: Eq + Hash> {
    pub analysis: Analysis<H>,
    pub changes: Vec<ColorChange<H>>,
}

/// The main, top-level struct for the CVD engine.
#[derive(Debug, Clone)]
pub struct RecolorPipeline<S: Simulator = BrettelSimulator> {
    config: EngineConfig,
    kind: CvdKind,
    simulator: S,
}

impl RecolorPipeline<BrettelSimulator> {
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_simulator(config, BrettelSimulator)
    }
}

impl<S: Simulator> RecolorPipeline<S> {
    pub fn with_simulator(config: EngineConfig, simulator: S) -> Result<Self> {
        config.validate()?;
        let kind = config.kind();
        Ok(Self {
            config,
            kind,
            simulator,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The deficiency identifier used by reports and highlighting.
    pub fn kind(&self) -> CvdKind {
        self.kind
    }

    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    pub fn group<H: Clone + Eq + Hash>(&self, samples: &[ColorSample<H>]) -> GroupTable<H> {
        GroupTable::build(samples, &self.config.filter)
    }

    pub fn detect<H>(&self, table: &GroupTable<H>, ty: DeficiencyType) -> Vec<ConflictRecord> {
        conflict_detector::detect_conflicts(table, ty, self.config.threshold, &self.simulator)
    }

    /// Conflicts for every type in `fix_order`, in that order.
    pub fn detect_all<H>(&self, table: &GroupTable<H>) -> Vec<ConflictRecord> {
        self.config
            .fix_order
            .iter()
            .flat_map(|&ty| self.detect(table, ty))
            .collect()
    }

    pub fn find_replacement(&self, target: Color, others: &[Color], ty: DeficiencyType) -> Replacement {
        PaletteSearch::new(&self.config.palette, &self.simulator, self.config.threshold)
            .find_replacement(target, others, ty)
    }

    /// Replacement decisions for one table. Empty when the engine is disabled.
    pub fn fix<H: Clone + Eq + Hash>(&self, table: &GroupTable<H>) -> FixOutcome<H> {
        if !self.config.enabled {
            debug!("engine disabled, skipping fix pass");
            return FixOutcome::default();
        }
        let options = ResolveOptions {
            fix_order: &self.config.fix_order,
            palette: &self.config.palette,
            threshold: self.config.threshold,
            check_replacements_mutually: self.config.check_replacements_mutually,
        };
        resolve(table, &options, &self.simulator)
    }

    pub fn report<H>(&self, table: &GroupTable<H>) -> IssueReport {
        self.report_for(table, self.kind)
    }

    pub fn report_for<H>(&self, table: &GroupTable<H>, kind: CvdKind) -> IssueReport {
        generate_report(table, kind, self.config.threshold, &self.simulator)
    }

    /// Subjects to mark as part of a reported issue. Empty when disabled.
    pub fn highlight<H: Clone>(&self, table: &GroupTable<H>) -> Vec<H> {
        if !self.config.enabled {
            return Vec::new();
        }
        issue_subjects(table, &self.report(table))
    }

    pub fn inspect(&self, color: &str) -> std::result::Result<ColorInspection, ColorParseError> {
        inspect(color, &self.simulator)
    }

    pub fn analyze<H: Clone + Eq + Hash>(&self, samples: &[ColorSample<H>]) -> Analysis<H> {
        let table = self.group(samples);
        self.analyze_table(table)
    }

    pub fn analyze_table<H: Clone + Eq + Hash>(&self, table: GroupTable<H>) -> Analysis<H> {
        let report = self.report(&table);
        let outcome = self.fix(&table);
        Analysis {
            table,
            report,
            outcome,
        }
    }

    /// True if any configured type has at least one conflict.
    pub fn conflicts_detected<H: Clone + Eq + Hash>(&self, samples: &[ColorSample<H>]) -> bool {
        let table = self.group(samples);
        self.config
            .fix_order
            .iter()
            .any(|&ty| !self.detect(&table, ty).is_empty())
    }

    /// Analyze the registry's original colors and apply the result to it.
    pub fn recolor<H: Clone + Eq + Hash>(&self, registry: &mut SubjectRegistry<H>) -> RecolorPass<H> {
        let analysis = self.analyze(&registry.samples());
        let changes = registry.apply(&analysis.outcome.replacements);
        RecolorPass { analysis, changes }
    }

    pub fn analyze_image(&self, image: &RgbaImage) -> Analysis<u32> {
        self.analyze_table(image_helper::image_table(image, &self.config.filter))
    }

    /// Recolored copy of `image` plus the decisions behind it.
    pub fn recolor_image(&self, image: &RgbaImage) -> (RgbaImage, Analysis<u32>) {
        let analysis = self.analyze_image(image);
        let recolored = image_helper::recolor_image(image, &analysis.outcome.color_map());
        (recolored, analysis)
    }

    pub fn simulate_image(&self, image: &RgbaImage, ty: DeficiencyType) -> RgbaImage {
        image_helper::simulate_image(image, ty, &self.simulator)
    }
}
