// THEORY:
// This file is the main entry point for the `cvd_recolor` library crate. It defines the
// public API exposed to hosts that want to check a visual surface for color-vision-
// deficiency (CVD) conflicts and recolor it.
//
// The primary interface is `RecolorPipeline` (and its concurrent sibling
// `ParallelPipeline`) together with `EngineConfig`. The building blocks live in
// `core_modules` and are public as well, because hosts sometimes need a single piece
// (color parsing, a contrast ratio, one simulation) without running a whole pass.
//
// Layering, leaves first:
//   color -> color_space -> simulation -> grouping -> conflict_detector
//         -> palette -> replacement_engine -> reporter -> pipeline

pub mod config;
pub mod core_modules;
pub mod error;
pub mod logging;
pub mod parallel_pipeline;
pub mod pipeline;

pub use config::{EngineConfig, FilterConfig};
pub use core_modules::color::color::{Color, ColorParseError, parse_color};
pub use core_modules::grouping::{ColorSample, GroupTable};
pub use core_modules::registry::{ColorChange, SubjectRegistry, SubjectUpdate};
pub use core_modules::simulation::simulation::{BrettelSimulator, CvdKind, DeficiencyType};
pub use error::{ConfigError, EngineError};
pub use parallel_pipeline::ParallelPipeline;
pub use pipeline::{Analysis, FixOutcome, IssueReport, RecolorPipeline, Simulator};
