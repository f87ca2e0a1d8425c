pub mod color;
pub mod color_space;
pub mod conflict_detector;
pub mod grouping;
pub mod inspector;
pub mod palette;
pub mod registry;
pub mod replacement_engine;
pub mod reporter;
pub mod simulation;
pub mod utils;
