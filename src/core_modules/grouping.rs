// THEORY:
// The `grouping` module turns a flat snapshot of (subject, color string) samples into the
// table every later stage works on: one `ColorGroup` per distinct canonical color, with
// the subjects that use it in first-seen order.
//
// Key architectural principles:
// 1.  **Opaque Subjects**: A subject handle `H` is whatever the caller uses to find the
//     thing it colored (an element id, a pixel index, a pointer-sized token). The engine
//     only clones, hashes and compares it.
// 2.  **One Group per Subject**: Within one pass a subject belongs to exactly one group.
//     Once a handle has produced a parsed color, any later sample for it is ignored.
//     A sample that fails to parse does not claim the handle.
// 3.  **Achromatic Filter**: Near-black, near-white and grey colors are dropped before
//     grouping. They carry little hue information and recoloring them would alter the
//     page's neutrals.
// 4.  **Rebuilt, not Updated**: A table is a pure function of its input. There is no
//     incremental path; callers re-run grouping on a fresh snapshot.

use crate::config::FilterConfig;
use crate::core_modules::color::color::{CanonicalColorKey, Color, parse_color};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use tracing::debug;

/// One colored subject as reported by the host surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSample<H> {
    pub subject: H,
    pub color: String,
}

impl<H> ColorSample<H> {
    pub fn new(subject: H, color: impl Into<String>) -> Self {
        Self {
            subject,
            color: color.into(),
        }
    }
}

/// True if the color is near-black, near-white or too grey to matter.
pub fn is_achromatic(color: Color, filter: &FilterConfig) -> bool {
    color.max_channel() < filter.near_black_max
        || color.min_channel() > filter.near_white_min
        || color.spread() < filter.min_spread
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorGroup<H> {
    pub key: CanonicalColorKey,
    pub original_rgb: Color,
    pub members: Vec<H>,
}

/// Counters from one grouping pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupingStats {
    pub samples: usize,
    pub grouped: usize,
    pub unparsed: usize,
    pub filtered: usize,
    pub duplicate_subjects: usize,
}

#[derive(Debug, Clone)]
pub struct GroupTable<H> {
    groups: Vec<ColorGroup<H>>,
    index: HashMap<CanonicalColorKey, usize>,
    stats: GroupingStats,
}

impl<H> Default for GroupTable<H> {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            index: HashMap::new(),
            stats: GroupingStats::default(),
        }
    }
}

impl<H: Clone + Eq + Hash> GroupTable<H> {
    /// Parse, filter and group a snapshot of samples.
    pub fn build(samples: &[ColorSample<H>], filter: &FilterConfig) -> Self {
        let mut unparsed = 0;
        let parsed = samples.iter().filter_map(|sample| match parse_color(&sample.color) {
            Ok(color) => Some((sample.subject.clone(), color)),
            Err(_) => {
                unparsed += 1;
                None
            }
        });
        let mut table = Self::assemble(parsed, filter);
        table.stats.samples += unparsed;
        table.stats.unparsed = unparsed;

        debug!(
            samples = table.stats.samples,
            unparsed = table.stats.unparsed,
            filtered = table.stats.filtered,
            duplicates = table.stats.duplicate_subjects,
            groups = table.groups.len(),
            "grouped color samples"
        );
        table
    }

    /// Group colors that are already parsed (image pixels, registries).
    pub fn from_parsed(colors: impl IntoIterator<Item = (H, Color)>, filter: &FilterConfig) -> Self {
        Self::assemble(colors, filter)
    }

    fn assemble(colors: impl IntoIterator<Item = (H, Color)>, filter: &FilterConfig) -> Self {
        let mut table = Self::default();
        let mut seen: HashSet<H> = HashSet::new();

        for (subject, color) in colors {
            table.stats.samples += 1;
            if !seen.insert(subject.clone()) {
                table.stats.duplicate_subjects += 1;
                continue;
            }
            if is_achromatic(color, filter) {
                table.stats.filtered += 1;
                continue;
            }
            table.push(subject, color);
        }
        table
    }

    fn push(&mut self, subject: H, color: Color) {
        let key = color.key();
        self.stats.grouped += 1;
        match self.index.get(&key) {
            Some(&slot) => self.groups[slot].members.push(subject),
            None => {
                self.index.insert(key.clone(), self.groups.len());
                self.groups.push(ColorGroup {
                    key,
                    original_rgb: color,
                    members: vec![subject],
                });
            }
        }
    }
}

impl<H> GroupTable<H> {
    pub fn groups(&self) -> &[ColorGroup<H>] {
        &self.groups
    }

    pub fn get(&self, key: &str) -> Option<&ColorGroup<H>> {
        self.index.get(key).map(|&slot| &self.groups[slot])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Original colors in group order.
    pub fn colors(&self) -> Vec<Color> {
        self.groups.iter().map(|g| g.original_rgb).collect()
    }

    /// Sum of members over all groups.
    pub fn total_members(&self) -> usize {
        self.groups.iter().map(|g| g.members.len()).sum()
    }

    pub fn stats(&self) -> GroupingStats {
        self.stats
    }
}
