// THEORY:
// The `palette` module answers one question: "given a color that collides with another
// under some deficiency, what should it become?" The answer is drawn from a small,
// curated qualitative palette (Okabe–Ito by default) because those colors were chosen
// to stay apart for every common dichromacy.
//
// Key architectural principles:
// 1.  **Ordered Candidates**: The search walks a fixed, deterministic sequence:
//     every palette entry, then the pairwise blends (i < j), then the triple blends
//     (i < j < k, blended as mean(mean(i, j), k)). The first candidate whose simulated
//     color stays at least `threshold` away from every simulated "other" wins. Palette
//     order therefore encodes preference.
// 2.  **Total Answer**: When no candidate passes, the search still returns a color: the
//     non-black palette entry nearest to the *unsimulated* target. The result is
//     marked unresolved so callers can surface it.
// 3.  **Bounded Cost**: For a palette of n entries the search tests at most
//     n + C(n,2) + C(n,3) candidates against the others.

use crate::core_modules::color::color::Color;
use crate::core_modules::color_space::color_space::rgb_distance;
use crate::core_modules::simulation::simulation::{DeficiencyType, Simulator};
use serde::{Deserialize, Serialize};

/// One named reference color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub name: String,
    pub rgb: Color,
}

impl PaletteEntry {
    pub fn new(name: impl Into<String>, rgb: Color) -> Self {
        Self {
            name: name.into(),
            rgb,
        }
    }
}

/// The eight-color Okabe–Ito qualitative palette, in preference order.
pub fn okabe_ito() -> Vec<PaletteEntry> {
    vec![
        PaletteEntry::new("Black", Color::new(0, 0, 0)),
        PaletteEntry::new("Orange", Color::new(230, 159, 0)),
        PaletteEntry::new("SkyBlue", Color::new(86, 180, 233)),
        PaletteEntry::new("BluishGreen", Color::new(0, 158, 115)),
        PaletteEntry::new("Yellow", Color::new(240, 228, 66)),
        PaletteEntry::new("Blue", Color::new(0, 114, 178)),
        PaletteEntry::new("Vermillion", Color::new(213, 94, 0)),
        PaletteEntry::new("ReddishPurple", Color::new(204, 121, 167)),
    ]
}

/// How a replacement color was obtained. Indices point into the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ReplacementStrategy {
    Direct { index: usize },
    PairBlend { first: usize, second: usize },
    TripleBlend { first: usize, second: usize, third: usize },
    /// Nearest non-black entry to the original color. Not checked against the others.
    NearestFallback { index: usize },
    /// The palette has no non-black entry to fall back to; the target is returned as is.
    Unavailable,
}

impl ReplacementStrategy {
    pub fn is_resolved(&self) -> bool {
        matches!(
            self,
            ReplacementStrategy::Direct { .. }
                | ReplacementStrategy::PairBlend { .. }
                | ReplacementStrategy::TripleBlend { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub color: Color,
    pub strategy: ReplacementStrategy,
}

impl Replacement {
    pub fn is_resolved(&self) -> bool {
        self.strategy.is_resolved()
    }
}

/// A configured search over one palette, one simulator and one threshold.
pub struct PaletteSearch<'a, S: Simulator + ?Sized> {
    palette: &'a [PaletteEntry],
    simulator: &'a S,
    threshold: f64,
}

impl<'a, S: Simulator + ?Sized> PaletteSearch<'a, S> {
    pub fn new(palette: &'a [PaletteEntry], simulator: &'a S, threshold: f64) -> Self {
        Self {
            palette,
            simulator,
            threshold,
        }
    }

    /// Every accepted-if-distinct candidate, in search order.
    pub fn candidates(&self) -> impl Iterator<Item = (Color, ReplacementStrategy)> + '_ {
        let p = self.palette;
        let n = p.len();

        let direct = (0..n).map(move |index| (p[index].rgb, ReplacementStrategy::Direct { index }));

        let pairs = (0..n).flat_map(move |first| {
            (first + 1..n).map(move |second| {
                (
                    p[first].rgb.mix(p[second].rgb),
                    ReplacementStrategy::PairBlend { first, second },
                )
            })
        });

        let triples = (0..n).flat_map(move |first| {
            (first + 1..n).flat_map(move |second| {
                (second + 1..n).map(move |third| {
                    (
                        p[first].rgb.mix(p[second].rgb).mix(p[third].rgb),
                        ReplacementStrategy::TripleBlend {
                            first,
                            second,
                            third,
                        },
                    )
                })
            })
        });

        direct.chain(pairs).chain(triples)
    }

    /// Find a stand-in for `target` that stays distinguishable from all of `others`
    /// under `ty`.
    pub fn find_replacement(&self, target: Color, others: &[Color], ty: DeficiencyType) -> Replacement {
        let simulated_others: Vec<Color> = others
            .iter()
            .map(|&other| self.simulator.simulate(other, ty))
            .collect();

        let accepted = self.candidates().find(|(candidate, _)| {
            let simulated = self.simulator.simulate(*candidate, ty);
            simulated_others
                .iter()
                .all(|&other| rgb_distance(simulated, other) >= self.threshold)
        });

        match accepted {
            Some((color, strategy)) => Replacement { color, strategy },
            None => self.nearest_fallback(target),
        }
    }

    fn nearest_fallback(&self, target: Color) -> Replacement {
        let mut best: Option<(usize, f64)> = None;
        for (index, entry) in self.palette.iter().enumerate().skip(1) {
            let distance = rgb_distance(entry.rgb, target);
            // Strict comparison keeps the first minimum.
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((index, distance));
            }
        }

        match best {
            Some((index, _)) => Replacement {
                color: self.palette[index].rgb,
                strategy: ReplacementStrategy::NearestFallback { index },
            },
            None => Replacement {
                color: target,
                strategy: ReplacementStrategy::Unavailable,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::simulation::simulation::BrettelSimulator;

    const RED: Color = Color::new(255, 0, 0);

    fn palette_colors(palette: &[PaletteEntry]) -> Vec<Color> {
        palette.iter().map(|e| e.rgb).collect()
    }

    #[test]
    fn okabe_ito_order() {
        let palette = okabe_ito();
        assert_eq!(palette.len(), 8);
        assert_eq!(palette[0].name, "Black");
        assert_eq!(palette[1].rgb, Color::new(230, 159, 0));
        assert_eq!(palette[7].name, "ReddishPurple");
    }

    #[test]
    fn candidate_counts() {
        let palette = okabe_ito();
        let search = PaletteSearch::new(&palette, &BrettelSimulator, 35.0);
        let all: Vec<_> = search.candidates().collect();
        assert_eq!(all.len(), 8 + 28 + 56);
        assert_eq!(all[8].1, ReplacementStrategy::PairBlend { first: 0, second: 1 });
        assert_eq!(
            all[36].1,
            ReplacementStrategy::TripleBlend { first: 0, second: 1, third: 2 }
        );
        assert_eq!(all[91].1, ReplacementStrategy::TripleBlend { first: 5, second: 6, third: 7 });
    }

    #[test]
    fn first_palette_entry_wins_when_nothing_else_is_present() {
        let palette = okabe_ito();
        let search = PaletteSearch::new(&palette, &BrettelSimulator, 35.0);
        let r = search.find_replacement(RED, &[RED], DeficiencyType::Deuteranopia);
        assert_eq!(r.color, Color::new(0, 0, 0));
        assert_eq!(r.strategy, ReplacementStrategy::Direct { index: 0 });
        assert!(r.is_resolved());
    }

    #[test]
    fn falls_through_to_pair_blends() {
        let palette = okabe_ito();
        let others = palette_colors(&palette);
        let search = PaletteSearch::new(&palette, &BrettelSimulator, 35.0);
        for ty in DeficiencyType::ALL {
            let r = search.find_replacement(RED, &others, ty);
            assert_eq!(r.strategy, ReplacementStrategy::PairBlend { first: 0, second: 1 });
            assert_eq!(r.color, Color::new(115, 80, 0));
        }
    }

    #[test]
    fn falls_through_to_triple_blends() {
        let palette = okabe_ito();
        let search = PaletteSearch::new(&palette, &BrettelSimulator, 35.0);
        let mut others = palette_colors(&palette);
        others.extend(
            search
                .candidates()
                .filter(|(_, s)| matches!(s, ReplacementStrategy::PairBlend { .. }))
                .map(|(c, _)| c),
        );
        assert_eq!(others.len(), 36);
        for ty in DeficiencyType::ALL {
            let r = search.find_replacement(RED, &others, ty);
            assert_eq!(
                r.strategy,
                ReplacementStrategy::TripleBlend { first: 0, second: 1, third: 6 }
            );
            assert_eq!(r.color, Color::new(164, 87, 0));
        }
    }

    #[test]
    fn dense_surface_forces_unresolved_fallback() {
        let palette = okabe_ito();
        let search = PaletteSearch::new(&palette, &BrettelSimulator, 35.0);
        let mut others = Vec::new();
        for r in (0..=255u8).step_by(24) {
            for g in (0..=255u8).step_by(24) {
                for b in (0..=255u8).step_by(24) {
                    others.push(Color::new(r, g, b));
                }
            }
        }
        let target = Color::new(200, 30, 30);
        for ty in DeficiencyType::ALL {
            let r = search.find_replacement(target, &others, ty);
            assert_eq!(r.strategy, ReplacementStrategy::NearestFallback { index: 6 });
            assert_eq!(r.color, Color::new(213, 94, 0));
            assert!(!r.is_resolved());
        }
    }

    #[test]
    fn accepted_candidates_clear_the_threshold() {
        let palette = okabe_ito();
        let search = PaletteSearch::new(&palette, &BrettelSimulator, 35.0);
        let others = [Color::new(230, 60, 60), Color::new(60, 140, 60), Color::new(90, 90, 200)];
        for ty in DeficiencyType::ALL {
            let r = search.find_replacement(Color::new(200, 90, 30), &others, ty);
            assert!(r.is_resolved());
            let simulated = BrettelSimulator.simulate(r.color, ty);
            for &other in &others {
                assert!(rgb_distance(simulated, BrettelSimulator.simulate(other, ty)) >= 35.0);
            }
        }
    }

    #[test]
    fn single_entry_palette_has_no_fallback() {
        let palette = vec![PaletteEntry::new("Black", Color::new(0, 0, 0))];
        let search = PaletteSearch::new(&palette, &BrettelSimulator, 35.0);
        let r = search.find_replacement(RED, &[Color::new(0, 0, 0)], DeficiencyType::Protanopia);
        assert_eq!(r.strategy, ReplacementStrategy::Unavailable);
        assert_eq!(r.color, RED);
    }
}
