// THEORY (Colorimetry):
// The `color_space` module holds every pure colorimetric transform the engine needs.
// Nothing here knows about groups, samples or deficiency types; each function takes one
// or two colors and returns a number or another color.
//
// Channel forms:
// - gamma-encoded sRGB bytes (0..255): what hosts hand us and what we hand back
// - linear light (0..1): the only space in which mixing light and luminance make sense
// - CIE XYZ (D65, Y in 0..1) and CIE L*a*b*: perceptual comparisons
// - HSL (h in degrees, s and l in percent): human-friendly editing of a color
//
// Distances:
// - `rgb_distance`: Euclidean in 0..255 byte space. This is the metric the conflict
//   detector and the palette search threshold against, on *simulated* colors.
// - `delta_e` (CIE76) and `delta_e00` (CIEDE2000): perceptual metrics, reported for
//   diagnostics and inspection.
//
// Key principles:
// 1) Pure functions only, no allocation on the hot path.
// 2) sRGB -> linear uses a 256-entry `OnceLock` LUT; the inverse clamps to [0,1] and rounds
//    to the nearest byte.
// 3) f64 throughout so that byte -> LAB -> byte round trips are exact.

pub mod color_space {
    use crate::core_modules::color::color::{Channel, Color};
    use serde::{Deserialize, Serialize};
    use std::sync::OnceLock;

    pub type LinearChannel = f64;
    pub type Luminance = f64;
    pub type ContrastRatio = f64;
    pub type DeltaE = f64;
    pub type RgbDistance = f64;
    pub type Hue = f64;
    pub type Saturation = f64;
    pub type Lightness = f64;

    // sRGB transfer function
    const SRGB_DECODE_BREAK: f64 = 0.04045;
    const SRGB_ENCODE_BREAK: f64 = 0.0031308;
    const SRGB_LINEAR_SLOPE: f64 = 12.92;
    const SRGB_GAMMA: f64 = 2.4;
    const SRGB_OFFSET: f64 = 0.055;

    // CIE constants
    const LAB_EPSILON: f64 = 0.008856;
    const LAB_KAPPA: f64 = 903.3;
    const D65_WHITE: [f64; 3] = [0.95047, 1.0, 1.08883];

    const RGB_TO_XYZ: [[f64; 3]; 3] = [
        [0.4124564, 0.3575761, 0.1804375],
        [0.2126729, 0.7151522, 0.0721750],
        [0.0193339, 0.1191920, 0.9503041],
    ];

    const XYZ_TO_RGB: [[f64; 3]; 3] = [
        [3.2404542, -1.5371385, -0.4985314],
        [-0.9692660, 1.8760108, 0.0415560],
        [0.0556434, -0.2040259, 1.0572252],
    ];

    static SRGB_TO_LINEAR_LUT: OnceLock<[LinearChannel; 256]> = OnceLock::new();

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Xyz {
        pub x: f64,
        pub y: f64,
        pub z: f64,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Lab {
        pub l: f64,
        pub a: f64,
        pub b: f64,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Hsl {
        /// Degrees, [0, 360).
        pub h: Hue,
        /// Percent, [0, 100].
        pub s: Saturation,
        /// Percent, [0, 100].
        pub l: Lightness,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum WcagLevel {
        AA,
        AAA,
    }

    #[inline]
    fn decode(normalized: f64) -> LinearChannel {
        if normalized <= SRGB_DECODE_BREAK {
            normalized / SRGB_LINEAR_SLOPE
        } else {
            ((normalized + SRGB_OFFSET) / (1.0 + SRGB_OFFSET)).powf(SRGB_GAMMA)
        }
    }

    /// sRGB byte -> linear light in [0, 1].
    #[inline]
    pub fn linearize(channel: Channel) -> LinearChannel {
        let table = SRGB_TO_LINEAR_LUT.get_or_init(|| {
            let mut table = [0.0f64; 256];
            for (i, slot) in table.iter_mut().enumerate() {
                *slot = decode(i as f64 / 255.0);
            }
            table
        });
        table[channel as usize]
    }

    /// Linear light -> sRGB byte. Out-of-gamut values are clamped first.
    pub fn delinearize(value: LinearChannel) -> Channel {
        let v = value.clamp(0.0, 1.0);
        let encoded = if v <= SRGB_ENCODE_BREAK {
            v * SRGB_LINEAR_SLOPE
        } else {
            (1.0 + SRGB_OFFSET) * v.powf(1.0 / SRGB_GAMMA) - SRGB_OFFSET
        };
        to_channel(encoded * 255.0)
    }

    #[inline]
    fn to_channel(value: f64) -> Channel {
        value.round().clamp(0.0, 255.0) as Channel
    }

    #[inline]
    fn mul3(m: &[[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
        [
            m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
            m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
            m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
        ]
    }

    pub fn rgb_to_xyz(color: Color) -> Xyz {
        let linear = [
            linearize(color.red),
            linearize(color.green),
            linearize(color.blue),
        ];
        let [x, y, z] = mul3(&RGB_TO_XYZ, linear);
        Xyz { x, y, z }
    }

    pub fn xyz_to_rgb(xyz: Xyz) -> Color {
        let [r, g, b] = mul3(&XYZ_TO_RGB, [xyz.x, xyz.y, xyz.z]);
        Color::new(delinearize(r), delinearize(g), delinearize(b))
    }

    #[inline]
    fn lab_f(t: f64) -> f64 {
        if t > LAB_EPSILON {
            t.cbrt()
        } else {
            (LAB_KAPPA * t + 16.0) / 116.0
        }
    }

    pub fn xyz_to_lab(xyz: Xyz) -> Lab {
        let fx = lab_f(xyz.x / D65_WHITE[0]);
        let fy = lab_f(xyz.y / D65_WHITE[1]);
        let fz = lab_f(xyz.z / D65_WHITE[2]);
        Lab {
            l: 116.0 * fy - 16.0,
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }

    pub fn lab_to_xyz(lab: Lab) -> Xyz {
        let fy = (lab.l + 16.0) / 116.0;
        let fx = lab.a / 500.0 + fy;
        let fz = fy - lab.b / 200.0;

        let cube_or_linear = |f: f64| {
            let cube = f * f * f;
            if cube > LAB_EPSILON {
                cube
            } else {
                (116.0 * f - 16.0) / LAB_KAPPA
            }
        };

        let yr = if lab.l > LAB_KAPPA * LAB_EPSILON {
            fy * fy * fy
        } else {
            lab.l / LAB_KAPPA
        };

        Xyz {
            x: cube_or_linear(fx) * D65_WHITE[0],
            y: yr * D65_WHITE[1],
            z: cube_or_linear(fz) * D65_WHITE[2],
        }
    }

    pub fn rgb_to_lab(color: Color) -> Lab {
        xyz_to_lab(rgb_to_xyz(color))
    }

    pub fn lab_to_rgb(lab: Lab) -> Color {
        xyz_to_rgb(lab_to_xyz(lab))
    }

    /// Hue in degrees [0, 360), saturation and lightness in percent.
    pub fn rgb_to_hsl(color: Color) -> Hsl {
        let r = color.red as f64 / 255.0;
        let g = color.green as f64 / 255.0;
        let b = color.blue as f64 / 255.0;

        let maximum_channel = r.max(g).max(b);
        let minimum_channel = r.min(g).min(b);
        let lightness = (maximum_channel + minimum_channel) / 2.0;
        let chroma = maximum_channel - minimum_channel;

        if chroma <= 1e-12 {
            return Hsl {
                h: 0.0,
                s: 0.0,
                l: lightness * 100.0,
            };
        }

        let saturation = if lightness > 0.5 {
            chroma / (2.0 - maximum_channel - minimum_channel)
        } else {
            chroma / (maximum_channel + minimum_channel)
        };

        let sector = if maximum_channel == r {
            (g - b) / chroma + if g < b { 6.0 } else { 0.0 }
        } else if maximum_channel == g {
            (b - r) / chroma + 2.0
        } else {
            (r - g) / chroma + 4.0
        };

        Hsl {
            h: (sector * 60.0).rem_euclid(360.0),
            s: saturation * 100.0,
            l: lightness * 100.0,
        }
    }

    pub fn hsl_to_rgb(hsl: Hsl) -> Color {
        let h = hsl.h.rem_euclid(360.0) / 360.0;
        let s = (hsl.s / 100.0).clamp(0.0, 1.0);
        let l = (hsl.l / 100.0).clamp(0.0, 1.0);

        if s == 0.0 {
            let v = to_channel(l * 255.0);
            return Color::new(v, v, v);
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;

        let hue_to_channel = |t: f64| {
            let t = t.rem_euclid(1.0);
            let v = if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            };
            to_channel(v * 255.0)
        };

        Color::new(
            hue_to_channel(h + 1.0 / 3.0),
            hue_to_channel(h),
            hue_to_channel(h - 1.0 / 3.0),
        )
    }

    /// WCAG relative luminance in [0, 1].
    pub fn relative_luminance(color: Color) -> Luminance {
        0.2126 * linearize(color.red)
            + 0.7152 * linearize(color.green)
            + 0.0722 * linearize(color.blue)
    }

    /// WCAG contrast ratio, symmetric, in [1, 21].
    pub fn contrast_ratio(c1: Color, c2: Color) -> ContrastRatio {
        let l1 = relative_luminance(c1);
        let l2 = relative_luminance(c2);
        (l1.max(l2) + 0.05) / (l1.min(l2) + 0.05)
    }

    /// AA: 4.5 (3.0 for large text). AAA: 7.0 (4.5 for large text).
    pub fn meets_wcag(ratio: ContrastRatio, level: WcagLevel, large_text: bool) -> bool {
        let required = match (level, large_text) {
            (WcagLevel::AA, false) => 4.5,
            (WcagLevel::AA, true) => 3.0,
            (WcagLevel::AAA, false) => 7.0,
            (WcagLevel::AAA, true) => 4.5,
        };
        ratio >= required
    }

    /// CIE76: Euclidean distance in L*a*b*.
    pub fn delta_e(c1: Color, c2: Color) -> DeltaE {
        let a = rgb_to_lab(c1);
        let b = rgb_to_lab(c2);
        ((a.l - b.l).powi(2) + (a.a - b.a).powi(2) + (a.b - b.b).powi(2)).sqrt()
    }

    /// CIEDE2000 between two sRGB colors, kL = kC = kH = 1.
    pub fn delta_e00(c1: Color, c2: Color) -> DeltaE {
        delta_e00_lab(rgb_to_lab(c1), rgb_to_lab(c2))
    }

    /// CIEDE2000 on L*a*b* values directly.
    pub fn delta_e00_lab(lab1: Lab, lab2: Lab) -> DeltaE {
        const POW25_7: f64 = 6_103_515_625.0; // 25^7

        let c1 = lab1.a.hypot(lab1.b);
        let c2 = lab2.a.hypot(lab2.b);
        let c_bar = (c1 + c2) / 2.0;
        let c_bar7 = c_bar.powi(7);
        let g = 0.5 * (1.0 - (c_bar7 / (c_bar7 + POW25_7)).sqrt());

        let a1p = (1.0 + g) * lab1.a;
        let a2p = (1.0 + g) * lab2.a;
        let c1p = a1p.hypot(lab1.b);
        let c2p = a2p.hypot(lab2.b);

        let hue_prime = |b: f64, ap: f64| {
            if b == 0.0 && ap == 0.0 {
                0.0
            } else {
                b.atan2(ap).to_degrees().rem_euclid(360.0)
            }
        };
        let h1p = hue_prime(lab1.b, a1p);
        let h2p = hue_prime(lab2.b, a2p);

        let delta_lp = lab2.l - lab1.l;
        let delta_cp = c2p - c1p;

        let chroma_product = c1p * c2p;
        let delta_hp = if chroma_product == 0.0 {
            0.0
        } else {
            let d = h2p - h1p;
            if d > 180.0 {
                d - 360.0
            } else if d < -180.0 {
                d + 360.0
            } else {
                d
            }
        };
        let delta_big_hp = 2.0 * chroma_product.sqrt() * (delta_hp.to_radians() / 2.0).sin();

        let l_bar_p = (lab1.l + lab2.l) / 2.0;
        let c_bar_p = (c1p + c2p) / 2.0;
        let h_bar_p = if chroma_product == 0.0 {
            h1p + h2p
        } else if (h1p - h2p).abs() <= 180.0 {
            (h1p + h2p) / 2.0
        } else if h1p + h2p < 360.0 {
            (h1p + h2p + 360.0) / 2.0
        } else {
            (h1p + h2p - 360.0) / 2.0
        };

        let t = 1.0 - 0.17 * (h_bar_p - 30.0).to_radians().cos()
            + 0.24 * (2.0 * h_bar_p).to_radians().cos()
            + 0.32 * (3.0 * h_bar_p + 6.0).to_radians().cos()
            - 0.20 * (4.0 * h_bar_p - 63.0).to_radians().cos();

        let delta_theta = 30.0 * (-((h_bar_p - 275.0) / 25.0).powi(2)).exp();
        let c_bar_p7 = c_bar_p.powi(7);
        let r_c = 2.0 * (c_bar_p7 / (c_bar_p7 + POW25_7)).sqrt();
        let l_offset = (l_bar_p - 50.0).powi(2);
        let s_l = 1.0 + 0.015 * l_offset / (20.0 + l_offset).sqrt();
        let s_c = 1.0 + 0.045 * c_bar_p;
        let s_h = 1.0 + 0.015 * c_bar_p * t;
        let r_t = -(2.0 * delta_theta).to_radians().sin() * r_c;

        let lightness_term = delta_lp / s_l;
        let chroma_term = delta_cp / s_c;
        let hue_term = delta_big_hp / s_h;

        (lightness_term.powi(2)
            + chroma_term.powi(2)
            + hue_term.powi(2)
            + r_t * chroma_term * hue_term)
            .max(0.0)
            .sqrt()
    }

    /// Euclidean distance in 0..255 byte space.
    pub fn rgb_distance(c1: Color, c2: Color) -> RgbDistance {
        let dr = c1.red as f64 - c2.red as f64;
        let dg = c1.green as f64 - c2.green as f64;
        let db = c1.blue as f64 - c2.blue as f64;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// Source-over compositing of `fg` at `alpha` onto an opaque `bg`.
    pub fn blend(fg: Color, bg: Color, alpha: f64) -> Color {
        let alpha = alpha.clamp(0.0, 1.0);
        let mix = |f: Channel, b: Channel| to_channel(f as f64 * alpha + b as f64 * (1.0 - alpha));
        Color::new(
            mix(fg.red, bg.red),
            mix(fg.green, bg.green),
            mix(fg.blue, bg.blue),
        )
    }

    /// Shift HSL lightness by `amount` percentage points, clamped to [0, 100].
    pub fn adjust_brightness(color: Color, amount: f64) -> Color {
        let mut hsl = rgb_to_hsl(color);
        hsl.l = (hsl.l + amount).clamp(0.0, 100.0);
        hsl_to_rgb(hsl)
    }

    /// Shift HSL saturation by `amount` percentage points, clamped to [0, 100].
    pub fn adjust_saturation(color: Color, amount: f64) -> Color {
        let mut hsl = rgb_to_hsl(color);
        hsl.s = (hsl.s + amount).clamp(0.0, 100.0);
        hsl_to_rgb(hsl)
    }

    pub fn rotate_hue(color: Color, degrees: f64) -> Color {
        let mut hsl = rgb_to_hsl(color);
        hsl.h = (hsl.h + degrees).rem_euclid(360.0);
        hsl_to_rgb(hsl)
    }

    // =================================Glossary==================================
    // Linear light: channel value proportional to emitted light, before gamma encoding.
    // XYZ: CIE 1931 tristimulus values; Y is luminance.
    // L*a*b*: CIE 1976 perceptual space. L* lightness, a* green-red, b* blue-yellow.
    // ΔE76: straight-line distance in L*a*b*.
    // ΔE00: CIEDE2000, corrects ΔE76 for hue, chroma and lightness non-uniformities.
    // Relative luminance: WCAG weighting of linear channels (0.2126, 0.7152, 0.0722).
}

#[cfg(test)]
mod tests {
    use super::color_space::*;
    use crate::core_modules::color::color::Color;

    const WHITE: Color = Color::new(255, 255, 255);
    const BLACK: Color = Color::new(0, 0, 0);
    const RED: Color = Color::new(255, 0, 0);

    fn grid(step: usize) -> Vec<Color> {
        let mut out = Vec::new();
        for r in (0..=255u8).step_by(step) {
            for g in (0..=255u8).step_by(step) {
                for b in (0..=255u8).step_by(step) {
                    out.push(Color::new(r, g, b));
                }
            }
        }
        out
    }

    #[test]
    fn linearize_endpoints_and_round_trip() {
        assert_eq!(linearize(0), 0.0);
        assert!((linearize(255) - 1.0).abs() < 1e-12);
        assert!((linearize(10) - 10.0 / 255.0 / 12.92).abs() < 1e-12);
        for v in 0..=255u8 {
            assert_eq!(delinearize(linearize(v)), v);
        }
        assert_eq!(delinearize(-0.2), 0);
        assert_eq!(delinearize(1.7), 255);
    }

    #[test]
    fn lab_reference_values() {
        let white = rgb_to_lab(WHITE);
        assert!((white.l - 100.0).abs() < 0.01);
        assert!(white.a.abs() < 0.01 && white.b.abs() < 0.01);

        let black = rgb_to_lab(BLACK);
        assert!(black.l.abs() < 1e-9);

        let red = rgb_to_lab(RED);
        assert!((red.l - 53.24).abs() < 0.05);
        assert!((red.a - 80.09).abs() < 0.05);
        assert!((red.b - 67.20).abs() < 0.05);
    }

    #[test]
    fn lab_inverse_recovers_palette_colors() {
        for color in [Color::new(0, 114, 178), Color::new(230, 159, 0), Color::new(204, 121, 167)] {
            assert_eq!(lab_to_rgb(rgb_to_lab(color)), color);
            assert_eq!(xyz_to_rgb(rgb_to_xyz(color)), color);
        }
        let y = rgb_to_xyz(WHITE).y;
        assert!((y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn hsl_reference_values() {
        let red = rgb_to_hsl(RED);
        assert_eq!((red.h, red.s, red.l), (0.0, 100.0, 50.0));
        let blue = rgb_to_hsl(Color::new(0, 0, 255));
        assert!((blue.h - 240.0).abs() < 1e-9);
        let grey = rgb_to_hsl(Color::new(128, 128, 128));
        assert_eq!((grey.h, grey.s), (0.0, 0.0));
        assert_eq!(hsl_to_rgb(Hsl { h: 120.0, s: 100.0, l: 25.0 }), Color::new(0, 128, 0));
        assert_eq!(hsl_to_rgb(rgb_to_hsl(Color::new(86, 180, 233))), Color::new(86, 180, 233));
    }

    #[test]
    fn hsl_editing_helpers() {
        assert_eq!(adjust_brightness(RED, -25.0), Color::new(128, 0, 0));
        assert_eq!(adjust_brightness(RED, 100.0), WHITE);
        assert_eq!(adjust_saturation(RED, -100.0), Color::new(128, 128, 128));
        assert_eq!(rotate_hue(RED, 120.0), Color::new(0, 255, 0));
        assert_eq!(rotate_hue(RED, -120.0), Color::new(0, 0, 255));
        assert_eq!(rotate_hue(RED, 720.0), RED);
    }

    #[test]
    fn contrast_ratio_bounds_and_symmetry() {
        assert!((contrast_ratio(BLACK, WHITE) - 21.0).abs() < 1e-9);
        assert_eq!(contrast_ratio(RED, RED), 1.0);
        let colors = grid(51);
        for &a in &colors {
            for &b in &colors {
                let ratio = contrast_ratio(a, b);
                assert!((1.0..=21.0 + 1e-9).contains(&ratio));
                assert_eq!(ratio, contrast_ratio(b, a));
            }
        }
    }

    #[test]
    fn wcag_levels() {
        let ratio = contrast_ratio(RED, WHITE);
        assert!((ratio - 4.0).abs() < 0.01);
        assert!(!meets_wcag(ratio, WcagLevel::AA, false));
        assert!(meets_wcag(ratio, WcagLevel::AA, true));
        assert!(!meets_wcag(ratio, WcagLevel::AAA, true));
        assert!(meets_wcag(21.0, WcagLevel::AAA, false));
    }

    #[test]
    fn ciede2000_reference_pairs() {
        let cases = [
            ((50.0, 2.6772, -79.7751), (50.0, 0.0, -82.7485), 2.0425),
            ((50.0, 0.0, 0.0), (50.0, -1.0, 2.0), 2.3669),
            ((50.0, 2.5, 0.0), (73.0, 25.0, -18.0), 27.1492),
        ];
        for ((l1, a1, b1), (l2, a2, b2), expected) in cases {
            let lab1 = Lab { l: l1, a: a1, b: b1 };
            let lab2 = Lab { l: l2, a: a2, b: b2 };
            assert!((delta_e00_lab(lab1, lab2) - expected).abs() < 1e-4);
            assert!((delta_e00_lab(lab2, lab1) - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn distances_are_zero_on_identity_and_symmetric() {
        let colors = grid(64);
        for &a in &colors {
            assert_eq!(delta_e00(a, a), 0.0);
            assert_eq!(delta_e(a, a), 0.0);
            assert_eq!(rgb_distance(a, a), 0.0);
            for &b in &colors {
                assert!((delta_e00(a, b) - delta_e00(b, a)).abs() < 1e-9);
                assert_eq!(delta_e(a, b), delta_e(b, a));
                assert_eq!(rgb_distance(a, b), rgb_distance(b, a));
            }
        }
    }

    #[test]
    fn rgb_distance_is_euclidean() {
        assert_eq!(rgb_distance(Color::new(0, 0, 0), Color::new(3, 4, 0)), 5.0);
        assert_eq!(rgb_distance(Color::new(100, 0, 0), Color::new(135, 0, 0)), 35.0);
    }

    #[test]
    fn blend_composites_over_background() {
        let purple = blend(RED, Color::new(0, 0, 255), 0.5);
        assert_eq!(purple, Color::new(128, 0, 128));
        assert_eq!(blend(RED, WHITE, 1.0), RED);
        assert_eq!(blend(RED, WHITE, 0.0), WHITE);
        assert_eq!(blend(RED, WHITE, 4.0), RED);
    }
}
