// Backend of a pointer-driven color inspector: everything the host needs to render a
// tooltip for one color, computed in a single call.

use crate::core_modules::color::color::{CanonicalColorKey, Color, ColorParseError, parse_color};
use crate::core_modules::color_space::color_space::{
    Hsl, Lab, Luminance, relative_luminance, rgb_to_hsl, rgb_to_lab,
};
use crate::core_modules::simulation::simulation::{SimulationPreview, Simulator, preview};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorInspection {
    pub color: Color,
    pub key: CanonicalColorKey,
    pub hex: String,
    pub hsl: Hsl,
    pub lab: Lab,
    pub luminance: Luminance,
    pub preview: SimulationPreview,
}

pub fn inspect<S: Simulator + ?Sized>(
    input: &str,
    simulator: &S,
) -> Result<ColorInspection, ColorParseError> {
    let color = parse_color(input)?;
    Ok(inspect_color(color, simulator))
}

pub fn inspect_color<S: Simulator + ?Sized>(color: Color, simulator: &S) -> ColorInspection {
    ColorInspection {
        color,
        key: color.key(),
        hex: color.to_hex(),
        hsl: rgb_to_hsl(color),
        lab: rgb_to_lab(color),
        luminance: relative_luminance(color),
        preview: preview(simulator, color),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::simulation::simulation::BrettelSimulator;

    #[test]
    fn inspects_a_css_color() {
        let info = inspect("rgb(255, 0, 0)", &BrettelSimulator).unwrap();
        assert_eq!(info.hex, "#ff0000");
        assert_eq!(info.key, "rgb(255,0,0)");
        assert_eq!(info.hsl.l, 50.0);
        assert!((info.luminance - 0.2126).abs() < 1e-6);
        assert_eq!(info.preview.deuteranopia, Color::new(159, 179, 0));
    }

    #[test]
    fn rejects_keywords() {
        assert!(inspect("transparent", &BrettelSimulator).is_err());
    }
}
