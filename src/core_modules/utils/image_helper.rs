// Raster surfaces: an RGBA image is just another host whose subjects are pixels.
// Transparent pixels carry no visible color and are skipped by every analysis here;
// alpha always passes through untouched.

pub mod image_helper {
    use crate::config::FilterConfig;
    use crate::core_modules::color::color::Color;
    use crate::core_modules::grouping::GroupTable;
    use crate::core_modules::simulation::simulation::{DeficiencyType, Simulator};
    use image::{ImageEncoder, ImageError, Rgba, RgbaImage};
    use std::collections::{HashMap, HashSet};
    use std::path::Path;

    pub const CHANNELS: usize = 4;

    /// Write a raw RGBA8 buffer as PNG.
    pub fn save(path: impl AsRef<Path>, width: u32, height: u32, buffer: &[u8]) -> Result<(), ImageError> {
        let output = std::fs::File::create(path)?;
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(buffer, width, height, image::ExtendedColorType::Rgba8)?;

        Ok(())
    }

    pub fn save_png(path: impl AsRef<Path>, image: &RgbaImage) -> Result<(), ImageError> {
        save(path, image.width(), image.height(), image.as_raw())
    }

    pub fn load_rgba(path: impl AsRef<Path>) -> Result<RgbaImage, ImageError> {
        Ok(image::open(path)?.to_rgba8())
    }

    #[inline]
    fn pixel_color(pixel: &Rgba<u8>) -> Option<Color> {
        let [r, g, b, a] = pixel.0;
        (a != 0).then_some(Color::new(r, g, b))
    }

    /// Simulate a raw RGBA8 buffer in place.
    pub fn simulate_pixels<S: Simulator + ?Sized>(buffer: &mut [u8], ty: DeficiencyType, simulator: &S) {
        for px in buffer.chunks_exact_mut(CHANNELS) {
            let simulated = simulator.simulate(Color::new(px[0], px[1], px[2]), ty);
            px[0] = simulated.red;
            px[1] = simulated.green;
            px[2] = simulated.blue;
        }
    }

    pub fn simulate_image<S: Simulator + ?Sized>(image: &RgbaImage, ty: DeficiencyType, simulator: &S) -> RgbaImage {
        let mut out = image.clone();
        simulate_pixels(&mut out, ty, simulator);
        out
    }

    /// Visible colors in first-seen (row-major) order.
    pub fn distinct_colors(image: &RgbaImage) -> Vec<Color> {
        let mut seen = HashSet::new();
        image
            .pixels()
            .filter_map(pixel_color)
            .filter(|c| seen.insert(*c))
            .collect()
    }

    /// Group visible pixels by color; handles are row-major pixel indices.
    pub fn image_table(image: &RgbaImage, filter: &FilterConfig) -> GroupTable<u32> {
        let visible = image
            .pixels()
            .enumerate()
            .filter_map(|(i, px)| pixel_color(px).map(|c| (i as u32, c)));
        GroupTable::from_parsed(visible, filter)
    }

    /// Rewrite every visible pixel whose color has a replacement.
    pub fn recolor_image(image: &RgbaImage, colors: &HashMap<Color, Color>) -> RgbaImage {
        let mut out = image.clone();
        for px in out.pixels_mut() {
            let Some(replacement) = pixel_color(px).and_then(|c| colors.get(&c)) else {
                continue;
            };
            px.0 = [replacement.red, replacement.green, replacement.blue, px.0[3]];
        }
        out
    }
}
