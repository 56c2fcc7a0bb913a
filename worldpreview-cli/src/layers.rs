//! Visual layers for terrain previews.

use std::sync::atomic::{AtomicBool, Ordering};

use tiny_skia::{ColorU8, Pixmap};
use worldpreview::raster::{LayerError, VisualLayer};

use crate::terrain::HeightSample;

/// Colors each pixel by surface height: water below sea level, then
/// lowland, hills, rock and snow.
#[derive(Debug, Default)]
pub struct ElevationLayer;

impl ElevationLayer {
    /// Color for a normalized height.
    pub fn color(height: f32, sea_level: f32) -> [u8; 3] {
        if height < sea_level {
            let depth = (sea_level - height) / sea_level.max(f32::EPSILON);
            return mix([64, 128, 224], [16, 32, 96], depth);
        }

        let land = (height - sea_level) / (1.0 - sea_level).max(f32::EPSILON);
        match land {
            t if t < 0.05 => [216, 200, 144],
            t if t < 0.45 => mix([72, 160, 64], [40, 110, 40], (t - 0.05) / 0.4),
            t if t < 0.75 => mix([120, 100, 70], [110, 110, 110], (t - 0.45) / 0.3),
            t => mix([180, 180, 180], [250, 250, 250], (t - 0.75) / 0.25),
        }
    }
}

impl VisualLayer<HeightSample> for ElevationLayer {
    fn name(&self) -> &str {
        "elevation"
    }

    fn render(&self, canvas: &mut Pixmap, sample: &HeightSample) -> Result<(), LayerError> {
        check_size(canvas, sample)?;

        for (pixel, &height) in canvas.pixels_mut().iter_mut().zip(&sample.heights) {
            let [r, g, b] = Self::color(height, sample.sea_level);
            *pixel = ColorU8::from_rgba(r, g, b, 255).premultiply();
        }
        Ok(())
    }
}

/// Darkens pixels where the height crosses a contour interval.
///
/// Can be hidden at runtime; hidden layers are skipped by the rasterizer.
#[derive(Debug)]
pub struct ContourLayer {
    levels: u32,
    strength: f32,
    visible: AtomicBool,
}

impl Default for ContourLayer {
    fn default() -> Self {
        Self::new(20)
    }
}

impl ContourLayer {
    /// Contour lines splitting the height range into `levels` bands.
    pub fn new(levels: u32) -> Self {
        Self {
            levels: levels.max(1),
            strength: 0.35,
            visible: AtomicBool::new(true),
        }
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Relaxed);
    }

    fn band(&self, height: f32) -> u32 {
        (height * self.levels as f32) as u32
    }

    fn is_contour(&self, sample: &HeightSample, x: u32, z: u32) -> bool {
        let Some(here) = sample.height(x, z).map(|h| self.band(h)) else {
            return false;
        };
        [sample.height(x + 1, z), sample.height(x, z + 1)]
            .into_iter()
            .flatten()
            .any(|h| self.band(h) != here)
    }
}

impl VisualLayer<HeightSample> for ContourLayer {
    fn name(&self) -> &str {
        "contours"
    }

    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }

    fn render(&self, canvas: &mut Pixmap, sample: &HeightSample) -> Result<(), LayerError> {
        check_size(canvas, sample)?;

        let width = sample.width;
        let keep = 1.0 - self.strength;
        for (index, pixel) in canvas.pixels_mut().iter_mut().enumerate() {
            let (x, z) = (index as u32 % width, index as u32 / width);
            if !self.is_contour(sample, x, z) {
                continue;
            }
            let c = pixel.demultiply();
            let shade = |v: u8| (v as f32 * keep).round() as u8;
            *pixel = ColorU8::from_rgba(shade(c.red()), shade(c.green()), shade(c.blue()), c.alpha())
                .premultiply();
        }
        Ok(())
    }
}

fn check_size(canvas: &Pixmap, sample: &HeightSample) -> Result<(), LayerError> {
    if (canvas.width(), canvas.height()) != (sample.width, sample.depth) {
        return Err(LayerError::new(format!(
            "sample is {}×{} but canvas is {}×{}",
            sample.width,
            sample.depth,
            canvas.width(),
            canvas.height()
        )));
    }
    Ok(())
}

fn mix(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let channel = |i: usize| (a[i] as f32 + (b[i] as f32 - a[i] as f32) * t).round() as u8;
    [channel(0), channel(1), channel(2)]
}
