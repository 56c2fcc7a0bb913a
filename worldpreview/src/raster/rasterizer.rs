//! Tile rasterization.

use std::fmt;
use std::sync::Arc;

use image::Rgba;
use tiny_skia::{Color, Pixmap, PixmapRef};

use super::{TileError, VisualLayer};
use crate::geometry::TileLayout;

/// Rendered pixels of one tile.
///
/// Stored premultiplied, the way tiny-skia expects it for compositing.
#[derive(Clone, PartialEq)]
pub struct TileImage {
    pixmap: Pixmap,
}

impl TileImage {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Straight-alpha color of one pixel, or `None` outside the tile.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.pixmap.pixel(x, y).map(|p| {
            let c = p.demultiply();
            Rgba([c.red(), c.green(), c.blue(), c.alpha()])
        })
    }

    pub fn as_pixmap(&self) -> PixmapRef<'_> {
        self.pixmap.as_ref()
    }

    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }
}

impl From<Pixmap> for TileImage {
    fn from(pixmap: Pixmap) -> Self {
        Self { pixmap }
    }
}

impl fmt::Debug for TileImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Turns tile samples into tile images by running the visual layer stack.
///
/// The rasterizer holds no per-tile state and is shared by all workers.
pub struct TileRasterizer<S> {
    layers: Vec<Arc<dyn VisualLayer<S>>>,
    layout: TileLayout,
    background: Color,
}

impl<S> TileRasterizer<S> {
    /// Create a rasterizer over an ordered layer list.
    ///
    /// Tiles start out opaque black.
    pub fn new(layers: Vec<Arc<dyn VisualLayer<S>>>, layout: TileLayout) -> Self {
        Self {
            layers,
            layout,
            background: Color::BLACK,
        }
    }

    /// Set the color every tile is filled with before layers draw.
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn layers(&self) -> &[Arc<dyn VisualLayer<S>>] {
        &self.layers
    }

    pub fn layout(&self) -> &TileLayout {
        &self.layout
    }

    /// Rasterize one tile sample.
    ///
    /// The sample must describe a volume of the rasterizer's tile layout.
    /// Any layer error aborts the tile.
    pub fn rasterize(&self, sample: &S) -> Result<TileImage, TileError> {
        let (width, height) = (self.layout.width(), self.layout.depth());
        let mut canvas =
            Pixmap::new(width, height).ok_or(TileError::Allocation { width, height })?;
        canvas.fill(self.background);

        for layer in self.layers.iter().filter(|layer| layer.is_visible()) {
            layer
                .render(&mut canvas, sample)
                .map_err(|source| TileError::Layer {
                    layer: layer.name().to_string(),
                    source,
                })?;
        }

        Ok(TileImage { pixmap: canvas })
    }
}
