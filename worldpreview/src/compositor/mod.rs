//! Compositing of rendered tiles into the output image.
//!
//! Tiles are placed in world space and mapped to output pixels through the
//! viewport transform `device = (world - offset) / scale`. Once all tiles
//! are down, two guide lines through world origin are drawn on top.

use image::{Rgba, RgbaImage};
use tiny_skia::{Color, FilterQuality, Paint, Pixmap, PixmapPaint, Rect, Transform};

use crate::geometry::{TileLayout, Viewport};
use crate::scheduler::TileResult;

/// Neutral gray used for the axis lines.
pub const AXIS_GRAY: [u8; 4] = [128, 128, 128, 255];

/// Widest output the compositing canvas can hold; a row of RGBA pixels
/// must fit in `i32` bytes.
pub const MAX_OUTPUT_WIDTH: u32 = i32::MAX as u32 / 4;

/// Assembles tile images into the output buffer.
#[derive(Debug, Clone)]
pub struct Compositor {
    layout: TileLayout,
    background: Color,
    axis_color: Color,
}

impl Compositor {
    /// Create a compositor with a transparent background and gray axes.
    pub fn new(layout: TileLayout) -> Self {
        let [r, g, b, a] = AXIS_GRAY;
        Self {
            layout,
            background: Color::TRANSPARENT,
            axis_color: Color::from_rgba8(r, g, b, a),
        }
    }

    /// Color left where no tile was drawn.
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn with_axis_color(mut self, axis_color: Color) -> Self {
        self.axis_color = axis_color;
        self
    }

    /// Draw `tiles` in order into `target`, then overlay the axis lines.
    ///
    /// `target` is fully overwritten. Tiles without an image leave the
    /// background fill. Targets wider than [`MAX_OUTPUT_WIDTH`] or empty
    /// targets are left untouched.
    pub fn composite(&self, target: &mut RgbaImage, viewport: &Viewport, tiles: &[TileResult]) {
        let (width, height) = target.dimensions();
        let Some(mut canvas) = Pixmap::new(width, height) else {
            return;
        };
        canvas.fill(self.background);

        self.draw_tiles(&mut canvas, viewport, tiles);
        self.draw_axes(&mut canvas, viewport);

        for (dst, src) in target.pixels_mut().zip(canvas.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
    }

    fn draw_tiles(&self, canvas: &mut Pixmap, viewport: &Viewport, tiles: &[TileResult]) {
        let inv = 1.0 / viewport.scale as f32;
        let transform = Transform::from_row(
            inv,
            0.0,
            0.0,
            inv,
            -(viewport.offset_x as f32) * inv,
            -(viewport.offset_y as f32) * inv,
        );
        let paint = PixmapPaint {
            quality: if viewport.scale == 1 {
                FilterQuality::Nearest
            } else {
                FilterQuality::Bilinear
            },
            ..PixmapPaint::default()
        };

        for tile in tiles {
            if let Some(image) = &tile.image {
                let (x, y) = tile.coord.origin(&self.layout);
                canvas.draw_pixmap(x as i32, y as i32, image.as_pixmap(), &paint, transform, None);
            }
        }
    }

    fn draw_axes(&self, canvas: &mut Pixmap, viewport: &Viewport) {
        let (width, height) = (canvas.width(), canvas.height());
        let (origin_x, origin_y) = viewport.to_output(0, 0);

        let mut paint = Paint::default();
        paint.set_color(self.axis_color);
        paint.anti_alias = false;

        let horizontal = (0..height as i64)
            .contains(&origin_y)
            .then(|| Rect::from_xywh(0.0, origin_y as f32, width as f32, 1.0))
            .flatten();
        let vertical = (0..width as i64)
            .contains(&origin_x)
            .then(|| Rect::from_xywh(origin_x as f32, 0.0, 1.0, height as f32))
            .flatten();

        for rect in horizontal.into_iter().chain(vertical) {
            canvas.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::TileCoord;
    use crate::raster::TileImage;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GRAY: Rgba<u8> = Rgba(AXIS_GRAY);

    fn solid(layout: &TileLayout, color: Color) -> TileImage {
        let mut pixmap = Pixmap::new(layout.width(), layout.depth()).unwrap();
        pixmap.fill(color);
        TileImage::from(pixmap)
    }

    fn all_red(layout: &TileLayout, coords: &[(i32, i32)]) -> Vec<TileResult> {
        coords
            .iter()
            .map(|&(x, z)| TileResult {
                coord: TileCoord::new(x, z),
                image: Some(solid(layout, Color::from_rgba8(255, 0, 0, 255))),
            })
            .collect()
    }

    #[test]
    fn test_tiles_fill_view_with_axes_on_top() {
        let layout = TileLayout::new(32, 32);
        let viewport = Viewport::centered(64, 64, 1);
        let tiles = all_red(&layout, &[(-1, -1), (0, -1), (-1, 0), (0, 0)]);
        let mut target = RgbaImage::new(64, 64);

        Compositor::new(layout).composite(&mut target, &viewport, &tiles);

        for (x, y, pixel) in target.enumerate_pixels() {
            let expected = if x == 32 || y == 32 { GRAY } else { RED };
            assert_eq!(*pixel, expected, "pixel ({}, {})", x, y);
        }
    }

    #[test]
    fn test_missing_tile_leaves_background() {
        let layout = TileLayout::new(32, 32);
        let viewport = Viewport::centered(64, 64, 1);
        let mut tiles = all_red(&layout, &[(-1, -1), (0, -1), (-1, 0), (0, 0)]);
        tiles[0].image = None;
        let mut target = RgbaImage::new(64, 64);

        Compositor::new(layout)
            .with_background(Color::from_rgba8(0, 0, 255, 255))
            .composite(&mut target, &viewport, &tiles);

        assert_eq!(*target.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
        assert_eq!(*target.get_pixel(31, 31), Rgba([0, 0, 255, 255]));
        assert_eq!(*target.get_pixel(33, 0), RED);
        assert_eq!(*target.get_pixel(0, 33), RED);
    }

    #[test]
    fn test_tile_pixels_land_at_world_position() {
        let layout = TileLayout::new(4, 4);
        let viewport = Viewport {
            width: 8,
            height: 8,
            scale: 1,
            offset_x: 10,
            offset_y: 10,
        };
        let mut pixmap = Pixmap::new(4, 4).unwrap();
        pixmap.fill(Color::BLACK);
        pixmap.pixels_mut()[0] = tiny_skia::ColorU8::from_rgba(0, 255, 0, 255).premultiply();
        let tiles = vec![TileResult {
            coord: TileCoord::new(3, 3),
            image: Some(TileImage::from(pixmap)),
        }];
        let mut target = RgbaImage::new(8, 8);

        Compositor::new(layout).composite(&mut target, &viewport, &tiles);

        // Tile (3, 3) starts at world (12, 12), output (2, 2)
        assert_eq!(*target.get_pixel(2, 2), Rgba([0, 255, 0, 255]));
        assert_eq!(*target.get_pixel(3, 2), Rgba([0, 0, 0, 255]));
        assert_eq!(*target.get_pixel(1, 1), Rgba([0, 0, 0, 0]));
        assert_eq!(*target.get_pixel(6, 6), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_axes_outside_view_are_not_drawn() {
        let layout = TileLayout::new(32, 32);
        let viewport = Viewport {
            width: 16,
            height: 16,
            scale: 1,
            offset_x: 100,
            offset_y: 100,
        };
        let mut target = RgbaImage::new(16, 16);

        Compositor::new(layout).composite(&mut target, &viewport, &[]);

        assert!(target.pixels().all(|p| *p == Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn test_scaled_composite_covers_view() {
        let layout = TileLayout::new(32, 32);
        let viewport = Viewport::centered(64, 64, 2);
        let coords: Vec<_> = (-2..2).flat_map(|z| (-2..2).map(move |x| (x, z))).collect();
        let tiles = all_red(&layout, &coords);
        let mut target = RgbaImage::new(64, 64);

        Compositor::new(layout).composite(&mut target, &viewport, &tiles);

        for (x, y, pixel) in target.enumerate_pixels() {
            if x == 32 || y == 32 {
                assert_eq!(*pixel, GRAY, "pixel ({}, {})", x, y);
            } else {
                assert!(pixel[0] >= 250 && pixel[1] <= 5 && pixel[2] <= 5, "pixel ({}, {})", x, y);
                assert!(pixel[3] >= 250);
            }
        }
    }

    #[test]
    fn test_custom_axis_color() {
        let layout = TileLayout::new(32, 32);
        let viewport = Viewport::centered(8, 8, 1);
        let mut target = RgbaImage::new(8, 8);

        Compositor::new(layout)
            .with_axis_color(Color::from_rgba8(255, 255, 255, 255))
            .composite(&mut target, &viewport, &[]);

        assert_eq!(*target.get_pixel(4, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*target.get_pixel(0, 4), Rgba([255, 255, 255, 255]));
        assert_eq!(*target.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_zero_sized_target_is_ignored() {
        let layout = TileLayout::new(32, 32);
        let mut target = RgbaImage::new(0, 0);
        Compositor::new(layout).composite(&mut target, &Viewport::centered(0, 0, 1), &[]);
        assert_eq!(target.dimensions(), (0, 0));
    }
}
