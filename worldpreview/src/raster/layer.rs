//! Visual layer trait.

use tiny_skia::Pixmap;

use super::LayerError;

/// One visual layer of the preview.
///
/// A layer interprets a tile's data sample and draws into the tile's pixel
/// buffer. Layers are drawn in list order, so later layers paint over
/// earlier ones.
///
/// The same layer instance renders many tiles concurrently. Implementations
/// must not keep per-tile mutable state between calls; anything that has to
/// change at runtime (such as visibility toggled from a UI) should use
/// interior mutability that is safe to read from several threads.
///
/// # Example
///
/// ```
/// use tiny_skia::{Color, Pixmap};
/// use worldpreview::raster::{LayerError, VisualLayer};
///
/// struct Fill(Color);
///
/// impl VisualLayer<()> for Fill {
///     fn name(&self) -> &str {
///         "fill"
///     }
///
///     fn render(&self, canvas: &mut Pixmap, _sample: &()) -> Result<(), LayerError> {
///         canvas.fill(self.0);
///         Ok(())
///     }
/// }
/// ```
pub trait VisualLayer<S>: Send + Sync {
    /// Name used in log output and error messages.
    fn name(&self) -> &str;

    /// Whether the layer currently takes part in rendering.
    fn is_visible(&self) -> bool {
        true
    }

    /// Draw this layer for one tile.
    ///
    /// `canvas` has the tile's pixel size; pixel `(0, 0)` is the tile's
    /// minimum world corner.
    fn render(&self, canvas: &mut Pixmap, sample: &S) -> Result<(), LayerError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tiny_skia::Color;

    struct Toggle {
        visible: AtomicBool,
    }

    impl VisualLayer<u8> for Toggle {
        fn name(&self) -> &str {
            "toggle"
        }

        fn is_visible(&self) -> bool {
            self.visible.load(Ordering::Relaxed)
        }

        fn render(&self, canvas: &mut Pixmap, sample: &u8) -> Result<(), LayerError> {
            canvas.fill(Color::from_rgba8(*sample, 0, 0, 255));
            Ok(())
        }
    }

    #[test]
    fn test_trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn VisualLayer<u8>>();
    }

    #[test]
    fn test_visibility_can_change_through_shared_handle() {
        let layer = Arc::new(Toggle {
            visible: AtomicBool::new(true),
        });
        let shared: Arc<dyn VisualLayer<u8>> = layer.clone();

        assert!(shared.is_visible());
        layer.visible.store(false, Ordering::Relaxed);
        assert!(!shared.is_visible());
    }

    #[test]
    fn test_render_writes_into_canvas() {
        let layer = Toggle {
            visible: AtomicBool::new(true),
        };
        let mut canvas = Pixmap::new(4, 4).unwrap();

        layer.render(&mut canvas, &200).unwrap();

        let pixel = canvas.pixel(2, 3).unwrap();
        assert_eq!((pixel.red(), pixel.alpha()), (200, 255));
    }
}
