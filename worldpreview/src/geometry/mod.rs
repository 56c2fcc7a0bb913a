//! Tile geometry.
//!
//! Converts between world coordinates and the tile grid. Everything here is
//! pure math with no failure modes.
//!
//! ```text
//!  world x →   -64   -32    0    32    64
//!              ├─────┼─────┼─────┼─────┤
//!  tile x  →    -2    -1    0     1
//! ```

mod types;

pub use types::{
    LogicalArea, TileCoord, TileGrid, TileGridIter, TileLayout, TileVolume, Viewport,
    CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, VERTICAL_CHUNKS,
};

/// Computes the tile grid covering a world area.
///
/// The minimum corner is floor-divided and the (exclusive) maximum corner is
/// ceiling-divided by the tile size, so the grid covers the whole area even
/// when it does not line up with tile boundaries.
///
/// # Example
///
/// ```
/// use worldpreview::geometry::{world_to_tile_area, LogicalArea, TileLayout};
///
/// let layout = TileLayout::new(32, 32);
/// let area = LogicalArea::from_min_and_size(-40, -32, 80, 64);
/// let grid = world_to_tile_area(&area, &layout);
///
/// assert_eq!((grid.min_x, grid.min_z, grid.max_x, grid.max_z), (-2, -1, 2, 1));
/// ```
pub fn world_to_tile_area(area: &LogicalArea, layout: &TileLayout) -> TileGrid {
    let tile_w = layout.width() as i64;
    let tile_h = layout.depth() as i64;

    TileGrid::from_min_and_max(
        floor_div(area.min_x() as i64, tile_w) as i32,
        floor_div(area.min_y() as i64, tile_h) as i32,
        ceil_div(area.max_x(), tile_w) as i32,
        ceil_div(area.max_y(), tile_h) as i32,
    )
}

#[inline]
fn floor_div(value: i64, divisor: i64) -> i64 {
    value.div_euclid(divisor)
}

#[inline]
fn ceil_div(value: i64, divisor: i64) -> i64 {
    -(-value).div_euclid(divisor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn layout32() -> TileLayout {
        TileLayout::new(32, 32)
    }

    #[test]
    fn test_aligned_area_maps_to_exact_grid() {
        let area = LogicalArea::from_min_and_size(-32, -32, 64, 64);
        let grid = world_to_tile_area(&area, &layout32());

        assert_eq!(grid, TileGrid::from_min_and_max(-1, -1, 1, 1));
        assert_eq!(grid.len(), 4);
    }

    #[test]
    fn test_unaligned_area_is_expanded() {
        let area = LogicalArea::from_min_and_size(-5, 3, 40, 30);
        let grid = world_to_tile_area(&area, &layout32());

        // x: [-5, 35) → tiles -1..2, z: [3, 33) → tiles 0..2
        assert_eq!(grid, TileGrid::from_min_and_max(-1, 0, 2, 2));
    }

    #[test]
    fn test_floor_and_ceil_division() {
        assert_eq!(floor_div(-1, 32), -1);
        assert_eq!(floor_div(-32, 32), -1);
        assert_eq!(floor_div(-33, 32), -2);
        assert_eq!(floor_div(31, 32), 0);
        assert_eq!(ceil_div(1, 32), 1);
        assert_eq!(ceil_div(32, 32), 1);
        assert_eq!(ceil_div(0, 32), 0);
        assert_eq!(ceil_div(-31, 32), 0);
        assert_eq!(ceil_div(-32, 32), -1);
    }

    #[test]
    fn test_empty_area_gives_empty_grid() {
        let area = LogicalArea::from_min_and_size(0, 0, 0, 100);
        let grid = world_to_tile_area(&area, &layout32());
        assert!(grid.is_empty());
        assert_eq!(grid.coords().count(), 0);
    }

    #[test]
    fn test_grid_iterates_row_major() {
        let grid = TileGrid::from_min_and_max(-1, 5, 2, 7);
        let coords: Vec<_> = grid.coords().map(|c| (c.x, c.z)).collect();

        assert_eq!(
            coords,
            vec![(-1, 5), (0, 5), (1, 5), (-1, 6), (0, 6), (1, 6)]
        );
        assert_eq!(grid.coords().len(), 6);
    }

    #[test]
    fn test_point_maps_to_single_tile() {
        let layout = layout32();
        assert_eq!(TileCoord::containing(0, 0, &layout), TileCoord::new(0, 0));
        assert_eq!(TileCoord::containing(-1, 31, &layout), TileCoord::new(-1, 0));
        assert_eq!(TileCoord::containing(32, -33, &layout), TileCoord::new(1, -2));
    }

    #[test]
    fn test_tile_volume_spans_vertical_chunks() {
        let layout = TileLayout::default();
        let volume = TileCoord::new(-1, 2).volume(&layout);

        assert_eq!(volume.min, [-64, 0, 128]);
        assert_eq!(volume.size, [64, VERTICAL_CHUNKS * CHUNK_SIZE_Y, 64]);
        assert_eq!(volume.footprint(), (64, 64));
    }

    #[test]
    fn test_default_layout_is_two_chunks_wide() {
        let layout = TileLayout::default();
        assert_eq!(layout.width(), CHUNK_SIZE_X * 2);
        assert_eq!(layout.depth(), CHUNK_SIZE_Z * 2);
        assert_eq!(layout.height(), 256);
    }

    #[test]
    fn test_centered_viewport_puts_origin_in_middle() {
        let viewport = Viewport::centered(64, 48, 2);

        assert_eq!(viewport.offset_x, -64);
        assert_eq!(viewport.offset_y, -48);
        assert_eq!(viewport.to_output(0, 0), (32, 24));
        assert_eq!(viewport.to_world(32, 24), (0, 0));
        assert_eq!(
            viewport.world_area(),
            LogicalArea::from_min_and_size(-64, -48, 128, 96)
        );
    }

    #[test]
    fn test_centered_viewport_truncates_odd_sizes() {
        let viewport = Viewport::centered(65, 65, 1);
        assert_eq!(viewport.offset_x, -32);
        assert_eq!(viewport.offset_y, -32);
    }

    proptest! {
        #[test]
        fn prop_grid_covers_area(
            min_x in -10_000i32..10_000,
            min_y in -10_000i32..10_000,
            width in 1u32..2_000,
            height in 1u32..2_000,
            tile_w in 1u32..128,
            tile_h in 1u32..128,
        ) {
            let layout = TileLayout::new(tile_w, tile_h);
            let area = LogicalArea::from_min_and_size(min_x, min_y, width, height);
            let grid = world_to_tile_area(&area, &layout);

            prop_assert!(grid.pixel_extent(&layout).contains_area(&area));

            // Corner pixels land in tiles of the grid
            for (x, y) in [
                (area.min_x() as i64, area.min_y() as i64),
                (area.max_x() - 1, area.min_y() as i64),
                (area.min_x() as i64, area.max_y() - 1),
                (area.max_x() - 1, area.max_y() - 1),
            ] {
                prop_assert!(grid.contains(&TileCoord::containing(x, y, &layout)));
            }
        }

        #[test]
        fn prop_grid_is_tight(
            min_x in -10_000i32..10_000,
            min_y in -10_000i32..10_000,
            width in 1u32..2_000,
            height in 1u32..2_000,
        ) {
            let layout = TileLayout::new(32, 32);
            let area = LogicalArea::from_min_and_size(min_x, min_y, width, height);
            let grid = world_to_tile_area(&area, &layout);

            // Never more than one partial tile on each side
            prop_assert!(grid.width() as u32 <= width / 32 + 2);
            prop_assert!(grid.depth() as u32 <= height / 32 + 2);
        }
    }
}
