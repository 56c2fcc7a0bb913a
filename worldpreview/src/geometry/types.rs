//! Geometry types shared by every pipeline stage.

use std::fmt;

/// Horizontal size of one data source chunk (x axis).
pub const CHUNK_SIZE_X: u32 = 32;

/// Vertical size of one data source chunk (y axis).
pub const CHUNK_SIZE_Y: u32 = 64;

/// Depth of one data source chunk (z axis).
pub const CHUNK_SIZE_Z: u32 = 32;

/// Number of chunks stacked vertically in each tile volume.
///
/// Several chunks of height give layers enough vertical context
/// (trees, overhangs) to draw a sensible top-down view.
pub const VERTICAL_CHUNKS: u32 = 4;

/// Tile dimensions used to partition the world.
///
/// `width` is TILE_W along x, `depth` is TILE_H along z, and `height` is the
/// vertical extent of the volume queried for each tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileLayout {
    width: u32,
    depth: u32,
    height: u32,
}

impl TileLayout {
    /// Create a layout with the given horizontal tile size and the default
    /// vertical extent.
    ///
    /// Zero sizes are clamped to 1 so floor/ceil division stays defined.
    pub fn new(width: u32, depth: u32) -> Self {
        Self {
            width: width.max(1),
            depth: depth.max(1),
            height: VERTICAL_CHUNKS * CHUNK_SIZE_Y,
        }
    }

    /// Set the vertical extent of each tile volume.
    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height.max(1);
        self
    }

    /// Tile width in world pixels (x axis).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Tile depth in world pixels (z axis).
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Vertical extent of the queried volume.
    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Default for TileLayout {
    /// Two chunks by two chunks, four chunks high.
    fn default() -> Self {
        Self::new(CHUNK_SIZE_X * 2, CHUNK_SIZE_Z * 2)
    }
}

/// Axis-aligned rectangle in world coordinates.
///
/// The maximum corner is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogicalArea {
    min_x: i32,
    min_y: i32,
    width: u32,
    height: u32,
}

impl LogicalArea {
    /// Create an area from its minimum corner and size.
    pub fn from_min_and_size(min_x: i32, min_y: i32, width: u32, height: u32) -> Self {
        Self {
            min_x,
            min_y,
            width,
            height,
        }
    }

    pub fn min_x(&self) -> i32 {
        self.min_x
    }

    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    /// Exclusive maximum x.
    pub fn max_x(&self) -> i64 {
        self.min_x as i64 + self.width as i64
    }

    /// Exclusive maximum y.
    pub fn max_y(&self) -> i64 {
        self.min_y as i64 + self.height as i64
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns true if the area covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns true if the world point lies inside the area.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.min_x as i64 && x < self.max_x() && y >= self.min_y as i64 && y < self.max_y()
    }

    /// Returns true if `other` lies entirely inside this area.
    pub fn contains_area(&self, other: &LogicalArea) -> bool {
        other.is_empty()
            || (other.min_x >= self.min_x
                && other.min_y >= self.min_y
                && other.max_x() <= self.max_x()
                && other.max_y() <= self.max_y())
    }
}

impl fmt::Display for LogicalArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}) × [{}, {})",
            self.min_x,
            self.max_x(),
            self.min_y,
            self.max_y()
        )
    }
}

/// Position of one tile in the tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Tile column (x axis).
    pub x: i32,
    /// Tile row (z axis).
    pub z: i32,
}

impl TileCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The tile containing the world point `(wx, wz)`.
    pub fn containing(wx: i64, wz: i64, layout: &TileLayout) -> Self {
        Self {
            x: wx.div_euclid(layout.width() as i64) as i32,
            z: wz.div_euclid(layout.depth() as i64) as i32,
        }
    }

    /// World position of the tile's minimum corner.
    pub fn origin(&self, layout: &TileLayout) -> (i64, i64) {
        (
            self.x as i64 * layout.width() as i64,
            self.z as i64 * layout.depth() as i64,
        )
    }

    /// The 3-D volume the data source is queried with for this tile.
    pub fn volume(&self, layout: &TileLayout) -> TileVolume {
        let (min_x, min_z) = self.origin(layout);
        TileVolume {
            tile: *self,
            min: [min_x, 0, min_z],
            size: [layout.width(), layout.height(), layout.depth()],
        }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// 3-D region of world data backing a single tile.
///
/// Coordinates are ordered `[x, y, z]` with y pointing up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileVolume {
    /// Tile this volume belongs to.
    pub tile: TileCoord,
    /// Minimum corner in world coordinates.
    pub min: [i64; 3],
    /// Extent along each axis.
    pub size: [u32; 3],
}

impl TileVolume {
    /// Horizontal extent `(width, depth)` in world pixels.
    pub fn footprint(&self) -> (u32, u32) {
        (self.size[0], self.size[2])
    }
}

impl fmt::Display for TileVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}+{}x{}x{} at ({}, {}, {})",
            self.tile, self.size[0], self.size[1], self.size[2], self.min[0], self.min[1], self.min[2]
        )
    }
}

/// Rectangular range of tiles, `[min, max)` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileGrid {
    pub min_x: i32,
    pub min_z: i32,
    pub max_x: i32,
    pub max_z: i32,
}

impl TileGrid {
    pub fn from_min_and_max(min_x: i32, min_z: i32, max_x: i32, max_z: i32) -> Self {
        Self {
            min_x,
            min_z,
            max_x: max_x.max(min_x),
            max_z: max_z.max(min_z),
        }
    }

    /// Number of tile columns.
    pub fn width(&self) -> usize {
        (self.max_x as i64 - self.min_x as i64) as usize
    }

    /// Number of tile rows.
    pub fn depth(&self) -> usize {
        (self.max_z as i64 - self.min_z as i64) as usize
    }

    /// Total number of tiles.
    pub fn len(&self) -> usize {
        self.width() * self.depth()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, coord: &TileCoord) -> bool {
        coord.x >= self.min_x && coord.x < self.max_x && coord.z >= self.min_z && coord.z < self.max_z
    }

    /// Iterate tiles row-major: x ascending within a row, rows ascending in z.
    pub fn coords(&self) -> TileGridIter {
        TileGridIter {
            grid: *self,
            next: TileCoord::new(self.min_x, self.min_z),
        }
    }

    /// World rectangle covered by all tiles of the grid.
    pub fn pixel_extent(&self, layout: &TileLayout) -> LogicalArea {
        let (min_x, min_y) = TileCoord::new(self.min_x, self.min_z).origin(layout);
        LogicalArea::from_min_and_size(
            min_x as i32,
            min_y as i32,
            self.width() as u32 * layout.width(),
            self.depth() as u32 * layout.depth(),
        )
    }
}

/// Row-major iterator over a [`TileGrid`].
#[derive(Debug, Clone)]
pub struct TileGridIter {
    grid: TileGrid,
    next: TileCoord,
}

impl Iterator for TileGridIter {
    type Item = TileCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.grid.is_empty() || self.next.z >= self.grid.max_z {
            return None;
        }
        let current = self.next;
        self.next.x += 1;
        if self.next.x >= self.grid.max_x {
            self.next.x = self.grid.min_x;
            self.next.z += 1;
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.grid.is_empty() || self.next.z >= self.grid.max_z {
            return (0, Some(0));
        }
        let rows_left = (self.grid.max_z - self.next.z) as usize;
        let consumed = (self.next.x - self.grid.min_x) as usize;
        let remaining = rows_left * self.grid.width() - consumed;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileGridIter {}

/// Mapping between output pixels and world coordinates.
///
/// Output pixel `(px, py)` shows world coordinate
/// `(px * scale + offset_x, py * scale + offset_y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub scale: u32,
    pub offset_x: i32,
    pub offset_y: i32,
}

impl Viewport {
    /// Viewport with world origin in the middle of the output.
    pub fn centered(width: u32, height: u32, scale: u32) -> Self {
        let scale = scale.max(1);
        Self {
            width,
            height,
            scale,
            offset_x: -((width as i64 * scale as i64) / 2) as i32,
            offset_y: -((height as i64 * scale as i64) / 2) as i32,
        }
    }

    /// World area visible through this viewport.
    pub fn world_area(&self) -> LogicalArea {
        LogicalArea::from_min_and_size(
            self.offset_x,
            self.offset_y,
            self.width * self.scale,
            self.height * self.scale,
        )
    }

    /// World coordinate shown at the top-left corner of output pixel `(px, py)`.
    pub fn to_world(&self, px: u32, py: u32) -> (i64, i64) {
        (
            px as i64 * self.scale as i64 + self.offset_x as i64,
            py as i64 * self.scale as i64 + self.offset_y as i64,
        )
    }

    /// Output pixel showing world coordinate `(wx, wy)`, which may lie
    /// outside the output bounds.
    pub fn to_output(&self, wx: i64, wy: i64) -> (i64, i64) {
        (
            (wx - self.offset_x as i64).div_euclid(self.scale as i64),
            (wy - self.offset_y as i64).div_euclid(self.scale as i64),
        )
    }
}
