use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type TileId = u16;

pub const TILE_GRASS: TileId = 0;
pub const TILE_PATH: TileId = 1;
pub const TILE_ROAD: TileId = 2;
pub const TILE_WATER: TileId = 3;
pub const TILE_TREE_TOP: TileId = 4;
pub const TILE_TREE_BOTTOM: TileId = 5;
pub const TILE_ROOF_RED_L: TileId = 6;
pub const TILE_ROOF_RED_R: TileId = 7;
pub const TILE_HOUSE_WALL: TileId = 8;
pub const TILE_HOUSE_WALL_WINDOW: TileId = 9;
pub const TILE_HOUSE_DOOR: TileId = 10;
pub const TILE_PC_ROOF: TileId = 11;
pub const TILE_PC_WALL: TileId = 12;
pub const TILE_PC_DOOR: TileId = 13;
pub const TILE_CAVE_TOP: TileId = 14;
pub const TILE_CAVE_ENTRANCE: TileId = 15;
pub const TILE_FENCE: TileId = 16;
pub const TILE_SIGN_POST: TileId = 17;
pub const TILE_FLOWERS: TileId = 18;
pub const TILE_TALL_GRASS: TileId = 19;
pub const TILE_LEDGE: TileId = 20;
pub const TILE_ROOF_BLUE_L: TileId = 21;
pub const TILE_ROOF_BLUE_R: TileId = 22;
pub const TILE_ROOF_GREEN_L: TileId = 23;
pub const TILE_ROOF_GREEN_R: TileId = 24;

/// Integer tile coordinate. `x` grows right, `y` grows down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// Immutable rectangular grid of tile ids plus the set of ids that block movement.
///
/// Lookups outside `[0,width) x [0,height)` never fail: they report no tile and
/// are treated as impassable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileMap {
    width: u32,
    height: u32,
    tiles: Vec<TileId>,
    solid: BTreeSet<TileId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TilemapError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("tile map must be at least 1x1, got {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },
}

impl TileMap {
    pub fn new(
        width: u32,
        height: u32,
        tiles: Vec<TileId>,
        solid: impl IntoIterator<Item = TileId>,
    ) -> Result<Self, TilemapError> {
        if width == 0 || height == 0 {
            return Err(TilemapError::EmptyDimensions { width, height });
        }
        let expected = width as usize * height as usize;
        let actual = tiles.len();
        if expected != actual {
            return Err(TilemapError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            tiles,
            solid: solid.into_iter().collect(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    pub fn index_of(&self, pos: GridPos) -> Option<usize> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(pos.y as usize * self.width as usize + pos.x as usize)
    }

    pub fn tile_at(&self, pos: GridPos) -> Option<TileId> {
        self.index_of(pos)
            .and_then(|index| self.tiles.get(index).copied())
    }

    pub fn is_solid_tile(&self, tile: TileId) -> bool {
        self.solid.contains(&tile)
    }

    pub fn is_passable(&self, pos: GridPos) -> bool {
        match self.tile_at(pos) {
            Some(tile) => !self.is_solid_tile(tile),
            None => false,
        }
    }

    pub fn pixel_size(&self, tile_px: u32) -> (u32, u32) {
        (
            self.width.saturating_mul(tile_px),
            self.height.saturating_mul(tile_px),
        )
    }
}
