//! Core domain types for sbtiled.
//!
//! This module contains the data shared by every stage of a conversion:
//! - `Rgba` - painted pixel values
//! - `gid` - the Tiled global tile ID flag codec
//! - `LegacyTile`/`BrushLayer` - the legacy `.dungeon` tile catalogue
//! - `Tileset` - new tileset catalogues with typed entries

pub mod gid;

mod dungeon;
mod rgba;
mod tile;
mod tileset;

pub use dungeon::{DungeonFile, DungeonMetadata, DungeonPart, PartDef};
pub use rgba::Rgba;
pub use tile::{
    AnchorRule, BrushLayer, Direction, LayerSide, LegacyTile, NpcBrush, ObjectBrush,
    StagehandBrush, WireBrush, ALLOW_OVERDRAWING,
};
pub use tileset::{ObjectEntry, TileEntry, Tileset, TilesetKind, DEFAULT_TILE_PIXELS};
