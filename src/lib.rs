//! sbtiled - pixel-painted Starbound dungeons to Tiled maps
//!
//! Legacy dungeons describe each part as a PNG whose colours are keyed by
//! a tile catalogue in the `.dungeon` file. This library classifies that
//! catalogue, matches it against the packed tileset catalogues and
//! assembles one Tiled JSON map per dungeon part.

pub mod catalogue;
pub mod chunk;
pub mod classify;
pub mod cli;
pub mod convert;
pub mod discovery;
pub mod error;
pub mod matcher;
pub mod output;
pub mod types;
pub mod validation;

pub use catalogue::{BaseTilesets, TilesetCatalogue, TilesetShape};
pub use chunk::{Layer, MapObject, ObjectLayerName, SbDungeonChunk};
pub use classify::{classify, Bucket, SortedTiles};
pub use convert::{convert_png_to_gid, slice_pixels_to_array, ConvertOptions, Converter, DungeonReport};
pub use discovery::{discover, discover_paths, DiscoveryResult, Encoding, Manifest, ScanResult};
pub use error::{Result, SbError};
pub use matcher::{LegacyMatches, MatchTable, RgbaMatch};
pub use types::{BrushLayer, DungeonFile, LayerSide, LegacyTile, Rgba, Tileset, TilesetKind};
pub use validation::{Diagnostic, Severity, ValidationResult};
