//! Tileset catalogue resolution and GID numbering.
//!
//! Every map references its tilesets in a fixed order. Each tileset owns the
//! GID range `[firstgid, firstgid + tilecount)`; the first tileset starts at
//! 1 and each later one starts where the previous range ends.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::discovery::read_json_value;
use crate::error::{Result, SbError};
use crate::types::{gid, Tileset, TilesetKind};

pub const MATERIALS: &str = "materials";
pub const SUPPORTS: &str = "supports";
pub const LIQUIDS: &str = "liquids";
pub const MISCELLANEOUS: &str = "miscellaneous";

/// Tilesets every converted chunk references, in GID order.
pub const BASE_TILESETS: [(&str, TilesetKind); 4] = [
    (MATERIALS, TilesetKind::Materials),
    (SUPPORTS, TilesetKind::Supports),
    (LIQUIDS, TilesetKind::Liquids),
    (MISCELLANEOUS, TilesetKind::Miscellaneous),
];

/// Object tilesets in matching priority order.
pub const OBJECT_TILESETS: &[&str] = &[
    "huge-objects",
    "objects-by-category/actionfigure",
    "objects-by-category/artifact",
    "objects-by-category/breakable",
    "objects-by-category/bug",
    "objects-by-category/crafting",
    "objects-by-category/decorative",
    "objects-by-category/door",
    "objects-by-category/farmable",
    "objects-by-category/fridgestorage",
    "objects-by-category/furniture",
    "objects-by-category/generic",
    "objects-by-category/light",
    "objects-by-category/musical",
    "objects-by-category/other",
    "objects-by-category/playerstation",
    "objects-by-category/pot",
    "objects-by-category/rail",
    "objects-by-category/railpoint",
    "objects-by-category/refinery",
    "objects-by-category/sapling",
    "objects-by-category/seed",
    "objects-by-category/shelf",
    "objects-by-category/sign",
    "objects-by-category/spawner",
    "objects-by-category/storage",
    "objects-by-category/teleporter",
    "objects-by-category/tool",
    "objects-by-category/trap",
    "objects-by-category/wire",
    "objects-by-colonytag/combat",
    "objects-by-colonytag/commerce",
    "objects-by-colonytag/cooking",
    "objects-by-colonytag/door",
    "objects-by-colonytag/electronic",
    "objects-by-colonytag/farming",
    "objects-by-colonytag/light",
    "objects-by-colonytag/mechanical",
    "objects-by-colonytag/misc",
    "objects-by-colonytag/musical",
    "objects-by-colonytag/nature",
    "objects-by-colonytag/science",
    "objects-by-colonytag/storage",
    "objects-by-colonytag/valuable",
    "objects-by-race/ancient",
    "objects-by-race/apex",
    "objects-by-race/avian",
    "objects-by-race/floran",
    "objects-by-race/generic",
    "objects-by-race/glitch",
    "objects-by-race/human",
    "objects-by-race/hylotl",
    "objects-by-race/novakid",
    "objects-by-type/container",
    "objects-by-type/door",
    "objects-by-type/farmable",
    "objects-by-type/loungeable",
    "objects-by-type/noisy",
    "objects-by-type/teleporter",
];

/// A tileset reference as written into a map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TilesetShape {
    pub firstgid: u32,
    pub source: String,
}

/// One past the largest pure GID the flag bits leave room for.
const GID_LIMIT: u32 = !gid::FLAG_MASK + 1;

/// Running `firstgid` for tilesets with the given tile counts, starting at `start`.
///
/// Fails when the tiles would run past the pure GID range.
pub fn first_gids(counts: &[u32], start: u32) -> Result<Vec<u32>> {
    let mut next = start;
    let mut gids = Vec::with_capacity(counts.len());
    for &count in counts {
        gids.push(next);
        next = next
            .checked_add(count)
            .filter(|&end| end <= GID_LIMIT)
            .ok_or_else(|| SbError::Parse {
                message: format!("{} tiles from GID {} overflow the GID range", count, next),
                help: Some("Check the 'tilecount' of each tileset".to_string()),
            })?;
    }
    Ok(gids)
}

/// Locates tileset catalogue files and knows how maps refer to them.
#[derive(Debug, Clone)]
pub struct TilesetCatalogue {
    dir: PathBuf,
    source_prefix: String,
}

impl TilesetCatalogue {
    /// `dir` holds the `.json` catalogues; `source_prefix` is prepended to
    /// `<name>.json` when writing map tileset references.
    pub fn new(dir: impl Into<PathBuf>, source_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            source_prefix: source_prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    pub fn source_for(&self, name: &str) -> String {
        format!("{}{}.json", self.source_prefix, name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Read and validate one catalogue.
    pub fn load(&self, name: &str, kind: TilesetKind) -> Result<Tileset> {
        let value = read_json_value(&self.path_for(name))?;
        Tileset::from_value(name, kind, value)
    }

    /// Map references for `tilesets` in order, numbered from `start`.
    pub fn calc_shapes(&self, tilesets: &[&Tileset], start: u32) -> Result<Vec<TilesetShape>> {
        let counts: Vec<u32> = tilesets.iter().map(|t| t.tilecount).collect();
        Ok(first_gids(&counts, start)?
            .into_iter()
            .zip(tilesets)
            .map(|(firstgid, tileset)| TilesetShape {
                firstgid,
                source: self.source_for(&tileset.name),
            })
            .collect())
    }

    /// Load the four base catalogues.
    pub fn load_base(&self) -> Result<BaseTilesets> {
        let [materials, supports, liquids, miscellaneous] = BASE_TILESETS;
        let materials = self.load(materials.0, materials.1)?;
        let supports = self.load(supports.0, supports.1)?;
        let liquids = self.load(liquids.0, liquids.1)?;
        let miscellaneous = self.load(miscellaneous.0, miscellaneous.1)?;

        let shapes = self.calc_shapes(&[&materials, &supports, &liquids, &miscellaneous], 1)?;
        Ok(BaseTilesets {
            materials,
            supports,
            liquids,
            miscellaneous,
            shapes,
        })
    }
}

/// The base catalogues with their GID numbering.
#[derive(Debug, Clone)]
pub struct BaseTilesets {
    pub materials: Tileset,
    pub supports: Tileset,
    pub liquids: Tileset,
    pub miscellaneous: Tileset,
    pub shapes: Vec<TilesetShape>,
}

impl BaseTilesets {
    pub fn firstgid(&self, name: &str) -> Option<u32> {
        let suffix = format!("{}.json", name);
        self.shapes
            .iter()
            .find(|s| s.source.contains(&suffix))
            .map(|s| s.firstgid)
    }

    pub fn misc_firstgid(&self) -> Option<u32> {
        self.firstgid(MISCELLANEOUS)
    }

    /// First GID after the base catalogues.
    pub fn next_firstgid(&self) -> u32 {
        self.shapes
            .last()
            .map_or(1, |s| s.firstgid.saturating_add(self.miscellaneous.tilecount))
    }

    /// Material-bearing catalogues in matching order, with their firstgid.
    pub fn material_passes(&self) -> Vec<(&Tileset, Option<u32>)> {
        [&self.materials, &self.supports, &self.liquids]
            .into_iter()
            .map(|t| (t, self.firstgid(&t.name)))
            .collect()
    }
}
