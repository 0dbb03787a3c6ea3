//! Object matching across the object tileset catalogues.
//!
//! Objects are resolved to a tileset-local id because the GID depends on
//! which object tilesets end up referenced by the chunk. The same object
//! often appears in several tilesets; every hit is kept as a variation and
//! the tileset holding the most variations is chosen, the earliest one in
//! priority order winning ties.

use serde::Serialize;

use crate::catalogue::MISCELLANEOUS;
use crate::types::{BrushLayer, Direction, LegacyTile, ObjectBrush, Rgba, Tileset, DEFAULT_TILE_PIXELS};

use super::{MatchTable, RgbaMatch};

const BIOME_ITEMS_SLOT: u32 = 6;
const BIOME_TREE_SLOT: u32 = 7;

/// One tileset entry an object was found in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectVariation {
    pub id: u32,
    pub tileset: String,
    pub direction: Option<Direction>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectTileMatch {
    pub tile_name: String,
    pub rgba: Rgba,
    pub object: String,
    /// Tileset-local id of the chosen variation.
    pub tile_id: u32,
    pub tileset: String,
    pub variations: Vec<ObjectVariation>,
    pub flip_horizontal: bool,
    pub width: u32,
    pub height: u32,
    /// Biome placeholder from the miscellaneous tileset.
    pub biome: bool,
}

impl RgbaMatch for ObjectTileMatch {
    fn rgba(&self) -> Rgba {
        self.rgba
    }
}

impl ObjectTileMatch {
    fn biome(tile: &LegacyTile, object: &str, slot: u32) -> Self {
        Self {
            tile_name: tile.label(),
            rgba: tile.value,
            object: object.to_string(),
            tile_id: slot,
            tileset: MISCELLANEOUS.to_string(),
            variations: Vec::new(),
            flip_horizontal: false,
            width: DEFAULT_TILE_PIXELS,
            height: DEFAULT_TILE_PIXELS,
            biome: true,
        }
    }

    /// Choose the richest tileset, then the variation facing `wanted`.
    fn select(&mut self, wanted: Option<Direction>) {
        let best = best_tileset(&self.variations).to_string();
        let in_best: Vec<&ObjectVariation> =
            self.variations.iter().filter(|v| v.tileset == best).collect();
        let Some(&first) = in_best.first() else {
            return;
        };

        let (chosen, flip) = match wanted {
            None => (first, false),
            Some(direction) => match in_best.iter().find(|v| v.direction == Some(direction)) {
                Some(&facing) => (facing, false),
                None => (first, first.direction.is_some_and(|d| d != direction)),
            },
        };

        self.tile_id = chosen.id;
        self.width = chosen.width;
        self.height = chosen.height;
        self.flip_horizontal = flip;
        self.tileset = best;
    }
}

/// Tileset with the most variations; the first seen wins ties.
fn best_tileset(variations: &[ObjectVariation]) -> &str {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for v in variations {
        match counts.iter_mut().find(|(name, _)| *name == v.tileset.as_str()) {
            Some((_, n)) => *n += 1,
            None => counts.push((v.tileset.as_str(), 1)),
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for (name, n) in counts {
        if best.map_or(true, |(_, most)| n > most) {
            best = Some((name, n));
        }
    }
    best.map_or("", |(name, _)| name)
}

fn object_brush(tile: &LegacyTile) -> Option<&ObjectBrush> {
    tile.brush_layers().iter().find_map(|layer| match layer {
        BrushLayer::Object(o) => Some(o),
        _ => None,
    })
}

/// Resolve biome items and trees to their miscellaneous slots.
pub fn match_objects_biome(tiles: &[LegacyTile], candidates: &[usize]) -> MatchTable<ObjectTileMatch> {
    let mut table = MatchTable::new(candidates);
    for (index, slot) in table.slots_mut() {
        let tile = &tiles[index];
        *slot = tile.brush_layers().iter().find_map(|layer| match layer {
            BrushLayer::BiomeItems => Some(ObjectTileMatch::biome(tile, "biomeitems", BIOME_ITEMS_SLOT)),
            BrushLayer::BiomeTree => Some(ObjectTileMatch::biome(tile, "biometree", BIOME_TREE_SLOT)),
            _ => None,
        });
    }
    table
}

/// Match object brushes against one object tileset.
///
/// Already matched objects collect the new variations and may move to this
/// tileset. Returns the number of newly resolved tiles.
pub fn match_objects(tiles: &[LegacyTile], tileset: &Tileset, table: &mut MatchTable<ObjectTileMatch>) -> usize {
    let mut resolved = 0;
    for (index, slot) in table.slots_mut() {
        let tile = &tiles[index];
        let Some(brush) = object_brush(tile) else {
            continue;
        };
        let found: Vec<ObjectVariation> = tileset
            .find_objects(&brush.name)
            .into_iter()
            .map(|(id, entry)| ObjectVariation {
                id,
                tileset: tileset.name.clone(),
                direction: entry.direction,
                width: entry.width,
                height: entry.height,
            })
            .collect();
        if found.is_empty() {
            continue;
        }

        match slot {
            Some(existing) if existing.biome => {}
            Some(existing) => {
                existing.variations.extend(found);
                existing.select(brush.direction);
            }
            None => {
                let mut new = ObjectTileMatch {
                    tile_name: tile.label(),
                    rgba: tile.value,
                    object: brush.name.clone(),
                    tile_id: 0,
                    tileset: String::new(),
                    variations: found,
                    flip_horizontal: false,
                    width: DEFAULT_TILE_PIXELS,
                    height: DEFAULT_TILE_PIXELS,
                    biome: false,
                };
                new.select(brush.direction);
                *slot = Some(new);
                resolved += 1;
            }
        }
    }
    resolved
}

/// Object matches plus the object tilesets a chunk must reference.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectMatches {
    pub table: MatchTable<ObjectTileMatch>,
    /// Tileset names in priority order.
    pub required: Vec<String>,
}

impl ObjectMatches {
    /// Resolved matches with one entry per object name.
    pub fn unique_objects(&self) -> Vec<&ObjectTileMatch> {
        let mut seen: Vec<&ObjectTileMatch> = Vec::new();
        for m in self.table.matched() {
            if !seen.iter().any(|s| s.object == m.object) {
                seen.push(m);
            }
        }
        seen
    }
}

/// Run every object pass in priority order.
///
/// A tileset is required when it resolved new tiles or when a final match
/// points at it.
pub fn match_all_objects(
    tiles: &[LegacyTile],
    candidates: &[usize],
    object_tilesets: &[Tileset],
) -> ObjectMatches {
    let mut table = match_objects_biome(tiles, candidates);
    let mut contributed: Vec<&str> = Vec::new();

    for tileset in object_tilesets {
        if match_objects(tiles, tileset, &mut table) > 0 {
            contributed.push(&tileset.name);
        }
    }

    let required = object_tilesets
        .iter()
        .filter(|t| {
            contributed.contains(&t.name.as_str())
                || table.matched().any(|m| !m.biome && m.tileset == t.name)
        })
        .map(|t| t.name.clone())
        .collect();

    ObjectMatches { table, required }
}
