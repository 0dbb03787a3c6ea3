//! Matching classified legacy tiles against the new tileset catalogues.
//!
//! Every matcher walks a candidate list of tile indices and produces a
//! [`MatchTable`] with one slot per candidate. Empty slots are tiles that
//! could not be resolved; they are reported, never silently dropped.

mod anchors;
mod entities;
mod layer;
mod objects;

pub use anchors::{match_anchors, AnchorMatch, AnchorKind};
pub use entities::{
    match_mods, match_npcs, match_stagehands, match_wires, ModMatch, NpcMatch, StagehandMatch,
    WireMatch,
};
pub use layer::{magic_pink_gid, match_layer, match_misc, match_tilelayer, LayerTileMatch};
pub use objects::{
    match_all_objects, match_objects, match_objects_biome, ObjectMatches, ObjectTileMatch,
    ObjectVariation,
};

use serde::Serialize;

use crate::classify::{Bucket, SortedTiles};
use crate::catalogue::BaseTilesets;
use crate::error::{Result, SbError};
use crate::types::{LayerSide, LegacyTile, Rgba, Tileset};
use crate::validation::ValidationResult;

/// Anything that can be looked up by painted colour.
pub trait RgbaMatch {
    fn rgba(&self) -> Rgba;

    /// GID written into a tile layer for this colour.
    fn gid(&self) -> u32 {
        0
    }
}

/// Match results parallel to a candidate list of tile indices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchTable<T> {
    slots: Vec<(usize, Option<T>)>,
}

impl<T> MatchTable<T> {
    /// An empty slot for every candidate.
    pub fn new(candidates: &[usize]) -> Self {
        Self {
            slots: candidates.iter().map(|&i| (i, None)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Tile indices in slot order.
    pub fn candidates(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots.iter().map(|(i, _)| *i)
    }

    pub fn slots(&self) -> impl Iterator<Item = (usize, Option<&T>)> {
        self.slots.iter().map(|(i, m)| (*i, m.as_ref()))
    }

    pub(crate) fn slots_mut(&mut self) -> impl Iterator<Item = (usize, &mut Option<T>)> {
        self.slots.iter_mut().map(|(i, m)| (*i, m))
    }

    /// Resolved entries in slot order.
    pub fn matched(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|(_, m)| m.as_ref())
    }

    /// Match for a tile index, if resolved.
    pub fn get(&self, tile: usize) -> Option<&T> {
        self.slots
            .iter()
            .find(|(i, _)| *i == tile)
            .and_then(|(_, m)| m.as_ref())
    }

    /// Tile indices still unresolved.
    pub fn unmatched(&self) -> Vec<usize> {
        self.slots
            .iter()
            .filter(|(_, m)| m.is_none())
            .map(|(i, _)| *i)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(|(_, m)| m.is_some())
    }

    /// Fill empty slots from a table built over the same candidates.
    ///
    /// Existing matches are kept. Tables of different shape are an error.
    pub fn fill_missing(&mut self, other: MatchTable<T>) -> Result<()> {
        if other.slots.len() != self.slots.len() {
            return Err(SbError::MergeSizeMismatch {
                expected: self.slots.len(),
                actual: other.slots.len(),
            });
        }
        for ((index, slot), (other_index, other_match)) in self.slots.iter_mut().zip(other.slots) {
            if *index != other_index {
                return Err(SbError::Match {
                    message: format!(
                        "Match tables disagree on candidates: tile {} vs tile {}",
                        index, other_index
                    ),
                    help: None,
                });
            }
            if slot.is_none() {
                *slot = other_match;
            }
        }
        Ok(())
    }
}

/// Record one warning per unresolved tile.
pub(crate) fn report_unmatched<T>(
    table: &MatchTable<T>,
    tiles: &[LegacyTile],
    what: &str,
    report: &mut ValidationResult,
) {
    for index in table.unmatched() {
        report.warning(
            "sbtiled::match::unmatched",
            format!("No {} match for tile {}", what, tiles[index].label()),
        );
    }
}

/// Everything resolved from a dungeon's legacy tile catalogue.
#[derive(Debug, Clone)]
pub struct LegacyMatches {
    pub front: MatchTable<LayerTileMatch>,
    pub back: MatchTable<LayerTileMatch>,
    pub anchors: Vec<AnchorMatch>,
    pub objects: ObjectMatches,
    pub npcs: Vec<NpcMatch>,
    pub stagehands: Vec<StagehandMatch>,
    pub mods: Vec<ModMatch>,
    pub wires: Vec<WireMatch>,
}

impl LegacyMatches {
    /// Run every matcher over a classified catalogue.
    ///
    /// Unresolved tiles are recorded in `report`; structural problems fail.
    pub fn build(
        tiles: &[LegacyTile],
        sorted: &SortedTiles,
        base: &BaseTilesets,
        object_tilesets: &[Tileset],
        report: &mut ValidationResult,
    ) -> Result<Self> {
        let front = match_layer(tiles, sorted, base, LayerSide::Front)?;
        report_unmatched(&front, tiles, "front layer", report);
        let back = match_layer(tiles, sorted, base, LayerSide::Back)?;
        report_unmatched(&back, tiles, "back layer", report);

        let misc_firstgid = misc_firstgid(base)?;
        let anchors = match_anchors(
            tiles,
            sorted.get(Bucket::Anchors),
            &base.miscellaneous,
            misc_firstgid,
        )?;

        let objects = match_all_objects(tiles, sorted.get(Bucket::Objects), object_tilesets);
        report_unmatched(&objects.table, tiles, "object", report);

        Ok(Self {
            front,
            back,
            anchors,
            objects,
            npcs: match_npcs(tiles, sorted.get(Bucket::Npcs)),
            stagehands: match_stagehands(tiles, sorted.get(Bucket::Stagehands)),
            mods: match_mods(tiles, sorted.get(Bucket::Foreground)),
            wires: match_wires(tiles, sorted.get(Bucket::Wires)),
        })
    }

    /// Count of unresolved layer and object tiles.
    pub fn unmatched_count(&self) -> usize {
        self.front.unmatched().len()
            + self.back.unmatched().len()
            + self.objects.table.unmatched().len()
    }
}

pub(crate) fn misc_firstgid(base: &BaseTilesets) -> Result<u32> {
    base.misc_firstgid().ok_or_else(|| SbError::Match {
        message: "The miscellaneous tileset is not referenced".to_string(),
        help: Some("Tileset sources must end in 'miscellaneous.json'".to_string()),
    })
}
