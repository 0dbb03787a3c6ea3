//! Sorting legacy tiles into semantic buckets.
//!
//! A tile lands in every bucket any of its brush layers or rules call for,
//! so a `clear`/`front`/`back` brush is both foreground and background, and
//! a connector carrying a material is both an anchor and a layer tile.
//! Buckets hold indices into the tile slice they were built from.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::types::{BrushLayer, LayerSide, LegacyTile};
use crate::validation::ValidationResult;

/// A classification bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Foreground,
    Background,
    SpecialForeground,
    SpecialBackground,
    Special,
    Anchors,
    Wires,
    Stagehands,
    Npcs,
    Objects,
    Undefined,
}

impl Bucket {
    pub const ALL: [Bucket; 11] = [
        Bucket::Foreground,
        Bucket::Background,
        Bucket::SpecialForeground,
        Bucket::SpecialBackground,
        Bucket::Special,
        Bucket::Anchors,
        Bucket::Wires,
        Bucket::Stagehands,
        Bucket::Npcs,
        Bucket::Objects,
        Bucket::Undefined,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Bucket::Foreground => "foreground",
            Bucket::Background => "background",
            Bucket::SpecialForeground => "specialforeground",
            Bucket::SpecialBackground => "specialbackground",
            Bucket::Special => "special",
            Bucket::Anchors => "anchors",
            Bucket::Wires => "wires",
            Bucket::Stagehands => "stagehands",
            Bucket::Npcs => "npcs",
            Bucket::Objects => "objects",
            Bucket::Undefined => "undefined",
        }
    }

    /// Buckets whose tiles are candidates for a tile layer.
    pub fn layer_candidates(side: LayerSide) -> [Bucket; 3] {
        match side {
            LayerSide::Front => [Bucket::Foreground, Bucket::SpecialForeground, Bucket::Special],
            LayerSide::Back => [Bucket::Background, Bucket::SpecialBackground, Bucket::Special],
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tile indices grouped by bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SortedTiles {
    buckets: BTreeMap<Bucket, Vec<usize>>,
}

impl SortedTiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tile to a bucket once.
    pub fn insert(&mut self, bucket: Bucket, index: usize) {
        let entries = self.buckets.entry(bucket).or_default();
        if !entries.contains(&index) {
            entries.push(index);
        }
    }

    pub fn get(&self, bucket: Bucket) -> &[usize] {
        self.buckets.get(&bucket).map_or(&[], Vec::as_slice)
    }

    pub fn contains(&self, bucket: Bucket, index: usize) -> bool {
        self.get(bucket).contains(&index)
    }

    /// Sorted, deduplicated union of several buckets.
    pub fn union(&self, buckets: &[Bucket]) -> Vec<usize> {
        let mut all: Vec<usize> = buckets.iter().flat_map(|b| self.get(*b)).copied().collect();
        all.sort_unstable();
        all.dedup();
        all
    }

    /// Every bucket a tile belongs to.
    pub fn buckets_of(&self, index: usize) -> Vec<Bucket> {
        Bucket::ALL
            .into_iter()
            .filter(|b| self.contains(*b, index))
            .collect()
    }

    /// Non-empty buckets with their sizes.
    pub fn counts(&self) -> Vec<(Bucket, usize)> {
        self.buckets
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(b, v)| (*b, v.len()))
            .collect()
    }
}

/// Bucket a tile by its world-generation rules alone.
fn sort_by_rules(tile: &LegacyTile, index: usize, sorted: &mut SortedTiles) {
    let rules = tile.anchor_rules();
    let mut placed = false;
    if rules.iter().any(|r| r.is_foreground()) {
        sorted.insert(Bucket::SpecialForeground, index);
        placed = true;
    }
    if rules.iter().any(|r| r.is_background()) {
        sorted.insert(Bucket::SpecialBackground, index);
        placed = true;
    }
    if !placed {
        sorted.insert(Bucket::Special, index);
    }
}

/// Classify legacy tiles into buckets.
///
/// Tiles whose multi-layer brush does not start with `clear` are placed in
/// `undefined` and reported as warnings.
pub fn classify(tiles: &[LegacyTile], report: &mut ValidationResult) -> SortedTiles {
    let mut sorted = SortedTiles::new();

    for (index, tile) in tiles.iter().enumerate() {
        if tile.connector || !tile.anchor_rules().is_empty() {
            sorted.insert(Bucket::Anchors, index);
        }

        let layers = tile.brush_layers();
        if layers.is_empty() {
            sort_by_rules(tile, index, &mut sorted);
            continue;
        }

        if !tile.is_well_formed() {
            report.warning(
                "sbtiled::classify::clear-first",
                format!(
                    "Tile {} has a multi-layer brush starting with '{}', skipped",
                    tile.label(),
                    layers[0].tag()
                ),
            );
            sorted.insert(Bucket::Undefined, index);
            continue;
        }

        for layer in layers {
            match layer {
                BrushLayer::Clear => {
                    if layers.len() == 1 {
                        sort_by_rules(tile, index, &mut sorted);
                    }
                }
                BrushLayer::BiomeTree | BrushLayer::BiomeItems | BrushLayer::Object(_) => {
                    sorted.insert(Bucket::Objects, index)
                }
                BrushLayer::PlayerStart => sorted.insert(Bucket::Anchors, index),
                BrushLayer::Surface { .. } => {
                    sorted.insert(Bucket::SpecialForeground, index);
                    if tile.is_biome_tile_brush() {
                        sorted.insert(Bucket::SpecialBackground, index);
                    }
                }
                BrushLayer::SurfaceBackground { .. } => {
                    sorted.insert(Bucket::SpecialBackground, index)
                }
                BrushLayer::Wire(_) => sorted.insert(Bucket::Wires, index),
                BrushLayer::Stagehand(_) => sorted.insert(Bucket::Stagehands, index),
                BrushLayer::Npc(_) => sorted.insert(Bucket::Npcs, index),
                BrushLayer::Back { .. } => sorted.insert(Bucket::Background, index),
                BrushLayer::Front { .. } | BrushLayer::Liquid { .. } => {
                    sorted.insert(Bucket::Foreground, index)
                }
                BrushLayer::Unknown { tag, .. } => {
                    report.warning(
                        "sbtiled::classify::unknown-brush",
                        format!("Tile {} uses unknown brush '{}'", tile.label(), tag),
                    );
                    sorted.insert(Bucket::Undefined, index);
                }
            }
        }
    }

    sorted
}
