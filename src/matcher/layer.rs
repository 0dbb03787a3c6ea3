//! Front and back tile-layer matching.
//!
//! Material-bearing tiles are looked up by name in the materials, supports
//! and liquids catalogues. Whatever is left falls through to fixed slots of
//! the miscellaneous tileset.

use serde::Serialize;

use crate::catalogue::BaseTilesets;
use crate::classify::{Bucket, SortedTiles};
use crate::error::{Result, SbError};
use crate::types::{gid, AnchorRule, BrushLayer, LayerSide, LegacyTile, Rgba, Tileset, TilesetKind};

use super::{misc_firstgid, MatchTable, RgbaMatch};

pub(crate) const MAGIC_PINK_SLOT: u32 = 1;
pub(crate) const SURFACE_SLOT: u32 = 8;
pub(crate) const OVERDRAW_SLOT: u32 = 11;

/// One resolved colour for a tile layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerTileMatch {
    pub tile_name: String,
    pub rgba: Rgba,
    pub gid: u32,
}

impl LayerTileMatch {
    fn new(tile: &LegacyTile, gid: u32) -> Self {
        Self {
            tile_name: tile.label(),
            rgba: tile.value,
            gid,
        }
    }
}

impl RgbaMatch for LayerTileMatch {
    fn rgba(&self) -> Rgba {
        self.rgba
    }

    fn gid(&self) -> u32 {
        self.gid
    }
}

/// The name a brush layer declares for `side` in a tileset of `kind`.
fn declared_name(layer: &BrushLayer, side: LayerSide, kind: TilesetKind) -> Option<&str> {
    match (layer, side, kind) {
        (BrushLayer::Front { material, .. }, LayerSide::Front, TilesetKind::Materials | TilesetKind::Supports)
        | (BrushLayer::Back { material, .. }, LayerSide::Back, TilesetKind::Materials | TilesetKind::Supports) => {
            Some(material.as_str())
        }
        (BrushLayer::Liquid { liquid }, LayerSide::Front, TilesetKind::Liquids) => Some(liquid.as_str()),
        _ => None,
    }
}

/// Match candidates against a materials, supports or liquids catalogue.
pub fn match_tilelayer(
    tiles: &[LegacyTile],
    candidates: &[usize],
    side: LayerSide,
    tileset: &Tileset,
    firstgid: u32,
) -> Result<MatchTable<LayerTileMatch>> {
    let mut table = MatchTable::new(candidates);
    for (index, slot) in table.slots_mut() {
        let tile = &tiles[index];
        for layer in tile.content_layers()? {
            let Some(name) = declared_name(layer, side, tileset.kind) else {
                continue;
            };
            let found = match tileset.kind {
                TilesetKind::Liquids => tileset.find_liquid(name),
                _ => tileset.find_material(name),
            };
            if let Some(local) = found {
                *slot = Some(LayerTileMatch::new(tile, gid::from_local(local, firstgid)?));
                break;
            }
        }
    }
    Ok(table)
}

fn misc_gid(slot: u32, firstgid: u32) -> Result<u32> {
    gid::from_local(slot, firstgid)
}

/// The magic pink placeholder GID as written on the back layer.
pub fn magic_pink_gid(misc_firstgid: u32) -> Result<u32> {
    gid::apply_flags(misc_gid(MAGIC_PINK_SLOT, misc_firstgid)?, false, true, false)
}

fn no_op_gid(side: LayerSide, firstgid: u32) -> Result<u32> {
    match side {
        LayerSide::Front => Ok(0),
        LayerSide::Back => magic_pink_gid(firstgid),
    }
}

fn air_gid(tile: &LegacyTile, firstgid: u32) -> Result<u32> {
    if tile.allows_overdrawing() {
        misc_gid(OVERDRAW_SLOT, firstgid)
    } else {
        Ok(0)
    }
}

fn surface_gid(variant: Option<u32>, firstgid: u32) -> Result<Option<u32>> {
    match variant.unwrap_or(0) {
        v @ 0..=2 => Ok(Some(misc_gid(SURFACE_SLOT + v, firstgid)?)),
        _ => Ok(None),
    }
}

/// Resolve a tile with no brush content from its world-generation rules.
fn resolve_by_rules(tile: &LegacyTile, side: LayerSide, firstgid: u32) -> Result<Option<u32>> {
    let rules = tile.anchor_rules();
    if rules.is_empty() {
        return no_op_gid(side, firstgid).map(Some);
    }
    for rule in rules {
        let resolved = match (rule, side) {
            (AnchorRule::MustContainSolidBackground, LayerSide::Back) => {
                Some(misc_gid(SURFACE_SLOT, firstgid)?)
            }
            (AnchorRule::MustContainAirBackground, LayerSide::Back) => Some(air_gid(tile, firstgid)?),
            (AnchorRule::MustContainAirForeground, LayerSide::Front) => Some(0),
            _ => None,
        };
        if resolved.is_some() {
            return Ok(resolved);
        }
    }
    Ok(None)
}

fn resolve_misc(tile: &LegacyTile, side: LayerSide, firstgid: u32) -> Result<Option<u32>> {
    if tile.is_magic_pink() {
        return no_op_gid(side, firstgid).map(Some);
    }

    let layers = tile.brush_layers();
    if layers.is_empty() {
        return resolve_by_rules(tile, side, firstgid);
    }
    if tile.is_clear_only() {
        return air_gid(tile, firstgid).map(Some);
    }

    for layer in tile.content_layers()? {
        let resolved = match (layer, side) {
            (BrushLayer::Surface { variant }, LayerSide::Front) => surface_gid(*variant, firstgid)?,
            (BrushLayer::Surface { variant }, LayerSide::Back) if tile.is_biome_tile_brush() => {
                surface_gid(*variant, firstgid)?
            }
            (BrushLayer::SurfaceBackground { variant }, LayerSide::Back) => {
                surface_gid(*variant, firstgid)?
            }
            _ => None,
        };
        if resolved.is_some() {
            return Ok(resolved);
        }
    }
    Ok(None)
}

/// Match candidates against the fixed slots of the miscellaneous tileset.
pub fn match_misc(
    tiles: &[LegacyTile],
    candidates: &[usize],
    side: LayerSide,
    firstgid: u32,
) -> Result<MatchTable<LayerTileMatch>> {
    let mut table = MatchTable::new(candidates);
    for (index, slot) in table.slots_mut() {
        let tile = &tiles[index];
        if let Some(gid) = resolve_misc(tile, side, firstgid)? {
            *slot = Some(LayerTileMatch::new(tile, gid));
        }
    }
    Ok(table)
}

/// Build the full match table for one tile layer.
///
/// Passes run materials, supports, liquids, then miscellaneous; the first
/// pass to resolve a tile wins.
pub fn match_layer(
    tiles: &[LegacyTile],
    sorted: &SortedTiles,
    base: &BaseTilesets,
    side: LayerSide,
) -> Result<MatchTable<LayerTileMatch>> {
    let candidates = sorted.union(&Bucket::layer_candidates(side));
    let mut table = MatchTable::new(&candidates);

    for (tileset, firstgid) in base.material_passes() {
        let firstgid = firstgid.ok_or_else(|| SbError::Match {
            message: format!("Tileset '{}' is not referenced", tileset.name),
            help: None,
        })?;
        table.fill_missing(match_tilelayer(tiles, &candidates, side, tileset, firstgid)?)?;
    }
    table.fill_missing(match_misc(tiles, &candidates, side, misc_firstgid(base)?)?)?;

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::matcher::fixtures::{self, MISC_FIRSTGID};
    use crate::validation::ValidationResult;
    use pretty_assertions::assert_eq;

    fn tile(n: u8) -> LegacyTile {
        LegacyTile::new(Rgba::rgb(n, 0, 0))
    }

    fn material(n: u8, front: &str, back: &str) -> LegacyTile {
        tile(n).with_brush(vec![
            BrushLayer::Clear,
            BrushLayer::Front {
                material: front.to_string(),
                modifier: None,
            },
            BrushLayer::Back {
                material: back.to_string(),
                modifier: None,
            },
        ])
    }

    fn gids(table: &MatchTable<LayerTileMatch>) -> Vec<(usize, Option<u32>)> {
        table.slots().map(|(i, m)| (i, m.map(|m| m.gid))).collect()
    }

    fn run(tiles: &[LegacyTile], side: LayerSide) -> MatchTable<LayerTileMatch> {
        let sorted = classify(tiles, &mut ValidationResult::new());
        match_layer(tiles, &sorted, &fixtures::base(), side).unwrap()
    }

    #[test]
    fn test_material_lookup_per_side() {
        let tiles = vec![material(1, "dirt", "cobblestone")];
        assert_eq!(gids(&run(&tiles, LayerSide::Front)), vec![(0, Some(1))]);
        assert_eq!(gids(&run(&tiles, LayerSide::Back)), vec![(0, Some(4))]);
    }

    #[test]
    fn test_supports_and_liquids_follow_materials() {
        let tiles = vec![
            material(1, "woodenplatform", "woodenplatform"),
            tile(2).with_brush(vec![BrushLayer::Liquid {
                liquid: "water".to_string(),
            }]),
        ];
        // supports start at 11, liquids at 16
        assert_eq!(
            gids(&run(&tiles, LayerSide::Front)),
            vec![(0, Some(13)), (1, Some(17))]
        );
        assert_eq!(gids(&run(&tiles, LayerSide::Back)), vec![(0, Some(13))]);
    }

    #[test]
    fn test_unknown_material_stays_unmatched() {
        let tiles = vec![material(1, "unobtainium", "dirt")];
        let front = run(&tiles, LayerSide::Front);
        assert_eq!(front.unmatched(), vec![0]);
        assert_eq!(gids(&run(&tiles, LayerSide::Back)), vec![(0, Some(1))]);
    }

    #[test]
    fn test_magic_pink_front_and_back() {
        let tiles = vec![tile(1)
            .with_comment("magic pink brush")
            .with_brush(vec![BrushLayer::Clear])];
        let pink = magic_pink_gid(MISC_FIRSTGID).unwrap();
        assert_eq!(pink, (1 + MISC_FIRSTGID) | gid::FLIPPED_HORIZONTALLY);
        assert_eq!(gids(&run(&tiles, LayerSide::Front)), vec![(0, Some(0))]);
        assert_eq!(gids(&run(&tiles, LayerSide::Back)), vec![(0, Some(pink))]);
    }

    #[test]
    fn test_clear_is_empty_unless_overdrawing() {
        let tiles = vec![
            tile(1).with_brush(vec![BrushLayer::Clear]),
            tile(2)
                .with_brush(vec![BrushLayer::Clear])
                .with_rules(&["allowOverdrawing"]),
        ];
        assert_eq!(
            gids(&run(&tiles, LayerSide::Back)),
            vec![(0, Some(0)), (1, Some(MISC_FIRSTGID + 11))]
        );
    }

    #[test]
    fn test_world_gen_rules_without_brush() {
        let tiles = vec![
            tile(1).with_rules(&["worldGenMustContainSolidBackground"]),
            tile(2).with_rules(&["worldGenMustContainAirBackground", "allowOverdrawing"]),
            tile(3).with_rules(&["worldGenMustContainAirForeground"]),
        ];
        assert_eq!(
            gids(&run(&tiles, LayerSide::Back)),
            vec![(0, Some(MISC_FIRSTGID + 8)), (1, Some(MISC_FIRSTGID + 11))]
        );
        assert_eq!(gids(&run(&tiles, LayerSide::Front)), vec![(2, Some(0))]);
    }

    #[test]
    fn test_bare_connector_is_a_no_op() {
        let tiles = vec![tile(1).as_connector().with_comment("Entrance coupler")];
        assert_eq!(gids(&run(&tiles, LayerSide::Front)), vec![(0, Some(0))]);
        assert_eq!(
            gids(&run(&tiles, LayerSide::Back)),
            vec![(0, Some(magic_pink_gid(MISC_FIRSTGID).unwrap()))]
        );
    }

    #[test]
    fn test_surface_variants() {
        let tiles = vec![
            tile(1).with_brush(vec![BrushLayer::Surface { variant: None }]),
            tile(2).with_brush(vec![BrushLayer::Surface { variant: Some(2) }]),
            tile(3).with_brush(vec![BrushLayer::SurfaceBackground { variant: Some(1) }]),
            tile(4).with_brush(vec![BrushLayer::Surface { variant: Some(7) }]),
        ];
        assert_eq!(
            gids(&run(&tiles, LayerSide::Front)),
            vec![
                (0, Some(MISC_FIRSTGID + 8)),
                (1, Some(MISC_FIRSTGID + 10)),
                (3, None)
            ]
        );
        assert_eq!(gids(&run(&tiles, LayerSide::Back)), vec![(2, Some(MISC_FIRSTGID + 9))]);
    }

    #[test]
    fn test_biome_tile_brush_renders_on_both_layers() {
        let tiles = vec![tile(1)
            .with_comment("biome tile brush")
            .with_brush(vec![BrushLayer::Clear, BrushLayer::Surface { variant: None }])];
        let expected = vec![(0, Some(MISC_FIRSTGID + 8))];
        assert_eq!(gids(&run(&tiles, LayerSide::Front)), expected);
        assert_eq!(gids(&run(&tiles, LayerSide::Back)), expected);
    }

    #[test]
    fn test_match_tilelayer_rejects_malformed_brush() {
        let tiles = vec![tile(1).with_brush(vec![
            BrushLayer::Front {
                material: "dirt".to_string(),
                modifier: None,
            },
            BrushLayer::Clear,
        ])];
        let base = fixtures::base();
        let result = match_tilelayer(&tiles, &[0], LayerSide::Front, &base.materials, 1);
        assert!(matches!(result, Err(SbError::MalformedBrush { .. })));
    }
}
