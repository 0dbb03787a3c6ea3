//! Anchor matching: player starts, chunk connectors and world-gen markers.

use serde::Serialize;

use crate::types::{gid, AnchorRule, BrushLayer, LegacyTile, Rgba, Tileset};
use crate::error::Result;

use super::RgbaMatch;

const PLAYER_START_SLOT: u32 = 3;

/// Connector slots, tested in order against the tile comment.
const CONNECTOR_SLOTS: [(&str, u32); 3] = [
    ("entrance coupler", 12),
    ("alternate coupler #2", 13),
    ("alternate coupler #3", 14),
];
const DEFAULT_CONNECTOR_SLOT: u32 = 15;

/// What made a tile an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorKind {
    PlayerStart,
    Connector,
    Rule,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnchorMatch {
    pub tile_name: String,
    pub rgba: Rgba,
    pub gid: u32,
    pub kind: AnchorKind,
}

impl RgbaMatch for AnchorMatch {
    fn rgba(&self) -> Rgba {
        self.rgba
    }

    fn gid(&self) -> u32 {
        self.gid
    }
}

fn connector_slot(tile: &LegacyTile) -> u32 {
    CONNECTOR_SLOTS
        .iter()
        .find(|(needle, _)| tile.comment_contains(needle))
        .map_or(DEFAULT_CONNECTOR_SLOT, |(_, slot)| *slot)
}

/// The miscellaneous tile carrying the marker for `rule`.
///
/// The entry must have the rule's base name as a key and a `layer`
/// property equal to the layer the rule implies (absent for foreground).
fn rule_slot(misc: &Tileset, rule: AnchorRule) -> Option<u32> {
    let layer = rule.layer().map(|l| l.name());
    misc.misc_entries()
        .find(|(_, properties)| {
            properties.contains_key(rule.base_name())
                && properties.get("layer").map(String::as_str) == layer
        })
        .map(|(index, _)| index)
}

/// Resolve anchor tiles. Tiles that resolve to nothing are left out.
pub fn match_anchors(
    tiles: &[LegacyTile],
    candidates: &[usize],
    misc: &Tileset,
    firstgid: u32,
) -> Result<Vec<AnchorMatch>> {
    let mut matches = Vec::new();
    for &index in candidates {
        let tile = &tiles[index];
        let resolved = if tile.brush_layers().contains(&BrushLayer::PlayerStart) {
            Some((PLAYER_START_SLOT, AnchorKind::PlayerStart))
        } else if tile.connector {
            Some((connector_slot(tile), AnchorKind::Connector))
        } else {
            tile.anchor_rules()
                .into_iter()
                .find_map(|rule| rule_slot(misc, rule))
                .map(|slot| (slot, AnchorKind::Rule))
        };

        if let Some((slot, kind)) = resolved {
            matches.push(AnchorMatch {
                tile_name: tile.label(),
                rgba: tile.value,
                gid: gid::from_local(slot, firstgid)?,
                kind,
            });
        }
    }
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::fixtures::{self, MISC_FIRSTGID};
    use pretty_assertions::assert_eq;

    fn connector(n: u8, comment: &str) -> LegacyTile {
        LegacyTile::new(Rgba::rgb(n, n, 0))
            .with_comment(comment)
            .as_connector()
    }

    fn slots(matches: &[AnchorMatch]) -> Vec<u32> {
        matches.iter().map(|m| m.gid - MISC_FIRSTGID).collect()
    }

    #[test]
    fn test_connector_slots_by_comment() {
        let tiles = vec![
            connector(1, "Entrance coupler"),
            connector(2, "alternate coupler #2"),
            connector(3, "Alternate Coupler #3"),
            connector(4, "some other coupler"),
        ];
        let matches = match_anchors(&tiles, &[0, 1, 2, 3], &fixtures::misc(), MISC_FIRSTGID).unwrap();
        assert_eq!(slots(&matches), vec![12, 13, 14, 15]);
        assert!(matches.iter().all(|m| m.kind == AnchorKind::Connector));
    }

    #[test]
    fn test_player_start_wins_over_connector() {
        let tiles = vec![LegacyTile::new(Rgba::rgb(1, 1, 1))
            .as_connector()
            .with_brush(vec![BrushLayer::Clear, BrushLayer::PlayerStart])];
        let matches = match_anchors(&tiles, &[0], &fixtures::misc(), MISC_FIRSTGID).unwrap();
        assert_eq!(slots(&matches), vec![3]);
        assert_eq!(matches[0].kind, AnchorKind::PlayerStart);
    }

    #[test]
    fn test_rule_anchors_use_layer_property() {
        let tiles = vec![
            LegacyTile::new(Rgba::rgb(1, 0, 0)).with_rules(&["worldGenMustContainSolidBackground"]),
            LegacyTile::new(Rgba::rgb(2, 0, 0)).with_rules(&["worldGenMustContainAirBackground"]),
            LegacyTile::new(Rgba::rgb(3, 0, 0)).with_rules(&["worldGenMustContainAirForeground"]),
        ];
        let matches = match_anchors(&tiles, &[0, 1, 2], &fixtures::misc(), MISC_FIRSTGID).unwrap();
        assert_eq!(slots(&matches), vec![4, 5, 2]);
    }

    #[test]
    fn test_unresolved_anchors_are_dropped() {
        let misc = fixtures::tileset(
            "miscellaneous",
            crate::types::TilesetKind::Miscellaneous,
            r#"{ "tilecount": 4, "tileproperties": {} }"#,
        );
        let tiles = vec![
            LegacyTile::new(Rgba::rgb(1, 0, 0)).with_rules(&["worldGenMustContainSolidBackground"]),
            connector(2, "Entrance coupler"),
        ];
        let matches = match_anchors(&tiles, &[0, 1], &misc, MISC_FIRSTGID).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].rgba, tiles[1].value);
    }
}
