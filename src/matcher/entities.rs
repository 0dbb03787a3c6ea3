//! Structural extraction of NPCs, stagehands, mods and wires.
//!
//! These brushes carry their own parameters and need no tileset lookup.

use serde::Serialize;
use serde_json::Value;

use crate::types::{BrushLayer, LegacyTile, Rgba};

use super::RgbaMatch;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NpcMatch {
    pub rgba: Rgba,
    /// `npc` or `monster`; used as the property name.
    pub key: String,
    /// Species for NPCs, monster type otherwise.
    pub value: String,
    pub type_name: Option<String>,
    /// Parameters as JSON text.
    pub parameters: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagehandMatch {
    pub rgba: Rgba,
    pub kind: String,
    pub name: Option<String>,
    /// `[x1, y1, x2, y2]` in tiles, relative to the painted pixel, Y up.
    pub broadcast_area: Option<[f64; 4]>,
    pub parameters: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModMatch {
    pub rgba: Rgba,
    pub gid: u32,
    pub modifier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireMatch {
    pub rgba: Rgba,
    pub group: Option<String>,
    pub local: bool,
}

impl RgbaMatch for NpcMatch {
    fn rgba(&self) -> Rgba {
        self.rgba
    }
}

impl RgbaMatch for StagehandMatch {
    fn rgba(&self) -> Rgba {
        self.rgba
    }
}

impl RgbaMatch for ModMatch {
    fn rgba(&self) -> Rgba {
        self.rgba
    }

    fn gid(&self) -> u32 {
        self.gid
    }
}

impl RgbaMatch for WireMatch {
    fn rgba(&self) -> Rgba {
        self.rgba
    }
}

fn candidate_layers<'a>(
    tiles: &'a [LegacyTile],
    candidates: &'a [usize],
) -> impl Iterator<Item = (&'a LegacyTile, &'a BrushLayer)> {
    candidates.iter().flat_map(move |&i| {
        let tile = &tiles[i];
        tile.brush_layers().iter().map(move |layer| (tile, layer))
    })
}

pub fn match_npcs(tiles: &[LegacyTile], candidates: &[usize]) -> Vec<NpcMatch> {
    candidate_layers(tiles, candidates)
        .filter_map(|(tile, layer)| match layer {
            BrushLayer::Npc(npc) => {
                let (value, type_name) = if npc.kind == "monster" {
                    (npc.type_name.clone().unwrap_or_default(), None)
                } else {
                    (
                        npc.species.clone().unwrap_or_default(),
                        npc.type_name.clone(),
                    )
                };
                Some(NpcMatch {
                    rgba: tile.value,
                    key: npc.kind.clone(),
                    value,
                    type_name,
                    parameters: npc.parameters.as_ref().map(Value::to_string),
                })
            }
            _ => None,
        })
        .collect()
}

fn broadcast_area(value: Option<&Value>) -> Option<[f64; 4]> {
    let list = value?.as_array()?;
    match list.as_slice() {
        [a, b, c, d] => Some([a.as_f64()?, b.as_f64()?, c.as_f64()?, d.as_f64()?]),
        _ => None,
    }
}

pub fn match_stagehands(tiles: &[LegacyTile], candidates: &[usize]) -> Vec<StagehandMatch> {
    candidate_layers(tiles, candidates)
        .filter_map(|(tile, layer)| match layer {
            BrushLayer::Stagehand(stagehand) => {
                let params = stagehand.parameters.as_ref();
                Some(StagehandMatch {
                    rgba: tile.value,
                    kind: stagehand.kind.clone(),
                    name: params
                        .and_then(|p| p.get("name"))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    broadcast_area: broadcast_area(params.and_then(|p| p.get("broadcastArea"))),
                    parameters: params.map(|p| Value::Object(p.clone()).to_string()),
                })
            }
            _ => None,
        })
        .collect()
}

/// Front brushes carrying a modifier; the tile itself is not replaced.
pub fn match_mods(tiles: &[LegacyTile], candidates: &[usize]) -> Vec<ModMatch> {
    candidate_layers(tiles, candidates)
        .filter_map(|(tile, layer)| match layer {
            BrushLayer::Front {
                modifier: Some(modifier),
                ..
            } => Some(ModMatch {
                rgba: tile.value,
                gid: 0,
                modifier: modifier.clone(),
            }),
            _ => None,
        })
        .collect()
}

pub fn match_wires(tiles: &[LegacyTile], candidates: &[usize]) -> Vec<WireMatch> {
    candidate_layers(tiles, candidates)
        .filter_map(|(tile, layer)| match layer {
            BrushLayer::Wire(wire) => Some(WireMatch {
                rgba: tile.value,
                group: wire.group.clone(),
                local: wire.local,
            }),
            _ => None,
        })
        .collect()
}
