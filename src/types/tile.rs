//! Legacy tile catalogue entries from `.dungeon` files.
//!
//! Each entry maps a painted RGBA value to gameplay content through a list
//! of brush layers. Brush layers arrive as `[tag, ...payload]` tuples and are
//! parsed into [`BrushLayer`] when the dungeon file is loaded.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SbError};

use super::Rgba;

/// Rule that lets a part overwrite existing terrain.
pub const ALLOW_OVERDRAWING: &str = "allowOverdrawing";

/// Which tile layer a match is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerSide {
    Front,
    Back,
}

impl LayerSide {
    /// Layer name used in the output map and in tileset `layer` properties.
    pub fn name(&self) -> &'static str {
        match self {
            LayerSide::Front => "front",
            LayerSide::Back => "back",
        }
    }
}

impl fmt::Display for LayerSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Facing of an object, as declared by a brush or a tileset entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// The world-generation rules that turn a tile into an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorRule {
    MustContainSolidBackground,
    MustContainAirBackground,
    MustContainAirForeground,
}

impl AnchorRule {
    pub const ALL: [AnchorRule; 3] = [
        AnchorRule::MustContainSolidBackground,
        AnchorRule::MustContainAirBackground,
        AnchorRule::MustContainAirForeground,
    ];

    /// Full rule name as written in `.dungeon` files.
    pub fn name(&self) -> &'static str {
        match self {
            AnchorRule::MustContainSolidBackground => "worldGenMustContainSolidBackground",
            AnchorRule::MustContainAirBackground => "worldGenMustContainAirBackground",
            AnchorRule::MustContainAirForeground => "worldGenMustContainAirForeground",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }

    /// Rule name without its `Background`/`Foreground` suffix.
    pub fn base_name(&self) -> &'static str {
        let name = self.name();
        name.strip_suffix("Background")
            .or_else(|| name.strip_suffix("Foreground"))
            .unwrap_or(name)
    }

    /// Layer implied by the rule: `Background` rules live on the back layer,
    /// foreground rules carry no layer.
    pub fn layer(&self) -> Option<LayerSide> {
        if self.name().ends_with("Background") {
            Some(LayerSide::Back)
        } else {
            None
        }
    }

    pub fn is_foreground(&self) -> bool {
        self.name().ends_with("Foreground")
    }

    pub fn is_background(&self) -> bool {
        self.name().ends_with("Background")
    }
}

/// Wire group membership.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireBrush {
    pub group: Option<String>,
    pub local: bool,
}

/// Stagehand placement parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagehandBrush {
    pub kind: String,
    pub parameters: Option<Map<String, Value>>,
}

/// NPC or monster spawn parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NpcBrush {
    /// `npc` or `monster`.
    pub kind: String,
    pub species: Option<String>,
    pub type_name: Option<String>,
    pub parameters: Option<Value>,
}

/// Object placement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectBrush {
    pub name: String,
    pub direction: Option<Direction>,
    pub parameters: Option<Value>,
}

/// One layer of a legacy brush.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Value>", into = "Vec<Value>")]
pub enum BrushLayer {
    Clear,
    Front { material: String, modifier: Option<String> },
    Back { material: String, modifier: Option<String> },
    Liquid { liquid: String },
    Surface { variant: Option<u32> },
    SurfaceBackground { variant: Option<u32> },
    BiomeTree,
    BiomeItems,
    PlayerStart,
    Wire(WireBrush),
    Stagehand(StagehandBrush),
    Npc(NpcBrush),
    Object(ObjectBrush),
    Unknown { tag: String, payload: Vec<Value> },
}

impl BrushLayer {
    /// The tag this layer was parsed from.
    pub fn tag(&self) -> &str {
        match self {
            BrushLayer::Clear => "clear",
            BrushLayer::Front { .. } => "front",
            BrushLayer::Back { .. } => "back",
            BrushLayer::Liquid { .. } => "liquid",
            BrushLayer::Surface { .. } => "surface",
            BrushLayer::SurfaceBackground { .. } => "surfacebackground",
            BrushLayer::BiomeTree => "biometree",
            BrushLayer::BiomeItems => "biomeitems",
            BrushLayer::PlayerStart => "playerstart",
            BrushLayer::Wire(_) => "wire",
            BrushLayer::Stagehand(_) => "stagehand",
            BrushLayer::Npc(_) => "npc",
            BrushLayer::Object(_) => "object",
            BrushLayer::Unknown { tag, .. } => tag,
        }
    }
}

fn payload_str(payload: &[Value], index: usize, tag: &str, what: &str) -> std::result::Result<String, String> {
    match payload.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(format!("{} brush: {} must be a string, got {}", tag, what, other)),
        None => Err(format!("{} brush: missing {}", tag, what)),
    }
}

fn payload_object<'a>(payload: &'a [Value], index: usize) -> Option<&'a Map<String, Value>> {
    payload.get(index).and_then(Value::as_object)
}

fn optional_string(object: Option<&Map<String, Value>>, key: &str) -> Option<String> {
    object
        .and_then(|o| o.get(key))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn surface_variant(payload: &[Value]) -> std::result::Result<Option<u32>, String> {
    let raw = match payload.first() {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(o)) => match o.get("variant") {
            None => return Ok(None),
            Some(v) => v,
        },
        Some(v) => v,
    };
    raw.as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .map(Some)
        .ok_or_else(|| format!("surface brush: variant must be a small number, got {}", raw))
}

/// A modifier payload is normally a mod name; anything else is kept as JSON text.
fn modifier(payload: &[Value]) -> Option<String> {
    payload.get(1).map(|v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

impl TryFrom<Vec<Value>> for BrushLayer {
    type Error = String;

    fn try_from(raw: Vec<Value>) -> std::result::Result<Self, Self::Error> {
        let Some((head, payload)) = raw.split_first() else {
            return Err("empty brush layer".to_string());
        };
        let tag = head
            .as_str()
            .ok_or_else(|| format!("brush tag must be a string, got {}", head))?;

        let layer = match tag {
            "clear" => BrushLayer::Clear,
            "front" => BrushLayer::Front {
                material: payload_str(payload, 0, tag, "material")?,
                modifier: modifier(payload),
            },
            "back" => BrushLayer::Back {
                material: payload_str(payload, 0, tag, "material")?,
                modifier: modifier(payload),
            },
            "liquid" => BrushLayer::Liquid {
                liquid: payload_str(payload, 0, tag, "liquid name")?,
            },
            "surface" => BrushLayer::Surface {
                variant: surface_variant(payload)?,
            },
            "surfacebackground" => BrushLayer::SurfaceBackground {
                variant: surface_variant(payload)?,
            },
            "biometree" => BrushLayer::BiomeTree,
            "biomeitems" => BrushLayer::BiomeItems,
            "playerstart" => BrushLayer::PlayerStart,
            "wire" => {
                let params = payload_object(payload, 0);
                BrushLayer::Wire(WireBrush {
                    group: optional_string(params, "group"),
                    local: params
                        .and_then(|o| o.get("local"))
                        .and_then(Value::as_bool)
                        .unwrap_or(false),
                })
            }
            "stagehand" => {
                let params = payload_object(payload, 0)
                    .ok_or_else(|| "stagehand brush: missing parameter object".to_string())?;
                BrushLayer::Stagehand(StagehandBrush {
                    kind: optional_string(Some(params), "type")
                        .ok_or_else(|| "stagehand brush: missing type".to_string())?,
                    parameters: params
                        .get("parameters")
                        .and_then(Value::as_object)
                        .cloned(),
                })
            }
            "npc" => {
                let params = payload_object(payload, 0)
                    .ok_or_else(|| "npc brush: missing parameter object".to_string())?;
                BrushLayer::Npc(NpcBrush {
                    kind: optional_string(Some(params), "kind").unwrap_or_else(|| "npc".to_string()),
                    species: optional_string(Some(params), "species"),
                    type_name: optional_string(Some(params), "typeName"),
                    parameters: params.get("parameters").cloned(),
                })
            }
            "object" => {
                let params = payload_object(payload, 1);
                let direction = match optional_string(params, "direction") {
                    Some(d) => Some(
                        Direction::parse(&d)
                            .ok_or_else(|| format!("object brush: unknown direction '{}'", d))?,
                    ),
                    None => None,
                };
                BrushLayer::Object(ObjectBrush {
                    name: payload_str(payload, 0, tag, "object name")?,
                    direction,
                    parameters: params.and_then(|o| o.get("parameters")).cloned(),
                })
            }
            other => BrushLayer::Unknown {
                tag: other.to_string(),
                payload: payload.to_vec(),
            },
        };
        Ok(layer)
    }
}

impl From<BrushLayer> for Vec<Value> {
    fn from(layer: BrushLayer) -> Self {
        let mut out = vec![Value::String(layer.tag().to_string())];
        match layer {
            BrushLayer::Front { material, modifier } | BrushLayer::Back { material, modifier } => {
                out.push(Value::String(material));
                out.extend(modifier.map(Value::String));
            }
            BrushLayer::Liquid { liquid } => out.push(Value::String(liquid)),
            BrushLayer::Surface { variant } | BrushLayer::SurfaceBackground { variant } => {
                if let Some(v) = variant {
                    out.push(serde_json::json!({ "variant": v }));
                }
            }
            BrushLayer::Wire(w) => out.push(serde_json::json!({ "group": w.group, "local": w.local })),
            BrushLayer::Stagehand(s) => {
                out.push(serde_json::json!({ "type": s.kind, "parameters": s.parameters }))
            }
            BrushLayer::Npc(n) => out.push(serde_json::json!({
                "kind": n.kind,
                "species": n.species,
                "typeName": n.type_name,
                "parameters": n.parameters,
            })),
            BrushLayer::Object(o) => {
                out.push(Value::String(o.name));
                out.push(serde_json::json!({ "direction": o.direction, "parameters": o.parameters }));
            }
            BrushLayer::Unknown { payload, .. } => out.extend(payload),
            BrushLayer::Clear
            | BrushLayer::BiomeTree
            | BrushLayer::BiomeItems
            | BrushLayer::PlayerStart => {}
        }
        out
    }
}

/// A legacy tile catalogue entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyTile {
    pub value: Rgba,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brush: Option<Vec<BrushLayer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Value>>,
    #[serde(default)]
    pub connector: bool,
}

impl LegacyTile {
    /// Create a tile with only a value; used by tests and builders.
    pub fn new(value: Rgba) -> Self {
        Self {
            value,
            comment: None,
            brush: None,
            rules: None,
            connector: false,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_brush(mut self, brush: Vec<BrushLayer>) -> Self {
        self.brush = Some(brush);
        self
    }

    pub fn with_rules(mut self, rules: &[&str]) -> Self {
        self.rules = Some(
            rules
                .iter()
                .map(|r| Value::Array(vec![Value::String(r.to_string())]))
                .collect(),
        );
        self
    }

    pub fn as_connector(mut self) -> Self {
        self.connector = true;
        self
    }

    /// Short human-readable label: the comment when present, else the value.
    pub fn label(&self) -> String {
        match &self.comment {
            Some(c) => format!("{} ({})", self.value, c),
            None => self.value.to_string(),
        }
    }

    /// Case-insensitive comment search.
    pub fn comment_contains(&self, needle: &str) -> bool {
        self.comment
            .as_deref()
            .is_some_and(|c| c.to_lowercase().contains(&needle.to_lowercase()))
    }

    pub fn is_magic_pink(&self) -> bool {
        self.comment_contains("magic pink")
    }

    pub fn is_biome_tile_brush(&self) -> bool {
        self.comment_contains("biome tile brush")
    }

    /// Every string leaf of the (possibly nested) rules array.
    pub fn rule_names(&self) -> Vec<&str> {
        fn collect<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
            match value {
                Value::String(s) => out.push(s),
                Value::Array(items) => items.iter().for_each(|v| collect(v, out)),
                _ => {}
            }
        }
        let mut out = Vec::new();
        for rule in self.rules.iter().flatten() {
            collect(rule, &mut out);
        }
        out
    }

    pub fn has_rule(&self, name: &str) -> bool {
        self.rule_names().contains(&name)
    }

    pub fn allows_overdrawing(&self) -> bool {
        self.has_rule(ALLOW_OVERDRAWING)
    }

    /// Anchor rules in declaration order.
    pub fn anchor_rules(&self) -> Vec<AnchorRule> {
        self.rule_names()
            .into_iter()
            .filter_map(AnchorRule::from_name)
            .collect()
    }

    pub fn brush_layers(&self) -> &[BrushLayer] {
        self.brush.as_deref().unwrap_or(&[])
    }

    /// Whether the multi-layer brush starts with the mandatory clear layer.
    pub fn is_well_formed(&self) -> bool {
        let layers = self.brush_layers();
        layers.len() <= 1 || layers[0] == BrushLayer::Clear
    }

    /// Brush layers after the leading clear layer.
    ///
    /// Fails for multi-layer brushes that do not start with `clear`.
    pub fn content_layers(&self) -> Result<&[BrushLayer]> {
        let layers = self.brush_layers();
        if !self.is_well_formed() {
            return Err(SbError::MalformedBrush {
                tile: self.label(),
                message: format!("first layer is '{}', expected 'clear'", layers[0].tag()),
            });
        }
        match layers.first() {
            Some(BrushLayer::Clear) => Ok(&layers[1..]),
            _ => Ok(layers),
        }
    }

    /// Whether the brush consists of a bare clear layer.
    pub fn is_clear_only(&self) -> bool {
        matches!(self.brush_layers(), [BrushLayer::Clear])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(json: &str) -> LegacyTile {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_material_tile() {
        let tile = parse(
            r#"{ "value": [120, 120, 120, 255], "comment": "stone wall",
                 "brush": [["clear"], ["front", "cobblestone"], ["back", "cobblestone", "moss"]] }"#,
        );
        assert_eq!(
            tile.brush_layers(),
            &[
                BrushLayer::Clear,
                BrushLayer::Front {
                    material: "cobblestone".to_string(),
                    modifier: None
                },
                BrushLayer::Back {
                    material: "cobblestone".to_string(),
                    modifier: Some("moss".to_string())
                },
            ]
        );
        assert_eq!(tile.content_layers().unwrap().len(), 2);
    }

    #[test]
    fn test_parse_object_with_direction() {
        let tile = parse(
            r#"{ "value": [1, 2, 3], "brush": [["object", "woodenchair", { "direction": "right" }]] }"#,
        );
        match &tile.brush_layers()[0] {
            BrushLayer::Object(o) => {
                assert_eq!(o.name, "woodenchair");
                assert_eq!(o.direction, Some(Direction::Right));
            }
            other => panic!("unexpected layer {:?}", other),
        }
    }

    #[test]
    fn test_parse_surface_variant() {
        let tile = parse(r#"{ "value": [1, 2, 3], "brush": [["surface", { "variant": 2 }]] }"#);
        assert_eq!(tile.brush_layers(), &[BrushLayer::Surface { variant: Some(2) }]);

        let tile = parse(r#"{ "value": [1, 2, 3], "brush": [["surface"]] }"#);
        assert_eq!(tile.brush_layers(), &[BrushLayer::Surface { variant: None }]);
    }

    #[test]
    fn test_oversized_surface_variant_is_rejected() {
        let result: serde_json::Result<LegacyTile> = serde_json::from_str(
            r#"{ "value": [1, 2, 3], "brush": [["surface", { "variant": 4294967296 }]] }"#,
        );
        let message = result.unwrap_err().to_string();
        assert!(message.contains("variant must be a small number"), "{}", message);
    }

    #[test]
    fn test_parse_npc() {
        let tile = parse(
            r#"{ "value": [1, 2, 3], "brush": [["npc", { "kind": "npc", "species": "human",
                 "typeName": "villager", "parameters": { "level": 2 } }]] }"#,
        );
        match &tile.brush_layers()[0] {
            BrushLayer::Npc(n) => {
                assert_eq!(n.kind, "npc");
                assert_eq!(n.species.as_deref(), Some("human"));
                assert_eq!(n.type_name.as_deref(), Some("villager"));
                assert!(n.parameters.is_some());
            }
            other => panic!("unexpected layer {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_tag_is_kept() {
        let tile = parse(r#"{ "value": [1, 2, 3], "brush": [["sparkle", 4]] }"#);
        assert_eq!(tile.brush_layers()[0].tag(), "sparkle");
    }

    #[test]
    fn test_front_without_material_is_an_error() {
        let result = serde_json::from_str::<LegacyTile>(r#"{ "value": [1, 2, 3], "brush": [["front"]] }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_content_layers_rejects_missing_clear() {
        let tile = parse(r#"{ "value": [1, 2, 3], "brush": [["front", "dirt"], ["back", "dirt"]] }"#);
        assert!(!tile.is_well_formed());
        assert!(matches!(
            tile.content_layers(),
            Err(SbError::MalformedBrush { .. })
        ));
    }

    #[test]
    fn test_rule_names_flatten_nested_arrays() {
        let tile = parse(
            r#"{ "value": [1, 2, 3], "rules": [["worldGenMustContainAirBackground"], [["allowOverdrawing"]], ["maxSpawnCount", [1]]] }"#,
        );
        assert_eq!(
            tile.rule_names(),
            vec!["worldGenMustContainAirBackground", "allowOverdrawing", "maxSpawnCount"]
        );
        assert!(tile.allows_overdrawing());
        assert_eq!(tile.anchor_rules(), vec![AnchorRule::MustContainAirBackground]);
    }

    #[test]
    fn test_anchor_rule_names() {
        assert_eq!(
            AnchorRule::MustContainSolidBackground.base_name(),
            "worldGenMustContainSolid"
        );
        assert_eq!(
            AnchorRule::MustContainAirForeground.base_name(),
            "worldGenMustContainAir"
        );
        assert_eq!(
            AnchorRule::MustContainAirBackground.layer(),
            Some(LayerSide::Back)
        );
        assert_eq!(AnchorRule::MustContainAirForeground.layer(), None);
    }

    #[test]
    fn test_comment_matching_is_case_insensitive() {
        let tile = LegacyTile::new(Rgba::rgb(255, 0, 220)).with_comment("Magic Pink, a no-op value");
        assert!(tile.is_magic_pink());
        assert!(!tile.is_biome_tile_brush());
    }

    #[test]
    fn test_brush_layer_serializes_back_to_tuple() {
        let layer = BrushLayer::Front {
            material: "dirt".to_string(),
            modifier: Some("grass".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&layer).unwrap(),
            serde_json::json!(["front", "dirt", "grass"])
        );
    }
}
