//! `.dungeon` file model.

use serde::Deserialize;
use serde_json::Value;

use super::LegacyTile;

/// A legacy dungeon definition.
#[derive(Debug, Clone, Deserialize)]
pub struct DungeonFile {
    pub metadata: DungeonMetadata,

    /// Legacy RGBA catalogue; absent once a dungeon has been converted.
    #[serde(default)]
    pub tiles: Vec<LegacyTile>,

    pub parts: Vec<DungeonPart>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DungeonMetadata {
    pub name: String,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub rules: Value,
    #[serde(default)]
    pub anchor: Vec<String>,
    #[serde(default)]
    pub gravity: Option<f64>,
    #[serde(default)]
    pub max_radius: Option<f64>,
    #[serde(default)]
    pub max_parts: Option<u32>,
    #[serde(default)]
    pub protected: Option<bool>,
}

/// One part (chunk) of a dungeon.
#[derive(Debug, Clone, Deserialize)]
pub struct DungeonPart {
    pub name: String,
    #[serde(default)]
    pub rules: Option<Value>,
    pub def: PartDef,
    #[serde(default)]
    pub chance: Option<f64>,
}

/// Where a part's content comes from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<Value>")]
pub enum PartDef {
    /// Pixel-painted images: the main image followed by overlays.
    Image(Vec<String>),
    /// An already converted Tiled map.
    Tmx(String),
}

impl PartDef {
    /// The `["tmx", file]` form written for converted parts.
    pub fn tmx_value(file: &str) -> Value {
        serde_json::json!(["tmx", file])
    }
}

impl TryFrom<Vec<Value>> for PartDef {
    type Error = String;

    fn try_from(raw: Vec<Value>) -> std::result::Result<Self, Self::Error> {
        let kind = raw.first().and_then(Value::as_str);
        let payload = raw.get(1);
        match (kind, payload) {
            (Some("image"), Some(Value::String(file))) => Ok(PartDef::Image(vec![file.clone()])),
            (Some("image"), Some(Value::Array(files))) => {
                let files = files
                    .iter()
                    .map(|f| {
                        f.as_str()
                            .map(str::to_string)
                            .ok_or_else(|| format!("image part file must be a string, got {}", f))
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                if files.is_empty() {
                    return Err("image part lists no files".to_string());
                }
                Ok(PartDef::Image(files))
            }
            (Some("tmx"), Some(Value::String(file))) => Ok(PartDef::Tmx(file.clone())),
            _ => Err(format!(
                "part def must be [\"image\", [files]] or [\"tmx\", file], got {}",
                Value::Array(raw.clone())
            )),
        }
    }
}
