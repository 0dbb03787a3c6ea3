//! Tileset catalogue files.
//!
//! Catalogues are Tiled tileset JSON documents whose per-tile properties
//! describe what each tile stands for in game terms (`material`, `liquid`,
//! `object`, world-generation markers). Entries are validated against the
//! tileset kind when loaded so matching never sees an untyped property bag.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, SbError};

use super::Direction;

/// Default object footprint in pixels when a tileset carries no image size.
pub const DEFAULT_TILE_PIXELS: u32 = 8;

/// The role a tileset plays in matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TilesetKind {
    Materials,
    Supports,
    Liquids,
    Miscellaneous,
    Objects,
}

impl TilesetKind {
    /// Property every entry of this kind must carry.
    pub fn required_key(&self) -> Option<&'static str> {
        match self {
            TilesetKind::Materials | TilesetKind::Supports => Some("material"),
            TilesetKind::Liquids => Some("liquid"),
            TilesetKind::Objects => Some("object"),
            TilesetKind::Miscellaneous => None,
        }
    }
}

/// An object tile and its orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectEntry {
    pub object: String,
    pub direction: Option<Direction>,
    pub width: u32,
    pub height: u32,
}

/// A validated catalogue entry.
#[derive(Debug, Clone, PartialEq)]
pub enum TileEntry {
    Material { material: String },
    Liquid { liquid: String },
    Misc { properties: BTreeMap<String, String> },
    Object(ObjectEntry),
}

/// A loaded tileset catalogue.
#[derive(Debug, Clone)]
pub struct Tileset {
    pub name: String,
    pub kind: TilesetKind,
    pub tilecount: u32,
    entries: BTreeMap<u32, TileEntry>,
    /// Entries dropped at load time for missing their required property.
    pub skipped: usize,
}

#[derive(Deserialize)]
struct RawTileset {
    tilecount: u32,
    #[serde(default)]
    tileproperties: BTreeMap<String, BTreeMap<String, Value>>,
    #[serde(default)]
    tiles: Option<Value>,
}

fn property_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_index(key: &str, tileset: &str) -> Result<u32> {
    key.parse::<u32>().map_err(|_| SbError::Parse {
        message: format!("Tileset '{}' has a non-numeric tile index '{}'", tileset, key),
        help: None,
    })
}

/// Per-tile data from the Tiled `tiles` section, in either the keyed
/// (`{"0": {...}}`) or the listed (`[{"id": 0, ...}]`) form.
fn tile_records<'a>(
    tiles: Option<&'a Value>,
    tileset: &str,
) -> Result<Vec<(u32, &'a serde_json::Map<String, Value>)>> {
    let mut records = Vec::new();
    match tiles {
        Some(Value::Object(map)) => {
            for (key, record) in map {
                if let Some(record) = record.as_object() {
                    records.push((parse_index(key, tileset)?, record));
                }
            }
        }
        Some(Value::Array(list)) => {
            for record in list.iter().filter_map(Value::as_object) {
                if let Some(id) = record.get("id").and_then(Value::as_u64) {
                    records.push((id as u32, record));
                }
            }
        }
        _ => {}
    }
    Ok(records)
}

impl Tileset {
    /// Build a tileset from an already parsed catalogue document.
    pub fn from_value(name: &str, kind: TilesetKind, value: Value) -> Result<Self> {
        let raw: RawTileset = serde_json::from_value(value).map_err(|e| SbError::Parse {
            message: format!("Invalid tileset '{}': {}", name, e),
            help: Some("Tilesets need at least 'tilecount' and 'tileproperties'".to_string()),
        })?;

        let mut properties: BTreeMap<u32, BTreeMap<String, String>> = BTreeMap::new();
        for (key, bag) in &raw.tileproperties {
            let index = parse_index(key, name)?;
            properties.insert(
                index,
                bag.iter().map(|(k, v)| (k.clone(), property_text(v))).collect(),
            );
        }

        let mut sizes: BTreeMap<u32, (u32, u32)> = BTreeMap::new();
        for (index, record) in tile_records(raw.tiles.as_ref(), name)? {
            let dim = |key: &str| record.get(key).and_then(Value::as_u64).map(|v| v as u32);
            if let (Some(w), Some(h)) = (dim("imagewidth"), dim("imageheight")) {
                sizes.insert(index, (w, h));
            }
            // Newer Tiled versions list properties inline.
            if let Some(list) = record.get("properties").and_then(Value::as_array) {
                let bag = properties.entry(index).or_default();
                for prop in list.iter().filter_map(Value::as_object) {
                    if let (Some(k), Some(v)) = (prop.get("name").and_then(Value::as_str), prop.get("value")) {
                        bag.insert(k.to_string(), property_text(v));
                    }
                }
            }
        }

        let mut entries = BTreeMap::new();
        let mut skipped = 0;
        for (index, mut bag) in properties {
            let entry = match kind {
                TilesetKind::Materials | TilesetKind::Supports => {
                    bag.remove("material").map(|material| TileEntry::Material { material })
                }
                TilesetKind::Liquids => bag.remove("liquid").map(|liquid| TileEntry::Liquid { liquid }),
                TilesetKind::Objects => bag.remove("object").map(|object| {
                    let (width, height) = sizes
                        .get(&index)
                        .copied()
                        .unwrap_or((DEFAULT_TILE_PIXELS, DEFAULT_TILE_PIXELS));
                    TileEntry::Object(ObjectEntry {
                        object,
                        direction: bag.get("tilesetDirection").and_then(|d| Direction::parse(d)),
                        width,
                        height,
                    })
                }),
                TilesetKind::Miscellaneous => Some(TileEntry::Misc { properties: bag }),
            };
            match entry {
                Some(entry) => {
                    entries.insert(index, entry);
                }
                None => skipped += 1,
            }
        }

        Ok(Self {
            name: name.to_string(),
            kind,
            tilecount: raw.tilecount,
            entries,
            skipped,
        })
    }

    /// Parse a catalogue from JSON text (comments already stripped).
    pub fn from_json(name: &str, kind: TilesetKind, json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).map_err(|e| SbError::Parse {
            message: format!("Invalid JSON in tileset '{}': {}", name, e),
            help: None,
        })?;
        Self::from_value(name, kind, value)
    }

    /// Entries in ascending tile index order.
    pub fn entries(&self) -> impl Iterator<Item = (u32, &TileEntry)> {
        self.entries.iter().map(|(i, e)| (*i, e))
    }

    pub fn get(&self, index: u32) -> Option<&TileEntry> {
        self.entries.get(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First tile whose `material` equals `name`.
    pub fn find_material(&self, name: &str) -> Option<u32> {
        self.entries().find_map(|(i, e)| match e {
            TileEntry::Material { material } if material == name => Some(i),
            _ => None,
        })
    }

    /// First tile whose `liquid` equals `name`.
    pub fn find_liquid(&self, name: &str) -> Option<u32> {
        self.entries().find_map(|(i, e)| match e {
            TileEntry::Liquid { liquid } if liquid == name => Some(i),
            _ => None,
        })
    }

    /// Every tile declaring `object == name`, in index order.
    pub fn find_objects(&self, name: &str) -> Vec<(u32, &ObjectEntry)> {
        self.entries()
            .filter_map(|(i, e)| match e {
                TileEntry::Object(o) if o.object == name => Some((i, o)),
                _ => None,
            })
            .collect()
    }

    /// Object entry at `index`, if it is one.
    pub fn object(&self, index: u32) -> Option<&ObjectEntry> {
        match self.entries.get(&index) {
            Some(TileEntry::Object(o)) => Some(o),
            _ => None,
        }
    }

    /// Miscellaneous entries as property bags.
    pub fn misc_entries(&self) -> impl Iterator<Item = (u32, &BTreeMap<String, String>)> {
        self.entries().filter_map(|(i, e)| match e {
            TileEntry::Misc { properties } => Some((i, properties)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materials_tileset() {
        let json = r#"{ "name": "materials", "tilecount": 4,
            "tileproperties": { "0": { "material": "dirt" }, "2": { "material": "cobblestone" },
                                "3": { "//comment": "placeholder" } } }"#;
        let tileset = Tileset::from_json("materials", TilesetKind::Materials, json).unwrap();

        assert_eq!(tileset.tilecount, 4);
        assert_eq!(tileset.len(), 2);
        assert_eq!(tileset.skipped, 1);
        assert_eq!(tileset.find_material("cobblestone"), Some(2));
        assert_eq!(tileset.find_material("sand"), None);
    }

    #[test]
    fn test_entries_are_in_numeric_order() {
        let json = r#"{ "tilecount": 12,
            "tileproperties": { "10": { "material": "a" }, "2": { "material": "a" } } }"#;
        let tileset = Tileset::from_json("materials", TilesetKind::Materials, json).unwrap();
        assert_eq!(tileset.find_material("a"), Some(2));
    }

    #[test]
    fn test_liquids_tileset() {
        let json = r#"{ "tilecount": 2, "tileproperties": { "1": { "liquid": "water" } } }"#;
        let tileset = Tileset::from_json("liquids", TilesetKind::Liquids, json).unwrap();
        assert_eq!(tileset.find_liquid("water"), Some(1));
    }

    #[test]
    fn test_object_tileset_with_sizes() {
        let json = r#"{ "tilecount": 3,
            "tileproperties": {
                "0": { "object": "woodenchair", "tilesetDirection": "left" },
                "1": { "object": "woodenchair", "tilesetDirection": "right" },
                "2": { "object": "lamp" } },
            "tiles": { "0": { "image": "chair.png", "imagewidth": 16, "imageheight": 24 } } }"#;
        let tileset = Tileset::from_json("objects-by-category/furniture", TilesetKind::Objects, json).unwrap();

        let chairs = tileset.find_objects("woodenchair");
        assert_eq!(chairs.len(), 2);
        assert_eq!(chairs[0].1.direction, Some(Direction::Left));
        assert_eq!((chairs[0].1.width, chairs[0].1.height), (16, 24));
        assert_eq!((chairs[1].1.width, chairs[1].1.height), (8, 8));
        assert_eq!(tileset.object(2).map(|o| o.object.as_str()), Some("lamp"));
    }

    #[test]
    fn test_listed_tiles_with_inline_properties() {
        let json = r#"{ "tilecount": 1, "tiles": [
            { "id": 0, "imagewidth": 8, "imageheight": 16,
              "properties": [ { "name": "object", "type": "string", "value": "torch" } ] } ] }"#;
        let tileset = Tileset::from_json("objects-by-type/light", TilesetKind::Objects, json).unwrap();
        let torch = tileset.object(0).unwrap();
        assert_eq!(torch.object, "torch");
        assert_eq!(torch.height, 16);
    }

    #[test]
    fn test_misc_tileset_keeps_all_properties() {
        let json = r#"{ "tilecount": 20, "tileproperties": {
            "4": { "worldGenMustContainSolid": "", "layer": "back" },
            "5": { "worldGenMustContainAir": "" } } }"#;
        let tileset = Tileset::from_json("miscellaneous", TilesetKind::Miscellaneous, json).unwrap();
        let entries: Vec<_> = tileset.misc_entries().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].1.get("layer").map(String::as_str), Some("back"));
    }

    #[test]
    fn test_non_numeric_index_is_an_error() {
        let json = r#"{ "tilecount": 1, "tileproperties": { "x": { "material": "dirt" } } }"#;
        assert!(Tileset::from_json("materials", TilesetKind::Materials, json).is_err());
    }

    #[test]
    fn test_missing_tilecount_is_an_error() {
        let json = r#"{ "tileproperties": {} }"#;
        assert!(Tileset::from_json("materials", TilesetKind::Materials, json).is_err());
    }
}
