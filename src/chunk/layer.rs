//! Tile and object-group layers of a chunk.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Serialize, Serializer};

use crate::types::LayerSide;

use super::object::MapObject;

/// The fixed set of object-group layer names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectLayerName {
    Anchors,
    OutsideTheMap,
    WiringLockedDoor,
    MonstersAndNpcs,
    WiringLightsAndGuns,
    Objects,
    Mods,
}

impl ObjectLayerName {
    pub const ALL: [ObjectLayerName; 7] = [
        ObjectLayerName::Anchors,
        ObjectLayerName::OutsideTheMap,
        ObjectLayerName::WiringLockedDoor,
        ObjectLayerName::MonstersAndNpcs,
        ObjectLayerName::WiringLightsAndGuns,
        ObjectLayerName::Objects,
        ObjectLayerName::Mods,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ObjectLayerName::Anchors => "anchors etc",
            ObjectLayerName::OutsideTheMap => "outside the map",
            ObjectLayerName::WiringLockedDoor => "wiring - locked door",
            ObjectLayerName::MonstersAndNpcs => "monsters & npcs",
            ObjectLayerName::WiringLightsAndGuns => "wiring - lights & guns",
            ObjectLayerName::Objects => "objects",
            ObjectLayerName::Mods => "mods",
        }
    }
}

impl fmt::Display for ObjectLayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ObjectLayerName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Tile-layer data, raw or encoded for output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LayerData {
    Raw(Vec<u32>),
    Base64(String),
}

impl LayerData {
    /// Base64 of the little-endian GIDs.
    pub fn encode(data: &[u32]) -> Self {
        let bytes: Vec<u8> = data.iter().flat_map(|gid| gid.to_le_bytes()).collect();
        LayerData::Base64(STANDARD.encode(bytes))
    }

    pub fn as_raw(&self) -> Option<&[u32]> {
        match self {
            LayerData::Raw(data) => Some(data),
            LayerData::Base64(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileLayer {
    pub id: u32,
    pub name: LayerSide,
    pub data: LayerData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<&'static str>,
    pub width: u32,
    pub height: u32,
    pub opacity: f64,
    pub visible: bool,
    pub x: i32,
    pub y: i32,
}

impl TileLayer {
    pub fn new(id: u32, side: LayerSide, data: Vec<u32>, width: u32, height: u32) -> Self {
        Self {
            id,
            name: side,
            data: LayerData::Raw(data),
            encoding: None,
            width,
            height,
            opacity: match side {
                LayerSide::Front => 1.0,
                LayerSide::Back => 0.5,
            },
            visible: true,
            x: 0,
            y: 0,
        }
    }

    pub fn encode(&mut self) {
        if let LayerData::Raw(data) = &self.data {
            self.data = LayerData::encode(data);
            self.encoding = Some("base64");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectGroup {
    pub id: u32,
    pub name: ObjectLayerName,
    pub draworder: &'static str,
    pub objects: Vec<MapObject>,
    pub opacity: f64,
    pub visible: bool,
    pub x: i32,
    pub y: i32,
}

impl ObjectGroup {
    pub fn new(id: u32, name: ObjectLayerName) -> Self {
        Self {
            id,
            name,
            draworder: "topdown",
            objects: Vec::new(),
            opacity: 1.0,
            visible: true,
            x: 0,
            y: 0,
        }
    }
}

/// A map layer, tagged with its Tiled `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Layer {
    TileLayer(TileLayer),
    ObjectGroup(ObjectGroup),
}

impl Layer {
    pub fn id(&self) -> u32 {
        match self {
            Layer::TileLayer(l) => l.id,
            Layer::ObjectGroup(l) => l.id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Layer::TileLayer(l) => l.name.name(),
            Layer::ObjectGroup(l) => l.name.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_little_endian() {
        let encoded = LayerData::encode(&[1, 0x8000_0002]);
        assert_eq!(encoded, LayerData::Base64("AQAAAAIAAIA=".to_string()));
    }

    #[test]
    fn test_tile_layer_opacity() {
        assert_eq!(TileLayer::new(1, LayerSide::Front, vec![], 0, 0).opacity, 1.0);
        assert_eq!(TileLayer::new(2, LayerSide::Back, vec![], 0, 0).opacity, 0.5);
    }

    #[test]
    fn test_layer_type_tag() {
        let layer = Layer::ObjectGroup(ObjectGroup::new(3, ObjectLayerName::MonstersAndNpcs));
        insta::assert_json_snapshot!(layer, @r###"
        {
          "type": "objectgroup",
          "id": 3,
          "name": "monsters & npcs",
          "draworder": "topdown",
          "objects": [],
          "opacity": 1.0,
          "visible": true,
          "x": 0,
          "y": 0
        }
        "###);
    }
}
