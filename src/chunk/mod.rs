//! The output map document for one converted dungeon part.
//!
//! [`SbDungeonChunk`] owns its layers, tileset references and id counters.
//! Layer and object ids only ever grow; a failed add never consumes an id.

mod layer;
mod object;

pub use layer::{Layer, LayerData, ObjectGroup, ObjectLayerName, TileLayer};
pub use object::{MapObject, Point, Property, TILE_SIZE};

use serde::Serialize;

use crate::catalogue::{TilesetShape, MISCELLANEOUS};
use crate::error::{Result, SbError};
use crate::matcher::magic_pink_gid;
use crate::types::LayerSide;

const TILED_VERSION: &str = "1.8.2";
const FORMAT_VERSION: &str = "1.8";

#[derive(Debug, Clone, PartialEq)]
pub struct SbDungeonChunk {
    width: u32,
    height: u32,
    layers: Vec<Layer>,
    next_layer_id: u32,
    next_object_id: u32,
    tilesets: Vec<TilesetShape>,
    properties: Vec<Property>,
}

/// Serializable view of a chunk in Tiled's map format.
#[derive(Serialize)]
pub struct MapDocument<'a> {
    compressionlevel: i32,
    width: u32,
    height: u32,
    infinite: bool,
    layers: &'a [Layer],
    nextlayerid: u32,
    nextobjectid: u32,
    orientation: &'static str,
    renderorder: &'static str,
    tiledversion: &'static str,
    tilewidth: u32,
    tileheight: u32,
    tilesets: &'a [TilesetShape],
    #[serde(skip_serializing_if = "<[Property]>::is_empty")]
    properties: &'a [Property],
    #[serde(rename = "type")]
    kind: &'static str,
    version: &'static str,
}

impl SbDungeonChunk {
    pub fn new(width: u32, height: u32, tilesets: Vec<TilesetShape>) -> Self {
        Self {
            width,
            height,
            layers: Vec::new(),
            next_layer_id: 1,
            next_object_id: 1,
            tilesets,
            properties: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn tilesets(&self) -> &[TilesetShape] {
        &self.tilesets
    }

    pub fn next_layer_id(&self) -> u32 {
        self.next_layer_id
    }

    pub fn next_object_id(&self) -> u32 {
        self.next_object_id
    }

    /// Map dimensions are not checked against existing layers.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn push_tileset(&mut self, shape: TilesetShape) {
        self.tilesets.push(shape);
    }

    /// Firstgid of the tileset whose source contains `<name>.json`.
    pub fn get_first_gid(&self, name: &str) -> Option<u32> {
        let suffix = format!("{}.json", name);
        self.tilesets
            .iter()
            .find(|t| t.source.contains(&suffix))
            .map(|t| t.firstgid)
    }

    fn has_layer(&self, name: &str) -> bool {
        self.layers.iter().any(|l| l.name() == name)
    }

    fn take_layer_id(&mut self) -> u32 {
        let id = self.next_layer_id;
        self.next_layer_id += 1;
        id
    }

    /// Add the front or back tile layer. Layer names are unique.
    pub fn add_tile_layer(&mut self, side: LayerSide, data: Vec<u32>, width: u32, height: u32) -> Result<u32> {
        if self.has_layer(side.name()) {
            return Err(SbError::DuplicateLayer {
                name: side.name().to_string(),
            });
        }
        let id = self.take_layer_id();
        self.layers
            .push(Layer::TileLayer(TileLayer::new(id, side, data, width, height)));
        Ok(id)
    }

    pub fn tile_layer(&self, side: LayerSide) -> Option<&TileLayer> {
        self.layers.iter().find_map(|l| match l {
            Layer::TileLayer(t) if t.name == side => Some(t),
            _ => None,
        })
    }

    fn tile_layer_mut(&mut self, side: LayerSide) -> Option<&mut TileLayer> {
        self.layers.iter_mut().find_map(|l| match l {
            Layer::TileLayer(t) if t.name == side => Some(t),
            _ => None,
        })
    }

    fn raw_tile_data(&self, side: LayerSide) -> Result<&[u32]> {
        let layer = self.tile_layer(side).ok_or_else(|| SbError::MissingLayer {
            name: side.name().to_string(),
        })?;
        layer.data.as_raw().ok_or_else(|| SbError::EncodedLayer {
            name: side.name().to_string(),
        })
    }

    /// Compose overlay data into the front and back layers.
    ///
    /// Empty pixels are 0 on either layer, or the magic pink GID on the
    /// back layer. An empty overlay pixel keeps the base, even when the base
    /// is a different empty value; an empty base pixel takes a non-empty
    /// overlay; two different non-empty pixels conflict.
    /// Nothing is modified unless both layers merge cleanly.
    pub fn merge_tile_layers(&mut self, front_overlay: &[u32], back_overlay: &[u32]) -> Result<()> {
        let misc_firstgid = self.get_first_gid(MISCELLANEOUS).ok_or_else(|| SbError::Match {
            message: "Cannot merge layers: the miscellaneous tileset is not referenced".to_string(),
            help: Some("Tileset sources must end in 'miscellaneous.json'".to_string()),
        })?;
        let pink = magic_pink_gid(misc_firstgid)?;

        let front = merge_data(LayerSide::Front, self.raw_tile_data(LayerSide::Front)?, front_overlay, |g| g == 0)?;
        let back = merge_data(LayerSide::Back, self.raw_tile_data(LayerSide::Back)?, back_overlay, |g| {
            g == 0 || g == pink
        })?;

        for (side, data) in [(LayerSide::Front, front), (LayerSide::Back, back)] {
            if let Some(layer) = self.tile_layer_mut(side) {
                layer.data = LayerData::Raw(data);
            }
        }
        Ok(())
    }

    /// Id of the named object layer, creating it when absent.
    pub fn init_object_layer(&mut self, name: ObjectLayerName) -> u32 {
        if let Some(id) = self.object_layer(name).map(|l| l.id) {
            return id;
        }
        let id = self.take_layer_id();
        self.layers.push(Layer::ObjectGroup(ObjectGroup::new(id, name)));
        id
    }

    pub fn object_layer(&self, name: ObjectLayerName) -> Option<&ObjectGroup> {
        self.layers.iter().find_map(|l| match l {
            Layer::ObjectGroup(g) if g.name == name => Some(g),
            _ => None,
        })
    }

    /// Append an object to a layer, assigning the next object id.
    pub fn add_object(&mut self, name: ObjectLayerName, mut object: MapObject) -> u32 {
        self.init_object_layer(name);
        let id = self.next_object_id;
        self.next_object_id += 1;
        object.id = id;
        if let Some(Layer::ObjectGroup(group)) = self
            .layers
            .iter_mut()
            .find(|l| matches!(l, Layer::ObjectGroup(g) if g.name == name))
        {
            group.objects.push(object);
        }
        id
    }

    /// Place an 8x8 anchor tile object for the painted pixel.
    pub fn add_anchor_to_object_layer(&mut self, gid: u32, pixel_x: u32, pixel_y: u32) -> u32 {
        self.add_object(
            ObjectLayerName::Anchors,
            MapObject::tile(gid, pixel_x, pixel_y, TILE_SIZE, TILE_SIZE),
        )
    }

    /// Switch every raw tile layer to base64.
    pub fn encode_tile_layers(&mut self) {
        for layer in &mut self.layers {
            if let Layer::TileLayer(t) = layer {
                t.encode();
            }
        }
    }

    pub fn document(&self) -> MapDocument<'_> {
        MapDocument {
            compressionlevel: -1,
            width: self.width,
            height: self.height,
            infinite: false,
            layers: &self.layers,
            nextlayerid: self.next_layer_id,
            nextobjectid: self.next_object_id,
            orientation: "orthogonal",
            renderorder: "right-down",
            tiledversion: TILED_VERSION,
            tilewidth: TILE_SIZE,
            tileheight: TILE_SIZE,
            tilesets: &self.tilesets,
            properties: &self.properties,
            kind: "map",
            version: FORMAT_VERSION,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.document()).map_err(|e| SbError::Validation {
            message: format!("Failed to serialize chunk: {}", e),
            help: None,
        })
    }
}

fn merge_data(side: LayerSide, base: &[u32], overlay: &[u32], is_empty: impl Fn(u32) -> bool) -> Result<Vec<u32>> {
    if base.len() != overlay.len() {
        return Err(SbError::MergeSizeMismatch {
            expected: base.len(),
            actual: overlay.len(),
        });
    }
    base.iter()
        .zip(overlay)
        .enumerate()
        .map(|(index, (&b, &o))| {
            if is_empty(o) || b == o {
                Ok(b)
            } else if is_empty(b) {
                Ok(o)
            } else {
                Err(SbError::MergeConflict {
                    layer: side.name().to_string(),
                    index,
                    base: b,
                    overlay: o,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::gid;
    use pretty_assertions::assert_eq;

    const MISC: u32 = 100;

    fn chunk() -> SbDungeonChunk {
        SbDungeonChunk::new(
            3,
            1,
            vec![
                TilesetShape {
                    firstgid: 1,
                    source: "../packed/materials.json".to_string(),
                },
                TilesetShape {
                    firstgid: MISC,
                    source: "../packed/miscellaneous.json".to_string(),
                },
            ],
        )
    }

    fn pink() -> u32 {
        (MISC + 1) | gid::FLIPPED_HORIZONTALLY
    }

    #[test]
    fn test_duplicate_layer_is_rejected_without_consuming_ids() {
        let mut chunk = chunk();
        assert_eq!(chunk.add_tile_layer(LayerSide::Front, vec![0; 3], 3, 1).unwrap(), 1);
        assert!(matches!(
            chunk.add_tile_layer(LayerSide::Front, vec![0; 3], 3, 1),
            Err(SbError::DuplicateLayer { .. })
        ));
        assert_eq!(chunk.add_tile_layer(LayerSide::Back, vec![0; 3], 3, 1).unwrap(), 2);
        assert_eq!(chunk.init_object_layer(ObjectLayerName::Objects), 3);
        assert_eq!(chunk.next_layer_id(), 4);
    }

    #[test]
    fn test_init_object_layer_is_idempotent() {
        let mut chunk = chunk();
        let first = chunk.init_object_layer(ObjectLayerName::Mods);
        let second = chunk.init_object_layer(ObjectLayerName::Mods);
        assert_eq!(first, second);
        assert_eq!(chunk.layers().len(), 1);
    }

    #[test]
    fn test_anchor_transform_and_shared_object_ids() {
        let mut chunk = chunk();
        let first = chunk.add_anchor_to_object_layer(5, 2, 3);
        let second = chunk.add_object(ObjectLayerName::Mods, MapObject::marker(0, 0));
        assert_eq!((first, second), (1, 2));
        assert_eq!(chunk.next_object_id(), 3);

        let anchors = chunk.object_layer(ObjectLayerName::Anchors).unwrap();
        let anchor = &anchors.objects[0];
        assert_eq!((anchor.x, anchor.y), (16.0, 32.0));
        assert_eq!((anchor.width, anchor.height), (8.0, 8.0));
        assert_eq!(anchor.gid, Some(5));
    }

    #[test]
    fn test_merge_fills_empty_pixels() {
        let mut chunk = chunk();
        chunk.add_tile_layer(LayerSide::Front, vec![0, 7, 0], 3, 1).unwrap();
        chunk.add_tile_layer(LayerSide::Back, vec![pink(), 9, 0], 3, 1).unwrap();

        chunk.merge_tile_layers(&[4, 0, 0], &[12, pink(), pink()]).unwrap();

        let front = chunk.tile_layer(LayerSide::Front).unwrap();
        let back = chunk.tile_layer(LayerSide::Back).unwrap();
        assert_eq!(front.data, LayerData::Raw(vec![4, 7, 0]));
        assert_eq!(back.data, LayerData::Raw(vec![12, 9, 0]));
    }

    #[test]
    fn test_merge_keeps_base_when_both_pixels_are_empty() {
        let mut chunk = chunk();
        chunk.add_tile_layer(LayerSide::Front, vec![0; 3], 3, 1).unwrap();
        chunk.add_tile_layer(LayerSide::Back, vec![0, pink(), pink()], 3, 1).unwrap();

        chunk.merge_tile_layers(&[0; 3], &[pink(), 0, pink()]).unwrap();

        assert_eq!(
            chunk.tile_layer(LayerSide::Back).unwrap().data,
            LayerData::Raw(vec![0, pink(), pink()])
        );
    }

    #[test]
    fn test_merge_conflict_leaves_layers_untouched() {
        let mut chunk = chunk();
        chunk.add_tile_layer(LayerSide::Front, vec![0, 7, 0], 3, 1).unwrap();
        chunk.add_tile_layer(LayerSide::Back, vec![0, 0, 0], 3, 1).unwrap();

        let result = chunk.merge_tile_layers(&[3, 8, 0], &[0, 0, 0]);
        assert!(matches!(
            result,
            Err(SbError::MergeConflict { index: 1, base: 7, overlay: 8, .. })
        ));
        assert_eq!(
            chunk.tile_layer(LayerSide::Front).unwrap().data,
            LayerData::Raw(vec![0, 7, 0])
        );
    }

    #[test]
    fn test_merge_requires_layers_of_same_size() {
        let mut chunk = chunk();
        chunk.add_tile_layer(LayerSide::Front, vec![0; 3], 3, 1).unwrap();
        chunk.add_tile_layer(LayerSide::Back, vec![0; 3], 3, 1).unwrap();
        assert!(matches!(
            chunk.merge_tile_layers(&[0; 2], &[0; 3]),
            Err(SbError::MergeSizeMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_merge_into_encoded_or_missing_layer_fails() {
        let mut chunk = chunk();
        chunk.add_tile_layer(LayerSide::Front, vec![0; 3], 3, 1).unwrap();
        assert!(matches!(
            chunk.merge_tile_layers(&[0; 3], &[0; 3]),
            Err(SbError::MissingLayer { .. })
        ));

        chunk.add_tile_layer(LayerSide::Back, vec![0; 3], 3, 1).unwrap();
        chunk.encode_tile_layers();
        assert!(matches!(
            chunk.merge_tile_layers(&[0; 3], &[0; 3]),
            Err(SbError::EncodedLayer { .. })
        ));
    }

    #[test]
    fn test_get_first_gid_by_source_suffix() {
        let chunk = chunk();
        assert_eq!(chunk.get_first_gid("miscellaneous"), Some(MISC));
        assert_eq!(chunk.get_first_gid("liquids"), None);
    }

    #[test]
    fn test_document_shape() {
        let mut chunk = chunk();
        chunk.set_size(1, 1);
        chunk.add_tile_layer(LayerSide::Back, vec![pink()], 1, 1).unwrap();
        chunk.add_anchor_to_object_layer(MISC + 3, 0, 0);

        let json: serde_json::Value = serde_json::from_str(&chunk.to_json().unwrap()).unwrap();
        insta::assert_json_snapshot!(json, @r###"
        {
          "compressionlevel": -1,
          "height": 1,
          "infinite": false,
          "layers": [
            {
              "data": [
                2147483749
              ],
              "height": 1,
              "id": 1,
              "name": "back",
              "opacity": 0.5,
              "type": "tilelayer",
              "visible": true,
              "width": 1,
              "x": 0,
              "y": 0
            },
            {
              "draworder": "topdown",
              "id": 2,
              "name": "anchors etc",
              "objects": [
                {
                  "gid": 103,
                  "height": 8.0,
                  "id": 1,
                  "name": "",
                  "rotation": 0.0,
                  "type": "",
                  "visible": true,
                  "width": 8.0,
                  "x": 0.0,
                  "y": 8.0
                }
              ],
              "opacity": 1.0,
              "type": "objectgroup",
              "visible": true,
              "x": 0,
              "y": 0
            }
          ],
          "nextlayerid": 3,
          "nextobjectid": 2,
          "orientation": "orthogonal",
          "renderorder": "right-down",
          "tiledversion": "1.8.2",
          "tileheight": 8,
          "tilesets": [
            {
              "firstgid": 1,
              "source": "../packed/materials.json"
            },
            {
              "firstgid": 100,
              "source": "../packed/miscellaneous.json"
            }
          ],
          "tilewidth": 8,
          "type": "map",
          "version": "1.8",
          "width": 1
        }
        "###);
    }
}
