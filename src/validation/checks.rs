//! Consistency checks for assembled chunks and legacy tile catalogues.
//!
//! Each check returns a `ValidationResult`; the pipeline merges them.

use std::collections::HashMap;

use crate::chunk::{Layer, SbDungeonChunk};
use crate::types::{gid, LegacyTile, Rgba};

use super::warning::{Diagnostic, ValidationResult};

/// Layer names must be unique among all layers.
pub fn check_layer_names(chunk: &SbDungeonChunk) -> ValidationResult {
    let mut result = ValidationResult::new();
    let mut seen: Vec<&str> = Vec::new();

    for layer in chunk.layers() {
        if seen.contains(&layer.name()) {
            result.push(Diagnostic::error(
                "sbtiled::validate::duplicate-layer",
                format!("Layer '{}' appears more than once", layer.name()),
            ));
        } else {
            seen.push(layer.name());
        }
    }

    result
}

/// Layer ids increase strictly and stay below `nextlayerid`; object ids
/// are unique and below `nextobjectid`.
pub fn check_ids(chunk: &SbDungeonChunk) -> ValidationResult {
    let mut result = ValidationResult::new();
    let mut previous = 0;

    for layer in chunk.layers() {
        if layer.id() <= previous {
            result.error(
                "sbtiled::validate::layer-id",
                format!("Layer '{}' has id {} after id {}", layer.name(), layer.id(), previous),
            );
        }
        if layer.id() >= chunk.next_layer_id() {
            result.error(
                "sbtiled::validate::layer-id",
                format!(
                    "Layer '{}' has id {} but nextlayerid is {}",
                    layer.name(),
                    layer.id(),
                    chunk.next_layer_id()
                ),
            );
        }
        previous = layer.id();
    }

    let mut object_ids: Vec<u32> = Vec::new();
    for layer in chunk.layers() {
        let Layer::ObjectGroup(group) = layer else {
            continue;
        };
        for object in &group.objects {
            if object.id == 0 || object.id >= chunk.next_object_id() {
                result.error(
                    "sbtiled::validate::object-id",
                    format!(
                        "Object {} in '{}' is outside 1..{}",
                        object.id,
                        group.name,
                        chunk.next_object_id()
                    ),
                );
            }
            if object_ids.contains(&object.id) {
                result.error(
                    "sbtiled::validate::object-id",
                    format!("Object id {} is used twice", object.id),
                );
            }
            object_ids.push(object.id);
        }
    }

    result
}

/// Raw tile-layer data holds exactly width × height GIDs.
pub fn check_layer_sizes(chunk: &SbDungeonChunk) -> ValidationResult {
    let mut result = ValidationResult::new();

    for layer in chunk.layers() {
        let Layer::TileLayer(tiles) = layer else {
            continue;
        };
        let Some(data) = tiles.data.as_raw() else {
            continue;
        };
        let expected = tiles.width as usize * tiles.height as usize;
        if data.len() != expected {
            result.push(
                Diagnostic::error(
                    "sbtiled::validate::layer-size",
                    format!(
                        "Layer '{}' holds {} tiles, expected {}x{} = {}",
                        tiles.name,
                        data.len(),
                        tiles.width,
                        tiles.height,
                        expected
                    ),
                )
                .with_help("All part images must share the main image's dimensions"),
            );
        }
    }

    result
}

/// Every non-zero GID must fall inside a referenced tileset.
///
/// Without `end_gid` only the lower bound (the smallest firstgid) is known.
pub fn check_gid_coverage(chunk: &SbDungeonChunk, end_gid: Option<u32>) -> ValidationResult {
    let mut result = ValidationResult::new();
    let Some(lowest) = chunk.tilesets().iter().map(|t| t.firstgid).min() else {
        return result;
    };

    let mut check = |where_: &str, value: u32| {
        if value == 0 {
            return;
        }
        let pure = match gid::pure_gid(value) {
            Ok(pure) => pure,
            Err(e) => {
                result.error("sbtiled::validate::gid", format!("{}: {}", where_, e));
                return;
            }
        };
        if pure < lowest || end_gid.is_some_and(|end| pure >= end) {
            result.error(
                "sbtiled::validate::gid",
                format!("{}: GID {} is not covered by any tileset", where_, pure),
            );
        }
    };

    for layer in chunk.layers() {
        match layer {
            Layer::TileLayer(tiles) => {
                if let Some(data) = tiles.data.as_raw() {
                    for (index, &value) in data.iter().enumerate() {
                        check(&format!("{} layer index {}", tiles.name, index), value);
                    }
                }
            }
            Layer::ObjectGroup(group) => {
                for object in &group.objects {
                    if let Some(value) = object.gid {
                        check(&format!("object {} in '{}'", object.id, group.name), value);
                    }
                }
            }
        }
    }

    result
}

/// Run every chunk check.
pub fn check_chunk(chunk: &SbDungeonChunk, end_gid: Option<u32>) -> ValidationResult {
    let mut result = ValidationResult::new();
    result.merge(check_layer_names(chunk));
    result.merge(check_ids(chunk));
    result.merge(check_layer_sizes(chunk));
    result.merge(check_gid_coverage(chunk, end_gid));
    result
}

/// Warn about legacy tiles sharing a colour. The first definition wins
/// during matching.
pub fn check_duplicate_rgba(tiles: &[LegacyTile]) -> ValidationResult {
    let mut result = ValidationResult::new();
    let mut first_seen: HashMap<Rgba, usize> = HashMap::new();

    for (index, tile) in tiles.iter().enumerate() {
        match first_seen.get(&tile.value) {
            Some(&first) => result.push(
                Diagnostic::warning(
                    "sbtiled::validate::duplicate-rgba",
                    format!(
                        "Tile {} reuses colour {} of tile {}",
                        tile.label(),
                        tile.value,
                        tiles[first].label()
                    ),
                )
                .with_help(format!("Only tile #{} will be matched", first)),
            ),
            None => {
                first_seen.insert(tile.value, index);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::TilesetShape;
    use crate::chunk::{MapObject, ObjectLayerName};
    use crate::types::LayerSide;

    fn chunk() -> SbDungeonChunk {
        SbDungeonChunk::new(
            2,
            1,
            vec![TilesetShape {
                firstgid: 1,
                source: "materials.json".to_string(),
            }],
        )
    }

    #[test]
    fn test_well_formed_chunk_passes() {
        let mut chunk = chunk();
        chunk.add_tile_layer(LayerSide::Front, vec![0, 3], 2, 1).unwrap();
        chunk.add_tile_layer(LayerSide::Back, vec![1 | gid::FLIPPED_HORIZONTALLY, 0], 2, 1).unwrap();
        chunk.add_anchor_to_object_layer(4, 0, 0);

        let result = check_chunk(&chunk, Some(10));
        assert!(result.is_ok(), "{:?}", result);
    }

    #[test]
    fn test_wrong_data_length() {
        let mut chunk = chunk();
        chunk.add_tile_layer(LayerSide::Front, vec![0, 0, 0], 2, 1).unwrap();

        let result = check_layer_sizes(&chunk);
        assert_eq!(result.count_code("sbtiled::validate::layer-size"), 1);
    }

    #[test]
    fn test_gid_outside_tilesets() {
        let mut chunk = chunk();
        chunk.add_tile_layer(LayerSide::Front, vec![12, 0], 2, 1).unwrap();
        chunk.add_object(ObjectLayerName::Objects, MapObject::tile(11, 0, 0, 8, 8));

        assert_eq!(check_gid_coverage(&chunk, Some(10)).error_count(), 2);
        assert!(check_gid_coverage(&chunk, None).is_ok());
    }

    #[test]
    fn test_encoded_layers_are_not_inspected() {
        let mut chunk = chunk();
        chunk.add_tile_layer(LayerSide::Front, vec![99, 99, 99], 2, 1).unwrap();
        chunk.encode_tile_layers();

        assert!(check_chunk(&chunk, Some(10)).is_ok());
    }

    #[test]
    fn test_duplicate_rgba_warns() {
        let tiles = vec![
            LegacyTile::new(Rgba::rgb(1, 2, 3)).with_comment("first"),
            LegacyTile::new(Rgba::rgb(4, 5, 6)),
            LegacyTile::new(Rgba::rgb(1, 2, 3)).with_comment("second"),
        ];

        let result = check_duplicate_rgba(&tiles);
        assert!(!result.has_errors());
        assert_eq!(result.warning_count(), 1);
    }
}
