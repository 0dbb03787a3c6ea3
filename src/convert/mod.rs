//! PNG decoding, colour-to-GID conversion and the dungeon pipeline.

mod pipeline;
mod png;

pub use pipeline::{
    new_dungeon_path, part_images, place_entities, rewrite_dungeon, ChunkOutcome, ChunkStatus,
    ConvertOptions, Converter, DungeonReport, OBJECTS_SUFFIX,
};
pub use png::{convert_png_to_gid, load_png, slice_pixels_to_array, GidConversion, PixelImage};
