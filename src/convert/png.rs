//! Painted PNG decoding and colour-to-GID conversion.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, SbError};
use crate::matcher::{MatchTable, RgbaMatch};
use crate::types::Rgba;

/// A decoded chunk image as one colour per pixel, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Rgba>,
}

impl PixelImage {
    pub fn new(width: u32, height: u32, pixels: Vec<Rgba>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Pixel coordinates in scan order.
    pub fn coords(&self) -> impl Iterator<Item = (u32, u32, Rgba)> + '_ {
        let width = self.width.max(1);
        self.pixels
            .iter()
            .enumerate()
            .map(move |(i, p)| (i as u32 % width, i as u32 / width, *p))
    }

    /// Every pixel painted with a matched colour, in scan order.
    ///
    /// The first entry with a given colour wins.
    pub fn locate<'m, M: RgbaMatch>(&self, matches: impl IntoIterator<Item = &'m M>) -> Vec<(u32, u32, &'m M)>
    where
        M: 'm,
    {
        let mut lookup: HashMap<Rgba, &'m M> = HashMap::new();
        for m in matches {
            lookup.entry(m.rgba()).or_insert(m);
        }
        if lookup.is_empty() {
            return Vec::new();
        }
        self.coords()
            .filter_map(|(x, y, p)| lookup.get(&p).map(|m| (x, y, *m)))
            .collect()
    }
}

/// De-interleave a flat pixel buffer into one colour per pixel.
///
/// Missing channels are zero-filled.
pub fn slice_pixels_to_array(buffer: &[u8], width: u32, height: u32, channels: usize) -> Result<Vec<Rgba>> {
    let count = width as usize * height as usize;
    if channels == 0 || buffer.len() < count * channels {
        return Err(SbError::Parse {
            message: format!(
                "Pixel buffer of {} bytes is too small for {}x{} with {} channels",
                buffer.len(),
                width,
                height,
                channels
            ),
            help: None,
        });
    }
    Ok(buffer
        .chunks_exact(channels)
        .take(count)
        .map(Rgba::from_channels)
        .collect())
}

/// Decode a PNG into a [`PixelImage`].
pub fn load_png(path: &Path) -> Result<PixelImage> {
    let img = image::open(path)
        .map_err(|e| SbError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to load image: {}", e),
        })?
        .to_rgba8();
    let (width, height) = img.dimensions();
    let pixels = slice_pixels_to_array(img.as_raw(), width, height, 4)?;
    Ok(PixelImage::new(width, height, pixels))
}

/// Tile-layer data produced from one image.
#[derive(Debug, Clone, PartialEq)]
pub struct GidConversion {
    pub data: Vec<u32>,
    /// The match table had unresolved tiles.
    pub incomplete: bool,
}

/// Map every pixel to the GID of its colour, 0 when nothing matches.
pub fn convert_png_to_gid<M: RgbaMatch>(pixels: &[Rgba], table: &MatchTable<M>) -> GidConversion {
    let mut lookup: HashMap<Rgba, u32> = HashMap::new();
    for m in table.matched() {
        lookup.entry(m.rgba()).or_insert_with(|| m.gid());
    }
    GidConversion {
        data: pixels
            .iter()
            .map(|p| lookup.get(p).copied().unwrap_or(0))
            .collect(),
        incomplete: !table.is_complete(),
    }
}
