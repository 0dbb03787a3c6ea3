//! Objects placed on object-group layers.

use serde::Serialize;

/// Pixel size of one map tile.
pub const TILE_SIZE: u32 = 8;

/// A string property on a map object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: "string",
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A Tiled map object. Ids are assigned by the chunk when added.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapObject {
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gid: Option<u32>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub visible: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polyline: Option<Vec<Point>>,
}

impl MapObject {
    fn base(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: 0,
            gid: None,
            name: String::new(),
            kind: String::new(),
            x,
            y,
            width,
            height,
            rotation: 0.0,
            visible: true,
            properties: Vec::new(),
            polyline: None,
        }
    }

    /// A tile object standing on the painted pixel.
    ///
    /// Tiled positions tile objects by their bottom-left corner, so the
    /// object's y is the bottom edge of the pixel's tile.
    pub fn tile(gid: u32, pixel_x: u32, pixel_y: u32, width: u32, height: u32) -> Self {
        let mut object = Self::base(
            f64::from(pixel_x * TILE_SIZE),
            f64::from((pixel_y + 1) * TILE_SIZE),
            f64::from(width),
            f64::from(height),
        );
        object.gid = Some(gid);
        object
    }

    /// A rectangle covering the painted pixel's tile.
    pub fn marker(pixel_x: u32, pixel_y: u32) -> Self {
        Self::rect(
            f64::from(pixel_x * TILE_SIZE),
            f64::from(pixel_y * TILE_SIZE),
            f64::from(TILE_SIZE),
            f64::from(TILE_SIZE),
        )
    }

    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::base(x, y, width, height)
    }

    /// A polyline through absolute points; stored relative to the first.
    pub fn polyline(points: &[Point]) -> Self {
        let origin = points.first().copied().unwrap_or(Point { x: 0.0, y: 0.0 });
        let mut object = Self::base(origin.x, origin.y, 0.0, 0.0);
        object.polyline = Some(
            points
                .iter()
                .map(|p| Point {
                    x: p.x - origin.x,
                    y: p.y - origin.y,
                })
                .collect(),
        );
        object
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push(Property::new(name, value));
        self
    }

    pub fn with_optional_property(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.with_property(name, value),
            None => self,
        }
    }
}
