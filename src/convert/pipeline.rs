//! Whole-dungeon conversion.
//!
//! A [`Converter`] loads the tileset catalogues once and then converts any
//! number of `.dungeon` files. Each image part becomes one chunk written
//! next to the dungeon as `<part>.json`; the dungeon itself is rewritten to
//! `<name>.dungeon.new` pointing at the new chunks. A failing part is
//! reported and skipped, the other parts still convert.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::catalogue::{BaseTilesets, TilesetCatalogue, TilesetShape, OBJECT_TILESETS};
use crate::chunk::{MapObject, ObjectLayerName, Point, SbDungeonChunk, TILE_SIZE};
use crate::classify::classify;
use crate::discovery::{read_json_value, write_json_new, write_new, Encoding, WriteOutcome};
use crate::error::{Result, SbError};
use crate::matcher::LegacyMatches;
use crate::output::{display_path, plural, Printer};
use crate::types::{gid, DungeonFile, LayerSide, PartDef, Tileset, TilesetKind};
use crate::validation::{check_chunk, check_duplicate_rgba, Diagnostic, ValidationResult};

use super::png::{convert_png_to_gid, load_png, PixelImage};

/// Suffix of the companion overlay image for a single-image part.
pub const OBJECTS_SUFFIX: &str = "-objects";

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub catalogue: TilesetCatalogue,
    pub encoding: Encoding,
    pub dump_tiles: bool,
    pub verify: bool,
}

/// What happened to one part.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkStatus {
    Written,
    /// `<part>.json` already existed.
    Refused,
    /// A `tmx` part; nothing to convert.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkOutcome {
    pub part: String,
    pub path: PathBuf,
    pub status: ChunkStatus,
}

/// Result of converting one dungeon.
#[derive(Debug, Default)]
pub struct DungeonReport {
    pub dungeon: PathBuf,
    pub chunks: Vec<ChunkOutcome>,
    pub diagnostics: ValidationResult,
    /// Layer and object tiles left without a match.
    pub unmatched: usize,
    /// Outcome of writing `<name>.dungeon.new`; `None` when not attempted.
    pub rewritten: Option<WriteOutcome>,
}

impl DungeonReport {
    fn new(dungeon: &Path) -> Self {
        Self {
            dungeon: dungeon.to_path_buf(),
            ..Default::default()
        }
    }

    fn count(&self, wanted: impl Fn(&ChunkStatus) -> bool) -> usize {
        self.chunks.iter().filter(|c| wanted(&c.status)).count()
    }

    pub fn written(&self) -> usize {
        self.count(|s| *s == ChunkStatus::Written)
    }

    pub fn refused(&self) -> usize {
        self.count(|s| *s == ChunkStatus::Refused)
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ChunkStatus::Failed(_)))
    }
}

/// `<path>.new`
pub fn new_dungeon_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".new");
    PathBuf::from(name)
}

/// Part images in compositing order: the main image, then overlays.
///
/// A single-image part picks up `<stem>-objects.png` beside it when present.
pub fn part_images(dir: &Path, files: &[String]) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = files.iter().map(|f| dir.join(f)).collect();
    let companion = match images.as_slice() {
        [main] => main.file_stem().map(|stem| {
            let mut name = stem.to_os_string();
            name.push(OBJECTS_SUFFIX);
            name.push(".png");
            main.with_file_name(name)
        }),
        _ => None,
    };
    if let Some(companion) = companion.filter(|p| p.is_file()) {
        images.push(companion);
    }
    images
}

fn skipped_entries(tileset: &Tileset) -> Option<Diagnostic> {
    let key = tileset.kind.required_key()?;
    (tileset.skipped > 0).then(|| {
        Diagnostic::warning(
            "sbtiled::catalogue::skipped-entries",
            format!(
                "{} in '{}' without a '{}' property",
                plural(tileset.skipped, "entry", "entries"),
                tileset.name,
                key
            ),
        )
    })
}

pub struct Converter {
    options: ConvertOptions,
    base: BaseTilesets,
    object_tilesets: Vec<Tileset>,
    /// Findings from loading the catalogues.
    pub load_report: ValidationResult,
}

impl Converter {
    /// Load the base catalogues and every object catalogue that exists.
    ///
    /// Missing base catalogues are fatal; missing object catalogues are
    /// reported once and left out of matching.
    pub fn new(options: ConvertOptions) -> Result<Self> {
        let base = options.catalogue.load_base()?;
        let mut load_report = ValidationResult::new();
        let mut object_tilesets = Vec::new();
        let mut missing = Vec::new();

        for name in OBJECT_TILESETS {
            if !options.catalogue.exists(name) {
                missing.push(*name);
                continue;
            }
            match options.catalogue.load(name, TilesetKind::Objects) {
                Ok(tileset) => object_tilesets.push(tileset),
                Err(e) => load_report.warning(
                    "sbtiled::catalogue::unreadable",
                    format!("Skipping object tileset '{}': {}", name, e),
                ),
            }
        }

        if !missing.is_empty() {
            load_report.push(
                Diagnostic::warning(
                    "sbtiled::catalogue::missing",
                    format!(
                        "{} not found in {}",
                        plural(missing.len(), "object tileset", "object tilesets"),
                        display_path(options.catalogue.dir())
                    ),
                )
                .with_help(format!("Objects from {} cannot be matched", missing.join(", "))),
            );
        }

        let base_tilesets = [&base.materials, &base.supports, &base.liquids, &base.miscellaneous];
        for tileset in base_tilesets.into_iter().chain(&object_tilesets) {
            if let Some(d) = skipped_entries(tileset) {
                load_report.push(d);
            }
        }

        Ok(Self {
            options,
            base,
            object_tilesets,
            load_report,
        })
    }

    pub fn object_tilesets(&self) -> &[Tileset] {
        &self.object_tilesets
    }

    /// Convert every image part of one dungeon.
    ///
    /// Errors are returned only when the dungeon itself cannot be read or
    /// matched; per-part failures are recorded in the report.
    pub fn convert_dungeon(&self, path: &Path, printer: &Printer) -> Result<DungeonReport> {
        let mut report = DungeonReport::new(path);
        let raw = read_json_value(path)?;
        let dungeon: DungeonFile = serde_json::from_value(raw.clone()).map_err(|e| SbError::Parse {
            message: format!("{}: {}", path.display(), e),
            help: Some("A dungeon needs 'metadata' and 'parts'".to_string()),
        })?;

        if dungeon.tiles.is_empty() {
            printer.info("Skipping", &format!("{} (no legacy tiles)", display_path(path)));
            return Ok(report);
        }

        printer.status("Converting", &display_path(path));

        let tiles = &dungeon.tiles;
        report.diagnostics.merge(check_duplicate_rgba(tiles));
        let sorted = classify(tiles, &mut report.diagnostics);
        let matches = LegacyMatches::build(
            tiles,
            &sorted,
            &self.base,
            &self.object_tilesets,
            &mut report.diagnostics,
        )?;
        report.unmatched = matches.unmatched_count();

        if self.options.dump_tiles {
            let dump = path.with_extension("TILES");
            let tiles_value = raw.get("tiles").cloned().unwrap_or(Value::Null);
            self.report_write(printer, &dump, write_json_new(&dump, &tiles_value)?);
        }
        if self.options.verify {
            let dump = path.with_extension("VERIFY");
            self.report_write(printer, &dump, write_json_new(&dump, &matches.objects.unique_objects())?);
        }

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        for part in &dungeon.parts {
            let chunk_path = dir.join(format!("{}.json", part.name));
            let status = match &part.def {
                PartDef::Tmx(_) => ChunkStatus::Skipped,
                PartDef::Image(files) => {
                    let written = self
                        .convert_part(dir, &part.name, files, &matches, &mut report.diagnostics)
                        .and_then(|chunk| write_new(&chunk_path, chunk.to_json()?.as_bytes()));
                    match written {
                        Ok(WriteOutcome::Written) => ChunkStatus::Written,
                        Ok(WriteOutcome::Refused) => ChunkStatus::Refused,
                        Err(e) => ChunkStatus::Failed(e.to_string()),
                    }
                }
            };

            match &status {
                ChunkStatus::Written => printer.status("Writing", &display_path(&chunk_path)),
                ChunkStatus::Refused => printer.warning(
                    "Refused",
                    &format!("{} already exists", display_path(&chunk_path)),
                ),
                ChunkStatus::Skipped => {}
                ChunkStatus::Failed(message) => {
                    printer.error("Failed", &format!("part '{}': {}", part.name, message))
                }
            }
            report.chunks.push(ChunkOutcome {
                part: part.name.clone(),
                path: chunk_path,
                status,
            });
        }

        let converted: Vec<&ChunkOutcome> = report
            .chunks
            .iter()
            .filter(|c| matches!(c.status, ChunkStatus::Written | ChunkStatus::Refused))
            .collect();
        let rewritten = rewrite_dungeon(raw, &converted);
        let new_path = new_dungeon_path(path);
        let outcome = write_json_new(&new_path, &rewritten)?;
        self.report_write(printer, &new_path, outcome);
        report.rewritten = Some(outcome);

        if report.unmatched > 0 {
            printer.warning(
                "Unmatched",
                &format!("{} in {}", plural(report.unmatched, "tile", "tiles"), display_path(path)),
            );
        }

        Ok(report)
    }

    fn report_write(&self, printer: &Printer, path: &Path, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Written => printer.status("Writing", &display_path(path)),
            WriteOutcome::Refused => {
                printer.warning("Refused", &format!("{} already exists", display_path(path)))
            }
        }
    }

    /// Assemble the chunk for one image part.
    pub fn convert_part(
        &self,
        dir: &Path,
        name: &str,
        files: &[String],
        matches: &LegacyMatches,
        report: &mut ValidationResult,
    ) -> Result<SbDungeonChunk> {
        let mut images = part_images(dir, files)
            .iter()
            .map(|p| load_png(p))
            .collect::<Result<Vec<_>>>()?
            .into_iter();
        let main = images.next().ok_or_else(|| SbError::Validation {
            message: format!("Part '{}' lists no images", name),
            help: None,
        })?;
        let overlays: Vec<PixelImage> = images.collect();

        for overlay in &overlays {
            if (overlay.width, overlay.height) != (main.width, main.height) {
                return Err(SbError::Validation {
                    message: format!(
                        "Part '{}' overlay is {}x{}, main image is {}x{}",
                        name, overlay.width, overlay.height, main.width, main.height
                    ),
                    help: Some("Overlay images must match the main image size".to_string()),
                });
            }
        }

        let mut chunk = SbDungeonChunk::new(main.width, main.height, self.base.shapes.clone());

        let back = convert_png_to_gid(&main.pixels, &matches.back);
        let front = convert_png_to_gid(&main.pixels, &matches.front);
        if back.incomplete || front.incomplete {
            report.warning(
                "sbtiled::convert::incomplete",
                format!("Part '{}' was converted with unmatched layer tiles", name),
            );
        }
        chunk.add_tile_layer(LayerSide::Back, back.data, main.width, main.height)?;
        chunk.add_tile_layer(LayerSide::Front, front.data, main.width, main.height)?;

        for overlay in &overlays {
            let front = convert_png_to_gid(&overlay.pixels, &matches.front);
            let back = convert_png_to_gid(&overlay.pixels, &matches.back);
            chunk.merge_tile_layers(&front.data, &back.data)?;
        }

        let required: Vec<&Tileset> = matches
            .objects
            .required
            .iter()
            .filter_map(|name| self.object_tilesets.iter().find(|t| &t.name == name))
            .collect();
        let object_shapes: Vec<TilesetShape> = self
            .options
            .catalogue
            .calc_shapes(&required, self.base.next_firstgid())?;
        let end_gid = object_shapes
            .last()
            .zip(required.last())
            .map_or(self.base.next_firstgid(), |(shape, tileset)| {
                shape.firstgid.saturating_add(tileset.tilecount)
            });
        for shape in object_shapes {
            chunk.push_tileset(shape);
        }

        for image in std::iter::once(&main).chain(&overlays) {
            place_entities(&mut chunk, image, matches)?;
        }

        let checks = check_chunk(&chunk, Some(end_gid));
        let failed = checks.error_count();
        report.merge(checks);
        if failed > 0 {
            return Err(SbError::Validation {
                message: format!(
                    "Chunk '{}' failed {}",
                    name,
                    plural(failed, "consistency check", "consistency checks")
                ),
                help: None,
            });
        }

        if self.options.encoding == Encoding::Base64 {
            chunk.encode_tile_layers();
        }
        Ok(chunk)
    }
}

/// Place anchors, objects, NPCs, stagehands, mods and wires for every
/// matched pixel of `image`.
pub fn place_entities(chunk: &mut SbDungeonChunk, image: &PixelImage, matches: &LegacyMatches) -> Result<()> {
    for (x, y, anchor) in image.locate(&matches.anchors) {
        chunk.add_anchor_to_object_layer(anchor.gid, x, y);
    }

    for (x, y, object) in image.locate(matches.objects.table.matched()) {
        let firstgid = chunk.get_first_gid(&object.tileset).ok_or_else(|| SbError::Match {
            message: format!(
                "Object '{}' resolved to tileset '{}' which the chunk does not reference",
                object.object, object.tileset
            ),
            help: None,
        })?;
        let pure = gid::from_local(object.tile_id, firstgid)?;
        let gid = gid::apply_flags(pure, false, object.flip_horizontal, false)?;
        chunk.add_object(
            ObjectLayerName::Objects,
            MapObject::tile(gid, x, y, object.width, object.height),
        );
    }

    for (x, y, npc) in image.locate(&matches.npcs) {
        chunk.add_object(
            ObjectLayerName::MonstersAndNpcs,
            MapObject::marker(x, y)
                .with_property(&npc.key, &npc.value)
                .with_optional_property("typeName", npc.type_name.as_deref())
                .with_optional_property("parameters", npc.parameters.as_deref()),
        );
    }

    for (x, y, stagehand) in image.locate(&matches.stagehands) {
        let area = match stagehand.broadcast_area {
            Some(area) => broadcast_rect(x, y, area),
            None => MapObject::marker(x, y),
        };
        chunk.add_object(
            ObjectLayerName::Anchors,
            area.with_property("stagehand", &stagehand.kind)
                .with_optional_property("name", stagehand.name.as_deref())
                .with_optional_property("parameters", stagehand.parameters.as_deref()),
        );
    }

    for (x, y, m) in image.locate(&matches.mods) {
        chunk.add_object(
            ObjectLayerName::Mods,
            MapObject::marker(x, y).with_property("mod", &m.modifier),
        );
    }

    // One polyline per named group in scan order; ungrouped pixels stand alone.
    let mut groups: Vec<(Option<&str>, bool, Vec<Point>)> = Vec::new();
    for (x, y, wire) in image.locate(&matches.wires) {
        let centre = pixel_centre(x, y);
        let group = wire.group.as_deref();
        match groups.iter_mut().find(|(g, _, _)| group.is_some() && *g == group) {
            Some((_, _, points)) => points.push(centre),
            None => groups.push((group, wire.local, vec![centre])),
        }
    }
    for (group, local, points) in groups {
        let mut line = MapObject::polyline(&points).with_optional_property("group", group);
        if local {
            line = line.with_property("local", "true");
        }
        chunk.add_object(ObjectLayerName::WiringLightsAndGuns, line);
    }

    Ok(())
}

fn pixel_centre(x: u32, y: u32) -> Point {
    let half = f64::from(TILE_SIZE) / 2.0;
    Point {
        x: f64::from(x * TILE_SIZE) + half,
        y: f64::from(y * TILE_SIZE) + half,
    }
}

/// Rectangle for a broadcast area given in tiles relative to the pixel,
/// with Y pointing up.
fn broadcast_rect(x: u32, y: u32, [x1, y1, x2, y2]: [f64; 4]) -> MapObject {
    let tile = f64::from(TILE_SIZE);
    MapObject::rect(
        (f64::from(x) + x1) * tile,
        (f64::from(y) + 1.0 - y2) * tile,
        (x2 - x1) * tile,
        (y2 - y1) * tile,
    )
}

/// The dungeon document with legacy tiles removed, `protected` defaulted
/// and converted parts pointing at their chunk files.
pub fn rewrite_dungeon(mut raw: Value, converted: &[&ChunkOutcome]) -> Value {
    if let Some(root) = raw.as_object_mut() {
        root.remove("tiles");
    }
    if let Some(metadata) = raw.get_mut("metadata").and_then(Value::as_object_mut) {
        metadata
            .entry("protected")
            .or_insert(Value::Bool(false));
    }
    if let Some(parts) = raw.get_mut("parts").and_then(Value::as_array_mut) {
        for part in parts.iter_mut().filter_map(Value::as_object_mut) {
            let name = part.get("name").and_then(Value::as_str).map(str::to_string);
            if let Some(name) = name.filter(|n| converted.iter().any(|c| &c.part == n)) {
                part.insert(
                    "def".to_string(),
                    PartDef::tmx_value(&format!("{}.json", name)),
                );
            }
        }
    }
    raw
}
