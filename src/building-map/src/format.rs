// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Structured (YAML/JSON) representation of a level.
//!
//! The record types here mirror the building map file layout one to one.
//! Point-like elements and edges are positional sequences on disk, e.g. a
//! vertex is `[x, y, z, name, {params}]`, so they get hand-written serde
//! impls; everything else is derived.  Conversion to and from [`Level`]
//! happens in [`deserialize_level`] and [`serialize_level`].

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::common::{Error, ErrorKind, Result, Warning};
use crate::config::LevelConfig;
use crate::datamodel::{Edge, EdgeType, Fiducial, Layer, Model, Polygon, PolygonType, Tag, Vertex};
use crate::drawing::DrawingLoader;
use crate::import_err;
use crate::level::Level;
use crate::param::ParamMap;

// Helper functions for serde skip_serializing_if

fn is_empty_vec<T>(val: &[T]) -> bool {
    val.is_empty()
}

fn is_zero_f64(val: &f64) -> bool {
    *val == 0.0
}

fn default_true() -> bool {
    true
}

/// A mapping that keeps its keys in file order.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderedMap<V>(pub Vec<(String, V)>);

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        OrderedMap(Vec::new())
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert or replace, keeping the position of an existing key.
    pub fn insert(&mut self, key: String, value: V) {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a mapping keyed by name")
            }

            fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut map = OrderedMap::new();
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    map.insert(key, value);
                }
                Ok(map)
            }

            // `layers: ~` and `layers:` are both seen in the wild
            fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
                Ok(OrderedMap::new())
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

/// `[x, y, z, name, {params}]`; only `x` and `y` are mandatory on read.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct PointRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub name: String,
    pub params: ParamMap,
}

impl Serialize for PointRecord {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = if self.params.is_empty() { 4 } else { 5 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.x)?;
        seq.serialize_element(&self.y)?;
        seq.serialize_element(&self.z)?;
        seq.serialize_element(&self.name)?;
        if !self.params.is_empty() {
            seq.serialize_element(&self.params)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for PointRecord {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PointVisitor;

        impl<'de> Visitor<'de> for PointVisitor {
            type Value = PointRecord;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a [x, y, z, name, params] sequence")
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let x = seq
                    .next_element::<f64>()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let y = seq
                    .next_element::<f64>()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                let z = seq.next_element::<f64>()?.unwrap_or(0.0);
                let name = seq.next_element::<String>()?.unwrap_or_default();
                let params = seq.next_element::<ParamMap>()?.unwrap_or_default();
                Ok(PointRecord {
                    x,
                    y,
                    z,
                    name,
                    params,
                })
            }
        }

        deserializer.deserialize_seq(PointVisitor)
    }
}

/// `[start, end, {params}]`; the edge type is implied by the container.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct EdgeRecord {
    pub start: usize,
    pub end: usize,
    pub params: ParamMap,
}

impl Serialize for EdgeRecord {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(3))?;
        seq.serialize_element(&self.start)?;
        seq.serialize_element(&self.end)?;
        seq.serialize_element(&self.params)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for EdgeRecord {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EdgeVisitor;

        impl<'de> Visitor<'de> for EdgeVisitor {
            type Value = EdgeRecord;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a [start, end, params] sequence")
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let start = seq
                    .next_element::<usize>()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let end = seq
                    .next_element::<usize>()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                let params = seq.next_element::<ParamMap>()?.unwrap_or_default();
                Ok(EdgeRecord { start, end, params })
            }
        }

        deserializer.deserialize_seq(EdgeVisitor)
    }
}

/// `[x, y, name]`
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FiducialRecord {
    pub x: f64,
    pub y: f64,
    pub name: String,
}

impl Serialize for FiducialRecord {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(3))?;
        seq.serialize_element(&self.x)?;
        seq.serialize_element(&self.y)?;
        seq.serialize_element(&self.name)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for FiducialRecord {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FiducialVisitor;

        impl<'de> Visitor<'de> for FiducialVisitor {
            type Value = FiducialRecord;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a [x, y, name] sequence")
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let x = seq
                    .next_element::<f64>()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let y = seq
                    .next_element::<f64>()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                let name = seq.next_element::<String>()?.unwrap_or_default();
                Ok(FiducialRecord { x, y, name })
            }
        }

        deserializer.deserialize_seq(FiducialVisitor)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawingRecord {
    pub filename: String,
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelRecord {
    #[serde(default)]
    pub name: String,
    pub model_name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub yaw: f64,
    #[serde(rename = "static", default)]
    pub is_static: bool,
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct FloorRecord {
    pub vertices: Vec<usize>,
    #[serde(default)]
    pub parameters: ParamMap,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerRecord {
    pub filename: String,
    pub meters_per_pixel: f64,
    #[serde(skip_serializing_if = "is_zero_f64", default)]
    pub translation_x: f64,
    #[serde(skip_serializing_if = "is_zero_f64", default)]
    pub translation_y: f64,
    #[serde(skip_serializing_if = "is_zero_f64", default)]
    pub rotation: f64,
    #[serde(default = "default_true")]
    pub visible: bool,
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct LevelRecord {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub drawing: Option<DrawingRecord>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub x_meters: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub y_meters: Option<f64>,
    #[serde(default)]
    pub elevation: f64,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub vertices: Vec<PointRecord>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub fiducials: Vec<FiducialRecord>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub tags: Vec<PointRecord>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub lanes: Vec<EdgeRecord>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub walls: Vec<EdgeRecord>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub measurements: Vec<EdgeRecord>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub doors: Vec<EdgeRecord>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub models: Vec<ModelRecord>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub floors: Vec<FloorRecord>,
    #[serde(skip_serializing_if = "OrderedMap::is_empty", default)]
    pub layers: OrderedMap<LayerRecord>,
    /// Fields this crate does not understand; reported on load and left
    /// empty by `serialize_level`.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_json::Value>,
}

impl LevelRecord {
    fn edges(&self, edge_type: EdgeType) -> &[EdgeRecord] {
        match edge_type {
            EdgeType::Lane => &self.lanes,
            EdgeType::Wall => &self.walls,
            EdgeType::Measurement => &self.measurements,
            EdgeType::Door => &self.doors,
        }
    }

    fn edges_mut(&mut self, edge_type: EdgeType) -> &mut Vec<EdgeRecord> {
        match edge_type {
            EdgeType::Lane => &mut self.lanes,
            EdgeType::Wall => &mut self.walls,
            EdgeType::Measurement => &mut self.measurements,
            EdgeType::Door => &mut self.doors,
        }
    }
}

/// A level together with the recoverable problems found while loading it.
#[derive(Clone, Debug)]
pub struct LoadedLevel {
    pub level: Level,
    pub warnings: Vec<Warning>,
}

/// Re-tag an error raised by a level operation as a structural input error.
fn as_import_error(err: Error, level: &str, context: &str) -> Error {
    let details = match err.details {
        Some(details) => format!("level {level}: {context}: {details}"),
        None => format!("level {level}: {context}"),
    };
    Error::new(ErrorKind::Import, err.code, Some(details))
}

fn base_level(
    name: &str,
    record: &LevelRecord,
    drawings: &dyn DrawingLoader,
    config: &LevelConfig,
    warnings: &mut Vec<Warning>,
) -> Result<Level> {
    if let Some(drawing) = record.drawing.as_ref() {
        return match drawings.dimensions(&drawing.filename) {
            Ok((width, height)) => {
                Level::with_drawing(name, &drawing.filename, width, height, config.clone())
                    .map_err(|err| as_import_error(err, name, "drawing"))
            }
            Err(err) => {
                let warning = Warning::DrawingUnavailable {
                    level: name.to_owned(),
                    filename: drawing.filename.clone(),
                    reason: err.get_details().unwrap_or_else(|| err.code.to_string()),
                };
                log::warn!("{warning}");
                warnings.push(warning);
                let mut level = Level::with_config(name, config.clone())
                    .map_err(|err| as_import_error(err, name, "config"))?;
                level.set_drawing_reference(&drawing.filename);
                Ok(level)
            }
        };
    }

    match (record.x_meters, record.y_meters) {
        (Some(x_meters), Some(y_meters)) => {
            Level::with_dimensions(name, x_meters, y_meters, config.clone())
                .map_err(|err| as_import_error(err, name, "dimensions"))
        }
        (None, None) => Level::with_config(name, config.clone())
            .map_err(|err| as_import_error(err, name, "config")),
        _ => import_err!(
            MissingDimension,
            format!("level {name}: x_meters and y_meters must be given together")
        ),
    }
}

/// Build a level from its record.
///
/// Structural problems (dimensions, out-of-range indices, bad layers) abort
/// the load, as does an invalid `config`.  Unknown door types, self-loop
/// edges, unknown fields and unreadable drawings are skipped or defaulted
/// and reported in the returned warnings.  The scale
/// is recalculated from the measurements as the final step.
pub fn deserialize_level(
    name: &str,
    record: &LevelRecord,
    drawings: &dyn DrawingLoader,
    config: &LevelConfig,
) -> Result<LoadedLevel> {
    config
        .validate()
        .map_err(|err| as_import_error(err, name, "config"))?;
    let mut warnings = vec![];
    let mut level = base_level(name, record, drawings, config, &mut warnings)?;

    for v in record.vertices.iter() {
        level.push_vertex(Vertex {
            x: v.x,
            y: v.y,
            name: v.name.clone(),
            params: v.params.clone(),
            selected: false,
        });
    }

    for f in record.fiducials.iter() {
        level.add_fiducial(Fiducial {
            x: f.x,
            y: f.y,
            name: f.name.clone(),
            selected: false,
        });
    }

    for t in record.tags.iter() {
        let mut tag = Tag::new(t.x, t.y, &t.name);
        tag.params = t.params.clone();
        level.add_tag(tag);
    }

    for edge_type in EdgeType::ALL {
        for (i, e) in record.edges(edge_type).iter().enumerate() {
            let mut edge = Edge {
                start: e.start,
                end: e.end,
                edge_type,
                params: e.params.clone(),
                selected: false,
            };
            edge.create_required_params();
            if let Some(Err(door_type)) = edge.door_type() {
                let warning = Warning::UnknownDoorType {
                    level: name.to_owned(),
                    door_type,
                };
                log::warn!("{warning}");
                warnings.push(warning);
                continue;
            }
            if e.start == e.end && e.start < level.vertices().len() {
                let warning = Warning::DegenerateEdge {
                    level: name.to_owned(),
                    container: edge_type.container_name().to_owned(),
                    index: i,
                };
                log::warn!("{warning}");
                warnings.push(warning);
                continue;
            }
            let context = format!("{}[{i}]", edge_type.container_name());
            level
                .push_edge(edge)
                .map_err(|err| as_import_error(err, name, &context))?;
        }
    }

    for m in record.models.iter() {
        level.add_model(Model {
            name: m.name.clone(),
            model_name: m.model_name.clone(),
            x: m.x,
            y: m.y,
            z: m.z,
            yaw: m.yaw,
            is_static: m.is_static,
            selected: false,
        });
    }

    for (i, f) in record.floors.iter().enumerate() {
        let mut polygon = Polygon::new(f.vertices.clone(), PolygonType::Floor);
        polygon.params = f.parameters.clone();
        let context = format!("floors[{i}]");
        level
            .push_polygon(polygon)
            .map_err(|err| as_import_error(err, name, &context))?;
    }

    level.elevation = record.elevation;

    for (layer_name, l) in record.layers.iter() {
        let layer = Layer {
            name: layer_name.to_owned(),
            filename: l.filename.clone(),
            meters_per_pixel: l.meters_per_pixel,
            translation_x: l.translation_x,
            translation_y: l.translation_y,
            rotation: l.rotation,
            visible: l.visible,
        };
        let context = format!("layers[{layer_name}]");
        level
            .add_layer(layer)
            .map_err(|err| as_import_error(err, name, &context))?;
    }

    for field in record.unknown.keys() {
        let warning = Warning::UnknownField {
            level: name.to_owned(),
            field: field.clone(),
        };
        log::warn!("{warning}");
        warnings.push(warning);
    }

    level.calculate_scale();

    log::info!(
        "parsed level {name}: {} vertices, {} edges, {} floors, {} models",
        level.vertices().len(),
        level.edges().len(),
        level.polygons().len(),
        level.models().len()
    );

    Ok(LoadedLevel { level, warnings })
}

/// The record for `level`.  Selection state is not persisted and
/// point-like coordinates are rounded per the level's configuration.
pub fn serialize_level(level: &Level) -> LevelRecord {
    let config = level.config();
    let round = |value: f64| config.round_coordinate(value);

    let mut record = LevelRecord {
        elevation: level.elevation,
        ..Default::default()
    };

    match level.drawing_filename() {
        Some(filename) => {
            record.drawing = Some(DrawingRecord {
                filename: filename.to_owned(),
            })
        }
        None => {
            record.x_meters = Some(level.x_meters());
            record.y_meters = Some(level.y_meters());
        }
    }

    record.vertices = level
        .vertices()
        .iter()
        .map(|v| PointRecord {
            x: round(v.x),
            y: round(v.y),
            z: 0.0,
            name: v.name.clone(),
            params: v.params.clone(),
        })
        .collect();

    record.fiducials = level
        .fiducials()
        .iter()
        .map(|f| FiducialRecord {
            x: round(f.x),
            y: round(f.y),
            name: f.name.clone(),
        })
        .collect();

    record.tags = level
        .tags()
        .iter()
        .map(|t| PointRecord {
            x: round(t.x),
            y: round(t.y),
            z: 0.0,
            name: t.name.clone(),
            params: t.params.clone(),
        })
        .collect();

    for edge in level.edges() {
        record.edges_mut(edge.edge_type).push(EdgeRecord {
            start: edge.start,
            end: edge.end,
            params: edge.params.clone(),
        });
    }

    record.models = level
        .models()
        .iter()
        .map(|m| ModelRecord {
            name: m.name.clone(),
            model_name: m.model_name.clone(),
            x: round(m.x),
            y: round(m.y),
            z: m.z,
            yaw: m.yaw,
            is_static: m.is_static,
        })
        .collect();

    for polygon in level.polygons() {
        if polygon.polygon_type != PolygonType::Floor {
            log::warn!(
                "level {}: not saving {} polygon, only floors are persisted",
                level.name,
                polygon.polygon_type
            );
            continue;
        }
        record.floors.push(FloorRecord {
            vertices: polygon.vertices.clone(),
            parameters: polygon.params.clone(),
        });
    }

    for layer in level.layers() {
        record.layers.insert(
            layer.name.clone(),
            LayerRecord {
                filename: layer.filename.clone(),
                meters_per_pixel: layer.meters_per_pixel,
                translation_x: layer.translation_x,
                translation_y: layer.translation_y,
                rotation: layer.rotation,
                visible: layer.visible,
            },
        );
    }

    record
}
