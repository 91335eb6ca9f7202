// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::str::FromStr;

use crate::geometry::Point;
use crate::param::{DefaultValue, Param, ParamKind, ParamMap, ParamSpec};

#[derive(Clone, PartialEq, Debug, Default)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
    pub name: String,
    pub params: ParamMap,
    pub selected: bool,
}

impl Vertex {
    pub const ALLOWED_PARAMS: &'static [ParamSpec] = &[
        optional("is_parking_spot", ParamKind::Bool),
        optional("is_holding_point", ParamKind::Bool),
        optional("is_passthrough_point", ParamKind::Bool),
        optional("is_charger", ParamKind::Bool),
        optional("is_cleaning_zone", ParamKind::Bool),
        optional("dock_name", ParamKind::String),
        optional("spawn_robot_type", ParamKind::String),
        optional("spawn_robot_name", ParamKind::String),
        optional("pickup_dispenser", ParamKind::String),
        optional("dropoff_ingestor", ParamKind::String),
        optional("human_goal_set_name", ParamKind::String),
    ];

    pub fn new(x: f64, y: f64) -> Self {
        Vertex {
            x,
            y,
            ..Default::default()
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum EdgeType {
    Lane,
    Wall,
    Measurement,
    Door,
}

impl EdgeType {
    pub const ALL: [EdgeType; 4] = [
        EdgeType::Lane,
        EdgeType::Wall,
        EdgeType::Measurement,
        EdgeType::Door,
    ];

    /// Name of the sequence holding edges of this type in a level record.
    pub fn container_name(self) -> &'static str {
        match self {
            EdgeType::Lane => "lanes",
            EdgeType::Wall => "walls",
            EdgeType::Measurement => "measurements",
            EdgeType::Door => "doors",
        }
    }

    pub fn allowed_params(self) -> &'static [ParamSpec] {
        match self {
            EdgeType::Lane => LANE_PARAMS,
            EdgeType::Wall => WALL_PARAMS,
            EdgeType::Measurement => MEASUREMENT_PARAMS,
            EdgeType::Door => DOOR_PARAMS,
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            EdgeType::Lane => "lane",
            EdgeType::Wall => "wall",
            EdgeType::Measurement => "measurement",
            EdgeType::Door => "door",
        };
        write!(f, "{name}")
    }
}

const LANE_PARAMS: &[ParamSpec] = &[
    required("bidirectional", DefaultValue::Bool(false)),
    required("graph_idx", DefaultValue::Int(0)),
    optional("orientation", ParamKind::String),
    optional("demo_mock_floor_name", ParamKind::String),
    optional("demo_mock_lift_name", ParamKind::String),
];

const WALL_PARAMS: &[ParamSpec] = &[
    optional("texture_name", ParamKind::String),
    optional("alpha", ParamKind::Double),
];

const MEASUREMENT_PARAMS: &[ParamSpec] = &[required(
    "distance",
    DefaultValue::Double(crate::config::DEFAULT_MEASUREMENT_DISTANCE),
)];

const DOOR_PARAMS: &[ParamSpec] = &[
    required("name", DefaultValue::String("")),
    required("type", DefaultValue::String("hinged")),
    required("motion_axis", DefaultValue::String("start")),
    required("motion_degrees", DefaultValue::Double(90.0)),
    required("motion_direction", DefaultValue::Int(1)),
    required("right_left_ratio", DefaultValue::Double(1.0)),
];

const fn required(name: &'static str, value: DefaultValue) -> ParamSpec {
    let kind = match value {
        DefaultValue::String(_) => ParamKind::String,
        DefaultValue::Int(_) => ParamKind::Int,
        DefaultValue::Double(_) => ParamKind::Double,
        DefaultValue::Bool(_) => ParamKind::Bool,
    };
    ParamSpec {
        name,
        kind,
        required: Some(value),
    }
}

const fn optional(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: None,
    }
}

/// Motion model of a door edge, from its `type` parameter.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DoorType {
    Hinged,
    DoubleHinged,
    Sliding,
    DoubleSliding,
}

impl FromStr for DoorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hinged" => Ok(DoorType::Hinged),
            "double_hinged" => Ok(DoorType::DoubleHinged),
            "sliding" => Ok(DoorType::Sliding),
            "double_sliding" => Ok(DoorType::DoubleSliding),
            _ => Err(s.to_owned()),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Edge {
    pub start: usize,
    pub end: usize,
    pub edge_type: EdgeType,
    pub params: ParamMap,
    pub selected: bool,
}

impl Edge {
    /// A new edge carrying the default value of every parameter its type
    /// requires.
    pub fn new(start: usize, end: usize, edge_type: EdgeType) -> Self {
        let mut edge = Edge {
            start,
            end,
            edge_type,
            params: ParamMap::new(),
            selected: false,
        };
        edge.create_required_params();
        edge
    }

    pub fn create_required_params(&mut self) {
        crate::param::create_required(&mut self.params, self.edge_type.allowed_params());
    }

    pub fn references(&self, vertex_idx: usize) -> bool {
        self.start == vertex_idx || self.end == vertex_idx
    }

    /// Only changes how consumers (planners, renderers) read a lane.
    pub fn is_bidirectional(&self) -> bool {
        self.params
            .get("bidirectional")
            .and_then(Param::as_bool)
            .unwrap_or(false)
    }

    pub fn graph_idx(&self) -> i64 {
        self.params
            .get("graph_idx")
            .and_then(Param::as_int)
            .unwrap_or(0)
    }

    /// Physical length in meters stated by a measurement edge.
    pub fn distance(&self) -> Option<f64> {
        self.params.get("distance").and_then(Param::as_double)
    }

    /// The door type, `Err` holding the raw value if it is not recognized.
    /// `None` for edges without a `type` parameter.
    pub fn door_type(&self) -> Option<Result<DoorType, String>> {
        let raw = self.params.get("type")?;
        Some(match raw.as_str() {
            Some(s) => s.parse(),
            None => Err(raw.to_string()),
        })
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum PolygonType {
    Floor,
    Hole,
    Roi,
}

impl fmt::Display for PolygonType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PolygonType::Floor => "floor",
            PolygonType::Hole => "hole",
            PolygonType::Roi => "roi",
        };
        write!(f, "{name}")
    }
}

impl PolygonType {
    pub fn allowed_params(self) -> &'static [ParamSpec] {
        match self {
            PolygonType::Floor => FLOOR_PARAMS,
            PolygonType::Hole | PolygonType::Roi => &[],
        }
    }
}

const FLOOR_PARAMS: &[ParamSpec] = &[
    optional("texture_name", ParamKind::String),
    optional("texture_scale", ParamKind::Double),
    optional("texture_rotation", ParamKind::Double),
];

#[derive(Clone, PartialEq, Debug)]
pub struct Polygon {
    pub vertices: Vec<usize>,
    pub polygon_type: PolygonType,
    pub params: ParamMap,
    pub selected: bool,
}

impl Polygon {
    pub fn new(vertices: Vec<usize>, polygon_type: PolygonType) -> Self {
        Polygon {
            vertices,
            polygon_type,
            params: ParamMap::new(),
            selected: false,
        }
    }

    pub fn references(&self, vertex_idx: usize) -> bool {
        self.vertices.contains(&vertex_idx)
    }
}

/// A geo-referenced raster overlay.  Translation is in meters, rotation in
/// radians; the layer has its own scale independent of the level's.
#[derive(Clone, PartialEq, Debug)]
pub struct Layer {
    pub name: String,
    pub filename: String,
    pub meters_per_pixel: f64,
    pub translation_x: f64,
    pub translation_y: f64,
    pub rotation: f64,
    pub visible: bool,
}

impl Layer {
    pub fn new(name: &str, filename: &str, meters_per_pixel: f64) -> Self {
        Layer {
            name: name.to_owned(),
            filename: filename.to_owned(),
            meters_per_pixel,
            translation_x: 0.0,
            translation_y: 0.0,
            rotation: 0.0,
            visible: true,
        }
    }
}

/// A placed model instance; opaque to the level beyond storage.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Model {
    pub name: String,
    pub model_name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f64,
    pub is_static: bool,
    pub selected: bool,
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct Fiducial {
    pub x: f64,
    pub y: f64,
    pub name: String,
    pub selected: bool,
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct Tag {
    pub x: f64,
    pub y: f64,
    pub name: String,
    pub params: ParamMap,
    pub selected: bool,
}

impl Tag {
    pub const ALLOWED_PARAMS: &'static [ParamSpec] = &[
        optional("is_april_tag", ParamKind::Bool),
        optional("is_signage", ParamKind::Bool),
        optional("human_goal_set_name", ParamKind::String),
    ];

    pub fn new(x: f64, y: f64, name: &str) -> Self {
        Tag {
            x,
            y,
            name: name.to_owned(),
            ..Default::default()
        }
    }

    pub fn is_april_tag(&self) -> bool {
        self.params
            .get("is_april_tag")
            .and_then(Param::as_bool)
            .unwrap_or(false)
    }

    pub fn is_signage(&self) -> bool {
        self.params
            .get("is_signage")
            .and_then(Param::as_bool)
            .unwrap_or(false)
    }
}
