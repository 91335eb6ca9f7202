// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Editable 2D building maps: levels of vertices, walls, lanes, doors and
//! measurements drawn over a background image, with the scale of the image
//! calibrated from measurement edges.

#![forbid(unsafe_code)]

pub mod building;
pub mod common;
pub mod config;
pub mod datamodel;
pub mod drawing;
pub mod format;
pub mod geometry;
pub mod level;
pub mod param;

#[cfg(test)]
mod level_proptest;

pub use self::building::{Building, BuildingRecord, LoadedBuilding};
pub use self::common::{Error, ErrorCode, ErrorKind, Result, Warning};
pub use self::config::LevelConfig;
pub use self::datamodel::{
    DoorType, Edge, EdgeType, Fiducial, Layer, Model, Polygon, PolygonType, Tag, Vertex,
};
pub use self::drawing::{DrawingLoader, NoDrawings};
pub use self::format::{LevelRecord, LoadedLevel, deserialize_level, serialize_level};
pub use self::geometry::Point;
pub use self::level::{Calibration, ElementRef, Level};
pub use self::param::{Param, ParamKind};
