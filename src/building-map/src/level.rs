// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The level aggregate: one floor of a building, modeled as vertices
//! referenced by position from edges and polygons.
//!
//! Vertex indices are dense and zero-based, and every index stored in an
//! edge or polygon is valid for the current vertex list.  All mutation goes
//! through `Level` so those two properties hold after every call.

use crate::common::Result;
use crate::config::LevelConfig;
use crate::datamodel::{Edge, EdgeType, Fiducial, Layer, Model, Polygon, PolygonType, Tag, Vertex};
use crate::geometry::Point;
use crate::level_err;
use crate::param::{self, Param, ParamSpec};

/// Addresses one element of a level by collection and index.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum ElementRef {
    Vertex(usize),
    Edge(usize),
    Polygon(usize),
    Model(usize),
    Fiducial(usize),
    Tag(usize),
}

/// Outcome of a scale recalculation.
#[derive(Clone, PartialEq, Debug)]
pub struct Calibration {
    pub meters_per_pixel: f64,
    /// Number of measurement edges averaged.
    pub used: usize,
    /// Edge indices of measurements excluded as degenerate.
    pub skipped: Vec<usize>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Level {
    pub name: String,
    pub elevation: f64,
    drawing_filename: Option<String>,
    drawing_width: f64,
    drawing_height: f64,
    x_meters: f64,
    y_meters: f64,
    meters_per_pixel: f64,
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    polygons: Vec<Polygon>,
    layers: Vec<Layer>,
    models: Vec<Model>,
    fiducials: Vec<Fiducial>,
    tags: Vec<Tag>,
    config: LevelConfig,
}

impl Level {
    /// A blank level of the default physical size at the default scale.
    pub fn new(name: &str) -> Self {
        let config = LevelConfig::default();
        let (x_meters, y_meters) = (config.default_x_meters, config.default_y_meters);
        Self::blank(name, config, x_meters, y_meters)
    }

    /// A blank level of the configured default size.
    pub fn with_config(name: &str, config: LevelConfig) -> Result<Self> {
        config.validate()?;
        let (x_meters, y_meters) = (config.default_x_meters, config.default_y_meters);
        Ok(Self::blank(name, config, x_meters, y_meters))
    }

    /// A level without background drawing covering `x_meters` by
    /// `y_meters`.  The pixel space is derived at the default scale.
    pub fn with_dimensions(
        name: &str,
        x_meters: f64,
        y_meters: f64,
        config: LevelConfig,
    ) -> Result<Self> {
        config.validate()?;
        if !is_positive(x_meters) || !is_positive(y_meters) {
            return level_err!(
                BadDimensions,
                format!("level {name}: {x_meters} x {y_meters} meters")
            );
        }
        Ok(Self::blank(name, config, x_meters, y_meters))
    }

    /// A level drawn over a background image of the given pixel size.
    pub fn with_drawing(
        name: &str,
        filename: &str,
        width: u32,
        height: u32,
        config: LevelConfig,
    ) -> Result<Self> {
        config.validate()?;
        if width == 0 || height == 0 {
            return level_err!(
                BadDimensions,
                format!("level {name}: drawing {filename} is {width} x {height} pixels")
            );
        }
        let meters_per_pixel = config.default_meters_per_pixel;
        Ok(Level {
            name: name.to_owned(),
            elevation: 0.0,
            drawing_filename: Some(filename.to_owned()),
            drawing_width: width as f64,
            drawing_height: height as f64,
            x_meters: width as f64 * meters_per_pixel,
            y_meters: height as f64 * meters_per_pixel,
            meters_per_pixel,
            vertices: vec![],
            edges: vec![],
            polygons: vec![],
            layers: vec![],
            models: vec![],
            fiducials: vec![],
            tags: vec![],
            config,
        })
    }

    fn blank(name: &str, config: LevelConfig, x_meters: f64, y_meters: f64) -> Self {
        let meters_per_pixel = config.default_meters_per_pixel;
        Level {
            name: name.to_owned(),
            elevation: 0.0,
            drawing_filename: None,
            drawing_width: x_meters / meters_per_pixel,
            drawing_height: y_meters / meters_per_pixel,
            x_meters,
            y_meters,
            meters_per_pixel,
            vertices: vec![],
            edges: vec![],
            polygons: vec![],
            layers: vec![],
            models: vec![],
            fiducials: vec![],
            tags: vec![],
            config,
        }
    }

    /// Keep a reference to a background drawing whose size could not be
    /// determined; the level keeps its current dimensions.
    pub(crate) fn set_drawing_reference(&mut self, filename: &str) {
        self.drawing_filename = Some(filename.to_owned());
    }

    // queries

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn drawing_filename(&self) -> Option<&str> {
        self.drawing_filename.as_deref()
    }

    pub fn drawing_width(&self) -> f64 {
        self.drawing_width
    }

    pub fn drawing_height(&self) -> f64 {
        self.drawing_height
    }

    pub fn x_meters(&self) -> f64 {
        self.x_meters
    }

    pub fn y_meters(&self) -> f64 {
        self.y_meters
    }

    pub fn meters_per_pixel(&self) -> f64 {
        self.meters_per_pixel
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn fiducials(&self) -> &[Fiducial] {
        &self.fiducials
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn vertex(&self, idx: usize) -> Option<&Vertex> {
        self.vertices.get(idx)
    }

    pub fn edge(&self, idx: usize) -> Option<&Edge> {
        self.edges.get(idx)
    }

    pub fn polygon(&self, idx: usize) -> Option<&Polygon> {
        self.polygons.get(idx)
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    pub fn edges_of_type(&self, edge_type: EdgeType) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.edge_type == edge_type)
    }

    pub fn selected_vertices(&self) -> impl Iterator<Item = (usize, &Vertex)> {
        self.vertices.iter().enumerate().filter(|(_, v)| v.selected)
    }

    pub fn selected_edges(&self) -> impl Iterator<Item = (usize, &Edge)> {
        self.edges.iter().enumerate().filter(|(_, e)| e.selected)
    }

    pub fn selected_polygons(&self) -> impl Iterator<Item = (usize, &Polygon)> {
        self.polygons.iter().enumerate().filter(|(_, p)| p.selected)
    }

    /// Whether any edge or polygon refers to the vertex at `idx`.
    pub fn is_vertex_used(&self, idx: usize) -> bool {
        self.edges.iter().any(|e| e.references(idx))
            || self.polygons.iter().any(|p| p.references(idx))
    }

    pub fn edge_length_pixels(&self, idx: usize) -> Result<f64> {
        let Some(edge) = self.edges.get(idx) else {
            return level_err!(IndexOutOfRange, format!("edge {idx}"));
        };
        let start = self.vertex_position(edge.start)?;
        let end = self.vertex_position(edge.end)?;
        Ok(start.distance_to(end))
    }

    pub fn edge_length_meters(&self, idx: usize) -> Result<f64> {
        Ok(self.edge_length_pixels(idx)? * self.meters_per_pixel)
    }

    /// Scale a drawing-space point into meters.  No axis is flipped.
    pub fn pixel_to_meters(&self, point: Point) -> Point {
        point * self.meters_per_pixel
    }

    fn vertex_position(&self, idx: usize) -> Result<Point> {
        match self.vertices.get(idx) {
            Some(v) => Ok(v.position()),
            None => level_err!(IndexOutOfRange, format!("vertex {idx}")),
        }
    }

    fn check_vertex(&self, idx: usize) -> Result<()> {
        if idx >= self.vertices.len() {
            return level_err!(
                IndexOutOfRange,
                format!("vertex {idx} (level has {})", self.vertices.len())
            );
        }
        Ok(())
    }

    // mutation

    pub fn add_vertex(&mut self, x: f64, y: f64) -> usize {
        self.push_vertex(Vertex::new(x, y))
    }

    pub fn push_vertex(&mut self, vertex: Vertex) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    /// Insert `vertex` at `idx`, shifting every stored reference to `idx` or
    /// beyond up by one.  This is the inverse of deleting an unused vertex.
    pub fn insert_vertex(&mut self, idx: usize, vertex: Vertex) -> Result<()> {
        if idx > self.vertices.len() {
            return level_err!(
                IndexOutOfRange,
                format!("insert at {idx} (level has {})", self.vertices.len())
            );
        }
        for edge in self.edges.iter_mut() {
            if edge.start >= idx {
                edge.start += 1;
            }
            if edge.end >= idx {
                edge.end += 1;
            }
        }
        for polygon in self.polygons.iter_mut() {
            for vertex_idx in polygon.vertices.iter_mut() {
                if *vertex_idx >= idx {
                    *vertex_idx += 1;
                }
            }
        }
        self.vertices.insert(idx, vertex);
        Ok(())
    }

    pub fn move_vertex(&mut self, idx: usize, x: f64, y: f64) -> Result<()> {
        let Some(vertex) = self.vertices.get_mut(idx) else {
            return level_err!(IndexOutOfRange, format!("vertex {idx}"));
        };
        vertex.x = x;
        vertex.y = y;
        Ok(())
    }

    pub fn set_vertex_name(&mut self, idx: usize, name: &str) -> Result<()> {
        let Some(vertex) = self.vertices.get_mut(idx) else {
            return level_err!(IndexOutOfRange, format!("vertex {idx}"));
        };
        name.clone_into(&mut vertex.name);
        Ok(())
    }

    /// Add an edge with the default parameters of its type.
    pub fn add_edge(&mut self, start: usize, end: usize, edge_type: EdgeType) -> Result<usize> {
        let mut edge = Edge::new(start, end, edge_type);
        if edge_type == EdgeType::Measurement {
            edge.params.insert(
                "distance".to_owned(),
                Param::Double(self.config.default_measurement_distance),
            );
        }
        self.push_edge(edge)
    }

    /// Append a fully formed edge, e.g. one captured before removal.
    pub fn push_edge(&mut self, edge: Edge) -> Result<usize> {
        self.check_vertex(edge.start)?;
        self.check_vertex(edge.end)?;
        if edge.start == edge.end {
            return level_err!(
                DegenerateEdge,
                format!("{} edge starts and ends at vertex {}", edge.edge_type, edge.start)
            );
        }
        self.edges.push(edge);
        Ok(self.edges.len() - 1)
    }

    pub fn remove_edge(&mut self, idx: usize) -> Result<Edge> {
        if idx >= self.edges.len() {
            return level_err!(IndexOutOfRange, format!("edge {idx}"));
        }
        Ok(self.edges.remove(idx))
    }

    pub fn add_polygon(&mut self, vertices: Vec<usize>, polygon_type: PolygonType) -> Result<usize> {
        self.push_polygon(Polygon::new(vertices, polygon_type))
    }

    pub fn push_polygon(&mut self, polygon: Polygon) -> Result<usize> {
        if polygon.vertices.is_empty() {
            return level_err!(EmptyPolygon, format!("{} polygon", polygon.polygon_type));
        }
        for &idx in polygon.vertices.iter() {
            self.check_vertex(idx)?;
        }
        self.polygons.push(polygon);
        Ok(self.polygons.len() - 1)
    }

    pub fn remove_polygon(&mut self, idx: usize) -> Result<Polygon> {
        if idx >= self.polygons.len() {
            return level_err!(IndexOutOfRange, format!("polygon {idx}"));
        }
        Ok(self.polygons.remove(idx))
    }

    /// Add a layer, replacing any existing layer of the same name in place.
    pub fn add_layer(&mut self, layer: Layer) -> Result<usize> {
        if !is_positive(layer.meters_per_pixel) {
            return level_err!(
                BadLayer,
                format!("layer {}: meters_per_pixel {}", layer.name, layer.meters_per_pixel)
            );
        }
        if let Some(pos) = self.layers.iter().position(|l| l.name == layer.name) {
            self.layers[pos] = layer;
            return Ok(pos);
        }
        self.layers.push(layer);
        Ok(self.layers.len() - 1)
    }

    pub fn remove_layer(&mut self, name: &str) -> Option<Layer> {
        let pos = self.layers.iter().position(|l| l.name == name)?;
        Some(self.layers.remove(pos))
    }

    pub fn set_layer_visible(&mut self, name: &str, visible: bool) -> Result<()> {
        match self.layers.iter_mut().find(|l| l.name == name) {
            Some(layer) => {
                layer.visible = visible;
                Ok(())
            }
            None => level_err!(DoesNotExist, format!("layer {name}")),
        }
    }

    pub fn add_model(&mut self, model: Model) -> usize {
        self.models.push(model);
        self.models.len() - 1
    }

    pub fn add_fiducial(&mut self, fiducial: Fiducial) -> usize {
        self.fiducials.push(fiducial);
        self.fiducials.len() - 1
    }

    pub fn add_tag(&mut self, tag: Tag) -> usize {
        self.tags.push(tag);
        self.tags.len() - 1
    }

    pub fn move_tag(&mut self, idx: usize, x: f64, y: f64) -> Result<()> {
        let Some(tag) = self.tags.get_mut(idx) else {
            return level_err!(IndexOutOfRange, format!("tag {idx}"));
        };
        tag.x = x;
        tag.y = y;
        Ok(())
    }

    /// Set a named parameter on a vertex, edge, polygon or tag.  Names that
    /// are neither present on the element nor declared for its type are
    /// reported and ignored, returning `Ok(false)`.
    pub fn set_param(&mut self, target: ElementRef, name: &str, value: Param) -> Result<bool> {
        let (params, specs) = self.params_mut(target)?;
        param::set(params, specs, name, value)
    }

    /// Like [`Level::set_param`], parsing `text` per the parameter's kind.
    pub fn set_param_str(&mut self, target: ElementRef, name: &str, text: &str) -> Result<bool> {
        let (params, specs) = self.params_mut(target)?;
        param::set_str(params, specs, name, text)
    }

    fn params_mut(
        &mut self,
        target: ElementRef,
    ) -> Result<(&mut param::ParamMap, &'static [ParamSpec])> {
        let found = match target {
            ElementRef::Vertex(idx) => self
                .vertices
                .get_mut(idx)
                .map(|v| (&mut v.params, Vertex::ALLOWED_PARAMS)),
            ElementRef::Edge(idx) => self.edges.get_mut(idx).map(|e| {
                let specs = e.edge_type.allowed_params();
                (&mut e.params, specs)
            }),
            ElementRef::Polygon(idx) => self.polygons.get_mut(idx).map(|p| {
                let specs = p.polygon_type.allowed_params();
                (&mut p.params, specs)
            }),
            ElementRef::Tag(idx) => self
                .tags
                .get_mut(idx)
                .map(|t| (&mut t.params, Tag::ALLOWED_PARAMS)),
            ElementRef::Model(_) | ElementRef::Fiducial(_) => {
                return level_err!(DoesNotExist, format!("{target:?} has no parameters"));
            }
        };
        match found {
            Some(found) => Ok(found),
            None => level_err!(IndexOutOfRange, format!("{target:?}")),
        }
    }

    fn selected_flag_mut(&mut self, target: ElementRef) -> Result<&mut bool> {
        let flag = match target {
            ElementRef::Vertex(idx) => self.vertices.get_mut(idx).map(|v| &mut v.selected),
            ElementRef::Edge(idx) => self.edges.get_mut(idx).map(|e| &mut e.selected),
            ElementRef::Polygon(idx) => self.polygons.get_mut(idx).map(|p| &mut p.selected),
            ElementRef::Model(idx) => self.models.get_mut(idx).map(|m| &mut m.selected),
            ElementRef::Fiducial(idx) => self.fiducials.get_mut(idx).map(|f| &mut f.selected),
            ElementRef::Tag(idx) => self.tags.get_mut(idx).map(|t| &mut t.selected),
        };
        match flag {
            Some(flag) => Ok(flag),
            None => level_err!(IndexOutOfRange, format!("{target:?}")),
        }
    }

    /// Flip the selection state of an element, returning the new state.
    pub fn toggle_selected(&mut self, target: ElementRef) -> Result<bool> {
        let flag = self.selected_flag_mut(target)?;
        *flag = !*flag;
        Ok(*flag)
    }

    pub fn set_selected(&mut self, target: ElementRef, selected: bool) -> Result<()> {
        *self.selected_flag_mut(target)? = selected;
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.vertices.iter_mut().for_each(|v| v.selected = false);
        self.edges.iter_mut().for_each(|e| e.selected = false);
        self.polygons.iter_mut().for_each(|p| p.selected = false);
        self.models.iter_mut().for_each(|m| m.selected = false);
        self.fiducials.iter_mut().for_each(|f| f.selected = false);
        self.tags.iter_mut().for_each(|t| t.selected = false);
    }

    /// Delete the current selection.
    ///
    /// Selected edges, polygons, models, fiducials and tags are removed
    /// unconditionally, since nothing refers to them.  Then at most one
    /// vertex, the first selected one, is deleted; callers invoke this
    /// repeatedly to delete several.  If that vertex is still referenced by
    /// an edge or polygon nothing further happens and `false` is returned;
    /// the removals above are kept.
    pub fn delete_selected(&mut self) -> bool {
        self.edges.retain(|e| !e.selected);
        self.polygons.retain(|p| !p.selected);
        self.models.retain(|m| !m.selected);
        self.fiducials.retain(|f| !f.selected);
        self.tags.retain(|t| !t.selected);

        let Some(selected_idx) = self.vertices.iter().position(|v| v.selected) else {
            return true;
        };

        if self.is_vertex_used(selected_idx) {
            log::debug!(
                "level {}: not deleting vertex {selected_idx}, it is in use",
                self.name
            );
            return false;
        }

        self.vertices.remove(selected_idx);

        for edge in self.edges.iter_mut() {
            if edge.start > selected_idx {
                edge.start -= 1;
            }
            if edge.end > selected_idx {
                edge.end -= 1;
            }
        }
        for polygon in self.polygons.iter_mut() {
            for vertex_idx in polygon.vertices.iter_mut() {
                if *vertex_idx > selected_idx {
                    *vertex_idx -= 1;
                }
            }
        }

        log::debug!("level {}: deleted vertex {selected_idx}", self.name);
        true
    }

    /// Estimate meters-per-pixel as the mean of `distance / pixel length`
    /// over all usable measurement edges, then rederive the physical size.
    pub fn calculate_scale(&mut self) -> Calibration {
        let mut scale_sum = 0.0;
        let mut used = 0;
        let mut skipped = vec![];

        for (idx, edge) in self.edges.iter().enumerate() {
            if edge.edge_type != EdgeType::Measurement {
                continue;
            }
            match self.measurement_ratio(edge) {
                Some(ratio) => {
                    scale_sum += ratio;
                    used += 1;
                }
                None => {
                    log::warn!(
                        "level {}: ignoring degenerate measurement {idx} ({} -> {})",
                        self.name,
                        edge.start,
                        edge.end
                    );
                    skipped.push(idx);
                }
            }
        }

        let estimate = if used > 0 {
            Some(scale_sum / used as f64).filter(|mpp| is_positive(*mpp))
        } else {
            None
        };
        self.meters_per_pixel = match estimate {
            Some(mpp) => {
                log::info!(
                    "level {}: used {used} measurements to estimate meters/pixel as {mpp:.5}",
                    self.name
                );
                mpp
            }
            None => self.config.default_meters_per_pixel,
        };

        self.x_meters = self.drawing_width * self.meters_per_pixel;
        self.y_meters = self.drawing_height * self.meters_per_pixel;

        Calibration {
            meters_per_pixel: self.meters_per_pixel,
            used,
            skipped,
        }
    }

    fn measurement_ratio(&self, edge: &Edge) -> Option<f64> {
        let start = self.vertices.get(edge.start)?.position();
        let end = self.vertices.get(edge.end)?.position();
        let distance_pixels = start.distance_to(end);
        let distance_meters = edge.distance()?;
        if !is_positive(distance_pixels) || !is_positive(distance_meters) {
            return None;
        }
        let ratio = distance_meters / distance_pixels;
        is_positive(ratio).then_some(ratio)
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
