// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Property-based tests for the level aggregate.
//!
//! These tests verify that:
//! 1. Arbitrary edit sequences never leave a dangling vertex reference
//! 2. Deleting a vertex that is still in use changes no vertex
//! 3. Levels survive a save/load cycle structurally intact

use proptest::prelude::*;

use crate::config::LevelConfig;
use crate::datamodel::{Edge, EdgeType, Layer, Polygon, PolygonType, Tag, Vertex};
use crate::drawing::NoDrawings;
use crate::format::{LevelRecord, deserialize_level, serialize_level};
use crate::level::{ElementRef, Level};
use crate::param::Param;

fn coordinate() -> impl Strategy<Value = f64> {
    // quarter pixels survive rounding to three decimals exactly
    (-4000i32..4000).prop_map(|x| x as f64 / 4.0)
}

fn edge_type_strategy() -> impl Strategy<Value = EdgeType> {
    prop_oneof![
        Just(EdgeType::Lane),
        Just(EdgeType::Wall),
        Just(EdgeType::Measurement),
        Just(EdgeType::Door),
    ]
}

#[derive(Clone, Debug)]
enum Op {
    AddVertex(f64, f64),
    AddEdge(usize, usize, EdgeType),
    AddFloor(Vec<usize>),
    ToggleVertex(usize),
    ToggleEdge(usize),
    TogglePolygon(usize),
    ClearSelection,
    Delete,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (coordinate(), coordinate()).prop_map(|(x, y)| Op::AddVertex(x, y)),
        3 => (0usize..32, 0usize..32, edge_type_strategy())
            .prop_map(|(a, b, t)| Op::AddEdge(a, b, t)),
        1 => prop::collection::vec(0usize..32, 0..5).prop_map(Op::AddFloor),
        2 => (0usize..32).prop_map(Op::ToggleVertex),
        1 => (0usize..32).prop_map(Op::ToggleEdge),
        1 => (0usize..32).prop_map(Op::TogglePolygon),
        1 => Just(Op::ClearSelection),
        2 => Just(Op::Delete),
    ]
}

fn assert_references_valid(level: &Level) -> Result<(), TestCaseError> {
    let n = level.vertices().len();
    for edge in level.edges() {
        prop_assert!(edge.start < n && edge.end < n, "dangling edge {:?}", edge);
        prop_assert_ne!(edge.start, edge.end);
    }
    for polygon in level.polygons() {
        prop_assert!(!polygon.vertices.is_empty());
        prop_assert!(polygon.vertices.iter().all(|&v| v < n), "dangling polygon");
    }
    Ok(())
}

fn apply(level: &mut Level, op: &Op) -> Result<(), TestCaseError> {
    match op {
        Op::AddVertex(x, y) => {
            level.add_vertex(*x, *y);
        }
        Op::AddEdge(a, b, t) => {
            let ok = *a < level.vertices().len() && *b < level.vertices().len() && a != b;
            prop_assert_eq!(ok, level.add_edge(*a, *b, *t).is_ok());
        }
        Op::AddFloor(vertices) => {
            let n = level.vertices().len();
            let ok = !vertices.is_empty() && vertices.iter().all(|&v| v < n);
            prop_assert_eq!(ok, level.add_polygon(vertices.clone(), PolygonType::Floor).is_ok());
        }
        Op::ToggleVertex(idx) => {
            prop_assert_eq!(
                *idx < level.vertices().len(),
                level.toggle_selected(ElementRef::Vertex(*idx)).is_ok()
            );
        }
        Op::ToggleEdge(idx) => {
            prop_assert_eq!(
                *idx < level.edges().len(),
                level.toggle_selected(ElementRef::Edge(*idx)).is_ok()
            );
        }
        Op::TogglePolygon(idx) => {
            prop_assert_eq!(
                *idx < level.polygons().len(),
                level.toggle_selected(ElementRef::Polygon(*idx)).is_ok()
            );
        }
        Op::ClearSelection => level.clear_selection(),
        Op::Delete => check_delete(level)?,
    }
    Ok(())
}

fn check_delete(level: &mut Level) -> Result<(), TestCaseError> {
    let before_vertices: Vec<Vertex> = level.vertices().to_vec();
    let surviving_edges: Vec<Edge> = level.edges().iter().filter(|e| !e.selected).cloned().collect();
    let surviving_polygons: Vec<Polygon> = level
        .polygons()
        .iter()
        .filter(|p| !p.selected)
        .cloned()
        .collect();
    let target = before_vertices.iter().position(|v| v.selected);
    let in_use = target.is_some_and(|idx| {
        surviving_edges.iter().any(|e| e.references(idx))
            || surviving_polygons.iter().any(|p| p.references(idx))
    });

    let deleted = level.delete_selected();

    prop_assert_eq!(!in_use, deleted);
    prop_assert_eq!(surviving_edges.len(), level.edges().len());
    prop_assert_eq!(surviving_polygons.len(), level.polygons().len());
    match target {
        Some(idx) if deleted => {
            let mut expected = before_vertices;
            expected.remove(idx);
            prop_assert_eq!(&expected[..], level.vertices());
            // every surviving edge still joins the same two points
            for (old, new) in surviving_edges.iter().zip(level.edges()) {
                let old_start = if old.start > idx { old.start - 1 } else { old.start };
                let old_end = if old.end > idx { old.end - 1 } else { old.end };
                prop_assert_eq!((old_start, old_end), (new.start, new.end));
            }
        }
        _ => {
            prop_assert_eq!(&before_vertices[..], level.vertices());
            prop_assert_eq!(&surviving_edges[..], level.edges());
        }
    }
    Ok(())
}

#[derive(Clone, Debug)]
struct LevelSpec {
    vertices: Vec<(f64, f64, String, Option<bool>)>,
    edges: Vec<(usize, usize, EdgeType, bool)>,
    floors: Vec<Vec<usize>>,
    elevation: f64,
    layers: Vec<(f64, f64, f64, f64, bool)>,
    tags: Vec<(f64, f64, String)>,
}

fn level_spec_strategy() -> impl Strategy<Value = LevelSpec> {
    let vertex = (
        coordinate(),
        coordinate(),
        "v[a-z0-9_]{0,6}",
        prop::option::of(any::<bool>()),
    );
    let layer = (
        (1i32..100).prop_map(|mpp| mpp as f64 / 100.0),
        coordinate(),
        coordinate(),
        (-314i32..314).prop_map(|r| r as f64 / 100.0),
        any::<bool>(),
    );
    // sevenths are off the rounding grid
    let off_grid = || (-1_000_000i64..1_000_000).prop_map(|x| x as f64 / 7.0);
    let tag = (off_grid(), off_grid(), "t[a-z0-9_]{0,6}");
    (
        prop::collection::vec(vertex, 2..12),
        prop::collection::vec((0usize..12, 0usize..12, edge_type_strategy(), any::<bool>()), 0..12),
        prop::collection::vec(prop::collection::vec(0usize..12, 1..5), 0..3),
        (-10i32..10).prop_map(|e| e as f64 / 2.0),
        prop::collection::vec(layer, 0..4),
        prop::collection::vec(tag, 0..4),
    )
        .prop_map(
            |(vertices, edges, floors, elevation, layers, tags)| LevelSpec {
                vertices,
                edges,
                floors,
                elevation,
                layers,
                tags,
            },
        )
}

fn build_level(spec: &LevelSpec) -> Level {
    let mut level = Level::new("L1");
    level.elevation = spec.elevation;
    let n = spec.vertices.len();
    for (x, y, name, charger) in spec.vertices.iter() {
        let idx = level.add_vertex(*x, *y);
        level.set_vertex_name(idx, name).unwrap();
        if let Some(charger) = charger {
            level
                .set_param(ElementRef::Vertex(idx), "is_charger", Param::Bool(*charger))
                .unwrap();
        }
    }
    for (a, b, edge_type, flag) in spec.edges.iter() {
        let (a, b) = (a % n, b % n);
        if a == b {
            continue;
        }
        let idx = level.add_edge(a, b, *edge_type).unwrap();
        if *edge_type == EdgeType::Lane {
            level
                .set_param(ElementRef::Edge(idx), "bidirectional", Param::Bool(*flag))
                .unwrap();
        }
    }
    for floor in spec.floors.iter() {
        let vertices = floor.iter().map(|v| v % n).collect();
        level.add_polygon(vertices, PolygonType::Floor).unwrap();
    }
    for (i, (mpp, tx, ty, rotation, visible)) in spec.layers.iter().enumerate() {
        level
            .add_layer(Layer {
                name: format!("layer{i}"),
                filename: format!("layer{i}.png"),
                meters_per_pixel: *mpp,
                translation_x: *tx,
                translation_y: *ty,
                rotation: *rotation,
                visible: *visible,
            })
            .unwrap();
    }
    for (x, y, name) in spec.tags.iter() {
        level.add_tag(Tag::new(*x, *y, name));
    }
    level
}

fn reload(level: &Level) -> Level {
    let text = serde_yaml::to_string(&serialize_level(level)).unwrap();
    let record: LevelRecord = serde_yaml::from_str(&text).unwrap();
    let loaded = deserialize_level(&level.name, &record, &NoDrawings, &LevelConfig::default()).unwrap();
    assert!(loaded.warnings.is_empty());
    loaded.level
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn edits_keep_references_valid(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let mut level = Level::new("L1");
        for op in ops.iter() {
            apply(&mut level, op)?;
            assert_references_valid(&level)?;
        }
    }

    #[test]
    fn level_roundtrip(spec in level_spec_strategy()) {
        let level = build_level(&spec);
        let reloaded = reload(&level);

        prop_assert_eq!(level.vertices(), reloaded.vertices());
        prop_assert_eq!(level.polygons(), reloaded.polygons());
        prop_assert_eq!(level.elevation, reloaded.elevation);
        prop_assert_eq!(level.layers(), reloaded.layers());

        let config = level.config();
        prop_assert_eq!(level.tags().len(), reloaded.tags().len());
        for (before, after) in level.tags().iter().zip(reloaded.tags().iter()) {
            prop_assert_eq!(config.round_coordinate(before.x), after.x);
            prop_assert_eq!(config.round_coordinate(before.y), after.y);
            prop_assert_eq!(&before.name, &after.name);
            prop_assert_eq!(&before.params, &after.params);
        }
        for edge_type in EdgeType::ALL {
            let before: Vec<&Edge> = level.edges_of_type(edge_type).collect();
            let after: Vec<&Edge> = reloaded.edges_of_type(edge_type).collect();
            prop_assert_eq!(before, after);
        }

        // a second cycle changes nothing structural
        let again = reload(&reloaded);
        prop_assert_eq!(serialize_level(&reloaded).vertices, serialize_level(&again).vertices);
        prop_assert_eq!(reloaded.edges(), again.edges());
        prop_assert_eq!(reloaded.tags(), again.tags());
        prop_assert_eq!(reloaded.layers(), again.layers());
    }
}
