// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

#![forbid(unsafe_code)]

pub mod common;
mod containers;
pub mod containment;
pub mod datamodel;
pub mod discovery;
mod edges;
pub mod engine;
pub mod events;
pub mod graph;
pub mod layout;
pub mod memgraph;
pub mod render;
pub mod selection;

pub use self::common::{Error, ErrorCode, ErrorKind, Result};
pub use self::datamodel::{
    Edge, Node, NodeKind, NodeRecord, Position, Rect, RelationKind, RelationshipRecord, Size,
};
pub use self::discovery::{DiagramSession, DiscoveryError, Expansion, GraphQuery};
pub use self::engine::{DiagramEngine, DiagramSnapshot, PlacedNode};
pub use self::events::DiagramEvent;
pub use self::layout::LayoutConfig;
pub use self::memgraph::InMemoryGraph;
pub use self::render::render_svg;
