// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 2D position on the canvas.
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Position {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Position {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned box in canvas coordinates.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn at(position: Position, size: Size) -> Self {
        Self::new(position.x, position.y, size.width, size.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Position {
        Position::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Strict intersection: boxes that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn overlaps_vertically(&self, other: &Rect) -> bool {
        self.y < other.bottom() && other.y < self.bottom()
    }

    pub fn padded(&self, margin: f64) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

/// The closed set of event-storming element kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "BoundedContext", alias = "Context")]
    Context,
    Aggregate,
    Command,
    Event,
    Policy,
    ReadModel,
    #[serde(rename = "UI", alias = "Ui")]
    Ui,
}

impl NodeKind {
    /// Batch placement order: containers first, then parents before the
    /// elements that hang off them.
    pub fn placement_rank(self) -> usize {
        match self {
            NodeKind::Context => 0,
            NodeKind::Aggregate => 1,
            NodeKind::Command => 2,
            NodeKind::Event => 3,
            NodeKind::Policy => 4,
            NodeKind::ReadModel => 5,
            NodeKind::Ui => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Context => "BoundedContext",
            NodeKind::Aggregate => "Aggregate",
            NodeKind::Command => "Command",
            NodeKind::Event => "Event",
            NodeKind::Policy => "Policy",
            NodeKind::ReadModel => "ReadModel",
            NodeKind::Ui => "UI",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    Emits,
    Triggers,
    Invokes,
    HasCommand,
    HasAggregate,
    HasPolicy,
    #[serde(rename = "HAS_READMODEL")]
    HasReadModel,
    HasUi,
    /// Synthetic container-to-container summary edge.
    ContainerLink,
}

impl RelationKind {
    /// Context-owns-element relationships. Expressed through
    /// `Node::container_id`, never drawn.
    pub fn is_containment(self) -> bool {
        matches!(
            self,
            RelationKind::HasAggregate
                | RelationKind::HasPolicy
                | RelationKind::HasReadModel
                | RelationKind::HasUi
        )
    }

    pub fn is_causal(self) -> bool {
        self == RelationKind::Triggers
    }

    /// Parent-to-child links that let a child inherit its parent's container.
    pub fn implies_same_container(self) -> bool {
        matches!(self, RelationKind::HasCommand | RelationKind::Emits)
    }
}

/// A node as supplied by the graph query collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "bcId", skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoke_command_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_event_id: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl NodeRecord {
    pub fn new(id: &str, kind: NodeKind, name: &str) -> Self {
        NodeRecord {
            id: id.to_owned(),
            kind,
            name: name.to_owned(),
            description: None,
            container_id: None,
            invoke_command_id: None,
            trigger_event_id: None,
            attributes: Map::new(),
        }
    }

    pub fn in_container(mut self, container_id: &str) -> Self {
        self.container_id = Some(container_id.to_owned());
        self
    }

    pub fn invoking(mut self, command_id: &str) -> Self {
        self.invoke_command_id = Some(command_id.to_owned());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: RelationKind,
}

impl RelationshipRecord {
    pub fn new(source: &str, target: &str, kind: RelationKind) -> Self {
        RelationshipRecord {
            source: source.to_owned(),
            target: target.to_owned(),
            kind,
        }
    }
}

/// A node placed on the canvas. Contained nodes carry a position relative
/// to their container's origin; everything else is absolute.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub position: Position,
    pub size: Size,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoke_command_id: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

impl Node {
    pub fn from_record(record: &NodeRecord, size: Size) -> Self {
        Node {
            id: record.id.clone(),
            kind: record.kind,
            name: record.name.clone(),
            description: record.description.clone(),
            position: Position::default(),
            size,
            container_id: None,
            hidden: false,
            invoke_command_id: record.invoke_command_id.clone(),
            attributes: record.attributes.clone(),
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Box in the node's own coordinate frame.
    pub fn local_bounds(&self) -> Rect {
        Rect::at(self.position, self.size)
    }
}

pub fn edge_id(source: &str, target: &str) -> String {
    format!("{source}->{target}")
}

pub fn bundle_id(source_container: &str, target_container: &str) -> String {
    format!("bundle:{source_container}->{target_container}")
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: RelationKind,
    pub hidden: bool,
    pub bundled: bool,
    pub count: u32,
    pub cross_container: bool,
    pub animated: bool,
    /// For a node-level edge spanning two containers, the id of the
    /// container-level edge that summarizes it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle: Option<String>,
}

impl Edge {
    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}
