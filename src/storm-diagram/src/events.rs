// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use serde::Serialize;

use crate::datamodel::{Position, Size};

/// A change to the diagram, emitted by every mutating engine operation so
/// that a rendering layer can patch itself without diffing.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DiagramEvent {
    NodeAdded { id: String },
    NodeRemoved { id: String },
    NodeMoved { id: String, position: Position },
    NodeVisibilityChanged { id: String, hidden: bool },
    ContainerToggled { id: String, collapsed: bool },
    ContainerResized { id: String, size: Size },
    EdgeAdded { id: String },
    EdgeRemoved { id: String },
    EdgeVisibilityChanged { id: String, hidden: bool },
    BundleCountChanged { id: String, count: u32 },
    SelectionChanged { selected: Vec<String> },
}

impl DiagramEvent {
    /// Id of the node or edge the event is about, if any.
    pub fn subject(&self) -> Option<&str> {
        match self {
            DiagramEvent::NodeAdded { id }
            | DiagramEvent::NodeRemoved { id }
            | DiagramEvent::NodeMoved { id, .. }
            | DiagramEvent::NodeVisibilityChanged { id, .. }
            | DiagramEvent::ContainerToggled { id, .. }
            | DiagramEvent::ContainerResized { id, .. }
            | DiagramEvent::EdgeAdded { id }
            | DiagramEvent::EdgeRemoved { id }
            | DiagramEvent::EdgeVisibilityChanged { id, .. }
            | DiagramEvent::BundleCountChanged { id, .. } => Some(id),
            DiagramEvent::SelectionChanged { .. } => None,
        }
    }
}
