// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::HashMap;

use crate::datamodel::{Edge, Node, NodeKind};

/// Nodes and edges removed by a cascading delete, in removal order.
#[derive(Debug, Default)]
pub struct Removed {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Canonical in-memory store of placed nodes and materialized edges.
///
/// Identity is by id: inserting a record whose id is already present is a
/// no-op, never an update. Iteration follows insertion order so that every
/// consumer sees a deterministic sequence.
#[derive(Debug, Default, Clone)]
pub struct GraphModel {
    nodes: HashMap<String, Node>,
    node_order: Vec<String>,
    edges: HashMap<String, Edge>,
    edge_order: Vec<String>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.node_order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn node_count(&self) -> usize {
        self.node_order.len()
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn edge_mut(&mut self, id: &str) -> Option<&mut Edge> {
        self.edges.get_mut(id)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edge_order.iter().filter_map(|id| self.edges.get(id))
    }

    pub fn edge_ids_touching(&self, node_id: &str) -> Vec<String> {
        self.edges()
            .filter(|e| e.touches(node_id))
            .map(|e| e.id.clone())
            .collect()
    }

    /// Insert nodes whose ids are not yet present. Returns the ids that
    /// were actually added.
    pub fn upsert_nodes(&mut self, nodes: Vec<Node>) -> Vec<String> {
        let mut added = Vec::new();
        for node in nodes {
            if self.nodes.contains_key(&node.id) {
                continue;
            }
            added.push(node.id.clone());
            self.node_order.push(node.id.clone());
            self.nodes.insert(node.id.clone(), node);
        }
        added
    }

    /// Insert edges that are new, drawable and fully anchored. Anything
    /// else is skipped silently.
    pub fn upsert_edges(&mut self, edges: Vec<Edge>) -> Vec<String> {
        let mut added = Vec::new();
        for edge in edges {
            if self.edges.contains_key(&edge.id)
                || edge.kind.is_containment()
                || !self.nodes.contains_key(&edge.source)
                || !self.nodes.contains_key(&edge.target)
            {
                continue;
            }
            added.push(edge.id.clone());
            self.edge_order.push(edge.id.clone());
            self.edges.insert(edge.id.clone(), edge);
        }
        added
    }

    pub fn remove_edge(&mut self, id: &str) -> Option<Edge> {
        let edge = self.edges.remove(id)?;
        self.edge_order.retain(|e| e != id);
        Some(edge)
    }

    /// Remove a node together with every edge touching it. Removing a
    /// Context first removes each of its children the same way.
    pub fn remove_node(&mut self, id: &str) -> Removed {
        let mut removed = Removed::default();
        let Some(kind) = self.nodes.get(id).map(|n| n.kind) else {
            return removed;
        };

        if kind == NodeKind::Context {
            let children: Vec<String> = self
                .nodes()
                .filter(|n| n.container_id.as_deref() == Some(id))
                .map(|n| n.id.clone())
                .collect();
            for child in children {
                self.remove_single(&child, &mut removed);
            }
        }
        self.remove_single(id, &mut removed);
        removed
    }

    fn remove_single(&mut self, id: &str, removed: &mut Removed) {
        for edge_id in self.edge_ids_touching(id) {
            if let Some(edge) = self.remove_edge(&edge_id) {
                removed.edges.push(edge);
            }
        }
        if let Some(node) = self.nodes.remove(id) {
            self.node_order.retain(|n| n != id);
            removed.nodes.push(node);
        }
    }
}
