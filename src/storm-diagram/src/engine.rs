// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::containment::ContainmentIndex;
use crate::datamodel::{
    Edge, Node, NodeKind, NodeRecord, Position, Rect, RelationKind, RelationshipRecord,
};
use crate::events::DiagramEvent;
use crate::graph::{GraphModel, Removed};
use crate::layout::avoidance;
use crate::layout::columns::{self, Sibling};
use crate::layout::config::LayoutConfig;
use crate::selection::{SelectedNode, Selection};

/// Where a node ended up after a layout batch.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedNode {
    pub id: String,
    pub kind: NodeKind,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    pub hidden: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContainerSnapshot {
    pub id: String,
    pub collapsed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DiagramSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub containers: Vec<ContainerSnapshot>,
    pub selection: Vec<SelectedNode>,
}

/// One canvas: the nodes and edges on it, container collapse state and the
/// current selection.
///
/// Every operation is synchronous and tolerant of stale or partial input:
/// references to unknown nodes or containers are no-ops, never errors.
/// Mutations are recorded as `DiagramEvent`s, drained with `take_events`.
#[derive(Debug, Clone)]
pub struct DiagramEngine {
    pub(crate) config: LayoutConfig,
    pub(crate) graph: GraphModel,
    pub(crate) containment: ContainmentIndex,
    pub(crate) selection: Selection,
    pub(crate) events: Vec<DiagramEvent>,
    standalone_slots: usize,
}

impl Default for DiagramEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl DiagramEngine {
    pub fn new(config: LayoutConfig) -> Self {
        DiagramEngine {
            config,
            graph: GraphModel::new(),
            containment: ContainmentIndex::new(),
            selection: Selection::new(),
            events: Vec::new(),
            standalone_slots: 0,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn graph(&self) -> &GraphModel {
        &self.graph
    }

    pub fn containment(&self) -> &ContainmentIndex {
        &self.containment
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.graph.node(id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.graph.edge(id)
    }

    pub fn node_ids(&self) -> Vec<String> {
        self.graph.nodes().map(|n| n.id.clone()).collect()
    }

    pub fn is_collapsed(&self, container_id: &str) -> Option<bool> {
        self.containment.is_collapsed(container_id)
    }

    /// Drain the change events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<DiagramEvent> {
        std::mem::take(&mut self.events)
    }

    /// Canvas-coordinate box of a node.
    pub fn absolute_bounds(&self, id: &str) -> Option<Rect> {
        self.graph.node(id).map(|n| self.bounds_of(n))
    }

    pub(crate) fn bounds_of(&self, node: &Node) -> Rect {
        let origin = node
            .container_id
            .as_deref()
            .and_then(|c| self.graph.node(c))
            .map(|c| c.position)
            .unwrap_or_default();
        Rect::at(origin + node.position, node.size)
    }

    /// Boxes of every visible node, optionally leaving one out.
    pub(crate) fn visible_footprints(&self, exclude: Option<&str>) -> Vec<Rect> {
        self.graph
            .nodes()
            .filter(|n| !n.hidden && Some(n.id.as_str()) != exclude)
            .map(|n| self.bounds_of(n))
            .collect()
    }

    /// Place a single node, optionally inside a container. Returns the
    /// node's position, which is its existing one if it was already placed.
    pub fn place(&mut self, record: &NodeRecord, container_id: Option<&str>) -> Option<Position> {
        let mut record = record.clone();
        if let Some(container_id) = container_id {
            record.container_id = Some(container_id.to_owned());
        }
        self.add_nodes_with_layout(std::slice::from_ref(&record), &[], None);
        self.graph.node(&record.id).map(|n| n.position)
    }

    /// Add records without relationships. Returns the ids actually added.
    pub fn upsert_nodes(&mut self, records: &[NodeRecord]) -> Vec<String> {
        self.add_nodes_with_layout(records, &[], None)
            .into_iter()
            .map(|p| p.id)
            .collect()
    }

    /// Materialize relationships as edges where possible. Returns the
    /// edges actually created.
    pub fn upsert_edges(&mut self, relationships: &[RelationshipRecord]) -> Vec<Edge> {
        relationships
            .iter()
            .filter_map(|r| self.add_edge(&r.source, &r.target, r.kind))
            .collect()
    }

    /// Place a batch of nodes fetched from the graph collaborator, then draw
    /// the relationships between them.
    ///
    /// Contexts are placed first, then contained elements by type column,
    /// then anything without a container by obstacle avoidance. Records
    /// already on the canvas are ignored.
    pub fn add_nodes_with_layout(
        &mut self,
        records: &[NodeRecord],
        relationships: &[RelationshipRecord],
        container_context: Option<&NodeRecord>,
    ) -> Vec<PlacedNode> {
        let mut batch: Vec<&NodeRecord> = records.iter().collect();
        batch.sort_by_key(|r| r.kind.placement_rank());
        let context = container_context.filter(|c| c.kind == NodeKind::Context);

        let mut placed: Vec<String> = Vec::new();
        let contexts = context
            .into_iter()
            .chain(batch.iter().copied().filter(|r| r.kind == NodeKind::Context));
        for record in contexts {
            if self.graph.contains_node(&record.id) {
                continue;
            }
            self.place_context(record);
            placed.push(record.id.clone());
        }

        let mut resolved: HashMap<&str, Option<String>> = HashMap::new();
        for record in batch.iter().filter(|r| r.kind != NodeKind::Context) {
            let container = self.resolve_container(record, context, relationships, &resolved);
            resolved.insert(record.id.as_str(), container);
        }

        let mut dirty: Vec<String> = Vec::new();
        let mut standalone: Vec<&NodeRecord> = Vec::new();
        for record in batch.iter().copied() {
            if record.kind == NodeKind::Context {
                continue;
            }
            if self.graph.contains_node(&record.id) {
                debug!(node = %record.id, "node already on canvas, skipping");
                continue;
            }
            let container = resolved.get(record.id.as_str()).cloned().flatten();
            let Some(container_id) = container.filter(|c| self.can_contain(c)) else {
                standalone.push(record);
                continue;
            };
            if !self.containment.contains(&container_id) {
                let placeholder = NodeRecord::new(&container_id, NodeKind::Context, &container_id);
                self.place_context(&placeholder);
                placed.push(container_id.clone());
            }
            self.place_in_container(record, &container_id, relationships);
            placed.push(record.id.clone());
            if !dirty.contains(&container_id) {
                dirty.push(container_id);
            }
        }
        for container_id in &dirty {
            self.refresh_container(container_id);
        }

        for record in standalone {
            self.place_standalone(record, relationships);
            placed.push(record.id.clone());
        }

        for rel in relationships {
            self.add_edge(&rel.source, &rel.target, rel.kind);
        }

        placed
            .iter()
            .filter_map(|id| self.graph.node(id))
            .map(|n| PlacedNode {
                id: n.id.clone(),
                kind: n.kind,
                position: n.position,
                container_id: n.container_id.clone(),
                hidden: n.hidden,
            })
            .collect()
    }

    /// A container id is usable unless it names a node that is not a Context.
    fn can_contain(&self, container_id: &str) -> bool {
        match self.graph.node(container_id) {
            Some(node) if node.kind != NodeKind::Context => {
                debug!(container = %container_id, "container id names a non-context node");
                false
            }
            _ => true,
        }
    }

    fn resolve_container(
        &self,
        record: &NodeRecord,
        context: Option<&NodeRecord>,
        relationships: &[RelationshipRecord],
        resolved: &HashMap<&str, Option<String>>,
    ) -> Option<String> {
        if let Some(id) = &record.container_id {
            return Some(id.clone());
        }
        if let Some(context) = context {
            return Some(context.id.clone());
        }
        for rel in relationships.iter().filter(|r| r.target == record.id) {
            if rel.kind.is_containment() {
                return Some(rel.source.clone());
            }
            if rel.kind.implies_same_container() {
                let parent = resolved
                    .get(rel.source.as_str())
                    .cloned()
                    .flatten()
                    .or_else(|| {
                        self.graph
                            .node(&rel.source)
                            .and_then(|n| n.container_id.clone())
                    });
                if parent.is_some() {
                    return parent;
                }
            }
        }
        None
    }

    /// Place a Context in the next free lane, collapsed. Returns its
    /// position.
    fn place_context(&mut self, record: &NodeRecord) -> Position {
        if let Some(node) = self.graph.node(&record.id) {
            return node.position;
        }
        let home = Position::new(
            self.config.lane_x(self.containment.len()),
            self.config.container_origin.y,
        );
        let mut node = Node::from_record(record, self.config.collapsed_size);
        node.position = home;
        self.containment.register(&record.id, home);
        self.graph.upsert_nodes(vec![node]);
        self.events.push(DiagramEvent::NodeAdded {
            id: record.id.clone(),
        });
        debug!(container = %record.id, x = home.x, "placed container");
        self.reflow_containers();
        self.graph.node(&record.id).map(|n| n.position).unwrap_or(home)
    }

    fn invoked_command(&self, record: &NodeRecord, relationships: &[RelationshipRecord]) -> Option<&Node> {
        let command_id = record.invoke_command_id.clone().or_else(|| {
            relationships
                .iter()
                .find(|r| r.source == record.id && r.kind == RelationKind::Invokes)
                .map(|r| r.target.clone())
        })?;
        self.graph
            .node(&command_id)
            .filter(|n| n.kind == NodeKind::Command)
    }

    fn place_in_container(
        &mut self,
        record: &NodeRecord,
        container_id: &str,
        relationships: &[RelationshipRecord],
    ) {
        let siblings: Vec<Sibling> = self
            .containment
            .children(container_id)
            .iter()
            .filter_map(|id| self.graph.node(id))
            .map(|n| Sibling {
                kind: n.kind,
                bounds: n.local_bounds(),
            })
            .collect();
        let invoked = if record.kind == NodeKind::Policy {
            self.invoked_command(record, relationships)
                .filter(|cmd| cmd.container_id.as_deref() == Some(container_id))
                .map(|cmd| cmd.local_bounds())
        } else {
            None
        };
        let position = columns::place_in_container(&self.config, record.kind, &siblings, invoked);

        let mut node = Node::from_record(record, self.config.size_for(record.kind));
        node.position = position;
        node.container_id = Some(container_id.to_owned());
        node.hidden = self.containment.is_collapsed(container_id).unwrap_or(true);

        debug!(node = %record.id, container = %container_id, x = position.x, y = position.y, "placed in container");
        self.graph.upsert_nodes(vec![node]);
        self.containment.add_child(container_id, &record.id);
        self.events.push(DiagramEvent::NodeAdded {
            id: record.id.clone(),
        });
    }

    fn place_standalone(&mut self, record: &NodeRecord, relationships: &[RelationshipRecord]) {
        let reference = relationships
            .iter()
            .filter_map(|r| {
                if r.target == record.id {
                    Some(r.source.as_str())
                } else if r.source == record.id {
                    Some(r.target.as_str())
                } else {
                    None
                }
            })
            .filter_map(|id| self.graph.node(id))
            .find(|n| !n.hidden)
            .map(|n| self.bounds_of(n));

        let preferred = avoidance::preferred_point(&self.config, reference, self.standalone_slots);
        let size = self.config.size_for(record.kind);
        let obstacles = self.visible_footprints(None);
        let position = avoidance::find_free_position(&self.config, preferred, size, &obstacles);
        self.standalone_slots += 1;

        let mut node = Node::from_record(record, size);
        node.position = position;
        debug!(node = %record.id, x = position.x, y = position.y, "placed standalone");
        self.graph.upsert_nodes(vec![node]);
        self.events.push(DiagramEvent::NodeAdded {
            id: record.id.clone(),
        });
    }

    /// Remove a node and every edge touching it. Removing a Context removes
    /// its children too.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let Some(node) = self.graph.node(id) else {
            debug!(node = %id, "remove of unknown node ignored");
            return false;
        };
        if node.kind == NodeKind::Context {
            return self.remove_container_with_children(id);
        }
        let parent = node.container_id.clone();
        let removed = self.graph.remove_node(id);
        if let Some(parent) = &parent {
            self.containment.remove_child(parent, id);
        }
        self.finish_removal(removed);
        if let Some(parent) = parent {
            self.refresh_container(&parent);
        }
        true
    }

    pub(crate) fn finish_removal(&mut self, removed: Removed) {
        for edge in removed.edges {
            self.events.push(DiagramEvent::EdgeRemoved {
                id: edge.id.clone(),
            });
            if let Some(bundle) = &edge.bundle {
                self.release_bundle(bundle);
            }
        }
        let before = self.selection.clone();
        for node in removed.nodes {
            self.selection.remove(&node.id);
            self.events.push(DiagramEvent::NodeRemoved { id: node.id });
        }
        if before != self.selection {
            self.emit_selection();
        }
    }

    /// Record a manual drag. The layout algorithm is not re-run; only the
    /// enclosing container's footprint is re-derived. A contained node
    /// cannot be dragged left of or above its container's origin.
    pub fn update_node_position(&mut self, id: &str, position: Position) -> bool {
        let Some(node) = self.graph.node_mut(id) else {
            debug!(node = %id, "move of unknown node ignored");
            return false;
        };
        let position = if node.container_id.is_some() {
            Position::new(position.x.max(0.0), position.y.max(0.0))
        } else {
            position
        };
        node.position = position;
        let kind = node.kind;
        let parent = node.container_id.clone();
        self.events.push(DiagramEvent::NodeMoved {
            id: id.to_owned(),
            position,
        });

        if kind == NodeKind::Context {
            self.containment.set_home(id, position);
            self.reflow_containers();
        } else if let Some(parent) = parent {
            self.refresh_container(&parent);
        }
        true
    }

    fn emit_selection(&mut self) {
        self.events.push(DiagramEvent::SelectionChanged {
            selected: self.selection.ids().to_vec(),
        });
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn select_only(&mut self, id: &str) -> bool {
        if !self.graph.contains_node(id) {
            return false;
        }
        self.selection.select_only(id);
        self.emit_selection();
        true
    }

    pub fn toggle_selection(&mut self, id: &str) -> bool {
        if !self.graph.contains_node(id) {
            return false;
        }
        self.selection.toggle(id);
        self.emit_selection();
        true
    }

    pub fn extend_selection(&mut self, id: &str) -> bool {
        if !self.graph.contains_node(id) {
            return false;
        }
        self.selection.extend(id);
        self.emit_selection();
        true
    }

    pub fn deselect(&mut self, id: &str) {
        if self.selection.contains(id) {
            self.selection.remove(id);
            self.emit_selection();
        }
    }

    /// Background click.
    pub fn clear_selection(&mut self) {
        if !self.selection.is_empty() {
            self.selection.clear();
            self.emit_selection();
        }
    }

    pub fn selected_nodes(&self) -> Vec<SelectedNode> {
        self.selection
            .ids()
            .iter()
            .filter_map(|id| self.graph.node(id))
            .map(|n| SelectedNode {
                id: n.id.clone(),
                kind: n.kind,
                display_name: n.display_name().to_owned(),
            })
            .collect()
    }

    pub fn snapshot(&self) -> DiagramSnapshot {
        DiagramSnapshot {
            nodes: self.graph.nodes().cloned().collect(),
            edges: self.graph.edges().cloned().collect(),
            containers: self
                .containment
                .container_ids()
                .iter()
                .map(|id| ContainerSnapshot {
                    id: id.clone(),
                    collapsed: self.containment.is_collapsed(id).unwrap_or(true),
                })
                .collect(),
            selection: self.selected_nodes(),
        }
    }
}
