// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Expand/collapse lifecycle of Context containers and the footprint
//! bookkeeping that follows from it.
//!
//! Each container is an independent two-state machine. Collapsing hides
//! children (never moves them) and shrinks the container to a chip;
//! expanding reveals them and sizes the container to its content.

use tracing::debug;

use crate::datamodel::{NodeKind, Position, Rect, Size};
use crate::engine::DiagramEngine;
use crate::events::DiagramEvent;
use crate::layout::avoidance;
use crate::layout::columns;
use crate::layout::lanes::{self, Lane};

impl DiagramEngine {
    /// Flip a container between collapsed and expanded. Returns the new
    /// collapsed state, or None for an unknown container.
    pub fn toggle_container(&mut self, container_id: &str) -> Option<bool> {
        let Some(was_collapsed) = self.containment.is_collapsed(container_id) else {
            debug!(container = %container_id, "toggle of unknown container ignored");
            return None;
        };
        let collapsed = !was_collapsed;
        self.containment.set_collapsed(container_id, collapsed);
        self.events.push(DiagramEvent::ContainerToggled {
            id: container_id.to_owned(),
            collapsed,
        });

        let children = self.containment.children(container_id).to_vec();
        for child in &children {
            if let Some(node) = self.graph.node_mut(child) {
                if node.hidden != collapsed {
                    node.hidden = collapsed;
                    self.events.push(DiagramEvent::NodeVisibilityChanged {
                        id: child.clone(),
                        hidden: collapsed,
                    });
                }
            }
        }

        let mut touched = self.graph.edge_ids_touching(container_id);
        for child in &children {
            for edge_id in self.graph.edge_ids_touching(child) {
                if !touched.contains(&edge_id) {
                    touched.push(edge_id);
                }
            }
        }
        self.sync_edge_visibility(&touched);

        self.refresh_container(container_id);
        Some(collapsed)
    }

    /// Drive a container to the given state. Returns true if it changed.
    pub fn set_container_collapsed(&mut self, container_id: &str, collapsed: bool) -> bool {
        if self.containment.is_collapsed(container_id) == Some(!collapsed) {
            self.toggle_container(container_id);
            true
        } else {
            false
        }
    }

    /// Remove a Context and, first, everything inside it.
    pub fn remove_container_with_children(&mut self, container_id: &str) -> bool {
        if self.graph.node(container_id).map(|n| n.kind) != Some(NodeKind::Context) {
            debug!(container = %container_id, "remove of unknown container ignored");
            return false;
        }
        let removed = self.graph.remove_node(container_id);
        self.containment.unregister(container_id);
        self.finish_removal(removed);
        self.reflow_containers();
        true
    }

    /// Re-derive a container's footprint from its state and children, then
    /// re-pack the lanes.
    pub(crate) fn refresh_container(&mut self, container_id: &str) {
        let Some(collapsed) = self.containment.is_collapsed(container_id) else {
            return;
        };
        let size = if collapsed {
            self.config.collapsed_size
        } else {
            let children: Vec<Rect> = self
                .containment
                .children(container_id)
                .iter()
                .filter_map(|id| self.graph.node(id))
                .map(|n| n.local_bounds())
                .collect();
            columns::expanded_footprint(&self.config, children.into_iter())
        };

        if let Some(node) = self.graph.node_mut(container_id) {
            if node.size != size {
                node.size = size;
                self.events.push(DiagramEvent::ContainerResized {
                    id: container_id.to_owned(),
                    size,
                });
            }
        }
        self.reflow_containers();
    }

    /// Move containers so that none overlap, then push any standalone node
    /// that a container now covers out of the way.
    pub(crate) fn reflow_containers(&mut self) {
        let mut ids = Vec::new();
        let mut lanes = Vec::new();
        for id in self.containment.container_ids() {
            let (Some(state), Some(node)) = (self.containment.state(id), self.graph.node(id)) else {
                continue;
            };
            ids.push(id.clone());
            lanes.push(Lane {
                home: state.home,
                size: node.size,
            });
        }

        let resolved = lanes::reflow(&self.config, &lanes);
        for (id, at) in ids.iter().zip(resolved) {
            if let Some(node) = self.graph.node_mut(id) {
                if node.position != at {
                    node.position = at;
                    self.events.push(DiagramEvent::NodeMoved {
                        id: id.clone(),
                        position: at,
                    });
                }
            }
        }

        self.relocate_standalone();
    }

    fn relocate_standalone(&mut self) {
        let containers: Vec<Rect> = self
            .containment
            .container_ids()
            .iter()
            .filter_map(|id| self.absolute_bounds(id))
            .collect();
        let candidates: Vec<String> = self
            .graph
            .nodes()
            .filter(|n| !n.hidden && n.container_id.is_none() && n.kind != NodeKind::Context)
            .map(|n| n.id.clone())
            .collect();

        for id in candidates {
            let Some(rect) = self.absolute_bounds(&id) else {
                continue;
            };
            if !avoidance::collides(&self.config, rect, &containers) {
                continue;
            }
            let obstacles = self.visible_footprints(Some(&id));
            let at = avoidance::find_free_position(
                &self.config,
                Position::new(rect.x, rect.y),
                Size::new(rect.width, rect.height),
                &obstacles,
            );
            debug!(node = %id, x = at.x, y = at.y, "moved standalone node out of a container");
            if let Some(node) = self.graph.node_mut(&id) {
                node.position = at;
            }
            self.events.push(DiagramEvent::NodeMoved { id, position: at });
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::datamodel::{NodeKind, NodeRecord, Position, RelationKind, RelationshipRecord};
    use crate::engine::DiagramEngine;
    use crate::events::DiagramEvent;

    fn record(id: &str, kind: NodeKind) -> NodeRecord {
        NodeRecord::new(id, kind, id)
    }

    #[test]
    fn test_toggle_unknown_container_is_noop() {
        let mut engine = DiagramEngine::default();
        assert_eq!(None, engine.toggle_container("ghost"));
        engine.place(&record("cmd", NodeKind::Command), None);
        assert_eq!(None, engine.toggle_container("cmd"));
        assert!(!engine.remove_container_with_children("cmd"));
    }

    #[test]
    fn test_expand_reveals_children_and_edges() {
        let mut engine = DiagramEngine::default();
        engine.add_nodes_with_layout(
            &[record("cmd", NodeKind::Command), record("evt", NodeKind::Event)],
            &[RelationshipRecord::new("cmd", "evt", RelationKind::Emits)],
            Some(&record("order", NodeKind::Context)),
        );
        assert!(engine.edge("cmd->evt").unwrap().hidden);
        engine.take_events();

        assert_eq!(Some(false), engine.toggle_container("order"));
        assert!(!engine.node("cmd").unwrap().hidden);
        assert!(!engine.edge("cmd->evt").unwrap().hidden);

        let events = engine.take_events();
        assert_eq!(
            DiagramEvent::ContainerToggled {
                id: "order".to_owned(),
                collapsed: false
            },
            events[0]
        );
        assert!(events.contains(&DiagramEvent::EdgeVisibilityChanged {
            id: "cmd->evt".to_owned(),
            hidden: false
        }));
        assert!(
            events
                .iter()
                .any(|e| matches!(e, DiagramEvent::ContainerResized { id, .. } if id == "order"))
        );
    }

    #[test]
    fn test_expanding_pushes_neighbour_lanes_and_collapse_restores() {
        let mut engine = DiagramEngine::default();
        engine.add_nodes_with_layout(
            &[record("evt", NodeKind::Event)],
            &[],
            Some(&record("order", NodeKind::Context)),
        );
        engine.place(&record("payment", NodeKind::Context), None);
        let home = engine.node("payment").unwrap().position;

        engine.toggle_container("order");
        let order = engine.absolute_bounds("order").unwrap();
        let payment = engine.absolute_bounds("payment").unwrap();
        assert!(!order.intersects(&payment));
        assert!(payment.x >= order.right());

        engine.toggle_container("order");
        assert_eq!(home, engine.node("payment").unwrap().position);
    }

    #[test]
    fn test_standalone_node_moves_out_of_grown_container() {
        let mut engine = DiagramEngine::default();
        engine.place(&record("cmd", NodeKind::Command), Some("order"));
        // drop a standalone node where the expanded footprint will land
        engine.place(&record("ui", NodeKind::Ui), None);
        engine.update_node_position("ui", Position::new(300.0, 200.0));

        engine.toggle_container("order");
        let order = engine.absolute_bounds("order").unwrap();
        let ui = engine.absolute_bounds("ui").unwrap();
        assert!(!order.intersects(&ui));
    }

    #[test]
    fn test_set_container_collapsed() {
        let mut engine = DiagramEngine::default();
        engine.place(&record("order", NodeKind::Context), None);
        assert!(!engine.set_container_collapsed("order", true));
        assert!(engine.set_container_collapsed("order", false));
        assert_eq!(Some(false), engine.is_collapsed("order"));
    }
}
