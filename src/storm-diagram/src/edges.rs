// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use tracing::debug;

use crate::datamodel::{Edge, RelationKind, bundle_id, edge_id};
use crate::engine::DiagramEngine;
use crate::events::DiagramEvent;

impl DiagramEngine {
    /// Draw a relationship between two nodes on the canvas.
    ///
    /// Returns None without touching the model when the edge already
    /// exists, an endpoint is missing, or the relationship is containment.
    /// An edge between two different containers also bumps the
    /// container-level bundle for that ordered pair.
    pub fn add_edge(&mut self, source: &str, target: &str, kind: RelationKind) -> Option<Edge> {
        let id = edge_id(source, target);
        if self.graph.contains_edge(&id) {
            debug!(edge = %id, "edge already drawn");
            return None;
        }
        let (Some(src), Some(tgt)) = (self.graph.node(source), self.graph.node(target)) else {
            debug!(edge = %id, "edge endpoint not on canvas");
            return None;
        };
        if kind.is_containment() || kind == RelationKind::ContainerLink {
            debug!(edge = %id, ?kind, "structural relationship not drawn");
            return None;
        }

        let containers = match (&src.container_id, &tgt.container_id) {
            (Some(a), Some(b)) if a != b => Some((a.clone(), b.clone())),
            _ => None,
        };
        let edge = Edge {
            id: id.clone(),
            source: source.to_owned(),
            target: target.to_owned(),
            kind,
            hidden: src.hidden || tgt.hidden,
            bundled: false,
            count: 1,
            cross_container: containers.is_some(),
            animated: kind.is_causal(),
            bundle: containers.as_ref().map(|(a, b)| bundle_id(a, b)),
        };
        self.graph.upsert_edges(vec![edge.clone()]);
        self.events.push(DiagramEvent::EdgeAdded { id });

        if let Some((a, b)) = containers {
            self.upsert_bundle(&a, &b);
        }
        Some(edge)
    }

    /// A bundle is hidden only once both of its containers are expanded and
    /// showing the real edges themselves.
    fn bundle_hidden(&self, source_container: &str, target_container: &str) -> bool {
        self.containment.is_expanded(source_container)
            && self.containment.is_expanded(target_container)
    }

    fn upsert_bundle(&mut self, source_container: &str, target_container: &str) {
        let id = bundle_id(source_container, target_container);
        if let Some(bundle) = self.graph.edge_mut(&id) {
            bundle.count += 1;
            let count = bundle.count;
            self.events.push(DiagramEvent::BundleCountChanged { id, count });
            return;
        }

        let bundle = Edge {
            id: id.clone(),
            source: source_container.to_owned(),
            target: target_container.to_owned(),
            kind: RelationKind::ContainerLink,
            hidden: self.bundle_hidden(source_container, target_container),
            bundled: true,
            count: 1,
            cross_container: true,
            animated: false,
            bundle: None,
        };
        if !self.graph.upsert_edges(vec![bundle]).is_empty() {
            self.events.push(DiagramEvent::EdgeAdded { id });
        }
    }

    /// Drop one underlying edge from a bundle, removing the bundle when
    /// nothing is left in it.
    pub(crate) fn release_bundle(&mut self, id: &str) {
        let Some(bundle) = self.graph.edge_mut(id) else {
            return;
        };
        bundle.count = bundle.count.saturating_sub(1);
        let count = bundle.count;
        if count == 0 {
            self.graph.remove_edge(id);
            self.events.push(DiagramEvent::EdgeRemoved { id: id.to_owned() });
        } else {
            self.events.push(DiagramEvent::BundleCountChanged {
                id: id.to_owned(),
                count,
            });
        }
    }

    fn edge_should_hide(&self, edge: &Edge) -> bool {
        if edge.bundled {
            return self.bundle_hidden(&edge.source, &edge.target);
        }
        let hidden = |id: &str| self.graph.node(id).map(|n| n.hidden).unwrap_or(true);
        hidden(edge.source.as_str()) || hidden(edge.target.as_str())
    }

    pub(crate) fn sync_edge_visibility(&mut self, edge_ids: &[String]) {
        for id in edge_ids {
            let Some(hidden) = self.graph.edge(id).map(|e| self.edge_should_hide(e)) else {
                continue;
            };
            if let Some(edge) = self.graph.edge_mut(id) {
                if edge.hidden != hidden {
                    edge.hidden = hidden;
                    self.events.push(DiagramEvent::EdgeVisibilityChanged {
                        id: id.clone(),
                        hidden,
                    });
                }
            }
        }
    }
}
