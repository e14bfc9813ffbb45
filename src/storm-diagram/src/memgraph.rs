// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! A `GraphQuery` over a graph held entirely in memory, loaded from a JSON
//! fixture of `{ nodes, relationships }`.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::common::Result;
use crate::datamodel::{NodeKind, NodeRecord, RelationKind, RelationshipRecord};
use crate::discovery::{DiscoveryError, Expansion, GraphQuery};
use crate::import_err;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InMemoryGraph {
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub relationships: Vec<RelationshipRecord>,
}

#[derive(Deserialize)]
struct RawGraph {
    #[serde(default)]
    nodes: Vec<Map<String, Value>>,
    #[serde(default)]
    relationships: Vec<Map<String, Value>>,
}

fn type_name(record: &Map<String, Value>) -> String {
    match record.get("type") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "<missing>".to_owned(),
    }
}

impl InMemoryGraph {
    pub fn new(nodes: Vec<NodeRecord>, relationships: Vec<RelationshipRecord>) -> Self {
        Self {
            nodes,
            relationships,
        }
    }

    /// Load a fixture, rejecting unknown node or relationship types and
    /// relationships whose endpoints are not in the fixture.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawGraph = serde_json::from_str(json)?;

        let mut nodes = Vec::with_capacity(raw.nodes.len());
        for record in raw.nodes {
            let kind = type_name(&record);
            if serde_json::from_value::<NodeKind>(Value::String(kind.clone())).is_err() {
                return import_err!(UnknownNodeKind, kind);
            }
            nodes.push(serde_json::from_value::<NodeRecord>(Value::Object(record))?);
        }

        let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let mut relationships = Vec::with_capacity(raw.relationships.len());
        for record in raw.relationships {
            let kind = type_name(&record);
            if serde_json::from_value::<RelationKind>(Value::String(kind.clone())).is_err() {
                return import_err!(UnknownRelationKind, kind);
            }
            let rel = serde_json::from_value::<RelationshipRecord>(Value::Object(record))?;
            for end in [&rel.source, &rel.target] {
                if !ids.contains(end.as_str()) {
                    return import_err!(DoesNotExist, format!("relationship endpoint {end}"));
                }
            }
            relationships.push(rel);
        }

        Ok(Self::new(nodes, relationships))
    }

    pub fn node(&self, id: &str) -> Option<&NodeRecord> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn targets<'a>(&'a self, source: &'a str, kind: RelationKind) -> impl Iterator<Item = &'a str> {
        self.relationships
            .iter()
            .filter(move |r| r.source == source && r.kind == kind)
            .map(|r| r.target.as_str())
    }

    fn sources<'a>(&'a self, target: &'a str, kind: RelationKind) -> impl Iterator<Item = &'a str> {
        self.relationships
            .iter()
            .filter(move |r| r.target == target && r.kind == kind)
            .map(|r| r.source.as_str())
    }

    /// The Context a node belongs to, following `bcId` or the ownership
    /// chain (containment, HAS_COMMAND, EMITS) upwards.
    pub fn context_of(&self, id: &str) -> Option<&NodeRecord> {
        let mut current = id;
        for _ in 0..=self.nodes.len() {
            let node = self.node(current)?;
            if node.kind == NodeKind::Context {
                return Some(node);
            }
            if let Some(bc) = node.container_id.as_deref() {
                return self.node(bc).filter(|n| n.kind == NodeKind::Context);
            }
            let parent = self.relationships.iter().find(|r| {
                r.target == current && (r.kind.is_containment() || r.kind.implies_same_container())
            })?;
            current = parent.source.as_str();
        }
        None
    }

    fn context_id(&self, id: &str) -> Option<&str> {
        self.context_of(id).map(|c| c.id.as_str())
    }

    /// Synchronous body of `expand_node`.
    pub fn expansion(&self, node_id: &str) -> Option<Expansion> {
        let node = self.node(node_id)?;
        let mut out = ExpansionBuilder::new(self);
        out.add(node_id);

        match node.kind {
            NodeKind::Context => {
                for agg in self.targets(node_id, RelationKind::HasAggregate) {
                    out.add(agg);
                    out.link(node_id, agg, RelationKind::HasAggregate);
                    for cmd in self.targets(agg, RelationKind::HasCommand) {
                        out.add(cmd);
                        out.link(agg, cmd, RelationKind::HasCommand);
                        for evt in self.targets(cmd, RelationKind::Emits) {
                            out.add(evt);
                            out.link(cmd, evt, RelationKind::Emits);
                        }
                    }
                }
                for pol in self.targets(node_id, RelationKind::HasPolicy) {
                    out.add(pol);
                    out.link(node_id, pol, RelationKind::HasPolicy);
                    for evt in self.sources(pol, RelationKind::Triggers) {
                        out.link(evt, pol, RelationKind::Triggers);
                    }
                    for cmd in self.targets(pol, RelationKind::Invokes) {
                        out.link(pol, cmd, RelationKind::Invokes);
                    }
                }
                for kind in [RelationKind::HasReadModel, RelationKind::HasUi] {
                    for leaf in self.targets(node_id, kind) {
                        out.add(leaf);
                        out.link(node_id, leaf, kind);
                    }
                }
            }
            NodeKind::Aggregate => {
                for cmd in self.targets(node_id, RelationKind::HasCommand) {
                    out.add(cmd);
                    out.link(node_id, cmd, RelationKind::HasCommand);
                    for evt in self.targets(cmd, RelationKind::Emits) {
                        out.add(evt);
                        out.link(cmd, evt, RelationKind::Emits);
                    }
                }
            }
            NodeKind::Command => {
                for evt in self.targets(node_id, RelationKind::Emits) {
                    out.add(evt);
                    out.link(node_id, evt, RelationKind::Emits);
                }
            }
            NodeKind::Event => {
                for pol in self.targets(node_id, RelationKind::Triggers) {
                    out.add(pol);
                    out.link(node_id, pol, RelationKind::Triggers);
                    for cmd in self.targets(pol, RelationKind::Invokes) {
                        out.add(cmd);
                        out.link(pol, cmd, RelationKind::Invokes);
                    }
                }
            }
            NodeKind::Policy => {
                for cmd in self.targets(node_id, RelationKind::Invokes) {
                    out.add(cmd);
                    out.link(node_id, cmd, RelationKind::Invokes);
                }
            }
            NodeKind::ReadModel | NodeKind::Ui => {}
        }

        Some(out.finish(self.context_of(node_id).cloned()))
    }
}

struct ExpansionBuilder<'a> {
    graph: &'a InMemoryGraph,
    seen: HashSet<String>,
    nodes: Vec<NodeRecord>,
    relationships: Vec<RelationshipRecord>,
}

impl<'a> ExpansionBuilder<'a> {
    fn new(graph: &'a InMemoryGraph) -> Self {
        Self {
            graph,
            seen: HashSet::new(),
            nodes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    fn add(&mut self, id: &str) {
        if self.seen.contains(id) {
            return;
        }
        let Some(record) = self.graph.node(id) else {
            return;
        };
        let mut record = record.clone();
        if record.kind != NodeKind::Context && record.container_id.is_none() {
            record.container_id = self.graph.context_id(id).map(str::to_owned);
        }
        if record.kind == NodeKind::Policy {
            if record.trigger_event_id.is_none() {
                record.trigger_event_id = self
                    .graph
                    .sources(id, RelationKind::Triggers)
                    .next()
                    .map(str::to_owned);
            }
            if record.invoke_command_id.is_none() {
                record.invoke_command_id = self
                    .graph
                    .targets(id, RelationKind::Invokes)
                    .next()
                    .map(str::to_owned);
            }
        }
        self.seen.insert(record.id.clone());
        self.nodes.push(record);
    }

    fn link(&mut self, source: &str, target: &str, kind: RelationKind) {
        let rel = RelationshipRecord::new(source, target, kind);
        if !self.relationships.contains(&rel) {
            self.relationships.push(rel);
        }
    }

    /// Include every foreign Context the leaves point into, so that they
    /// materialize under their real names.
    fn finish(mut self, container_context: Option<NodeRecord>) -> Expansion {
        let home = container_context.as_ref().map(|c| c.id.clone());
        let foreign: Vec<String> = self
            .nodes
            .iter()
            .filter_map(|n| n.container_id.clone())
            .filter(|bc| Some(bc) != home.as_ref())
            .collect();
        for bc in foreign {
            self.add(&bc);
        }
        Expansion {
            nodes: self.nodes,
            relationships: self.relationships,
            container_context,
        }
    }
}

#[async_trait]
impl GraphQuery for InMemoryGraph {
    async fn expand_node(&self, node_id: &str) -> std::result::Result<Expansion, DiscoveryError> {
        self.expansion(node_id)
            .ok_or_else(|| DiscoveryError::NotFound(node_id.to_owned()))
    }

    async fn find_relations(
        &self,
        node_ids: &[String],
    ) -> std::result::Result<Vec<RelationshipRecord>, DiscoveryError> {
        let ids: HashSet<&str> = node_ids.iter().map(String::as_str).collect();
        Ok(self
            .relationships
            .iter()
            .filter(|r| ids.contains(r.source.as_str()) && ids.contains(r.target.as_str()))
            .cloned()
            .collect())
    }

    async fn find_cross_container_relations(
        &self,
        new_ids: &[String],
        existing_ids: &[String],
    ) -> std::result::Result<Vec<RelationshipRecord>, DiscoveryError> {
        let new: HashSet<&str> = new_ids.iter().map(String::as_str).collect();
        let existing: HashSet<&str> = existing_ids.iter().map(String::as_str).collect();
        let spans = |a: &str, b: &str| new.contains(a) && existing.contains(b);
        Ok(self
            .relationships
            .iter()
            .filter(|r| matches!(r.kind, RelationKind::Triggers | RelationKind::Invokes))
            .filter(|r| {
                spans(r.source.as_str(), r.target.as_str())
                    || spans(r.target.as_str(), r.source.as_str())
            })
            .filter(|r| self.context_id(&r.source) != self.context_id(&r.target))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorCode;

    const FIXTURE: &str = r#"{
        "nodes": [
            {"id": "order", "type": "BoundedContext", "name": "Order"},
            {"id": "payment", "type": "BoundedContext", "name": "Payment"},
            {"id": "agg", "type": "Aggregate", "name": "Order"},
            {"id": "place", "type": "Command", "name": "PlaceOrder"},
            {"id": "placed", "type": "Event", "name": "OrderPlaced"},
            {"id": "charge", "type": "Policy", "name": "ChargeOnPlaced"},
            {"id": "pay", "type": "Command", "name": "ChargeCard", "owner": "billing"}
        ],
        "relationships": [
            {"source": "order", "target": "agg", "type": "HAS_AGGREGATE"},
            {"source": "agg", "target": "place", "type": "HAS_COMMAND"},
            {"source": "place", "target": "placed", "type": "EMITS"},
            {"source": "payment", "target": "charge", "type": "HAS_POLICY"},
            {"source": "placed", "target": "charge", "type": "TRIGGERS"},
            {"source": "charge", "target": "pay", "type": "INVOKES"}
        ]
    }"#;

    fn graph() -> InMemoryGraph {
        InMemoryGraph::from_json(FIXTURE).unwrap()
    }

    fn ids(expansion: &Expansion) -> Vec<&str> {
        expansion.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_load_keeps_extra_attributes() {
        let graph = graph();
        assert_eq!(7, graph.nodes.len());
        let pay = graph.node("pay").unwrap();
        assert_eq!(Some(&Value::String("billing".to_owned())), pay.attributes.get("owner"));
    }

    #[test]
    fn test_load_rejects_bad_fixtures() {
        let err = InMemoryGraph::from_json(r#"{"nodes": [{"id": "s", "type": "Saga"}]}"#)
            .unwrap_err();
        assert_eq!(ErrorCode::UnknownNodeKind, err.code);

        let err = InMemoryGraph::from_json(
            r#"{"nodes": [{"id": "a", "type": "Event"}],
                "relationships": [{"source": "a", "target": "b", "type": "TRIGGERS"}]}"#,
        )
        .unwrap_err();
        assert_eq!(ErrorCode::DoesNotExist, err.code);

        let err = InMemoryGraph::from_json(
            r#"{"nodes": [{"id": "a", "type": "Event"}],
                "relationships": [{"source": "a", "target": "a", "type": "FOLLOWS"}]}"#,
        )
        .unwrap_err();
        assert_eq!(ErrorCode::UnknownRelationKind, err.code);
    }

    #[test]
    fn test_context_of_follows_ownership_chain() {
        let graph = graph();
        assert_eq!(Some("order"), graph.context_id("placed"));
        assert_eq!(Some("payment"), graph.context_id("charge"));
        assert_eq!(None, graph.context_id("pay"));
    }

    #[test]
    fn test_expand_context() {
        let expansion = graph().expansion("order").unwrap();
        assert_eq!(vec!["order", "agg", "place", "placed"], ids(&expansion));
        assert_eq!(Some("order"), expansion.container_context.as_ref().map(|c| c.id.as_str()));
        assert!(expansion.nodes[1..].iter().all(|n| n.container_id.as_deref() == Some("order")));
        assert_eq!(3, expansion.relationships.len());
    }

    #[test]
    fn test_expand_event_crosses_into_foreign_context() {
        let expansion = graph().expansion("placed").unwrap();
        assert_eq!(vec!["placed", "charge", "pay", "payment"], ids(&expansion));
        let charge = &expansion.nodes[1];
        assert_eq!(Some("payment"), charge.container_id.as_deref());
        assert_eq!(Some("pay"), charge.invoke_command_id.as_deref());
        assert_eq!(Some("placed"), charge.trigger_event_id.as_deref());
    }

    #[tokio::test]
    async fn test_expand_unknown_node() {
        let err = graph().expand_node("ghost").await.unwrap_err();
        assert_eq!(DiscoveryError::NotFound("ghost".to_owned()), err);
    }

    #[tokio::test]
    async fn test_cross_container_relations() {
        let graph = graph();
        let found = graph
            .find_cross_container_relations(&["charge".to_owned()], &["placed".to_owned()])
            .await
            .unwrap();
        assert_eq!(
            vec![RelationshipRecord::new("placed", "charge", RelationKind::Triggers)],
            found
        );

        // both ends in the same set is not a crossing
        let found = graph
            .find_cross_container_relations(&["charge".to_owned(), "placed".to_owned()], &[])
            .await
            .unwrap();
        assert!(found.is_empty());
    }
}
