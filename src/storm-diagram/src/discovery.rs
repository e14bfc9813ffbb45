// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The asynchronous boundary between the synchronous engine and the graph
//! store that knows which nodes and relationships exist.
//!
//! Placement always happens first and locally. Only afterwards does a
//! background task ask the store for relationships that connect the new
//! nodes to what is already drawn. At most one such task is live per
//! session: a newer batch cancels the older one rather than queueing
//! behind it, and a failed query leaves the diagram untouched.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::datamodel::{NodeRecord, RelationshipRecord};
use crate::engine::{DiagramEngine, PlacedNode};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DiscoveryError {
    #[error("node {0} not found")]
    NotFound(String),
    #[error("graph query failed: {0}")]
    Transport(String),
    #[error("discovery superseded by a newer batch")]
    Cancelled,
}

/// A node together with its immediate structural neighbourhood.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expansion {
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub relationships: Vec<RelationshipRecord>,
    #[serde(default)]
    pub container_context: Option<NodeRecord>,
}

/// Request-style queries against the domain graph.
#[async_trait]
pub trait GraphQuery: Send + Sync {
    async fn expand_node(&self, node_id: &str) -> Result<Expansion, DiscoveryError>;

    /// Every relationship between any two of the given nodes.
    async fn find_relations(
        &self,
        node_ids: &[String],
    ) -> Result<Vec<RelationshipRecord>, DiscoveryError>;

    /// Causal relationships between a new node and an existing one that sit
    /// in different containers.
    async fn find_cross_container_relations(
        &self,
        new_ids: &[String],
        existing_ids: &[String],
    ) -> Result<Vec<RelationshipRecord>, DiscoveryError>;
}

struct PendingDiscovery {
    key: BTreeSet<String>,
    token: CancellationToken,
    handle: JoinHandle<Result<usize, DiscoveryError>>,
}

/// A `DiagramEngine` shared with the discovery tasks that patch it.
pub struct DiagramSession<Q: GraphQuery + 'static> {
    engine: Arc<Mutex<DiagramEngine>>,
    query: Arc<Q>,
    pending: Mutex<Option<PendingDiscovery>>,
}

impl<Q: GraphQuery + 'static> DiagramSession<Q> {
    pub fn new(engine: DiagramEngine, query: Arc<Q>) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            query,
            pending: Mutex::new(None),
        }
    }

    /// Handle to the engine for synchronous operations (toggle, drag,
    /// selection). Hold the lock only as long as needed.
    pub fn engine(&self) -> Arc<Mutex<DiagramEngine>> {
        Arc::clone(&self.engine)
    }

    /// Fetch a node's neighbourhood and place it. A failed fetch is logged
    /// and places nothing.
    pub async fn expand(&self, node_id: &str) -> Vec<PlacedNode> {
        match self.query.expand_node(node_id).await {
            Ok(expansion) => self.apply(expansion).await,
            Err(err) => {
                warn!(node = %node_id, %err, "expand failed, diagram left unchanged");
                Vec::new()
            }
        }
    }

    /// Place a batch and schedule relationship discovery for the nodes it
    /// added.
    pub async fn apply(&self, expansion: Expansion) -> Vec<PlacedNode> {
        let mut engine = self.engine.lock().await;
        let placed = engine.add_nodes_with_layout(
            &expansion.nodes,
            &expansion.relationships,
            expansion.container_context.as_ref(),
        );
        info!(
            requested = expansion.nodes.len(),
            placed = placed.len(),
            "placed batch"
        );

        let new_ids: Vec<String> = placed.iter().map(|p| p.id.clone()).collect();
        if !new_ids.is_empty() {
            // batches must schedule in the order they were placed
            let mut pending = self.pending.lock().await;
            let all_ids = engine.node_ids();
            drop(engine);
            self.schedule_discovery(&mut pending, new_ids, all_ids);
        }
        placed
    }

    fn schedule_discovery(
        &self,
        pending: &mut Option<PendingDiscovery>,
        new_ids: Vec<String>,
        all_ids: Vec<String>,
    ) {
        let key: BTreeSet<String> = new_ids.iter().cloned().collect();
        if let Some(prev) = pending.as_ref() {
            if prev.key == key && !prev.handle.is_finished() {
                debug!("identical discovery already in flight");
                return;
            }
        }
        if let Some(prev) = pending.take() {
            prev.token.cancel();
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(run_discovery(
            Arc::clone(&self.engine),
            Arc::clone(&self.query),
            token.clone(),
            new_ids,
            all_ids,
        ));
        *pending = Some(PendingDiscovery { key, token, handle });
    }

    /// Wait for the most recent discovery task and report its outcome: the
    /// number of edges it drew, or why it drew none. Returns None when
    /// nothing was scheduled since the last call.
    pub async fn settle(&self) -> Option<Result<usize, DiscoveryError>> {
        let pending = self.pending.lock().await.take()?;
        match pending.handle.await {
            Ok(outcome) => Some(outcome),
            Err(err) if err.is_cancelled() => Some(Err(DiscoveryError::Cancelled)),
            Err(err) => Some(Err(DiscoveryError::Transport(err.to_string()))),
        }
    }

    /// Cancel any in-flight discovery without waiting for it.
    pub async fn cancel(&self) {
        if let Some(pending) = self.pending.lock().await.take() {
            pending.token.cancel();
        }
    }
}

async fn run_discovery<Q: GraphQuery + ?Sized>(
    engine: Arc<Mutex<DiagramEngine>>,
    query: Arc<Q>,
    token: CancellationToken,
    new_ids: Vec<String>,
    all_ids: Vec<String>,
) -> Result<usize, DiscoveryError> {
    let outcome = tokio::select! {
        _ = token.cancelled() => Err(DiscoveryError::Cancelled),
        found = discover(query.as_ref(), &new_ids, &all_ids) => found,
    };

    match outcome {
        Ok(relationships) => {
            let mut engine = engine.lock().await;
            if token.is_cancelled() {
                debug!("discovery superseded before it could apply");
                return Err(DiscoveryError::Cancelled);
            }
            let added = engine.upsert_edges(&relationships).len();
            info!(
                found = relationships.len(),
                added, "applied discovered relationships"
            );
            Ok(added)
        }
        Err(DiscoveryError::Cancelled) => {
            debug!("discovery superseded by a newer batch");
            Err(DiscoveryError::Cancelled)
        }
        Err(err) => {
            warn!(%err, "relationship discovery failed, diagram left unchanged");
            Err(err)
        }
    }
}

async fn discover<Q: GraphQuery + ?Sized>(
    query: &Q,
    new_ids: &[String],
    all_ids: &[String],
) -> Result<Vec<RelationshipRecord>, DiscoveryError> {
    let existing: Vec<String> = all_ids
        .iter()
        .filter(|id| !new_ids.contains(id))
        .cloned()
        .collect();

    let (mut relationships, cross) = tokio::try_join!(
        query.find_relations(all_ids),
        query.find_cross_container_relations(new_ids, &existing),
    )?;
    for rel in cross {
        if !relationships.contains(&rel) {
            relationships.push(rel);
        }
    }
    Ok(relationships)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamodel::{NodeKind, RelationKind};

    struct Fixed(Vec<RelationshipRecord>);

    #[async_trait]
    impl GraphQuery for Fixed {
        async fn expand_node(&self, node_id: &str) -> Result<Expansion, DiscoveryError> {
            Err(DiscoveryError::NotFound(node_id.to_owned()))
        }

        async fn find_relations(
            &self,
            _node_ids: &[String],
        ) -> Result<Vec<RelationshipRecord>, DiscoveryError> {
            Ok(self.0.clone())
        }

        async fn find_cross_container_relations(
            &self,
            _new_ids: &[String],
            _existing_ids: &[String],
        ) -> Result<Vec<RelationshipRecord>, DiscoveryError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_discovery_merges_without_duplicates() {
        let rel = RelationshipRecord::new("evt", "pol", RelationKind::Triggers);
        let query = Fixed(vec![rel.clone()]);
        let found = discover(&query, &["pol".to_owned()], &["evt".to_owned(), "pol".to_owned()])
            .await
            .unwrap();
        assert_eq!(vec![rel], found);
    }

    #[tokio::test]
    async fn test_expand_failure_places_nothing() {
        let session = DiagramSession::new(DiagramEngine::default(), Arc::new(Fixed(vec![])));
        assert!(session.expand("ghost").await.is_empty());
        assert!(session.settle().await.is_none());
        assert_eq!(0, session.engine().lock().await.graph().node_count());
    }

    #[tokio::test]
    async fn test_apply_then_settle_draws_edges() {
        let query = Fixed(vec![RelationshipRecord::new(
            "evt",
            "pol",
            RelationKind::Triggers,
        )]);
        let session = DiagramSession::new(DiagramEngine::default(), Arc::new(query));
        session
            .apply(Expansion {
                nodes: vec![
                    NodeRecord::new("evt", NodeKind::Event, "Placed"),
                    NodeRecord::new("pol", NodeKind::Policy, "Notify"),
                ],
                ..Expansion::default()
            })
            .await;
        assert_eq!(Some(Ok(1)), session.settle().await);
        assert!(session.engine().lock().await.edge("evt->pol").is_some());
    }
}
