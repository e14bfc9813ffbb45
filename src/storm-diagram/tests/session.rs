// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use storm_diagram::datamodel::{NodeKind, NodeRecord, RelationKind, RelationshipRecord};
use storm_diagram::{
    DiagramEngine, DiagramSession, DiscoveryError, Expansion, GraphQuery, InMemoryGraph,
};

const FIXTURE: &str = r#"{
    "nodes": [
        {"id": "order", "type": "BoundedContext", "name": "Order"},
        {"id": "payment", "type": "BoundedContext", "name": "Payment"},
        {"id": "agg", "type": "Aggregate", "name": "Order"},
        {"id": "place", "type": "Command", "name": "PlaceOrder"},
        {"id": "placed", "type": "Event", "name": "OrderPlaced"},
        {"id": "charge", "type": "Policy", "name": "ChargeOnPlaced", "bcId": "payment"}
    ],
    "relationships": [
        {"source": "order", "target": "agg", "type": "HAS_AGGREGATE"},
        {"source": "agg", "target": "place", "type": "HAS_COMMAND"},
        {"source": "place", "target": "placed", "type": "EMITS"},
        {"source": "payment", "target": "charge", "type": "HAS_POLICY"},
        {"source": "placed", "target": "charge", "type": "TRIGGERS"}
    ]
}"#;

fn fixture() -> Arc<InMemoryGraph> {
    Arc::new(InMemoryGraph::from_json(FIXTURE).unwrap())
}

fn charge_batch() -> Expansion {
    Expansion {
        nodes: vec![
            NodeRecord::new("charge", NodeKind::Policy, "ChargeOnPlaced").in_container("payment"),
        ],
        ..Expansion::default()
    }
}

#[tokio::test]
async fn test_expand_places_context_tree() {
    let session = DiagramSession::new(DiagramEngine::default(), fixture());
    let placed = session.expand("order").await;

    let ids: Vec<&str> = placed.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(vec!["order", "agg", "place", "placed"], ids);
    assert!(placed[1..].iter().all(|p| p.hidden));

    session.settle().await;
    let engine = session.engine();
    let engine = engine.lock().await;
    assert!(engine.edge("agg->place").is_some());
    assert!(engine.edge("place->placed").is_some());
    assert!(engine.edge("order->agg").is_none());
}

#[tokio::test]
async fn test_discovery_draws_cross_container_edge() {
    let session = DiagramSession::new(DiagramEngine::default(), fixture());
    session.expand("order").await;
    session.settle().await;

    // the policy arrives without the relationship that links it
    let placed = session.apply(charge_batch()).await;
    assert_eq!(2, placed.len());

    assert_eq!(Some(Ok(1)), session.settle().await);
    let engine = session.engine();
    let engine = engine.lock().await;
    let edge = engine.edge("placed->charge").unwrap();
    assert_eq!(RelationKind::Triggers, edge.kind);
    assert!(edge.cross_container);
    assert_eq!(1, engine.edge("bundle:order->payment").unwrap().count);
}

#[tokio::test]
async fn test_expand_unknown_node_changes_nothing() {
    let session = DiagramSession::new(DiagramEngine::default(), fixture());
    assert!(session.expand("ghost").await.is_empty());
    assert_eq!(None, session.settle().await);
    assert_eq!(0, session.engine().lock().await.graph().node_count());
}

struct Unreachable;

#[async_trait]
impl GraphQuery for Unreachable {
    async fn expand_node(&self, node_id: &str) -> Result<Expansion, DiscoveryError> {
        Err(DiscoveryError::NotFound(node_id.to_owned()))
    }

    async fn find_relations(
        &self,
        _node_ids: &[String],
    ) -> Result<Vec<RelationshipRecord>, DiscoveryError> {
        Err(DiscoveryError::Transport("connection reset".to_owned()))
    }

    async fn find_cross_container_relations(
        &self,
        _new_ids: &[String],
        _existing_ids: &[String],
    ) -> Result<Vec<RelationshipRecord>, DiscoveryError> {
        Ok(vec![RelationshipRecord::new(
            "placed",
            "charge",
            RelationKind::Triggers,
        )])
    }
}

#[tokio::test]
async fn test_failed_discovery_applies_nothing() {
    let session = DiagramSession::new(DiagramEngine::default(), Arc::new(Unreachable));
    let placed = session
        .apply(Expansion {
            nodes: vec![
                NodeRecord::new("placed", NodeKind::Event, "OrderPlaced"),
                NodeRecord::new("charge", NodeKind::Policy, "ChargeOnPlaced"),
            ],
            ..Expansion::default()
        })
        .await;
    assert_eq!(2, placed.len());

    assert_eq!(
        Some(Err(DiscoveryError::Transport("connection reset".to_owned()))),
        session.settle().await
    );
    let engine = session.engine();
    let engine = engine.lock().await;
    assert_eq!(2, engine.graph().node_count());
    assert_eq!(0, engine.graph().edges().count());
}

/// Answers like the fixture, except that a lookup over a single node never
/// completes until released.
struct Stalled {
    inner: Arc<InMemoryGraph>,
    release: Notify,
}

#[async_trait]
impl GraphQuery for Stalled {
    async fn expand_node(&self, node_id: &str) -> Result<Expansion, DiscoveryError> {
        self.inner.expand_node(node_id).await
    }

    async fn find_relations(
        &self,
        node_ids: &[String],
    ) -> Result<Vec<RelationshipRecord>, DiscoveryError> {
        if node_ids.len() == 1 {
            self.release.notified().await;
            return Ok(vec![RelationshipRecord::new(
                "charge",
                "placed",
                RelationKind::Invokes,
            )]);
        }
        self.inner.find_relations(node_ids).await
    }

    async fn find_cross_container_relations(
        &self,
        new_ids: &[String],
        existing_ids: &[String],
    ) -> Result<Vec<RelationshipRecord>, DiscoveryError> {
        self.inner
            .find_cross_container_relations(new_ids, existing_ids)
            .await
    }
}

#[tokio::test]
async fn test_newer_batch_supersedes_pending_discovery() {
    let query = Arc::new(Stalled {
        inner: fixture(),
        release: Notify::new(),
    });
    let session = DiagramSession::new(DiagramEngine::default(), Arc::clone(&query));

    session
        .apply(Expansion {
            nodes: vec![NodeRecord::new("placed", NodeKind::Event, "OrderPlaced")],
            ..Expansion::default()
        })
        .await;
    // first discovery is now stuck waiting on the single-node lookup
    tokio::task::yield_now().await;

    session.apply(charge_batch()).await;
    assert_eq!(Some(Ok(1)), session.settle().await);

    query.release.notify_waiters();
    tokio::task::yield_now().await;

    let engine = session.engine();
    let engine = engine.lock().await;
    assert!(engine.edge("placed->charge").is_some());
    assert!(engine.edge("charge->placed").is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_batches_keep_latest_discovery() {
    for _ in 0..25 {
        let session = Arc::new(DiagramSession::new(DiagramEngine::default(), fixture()));
        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                session
                    .apply(Expansion {
                        nodes: vec![NodeRecord::new("placed", NodeKind::Event, "OrderPlaced")],
                        ..Expansion::default()
                    })
                    .await
            })
        };
        let second = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.apply(charge_batch()).await })
        };
        first.await.unwrap();
        second.await.unwrap();

        // whichever batch placed last saw the whole canvas
        assert!(matches!(session.settle().await, Some(Ok(_))));
        let engine = session.engine();
        let engine = engine.lock().await;
        assert!(engine.edge("placed->charge").is_some());
    }
}
