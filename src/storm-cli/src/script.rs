// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Scripted designer sessions: a JSON array of steps replayed in order
//! against a `DiagramSession`.

use serde::Deserialize;
use tracing::{info, warn};

use storm_diagram::datamodel::Position;
use storm_diagram::{DiagramSession, Error, ErrorCode, ErrorKind, GraphQuery, Result};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectMode {
    #[default]
    Only,
    Toggle,
    Extend,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Step {
    Expand {
        id: String,
    },
    Toggle {
        id: String,
    },
    Remove {
        id: String,
    },
    RemoveContainer {
        id: String,
    },
    Move {
        id: String,
        x: f64,
        y: f64,
    },
    Select {
        id: String,
        #[serde(default)]
        mode: SelectMode,
    },
    Deselect {
        id: String,
    },
    ClearSelection,
}

pub fn parse_script(json: &str) -> Result<Vec<Step>> {
    serde_json::from_str(json).map_err(|err| {
        Error::new(
            ErrorKind::Session,
            ErrorCode::InvalidScript,
            Some(err.to_string()),
        )
    })
}

/// Run every step. Steps that name nodes missing from the canvas are
/// skipped with a warning. Returns the number of steps that took effect.
pub async fn replay<Q: GraphQuery + 'static>(session: &DiagramSession<Q>, steps: &[Step]) -> usize {
    let mut applied = 0;
    for (i, step) in steps.iter().enumerate() {
        let engine = session.engine();
        let took_effect = match step {
            Step::Expand { id } => {
                let placed = session.expand(id).await;
                // discovery finishes before the next step so replays are
                // deterministic
                session.settle().await;
                !placed.is_empty()
            }
            Step::Toggle { id } => engine.lock().await.toggle_container(id).is_some(),
            Step::Remove { id } => engine.lock().await.remove_node(id),
            Step::RemoveContainer { id } => engine.lock().await.remove_container_with_children(id),
            Step::Move { id, x, y } => engine
                .lock()
                .await
                .update_node_position(id, Position::new(*x, *y)),
            Step::Select { id, mode } => {
                let mut engine = engine.lock().await;
                match mode {
                    SelectMode::Only => engine.select_only(id),
                    SelectMode::Toggle => engine.toggle_selection(id),
                    SelectMode::Extend => engine.extend_selection(id),
                }
            }
            Step::Deselect { id } => {
                let mut engine = engine.lock().await;
                let selected = engine.selection().contains(id);
                engine.deselect(id);
                selected
            }
            Step::ClearSelection => {
                engine.lock().await.clear_selection();
                true
            }
        };

        if took_effect {
            applied += 1;
        } else {
            warn!(index = i, ?step, "step had no effect");
        }
    }
    info!(steps = steps.len(), applied, "replayed script");
    applied
}
