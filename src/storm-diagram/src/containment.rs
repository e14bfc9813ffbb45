// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::HashMap;

use crate::datamodel::Position;

#[derive(Clone, Debug, PartialEq)]
pub struct ContainerState {
    pub collapsed: bool,
    /// Where the container sits when nothing to its left pushes it over.
    pub home: Position,
}

/// Which Contexts exist on the canvas and which nodes each one holds.
///
/// Derived from the graph model but maintained incrementally: the engine
/// registers containers and children as it places them.
#[derive(Clone, Debug, Default)]
pub struct ContainmentIndex {
    order: Vec<String>,
    states: HashMap<String, ContainerState>,
    children: HashMap<String, Vec<String>>,
}

impl ContainmentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, container_id: &str) -> bool {
        self.states.contains_key(container_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Container ids in creation order.
    pub fn container_ids(&self) -> &[String] {
        &self.order
    }

    pub fn state(&self, container_id: &str) -> Option<&ContainerState> {
        self.states.get(container_id)
    }

    pub fn is_collapsed(&self, container_id: &str) -> Option<bool> {
        self.states.get(container_id).map(|s| s.collapsed)
    }

    /// True only for a container that exists and is expanded.
    pub fn is_expanded(&self, container_id: &str) -> bool {
        self.is_collapsed(container_id) == Some(false)
    }

    pub fn set_collapsed(&mut self, container_id: &str, collapsed: bool) {
        if let Some(state) = self.states.get_mut(container_id) {
            state.collapsed = collapsed;
        }
    }

    pub fn set_home(&mut self, container_id: &str, home: Position) {
        if let Some(state) = self.states.get_mut(container_id) {
            state.home = home;
        }
    }

    /// Register a new container in the collapsed state. Returns false if it
    /// was already known.
    pub fn register(&mut self, container_id: &str, home: Position) -> bool {
        if self.contains(container_id) {
            return false;
        }
        self.order.push(container_id.to_owned());
        self.states.insert(
            container_id.to_owned(),
            ContainerState {
                collapsed: true,
                home,
            },
        );
        self.children.insert(container_id.to_owned(), Vec::new());
        true
    }

    pub fn add_child(&mut self, container_id: &str, child_id: &str) {
        if let Some(children) = self.children.get_mut(container_id) {
            if !children.iter().any(|c| c == child_id) {
                children.push(child_id.to_owned());
            }
        }
    }

    pub fn remove_child(&mut self, container_id: &str, child_id: &str) {
        if let Some(children) = self.children.get_mut(container_id) {
            children.retain(|c| c != child_id);
        }
    }

    pub fn children(&self, container_id: &str) -> &[String] {
        self.children
            .get(container_id)
            .map(|c| c.as_slice())
            .unwrap_or(&[])
    }

    /// Forget a container, returning the children it held.
    pub fn unregister(&mut self, container_id: &str) -> Option<Vec<String>> {
        self.states.remove(container_id)?;
        self.order.retain(|c| c != container_id);
        Some(self.children.remove(container_id).unwrap_or_default())
    }
}
