// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use serde::Serialize;

use crate::datamodel::NodeKind;

/// Ordered set of selected node ids. Pure set operations, no knowledge of
/// the graph or layout.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Plain click.
    pub fn select_only(&mut self, id: &str) {
        self.ids.clear();
        self.ids.push(id.to_owned());
    }

    /// Ctrl-click: add if absent, drop if present.
    pub fn toggle(&mut self, id: &str) {
        if self.contains(id) {
            self.remove(id);
        } else {
            self.ids.push(id.to_owned());
        }
    }

    /// Shift-click: append, keeping the existing order.
    pub fn extend(&mut self, id: &str) {
        if !self.contains(id) {
            self.ids.push(id.to_owned());
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.ids.retain(|s| s != id);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

/// What downstream consumers (e.g. a chat-based editor) see of a selected
/// node.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedNode {
    pub id: String,
    pub kind: NodeKind,
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_only_replaces() {
        let mut sel = Selection::new();
        sel.extend("a");
        sel.extend("b");
        sel.select_only("c");
        assert_eq!(&["c".to_owned()], sel.ids());
    }

    #[test]
    fn test_toggle_and_extend_keep_order() {
        let mut sel = Selection::new();
        sel.toggle("a");
        sel.extend("b");
        sel.extend("a");
        sel.toggle("c");
        assert_eq!(
            vec!["a", "b", "c"],
            sel.ids().iter().map(|s| s.as_str()).collect::<Vec<_>>()
        );

        sel.toggle("b");
        assert!(!sel.contains("b"));
        sel.remove("a");
        assert_eq!(&["c".to_owned()], sel.ids());

        sel.clear();
        assert!(sel.is_empty());
    }
}
