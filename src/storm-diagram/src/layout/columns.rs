// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Type-column placement of elements inside a Context container.
//!
//! Each element kind owns a fixed column, left to right: Policy, Command,
//! Aggregate, Event. Rows stack downward from the container header. All
//! coordinates here are relative to the container origin.

use crate::datamodel::{NodeKind, Position, Rect, Size};

use super::config::LayoutConfig;

/// An element already placed in the container.
#[derive(Clone, Copy, Debug)]
pub struct Sibling {
    pub kind: NodeKind,
    pub bounds: Rect,
}

fn column_index(kind: NodeKind) -> usize {
    match kind {
        NodeKind::Policy => 0,
        NodeKind::Command | NodeKind::Ui => 1,
        NodeKind::Aggregate | NodeKind::Context => 2,
        NodeKind::Event | NodeKind::ReadModel => 3,
    }
}

pub fn column_x(config: &LayoutConfig, kind: NodeKind) -> f64 {
    let stride = config.node_size.width + config.column_gap;
    config.container_padding + stride * column_index(kind) as f64
}

fn row_y(config: &LayoutConfig, row: usize) -> f64 {
    config.header_height + (config.node_size.height + config.row_gap) * row as f64
}

/// First free y below the given siblings, or the header row if there are none.
fn below(config: &LayoutConfig, siblings: impl Iterator<Item = Rect>) -> f64 {
    siblings
        .map(|b| b.bottom() + config.row_gap)
        .fold(config.header_height, f64::max)
}

/// Compute where a new element of `kind` goes inside a container holding
/// `siblings`. `invoked_command` is the (relative) box of the Command a
/// Policy invokes, when that Command is already in the container.
pub fn place_in_container(
    config: &LayoutConfig,
    kind: NodeKind,
    siblings: &[Sibling],
    invoked_command: Option<Rect>,
) -> Position {
    let size = config.node_size;
    let candidate = match kind {
        NodeKind::Aggregate | NodeKind::Command | NodeKind::Event | NodeKind::Context => {
            let same_kind = siblings.iter().filter(|s| s.kind == kind).count();
            Position::new(column_x(config, kind), row_y(config, same_kind))
        }
        NodeKind::Policy => match invoked_command {
            Some(cmd) => {
                let left_of = cmd.x - size.width - config.column_gap;
                let x = if left_of >= 0.0 {
                    left_of
                } else {
                    column_x(config, kind)
                };
                Position::new(x, cmd.y)
            }
            None => {
                let y = below(
                    config,
                    siblings
                        .iter()
                        .filter(|s| matches!(s.kind, NodeKind::Command | NodeKind::Event))
                        .map(|s| s.bounds),
                );
                Position::new(column_x(config, kind), y)
            }
        },
        NodeKind::ReadModel | NodeKind::Ui => {
            let y = below(config, siblings.iter().map(|s| s.bounds));
            Position::new(column_x(config, kind), y)
        }
    };

    nudge_down(config, candidate, size, siblings)
}

/// Push a candidate down past any sibling it would overlap.
fn nudge_down(config: &LayoutConfig, mut at: Position, size: Size, siblings: &[Sibling]) -> Position {
    while let Some(hit) = siblings
        .iter()
        .find(|s| s.bounds.intersects(&Rect::at(at, size)))
    {
        at.y = hit.bounds.bottom() + config.row_gap;
    }
    at
}

/// Footprint of an expanded container holding children with the given
/// (relative) bounds. Never smaller than the configured minimum.
pub fn expanded_footprint(config: &LayoutConfig, children: impl Iterator<Item = Rect>) -> Size {
    let min = config.expanded_min_size;
    let (right, bottom) = children.fold((0.0_f64, 0.0_f64), |(r, b), c| {
        (r.max(c.right()), b.max(c.bottom()))
    });
    Size::new(
        min.width.max(right + config.container_padding),
        min.height.max(bottom + config.container_padding),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sibling(config: &LayoutConfig, kind: NodeKind, at: Position) -> Sibling {
        Sibling {
            kind,
            bounds: Rect::at(at, config.node_size),
        }
    }

    #[test]
    fn test_columns_are_ordered_left_to_right() {
        let config = LayoutConfig::default();
        let policy = column_x(&config, NodeKind::Policy);
        let command = column_x(&config, NodeKind::Command);
        let aggregate = column_x(&config, NodeKind::Aggregate);
        let event = column_x(&config, NodeKind::Event);
        assert!(policy < command && command < aggregate && aggregate < event);
        assert!((policy - config.container_padding).abs() < f64::EPSILON);
    }

    #[test]
    fn test_first_command_goes_under_header() {
        let config = LayoutConfig::default();
        let at = place_in_container(&config, NodeKind::Command, &[], None);
        assert_eq!(Position::new(180.0, 50.0), at);
    }

    #[test]
    fn test_same_kind_siblings_stack() {
        let config = LayoutConfig::default();
        let first = place_in_container(&config, NodeKind::Event, &[], None);
        let siblings = [sibling(&config, NodeKind::Event, first)];
        let second = place_in_container(&config, NodeKind::Event, &siblings, None);
        assert!((second.x - first.x).abs() < f64::EPSILON);
        assert!((second.y - (first.y + 100.0)).abs() < f64::EPSILON);

        // other kinds do not advance the row
        let cmd = place_in_container(&config, NodeKind::Command, &siblings, None);
        assert!((cmd.y - config.header_height).abs() < f64::EPSILON);
    }

    #[test]
    fn test_policy_aligns_with_invoked_command() {
        let config = LayoutConfig::default();
        let cmd_at = Position::new(column_x(&config, NodeKind::Command), 150.0);
        let siblings = [sibling(&config, NodeKind::Command, cmd_at)];
        let at = place_in_container(
            &config,
            NodeKind::Policy,
            &siblings,
            Some(Rect::at(cmd_at, config.node_size)),
        );
        assert_eq!(Position::new(20.0, 150.0), at);
    }

    #[test]
    fn test_policy_without_command_stacks_below_taller_column() {
        let config = LayoutConfig::default();
        let siblings = [
            sibling(&config, NodeKind::Command, Position::new(180.0, 50.0)),
            sibling(&config, NodeKind::Event, Position::new(500.0, 50.0)),
            sibling(&config, NodeKind::Event, Position::new(500.0, 150.0)),
        ];
        let at = place_in_container(&config, NodeKind::Policy, &siblings, None);
        assert_eq!(Position::new(20.0, 250.0), at);
    }

    #[test]
    fn test_colliding_policies_are_nudged() {
        let config = LayoutConfig::default();
        let cmd = Rect::at(Position::new(180.0, 50.0), config.node_size);
        let siblings = [
            Sibling {
                kind: NodeKind::Command,
                bounds: cmd,
            },
            sibling(&config, NodeKind::Policy, Position::new(20.0, 50.0)),
        ];
        let at = place_in_container(&config, NodeKind::Policy, &siblings, Some(cmd));
        assert_eq!(Position::new(20.0, 150.0), at);
    }

    #[test]
    fn test_footprint_respects_minimum() {
        let config = LayoutConfig::default();
        let size = expanded_footprint(&config, std::iter::empty());
        assert_eq!(config.expanded_min_size, size);

        let wide = [Rect::new(500.0, 250.0, 140.0, 80.0)];
        let size = expanded_footprint(&config, wide.into_iter());
        assert_eq!(Size::new(660.0, 350.0), size);
    }
}
