// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Obstacle-avoidance placement for nodes that belong to no container.
//!
//! Rather than run a force-directed layout, a preferred point is tested
//! against every visible footprint on the canvas (padded by a margin). On a
//! collision the search walks right, then down, then diagonally in growing
//! multiples of the node's own stride. If every attempt collides the node
//! goes to the right of everything.

use crate::datamodel::{Position, Rect, Size};

use super::config::LayoutConfig;

/// Preferred point for a standalone node: to the right of a reference node
/// when there is one, otherwise the `index`-th slot of the default grid.
pub fn preferred_point(config: &LayoutConfig, reference: Option<Rect>, index: usize) -> Position {
    if let Some(reference) = reference {
        return Position::new(
            reference.right() + config.obstacle_padding * 2.0,
            reference.y,
        );
    }

    let size = config.node_size;
    let columns = config.standalone_columns.max(1);
    let col = index % columns;
    let row = index / columns;
    Position::new(
        config.standalone_origin.x + (size.width + config.column_gap) * col as f64,
        config.standalone_origin.y + (size.height + config.row_gap) * row as f64,
    )
}

pub fn collides(config: &LayoutConfig, candidate: Rect, obstacles: &[Rect]) -> bool {
    obstacles
        .iter()
        .any(|o| o.padded(config.obstacle_padding).intersects(&candidate))
}

/// Find a collision-free position for a box of `size`, starting from
/// `preferred`.
pub fn find_free_position(
    config: &LayoutConfig,
    preferred: Position,
    size: Size,
    obstacles: &[Rect],
) -> Position {
    if !collides(config, Rect::at(preferred, size), obstacles) {
        return preferred;
    }

    let dx = size.width + config.obstacle_padding;
    let dy = size.height + config.obstacle_padding;

    for step in 1..=config.avoidance_attempts {
        let k = step as f64;
        let candidates = [
            Position::new(preferred.x + k * dx, preferred.y),
            Position::new(preferred.x, preferred.y + k * dy),
            Position::new(preferred.x + k * dx, preferred.y + k * dy),
        ];
        for candidate in candidates {
            if !collides(config, Rect::at(candidate, size), obstacles) {
                return candidate;
            }
        }
    }

    let rightmost = obstacles
        .iter()
        .map(|o| o.right())
        .fold(preferred.x - config.obstacle_padding, f64::max);
    Position::new(rightmost + config.obstacle_padding, preferred.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_preferred_point_is_kept() {
        let config = LayoutConfig::default();
        let obstacles = [Rect::new(0.0, 0.0, 100.0, 100.0)];
        let at = find_free_position(
            &config,
            Position::new(500.0, 500.0),
            config.node_size,
            &obstacles,
        );
        assert_eq!(Position::new(500.0, 500.0), at);
    }

    #[test]
    fn test_collision_searches_right_first() {
        let config = LayoutConfig::default();
        let obstacles = [Rect::new(100.0, 100.0, 140.0, 80.0)];
        let at = find_free_position(
            &config,
            Position::new(100.0, 100.0),
            config.node_size,
            &obstacles,
        );
        assert_eq!(Position::new(260.0, 100.0), at);
        assert!(!collides(&config, Rect::at(at, config.node_size), &obstacles));
    }

    #[test]
    fn test_blocked_right_falls_to_below() {
        let config = LayoutConfig::default();
        // a tall wall to the right of the preferred point blocks every
        // rightward candidate within reach
        let obstacles = [
            Rect::new(100.0, 100.0, 140.0, 80.0),
            Rect::new(240.0, 0.0, 10_000.0, 180.0),
        ];
        let at = find_free_position(
            &config,
            Position::new(100.0, 100.0),
            config.node_size,
            &obstacles,
        );
        assert_eq!(Position::new(100.0, 200.0), at);
    }

    #[test]
    fn test_exhausted_search_goes_right_of_everything() {
        let mut config = LayoutConfig::default();
        config.avoidance_attempts = 0;
        let obstacles = [
            Rect::new(0.0, 0.0, 300.0, 300.0),
            Rect::new(400.0, 0.0, 100.0, 50.0),
        ];
        let at = find_free_position(
            &config,
            Position::new(10.0, 10.0),
            config.node_size,
            &obstacles,
        );
        assert_eq!(Position::new(520.0, 10.0), at);
        assert!(!collides(&config, Rect::at(at, config.node_size), &obstacles));
    }

    #[test]
    fn test_preferred_point_grid_and_reference() {
        let config = LayoutConfig::default();
        assert_eq!(config.standalone_origin, preferred_point(&config, None, 0));
        assert_eq!(
            Position::new(210.0, 500.0),
            preferred_point(&config, None, 1)
        );
        assert_eq!(
            Position::new(50.0, 600.0),
            preferred_point(&config, None, 4)
        );

        let reference = Rect::new(100.0, 40.0, 140.0, 80.0);
        assert_eq!(
            Position::new(280.0, 40.0),
            preferred_point(&config, Some(reference), 7)
        );
    }
}
