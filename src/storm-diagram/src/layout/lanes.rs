// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::datamodel::{Position, Rect, Size};

use super::config::LayoutConfig;

/// A container as seen by lane reflow.
#[derive(Clone, Copy, Debug)]
pub struct Lane {
    pub home: Position,
    pub size: Size,
}

/// Pack containers so that no two vertically-overlapping footprints
/// intersect. Containers are visited by home x (ties by input order); each
/// keeps its home unless something already placed to its left overlaps
/// it, in which case it moves just right of that container.
///
/// Returns the resolved origin of every lane, in input order.
pub fn reflow(config: &LayoutConfig, lanes: &[Lane]) -> Vec<Position> {
    let mut order: Vec<usize> = (0..lanes.len()).collect();
    order.sort_by(|&a, &b| lanes[a].home.x.total_cmp(&lanes[b].home.x).then(a.cmp(&b)));

    let mut resolved = vec![Position::default(); lanes.len()];
    let mut placed: Vec<Rect> = Vec::with_capacity(lanes.len());
    for i in order {
        let lane = lanes[i];
        let probe = Rect::at(lane.home, lane.size);
        let x = placed
            .iter()
            .filter(|p| p.overlaps_vertically(&probe))
            .map(|p| p.right() + config.container_gap)
            .fold(lane.home.x, f64::max);
        let at = Position::new(x, lane.home.y);
        placed.push(Rect::at(at, lane.size));
        resolved[i] = at;
    }
    resolved
}
