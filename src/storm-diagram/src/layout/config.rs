// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use serde::{Deserialize, Serialize};

use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::datamodel::{NodeKind, Position, Size};

/// Layout configuration for the diagram engine.
///
/// All spacing and dimension values are in canvas pixels. Every field has a
/// default, so a JSON override only needs the fields it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    // Container lanes
    /// Origin of the first container.
    pub container_origin: Position,
    /// Horizontal distance between consecutive container lanes.
    pub container_lane_width: f64,
    /// Minimum horizontal gap kept between containers when lanes reflow.
    pub container_gap: f64,

    // Container footprints
    /// Footprint of a collapsed container ("chip").
    pub collapsed_size: Size,
    /// Smallest footprint an expanded container may have.
    pub expanded_min_size: Size,
    /// Space between a container's border and its children's bounding box.
    pub container_padding: f64,
    /// Vertical offset of the first row of children.
    pub header_height: f64,

    // Leaf nodes
    pub node_size: Size,
    pub row_gap: f64,
    pub column_gap: f64,

    // Obstacle avoidance for standalone nodes
    /// Margin added around every obstacle before testing for collisions.
    pub obstacle_padding: f64,
    /// Number of search steps before falling back to the rightmost slot.
    pub avoidance_attempts: usize,
    /// Origin of the default grid used when there is no reference node.
    pub standalone_origin: Position,
    pub standalone_columns: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            container_origin: Position::new(50.0, 50.0),
            container_lane_width: 450.0,
            container_gap: 50.0,
            collapsed_size: Size::new(200.0, 60.0),
            expanded_min_size: Size::new(400.0, 300.0),
            container_padding: 20.0,
            header_height: 50.0,
            node_size: Size::new(140.0, 80.0),
            row_gap: 20.0,
            column_gap: 20.0,
            obstacle_padding: 20.0,
            avoidance_attempts: 20,
            standalone_origin: Position::new(50.0, 500.0),
            standalone_columns: 4,
        }
    }
}

impl LayoutConfig {
    /// Parse a (possibly partial) JSON override of the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LayoutConfig = serde_json::from_str(json).map_err(|err| {
            Error::new(
                ErrorKind::Config,
                ErrorCode::InvalidConfig,
                Some(err.to_string()),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let sizes = [self.collapsed_size, self.expanded_min_size, self.node_size];
        if sizes.iter().any(|s| s.width <= 0.0 || s.height <= 0.0) {
            return Err(Error::new(
                ErrorKind::Config,
                ErrorCode::InvalidConfig,
                Some("sizes must be positive".to_owned()),
            ));
        }
        if self.standalone_columns == 0 {
            return Err(Error::new(
                ErrorKind::Config,
                ErrorCode::InvalidConfig,
                Some("standaloneColumns must be at least 1".to_owned()),
            ));
        }
        Ok(())
    }

    /// Footprint of a leaf node. Contexts are sized by their collapse state
    /// instead.
    pub fn size_for(&self, kind: NodeKind) -> Size {
        match kind {
            NodeKind::Context => self.collapsed_size,
            NodeKind::Aggregate
            | NodeKind::Command
            | NodeKind::Event
            | NodeKind::Policy
            | NodeKind::ReadModel
            | NodeKind::Ui => self.node_size,
        }
    }

    /// Home x of the n-th container lane.
    pub fn lane_x(&self, lane: usize) -> f64 {
        self.container_origin.x + self.container_lane_width * lane as f64
    }
}
