// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Placement engine: pure functions that decide where things go, given
//! what is already on the canvas. The `DiagramEngine` owns the state and
//! calls into these.

pub mod avoidance;
pub mod columns;
pub mod config;
pub mod lanes;

pub use self::config::LayoutConfig;
