//! AQHI Board - air-quality and weather dashboard API
//!
//! This library exposes the core modules for testing and reuse.

pub mod barrier;
pub mod common;
pub mod config;
pub mod display;
pub mod error;
pub mod levels;
pub mod metrics;
pub mod panels;
pub mod routes;
pub mod series;
pub mod upstream;
