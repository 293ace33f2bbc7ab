//! Satisfactory Factory Planner
//!
//! Production rate and power calculator for Satisfactory factories: the
//! overclock/purity/count rate formula, resource-well aggregation, slider
//! sticky-snap, preview reconciliation, blueprints and game-data storage.

pub mod blueprint;
pub mod calculator;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod extract;
pub mod models;
pub mod payload;
pub mod preview;
pub mod snap;
pub mod well;
