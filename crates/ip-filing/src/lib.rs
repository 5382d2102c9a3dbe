//! Core library for the intellectual-property filing intake service.
//!
//! The `workflows::intake` module carries the workflow and validation engine:
//! declarative per-step field rules, patent claim dependency checking,
//! attachment handling with all-or-nothing rollback, and the step/status
//! state machine. Configuration, telemetry, and the top-level error type
//! live alongside it so the API service stays a thin wrapper.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
