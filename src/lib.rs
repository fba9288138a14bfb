//! Servicectl starts, stops, restarts and reloads system services through configured
//! commands, waits for each daemon's pid file to settle before judging the outcome, and
//! reports service state (running, stopped, crashed) across many services at once under
//! a single deadline.

/// Action verbs.
pub mod action;

/// Action adapters that run the concrete service commands.
pub mod adapter;

/// CLI interface.
pub mod cli;

/// Configuration management.
pub mod config;

/// Constants and default values.
pub mod constants;

/// Single-service action dispatch.
pub mod dispatcher;

/// Error handling.
pub mod error;

/// Pre-action hooks.
pub mod hooks;

/// Process lookup.
pub mod locator;

/// Caller-facing service manager.
pub mod manager;

/// Service descriptors.
pub mod service;

/// Status model, resolution and aggregation.
pub mod status;

/// Readiness watcher.
pub mod watcher;
