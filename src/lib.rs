//! Askme Engine Library
//!
//! This library provides the core functionality of the askme chat engine.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Secret handling module
pub mod secrets;

/// Assistants API transport client
pub mod assistant;

/// In-memory chat session state
pub mod session;

/// Conversation turn orchestration
pub mod orchestrator;

/// Telemetry and observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
