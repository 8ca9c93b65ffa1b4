//! CLI interface for askme
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines the chat commands and global flags.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Askme chat assistant engine
///
/// Drives the remote assistant behind the ask-me-anything profile widget:
/// one-shot questions, an interactive chat loop, and configuration
/// diagnostics.
#[derive(Parser, Debug)]
#[command(name = "askme")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ask a single question and print the reply
    Ask {
        /// The question to send
        question: String,
    },

    /// Start an interactive chat session
    Chat,

    /// Validate configuration and credential availability
    Doctor,
}
