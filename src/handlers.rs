//! Command handlers for CLI operations
//!
//! This module implements the handlers for the CLI commands:
//! - ask: one-shot question and reply
//! - chat: interactive terminal session
//! - doctor: validate configuration and credential availability

use anyhow::Result;
use serde_json::json;
use std::io::{self, BufRead, Write};

use crate::config::Config;
use crate::orchestrator::ChatEngine;
use crate::secrets::{api_key_from_env, API_KEY_ENV};
use crate::session::{Sender, Session};

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Build the engine and a fresh session from configuration.
fn build_engine(config: &Config) -> (ChatEngine, Session) {
    let engine = ChatEngine::from_config(&config.assistant, api_key_from_env());
    let session = Session::new(config.assistant.greeting.clone());
    (engine, session)
}

/// Ask a single question and print the reply.
pub async fn handle_ask(question: String, config: &Config, format: OutputFormat) -> Result<()> {
    let (engine, mut session) = build_engine(config);

    engine.submit(&mut session, &question).await;

    match format {
        OutputFormat::Text => {
            if let Some(reply) = session.last() {
                println!("{}", reply.text);
            }
        }
        OutputFormat::Json => {
            let reply = session.last().map(|m| m.text.clone()).unwrap_or_default();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "question": question,
                    "reply": reply,
                }))?
            );
        }
    }

    Ok(())
}

/// Run the interactive chat loop until EOF or an exit command.
pub async fn handle_chat(config: &Config, format: OutputFormat) -> Result<()> {
    let (engine, mut session) = build_engine(config);

    if let Some(greeting) = session.last() {
        print_message(greeting.sender, &greeting.text, format)?;
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        if matches!(line.trim(), "exit" | "quit") {
            break;
        }

        session.set_input(line);
        let question = session.take_input();

        let before = session.log().len();
        engine.submit(&mut session, &question).await;

        // Print only what this turn appended (user echo is already on screen).
        for message in &session.log()[before..] {
            if message.sender == Sender::Assistant {
                print_message(message.sender, &message.text, format)?;
            }
        }
    }

    Ok(())
}

/// Validate configuration and report credential availability.
pub async fn handle_doctor(config: &Config, format: OutputFormat) -> Result<()> {
    let key_configured = api_key_from_env().is_some();

    match format {
        OutputFormat::Text => {
            println!("Configuration:");
            println!("  Base URL:     {}", config.assistant.base_url);
            println!("  Assistant:    {}", config.assistant.assistant_id);
            println!(
                "  Polling:      every {}ms, up to {}s",
                config.assistant.poll_interval_ms, config.assistant.poll_timeout_secs
            );
            println!(
                "  Credential:   {}",
                if key_configured {
                    "configured"
                } else {
                    "missing"
                }
            );
            if !key_configured {
                println!();
                println!("Set the {} environment variable to enable chat.", API_KEY_ENV);
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "base_url": config.assistant.base_url,
                    "assistant_id": config.assistant.assistant_id,
                    "poll_interval_ms": config.assistant.poll_interval_ms,
                    "poll_timeout_secs": config.assistant.poll_timeout_secs,
                    "credential_configured": key_configured,
                }))?
            );
        }
    }

    Ok(())
}

fn print_message(sender: Sender, text: &str, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("[{}] {}", sender, text),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&json!({ "sender": sender.to_string(), "text": text }))?
        ),
    }
    Ok(())
}
