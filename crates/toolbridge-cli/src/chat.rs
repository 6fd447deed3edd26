//! Terminal front ends: interactive chat, one-shot ask, tool listing

use std::io::Write;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use toolbridge_core::{ChatSession, TurnOutcome};

use crate::commands::{AskArgs, ToolsArgs};

/// Print the banner, then read lines until EOF, `quit` or `exit`.
///
/// A failed turn prints the error and the session carries on.
pub async fn chat_loop<R, W>(session: &mut ChatSession, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let tool_count = match session.list_tools(false).await {
        Ok(tools) => tools.len(),
        Err(e) => {
            writeln!(out, "Warning: could not list tools: {}", e)?;
            0
        }
    };
    writeln!(
        out,
        "Connected to {} ({}) with {} tool(s). Type 'quit' or 'exit' to leave.",
        session.provider_name(),
        session.model(),
        tool_count
    )?;

    let mut lines = input.lines();
    loop {
        write!(out, "\nYou: ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        match session.send(line).await {
            Ok(outcome) => print_outcome(out, &outcome)?,
            Err(e) => writeln!(out, "Error: {}", e)?,
        }
    }

    writeln!(out, "Goodbye!")?;
    Ok(())
}

fn print_outcome<W: Write>(out: &mut W, outcome: &TurnOutcome) -> Result<()> {
    writeln!(out, "Assistant: {}", outcome.answer)?;
    if outcome.rounds_exhausted {
        let names: Vec<&str> = outcome
            .pending_calls
            .iter()
            .map(|call| call.name.as_str())
            .collect();
        writeln!(
            out,
            "(stopped after {} tool round(s); not run: {})",
            outcome.rounds,
            names.join(", ")
        )?;
    }
    Ok(())
}

/// Interactive session on stdin/stdout
pub async fn run_chat(mut session: ChatSession) -> Result<()> {
    if let Err(e) = session.initialize().await {
        tracing::warn!(error = %e, "initialize handshake failed");
    }
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    chat_loop(&mut session, stdin, &mut stdout).await
}

/// One turn, answer on stdout
pub async fn run_ask<W: Write>(mut session: ChatSession, args: &AskArgs, out: &mut W) -> Result<()> {
    let outcome = session
        .send(&args.prompt_text())
        .await
        .context("request failed")?;
    writeln!(out, "{}", outcome.answer)?;

    if args.history {
        let history = serde_json::to_string_pretty(session.history())?;
        writeln!(out, "{}", history)?;
    }
    Ok(())
}

/// Print the discovered tools
pub async fn run_tools<W: Write>(session: ChatSession, args: &ToolsArgs, out: &mut W) -> Result<()> {
    let tools = session
        .list_tools(args.refresh)
        .await
        .context("could not list tools")?;

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&tools)?)?;
        return Ok(());
    }

    if tools.is_empty() {
        writeln!(out, "No tools available.")?;
    }
    for tool in &tools {
        match tool.description.as_deref().filter(|d| !d.is_empty()) {
            Some(description) => writeln!(out, "{} - {}", tool.name, description)?,
            None => writeln!(out, "{}", tool.name)?,
        }
    }
    Ok(())
}
