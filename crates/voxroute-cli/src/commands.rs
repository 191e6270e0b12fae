//! Handlers for the non-interactive subcommands.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use voxroute_events::{AuditFilter, AuditLogger, DEFAULT_AUDIT_BUFFER};
use voxroute_models::{AuditEvent, AuditEventType};
use voxroute_persistence::JsonlAuditStore;
use voxroute_routing::{AgentRegistry, StaticAgentRegistry};

use crate::cli::{Cli, Commands};
use crate::error::{CliError, Result};

/// Runs a non-interactive subcommand.
pub fn execute(cli: &Cli, command: &Commands) -> Result<()> {
    match command {
        Commands::Console => Ok(()),
        Commands::Replay {
            event_type,
            command,
            since,
            terminal,
            json,
        } => {
            let filter = build_filter(
                event_type.as_deref(),
                command.as_deref(),
                since.as_deref(),
                *terminal,
            )?;
            cmd_replay(cli, &filter, *json)
        }
        Commands::Agents => {
            cmd_agents();
            Ok(())
        }
    }
}

/// Builds a replay filter from command-line values.
pub fn build_filter(
    event_type: Option<&str>,
    command_id: Option<&str>,
    since: Option<&str>,
    terminal_only: bool,
) -> Result<AuditFilter> {
    let mut filter = AuditFilter::new();
    if let Some(raw) = event_type {
        let parsed = raw
            .parse::<AuditEventType>()
            .map_err(CliError::InvalidArgument)?;
        filter = filter.with_event_type(parsed);
    }
    if let Some(id) = command_id {
        filter = filter.with_command_id(id);
    }
    if let Some(raw) = since {
        let parsed = DateTime::parse_from_rfc3339(raw)
            .map_err(|e| CliError::InvalidArgument(format!("--since {}: {}", raw, e)))?;
        filter = filter.with_since(parsed.with_timezone(&Utc));
    }
    if terminal_only {
        filter = filter.terminal_only();
    }
    Ok(filter)
}

fn cmd_replay(cli: &Cli, filter: &AuditFilter, json: bool) -> Result<()> {
    let store = JsonlAuditStore::new(cli.audit_dir());
    let logger = AuditLogger::new(Arc::new(store), DEFAULT_AUDIT_BUFFER);
    let events = logger.replay(filter)?;

    if events.is_empty() {
        println!("No audit events found.");
        return Ok(());
    }

    for event in &events {
        if json {
            let line = serde_json::to_string(event)
                .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
            println!("{}", line);
        } else {
            println!("{}", format_event(event));
        }
    }
    if !json {
        println!();
        println!("{} event(s)", events.len());
    }
    Ok(())
}

/// One table row for an audit event.
pub fn format_event(event: &AuditEvent) -> String {
    let mut line = format!(
        "{} {:<22} {:<40} {}",
        event.timestamp.format("%Y-%m-%d %H:%M:%S"),
        event.event_type.as_str(),
        event.command_id.as_ref().map(|c| c.as_str()).unwrap_or("-"),
        if event.terminal { "*" } else { " " },
    );
    for key in ["agent", "routing_decision", "source_backend", "backend", "reason"] {
        if let Some(value) = event.field_str(key) {
            line.push_str(&format!(" {}={}", key, value));
        }
    }
    line.trim_end().to_string()
}

fn cmd_agents() {
    let registry = StaticAgentRegistry::default();
    println!("Local agents:");
    for agent in registry.list_local() {
        println!("  {}", agent);
    }
    println!();
    println!("External agents (disabled by default):");
    for agent in registry.list_external() {
        println!("  {}", agent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_all_fields() {
        let filter = build_filter(
            Some("dispatch-failed"),
            Some("cmd-9"),
            Some("2026-01-01T00:00:00Z"),
            true,
        )
        .unwrap();

        assert_eq!(filter.event_type, Some(AuditEventType::DispatchFailed));
        assert_eq!(filter.command_id.as_ref().map(|c| c.as_str()), Some("cmd-9"));
        assert!(filter.since.is_some());
        assert!(filter.terminal_only);
    }

    #[test]
    fn test_build_filter_rejects_unknown_type() {
        let err = build_filter(Some("exploded"), None, None, false).unwrap_err();
        assert!(err.to_string().contains("exploded"));
    }

    #[test]
    fn test_build_filter_rejects_bad_time() {
        assert!(build_filter(None, None, Some("yesterday"), false).is_err());
    }

    #[test]
    fn test_format_event_row() {
        let event = AuditEvent::builder(AuditEventType::Blocked)
            .command("cmd-1")
            .terminal()
            .with_field("agent", "gemini-cli")
            .with_field("reason", "not enabled")
            .build();

        let row = format_event(&event);
        assert!(row.contains("blocked"));
        assert!(row.contains("cmd-1"));
        assert!(row.contains(" * "));
        assert!(row.ends_with("agent=gemini-cli reason=not enabled"));
    }

    #[test]
    fn test_replay_reads_audit_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cli = <Cli as clap::Parser>::parse_from([
            "voxroute",
            "--state-dir",
            dir.path().to_str().unwrap(),
            "replay",
        ]);
        assert!(cmd_replay(&cli, &AuditFilter::new(), false).is_ok());
    }
}
