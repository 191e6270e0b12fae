//! Interactive developer console.
//!
//! Each typed line is delivered to the voice session as a final speech
//! result. Slash commands change routing preferences and answer pending
//! confirmations.

use std::path::PathBuf;

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tokio::runtime::Runtime;
use tracing::debug;
use voxroute_models::{RoutingMode, DEFAULT_CONFIDENCE};
use voxroute_orchestrator::{PipelineOutcome, PipelineResponse, SttEvent};

use crate::app::App;
use crate::error::Result;

/// Tab completion for slash commands.
struct CommandCompleter;

impl CommandCompleter {
    const COMMANDS: &'static [&'static str] = &[
        "/accept", "/active", "/external", "/help", "/mode", "/no", "/pin", "/quit",
        "/status", "/trail", "/unpin", "/yes",
    ];
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }

        let prefix = &line[..pos];
        let matches: Vec<Pair> = Self::COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(prefix))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((0, matches))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}
impl Validator for CommandCompleter {}
impl Helper for CommandCompleter {}

/// Console input.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// Toggle, or switch to the given mode
    Mode(Option<RoutingMode>),
    Pin(String),
    Unpin,
    Active(String),
    External(bool),
    Yes,
    No,
    Accept,
    Trail,
    Status,
    Help,
    Quit,
    Unknown(String),
    /// A transcript to route
    Say(String),
    Empty,
}

impl ConsoleCommand {
    /// Parses one console line.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() {
            return ConsoleCommand::Empty;
        }

        let Some(stripped) = input.strip_prefix('/') else {
            return ConsoleCommand::Say(input.to_string());
        };

        let parts: Vec<&str> = stripped.splitn(2, ' ').collect();
        let cmd = parts[0].to_lowercase();
        let arg = parts
            .get(1)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty());

        match (cmd.as_str(), arg) {
            ("mode" | "m", None) => ConsoleCommand::Mode(None),
            ("mode" | "m", Some(mode)) => match mode.parse::<RoutingMode>() {
                Ok(mode) => ConsoleCommand::Mode(Some(mode)),
                Err(e) => ConsoleCommand::Unknown(e),
            },
            ("pin", Some(agent)) => ConsoleCommand::Pin(agent.to_string()),
            ("pin", None) => ConsoleCommand::Unknown("pin requires an agent".to_string()),
            ("unpin", _) => ConsoleCommand::Unpin,
            ("active", Some(agent)) => ConsoleCommand::Active(agent.to_string()),
            ("active", None) => ConsoleCommand::Unknown("active requires an agent".to_string()),
            ("external", Some(flag)) => match flag.to_lowercase().as_str() {
                "on" | "true" | "yes" => ConsoleCommand::External(true),
                "off" | "false" | "no" => ConsoleCommand::External(false),
                _ => ConsoleCommand::Unknown("external expects on or off".to_string()),
            },
            ("external", None) => ConsoleCommand::Unknown("external expects on or off".to_string()),
            ("yes" | "y", _) => ConsoleCommand::Yes,
            ("no" | "n", _) => ConsoleCommand::No,
            ("accept", _) => ConsoleCommand::Accept,
            ("trail" | "t", _) => ConsoleCommand::Trail,
            ("status" | "s", _) => ConsoleCommand::Status,
            ("help" | "h" | "?", _) => ConsoleCommand::Help,
            ("quit" | "q" | "exit", _) => ConsoleCommand::Quit,
            (other, _) => ConsoleCommand::Unknown(format!("unknown command /{}", other)),
        }
    }
}

/// Console state.
pub struct Console {
    editor: Editor<CommandCompleter, DefaultHistory>,
    runtime: Runtime,
    app: App,
    history_path: PathBuf,
}

impl Console {
    /// Creates a console around an app built inside `runtime`.
    pub fn new(runtime: Runtime, app: App, history_path: PathBuf) -> Result<Self> {
        let config = rustyline::Config::builder()
            .completion_type(rustyline::CompletionType::List)
            .build();
        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(CommandCompleter));
        if history_path.exists() {
            let _ = editor.load_history(&history_path);
        }

        Ok(Self {
            editor,
            runtime,
            app,
            history_path,
        })
    }

    /// Runs the console loop until `/quit` or end of input.
    pub fn run(mut self) -> Result<()> {
        println!("Voxroute console v{}", env!("CARGO_PKG_VERSION"));
        println!("Backends: {}", self.app.backends.join(", "));
        println!("Type a command as if spoken. /help for commands, /quit to exit");
        println!();

        self.runtime.block_on(self.app.session.on_event(SttEvent::Start))?;

        loop {
            let prompt = self.prompt();

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        self.editor.add_history_entry(&line)?;
                    }
                    let cmd = ConsoleCommand::parse(&line);
                    debug!(?cmd, "parsed console input");

                    match self.handle(cmd) {
                        Ok(true) => break,
                        Ok(false) => {}
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                }
                Err(ReadlineError::Eof) => {
                    println!("^D");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        let _ = self.editor.save_history(&self.history_path);

        let Console { runtime, app, .. } = self;
        runtime.block_on(async move {
            let _ = app.session.on_event(SttEvent::End).await;
            app.flush_audit();
            app.session.shutdown().await;
        });

        println!("Goodbye!");
        Ok(())
    }

    fn prompt(&self) -> String {
        let prefs = self.app.session.controls().snapshot();
        match (&prefs.pinned_agent, prefs.mode) {
            (Some(agent), RoutingMode::Isolated) => format!("voxroute [{}]> ", agent),
            _ => "voxroute> ".to_string(),
        }
    }

    /// Handles one input. Returns Ok(true) to quit.
    fn handle(&mut self, cmd: ConsoleCommand) -> Result<bool> {
        let session = &self.app.session;
        let controls = session.controls();

        match cmd {
            ConsoleCommand::Empty => {}
            ConsoleCommand::Say(transcript) => {
                let event = SttEvent::Result {
                    transcript,
                    confidence: DEFAULT_CONFIDENCE,
                    is_final: true,
                };
                if let Some(response) = self.runtime.block_on(session.on_event(event))? {
                    print_response(&response);
                }
            }
            ConsoleCommand::Mode(mode) => {
                let mode = match mode {
                    Some(mode) => controls.set_mode(mode)?.mode,
                    None => controls.toggle_mode()?,
                };
                println!("Mode: {}", mode);
            }
            ConsoleCommand::Pin(agent) => {
                controls.pin(agent.as_str())?;
                println!("Pinned to {} (isolated)", agent);
            }
            ConsoleCommand::Unpin => {
                controls.unpin()?;
                println!("Unpinned (agnostic)");
            }
            ConsoleCommand::Active(agent) => {
                controls.set_active(agent.as_str())?;
                println!("Active agent: {}", agent);
            }
            ConsoleCommand::External(enabled) => {
                controls.set_external(enabled)?;
                println!(
                    "External agents {}",
                    if enabled { "enabled" } else { "disabled" }
                );
            }
            ConsoleCommand::Yes => {
                let response = self.runtime.block_on(session.confirm())?;
                print_response(&response);
            }
            ConsoleCommand::No => {
                let response = self.runtime.block_on(session.decline())?;
                print_response(&response);
            }
            ConsoleCommand::Accept => {
                let agent = self.runtime.block_on(session.accept_suggestion())?;
                println!("Active agent: {}", agent);
            }
            ConsoleCommand::Trail => {
                let snapshot = self.runtime.block_on(session.snapshot())?;
                if snapshot.trail.is_empty() {
                    println!("(no breadcrumbs yet)");
                } else {
                    println!("{}", snapshot.summary);
                }
            }
            ConsoleCommand::Status => {
                let prefs = controls.snapshot();
                let snapshot = self.runtime.block_on(session.snapshot())?;
                println!("Mode:      {}", prefs.mode);
                println!(
                    "Pinned:    {}",
                    prefs.pinned_agent.as_ref().map(|a| a.as_str()).unwrap_or("-")
                );
                println!(
                    "Active:    {}",
                    prefs.active_agent.as_ref().map(|a| a.as_str()).unwrap_or("-")
                );
                println!("External:  {}", if prefs.external_enabled { "on" } else { "off" });
                println!("Backends:  {}", self.app.backends.join(", "));
                if let Some(pending) = snapshot.pending {
                    println!(
                        "Pending:   \"{}\" for {}",
                        pending.original_command().transcript,
                        pending.proposed_target()
                    );
                }
                if self.app.audit.is_degraded() {
                    println!(
                        "Audit:     degraded ({} buffered)",
                        self.app.audit.buffered_len()
                    );
                }
            }
            ConsoleCommand::Help => print_help(),
            ConsoleCommand::Quit => return Ok(true),
            ConsoleCommand::Unknown(msg) => {
                println!("{}. Type /help for commands.", msg);
            }
        }
        Ok(false)
    }
}

/// Prints routing detail. Spoken text is already printed by the speech sink.
fn print_response(response: &PipelineResponse) {
    let decision = &response.decision;
    println!(
        "  -> {} ({}, {})",
        decision.target(),
        decision.basis().decision_label(),
        response.outcome.label()
    );

    if let PipelineOutcome::Dispatched(result) | PipelineOutcome::DispatchFailed(result) =
        &response.outcome
    {
        if let Some(summary) = result.failure_summary() {
            println!("  attempts: {}", summary);
        }
        if let Some(source) = &result.source_backend {
            println!("  answered by {}", source);
        }
    }

    if let Some(suggestion) = &response.suggestion {
        println!("  tip: {} (/accept)", suggestion.reason);
    }
}

fn print_help() {
    println!("Voxroute console");
    println!();
    println!("Anything not starting with / is routed as a spoken command.");
    println!();
    println!("  /mode [agnostic|isolated]   Toggle or set the routing mode");
    println!("  /pin <agent>                Route everything to one agent");
    println!("  /unpin                      Back to wake-word routing");
    println!("  /active <agent>             Agent for commands without a wake word");
    println!("  /external on|off            Allow external agents");
    println!("  /yes, /no                   Answer a pending confirmation");
    println!("  /accept                     Make the suggested agent active");
    println!("  /trail                      Show the breadcrumb trail");
    println!("  /status                     Show routing preferences");
    println!("  /help                       Show this help");
    println!("  /quit                       Exit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transcript() {
        assert_eq!(
            ConsoleCommand::parse("  hey alden, what's my schedule "),
            ConsoleCommand::Say("hey alden, what's my schedule".into())
        );
        assert_eq!(ConsoleCommand::parse("   "), ConsoleCommand::Empty);
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(ConsoleCommand::parse("/mode"), ConsoleCommand::Mode(None));
        assert_eq!(
            ConsoleCommand::parse("/mode isolated"),
            ConsoleCommand::Mode(Some(RoutingMode::Isolated))
        );
        assert!(matches!(
            ConsoleCommand::parse("/mode sideways"),
            ConsoleCommand::Unknown(_)
        ));
    }

    #[test]
    fn test_parse_agent_commands() {
        assert_eq!(ConsoleCommand::parse("/pin Alice"), ConsoleCommand::Pin("Alice".into()));
        assert_eq!(
            ConsoleCommand::parse("/active mimic"),
            ConsoleCommand::Active("mimic".into())
        );
        assert!(matches!(ConsoleCommand::parse("/pin"), ConsoleCommand::Unknown(_)));
        assert_eq!(ConsoleCommand::parse("/unpin"), ConsoleCommand::Unpin);
    }

    #[test]
    fn test_parse_external() {
        assert_eq!(ConsoleCommand::parse("/external on"), ConsoleCommand::External(true));
        assert_eq!(ConsoleCommand::parse("/external OFF"), ConsoleCommand::External(false));
        assert!(matches!(
            ConsoleCommand::parse("/external maybe"),
            ConsoleCommand::Unknown(_)
        ));
    }

    #[test]
    fn test_parse_short_forms() {
        assert_eq!(ConsoleCommand::parse("/y"), ConsoleCommand::Yes);
        assert_eq!(ConsoleCommand::parse("/n"), ConsoleCommand::No);
        assert_eq!(ConsoleCommand::parse("/q"), ConsoleCommand::Quit);
        assert_eq!(ConsoleCommand::parse("/?"), ConsoleCommand::Help);
        assert_eq!(ConsoleCommand::parse("/accept"), ConsoleCommand::Accept);
        assert_eq!(ConsoleCommand::parse("/trail"), ConsoleCommand::Trail);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            ConsoleCommand::parse("/frobnicate"),
            ConsoleCommand::Unknown("unknown command /frobnicate".into())
        );
    }
}
