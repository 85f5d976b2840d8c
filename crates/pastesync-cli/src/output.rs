//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use chrono::Local;
use pastesync_core::sync::{ConnectionState, InboundFrame, LiveEvent};
use pastesync_core::{HistoryEntry, Notice, PasteSession};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print the paste view: body, or the load error, plus the retired banner
    pub fn print_session(&self, session: &PasteSession) {
        match self.format {
            OutputFormat::Human => {
                println!("Paste {}", session.id());
                if session.is_retired() {
                    println!("[deleted] This paste has been deleted and is read-only");
                }
                println!("────────────────────────────────────────");
                println!("{}", session.display());
                println!("────────────────────────────────────────");
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "id": session.id(),
                        "text": session.display(),
                        "deleted": session.is_retired(),
                        "error": session.load_error(),
                    })
                );
            }
            OutputFormat::Quiet => {
                println!("{}", session.display());
            }
        }
    }

    /// Print a live event as it arrives
    ///
    /// `session` has already had the event applied.
    pub fn print_live_event(&self, event: &LiveEvent, session: &PasteSession) {
        match self.format {
            OutputFormat::Human => match event {
                LiveEvent::StatusChanged(state) => println!("{}", status_line(*state)),
                LiveEvent::Frame(InboundFrame::UserCount(count)) => {
                    println!("👥 {} viewing", count);
                }
                LiveEvent::Frame(frame) if frame.snapshot().is_some() => {
                    if session.is_editing() {
                        println!("(remote update received while editing)");
                    } else {
                        println!("── updated {} ──", Local::now().format("%H:%M:%S"));
                        println!("{}", session.display());
                    }
                }
                LiveEvent::RetryScheduled { attempt, delay } => {
                    println!(
                        "Reconnecting in {:.1}s (attempt {})",
                        delay.as_secs_f64(),
                        attempt
                    );
                }
                _ => {}
            },
            OutputFormat::Json => {
                if let Some(value) = live_event_json(event) {
                    println!("{}", value);
                }
            }
            OutputFormat::Quiet => {
                if let LiveEvent::Frame(frame) = event {
                    if frame.snapshot().is_some() && !session.is_editing() {
                        println!("{}", session.display());
                    }
                }
            }
        }
    }

    /// Print the audit history
    pub fn print_history(&self, entries: &[HistoryEntry]) {
        match self.format {
            OutputFormat::Human => {
                if entries.is_empty() {
                    println!("No history entries found.");
                    return;
                }
                println!(
                    "{:<7} {:<19} {:<15} {:>3} {:<7} {:<7}",
                    "ID", "Time", "Creator IP", "Ver", "Action", "Status"
                );
                for entry in entries {
                    println!(
                        "{:<7} {:<19} {:<15} {:>3} {:<7} {:<7}",
                        entry.id,
                        entry
                            .timestamp
                            .with_timezone(&Local)
                            .format("%Y-%m-%d %H:%M:%S"),
                        truncate(&entry.creator_ip, 15),
                        entry.version,
                        capitalize(entry.action.as_str()),
                        entry.status_label()
                    );
                }
                let noun = if entries.len() == 1 { "entry" } else { "entries" };
                println!("\n{} {}", entries.len(), noun);
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(entries).unwrap_or_else(|_| "[]".to_string())
                );
            }
            OutputFormat::Quiet => {
                for entry in entries {
                    println!("{}", entry.id);
                }
            }
        }
    }

    /// Print a notice raised by the session
    pub fn notice(&self, notice: &Notice) {
        match self.format {
            OutputFormat::Human => eprintln!("⚠ {}", notice),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "notice", "message": notice.to_string()})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// JSON line for a live event; `None` for frames that carry nothing
fn live_event_json(event: &LiveEvent) -> Option<serde_json::Value> {
    let value = match event {
        LiveEvent::StatusChanged(state) => {
            serde_json::json!({"event": "status", "status": state.label()})
        }
        LiveEvent::Frame(InboundFrame::UserCount(count)) => {
            serde_json::json!({"event": "userCount", "count": count})
        }
        LiveEvent::Frame(frame) => {
            let text = frame.snapshot()?;
            serde_json::json!({"event": "content", "text": text})
        }
        LiveEvent::RetryScheduled { attempt, delay } => serde_json::json!({
            "event": "retry",
            "attempt": attempt,
            "delay_ms": delay.as_millis() as u64,
        }),
        LiveEvent::TransportError(message) => {
            serde_json::json!({"event": "error", "message": message})
        }
        LiveEvent::Terminal(info) => serde_json::json!({
            "event": "deleted",
            "code": info.code,
            "reason": info.reason,
        }),
        LiveEvent::GaveUp => serde_json::json!({"event": "disconnected"}),
    };
    Some(value)
}

/// Connectivity indicator line
fn status_line(state: ConnectionState) -> String {
    match state {
        ConnectionState::Open => format!("● {}", state.label()),
        _ => format!("○ {}", state.label()),
    }
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
