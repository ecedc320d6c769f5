//! REPL input handling - slash commands and utterances typed at the prompt

use unicode_width::UnicodeWidthStr;

use crate::session::SessionEvent;
use crate::stats::RebuildKind;

/// What a typed line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    Utterance(String),
    List,
    Channels,
    Stats,
    Reload,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

pub const HELP: &str = "\
Commands:
  /list - Show every registered phrase
  /channels - Show generated device phrases
  /stats - Show rebuild and match stats
  /reload - Reload the catalog and extensions
  /help - Show this help
  /quit - Exit

Anything else is resolved as a spoken command, e.g. 'turn on the light in the hall'";

/// Check if input is a slash command, otherwise treat it as an utterance
pub fn parse_input(line: &str) -> ReplInput {
    let line = line.trim();
    if line.is_empty() {
        return ReplInput::Empty;
    }
    let Some(cmd) = line.strip_prefix('/') else {
        return ReplInput::Utterance(line.to_string());
    };

    match cmd.to_lowercase().as_str() {
        "list" | "ls" => ReplInput::List,
        "channels" => ReplInput::Channels,
        "stats" | "status" => ReplInput::Stats,
        "reload" => ReplInput::Reload,
        "help" | "commands" => ReplInput::Help,
        "quit" | "exit" => ReplInput::Quit,
        _ => ReplInput::Unknown(line.to_string()),
    }
}

/// Text shown for a session event
pub fn format_event(event: &SessionEvent) -> String {
    match event {
        SessionEvent::Resolved { resolution, .. } => {
            format!("{}  [{}]", resolution.reply, resolution.action)
        }
        SessionEvent::Unresolved { utterance } => format!("No command matches '{}'", utterance),
        SessionEvent::Rebuilt(report) => {
            let what = match report.kind {
                RebuildKind::Devices => "Devices",
                RebuildKind::Extensions => "Extensions",
            };
            format!(
                "{}: {} phrases registered, {} not unique, {} replaced",
                what, report.inserted, report.duplicates, report.removed
            )
        }
        SessionEvent::Removed(n) => format!("Removed {} commands", n),
        SessionEvent::Listing(listing) if listing.is_empty() => "No commands registered".to_string(),
        SessionEvent::Listing(listing) => listing.trim_end().to_string(),
        SessionEvent::Channels(channels) => {
            let width = channels.iter().map(|c| c.action.width()).max().unwrap_or(0);
            channels
                .iter()
                .map(|c| {
                    format!(
                        "{}{}  {}",
                        c.action,
                        " ".repeat(width - c.action.width()),
                        c.keywords
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        SessionEvent::Error(e) => format!("Error: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Channel;
    use crate::command::{Action, Resolution};

    #[test]
    fn test_slash_commands() {
        assert_eq!(parse_input("/list"), ReplInput::List);
        assert_eq!(parse_input("  /QUIT "), ReplInput::Quit);
        assert_eq!(parse_input("/stats"), ReplInput::Stats);
        assert_eq!(parse_input("/frobnicate"), ReplInput::Unknown("/frobnicate".into()));
    }

    #[test]
    fn test_utterances() {
        assert_eq!(
            parse_input("turn on the light "),
            ReplInput::Utterance("turn on the light".into())
        );
        assert_eq!(parse_input("   "), ReplInput::Empty);
    }

    #[test]
    fn test_format_resolved() {
        let event = SessionEvent::Resolved {
            utterance: "turn on sconce".into(),
            resolution: Resolution {
                action: Action::device("LAMP1", "on"),
                reply: "Sconce is on".into(),
                index: 0,
            },
        };
        assert_eq!(format_event(&event), "Sconce is on  [LAMP1.on]");
    }

    #[test]
    fn test_format_channels_aligned() {
        let event = SessionEvent::Channels(vec![
            Channel {
                action: "FAN.on".into(),
                dn: "FAN".into(),
                keywords: "turn on fan".into(),
            },
            Channel {
                action: "LAMP1.off".into(),
                dn: "LAMP1".into(),
                keywords: "turn off sconce".into(),
            },
        ]);
        assert_eq!(
            format_event(&event),
            "FAN.on     turn on fan\nLAMP1.off  turn off sconce"
        );
    }
}
