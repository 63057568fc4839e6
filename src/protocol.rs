// Command grammar and reply encoding.
//
// Commands arrive as pre-split argument lists (a Discord-style frontend
// splits on whitespace with double quotes grouping multi-word names).
// Replies are a tagged union: renderable as text for the console and
// serializable as JSON for any frontend that wants structure.

use serde::Serialize;

use crate::entries::Entry;
use crate::presets::PresetSummary;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ListPresets,
    PresetContents { name: String },
    CreatePreset { name: String, entries: Vec<String> },
    DeletePreset { name: String },
    UpdatePreset { name: String, entries: Vec<String> },
    AppendToPreset { name: String, entries: Vec<String> },
    RemoveFromPreset { name: String, entries: Vec<String> },
    StartGame { game_type: String, preset: String },
    RefreshCategory { category: String },
}

impl Command {
    /// Match an argument list against the command grammar. The two-token
    /// `preset <name>` form is matched last so subcommand keywords are not
    /// swallowed as preset names.
    pub fn parse(args: &[String]) -> Option<Command> {
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        match refs.as_slice() {
            ["preset"] | ["presets"] => Some(Command::ListPresets),

            ["preset", "create", name, entries @ ..] => Some(Command::CreatePreset {
                name: (*name).to_string(),
                entries: owned(entries),
            }),

            ["preset", "delete", name] => Some(Command::DeletePreset {
                name: (*name).to_string(),
            }),

            ["preset", "update", name, entries @ ..] => Some(Command::UpdatePreset {
                name: (*name).to_string(),
                entries: owned(entries),
            }),

            ["preset", "append", name, entries @ ..] => Some(Command::AppendToPreset {
                name: (*name).to_string(),
                entries: owned(entries),
            }),

            ["preset", "remove", name, entries @ ..] => Some(Command::RemoveFromPreset {
                name: (*name).to_string(),
                entries: owned(entries),
            }),

            ["preset", name] => Some(Command::PresetContents {
                name: (*name).to_string(),
            }),

            ["start", game_type, preset] => Some(Command::StartGame {
                game_type: (*game_type).to_string(),
                preset: (*preset).to_string(),
            }),

            ["cache", "refresh", category] => Some(Command::RefreshCategory {
                category: (*category).to_string(),
            }),

            _ => None,
        }
    }
}

fn owned(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| (*s).to_string()).collect()
}

/// Split an input line into arguments: whitespace separates, double quotes
/// group, so `preset create Favs "Indie games"` yields four arguments.
/// An unterminated quote runs to the end of the line.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        args.push(current);
    }
    args
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// Every command produces exactly one reply. The union is closed: a
/// frontend can match on `type` exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Reply {
    ListPresets {
        presets: Vec<PresetSummary>,
    },
    PresetContents {
        name: String,
        entries: Vec<Entry>,
    },
    GameStarted {
        game_type: String,
        preset: String,
        board: Vec<String>,
    },
    Ack {
        message: String,
    },
    Failure {
        message: String,
    },
}

/// Text rendering for the console frontend.
pub fn render(reply: &Reply) -> String {
    match reply {
        Reply::ListPresets { presets } => {
            if presets.is_empty() {
                return "No presets saved yet.".to_string();
            }
            let mut out = String::from("Saved presets:");
            for p in presets {
                out.push_str("\n  ");
                out.push_str(&p.name);
                if let Some(desc) = &p.description {
                    out.push_str(": ");
                    out.push_str(desc);
                }
            }
            out
        }

        Reply::PresetContents { name, entries } => {
            if entries.is_empty() {
                return format!("Preset {name} is empty.");
            }
            let mut out = format!("Preset {name}:");
            for e in entries {
                out.push_str(&format!("\n  {} ({})", e.name, e.entry_type));
            }
            out
        }

        Reply::GameStarted {
            game_type,
            preset,
            board,
        } => {
            let mut out = format!(
                "Started a {game_type} game from preset {preset} with {} squares:",
                board.len()
            );
            for title in board {
                out.push_str("\n  ");
                out.push_str(title);
            }
            out
        }

        Reply::Ack { message } => message.clone(),

        Reply::Failure { message } => format!("Error: {message}"),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::EntryType;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_both_listing_spellings() {
        assert_eq!(
            Command::parse(&args(&["preset"])),
            Some(Command::ListPresets)
        );
        assert_eq!(
            Command::parse(&args(&["presets"])),
            Some(Command::ListPresets)
        );
    }

    #[test]
    fn parses_create_with_trailing_entries() {
        assert_eq!(
            Command::parse(&args(&["preset", "create", "Favs", "Indie games", "Celeste"])),
            Some(Command::CreatePreset {
                name: "Favs".to_string(),
                entries: args(&["Indie games", "Celeste"]),
            })
        );
    }

    #[test]
    fn parses_create_with_no_entries() {
        // Grammar accepts it; the store rejects the empty list downstream.
        assert_eq!(
            Command::parse(&args(&["preset", "create", "Favs"])),
            Some(Command::CreatePreset {
                name: "Favs".to_string(),
                entries: vec![],
            })
        );
    }

    #[test]
    fn parses_delete_update_append_remove() {
        assert_eq!(
            Command::parse(&args(&["preset", "delete", "Favs"])),
            Some(Command::DeletePreset {
                name: "Favs".to_string()
            })
        );
        assert_eq!(
            Command::parse(&args(&["preset", "update", "Favs", "Hades"])),
            Some(Command::UpdatePreset {
                name: "Favs".to_string(),
                entries: args(&["Hades"]),
            })
        );
        assert_eq!(
            Command::parse(&args(&["preset", "append", "Favs", "Hades"])),
            Some(Command::AppendToPreset {
                name: "Favs".to_string(),
                entries: args(&["Hades"]),
            })
        );
        assert_eq!(
            Command::parse(&args(&["preset", "remove", "Favs", "Hades"])),
            Some(Command::RemoveFromPreset {
                name: "Favs".to_string(),
                entries: args(&["Hades"]),
            })
        );
    }

    #[test]
    fn two_token_preset_form_reads_contents() {
        assert_eq!(
            Command::parse(&args(&["preset", "Favs"])),
            Some(Command::PresetContents {
                name: "Favs".to_string()
            })
        );
    }

    #[test]
    fn subcommand_keywords_are_not_preset_names() {
        // "preset delete X" must parse as a deletion, never as reading the
        // contents of a preset literally named "delete".
        let parsed = Command::parse(&args(&["preset", "delete", "X"]));
        assert!(matches!(parsed, Some(Command::DeletePreset { .. })));
    }

    #[test]
    fn parses_start_and_refresh() {
        assert_eq!(
            Command::parse(&args(&["start", "bingo", "Favs"])),
            Some(Command::StartGame {
                game_type: "bingo".to_string(),
                preset: "Favs".to_string(),
            })
        );
        assert_eq!(
            Command::parse(&args(&["cache", "refresh", "Indie games"])),
            Some(Command::RefreshCategory {
                category: "Indie games".to_string(),
            })
        );
    }

    #[test]
    fn unknown_shapes_do_not_parse() {
        assert_eq!(Command::parse(&args(&[])), None);
        assert_eq!(Command::parse(&args(&["bingo"])), None);
        assert_eq!(Command::parse(&args(&["start", "bingo"])), None);
        assert_eq!(Command::parse(&args(&["start", "bingo", "Favs", "extra"])), None);
    }

    #[test]
    fn tokenize_groups_quoted_names() {
        assert_eq!(
            tokenize(r#"preset create Favs "Indie games" Celeste"#),
            args(&["preset", "create", "Favs", "Indie games", "Celeste"])
        );
    }

    #[test]
    fn tokenize_handles_blank_and_extra_whitespace() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
        assert_eq!(tokenize("  preset   list "), args(&["preset", "list"]));
    }

    #[test]
    fn tokenize_runs_unterminated_quote_to_line_end() {
        assert_eq!(
            tokenize(r#"preset "Indie games"#),
            args(&["preset", "Indie games"])
        );
    }

    #[test]
    fn replies_serialize_with_type_tag() {
        let reply = Reply::Failure {
            message: "nope".to_string(),
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["type"], "Failure");
        assert_eq!(json["message"], "nope");

        let reply = Reply::PresetContents {
            name: "Favs".to_string(),
            entries: vec![Entry {
                name: "Celeste".to_string(),
                entry_type: EntryType::Article,
            }],
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["type"], "PresetContents");
        assert_eq!(json["entries"][0]["entry_type"], "article");
    }

    #[test]
    fn renders_each_reply_shape() {
        let listing = render(&Reply::ListPresets {
            presets: vec![PresetSummary {
                name: "Favs".to_string(),
                description: Some("the good ones".to_string()),
            }],
        });
        assert!(listing.contains("Favs: the good ones"));

        assert_eq!(
            render(&Reply::ListPresets { presets: vec![] }),
            "No presets saved yet."
        );

        let contents = render(&Reply::PresetContents {
            name: "Favs".to_string(),
            entries: vec![Entry {
                name: "Indie games".to_string(),
                entry_type: EntryType::Category,
            }],
        });
        assert!(contents.contains("Indie games (category)"));

        let game = render(&Reply::GameStarted {
            game_type: "bingo".to_string(),
            preset: "Favs".to_string(),
            board: vec!["Celeste".to_string(), "Hades".to_string()],
        });
        assert!(game.contains("2 squares"));
        assert!(game.contains("Celeste"));

        assert_eq!(
            render(&Reply::Ack {
                message: "Done.".to_string()
            }),
            "Done."
        );
        assert_eq!(
            render(&Reply::Failure {
                message: "boom".to_string()
            }),
            "Error: boom"
        );
    }
}
