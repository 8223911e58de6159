//! Slash-command parsing.
//!
//! Turns the raw text of a `/psas …` command into a typed [`Command`].
//! Parsing is a pure function of the text: the dispatch controller parses
//! once in the fresh phase (for the acknowledgement label) and again in the
//! background phase, and both must see the same result.

use serde::{Deserialize, Serialize};

/// Canonical command actions. Closed set: anything the alias table does not
/// recognise becomes [`Action::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Add,
    Today,
    Meals,
    Help,
    Delete,
    YesterdaySummary,
    Vitals,
    Unknown,
}

impl Action {
    /// Map a raw action token to its canonical action.
    ///
    /// Matching is case-sensitive except for `Help`, which also accepts the
    /// capitalised spelling.
    pub fn from_token(token: &str) -> Action {
        match token {
            "add" => Action::Add,
            "today" => Action::Today,
            "meals" => Action::Meals,
            "help" | "Help" => Action::Help,
            "del" | "delete" | "remove" | "rm" => Action::Delete,
            "last" | "yesterday" => Action::YesterdaySummary,
            "vitals" => Action::Vitals,
            _ => Action::Unknown,
        }
    }

    /// Human-readable label shown in the immediate acknowledgement reply.
    pub fn view_label(&self) -> &'static str {
        match self {
            Action::Add => "Add",
            Action::Today => "Today",
            Action::Meals => "Meals",
            Action::Help => "Help",
            Action::Delete => "Delete",
            Action::YesterdaySummary => "Yesterday summary",
            Action::Vitals => "Vitals",
            Action::Unknown => "Unknown",
        }
    }
}

/// A parsed slash command. Immutable after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Canonical action.
    pub action: Action,
    /// The full raw command text.
    pub raw_text: String,
    /// Free-text meal name (first comma segment minus the action word,
    /// surrounding quotes stripped). Empty for non-`add` commands.
    pub meal_name: String,
    /// `(category token, amount)` pairs from the comma segments after the
    /// first. Amounts are bare numeric casts; a malformed token yields NaN.
    pub entries: Vec<(String, f64)>,
    /// Upper-cased trailing token for `delete` and its aliases.
    pub handler_code: Option<String>,
}

/// Parse raw command text into a [`Command`].
///
/// Shape: `add "meal name", cat amt, cat amt` — the first whitespace token is
/// the action, the rest of the first comma segment is the meal name, and each
/// later comma segment is split at its last whitespace run into a category
/// token and an amount token.
pub fn parse(text: &str) -> Command {
    let action_token = text.split_whitespace().next().unwrap_or("");
    let action = Action::from_token(action_token);

    let mut segments = text.split(',');
    let head = segments.next().unwrap_or("");

    let meal_name = head
        .split_whitespace()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches('"')
        .to_string();

    let entries = segments
        .map(|segment| {
            let segment = segment.trim();
            match segment.rsplit_once(char::is_whitespace) {
                Some((category, amount)) => (
                    category.trim().to_string(),
                    amount.trim().parse::<f64>().unwrap_or(f64::NAN),
                ),
                // No whitespace: the whole segment is the category, no amount.
                None => (segment.to_string(), f64::NAN),
            }
        })
        .filter(|(category, _)| !category.is_empty())
        .collect();

    let handler_code = if action == Action::Delete {
        text.split_whitespace()
            .last()
            .map(|token| token.trim_matches('"').to_uppercase())
    } else {
        None
    };

    Command {
        action,
        raw_text: text.to_string(),
        meal_name,
        entries,
        handler_code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_map_to_canonical_actions() {
        let table = [
            ("add", Action::Add),
            ("today", Action::Today),
            ("meals", Action::Meals),
            ("help", Action::Help),
            ("Help", Action::Help),
            ("del", Action::Delete),
            ("delete", Action::Delete),
            ("remove", Action::Delete),
            ("rm", Action::Delete),
            ("last", Action::YesterdaySummary),
            ("yesterday", Action::YesterdaySummary),
            ("vitals", Action::Vitals),
        ];
        for (token, expected) in table {
            assert_eq!(Action::from_token(token), expected, "token {token:?}");
        }
    }

    #[test]
    fn unrecognised_tokens_are_unknown() {
        for token in ["ADD", "Today", "breakfast", "", "addx"] {
            assert_eq!(Action::from_token(token), Action::Unknown, "token {token:?}");
        }
    }

    #[test]
    fn add_command_parses_meal_and_entries() {
        let cmd = parse("add \"Oatmeal\", sugar 3, flour 5");
        assert_eq!(cmd.action, Action::Add);
        assert_eq!(cmd.meal_name, "Oatmeal");
        assert_eq!(cmd.entries.len(), 2);
        assert_eq!(cmd.entries[0].0, "sugar");
        assert_eq!(cmd.entries[0].1, 3.0);
        assert_eq!(cmd.entries[1].0, "flour");
        assert_eq!(cmd.entries[1].1, 5.0);
    }

    #[test]
    fn multi_word_meal_name_is_kept() {
        let cmd = parse("add \"green eggs and ham\", meat 2");
        assert_eq!(cmd.meal_name, "green eggs and ham");
        assert_eq!(cmd.entries, vec![("meat".to_string(), 2.0)]);
    }

    #[test]
    fn malformed_amount_parses_to_nan() {
        let cmd = parse("add \"X\", sugar lots");
        assert_eq!(cmd.entries.len(), 1);
        assert_eq!(cmd.entries[0].0, "sugar");
        assert!(cmd.entries[0].1.is_nan());
    }

    #[test]
    fn delete_extracts_uppercased_handler_code() {
        let cmd = parse("delete ab1f");
        assert_eq!(cmd.action, Action::Delete);
        assert_eq!(cmd.handler_code.as_deref(), Some("AB1F"));

        let cmd = parse("rm \"c0de\"");
        assert_eq!(cmd.handler_code.as_deref(), Some("C0DE"));
    }

    #[test]
    fn empty_text_is_unknown() {
        let cmd = parse("");
        assert_eq!(cmd.action, Action::Unknown);
        assert!(cmd.entries.is_empty());
        assert!(cmd.meal_name.is_empty());
    }

    #[test]
    fn parse_is_pure_and_repeatable() {
        let text = "add \"Oatmeal\", sugar 3, flour 5";
        assert_eq!(parse(text), parse(text));
    }
}
