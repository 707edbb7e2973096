//! Terminal output helpers shared by commands.

use nothanks_engine::cards::Card;
use std::io::Write;

pub fn write_error(err: &mut dyn Write, msg: &str) -> std::io::Result<()> {
    writeln!(err, "Error: {}", msg)
}

/// Display a warning message to stderr with "WARNING:" prefix
pub fn display_warning(err: &mut dyn Write, message: &str) -> std::io::Result<()> {
    writeln!(err, "WARNING: {}", message)
}

/// Space-separated card values, or `-` for none.
pub fn format_cards<'a>(cards: impl IntoIterator<Item = &'a Card>) -> String {
    let parts: Vec<String> = cards.into_iter().map(|c| c.to_string()).collect();
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(" ")
    }
}
