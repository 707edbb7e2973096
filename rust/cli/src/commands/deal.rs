//! `deal`: runs a real deal and shows what the table hides: the removed set
//! and the draw order.

use crate::config;
use crate::error::CliError;
use crate::ui;
use nothanks_engine::game::GameSession;
use nothanks_engine::settings::{REMOVED_COUNT_RANGE, SettingsPatch};
use std::io::Write;

pub fn handle_deal_command(
    seed: Option<u64>,
    removed: Option<u8>,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::write_error(err, &format!("Invalid configuration: {}", e))?;
            return Err(CliError::Config(e.to_string()));
        }
    };
    let seed = seed.or(cfg.seed).unwrap_or_else(rand::random);
    let removed = removed.unwrap_or(cfg.removed_count);
    if !REMOVED_COUNT_RANGE.contains(&removed) {
        let msg = format!(
            "removed must be within {}..={}, got {}",
            REMOVED_COUNT_RANGE.start(),
            REMOVED_COUNT_RANGE.end(),
            removed
        );
        ui::write_error(err, &msg)?;
        return Err(CliError::InvalidInput(msg));
    }

    let mut game = GameSession::new(Some(seed));
    game.add_player("north", "North")?;
    game.add_player("south", "South")?;
    game.start(Some(&SettingsPatch {
        removed_count: Some(removed),
        ..SettingsPatch::default()
    }))?;

    let mut set_aside = game.removed_cards().to_vec();
    set_aside.sort();
    let face_up = game.pile().current_card;

    writeln!(out, "Seed: {}", seed)?;
    writeln!(out, "Removed ({}): {}", set_aside.len(), ui::format_cards(&set_aside))?;
    writeln!(
        out,
        "Face up: {}",
        face_up.map_or_else(|| "-".to_string(), |c| c.to_string())
    )?;
    writeln!(
        out,
        "Deck ({}): {}",
        game.deck_size(),
        ui::format_cards(game.undrawn_cards())
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deal(seed: u64, removed: Option<u8>) -> String {
        let mut out = Vec::new();
        let mut err = Vec::new();
        handle_deal_command(Some(seed), removed, &mut out, &mut err).expect("deal");
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn same_seed_same_deal() {
        assert_eq!(deal(42, Some(9)), deal(42, Some(9)));
    }

    #[test]
    fn reports_removed_and_deck_sizes() {
        let text = deal(7, Some(9));
        assert!(text.contains("Removed (9):"), "{text}");
        assert!(text.contains("Deck (23):"), "{text}");
    }

    #[test]
    fn rejects_oversized_removed_count() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = handle_deal_command(Some(1), Some(30), &mut out, &mut err);
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
        assert!(String::from_utf8(err).unwrap().contains("Error:"));
    }
}
