use nothanks_engine::errors::{ErrorKind, GameError};
use nothanks_engine::game::{GameSession, Phase, MAX_BOTS, MAX_PLAYERS};
use nothanks_engine::settings::SettingsPatch;
use serde_json::json;

fn bot_params() -> serde_json::Value {
    json!({"difficulty": "medium"})
}

#[test]
fn host_leaving_passes_to_a_human_not_a_bot() {
    let mut game = GameSession::new(Some(1));
    game.add_player("host", "Hana").unwrap();
    game.add_computer("bot-1", "Robo", bot_params()).unwrap();
    game.add_player("h2", "Ivo").unwrap();
    game.add_player("h3", "Jin").unwrap();

    game.remove_player("host").unwrap();
    assert_eq!(game.host_id().map(String::as_str), Some("h2"));
}

#[test]
fn lone_bot_never_becomes_host() {
    let mut game = GameSession::new(Some(1));
    game.add_player("host", "Hana").unwrap();
    game.add_computer("bot-1", "Robo", bot_params()).unwrap();
    game.remove_player("host").unwrap();
    assert_eq!(game.host_id(), None);

    game.add_player("late", "Lee").unwrap();
    assert_eq!(game.host_id().map(String::as_str), Some("late"));
}

#[test]
fn bot_limit_is_enforced() {
    let mut game = GameSession::new(None);
    game.add_player("h", "Human").unwrap();
    for i in 0..MAX_BOTS {
        game.add_computer(format!("bot-{i}"), &format!("Bot {i}"), bot_params())
            .unwrap();
    }
    assert_eq!(game.players().len(), MAX_PLAYERS);
    let err = game
        .add_computer("bot-x", "Extra", bot_params())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Capacity);
}

#[test]
fn settings_update_is_clamped_and_idempotent() {
    let mut game = GameSession::new(Some(3));
    let patch = SettingsPatch {
        removed_count: Some(99),
        initial_tokens: Some(7),
        ..Default::default()
    };
    let first = game.update_settings(&patch).unwrap();
    let second = game.update_settings(&patch).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.removed_count, 24);
    assert_eq!(first.initial_tokens, 7);
}

#[test]
fn soft_reset_returns_humans_to_lobby() {
    let mut game = GameSession::new(Some(9));
    game.add_player("a", "Ann").unwrap();
    game.add_computer("bot-1", "Robo", bot_params()).unwrap();
    game.start(None).unwrap();
    while game.phase() == Phase::InTurn {
        let id = game.current_player_id().unwrap().clone();
        game.take(&id).unwrap();
    }
    let before = game.turn_generation();

    game.soft_reset().unwrap();
    assert_eq!(game.phase(), Phase::Lobby);
    assert_eq!(game.players().len(), 1);
    assert!(game.players()[0].held().is_empty());
    assert_eq!(game.host_id().map(String::as_str), Some("a"));
    assert!(game.turn_generation() > before);
    assert!(game.history().is_empty());
    game.check_invariants().unwrap();
}

#[test]
fn rejected_calls_leave_state_untouched() {
    let mut game = GameSession::new(Some(4));
    game.add_player("a", "Ann").unwrap();
    game.add_player("b", "Bob").unwrap();
    game.start(None).unwrap();
    let generation = game.turn_generation();
    let deck = game.deck_size();

    assert_eq!(game.add_player("c", "Cy"), Err(GameError::AlreadyStarted));
    assert_eq!(game.remove_player("zed").unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(game.soft_reset(), Err(GameError::RoundNotOver));

    assert_eq!(game.turn_generation(), generation);
    assert_eq!(game.deck_size(), deck);
    assert_eq!(game.players().len(), 2);
}
