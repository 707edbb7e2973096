use nothanks_engine::game::{GameSession, Phase};
use nothanks_engine::player::TurnAction;
use nothanks_engine::settings::SettingsPatch;
use nothanks_engine::snapshot::PublicSnapshot;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn table(seed: u64, n: usize, patch: SettingsPatch) -> GameSession {
    let mut game = GameSession::new(Some(seed));
    for i in 0..n {
        game.add_player(format!("p{i}"), &format!("Player {i}")).unwrap();
    }
    game.start(Some(&patch)).unwrap();
    game
}

fn current(game: &GameSession) -> String {
    game.current_player_id().expect("round in progress").clone()
}

/// Snapshot with the wall-clock field dropped so two sessions can be compared.
fn state(game: &GameSession) -> PublicSnapshot {
    let mut snap = PublicSnapshot::of(game);
    snap.turn_started_at = None;
    snap
}

#[test]
fn broke_player_pass_becomes_take() {
    let mut game = table(
        3,
        2,
        SettingsPatch {
            initial_tokens: Some(1),
            removed_count: Some(1),
            ..Default::default()
        },
    );
    let a = current(&game);
    game.pass(&a).unwrap();
    assert_eq!(game.player(&a).unwrap().tokens(), 0);
    assert_eq!(game.pile().tokens, 1);

    let b = current(&game);
    game.pass(&b).unwrap();
    assert_eq!(game.pile().tokens, 2);

    // a is out of tokens: pass resolves as take
    let card = game.pile().current_card.unwrap();
    let outcome = game.pass(&a).unwrap();
    assert_eq!(outcome.action, TurnAction::Take);
    assert!(outcome.forced);
    assert_eq!(outcome.card, card);
    let a_seat = game.player(&a).unwrap();
    assert!(a_seat.held().contains(&card));
    assert_eq!(a_seat.tokens(), 2);
    assert_eq!(game.pile().tokens, 0);
    assert_eq!(game.current_player_id(), Some(&a));
}

#[test]
fn forced_pass_matches_take_exactly() {
    let mut game = table(
        8,
        3,
        SettingsPatch {
            initial_tokens: Some(0),
            ..Default::default()
        },
    );
    for _ in 0..5 {
        let id = current(&game);
        let mut via_take = game.clone();
        via_take.take(&id).unwrap();
        game.pass(&id).unwrap();
        assert_eq!(state(&game), state(&via_take));
        assert_eq!(game.history(), via_take.history());
    }
}

#[test]
fn pass_advances_and_wraps_turn_order() {
    let mut game = table(21, 3, SettingsPatch::default());
    let order: Vec<String> = game.players().iter().map(|p| p.id().clone()).collect();
    assert_eq!(current(&game), order[0]);
    for step in 1..=4 {
        let id = current(&game);
        game.pass(&id).unwrap();
        assert_eq!(current(&game), order[step % 3]);
    }
    assert_eq!(game.pile().tokens, 4);
}

#[test]
fn generation_bumps_on_every_turn_change() {
    let mut game = table(5, 2, SettingsPatch::default());
    let mut last = game.turn_generation();
    for i in 0..6 {
        let id = current(&game);
        if i % 2 == 0 {
            game.pass(&id).unwrap();
        } else {
            game.take(&id).unwrap();
        }
        assert!(game.turn_generation() > last);
        last = game.turn_generation();
    }
}

#[test]
fn last_take_ends_round_with_standings() {
    let mut game = table(
        17,
        2,
        SettingsPatch {
            removed_count: Some(24),
            ..Default::default()
        },
    );
    assert_eq!(game.deck_size(), 8);
    let mut takes = 0;
    while game.phase() == Phase::InTurn {
        let id = current(&game);
        let outcome = game.take(&id).unwrap();
        takes += 1;
        assert_eq!(outcome.round_over, game.phase() == Phase::RoundOver);
    }
    assert_eq!(takes, 9);
    assert!(game.pile().current_card.is_none());
    assert!(game.current_player_id().is_none());
    let standings = game.last_standings().unwrap();
    assert_eq!(standings.len(), 2);
    assert!(standings[0].score <= standings[1].score);
    let winner = standings[0].player_id.clone();
    assert!(matches!(
        game.pass(&winner),
        Err(nothanks_engine::errors::GameError::NotStarted)
    ));
}

#[test]
fn random_play_preserves_cards_and_tokens() {
    for seed in 0..40u64 {
        let players = 2 + (seed as usize % 6);
        let tokens = (seed % 12) as u32;
        let mut game = table(
            seed,
            players,
            SettingsPatch {
                initial_tokens: Some(tokens),
                ..Default::default()
            },
        );
        let total_tokens = tokens * players as u32;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        while game.phase() == Phase::InTurn {
            let id = current(&game);
            if rng.random_bool(0.7) {
                game.pass(&id).unwrap();
            } else {
                game.take(&id).unwrap();
            }
            game.check_invariants().unwrap();
            let on_table: u32 =
                game.players().iter().map(|p| p.tokens()).sum::<u32>() + game.pile().tokens;
            assert_eq!(on_table, total_tokens, "seed {seed}");
        }

        let held: usize = game.players().iter().map(|p| p.held().len()).sum();
        assert_eq!(held, 24, "seed {seed}");
    }
}
