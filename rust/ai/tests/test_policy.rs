use std::collections::BTreeSet;

use nothanks_ai::context::{DecisionContext, OpponentView};
use nothanks_ai::params::{Difficulty, PolicyParams, Tracking};
use nothanks_ai::policy::{Stage, TieredPolicy};
use nothanks_ai::{Decision, DecisionPolicy, create_policy, decide_for};
use nothanks_engine::cards::{Card, MAX_CARD, MIN_CARD};
use nothanks_engine::game::{GameSession, Phase};
use nothanks_engine::settings::SettingsPatch;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_hand(rng: &mut ChaCha8Rng, exclude: Card) -> BTreeSet<Card> {
    let n = rng.random_range(0..8);
    (0..n)
        .filter_map(|_| Card::new(rng.random_range(MIN_CARD..=MAX_CARD)))
        .filter(|c| *c != exclude)
        .collect()
}

#[test]
fn dominant_gain_is_always_taken() {
    let policy = TieredPolicy::new();
    let mut rng = ChaCha8Rng::seed_from_u64(2718);
    let mut checked = 0;

    for _ in 0..3_000 {
        let card = Card::new(rng.random_range(MIN_CARD..=MAX_CARD)).unwrap();
        let held = random_hand(&mut rng, card);
        let pile = rng.random_range(0..40);
        let ctx = DecisionContext {
            current_card: Some(card),
            tokens_on_pile: pile,
            deck_size: rng.random_range(0..24),
            removed_count: 9,
            my_tokens: rng.random_range(1..20),
            my_held: held.clone(),
            opponents: vec![OpponentView {
                id: "o".into(),
                held: random_hand(&mut rng, card),
                tokens: None,
            }],
        };
        for difficulty in Difficulty::ALL {
            let params = PolicyParams {
                difficulty,
                seed: rng.random(),
                tracking: Tracking::Leader,
            };
            let e = policy.evaluate(&ctx, &params).unwrap();
            if e.net_cost < 0 {
                checked += 1;
                assert_eq!(e.decision, Decision::Take, "{ctx:?} {params:?}");
                assert_eq!(e.stage, Stage::Dominant);
            }
        }
    }
    assert!(checked > 100, "only {checked} dominant situations sampled");
}

#[test]
fn opponent_stash_is_hidden_from_bots() {
    let table = |show: bool| {
        let mut game = GameSession::new(Some(77));
        game.add_player("h", "Human").unwrap();
        game.add_computer(
            "bot-1",
            "Robo",
            PolicyParams::new(Difficulty::Hard, 3).to_value(),
        )
        .unwrap();
        game.start(Some(&SettingsPatch {
            show_opponent_tokens: Some(show),
            ..Default::default()
        }))
        .unwrap();
        game
    };

    let hidden = DecisionContext::observe(&table(false), "bot-1").unwrap();
    assert!(hidden.opponents.iter().all(|o| o.tokens.is_none()));
    assert_eq!(hidden.my_tokens, 11);

    let shown = DecisionContext::observe(&table(true), "bot-1").unwrap();
    assert_eq!(shown.opponents[0].tokens, Some(11));
}

#[test]
fn bots_finish_whole_rounds() {
    for seed in 0..20u64 {
        let mut game = GameSession::new(Some(seed));
        for (i, difficulty) in Difficulty::ALL.iter().enumerate() {
            let params = PolicyParams::new(*difficulty, seed * 10 + i as u64).to_value();
            game.add_computer(format!("bot-{i}"), &format!("Bot {i}"), params)
                .unwrap();
        }
        game.start(None).unwrap();

        let policy = create_policy("tiered");
        let mut turns = 0;
        while game.phase() == Phase::InTurn {
            let id = game.current_player_id().unwrap().clone();
            let decision = decide_for(policy.as_ref(), &game, &id);
            match decision {
                Decision::Take => game.take(&id).unwrap(),
                Decision::Defer => game.pass(&id).unwrap(),
            };
            turns += 1;
            assert!(turns < 2_000, "seed {seed} did not terminate");
        }
        game.check_invariants().unwrap();
        assert_eq!(game.last_standings().unwrap().len(), 3);
    }
}

#[test]
fn unknown_seat_falls_back_safely() {
    let mut game = GameSession::new(Some(1));
    game.add_player("a", "Ann").unwrap();
    game.add_player("b", "Bob").unwrap();
    game.start(None).unwrap();
    let policy = create_policy("baseline");
    assert_eq!(decide_for(policy.as_ref(), &game, "ghost"), Decision::Defer);
}

#[test]
fn policy_params_are_read_from_the_seat() {
    let mut game = GameSession::new(Some(5));
    game.add_player("h", "Human").unwrap();
    game.add_computer("bot-1", "Robo", serde_json::json!({"difficulty": "bogus"}))
        .unwrap();
    game.start(Some(&SettingsPatch {
        initial_tokens: Some(3),
        ..Default::default()
    }))
    .unwrap();
    // malformed params never escape: the bot defers while it has tokens
    let ctx = DecisionContext::observe(&game, "bot-1").unwrap();
    let blob = game.player("bot-1").unwrap().policy_params().unwrap().clone();
    assert!(TieredPolicy::new().evaluate_blob(&ctx, &blob).is_err());
    let decision = TieredPolicy::new().decide(&ctx, &blob);
    assert_eq!(decision, Decision::Defer);
}
