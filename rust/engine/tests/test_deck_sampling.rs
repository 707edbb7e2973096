use std::collections::HashSet;

use nothanks_engine::cards::{Card, CARD_COUNT, MAX_CARD, MIN_CARD};
use nothanks_engine::deck::{build, sample_removed};
use nothanks_engine::game::GameSession;
use nothanks_engine::settings::SettingsPatch;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

#[test]
fn full_range_has_33_unique_cards() {
    let deck = build();
    assert_eq!(deck.len(), CARD_COUNT);
    let set: HashSet<Card> = deck.iter().copied().collect();
    assert_eq!(set.len(), 33);
    assert_eq!(deck.first().map(|c| c.value()), Some(MIN_CARD));
    assert_eq!(deck.last().map(|c| c.value()), Some(MAX_CARD));
}

#[test]
fn removed_nine_leaves_twentythree_after_first_card() {
    let mut game = GameSession::new(Some(2024));
    game.add_player("a", "Ann").unwrap();
    game.add_player("b", "Bob").unwrap();
    game.start(Some(&SettingsPatch {
        removed_count: Some(9),
        ..Default::default()
    }))
    .unwrap();

    assert_eq!(game.removed_count(), 9);
    assert_eq!(game.deck_size(), 23);
    assert!(game.pile().current_card.is_some());
}

#[test]
fn different_seeds_give_different_deals() {
    let mut a = ChaCha20Rng::seed_from_u64(1);
    let mut b = ChaCha20Rng::seed_from_u64(2);
    assert_ne!(
        sample_removed(build(), 9, &mut a),
        sample_removed(build(), 9, &mut b),
        "different seeds should produce different deals (high probability)"
    );
}

#[test]
fn removed_set_is_uniform_over_the_range() {
    // chi-square goodness of fit, 32 degrees of freedom, p = 0.001
    const DEALS: usize = 6_000;
    const REMOVED: usize = 9;
    const CRITICAL: f64 = 62.49;

    let mut counts = [0usize; CARD_COUNT];
    for seed in 0..DEALS as u64 {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let (_, removed) = sample_removed(build(), REMOVED, &mut rng);
        for card in removed {
            counts[card.index()] += 1;
        }
    }

    let expected = (DEALS * REMOVED) as f64 / CARD_COUNT as f64;
    let chi: f64 = counts
        .iter()
        .map(|&o| {
            let d = o as f64 - expected;
            d * d / expected
        })
        .sum();
    assert!(chi < CRITICAL, "chi-square {chi:.2} over {CRITICAL}: {counts:?}");
}

#[test]
fn first_face_up_card_is_never_a_removed_card() {
    for seed in 0..200 {
        let mut game = GameSession::new(Some(seed));
        game.add_player("a", "Ann").unwrap();
        game.add_player("b", "Bob").unwrap();
        game.start(None).unwrap();
        let face_up = game.pile().current_card.unwrap();
        assert!(!game.removed_cards().contains(&face_up));
        assert!(!game.undrawn_cards().contains(&face_up));
    }
}
