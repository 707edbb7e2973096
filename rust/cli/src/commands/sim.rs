//! `sim`: plays complete all-bot rounds offline through the turn engine and
//! the decision policy, then reports wins and mean scores per seat.
//!
//! With `--output`, every round is appended as one JSON line
//! ([`RoundRecord`]) for later analysis.

use crate::config;
use crate::error::CliError;
use crate::ui;
use nothanks_ai::params::{Difficulty, PolicyParams};
use nothanks_ai::{create_policy, decide_for, DecisionPolicy};
use nothanks_engine::game::{GameSession, Phase, MAX_BOTS, MIN_PLAYERS};
use nothanks_engine::logger::{RoundLogger, RoundRecord};
use nothanks_engine::player::TurnAction;
use nothanks_engine::settings::{GameSettings, SettingsPatch};
use std::io::Write;
use std::str::FromStr;

const KNOWN_POLICIES: &[&str] = &["tiered", "baseline"];

#[derive(Debug, Clone)]
pub struct SimOptions {
    pub games: u32,
    pub bots: String,
    pub seed: Option<u64>,
    pub output: Option<String>,
    pub policy: String,
}

#[derive(Debug, Clone)]
struct SeatTally {
    id: String,
    difficulty: Difficulty,
    wins: u32,
    total_score: i64,
}

pub fn handle_sim_command(
    opts: SimOptions,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    if opts.games == 0 {
        ui::write_error(err, "games must be >= 1")?;
        return Err(CliError::InvalidInput("games must be >= 1".to_string()));
    }

    let tiers = match parse_bots(&opts.bots) {
        Ok(tiers) => tiers,
        Err(msg) => {
            ui::write_error(err, &msg)?;
            return Err(CliError::InvalidInput(msg));
        }
    };

    if !KNOWN_POLICIES.contains(&opts.policy.as_str()) {
        ui::display_warning(
            err,
            &format!("unknown policy `{}`, using tiered", opts.policy),
        )?;
    }
    let policy = create_policy(&opts.policy);

    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::write_error(err, &format!("Invalid configuration: {}", e))?;
            return Err(CliError::Config(e.to_string()));
        }
    };
    let rules = cfg.game_settings();
    let base_seed = opts.seed.or(cfg.seed).unwrap_or_else(rand::random);

    let mut logger = match opts.output.as_deref() {
        Some(path) => Some(RoundLogger::create(path)?),
        None => None,
    };

    let mut tallies: Vec<SeatTally> = tiers
        .iter()
        .enumerate()
        .map(|(seat, &difficulty)| SeatTally {
            id: seat_id(seat),
            difficulty,
            wins: 0,
            total_score: 0,
        })
        .collect();

    for round in 0..opts.games {
        let round_seed = base_seed.wrapping_add(u64::from(round));
        let game = play_round(policy.as_ref(), &tiers, &rules, round_seed)?;
        let standings = game
            .last_standings()
            .ok_or_else(|| CliError::Engine("round ended without standings".to_string()))?;

        for standing in standings {
            if let Some(tally) = tallies.iter_mut().find(|t| t.id == standing.player_id) {
                tally.total_score += i64::from(standing.score);
                if standing.rank == 1 {
                    tally.wins += 1;
                }
            }
        }

        if let Some(logger) = logger.as_mut() {
            let record = RoundRecord::from_game(&game)
                .ok_or_else(|| CliError::Engine("round ended without standings".to_string()))?;
            logger.append(record)?;
        }
    }

    writeln!(
        out,
        "Rounds: {} (seed {}, policy {})",
        opts.games,
        base_seed,
        policy.name()
    )?;
    writeln!(out, "{:<8} {:<8} {:>6} {:>7} {:>10}", "seat", "tier", "wins", "win%", "mean")?;
    for tally in &tallies {
        let games = f64::from(opts.games);
        writeln!(
            out,
            "{:<8} {:<8} {:>6} {:>6.1}% {:>10.2}",
            tally.id,
            tally.difficulty,
            tally.wins,
            f64::from(tally.wins) * 100.0 / games,
            tally.total_score as f64 / games
        )?;
    }
    Ok(())
}

fn parse_bots(list: &str) -> Result<Vec<Difficulty>, String> {
    let tiers = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Difficulty::from_str(s).map_err(|_| format!("unknown bot tier `{}`", s)))
        .collect::<Result<Vec<_>, _>>()?;
    if !(MIN_PLAYERS..=MAX_BOTS).contains(&tiers.len()) {
        return Err(format!(
            "bots must name between {} and {} seats, got {}",
            MIN_PLAYERS,
            MAX_BOTS,
            tiers.len()
        ));
    }
    Ok(tiers)
}

fn seat_id(seat: usize) -> String {
    format!("seat-{}", seat + 1)
}

fn play_round(
    policy: &dyn DecisionPolicy,
    tiers: &[Difficulty],
    rules: &GameSettings,
    seed: u64,
) -> Result<GameSession, CliError> {
    let mut game = GameSession::new(Some(seed));
    for (seat, &difficulty) in tiers.iter().enumerate() {
        let bot_seed = seed.rotate_left(17) ^ (seat as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        game.add_computer(
            seat_id(seat),
            &format!("{} {}", difficulty, seat + 1),
            PolicyParams::new(difficulty, bot_seed).to_value(),
        )?;
    }
    game.start(Some(&SettingsPatch {
        removed_count: Some(rules.removed_count),
        initial_tokens: Some(rules.initial_tokens),
        turn_time_limit_seconds: Some(rules.turn_time_limit_seconds),
        show_opponent_tokens: Some(rules.show_opponent_tokens),
        show_real_time_score: Some(rules.show_real_time_score),
    }))?;

    while game.phase() == Phase::InTurn {
        let id = game
            .current_player_id()
            .cloned()
            .ok_or_else(|| CliError::Engine("no player to act".to_string()))?;
        match decide_for(policy, &game, &id).action() {
            TurnAction::Pass => game.pass(&id)?,
            TurnAction::Take => game.take(&id)?,
        };
    }
    Ok(game)
}
