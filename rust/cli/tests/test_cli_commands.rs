use nothanks_engine::logger::RoundRecord;
use serial_test::serial;
use std::fs;

fn run(args: &[&str]) -> (i32, String, String) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let mut argv = vec!["nothanks"];
    argv.extend_from_slice(args);
    let code = nothanks_cli::run(argv, &mut out, &mut err);
    (
        code,
        String::from_utf8(out).expect("utf8 stdout"),
        String::from_utf8(err).expect("utf8 stderr"),
    )
}

#[test]
#[serial]
fn sim_is_reproducible_for_a_seed() {
    let args = ["sim", "--games", "20", "--bots", "easy,medium,hard", "--seed", "99"];
    let (code_a, out_a, _) = run(&args);
    let (code_b, out_b, _) = run(&args);
    assert_eq!(code_a, 0);
    assert_eq!(code_b, 0);
    assert_eq!(out_a, out_b);
    assert!(out_a.contains("Rounds: 20 (seed 99, policy TieredPolicy)"));
    for seat in ["seat-1", "seat-2", "seat-3"] {
        assert!(out_a.contains(seat), "missing {seat}: {out_a}");
    }
}

#[test]
#[serial]
fn sim_writes_one_record_per_round() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("rounds").join("sim.jsonl");
    let path_str = path.to_string_lossy().into_owned();

    let (code, _, err) = run(&[
        "sim", "--games", "5", "--bots", "hard,hard", "--seed", "3", "--output", path_str.as_str(),
    ]);
    assert_eq!(code, 0, "stderr={err}");

    let contents = fs::read_to_string(&path).expect("read output");
    let records: Vec<RoundRecord> = contents
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("round record"))
        .collect();
    assert_eq!(records.len(), 5);

    for record in &records {
        assert_eq!(record.removed.len(), 9);
        assert_eq!(record.standings.len(), 2);
        let cards: usize = record.standings.iter().map(|s| s.cards.len()).sum();
        assert_eq!(cards, 24);
        let tokens: u32 = record.standings.iter().map(|s| s.tokens).sum();
        assert_eq!(tokens, 22);
        let takes = record
            .actions
            .iter()
            .filter(|a| a.action == nothanks_engine::player::TurnAction::Take)
            .count();
        assert_eq!(takes, 24);
        assert!(record.ts.is_some());
    }
    let ids: std::collections::HashSet<_> = records.iter().map(|r| &r.round_id).collect();
    assert_eq!(ids.len(), 5);
}

#[test]
#[serial]
fn sim_rejects_bad_bot_lists() {
    let (code, _, err) = run(&["sim", "--bots", "easy,grandmaster"]);
    assert_eq!(code, 2);
    assert!(err.contains("unknown bot tier `grandmaster`"), "stderr={err}");

    let (code, _, err) = run(&["sim", "--bots", "hard"]);
    assert_eq!(code, 2);
    assert!(err.contains("between 2 and 6 seats"), "stderr={err}");
}

#[test]
#[serial]
fn sim_warns_on_unknown_policy() {
    let (code, out, err) = run(&[
        "sim", "--games", "1", "--bots", "easy,easy", "--seed", "1", "--policy", "oracle",
    ]);
    assert_eq!(code, 0);
    assert!(err.contains("WARNING: unknown policy `oracle`"));
    assert!(out.contains("policy TieredPolicy"));
}

#[test]
#[serial]
fn baseline_policy_can_drive_a_sim() {
    let (code, out, _) = run(&[
        "sim", "--games", "3", "--bots", "medium,medium", "--seed", "8", "--policy", "baseline",
    ]);
    assert_eq!(code, 0);
    assert!(out.contains("policy BaselinePolicy"));
}

#[test]
#[serial]
fn deal_respects_removed_flag() {
    let (code, out, _) = run(&["deal", "--seed", "12", "--removed", "0"]);
    assert_eq!(code, 0);
    assert!(out.contains("Removed (0): -"), "{out}");
    assert!(out.contains("Deck (32):"), "{out}");
}
