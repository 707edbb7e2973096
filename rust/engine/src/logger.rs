use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::cards::Card;
use crate::game::GameSession;
use crate::player::{PlayerId, TurnAction};
use crate::scoring::Standing;
use crate::settings::GameSettings;

/// Records a single resolved turn action.
/// A pass redirected into a take is recorded as the take it became.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Acting player
    pub player_id: PlayerId,
    /// What actually happened
    pub action: TurnAction,
    /// The face-up card at the time
    pub card: Card,
    /// Tokens on the pile before the action
    pub pile_tokens: u32,
}

/// Complete record of a round: rules, every action and the final table.
/// Serialized to JSONL for offline analysis.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Unique identifier for this round (format: YYYYMMDD-NNNNNN)
    pub round_id: String,
    /// RNG seed the deal was drawn from
    pub seed: Option<u64>,
    pub settings: GameSettings,
    /// Cards set aside at the start of the round
    pub removed: Vec<Card>,
    /// Chronological list of all actions
    pub actions: Vec<ActionRecord>,
    pub standings: Vec<Standing>,
    /// Timestamp when the round finished (RFC3339 format)
    #[serde(default)]
    pub ts: Option<String>,
}

impl RoundRecord {
    /// Record of the round `game` just finished, or `None` while one is
    /// still in progress. The id and timestamp are left for the logger.
    pub fn from_game(game: &GameSession) -> Option<Self> {
        let standings = game.last_standings()?;
        Some(Self {
            round_id: String::new(),
            seed: Some(game.seed()),
            settings: *game.settings(),
            removed: game.removed_cards().to_vec(),
            actions: game.history().to_vec(),
            standings: standings.to_vec(),
            ts: None,
        })
    }
}

pub fn format_round_id(yyyymmdd: &str, seq: u32) -> String {
    format!("{}-{:06}", yyyymmdd, seq)
}

/// Appends [`RoundRecord`]s as JSON lines, numbering them per day.
pub struct RoundLogger<W: Write> {
    out: W,
    date: String,
    seq: u32,
}

impl RoundLogger<BufWriter<File>> {
    /// Creates (or truncates) `path`, making parent directories as needed.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), &Utc::now().format("%Y%m%d").to_string()))
    }
}

impl<W: Write> RoundLogger<W> {
    pub fn new(out: W, yyyymmdd: &str) -> Self {
        Self {
            out,
            date: yyyymmdd.to_string(),
            seq: 0,
        }
    }

    /// Numbers and stamps `record`, writes it as one line and returns its id.
    pub fn append(&mut self, mut record: RoundRecord) -> io::Result<String> {
        self.seq += 1;
        record.round_id = format_round_id(&self.date, self.seq);
        if record.ts.is_none() {
            record.ts = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        serde_json::to_writer(&mut self.out, &record).map_err(io::Error::other)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(record.round_id)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Phase;
    use crate::settings::SettingsPatch;

    fn finished_round() -> GameSession {
        let mut game = GameSession::new(Some(21));
        game.add_player("a", "Ann").unwrap();
        game.add_player("b", "Bob").unwrap();
        game.start(Some(&SettingsPatch {
            removed_count: Some(20),
            ..Default::default()
        }))
        .unwrap();
        while game.phase() == Phase::InTurn {
            let id = game.current_player_id().cloned().unwrap();
            game.take(&id).unwrap();
        }
        game
    }

    #[test]
    fn no_record_before_the_round_ends() {
        let mut game = GameSession::new(Some(1));
        game.add_player("a", "Ann").unwrap();
        game.add_player("b", "Bob").unwrap();
        assert!(RoundRecord::from_game(&game).is_none());
        game.start(None).unwrap();
        assert!(RoundRecord::from_game(&game).is_none());
    }

    #[test]
    fn appends_numbered_stamped_lines() {
        let game = finished_round();
        let mut logger = RoundLogger::new(Vec::new(), "20260101");
        let record = RoundRecord::from_game(&game).unwrap();
        assert_eq!(logger.append(record.clone()).unwrap(), "20260101-000001");
        assert_eq!(logger.append(record).unwrap(), "20260101-000002");

        let text = String::from_utf8(logger.into_inner()).unwrap();
        let lines: Vec<RoundRecord> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].round_id, "20260101-000002");
        assert!(lines[0].ts.is_some());
        assert_eq!(lines[0].removed.len(), 20);
        assert_eq!(lines[0].actions.len(), 13);
        assert!(lines[0]
            .actions
            .iter()
            .all(|a| a.action == TurnAction::Take && a.pile_tokens == 0));
        assert!(text.contains("\"action\":\"take\""));
    }
}
