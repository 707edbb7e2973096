//! `cfg`: prints the resolved configuration as JSON, each value paired with
//! its source (`default`, `file` or `env`).

use crate::config;
use crate::error::CliError;
use crate::ui;
use std::io::Write;

pub fn handle_cfg_command(out: &mut dyn Write, err: &mut dyn Write) -> Result<(), CliError> {
    let resolved = match config::load_with_sources() {
        Ok(r) => r,
        Err(e) => {
            ui::write_error(err, &format!("Invalid configuration: {}", e))?;
            return Err(CliError::Config(format!("Invalid configuration: {}", e)));
        }
    };

    let config::ConfigResolved { config, sources } = resolved;
    let display = serde_json::json!({
        "seed": {
            "value": config.seed,
            "source": sources.seed,
        },
        "removed_count": {
            "value": config.removed_count,
            "source": sources.removed_count,
        },
        "initial_tokens": {
            "value": config.initial_tokens,
            "source": sources.initial_tokens,
        },
        "turn_time_limit_seconds": {
            "value": config.turn_time_limit_seconds,
            "source": sources.turn_time_limit_seconds,
        },
        "show_opponent_tokens": {
            "value": config.show_opponent_tokens,
            "source": sources.show_opponent_tokens,
        }
    });
    let json_str = serde_json::to_string_pretty(&display).map_err(std::io::Error::other)?;
    writeln!(out, "{}", json_str)?;
    Ok(())
}
