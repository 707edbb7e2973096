//! Command handlers, one module per subcommand.
//!
//! Each handler takes its parsed arguments plus the output streams
//! (`&mut dyn Write`) and returns `Result<(), CliError>`.

mod cfg;
mod deal;
mod sim;

pub use cfg::handle_cfg_command;
pub use deal::handle_deal_command;
pub use sim::{SimOptions, handle_sim_command};
