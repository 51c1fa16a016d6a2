//! CLI command handlers, one file per command.

mod common;
mod completions;
mod plan;
mod run;
mod status;

pub use common::{load_config, Overrides};
pub use completions::{run_completions, run_manpage};
pub use plan::run_plan;
pub use run::run_batch;
pub use status::run_status;
