//! CLI command handlers. Each command is in its own file.

mod checksum;
mod completions;
mod extract;
mod fetch;
mod list;
mod probe;
mod verify;

pub use checksum::run_checksum;
pub use completions::run_completions;
pub use extract::run_extract;
pub use fetch::run_fetch;
pub(crate) use fetch::{build_options, resolve_pin};
pub use list::run_list;
pub use probe::run_probe;
pub use verify::run_verify;
