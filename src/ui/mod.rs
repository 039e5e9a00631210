//! Terminal user interface

mod cli;
pub mod keys;
mod status;
mod terminal;

pub use cli::{Args, Cli};
pub use keys::KeyAction;
pub use status::{render_status, Banner, BANNER_DISPLAY, KEY_HELP};
pub use terminal::{run_interactive, RawModeGuard};
