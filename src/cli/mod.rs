mod args;

pub use args::{Cli, Commands, ConfigAction};
