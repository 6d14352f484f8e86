mod commands;
mod error;

pub use commands::JjCli;
pub use error::VcsError;
