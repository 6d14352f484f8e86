use thiserror::Error;

/// Fixed phrase jj prints when invoked outside a repository.
/// Matched case-sensitively as a substring of stderr.
pub const NO_REPO_SIGNATURE: &str = "There is no jj repo in";

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("not inside a jj repository")]
    NotARepository,

    /// Non-zero exit that is not the no-repository case; stderr verbatim.
    #[error("jj {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("jj {command} did not finish within {timeout_secs}s")]
    TimedOut { command: String, timeout_secs: u64 },

    #[error("failed to run jj {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}
