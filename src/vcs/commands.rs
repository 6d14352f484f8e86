use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use super::error::{VcsError, NO_REPO_SIGNATURE};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Thin wrapper around the jj executable for one working directory.
/// Every invocation is a blocking round-trip under a bounded timeout.
pub struct JjCli {
    workdir: PathBuf,
    bin: String,
    timeout: Duration,
}

impl JjCli {
    pub fn new(workdir: &Path, bin: &str, timeout: Duration) -> Self {
        Self {
            workdir: workdir.to_path_buf(),
            bin: bin.to_string(),
            timeout,
        }
    }

    /// Resolve the repository root. Run once per document open.
    pub fn root(&self) -> Result<PathBuf, VcsError> {
        let output = self.run(&["root"])?;
        let root = output.lines().next().unwrap_or("").trim();
        if root.is_empty() {
            return Err(VcsError::CommandFailed {
                command: "root".to_string(),
                stderr: "empty output".to_string(),
            });
        }
        Ok(PathBuf::from(root))
    }

    pub fn status(&self) -> Result<String, VcsError> {
        self.run(&["status", "--color=always"])
    }

    pub fn diff(&self, tool: &str) -> Result<String, VcsError> {
        self.run(&["diff", "--color=always", "--tool", tool])
    }

    fn run(&self, args: &[&str]) -> Result<String, VcsError> {
        let command = args.first().copied().unwrap_or_default().to_string();
        log::debug!(
            "running {} {} in {}",
            self.bin,
            args.join(" "),
            self.workdir.display()
        );

        let mut child = Command::new(&self.bin)
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| VcsError::Spawn {
                command: command.clone(),
                source,
            })?;

        // Drain both pipes on threads so a large diff cannot fill a pipe
        // buffer and wedge the poll loop below.
        let stdout_pipe = child.stdout.take();
        let stdout_reader = std::thread::spawn(move || read_pipe(stdout_pipe));
        let stderr_pipe = child.stderr.take();
        let stderr_reader = std::thread::spawn(move || read_pipe(stderr_pipe));

        let status = self.wait_with_timeout(&mut child, &command)?;
        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();

        classify(&command, status.success(), stdout, stderr)
    }

    /// Poll the child until exit or the configured deadline; on expiry the
    /// child is killed and the invocation reports TimedOut.
    fn wait_with_timeout(&self, child: &mut Child, command: &str) -> Result<ExitStatus, VcsError> {
        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {
                    if start.elapsed() >= self.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        log::warn!("jj {command} timed out after {:?}", self.timeout);
                        return Err(VcsError::TimedOut {
                            command: command.to_string(),
                            timeout_secs: self.timeout.as_secs(),
                        });
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(source) => {
                    return Err(VcsError::Spawn {
                        command: command.to_string(),
                        source,
                    })
                }
            }
        }
    }
}

fn read_pipe(pipe: Option<impl Read>) -> String {
    let mut text = String::new();
    if let Some(mut pipe) = pipe {
        let mut bytes = Vec::new();
        if pipe.read_to_end(&mut bytes).is_ok() {
            text = String::from_utf8_lossy(&bytes).to_string();
        }
    }
    text
}

/// Map an exit outcome onto the error taxonomy. The no-repository signature
/// is checked first; any other failure carries stderr verbatim.
fn classify(
    command: &str,
    success: bool,
    stdout: String,
    stderr: String,
) -> Result<String, VcsError> {
    if success {
        return Ok(stdout);
    }
    if stderr.contains(NO_REPO_SIGNATURE) {
        return Err(VcsError::NotARepository);
    }
    Err(VcsError::CommandFailed {
        command: command.to_string(),
        stderr,
    })
}
