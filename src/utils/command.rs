//! External process execution with incrementally streamed output.

use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use tracing::info;

/// Run a program to completion, logging every output line as it arrives.
///
/// stdout and stderr are both piped and drained line-by-line (stderr on a
/// helper thread), merged into the same log stream under the given target.
/// Draining incrementally matters: a child that fills an undrained pipe
/// would deadlock against our blocking `wait`.
pub fn run_streamed(program: &Path, args: &[String], target: &str) -> io::Result<ExitStatus> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stderr_drain = child.stderr.take().map(|stderr| {
        let target = target.to_string();
        std::thread::spawn(move || {
            for line in BufReader::new(stderr).lines().map_while(io::Result::ok) {
                info!(source = %target, "{}", line.trim_end());
            }
        })
    });

    if let Some(stdout) = child.stdout.take() {
        for line in BufReader::new(stdout).lines().map_while(io::Result::ok) {
            info!(source = %target, "{}", line.trim_end());
        }
    }

    if let Some(handle) = stderr_drain {
        let _ = handle.join();
    }

    child.wait()
}
