//! Child process helper with a timeout and bounded output capture.

use std::io::{self, Read, Write};
use std::process::{ChildStdin, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.status.success()
    }

    pub fn stdout_text(&self) -> String {
        lossy_with_note(&self.stdout, self.stdout_truncated, "stdout")
    }

    pub fn stderr_text(&self) -> String {
        lossy_with_note(&self.stderr, self.stderr_truncated, "stderr")
    }
}

fn lossy_with_note(bytes: &[u8], truncated: usize, stream: &str) -> String {
    let mut text = String::from_utf8_lossy(bytes).into_owned();
    if truncated > 0 {
        text.push_str(&format!("\n[{stream} truncated {truncated} bytes]"));
    }
    text
}

type Capture = JoinHandle<Result<(Vec<u8>, usize)>>;

/// Run `cmd`, optionally feeding `stdin`, and wait at most `timeout`.
///
/// Input is written and both output pipes are drained on their own threads
/// while the clock runs, so a child that never reads its input or floods its
/// output is still killed on time. Bytes beyond `output_limit_bytes` are
/// counted and discarded.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs(), output_limit_bytes))]
pub fn run_command_with_timeout(
    mut cmd: Command,
    stdin: Option<&[u8]>,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    let program = cmd.get_program().to_os_string();
    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

    debug!(?program, "spawning child process");
    let mut child = cmd
        .spawn()
        .inspect_err(|err| error!(%err, ?program, "failed to spawn command"))
        .with_context(|| format!("spawn {program:?}"))?;

    let stdout = capture(child.stdout.take(), output_limit_bytes, "stdout")?;
    let stderr = capture(child.stderr.take(), output_limit_bytes, "stderr")?;
    let feeder = match stdin {
        Some(input) => {
            let pipe = child
                .stdin
                .take()
                .ok_or_else(|| anyhow!("stdin was not piped"))?;
            let input = input.to_vec();
            Some(thread::spawn(move || feed_stdin(pipe, &input)))
        }
        None => None,
    };

    let (status, timed_out) = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => (status, false),
        None => {
            warn!(?program, timeout_secs = timeout.as_secs(), "command timed out, killing");
            child.kill().context("kill command")?;
            (child.wait().context("wait command after kill")?, true)
        }
    };

    if let Some(feeder) = feeder {
        let written = feeder
            .join()
            .map_err(|_| anyhow!("stdin writer thread panicked"))?;
        if !timed_out {
            written.context("write stdin")?;
        }
    }
    let (stdout, stdout_truncated) = join_capture(stdout).context("join stdout")?;
    let (stderr, stderr_truncated) = join_capture(stderr).context("join stderr")?;

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }
    debug!(exit_code = ?status.code(), timed_out, "command finished");

    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
    })
}

fn capture<R>(pipe: Option<R>, limit: usize, stream: &str) -> Result<Capture>
where
    R: Read + Send + 'static,
{
    let pipe = pipe.ok_or_else(|| anyhow!("{stream} was not piped"))?;
    Ok(thread::spawn(move || read_stream_limited(pipe, limit)))
}

fn join_capture(handle: Capture) -> Result<(Vec<u8>, usize)> {
    handle
        .join()
        .map_err(|_| anyhow!("output reader thread panicked"))?
}

/// Write all of `input`, then close the pipe so the child sees EOF.
///
/// A child that exits without reading everything closes its end first; that
/// broken pipe is not an error.
fn feed_stdin(mut pipe: ChildStdin, input: &[u8]) -> io::Result<()> {
    match pipe.write_all(input) {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
            debug!(bytes = input.len(), "child closed stdin early");
            Ok(())
        }
        other => other,
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut kept = Vec::new();
    let mut discarded = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            return Ok((kept, discarded));
        }
        let room = limit.saturating_sub(kept.len()).min(n);
        kept.extend_from_slice(&chunk[..room]);
        discarded += n - room;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn shell(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", script]);
        cmd
    }

    #[test]
    fn limited_reader_counts_discarded_bytes() {
        let (kept, truncated) = read_stream_limited(&b"abcdefgh"[..], 3).expect("read");
        assert_eq!(kept, b"abc");
        assert_eq!(truncated, 5);
    }

    #[test]
    fn captures_stdout_of_child() {
        let mut cmd = Command::new("git");
        cmd.arg("--version");
        let output =
            run_command_with_timeout(cmd, None, Duration::from_secs(10), 1024).expect("run");
        assert!(output.success());
        assert!(output.stdout_text().starts_with("git version"));
    }

    #[test]
    fn stdin_reaches_child() {
        let output = run_command_with_timeout(
            shell("cat"),
            Some(b"plan this".as_slice()),
            Duration::from_secs(10),
            1024,
        )
        .expect("run");
        assert!(output.success());
        assert_eq!(output.stdout, b"plan this");
    }

    #[test]
    fn timeout_holds_when_child_ignores_large_stdin() {
        let input = vec![b'x'; 1024 * 1024];
        let start = Instant::now();
        let mut sleeper = Command::new("sleep");
        sleeper.arg("8");
        let output = run_command_with_timeout(
            sleeper,
            Some(input.as_slice()),
            Duration::from_secs(1),
            1024,
        )
        .expect("run");
        assert!(output.timed_out);
        assert!(!output.success());
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn child_exiting_without_reading_stdin_is_not_an_error() {
        let input = vec![b'x'; 1024 * 1024];
        let output = run_command_with_timeout(
            shell("echo done"),
            Some(input.as_slice()),
            Duration::from_secs(10),
            1024,
        )
        .expect("run");
        assert!(output.success());
        assert_eq!(output.stdout_text().trim(), "done");
    }
}
