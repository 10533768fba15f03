//! Host process runner
//!
//! Spawns the command directly on the host in its own process group, feeds
//! stdin, captures stdout and stderr concurrently, and enforces the deadline
//! by SIGKILLing the whole group.

use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::process::{ProcessCommand, ProcessOutcome, ProcessRunner};

/// How long stream readers may keep draining after the process is gone
pub const DEFAULT_DRAIN_GRACE: Duration = Duration::from_millis(500);

const READ_CHUNK: usize = 8192;

/// Runs commands as plain host processes
#[derive(Debug, Clone, Copy)]
pub struct LocalProcessRunner {
    drain_grace: Duration,
}

impl LocalProcessRunner {
    pub fn new() -> Self {
        Self {
            drain_grace: DEFAULT_DRAIN_GRACE,
        }
    }
}

impl Default for LocalProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessRunner for LocalProcessRunner {
    #[instrument(skip(self, command), fields(program = command.argv().first().map(String::as_str)))]
    async fn run(&self, command: &ProcessCommand) -> ProcessOutcome {
        let start = Instant::now();

        let Some((program, args)) = command.argv().split_first() else {
            return ProcessOutcome::spawn_failure("empty command", start.elapsed());
        };

        let mut child = match Command::new(program)
            .args(args)
            .current_dir(command.working_dir())
            .env_clear()
            .envs(command.env_vars())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                debug!(error = %e, "failed to spawn process");
                return ProcessOutcome::spawn_failure(e.to_string(), start.elapsed());
            }
        };

        // With process_group(0) the group id is the leader's pid.
        let pgid = child.id().and_then(|id| i32::try_from(id).ok());

        if let Some(mut stdin) = child.stdin.take() {
            let data = command.stdin().to_vec();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&data).await
                    && e.kind() != io::ErrorKind::BrokenPipe
                {
                    debug!(error = %e, "failed to write stdin");
                }
                // Dropping stdin closes the pipe and signals EOF.
            });
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let cap = command.max_output();
        let stdout_task = child
            .stdout
            .take()
            .map(|out| tokio::spawn(read_capped(out, cap, stop_rx.clone())));
        let stderr_task = child
            .stderr
            .take()
            .map(|err| tokio::spawn(read_capped(err, cap, stop_rx)));

        let (status, timed_out) = match command.timeout() {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => (status, false),
                Err(_) => {
                    debug!(?limit, "deadline expired, killing process group");
                    kill_process_group(pgid);
                    let _ = child.start_kill();
                    (child.wait().await, true)
                }
            },
            None => (child.wait().await, false),
        };
        let wall_time = start.elapsed();

        // Reap anything the leader left running in its group. A pgid is not
        // recycled while any member survives; once the group is empty the
        // kill reports ESRCH unless the id was reused in between.
        if !timed_out {
            kill_process_group(pgid);
        }

        let collect = async {
            let stdout = join_reader(stdout_task).await;
            let stderr = join_reader(stderr_task).await;
            (stdout, stderr)
        };
        tokio::pin!(collect);
        let (stdout, stderr) = tokio::select! {
            captured = &mut collect => captured,
            _ = tokio::time::sleep(self.drain_grace) => {
                debug!("output still open after drain grace, stopping readers");
                let _ = stop_tx.send(true);
                collect.await
            }
        };

        let mut outcome = ProcessOutcome {
            wall_time,
            timed_out,
            output_truncated: stdout.truncated || stderr.truncated,
            stdout: stdout.bytes,
            stderr: stderr.bytes,
            ..Default::default()
        };

        match status {
            Ok(status) => {
                outcome.exit_code = status.code();
                outcome.signal = status.signal();
            }
            Err(e) => {
                warn!(error = %e, "failed to wait for process");
                outcome.spawn_error = Some(format!("failed to wait for process: {e}"));
            }
        }

        debug!(
            exit_code = ?outcome.exit_code,
            signal = ?outcome.signal,
            timed_out,
            wall_time_ms = wall_time.as_millis() as u64,
            truncated = outcome.output_truncated,
            "process finished"
        );

        outcome
    }
}

/// Bytes read from one stream
#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    truncated: bool,
}

impl Captured {
    fn push(&mut self, chunk: &[u8], cap: Option<usize>) {
        let room = match cap {
            Some(cap) => cap.saturating_sub(self.bytes.len()),
            None => chunk.len(),
        };
        if chunk.len() > room {
            self.truncated = true;
        }
        self.bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }
}

/// Read a stream to EOF, keeping at most `cap` bytes
///
/// Bytes past the cap are still read and thrown away so the writer never
/// blocks on a full pipe.
async fn read_capped<R>(mut reader: R, cap: Option<usize>, mut stop: watch::Receiver<bool>) -> Captured
where
    R: AsyncRead + Unpin,
{
    let mut captured = Captured::default();
    let mut buf = [0u8; READ_CHUNK];
    loop {
        let n = tokio::select! {
            res = reader.read(&mut buf) => match res {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            },
            _ = stop.changed() => break,
        };
        captured.push(&buf[..n], cap);
    }
    captured
}

async fn join_reader(task: Option<tokio::task::JoinHandle<Captured>>) -> Captured {
    match task {
        Some(task) => task.await.unwrap_or_default(),
        None => Captured::default(),
    }
}

/// SIGKILL every process in the group led by `pgid`
fn kill_process_group(pgid: Option<i32>) {
    // pgid 0 or 1 would target our own group or init.
    let Some(pgid) = pgid.filter(|&pgid| pgid > 1) else {
        return;
    };

    // SAFETY: kill(2) takes plain integers and has no memory-safety preconditions.
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            warn!(pgid, error = %err, "failed to kill process group");
        }
    }
}
