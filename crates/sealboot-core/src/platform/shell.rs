use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Build a `sh -c` command for a script line.
pub fn command_for_script(script: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(script);
    cmd
}

/// Run a shell script with a timeout, letting its output flow to our own
/// stdout/stderr so it lands in the boot log. The child is killed if it does
/// not finish in time.
pub fn run_script_with_timeout(script: &str, timeout: Duration) -> std::io::Result<ExitStatus> {
    let mut child = command_for_script(script)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()?;

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("command timed out after {} seconds", timeout.as_secs()),
            ));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}
