//! Process launching, inspection and termination.

use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use std::os::windows::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use windows::Win32::Foundation::CloseHandle;
use windows::Win32::System::Threading::{OpenProcess, TerminateProcess, PROCESS_TERMINATE};

use super::window;
use crate::platform::{GameHost, GameWindow};

const DETACHED_PROCESS: u32 = 0x0000_0008;
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

pub struct Win32GameHost;

impl Win32GameHost {
    pub fn new() -> Self {
        Self
    }
}

impl GameHost for Win32GameHost {
    fn find_window(&mut self, title: &str, class_name: Option<&str>) -> Option<GameWindow> {
        window::find_window_by_title(title, class_name)
    }

    fn bring_to_foreground(&mut self, window: &GameWindow) -> Result<()> {
        window::bring_to_foreground(window)
    }

    fn is_responding(&mut self, window: &GameWindow) -> bool {
        window::is_responding(window)
    }

    fn kill(&mut self, window: &GameWindow) -> bool {
        unsafe {
            let handle = match OpenProcess(PROCESS_TERMINATE, false, window.pid) {
                Ok(handle) => handle,
                Err(e) => {
                    warn!("Failed to open process {}: {}", window.pid, e);
                    return false;
                }
            };
            let result = TerminateProcess(handle, 1);
            let _ = CloseHandle(handle);
            match result {
                Ok(()) => true,
                Err(e) => {
                    warn!("Failed to terminate process {}: {}", window.pid, e);
                    false
                }
            }
        }
    }

    fn command_line(&mut self, pid: u32) -> Option<String> {
        let filter = format!(
            "(Get-CimInstance Win32_Process -Filter \"ProcessId = {}\").CommandLine",
            pid
        );
        let output = Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-Command", &filter])
            .creation_flags(CREATE_NO_WINDOW)
            .output();

        match output {
            Ok(output) if output.status.success() => {
                let command_line = String::from_utf8_lossy(&output.stdout).trim().to_string();
                Some(command_line).filter(|c| !c.is_empty())
            }
            Ok(output) => {
                debug!(
                    "Command line query for {} failed: {}",
                    pid,
                    String::from_utf8_lossy(&output.stderr)
                );
                None
            }
            Err(e) => {
                warn!("Failed to query command line of {}: {}", pid, e);
                None
            }
        }
    }

    fn spawn_detached(&mut self, program: &Path, args: &[String], cwd: &Path) -> Result<()> {
        Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP)
            .spawn()
            .with_context(|| format!("Failed to launch {}", program.display()))?;
        Ok(())
    }

    fn run_with_timeout(&mut self, program: &Path, args: &[&str], timeout: Duration) -> Result<()> {
        let mut child = Command::new(program)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .creation_flags(CREATE_NO_WINDOW)
            .spawn()
            .with_context(|| format!("Failed to run {}", program.display()))?;

        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                if status.success() {
                    return Ok(());
                }
                return Err(anyhow!("{} exited with {}", program.display(), status));
            }
            if start.elapsed() > timeout {
                let _ = child.kill();
                return Err(anyhow!(
                    "{} did not finish within {:?}",
                    program.display(),
                    timeout
                ));
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }
}
