use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

/// Append-only, timestamped record of every task invocation in one run.
///
/// Write failures are swallowed: losing a log line never aborts a task.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    file: File,
}

impl RunLog {
    /// New log file named after the current time inside `dir`.
    pub fn create(dir: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let name = format!(
            "cursor-acp-install-{}.log",
            Local::now().format("%Y%m%d-%H%M%S")
        );
        Self::open(dir.join(name))
    }

    pub fn open(path: PathBuf) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn running(&mut self, command: &str) {
        self.line(&format!("[{}] Running: {command}", timestamp()));
    }

    pub fn output(&mut self, output: &str) {
        if !output.is_empty() {
            self.line(output.trim_end_matches('\n'));
        }
    }

    pub fn success(&mut self) {
        self.line(&format!("[{}] Success\n", timestamp()));
    }

    pub fn error(&mut self, cause: &str) {
        self.line(&format!("[{}] Error: {cause}\n", timestamp()));
    }

    pub fn skipped(&mut self, task: &str, reason: &str) {
        self.line(&format!("[{}] Skipped: {task} ({reason})\n", timestamp()));
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.file, "{text}");
        let _ = self.file.flush();
    }
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
