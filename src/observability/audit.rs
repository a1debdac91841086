//! Audit Logging
//!
//! - Every login, failed login, upload, download, view and delete is recorded
//! - One line per event, appended to a single file; never rewritten or pruned
//! - Appends are serialized, so concurrent requests never interleave lines
//! - Audit failures are logged and swallowed: the triggering request still
//!   completes (availability over audit completeness)
//!
//! Line format:
//!
//! ```text
//! 2026-10-18T09:14:02.113Z - upload by alice on file 1760778842113-report.pdf
//! ```
//!
//! With the hash chain enabled each line additionally ends in ` #<sha256>`,
//! the digest of the previous line's digest followed by this line's body.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

/// Audit action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Login,
    FailedLogin,
    Upload,
    Download,
    Delete,
    View,
}

impl AuditAction {
    /// Returns the action name string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "login",
            AuditAction::FailedLogin => "failed-login",
            AuditAction::Upload => "upload",
            AuditAction::Download => "download",
            AuditAction::Delete => "delete",
            AuditAction::View => "view",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single audit entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    /// Verified user id, or the attempted username for failed logins
    pub actor: String,
    pub filename: Option<String>,
}

impl AuditEntry {
    /// Create a new entry stamped now.
    pub fn new(action: AuditAction, actor: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            action,
            actor: actor.into(),
            filename: None,
        }
    }

    /// Set the target file.
    pub fn with_file(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Render as one log line (without newline).
    ///
    /// Caller-controlled text is escaped so an entry can never span lines.
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "{} - {} by {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.action,
            escape_field(&self.actor)
        );
        if let Some(ref name) = self.filename {
            line.push_str(" on file ");
            line.push_str(&escape_field(name));
        }
        line
    }
}

/// Escape backslashes and control characters.
fn escape_field(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{{{:04x}}}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

fn chain_digest(previous: Option<&str>, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(previous.unwrap_or("").as_bytes());
    hasher.update(body.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Audit log trait.
pub trait AuditLog: Send + Sync {
    /// Append an entry. The line is visible once this returns `Ok`.
    fn append(&self, entry: &AuditEntry) -> io::Result<()>;
}

struct OpenLog {
    writer: BufWriter<File>,
    last_digest: Option<String>,
}

/// File-based audit log.
///
/// The file and its parent directory are created on the first append.
pub struct FileAuditLog {
    path: PathBuf,
    hash_chain: bool,
    state: Mutex<Option<OpenLog>>,
}

impl FileAuditLog {
    /// Audit log at `path`; nothing is touched until the first append.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            hash_chain: false,
            state: Mutex::new(None),
        }
    }

    /// Enable or disable the hash chain suffix.
    pub fn with_hash_chain(mut self, enabled: bool) -> Self {
        self.hash_chain = enabled;
        self
    }

    /// Get the audit log path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> io::Result<OpenLog> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let last_digest = if self.hash_chain {
            last_chain_digest(&self.path)?
        } else {
            None
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        Ok(OpenLog {
            writer: BufWriter::new(file),
            last_digest,
        })
    }
}

impl AuditLog for FileAuditLog {
    fn append(&self, entry: &AuditEntry) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "audit log lock poisoned"))?;

        if state.is_none() {
            *state = Some(self.open()?);
        }
        let log = match state.as_mut() {
            Some(log) => log,
            None => return Err(io::Error::new(io::ErrorKind::Other, "audit log not open")),
        };

        let body = entry.to_line();
        let (line, digest) = if self.hash_chain {
            let digest = chain_digest(log.last_digest.as_deref(), &body);
            (format!("{} #{}\n", body, digest), Some(digest))
        } else {
            (format!("{}\n", body), None)
        };

        let written = log
            .writer
            .write_all(line.as_bytes())
            .and_then(|()| log.writer.flush());
        if let Err(e) = written {
            // Drop unflushed bytes; the next append reopens and re-reads the chain tail.
            if let Some(failed) = state.take() {
                let _ = failed.writer.into_parts();
            }
            return Err(e);
        }

        if digest.is_some() {
            log.last_digest = digest;
        }
        Ok(())
    }
}

/// Digest on the last line of an existing chained log.
fn last_chain_digest(path: &Path) -> io::Result<Option<String>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut last = None;
    for line in BufReader::new(file).lines() {
        let line = line?;
        if let Some((_, digest)) = line.rsplit_once(" #") {
            last = Some(digest.to_string());
        }
    }
    Ok(last)
}

/// Result of checking a chained audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainVerification {
    /// Every line carries the expected digest.
    Intact { lines: usize },
    /// First line (1-based) whose digest does not match.
    Broken { line: usize },
}

/// Recompute the hash chain of the log at `path`.
pub fn verify_chain(path: &Path) -> io::Result<ChainVerification> {
    let reader = BufReader::new(File::open(path)?);
    let mut previous: Option<String> = None;
    let mut count = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let Some((body, digest)) = line.rsplit_once(" #") else {
            return Ok(ChainVerification::Broken { line: index + 1 });
        };
        if chain_digest(previous.as_deref(), body) != digest {
            return Ok(ChainVerification::Broken { line: index + 1 });
        }
        previous = Some(digest.to_string());
        count += 1;
    }

    Ok(ChainVerification::Intact { lines: count })
}

/// In-memory audit log for testing.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl MemoryAuditLog {
    /// Create a new in-memory audit log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded entries.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditLog for MemoryAuditLog {
    fn append(&self, entry: &AuditEntry) -> io::Result<()> {
        self.entries
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "audit log lock poisoned"))?
            .push(entry.clone());
        Ok(())
    }
}

/// Records security-relevant actions; never fails the caller.
#[derive(Clone)]
pub struct AuditRecorder {
    log: Arc<dyn AuditLog>,
}

impl AuditRecorder {
    pub fn new(log: Arc<dyn AuditLog>) -> Self {
        Self { log }
    }

    /// Append one entry. Write errors are logged, not returned.
    pub fn record(&self, action: AuditAction, filename: Option<&str>, actor: &str) {
        let mut entry = AuditEntry::new(action, actor);
        if let Some(name) = filename {
            entry = entry.with_file(name);
        }

        if let Err(e) = self.log.append(&entry) {
            tracing::error!(
                error = %e,
                action = %action,
                actor,
                "audit write failed; continuing"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn test_entry_line_format() {
        let entry = AuditEntry::new(AuditAction::Upload, "alice").with_file("1-report.pdf");
        let line = entry.to_line();

        assert!(line.ends_with(" - upload by alice on file 1-report.pdf"));
        assert!(line.starts_with(&entry.timestamp.format("%Y-%m-%dT").to_string()));
        assert!(line.contains('Z'));
    }

    #[test]
    fn test_entry_without_file() {
        let line = AuditEntry::new(AuditAction::FailedLogin, "mallory").to_line();
        assert!(line.ends_with(" - failed-login by mallory"));
        assert!(!line.contains("on file"));
    }

    #[test]
    fn test_forged_newline_is_escaped() {
        let actor = "x\n2026-01-01T00:00:00.000Z - login by admin";
        let line = AuditEntry::new(AuditAction::FailedLogin, actor).to_line();
        assert!(!line.contains('\n'));
        assert!(line.contains("x\\n2026"));
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("hello"), "hello");
        assert_eq!(escape_field("a\\b"), "a\\\\b");
        assert_eq!(escape_field("line\nbreak"), "line\\nbreak");
        assert_eq!(escape_field("bell\u{7}"), "bell\\u{0007}");
    }

    #[test]
    fn test_memory_audit_log() {
        let log = Arc::new(MemoryAuditLog::new());
        let recorder = AuditRecorder::new(log.clone());

        recorder.record(AuditAction::Login, None, "alice");
        recorder.record(AuditAction::Delete, Some("1-a.txt"), "alice");

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, AuditAction::Login);
        assert_eq!(entries[1].filename.as_deref(), Some("1-a.txt"));
    }

    #[test]
    fn test_file_audit_log_creates_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs/nested/audit.log");

        let log = FileAuditLog::new(&path);
        assert!(!path.exists());

        log.append(&AuditEntry::new(AuditAction::View, "alice").with_file("1-a.txt"))
            .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.ends_with(" - view by alice on file 1-a.txt\n"));
    }

    #[test]
    fn test_file_audit_log_appends_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.log");

        FileAuditLog::new(&path)
            .append(&AuditEntry::new(AuditAction::Login, "alice"))
            .unwrap();
        FileAuditLog::new(&path)
            .append(&AuditEntry::new(AuditAction::Login, "bob"))
            .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("login by alice"));
        assert!(lines[1].ends_with("login by bob"));
    }

    #[test]
    fn test_concurrent_appends_never_interleave() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let recorder = AuditRecorder::new(Arc::new(FileAuditLog::new(&path)));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let recorder = recorder.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        let name = format!("{}-{}.bin", t, i);
                        recorder.record(AuditAction::Upload, Some(&name), &format!("user{}", t));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 400);
        for line in lines {
            assert!(line.contains(" - upload by user"), "mangled line: {}", line);
            assert!(line.ends_with(".bin"), "mangled line: {}", line);
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_flush_discards_buffered_line() {
        let log = FileAuditLog::new("/dev/full");

        assert!(log
            .append(&AuditEntry::new(AuditAction::Login, "alice"))
            .is_err());
        assert!(log.state.lock().unwrap().is_none());
    }

    #[test]
    fn test_chain_survives_reopen_after_reset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let log = FileAuditLog::new(&path).with_hash_chain(true);

        log.append(&AuditEntry::new(AuditAction::Login, "alice")).unwrap();
        *log.state.lock().unwrap() = None;
        log.append(&AuditEntry::new(AuditAction::View, "alice").with_file("1-a.txt"))
            .unwrap();

        assert_eq!(
            verify_chain(&path).unwrap(),
            ChainVerification::Intact { lines: 2 }
        );
    }

    #[test]
    fn test_unwritable_log_fails_open() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"file").unwrap();
        let log = FileAuditLog::new(blocker.join("audit.log"));

        assert!(log
            .append(&AuditEntry::new(AuditAction::Login, "alice"))
            .is_err());

        // The recorder swallows the same failure.
        let recorder = AuditRecorder::new(Arc::new(log));
        recorder.record(AuditAction::Login, None, "alice");
    }

    #[test]
    fn test_hash_chain_verifies() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let log = FileAuditLog::new(&path).with_hash_chain(true);

        log.append(&AuditEntry::new(AuditAction::Login, "alice")).unwrap();
        log.append(&AuditEntry::new(AuditAction::Upload, "alice").with_file("1-a.txt"))
            .unwrap();

        // A fresh instance continues the existing chain.
        FileAuditLog::new(&path)
            .with_hash_chain(true)
            .append(&AuditEntry::new(AuditAction::Delete, "alice").with_file("1-a.txt"))
            .unwrap();

        assert_eq!(
            verify_chain(&path).unwrap(),
            ChainVerification::Intact { lines: 3 }
        );
    }

    #[test]
    fn test_hash_chain_detects_edit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let log = FileAuditLog::new(&path).with_hash_chain(true);

        log.append(&AuditEntry::new(AuditAction::Login, "alice")).unwrap();
        log.append(&AuditEntry::new(AuditAction::Delete, "alice").with_file("1-a.txt"))
            .unwrap();
        log.append(&AuditEntry::new(AuditAction::Login, "bob")).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        fs::write(&path, contents.replace("delete by alice", "delete by bob")).unwrap();

        assert_eq!(
            verify_chain(&path).unwrap(),
            ChainVerification::Broken { line: 2 }
        );
    }

    #[test]
    fn test_plain_log_is_not_a_chain() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.log");
        FileAuditLog::new(&path)
            .append(&AuditEntry::new(AuditAction::Login, "alice"))
            .unwrap();

        assert_eq!(
            verify_chain(&path).unwrap(),
            ChainVerification::Broken { line: 1 }
        );
    }
}
