use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::warn;

/// One line of the passwd file: `username:bcrypt-hash:home-directory`.
#[derive(Debug, Clone)]
pub struct UserEntry {
    pub username: String,
    hashed_password: String,
    pub home_dir: PathBuf,
}

impl UserEntry {
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let mut parts = line.splitn(3, ':');
        let username = parts.next()?;
        let hashed_password = parts.next()?;
        let home_dir = parts.next()?;
        if username.is_empty() || hashed_password.is_empty() || home_dir.is_empty() {
            return None;
        }
        Some(UserEntry {
            username: username.to_string(),
            hashed_password: hashed_password.to_string(),
            home_dir: PathBuf::from(home_dir),
        })
    }

    /// Checks a cleartext password against the stored bcrypt hash.
    pub fn verify_password(&self, password: &str) -> bool {
        match bcrypt::verify(password, &self.hashed_password) {
            Ok(matches) => matches,
            Err(e) => {
                warn!("Unverifiable password hash for {}: {}", self.username, e);
                false
            }
        }
    }
}

/// The accounts this daemon will log in, keyed by username.
#[derive(Debug, Default)]
pub struct UserDb {
    entries: HashMap<String, UserEntry>,
}

impl UserDb {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read passwd file: {}", path))?;
        Ok(Self::parse(&contents))
    }

    /// Malformed lines are skipped with a warning rather than refusing the
    /// whole file; a duplicate username keeps the first entry.
    pub fn parse(contents: &str) -> Self {
        let mut entries = HashMap::new();
        for (lineno, line) in contents.lines().enumerate() {
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            match UserEntry::from_line(line) {
                Some(entry) => {
                    if entries.contains_key(&entry.username) {
                        warn!("Duplicate passwd entry for {} ignored", entry.username);
                    } else {
                        entries.insert(entry.username.clone(), entry);
                    }
                }
                None => warn!("Skipping malformed passwd line {}", lineno + 1),
            }
        }
        UserDb { entries }
    }

    pub fn lookup(&self, username: &str) -> Option<&UserEntry> {
        self.entries.get(username)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn hash(password: &str) -> String {
        bcrypt::hash(password, 4).unwrap()
    }

    #[test]
    fn parses_well_formed_lines() {
        let entry = UserEntry::from_line("alice:$2b$04$abcdefghijklmnopqrstuv:/srv/ftp/alice")
            .unwrap();
        assert_eq!(entry.username, "alice");
        assert_eq!(entry.home_dir, PathBuf::from("/srv/ftp/alice"));
    }

    #[test]
    fn rejects_short_and_commented_lines() {
        assert!(UserEntry::from_line("alice:hash-only").is_none());
        assert!(UserEntry::from_line("# a comment").is_none());
        assert!(UserEntry::from_line("").is_none());
        assert!(UserEntry::from_line("::").is_none());
    }

    #[test]
    fn verify_accepts_the_right_password_only() {
        let line = format!("bob:{}:/srv/ftp/bob", hash("hunter2"));
        let entry = UserEntry::from_line(&line).unwrap();
        assert!(entry.verify_password("hunter2"));
        assert!(!entry.verify_password("hunter3"));
    }

    #[test]
    fn verify_tolerates_garbage_hashes() {
        let entry = UserEntry::from_line("carol:not-a-bcrypt-hash:/srv/ftp/carol").unwrap();
        assert!(!entry.verify_password("anything"));
    }

    #[test]
    fn db_skips_bad_lines_and_keeps_first_duplicate() {
        let contents = format!(
            "# staff accounts\n\
             alice:{}:/srv/ftp/alice\n\
             broken line without colons\n\
             alice:{}:/srv/ftp/alice-two\n",
            hash("one"),
            hash("two"),
        );
        let db = UserDb::parse(&contents);
        assert_eq!(db.len(), 1);
        let alice = db.lookup("alice").unwrap();
        assert_eq!(alice.home_dir, PathBuf::from("/srv/ftp/alice"));
        assert!(alice.verify_password("one"));
    }

    #[test]
    fn load_from_file_round_trips() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "dave:{}:/srv/ftp/dave", hash("pw")).unwrap();

        let db = UserDb::load_from_file(file.path().to_str().unwrap()).unwrap();
        assert!(db.lookup("dave").is_some());
        assert!(db.lookup("mallory").is_none());
    }

    #[test]
    fn load_from_file_reports_missing_file() {
        assert!(UserDb::load_from_file("/nonexistent/passwd").is_err());
    }
}
