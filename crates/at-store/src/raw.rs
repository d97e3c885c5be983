use chrono::NaiveDate;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Per-stream directory of day-partitioned `YYYY-MM-DD.<suffix>.jsonl` files
/// (§4.C, §6.1). Owns its directory exclusively; one writer per process.
#[derive(Debug, Clone)]
pub struct RawStore {
    dir: PathBuf,
    suffix: &'static str,
}

impl RawStore {
    /// `ensureDir`: create `dir` with 0o700 if it doesn't exist.
    pub fn new(dir: impl Into<PathBuf>, suffix: &'static str) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        set_dir_mode(&dir)?;
        Ok(Self { dir, suffix })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_path(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}.{}.jsonl", date.format("%Y-%m-%d"), self.suffix))
    }

    /// `append`: create today's file with 0o600 if absent, then write one
    /// whole line. Whole-line writes are what make concurrent readers safe
    /// without locking (§4.C, §4.D "Concurrency").
    pub fn append_line(&self, date: NaiveDate, line: &str) -> io::Result<PathBuf> {
        let path = self.file_path(date);
        let is_new = !path.exists();
        let mut f = OpenOptions::new().create(true).append(true).open(&path)?;
        if is_new {
            set_file_mode(&path)?;
        }
        f.write_all(line.as_bytes())?;
        f.write_all(b"\n")?;
        f.flush()?;
        Ok(path)
    }

    /// `listFiles`: sorted paths, lexicographic order equals chronological
    /// order for `YYYY-MM-DD` filenames.
    pub fn list_files(&self) -> io::Result<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(&format!(".{}.jsonl", self.suffix)))
            })
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// `readFile`: raw non-empty lines, in file order, with 1-based line
    /// numbers. Parsing (and skipping bad lines) is the caller's job — this
    /// layer never rejects a line.
    pub fn read_lines(path: &Path) -> io::Result<Vec<(usize, String)>> {
        let content = fs::read_to_string(path)?;
        Ok(content
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.to_string()))
            .filter(|(_, l)| !l.trim().is_empty())
            .collect())
    }
}

#[cfg(unix)]
fn set_dir_mode(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o700))
}

#[cfg(not(unix))]
fn set_dir_mode(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn set_file_mode(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn set_file_mode(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_files_is_chronologically_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let store = RawStore::new(dir.path(), "witness").unwrap();
        store
            .append_line(NaiveDate::from_ymd_opt(2026, 7, 2).unwrap(), "{}")
            .unwrap();
        store
            .append_line(NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(), "{}")
            .unwrap();
        let files = store.list_files().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].to_string_lossy().contains("2026-07-01"));
        assert!(files[1].to_string_lossy().contains("2026-07-02"));
    }

    #[test]
    fn append_writes_whole_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = RawStore::new(dir.path(), "claims").unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 7, 31).unwrap();
        store.append_line(date, "one").unwrap();
        store.append_line(date, "two").unwrap();
        let files = store.list_files().unwrap();
        let lines = RawStore::read_lines(&files[0]).unwrap();
        assert_eq!(lines, vec![(1, "one".to_string()), (2, "two".to_string())]);
    }
}
