//! Daily rolling log file with retention.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tracing_subscriber::fmt::MakeWriter;

/// Log file that switches to a new file when the local date changes.
///
/// Cloning shares the same underlying file.
#[derive(Clone, Debug)]
pub struct RollingFile {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug)]
struct Inner {
    dir: PathBuf,
    prefix: String,
    max_files: usize,
    date: NaiveDate,
    file: File,
}

impl RollingFile {
    pub fn open(dir: &Path, prefix: &str, max_files: usize) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let date = chrono::Local::now().date_naive();
        let file = open_append(&dir.join(file_name(prefix, date)))?;
        let inner = Inner {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
            max_files: max_files.max(1),
            date,
            file,
        };
        inner.prune()?;
        Ok(Self { inner: Arc::new(Mutex::new(inner)) })
    }

    /// Path of the file currently written to
    pub fn current_path(&self) -> PathBuf {
        match self.inner.lock() {
            Ok(inner) => inner.dir.join(file_name(&inner.prefix, inner.date)),
            Err(poisoned) => {
                let inner = poisoned.into_inner();
                inner.dir.join(file_name(&inner.prefix, inner.date))
            }
        }
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Mutex poisoned: {e}")))
    }
}

impl Inner {
    fn roll_to(&mut self, date: NaiveDate) -> io::Result<()> {
        if date == self.date {
            return Ok(());
        }
        self.file.flush()?;
        self.file = open_append(&self.dir.join(file_name(&self.prefix, date)))?;
        self.date = date;
        self.prune()
    }

    /// Remove the oldest files beyond `max_files`
    fn prune(&self) -> io::Result<()> {
        let head = format!("{}.", self.prefix);
        let mut names: Vec<String> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(&head) && name.ends_with(".log"))
            .collect();
        if names.len() <= self.max_files {
            return Ok(());
        }
        // Date-stamped names sort chronologically
        names.sort();
        let excess = names.len() - self.max_files;
        for name in names.into_iter().take(excess) {
            fs::remove_file(self.dir.join(name))?;
        }
        Ok(())
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.lock()?;
        inner.roll_to(chrono::Local::now().date_naive())?;
        inner.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock()?.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RollingFile {
    type Writer = RollingFile;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}.{}.log", prefix, date.format("%Y-%m-%d"))
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .filter(|n| n.ends_with(".log"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_writes_to_dated_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "board", 3).unwrap();
        file.write_all(b"hello\n").unwrap();
        file.flush().unwrap();

        let path = file.current_path();
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("board."));
        assert_eq!(fs::read_to_string(path).unwrap(), "hello\n");
    }

    #[test]
    fn test_prunes_oldest_files_on_open() {
        let dir = tempfile::tempdir().unwrap();
        for day in 1..=5 {
            fs::write(dir.path().join(format!("board.2020-01-0{}.log", day)), "old").unwrap();
        }
        fs::write(dir.path().join("other.txt"), "keep").unwrap();

        let _file = RollingFile::open(dir.path(), "board", 3).unwrap();

        let names = log_files(dir.path());
        assert_eq!(names.len(), 3);
        assert_eq!(names[0], "board.2020-01-04.log");
        assert_eq!(names[1], "board.2020-01-05.log");
        assert!(dir.path().join("other.txt").exists());
    }

    #[test]
    fn test_roll_to_new_date() {
        let dir = tempfile::tempdir().unwrap();
        let file = RollingFile::open(dir.path(), "board", 2).unwrap();
        {
            let mut inner = file.lock().unwrap();
            let next = NaiveDate::from_ymd_opt(2999, 1, 1).unwrap();
            inner.roll_to(next).unwrap();
        }
        assert!(file.current_path().ends_with("board.2999-01-01.log"));
        assert_eq!(log_files(dir.path()).len(), 2);
    }
}
