use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct BufferedLog {
    pub log_id: String,
    pub log_file_path: PathBuf,
    pub buffered_log: Mutex<Vec<String>>,
    pub log_count_flush: usize,
}

impl BufferedLog {
    pub fn new(id: &str, full_file_path: &Path) -> Result<Self, String> {
        let buffered_log = BufferedLog {
            log_id: id.to_string(),
            log_file_path: full_file_path.to_path_buf(),
            buffered_log: Mutex::new(Vec::new()),
            log_count_flush: 50,
        };

        // Create the log file and path if it does not exist
        if let Some(parent) = buffered_log.log_file_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| format!("Failed to create log directory {}: {}", parent.display(), e))?;
        }
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&buffered_log.log_file_path)
            .map_err(|e| format!("Failed to open log file {}: {}", buffered_log.log_file_path.display(), e))?;

        Ok(buffered_log)
    }

    pub fn add_log(&self, log: String) {
        let should_flush = match self.buffered_log.lock() {
            Ok(mut log_buffer) => {
                log_buffer.push(log);
                log_buffer.len() >= self.log_count_flush
            }
            Err(_) => false,
        };

        if should_flush {
            self.flush();
        }
    }

    #[cfg(test)]
    fn buffered_count(&self) -> usize {
        self.buffered_log.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn flush(&self) {
        let mut log_buffer = match self.buffered_log.lock() {
            Ok(b) => b,
            Err(_) => return,
        };
        if log_buffer.is_empty() {
            return;
        }

        let log_data = log_buffer.join("\n") + "\n";
        if let Err(e) = std::fs::OpenOptions::new().append(true).open(&self.log_file_path).and_then(|mut file| file.write_all(log_data.as_bytes())) {
            eprintln!("Failed to write log for log id {}: {}", &self.log_id, e);
        }

        // Clear data and releases the lock
        log_buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffered_log_flushes_when_count_is_reached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/test.log");
        let mut log = BufferedLog::new("test", &path).unwrap();
        log.log_count_flush = 3;

        log.add_log("one".to_string());
        log.add_log("two".to_string());
        assert_eq!(log.buffered_count(), 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");

        log.add_log("three".to_string());
        assert_eq!(log.buffered_count(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\nthree\n");
    }

    #[test]
    fn test_buffered_log_flush_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.log");
        let log = BufferedLog::new("test", &path).unwrap();

        log.add_log("first".to_string());
        log.flush();
        log.add_log("second".to_string());
        log.flush();
        log.flush();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
