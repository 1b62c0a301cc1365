use chrono::Utc;
use std::fmt;
use std::path::Path;
use std::sync::{LazyLock, RwLock};
use tokio::select;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::operation_mode::OperationMode;
use crate::logging::buffered_log::BufferedLog;

pub const SYSTEM_LOG_FILE_NAME: &str = "extguard.log";

pub struct SysLog {
    buffered_log: Option<BufferedLog>,
    // Log level for writing log file
    log_level: LogType,
    // Log level for stdout
    stdout_log_level: LogType,
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LogType {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogType::Error => write!(f, "ERROR"),
            LogType::Info => write!(f, "INFO"),
            LogType::Warn => write!(f, "WARN"),
            LogType::Debug => write!(f, "DEBUG"),
            LogType::Trace => write!(f, "TRACE"),
            LogType::Off => write!(f, "OFF"),
        }
    }
}

impl SysLog {
    pub fn new(log_level: LogType, stdout_log_level: LogType, buffered_log: Option<BufferedLog>) -> Self {
        SysLog {
            buffered_log,
            log_level,
            stdout_log_level,
        }
    }

    fn is_enabled(log_type: LogType, threshold: LogType) -> bool {
        log_type != LogType::Off && log_type as u8 <= threshold as u8
    }

    pub fn add_log(&self, log_type: LogType, log: String) {
        let to_file = self.buffered_log.is_some() && Self::is_enabled(log_type, self.log_level);
        let to_stdout = Self::is_enabled(log_type, self.stdout_log_level);
        if !to_file && !to_stdout {
            return;
        }

        let ts = Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
        let log_entry = format!("{} - [{}] {}", &ts, &log_type, &log);

        if to_stdout {
            println!("{}", &log_entry);
        }

        if to_file {
            if let Some(buffered_log) = &self.buffered_log {
                buffered_log.add_log(log_entry);
            }
        }
    }

    pub fn flush(&self) {
        if let Some(buffered_log) = &self.buffered_log {
            buffered_log.flush();
        }
    }
}

pub fn get_log_level_based_on_operation_mode(operation_mode: OperationMode) -> LogType {
    match operation_mode {
        OperationMode::DEV => LogType::Trace,
        OperationMode::DEBUG => LogType::Debug,
        OperationMode::PRODUCTION => LogType::Info,
        OperationMode::ULTIMATE => LogType::Warn,
    }
}

// Until init_system_log is called, entries only go to stdout
pub static SYS_LOG: LazyLock<RwLock<SysLog>> = LazyLock::new(|| RwLock::new(SysLog::new(LogType::Off, LogType::Info, None)));

pub fn init_system_log(operation_mode: OperationMode, log_dir: &Path) -> Result<(), String> {
    let buffered_log = BufferedLog::new("syslog", &log_dir.join(SYSTEM_LOG_FILE_NAME))?;
    let log_level = get_log_level_based_on_operation_mode(operation_mode);

    // DEV mode gets everything on stdout as well
    let stdout_log_level = match operation_mode {
        OperationMode::DEV => LogType::Trace,
        OperationMode::ULTIMATE => LogType::Warn,
        _ => LogType::Info,
    };

    let mut sys_log = SYS_LOG.write().map_err(|e| format!("Failed to acquire system log lock: {}", e))?;
    sys_log.flush();
    *sys_log = SysLog::new(log_level, stdout_log_level, Some(buffered_log));

    Ok(())
}

// Periodically writes buffered entries, and a final time when the token is cancelled
pub fn start_flushing_task(shutdown_token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            select! {
                _ = tokio::time::sleep(std::time::Duration::from_millis(500)) => {
                    flush_system_log();
                },
                _ = shutdown_token.cancelled() => {
                    flush_system_log();
                    break;
                },
            }
        }
    })
}

pub fn flush_system_log() {
    if let Ok(sys_log) = SYS_LOG.read() {
        sys_log.flush();
    }
}

fn add_log(log_type: LogType, log: String) {
    if let Ok(sys_log) = SYS_LOG.read() {
        sys_log.add_log(log_type, log);
    }
}

pub fn error<S: Into<String>>(log: S) {
    add_log(LogType::Error, log.into());
}

pub fn warn<S: Into<String>>(log: S) {
    add_log(LogType::Warn, log.into());
}

pub fn info<S: Into<String>>(log: S) {
    add_log(LogType::Info, log.into());
}

pub fn debug<S: Into<String>>(log: S) {
    add_log(LogType::Debug, log.into());
}

pub fn trace<S: Into<String>>(log: S) {
    add_log(LogType::Trace, log.into());
}
