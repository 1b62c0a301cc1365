use sqlite::{Connection, State};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::core::database_connection::{IN_MEMORY_DATABASE, open_database_connection};
use crate::database::database_schema::{get_schema_version, initialize_database};
use crate::error::extguard_error::ExtguardError;
use crate::error::extguard_error_enums::ExtguardErrorKind;
use crate::logging::syslog::{debug, info, trace, warn};
use crate::policy::extension_policy::{FILE_SIZE_LIMIT_SETTING_KEY, FixedExtension, MAX_CUSTOM_EXTENSIONS, PolicySnapshot};
use crate::policy::extension_validation::{normalize_extension_name, validate_custom_extension, validate_size_limit};

/// Durable home of the extension policy.
///
/// Owns the single database connection for its whole lifetime. Every operation
/// takes the connection lock for its full duration, so operations never
/// interleave within one process.
pub struct PolicyStore {
    connection: Mutex<Connection>,
    database_path: PathBuf,
}

fn storage_error(context: &str, e: sqlite::Error) -> ExtguardError {
    ExtguardError::storage(format!("{}: {}", context, e))
}

fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl PolicyStore {
    /// Opens (or creates) the database, applies the schema and seeds the fixed extensions
    pub fn open(database_path: &Path) -> Result<Self, ExtguardError> {
        let connection = open_database_connection(database_path).map_err(ExtguardError::storage)?;
        initialize_database(&connection).map_err(ExtguardError::storage)?;
        let schema_version = get_schema_version(&connection).map_err(ExtguardError::storage)?;

        info(format!("Policy store opened at {} (schema version {})", database_path.display(), schema_version));

        Ok(PolicyStore {
            connection: Mutex::new(connection),
            database_path: database_path.to_path_buf(),
        })
    }

    pub fn open_in_memory() -> Result<Self, ExtguardError> {
        Self::open(Path::new(IN_MEMORY_DATABASE))
    }

    pub fn get_database_path(&self) -> &Path {
        &self.database_path
    }

    /// Releases the connection. Consumes the store so nothing can use it afterwards.
    pub fn close(self) {
        let connection = match self.connection.into_inner() {
            Ok(c) => c,
            Err(poisoned) => poisoned.into_inner(),
        };
        drop(connection);
        info(format!("Policy store at {} closed", self.database_path.display()));
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, ExtguardError> {
        self.connection.lock().map_err(|e| ExtguardError::storage(format!("Database connection lock poisoned: {}", e)))
    }

    pub fn list_fixed(&self) -> Result<Vec<FixedExtension>, ExtguardError> {
        let connection = self.lock()?;
        list_fixed_with(&connection)
    }

    pub fn list_custom(&self) -> Result<Vec<String>, ExtguardError> {
        let connection = self.lock()?;
        list_custom_with(&connection)
    }

    pub fn count_custom(&self) -> Result<i64, ExtguardError> {
        let connection = self.lock()?;
        count_custom_with(&connection)
    }

    /// Returns false when no fixed extension has that name
    pub fn set_fixed_blocked(&self, name: &str, blocked: bool) -> Result<bool, ExtguardError> {
        let name = normalize_extension_name(name);
        let connection = self.lock()?;

        let mut statement = connection
            .prepare("UPDATE fixed_extensions SET blocked = ?, updated_at = ? WHERE name = ?")
            .map_err(|e| storage_error("Failed to prepare fixed extension update", e))?;
        let now = now_timestamp();
        statement.bind((1, blocked as i64)).map_err(|e| storage_error("Failed to bind blocked", e))?;
        statement.bind((2, now.as_str())).map_err(|e| storage_error("Failed to bind updated_at", e))?;
        statement.bind((3, name.as_str())).map_err(|e| storage_error("Failed to bind name", e))?;
        statement.next().map_err(|e| storage_error("Failed to update fixed extension", e))?;
        drop(statement);

        let matched = connection.change_count() > 0;
        if matched {
            info(format!("Fixed extension '{}' is now {}", name, if blocked { "blocked" } else { "allowed" }));
        } else {
            debug(format!("Fixed extension '{}' not found for update", name));
        }
        Ok(matched)
    }

    /// Adds a custom extension. The cap is checked before the duplicate check.
    pub fn add_custom(&self, name: &str) -> Result<bool, ExtguardError> {
        let name = validate_custom_extension(name)?;
        let connection = self.lock()?;

        let count = count_custom_with(&connection)?;
        if count >= MAX_CUSTOM_EXTENSIONS {
            debug(format!("Rejected custom extension '{}', {} entries already stored", name, count));
            return Err(ExtguardError::new(ExtguardErrorKind::LimitExceeded, format!("Custom extension limit of {} reached", MAX_CUSTOM_EXTENSIONS)));
        }

        if custom_exists_with(&connection, &name)? {
            debug(format!("Rejected custom extension '{}', it already exists", name));
            return Err(ExtguardError::new(ExtguardErrorKind::AlreadyExists, format!("Custom extension '{}' already exists", name)));
        }

        let mut statement = connection
            .prepare("INSERT INTO custom_extensions (name, created_at) VALUES (?, ?)")
            .map_err(|e| storage_error("Failed to prepare custom extension insert", e))?;
        let now = now_timestamp();
        statement.bind((1, name.as_str())).map_err(|e| storage_error("Failed to bind name", e))?;
        statement.bind((2, now.as_str())).map_err(|e| storage_error("Failed to bind created_at", e))?;
        statement.next().map_err(|e| storage_error("Failed to insert custom extension", e))?;
        drop(statement);

        let inserted = connection.change_count() > 0;
        if inserted {
            info(format!("Custom extension '{}' added", name));
        }
        Ok(inserted)
    }

    /// Returns false when the extension was not present
    pub fn remove_custom(&self, name: &str) -> Result<bool, ExtguardError> {
        let name = normalize_extension_name(name);
        let connection = self.lock()?;

        let mut statement = connection
            .prepare("DELETE FROM custom_extensions WHERE name = ?")
            .map_err(|e| storage_error("Failed to prepare custom extension delete", e))?;
        statement.bind((1, name.as_str())).map_err(|e| storage_error("Failed to bind name", e))?;
        statement.next().map_err(|e| storage_error("Failed to delete custom extension", e))?;
        drop(statement);

        let removed = connection.change_count() > 0;
        if removed {
            info(format!("Custom extension '{}' removed", name));
        } else {
            debug(format!("Custom extension '{}' not found for removal", name));
        }
        Ok(removed)
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>, ExtguardError> {
        let connection = self.lock()?;
        get_setting_with(&connection, key)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<bool, ExtguardError> {
        let connection = self.lock()?;

        let mut statement = connection
            .prepare("INSERT OR REPLACE INTO settings (setting_key, setting_value, updated_at) VALUES (?, ?, ?)")
            .map_err(|e| storage_error("Failed to prepare setting upsert", e))?;
        let now = now_timestamp();
        statement.bind((1, key)).map_err(|e| storage_error("Failed to bind setting key", e))?;
        statement.bind((2, value)).map_err(|e| storage_error("Failed to bind setting value", e))?;
        statement.bind((3, now.as_str())).map_err(|e| storage_error("Failed to bind updated_at", e))?;
        statement.next().map_err(|e| storage_error(&format!("Failed to save setting {}", key), e))?;
        drop(statement);

        trace(format!("Setting '{}' saved", key));
        Ok(connection.change_count() > 0)
    }

    /// 0 means unlimited, which is also what an unset limit reads as
    pub fn get_size_limit_mb(&self) -> Result<i64, ExtguardError> {
        let connection = self.lock()?;
        get_size_limit_mb_with(&connection)
    }

    /// Out-of-range values are rejected before anything is written
    pub fn set_size_limit_mb(&self, limit_mb: i64) -> Result<bool, ExtguardError> {
        let limit_mb = validate_size_limit(limit_mb)?;
        let saved = self.set_setting(FILE_SIZE_LIMIT_SETTING_KEY, &limit_mb.to_string())?;
        info(format!("File size limit set to {} MB", limit_mb));
        Ok(saved)
    }

    /// Reads all three parts under one lock, so the snapshot is consistent
    pub fn snapshot(&self) -> Result<PolicySnapshot, ExtguardError> {
        let connection = self.lock()?;
        Ok(PolicySnapshot {
            fixed_extensions: list_fixed_with(&connection)?,
            custom_extensions: list_custom_with(&connection)?,
            size_limit_mb: get_size_limit_mb_with(&connection)?,
        })
    }
}

fn list_fixed_with(connection: &Connection) -> Result<Vec<FixedExtension>, ExtguardError> {
    let mut statement = connection
        .prepare("SELECT name, blocked FROM fixed_extensions ORDER BY name")
        .map_err(|e| storage_error("Failed to prepare fixed extensions query", e))?;

    let mut extensions = Vec::new();
    while let State::Row = statement.next().map_err(|e| storage_error("Failed to execute fixed extensions query", e))? {
        let name: String = statement.read(0).map_err(|e| storage_error("Failed to read fixed extension name", e))?;
        let blocked: i64 = statement.read(1).map_err(|e| storage_error("Failed to read blocked flag", e))?;
        extensions.push(FixedExtension { name, blocked: blocked != 0 });
    }

    Ok(extensions)
}

fn list_custom_with(connection: &Connection) -> Result<Vec<String>, ExtguardError> {
    let mut statement = connection
        .prepare("SELECT name FROM custom_extensions ORDER BY name")
        .map_err(|e| storage_error("Failed to prepare custom extensions query", e))?;

    let mut extensions = Vec::new();
    while let State::Row = statement.next().map_err(|e| storage_error("Failed to execute custom extensions query", e))? {
        let name: String = statement.read(0).map_err(|e| storage_error("Failed to read custom extension name", e))?;
        extensions.push(name);
    }

    Ok(extensions)
}

fn count_custom_with(connection: &Connection) -> Result<i64, ExtguardError> {
    let mut statement = connection
        .prepare("SELECT COUNT(*) FROM custom_extensions")
        .map_err(|e| storage_error("Failed to prepare custom extension count", e))?;

    match statement.next().map_err(|e| storage_error("Failed to count custom extensions", e))? {
        State::Row => statement.read::<i64, _>(0).map_err(|e| storage_error("Failed to read custom extension count", e)),
        State::Done => Ok(0),
    }
}

fn custom_exists_with(connection: &Connection, name: &str) -> Result<bool, ExtguardError> {
    let mut statement = connection
        .prepare("SELECT COUNT(*) FROM custom_extensions WHERE name = ?")
        .map_err(|e| storage_error("Failed to prepare custom extension lookup", e))?;
    statement.bind((1, name)).map_err(|e| storage_error("Failed to bind name", e))?;

    match statement.next().map_err(|e| storage_error("Failed to look up custom extension", e))? {
        State::Row => {
            let count: i64 = statement.read(0).map_err(|e| storage_error("Failed to read custom extension lookup", e))?;
            Ok(count > 0)
        }
        State::Done => Ok(false),
    }
}

fn get_setting_with(connection: &Connection, key: &str) -> Result<Option<String>, ExtguardError> {
    let mut statement = connection
        .prepare("SELECT setting_value FROM settings WHERE setting_key = ? LIMIT 1")
        .map_err(|e| storage_error("Failed to prepare setting query", e))?;
    statement.bind((1, key)).map_err(|e| storage_error("Failed to bind setting key", e))?;

    match statement.next().map_err(|e| storage_error(&format!("Failed to read setting {}", key), e))? {
        State::Row => {
            let value: String = statement.read(0).map_err(|e| storage_error("Failed to read setting value", e))?;
            Ok(Some(value))
        }
        State::Done => Ok(None),
    }
}

fn get_size_limit_mb_with(connection: &Connection) -> Result<i64, ExtguardError> {
    match get_setting_with(connection, FILE_SIZE_LIMIT_SETTING_KEY)? {
        Some(value) => match value.trim().parse::<i64>() {
            Ok(limit) => match validate_size_limit(limit) {
                Ok(limit) => Ok(limit),
                Err(e) => {
                    warn(format!("Stored file size limit '{}' is out of range ({}), treating it as unlimited", value, e));
                    Ok(0)
                }
            },
            Err(e) => {
                warn(format!("Stored file size limit '{}' is not a number ({}), treating it as unlimited", value, e));
                Ok(0)
            }
        },
        None => Ok(0),
    }
}
