use sqlite::{Connection, State};

use crate::policy::extension_policy::DEFAULT_FIXED_EXTENSIONS;

pub const CURRENT_DB_SCHEMA_VERSION: i64 = 1;

pub struct DatabaseSchema {
    pub version: i64,
    pub init_sql: Vec<String>,
}

impl DatabaseSchema {
    pub fn new() -> Self {
        let init_sql = get_init_sql();

        Self {
            version: CURRENT_DB_SCHEMA_VERSION,
            init_sql,
        }
    }
}

/// Creates the tables in order and seeds the fixed extension list.
/// Safe to run on every start, existing rows are left untouched.
pub fn initialize_database(connection: &Connection) -> Result<(), String> {
    // Get database schema and apply it
    let database_schema = DatabaseSchema::new();
    for sql in database_schema.init_sql {
        connection.execute(&sql).map_err(|e| format!("Failed to execute init SQL: {}. Error: {}", sql, e))?;
    }

    seed_fixed_extensions(connection)?;

    Ok(())
}

fn seed_fixed_extensions(connection: &Connection) -> Result<(), String> {
    let now = chrono::Utc::now().to_rfc3339();
    for name in DEFAULT_FIXED_EXTENSIONS {
        let mut statement = connection
            .prepare("INSERT OR IGNORE INTO fixed_extensions (name, blocked, created_at, updated_at) VALUES (?, 0, ?, ?)")
            .map_err(|e| format!("Failed to prepare fixed extension seed: {}", e))?;
        statement.bind((1, name)).map_err(|e| format!("Failed to bind fixed extension name: {}", e))?;
        statement.bind((2, now.as_str())).map_err(|e| format!("Failed to bind created_at: {}", e))?;
        statement.bind((3, now.as_str())).map_err(|e| format!("Failed to bind updated_at: {}", e))?;
        statement.next().map_err(|e| format!("Failed to seed fixed extension {}: {}", name, e))?;
    }
    Ok(())
}

pub fn get_schema_version(connection: &Connection) -> Result<i64, String> {
    let mut statement = connection
        .prepare("SELECT extguard_value FROM extguard WHERE extguard_key = 'schema_version' LIMIT 1")
        .map_err(|e| format!("Failed to prepare schema version query: {}", e))?;

    match statement.next().map_err(|e| format!("Failed to execute schema version query: {}", e))? {
        State::Row => {
            let version: String = statement.read(0).map_err(|e| format!("Failed to read schema version: {}", e))?;
            version.parse::<i64>().map_err(|e| format!("Failed to parse schema version '{}': {}", version, e))
        }
        State::Done => Ok(0), // No version found, assume 0
    }
}

//
//  SQL Statements for initializing the database schema
//
fn get_init_sql() -> Vec<String> {
    vec![
        // Key/value table for internal bookkeeping, like the schema version
        "CREATE TABLE IF NOT EXISTS extguard (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        extguard_key TEXT NOT NULL UNIQUE,
        extguard_value TEXT NOT NULL
    );"
        .to_string(),
        format!(
            "INSERT INTO extguard (extguard_key, extguard_value) SELECT 'schema_version', '{}' WHERE NOT EXISTS (SELECT 1 FROM extguard WHERE extguard_key = 'schema_version');",
            CURRENT_DB_SCHEMA_VERSION
        ),
        // Fixed extensions, seeded once and only ever toggled
        "CREATE TABLE IF NOT EXISTS fixed_extensions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE COLLATE NOCASE,
        blocked BOOLEAN NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );"
        .to_string(),
        // Custom extensions, always blocked
        "CREATE TABLE IF NOT EXISTS custom_extensions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE COLLATE NOCASE,
        created_at TEXT NOT NULL
    );"
        .to_string(),
        // Generic settings
        "CREATE TABLE IF NOT EXISTS settings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        setting_key TEXT NOT NULL UNIQUE,
        setting_value TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );"
        .to_string(),
    ]
}
