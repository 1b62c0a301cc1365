use std::path::Path;

pub const IN_MEMORY_DATABASE: &str = ":memory:";

pub fn open_database_connection(database_path: &Path) -> Result<sqlite::Connection, String> {
    // Make sure the folder for the database file exists
    if database_path.as_os_str() != IN_MEMORY_DATABASE {
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| format!("Failed to create database directory {}: {}", parent.display(), e))?;
            }
        }
    }

    let mut connection = sqlite::open(database_path).map_err(|e| format!("Failed to open database connection: {}", e))?;
    connection.set_busy_timeout(500).map_err(|e| format!("Failed to set busy timeout: {}", e))?;
    connection.execute("PRAGMA journal_mode=WAL;").map_err(|e| format!("Failed to enable WAL journal mode: {}", e))?;
    Ok(connection)
}
