use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::extguard_error_enums::ExtguardErrorKind;
use crate::logging::syslog::{error, info, warn};
use crate::policy::extension_policy::FixedExtension;
use crate::policy::policy_store::PolicyStore;

/// Layout of the JSON file that held the policy before it moved into the database
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPolicyData {
    #[serde(default)]
    pub fixed_extensions: Vec<FixedExtension>,
    #[serde(default)]
    pub custom_extensions: Vec<String>,
}

#[derive(Debug, Default, PartialEq)]
pub struct ImportSummary {
    pub fixed_applied: usize,
    pub custom_added: usize,
    pub skipped: usize,
}

pub fn get_backup_path(path: &Path) -> PathBuf {
    let mut backup = path.as_os_str().to_owned();
    backup.push(".backup");
    PathBuf::from(backup)
}

/// Imports a legacy data file into the store and renames it to `<file>.backup`.
/// Returns Ok(None) when there is no file to import.
pub fn import_legacy_json(path: &Path, policy_store: &PolicyStore) -> Result<Option<ImportSummary>, String> {
    if !path.exists() {
        return Ok(None);
    }

    info(format!("Found legacy data file {}, importing into the database", path.display()));

    let file_contents = std::fs::read_to_string(path).map_err(|e| format!("Failed to read legacy data file {}: {}", path.display(), e))?;
    let legacy_data: LegacyPolicyData = serde_json::from_str(&file_contents).map_err(|e| format!("Failed to parse legacy data file {}: {}", path.display(), e))?;

    let mut summary = ImportSummary::default();

    for fixed in &legacy_data.fixed_extensions {
        match policy_store.set_fixed_blocked(&fixed.name, fixed.blocked) {
            Ok(true) => summary.fixed_applied += 1,
            Ok(false) => {
                warn(format!("Legacy fixed extension '{}' is not a known fixed extension, skipping", fixed.name));
                summary.skipped += 1;
            }
            Err(e) => {
                error(format!("Error importing fixed extension {}: {}", fixed.name, e));
                summary.skipped += 1;
            }
        }
    }

    for name in &legacy_data.custom_extensions {
        match policy_store.add_custom(name) {
            Ok(_) => summary.custom_added += 1,
            Err(e) if e.kind == ExtguardErrorKind::AlreadyExists => summary.skipped += 1,
            Err(e) => {
                error(format!("Error importing custom extension {}: {}", name, e));
                summary.skipped += 1;
            }
        }
    }

    let backup_path = get_backup_path(path);
    std::fs::rename(path, &backup_path).map_err(|e| format!("Imported legacy data but failed to rename {} to {}: {}", path.display(), backup_path.display(), e))?;

    info(format!(
        "Legacy import completed: {} fixed applied, {} custom added, {} skipped. Backup saved as {}",
        summary.fixed_applied,
        summary.custom_added,
        summary.skipped,
        backup_path.display()
    ));

    Ok(Some(summary))
}
