use std::path::{Path, PathBuf};

use crate::policy::extension_policy::FileEvaluation;
use crate::policy::policy_evaluator::evaluate;
use crate::policy::policy_store::PolicyStore;

// Exit code for --check when at least one file is blocked
pub const CHECK_BLOCKED_EXIT_CODE: i32 = 2;

pub fn export_policy_to_file(policy_store: &PolicyStore, path: &Path) -> Result<(), String> {
    let snapshot = policy_store.snapshot().map_err(|e| format!("Failed to read policy from database: {}", e))?;

    // Serialize policy to JSON
    let serialized = serde_json::to_string_pretty(&snapshot).map_err(|e| format!("Failed to serialize policy: {}", e))?;

    std::fs::write(path, serialized).map_err(|e| format!("Failed to write policy to file {}: {}", path.display(), e))?;
    println!("Policy successfully exported to {}", path.display());

    Ok(())
}

/// Evaluates local files by name and on-disk size against the stored policy
pub fn check_files(policy_store: &PolicyStore, files: &[PathBuf]) -> Result<Vec<FileEvaluation>, String> {
    let snapshot = policy_store.snapshot().map_err(|e| format!("Failed to read policy from database: {}", e))?;

    let mut results = Vec::with_capacity(files.len());
    for file in files {
        let metadata = std::fs::metadata(file).map_err(|e| format!("Failed to read metadata for {}: {}", file.display(), e))?;
        let file_name = file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| file.display().to_string());
        results.push(evaluate(&file_name, metadata.len(), &snapshot));
    }

    Ok(results)
}

pub fn format_evaluation_line(evaluation: &FileEvaluation) -> String {
    if !evaluation.blocked {
        return format!("{}: allowed", evaluation.file_name);
    }

    let mut reasons = Vec::new();
    if evaluation.blocked_by_extension {
        reasons.push(format!("extension .{}", evaluation.extension.as_deref().unwrap_or("")));
    }
    if evaluation.blocked_by_size {
        reasons.push(format!("size {} bytes", evaluation.file_size));
    }
    format!("{}: blocked ({})", evaluation.file_name, reasons.join(", "))
}

pub fn check_exit_code(results: &[FileEvaluation]) -> i32 {
    if results.iter().any(|r| r.blocked) { CHECK_BLOCKED_EXIT_CODE } else { 0 }
}
