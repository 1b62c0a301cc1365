use crate::policy::extension_policy::{FileEvaluation, PolicySnapshot};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Lower-cased text after the last dot. No dot, or nothing after it, means no extension.
pub fn get_file_extension(file_name: &str) -> Option<String> {
    let (_, extension) = file_name.rsplit_once('.')?;
    if extension.is_empty() {
        return None;
    }
    Some(extension.to_lowercase())
}

pub fn is_extension_blocked(extension: &str, snapshot: &PolicySnapshot) -> bool {
    if extension.is_empty() {
        return false;
    }

    let blocked_by_fixed = snapshot.fixed_extensions.iter().any(|fixed| fixed.blocked && fixed.name.eq_ignore_ascii_case(extension));
    let blocked_by_custom = snapshot.custom_extensions.iter().any(|custom| custom.eq_ignore_ascii_case(extension));

    blocked_by_fixed || blocked_by_custom
}

pub fn is_file_size_exceeded(file_size_bytes: u64, size_limit_mb: i64) -> bool {
    if size_limit_mb <= 0 {
        return false;
    }
    file_size_bytes > (size_limit_mb as u64).saturating_mul(BYTES_PER_MB)
}

/// Decides whether a file would be accepted. Pure, so it can be called for
/// every candidate file against one snapshot without going back to the store.
pub fn evaluate(file_name: &str, file_size_bytes: u64, snapshot: &PolicySnapshot) -> FileEvaluation {
    let extension = get_file_extension(file_name);
    let blocked_by_extension = extension.as_deref().map(|ext| is_extension_blocked(ext, snapshot)).unwrap_or(false);
    let blocked_by_size = is_file_size_exceeded(file_size_bytes, snapshot.size_limit_mb);

    FileEvaluation {
        file_name: file_name.to_string(),
        file_size: file_size_bytes,
        extension,
        blocked_by_extension,
        blocked_by_size,
        blocked: blocked_by_extension || blocked_by_size,
    }
}
