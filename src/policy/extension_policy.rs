use serde::{Deserialize, Serialize};

pub const DEFAULT_FIXED_EXTENSIONS: [&str; 7] = ["bat", "cmd", "com", "cpl", "exe", "scr", "js"];
pub const MAX_CUSTOM_EXTENSIONS: i64 = 200;
pub const MAX_EXTENSION_NAME_LENGTH: usize = 20;
pub const MAX_FILE_SIZE_LIMIT_MB: i64 = 1024;
pub const FILE_SIZE_LIMIT_SETTING_KEY: &str = "file_size_limit_mb";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixedExtension {
    pub name: String,
    pub blocked: bool,
}

/// Everything the evaluator needs, read in one go from the store.
/// Serializes to the shape returned by `GET /api/extensions`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySnapshot {
    pub fixed_extensions: Vec<FixedExtension>,
    pub custom_extensions: Vec<String>,
    #[serde(rename = "fileSizeLimit")]
    pub size_limit_mb: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEvaluation {
    pub file_name: String,
    pub file_size: u64,
    pub extension: Option<String>,
    pub blocked_by_extension: bool,
    pub blocked_by_size: bool,
    pub blocked: bool,
}
