// Operation mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperationMode {
    DEV,
    DEBUG,
    PRODUCTION,
    ULTIMATE,
}

pub const OPERATION_MODE_NAMES: [&str; 4] = ["DEV", "DEBUG", "PRODUCTION", "ULTIMATE"];

pub fn match_string_to_operation_mode(mode_str: &str) -> Option<OperationMode> {
    match mode_str.trim().to_uppercase().as_str() {
        "DEV" => Some(OperationMode::DEV),
        "DEBUG" => Some(OperationMode::DEBUG),
        "PRODUCTION" => Some(OperationMode::PRODUCTION),
        "ULTIMATE" => Some(OperationMode::ULTIMATE),
        _ => None,
    }
}

pub fn operation_mode_as_string(operation_mode: OperationMode) -> String {
    match operation_mode {
        OperationMode::DEV => "DEV".to_string(),
        OperationMode::DEBUG => "DEBUG".to_string(),
        OperationMode::PRODUCTION => "PRODUCTION".to_string(),
        OperationMode::ULTIMATE => "ULTIMATE".to_string(),
    }
}
