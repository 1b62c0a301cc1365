pub mod core {
    pub mod cli_actions;
    pub mod command_line_args;
    pub mod database_connection;
    pub mod operation_mode;
    pub mod os_signal;
    pub mod shutdown_manager;
}

pub mod database {
    pub mod database_schema;
}

pub mod error {
    pub mod extguard_error;
    pub mod extguard_error_enums;
}

pub mod http {
    pub mod extension_api;
    pub mod handle_request;
    pub mod http_server;
    pub mod http_util;
    pub mod static_files;
    pub mod request_response {
        pub mod extguard_request;
        pub mod extguard_response;
    }
}

pub mod logging {
    pub mod buffered_log;
    pub mod syslog;
}

pub mod policy {
    pub mod extension_policy;
    pub mod extension_validation;
    pub mod legacy_json_import;
    pub mod policy_evaluator;
    pub mod policy_store;
}
