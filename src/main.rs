use std::sync::Arc;

use extguard::core::cli_actions::{check_exit_code, check_files, export_policy_to_file, format_evaluation_line};
use extguard::core::command_line_args::{ServerConfig, get_server_config};
use extguard::core::operation_mode::operation_mode_as_string;
use extguard::core::os_signal::start_os_signal_handling;
use extguard::core::shutdown_manager::get_shutdown_manager;
use extguard::http::handle_request::ExtguardState;
use extguard::http::http_server::start_server;
use extguard::logging::syslog::{error, flush_system_log, info, init_system_log, start_flushing_task, warn};
use extguard::policy::legacy_json_import::import_legacy_json;
use extguard::policy::policy_store::PolicyStore;

fn main() {
    let config = get_server_config();

    // Initialize logging
    if let Err(e) = init_system_log(config.operation_mode, &config.log_dir) {
        error(format!("Failed to initialize logging: {}", e));
        std::process::exit(1);
    }

    let version = env!("CARGO_PKG_VERSION");
    info(format!("Starting extguard {}...", version));
    info(format!("Operation mode: {}", operation_mode_as_string(config.operation_mode)));

    // Open the database, creating schema and seeding fixed extensions when needed
    let policy_store = match PolicyStore::open(&config.database_path) {
        Ok(store) => store,
        Err(e) => {
            error(format!("Failed to open policy store: {}", e));
            flush_system_log();
            std::process::exit(1);
        }
    };

    // A malformed legacy file is left where it is, the server still starts
    match import_legacy_json(&config.legacy_data_path, &policy_store) {
        Ok(_) => {}
        Err(e) => warn(format!("Legacy data import failed: {}", e)),
    }

    if let Some(exit_code) = run_cli_actions(&config, &policy_store) {
        policy_store.close();
        flush_system_log();
        std::process::exit(exit_code);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error(format!("Failed to create async runtime: {}", e));
            flush_system_log();
            std::process::exit(1);
        }
    };

    let policy_store = Arc::new(policy_store);
    let public_dir = if config.public_dir.is_dir() {
        Some(config.public_dir.clone())
    } else {
        warn(format!("Public directory {} not found, static files are disabled", config.public_dir.display()));
        None
    };
    let state = Arc::new(ExtguardState::new(policy_store.clone(), public_dir));

    let server_result = runtime.block_on(async {
        start_os_signal_handling();

        let shutdown_token = get_shutdown_manager().get_cancellation_token();
        let flushing_task = start_flushing_task(shutdown_token.clone());

        let result = start_server(&config, state, shutdown_token).await;

        // Make sure the flushing task finishes even when the server failed to start
        get_shutdown_manager().initiate_shutdown();
        let _ = flushing_task.await;
        result
    });
    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    if let Err(e) = &server_result {
        error(format!("Server stopped with error: {}", e));
    }

    match Arc::try_unwrap(policy_store) {
        Ok(store) => store.close(),
        Err(_) => warn("Policy store still in use at shutdown, leaving it to be dropped"),
    }

    info("extguard stopped");
    flush_system_log();

    if server_result.is_err() {
        std::process::exit(1);
    }
}

// Handles --export-policy and --check, returns the exit code when one of them ran
fn run_cli_actions(config: &ServerConfig, policy_store: &PolicyStore) -> Option<i32> {
    if let Some(export_path) = &config.export_policy_path {
        return match export_policy_to_file(policy_store, export_path) {
            Ok(_) => Some(0),
            Err(e) => {
                error(format!("Policy export failed: {}", e));
                Some(1)
            }
        };
    }

    if !config.check_files.is_empty() {
        return match check_files(policy_store, &config.check_files) {
            Ok(results) => {
                for result in &results {
                    println!("{}", format_evaluation_line(result));
                }
                Some(check_exit_code(&results))
            }
            Err(e) => {
                error(format!("File check failed: {}", e));
                Some(1)
            }
        };
    }

    None
}
