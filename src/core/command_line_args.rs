use std::path::PathBuf;

use clap::{Arg, ArgMatches, Command};

use crate::core::operation_mode::{OPERATION_MODE_NAMES, OperationMode, match_string_to_operation_mode};

pub const DEFAULT_PORT: u16 = 8001;
pub const DEFAULT_BIND_IP: &str = "0.0.0.0";
pub const DEFAULT_DATABASE_PATH: &str = "./db/extguard.db";
pub const DEFAULT_PUBLIC_DIR: &str = "./public";
pub const DEFAULT_LOG_DIR: &str = "./logs";
pub const DEFAULT_LEGACY_DATA_PATH: &str = "./data.json";

/// Everything the process needs to start, resolved from the command line and environment
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub operation_mode: OperationMode,
    pub bind_ip: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub public_dir: PathBuf,
    pub log_dir: PathBuf,
    pub legacy_data_path: PathBuf,
    pub export_policy_path: Option<PathBuf>,
    pub check_files: Vec<PathBuf>,
}

pub fn build_command() -> Command {
    Command::new("extguard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("File extension blocking policy service")
        .arg(
            Arg::new("opmode")
                .short('o')
                .long("opmode")
                .help("Mode of operation")
                .value_parser(OPERATION_MODE_NAMES),
        )
        .arg(Arg::new("bind").long("bind").help("IP address to listen on").default_value(DEFAULT_BIND_IP))
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on (defaults to $PORT, then 8001)")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("database")
                .long("database")
                .help("Path to the SQLite database file")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value(DEFAULT_DATABASE_PATH),
        )
        .arg(
            Arg::new("public-dir")
                .long("public-dir")
                .help("Directory with static files to serve")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value(DEFAULT_PUBLIC_DIR),
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .help("Directory for the system log")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value(DEFAULT_LOG_DIR),
        )
        .arg(
            Arg::new("legacy-data")
                .long("legacy-data")
                .help("Legacy JSON data file to import at startup, if present")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value(DEFAULT_LEGACY_DATA_PATH),
        )
        .arg(
            Arg::new("export-policy")
                .short('e')
                .long("export-policy")
                .help("Export the current policy as JSON to a file and exit")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .help("Check local files against the stored policy and exit")
                .num_args(1..)
                .value_parser(validate_existing_file),
        )
}

fn validate_existing_file(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if !path.exists() {
        return Err(format!("Path does not exist: {}", s));
    }
    if !path.is_file() {
        return Err(format!("Path is not a file: {}", s));
    }
    Ok(path)
}

pub fn load_command_line_args() -> ArgMatches {
    build_command().get_matches()
}

pub fn server_config_from_matches(cli: &ArgMatches) -> ServerConfig {
    let operation_mode = cli
        .get_one::<String>("opmode")
        .and_then(|s| match_string_to_operation_mode(s))
        .unwrap_or(OperationMode::PRODUCTION);

    // Command line wins over the PORT environment variable
    let port = cli
        .get_one::<u16>("port")
        .copied()
        .or_else(|| std::env::var("PORT").ok().and_then(|p| p.trim().parse::<u16>().ok()))
        .unwrap_or(DEFAULT_PORT);

    let path_or = |id: &str, default: &str| cli.get_one::<PathBuf>(id).cloned().unwrap_or_else(|| PathBuf::from(default));

    ServerConfig {
        operation_mode,
        bind_ip: cli.get_one::<String>("bind").cloned().unwrap_or_else(|| DEFAULT_BIND_IP.to_string()),
        port,
        database_path: path_or("database", DEFAULT_DATABASE_PATH),
        public_dir: path_or("public-dir", DEFAULT_PUBLIC_DIR),
        log_dir: path_or("log-dir", DEFAULT_LOG_DIR),
        legacy_data_path: path_or("legacy-data", DEFAULT_LEGACY_DATA_PATH),
        export_policy_path: cli.get_one::<PathBuf>("export-policy").cloned(),
        check_files: cli.get_many::<PathBuf>("check").map(|files| files.cloned().collect()).unwrap_or_default(),
    }
}

pub fn get_server_config() -> ServerConfig {
    server_config_from_matches(&load_command_line_args())
}
