// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::rt::System;
use actix_web::{App, HttpServer, middleware::Logger};
use log::{LevelFilter, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quill::app_state::AppState;
use quill::config::{CONFIG_FILE_NAME, Config};
use quill::iam::BearerAuthMiddlewareFactory;
use quill::notify::run_worker;

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let parsed_args = match parse_args() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("Invalid command line arguments: {}", error);
            eprintln!("Use -C <root> to set the runtime directory.");
            return 1;
        }
    };

    if parsed_args.help {
        println!("quill [-C <root>]");
        println!("  -C <root>   runtime directory holding config.yaml and state/");
        return 0;
    }

    let config = match bootstrap_config(&parsed_args.runtime_root) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Configuration error: {}", error);
            return 1;
        }
    };

    init_logger(&config.logging.level);

    match System::new().block_on(run_server(config, &parsed_args.runtime_root)) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("Server failed: {}", error);
            1
        }
    }
}

async fn run_server(config: Config, runtime_root: &Path) -> std::io::Result<()> {
    let state = AppState::initialize(config, runtime_root)
        .map_err(|error| std::io::Error::other(error.to_string()))?;

    info!("Starting {}", state.config.app.name);
    info!("Runtime root: {}", runtime_root.display());
    info!(
        "Listening on {}:{}",
        state.config.server.host, state.config.server.port
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let worker = tokio::spawn(run_worker(
        state.queue.clone(),
        state.notifier.clone(),
        shutdown_rx,
    ));

    let address = (state.config.server.host.clone(), state.config.server.port);
    let workers = state.config.server.workers;
    let state = Arc::new(state);
    let app_state = state.clone();

    let result = HttpServer::new(move || {
        let app_state = app_state.clone();
        App::new()
            .wrap(Logger::new(r#"%a "%r" %s %b "%{User-Agent}i" %T"#))
            .wrap(BearerAuthMiddlewareFactory)
            .configure(move |cfg| app_state.configure(cfg))
    })
    .workers(workers)
    .bind(address)?
    .run()
    .await;

    let _ = shutdown_tx.send(true);
    let _ = worker.await;
    result
}

/// Load config.yaml, creating one with a generated JWT secret on first run.
fn bootstrap_config(runtime_root: &Path) -> Result<Config, String> {
    let config_path = runtime_root.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        std::fs::create_dir_all(runtime_root)
            .map_err(|error| format!("Failed to create runtime root: {}", error))?;
        let rendered = default_config_yaml();
        std::fs::write(&config_path, rendered)
            .map_err(|error| format!("Failed to write {}: {}", config_path.display(), error))?;
        eprintln!("[bootstrap] created {}", config_path.display());
    }
    Config::load_and_validate(runtime_root).map_err(|error| error.to_string())
}

fn default_config_yaml() -> String {
    format!(
        "server:\n  host: 127.0.0.1\n  port: 8080\nauth:\n  jwt:\n    secret: \"{}\"\n",
        generate_secret()
    )
}

fn generate_secret() -> String {
    use argon2::password_hash::rand_core::{OsRng, RngCore};
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn init_logger(level: &str) {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    };
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init();
}

struct ParsedArgs {
    runtime_root: PathBuf,
    help: bool,
}

fn parse_args() -> Result<ParsedArgs, String> {
    parse_args_from(std::env::args().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<ParsedArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut runtime_root = PathBuf::from(".");
    let mut help = false;

    while let Some(arg) = args.next() {
        if arg == "-h" || arg == "--help" {
            help = true;
        } else if arg == "-C" {
            let value = args
                .next()
                .ok_or_else(|| "Missing value for -C".to_string())?;
            runtime_root = PathBuf::from(value);
        } else {
            return Err(format!("Unknown argument: {}", arg));
        }
    }

    let runtime_root = make_runtime_root_absolute(runtime_root)?;
    Ok(ParsedArgs { runtime_root, help })
}

fn make_runtime_root_absolute(runtime_root: PathBuf) -> Result<PathBuf, String> {
    if runtime_root.is_absolute() {
        return Ok(runtime_root);
    }
    let current_dir = std::env::current_dir()
        .map_err(|error| format!("Failed to resolve current directory: {}", error))?;
    Ok(current_dir.join(runtime_root))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parse_args_defaults_to_current_directory() {
        let parsed = parse_args_from(Vec::new()).expect("parse args");
        assert!(!parsed.help);
        assert!(parsed.runtime_root.is_absolute());
    }

    #[test]
    fn parse_args_accepts_runtime_root() {
        let parsed = parse_args_from(args(&["-C", "runtime"])).expect("parse args");
        assert!(parsed.runtime_root.ends_with("runtime"));
    }

    #[test]
    fn parse_args_rejects_unknown_flags() {
        assert!(parse_args_from(args(&["--bogus"])).is_err());
    }

    #[test]
    fn parse_args_accepts_help_flag() {
        let parsed = parse_args_from(args(&["--help"])).expect("parse args");
        assert!(parsed.help);
    }

    #[test]
    fn bootstrap_writes_valid_config() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = bootstrap_config(temp.path()).expect("bootstrap");
        assert!(temp.path().join(CONFIG_FILE_NAME).exists());
        assert!(config.auth.jwt.secret.len() >= 16);

        // A second run reuses the existing file.
        let reloaded = bootstrap_config(temp.path()).expect("reload");
        assert_eq!(reloaded.auth.jwt.secret, config.auth.jwt.secret);
    }

    #[test]
    fn generated_secrets_are_unique() {
        assert_ne!(generate_secret(), generate_secret());
    }
}
