use std::{error::Error, process::ExitCode};

use tracing::debug;
use tracing_subscriber::EnvFilter;

use servicectl::{
    cli::{Cli, Commands, parse_args},
    config::load_config,
    manager::ServiceManager,
    status::{ServiceStatus, StatusReport},
};

fn main() -> ExitCode {
    let args = parse_args();
    init_logging(&args);

    match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("svcctl: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(args: &Cli) {
    let filter = if let Some(level) = args.log_level {
        EnvFilter::new(level.as_str())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(args: Cli) -> Result<ExitCode, Box<dyn Error>> {
    let config = load_config(args.config.as_deref())?;
    debug!("Loaded {} service(s) from configuration", config.services.len());
    let manager = ServiceManager::from_config(&config)?;

    match &args.command {
        Commands::Status { json, .. } => {
            let filter = args.command.status_filter().unwrap_or_default();
            let statuses = manager.query_all(Some(&filter));
            if *json {
                println!("{}", serde_json::to_string_pretty(&StatusReport::new(statuses))?);
            } else {
                for status in &statuses {
                    println!("{}", status_line(status));
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Started { service } => {
            let started = manager.is_started(service)?;
            println!("{started}");
            Ok(if started {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        command => {
            if let Some((verb, target)) = command.action() {
                let status = manager.perform(verb, &target.service, &target.extra)?;
                println!("{}", status_line(&status));
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// `name STATE pid...`
fn status_line(status: &ServiceStatus) -> String {
    let mut line = format!("{} {}", status.service, status.state);
    for pid in &status.pids {
        line.push(' ');
        line.push_str(&pid.to_string());
    }
    line
}
