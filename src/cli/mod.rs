//! CLI command handling
//!
//! Resolves configuration for each command and formats output.

use std::time::Duration;

use colored::Colorize;

use crate::commands::{Commands, ServerArgs};
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::testing::{self, scenarios, RunOptions, TestResult};
use crate::webdriver::{Capabilities, WebDriverClient};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, verbose: bool) -> Result<()> {
    match command {
        Commands::Run {
            scenario,
            server,
            artifacts,
            wait_ms,
            quiet_source,
        } => {
            let config = load_config(&server)?;
            let client = WebDriverClient::from_config(&config.server)?;
            let caps = Capabilities::from_env(&config.capabilities);
            let scenario =
                scenarios::resolve(scenario.as_deref().unwrap_or(scenarios::DEFAULT_SCENARIO))?;

            let mut options = RunOptions::from_diagnostics(&config.diagnostics);
            options.verbose = verbose;
            options.artifacts_dir = artifacts;
            options.wait_override = wait_ms.map(Duration::from_millis);
            if quiet_source {
                options.print_source = false;
            }

            let result = testing::run_scenario(&client, &caps, &scenario, &options).await?;
            print_summary(&result);

            if result.passed {
                Ok(())
            } else {
                Err(Error::ScenarioFailed {
                    reason: result
                        .error
                        .or(result.teardown_error)
                        .unwrap_or_else(|| "unknown failure".to_string()),
                    name: result.name,
                })
            }
        }

        Commands::Caps { scenario, config } => {
            let config = Config::load(config.as_deref())?;
            let scenario =
                scenarios::resolve(scenario.as_deref().unwrap_or(scenarios::DEFAULT_SCENARIO))?;

            let mut caps = Capabilities::from_env(&config.capabilities);
            caps.apply_overrides(&scenario.capabilities)?;

            println!("{}", serde_json::to_string_pretty(&caps.new_session_payload()?)?);

            if let Err(e) = caps.validate() {
                eprintln!("{} {}", "Warning:".yellow(), e);
            }
            Ok(())
        }

        Commands::List => {
            for name in scenarios::builtin_names() {
                let description = scenarios::builtin(name)
                    .and_then(|s| s.ok())
                    .and_then(|s| s.description)
                    .unwrap_or_default();
                let marker = if name == scenarios::DEFAULT_SCENARIO {
                    " (default)"
                } else {
                    ""
                };
                println!("{}{}", name.bold(), marker);
                if !description.is_empty() {
                    println!("  {}", description.dimmed());
                }
            }
            Ok(())
        }

        Commands::Status { server } => {
            let config = load_config(&server)?;
            let client = WebDriverClient::from_config(&config.server)?;
            let status = client.status().await?;

            println!("Server: {}", client.base_url());
            match status.ready {
                Some(true) => println!("Ready: yes"),
                Some(false) => println!("Ready: no"),
                None => println!("Ready: unknown"),
            }
            if let Some(message) = status.message {
                println!("Message: {}", message);
            }
            if let Some(build) = status.build {
                println!("Build: {}", build);
            }
            Ok(())
        }
    }
}

/// Load config, then apply the environment and command-line overrides
fn load_config(args: &ServerArgs) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok());
    if let Some(url) = &args.server {
        config.server.url = url.clone();
    }
    Ok(config)
}

fn print_summary(result: &TestResult) {
    let status = if result.passed {
        "PASSED".green().bold()
    } else {
        "FAILED".red().bold()
    };
    println!(
        "{}: {} ({}/{} steps run)",
        result.name, status, result.steps_run, result.steps_total
    );
    if let Some(error) = &result.error {
        println!("  Error: {}", error);
    }
    if let Some(error) = &result.teardown_error {
        println!("  Teardown: {}", error);
    }
}
