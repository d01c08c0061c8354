//! Test runner implementation
//!
//! Executes a scenario inside one automation session. The session is always
//! quit, whatever happens in the steps, and a teardown failure never hides
//! the step failure that preceded it.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::Colorize;

use crate::common::config::DiagnosticsConfig;
use crate::common::{paths, Error, Result};
use crate::webdriver::{Capabilities, Session, WebDriverClient};

use super::config::{TestScenario, TestStep};

/// File name of the hierarchy captured after a failure
pub const FINAL_SOURCE_FILE: &str = "final-source.xml";

/// Result of a test run
#[derive(Debug)]
pub struct TestResult {
    pub name: String,
    /// True only if every step passed and the session was quit cleanly
    pub passed: bool,
    pub steps_run: usize,
    pub steps_total: usize,
    /// First step failure
    pub error: Option<String>,
    /// Failure to quit the session
    pub teardown_error: Option<String>,
    /// UI hierarchy captured after a step failure
    pub final_source: Option<String>,
}

/// Knobs for a run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub verbose: bool,
    /// Replaces the duration of every wait step
    pub wait_override: Option<Duration>,
    /// Where to write hierarchy dumps
    pub artifacts_dir: Option<PathBuf>,
    pub capture_source_on_failure: bool,
    pub print_source: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_diagnostics(&DiagnosticsConfig::default())
    }
}

impl RunOptions {
    pub fn from_diagnostics(diagnostics: &DiagnosticsConfig) -> Self {
        Self {
            verbose: false,
            wait_override: None,
            artifacts_dir: None,
            capture_source_on_failure: diagnostics.capture_source_on_failure,
            print_source: diagnostics.print_source,
        }
    }
}

/// Run a scenario against the automation server
///
/// Returns `Err` when no session could be started (invalid capabilities or
/// session creation failure). Everything after that is reported through
/// [`TestResult`]. SIGINT or SIGTERM during the steps fails the run, but the
/// session is still inspected and quit.
pub async fn run_scenario(
    client: &WebDriverClient,
    base_caps: &Capabilities,
    scenario: &TestScenario,
    options: &RunOptions,
) -> Result<TestResult> {
    run_scenario_until(client, base_caps, scenario, options, shutdown_signal()).await
}

/// Run a scenario, stopping the steps early when `interrupt` completes
///
/// `interrupt` resolves to the name of whatever stopped the run.
pub async fn run_scenario_until<F>(
    client: &WebDriverClient,
    base_caps: &Capabilities,
    scenario: &TestScenario,
    options: &RunOptions,
    interrupt: F,
) -> Result<TestResult>
where
    F: Future<Output = &'static str>,
{
    let mut caps = base_caps.clone();
    caps.apply_overrides(&scenario.capabilities)?;
    caps.validate()?;

    let steps_total = scenario.steps.len();

    println!(
        "\n{} {}",
        "Running Test:".blue().bold(),
        scenario.name.white().bold()
    );
    if let Some(desc) = &scenario.description {
        println!("  {}", desc.dimmed());
    }

    let caps_json = serde_json::to_string(&caps.desired()?)?;
    tracing::info!("Initializing session with capabilities: {}", caps_json);

    println!("\n{}", "Starting session...".cyan());
    if options.verbose {
        println!("  Server: {}", client.base_url().dimmed());
        println!("  Capabilities: {}", caps_json.dimmed());
    }

    let session = client.new_session(&caps).await?;
    println!("  {} App started (session {})", "✓".green(), session.id().dimmed());

    println!("\n{}", "Steps:".cyan());

    let mut steps_run = 0;
    let failure = tokio::select! {
        failure = execute_steps(&session, scenario, options, &mut steps_run) => failure,
        signal = interrupt => Some(Error::Interrupted(signal.to_string())),
    };
    if let Some(e @ Error::Interrupted(_)) = &failure {
        println!("  {} Step {}: {}", "✗".red(), steps_run.max(1), e);
        tracing::warn!("{} during step {}, stopping", e, steps_run);
    }

    let final_source = if failure.is_some() && options.capture_source_on_failure {
        capture_final_source(&session, options).await
    } else {
        None
    };

    println!("\n{}", "Cleaning up...".cyan());
    let teardown_error = match session.quit().await {
        Ok(()) => {
            println!("  {} Session closed", "✓".green());
            None
        }
        Err(e) => {
            println!("  {} {}", "✗".red(), e);
            tracing::error!("{}", e);
            Some(e.to_string())
        }
    };

    let passed = failure.is_none() && teardown_error.is_none();
    if passed {
        println!("\n{} {}\n", "✓".green().bold(), "Test Passed".green().bold());
    } else {
        println!("\n{} {}\n", "✗".red().bold(), "Test Failed".red().bold());
    }

    Ok(TestResult {
        name: scenario.name.clone(),
        passed,
        steps_run,
        steps_total,
        error: failure.map(|e| e.to_string()),
        teardown_error,
        final_source,
    })
}

/// Execute steps in order, stopping at the first failure
///
/// `steps_run` is updated as each step starts so it stays accurate if the
/// run is interrupted mid-step.
async fn execute_steps(
    session: &Session,
    scenario: &TestScenario,
    options: &RunOptions,
    steps_run: &mut usize,
) -> Option<Error> {
    for (i, step) in scenario.steps.iter().enumerate() {
        let step_num = i + 1;
        *steps_run = step_num;

        if let Err(e) = execute_step(session, step, step_num, options).await {
            println!("  {} Step {}: {}", "✗".red(), step_num, e);
            tracing::error!("Step {} ({}) failed: {}", step_num, step.label(), e);
            return Some(e);
        }
    }
    None
}

/// Wait for SIGINT or SIGTERM and return its name
async fn shutdown_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => "SIGTERM",
                    Ok(()) = tokio::signal::ctrl_c() => "SIGINT",
                }
            }
            Err(e) => {
                tracing::warn!("Could not install SIGTERM handler: {}", e);
                ctrl_c().await
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await
    }
}

async fn ctrl_c() -> &'static str {
    match tokio::signal::ctrl_c().await {
        Ok(()) => "SIGINT",
        Err(e) => {
            tracing::warn!("Could not install Ctrl+C handler: {}", e);
            std::future::pending().await
        }
    }
}

/// Execute a single test step
async fn execute_step(
    session: &Session,
    step: &TestStep,
    step_num: usize,
    options: &RunOptions,
) -> Result<()> {
    match step {
        TestStep::Wait { ms } => {
            let duration = options
                .wait_override
                .unwrap_or_else(|| Duration::from_millis(*ms));
            session.sleep(duration).await;
            println!(
                "  {} Step {}: wait {}",
                "✓".green(),
                step_num,
                format!("{}ms", duration.as_millis()).dimmed()
            );
        }

        TestStep::CurrentPackage { expect } => {
            let package = session.current_package().await?;
            if let Some(exp) = expect {
                exp.check("current package", &package)?;
            }
            println!(
                "  {} Step {}: current package = {}",
                "✓".green(),
                step_num,
                package.dimmed()
            );
        }

        TestStep::CurrentActivity { expect } => {
            let activity = session.current_activity().await?;
            if let Some(exp) = expect {
                exp.check("current activity", &activity)?;
            }
            println!(
                "  {} Step {}: current activity = {}",
                "✓".green(),
                step_num,
                activity.dimmed()
            );
        }

        TestStep::Source => {
            let source = session.source().await?;
            tracing::debug!("App hierarchy: {}", source);
            write_artifact(
                options.artifacts_dir.as_deref(),
                &format!("source-step-{}.xml", step_num),
                &source,
            );
            println!(
                "  {} Step {}: source ({} bytes)",
                "✓".green(),
                step_num,
                source.len()
            );
            if options.print_source {
                println!("{}", source.dimmed());
            }
        }

        TestStep::FindElements { locator, expect } => {
            let elements = session.find_elements(locator).await?;
            if let Some(exp) = expect {
                exp.check(locator, elements.len())?;
            }
            println!(
                "  {} Step {}: found {} elements by {}",
                "✓".green(),
                step_num,
                elements.len(),
                locator.to_string().dimmed()
            );
        }

        TestStep::Click { locator } => {
            let element = session.find_element(locator).await?;
            session.click(&element).await?;
            println!(
                "  {} Step {}: click {}",
                "✓".green(),
                step_num,
                locator.to_string().dimmed()
            );
        }

        TestStep::AssertDisplayed { locator, message } => {
            let element = session.find_element(locator).await?;
            if !session.is_displayed(&element).await? {
                return Err(Error::Assertion(match message {
                    Some(message) => format!("{} ({} is not displayed)", message, locator),
                    None => format!("{} is not displayed", locator),
                }));
            }
            println!(
                "  {} Step {}: {} is displayed",
                "✓".green(),
                step_num,
                locator.to_string().dimmed()
            );
        }

        TestStep::AssertText { locator, expect } => {
            let element = session.find_element(locator).await?;
            let text = session.text(&element).await?;
            expect.check(&format!("text of {}", locator), &text)?;
            println!(
                "  {} Step {}: text of {} = {}",
                "✓".green(),
                step_num,
                locator.to_string().dimmed(),
                text.dimmed()
            );
        }
    }

    Ok(())
}

/// Dump the UI hierarchy after a failure; a failed dump is only logged
async fn capture_final_source(session: &Session, options: &RunOptions) -> Option<String> {
    println!("\n{}", "Test did not pass. Getting final app state...".yellow());
    match session.source().await {
        Ok(source) => {
            println!("Final app state:\n{}", source.dimmed());
            write_artifact(options.artifacts_dir.as_deref(), FINAL_SOURCE_FILE, &source);
            Some(source)
        }
        Err(e) => {
            println!("  {} Could not get final app state: {}", "✗".red(), e);
            tracing::warn!("Could not get final app state: {}", e);
            None
        }
    }
}

/// Write a diagnostic file into the artifacts directory, if one is set
fn write_artifact(dir: Option<&Path>, name: &str, content: &str) {
    let Some(dir) = dir else {
        return;
    };

    let result = paths::ensure_artifacts_dir(dir).and_then(|dir| {
        let path = dir.join(name);
        std::fs::write(&path, content).map(|()| path)
    });

    match result {
        Ok(path) => tracing::debug!("Wrote {}", path.display()),
        Err(e) => tracing::warn!("Could not write {} to {}: {}", name, dir.display(), e),
    }
}
