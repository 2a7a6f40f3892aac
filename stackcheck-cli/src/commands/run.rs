//! `stackcheck run` command handler

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use stackcheck_core::config::StackcheckConfig;
use stackcheck_harness::{
    CommandVariant, MatrixReport, ProcessRunner, RunOutcome, RunRecord, TargetClient,
    compliance_suite, load_variants, runner_from_config, select,
};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command.
///
/// Loads variants and the scenario catalog, runs the selected compliance
/// tests against every selected variant, then renders the report.
///
/// # Errors
///
/// - `CliError::Core` for configuration, descriptor or catalog problems
/// - `CliError::Command` for unknown `--test` / `--variant` names
/// - `CliError::RunFailed` when at least one run failed
pub async fn execute(
    args: RunArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut config = StackcheckConfig::load_or_default(config_path).await?;
    apply_dir_overrides(&mut config, args.commands_dir, args.tests_dir);

    let variants = filter_variants(
        load_variants(&config.harness.commands_dir).await?,
        &args.variants,
    )?;
    let tests = select(compliance_suite(), &args.tests)
        .map_err(|unknown| CliError::Command(format!("unknown test(s): {}", unknown.join(", "))))?;

    info!(
        variants = variants.len(),
        tests = tests.len(),
        commands_dir = %config.harness.commands_dir,
        tests_dir = %config.harness.tests_dir,
        "starting compliance run"
    );

    let target = TargetClient::from_config(&config.target).await?;
    let tests_dir = PathBuf::from(&config.harness.tests_dir);
    let runner = runner_from_config(
        Arc::new(ProcessRunner),
        config.harness.clone(),
        tests_dir,
        target,
    )
    .await?;

    let report = runner.run_suite(&variants, &tests).await?;
    let summary = RunReport::from(report);
    writer.render(&summary)?;

    if summary.failed > 0 {
        return Err(CliError::RunFailed {
            failed: summary.failed,
            total: summary.runs.len(),
        });
    }
    Ok(())
}

/// Apply `--commands-dir` / `--tests-dir` on top of the loaded configuration.
pub(crate) fn apply_dir_overrides(
    config: &mut StackcheckConfig,
    commands_dir: Option<PathBuf>,
    tests_dir: Option<PathBuf>,
) {
    if let Some(dir) = commands_dir {
        config.harness.commands_dir = dir.display().to_string();
    }
    if let Some(dir) = tests_dir {
        config.harness.tests_dir = dir.display().to_string();
    }
}

/// Keep only the variants named on the command line, in catalog order.
///
/// An empty filter keeps everything. An unknown name is an error so that a
/// typo never silently shrinks the matrix.
fn filter_variants(
    variants: Vec<CommandVariant>,
    names: &[String],
) -> Result<Vec<CommandVariant>, CliError> {
    if variants.is_empty() {
        return Err(CliError::Command(
            "no command variants found in commands directory".to_owned(),
        ));
    }
    if names.is_empty() {
        return Ok(variants);
    }

    let unknown: Vec<&str> = names
        .iter()
        .filter(|n| !variants.iter().any(|v| &v.name == *n))
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        return Err(CliError::Command(format!(
            "unknown variant(s): {}",
            unknown.join(", ")
        )));
    }

    Ok(variants
        .into_iter()
        .filter(|v| names.contains(&v.name))
        .collect())
}

/// Compliance run summary.
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// Runs that passed every stage
    pub passed: usize,
    /// Runs with at least one finding
    pub failed: usize,
    /// Pairs excluded by a scenario's skip list
    pub skipped: usize,
    /// Variants that left workload units behind
    pub residual_variants: Vec<String>,
    /// Per-run records in execution order
    pub runs: Vec<RunRecord>,
}

impl From<MatrixReport> for RunReport {
    fn from(report: MatrixReport) -> Self {
        let residual_variants = report
            .residual_variants()
            .into_iter()
            .map(str::to_owned)
            .collect();
        Self {
            passed: report.passed(),
            failed: report.failed(),
            skipped: report.skipped(),
            residual_variants,
            runs: report.runs,
        }
    }
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        for run in &self.runs {
            let badge = match run.outcome {
                RunOutcome::Passed => "PASS".green().bold(),
                RunOutcome::Failed => "FAIL".red().bold(),
                RunOutcome::Skipped => "SKIP".yellow().bold(),
            };
            let name = run.test.as_deref().unwrap_or(run.scenario.as_str());
            writeln!(
                w,
                "[{}] {} / {} ({}, {}ms)",
                badge, name, run.variant, run.scenario, run.duration_ms
            )?;
            for finding in &run.findings {
                for line in finding.message.lines().filter(|l| !l.is_empty()) {
                    writeln!(w, "    {}", line.red())?;
                }
            }
        }

        writeln!(w)?;
        writeln!(
            w,
            "Runs: {} total, {} passed, {} failed, {} skipped",
            self.runs.len(),
            self.passed.to_string().green(),
            self.failed.to_string().red(),
            self.skipped.to_string().yellow()
        )?;
        if !self.residual_variants.is_empty() {
            writeln!(
                w,
                "{} {}",
                "Residual workload left by:".red().bold(),
                self.residual_variants.join(", ")
            )?;
        }

        Ok(())
    }
}
