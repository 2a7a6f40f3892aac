//! `stackcheck scenarios` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use stackcheck_core::config::StackcheckConfig;
use stackcheck_harness::{ComplianceTest, ScenarioCatalog, compliance_suite};

use crate::cli::ScenariosArgs;
use crate::commands::run::apply_dir_overrides;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `scenarios` command.
pub async fn execute(
    args: ScenariosArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut config = StackcheckConfig::load_or_default(config_path).await?;
    apply_dir_overrides(&mut config, None, args.tests_dir);

    let catalog = ScenarioCatalog::load(&config.harness.tests_dir).await?;
    let report = ScenariosReport::new(&config.harness.tests_dir, &catalog, &compliance_suite());
    writer.render(&report)?;
    Ok(())
}

/// Scenario directories cross-referenced with the built-in tests.
#[derive(Debug, Serialize)]
pub struct ScenariosReport {
    /// Scenario root directory
    pub tests_dir: String,
    /// Directories found on disk, sorted by name
    pub scenarios: Vec<ScenarioSummary>,
    /// Tests whose scenario directory is absent from the catalog
    pub missing: Vec<MissingScenario>,
}

#[derive(Debug, Serialize)]
pub struct ScenarioSummary {
    pub name: String,
    /// Tests that run this scenario
    pub tests: Vec<String>,
    /// Variants skipped by at least one of those tests
    pub skip_variants: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MissingScenario {
    pub test: String,
    pub scenario: String,
}

impl ScenariosReport {
    fn new(tests_dir: &str, catalog: &ScenarioCatalog, suite: &[ComplianceTest]) -> Self {
        let scenarios = catalog
            .names()
            .map(|name| {
                let users: Vec<&ComplianceTest> = suite
                    .iter()
                    .filter(|t| t.scenario.directory == name)
                    .collect();
                let mut skip_variants: Vec<String> = users
                    .iter()
                    .flat_map(|t| t.scenario.skip_variants.iter().cloned())
                    .collect();
                skip_variants.sort();
                skip_variants.dedup();
                ScenarioSummary {
                    name: name.to_owned(),
                    tests: users.iter().map(|t| t.name.clone()).collect(),
                    skip_variants,
                }
            })
            .collect();

        let missing = suite
            .iter()
            .filter(|t| !catalog.contains(&t.scenario.directory))
            .map(|t| MissingScenario {
                test: t.name.clone(),
                scenario: t.scenario.directory.clone(),
            })
            .collect();

        Self {
            tests_dir: tests_dir.to_owned(),
            scenarios,
            missing,
        }
    }
}

impl Render for ScenariosReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Scenarios in {} ({})",
            self.tests_dir.bold(),
            self.scenarios.len()
        )?;
        for s in &self.scenarios {
            let used_by = if s.tests.is_empty() {
                "unused".dimmed().to_string()
            } else {
                s.tests.join(", ")
            };
            write!(w, "  {:<24} {}", s.name.cyan(), used_by)?;
            if !s.skip_variants.is_empty() {
                write!(w, " (skips: {})", s.skip_variants.join(", "))?;
            }
            writeln!(w)?;
        }

        if !self.missing.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", "Missing scenario directories:".red().bold())?;
            for m in &self.missing {
                writeln!(w, "  {} (needed by {})", m.scenario.red(), m.test)?;
            }
        }
        Ok(())
    }
}
