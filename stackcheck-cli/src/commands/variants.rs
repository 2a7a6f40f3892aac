//! `stackcheck variants` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use stackcheck_core::config::StackcheckConfig;
use stackcheck_harness::{CommandVariant, load_variants};

use crate::cli::VariantsArgs;
use crate::commands::run::apply_dir_overrides;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `variants` command.
pub async fn execute(
    args: VariantsArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut config = StackcheckConfig::load_or_default(config_path).await?;
    apply_dir_overrides(&mut config, args.commands_dir, None);

    let variants = load_variants(&config.harness.commands_dir).await?;
    let report = VariantsReport::new(config.harness.commands_dir, &variants);
    writer.render(&report)?;
    Ok(())
}

/// Loaded variants with their rendered command lines.
#[derive(Debug, Serialize)]
pub struct VariantsReport {
    /// Descriptor directory
    pub commands_dir: String,
    /// One entry per descriptor, in file name order
    pub variants: Vec<VariantSummary>,
}

/// A single variant's effective invocations.
#[derive(Debug, Serialize)]
pub struct VariantSummary {
    pub name: String,
    pub command: String,
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub list_command: String,
}

impl VariantsReport {
    fn new(commands_dir: String, variants: &[CommandVariant]) -> Self {
        let variants = variants
            .iter()
            .map(|v| VariantSummary {
                name: v.name.clone(),
                command: v.command.clone(),
                up: v.up_args(),
                down: v.down_args(),
                list_command: v.list_command.clone(),
            })
            .collect();
        Self {
            commands_dir,
            variants,
        }
    }
}

impl Render for VariantsReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Variants in {} ({})",
            self.commands_dir.bold(),
            self.variants.len()
        )?;
        if self.variants.is_empty() {
            writeln!(w, "  (none)")?;
            return Ok(());
        }

        for v in &self.variants {
            writeln!(w)?;
            writeln!(w, "  {}", v.name.cyan().bold())?;
            writeln!(w, "    up:   {} {}", v.command, v.up.join(" "))?;
            writeln!(w, "    down: {} {}", v.command, v.down.join(" "))?;
            writeln!(w, "    list: {}", v.list_command)?;
        }
        Ok(())
    }
}
