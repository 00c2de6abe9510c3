pub mod deploy;
pub mod generate;
pub mod parse;

use anyhow::Context;
use colored::Colorize;
use shipflow_core::ParseOutcome;
use std::path::Path;

/// ソースファイルを読み込んで解析する
pub fn load_source(file: &Path) -> anyhow::Result<ParseOutcome> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("ソースファイルを読み込めません: {}", file.display()))?;
    let outcome = shipflow_core::parse_source(&source);
    tracing::debug!(
        resources = outcome.model.resource_count(),
        errors = outcome.errors.len(),
        warnings = outcome.warnings.len(),
        "parsed {}",
        file.display()
    );
    Ok(outcome)
}

/// 解析エラーと警告を stderr に表示
pub fn report_diagnostics(outcome: &ParseOutcome) {
    for warning in &outcome.warnings {
        eprintln!("{} {}", "⚠".yellow(), warning);
    }
    for error in &outcome.errors {
        eprintln!("{} {}", "✗".red(), error);
    }
}
