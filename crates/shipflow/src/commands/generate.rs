use anyhow::Context;
use colored::Colorize;
use shipflow_cloud::GenerateOptions;
use std::path::Path;

pub fn handle(file: &Path, output: Option<&Path>, options: GenerateOptions) -> anyhow::Result<bool> {
    let outcome = super::load_source(file)?;
    super::report_diagnostics(&outcome);

    let result = shipflow_cloud::generate(&outcome.model, &options);
    for warning in &result.warnings {
        eprintln!("{} {}", "⚠".yellow(), warning);
    }
    for error in &result.errors {
        eprintln!("{} {}", "✗".red(), error);
    }

    match output {
        Some(path) => {
            std::fs::write(path, &result.script)
                .with_context(|| format!("書き込みに失敗しました: {}", path.display()))?;
            make_executable(path)?;
            eprintln!(
                "{} {}件の操作を {} に書き出しました",
                "✓".green(),
                result.operations.len(),
                path.display().to_string().cyan()
            );
        }
        None => print!("{}", result.script),
    }

    Ok(outcome.errors.is_empty() && result.errors.is_empty())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = std::fs::metadata(path)?.permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(path, permissions)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}
