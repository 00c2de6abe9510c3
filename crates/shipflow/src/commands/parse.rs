use colored::Colorize;
use shipflow_core::AppModel;
use std::path::Path;

pub fn handle(file: &Path, json: bool) -> anyhow::Result<bool> {
    let outcome = super::load_source(file)?;

    if json {
        let output = serde_json::json!({
            "model": &outcome.model,
            "errors": outcome.errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
            "warnings": outcome.warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(outcome.errors.is_empty());
    }

    print_model(&outcome.model);
    super::report_diagnostics(&outcome);

    if outcome.errors.is_empty() {
        println!();
        println!("{}", "✓ 解析完了".green().bold());
        Ok(true)
    } else {
        eprintln!();
        eprintln!(
            "{}",
            format!("✗ {}件のエラー", outcome.errors.len()).red().bold()
        );
        Ok(false)
    }
}

fn print_model(model: &AppModel) {
    println!("データストア: {}個", model.stores.len());
    for store in &model.stores {
        let parent = store
            .parent_name
            .as_deref()
            .map(|p| format!(" (親: {p})"))
            .unwrap_or_default();
        println!("  - {} [{}]{}", store.name.cyan(), store.kind, parent);
    }

    println!("ストレージ: {}個", model.storage_services.len());
    for service in &model.storage_services {
        println!("  - {} [{}]", service.name.cyan(), service.kind);
    }

    println!("サービス: {}個", model.services.len());
    for service in &model.services {
        let image = service.image.as_deref().unwrap_or("(既定)");
        println!("  - {} [{}] {}", service.name.cyan(), service.kind, image);
    }

    println!("アプリケーション: {}個", model.applications.len());
    for app in &model.applications {
        let source = app
            .source_path
            .as_deref()
            .or(app.source_identifier.as_deref())
            .unwrap_or("-");
        println!(
            "  - {} [{}, {}] {}",
            app.name.cyan(),
            app.kind,
            app.build_strategy,
            source
        );
    }

    if !model.references.is_empty() {
        println!("参照:");
        for edge in &model.references {
            match &edge.connection_string_env_var {
                Some(var) => println!("  {} → {} ({})", edge.from, edge.to, var.dimmed()),
                None => println!("  {} → {}", edge.from, edge.to),
            }
        }
    }
}
