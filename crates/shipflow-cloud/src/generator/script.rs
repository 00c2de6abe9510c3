//! Shell script rendering

use super::{ENVIRONMENT_ID_VAR, GenerateOptions, Operation, PROJECT_ID_VAR, placeholder};
use std::fmt::Write as _;

pub const API_URL_VAR: &str = "SHIPFLOW_API_URL";
pub const API_TOKEN_VAR: &str = "SHIPFLOW_API_TOKEN";

const HEREDOC_DELIMITER: &str = "SHIPFLOW_PAYLOAD";

/// Render operations as a bash script that replays them with curl
///
/// The script refuses to run unless every required variable is set. Payloads go
/// through an unquoted heredoc, so everything except the identifier placeholders
/// is escaped.
pub fn render_script(operations: &[Operation], options: &GenerateOptions) -> String {
    let mut out = String::new();
    let required = options.required_variables();

    out.push_str("#!/usr/bin/env bash\n");
    if options.include_comments {
        out.push_str("# Generated by shipflow. Creates the resources below in order.\n");
        let _ = writeln!(out, "# Required: {}", required.join(", "));
    }
    out.push_str("set -euo pipefail\n\n");

    let _ = writeln!(out, "for var in {}; do", required.join(" "));
    out.push_str("  if [ -z \"${!var:-}\" ]; then\n");
    out.push_str("    echo \"error: $var is not set\" >&2\n");
    out.push_str("    exit 1\n");
    out.push_str("  fi\n");
    out.push_str("done\n");

    for operation in operations {
        out.push('\n');
        if options.include_comments {
            let _ = writeln!(out, "# [{}] {}", operation.category, operation.display_name);
            if let Some(annotation) = &operation.annotation {
                let _ = writeln!(out, "# {}", annotation.replace('\n', " "));
            }
        }
        let _ = writeln!(
            out,
            "echo {}",
            shell_quote(&format!(
                "Creating {} {}",
                operation.category, operation.display_name
            ))
        );
        let _ = writeln!(
            out,
            "curl -fsS -X {} \"${{{API_URL_VAR}}}{}\" \\",
            operation.method, operation.endpoint
        );
        let _ = writeln!(out, "  -H \"Authorization: Bearer ${{{API_TOKEN_VAR}}}\" \\");
        out.push_str("  -H \"Content-Type: application/json\" \\\n");
        let _ = writeln!(out, "  --data-binary @- <<{HEREDOC_DELIMITER}");
        out.push_str(&heredoc_body(&operation.payload));
        out.push('\n');
        out.push_str(HEREDOC_DELIMITER);
        out.push('\n');
        out.push_str("echo\n");
    }

    out
}

/// Pretty JSON with shell expansion disabled except for the identifier placeholders
fn heredoc_body(payload: &serde_json::Value) -> String {
    let json = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
    let mut escaped = json
        .replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace('$', "\\$");
    for var in [PROJECT_ID_VAR, ENVIRONMENT_ID_VAR] {
        let expanded = placeholder(var);
        escaped = escaped.replace(&format!("\\{expanded}"), &expanded);
    }
    escaped
}

/// Single-quote a string for the shell
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}
