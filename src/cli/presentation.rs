//! CLI presentation: text and json formatters per command.

use crate::assembler::WorkflowResponse;
use crate::config::ValidationError;
use crate::error::ApiError;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;

/// Backend reachability as reported by `health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub backend: String,
    pub endpoint: String,
    pub healthy: bool,
    pub detail: String,
}

fn heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn format_generate_text(responses: &[WorkflowResponse]) -> String {
    let mut output = String::new();
    for response in responses {
        match response {
            WorkflowResponse::Success(result) => {
                output.push_str(&heading(&result.instruction));
                output.push('\n');
                output.push_str(&format!("Status: {}\n\n", result.status.green()));
                output.push_str(&format!("{}\n\n", result.mini_lesson.trim()));

                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.set_header(vec!["#", "Question", "Answer", "Category"]);
                for (index, card) in result.flashcards.iter().enumerate() {
                    table.add_row(vec![
                        (index + 1).to_string(),
                        card.question.clone(),
                        card.answer.clone(),
                        card.category.to_string(),
                    ]);
                }
                output.push_str(&format!("{}\n", table));
                output.push_str(&format!(
                    "Generated by {} at {}\n\n",
                    result.workflow_info.agent, result.workflow_info.timestamp
                ));
            }
            WorkflowResponse::Error(result) => {
                output.push_str(&heading(&result.instruction));
                output.push('\n');
                output.push_str(&format!("Status: {}\n", result.status.red()));
                output.push_str(&format!("Error: {}\n\n", result.error));
            }
        }
    }

    let succeeded = responses.iter().filter(|r| r.is_success()).count();
    output.push_str(&format!(
        "{} of {} workflow(s) succeeded",
        succeeded,
        responses.len()
    ));
    output
}

/// A single response prints as an object, several as an array
pub fn format_generate_json(responses: &[WorkflowResponse]) -> Result<String, ApiError> {
    let rendered = match responses {
        [single] => serde_json::to_string_pretty(single)?,
        many => serde_json::to_string_pretty(many)?,
    };
    Ok(rendered)
}

pub fn format_models_text(backend: &str, models: &[String]) -> String {
    if models.is_empty() {
        return format!("No models reported by {}.", backend);
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Model"]);
    for model in models {
        table.add_row(vec![model.clone()]);
    }
    format!(
        "{}\n{}\n\nTotal: {} model(s)",
        heading(&format!("Models ({})", backend)),
        table,
        models.len()
    )
}

pub fn format_models_json(backend: &str, models: &[String]) -> String {
    let out = json!({ "backend": backend, "models": models, "total": models.len() });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_health_text(report: &HealthReport) -> String {
    let status = if report.healthy {
        format!("{}", "healthy".green())
    } else {
        format!("{}", "unhealthy".red())
    };
    format!(
        "Backend: {}\nEndpoint: {}\nStatus: {}\n{}",
        report.backend, report.endpoint, status, report.detail
    )
}

pub fn format_config_validation(result: &Result<(), Vec<ValidationError>>) -> String {
    match result {
        Ok(()) => "Configuration is valid.".to_string(),
        Err(errors) => {
            let mut output = format!("Configuration has {} problem(s):\n", errors.len());
            for error in errors {
                output.push_str(&format!("  - {}\n", error));
            }
            output.trim_end().to_string()
        }
    }
}
