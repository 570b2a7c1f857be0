// Logging utilities
// Tag extraction and line formatting for the JSON and text log sinks.

use log::Level;
use serde_json::json;

use crate::models::aggregate::{AssessmentAggregate, Section};

/// Pull `[TAG: value]` out of `message`, returning the trimmed value and the message without it.
fn extract_tag(message: &str, tag: &str) -> (Option<String>, String) {
    let open = format!("[{}:", tag);
    let Some(start) = message.find(&open) else {
        return (None, message.to_string());
    };
    let Some(len) = message[start..].find(']') else {
        return (None, message.to_string());
    };
    let value = message[start + open.len()..start + len].trim().to_string();
    let rest = format!("{} {}", &message[..start], &message[start + len + 1..]);
    (Some(value), rest.trim().to_string())
}

/// Parse phase and step from a log message.
/// Returns `(phase, step, message)` with both tags stripped from the message.
pub fn parse_log_metadata(message: &str) -> (Option<String>, Option<String>, String) {
    let (phase, rest) = extract_tag(message, "PHASE");
    let (step, rest) = extract_tag(&rest, "STEP");
    (phase, step, rest)
}

/// One JSON object per line for the `.log` sink.
pub fn format_json_log(
    timestamp: &str,
    level: Level,
    target: &str,
    message: &str,
    phase: Option<&str>,
    step: Option<&str>,
) -> String {
    let mut entry = json!({
        "timestamp": timestamp,
        "level": level.as_str(),
        "target": target,
        "message": message,
    });
    if let Some(phase) = phase {
        entry["phase"] = json!(phase);
    }
    if let Some(step) = step {
        entry["step"] = json!(step);
    }
    serde_json::to_string(&entry).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_human_readable_log(
    timestamp: &str,
    level: Level,
    target: &str,
    message: &str,
    phase: Option<&str>,
    step: Option<&str>,
) -> String {
    let mut line = format!("[{}] [{}]", timestamp, level.as_str());
    if let Some(phase) = phase {
        line.push_str(&format!(" [PHASE: {}]", phase));
    }
    if let Some(step) = step {
        line.push_str(&format!(" [STEP: {}]", step));
    }
    line.push_str(&format!(" [{}] {}", target, message));
    line
}

/// Loggable description of an aggregate: which sections are present, never their values.
pub fn summarize_sections(aggregate: &AssessmentAggregate) -> String {
    let present = aggregate.present_sections();
    if present.is_empty() {
        return format!("0/{} sections", Section::ALL.len());
    }
    format!(
        "{}/{} sections [{}]",
        present.len(),
        Section::ALL.len(),
        present.join(", ")
    )
}
