//! Format registry status and reload history as text or JSON.

use crate::error::ApiError;
use crate::types::{RegistryStatus, ReloadRecord};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn format_status_text(status: &RegistryStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Units")));

    if status.units.is_empty() {
        out.push_str("No units registered.\n\n");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Unit", "Reloads", "Last reloaded", "Source"]);
        for (name, unit) in &status.units {
            table.add_row(vec![
                name.clone(),
                unit.reload_count.to_string(),
                unit.last_reloaded_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string()),
                unit.source_location
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]);
        }
        out.push_str(&format!("{}\n\n", table));
    }

    out.push_str(&format!("{}\n\n", format_section_heading("Totals")));
    out.push_str(&format!("  Units: {}\n", status.units.len()));
    out.push_str(&format!("  Successful reloads: {}\n", status.total_reloads));
    out.push_str(&format!("  History entries: {}\n", status.history_length));
    if let Some(at) = status.last_history_at {
        out.push_str(&format!("  Last attempt: {}\n", at.to_rfc3339()));
    }
    out
}

pub fn format_history_text(records: &[ReloadRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Reload history")));
    if records.is_empty() {
        out.push_str("No reload attempts recorded.\n");
        return out;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Time", "Unit", "Result", "Duration", "Error"]);
    for record in records {
        table.add_row(vec![
            record.timestamp.to_rfc3339(),
            record.unit_name.clone(),
            if record.success { "ok" } else { "failed" }.to_string(),
            format!("{}ms", record.duration_ms),
            record.error.clone().unwrap_or_default(),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

/// One line per record, as printed by `reload` and `watch`.
pub fn format_record_line(record: &ReloadRecord) -> String {
    if record.success {
        format!(
            "{} {} ({}ms)",
            "reloaded".green(),
            record.unit_name,
            record.duration_ms
        )
    } else {
        format!(
            "{} {}: {}",
            "failed".red(),
            record.unit_name,
            record.error.as_deref().unwrap_or("unknown error")
        )
    }
}

pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    Ok(serde_json::to_string_pretty(value)?)
}
