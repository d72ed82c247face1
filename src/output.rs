//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Compress
//!
//! ```text
//! [1/3] photos/dawn.jpg
//!     1200.0KB → 258.4KB (-78.5%)
//!     2000x1500 → 800x600 at q55
//!     Backup: photos/dawn.jpg.backup
//! [2/3] photos/logo.png
//!     180.2KB, under budget
//! [3/3] photos/anim.gif
//!     Failed: Unsupported format: photos/anim.gif
//!
//! Summary
//!     Successful: 2
//!     Failed: 1
//!     Original total: 2080.2KB (2.03MB)
//!     Final total: 1138.6KB (1.11MB)
//!     Average image size: 379.5KB (0.37MB)
//!     Saved: 941.6KB (45.3%)
//! ```
//!
//! ## Plan
//!
//! ```text
//! photos/dawn.jpg (1200.0KB, 2000x1500, JPEG)
//!     Scales: 0.6, 0.5, 0.4, 0.35
//!     Settings: q85, q75, q65, q55, q45
//!     Fallback: 0.335 at q45
//!     Max trials: 21
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O and no side effects.

use crate::imaging::{EncodeSetting, PngCompression};
use crate::policy::KIB;
use crate::process::{BatchSummary, FilePlan, ProcessEvent};
use crate::types::CompressionOutcome;
use std::path::Path;

/// `1234567` → `"1205.6KB"`
fn format_kb(bytes: u64) -> String {
    format!("{:.1}KB", bytes as f64 / KIB as f64)
}

/// `2097152` → `"2048.0KB (2.00MB)"`
fn format_total(bytes: u64) -> String {
    format!(
        "{} ({:.2}MB)",
        format_kb(bytes),
        bytes as f64 / (KIB * KIB) as f64
    )
}

fn progress_header(index: usize, total: usize, path: &Path) -> String {
    format!("[{}/{}] {}", index, total, path.display())
}

fn setting_label(setting: EncodeSetting) -> String {
    match setting {
        EncodeSetting::Jpeg(q) => format!("q{}", q.value()),
        EncodeSetting::Png(level) => match level {
            PngCompression::Fast => "png fast".to_string(),
            PngCompression::Default => "png default".to_string(),
            PngCompression::Best => "png best".to_string(),
        },
    }
}

/// Trim trailing zeros: `0.5` → `"0.5"`, `0.335` → `"0.335"`.
fn format_scale(scale: f64) -> String {
    let s = format!("{:.4}", scale);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn outcome_lines(outcome: &CompressionOutcome) -> Vec<String> {
    if outcome.unchanged() {
        return vec![format!("    {}, under budget", format_kb(outcome.original_bytes))];
    }

    let mut lines = vec![format!(
        "    {} \u{2192} {} (-{:.1}%)",
        format_kb(outcome.original_bytes),
        format_kb(outcome.final_bytes),
        outcome.reduction_percent()
    )];
    let quality = outcome
        .quality
        .map(|q| format!(" at q{}", q))
        .unwrap_or_default();
    lines.push(format!(
        "    {}x{} \u{2192} {}x{}{}",
        outcome.original_width,
        outcome.original_height,
        outcome.final_width,
        outcome.final_height,
        quality
    ));
    if outcome.fallback {
        lines.push("    Fallback: target not reachable above the width floor".to_string());
    }
    if let Some(backup) = &outcome.backup {
        lines.push(format!("    Backup: {}", backup.display()));
    }
    lines
}

/// Format a single progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Compressed {
            index,
            total,
            outcome,
        } => {
            let mut lines = vec![progress_header(*index, *total, &outcome.path)];
            lines.extend(outcome_lines(outcome));
            lines
        }
        ProcessEvent::Failed {
            index,
            total,
            path,
            error,
            ..
        } => vec![
            progress_header(*index, *total, path),
            format!("    Failed: {}", error),
        ],
    }
}

/// Format the batch tally.
pub fn format_summary(summary: &BatchSummary) -> Vec<String> {
    let mut lines = vec![String::new(), "Summary".to_string()];
    lines.push(format!("    Successful: {}", summary.successful));
    lines.push(format!("    Failed: {}", summary.failed));
    if summary.unchanged > 0 {
        lines.push(format!("    Under budget: {}", summary.unchanged));
    }
    if summary.fallbacks > 0 {
        lines.push(format!("    Fallbacks: {}", summary.fallbacks));
    }
    lines.push(format!(
        "    Original total: {}",
        format_total(summary.original_bytes)
    ));
    lines.push(format!("    Final total: {}", format_total(summary.final_bytes)));
    if let Some(avg) = summary.average_final_bytes() {
        lines.push(format!("    Average image size: {}", format_total(avg)));
    }
    lines.push(format!(
        "    Saved: {} ({:.1}%)",
        format_kb(summary.saved_bytes()),
        summary.saved_percent()
    ));
    lines
}

/// Print the batch tally to stdout.
pub fn print_summary(summary: &BatchSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

/// Format the trial plan for one file.
pub fn format_plan(file: &FilePlan) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({}, {}x{}, {})",
        file.path.display(),
        format_kb(file.bytes),
        file.width,
        file.height,
        file.family.container()
    )];
    let Some(plan) = &file.plan else {
        lines.push("    Under budget, nothing to do".to_string());
        return lines;
    };

    let scales: Vec<String> = plan.scales.iter().map(|&s| format_scale(s)).collect();
    let settings: Vec<String> = plan.settings.iter().map(|&s| setting_label(s)).collect();
    lines.push(format!("    Scales: {}", scales.join(", ")));
    lines.push(format!("    Settings: {}", settings.join(", ")));
    lines.push(format!(
        "    Fallback: {} at {}",
        format_scale(plan.fallback.scale),
        setting_label(plan.fallback.setting)
    ));
    lines.push(format!("    Max trials: {}", plan.max_trials()));
    lines
}

pub fn print_plan(file: &FilePlan) {
    for line in format_plan(file) {
        println!("{}", line);
    }
}
