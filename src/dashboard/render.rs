//! Terminal and JSON rendering of a [`DashboardView`].

use super::view::*;
use super::{HEATMAP_INFO, HEATMAP_PLACEHOLDER, NO_INSIGHTS};
use crate::format::format_chart_value;
use crate::trends::TrendChart;
use anyhow::{Context, Result};
use colored::Colorize;
use std::fmt::Write;

const RULE_WIDTH: usize = 80;

pub fn render_json(view: &DashboardView, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(view)
    } else {
        serde_json::to_string(view)
    };
    json.context("Failed to serialize dashboard")
}

pub fn render_text(view: &DashboardView) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "\n{}", "=".repeat(RULE_WIDTH).bright_cyan());
    let _ = writeln!(out, "{}", "Cohort Analysis Dashboard".bright_white().bold());
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH).bright_cyan());

    for note in &view.notifications {
        let line = format!("{}: {}", note.title, note.description);
        let line = match note.variant {
            NotificationVariant::Destructive => line.bright_red().bold(),
            NotificationVariant::Default => line.bright_yellow(),
        };
        let _ = writeln!(out, "\n{} {}", "⚠".bright_red(), line);
    }

    if !view.has_result {
        let _ = writeln!(
            out,
            "\n{} {}",
            "📊".bright_yellow(),
            "No Analysis Results Yet".bright_white().bold()
        );
        let _ = writeln!(
            out,
            "   Upload a CSV file and run an analysis to see results here."
        );
    }

    if let Some(summary) = &view.summary {
        render_summary(&mut out, summary);
    }
    for matrix in &view.matrices {
        render_matrix(&mut out, matrix);
    }
    if let Some(preview) = &view.preview {
        heading(&mut out, "🗂", "Data Preview");
        out.push_str(&table(&preview.headers, &preview.rows, 3));
    }
    if let Some(heatmap) = &view.heatmap {
        render_heatmap(&mut out, heatmap);
    }
    if let Some(chart) = &view.trends {
        render_trends(&mut out, chart);
    }
    if let Some(observations) = &view.observations {
        heading(&mut out, "💡", "Observations");
        if observations.items.is_empty() {
            let _ = writeln!(out, "   {}", NO_INSIGHTS.dimmed());
        }
        for item in &observations.items {
            let _ = writeln!(out, "   {} {}", "•".bright_cyan(), item);
        }
    }
    if let Some(url) = &view.download_url {
        let _ = writeln!(
            out,
            "\n{} {} {}",
            "⬇".bright_green(),
            "Export ready:".bright_green().bold(),
            url.bright_white()
        );
    }

    out
}

fn heading(out: &mut String, icon: &str, title: &str) {
    let _ = writeln!(out, "\n{} {}", icon.bright_blue(), title.bright_white().bold());
}

fn render_summary(out: &mut String, summary: &SummaryView) {
    heading(out, "📋", &summary.title);
    if let Some(range) = &summary.date_range {
        let _ = writeln!(out, "   Date Range: {}", range.bright_white());
    }
    for card in &summary.cards {
        let _ = writeln!(out, "   {}: {}", card.label, card.value.bright_green().bold());
    }
    if let Some(note) = &summary.note {
        let _ = writeln!(out, "   {}", note.italic().dimmed());
    }
}

fn render_matrix(out: &mut String, matrix: &MatrixView) {
    if !matrix.expanded {
        let _ = writeln!(
            out,
            "\n{} {} {}",
            "▶".bright_blue(),
            matrix.title.bright_white().bold(),
            "(collapsed)".dimmed()
        );
        return;
    }

    let _ = writeln!(out, "\n{} {}", "▼".bright_blue(), matrix.title.bright_white().bold());

    let mut headers = vec![matrix.cohort_header.clone(), "Users".to_string()];
    headers.extend(matrix.period_headers.iter().cloned());

    let rows: Vec<Vec<String>> = matrix
        .rows
        .iter()
        .map(|row| {
            let mut cells = vec![row.label.clone(), row.users.to_string()];
            cells.extend(row.cells.iter().cloned());
            cells
        })
        .collect();

    out.push_str(&table(&headers, &rows, 3));

    if let Some(notice) = &matrix.notice {
        let _ = writeln!(out, "   {}", notice.bright_yellow());
    }
}

fn render_heatmap(out: &mut String, heatmap: &HeatmapView) {
    heading(out, "🔥", "Retention Heatmap");
    match &heatmap.image_url {
        Some(url) => {
            let _ = writeln!(out, "   Image: {}", url.bright_cyan().underline());
        }
        None => {
            let _ = writeln!(out, "   {}", HEATMAP_PLACEHOLDER.dimmed());
        }
    }
    let _ = writeln!(out, "   {}", HEATMAP_INFO);
    if let Some(interval) = &heatmap.interval {
        let _ = writeln!(out, "   Analysis interval: {}", interval);
    }
}

fn render_trends(out: &mut String, chart: &TrendChart) {
    let title = format!("Cohort Trends - {}", chart.y_axis_label);
    heading(out, "📈", &title);
    if chart.fallback {
        let _ = writeln!(out, "   {}", "Sample data shown until an analysis has trend data.".dimmed());
    }

    let mut headers = vec!["Period".to_string()];
    headers.extend(chart.series.iter().cloned());

    let rows: Vec<Vec<String>> = chart
        .points
        .iter()
        .map(|point| {
            let mut cells = vec![point.period.clone()];
            cells.extend(chart.series.iter().map(|name| {
                point
                    .value(name)
                    .flatten()
                    .map(|v| format_chart_value(v, chart.is_percent))
                    .unwrap_or_default()
            }));
            cells
        })
        .collect();

    out.push_str(&table(&headers, &rows, 3));
}

/// Plain column layout. The first column is left-aligned, the rest
/// right-aligned. Padding happens before coloring so widths stay correct.
fn table(headers: &[String], rows: &[Vec<String>], indent: usize) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let pad = " ".repeat(indent);
    let mut out = String::new();

    let header_line = layout(headers, &widths);
    let _ = writeln!(out, "{}{}", pad, header_line.bright_white().bold());
    let rule_len = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    let _ = writeln!(out, "{}{}", pad, "-".repeat(rule_len).dimmed());

    for row in rows {
        let _ = writeln!(out, "{}{}", pad, layout(row, &widths));
    }
    out
}

fn layout(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &width))| {
            let fill = width.saturating_sub(cell.chars().count());
            if i == 0 {
                format!("{}{}", cell, " ".repeat(fill))
            } else {
                format!("{}{}", " ".repeat(fill), cell)
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
