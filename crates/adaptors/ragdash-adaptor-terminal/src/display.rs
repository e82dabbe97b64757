//! Plain-text rendering of dashboard views

use ragdash_core::{DashboardView, FileStatsView, FlowState, Progress, Toast};

const BAR_WIDTH: usize = 30;
const NAME_MAX: usize = 40;

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let kept: String = value.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// File listing as a table, with the active filters and any error banner
pub fn render_file_table(view: &DashboardView) -> String {
    let mut out = String::new();

    if let Some(error) = &view.error {
        out.push_str(&format!("! {}\n", error));
    }
    if view.has_filters {
        let labels: Vec<&str> = view.indicators.iter().map(|i| i.label.as_str()).collect();
        out.push_str(&format!("Filters: {}\n", labels.join(", ")));
    }
    if view.is_empty {
        out.push_str("No files found\n");
        return out;
    }

    let rows: Vec<[String; 5]> = view
        .cards
        .iter()
        .map(|card| {
            [
                truncate(&card.name, NAME_MAX),
                card.file_type.clone(),
                card.size.clone(),
                card.date.clone(),
                card.tags.join(", "),
            ]
        })
        .collect();

    let headers = ["NAME", "TYPE", "SIZE", "UPDATED", "TAGS"];
    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: [&str; 5]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    out.push_str(&line(headers));
    for row in &rows {
        out.push_str(&line([&row[0], &row[1], &row[2], &row[3], &row[4]]));
    }
    out.push_str(&format!("{} file(s)\n", rows.len()));
    out
}

pub fn render_toast(toast: &Toast) -> String {
    format!("[{}] {}", toast.kind.title(), toast.message)
}

/// One-line progress bar
pub fn render_progress(progress: &Progress) -> String {
    let filled = BAR_WIDTH * usize::from(progress.percent.min(100)) / 100;
    format!(
        "[{}{}] {:>3}% {}",
        "#".repeat(filled),
        " ".repeat(BAR_WIDTH - filled),
        progress.percent,
        progress.message
    )
}

pub fn render_stats(stats: &FileStatsView) -> String {
    let mut out = format!(
        "Name:              {}\n\
         Type:              {}\n\
         Size:              {}\n\
         Last updated:      {}\n\
         Path:              {}\n\
         Total embeddings:  {}\n\
         Has embeddings:    {}\n",
        stats.name,
        stats.file_type,
        stats.size,
        stats.last_updated,
        stats.path,
        stats.total_embeddings,
        if stats.has_embeddings { "Yes" } else { "No" },
    );
    if !stats.status.is_empty() {
        out.push_str(&format!("Status:            {}\n", stats.status));
    }
    if !stats.datapoint_ids.is_empty() {
        out.push_str("Datapoint IDs:\n");
        for id in &stats.datapoint_ids {
            out.push_str(&format!("  {}\n", id));
        }
    }
    out
}

/// Short description of where a flow ended up
pub fn describe_state(state: &FlowState) -> String {
    match state {
        FlowState::Done { message, .. } => message.clone(),
        FlowState::Failed { message, .. } => format!("Failed: {}", message),
        FlowState::Rejected { error, suggestion } => match suggestion {
            Some(s) => format!("Rejected: {}\nSuggestion: {}", error, s),
            None => format!("Rejected: {}", error),
        },
        FlowState::NeedsConfirmation { warnings, .. } => warnings
            .iter()
            .map(|w| w.describe())
            .collect::<Vec<_>>()
            .join("\n"),
        FlowState::Idle => "Cancelled".to_string(),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragdash_core::types::{FileRecord, SearchFilter};

    #[test]
    fn test_file_table() {
        let files = vec![FileRecord {
            name: "report.pdf".into(),
            file_type: Some("pdf".into()),
            size: Some(1536),
            tags: vec!["finance".into(), "q3".into()],
            ..Default::default()
        }];
        let view = DashboardView::build(&files, &SearchFilter::new("rep", vec![]), None);
        let table = render_file_table(&view);

        assert!(table.starts_with("Filters: Search: \"rep\"\n"));
        assert!(table.contains("NAME"));
        assert!(table.contains("report.pdf"));
        assert!(table.contains("1.5 KB"));
        assert!(table.contains("finance, q3"));
        assert!(table.ends_with("1 file(s)\n"));
    }

    #[test]
    fn test_empty_table_with_error() {
        let view = DashboardView::build(&[], &SearchFilter::default(), Some("Backend down".into()));
        assert_eq!(render_file_table(&view), "! Backend down\nNo files found\n");
    }

    #[test]
    fn test_progress_bar() {
        let bar = render_progress(&Progress::new(50, "Processing file..."));
        assert!(bar.starts_with(&format!("[{}{}]", "#".repeat(15), " ".repeat(15))));
        assert!(bar.ends_with(" 50% Processing file..."));
    }

    #[test]
    fn test_truncate_long_names() {
        let name = "a".repeat(60);
        let shown = truncate(&name, NAME_MAX);
        assert_eq!(shown.chars().count(), NAME_MAX);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn test_describe_failed_replace() {
        let state = FlowState::Failed {
            message: "Upload failed: boom; the original file was restored".into(),
            original_restored: Some(true),
        };
        assert_eq!(
            describe_state(&state),
            "Failed: Upload failed: boom; the original file was restored"
        );
    }

    #[test]
    fn test_toast_line() {
        assert_eq!(render_toast(&Toast::error("nope")), "[Error] nope");
    }
}
