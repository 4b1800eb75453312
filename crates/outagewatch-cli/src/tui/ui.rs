//! TUI rendering.
//!
//! ┌ outagewatch ─────────────────────── ⟳ ┐
//! │  Outages:             31              │
//! │  Customers affected:  12,400          │
//! │  Active crews:        20              │
//! │  Being restored:      9,000           │
//! │  Waiting for crew:    11   (blinks)   │
//! └───────────────────────────────────────┘
//!  Last checked 3:04:05 PM
//!  r: refresh   c: chart   q: quit
//!
//! `c` swaps the summary box for the trend chart.

use chrono::Local;
use ratatui::{prelude::*, widgets::*};

use outagewatch_core::{ChartOptions, FeedSummary, Monitor, PLACEHOLDER, render};

use crate::commands::thousands;

/// Colors used by the dashboard. Passed to every draw call.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub border: Style,
    pub title: Style,
    pub label: Style,
    pub value: Style,
    pub alert: Style,
    pub chart: Style,
    pub muted: Style,
    pub error: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            border: Style::default().fg(Color::Cyan),
            title: Style::default().bold().fg(Color::Cyan),
            label: Style::default().fg(Color::Gray),
            value: Style::default().bold().fg(Color::White),
            alert: Style::default().bold().fg(Color::Black).bg(Color::Yellow),
            chart: Style::default().fg(Color::Yellow),
            muted: Style::default().fg(Color::DarkGray),
            error: Style::default().fg(Color::Red),
        }
    }
}

pub fn draw(f: &mut Frame, monitor: &Monitor, theme: &Theme) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(7),    // main
            Constraint::Length(1), // status
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    if monitor.show_chart() {
        draw_chart(f, rows[0], monitor, theme);
    } else {
        draw_summary(f, rows[0], monitor, theme);
    }
    draw_status(f, rows[1], monitor, theme);
    draw_keys(f, rows[2], monitor, theme);
}

fn panel<'a>(title: &'a str, monitor: &Monitor, theme: &Theme) -> Block<'a> {
    let spin = if monitor.is_loading() { " ⟳ " } else { "" };
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border)
        .title(Span::styled(title, theme.title))
        .title(Line::from(Span::styled(spin, theme.muted)).right_aligned())
}

fn summary_lines(
    summary: &FeedSummary,
    highlight_waiting: bool,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let row = |label: &'static str, value: String, style: Style| {
        Line::from(vec![
            Span::styled(format!("  {label:<20}"), theme.label),
            Span::styled(value, style),
        ])
    };

    let waiting_style = if highlight_waiting {
        theme.alert
    } else {
        theme.value
    };

    vec![
        row("Outages:", thousands(summary.event_count as i64), theme.value),
        row(
            "Customers affected:",
            thousands(summary.total_affected),
            theme.value,
        ),
        row(
            "Active crews:",
            thousands(summary.active_crews as i64),
            theme.value,
        ),
        row(
            "Being restored:",
            thousands(summary.customers_being_restored),
            theme.value,
        ),
        row(
            "Waiting for crew:",
            format!(" {} ", thousands(summary.waiting_for_crew as i64)),
            waiting_style,
        ),
    ]
}

fn draw_summary(f: &mut Frame, area: Rect, monitor: &Monitor, theme: &Theme) {
    let block = panel(" outagewatch ", monitor, theme);

    let lines = match monitor.summary() {
        Some(summary) => summary_lines(summary, monitor.highlight_waiting(), theme),
        None => match monitor.last_error() {
            Some(err) => vec![Line::from(Span::styled(format!("  {err}"), theme.error))],
            None => vec![Line::from(Span::styled("  Loading...", theme.muted))],
        },
    };

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_chart(f: &mut Frame, area: Rect, monitor: &Monitor, theme: &Theme) {
    let store = monitor.store();
    let title = format!(
        " Customers affected · {}-min buckets · {} stored ",
        store.policy().interval.minutes(),
        store.len()
    );
    let block = panel(&title, monitor, theme);
    let inner = block.inner(area);
    f.render_widget(block, area);

    // One line below the grid holds the time labels.
    let width = usize::from(inner.width);
    let height = usize::from(inner.height.saturating_sub(1));
    let chart = render(
        store.snapshot(),
        width,
        height,
        &ChartOptions::local(Local::now()),
    );

    let lines: Vec<Line> = if chart.is_placeholder() {
        vec![Line::from(Span::styled(PLACEHOLDER, theme.muted))]
    } else {
        chart
            .rows()
            .iter()
            .map(|row| Line::from(Span::styled(row.as_str(), theme.chart)))
            .chain(std::iter::once(Line::from(Span::styled(
                chart.time_axis(),
                theme.label,
            ))))
            .collect()
    };

    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_status(f: &mut Frame, area: Rect, monitor: &Monitor, theme: &Theme) {
    let mut spans = Vec::new();
    match monitor.last_checked() {
        Some(at) => spans.push(Span::styled(
            format!(
                " Last checked {}",
                at.with_timezone(&Local).format("%-I:%M:%S %p")
            ),
            theme.muted,
        )),
        None => spans.push(Span::styled(" Checking...", theme.muted)),
    }
    if let Some(err) = monitor.last_error() {
        spans.push(Span::styled(format!("   {err}"), theme.error));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_keys(f: &mut Frame, area: Rect, monitor: &Monitor, theme: &Theme) {
    let view = if monitor.show_chart() {
        "summary"
    } else {
        "chart"
    };
    let keys = Line::from(vec![
        Span::styled(" r", theme.title),
        Span::styled(": refresh   ", theme.muted),
        Span::styled("c", theme.title),
        Span::styled(format!(": {view}   "), theme.muted),
        Span::styled("q", theme.title),
        Span::styled(": quit", theme.muted),
    ]);
    f.render_widget(Paragraph::new(keys), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::{TimeDelta, Utc};
    use outagewatch_core::{Key, Msg, RawSample, RetentionPolicy, SeriesStore};
    use ratatui::backend::TestBackend;

    fn monitor_with(store: SeriesStore) -> Monitor {
        Monitor::new(store, Duration::from_secs(30), Duration::from_millis(500))
    }

    fn screen(monitor: &Monitor) -> String {
        let mut terminal = Terminal::new(TestBackend::new(70, 20)).unwrap();
        terminal
            .draw(|f| draw(f, monitor, &Theme::default()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_loading_before_first_fetch() {
        let m = monitor_with(SeriesStore::new(RetentionPolicy::default()));
        let text = screen(&m);
        assert!(text.contains("Loading..."));
        assert!(text.contains("q: quit"));
    }

    #[test]
    fn test_summary_box() {
        let m = monitor_with(SeriesStore::new(RetentionPolicy::default()));
        let (m, _) = m.update(Msg::FetchResult {
            fetched_at: Utc::now(),
            result: Ok(FeedSummary {
                total_affected: 12400,
                event_count: 31,
                active_crews: 20,
                waiting_for_crew: 11,
                customers_being_restored: 9000,
            }),
        });
        let text = screen(&m);
        assert!(text.contains("Customers affected:"));
        assert!(text.contains("12,400"));
        assert!(text.contains("Last checked"));
    }

    #[test]
    fn test_chart_placeholder() {
        let m = monitor_with(SeriesStore::new(RetentionPolicy::default()));
        let (m, _) = m.update(Msg::Key(Key::ToggleChart));
        let text = screen(&m);
        assert!(text.contains(PLACEHOLDER));
        assert!(text.contains("c: summary"));
    }

    #[test]
    fn test_chart_plot() {
        let now = Utc::now();
        let mut store = SeriesStore::new(RetentionPolicy::default());
        for i in 0..12 {
            store.ingest(RawSample::new(now - TimeDelta::minutes(10 * (12 - i)), 100 + i * 5));
        }
        let m = monitor_with(store);
        let (m, _) = m.update(Msg::Key(Key::ToggleChart));
        let text = screen(&m);
        assert!(text.contains('●'));
        assert!(!text.contains(PLACEHOLDER));
    }
}
