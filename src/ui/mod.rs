use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};

use crate::api::{EXECUTE_PATH, INFO_PATH, STATUS_PATH};
use crate::app::App;
use crate::console::{LineKind, Tab, Viewport};

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1), // Header + clock
            Constraint::Length(1), // Tab bar
            Constraint::Min(6),    // Active tab body
            Constraint::Length(1), // Footer
        ])
        .split(area);

    draw_header(f, app, chunks[0]);
    draw_tab_bar(f, app, chunks[1]);

    match app.tab {
        Tab::Repl => draw_repl(f, app, chunks[2]),
        Tab::Api => draw_api(f, app, chunks[2]),
        Tab::Status => draw_status(f, app, chunks[2]),
    }

    draw_footer(f, app, chunks[3]);

    if app.show_help {
        draw_help_popup(f, app);
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let clock = app.clock.display();

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(clock.chars().count() as u16 + 2),
        ])
        .split(area);

    let title = Paragraph::new(Line::from(vec![
        Span::styled(" plua console ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
        Span::styled("│ ", Style::default().fg(theme.inactive)),
        Span::styled(app.base_url.as_str(), Style::default().fg(theme.text_dim)),
    ]));
    f.render_widget(title, chunks[0]);

    let clock = Paragraph::new(Span::styled(clock, Style::default().fg(theme.text)))
        .alignment(Alignment::Right);
    f.render_widget(clock, chunks[1]);
}

fn draw_tab_bar(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| Line::from(format!("F{} {}", i + 1, tab.title())))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .style(Style::default().fg(theme.inactive))
        .highlight_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
        .divider(Span::styled("│", Style::default().fg(theme.inactive)));

    f.render_widget(tabs, area);
}

fn draw_repl(f: &mut Frame, app: &App, area: Rect) {
    let input_rows = app.input.split('\n').count().clamp(1, 8) as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),                  // Output log
            Constraint::Length(input_rows + 2),  // Code input
            Constraint::Length(1),               // Buttons
        ])
        .split(area);

    draw_output(f, app, chunks[0]);
    draw_input(f, app, chunks[1]);
    draw_buttons(f, app, chunks[2]);
}

fn draw_output(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let block = Block::default()
        .title(Span::styled(" Output ", Style::default().fg(theme.header)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.inactive));

    let viewport = Viewport::new(
        (area.height.saturating_sub(2) as usize).max(1),
        area.width.saturating_sub(2) as usize,
    );
    app.log_viewport.set(viewport);

    let rows: Vec<Line> = app
        .output
        .lines()
        .iter()
        .flat_map(|line| {
            let style = Style::default().fg(theme.line_color(line.kind));
            let style = if line.kind == LineKind::Info {
                style.add_modifier(Modifier::ITALIC)
            } else {
                style
            };

            line.display_rows(viewport.width)
                .into_iter()
                .map(move |row| Line::from(Span::styled(row, style)))
        })
        .collect();

    let offset = app.output.visible_offset(viewport).min(rows.len());
    let visible: Vec<Line> = rows.into_iter().skip(offset).take(viewport.height).collect();

    f.render_widget(Paragraph::new(visible).block(block), area);
}

fn draw_input(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let border = if app.submit.enabled { theme.accent } else { theme.inactive };

    let block = Block::default()
        .title(Span::styled(" Lua ", Style::default().fg(border)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let content: Vec<Line> = if app.input.is_empty() {
        vec![Line::from(vec![
            Span::styled("█", Style::default().fg(theme.accent)),
            Span::styled(" Enter Lua code here...", Style::default().fg(theme.text_dim)),
        ])]
    } else {
        let rows: Vec<&str> = app.input.split('\n').collect();
        let last = rows.len() - 1;
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                let mut spans = vec![Span::styled(*row, Style::default().fg(theme.text))];
                if i == last {
                    spans.push(Span::styled("█", Style::default().fg(theme.accent)));
                }
                Line::from(spans)
            })
            .collect()
    };

    // Keep the cursor row in view when the input is taller than the box
    let visible_rows = area.height.saturating_sub(2) as usize;
    let skip = content.len().saturating_sub(visible_rows);
    let content: Vec<Line> = content.into_iter().skip(skip).collect();

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn draw_buttons(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let button_style = if app.submit.enabled {
        Style::default().fg(theme.success).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.inactive).add_modifier(Modifier::DIM)
    };

    let buttons = Paragraph::new(Line::from(vec![
        Span::styled("[ ", Style::default().fg(theme.text_dim)),
        Span::styled(app.submit.label, button_style),
        Span::styled(" ]", Style::default().fg(theme.text_dim)),
        Span::styled(" F5/Ctrl+E", Style::default().fg(theme.text_dim)),
        Span::styled("   [ ", Style::default().fg(theme.text_dim)),
        Span::styled("Clear", Style::default().fg(theme.text)),
        Span::styled(" ]", Style::default().fg(theme.text_dim)),
        Span::styled(" Ctrl+L", Style::default().fg(theme.text_dim)),
    ]))
    .alignment(Alignment::Center);

    f.render_widget(buttons, area);
}

fn draw_api(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let block = Block::default()
        .title(Span::styled(" API Documentation ", Style::default().fg(theme.header)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.inactive));

    let endpoint = |method: &'static str, path: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<5}", method), Style::default().fg(theme.accent)),
            Span::styled(format!("{:<16}", path), Style::default().fg(theme.text)),
            Span::styled(what, Style::default().fg(theme.text_dim)),
        ])
    };

    let text = vec![
        Line::from(Span::styled("Endpoints", Style::default().fg(theme.header).add_modifier(Modifier::BOLD))),
        endpoint("POST", EXECUTE_PATH, "Execute Lua code"),
        endpoint("GET", STATUS_PATH, "Get runtime status"),
        endpoint("GET", INFO_PATH, "Get API information"),
        Line::from(""),
        Line::from(Span::styled("Interactive documentation", Style::default().fg(theme.header).add_modifier(Modifier::BOLD))),
        Line::from(vec![
            Span::styled("  Swagger UI  ", Style::default().fg(theme.accent)),
            Span::styled(format!("{}/docs", app.base_url), Style::default().fg(theme.text)),
        ]),
        Line::from(vec![
            Span::styled("  ReDoc       ", Style::default().fg(theme.accent)),
            Span::styled(format!("{}/redoc", app.base_url), Style::default().fg(theme.text)),
        ]),
    ];

    f.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let mut title = " Server Status ".to_string();
    if let Some(at) = &app.status_panel.last_updated {
        title.push_str(&format!("(updated {}) ", at));
    }
    if app.poller_running() {
        title.push_str("⟳ ");
    }

    let block = Block::default()
        .title(Span::styled(title, Style::default().fg(theme.header)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.inactive));

    let rows: Vec<Row> = app
        .status_panel
        .rows()
        .into_iter()
        .map(|(label, value)| {
            let color = match value {
                "Error" => theme.danger,
                v if v.starts_with('✓') => theme.success,
                v if v.starts_with('✗') => theme.text_dim,
                _ => theme.text,
            };
            Row::new(vec![
                Span::styled(format!("  {}", label), Style::default().fg(theme.text_dim)),
                Span::styled(value.to_string(), Style::default().fg(color)),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Length(22), Constraint::Min(10)]).block(block);
    f.render_widget(table, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    if let Some(ref status) = app.status_message {
        let line = Paragraph::new(Span::styled(status.as_str(), Style::default().fg(theme.warning)))
            .alignment(Alignment::Center);
        f.render_widget(line, area);
        return;
    }

    let hints: Vec<(&str, &str)> = match app.tab {
        Tab::Repl => vec![
            ("F5", "Execute"),
            ("Ctrl+L", "Clear"),
            ("PgUp/PgDn", "Scroll"),
            ("Tab", "Next"),
            ("Ctrl+C", "Quit"),
        ],
        Tab::Api => vec![("Tab", "Next"), ("?", "Help"), ("q", "Quit")],
        Tab::Status => vec![("r", "Refresh"), ("Tab", "Next"), ("?", "Help"), ("q", "Quit")],
    };

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if area.width < 60 { 3 } else { hints.len() };

    let hint_spans: Vec<Span> = hints
        .iter()
        .take(max_hints)
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(theme.accent)),
                Span::styled(format!(" {} │ ", action), Style::default().fg(theme.text_dim)),
            ]
        })
        .collect();

    f.render_widget(
        Paragraph::new(Line::from(hint_spans)).alignment(Alignment::Center),
        area,
    );
}

fn draw_help_popup(f: &mut Frame, app: &App) {
    let theme = &app.theme;
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 60 },
        if area.height < 30 { 90 } else { 60 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let section = |title: &'static str| {
        Line::from(Span::styled(
            format!("═══ {} ═══", title),
            Style::default().fg(theme.header).add_modifier(Modifier::BOLD),
        ))
    };
    let entry = |key: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<12}", key), Style::default().fg(theme.accent)),
            Span::raw(what),
        ])
    };

    let help_text = vec![
        section("Tabs"),
        entry("F1 F2 F3", "Execute Code / API Documentation / Server Status"),
        entry("Tab", "Next tab (Shift+Tab for previous)"),
        Line::from(""),
        section("Execute Code"),
        entry("F5 Ctrl+E", "Execute the code in the input box"),
        entry("Enter", "New line"),
        entry("Ctrl+L", "Clear output"),
        entry("Ctrl+U", "Clear input"),
        entry("PgUp PgDn", "Scroll output (End jumps to newest)"),
        Line::from(""),
        section("Server Status"),
        entry("r", "Refresh now (auto-refreshes while open)"),
        Line::from(""),
        entry("Ctrl+C", "Quit from anywhere"),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(theme.text_dim)),
            Span::styled("?", Style::default().fg(theme.accent)),
            Span::styled("/", Style::default().fg(theme.text_dim)),
            Span::styled("Esc", Style::default().fg(theme.accent)),
            Span::styled(" to close", Style::default().fg(theme.text_dim)),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" Help ", Style::default().fg(theme.accent)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent)),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        ApiError, ExecuteRequest, ExecuteResponse, InfoResponse, RuntimeApi, StatusResponse,
    };
    use crate::config::AppConfig;
    use crate::console::OutputLine;
    use async_trait::async_trait;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    struct OfflineApi;

    #[async_trait]
    impl RuntimeApi for OfflineApi {
        async fn execute(&self, _: &ExecuteRequest) -> Result<ExecuteResponse, ApiError> {
            Err(ApiError::Transport("offline".into()))
        }
        async fn info(&self) -> Result<InfoResponse, ApiError> {
            Err(ApiError::Transport("offline".into()))
        }
        async fn status(&self) -> Result<StatusResponse, ApiError> {
            Err(ApiError::Transport("offline".into()))
        }
    }

    fn test_app() -> App {
        App::new(Arc::new(OfflineApi), &AppConfig::default())
    }

    fn render(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();

        terminal
            .backend()
            .buffer()
            .content()
            .chunks(width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_repl_shows_log_and_button() {
        let mut app = test_app();
        app.output.push(OutputLine::input("return 5"));
        app.output.push(OutputLine::result("=> 5"));

        let screen = render(&app, 80, 20);
        assert!(screen.contains("Ready to execute Lua code..."));
        assert!(screen.contains("> return 5"));
        assert!(screen.contains("=> 5"));
        assert!(screen.contains("[ Execute ]"));

        app.submit.begin();
        let screen = render(&app, 80, 20);
        assert!(screen.contains("[ Executing... ]"));
    }

    #[test]
    fn test_output_follows_newest_line() {
        let mut app = test_app();
        for i in 0..50 {
            app.output.push(OutputLine::result(format!("line-{:02}", i)));
        }

        let screen = render(&app, 60, 16);
        assert!(screen.contains("line-49"));
        assert!(!screen.contains("line-00"));
    }

    #[test]
    fn test_long_result_wraps_inside_panel() {
        let mut app = test_app();
        app.output.push(OutputLine::result(format!("=> \"{}END\"", "x".repeat(120))));

        let screen = render(&app, 80, 20);
        assert!(screen.contains("END\""));
        assert_eq!(app.log_viewport.get().width, 78);
    }

    #[test]
    fn test_wrapped_rows_keep_newest_in_view() {
        let mut app = test_app();
        for i in 0..10 {
            app.output.push(OutputLine::error(format!("Error: {} {}", "y".repeat(100), i)));
        }
        app.output.push(OutputLine::result("=> tail"));

        let screen = render(&app, 60, 16);
        assert!(screen.contains("=> tail"));
    }

    #[test]
    fn test_status_tab_rows() {
        let mut app = test_app();
        app.tab = Tab::Status;
        app.status_panel.apply_error();

        let screen = render(&app, 80, 20);
        assert!(screen.contains("API Version"));
        assert!(screen.contains("Error"));
        assert!(screen.contains("Active Timers"));
    }

    #[test]
    fn test_api_tab_lists_endpoints() {
        let mut app = test_app();
        app.tab = Tab::Api;

        let screen = render(&app, 80, 20);
        assert!(screen.contains("/plua/execute"));
        assert!(screen.contains("http://localhost:8888/docs"));
    }
}
