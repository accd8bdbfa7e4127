mod tui_app;

use std::io;
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use tracing_subscriber::EnvFilter;

use fleamarket_map::config::Config;
use fleamarket_map::selection::Provenance;
use tui_app::{format_badge, truncate, AppState, Field, LoadStatus};

const IDLE_POLL: Duration = Duration::from_millis(250);

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> io::Result<()> {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    // Logs go to a file so they never tear the terminal UI.
    let log_path = std::env::var("TUI_LOG_FILE").unwrap_or_else(|_| "marketmap-tui.log".to_string());
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file))
        .init();

    let mut app = AppState::new(cfg.debounce, Local::now().date_naive());

    // Initial load before rendering
    app.load(&cfg).await;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app);

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> io::Result<()> {
    let mut card_state = TableState::default();

    loop {
        card_state.select(Some(app.cursor));
        terminal.draw(|f| render(f, app, &mut card_state))?;

        let timeout = app.poll_timeout(Instant::now(), IDLE_POLL);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let now = Instant::now();
                    match key.code {
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        KeyCode::Tab => app.focus_next(true),
                        KeyCode::BackTab => app.focus_next(false),
                        KeyCode::Char(c) => app.type_char(c, now),
                        KeyCode::Backspace => app.backspace(now),
                        KeyCode::Left => app.cycle(false),
                        KeyCode::Right => app.cycle(true),
                        KeyCode::Down => app.move_cursor(true),
                        KeyCode::Up => app.move_cursor(false),
                        KeyCode::Enter => app.activate_selected(),
                        KeyCode::Esc => app.back(),
                        _ => {}
                    }
                }
            }
        }

        app.tick(Instant::now());
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(f: &mut Frame, app: &AppState, card_state: &mut TableState) {
    let area = f.area();

    // Outer vertical split: header | filters | body | footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(3), // filters
            Constraint::Min(0),    // body
            Constraint::Length(1), // footer
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    render_filters(f, app, chunks[1]);
    render_body(f, app, card_state, chunks[2]);
    render_footer(f, chunks[3]);
}

fn render_header(f: &mut Frame, app: &AppState, area: Rect) {
    let (status_text, status_color) = match &app.status {
        LoadStatus::Ready(source) => (format!("● {}", truncate(source, 30)), Color::Green),
        LoadStatus::Loading => ("◌ laden".to_string(), Color::Yellow),
        LoadStatus::Failed(e) => (format!("✗ {}", truncate(e, 60)), Color::Red),
    };

    let header_line = Line::from(vec![
        Span::styled(
            " Rommelmarkten  ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw("  │  "),
        Span::styled(app.session.header().to_string(), Style::default().fg(Color::White)),
        Span::raw("  │  "),
        Span::styled(
            format!("{} totaal", app.session.markets().len()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let paragraph = Paragraph::new(header_line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(paragraph, area);
}

fn render_filters(f: &mut Frame, app: &AppState, area: Rect) {
    let mut spans = Vec::new();
    for field in Field::ALL {
        let value = match field {
            Field::Search => app.inputs.search.clone(),
            Field::Location => app.inputs.location.clone(),
            Field::Radius => app.inputs.radius.clone(),
            Field::Month => app.inputs.month.map_or("alle".to_string(), |m| m.to_string()),
            Field::Price => app.inputs.price.map_or("alle".to_string(), |p| p.to_string()),
        };
        let focused = app.focus == field;
        let value = match (focused, field.is_text()) {
            (true, true) => format!("{value}▏"),
            (true, false) => format!("◂ {value} ▸"),
            _ => value,
        };
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!(" {}: ", field.label()), label_style));
        spans.push(Span::styled(value, Style::default().fg(Color::White)));
        spans.push(Span::raw("  "));
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(" FILTERS ", Style::default().fg(Color::Cyan))),
    );
    f.render_widget(paragraph, area);
}

fn render_body(f: &mut Frame, app: &AppState, card_state: &mut TableState, area: Rect) {
    // Horizontal split: cards (60%) | map markers (40%)
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_cards(f, app, card_state, halves[0]);
    render_markers(f, app, halves[1]);
}

fn render_cards(f: &mut Frame, app: &AppState, state: &mut TableState, area: Rect) {
    let header_cells = ["Datum", "Markt", "Plaats", "Entree", ""]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .visible_cards()
        .iter()
        .map(|c| {
            let tag = match c.tag {
                Some(Provenance::ExactLocation) => Span::styled("● locatie", Style::default().fg(Color::Green)),
                Some(Provenance::SameCity) => Span::styled("○ plaats", Style::default().fg(Color::Cyan)),
                None if c.this_week => Span::styled("deze week", Style::default().fg(Color::Magenta)),
                None => Span::raw(""),
            };
            let date_color = if c.date_value.is_some_and(|d| d < app.today) {
                Color::DarkGray
            } else {
                Color::White
            };
            let title_style = if c.highlighted {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            Row::new(vec![
                Cell::from(truncate(&c.date, 24)).style(Style::default().fg(date_color)),
                Cell::from(truncate(&c.title, 36)).style(title_style),
                Cell::from(truncate(&c.city, 16)),
                Cell::from(truncate(&c.entry_fee, 10)),
                Cell::from(Line::from(tag)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(24),
            Constraint::Min(12),
            Constraint::Length(16),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                " MARKTEN ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
    )
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    f.render_stateful_widget(table, area, state);
}

fn render_markers(f: &mut Frame, app: &AppState, area: Rect) {
    let header_cells = ["", "Markt", "Lat", "Lng", "#"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .markers()
        .iter()
        .map(|m| {
            let (pin, pin_color) = if m.highlighted {
                ("◉", Color::Yellow)
            } else {
                ("•", Color::DarkGray)
            };
            Row::new(vec![
                Cell::from(pin).style(Style::default().fg(pin_color)),
                Cell::from(truncate(&m.title, 24)),
                Cell::from(format!("{:.4}", m.at.lat)).style(Style::default().fg(Color::DarkGray)),
                Cell::from(format!("{:.4}", m.at.lng)).style(Style::default().fg(Color::DarkGray)),
                Cell::from(format_badge(m.badge)).style(Style::default().fg(Color::Cyan)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(1),
            Constraint::Min(10),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(4),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                " KAART ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
    );

    f.render_widget(table, area);
}

fn render_footer(f: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" [ctrl-c] ", Style::default().fg(Color::Yellow)),
        Span::raw("stop  "),
        Span::styled("[tab] ", Style::default().fg(Color::Yellow)),
        Span::raw("filter  "),
        Span::styled("[←→] ", Style::default().fg(Color::Yellow)),
        Span::raw("maand/entree  "),
        Span::styled("[↑↓] ", Style::default().fg(Color::Yellow)),
        Span::raw("kies  "),
        Span::styled("[enter] ", Style::default().fg(Color::Yellow)),
        Span::raw("toon locatie  "),
        Span::styled("[esc] ", Style::default().fg(Color::Yellow)),
        Span::raw("alle markten"),
    ]);
    let paragraph = Paragraph::new(line).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}
