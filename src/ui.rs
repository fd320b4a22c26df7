use crate::export::write_csv_file;
use crate::format::{axis_tick, format_tk};
use crate::metrics::{chart_points, per_student, summary};
use crate::record::{BudgetRecord, Field};
use crate::store::RecordStore;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;

/// Table columns; the last one is derived and read-only
const COLUMNS: [&str; 4] = ["University", "Budget (Tk)", "Students", "Per Student (Tk / year)"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Table,
    Chart,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Table => Page::Chart,
            Page::Chart => Page::Table,
        }
    }

    pub fn previous(&self) -> Self {
        // Only two pages
        self.next()
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Table => "Budget Table",
            Page::Chart => "Chart & Summary",
        }
    }
}

/// In-progress cell edit
#[derive(Debug, Clone, PartialEq)]
pub struct EditBuffer {
    pub record_id: String,
    pub field: Field,
    pub text: String,
    /// Value before editing started, restored on Esc
    pub original: String,
}

pub struct App {
    pub store: RecordStore,
    pub state: TableState,
    pub column: usize,
    pub current_page: Page,
    pub editing: Option<EditBuffer>,
    pub status: Option<String>,
    pub export_dir: PathBuf,
}

impl App {
    pub fn new(store: RecordStore, export_dir: PathBuf) -> Self {
        let mut state = TableState::default();
        if !store.is_empty() {
            state.select(Some(0));
        }

        Self {
            store,
            state,
            column: 0,
            current_page: Page::Table,
            editing: None,
            status: None,
            export_dir,
        }
    }

    pub fn selected_record(&self) -> Option<&BudgetRecord> {
        self.state.selected().and_then(|i| self.store.records().get(i))
    }

    /// Editable field under the cursor, None on the per-student column
    pub fn selected_field(&self) -> Option<Field> {
        Field::ALL.get(self.column).copied()
    }

    pub fn next(&mut self) {
        let len = self.store.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.store.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn next_column(&mut self) {
        if self.column < COLUMNS.len() - 1 {
            self.column += 1;
        }
    }

    pub fn previous_column(&mut self) {
        self.column = self.column.saturating_sub(1);
    }

    pub fn start_edit(&mut self) {
        let (record, field) = match (self.selected_record(), self.selected_field()) {
            (Some(r), Some(f)) => (r, f),
            _ => return,
        };

        let text = record.field_text(field);
        self.editing = Some(EditBuffer {
            record_id: record.id.clone(),
            field,
            original: text.clone(),
            text,
        });
        self.status = None;
    }

    /// Push the buffer into the store so derived values follow every keystroke
    fn sync_edit(&mut self) {
        if let Some(edit) = &self.editing {
            if let Err(e) = self.store.update_field(&edit.record_id, edit.field, &edit.text) {
                tracing::warn!("edit ignored: {}", e);
            }
        }
    }

    pub fn edit_push(&mut self, c: char) {
        if let Some(edit) = self.editing.as_mut() {
            edit.text.push(c);
        }
        self.sync_edit();
    }

    pub fn edit_pop(&mut self) {
        if let Some(edit) = self.editing.as_mut() {
            edit.text.pop();
        }
        self.sync_edit();
    }

    pub fn commit_edit(&mut self) {
        self.sync_edit();
        self.editing = None;
    }

    pub fn cancel_edit(&mut self) {
        if let Some(edit) = self.editing.as_mut() {
            edit.text = edit.original.clone();
        }
        self.sync_edit();
        self.editing = None;
    }

    pub fn reset(&mut self) {
        self.editing = None;
        self.store.reset();
        if self.state.selected().map_or(true, |i| i >= self.store.len()) {
            self.state.select(if self.store.is_empty() { None } else { Some(0) });
        }
        self.status = Some("Reset to default universities".to_string());
    }

    pub fn export_csv(&mut self) {
        self.status = Some(match write_csv_file(self.store.records(), &self.export_dir) {
            Ok(path) => format!("Saved {}", path.display()),
            Err(e) => {
                tracing::error!("CSV export failed: {}", e);
                format!("Export failed: {}", e)
            }
        });
    }

    /// Apply one key press; returns true when the app should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.editing.is_some() {
            match key.code {
                KeyCode::Enter => self.commit_edit(),
                KeyCode::Esc => self.cancel_edit(),
                KeyCode::Backspace => self.edit_pop(),
                KeyCode::Char(c) => self.edit_push(c),
                _ => {}
            }
            return false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.current_page = self.current_page.previous();
                } else {
                    self.current_page = self.current_page.next();
                }
            }
            KeyCode::BackTab => self.current_page = self.current_page.previous(),
            KeyCode::Char('r') => self.reset(),
            KeyCode::Char('d') => self.export_csv(),
            KeyCode::Enter if self.current_page == Page::Table => self.start_edit(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Right | KeyCode::Char('l') => self.next_column(),
            KeyCode::Left | KeyCode::Char('h') => self.previous_column(),
            KeyCode::Home => self.state.select(Some(0)),
            KeyCode::End => {
                if !self.store.is_empty() {
                    self.state.select(Some(self.store.len() - 1));
                }
            }
            _ => {}
        }
        false
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, event::read);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B, E>(terminal: &mut Terminal<B>, app: &mut App, mut read_event: E) -> io::Result<()>
where
    B: ratatui::backend::Backend,
    E: FnMut() -> io::Result<Event>,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = read_event()? {
            if key.kind == KeyEventKind::Press && app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Table => render_table(f, chunks[1], app),
        Page::Chart => render_chart_page(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Table, Page::Chart].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Universities: {}", app.store.len()),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" University Budget: Per Student Dashboard "),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = COLUMNS.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let selected_row = app.state.selected();
    let selected_col = app.column;
    let rows = app.store.records().iter().enumerate().map(|(i, record)| {
        let per = per_student(record);
        let mut texts = vec![
            record.name.clone(),
            record.field_text(Field::Budget),
            record.field_text(Field::Students),
            format_tk(per),
        ];

        if let Some(edit) = app.editing.as_ref().filter(|e| e.record_id == record.id) {
            let col = Field::ALL.iter().position(|f| *f == edit.field).unwrap_or(0);
            texts[col] = format!("{}▏", edit.text);
        }

        let cells = texts.into_iter().enumerate().map(move |(col, text)| {
            let mut style = match col {
                3 if per == 0.0 => Style::default().fg(Color::DarkGray),
                3 => Style::default().fg(Color::Green),
                _ => Style::default(),
            };
            if selected_row == Some(i) && col == selected_col {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Cell::from(text).style(style)
        });

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(28),
            Constraint::Length(16),
            Constraint::Length(10),
            Constraint::Min(24),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Universities "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_chart_page(f: &mut Frame, area: Rect, app: &App) {
    let summary_height = app.store.len() as u16 + 7;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(summary_height)])
        .split(area);

    render_chart(f, rows[0], app);
    render_summary(f, rows[1], app);
}

/// Bar heights are relative to the tallest bar, out of this many steps
const BAR_SCALE: u64 = 1000;

fn render_chart(f: &mut Frame, area: Rect, app: &App) {
    let points = chart_points(app.store.records());
    let max = points.iter().map(|p| p.per).fold(0.0_f64, f64::max);

    let bars: Vec<Bar> = points
        .iter()
        .map(|p| {
            let height = if max > 0.0 {
                (p.per / max * BAR_SCALE as f64).round() as u64
            } else {
                0
            };
            Bar::default()
                .value(height)
                .label(Line::from(p.name.clone()))
                .text_value(axis_tick(p.per))
        })
        .collect();

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .split(area);

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Per-Student Comparison "),
        )
        .data(BarGroup::default().bars(&bars))
        .max(BAR_SCALE)
        .bar_width(12)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Blue))
        .value_style(Style::default().fg(Color::White).bg(Color::Blue));

    f.render_widget(chart, parts[0]);

    let note = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("  Scale: 0 .. {}", axis_tick(max)),
            Style::default().fg(Color::White),
        )),
        Line::from(Span::styled(
            "  Note: Per-student value = budget ÷ students (rounded).",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ]);
    f.render_widget(note, parts[1]);
}

fn render_summary(f: &mut Frame, area: Rect, app: &App) {
    let lines = summary(app.store.records());
    let width = area.width.saturating_sub(4) as usize;

    let mut content = vec![Line::from("")];
    for line in &lines {
        let value = format!("{} / year", format_tk(line.per_student));
        let name = truncate(&line.name, width.saturating_sub(value.len() + 1));
        let pad = width.saturating_sub(name.chars().count() + value.chars().count());
        content.push(Line::from(vec![
            Span::raw(name),
            Span::raw(" ".repeat(pad)),
            Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
        ]));
    }

    content.push(Line::from(""));
    let legend = app
        .store
        .records()
        .iter()
        .map(|r| format!("{} ({})", r.id, r.name))
        .collect::<Vec<_>>()
        .join(", ");
    content.push(Line::from(Span::styled(
        format!("Built for quick comparison: {}.", legend),
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(content)
        .wrap(ratatui::widgets::Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Summary "),
        );

    f.render_widget(paragraph, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, app.store.len()),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(edit) = &app.editing {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Editing {} of {}", edit.field.as_str(), edit.record_id),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Done | "));
        status_spans.push(Span::styled("Esc", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Cancel"));
    } else {
        if let Some(status) = &app.status {
            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled(status.clone(), Style::default().fg(Color::Green)));
        }
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Edit | "));
        status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Page | "));
        status_spans.push(Span::styled("r", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Reset | "));
        status_spans.push(Span::styled("d", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Download CSV | "));
        status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
        status_spans.push(Span::raw(" Quit"));
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::EXPORT_FILE_NAME;
    use crate::store::default_records;
    use ratatui::backend::TestBackend;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn test_app() -> App {
        App::new(RecordStore::new(), std::env::temp_dir())
    }

    fn screen_text(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = test_app();
        assert_eq!(app.state.selected(), Some(0));

        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.state.selected(), Some(5));

        app.handle_key(key(KeyCode::Char('j')));
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_column_selection_is_clamped() {
        let mut app = test_app();
        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.column, 0);

        for _ in 0..10 {
            app.handle_key(key(KeyCode::Right));
        }
        assert_eq!(app.column, 3);
        assert_eq!(app.selected_field(), None);
    }

    #[test]
    fn test_edit_budget_updates_per_student_live() {
        let mut app = test_app();
        app.handle_key(key(KeyCode::Down)); // RU
        app.handle_key(key(KeyCode::Down)); // JNU
        app.handle_key(key(KeyCode::Down)); // JU
        app.handle_key(key(KeyCode::Down)); // KU
        app.handle_key(key(KeyCode::Right)); // Budget

        app.handle_key(key(KeyCode::Enter));
        assert!(app.editing.is_some());

        type_text(&mut app, "2000000000");
        let ku = app.store.get("KU").unwrap();
        assert_eq!(ku.budget, 2_000_000_000.0);
        assert_eq!(per_student(ku), 200_000.0);

        app.handle_key(key(KeyCode::Enter));
        assert!(app.editing.is_none());
        assert_eq!(app.store.get("KU").unwrap().budget, 2_000_000_000.0);
    }

    #[test]
    fn test_edit_name_and_backspace() {
        let mut app = test_app();
        app.handle_key(key(KeyCode::Enter));
        for _ in 0.."University".len() {
            app.handle_key(key(KeyCode::Backspace));
        }
        type_text(&mut app, "Univ.");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.store.get("DU").unwrap().name, "Dhaka Univ.");
    }

    #[test]
    fn test_cancel_edit_restores_value() {
        let mut app = test_app();
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Right)); // Students
        app.handle_key(key(KeyCode::Enter));
        type_text(&mut app, "999");
        assert_eq!(app.store.get("DU").unwrap().students, 37_018_999);

        app.handle_key(key(KeyCode::Esc));

        assert!(app.editing.is_none());
        assert_eq!(app.store.get("DU").unwrap().students, 37_018);
    }

    #[test]
    fn test_per_student_column_not_editable() {
        let mut app = test_app();
        app.column = 3;
        app.handle_key(key(KeyCode::Enter));
        assert!(app.editing.is_none());
    }

    #[test]
    fn test_q_quits_only_outside_edit() {
        let mut app = test_app();
        app.handle_key(key(KeyCode::Enter));
        assert!(!app.handle_key(key(KeyCode::Char('q'))));
        assert!(app.store.get("DU").unwrap().name.ends_with('q'));

        app.handle_key(key(KeyCode::Enter));
        assert!(app.handle_key(key(KeyCode::Char('q'))));
    }

    #[test]
    fn test_reset_key() {
        let mut app = test_app();
        app.store.update_field("CU", Field::Budget, "5").unwrap();

        app.handle_key(key(KeyCode::Char('r')));

        assert_eq!(app.store.records(), default_records().as_slice());
        assert!(app.status.is_some());
    }

    #[test]
    fn test_download_key_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(RecordStore::new(), dir.path().to_path_buf());

        app.handle_key(key(KeyCode::Char('d')));

        assert!(dir.path().join(EXPORT_FILE_NAME).exists());
        assert!(app.status.as_deref().unwrap_or("").starts_with("Saved"));
    }

    #[test]
    fn test_tab_switches_page() {
        let mut app = test_app();
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.current_page, Page::Chart);

        // Enter does not start an edit on the chart page
        app.handle_key(key(KeyCode::Enter));
        assert!(app.editing.is_none());

        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.current_page, Page::Table);
    }

    #[test]
    fn test_render_table_page() {
        let mut app = test_app();
        let screen = screen_text(&mut app);

        assert!(screen.contains("Dhaka University"));
        assert!(screen.contains("Tk 279,715"));
        assert!(screen.contains("Per Student"));
    }

    #[test]
    fn test_render_chart_page() {
        let mut app = test_app();
        app.current_page = Page::Chart;
        let screen = screen_text(&mut app);

        assert!(screen.contains("Per-Student Comparison"));
        assert!(screen.contains("Summary"));
        assert!(screen.contains("JNU"));
    }

    #[test]
    fn test_event_loop_quits_on_q() {
        let mut app = test_app();
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        let mut keys = vec![KeyCode::Char('q'), KeyCode::Down].into_iter().rev();

        let res = run_app(&mut terminal, &mut app, || {
            Ok(Event::Key(key(keys.next().unwrap_or(KeyCode::Char('q')))))
        });

        assert!(res.is_ok());
        assert_eq!(app.state.selected(), Some(1));
    }

    #[test]
    fn test_event_loop_propagates_read_error() {
        let mut app = test_app();
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();

        let res = run_app(&mut terminal, &mut app, || {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal gone"))
        });

        assert_eq!(res.unwrap_err().kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_chart_bars_show_tk_values() {
        let mut app = test_app();
        app.current_page = Page::Chart;
        let screen = screen_text(&mut app);

        assert!(screen.contains("Tk 279.715k"));
        assert!(screen.contains("Scale: 0 .. Tk 279.715k"));
    }

    #[test]
    fn test_huge_budget_renders_unclamped() {
        let mut app = test_app();
        app.store.update_field("DU", Field::Budget, "1e20").unwrap();
        app.store.update_field("DU", Field::Students, "1").unwrap();
        let screen = screen_text(&mut app);

        assert!(screen.contains("Tk 100,000,000,000,000,000,000"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Dhaka University", 40), "Dhaka University");
        assert_eq!(truncate("Dhaka University", 8), "Dhaka...");
    }
}
