//! twolist-tui - Single-screen terminal UI for the Work and Travel lists
//!
//! Header to switch lists, an input line to add items, and the list itself.

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use twolist_core::{
    Answer, Config, FileStorage, Item, ItemId, MemoryStorage, Mode, Storage, TodoStore,
};

const LOG_FILE: &str = "twolist.log";

#[derive(Parser)]
#[command(name = "twolist-tui")]
#[command(about = "Terminal UI for the Work and Travel lists")]
#[command(version)]
struct Cli {
    /// Directory holding the stored lists
    #[arg(long, env = "TWOLIST_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Config file to use
    #[arg(long, env = "TWOLIST_CONFIG")]
    config: Option<PathBuf>,

    /// Keep everything in memory; nothing is written to disk
    #[arg(long)]
    ephemeral: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let mut config = Config::load(&config_path)?;
    if cli.data_dir.is_some() {
        config.data_dir = cli.data_dir;
    }
    let data_dir = config.data_dir()?;
    init_tracing(&data_dir);
    info!(data_dir = %data_dir.display(), ephemeral = cli.ephemeral, "starting");

    if cli.ephemeral {
        let store = TodoStore::open(MemoryStorage::new(), config.load_policy)?;
        run_tui(App::new(store))
    } else {
        let store = TodoStore::open(FileStorage::new(&data_dir), config.load_policy)?;
        run_tui(App::new(store))
    }
}

/// Log to a file in the data directory; the terminal belongs to the UI
fn init_tracing(data_dir: &Path) {
    if std::fs::create_dir_all(data_dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join(LOG_FILE))
    else {
        return;
    };

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
}

fn run_tui<S: Storage>(mut app: App<S>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        warn!(error = %err, "ui loop stopped");
        eprintln!("{:?}", err);
    }

    Ok(())
}

fn run_app<B: Backend, S: Storage>(terminal: &mut Terminal<B>, app: &mut App<S>) -> Result<()> {
    let mut last_tick = Instant::now();
    const TICK_RATE: Duration = Duration::from_millis(250);

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = TICK_RATE
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            let action = parse_key_action(key);
            if app.handle_key_action(action) {
                return Ok(());
            }
        }

        if last_tick.elapsed() >= TICK_RATE {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppMode {
    Normal,
    Insert,
    Edit(ItemId),
    ConfirmDelete(ItemId),
}

#[derive(Debug, Clone, PartialEq)]
enum KeyAction {
    Quit,
    Up,
    Down,
    Left,
    Right,
    Enter,
    Tab,
    Escape,
    Backspace,
    Char(char),
    Noop,
}

/// Letters stay letters here; each mode decides what they mean
fn parse_key_action(key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Up => KeyAction::Up,
        KeyCode::Down => KeyAction::Down,
        KeyCode::Left => KeyAction::Left,
        KeyCode::Right => KeyAction::Right,
        KeyCode::Enter => KeyAction::Enter,
        KeyCode::Tab => KeyAction::Tab,
        KeyCode::Esc => KeyAction::Escape,
        KeyCode::Backspace => KeyAction::Backspace,
        KeyCode::Char(c) => KeyAction::Char(c),
        _ => KeyAction::Noop,
    }
}

struct SelectionState {
    index: usize,
}

impl SelectionState {
    fn new() -> Self {
        Self { index: 0 }
    }

    fn next(&mut self, max: usize) {
        if max == 0 {
            return;
        }
        self.index = (self.index + 1).min(max - 1);
    }

    fn previous(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    fn top(&mut self) {
        self.index = 0;
    }

    fn bottom(&mut self, max: usize) {
        self.index = max.saturating_sub(1);
    }

    fn clamp(&mut self, max: usize) {
        if self.index >= max {
            self.index = max.saturating_sub(1);
        }
    }
}

struct App<S> {
    store: TodoStore<S>,
    mode: AppMode,
    input: String,
    edit_buffer: String,
    selection: SelectionState,

    status_message: Option<String>,
    status_message_time: Option<Instant>,
}

impl<S: Storage> App<S> {
    fn new(store: TodoStore<S>) -> Self {
        Self {
            store,
            mode: AppMode::Normal,
            input: String::new(),
            edit_buffer: String::new(),
            selection: SelectionState::new(),
            status_message: None,
            status_message_time: None,
        }
    }

    /// Items of the selected list, recomputed on every call
    fn visible(&self) -> Vec<&Item> {
        self.store.visible_items(self.store.mode()).collect()
    }

    fn current_item(&self) -> Option<&Item> {
        self.visible().get(self.selection.index).copied()
    }

    /// Returns true when the app should exit
    fn handle_key_action(&mut self, action: KeyAction) -> bool {
        match self.mode {
            AppMode::Normal => self.handle_normal_mode(action),
            AppMode::Insert => self.handle_insert_mode(action),
            AppMode::Edit(id) => self.handle_edit_mode(id, action),
            AppMode::ConfirmDelete(id) => self.handle_confirm_mode(id, action),
        }
    }

    fn handle_normal_mode(&mut self, action: KeyAction) -> bool {
        let max = self.visible().len();
        match action {
            KeyAction::Quit | KeyAction::Char('q') => return true,
            KeyAction::Up | KeyAction::Char('k') => self.selection.previous(),
            KeyAction::Down | KeyAction::Char('j') => self.selection.next(max),
            KeyAction::Char('g') => self.selection.top(),
            KeyAction::Char('G') => self.selection.bottom(max),
            KeyAction::Tab => self.switch_mode(self.store.mode().toggled()),
            KeyAction::Left | KeyAction::Char('w') => self.switch_mode(Mode::Work),
            KeyAction::Right | KeyAction::Char('t') => self.switch_mode(Mode::Travel),
            KeyAction::Char('i') | KeyAction::Char('a') => self.mode = AppMode::Insert,
            KeyAction::Enter | KeyAction::Char(' ') => self.toggle_current(),
            KeyAction::Char('e') => {
                if let Some(item) = self.current_item() {
                    let (id, text) = (item.id(), item.text().to_string());
                    self.edit_buffer = text;
                    self.mode = AppMode::Edit(id);
                }
            }
            KeyAction::Char('d') => {
                if let Some(id) = self.current_item().map(|i| i.id()) {
                    self.mode = AppMode::ConfirmDelete(id);
                }
            }
            _ => {}
        }
        false
    }

    fn handle_insert_mode(&mut self, action: KeyAction) -> bool {
        match action {
            KeyAction::Quit => return true,
            KeyAction::Escape => self.mode = AppMode::Normal,
            KeyAction::Tab => self.switch_mode(self.store.mode().toggled()),
            KeyAction::Enter => self.add_item(),
            KeyAction::Backspace => {
                self.input.pop();
            }
            KeyAction::Char(c) if !c.is_control() => self.input.push(c),
            _ => {}
        }
        false
    }

    fn handle_edit_mode(&mut self, id: ItemId, action: KeyAction) -> bool {
        match action {
            KeyAction::Quit => return true,
            KeyAction::Escape => {
                self.edit_buffer.clear();
                self.mode = AppMode::Normal;
            }
            KeyAction::Enter => {
                let text = std::mem::take(&mut self.edit_buffer);
                match self.store.edit_text(id, &text) {
                    Ok(true) => self.show_status("Renamed".to_string()),
                    Ok(false) => {}
                    Err(e) => self.save_failed(e),
                }
                self.mode = AppMode::Normal;
            }
            KeyAction::Backspace => {
                self.edit_buffer.pop();
            }
            KeyAction::Char(c) if !c.is_control() => self.edit_buffer.push(c),
            _ => {}
        }
        false
    }

    fn handle_confirm_mode(&mut self, id: ItemId, action: KeyAction) -> bool {
        match action {
            KeyAction::Quit => return true,
            KeyAction::Char('y') | KeyAction::Char('Y') => {
                match self.store.remove(id, &mut Answer::Yes) {
                    Ok(true) => self.show_status("Deleted".to_string()),
                    Ok(false) => {}
                    Err(e) => self.save_failed(e),
                }
                let max = self.visible().len();
                self.selection.clamp(max);
                self.mode = AppMode::Normal;
            }
            KeyAction::Char('n') | KeyAction::Char('N') | KeyAction::Escape => {
                self.mode = AppMode::Normal;
            }
            _ => {}
        }
        false
    }

    fn switch_mode(&mut self, mode: Mode) {
        if let Err(e) = self.store.set_mode(mode) {
            self.save_failed(e);
            return;
        }
        self.selection.top();
    }

    fn add_item(&mut self) {
        match self.store.add(&self.input, self.store.mode()) {
            Ok(Some(_)) => {
                self.input.clear();
                let max = self.visible().len();
                self.selection.bottom(max);
            }
            Ok(None) => {}
            Err(e) => self.save_failed(e),
        }
    }

    fn toggle_current(&mut self) {
        let Some(id) = self.current_item().map(|i| i.id()) else {
            return;
        };
        if let Err(e) = self.store.toggle_done(id) {
            self.save_failed(e);
        }
    }

    fn save_failed(&mut self, e: twolist_core::Error) {
        warn!(error = %e, "could not save");
        self.show_status(format!("Could not save: {}", e));
    }

    fn show_status(&mut self, msg: String) {
        self.status_message = Some(msg);
        self.status_message_time = Some(Instant::now());
    }

    fn on_tick(&mut self) {
        if let Some(time) = self.status_message_time
            && time.elapsed() > Duration::from_secs(3)
        {
            self.status_message = None;
            self.status_message_time = None;
        }
    }
}

fn ui<S: Storage>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_input(f, app, chunks[1]);
    render_list(f, app, chunks[2]);
    render_status_bar(f, app, chunks[3]);

    match app.mode {
        AppMode::Edit(_) => render_edit_prompt(f, app),
        AppMode::ConfirmDelete(id) => render_confirm_delete(f, app, id),
        _ => {}
    }
}

fn mode_style(active: bool) -> Style {
    if active {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn render_header<S: Storage>(f: &mut Frame, app: &App<S>, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let current = app.store.mode();
    let work = Paragraph::new(Line::from(Span::styled(
        Mode::Work.label(),
        mode_style(current == Mode::Work),
    )))
    .block(Block::default().borders(Borders::BOTTOM))
    .alignment(Alignment::Left);
    let travel = Paragraph::new(Line::from(Span::styled(
        Mode::Travel.label(),
        mode_style(current == Mode::Travel),
    )))
    .block(Block::default().borders(Borders::BOTTOM))
    .alignment(Alignment::Right);

    f.render_widget(work, halves[0]);
    f.render_widget(travel, halves[1]);
}

fn render_input<S: Storage>(f: &mut Frame, app: &App<S>, area: Rect) {
    let focused = app.mode == AppMode::Insert;
    let content = if app.input.is_empty() {
        Span::styled(
            app.store.mode().placeholder(),
            Style::default().fg(Color::DarkGray),
        )
    } else {
        Span::raw(app.input.as_str())
    };

    let border = if focused { Color::Yellow } else { Color::Blue };
    let input = Paragraph::new(Line::from(content)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title("New"),
    );
    f.render_widget(input, area);

    if focused {
        let typed = u16::try_from(app.input.chars().count()).unwrap_or(u16::MAX);
        let x = area.x.saturating_add(1).saturating_add(typed);
        f.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 1));
    }
}

fn render_list<S: Storage>(f: &mut Frame, app: &mut App<S>, area: Rect) {
    let visible = app.visible();
    let items: Vec<ListItem> = visible
        .iter()
        .map(|item| {
            let style = if item.is_done() {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(Span::styled(item.text().to_string(), style)))
        })
        .collect();

    let title = format!("{} ({})", app.store.mode().label(), items.len());
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue))
                .title(title),
        )
        .highlight_symbol("> ")
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

    let selected = if visible.is_empty() {
        None
    } else {
        Some(app.selection.index)
    };
    f.render_stateful_widget(list, area, &mut ListState::default().with_selected(selected));
}

fn render_status_bar<S: Storage>(f: &mut Frame, app: &App<S>, area: Rect) {
    let mode_text = match app.mode {
        AppMode::Normal => "[NORMAL]",
        AppMode::Insert => "[INSERT]",
        AppMode::Edit(_) => "[EDIT]",
        AppMode::ConfirmDelete(_) => "[DELETE]",
    };

    let mode_style = match app.mode {
        AppMode::Normal => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        _ => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    };

    let status_content = if let Some(ref msg) = app.status_message {
        Line::from(vec![
            Span::styled(mode_text, mode_style),
            Span::raw(" | "),
            Span::styled(msg.as_str(), Style::default().fg(Color::Cyan)),
        ])
    } else {
        let (open, done) = app.store.counts(app.store.mode());
        Line::from(vec![
            Span::styled(mode_text, mode_style),
            Span::raw(" | "),
            Span::raw(format!("{} open, {} done | ", open, done)),
            Span::raw("[i]nput [tab]list [space]done [e]dit [d]elete [q]uit"),
        ])
    };

    let status_bar = Paragraph::new(status_content)
        .style(Style::default().bg(Color::DarkGray))
        .alignment(Alignment::Left);

    f.render_widget(status_bar, area);
}

fn render_edit_prompt<S: Storage>(f: &mut Frame, app: &App<S>) {
    let area = centered_rect(60, 20, f.area());
    f.render_widget(Clear, area);

    let text = vec![
        Line::from(Span::raw(app.edit_buffer.as_str())),
        Line::from(""),
        Line::from(Span::styled(
            "[enter] save  [esc] cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .style(Style::default().bg(Color::Black))
                .title("Rename"),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn render_confirm_delete<S: Storage>(f: &mut Frame, app: &App<S>, id: ItemId) {
    let area = centered_rect(50, 30, f.area());
    f.render_widget(Clear, area);

    let item_text = app
        .store
        .get(id)
        .map(|i| i.text().to_string())
        .unwrap_or_default();

    let text = vec![
        Line::from(Span::styled(
            "Delete To Do?",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from("Are you sure?"),
        Line::from(""),
        Line::from(Span::styled(item_text, Style::default().fg(Color::White))),
        Line::from(""),
        Line::from(vec![
            Span::styled("[y]", Style::default().fg(Color::Red)),
            Span::raw(" I'm Sure   "),
            Span::styled("[n]", Style::default().fg(Color::Cyan)),
            Span::raw(" Cancel"),
        ]),
    ];

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .style(Style::default().bg(Color::Black)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
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
