//! Word Flip - Terminal word family flashcards
//!
//! Hotkeys:
//!   Space/Enter - Flip to the next word (mouse click works too)
//!   f           - Choose a word family
//!   o           - Open a dataset file
//!   g           - Toggle game mode (random order)
//!   s           - Say the current word again
//!   ?           - Show help
//!   q/Escape    - Quit

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::{
    collections::HashSet,
    fs::File,
    io::{self, stdout},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use wordflip::{
    config::{self, Config},
    playback::ExternalCommand,
    report_load_failure, FlashcardSession, FlipOutcome, PlaybackAdapter, PolicyKind,
    SessionSettings, SystemClock, WordDataset,
};

// ============================================================================
// Playback
// ============================================================================

/// What the card currently shows.
#[derive(Default)]
struct TerminalCard {
    onset: String,
    image_ref: String,
    flipping: bool,
    error: Option<String>,
    warmed: HashSet<String>,
    speech: Option<ExternalCommand>,
    audio: Option<ExternalCommand>,
}

impl TerminalCard {
    fn new(config: &Config) -> Self {
        Self {
            speech: config.speech(),
            audio: config.audio(),
            ..Default::default()
        }
    }
}

impl PlaybackAdapter for TerminalCard {
    fn display(&mut self, onset: &str, image_ref: &str) {
        self.onset = onset.to_string();
        self.image_ref = image_ref.to_string();
        self.error = None;
    }

    fn speak(&mut self, word: &str) {
        if let Some(cmd) = &self.speech {
            cmd.spawn_with(&word.to_lowercase());
        }
    }

    fn play_audio(&mut self, audio_ref: &str) {
        if let Some(cmd) = &self.audio {
            cmd.spawn_with(audio_ref);
        }
    }

    fn warm_image(&mut self, image_ref: &str) {
        // Nothing to decode in a terminal; remember it so the caption can say so.
        self.warmed.insert(image_ref.to_string());
    }

    fn set_flipping(&mut self, flipping: bool) {
        self.flipping = flipping;
    }

    fn show_error(&mut self, message: &str) {
        self.onset = message.to_string();
        self.image_ref.clear();
        self.error = Some(message.to_string());
    }
}

// ============================================================================
// App State
// ============================================================================

type Session = FlashcardSession<TerminalCard, SystemClock>;

enum Deck {
    Loaded(Box<Session>),
    Failed(TerminalCard),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AppMode {
    Cards,
    Families,
    DatasetInput,
    Help,
}

struct App {
    mode: AppMode,
    config: Config,
    deck: Deck,
    dataset_path: PathBuf,

    // Family picker state
    family_state: ListState,

    // Dataset path input state
    file_input: String,
    file_input_cursor: usize,
    file_input_error: Option<String>,

    // Status message
    status_message: Option<(String, Instant)>,
}

fn open_deck(config: &Config, path: &Path) -> Deck {
    match WordDataset::from_path(path) {
        Ok(dataset) => {
            let mut session = FlashcardSession::new(
                dataset,
                SessionSettings::from(config),
                TerminalCard::new(config),
                SystemClock::new(),
            );
            session.start();
            Deck::Loaded(Box::new(session))
        }
        Err(e) => {
            let mut card = TerminalCard::new(config);
            report_load_failure(&mut card, &e);
            Deck::Failed(card)
        }
    }
}

impl App {
    fn new(config: Config) -> Self {
        let dataset_path = config.dataset_path.clone();
        let deck = open_deck(&config, &dataset_path);

        Self {
            mode: AppMode::Cards,
            config,
            deck,
            dataset_path,
            family_state: ListState::default(),
            file_input: String::new(),
            file_input_cursor: 0,
            file_input_error: None,
            status_message: None,
        }
    }

    fn show_status(&mut self, msg: &str) {
        self.status_message = Some((msg.to_string(), Instant::now()));
    }

    fn session_mut(&mut self) -> Option<&mut Session> {
        match &mut self.deck {
            Deck::Loaded(session) => Some(&mut **session),
            Deck::Failed(_) => None,
        }
    }

    fn session(&self) -> Option<&Session> {
        match &self.deck {
            Deck::Loaded(session) => Some(&**session),
            Deck::Failed(_) => None,
        }
    }

    fn card(&self) -> &TerminalCard {
        match &self.deck {
            Deck::Loaded(session) => session.adapter(),
            Deck::Failed(card) => card,
        }
    }

    fn shown_rime(&self) -> &str {
        self.session().map_or("", |s| s.shown_rime())
    }

    fn load_dataset(&mut self, path: &str) -> bool {
        let path = PathBuf::from(shellexpand(path));
        let deck = open_deck(&self.config, &path);
        if let Deck::Failed(card) = &deck {
            self.file_input_error = Some(card.error.clone().unwrap_or_default());
            return false;
        }
        self.deck = deck;
        self.dataset_path = path;
        let count = self.session().map_or(0, |s| s.dataset().family_count());
        self.show_status(&format!("Loaded {} word families", count));
        true
    }

    fn flip(&mut self) {
        let Some(session) = self.session_mut() else {
            self.show_status("No words loaded. Press 'o' to open a dataset.");
            return;
        };
        if session.flip() == FlipOutcome::Ignored {
            log::trace!("flip input while animating");
        }
    }

    fn toggle_game_mode(&mut self) {
        self.config.policy = match self.config.policy {
            PolicyKind::Sequential => PolicyKind::Random,
            PolicyKind::Random => PolicyKind::Sequential,
        };
        let path = self.dataset_path.clone();
        self.deck = open_deck(&self.config, &path);
        let label = self.config.policy.label();
        self.show_status(&format!("Mode: {}", label));
    }

    fn repeat_word(&mut self) {
        if let Some(session) = self.session_mut() {
            let word = session.current_word();
            if !word.is_placeholder() {
                session.adapter_mut().speak(&word.word);
            }
        }
    }

    fn tick(&mut self) {
        // Clear old status messages
        if let Some((_, instant)) = &self.status_message {
            if instant.elapsed() > Duration::from_secs(3) {
                self.status_message = None;
            }
        }

        if let Some(session) = self.session_mut() {
            session.tick();
        }
    }
}

fn shellexpand(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

// ============================================================================
// UI Rendering
// ============================================================================

fn ui(f: &mut Frame, app: &App) {
    let size = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Card
            Constraint::Length(3), // Stats
        ])
        .split(size);

    let title_text = match app.session() {
        Some(session) => format!(
            "Word Family: {}",
            session.shown_family_key().unwrap_or_default()
        ),
        None => "Press 'o' to open a word family dataset".to_string(),
    };
    let title = Paragraph::new(title_text)
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::DarkGray)),
        );
    f.render_widget(title, chunks[0]);

    render_card(f, app, chunks[1]);
    render_stats(f, app, chunks[2]);

    match app.mode {
        AppMode::Families => render_families(f, app, size),
        AppMode::DatasetInput => render_dataset_input(f, app, size),
        AppMode::Help => render_help(f, size),
        AppMode::Cards => {}
    }
}

fn render_card(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Word Flip ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    f.render_widget(block, area);

    let card = app.card();
    let center_y = inner.y + inner.height / 2;

    if let Some(error) = &card.error {
        let text = Paragraph::new(error.as_str())
            .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center);
        f.render_widget(text, Rect::new(inner.x, center_y, inner.width, 1));
        return;
    }

    // Onset box on the left of the centre line, rime on the right
    let onset_style = if card.flipping {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM | Modifier::ITALIC)
    } else {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    };
    let onset_text = if card.flipping && card.onset.is_empty() {
        "~".to_string()
    } else {
        card.onset.clone()
    };

    let onset_width = onset_text.chars().count() as u16 + 4;
    let rime_width = app.shown_rime().chars().count() as u16;
    let total = onset_width + 1 + rime_width;
    let start_x = inner.x + inner.width.saturating_sub(total) / 2;

    if center_y > inner.y {
        let onset_box = Paragraph::new(onset_text)
            .style(onset_style)
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(if card.flipping {
                        Style::default().fg(Color::DarkGray)
                    } else {
                        Style::default().fg(Color::Magenta)
                    }),
            );
        let box_width = onset_width.min(inner.width);
        f.render_widget(onset_box, Rect::new(start_x, center_y - 1, box_width, 3));
    }

    if rime_width > 0 {
        let rime_x = (start_x + onset_width + 1).min(inner.x + inner.width.saturating_sub(1));
        let width = rime_width.min(inner.x + inner.width - rime_x);
        let rime = Paragraph::new(app.shown_rime())
            .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));
        f.render_widget(rime, Rect::new(rime_x, center_y, width, 1));
    }

    // Image caption
    if center_y + 3 < inner.y + inner.height && !card.image_ref.is_empty() {
        let ready = if card.warmed.contains(&card.image_ref) {
            " (prefetched)"
        } else {
            ""
        };
        let caption = Paragraph::new(format!("image: {}{}", card.image_ref, ready))
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(caption, Rect::new(inner.x, center_y + 3, inner.width, 1));
    }
}

fn render_stats(f: &mut Frame, app: &App, area: Rect) {
    let (position, total) = match app.session() {
        Some(session) => {
            let cursor = session.shown_cursor();
            let total = session.dataset().entry_count(cursor.family_index);
            (cursor.entry_index + 1, total)
        }
        None => (0, 0),
    };
    let flipping = app.card().flipping;

    let stats_text = Line::from(vec![
        Span::styled(
            format!("Mode: {} ", app.config.policy.label()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("| "),
        Span::styled(
            format!("Card: {}/{} ", position, total.max(1)),
            Style::default().fg(Color::Blue),
        ),
        Span::raw("| "),
        Span::styled(
            if flipping { "Flipping" } else { "Ready" },
            Style::default()
                .fg(if flipping { Color::Yellow } else { Color::Green })
                .add_modifier(Modifier::BOLD),
        ),
        if let Some((msg, _)) = &app.status_message {
            Span::styled(format!(" | {}", msg), Style::default().fg(Color::Yellow))
        } else {
            Span::raw("")
        },
    ]);

    let stats = Paragraph::new(stats_text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    f.render_widget(stats, area);
}

fn render_families(f: &mut Frame, app: &App, size: Rect) {
    let area = centered_rect(40, 70, size);
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" Word Families ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(session) = app.session() else {
        let text = Paragraph::new("No dataset loaded.\n\nPress 'o' to open one.")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(text, inner);
        return;
    };

    let current = session.shown_family_key();
    let items: Vec<ListItem> = session
        .dataset()
        .families()
        .iter()
        .map(|family| {
            let marker = if Some(family.key()) == current {
                "> "
            } else {
                "  "
            };
            let line = Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Green)),
                Span::styled(
                    family.key(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" ({} words)", family.len()),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("-> ");

    let mut state = app.family_state.clone();
    f.render_stateful_widget(list, inner, &mut state);

    let help_area = Rect::new(area.x + 1, area.y + area.height - 2, area.width - 2, 1);
    let help = Paragraph::new("Enter: Choose | Esc: Close")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(help, help_area);
}

fn render_dataset_input(f: &mut Frame, app: &App, size: Rect) {
    let area = centered_rect(70, 30, size);
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" Open Dataset ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let label = Paragraph::new("Path to word families JSON:").style(Style::default().fg(Color::White));
    f.render_widget(label, chunks[0]);

    let input_style = if app.file_input_error.is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::White)
    };
    let input = Paragraph::new(app.file_input.as_str()).style(input_style).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    );
    f.render_widget(input, chunks[1]);

    let cursor_x = chunks[1].x + 1 + app.file_input_cursor as u16;
    let cursor_y = chunks[1].y + 1;
    f.set_cursor_position((cursor_x.min(chunks[1].x + chunks[1].width - 2), cursor_y));

    if let Some(ref error) = app.file_input_error {
        let error_text = Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red));
        f.render_widget(error_text, chunks[2]);
    }

    let help = Paragraph::new("Enter: Open | Esc: Cancel")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(help, chunks[3]);
}

fn render_help(f: &mut Frame, size: Rect) {
    let area = centered_rect(60, 60, size);
    f.render_widget(Clear, area);

    let key = |k: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(k, Style::default().fg(Color::Green)),
            Span::raw(what),
        ])
    };

    let help_text = vec![
        Line::from(Span::styled(
            "Word Flip - Keyboard Shortcuts",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        key("  Space      ", "Flip to the next word"),
        key("  Click      ", "Flip to the next word"),
        key("  s          ", "Say the word again"),
        key("  g          ", "Toggle game mode"),
        Line::from(""),
        key("  f          ", "Choose a word family"),
        key("  o          ", "Open a dataset file"),
        Line::from(""),
        key("  ?          ", "Show this help"),
        key("  q / Esc    ", "Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help ")
                .title_alignment(Alignment::Center)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .alignment(Alignment::Left);

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

// ============================================================================
// Event Handling
// ============================================================================

fn handle_events(app: &mut App) -> io::Result<bool> {
    if event::poll(Duration::from_millis(16))? {
        match event::read()? {
            Event::Key(key) => match app.mode {
                AppMode::Cards => return Ok(handle_card_keys(app, key.code)),
                AppMode::Families => handle_family_keys(app, key.code),
                AppMode::DatasetInput => handle_dataset_input_keys(app, key.code),
                AppMode::Help => app.mode = AppMode::Cards,
            },
            Event::Mouse(mouse) => {
                if app.mode == AppMode::Cards
                    && mouse.kind == MouseEventKind::Down(MouseButton::Left)
                {
                    app.flip();
                }
            }
            _ => {}
        }
    }
    Ok(false)
}

fn handle_card_keys(app: &mut App, code: KeyCode) -> bool {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Right => app.flip(),
        KeyCode::Char('s') => app.repeat_word(),
        KeyCode::Char('g') => app.toggle_game_mode(),
        KeyCode::Char('f') => {
            app.mode = AppMode::Families;
            let selected = app.session().map(|s| s.shown_cursor().family_index);
            app.family_state.select(selected);
        }
        KeyCode::Char('o') => {
            app.mode = AppMode::DatasetInput;
            app.file_input = app.dataset_path.to_string_lossy().into_owned();
            app.file_input_cursor = app.file_input.len();
            app.file_input_error = None;
        }
        KeyCode::Char('?') => app.mode = AppMode::Help,
        _ => {}
    }
    false
}

fn handle_family_keys(app: &mut App, code: KeyCode) {
    let count = app.session().map_or(0, |s| s.dataset().family_count());
    match code {
        KeyCode::Esc | KeyCode::Char('q') => {
            app.mode = AppMode::Cards;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            if count > 0 {
                let i = app.family_state.selected().unwrap_or(0);
                let new_i = if i == 0 { count - 1 } else { i - 1 };
                app.family_state.select(Some(new_i));
            }
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if count > 0 {
                let i = app.family_state.selected().unwrap_or(0);
                app.family_state.select(Some((i + 1) % count));
            }
        }
        KeyCode::Enter => {
            let key = app.family_state.selected().and_then(|i| {
                app.session()
                    .and_then(|s| s.dataset().family_at(i))
                    .map(|f| f.key().to_string())
            });
            if let Some(key) = key {
                if let Some(session) = app.session_mut() {
                    if let Err(e) = session.select_family(&key) {
                        log::warn!("{}", e);
                    }
                }
            }
            app.mode = AppMode::Cards;
        }
        _ => {}
    }
}

fn handle_dataset_input_keys(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => {
            app.mode = AppMode::Cards;
        }
        KeyCode::Enter => {
            if !app.file_input.is_empty() {
                let path = app.file_input.clone();
                if app.load_dataset(&path) {
                    app.mode = AppMode::Cards;
                }
            }
        }
        KeyCode::Char(c) => {
            app.file_input.insert(app.file_input_cursor, c);
            app.file_input_cursor += c.len_utf8();
            app.file_input_error = None;
        }
        KeyCode::Backspace => {
            if let Some(c) = app.file_input[..app.file_input_cursor].chars().next_back() {
                app.file_input_cursor -= c.len_utf8();
                app.file_input.remove(app.file_input_cursor);
                app.file_input_error = None;
            }
        }
        KeyCode::Delete => {
            if app.file_input_cursor < app.file_input.len() {
                app.file_input.remove(app.file_input_cursor);
                app.file_input_error = None;
            }
        }
        KeyCode::Left => {
            if let Some(c) = app.file_input[..app.file_input_cursor].chars().next_back() {
                app.file_input_cursor -= c.len_utf8();
            }
        }
        KeyCode::Right => {
            if let Some(c) = app.file_input[app.file_input_cursor..].chars().next() {
                app.file_input_cursor += c.len_utf8();
            }
        }
        KeyCode::Home => {
            app.file_input_cursor = 0;
        }
        KeyCode::End => {
            app.file_input_cursor = app.file_input.len();
        }
        _ => {}
    }
}

// ============================================================================
// Main
// ============================================================================

fn init_logging() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    // The alternate screen owns stderr, so log lines go to a file instead.
    if config::ensure_config_dir().is_ok() {
        if let Ok(file) = File::create(config::log_file()) {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
    }
    builder.init();
}

fn main() -> io::Result<()> {
    init_logging();

    let mut config = Config::load();
    if let Err(msg) = config.apply_args(std::env::args().skip(1)) {
        eprintln!("ERROR: {}", msg);
        eprintln!("Usage: wordflip-tui [DATASET] [--random|--sequential] [--seed N]");
        std::process::exit(1);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;
        app.tick();

        if handle_events(app)? {
            break;
        }
    }
    Ok(())
}
