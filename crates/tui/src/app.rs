use std::{cmp, io, path::PathBuf, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use gameshelf_core::{
    config::AppConfig,
    files,
    query::{self, GameFilter},
    transfer, Field, FileSlots, Game, GameStore, Preferences, TransferError,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::{
    form::{describe_image, FormTicket, GameForm, TextInput},
    theme::Theme,
};

const TICK_RATE: Duration = Duration::from_millis(250);
const LABEL_WIDTH: usize = 11;

enum AppEvent {
    Input(Event),
    Tick,
    ImportRead { path: PathBuf, result: Result<String> },
    ImageRead {
        path: PathBuf,
        ticket: FormTicket,
        result: Result<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathPurpose {
    Import,
    Image(FormTicket),
}

#[derive(Debug, Clone)]
struct PathPrompt {
    purpose: PathPurpose,
    input: TextInput,
}

impl PathPrompt {
    fn new(purpose: PathPurpose) -> Self {
        Self {
            purpose,
            input: TextInput::default(),
        }
    }

    fn title(&self) -> &'static str {
        match self.purpose {
            PathPurpose::Import => "Import Collection",
            PathPurpose::Image(_) => "Embed Cover Image",
        }
    }

    fn instruction(&self) -> &'static str {
        match self.purpose {
            PathPurpose::Import => "Path to a JSON export",
            PathPurpose::Image(_) => "Path to an image file",
        }
    }
}

/// Terminal front end over a single collection store.
pub struct GameShelfApp {
    store: GameStore<FileSlots>,
    preferences: Preferences<FileSlots>,
    config: AppConfig,
    state: UiState,
    form: Option<GameForm>,
    forms_opened: u64,
    path_prompt: Option<PathPrompt>,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    pending_reads: usize,
    theme: Theme,
}

impl GameShelfApp {
    pub fn new(
        store: GameStore<FileSlots>,
        preferences: Preferences<FileSlots>,
        config: AppConfig,
    ) -> Self {
        let theme = Theme::for_mode(preferences.dark_mode());
        Self {
            store,
            preferences,
            config,
            state: UiState::default(),
            form: None,
            forms_opened: 0,
            path_prompt: None,
            event_tx: None,
            pending_reads: 0,
            theme,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.refresh_view();
        match self.store.load_warning() {
            Some(warning) => {
                let warning = warning.to_string();
                self.state.set_status(warning, Tone::Warning);
            }
            None => {
                let message = format!("Loaded {}", count_games(self.store.len()));
                self.state.set_status(message, Tone::Info);
            }
        }

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        let result = self.event_loop(&mut terminal, &mut event_rx).await;

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        event_rx: &mut mpsc::Receiver<AppEvent>,
    ) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) || self.state.should_quit {
                break;
            }
        }
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Err(err) = self.handle_input(event) {
                    error!(?err, "Action failed");
                    self.state.set_status(format!("Error: {err:#}"), Tone::Error);
                }
                true
            }
            Some(AppEvent::Tick) => true,
            Some(AppEvent::ImportRead { path, result }) => {
                self.pending_reads = self.pending_reads.saturating_sub(1);
                self.finish_import(path, result);
                true
            }
            Some(AppEvent::ImageRead {
                path,
                ticket,
                result,
            }) => {
                self.pending_reads = self.pending_reads.saturating_sub(1);
                self.finish_image(path, ticket, result);
                true
            }
            None => false,
        }
    }

    fn refresh_view(&mut self) {
        let games = self.store.get_all();
        let categories = query::categories(games);
        let producers = query::producers(games);
        let filter = &mut self.state.filter;
        if !is_current_option(&filter.category, &categories) {
            filter.category = None;
        }
        if !is_current_option(&filter.producer, &producers) {
            filter.producer = None;
        }
        self.state.categories = categories;
        self.state.producers = producers;
        self.state.apply_filter(games);
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        if self.path_prompt.is_some() {
            self.handle_path_prompt_key(key)
        } else if self.form.is_some() {
            self.handle_form_key(key)
        } else {
            match self.state.mode {
                Mode::Search => self.handle_search_key(key),
                Mode::Browse => self.handle_browse_key(key),
            }
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.state.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.state.should_quit = true
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_cursor(-1),
            KeyCode::Char('g') if key.modifiers.is_empty() => self.state.move_to(0),
            KeyCode::Char('G') => self.state.move_to_end(),
            KeyCode::Home => self.state.move_to(0),
            KeyCode::End => self.state.move_to_end(),
            KeyCode::PageDown => self.state.page_down(),
            KeyCode::PageUp => self.state.page_up(),
            KeyCode::Char('/') => {
                self.state.mode = Mode::Search;
                self.state
                    .set_status("Type to search by name".to_string(), Tone::Info);
            }
            KeyCode::Char('c') => {
                let next = cycle_option(&self.state.filter.category, &self.state.categories);
                self.state.filter.category = next;
                self.refresh_view();
                let label = option_label(&self.state.filter.category, "All categories");
                self.state.set_status(format!("Category: {label}"), Tone::Info);
            }
            KeyCode::Char('p') => {
                let next = cycle_option(&self.state.filter.producer, &self.state.producers);
                self.state.filter.producer = next;
                self.refresh_view();
                let label = option_label(&self.state.filter.producer, "All producers");
                self.state.set_status(format!("Producer: {label}"), Tone::Info);
            }
            KeyCode::Char('x') => {
                if self.state.filter.is_active() {
                    self.state.filter.clear();
                    self.state.search.clear();
                    self.refresh_view();
                    self.state
                        .set_status("Filters cleared".to_string(), Tone::Info);
                }
            }
            KeyCode::Char('a') => self.open_form(GameForm::new_game()),
            KeyCode::Char('e') | KeyCode::Enter => match self.state.current_game() {
                Some(game) => {
                    let form = GameForm::edit(game);
                    self.open_form(form);
                }
                None => self
                    .state
                    .set_status("No game selected".to_string(), Tone::Info),
            },
            KeyCode::Char('d') | KeyCode::Delete => self.delete_current()?,
            KeyCode::Char('i') => {
                self.path_prompt = Some(PathPrompt::new(PathPurpose::Import));
            }
            KeyCode::Char('o') => self.export()?,
            KeyCode::Char('t') => {
                let dark = self.preferences.toggle()?;
                self.theme = Theme::for_mode(dark);
                let message = if dark { "Dark mode" } else { "Light mode" };
                self.state.set_status(message.to_string(), Tone::Info);
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.state.mode = Mode::Browse;
                self.state.search.clear();
                self.refresh_view();
                self.state
                    .set_status("Search cancelled".to_string(), Tone::Info);
            }
            KeyCode::Enter => {
                self.state.mode = Mode::Browse;
                let message = format!("{} matching", count_games(self.state.filtered.len()));
                self.state.set_status(message, Tone::Info);
            }
            KeyCode::Backspace => {
                self.state.search.backspace();
                self.refresh_view();
            }
            KeyCode::Char(ch) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    self.state.search.insert(ch);
                    self.refresh_view();
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(form) = self.form.as_mut() else {
            return Ok(());
        };
        match key.code {
            KeyCode::Esc => {
                self.form = None;
                self.state
                    .set_status("Changes discarded".to_string(), Tone::Info);
            }
            KeyCode::Enter => self.submit_form()?,
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
            KeyCode::Left => form.focused_input_mut().move_cursor(-1),
            KeyCode::Right => form.focused_input_mut().move_cursor(1),
            KeyCode::Home => form.focused_input_mut().move_home(),
            KeyCode::End => form.focused_input_mut().move_end(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Delete => form.focused_input_mut().delete(),
            KeyCode::Char('o') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.path_prompt = Some(PathPrompt::new(PathPurpose::Image(form.ticket())));
            }
            KeyCode::Char(ch) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    form.insert(ch);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_path_prompt_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(prompt) = self.path_prompt.as_mut() else {
            return Ok(());
        };
        match key.code {
            KeyCode::Esc => self.path_prompt = None,
            KeyCode::Enter => {
                let raw = prompt.input.value().trim().to_string();
                if raw.is_empty() {
                    return Ok(());
                }
                let purpose = prompt.purpose.clone();
                self.path_prompt = None;
                self.spawn_read(purpose, PathBuf::from(raw));
            }
            KeyCode::Left => prompt.input.move_cursor(-1),
            KeyCode::Right => prompt.input.move_cursor(1),
            KeyCode::Home => prompt.input.move_home(),
            KeyCode::End => prompt.input.move_end(),
            KeyCode::Backspace => prompt.input.backspace(),
            KeyCode::Delete => prompt.input.delete(),
            KeyCode::Char(ch) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    prompt.input.insert(ch);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn spawn_read(&mut self, purpose: PathPurpose, path: PathBuf) {
        let Some(sender) = self.event_tx.clone() else {
            return;
        };
        debug!(path = %path.display(), ?purpose, "Reading file");
        self.pending_reads += 1;
        self.state
            .set_status(format!("Reading {}...", path.display()), Tone::Info);
        tokio::spawn(async move {
            let event = match purpose {
                PathPurpose::Import => AppEvent::ImportRead {
                    result: files::read_text(&path).await,
                    path,
                },
                PathPurpose::Image(ticket) => AppEvent::ImageRead {
                    result: files::read_data_uri(&path).await,
                    path,
                    ticket,
                },
            };
            let _ = sender.send(event).await;
        });
    }

    fn finish_import(&mut self, path: PathBuf, result: Result<String>) {
        let outcome = result
            .map_err(TransferError::Read)
            .and_then(|text| transfer::import_json(&mut self.store, &text));
        match outcome {
            Ok(report) => {
                info!(path = %path.display(), imported = report.imported.len(), rejected = report.rejected.len(), "Import finished");
                if let Some(first) = report.imported.first() {
                    self.state.select_id = Some(first.id.clone());
                }
                self.refresh_view();
                let tone = if report.rejected.is_empty() {
                    Tone::Success
                } else {
                    Tone::Warning
                };
                self.state.set_status(report.summary(), tone);
            }
            Err(err) => {
                error!(path = %path.display(), %err, "Import rejected");
                self.state
                    .set_status(format!("Import failed: {err}"), Tone::Error);
            }
        }
    }

    fn open_form(&mut self, form: GameForm) {
        self.forms_opened += 1;
        self.form = Some(form.with_generation(self.forms_opened));
    }

    fn finish_image(&mut self, path: PathBuf, ticket: FormTicket, result: Result<String>) {
        let Some(form) = self.form.as_mut().filter(|form| form.accepts(&ticket)) else {
            debug!(path = %path.display(), ?ticket, "Image read finished after its form closed");
            return;
        };
        match result {
            Ok(uri) => {
                form.set_image(uri);
                self.state
                    .set_status(format!("Embedded {}", path.display()), Tone::Success);
            }
            Err(err) => {
                self.state
                    .set_status(format!("Image not loaded: {err:#}"), Tone::Error);
            }
        }
    }

    fn submit_form(&mut self) -> Result<()> {
        let Some(form) = self.form.as_mut() else {
            return Ok(());
        };
        let Some(draft) = form.submit() else {
            self.state
                .set_status("Fix the highlighted fields".to_string(), Tone::Error);
            return Ok(());
        };

        match form.editing().map(str::to_string) {
            None => {
                let game = self.store.add(draft)?;
                self.state.select_id = Some(game.id.clone());
                self.state
                    .set_status(format!("Added {}", game.name), Tone::Success);
            }
            Some(id) => {
                let game = Game::from_draft(id, draft);
                let name = game.name.clone();
                self.state.select_id = Some(game.id.clone());
                if self.store.update(game)? {
                    self.state.set_status(format!("Saved {name}"), Tone::Success);
                } else {
                    self.state.set_status(
                        format!("{name} no longer exists; nothing saved"),
                        Tone::Error,
                    );
                }
            }
        }
        self.form = None;
        self.refresh_view();
        Ok(())
    }

    fn delete_current(&mut self) -> Result<()> {
        let Some(game) = self.state.current_game().cloned() else {
            return Ok(());
        };
        if self.store.delete(&game.id)? {
            self.state
                .set_status(format!("Removed {}", game.name), Tone::Success);
        }
        self.refresh_view();
        Ok(())
    }

    fn export(&mut self) -> Result<()> {
        let path = transfer::export_to_file(self.store.get_all(), &self.config.export_dir)?;
        self.state.set_status(
            format!("Exported {} to {}", count_games(self.store.len()), path.display()),
            Tone::Success,
        );
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let base = Block::default().style(
            Style::default()
                .bg(self.theme.primary_bg)
                .fg(self.theme.primary_fg),
        );
        frame.render_widget(base, size);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(size);

        let body_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[1]);

        self.render_filters(frame, chunks[0]);
        self.render_game_list(frame, body_chunks[0]);
        self.render_game_info(frame, body_chunks[1]);
        self.render_status(frame, chunks[2]);

        if let Some(form) = &self.form {
            self.render_form(frame, form);
        }
        if let Some(prompt) = &self.path_prompt {
            self.render_path_prompt(frame, prompt);
        }
    }

    fn render_filters(&self, frame: &mut Frame, area: Rect) {
        let label = Style::default().fg(self.theme.muted);
        let value = Style::default()
            .fg(self.theme.accent)
            .add_modifier(Modifier::BOLD);
        let search = if self.state.mode == Mode::Search {
            format!("{}_", self.state.search.value())
        } else if self.state.search.value().is_empty() {
            "-".to_string()
        } else {
            self.state.search.value().to_string()
        };
        let line = Line::from(vec![
            Span::styled("Category ", label),
            Span::styled(option_label(&self.state.filter.category, "All"), value),
            Span::styled("  Producer ", label),
            Span::styled(option_label(&self.state.filter.producer, "All"), value),
            Span::styled("  Search ", label),
            Span::styled(search, value),
        ]);
        let title = format!(
            "GameShelf · {} of {} games",
            self.state.filtered.len(),
            self.store.len()
        );
        let paragraph =
            Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(paragraph, area);
    }

    fn render_game_list(&mut self, frame: &mut Frame, area: Rect) {
        self.state.list_height = area.height.saturating_sub(2) as usize;
        self.state.clamp_cursor();
        self.state.ensure_cursor_visible();

        let mut list_state = ListState::default();
        let height = self.state.list_height;
        let games = self.state.visible_games(height);
        if !games.is_empty() {
            let selected = self
                .state
                .cursor
                .saturating_sub(self.state.offset)
                .min(games.len().saturating_sub(1));
            list_state.select(Some(selected));
        }
        let items: Vec<ListItem> = games
            .iter()
            .enumerate()
            .map(|(idx, game)| {
                let is_selected = self.state.cursor == self.state.offset + idx;
                let marker = if is_selected {
                    Span::styled(
                        "▶ ",
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };
                let name = Span::styled(
                    game.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                );
                let meta = Span::styled(
                    format!(" · {} · {}", game.category, game.year),
                    Style::default().fg(self.theme.muted),
                );
                ListItem::new(Line::from(vec![marker, name, meta]))
            })
            .collect();

        let block = Block::default().borders(Borders::ALL).title("Games");
        let list = if items.is_empty() {
            let message = if self.store.is_empty() {
                "No games yet. Press a to add one."
            } else {
                "No games match the current filters."
            };
            List::new(vec![ListItem::new(Span::styled(
                message,
                Style::default().fg(self.theme.muted),
            ))])
            .block(block)
        } else {
            List::new(items).block(block).highlight_style(
                Style::default()
                    .bg(self.theme.selection_bg)
                    .fg(self.theme.selection_fg),
            )
        };
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_game_info(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Details");
        let Some(game) = self.state.current_game() else {
            let paragraph = Paragraph::new("No game selected").block(block);
            frame.render_widget(paragraph, area);
            return;
        };

        let label = |text: &str| {
            Span::styled(
                format!("{text:<width$}", width = LABEL_WIDTH),
                Style::default().fg(self.theme.muted),
            )
        };
        let lines = vec![
            Line::from(Span::styled(
                game.name.clone(),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![label("Category"), Span::raw(game.category.clone())]),
            Line::from(vec![label("Year"), Span::raw(game.year.clone())]),
            Line::from(vec![label("Producer"), Span::raw(game.producer.clone())]),
            Line::from(vec![label("Image"), Span::raw(describe_image(&game.image))]),
            Line::from(vec![label("Id"), Span::raw(game.id.clone())]),
        ];
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let color = match self.state.status_tone {
            Tone::Info => self.theme.primary_fg,
            Tone::Success => self.theme.success,
            Tone::Warning => self.theme.warning,
            Tone::Error => self.theme.danger,
        };
        let mut primary = self.state.status.clone();
        if self.pending_reads > 0 {
            primary.push_str(" (reading...)");
        }
        let help = if self.form.is_some() {
            "Tab next · Enter save · Ctrl+O embed image · Esc cancel"
        } else if self.state.mode == Mode::Search {
            "Enter keep search · Esc clear search"
        } else {
            "a add · e edit · d delete · / search · c category · p producer · x clear · i import · o export · t theme · q quit"
        };
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(primary, Style::default().fg(color))),
            Line::from(Span::styled(help, Style::default().fg(self.theme.muted))),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_form(&self, frame: &mut Frame, form: &GameForm) {
        let frame_area = frame.size();
        let width = cmp::max(cmp::min(72_u16, frame_area.width.saturating_sub(4)), 30_u16);
        let area = centered_rect(width, 16, frame_area);
        frame.render_widget(Clear, area);

        let mut lines = Vec::new();
        let mut cursor = None;
        for field in Field::ALL {
            let input = form.input(field);
            let focused = form.focused_field() == field;
            let label_style = if focused {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.muted)
            };
            let shown = if field == Field::Image {
                describe_image(input.value())
            } else {
                input.value().to_string()
            };
            if focused {
                let column = if shown == input.value() {
                    input.cursor()
                } else {
                    shown.chars().count()
                };
                cursor = Some((LABEL_WIDTH + column, lines.len()));
            }
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:<width$}", field.label(), width = LABEL_WIDTH),
                    label_style,
                ),
                Span::raw(shown),
            ]));
            if let Some(message) = form.error(field) {
                lines.push(Line::from(Span::styled(
                    format!("{:width$}{message}", "", width = LABEL_WIDTH),
                    Style::default().fg(self.theme.danger),
                )));
            }
        }
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" save  "),
            Span::styled("Ctrl+O", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" embed image file  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]));

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(form.title()))
            .style(
                Style::default()
                    .bg(self.theme.primary_bg)
                    .fg(self.theme.primary_fg),
            );
        frame.render_widget(paragraph, area);

        if self.path_prompt.is_none() {
            if let Some((column, row)) = cursor {
                let x = (area.x + 1 + column as u16).min(area.x + area.width.saturating_sub(2));
                let y = (area.y + 1 + row as u16).min(area.y + area.height.saturating_sub(2));
                frame.set_cursor(x, y);
            }
        }
    }

    fn render_path_prompt(&self, frame: &mut Frame, prompt: &PathPrompt) {
        let frame_area = frame.size();
        let width = cmp::max(cmp::min(64_u16, frame_area.width.saturating_sub(4)), 24_u16);
        let area = centered_rect(width, 6, frame_area);
        frame.render_widget(Clear, area);

        let input_line = Line::from(vec![
            Span::styled("> ", Style::default().fg(self.theme.accent)),
            Span::raw(prompt.input.value().to_string()),
        ]);
        let helper = Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" open  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]);
        let paragraph = Paragraph::new(vec![
            Line::from(prompt.instruction()),
            input_line,
            Line::from(""),
            helper,
        ])
        .block(Block::default().borders(Borders::ALL).title(prompt.title()))
        .style(
            Style::default()
                .bg(self.theme.primary_bg)
                .fg(self.theme.primary_fg),
        );
        frame.render_widget(paragraph, area);

        let cursor_x = (area.x + 3 + prompt.input.cursor() as u16)
            .min(area.x + area.width.saturating_sub(2));
        frame.set_cursor(cursor_x, area.y + 2);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn cycle_option(current: &Option<String>, options: &[String]) -> Option<String> {
    let position = current
        .as_ref()
        .and_then(|value| options.iter().position(|option| option == value));
    match position {
        None => options.first().cloned(),
        Some(index) => options.get(index + 1).cloned(),
    }
}

fn is_current_option(current: &Option<String>, options: &[String]) -> bool {
    current
        .as_ref()
        .map_or(true, |value| options.iter().any(|option| option == value))
}

fn count_games(count: usize) -> String {
    if count == 1 {
        "1 game".to_string()
    } else {
        format!("{count} games")
    }
}

fn option_label(current: &Option<String>, fallback: &str) -> String {
    current.clone().unwrap_or_else(|| fallback.to_string())
}

struct UiState {
    filter: GameFilter,
    search: TextInput,
    categories: Vec<String>,
    producers: Vec<String>,
    filtered: Vec<Game>,
    select_id: Option<String>,
    cursor: usize,
    offset: usize,
    list_height: usize,
    status: String,
    status_tone: Tone,
    mode: Mode,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            filter: GameFilter::default(),
            search: TextInput::default(),
            categories: Vec::new(),
            producers: Vec::new(),
            filtered: Vec::new(),
            select_id: None,
            cursor: 0,
            offset: 0,
            list_height: 1,
            status: "Ready".to_string(),
            status_tone: Tone::Info,
            mode: Mode::Browse,
            should_quit: false,
        }
    }
}

impl UiState {
    /// Recompute the visible list, keeping the selection on the same record when possible.
    fn apply_filter(&mut self, games: &[Game]) {
        let keep = self
            .select_id
            .take()
            .or_else(|| self.current_game().map(|game| game.id.clone()));
        self.filter.search = self.search.value().to_string();
        self.filtered = self.filter.apply(games).into_iter().cloned().collect();

        match keep.and_then(|id| self.filtered.iter().position(|game| game.id == id)) {
            Some(position) => self.cursor = position,
            None => self.clamp_cursor(),
        }
        self.ensure_cursor_visible();
    }

    fn move_cursor(&mut self, delta: isize) {
        if self.filtered.is_empty() {
            return;
        }
        let len = self.filtered.len() as isize;
        let idx = (self.cursor as isize + delta).clamp(0, len - 1);
        self.cursor = idx as usize;
        self.ensure_cursor_visible();
    }

    fn move_to(&mut self, index: usize) {
        if self.filtered.is_empty() {
            return;
        }
        self.cursor = index.min(self.filtered.len() - 1);
        self.ensure_cursor_visible();
    }

    fn move_to_end(&mut self) {
        if self.filtered.is_empty() {
            return;
        }
        self.cursor = self.filtered.len() - 1;
        self.ensure_cursor_visible();
    }

    fn page_down(&mut self) {
        if self.filtered.is_empty() || self.list_height == 0 {
            return;
        }
        let delta = self.list_height.min(self.filtered.len());
        self.move_cursor(delta as isize);
    }

    fn page_up(&mut self) {
        if self.filtered.is_empty() || self.list_height == 0 {
            return;
        }
        let delta = self.list_height.min(self.filtered.len());
        self.move_cursor(-(delta as isize));
    }

    fn visible_games(&self, height: usize) -> &[Game] {
        if self.filtered.is_empty() {
            return &[];
        }
        let end = (self.offset + height).min(self.filtered.len());
        &self.filtered[self.offset..end]
    }

    fn current_game(&self) -> Option<&Game> {
        self.filtered.get(self.cursor)
    }

    fn set_status(&mut self, message: String, tone: Tone) {
        self.status = message;
        self.status_tone = tone;
    }

    fn clamp_cursor(&mut self) {
        if self.filtered.is_empty() {
            self.cursor = 0;
            self.offset = 0;
        } else if self.cursor >= self.filtered.len() {
            self.cursor = self.filtered.len() - 1;
        }
    }

    fn ensure_cursor_visible(&mut self) {
        if self.filtered.is_empty() || self.list_height == 0 {
            self.offset = 0;
            return;
        }
        let height = self.list_height;
        let max_offset = self.filtered.len().saturating_sub(height);

        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }

        if self.offset > max_offset {
            self.offset = max_offset;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use gameshelf_core::GameDraft;
    use tempfile::tempdir;

    use super::*;

    fn options() -> Vec<String> {
        vec!["Action".to_string(), "Puzzle".to_string()]
    }

    #[test]
    fn cycling_walks_options_then_resets() {
        let first = cycle_option(&None, &options());
        assert_eq!(first.as_deref(), Some("Action"));
        let second = cycle_option(&first, &options());
        assert_eq!(second.as_deref(), Some("Puzzle"));
        assert_eq!(cycle_option(&second, &options()), None);
        assert_eq!(cycle_option(&None, &[]), None);
    }

    #[test]
    fn stale_option_is_detected() {
        assert!(is_current_option(&None, &options()));
        assert!(is_current_option(&Some("Puzzle".into()), &options()));
        assert!(!is_current_option(&Some("Racing".into()), &options()));
    }

    fn games(count: usize) -> Vec<Game> {
        (0..count)
            .map(|index| {
                Game::from_draft(
                    format!("g{index}"),
                    GameDraft {
                        name: format!("Game {index}"),
                        category: if index % 2 == 0 { "Action" } else { "Puzzle" }.into(),
                        year: "1990".into(),
                        producer: "Studio".into(),
                        image: "cover.png".into(),
                    },
                )
            })
            .collect()
    }

    fn state_with_height(list_height: usize) -> UiState {
        UiState {
            list_height,
            ..UiState::default()
        }
    }

    fn current_id(state: &UiState) -> Option<&str> {
        state.current_game().map(|game| game.id.as_str())
    }

    fn test_app(dir: &Path) -> Result<GameShelfApp> {
        let slots = FileSlots::new(dir.join("data"));
        let store = GameStore::load(slots.clone())?;
        let preferences = Preferences::load(slots)?;
        let config = AppConfig {
            data_dir: dir.join("data"),
            export_dir: dir.join("exports"),
        };
        Ok(GameShelfApp::new(store, preferences, config))
    }

    fn image_value(app: &GameShelfApp) -> Option<String> {
        app.form
            .as_ref()
            .map(|form| form.input(Field::Image).value().to_string())
    }

    #[test]
    fn narrowing_filter_keeps_selected_game() {
        let games = games(10);
        let mut state = state_with_height(3);
        state.apply_filter(&games);
        state.move_to(7);
        assert_eq!((state.cursor, state.offset), (7, 5));

        state.filter.category = Some("Puzzle".into());
        state.apply_filter(&games);
        assert_eq!(current_id(&state), Some("g7"));
        assert_eq!((state.cursor, state.offset), (3, 2));
        let visible: Vec<&str> = state
            .visible_games(3)
            .iter()
            .map(|game| game.id.as_str())
            .collect();
        assert_eq!(visible, vec!["g5", "g7", "g9"]);
    }

    #[test]
    fn filtered_out_selection_clamps_cursor() {
        let games = games(10);
        let mut state = state_with_height(3);
        state.filter.category = Some("Puzzle".into());
        state.apply_filter(&games);
        state.move_to_end();
        assert_eq!(current_id(&state), Some("g9"));

        state.filter.category = Some("Action".into());
        state.search.set("Game 8");
        state.apply_filter(&games);
        assert_eq!(current_id(&state), Some("g8"));
        assert_eq!((state.cursor, state.offset), (0, 0));

        state.search.set("Nothing");
        state.apply_filter(&games);
        assert_eq!(current_id(&state), None);
        assert!(state.visible_games(3).is_empty());
        assert_eq!((state.cursor, state.offset), (0, 0));
    }

    #[test]
    fn paging_keeps_cursor_in_view() {
        let games = games(10);
        let mut state = state_with_height(4);
        state.select_id = Some("g4".into());
        state.apply_filter(&games);
        assert_eq!((state.cursor, state.offset), (4, 1));

        state.page_down();
        assert_eq!((state.cursor, state.offset), (8, 5));
        state.page_down();
        assert_eq!((state.cursor, state.offset), (9, 6));
        assert_eq!(state.visible_games(4).len(), 4);

        state.page_up();
        assert_eq!((state.cursor, state.offset), (5, 5));
        state.move_to(0);
        assert_eq!((state.cursor, state.offset), (0, 0));
        state.move_cursor(-1);
        assert_eq!(state.cursor, 0);
    }

    #[test]
    fn image_read_for_closed_form_is_dropped() -> Result<()> {
        let dir = tempdir()?;
        let mut app = test_app(dir.path())?;

        app.open_form(GameForm::new_game());
        let stale = app
            .form
            .as_ref()
            .map(GameForm::ticket)
            .context("form should be open")?;
        app.form = None;
        app.open_form(GameForm::new_game());

        app.finish_image(
            PathBuf::from("old.png"),
            stale,
            Ok("data:image/png;base64,AAAA".into()),
        );
        assert_eq!(image_value(&app).as_deref(), Some(""));

        let current = app
            .form
            .as_ref()
            .map(GameForm::ticket)
            .context("form should be open")?;
        app.finish_image(
            PathBuf::from("new.png"),
            current,
            Ok("data:image/png;base64,BBBB".into()),
        );
        assert_eq!(
            image_value(&app).as_deref(),
            Some("data:image/png;base64,BBBB")
        );
        Ok(())
    }
}
