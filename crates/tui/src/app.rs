use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use qvalve_core::{
    AppConfig, Click, Command, RefreshEvent, RefreshOutcome, RequestRunner, RowController,
    RowId, ServerClient, ServerTable,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::{sync::mpsc, time::Instant};
use tracing::{debug, info};

use crate::table_view::{build_view, header_line, TableView, Theme};

const TICK_RATE: Duration = Duration::from_millis(250);
const REFRESH_CHANNEL_CAPACITY: usize = 64;

enum AppEvent {
    Input(Event),
    Tick,
}

/// Terminal front-end over the row controller.
pub struct QvalveApp {
    controller: RowController,
    runner: RequestRunner,
    refresh_rx: Option<mpsc::Receiver<RefreshEvent>>,
    auto_refresh: Option<Duration>,
    theme: Theme,
    state: UiState,
}

impl QvalveApp {
    pub fn new(config: &AppConfig, table: ServerTable, status: String) -> Result<Self> {
        let client = ServerClient::new(config.base_url.clone(), config.request_timeout())
            .context("failed to build HTTP client")?;
        let (refresh_tx, refresh_rx) = mpsc::channel(REFRESH_CHANNEL_CAPACITY);
        let mut state = UiState::default();
        state.set_status(status);
        Ok(Self {
            controller: RowController::new(table),
            runner: RequestRunner::new(client, refresh_tx),
            refresh_rx: Some(refresh_rx),
            auto_refresh: config.auto_refresh(),
            theme: Theme::default(),
            state,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        let mut refresh_rx = self.refresh_rx.take();
        let mut last_auto_refresh = Instant::now();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            match refresh_rx.as_mut() {
                Some(rx) => {
                    let mut refresh_closed = false;
                    tokio::select! {
                        maybe_event = event_rx.recv() => {
                            if !self.process_app_event(maybe_event, &mut last_auto_refresh) {
                                break;
                            }
                        }
                        maybe_refresh = rx.recv() => {
                            match maybe_refresh {
                                Some(event) => self.handle_refresh_event(event),
                                None => refresh_closed = true,
                            }
                        }
                    }
                    if refresh_closed {
                        refresh_rx = None;
                    }
                }
                None => {
                    let maybe_event = event_rx.recv().await;
                    if !self.process_app_event(maybe_event, &mut last_auto_refresh) {
                        break;
                    }
                }
            }
        }

        restore_terminal(&mut terminal)?;
        Ok(())
    }

    fn process_app_event(
        &mut self,
        maybe_event: Option<AppEvent>,
        last_auto_refresh: &mut Instant,
    ) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                self.handle_input(event);
                true
            }
            Some(AppEvent::Tick) => {
                self.handle_tick(last_auto_refresh);
                true
            }
            None => false,
        }
    }

    fn handle_tick(&mut self, last_auto_refresh: &mut Instant) {
        self.runner.reap();
        let Some(interval) = self.auto_refresh else {
            return;
        };
        if last_auto_refresh.elapsed() < interval {
            return;
        }
        *last_auto_refresh = Instant::now();
        let commands = self.controller.refresh_expanded();
        if !commands.is_empty() {
            debug!(count = commands.len(), "auto refresh");
            self.runner.execute_all(commands);
        }
    }

    fn handle_refresh_event(&mut self, event: RefreshEvent) {
        let server = event.ticket.pair.server;
        let outcome = self.controller.complete_refresh(event.ticket, event.result);
        if let RefreshOutcome::Applied { players_rendered } = outcome {
            debug!(%server, players_rendered, "refresh applied");
        }
    }

    fn handle_input(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let Some(action) = key_action(&key) else {
            return;
        };
        match action {
            KeyAction::Quit => self.state.should_quit = true,
            KeyAction::Move(delta) => self.state.move_cursor(delta, self.row_count()),
            KeyAction::Home => self.state.cursor = 0,
            KeyAction::End => self.state.cursor = self.row_count().saturating_sub(1),
            KeyAction::Click { control } => self.click_row(self.state.cursor, control),
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(row) = self.state.row_under(mouse.column, mouse.row) else {
                    return;
                };
                self.state.cursor = row;
                let control = mouse.modifiers.contains(KeyModifiers::CONTROL);
                self.click_row(row, control);
            }
            MouseEventKind::ScrollUp => self.state.move_cursor(-1, self.row_count()),
            MouseEventKind::ScrollDown => self.state.move_cursor(1, self.row_count()),
            _ => {}
        }
    }

    fn click_row(&mut self, index: usize, control: bool) {
        let Some(row) = self.row_id_at(index) else {
            return;
        };
        let commands = self.controller.dispatch(Click { row, control });
        self.describe(&commands);
        self.runner.execute_all(commands);
        self.state.clamp_cursor(self.row_count());
    }

    fn describe(&mut self, commands: &[Command]) {
        let now = Local::now().format("%H:%M:%S");
        for command in commands {
            let message = match command {
                Command::Connect { server, .. } => self
                    .addr_of(*server)
                    .map(|addr| format!("[{now}] Connect requested for {addr}")),
                Command::Refresh { ticket, .. } => {
                    let verb = if ticket.pair.players.is_some() {
                        "Showing players of"
                    } else {
                        "Refreshing"
                    };
                    self.addr_of(ticket.pair.server)
                        .map(|addr| format!("[{now}] {verb} {addr}"))
                }
            };
            if let Some(message) = message {
                info!("{message}");
                self.state.set_status(message);
                // The connect message wins over the refresh that follows it.
                if matches!(command, Command::Connect { .. }) {
                    break;
                }
            }
        }
    }

    fn addr_of(&self, server: RowId) -> Option<String> {
        self.controller
            .table()
            .server(server)
            .map(|row| row.addr().to_string())
    }

    fn row_id_at(&self, index: usize) -> Option<RowId> {
        self.controller.table().rows().get(index).map(|row| row.id())
    }

    fn row_count(&self) -> usize {
        self.controller.table().len()
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(4)])
            .split(area);

        self.render_table(frame, chunks[0]);
        self.render_status(frame, chunks[1]);
    }

    fn render_table(&mut self, frame: &mut Frame, area: Rect) {
        let title = format!("Servers ({})", self.controller.table().servers().count());
        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height < 2 {
            return;
        }

        let header_area = Rect { height: 1, ..inner };
        let body_area = Rect {
            y: inner.y + 1,
            height: inner.height - 1,
            ..inner
        };
        frame.render_widget(Paragraph::new(header_line(&self.theme)), header_area);

        let view = build_view(self.controller.table(), self.state.cursor, &self.theme);
        self.state.scroll_to_cursor(&view, body_area.height as usize);
        let visible: Vec<Line> = view
            .lines
            .iter()
            .skip(self.state.scroll)
            .take(body_area.height as usize)
            .cloned()
            .collect();
        frame.render_widget(Paragraph::new(visible), body_area);

        self.state.body_area = body_area;
        self.state.view = view;
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let help = "Enter/click: players  c/Ctrl+click: connect  j/k: move  q: quit";
        let in_flight = self.runner.in_flight();
        let secondary = if in_flight > 0 {
            format!("{help}  •  {in_flight} pending")
        } else {
            help.to_string()
        };
        let paragraph = Paragraph::new(vec![
            Line::from(self.state.status.clone()),
            Line::from(secondary),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Quit,
    Move(isize),
    Home,
    End,
    Click { control: bool },
}

fn key_action(key: &KeyEvent) -> Option<KeyAction> {
    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Char('c') => KeyAction::Click { control: true },
        KeyCode::Up | KeyCode::Char('k') => KeyAction::Move(-1),
        KeyCode::Down | KeyCode::Char('j') => KeyAction::Move(1),
        KeyCode::PageUp => KeyAction::Move(-10),
        KeyCode::PageDown => KeyAction::Move(10),
        KeyCode::Home => KeyAction::Home,
        KeyCode::End => KeyAction::End,
        KeyCode::Enter | KeyCode::Char(' ') => KeyAction::Click { control: false },
        _ => return None,
    };
    Some(action)
}

#[derive(Default)]
struct UiState {
    cursor: usize,
    scroll: usize,
    body_area: Rect,
    view: TableView,
    status: String,
    should_quit: bool,
}

impl UiState {
    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn move_cursor(&mut self, delta: isize, total: usize) {
        if total == 0 {
            self.cursor = 0;
            return;
        }
        let max = total as isize - 1;
        self.cursor = (self.cursor as isize + delta).clamp(0, max) as usize;
    }

    fn clamp_cursor(&mut self, total: usize) {
        self.cursor = self.cursor.min(total.saturating_sub(1));
    }

    /// Keep every line of the selected row on screen when it fits.
    fn scroll_to_cursor(&mut self, view: &TableView, height: usize) {
        let (Some(first), Some(last)) = (
            view.first_line_of(self.cursor),
            view.last_line_of(self.cursor),
        ) else {
            self.scroll = 0;
            return;
        };
        if height == 0 {
            return;
        }
        if last >= self.scroll + height {
            self.scroll = last + 1 - height;
        }
        if first < self.scroll {
            self.scroll = first;
        }
        self.scroll = self.scroll.min(view.lines.len().saturating_sub(height));
    }

    /// Table row under a screen position, from the last drawn frame.
    fn row_under(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.body_area;
        if column < area.x
            || column >= area.x + area.width
            || row < area.y
            || row >= area.y + area.height
        {
            return None;
        }
        self.view
            .row_at(self.scroll + (row - area.y) as usize)
    }
}
