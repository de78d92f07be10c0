//! Full-screen terminal front-end.
//!
//! The [`App`] owns a [`ChatController`] and drives it from a single event
//! loop: terminal input, settled background work and a spinner tick are
//! multiplexed with `tokio::select!`.  Session creation and each exchange run
//! on spawned tasks and report back over a channel, so the view keeps
//! redrawing while a reply is pending.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use futures::StreamExt;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::{DefaultTerminal, Frame};
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use unicode_width::UnicodeWidthStr;

use crate::chat::commands::{ChatCommand, LineInput, classify_line};
use crate::chat::config::ChatConfig;
use crate::chat::controller::{ChatController, SessionStatus, Submission};
use crate::chat::exchange::{Exchange, ExchangeOutcome, start_session};
use crate::chat::render::{Alignment, Row, RowKind, TranscriptRenderer};
use crate::chat::theme::{Palette, Theme};
use crate::chat::transcript::Role;
use crate::error::Result;
use crate::provider::{ChatHandle, ChatProvider};
use crate::session::StartChatParams;

/// Spinner frames for the loading row.
const SPINNER: [&str; 3] = [".  ", ".. ", "..."];

/// Lines scrolled per mouse wheel notch.
const WHEEL_STEP: usize = 3;

/// Most input lines shown before the input box scrolls.
const MAX_INPUT_LINES: usize = 5;

/// One-line summary of the commands for the status line.
const HELP_HINT: &str =
    "/theme [light|dark]  /stats  /quit   Alt+Enter newline, Ctrl+T theme, Esc quit";

/// Background work reporting back to the event loop.
pub enum AppEvent {
    SessionStarted(Result<Box<dyn ChatHandle>>),
    ExchangeSettled(ExchangeOutcome),
}

/// The full-screen chat view.
pub struct App {
    controller: ChatController,
    renderer: TranscriptRenderer,
    provider: Arc<dyn ChatProvider>,
    params: Option<StartChatParams>,
    timeout: Option<Duration>,
    theme: Theme,
    /// Cancels whatever is in flight when the app quits.
    shutdown: CancellationToken,
    /// Cancels the current exchange only.
    exchange_cancel: CancellationToken,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
    /// Lines scrolled up from the bottom of the conversation.
    scroll_offset: usize,
    /// Rendered conversation lines as of the last draw.
    total_lines: usize,
    /// Height of the conversation area as of the last draw.
    page_size: usize,
    notice: Option<String>,
    spinner: usize,
    running: bool,
}

impl App {
    pub fn new(
        controller: ChatController,
        provider: Arc<dyn ChatProvider>,
        config: &ChatConfig,
        renderer: TranscriptRenderer,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        Self {
            controller,
            renderer,
            provider,
            params: Some(config.start_params()),
            timeout: config.request_timeout,
            theme: config.theme,
            exchange_cancel: shutdown.child_token(),
            shutdown,
            events_tx,
            events_rx,
            scroll_offset: 0,
            total_lines: 0,
            page_size: 10,
            notice: None,
            spinner: 0,
            running: true,
        }
    }

    pub fn controller(&self) -> &ChatController {
        &self.controller
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Main event loop.  Returns the controller once the user quits.
    pub async fn run(mut self, terminal: &mut DefaultTerminal) -> io::Result<ChatController> {
        let mut event_stream = EventStream::new();
        let mut tick = tokio::time::interval(Duration::from_millis(150));

        self.start_session();
        terminal.draw(|frame| self.draw(frame))?;

        while self.running {
            let animating = self.controller.is_loading()
                || self.controller.session_status() == SessionStatus::Starting;
            tokio::select! {
                biased;

                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            self.handle_key(key);
                        }
                        Some(Ok(Event::Mouse(mouse))) => self.handle_mouse(mouse),
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            tracing::error!(error = %err, "terminal event stream failed");
                            self.running = false;
                        }
                        None => self.running = false,
                    }
                }

                Some(event) = self.events_rx.recv() => self.handle_app_event(event),

                _ = tick.tick(), if animating => {
                    self.spinner = self.spinner.wrapping_add(1);
                }
            }

            terminal.draw(|frame| self.draw(frame))?;
        }

        self.shutdown.cancel();
        Ok(self.controller)
    }

    /// Spawns session creation.  Only the first call does anything.
    pub fn start_session(&mut self) {
        let Some(params) = self.params.take() else {
            return;
        };
        let provider = Arc::clone(&self.provider);
        let timeout = self.timeout;
        let cancel = self.shutdown.child_token();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = start_session(provider.as_ref(), params, timeout, cancel).await;
            let _ = tx.send(AppEvent::SessionStarted(result));
        });
    }

    pub fn handle_app_event(&mut self, event: AppEvent) {
        let now = OffsetDateTime::now_utc();
        match event {
            AppEvent::SessionStarted(result) => self.controller.on_session_started(result, now),
            AppEvent::ExchangeSettled(outcome) => {
                self.controller.on_exchange_settled(outcome, now);
                self.scroll_offset = 0;
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.running = false,
            KeyCode::Char('c') if ctrl => {
                if self.controller.is_loading() {
                    tracing::info!("cancelling exchange");
                    self.exchange_cancel.cancel();
                } else {
                    self.running = false;
                }
            }
            KeyCode::Char('t') if ctrl => self.set_theme(self.theme.toggled()),
            KeyCode::Enter
                if key
                    .modifiers
                    .intersects(KeyModifiers::ALT | KeyModifiers::SHIFT) =>
            {
                self.controller.push_input('\n');
            }
            KeyCode::Enter if key.modifiers.is_empty() => self.submit(),
            KeyCode::Char(c) if !ctrl => self.controller.push_input(c),
            KeyCode::Backspace => self.controller.pop_input(),
            KeyCode::PageUp => self.scroll_up(self.page_size),
            KeyCode::PageDown => self.scroll_down(self.page_size),
            KeyCode::Home if ctrl => self.scroll_offset = self.total_lines,
            KeyCode::End if ctrl => self.scroll_offset = 0,
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.scroll_up(WHEEL_STEP),
            MouseEventKind::ScrollDown => self.scroll_down(WHEEL_STEP),
            _ => {}
        }
    }

    fn scroll_up(&mut self, lines: usize) {
        let max_scroll = self.total_lines.saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + lines).min(max_scroll);
    }

    fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    fn set_theme(&mut self, theme: Theme) {
        tracing::debug!(%theme, "theme changed");
        self.theme = theme;
    }

    fn submit(&mut self) {
        let command = match classify_line(self.controller.input()) {
            LineInput::Blank => return,
            LineInput::Command(command) => Some(command),
            LineInput::Message(_) => None,
        };
        if let Some(command) = command {
            self.controller.set_input("");
            self.run_command(command);
            return;
        }

        self.notice = None;
        match self.controller.submit(OffsetDateTime::now_utc()) {
            Submission::Dispatched(exchange) => {
                self.scroll_offset = 0;
                self.spawn_exchange(exchange);
            }
            Submission::NoSession => self.scroll_offset = 0,
            Submission::Busy => {
                self.notice = Some("Still waiting for the previous reply.".to_string());
            }
        }
    }

    fn spawn_exchange(&mut self, exchange: Exchange) {
        self.exchange_cancel = self.shutdown.child_token();
        let cancel = self.exchange_cancel.clone();
        let timeout = self.timeout;
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = exchange.run(timeout, cancel).await;
            let _ = tx.send(AppEvent::ExchangeSettled(outcome));
        });
    }

    fn run_command(&mut self, command: ChatCommand) {
        match command {
            ChatCommand::Quit => self.running = false,
            ChatCommand::Help => self.notice = Some(HELP_HINT.to_string()),
            ChatCommand::Theme(theme) => {
                let theme = theme.unwrap_or_else(|| self.theme.toggled());
                self.set_theme(theme);
                self.notice = Some(format!("Theme: {theme}"));
            }
            ChatCommand::Stats => {
                let stats = self.controller.stats();
                self.notice = Some(format!(
                    "{} messages, {} sent, {} answered, {} failed, {} rejected",
                    self.controller.transcript().len(),
                    stats.dispatched,
                    stats.answered,
                    stats.failed,
                    stats.rejected,
                ));
            }
            ChatCommand::Invalid(message) => self.notice = Some(message),
        }
    }

    /// Draws one frame.
    pub fn draw(&mut self, frame: &mut Frame) {
        let palette = self.theme.palette();
        let area = frame.area();
        frame.render_widget(
            Block::default().style(Style::default().bg(palette.primary).fg(palette.text)),
            area,
        );

        let input_lines = self.controller.input().split('\n').count().clamp(1, MAX_INPUT_LINES);
        let [header, body, status, input] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(input_lines as u16 + 2),
        ])
        .areas(area);

        self.draw_header(frame, header, &palette);
        self.draw_conversation(frame, body, &palette);
        self.draw_status(frame, status, &palette);
        self.draw_input(frame, input, input_lines, &palette);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let status = match self.controller.session_status() {
            SessionStatus::Starting => "connecting",
            SessionStatus::Ready => "online",
            SessionStatus::Busy => "typing",
            SessionStatus::Failed => "offline",
        };
        let line = Line::from(vec![
            Span::styled(
                " Headstarter Support ",
                Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("[{status}]"), Style::default().fg(palette.muted)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_conversation(&mut self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let block = Block::default().style(Style::default().bg(palette.secondary));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        // Bubbles are padded by one column on each side.
        let width = (inner.width as usize).saturating_sub(2).max(1);
        let rows = self
            .renderer
            .render(self.controller.transcript(), self.controller.is_loading(), width);

        let height = inner.height as usize;
        self.total_lines = rows.len();
        self.page_size = height.max(1);
        let max_scroll = self.total_lines.saturating_sub(height);
        if self.scroll_offset > max_scroll {
            self.scroll_offset = max_scroll;
        }
        let visible_end = self.total_lines.saturating_sub(self.scroll_offset);
        let visible_start = visible_end.saturating_sub(height);

        let lines: Vec<Line> = rows[visible_start..visible_end]
            .iter()
            .map(|row| self.row_line(row, palette))
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn row_line(&self, row: &Row, palette: &Palette) -> Line<'static> {
        let (text, style) = match (row.kind, row.role) {
            (RowKind::Body, Some(Role::User)) => (
                format!(" {} ", row.text),
                Style::default().fg(palette.primary).bg(palette.accent),
            ),
            (RowKind::Body, _) => (
                format!(" {} ", row.text),
                Style::default().fg(palette.text).bg(palette.primary),
            ),
            (RowKind::Time, _) => (format!(" {} ", row.text), Style::default().fg(palette.muted)),
            (RowKind::Loading, _) => (
                format!(" {} ", SPINNER[self.spinner % SPINNER.len()]),
                Style::default().fg(palette.accent).bg(palette.primary),
            ),
            (RowKind::Spacer, _) => (String::new(), Style::default()),
        };
        let line = Line::from(Span::styled(text, style));
        match row.alignment {
            Alignment::Left => line.left_aligned(),
            Alignment::Right => line.right_aligned(),
        }
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let error = self
            .controller
            .last_error()
            .map(|err| Span::styled(format!(" {err}"), Style::default().fg(palette.error)));
        let notice = self
            .notice
            .as_ref()
            .map(|notice| Span::styled(format!(" {notice}"), Style::default().fg(palette.muted)));
        // A command's notice is shown next to a standing error, not hidden by it.
        let line = if error.is_some() || notice.is_some() {
            Line::from(error.into_iter().chain(notice).collect::<Vec<_>>())
        } else {
            let mut hint = " Enter to send, /help for commands, Esc to quit".to_string();
            if self.scroll_offset > 0 {
                hint.push_str(&format!(" [^{} lines]", self.scroll_offset));
            }
            Line::styled(hint, Style::default().fg(palette.muted))
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_input(&self, frame: &mut Frame, area: Rect, visible: usize, palette: &Palette) {
        let block = Block::bordered()
            .title(" Message ")
            .border_style(Style::default().fg(palette.accent));
        let inner = block.inner(area);

        let input = self.controller.input();
        let lines: Vec<&str> = input.split('\n').collect();
        let skip = lines.len().saturating_sub(visible);
        let paragraph = Paragraph::new(input.to_string())
            .block(block)
            .style(Style::default().fg(palette.text))
            .scroll((skip as u16, 0));
        frame.render_widget(paragraph, area);

        let last = lines.last().copied().unwrap_or_default();
        let x = inner.x + (last.width() as u16).min(inner.width.saturating_sub(1));
        let y = inner.y + (lines.len() - skip).saturating_sub(1) as u16;
        frame.set_cursor_position((x, y));
    }
}

/// Runs the full-screen view until the user quits.
///
/// The terminal is restored on every exit path, including panics.
pub async fn run_tui(
    controller: ChatController,
    provider: Arc<dyn ChatProvider>,
    config: &ChatConfig,
    renderer: TranscriptRenderer,
) -> io::Result<ChatController> {
    let mut terminal = ratatui::init();
    if let Err(err) = execute!(io::stdout(), EnableMouseCapture) {
        tracing::warn!(error = %err, "mouse capture unavailable");
    }
    let app = App::new(controller, provider, config, renderer);
    let result = app.run(&mut terminal).await;
    let _ = execute!(io::stdout(), DisableMouseCapture);
    ratatui::restore();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::controller::{ErrorKind, GREETING, INIT_FAILED};
    use crate::types::Content;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;

    struct Echo(Vec<Content>);

    #[async_trait::async_trait]
    impl ChatHandle for Echo {
        async fn send_message(&mut self, text: &str) -> Result<String> {
            self.0.push(Content::user(text));
            self.0.push(Content::model(text));
            Ok(format!("echo: {text}"))
        }

        fn history(&self) -> &[Content] {
            &self.0
        }
    }

    struct Silent;

    #[async_trait::async_trait]
    impl ChatHandle for Silent {
        async fn send_message(&mut self, _: &str) -> Result<String> {
            std::future::pending().await
        }

        fn history(&self) -> &[Content] {
            &[]
        }
    }

    struct EchoProvider;

    #[async_trait::async_trait]
    impl ChatProvider for EchoProvider {
        async fn start_chat(&self, _: StartChatParams) -> Result<Box<dyn ChatHandle>> {
            Ok(Box::new(Echo(Vec::new())))
        }
    }

    fn app() -> App {
        App::new(
            ChatController::new(),
            Arc::new(EchoProvider),
            &ChatConfig::new(),
            TranscriptRenderer::utc(),
        )
    }

    fn ready_app(handle: Box<dyn ChatHandle>) -> App {
        let mut app = app();
        app.params = None;
        app.handle_app_event(AppEvent::SessionStarted(Ok(handle)));
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn buffer_text(buffer: &Buffer) -> String {
        let area = buffer.area;
        let mut text = String::new();
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn draw(app: &mut App) -> String {
        draw_sized(app, 100, 24)
    }

    fn draw_sized(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[tokio::test]
    async fn session_start_shows_greeting() {
        let mut app = app();
        assert!(draw(&mut app).contains("[connecting]"));

        app.start_session();
        let event = app.events_rx.recv().await.unwrap();
        app.handle_app_event(event);

        assert_eq!(app.controller().transcript().len(), 1);
        assert_eq!(app.controller().transcript().messages()[0].text(), GREETING);
        let screen = draw(&mut app);
        assert!(screen.contains("Headstarter Support Agent"));
        assert!(screen.contains("[online]"));
    }

    #[tokio::test]
    async fn enter_sends_and_reply_arrives() {
        let mut app = ready_app(Box::new(Echo(Vec::new())));
        type_text(&mut app, "Hello");
        app.handle_key(key(KeyCode::Enter));

        assert!(app.controller().is_loading());
        assert_eq!(app.controller().input(), "");
        assert_eq!(app.controller().transcript().len(), 2);

        let event = app.events_rx.recv().await.unwrap();
        app.handle_app_event(event);
        assert!(!app.controller().is_loading());
        let messages = app.controller().transcript().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].text(), "echo: Hello");
        assert!(draw(&mut app).contains("echo: Hello"));
    }

    #[tokio::test]
    async fn blank_input_is_not_sent() {
        let mut app = ready_app(Box::new(Echo(Vec::new())));
        type_text(&mut app, "   ");
        app.handle_key(key(KeyCode::Enter));
        assert!(!app.controller().is_loading());
        assert_eq!(app.controller().transcript().len(), 1);
    }

    #[tokio::test]
    async fn busy_submission_keeps_input() {
        let mut app = ready_app(Box::new(Silent));
        type_text(&mut app, "first");
        app.handle_key(key(KeyCode::Enter));
        type_text(&mut app, "second");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.controller().input(), "second");
        assert_eq!(app.controller().transcript().len(), 2);
        assert_eq!(app.controller().stats().rejected, 1);
        assert!(draw(&mut app).contains("Still waiting"));
    }

    #[tokio::test]
    async fn ctrl_c_cancels_then_quits() {
        let mut app = ready_app(Box::new(Silent));
        type_text(&mut app, "hello?");
        app.handle_key(key(KeyCode::Enter));

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        app.handle_key(ctrl_c);
        assert!(app.is_running());

        let event = app.events_rx.recv().await.unwrap();
        app.handle_app_event(event);
        let err = app.controller().last_error().unwrap();
        assert_eq!(err.kind(), ErrorKind::Send);
        assert!(err.cause().is_abort());
        assert_eq!(app.controller().transcript().len(), 2);
        assert!(draw(&mut app).contains("Failed to send message. Please try again."));

        app.handle_key(ctrl_c);
        assert!(!app.is_running());
    }

    #[tokio::test]
    async fn alt_enter_inserts_newline() {
        let mut app = ready_app(Box::new(Echo(Vec::new())));
        type_text(&mut app, "line one");
        app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT));
        type_text(&mut app, "line two");
        assert_eq!(app.controller().input(), "line one\nline two");
        assert!(!app.controller().is_loading());
        draw(&mut app);
    }

    #[tokio::test]
    async fn only_bare_enter_submits() {
        let mut app = ready_app(Box::new(Echo(Vec::new())));
        type_text(&mut app, "Hello");
        app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::CONTROL));
        assert_eq!(app.controller().input(), "Hello");
        assert!(!app.controller().is_loading());
        assert_eq!(app.controller().transcript().len(), 1);

        app.handle_key(key(KeyCode::Enter));
        assert!(app.controller().is_loading());
        assert_eq!(app.controller().transcript().len(), 2);
    }

    #[tokio::test]
    async fn commands_stay_visible_after_init_failure() {
        let mut app = app();
        app.params = None;
        app.handle_app_event(AppEvent::SessionStarted(Err(
            crate::error::Error::authentication("API key is empty"),
        )));
        assert!(draw_sized(&mut app, 160, 24).contains(INIT_FAILED));

        type_text(&mut app, "/stats");
        app.handle_key(key(KeyCode::Enter));
        let screen = draw_sized(&mut app, 160, 24);
        assert!(screen.contains(INIT_FAILED));
        assert!(screen.contains("0 answered"));
    }

    #[tokio::test]
    async fn theme_command_and_shortcut() {
        let mut app = ready_app(Box::new(Echo(Vec::new())));
        type_text(&mut app, "/theme dark");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.theme(), Theme::Dark);
        assert_eq!(app.controller().transcript().len(), 1);

        app.handle_key(KeyEvent::new(KeyCode::Char('t'), KeyModifiers::CONTROL));
        assert_eq!(app.theme(), Theme::Light);
    }

    #[tokio::test]
    async fn quit_command_stops_the_loop() {
        let mut app = ready_app(Box::new(Echo(Vec::new())));
        type_text(&mut app, "/quit");
        app.handle_key(key(KeyCode::Enter));
        assert!(!app.is_running());
    }

    #[tokio::test]
    async fn scrolling_is_clamped() {
        let mut app = ready_app(Box::new(Echo(Vec::new())));
        draw(&mut app);
        app.handle_key(key(KeyCode::PageUp));
        draw(&mut app);
        assert_eq!(app.scroll_offset, 0);
        app.handle_key(key(KeyCode::PageDown));
        assert_eq!(app.scroll_offset, 0);
    }
}
