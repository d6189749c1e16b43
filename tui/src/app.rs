//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, resize)
//! - [`ChatController`] for the conversation
//! - [`SignupForm`] plus a registration call in flight
//! - [`DisplayState`] for rendering
//!
//! Each frame the app polls the controller for a settled answer, drains the
//! controller's events into the display state, checks the registration call,
//! and redraws.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};
use tokio::sync::{mpsc, oneshot};

use nutri_chat_core::{
    AnswerService, ChatController, ChatEvent, ClientConfig, HttpAnswerService,
    HttpRegistrationService, Registration, RegistrationError, RegistrationOutcome,
    RegistrationService,
};

use crate::display::DisplayState;
use crate::signup::{Field, SignupAction, SignupForm};
use crate::theme::{
    ALERT_YELLOW, ASSISTANT_ORANGE, DIM_GRAY, FOCUS_GREEN, PARTICIPANT_GREEN, TITLE_GREEN,
};
use crate::widgets::{TextBlock, TextBlockState};

/// Header title
pub const TITLE: &str = "Nutritionist";

/// Header subtitle
pub const SUBTITLE: &str = "Your AI Powered nutrition planner assistant";

/// Composer hint when empty
pub const PLACEHOLDER: &str = "What is your goal?";

/// Header height (title, subtitle, rule)
const HEADER_HEIGHT: u16 = 3;

/// Input box height (separator plus text rows)
const INPUT_HEIGHT: u16 = 4;

/// Controller events buffered between frames
const EVENT_BUFFER: usize = 64;

/// Width of the signup form box
const FORM_WIDTH: u16 = 64;

/// Width of the alert box
const ALERT_WIDTH: u16 = 48;

type PendingRegistration = oneshot::Receiver<Result<RegistrationOutcome, RegistrationError>>;

/// Which screen is showing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    /// Registration form
    Signup,
    /// Conversation
    Chat,
}

/// Main application state
pub struct App<A, R>
where
    A: AnswerService + 'static,
    R: RegistrationService + 'static,
{
    // === Core State ===
    /// Is the app still running?
    running: bool,
    /// Screen currently shown
    screen: Screen,

    // === Chat ===
    /// Conversation state machine
    controller: ChatController<A>,
    /// Events from the controller
    events: mpsc::Receiver<ChatEvent>,
    /// Display state derived from controller events
    display: DisplayState,
    /// Conversation scroll position
    conversation: TextBlockState,

    // === Signup ===
    /// Registration service
    registration: Arc<R>,
    /// Form state
    signup: SignupForm,
    /// Result of the registration call in flight
    pending_registration: Option<PendingRegistration>,
}

impl App<HttpAnswerService, HttpRegistrationService> {
    /// Create an app talking to the configured HTTP services
    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        let answers = HttpAnswerService::new(config.answer.clone())
            .context("Failed to create answer service client")?;
        let registration = HttpRegistrationService::new(config.registration.clone())
            .context("Failed to create registration service client")?;
        Ok(Self::new(answers, registration, config.skip_signup))
    }
}

impl<A, R> App<A, R>
where
    A: AnswerService + 'static,
    R: RegistrationService + 'static,
{
    /// Create a new App instance
    pub fn new(answers: A, registration: R, skip_signup: bool) -> Self {
        let (tx, events) = mpsc::channel(EVENT_BUFFER);
        let screen = if skip_signup {
            Screen::Chat
        } else {
            Screen::Signup
        };

        Self {
            running: true,
            screen,
            controller: ChatController::new(answers, tx),
            events,
            display: DisplayState::new(),
            conversation: TextBlockState::default(),
            registration: Arc::new(registration),
            signup: SignupForm::new(),
            pending_registration: None,
        }
    }

    /// Screen currently shown
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Whether the event loop should keep going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The chat controller
    pub fn controller(&self) -> &ChatController<A> {
        &self.controller
    }

    /// Display state
    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// Signup form
    pub fn signup(&self) -> &SignupForm {
        &self.signup
    }

    /// Main event loop
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        // ~20 FPS is plenty for a spinner
        let frame_duration = Duration::from_millis(50);

        // Create async event stream for non-blocking terminal events
        let mut event_stream = EventStream::new();

        // Render initial frame immediately so user sees UI
        self.render(terminal)?;

        while self.running {
            let frame_start = Instant::now();

            tokio::select! {
                biased;

                // Check for terminal events - highest priority
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        // Only handle Press events (not Release or Repeat)
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            self.handle_key(key).await;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => tracing::warn!(error = %e, "Terminal event error"),
                        None => self.running = false,
                    }
                }

                // Frame tick
                () = tokio::time::sleep(Duration::from_millis(16)) => {}
            }

            self.tick().await;
            self.render(terminal)?;

            // Frame rate limiting
            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                tokio::time::sleep(frame_duration - elapsed).await;
            }
        }

        Ok(())
    }

    /// Per-frame work: settle answers, apply events, check registration
    pub async fn tick(&mut self) {
        self.controller.poll_answer().await;
        self.process_chat_events();
        self.poll_registration();
        self.display.tick();
    }

    /// Apply all pending controller events to the display state
    fn process_chat_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.display.apply_event(&event, self.controller.log());
            if matches!(event, ChatEvent::TurnAppended { .. }) {
                self.conversation.scroll_to_bottom();
            }
        }
    }

    /// Pick up the registration result if it has arrived
    fn poll_registration(&mut self) {
        let Some(rx) = self.pending_registration.as_mut() else {
            return;
        };

        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return,
            Err(oneshot::error::TryRecvError::Closed) => Err(RegistrationError::Service(
                "registration task ended without a reply".to_string(),
            )),
        };

        self.pending_registration = None;
        self.signup.finish(&result);
    }

    /// Send the form to the registration service on its own task
    fn start_registration(&mut self, registration: Registration) {
        let (done_tx, done_rx) = oneshot::channel();
        let service = Arc::clone(&self.registration);
        tracing::info!("Registration submitted");
        tokio::spawn(async move {
            let result = service.register(&registration).await;
            let _ = done_tx.send(result);
        });
        self.pending_registration = Some(done_rx);
    }

    /// Handle keyboard input
    pub async fn handle_key(&mut self, key: KeyEvent) {
        match self.screen {
            Screen::Signup => match self.signup.handle_key(key) {
                SignupAction::None => {}
                SignupAction::Submit(registration) => self.start_registration(registration),
                SignupAction::EnterChat => {
                    tracing::info!("Entering chat");
                    self.screen = Screen::Chat;
                }
                SignupAction::Quit => self.running = false,
            },
            Screen::Chat => self.handle_chat_key(key).await,
        }
    }

    async fn handle_chat_key(&mut self, key: KeyEvent) {
        let awaiting = self.controller.is_awaiting();

        match key.code {
            // Quit
            KeyCode::Esc => self.running = false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
            }

            // Submit message
            KeyCode::Enter => {
                let outcome = self.controller.submit_composer().await;
                tracing::debug!(outcome = ?outcome, "Composer submitted");
            }

            // Typing, disabled while awaiting
            KeyCode::Char(c) if !awaiting => self.controller.composer_mut().push(c),
            KeyCode::Backspace if !awaiting => {
                self.controller.composer_mut().pop();
            }

            // Conversation scrolling
            KeyCode::PageUp => {
                let page = self.conversation.page();
                self.conversation.scroll_up(page);
            }
            KeyCode::PageDown => {
                let page = self.conversation.page();
                self.conversation.scroll_down(page);
            }
            KeyCode::End if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.conversation.scroll_to_bottom();
            }

            _ => {}
        }
    }

    /// Render the UI
    fn render<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        terminal.draw(|frame| self.draw(frame))?;
        Ok(())
    }

    /// Draw the current screen into a frame
    pub fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Signup => self.draw_signup(frame),
            Screen::Chat => self.draw_chat(frame),
        }
    }

    fn draw_chat(&mut self, frame: &mut Frame) {
        let [header, body, input, status] = Layout::vertical([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        draw_header(frame, header);

        let lines = self.display.conversation_lines(body.width as usize);
        frame.render_stateful_widget(TextBlock::new(&lines), body, &mut self.conversation);

        self.draw_input(frame, input);
        self.draw_status(frame, status);
    }

    fn draw_input(&self, frame: &mut Frame, area: Rect) {
        let awaiting = self.controller.is_awaiting();
        let mut block = Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(DIM_GRAY));
        if awaiting {
            block = block.title(Span::styled(
                format!(" {} Thinking... ", self.display.spinner()),
                Style::default().fg(ASSISTANT_ORANGE),
            ));
        }

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let text = self.controller.composer().text();
        let (content, style) = if text.is_empty() && !awaiting {
            (PLACEHOLDER.to_string(), Style::default().fg(DIM_GRAY))
        } else if awaiting {
            (text.to_string(), Style::default().fg(DIM_GRAY))
        } else {
            (format!("{text}_"), Style::default().fg(PARTICIPANT_GREEN))
        };

        let width = (inner.width as usize).max(1);
        let rows: Vec<String> = textwrap::wrap(&content, width)
            .iter()
            .map(ToString::to_string)
            .collect();
        let skip = rows.len().saturating_sub(inner.height as usize);
        let lines: Vec<Line> = rows
            .into_iter()
            .skip(skip)
            .map(|row| Line::styled(row, style))
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        // Scroll position first so narrow terminals still show it
        let scroll_info = if self.conversation.scroll_offset > 0 {
            format!(" [^{} lines] |", self.conversation.scroll_offset)
        } else {
            String::new()
        };

        let status = format!(
            "{} {} | Enter to send | PgUp/PgDn scroll | Esc to quit",
            scroll_info,
            self.controller.state().description()
        );
        frame.render_widget(
            Paragraph::new(Line::styled(status, Style::default().fg(DIM_GRAY))),
            area,
        );
    }

    fn draw_signup(&self, frame: &mut Frame) {
        let [header, body] =
            Layout::vertical([Constraint::Length(HEADER_HEIGHT), Constraint::Min(1)])
                .areas(frame.area());
        draw_header(frame, header);

        let label_width = Field::ALL
            .iter()
            .map(|f| f.label().len())
            .max()
            .unwrap_or_default()
            + 2;

        let mut lines: Vec<Line> = Vec::with_capacity(Field::ALL.len() + 2);
        for field in Field::ALL {
            let focused = field == self.signup.focus();
            let label_style = if focused {
                Style::default().fg(FOCUS_GREEN).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DIM_GRAY)
            };
            let mut value = self.signup.display_value(field);
            if focused && !self.signup.is_busy() {
                value.push('_');
            }
            lines.push(Line::from(vec![
                Span::styled(format!("{:<label_width$}", field.label()), label_style),
                Span::raw(value),
            ]));
        }
        lines.push(Line::default());
        let hint = if self.signup.is_busy() {
            "Registering...".to_string()
        } else {
            "Tab/Shift-Tab move | Enter register | Esc quit".to_string()
        };
        lines.push(Line::styled(hint, Style::default().fg(DIM_GRAY)));

        let height = u16::try_from(lines.len()).unwrap_or(u16::MAX).saturating_add(2);
        let area = centered(body, FORM_WIDTH, height);
        let form = Paragraph::new(lines).block(
            Block::bordered()
                .title(" Create your account ")
                .border_style(Style::default().fg(TITLE_GREEN)),
        );
        frame.render_widget(form, area);

        if let Some(alert) = self.signup.alert() {
            draw_alert(frame, body, &alert.text);
        }
    }
}

fn draw_header(frame: &mut Frame, area: Rect) {
    let header = Paragraph::new(vec![
        Line::styled(
            TITLE,
            Style::default().fg(TITLE_GREEN).add_modifier(Modifier::BOLD),
        ),
        Line::styled(SUBTITLE, Style::default().fg(DIM_GRAY)),
    ])
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(DIM_GRAY)),
    );
    frame.render_widget(header, area);
}

fn draw_alert(frame: &mut Frame, within: Rect, text: &str) {
    let width = ALERT_WIDTH.min(within.width);
    let text_width = (width.saturating_sub(2) as usize).max(1);

    let mut lines: Vec<Line> = textwrap::wrap(text, text_width)
        .into_iter()
        .map(|row| Line::raw(row.into_owned()))
        .collect();
    lines.push(Line::default());
    lines.push(Line::styled("Press Enter", Style::default().fg(DIM_GRAY)));

    let height = u16::try_from(lines.len()).unwrap_or(u16::MAX).saturating_add(2);
    let area = centered(within, width, height);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::bordered()
                .title(" Notice ")
                .border_style(Style::default().fg(ALERT_YELLOW)),
        ),
        area,
    );
}

/// Rect of the given size centered in `area`, clipped to it
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
