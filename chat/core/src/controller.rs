//! Chat Session Controller
//!
//! Mediates between text entry and the answer service. The controller owns
//! three pieces of state:
//! - the conversation log (append-only)
//! - the composer (text being authored)
//! - the request lifecycle flag ([`ControllerState`])
//!
//! # State machine
//!
//! ```text
//!            submit (accepted)
//!   Idle ───────────────────────▶ Awaiting
//!    ▲                               │
//!    └───────────────────────────────┘
//!      answer settled (answered, empty, or failed)
//! ```
//!
//! A submission made while `Awaiting` is rejected with
//! [`SubmitOutcome::Busy`], so at most one request is in flight per
//! controller. The request runs on its own task; the owner picks up the
//! result with [`ChatController::poll_answer`] (once per frame) or
//! [`ChatController::wait_for_answer`].

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::backend::{AnswerError, AnswerReply, AnswerRequest, AnswerService};
use crate::messages::{AnswerKind, ChatEvent, ControllerState, Origin};
use crate::render::{render_log, RenderedTurn};
use crate::session::{Composer, ConversationLog, Turn};

/// Assistant turn used when the service replied without an answer
pub const NO_RESPONSE_TEXT: &str = "No response generated.";

/// Assistant turn used when the request failed or the reply was unreadable
pub const FETCH_ERROR_TEXT: &str = "Error: Unable to fetch response.";

/// Result of a submission attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The participant turn was appended and a request is in flight
    Accepted,
    /// The text was empty after trimming; nothing changed
    Ignored,
    /// A request is already in flight; nothing changed
    Busy,
}

type PendingAnswer = oneshot::Receiver<Result<AnswerReply, AnswerError>>;

/// The chat session controller
pub struct ChatController<S: AnswerService> {
    /// Answer service
    service: Arc<S>,
    /// Conversation history
    log: ConversationLog,
    /// Text being authored
    composer: Composer,
    /// Request lifecycle flag
    state: ControllerState,
    /// Result of the in-flight request
    pending: Option<PendingAnswer>,
    /// Channel to the UI surface, if any
    tx: Option<mpsc::Sender<ChatEvent>>,
}

impl<S: AnswerService + 'static> ChatController<S> {
    /// Create a controller that reports changes to a surface
    pub fn new(service: S, tx: mpsc::Sender<ChatEvent>) -> Self {
        Self::with_sink(Arc::new(service), Some(tx))
    }

    /// Create a controller without a surface
    ///
    /// Callers read state through the accessors instead of events.
    pub fn detached(service: S) -> Self {
        Self::with_sink(Arc::new(service), None)
    }

    fn with_sink(service: Arc<S>, tx: Option<mpsc::Sender<ChatEvent>>) -> Self {
        Self {
            service,
            log: ConversationLog::new(),
            composer: Composer::default(),
            state: ControllerState::Idle,
            pending: None,
            tx,
        }
    }

    /// Conversation log
    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// Composer
    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// Composer, for editing
    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }

    /// Current state
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Whether a request is in flight
    pub fn is_awaiting(&self) -> bool {
        self.state.is_awaiting()
    }

    /// Render every turn for display
    pub fn render(&self) -> Vec<RenderedTurn> {
        render_log(&self.log)
    }

    /// Submit text to the answer service
    ///
    /// Appends the participant turn and flips to `Awaiting` before the
    /// request is issued. Blank text and submissions while `Awaiting` leave
    /// everything untouched.
    pub async fn submit(&mut self, raw: &str) -> SubmitOutcome {
        if raw.trim().is_empty() {
            tracing::debug!("Ignoring blank submission");
            return SubmitOutcome::Ignored;
        }

        if self.state.is_awaiting() {
            tracing::debug!("Rejecting submission while a request is in flight");
            return SubmitOutcome::Busy;
        }

        let index = self.log.append(Turn::participant(raw));
        self.send(ChatEvent::TurnAppended {
            index,
            origin: Origin::Participant,
            answer: None,
        })
        .await;

        self.set_state(ControllerState::Awaiting).await;

        let (done_tx, done_rx) = oneshot::channel();
        let service = Arc::clone(&self.service);
        let request = AnswerRequest::new(raw);
        tracing::info!(
            service = service.name(),
            turn = index,
            "Submission accepted"
        );
        tokio::spawn(async move {
            let result = service.answer(&request).await;
            // Receiver is gone only if the controller was dropped
            let _ = done_tx.send(result);
        });
        self.pending = Some(done_rx);

        SubmitOutcome::Accepted
    }

    /// Submit whatever is in the composer
    pub async fn submit_composer(&mut self) -> SubmitOutcome {
        let text = self.composer.text().to_string();
        self.submit(&text).await
    }

    /// Submit and wait for the answer to settle
    pub async fn submit_and_wait(&mut self, raw: &str) -> SubmitOutcome {
        let outcome = self.submit(raw).await;
        if outcome == SubmitOutcome::Accepted {
            self.wait_for_answer().await;
        }
        outcome
    }

    /// Settle the in-flight request if it has finished
    ///
    /// Call this regularly. Returns true if an answer was applied.
    pub async fn poll_answer(&mut self) -> bool {
        let Some(rx) = self.pending.as_mut() else {
            return false;
        };

        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return false,
            Err(oneshot::error::TryRecvError::Closed) => Err(abandoned()),
        };

        self.pending = None;
        self.settle(result).await;
        true
    }

    /// Wait for the in-flight request and settle it
    ///
    /// Returns false if nothing was in flight.
    pub async fn wait_for_answer(&mut self) -> bool {
        let Some(rx) = self.pending.take() else {
            return false;
        };

        let result = rx.await.unwrap_or_else(|_| Err(abandoned()));
        self.settle(result).await;
        true
    }

    /// Apply a finished request: assistant turn, clear composer, back to idle
    async fn settle(&mut self, result: Result<AnswerReply, AnswerError>) {
        let (content, kind) = match result {
            Ok(reply) => match reply.answer() {
                Some(answer) => (answer.to_string(), AnswerKind::Answered),
                None => (NO_RESPONSE_TEXT.to_string(), AnswerKind::Empty),
            },
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    service = self.service.name(),
                    "Answer request failed"
                );
                (FETCH_ERROR_TEXT.to_string(), AnswerKind::Failed)
            }
        };

        let index = self.log.append(Turn::assistant(content));
        tracing::info!(turn = index, outcome = ?kind, "Answer settled");
        self.send(ChatEvent::TurnAppended {
            index,
            origin: Origin::Assistant,
            answer: Some(kind),
        })
        .await;

        self.composer.clear();
        self.set_state(ControllerState::Idle).await;
    }

    /// Set state and notify the surface
    async fn set_state(&mut self, state: ControllerState) {
        self.state = state;
        self.send(ChatEvent::State { state }).await;
    }

    /// Send an event to the surface
    async fn send(&self, event: ChatEvent) {
        if let Some(tx) = &self.tx {
            if let Err(e) = tx.send(event).await {
                tracing::warn!("Failed to send event to surface: {}", e);
            }
        }
    }
}

fn abandoned() -> AnswerError {
    AnswerError::Service("answer task ended without a reply".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::sync::Mutex;

    /// Replies with a canned result
    struct MockService {
        reply: Option<&'static str>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl AnswerService for MockService {
        fn name(&self) -> &str {
            "Mock"
        }

        async fn answer(&self, _request: &AnswerRequest) -> Result<AnswerReply, AnswerError> {
            if self.fail {
                return Err(AnswerError::Service("boom".to_string()));
            }
            Ok(AnswerReply {
                response: self.reply.map(String::from),
            })
        }

        async fn system_status(&self) -> Result<String, AnswerError> {
            Ok("System is online".to_string())
        }
    }

    /// Holds every reply until the test releases it
    struct GatedService {
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait::async_trait]
    impl AnswerService for GatedService {
        fn name(&self) -> &str {
            "Gated"
        }

        async fn answer(&self, request: &AnswerRequest) -> Result<AnswerReply, AnswerError> {
            let gate = self.gate.lock().await.take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Ok(AnswerReply::with_answer(format!("re: {}", request.input_text)))
        }

        async fn system_status(&self) -> Result<String, AnswerError> {
            Ok("ok".to_string())
        }
    }

    fn answering(reply: &'static str) -> MockService {
        MockService {
            reply: Some(reply),
            fail: false,
        }
    }

    fn drain(rx: &mut mpsc::Receiver<ChatEvent>) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_blank_submission_is_ignored() {
        let (tx, mut rx) = mpsc::channel(100);
        let mut controller = ChatController::new(answering("x"), tx);
        controller.composer_mut().set("   \t\n");

        assert_eq!(controller.submit_composer().await, SubmitOutcome::Ignored);
        assert_eq!(controller.submit("").await, SubmitOutcome::Ignored);

        assert!(controller.log().is_empty());
        assert_eq!(controller.composer().text(), "   \t\n");
        assert_eq!(controller.state(), ControllerState::Idle);
        assert!(!controller.wait_for_answer().await);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_participant_turn_precedes_awaiting() {
        let (tx, mut rx) = mpsc::channel(100);
        let mut controller = ChatController::new(answering("Eat more protein."), tx);

        assert_eq!(controller.submit("protein?").await, SubmitOutcome::Accepted);
        assert!(controller.is_awaiting());
        assert_eq!(controller.log().len(), 1);

        controller.wait_for_answer().await;

        assert_eq!(
            drain(&mut rx),
            vec![
                ChatEvent::TurnAppended {
                    index: 0,
                    origin: Origin::Participant,
                    answer: None,
                },
                ChatEvent::State {
                    state: ControllerState::Awaiting,
                },
                ChatEvent::TurnAppended {
                    index: 1,
                    origin: Origin::Assistant,
                    answer: Some(AnswerKind::Answered),
                },
                ChatEvent::State {
                    state: ControllerState::Idle,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_answer_is_appended_verbatim() {
        let mut controller = ChatController::detached(answering("Eat more protein."));
        controller.composer_mut().set("  what should I eat?  ");

        assert_eq!(controller.submit_composer().await, SubmitOutcome::Accepted);
        controller.wait_for_answer().await;

        let turns = controller.log().turns();
        assert_eq!(turns[0], Turn::participant("  what should I eat?  "));
        assert_eq!(turns[1], Turn::assistant("Eat more protein."));
        assert_eq!(controller.composer().text(), "");
        assert_eq!(controller.state(), ControllerState::Idle);
    }

    #[tokio::test]
    async fn test_missing_answer_uses_fallback() {
        let (tx, mut rx) = mpsc::channel(100);
        let mut controller = ChatController::new(
            MockService {
                reply: None,
                fail: false,
            },
            tx,
        );

        controller.submit_and_wait("hello").await;

        assert_eq!(controller.log().last(), Some(&Turn::assistant(NO_RESPONSE_TEXT)));
        assert!(!controller.is_awaiting());

        let events = drain(&mut rx);
        assert_eq!(
            events[2],
            ChatEvent::TurnAppended {
                index: 1,
                origin: Origin::Assistant,
                answer: Some(AnswerKind::Empty),
            }
        );
    }

    #[tokio::test]
    async fn test_empty_answer_uses_fallback() {
        let mut controller = ChatController::detached(answering(""));
        controller.submit_and_wait("hello").await;
        assert_eq!(controller.log().last(), Some(&Turn::assistant(NO_RESPONSE_TEXT)));
    }

    #[tokio::test]
    async fn test_failure_uses_error_text() {
        let (tx, mut rx) = mpsc::channel(100);
        let mut controller = ChatController::new(
            MockService {
                reply: None,
                fail: true,
            },
            tx,
        );
        controller.composer_mut().set("hello");

        assert_eq!(controller.submit_composer().await, SubmitOutcome::Accepted);
        controller.wait_for_answer().await;

        assert_eq!(controller.log().last(), Some(&Turn::assistant(FETCH_ERROR_TEXT)));
        assert_eq!(controller.composer().text(), "");
        assert_eq!(controller.state(), ControllerState::Idle);

        assert_eq!(
            drain(&mut rx),
            vec![
                ChatEvent::TurnAppended {
                    index: 0,
                    origin: Origin::Participant,
                    answer: None,
                },
                ChatEvent::State {
                    state: ControllerState::Awaiting,
                },
                ChatEvent::TurnAppended {
                    index: 1,
                    origin: Origin::Assistant,
                    answer: Some(AnswerKind::Failed),
                },
                ChatEvent::State {
                    state: ControllerState::Idle,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_submission_while_awaiting_is_rejected() {
        let (release, gate) = oneshot::channel();
        let mut controller = ChatController::detached(GatedService {
            gate: Mutex::new(Some(gate)),
        });

        assert_eq!(controller.submit("first").await, SubmitOutcome::Accepted);
        assert_eq!(controller.submit("second").await, SubmitOutcome::Busy);
        assert_eq!(controller.log().len(), 1);
        assert!(!controller.poll_answer().await);

        release.send(()).unwrap();
        controller.wait_for_answer().await;

        assert_eq!(controller.log().len(), 2);
        assert_eq!(controller.log().last(), Some(&Turn::assistant("re: first")));

        // Reusable once idle again
        assert_eq!(controller.submit_and_wait("second").await, SubmitOutcome::Accepted);
        assert_eq!(controller.log().last(), Some(&Turn::assistant("re: second")));
    }

    #[tokio::test]
    async fn test_poll_answer_settles_eventually() {
        let mut controller = ChatController::detached(answering("done"));
        controller.submit("go").await;

        let mut settled = false;
        for _ in 0..100 {
            if controller.poll_answer().await {
                settled = true;
                break;
            }
            tokio::task::yield_now().await;
        }

        assert!(settled);
        assert!(!controller.poll_answer().await);
        assert_eq!(controller.log().last(), Some(&Turn::assistant("done")));
    }

    #[tokio::test]
    async fn test_dropped_surface_does_not_block() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut controller = ChatController::new(answering("fine"), tx);

        controller.submit_and_wait("hi").await;
        assert_eq!(controller.log().len(), 2);
    }
}
