//! Identification Session Controller.
//!
//! Orchestrates the full cycle — capture, dispatch to the reasoning
//! service, session creation, transcript seeding — and owns the single
//! active conversational session.
//!
//! Per attempt: `Idle → Capturing → Dispatched → {Bound, Failed}`. At most
//! one attempt is in flight; overlapping taps are dropped, not buffered.
//! A bound attempt replaces the Session atomically with respect to the
//! transcript. Stopping the camera bumps the epoch counter so a late
//! result can never write stale state.

use crate::capture::{self, CaptureMarker, FrameSource, Point, Size};
use crate::error::{PointLensError, Result};
use crate::language::Language;
use crate::provider::{ChatSession, ReasoningProvider};
use crate::speech::Speaker;
use parking_lot::Mutex;
use std::sync::Arc;

/// Who produced a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
    System,
}

/// One transcript entry. Insertion order is display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::System,
            text: text.into(),
        }
    }
}

/// Conversation state shared between the controller and the relay.
///
/// All mutation happens under the lock from a single logical control flow;
/// the lock is never held across an await.
pub(crate) struct SharedState {
    pub(crate) transcript: Vec<Message>,
    pub(crate) session: Option<Arc<dyn ChatSession>>,
    pub(crate) marker: Option<CaptureMarker>,
    pub(crate) identify_in_flight: bool,
    pub(crate) send_in_flight: bool,
    pub(crate) epoch: u64,
}

impl SharedState {
    fn new() -> Self {
        Self {
            transcript: Vec::new(),
            session: None,
            marker: None,
            identify_in_flight: false,
            send_in_flight: false,
            epoch: 0,
        }
    }
}

/// Result of a tap-to-identify request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifyOutcome {
    /// A fresh session was bound to this (display-capitalized) label.
    Identified(String),
    /// The tap was dropped: an attempt was already in flight, or the
    /// result arrived after the camera stopped.
    Ignored,
}

/// Owns the Session, the Transcript, and the single in-flight attempt.
pub struct SessionController {
    state: Arc<Mutex<SharedState>>,
    provider: Arc<dyn ReasoningProvider>,
    speaker: Arc<Mutex<Speaker>>,
}

impl SessionController {
    pub fn new(provider: Arc<dyn ReasoningProvider>, speaker: Arc<Mutex<Speaker>>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SharedState::new())),
            provider,
            speaker,
        }
    }

    /// Shared conversation state, for the relay.
    pub(crate) fn shared(&self) -> Arc<Mutex<SharedState>> {
        self.state.clone()
    }

    /// Run one identification attempt for a tap at `tap` inside
    /// `container`, against the current frame of `source`.
    ///
    /// Re-entrant taps while an attempt is in flight return
    /// [`IdentifyOutcome::Ignored`] without touching any state. A result
    /// that lands after [`reset`](Self::reset) is discarded the same way.
    pub async fn identify_at(
        &self,
        source: &dyn FrameSource,
        tap: Point,
        container: Size,
        language: Language,
    ) -> Result<IdentifyOutcome> {
        let epoch = {
            let mut st = self.state.lock();
            if st.identify_in_flight {
                tracing::debug!("tap dropped, identification already in flight");
                return Ok(IdentifyOutcome::Ignored);
            }
            st.identify_in_flight = true;
            st.marker = Some(CaptureMarker::centered_on(tap));
            st.epoch
        };

        // Capturing
        let captured = match capture::capture(source, tap, container) {
            Ok(image) => image,
            Err(e) => {
                self.finish_attempt(epoch);
                return Err(e);
            }
        };

        // Dispatched
        let label = match self
            .provider
            .identify(&captured, language.identify_instruction())
            .await
        {
            Ok(label) => label,
            Err(e) => {
                if !self.finish_attempt(epoch) {
                    return Ok(IdentifyOutcome::Ignored);
                }
                return Err(e);
            }
        };

        let label = label.trim();
        if label.is_empty() {
            if !self.finish_attempt(epoch) {
                return Ok(IdentifyOutcome::Ignored);
            }
            return Err(PointLensError::Service("empty identification response".into()));
        }
        let label = capitalize_first(label);

        // Don't open a remote session for an attempt the camera outlived.
        if self.state.lock().epoch != epoch {
            return Ok(IdentifyOutcome::Ignored);
        }

        let session = match self
            .provider
            .create_session(&language.chat_system_instruction(&label))
            .await
        {
            Ok(session) => session,
            Err(e) => {
                if !self.finish_attempt(epoch) {
                    return Ok(IdentifyOutcome::Ignored);
                }
                return Err(e);
            }
        };

        // Bound: session replacement and transcript reseed are one
        // critical section, after the epoch re-check.
        {
            let mut st = self.state.lock();
            if st.epoch != epoch {
                tracing::debug!("discarding identification that outlived its camera session");
                return Ok(IdentifyOutcome::Ignored);
            }
            st.identify_in_flight = false;
            st.session = Some(session);
            st.transcript = vec![
                Message::system(language.seed_system_message(&label)),
                Message::bot(language.seed_bot_greeting(&label)),
            ];
        }

        self.speaker.lock().speak(&label, language);
        tracing::info!(label = %label, "identification bound to a new session");
        Ok(IdentifyOutcome::Identified(label))
    }

    /// Clear the attempt flag if the epoch is still current. Returns
    /// whether it was — a stale attempt must not surface its error.
    fn finish_attempt(&self, epoch: u64) -> bool {
        let mut st = self.state.lock();
        if st.epoch != epoch {
            return false;
        }
        st.identify_in_flight = false;
        true
    }

    /// Camera stopped (or is restarting): clear marker, transcript and
    /// session, and invalidate any in-flight attempt. Idempotent.
    pub fn reset(&self) {
        let mut st = self.state.lock();
        st.epoch += 1;
        st.identify_in_flight = false;
        st.send_in_flight = false;
        st.session = None;
        st.transcript.clear();
        st.marker = None;
    }

    /// Snapshot of the transcript, in display order.
    pub fn transcript(&self) -> Vec<Message> {
        self.state.lock().transcript.clone()
    }

    /// The last-examined-point marker, while the camera runs.
    pub fn marker(&self) -> Option<CaptureMarker> {
        self.state.lock().marker
    }

    /// Opaque handle identity of the bound session, if any.
    pub fn session_id(&self) -> Option<String> {
        self.state
            .lock()
            .session
            .as_ref()
            .map(|s| s.id().to_string())
    }

    /// Whether an identification attempt is in flight.
    pub fn is_busy(&self) -> bool {
        self.state.lock().identify_in_flight
    }
}

/// Uppercase the first letter for display consistency.
fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// ── Tests ────────────────────────────────────────────────────────
