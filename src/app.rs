//! Application facade.
//!
//! Wires the media adapter, identification controller, relay, gesture
//! controller and speech adapters together and exposes the user-facing
//! controls: language selection, camera start/stop/flip, tap-to-identify,
//! pinch zoom, microphone toggle, and message send. Every cross-component
//! ordering guarantee is enforced here, on one logical thread of control:
//!
//! - Language switching stops the camera before the new language applies.
//! - Stopping or flipping the camera clears marker, transcript, session
//!   and zoom, aborts dictation, and invalidates in-flight attempts.
//! - Zoom state only advances when the device accepted the constraint.

use crate::capture::{CaptureMarker, Point, Size};
use crate::error::{PointLensError, Result};
use crate::gesture::{GestureController, ZoomState};
use crate::language::Language;
use crate::media::{Facing, MediaAdapter, MediaDevice};
use crate::provider::ReasoningProvider;
use crate::relay::{ConversationRelay, SendOutcome};
use crate::session::{IdentifyOutcome, Message, SessionController};
use crate::speech::{DictationController, DictationState, Speaker, SpeechRecognizer, SpeechSynthesizer, VoiceInfo};
use parking_lot::Mutex;
use std::sync::Arc;

/// The assembled capture-to-identification pipeline.
pub struct App {
    language: Language,
    adapter: MediaAdapter,
    controller: SessionController,
    relay: ConversationRelay,
    gesture: GestureController,
    dictation: DictationController,
    speaker: Arc<Mutex<Speaker>>,
}

impl App {
    /// Assemble the pipeline from its injected collaborators.
    pub fn new(
        provider: Arc<dyn ReasoningProvider>,
        device: Arc<dyn MediaDevice>,
        recognizer: Arc<dyn SpeechRecognizer>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        language: Language,
    ) -> Self {
        let speaker = Arc::new(Mutex::new(Speaker::new(synthesizer)));
        let controller = SessionController::new(provider, speaker.clone());
        let relay = ConversationRelay::new(controller.shared(), speaker.clone());
        Self {
            language,
            adapter: MediaAdapter::new(device),
            controller,
            relay,
            gesture: GestureController::new(),
            dictation: DictationController::new(recognizer),
            speaker,
        }
    }

    // ── Camera controls ───────────────────────────────────────────

    /// Start (or restart) the camera with the current facing.
    pub async fn start_camera(&mut self) -> Result<()> {
        // A (re)start begins a fresh examination: conversation state and
        // any in-flight attempt are invalidated before frames arrive.
        self.controller.reset();
        let facing = self.adapter.facing();
        self.adapter.start(facing).await?;
        self.gesture.reset(self.adapter.zoom_bounds());
        Ok(())
    }

    /// Stop the camera and clear all per-run state. Idempotent.
    pub fn stop_camera(&mut self) {
        self.adapter.stop();
        self.controller.reset();
        self.gesture.reset(None);
        self.dictation.teardown();
    }

    /// Toggle the camera; returns whether it is now running.
    pub async fn toggle_camera(&mut self) -> Result<bool> {
        if self.adapter.is_active() {
            self.stop_camera();
            Ok(false)
        } else {
            self.start_camera().await?;
            Ok(true)
        }
    }

    /// Switch between the outward- and inward-facing cameras.
    ///
    /// A full stop+restart cycle: conversation state is cleared exactly as
    /// for a manual stop. No-op while the camera is off.
    pub async fn flip_camera(&mut self) -> Result<()> {
        if !self.adapter.is_active() {
            return Ok(());
        }
        self.controller.reset();
        self.dictation.teardown();
        self.adapter.switch_facing().await?;
        self.gesture.reset(self.adapter.zoom_bounds());
        Ok(())
    }

    // ── Language ──────────────────────────────────────────────────

    /// Switch languages. The camera is stopped (clearing session,
    /// transcript and marker) before the new language takes effect.
    pub fn set_language(&mut self, language: Language) {
        if language == self.language {
            return;
        }
        self.stop_camera();
        self.language = language;
        tracing::info!(language = language.as_str(), "language switched");
    }

    pub fn language(&self) -> Language {
        self.language
    }

    // ── Identification and conversation ───────────────────────────

    /// Tap on the live view: identify the object at `point`.
    ///
    /// Ignored while the camera is off or an attempt is in flight.
    pub async fn tap(&self, point: Point, container: Size) -> Result<IdentifyOutcome> {
        let Some(source) = self.adapter.frame_source() else {
            return Ok(IdentifyOutcome::Ignored);
        };
        self.controller
            .identify_at(source, point, container, self.language)
            .await
    }

    /// Send composer text into the active conversation.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        self.relay.send(text, self.language).await
    }

    // ── Pinch zoom ────────────────────────────────────────────────

    pub fn pinch_start(&mut self, touches: &[Point]) {
        self.gesture.on_touch_start(touches);
    }

    /// Two-finger move: request the proportional zoom from the device and
    /// record it only if the constraint was accepted.
    pub fn pinch_move(&mut self, touches: &[Point]) {
        if let Some(factor) = self.gesture.on_touch_move(touches) {
            if self.adapter.apply_zoom(factor) {
                self.gesture.commit_zoom(factor);
            }
        }
    }

    pub fn pinch_end(&mut self, remaining_touches: usize) {
        self.gesture.on_touch_end(remaining_touches);
    }

    // ── Speech ────────────────────────────────────────────────────

    /// Toggle dictation; absent capability leaves it idle.
    pub fn toggle_microphone(&mut self) -> Result<DictationState> {
        self.dictation.toggle(self.language)
    }

    /// Recognized dictation text destined for the composer, if any.
    pub fn poll_dictation(&mut self) -> Option<String> {
        self.dictation.poll_utterance()
    }

    /// Device voice-list-changed notification.
    pub fn on_voices_changed(&self, voices: Vec<VoiceInfo>) {
        self.speaker.lock().on_voices_changed(voices);
    }

    /// One-time speech-capability alert, if pending.
    pub fn take_speech_alert(&self) -> Option<String> {
        self.speaker.lock().take_alert()
    }

    // ── Read-only views for a presentation shell ──────────────────

    pub fn camera_active(&self) -> bool {
        self.adapter.is_active()
    }

    pub fn facing(&self) -> Facing {
        self.adapter.facing()
    }

    pub fn transcript(&self) -> Vec<Message> {
        self.controller.transcript()
    }

    pub fn marker(&self) -> Option<CaptureMarker> {
        self.controller.marker()
    }

    pub fn zoom(&self) -> ZoomState {
        self.gesture.zoom_state()
    }

    pub fn is_identifying(&self) -> bool {
        self.controller.is_busy()
    }

    pub fn dictation_state(&self) -> DictationState {
        self.dictation.state()
    }

    /// Localized banner text for an error in the current language.
    pub fn banner(&self, error: &PointLensError) -> &'static str {
        error.banner(self.language)
    }
}

// ── Tests ────────────────────────────────────────────────────────
