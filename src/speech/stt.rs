//! Speech-to-text dictation adapter.
//!
//! The device recognizer is event-driven rather than request/response:
//! one utterance per activation, reported through a subscribed event
//! stream. The controller models that lifecycle as an explicit
//! `{Idle, Listening}` state machine with guaranteed unsubscription on
//! teardown — recognition is *aborted*, not merely stopped.

use crate::error::Result;
use crate::language::Language;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Events emitted by a recognition run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerEvent {
    /// The device started capturing the utterance.
    Started,
    /// A recognized utterance.
    Result(String),
    /// The utterance ended (with or without a result).
    Ended,
    /// Recognition failed.
    Error(String),
}

/// Device speech-recognition facility.
pub trait SpeechRecognizer: Send + Sync {
    /// Whether the capability exists on this device.
    fn is_supported(&self) -> bool;

    /// Begin one utterance of recognition for `language_tag`, delivering
    /// events to `events` until `Ended` or `Error`.
    fn start(
        &self,
        language_tag: &str,
        events: mpsc::UnboundedSender<RecognizerEvent>,
    ) -> Result<()>;

    /// Abort any in-progress recognition immediately.
    fn abort(&self);
}

/// Dictation lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictationState {
    Idle,
    Listening,
}

/// Drives the recognizer and surfaces recognized text for the composer.
pub struct DictationController {
    recognizer: Arc<dyn SpeechRecognizer>,
    state: DictationState,
    events: Option<mpsc::UnboundedReceiver<RecognizerEvent>>,
}

impl DictationController {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        Self {
            recognizer,
            state: DictationState::Idle,
            events: None,
        }
    }

    pub fn state(&self) -> DictationState {
        self.state
    }

    /// Toggle listening. Returns the new state. Absent capability degrades
    /// silently: the toggle stays `Idle`.
    pub fn toggle(&mut self, language: Language) -> Result<DictationState> {
        match self.state {
            DictationState::Idle => {
                if !self.recognizer.is_supported() {
                    tracing::debug!("speech recognition unsupported, dictation disabled");
                    return Ok(DictationState::Idle);
                }
                let (tx, rx) = mpsc::unbounded_channel();
                self.recognizer.start(language.tag(), tx)?;
                self.events = Some(rx);
                self.state = DictationState::Listening;
            }
            DictationState::Listening => {
                self.teardown();
            }
        }
        Ok(self.state)
    }

    /// Drain the next recognized utterance, if one arrived. `Ended` and
    /// `Error` events return the controller to `Idle`.
    pub fn poll_utterance(&mut self) -> Option<String> {
        loop {
            let event = self.events.as_mut()?.try_recv().ok()?;
            match event {
                RecognizerEvent::Started => continue,
                RecognizerEvent::Result(text) => return Some(text),
                RecognizerEvent::Ended => {
                    self.state = DictationState::Idle;
                    self.events = None;
                    return None;
                }
                RecognizerEvent::Error(reason) => {
                    tracing::warn!(reason = %reason, "speech recognition failed");
                    self.state = DictationState::Idle;
                    self.events = None;
                    return None;
                }
            }
        }
    }

    /// Abort recognition and unsubscribe. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if self.state == DictationState::Listening {
            self.recognizer.abort();
        }
        self.events = None;
        self.state = DictationState::Idle;
    }
}

impl Drop for DictationController {
    fn drop(&mut self) {
        self.teardown();
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct FakeRecognizer {
        supported: bool,
        aborts: Mutex<usize>,
        sender: Mutex<Option<mpsc::UnboundedSender<RecognizerEvent>>>,
    }

    impl FakeRecognizer {
        fn supported() -> Self {
            Self {
                supported: true,
                ..Default::default()
            }
        }

        fn emit(&self, event: RecognizerEvent) {
            let guard = self.sender.lock();
            if let Some(tx) = guard.as_ref() {
                let _ = tx.send(event);
            }
        }
    }

    impl SpeechRecognizer for FakeRecognizer {
        fn is_supported(&self) -> bool {
            self.supported
        }

        fn start(
            &self,
            _language_tag: &str,
            events: mpsc::UnboundedSender<RecognizerEvent>,
        ) -> Result<()> {
            *self.sender.lock() = Some(events);
            Ok(())
        }

        fn abort(&self) {
            *self.aborts.lock() += 1;
        }
    }

    #[test]
    fn toggle_starts_and_stops_listening() {
        let recognizer = Arc::new(FakeRecognizer::supported());
        let mut dictation = DictationController::new(recognizer.clone());

        assert_eq!(
            dictation.toggle(Language::En).unwrap(),
            DictationState::Listening
        );
        assert_eq!(dictation.toggle(Language::En).unwrap(), DictationState::Idle);
        assert_eq!(*recognizer.aborts.lock(), 1);
    }

    #[test]
    fn unsupported_degrades_silently() {
        let recognizer = Arc::new(FakeRecognizer::default());
        let mut dictation = DictationController::new(recognizer);

        assert_eq!(dictation.toggle(Language::En).unwrap(), DictationState::Idle);
        assert_eq!(dictation.state(), DictationState::Idle);
    }

    #[test]
    fn recognized_text_is_surfaced() {
        let recognizer = Arc::new(FakeRecognizer::supported());
        let mut dictation = DictationController::new(recognizer.clone());
        dictation.toggle(Language::Ko).unwrap();

        recognizer.emit(RecognizerEvent::Started);
        recognizer.emit(RecognizerEvent::Result("주전자가 뭐야".into()));

        assert_eq!(dictation.poll_utterance().as_deref(), Some("주전자가 뭐야"));
    }

    #[test]
    fn end_event_returns_to_idle() {
        let recognizer = Arc::new(FakeRecognizer::supported());
        let mut dictation = DictationController::new(recognizer.clone());
        dictation.toggle(Language::En).unwrap();

        recognizer.emit(RecognizerEvent::Ended);
        assert!(dictation.poll_utterance().is_none());
        assert_eq!(dictation.state(), DictationState::Idle);
    }

    #[test]
    fn error_event_returns_to_idle() {
        let recognizer = Arc::new(FakeRecognizer::supported());
        let mut dictation = DictationController::new(recognizer.clone());
        dictation.toggle(Language::En).unwrap();

        recognizer.emit(RecognizerEvent::Error("no-speech".into()));
        assert!(dictation.poll_utterance().is_none());
        assert_eq!(dictation.state(), DictationState::Idle);
    }

    #[test]
    fn teardown_aborts_active_recognition() {
        let recognizer = Arc::new(FakeRecognizer::supported());
        let mut dictation = DictationController::new(recognizer.clone());
        dictation.toggle(Language::En).unwrap();

        dictation.teardown();
        dictation.teardown();
        assert_eq!(*recognizer.aborts.lock(), 1);
        assert_eq!(dictation.state(), DictationState::Idle);
    }
}
