//! Speech I/O adapters.
//!
//! Two independent, capability-dependent facilities:
//! - [`stt`] — speech-to-text dictation into the chat composer, one
//!   utterance per activation, event-driven.
//! - [`tts`] — text-to-speech readback of identification results and bot
//!   replies; only the latest utterance is ever relevant.

pub mod stt;
pub mod tts;

pub use stt::{DictationController, DictationState, RecognizerEvent, SpeechRecognizer};
pub use tts::{Speaker, SpeechSynthesizer, VoiceInfo};
