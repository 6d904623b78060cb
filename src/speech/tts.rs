//! Text-to-speech readback adapter.
//!
//! The device facility selects a voice and speaks; submission is
//! non-blocking and in-progress playback can be cancelled. Only the latest
//! utterance is relevant, so the speaker always cancels before speaking.
//!
//! Voice selection: among voices matching the exact language tag, a
//! heuristic score over the voice's display name picks the best one —
//! cloud-backed "neural"-class voices read far better than the local
//! defaults. No positive-scoring voice falls back to any tag match, then
//! to the device default.

use crate::language::Language;
use std::sync::Arc;

// ── Voice scoring weights ────────────────────────────────────────

const SCORE_NEURAL: i32 = 8;
const SCORE_VENDOR_CLOUD: i32 = 4;
const SCORE_NATURAL: i32 = 4;
const SCORE_REMOTE: i32 = 2;
const SCORE_FEMALE: i32 = 2;

/// Name markers for vendor cloud voices.
const VENDOR_MARKERS: &[&str] = &["google", "microsoft", "amazon"];

/// A voice exposed by the device synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    /// Display name, e.g. "Microsoft Heami Online (Natural) - Korean".
    pub name: String,
    /// Language tag, e.g. "ko-KR".
    pub lang: String,
    /// Whether the voice is synthesized on-device (vs. cloud-backed).
    pub local: bool,
}

/// Device text-to-speech facility.
pub trait SpeechSynthesizer: Send + Sync {
    /// Whether the capability exists on this device.
    fn is_supported(&self) -> bool;

    /// Voices currently loaded; may be empty until the device reports them.
    fn voices(&self) -> Vec<VoiceInfo>;

    /// Submit an utterance. Non-blocking; the device queues and plays.
    fn speak(&self, text: &str, language_tag: &str, voice: Option<&VoiceInfo>);

    /// Cancel any in-progress or queued playback.
    fn cancel(&self);
}

/// Heuristic quality score for a voice's display name.
fn score_voice(voice: &VoiceInfo) -> i32 {
    let name = voice.name.to_lowercase();
    let mut score = 0;
    if name.contains("neural") {
        score += SCORE_NEURAL;
    }
    if VENDOR_MARKERS.iter().any(|m| name.contains(m)) {
        score += SCORE_VENDOR_CLOUD;
    }
    if name.contains("natural") {
        score += SCORE_NATURAL;
    }
    if !voice.local {
        score += SCORE_REMOTE;
    }
    if name.contains("female") {
        score += SCORE_FEMALE;
    }
    score
}

/// Pick the best voice for a language tag from the loaded set.
///
/// Highest-scoring exact-tag match wins; with no positive score, any
/// exact-tag voice; then any voice sharing the primary subtag; `None`
/// proceeds with the device default.
pub fn select_voice(voices: &[VoiceInfo], language_tag: &str) -> Option<VoiceInfo> {
    let exact: Vec<&VoiceInfo> = voices.iter().filter(|v| v.lang == language_tag).collect();

    let best = exact
        .iter()
        .map(|v| (score_voice(v), *v))
        .filter(|(score, _)| *score > 0)
        .max_by_key(|(score, _)| *score)
        .map(|(_, v)| v.clone());
    if best.is_some() {
        return best;
    }
    if let Some(v) = exact.first() {
        return Some((*v).clone());
    }

    let primary = language_tag.split('-').next().unwrap_or(language_tag);
    voices
        .iter()
        .find(|v| v.lang.split('-').next() == Some(primary))
        .cloned()
}

/// Loading state of the device voice list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceCatalog {
    /// The device has not reported voices yet; speak with the default.
    Unloaded,
    /// Voices are known.
    Loaded(Vec<VoiceInfo>),
}

/// Spoken-readback front end over the device synthesizer.
pub struct Speaker {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    catalog: VoiceCatalog,
    warned_unsupported: bool,
    pending_alert: Option<String>,
}

impl Speaker {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            synthesizer,
            catalog: VoiceCatalog::Unloaded,
            warned_unsupported: false,
            pending_alert: None,
        }
    }

    /// Voice-list-changed notification from the device.
    pub fn on_voices_changed(&mut self, voices: Vec<VoiceInfo>) {
        self.catalog = VoiceCatalog::Loaded(voices);
    }

    pub fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    /// Speak `text` in `language`, cancelling any in-progress playback.
    ///
    /// Text beginning with the localized "error" word is suppressed so
    /// error banners are never read aloud. When the capability is absent,
    /// a one-time alert is queued for the shell instead.
    pub fn speak(&mut self, text: &str, language: Language) {
        if !self.synthesizer.is_supported() {
            if !self.warned_unsupported {
                self.warned_unsupported = true;
                self.pending_alert = Some(language.tts_unavailable_alert().to_string());
                tracing::warn!("text-to-speech unsupported on this device");
            }
            return;
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        if trimmed
            .to_lowercase()
            .starts_with(language.error_prefix())
        {
            tracing::debug!("suppressing spoken readback of error text");
            return;
        }

        let voice = match &self.catalog {
            VoiceCatalog::Loaded(voices) => select_voice(voices, language.tag()),
            VoiceCatalog::Unloaded => None,
        };

        self.synthesizer.cancel();
        self.synthesizer.speak(trimmed, language.tag(), voice.as_ref());
    }

    /// Stop playback without speaking anything new.
    pub fn cancel(&self) {
        if self.synthesizer.is_supported() {
            self.synthesizer.cancel();
        }
    }

    /// Take the one-time capability alert, if one is pending.
    pub fn take_alert(&mut self) -> Option<String> {
        self.pending_alert.take()
    }
}

// ── Tests ────────────────────────────────────────────────────────
