//! Supported languages and their localized string tables.
//!
//! Exactly two languages are supported. Each carries a fixed locale tag used
//! consistently across UI text, reasoning-service instructions, and speech
//! tags — switching languages is a full restart of the camera pipeline, so
//! no mixed-language state can exist.

use serde::{Deserialize, Serialize};

/// A supported UI/service/speech language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English (United States).
    En,
    /// Korean (Republic of Korea).
    Ko,
}

impl Default for Language {
    fn default() -> Self {
        Self::En
    }
}

impl Language {
    /// Get the ISO 639-1 code string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ko => "ko",
        }
    }

    /// Full locale tag used for speech recognition and synthesis.
    pub fn tag(self) -> &'static str {
        match self {
            Self::En => "en-US",
            Self::Ko => "ko-KR",
        }
    }

    /// Human-readable language name.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Ko => "Korean",
        }
    }

    /// Parse from string code (case-insensitive).
    pub fn from_str_code(code: &str) -> Option<Self> {
        match code.to_lowercase().as_str() {
            "en" | "en-us" => Some(Self::En),
            "ko" | "ko-kr" => Some(Self::Ko),
            _ => None,
        }
    }

    /// Both supported languages.
    pub fn all() -> &'static [Language] {
        &[Self::En, Self::Ko]
    }

    // ── Reasoning-service instructions ────────────────────────────

    /// Single-shot identification prompt sent alongside the annotated image.
    pub fn identify_instruction(self) -> &'static str {
        match self {
            Self::En => {
                "Look at the object inside the white circle, using the \
                 surrounding image for context. Respond with only the noun \
                 naming the primary object inside the circle, in English. \
                 If you cannot tell what it is, respond with exactly: \
                 unidentified"
            }
            Self::Ko => {
                "흰색 원 안에 있는 물체를 주변 이미지를 참고하여 확인하세요. \
                 원 안의 주요 물체를 가리키는 명사 하나만 한국어로 답하세요. \
                 무엇인지 알 수 없으면 정확히 다음과 같이 답하세요: 알 수 없음"
            }
        }
    }

    /// Sentinel the identification prompt asks for when the service is unsure.
    pub fn unidentified_sentinel(self) -> &'static str {
        match self {
            Self::En => "unidentified",
            Self::Ko => "알 수 없음",
        }
    }

    /// System instruction binding a fresh dialogue to the identified object.
    pub fn chat_system_instruction(self, label: &str) -> String {
        match self {
            Self::En => format!(
                "You are a helpful assistant. The user is looking at: {label}. \
                 Answer follow-up questions about it concisely, in English."
            ),
            Self::Ko => format!(
                "당신은 친절한 도우미입니다. 사용자가 보고 있는 대상: {label}. \
                 이에 대한 후속 질문에 한국어로 간결하게 답하세요."
            ),
        }
    }

    // ── Transcript seed messages ──────────────────────────────────

    /// System message naming the identified subject.
    pub fn seed_system_message(self, label: &str) -> String {
        match self {
            Self::En => format!("Identified: {label}"),
            Self::Ko => format!("인식된 대상: {label}"),
        }
    }

    /// Bot greeting inviting follow-up about the subject.
    pub fn seed_bot_greeting(self, label: &str) -> String {
        match self {
            Self::En => format!("That looks like {label}. Ask me anything about it!"),
            Self::Ko => format!("{label}인 것 같네요. 궁금한 점을 물어보세요!"),
        }
    }

    // ── Error surfaces ────────────────────────────────────────────

    /// Word a spoken-readback text must not start with — responses beginning
    /// with it are suppressed from text-to-speech.
    pub fn error_prefix(self) -> &'static str {
        match self {
            Self::En => "error",
            Self::Ko => "오류",
        }
    }

    /// Chat-send failure rendered conversationally as a bot message.
    pub fn chat_error_message(self) -> &'static str {
        match self {
            Self::En => "Sorry, I couldn't get a reply. Please try again.",
            Self::Ko => "죄송해요, 답변을 받지 못했어요. 다시 시도해 주세요.",
        }
    }

    /// One-time alert shown when text-to-speech is unavailable on the device.
    pub fn tts_unavailable_alert(self) -> &'static str {
        match self {
            Self::En => "Speech output is not available on this device.",
            Self::Ko => "이 기기에서는 음성 출력을 사용할 수 없습니다.",
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_code_roundtrip() {
        for lang in Language::all() {
            let parsed = Language::from_str_code(lang.as_str());
            assert_eq!(parsed, Some(*lang));
        }
    }

    #[test]
    fn language_count_is_two() {
        assert_eq!(Language::all().len(), 2);
    }

    #[test]
    fn locale_tags_are_fixed() {
        assert_eq!(Language::En.tag(), "en-US");
        assert_eq!(Language::Ko.tag(), "ko-KR");
    }

    #[test]
    fn parse_accepts_full_tags() {
        assert_eq!(Language::from_str_code("EN-US"), Some(Language::En));
        assert_eq!(Language::from_str_code("ko-kr"), Some(Language::Ko));
        assert_eq!(Language::from_str_code("fr"), None);
    }

    #[test]
    fn instructions_request_the_sentinel() {
        for lang in Language::all() {
            assert!(lang
                .identify_instruction()
                .contains(lang.unidentified_sentinel()));
        }
    }

    #[test]
    fn seed_messages_name_the_subject() {
        assert!(Language::En.seed_system_message("a teapot").contains("a teapot"));
        assert!(Language::Ko.seed_bot_greeting("주전자").contains("주전자"));
    }

    #[test]
    fn chat_instruction_binds_label() {
        let prompt = Language::En.chat_system_instruction("a bicycle");
        assert!(prompt.contains("a bicycle"));
    }
}
