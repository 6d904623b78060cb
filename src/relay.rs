//! Conversation Relay.
//!
//! Forwards user-typed or dictated messages into the active session and
//! appends replies to the transcript. Sends are serialized — no pipelining
//! — and a service failure is rendered conversationally as a bot message,
//! never as a banner. A reply that arrives after the session was replaced
//! is discarded: no message is ever delivered to, or recorded against, a
//! stale session.

use crate::language::Language;
use crate::session::{Message, SharedState};
use crate::speech::Speaker;
use parking_lot::Mutex;
use std::sync::Arc;

/// Result of a send request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The reply was appended to the transcript and read back.
    Delivered,
    /// The service failed; a localized bot-side apology was appended.
    Failed,
    /// Nothing happened: blank text, no bound session, a send already in
    /// flight, or the session was replaced mid-send.
    Ignored,
}

/// Forwards composer text into the bound session.
pub struct ConversationRelay {
    state: Arc<Mutex<SharedState>>,
    speaker: Arc<Mutex<Speaker>>,
}

impl ConversationRelay {
    pub(crate) fn new(state: Arc<Mutex<SharedState>>, speaker: Arc<Mutex<Speaker>>) -> Self {
        Self { state, speaker }
    }

    /// Send one user message to the active session.
    pub async fn send(&self, text: &str, language: Language) -> SendOutcome {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return SendOutcome::Ignored;
        }

        let session = {
            let mut st = self.state.lock();
            if st.send_in_flight {
                tracing::debug!("send dropped, another send is in flight");
                return SendOutcome::Ignored;
            }
            let Some(session) = st.session.clone() else {
                tracing::debug!("send dropped, no session bound");
                return SendOutcome::Ignored;
            };
            st.send_in_flight = true;
            st.transcript.push(Message::user(trimmed));
            session
        };

        let reply = session.send(trimmed).await;

        let mut st = self.state.lock();
        st.send_in_flight = false;
        let still_bound = st
            .session
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &session));
        if !still_bound {
            tracing::debug!("discarding reply addressed to a replaced session");
            return SendOutcome::Ignored;
        }

        match reply {
            Ok(reply) => {
                st.transcript.push(Message::bot(reply.clone()));
                drop(st);
                self.speaker.lock().speak(&reply, language);
                SendOutcome::Delivered
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat send failed");
                st.transcript
                    .push(Message::bot(language.chat_error_message()));
                SendOutcome::Failed
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PointLensError, Result};
    use crate::provider::ChatSession;
    use crate::session::Sender;
    use crate::speech::{SpeechSynthesizer, VoiceInfo};
    use async_trait::async_trait;
    use tokio::sync::Semaphore;

    #[derive(Default)]
    struct RecordingSynth {
        spoken: Mutex<Vec<String>>,
    }

    impl SpeechSynthesizer for RecordingSynth {
        fn is_supported(&self) -> bool {
            true
        }

        fn voices(&self) -> Vec<VoiceInfo> {
            Vec::new()
        }

        fn speak(&self, text: &str, _language_tag: &str, _voice: Option<&VoiceInfo>) {
            self.spoken.lock().push(text.to_string());
        }

        fn cancel(&self) {}
    }

    struct FakeSession {
        reply: Result<&'static str>,
        gate: Semaphore,
    }

    impl FakeSession {
        fn replying(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply),
                gate: Semaphore::new(usize::MAX >> 4),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(PointLensError::Chat("down".into())),
                gate: Semaphore::new(usize::MAX >> 4),
            })
        }

        fn gated(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply),
                gate: Semaphore::new(0),
            })
        }
    }

    #[async_trait]
    impl ChatSession for FakeSession {
        fn id(&self) -> &str {
            "fake"
        }

        async fn send(&self, _text: &str) -> Result<String> {
            let permit = self.gate.acquire().await.expect("gate closed");
            permit.forget();
            match &self.reply {
                Ok(reply) => Ok((*reply).to_string()),
                Err(_) => Err(PointLensError::Chat("down".into())),
            }
        }
    }

    fn relay_with_session(
        session: Option<Arc<FakeSession>>,
    ) -> (Arc<ConversationRelay>, Arc<Mutex<SharedState>>, Arc<RecordingSynth>) {
        let synth = Arc::new(RecordingSynth::default());
        let speaker = Arc::new(Mutex::new(Speaker::new(synth.clone())));
        let controller = crate::session::SessionController::new(
            Arc::new(NullProvider),
            speaker.clone(),
        );
        let state = controller.shared();
        if let Some(session) = session {
            state.lock().session = Some(session);
        }
        (
            Arc::new(ConversationRelay::new(state.clone(), speaker)),
            state,
            synth,
        )
    }

    struct NullProvider;

    #[async_trait]
    impl crate::provider::ReasoningProvider for NullProvider {
        async fn identify(
            &self,
            _image: &crate::capture::CapturedImage,
            _instruction: &str,
        ) -> Result<String> {
            Ok(String::new())
        }

        async fn create_session(
            &self,
            _system_instruction: &str,
        ) -> Result<Arc<dyn ChatSession>> {
            Err(PointLensError::Service("unused".into()))
        }
    }

    #[tokio::test]
    async fn reply_is_appended_and_read_back() {
        let (relay, state, synth) = relay_with_session(Some(FakeSession::replying("it is blue")));

        let outcome = relay.send("what color?", Language::En).await;
        assert_eq!(outcome, SendOutcome::Delivered);

        let transcript = state.lock().transcript.clone();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].sender, Sender::User);
        assert_eq!(transcript[0].text, "what color?");
        assert_eq!(transcript[1].sender, Sender::Bot);
        assert_eq!(transcript[1].text, "it is blue");
        assert_eq!(*synth.spoken.lock(), vec!["it is blue".to_string()]);
    }

    #[tokio::test]
    async fn blank_text_is_a_no_op() {
        let (relay, state, _synth) = relay_with_session(Some(FakeSession::replying("hi")));

        assert_eq!(relay.send("   ", Language::En).await, SendOutcome::Ignored);
        assert_eq!(relay.send("", Language::En).await, SendOutcome::Ignored);
        assert!(state.lock().transcript.is_empty());
    }

    #[tokio::test]
    async fn no_session_is_a_no_op() {
        let (relay, state, _synth) = relay_with_session(None);

        assert_eq!(relay.send("hello", Language::En).await, SendOutcome::Ignored);
        assert!(state.lock().transcript.is_empty());
    }

    #[tokio::test]
    async fn failure_is_rendered_as_a_bot_message() {
        let (relay, state, synth) = relay_with_session(Some(FakeSession::failing()));

        let outcome = relay.send("hello?", Language::Ko).await;
        assert_eq!(outcome, SendOutcome::Failed);

        let transcript = state.lock().transcript.clone();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].sender, Sender::Bot);
        assert_eq!(transcript[1].text, Language::Ko.chat_error_message());
        // Error text is never read aloud.
        assert!(synth.spoken.lock().is_empty());
    }

    #[tokio::test]
    async fn sends_are_serialized() {
        let session = FakeSession::gated("slow reply");
        let (relay, state, _synth) = relay_with_session(Some(session.clone()));

        let first = {
            let relay = relay.clone();
            tokio::spawn(async move { relay.send("first", Language::En).await })
        };
        while !state.lock().send_in_flight {
            tokio::task::yield_now().await;
        }

        assert_eq!(relay.send("second", Language::En).await, SendOutcome::Ignored);

        session.gate.add_permits(2);
        assert_eq!(first.await.unwrap(), SendOutcome::Delivered);

        let transcript = state.lock().transcript.clone();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].text, "first");
    }

    #[tokio::test]
    async fn reply_to_a_replaced_session_is_discarded() {
        let session = FakeSession::gated("stale reply");
        let (relay, state, synth) = relay_with_session(Some(session.clone()));

        let pending = {
            let relay = relay.clone();
            tokio::spawn(async move { relay.send("question", Language::En).await })
        };
        while !state.lock().send_in_flight {
            tokio::task::yield_now().await;
        }

        // A new identification replaced the session and reseeded the
        // transcript while the send was in flight.
        {
            let mut st = state.lock();
            st.session = Some(FakeSession::replying("fresh"));
            st.transcript = vec![
                Message::system("Identified: A lamp"),
                Message::bot("That looks like A lamp."),
            ];
        }

        session.gate.add_permits(1);
        assert_eq!(pending.await.unwrap(), SendOutcome::Ignored);

        let transcript = state.lock().transcript.clone();
        assert_eq!(transcript.len(), 2);
        assert!(synth.spoken.lock().is_empty());
    }
}
