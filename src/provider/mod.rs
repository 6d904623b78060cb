//! Reasoning-service abstraction.
//!
//! The remote vision/reasoning service is a black box consumed through two
//! narrow contracts: a single-shot identification call and a multi-turn
//! dialogue session. The provider is an explicitly constructed, injected
//! collaborator — never ambient state — so tests substitute a fake.

pub mod gemini;

pub use gemini::GeminiProvider;

use crate::capture::CapturedImage;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// One bound multi-turn dialogue context.
///
/// Session state lives in the external service; the client holds only this
/// opaque handle. Implementations must be shareable so the controller can
/// swap sessions atomically while a send is in flight.
#[async_trait]
pub trait ChatSession: Send + Sync {
    /// Opaque handle identity, stable for the session's lifetime.
    fn id(&self) -> &str;

    /// Send one user turn and await the reply text.
    async fn send(&self, text: &str) -> Result<String>;
}

/// Vision-capable reasoning service.
#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    /// Single-shot identification: annotated image + instruction → label.
    ///
    /// An empty reply is returned as-is; the caller decides whether empty
    /// means failure.
    async fn identify(&self, image: &CapturedImage, instruction: &str) -> Result<String>;

    /// Open a fresh multi-turn dialogue bound to `system_instruction`.
    async fn create_session(&self, system_instruction: &str) -> Result<Arc<dyn ChatSession>>;
}
