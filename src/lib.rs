//! pointlens — point a camera at the world, tap an object, talk about it.
//!
//! The core is a capture-to-identification pipeline with stateful
//! conversational session management: freeze a tap coordinate, render a
//! region-of-interest ring into an off-screen raster, downscale and encode
//! it, dispatch it to a vision-capable reasoning service, bind the result
//! into a fresh multi-turn dialogue, and mediate all of that against the
//! live camera stream, pinch-zoom hardware constraints and the device's
//! speech facilities.
//!
//! Device hardware and the remote reasoning service are consumed through
//! narrow trait seams ([`media::MediaDevice`], [`capture::FrameSource`],
//! [`provider::ReasoningProvider`], [`speech::SpeechRecognizer`],
//! [`speech::SpeechSynthesizer`]); a presentation shell drives [`app::App`]
//! and renders its read-only views.

pub mod app;
pub mod capture;
pub mod config;
pub mod error;
pub mod gesture;
pub mod language;
pub mod media;
pub mod provider;
pub mod relay;
pub mod session;
pub mod speech;

pub use app::App;
pub use capture::{CaptureMarker, CapturedImage, Point, Size};
pub use config::Config;
pub use error::{PointLensError, Result};
pub use gesture::{GestureController, ZoomState};
pub use language::Language;
pub use media::{Facing, MediaAdapter, MediaDevice, ZoomCapability};
pub use provider::{ChatSession, GeminiProvider, ReasoningProvider};
pub use relay::{ConversationRelay, SendOutcome};
pub use session::{IdentifyOutcome, Message, Sender, SessionController};
