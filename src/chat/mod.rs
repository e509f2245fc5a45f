//! Chat module
//!
//! Handles sessions, transcripts and the message shapes exchanged with the
//! widget and the upstream chat service.

pub mod models;
pub mod session;
pub mod transcript;

pub use models::{Choice, Delta, Message, MessageRole, StreamChunk};
pub use session::{Identity, InMemorySessionStore, Session, SessionId, SessionStore};
pub use transcript::Transcript;
