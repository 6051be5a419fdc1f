//! Voice-driven vision assistant for visually impaired users
//!
//! The core is a session loop: listen for a spoken command, classify it
//! into an intent, dispatch to a capability handler, and answer aloud.
//! Collaborators (speech, perception, reasoning, navigation, storage) sit
//! behind traits so a failing backend degrades one reply, never the session.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod intent;
pub mod navigation;
pub mod perception;
pub mod reasoning;
pub mod session;
pub mod speech;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use session::Session;
