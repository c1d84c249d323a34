//! Application layer for cityweather
//!
//! Owns the weather screen state and the background fetches feeding it.

pub mod session;

pub use session::{ApplyOutcome, SessionError, SessionInbox, SessionMessage, WeatherSession};
