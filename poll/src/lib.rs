//! Bounded interval polling.
//!
//! A [`Poll`] is a reusable description of how to poll: how often, for how
//! long, and which external signal aborts it. Each call to [`Poll::start`]
//! produces an independent [`PollSession`] that yields ticks until the
//! consumer stops it, the configured duration elapses, or the timeout signal
//! fires.
//!
//! The engine has no retry policy of its own. Consumers decide how many ticks
//! to consume before calling [`PollSession::stop`].

pub mod session;

pub use session::{Poll, PollConfig, PollSession, SessionEnd, MIN_INTERVAL};
