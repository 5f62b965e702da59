//! voicewatch library crate.
//!
//! Watches voice channel membership, diffs it against the last stored
//! snapshot and delivers the resulting notifications to webhooks and queues.
//! The chat-platform client plugs in through [`source::MembershipSource`].

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod notification;
pub mod reporting;
pub mod services;
pub mod source;
pub mod store;
pub mod utils;

pub use error::{Error, Result};
