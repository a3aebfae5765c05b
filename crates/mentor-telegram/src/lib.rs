//! `mentor-telegram` — the outbound Telegram adapter.
//!
//! Implements the workspace's [`mentor_core::Sink`] contract on top of a
//! teloxide `Bot`: chunked sends under the 4096-char transport limit,
//! MarkdownV2 with per-chunk plain-text fallback, inline keyboards.

pub mod error;
pub mod send;
pub mod sink;

pub use error::TelegramError;
pub use sink::TelegramSink;
