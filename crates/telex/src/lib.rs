//! Telex Delivery - outbound posting of the daily verse
//!
//! This crate owns the outbound side of the agent:
//! - **Messages** (`message`) - turns a finished `VerseRecord` into channel text and webhook payloads
//! - **Delivery** (`delivery`) - the `DeliveryChannel` seam with webhook and log-only channels
//!
//! # Architecture
//!
//! ```text
//! Scheduler / CLI → format_daily_message → DeliveryChannel ─┬─ WebhookChannel → Telex webhook
//!                                                            └─ LogOnlyChannel → tracing
//! ```
//!
//! A missing hook id never fails startup; `channel_from_config` falls back to
//! the log-only channel.

pub mod delivery;
pub mod message;

pub use delivery::{
    channel_from_config, DeliveryChannel, DeliveryError, LogOnlyChannel, WebhookChannel,
};
pub use message::{format_daily_message, ChannelMessage, WebhookPayload};
