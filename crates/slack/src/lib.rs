//! Slack Integration - coffee ordering bot interface
//!
//! This crate provides the Slack side of brewbot:
//! - **Socket Mode** (`socket`, `transport`) - WebSocket event stream with reconnection
//! - **Events** (`events`) - Mention listener that posts the order prompt
//! - **Interactions** (`interactions`) - Button clicks and dialog submissions
//! - **Messages** (`blocks`) - Legacy attachments and dialog builders
//! - **Web API** (`api`) - `chat.postMessage` and `dialog.open`
//!
//! # Flow
//!
//! ```text
//! "@brewbot order" → EventDispatcher → MentionHandler → prompt with button
//! button click     → InteractionDispatcher → dialog.open
//! dialog submit    → DeliveryWindow check → delayed confirmation
//! ```
//!
//! # Key Types
//!
//! - `SocketModeRunner` - WebSocket event loop with reconnection logic
//! - `EventDispatcher` - Routes events to registered handlers
//! - `InteractionDispatcher` - Handles `POST /slack/message_actions` bodies
//! - `SlackApi` - Outbound calls, faked in tests

pub mod api;
pub mod blocks;
pub mod events;
pub mod interactions;
pub mod socket;
pub mod transport;
