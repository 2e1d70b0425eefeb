//! Client side of the OTP event stream.
//!
//! The backend pushes one-time passwords over a long-lived Server-Sent Events
//! connection. This crate owns that connection and nothing else: it opens the
//! stream, forwards named events through a channel, and reports transport
//! failures as a terminal event. Interpreting the payloads is left to the
//! `domain` crate.
//!
//! # Architecture
//!
//! - **Connector seam**: [`Connector`] opens a [`Connection`] for a URL. The
//!   production implementation is [`EventSourceConnector`]; tests provide
//!   channel-backed connectors.
//! - **Owned handle**: a [`Connection`] is the only way to observe a stream.
//!   Dropping or closing it aborts the reader task and closes the channel, so a
//!   released stream can never deliver another event.
//! - **No reconnects**: the first transport error ends the stream. Retrying is
//!   a user decision.
//!
//! # Modules
//!
//! - `connection`: `Connector` trait, `EventSourceConnector` and `Connection`
//! - `message`: `StreamEvent` and `Message` types delivered to the consumer
//! - `error`: errors raised while opening a connection

pub mod connection;
pub mod error;
pub mod message;

pub use connection::{Connection, Connector, EventSourceConnector};
pub use message::{Message, StreamEvent};
