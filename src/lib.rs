//! Line Chat Relay Library
//!
//! A newline-delimited TCP chat relay built with tokio. Clients pick a unique
//! screen name through a small handshake, then exchange broadcast and
//! directed messages through the server.
//!
//! # Protocol
//! - Server prompts `SUBMITNAME` until a free, non-empty name arrives, then
//!   answers `NAMEACCEPTED`
//! - `TO:<name1,name2>:<body>` goes to the listed clients only
//! - Any other line is broadcast to every client, sender included
//! - `MESSAGE <sender>: <body>` delivers chat, `CLIENTLIST<a>,<b>,` the roster
//!
//! # Architecture
//! - `ClientRegistry` is the only shared state: one lock over a map of
//!   names to sinks, never held across an await
//! - Each connection runs a session task plus a writer task draining its sink
//! - Teardown is tied to a drop guard, so every exit path cleans up
//!
//! # Example
//! ```ignore
//! use line_relay::{Config, RelayServer};
//! use clap::Parser;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let server = RelayServer::bind(&Config::parse()).await?;
//!     server.run_until_ctrl_c().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod router;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use client::ClientSink;
pub use config::Config;
pub use error::{AppError, NameError, SendError};
pub use handler::{handle_connection, serve_stream};
pub use message::{Message, ServerLine};
pub use registry::ClientRegistry;
pub use router::MessageRouter;
pub use server::RelayServer;
pub use types::{ClientName, SessionId};
