//! WebSocket Interview Sessions
//!
//! - `protocol`: Defines the JSON-based message format for client-server communication.
//! - `session`: Manages the connection lifecycle, from handshake to the end of the interview.

pub mod protocol;
pub mod session;

pub use session::ws_handler;
