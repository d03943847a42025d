//! Multi-client TCP chat relay.
//!
//! A server accepts concurrent connections and relays every chunk of bytes a
//! client sends to all other connected clients. A console client connects,
//! prints whatever the server relays, and forwards local input lines.
//!
//! There is no protocol: bytes are forwarded as-is, tagged with the sender's
//! identity (`Client <id>: `). Each module covers one piece:
//!
//! - [`connection`] wraps the write side of an accepted stream with a stable
//!   identity.
//! - [`registry`] holds the set of live connections behind one mutex.
//! - [`relay`] fans a message out to everyone except the sender.
//! - [`session`] runs the per-connection read loop and announces departures.
//! - [`server`] owns the listener and spawns one task per accepted stream.
//! - [`client`] is the console client.
//! - [`cli`] and [`logging`] are shared by the two binaries.

pub mod cli;
pub mod client;
pub mod connection;
pub mod logging;
pub mod message;
pub mod registry;
pub mod relay;
pub mod server;
pub mod session;
