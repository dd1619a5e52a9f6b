//! # Duel Server Library
//!
//! This library provides the authoritative server for a two-player
//! cooperative space shooter. Both players fly ships at the bottom of a
//! 750x750 playfield, shoot down descending enemy waves, and the first
//! player whose health runs out loses the match.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! All movement, shooting, collision and wave progression happen here.
//! Clients only send what they hold down each tick and render what the
//! server sends back.
//!
//! ### Match Lifecycle
//! Two slots, a lobby where both players signal readiness, a running match,
//! and an automatic reset back to the lobby once someone loses or leaves.
//!
//! ### Per-Connection Sessions
//! Every connection is served by its own task at a fixed tick rate. The two
//! tasks meet at a non-blocking rendezvous so the shared world advances
//! exactly once per tick no matter how their turns interleave.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! Slot table and per-connection counters.
//!
//! ### Connection Module (`connection`)
//! The session handler: handshake, tick loop, timeouts and cleanup.
//!
//! ### Entity and Physics Modules (`entity`, `physics`)
//! Ships, lasers and the pixel-mask collision they rely on.
//!
//! ### Game Module (`game`)
//! The shared [`game::GameState`] with the match rules.
//!
//! ### Network Module (`network`)
//! The TCP accept loop and slot admission.
//!
//! ### Rendezvous Module (`rendezvous`)
//! Decides which handler runs the world advance of each tick.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         bind_addr: "127.0.0.1:5050".to_string(),
//!         ..ServerConfig::default()
//!     };
//!
//!     // Accepts up to two players and serves them until the process exits
//!     let server = Server::bind(config).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod connection;
pub mod entity;
pub mod error;
pub mod game;
pub mod network;
pub mod physics;
pub mod rendezvous;
pub mod utils;

pub use config::{ServerConfig, SimulationConfig};
pub use error::{ServerError, SessionError};
pub use game::{ConnectionPhase, GameState};
pub use network::Server;
