//! # Duel Client Library
//!
//! This library provides a headless client for the two-player space duel
//! server. It speaks the framed TCP protocol, keeps a view of the match
//! built from the server's updates, and can drive a ship on its own.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! Connects, performs the greeting and runs the per-tick exchange:
//! - One control record and one action vector out
//! - The match state, both laser lists and the enemy list back
//! - Leaving either with a control record or the disconnect message
//!
//! ### Game Module (`game`)
//! Turns each server update into a client-side view:
//! - Which slot this client occupies
//! - Its own ship versus the opponent's
//! - The current screen and the result of the last match
//!
//! ### Input Module (`input`)
//! Scripted input for bots and soak tests:
//! - Readiness that is released between matches
//! - Aiming, firing and dodging from the visible enemies
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::game::ClientGameState;
//! use client::input::InputManager;
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::connect("127.0.0.1:5050", shared::DEFAULT_MAX_FRAME_LEN).await?;
//!     let mut view = ClientGameState::new(client.identity());
//!     let mut input = InputManager::new(30, None);
//!
//!     for _ in 0..600 {
//!         let ready = input.ready_intent(&view);
//!         let actions = input.next_actions(&view);
//!         let update = client.exchange(ready, actions).await?;
//!         view.apply_update(update);
//!     }
//!
//!     client.leave().await?;
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
