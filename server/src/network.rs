//! TCP accept loop handing each player connection to its own handler task

use crate::client_manager::MAX_PLAYERS;
use crate::config::ServerConfig;
use crate::connection::ConnectionHandler;
use crate::error::{ServerError, SessionError};
use crate::game::GameState;
use log::{error, info, warn};
use shared::FramedStream;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::{RwLock, Semaphore};

/// Listening server owning the shared game state
pub struct Server {
    listener: TcpListener,
    game: Arc<RwLock<GameState>>,
    config: Arc<ServerConfig>,
    slots: Arc<Semaphore>,
}

impl Server {
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let game = GameState::new(config.simulation.clone());
        Self::bind_with_game(config, game).await
    }

    /// Binds with a caller-built game state, e.g. one with a fixed seed.
    pub async fn bind_with_game(config: ServerConfig, game: GameState) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        info!("[LISTENING] Server is listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            game: Arc::new(RwLock::new(game)),
            config: Arc::new(config),
            slots: Arc::new(Semaphore::new(MAX_PLAYERS)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn game_state(&self) -> Arc<RwLock<GameState>> {
        Arc::clone(&self.game)
    }

    /// Accepts connections forever
    ///
    /// A connection is only accepted once a slot permit is free, so a third
    /// client waits in the listen backlog until one of the players leaves.
    pub async fn run(self) -> Result<(), ServerError> {
        loop {
            let permit = Arc::clone(&self.slots).acquire_owned().await?;
            let (socket, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            if let Err(e) = socket.set_nodelay(true) {
                warn!("Could not disable Nagle for {}: {}", addr, e);
            }

            let slot = self.game.write().await.connect(addr, Instant::now());
            let Some(slot) = slot else {
                warn!("{}", SessionError::SlotUnavailable(addr));
                continue;
            };

            let stream = FramedStream::with_max_frame_len(socket, self.config.max_frame_len);
            let handler = ConnectionHandler::new(
                stream,
                addr,
                slot,
                Arc::clone(&self.game),
                Arc::clone(&self.config),
            );

            let live = MAX_PLAYERS - self.slots.available_permits();
            info!("[ACTIVE CONNECTIONS] {}", live);

            tokio::spawn(async move {
                handler.run().await;
                drop(permit);
            });
        }
    }
}
