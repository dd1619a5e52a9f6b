//! TCP session with the duel server

use log::{debug, info};
use shared::{
    ActionState, AddrRecord, ControlRecord, EnemyRecord, FrameError, FramedStream, LaserRecord,
    MatchState, TickUpdate, DISCONNECT_MESSAGE, GREETING,
};
use std::io;
use std::net::SocketAddr;
use tokio::net::{TcpStream, ToSocketAddrs};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Framing(#[from] FrameError),
    #[error("server sent an unusable identity {0}")]
    InvalidIdentity(String),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// A connected player session
///
/// Created by [`Client::connect`], which also performs the greeting, so a
/// `Client` always knows the identity the server assigned to it.
pub struct Client {
    stream: FramedStream<TcpStream>,
    identity: SocketAddr,
}

impl Client {
    pub async fn connect(
        server: impl ToSocketAddrs,
        max_frame_len: usize,
    ) -> Result<Self, ClientError> {
        let socket = TcpStream::connect(server).await?;
        socket.set_nodelay(true)?;
        let mut stream = FramedStream::with_max_frame_len(socket, max_frame_len);

        stream.send_text(GREETING).await?;
        let record: AddrRecord = stream.recv_json().await?;
        let identity = record
            .to_socket_addr()
            .map_err(|e| ClientError::InvalidIdentity(format!("{}:{} ({e})", record.ip, record.port)))?;

        info!("Connected as {}", identity);
        Ok(Client { stream, identity })
    }

    /// The address the server knows this client by.
    pub fn identity(&self) -> SocketAddr {
        self.identity
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ClientError> {
        Ok(self.stream.get_ref().local_addr()?)
    }

    /// Runs one tick: sends readiness and actions, then reads the four
    /// update frames.
    pub async fn exchange(
        &mut self,
        ready: bool,
        actions: ActionState,
    ) -> Result<TickUpdate, ClientError> {
        self.stream
            .send_json(&ControlRecord::connected(ready))
            .await?;
        self.stream.send_json(&actions).await?;

        let state: MatchState = self.stream.recv_json().await?;
        let own_lasers: Vec<LaserRecord> = self.stream.recv_json().await?;
        let opponent_lasers: Vec<LaserRecord> = self.stream.recv_json().await?;
        let enemies: Vec<EnemyRecord> = self.stream.recv_json().await?;

        debug!(
            "Tick: level {}, {} enemies, {} own lasers",
            state.level,
            enemies.len(),
            own_lasers.len()
        );

        Ok(TickUpdate {
            state,
            own_lasers,
            opponent_lasers,
            enemies,
        })
    }

    /// Leaves by sending a control record with `connection: false`.
    pub async fn leave(mut self) -> Result<(), ClientError> {
        self.stream.send_json(&ControlRecord::leaving()).await?;
        self.stream.shutdown().await?;
        info!("Left the match");
        Ok(())
    }

    /// Leaves by sending the disconnect message in place of a record.
    pub async fn disconnect(mut self) -> Result<(), ClientError> {
        self.stream.send_text(DISCONNECT_MESSAGE).await?;
        self.stream.shutdown().await?;
        info!("Disconnected");
        Ok(())
    }
}
