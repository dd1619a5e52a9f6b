//! Per-connection session handler
//!
//! Each accepted TCP connection gets one handler task that owns the socket
//! for its whole life. After the greeting it runs a fixed-rate loop: read the
//! control record, read the action vector, run this slot's half of the tick
//! against the shared game state, and write back the match state, both laser
//! lists and the enemy list.

use crate::config::ServerConfig;
use crate::error::SessionError;
use crate::game::{ConnectionPhase, GameState};
use crate::utils::{capped_delta, scaled_velocity};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use shared::{
    ActionState, AddrRecord, ControlRecord, FramedStream, Slot, TickUpdate, DISCONNECT_MESSAGE,
    GREETING,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::RwLock;
use tokio::time::{interval, timeout, MissedTickBehavior};

/// A per-tick record, or the client's request to leave in its place.
enum Inbound<T> {
    Record(T),
    Leave,
}

/// Serves one client over its stream
///
/// The handler holds the game lock only for the two short halves of a tick,
/// never across socket I/O.
pub struct ConnectionHandler<S> {
    stream: FramedStream<S>,
    addr: SocketAddr,
    slot: Slot,
    phase: ConnectionPhase,
    game: Arc<RwLock<GameState>>,
    config: Arc<ServerConfig>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: FramedStream<S>,
        addr: SocketAddr,
        slot: Slot,
        game: Arc<RwLock<GameState>>,
        config: Arc<ServerConfig>,
    ) -> Self {
        Self {
            stream,
            addr,
            slot,
            phase: ConnectionPhase::Handshake,
            game,
            config,
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    /// Runs the session to completion, then frees the slot.
    ///
    /// Every way out of the session, clean or not, ends here so the slot is
    /// always released.
    pub async fn run(mut self) {
        info!("[NEW CONNECTION] {} connected as {}", self.addr, self.slot);

        match self.serve().await {
            Ok(()) => info!("{} ({}) left", self.addr, self.slot),
            Err(e) if e.is_disconnect() => {
                info!("{} ({}) closed the connection", self.addr, self.slot)
            }
            Err(e) => warn!("Dropping {} ({}): {}", self.addr, self.slot, e),
        }

        self.enter(ConnectionPhase::Disconnected);
        let client = self.game.write().await.disconnect(self.slot);
        if let Some(client) = client {
            info!(
                "{} played {} ticks over {:?}, lost {} matches",
                client.addr,
                client.ticks,
                client.session_length(),
                client.losses
            );
        }

        if let Err(e) = self.stream.shutdown().await {
            debug!("Shutdown of {} failed: {}", self.addr, e);
        }
    }

    async fn serve(&mut self) -> Result<(), SessionError> {
        self.handshake().await?;

        let mut ticker = interval(self.config.tick_duration());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_tick: Option<Instant> = None;
        let simulation = self.config.simulation.clone();

        loop {
            ticker.tick().await;

            let control = match self.recv_record::<ControlRecord>("reading control").await? {
                Inbound::Leave => return Ok(()),
                Inbound::Record(control) if !control.connection => return Ok(()),
                Inbound::Record(control) => control,
            };

            let phase = self.game.write().await.begin_tick(self.slot, control.ready);
            self.enter(phase);

            let actions = match self.recv_record::<ActionState>("reading actions").await? {
                Inbound::Leave => return Ok(()),
                Inbound::Record(actions) => actions,
            };

            let now = Instant::now();
            let dt = capped_delta(last_tick, now, simulation.max_delta);
            last_tick = Some(now);
            let player_vel = match phase {
                ConnectionPhase::Active => scaled_velocity(simulation.player_rate, dt),
                _ => 0,
            };

            let update = self
                .game
                .write()
                .await
                .play_tick(self.slot, &actions, player_vel, now);
            self.enter(ConnectionPhase::of(&update.state, self.slot));

            self.send_update(&update).await?;
        }
    }

    async fn handshake(&mut self) -> Result<(), SessionError> {
        let greeting = self.recv_text().await?;
        if greeting != GREETING {
            return Err(SessionError::ProtocolViolation {
                stage: "handshake",
                detail: format!("expected {GREETING:?}, got {greeting:?}"),
            });
        }

        self.stream.send_json(&AddrRecord::from(self.addr)).await?;
        self.enter(ConnectionPhase::WaitingReady);
        Ok(())
    }

    async fn send_update(&mut self, update: &TickUpdate) -> Result<(), SessionError> {
        self.stream.send_json(&update.state).await?;
        self.stream.send_json(&update.own_lasers).await?;
        self.stream.send_json(&update.opponent_lasers).await?;
        self.stream.send_json(&update.enemies).await?;
        Ok(())
    }

    async fn recv_text(&mut self) -> Result<String, SessionError> {
        let limit = self.config.client_timeout;
        match timeout(limit, self.stream.recv_text()).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(SessionError::TimedOut(limit)),
        }
    }

    async fn recv_record<T: DeserializeOwned>(
        &mut self,
        stage: &'static str,
    ) -> Result<Inbound<T>, SessionError> {
        let text = self.recv_text().await?;
        if text == DISCONNECT_MESSAGE {
            return Ok(Inbound::Leave);
        }

        serde_json::from_str(&text)
            .map(Inbound::Record)
            .map_err(|e| SessionError::ProtocolViolation {
                stage,
                detail: e.to_string(),
            })
    }

    fn enter(&mut self, phase: ConnectionPhase) {
        if phase != self.phase {
            debug!(
                "{} ({}): {:?} -> {:?}",
                self.addr, self.slot, self.phase, phase
            );
            self.phase = phase;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use shared::{MatchState, Slot};
    use std::time::Duration;
    use tokio::io::{duplex, DuplexStream};

    fn addr() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn fast_config() -> Arc<ServerConfig> {
        Arc::new(ServerConfig {
            tick_rate: 1000,
            client_timeout: Duration::from_millis(500),
            ..ServerConfig::default()
        })
    }

    async fn spawn_handler(
        config: Arc<ServerConfig>,
    ) -> (FramedStream<DuplexStream>, Arc<RwLock<GameState>>) {
        let game = Arc::new(RwLock::new(GameState::with_seed(
            SimulationConfig::default(),
            9,
        )));
        let slot = game
            .write()
            .await
            .connect(addr(), Instant::now())
            .unwrap();

        let (client, server) = duplex(64 * 1024);
        let handler = ConnectionHandler::new(
            FramedStream::new(server),
            addr(),
            slot,
            Arc::clone(&game),
            config,
        );
        tokio::spawn(handler.run());
        (FramedStream::new(client), game)
    }

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut bytes = shared::framing::encode_header(payload.len()).to_vec();
        bytes.extend_from_slice(payload);
        bytes
    }

    #[tokio::test]
    async fn test_session_over_mock_stream() {
        let game = Arc::new(RwLock::new(GameState::with_seed(
            SimulationConfig::default(),
            9,
        )));
        let slot = game
            .write()
            .await
            .connect(addr(), Instant::now())
            .unwrap();

        let reply = serde_json::to_vec(&AddrRecord::from(addr())).unwrap();
        let mock = tokio_test::io::Builder::new()
            .read(&frame(b"hello"))
            .write(&frame(&reply))
            .read(&frame(DISCONNECT_MESSAGE.as_bytes()))
            .build();

        let handler =
            ConnectionHandler::new(FramedStream::new(mock), addr(), slot, Arc::clone(&game), fast_config());
        assert_eq!(handler.phase(), ConnectionPhase::Handshake);
        handler.run().await;

        assert!(game.read().await.clients().is_empty());
    }

    #[tokio::test]
    async fn test_handshake_reports_identity() {
        let (mut client, _game) = spawn_handler(fast_config()).await;

        client.send_text(GREETING).await.unwrap();
        let record: AddrRecord = client.recv_json().await.unwrap();
        assert_eq!(record, AddrRecord::from(addr()));
    }

    #[tokio::test]
    async fn test_tick_sends_four_frames() {
        let (mut client, _game) = spawn_handler(fast_config()).await;
        client.send_text(GREETING).await.unwrap();
        let _: AddrRecord = client.recv_json().await.unwrap();

        client.send_json(&ControlRecord::connected(false)).await.unwrap();
        client.send_json(&ActionState::default()).await.unwrap();

        let state: MatchState = client.recv_json().await.unwrap();
        let own: Vec<shared::LaserRecord> = client.recv_json().await.unwrap();
        let opponent: Vec<shared::LaserRecord> = client.recv_json().await.unwrap();
        let enemies: Vec<shared::EnemyRecord> = client.recv_json().await.unwrap();

        assert!(state.user1.matches(addr()));
        assert!(state.user2.is_empty());
        assert!(!state.ready);
        assert!(own.is_empty() && opponent.is_empty() && enemies.is_empty());
    }

    #[tokio::test]
    async fn test_bad_greeting_frees_slot() {
        let (mut client, game) = spawn_handler(fast_config()).await;
        client.send_text("howdy").await.unwrap();

        assert!(client.recv_text().await.is_err());
        assert!(game.read().await.state().user1.is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_sentinel_frees_slot() {
        let (mut client, game) = spawn_handler(fast_config()).await;
        client.send_text(GREETING).await.unwrap();
        let _: AddrRecord = client.recv_json().await.unwrap();

        client.send_text(DISCONNECT_MESSAGE).await.unwrap();
        assert!(client.recv_text().await.is_err());
        assert!(game.read().await.clients().get(Slot::One).is_none());
    }

    #[tokio::test]
    async fn test_leave_record_frees_slot() {
        let (mut client, game) = spawn_handler(fast_config()).await;
        client.send_text(GREETING).await.unwrap();
        let _: AddrRecord = client.recv_json().await.unwrap();

        client.send_json(&ControlRecord::leaving()).await.unwrap();
        assert!(client.recv_text().await.is_err());
        assert!(game.read().await.state().user1.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_record_drops_client() {
        let (mut client, game) = spawn_handler(fast_config()).await;
        client.send_text(GREETING).await.unwrap();
        let _: AddrRecord = client.recv_json().await.unwrap();

        client.send_text("{not json").await.unwrap();
        assert!(client.recv_text().await.is_err());
        assert!(game.read().await.state().user1.is_empty());
    }

    #[tokio::test]
    async fn test_silent_client_times_out() {
        let config = Arc::new(ServerConfig {
            client_timeout: Duration::from_millis(50),
            ..ServerConfig::default()
        });
        let (mut client, game) = spawn_handler(config).await;
        client.send_text(GREETING).await.unwrap();
        let _: AddrRecord = client.recv_json().await.unwrap();

        assert!(client.recv_text().await.is_err());
        assert!(game.read().await.state().user1.is_empty());
    }
}
