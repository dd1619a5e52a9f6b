//! Server and simulation settings.
//!
//! Every field has a default matching the stock game, so a bare
//! `ServerConfig::default()` serves a playable match on port 5050.

use shared::DEFAULT_MAX_FRAME_LEN;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5050;
pub const DEFAULT_TICK_RATE: u32 = 60;
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Tunables of the world simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Player speed in pixels per second
    pub player_rate: f32,
    /// Enemy descent speed in pixels per second
    pub enemy_rate: f32,
    /// Laser travel per tick in pixels
    pub laser_speed: i32,
    /// Longest frame time fed to the rate-based velocities
    pub max_delta: Duration,
    /// Each enemy fires with probability 1/N per advance; 0 never fires
    pub enemy_fire_chance: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            player_rate: 200.0,
            enemy_rate: 140.0,
            laser_speed: 10,
            max_delta: Duration::from_millis(50),
            enemy_fire_chance: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Ticks per second each connection handler runs at
    pub tick_rate: u32,
    pub max_frame_len: usize,
    /// How long a handler waits for the next frame before dropping the client
    pub client_timeout: Duration,
    pub simulation: SimulationConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{DEFAULT_PORT}"),
            tick_rate: DEFAULT_TICK_RATE,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            client_timeout: DEFAULT_CLIENT_TIMEOUT,
            simulation: SimulationConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:5050");
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.max_frame_len, 1024 * 1024);
        assert_eq!(config.client_timeout, Duration::from_secs(5));
        assert_eq!(config.simulation.laser_speed, 10);
        assert_eq!(config.simulation.enemy_fire_chance, 0);
    }

    #[test]
    fn test_tick_duration() {
        let config = ServerConfig::default();
        assert_approx_eq!(config.tick_duration().as_secs_f64(), 1.0 / 60.0, 1e-6);

        let stalled = ServerConfig {
            tick_rate: 0,
            ..ServerConfig::default()
        };
        assert_approx_eq!(stalled.tick_duration().as_secs_f64(), 1.0, 1e-9);
    }
}
