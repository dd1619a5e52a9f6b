use clap::Parser;
use log::{error, info};
use server::{Server, ServerConfig, SimulationConfig};
use std::time::Duration;

/// Authoritative server for the two-player space duel
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Address to bind to
    #[clap(short = 'H', long, env = "SPACE_DUEL_HOST", default_value = "0.0.0.0")]
    host: String,
    /// Port to listen on
    #[clap(short, long, env = "SPACE_DUEL_PORT", default_value = "5050")]
    port: u16,
    /// Ticks per second for every connection
    #[clap(short, long, default_value = "60")]
    tick_rate: u32,
    /// Milliseconds to wait for a client frame before dropping the client
    #[clap(long, default_value = "5000")]
    client_timeout_ms: u64,
    /// Largest accepted frame payload in bytes
    #[clap(long, default_value = "1048576")]
    max_frame_len: usize,
    /// Player speed in pixels per second
    #[clap(long, default_value = "200")]
    player_rate: f32,
    /// Enemy descent speed in pixels per second
    #[clap(long, default_value = "140")]
    enemy_rate: f32,
    /// Laser travel per tick in pixels
    #[clap(long, default_value = "10")]
    laser_speed: i32,
    /// Longest frame time in milliseconds used for movement
    #[clap(long, default_value = "50")]
    max_delta_ms: u64,
    /// Enemy fire odds per advance (1 in N), 0 disables enemy fire
    #[clap(long, default_value = "0")]
    enemy_fire_chance: u32,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            bind_addr: format!("{}:{}", args.host, args.port),
            tick_rate: args.tick_rate,
            max_frame_len: args.max_frame_len,
            client_timeout: Duration::from_millis(args.client_timeout_ms),
            simulation: SimulationConfig {
                player_rate: args.player_rate,
                enemy_rate: args.enemy_rate,
                laser_speed: args.laser_speed,
                max_delta: Duration::from_millis(args.max_delta_ms),
                enemy_fire_chance: args.enemy_fire_chance,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    info!("[STARTING] server is starting...");

    let server = Server::bind(ServerConfig::from(args)).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
