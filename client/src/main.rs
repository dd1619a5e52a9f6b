use clap::Parser;
use client::game::ClientGameState;
use client::input::InputManager;
use client::network::Client;
use log::{info, warn};
use shared::DEFAULT_MAX_FRAME_LEN;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:5050")]
    server: String,

    /// Exchanges per second
    #[arg(short = 't', long, default_value = "60")]
    tick_rate: u32,

    /// Stop after this many ticks (0 runs until Ctrl+C)
    #[arg(short = 'n', long, default_value = "0")]
    ticks: u64,

    /// Lobby ticks to wait before pressing ready
    #[arg(short = 'r', long, default_value = "30")]
    ready_delay: u32,

    /// Seed for the scripted input
    #[arg(long)]
    seed: Option<u64>,
}

// Runs the bot until the tick limit or until `shutdown` resolves. Shutdown
// is only observed between ticks, so an exchange is never cut off halfway.
async fn play<F>(
    client: &mut Client,
    args: &Args,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: Future<Output = ()>,
{
    let mut view = ClientGameState::new(client.identity());
    let mut input = InputManager::new(args.ready_delay, args.seed);

    let mut ticker = interval(Duration::from_secs_f64(1.0 / f64::from(args.tick_rate.max(1))));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let mut tick = 0u64;
    while args.ticks == 0 || tick < args.ticks {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Shutdown requested, leaving");
                break;
            }
            _ = ticker.tick() => {}
        }

        let ready = input.ready_intent(&view);
        let actions = input.next_actions(&view);
        let update = client.exchange(ready, actions).await?;

        if let Some(screen) = view.apply_update(update) {
            info!("{:?} ({})", screen, view.level_label());
            if let Some(banner) = view.banner() {
                info!("{}", banner);
            }
        }
        tick += 1;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    info!("Connecting to: {}", args.server);

    let mut client = Client::connect(args.server.as_str(), DEFAULT_MAX_FRAME_LEN).await?;

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    play(&mut client, &args, ctrl_c).await?;

    client.leave().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{
        ActionState, AddrRecord, ControlRecord, EnemyRecord, FramedStream, LaserRecord,
        MatchState, GREETING,
    };
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    fn args() -> Args {
        Args {
            server: String::new(),
            tick_rate: 200,
            ticks: 0,
            ready_delay: 1,
            seed: Some(1),
        }
    }

    // Serves plain ticks until the client leaves, firing `stop` after the
    // second one. Every frame must parse, so a torn frame fails the test.
    async fn serve_until_leave(listener: TcpListener, stop: oneshot::Sender<()>) -> u32 {
        let (socket, peer) = listener.accept().await.unwrap();
        let mut stream = FramedStream::new(socket);
        assert_eq!(stream.recv_text().await.unwrap(), GREETING);
        stream.send_json(&AddrRecord::from(peer)).await.unwrap();

        let mut stop = Some(stop);
        let mut served = 0;
        loop {
            let control: ControlRecord = stream.recv_json().await.unwrap();
            if !control.connection {
                return served;
            }
            let _: ActionState = stream.recv_json().await.unwrap();

            stream.send_json(&MatchState::default()).await.unwrap();
            stream.send_json(&Vec::<LaserRecord>::new()).await.unwrap();
            stream.send_json(&Vec::<LaserRecord>::new()).await.unwrap();
            stream.send_json(&Vec::<EnemyRecord>::new()).await.unwrap();
            served += 1;

            if served == 2 {
                if let Some(stop) = stop.take() {
                    let _ = stop.send(());
                }
            }
        }
    }

    #[tokio::test]
    async fn test_shutdown_leaves_cleanly_between_ticks() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel();
        let server = tokio::spawn(serve_until_leave(listener, stop_tx));

        let mut client = Client::connect(addr, DEFAULT_MAX_FRAME_LEN).await.unwrap();
        let shutdown = async {
            let _ = stop_rx.await;
        };
        play(&mut client, &args(), shutdown).await.unwrap();
        client.leave().await.unwrap();

        assert!(server.await.unwrap() >= 2);
    }

    #[tokio::test]
    async fn test_shutdown_before_first_tick() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, _stop_rx) = oneshot::channel();
        let server = tokio::spawn(serve_until_leave(listener, stop_tx));

        let mut client = Client::connect(addr, DEFAULT_MAX_FRAME_LEN).await.unwrap();
        play(&mut client, &args(), async {}).await.unwrap();
        client.leave().await.unwrap();

        assert_eq!(server.await.unwrap(), 0);
    }
}
