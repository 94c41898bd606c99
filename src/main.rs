use chrono::Local;
use clap::{Parser, Subcommand};
use feedsync::config::ClientConfig;
use feedsync::session::{MemorySessionStore, Session};
use feedsync::transport::TokioWebSocketTransportFactory;
use feedsync::types::events::Event;
use feedsync::types::toggle::ToggleableState;
use feedsync::{Client, LoadOutcome};
use feedsync_ureq_http_client::UreqHttpClient;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;

// Small driver for exercising a backend by hand.
//
// Usage:
//   cargo run -- --token T --user-id U explore --pages 3
//   cargo run -- --token T --user-id U like <post-id> --count 12
//   cargo run -- --token T --user-id U listen --seconds 60

#[derive(Parser)]
#[command(name = "feedsync")]
#[command(about = "Drive the feedsync client core against a backend")]
struct Cli {
    #[arg(long)]
    base_url: Option<String>,

    #[arg(long)]
    realtime_url: Option<String>,

    #[arg(long, env = "FEEDSYNC_TOKEN")]
    token: String,

    #[arg(long)]
    user_id: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Page through the explore feed.
    Explore {
        #[arg(long, default_value_t = 2)]
        pages: usize,
    },
    /// Toggle the like on a post, starting from the given state.
    Like {
        post_id: String,
        #[arg(long)]
        liked: bool,
        #[arg(long, default_value_t = 0)]
        count: u64,
    },
    /// Print unread counters pushed over the realtime channel.
    Listen {
        #[arg(long, default_value_t = 30)]
        seconds: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{:<5}] [{}] - {}",
                Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::default();
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(realtime_url) = cli.realtime_url {
        config = config.with_realtime_url(realtime_url);
    }

    let store = Arc::new(MemorySessionStore::with_session(Session::new(
        cli.token,
        cli.user_id.clone(),
    )));
    let client = Client::new(config, Arc::new(UreqHttpClient::new()), store);
    client.add_event_handler(Arc::new(|event: &Event| match event {
        Event::Notice(notice) => warn!("Notice: {notice}"),
        Event::ToggleUpdated(update) => info!(
            "{} on {}: {:?} -> liked={} count={}",
            update.kind, update.state.entity_id, update.phase, update.state.flag, update.state.count
        ),
        Event::CounterUpdated(update) => info!("{} = {}", update.counter, update.value),
        _ => {}
    }));

    match cli.command {
        Commands::Explore { pages } => explore(&client, pages).await,
        Commands::Like {
            post_id,
            liked,
            count,
        } => {
            let outcome = client
                .posts()
                .toggle_like(ToggleableState::new(post_id, liked, count))
                .await;
            match outcome.error() {
                Some(e) => error!("Like failed: {e}"),
                None => info!("Final state: {:?}", outcome.state()),
            }
        }
        Commands::Listen { seconds } => listen(&client, &cli.user_id, seconds).await?,
    }
    Ok(())
}

async fn explore(client: &Arc<Client>, pages: usize) {
    let feed = client.explore_feed();
    let mut outcome = feed.refresh().await;
    for _ in 1..pages {
        if !outcome.is_loaded() {
            break;
        }
        outcome = feed.load_more().await;
    }
    if let LoadOutcome::Failed(e) = &outcome {
        error!("Explore failed: {e}");
    }

    let snapshot = feed.snapshot().await;
    for post in &snapshot.items {
        info!(
            "{} by {} ({} likes): {}",
            post.id,
            post.user_id,
            post.likes.len(),
            post.caption
        );
    }
    info!(
        "Showing {} of {} loaded posts, more available: {}",
        snapshot.visible_count, snapshot.total, snapshot.has_more
    );
}

async fn listen(client: &Arc<Client>, user_id: &str, seconds: u64) -> Result<(), anyhow::Error> {
    let realtime = client.realtime(Arc::new(TokioWebSocketTransportFactory::new()));
    let mut unread = realtime.counter("unreadCount", "count");
    realtime.on("newNotification", |data| info!("Notification: {data}"));
    realtime.connect(user_id).await?;

    let deadline = tokio::time::sleep(Duration::from_secs(seconds));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            changed = unread.changed() => {
                if changed.is_err() {
                    break;
                }
                info!("Unread messages: {}", *unread.borrow_and_update());
            }
        }
    }

    realtime.disconnect().await;
    Ok(())
}
