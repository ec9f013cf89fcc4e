//! planning-poker: run a game from the terminal, one card per line.
//!
//! Lines read from stdin:
//!   <card>   0 1 2 3 5 8 13 20 40 100, pause, abstain
//!   /pause   suspend the game and write its snapshot
//!   /turn    show whose turn it is
//!   /conclude  validate an open discussion whose timed write failed
//!   /quit    leave without saving

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use poker_engine::domain::{GameMode, GameStatus};
use poker_runtime::feature_import::load_feature_list;
use poker_runtime::telemetry::init_tracing;
use poker_runtime::{FileStore, GameHub, Receipt, RuntimeConfig, Session};

#[derive(Parser)]
#[command(name = "planning-poker")]
#[command(about = "Estimate a backlog with planning poker")]
struct Args {
    /// Directory holding snapshots and exports (overrides POKER_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Seconds between announcing an average and validating it
    #[arg(long, global = true)]
    discussion_delay: Option<u64>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Create a game from a backlog file and start voting
    Play {
        #[arg(long)]
        game: String,
        #[arg(long)]
        admin: String,
        /// Seat order; the admin is seated last if not listed
        #[arg(long = "participant")]
        participants: Vec<String>,
        #[arg(long, default_value = "strict")]
        mode: GameMode,
        /// JSON array of {name, description}
        #[arg(long)]
        backlog: PathBuf,
    },
    /// Reload a paused game from the data directory and continue
    Resume {
        #[arg(long)]
        game: String,
        #[arg(long)]
        admin: String,
        /// Only used for snapshots written before the mode was saved
        #[arg(long)]
        mode: Option<GameMode>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    let mut config = RuntimeConfig::from_env()?;
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(secs) = args.discussion_delay {
        config.discussion_delay = Duration::from_secs(secs);
    }
    let store = Arc::new(FileStore::new(config.data_dir.clone()));
    let hub = GameHub::from_config(&config);

    let game = match args.command {
        Cmd::Play {
            game,
            admin,
            participants,
            mode,
            backlog,
        } => {
            let features = load_feature_list(&backlog)?;
            let session = Session::create(&game, &admin, &participants, mode, features, store)?;
            hub.insert(session)?;
            report(&hub.launch(&game).await?);
            game
        }
        Cmd::Resume { game, admin, mode } => {
            let mode = mode.unwrap_or_default();
            let session = Session::create(&game, &admin, &[], mode, Vec::new(), store)?;
            hub.insert(session)?;
            let receipt = hub.resume_from_store(&game).await?;
            info!(game = %game, mode = %hub.view(&game).await?.game.mode, "game resumed");
            report(&receipt);
            game
        }
    };
    info!(game = %game, data_dir = %config.data_dir.display(), "session started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match hub.view(&game).await?.status() {
            GameStatus::Finished | GameStatus::Paused => break,
            _ => {}
        }
        print_turn(&hub, &game).await;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let outcome = match line.trim() {
            "" => continue,
            "/quit" => break,
            "/turn" => continue,
            "/pause" => hub.pause(&game).await,
            "/conclude" => hub.conclude_discussion(&game).await,
            card => hub.cast_vote(&game, card).await,
        };
        match outcome {
            Ok(receipt) => {
                report(&receipt);
                wait_for_discussion(&hub, &game).await;
            }
            Err(err) => {
                error!(game = %game, kind = ?err.kind(), error = %err, "command failed");
                println!("rejected: {err}");
            }
        }
    }
    Ok(())
}

async fn print_turn(hub: &GameHub, game: &str) {
    if let Ok(turn) = hub.current_turn_info(game).await {
        let feature = turn
            .current_feature
            .map(|f| f.name)
            .unwrap_or_else(|| "-".to_string());
        println!("[{}] {} votes on {}", turn.status, turn.current_participant, feature);
    }
}

fn report(receipt: &Receipt) {
    if let Some(round) = &receipt.result.round {
        println!("round: {}", round.label());
    }
    if let Some(path) = &receipt.written {
        println!("saved {}", path.display());
    }
}

async fn wait_for_discussion(hub: &GameHub, game: &str) {
    if !hub.has_pending_discussion(game) {
        return;
    }
    println!(
        "discussion open, validating in {}s",
        hub.discussion_delay().as_secs()
    );
    while hub.has_pending_discussion(game) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    if let Some(failure) = hub.discussion_failure(game) {
        println!("validation not saved: {failure}");
        println!("type /conclude to retry");
    }
}
