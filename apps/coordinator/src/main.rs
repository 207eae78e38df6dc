use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use tracing::warn;
use uno_coordinator::replica::{by_name, registered_bots, ReplicaHandle, ReplicaOptions};
use uno_coordinator::{
    build_coordinator, ChannelLink, CoordinatorError, ReadyRequest, SessionConfig,
    SessionCoordinator, SessionStatus,
};

mod telemetry;

const SEAT_NAMES: [&str; 8] = ["ana", "bo", "cy", "dee", "eli", "fay", "gus", "hal"];

/// Play one game between in-process bot replicas.
///
/// Session settings come from the `UNO_*` environment variables; flags
/// override them.
#[derive(Parser, Debug)]
#[command(name = "uno-coordinator", version)]
struct Cli {
    #[arg(long, default_value_t = 3)]
    players: usize,
    #[arg(long)]
    hand_size: Option<u8>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    turn_pause_ms: Option<u64>,
    #[arg(long)]
    ack_timeout_ms: Option<u64>,
    /// Bot seated at every replica.
    #[arg(long, default_value = "greedy")]
    bot: String,
    /// Give up after this many completed turns.
    #[arg(long, default_value_t = 1_000)]
    max_turns: u64,
    /// Give up when the session has not changed state for this long.
    #[arg(long, default_value_t = 30_000)]
    idle_timeout_ms: u64,
    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Summary {
    status: SessionStatus,
    hand_sizes: Vec<(String, usize)>,
    replicas_in_sync: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(summary) if summary.status.winner.is_some() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(2),
        Err(err) => {
            eprintln!("❌ {} ({})", err, err.code());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<Summary, CoordinatorError> {
    let config = load_config(&cli)?;
    let Some(factory) = by_name(&cli.bot) else {
        let known: Vec<_> = registered_bots().iter().map(|f| f.name).collect();
        return Err(CoordinatorError::config(format!(
            "Unknown bot '{}'; known bots: {}",
            cli.bot,
            known.join(", ")
        )));
    };
    if cli.players < 2 {
        return Err(CoordinatorError::config("At least 2 players are needed"));
    }

    let link = Arc::new(ChannelLink::new());
    let coordinator = build_coordinator()
        .with_config(config.clone())
        .with_link(link.clone())
        .build()?;

    let mut replicas = Vec::with_capacity(cli.players);
    for seat in 0..cli.players {
        let name = SEAT_NAMES
            .get(seat)
            .map(|n| n.to_string())
            .unwrap_or_else(|| format!("p{seat}"));
        let bot_seed = config.seed.map(|s| s.wrapping_add(seat as u64));
        let replica = ReplicaHandle::spawn(
            &coordinator,
            &link,
            &name,
            (factory.make)(bot_seed),
            ReplicaOptions::default(),
        )?;
        replicas.push(replica);
    }

    let shuffler = replicas[0].name().to_string();
    request_ready(&coordinator, &shuffler).await?;
    let status = coordinator
        .wait_for_end(cli.max_turns, Duration::from_millis(cli.idle_timeout_ms))
        .await;

    let authoritative = coordinator.snapshot();
    let replicas_in_sync = replicas.iter().all(|r| r.snapshot() == authoritative);
    if !replicas_in_sync {
        warn!("Replica tables diverged from the coordinator");
    }
    let summary = Summary {
        hand_sizes: authoritative
            .roster
            .iter()
            .cloned()
            .zip(authoritative.hands.iter().map(|h| h.len()))
            .collect(),
        status,
        replicas_in_sync,
    };

    for replica in replicas {
        replica.shutdown().await;
    }
    coordinator.shutdown();

    print_summary(&summary, cli.json);
    Ok(summary)
}

fn load_config(cli: &Cli) -> Result<SessionConfig, CoordinatorError> {
    let mut config = SessionConfig::from_env()?;
    if let Some(hand_size) = cli.hand_size {
        config.hand_size = hand_size;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if let Some(ms) = cli.turn_pause_ms {
        config.turn_pause = Duration::from_millis(ms);
    }
    if let Some(ms) = cli.ack_timeout_ms {
        config.ack_timeout = Duration::from_millis(ms);
    }
    config.validate()?;
    Ok(config)
}

/// Ready is refused while join acks are outstanding; retry until the join
/// barriers settle.
async fn request_ready(coordinator: &SessionCoordinator, shuffler: &str) -> Result<(), CoordinatorError> {
    let request = ReadyRequest {
        shuffler_name: shuffler.to_string(),
        shuffler_is_first_player: false,
    };
    loop {
        match coordinator.ready(shuffler, request.clone()) {
            Ok(()) => return Ok(()),
            Err(err) if err.is_retryable() => tokio::time::sleep(Duration::from_millis(20)).await,
            Err(err) => return Err(err),
        }
    }
}

fn print_summary(summary: &Summary, json: bool) {
    if json {
        match serde_json::to_string_pretty(summary) {
            Ok(text) => println!("{text}"),
            Err(err) => eprintln!("❌ Could not encode summary: {err}"),
        }
        return;
    }
    match &summary.status.winner {
        Some(winner) => println!(
            "🏆 {winner} won after {} turns",
            summary.status.decision_counter
        ),
        None => println!(
            "⏹ No winner after {} turns (state {})",
            summary.status.decision_counter, summary.status.state
        ),
    }
    for (player, cards) in &summary.hand_sizes {
        println!("   {player:<6} {cards:>3} cards");
    }
    println!(
        "   replicas {}",
        if summary.replicas_in_sync { "in sync" } else { "DIVERGED" }
    );
}
