use clap::Parser;
use client::game;
use client::input::RandomInput;
use client::network::Client;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Probability of pressing a lane on any given tick
    #[arg(short = 'p', long, default_value = "0.08")]
    press_chance: f64,

    /// RNG seed for reproducible sessions (random if omitted)
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    info!("Connecting to {}", args.server);

    let mut sim_rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let input = RandomInput::new(StdRng::seed_from_u64(sim_rng.gen()), args.press_chance);

    let mut client = Client::connect(&args.server).await?;
    let session = client.session();

    client.run(input, sim_rng).await;

    let snapshot = game::lock(&session).snapshot();
    info!(
        "Final standings: you {} pts / {:.0} hp ({} perfects), opponent {} pts / {:.0} hp",
        snapshot.local_score,
        snapshot.local_health,
        snapshot.local_perfects,
        snapshot.remote_score,
        snapshot.remote_health
    );

    Ok(())
}
