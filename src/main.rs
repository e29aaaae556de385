use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tidewater::ascii;
use tidewater::config::VoyageConfig;
use tidewater::record::{load_record, save_record};
use tidewater::route::arrival_time;
use tidewater::voyage::{Voyage, VoyageEvent};

#[derive(Parser, Debug)]
#[command(name = "tidewater")]
#[command(about = "Plan tide-aware sea routes across a procedural archipelago")]
struct Args {
    /// Voyage configuration JSON (builtin parameters if not specified)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Terrain seed, overriding the configuration
    #[arg(short, long)]
    seed: Option<u32>,

    /// Ship column as "x,z" (configured position if not specified). A loaded
    /// voyage keeps its saved ship position, so this cannot be combined with --load
    #[arg(long, value_parser = parse_column, allow_hyphen_values = true, conflicts_with = "load")]
    from: Option<(i32, i32)>,

    /// Destination column as "x,z"
    #[arg(long, value_parser = parse_column, allow_hyphen_values = true)]
    to: Option<(i32, i32)>,

    /// Game time in seconds at which the ship departs
    #[arg(short, long, default_value = "0")]
    time: f64,

    /// Print an ASCII chart of this radius around the ship
    #[arg(long)]
    chart: Option<i32>,

    /// Save the voyage to this file afterwards
    #[arg(long)]
    save: Option<PathBuf>,

    /// Resume a voyage saved with --save
    #[arg(long)]
    load: Option<PathBuf>,
}

fn parse_column(s: &str) -> Result<(i32, i32), String> {
    let (x, z) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"x,z\", got \"{}\"", s))?;
    let x = x.trim().parse().map_err(|e| format!("bad x in \"{}\": {}", s, e))?;
    let z = z.trim().parse().map_err(|e| format!("bad z in \"{}\": {}", s, e))?;
    Ok((x, z))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => VoyageConfig::from_file(path)?,
        None => VoyageConfig::builtin()?,
    };
    if let Some(seed) = args.seed {
        config.stage.seed = seed;
    }
    if let Some((x, z)) = args.from {
        config.ship.position = [x, 0, z];
    }

    let mut voyage = match &args.load {
        Some(path) => {
            let record = load_record(path)?;
            println!("Resuming voyage from {}", path.display());
            Voyage::restore(config, record)
        }
        None => {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0);
            Voyage::new(config, now)
        }
    };

    println!("Terrain seed: {}", voyage.config().stage.seed);
    if let Some(VoyageEvent::Arrived { position, at }) = voyage.update(args.time) {
        println!("Ship arrived at {} (t={:.2}s)", position, at);
    }
    println!(
        "Ship at {}, sea level {:.2} at t={:.2}s",
        voyage.ship_cell(),
        voyage.sea_level(args.time),
        args.time
    );

    if let Some((x, z)) = args.to {
        if voyage.plan_route(x, z, args.time) {
            let route = voyage.navigator().route();
            println!("Route found: {} waypoints", route.len());
            if let Some(arrival) = arrival_time(route) {
                println!("Arrival at t={:.2}s", arrival);
            }
            for (i, waypoint) in route.iter().enumerate() {
                println!(
                    "  {:>4}  {:<16} t={:>9.2}s  sea={:>5.2}",
                    i,
                    waypoint.position.to_string(),
                    waypoint.duration,
                    voyage.sea_level(waypoint.duration)
                );
            }
        } else {
            println!("No route to ({}, {}) from {}", x, z, voyage.ship_cell());
        }
    }

    if let Some(radius) = args.chart {
        let tide = *voyage.tide();
        let ship = voyage.ship_cell();
        let route = voyage.navigator().route().to_vec();
        let chart = ascii::render_chart(voyage.stage_mut(), &tide, ship, radius.max(0), args.time, Some(ship), &route);
        println!();
        print!("{}", chart);
        println!("{}", ascii::chart_legend());
    }

    println!("{}", voyage.stage().stats().summary());

    if let Some(path) = &args.save {
        save_record(&voyage.record(), path)?;
        println!("Saved voyage to {}", path.display());
    }

    Ok(())
}
