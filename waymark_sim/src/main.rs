//! Run a Scout and a Collector through a tile world and print what happened.
//!
//! Examples:
//!   waymark-sim
//!   waymark-sim --world maze.json --turns 200 --seed 7
//!   waymark-sim --render
//!
//! Without `--world` the built-in two-room world is used. Set `RUST_LOG=debug`
//! for a per-tick trace.

use std::process;

use tracing::info;
use waymark::agent::Role;
use waymark_sim::{Session, SimError, World, WorldSpec};

struct Args {
    world: Option<String>,
    turns: Option<u32>,
    seed: u64,
    render: bool,
}

fn usage() -> ! {
    eprintln!("waymark-sim: two agents exploring a tile world\n");
    eprintln!("Usage: waymark-sim [options]\n");
    eprintln!("Options:");
    eprintln!("  --world <file.json>   World to load (rows, start, view_distance, max_turns)");
    eprintln!("  --turns <n>           Override the turn budget");
    eprintln!("  --seed <n>            Seed for tie-breaks and fallback moves (default 1)");
    eprintln!("  --render              Print both agents' memories at the end");
    eprintln!("  --help                Show this message");
    process::exit(1);
}

fn parse_args() -> Result<Args, SimError> {
    let mut args = Args {
        world: None,
        turns: None,
        seed: 1,
        render: false,
    };

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--world" => args.world = Some(value(&mut it, "--world")?),
            "--turns" => {
                let v = value(&mut it, "--turns")?;
                let turns = v
                    .parse()
                    .map_err(|_| SimError::Args(format!("--turns expects a number, got {v:?}")))?;
                args.turns = Some(turns);
            }
            "--seed" => {
                let v = value(&mut it, "--seed")?;
                args.seed = v
                    .parse()
                    .map_err(|_| SimError::Args(format!("--seed expects a number, got {v:?}")))?;
            }
            "--render" => args.render = true,
            "--help" | "-h" => usage(),
            other => return Err(SimError::Args(format!("unknown argument {other:?}"))),
        }
    }
    Ok(args)
}

fn value(it: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, SimError> {
    it.next()
        .ok_or_else(|| SimError::Args(format!("{flag} needs a value")))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            usage();
        }
    };

    let spec = match &args.world {
        Some(path) => WorldSpec::load(path)?,
        None => WorldSpec::builtin(),
    };
    let max_turns = args.turns.unwrap_or(spec.max_turns);
    let world = World::from_spec(&spec)?;
    info!(
        w = world.w(),
        h = world.h(),
        goals = world.goals_left(),
        max_turns,
        seed = args.seed,
        "starting session"
    );

    let mut session = Session::new(world, spec.start, max_turns, args.seed);
    let summary = session.run();

    if args.render {
        for role in [Role::Scout, Role::Collector] {
            if let Some(text) = session.render(role) {
                println!("{text}");
            }
        }
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
