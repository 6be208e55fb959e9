//! Mirage CLI - evolve, run and replay grid-world survival agents.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::brains::BrainKind;
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "mirage")]
#[command(author, version, about = "Mirage - neuroevolution in a replayable grid world", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new Mirage project
    Init {
        /// Project directory (default: current directory)
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Generate and render a world
    World {
        /// Override the configured seed
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Run and score one episode
    Episode {
        /// Brain driving every agent
        #[arg(short, long, value_enum, default_value = "seeker")]
        brain: BrainKind,

        /// Genome file for --brain genome
        #[arg(short, long)]
        genome: Option<PathBuf>,

        /// Override the configured seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Override ticks per episode
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Render the final state
        #[arg(short, long)]
        render: bool,
    },

    /// Evolve a population
    Train {
        /// Override the configured generation count
        #[arg(short, long)]
        generations: Option<u64>,

        /// Output root for run directories
        #[arg(short, long, default_value = "runs")]
        out: PathBuf,

        /// Continue from a checkpoint file
        #[arg(long)]
        resume: Option<PathBuf>,

        /// Evaluate genomes on one thread
        #[arg(long)]
        sequential: bool,

        /// Size of a dedicated evaluation thread pool
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Record or verify replays
    Replay {
        #[command(subcommand)]
        command: ReplayCommands,
    },
}

#[derive(Subcommand)]
enum ReplayCommands {
    /// Record an episode to a replay file
    Record {
        /// Output file
        output: PathBuf,

        #[arg(short, long, value_enum, default_value = "seeker")]
        brain: BrainKind,

        #[arg(short, long)]
        genome: Option<PathBuf>,

        #[arg(short, long)]
        seed: Option<u64>,

        #[arg(short, long)]
        ticks: Option<u64>,
    },

    /// Re-run a replay and compare every tick
    Verify {
        /// Replay file
        input: PathBuf,

        /// Brain to re-run with (default: the one named in the replay)
        #[arg(short, long, value_enum)]
        brain: Option<BrainKind>,

        #[arg(short, long)]
        genome: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { path } => commands::init::run(path),
        Commands::World { seed } => commands::world::run(seed),
        Commands::Episode {
            brain,
            genome,
            seed,
            ticks,
            json,
            render,
        } => commands::episode::run(
            commands::episode::EpisodeArgs {
                brain,
                genome: genome.as_deref(),
                seed,
                ticks,
                json,
                render,
            },
            cli.verbose,
        ),
        Commands::Train {
            generations,
            out,
            resume,
            sequential,
            threads,
        } => commands::train::run(commands::train::TrainArgs {
            generations,
            out,
            resume,
            sequential,
            threads,
        }),
        Commands::Replay { command } => match command {
            ReplayCommands::Record {
                output,
                brain,
                genome,
                seed,
                ticks,
            } => commands::replay::record_cmd(&output, brain, genome.as_deref(), seed, ticks),
            ReplayCommands::Verify {
                input,
                brain,
                genome,
            } => commands::replay::verify_cmd(&input, brain, genome.as_deref()),
        },
    }
}
