//! meshcarve: batch volumetric mesh editing tools.
//!
//! Three one-shot pipelines:
//!
//! - `boolean` - combine two meshes through signed distance fields
//! - `offset` - grow or shrink one mesh by a distance
//! - `hole-fill` - delete a face selection and cap the holes
//!
//! # Logging
//!
//! Library crates log through `tracing`. Control output with `-v` flags or
//! the `RUST_LOG` environment variable:
//!
//! ```bash
//! RUST_LOG=mesh_sdf=debug meshcarve offset -d 2.0 part.stl
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{boolean, holefill, offset};

/// Batch solid/surface editing on triangle meshes through a volumetric
/// intermediate representation.
#[derive(Parser)]
#[command(name = "meshcarve")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase output verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Boolean operator selection.
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Operation {
    /// Keep everything in either solid.
    Union,
    /// Keep only the shared region.
    Intersection,
    /// Remove the second solid from the first.
    Difference,
}

#[derive(Subcommand)]
enum Commands {
    /// Combine two meshes with a volumetric boolean operation
    Boolean {
        /// First input mesh
        input: PathBuf,

        /// Second input mesh
        input2: PathBuf,

        /// Boolean operation to apply
        #[arg(long, value_enum, default_value = "union")]
        operation: Operation,

        /// Sampling rate: grid divisions across the geometry
        #[arg(long, short, default_value = "128")]
        detail: u32,

        /// Output path (default: <input>.operated.<ext>)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Write ASCII instead of binary output where the format allows
        #[arg(long)]
        ascii: bool,
    },

    /// Offset a mesh surface outward (or inward) by a distance
    Offset {
        /// Input mesh
        input: PathBuf,

        /// Offset distance; negative shrinks
        #[arg(long = "offset", short = 'd', default_value = "2.0", allow_hyphen_values = true)]
        distance: f64,

        /// Sampling rate: grid divisions across the geometry
        #[arg(long, default_value = "128")]
        detail: u32,

        /// Output path (default: <input>.operated.<ext>)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Write ASCII instead of binary output where the format allows
        #[arg(long)]
        ascii: bool,
    },

    /// Delete a face selection and fill the holes with smoothed caps
    #[command(name = "hole-fill")]
    HoleFill {
        /// Input mesh
        input: PathBuf,

        /// JSON array of face indices to delete
        #[arg(long, short)]
        selection: PathBuf,

        /// Target edge length for the fill geometry
        #[arg(long, default_value = "0.5")]
        detail: f64,

        /// Displacement vector as comma-separated floats, e.g. "0,0,1"
        #[arg(long, allow_hyphen_values = true)]
        displacement: Option<String>,

        /// Output path (default: <input>.operated.<ext>)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Write ASCII instead of binary output where the format allows
        #[arg(long)]
        ascii: bool,
    },
}

fn init_tracing(verbose: u8) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<()> = match &cli.command {
        Commands::Boolean {
            input,
            input2,
            operation,
            detail,
            output,
            ascii,
        } => boolean::run(input, input2, *operation, *detail, output.as_deref(), *ascii),
        Commands::Offset {
            input,
            distance,
            detail,
            output,
            ascii,
        } => offset::run(input, *distance, *detail, output.as_deref(), *ascii),
        Commands::HoleFill {
            input,
            selection,
            detail,
            displacement,
            output,
            ascii,
        } => holefill::run(
            input,
            selection,
            *detail,
            displacement.as_deref(),
            output.as_deref(),
            *ascii,
        ),
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red().bold());
        for cause in e.chain().skip(1) {
            eprintln!("  {}: {cause}", "caused by".yellow());
        }
        std::process::exit(1);
    }
}
