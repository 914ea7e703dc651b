//! minigo compiler CLI.
//!
//! # Commands
//!
//! - `minigo build <files|dirs>` - Compile packages to pseudo-assembly
//! - `minigo check <files|dirs>` - Analyze without generating code
//! - `minigo parse <file>` - Dump the syntax tree of one file
//! - `minigo tokens <file>` - Dump the tokens of one file
//!
//! # Examples
//!
//! ```text
//! minigo build main.go -o main.s
//! minigo build ./cmd/app --stdlib ./stdlib --emit-position
//! minigo -v check ./cmd/app
//! ```

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod loader;

#[derive(Parser)]
#[command(name = "minigo")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compiler for a subset of Go emitting pseudo-assembly", long_about = None)]
#[command(after_help = "Use 'minigo <command> --help' for more information about a command.")]
struct Cli {
    /// Log more (-v debug, -vv trace). RUST_LOG is used when absent.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile packages to pseudo-assembly
    ///
    /// Every package named on the command line is compiled together with
    /// the standard packages it imports. The output starts with the data
    /// section, followed by the functions and the `main` entry.
    #[command(after_help = "Examples:\n  minigo build main.go\n  minigo build ./app -o app.s --stdlib ./stdlib")]
    Build(BuildArgs),

    /// Parse and analyze packages without generating code
    Check(LoadArgs),

    /// Print the syntax tree of a file
    Parse {
        /// Source file
        file: PathBuf,
    },

    /// Print the tokens of a file, one per line
    Tokens {
        /// Source file
        file: PathBuf,
    },
}

#[derive(Args)]
struct LoadArgs {
    /// Source files or package directories
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory holding standard packages, one subdirectory per import path
    #[arg(long, value_name = "DIR")]
    stdlib: Option<PathBuf>,
}

#[derive(Args)]
struct BuildArgs {
    #[command(flatten)]
    load: LoadArgs,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Prefix each instruction with its source position
    #[arg(long)]
    emit_position: bool,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Build(args) => commands::build::run(
            &args.load.inputs,
            args.load.stdlib.as_deref(),
            args.output.as_deref(),
            args.emit_position,
        ),
        Commands::Check(args) => commands::check::run(&args.inputs, args.stdlib.as_deref()),
        Commands::Parse { file } => commands::parse::run(&file),
        Commands::Tokens { file } => commands::tokens::run(&file),
    };

    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}
