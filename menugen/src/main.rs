use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use menugen::{codegen::GeneratorStyle, ctx::AppContext};

#[derive(Parser)]
#[command(name = "menugen")]
#[command(version)]
#[command(about = "Generate menu_navigator C sources and simulate menus", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (defaults to ./menugen.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a fresh menu file with a Main root
    New {
        /// Menu file to create
        file: PathBuf,
    },

    /// Generate C source from a menu file
    #[command(visible_alias = "gen")]
    Generate {
        /// Menu file
        file: PathBuf,

        /// Layout style (overrides the settings file)
        #[arg(short, long, value_enum)]
        style: Option<GeneratorStyle>,

        /// Output file (stdout if neither this nor the settings name one)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replay navigation keys and show the simulated display
    #[command(visible_alias = "sim")]
    Simulate {
        /// Menu file
        file: PathBuf,

        /// Keys to press: U, D, L, R
        #[arg(short, long, default_value = "")]
        keys: String,

        /// Show the display after every key
        #[arg(short, long)]
        trace: bool,
    },

    /// Print the menu tree
    Tree {
        /// Menu file
        file: PathBuf,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let workspace = std::env::current_dir()?;
    let ctx = AppContext::new(workspace, cli.config)?;

    match cli.command {
        Commands::New { file } => ctx.new_menu_file(&file),
        Commands::Generate {
            file,
            style,
            output,
        } => ctx.generate(&file, style, output),
        Commands::Simulate { file, keys, trace } => ctx.simulate(&file, &keys, trace),
        Commands::Tree { file } => ctx.print_tree(&file),
    }
}
