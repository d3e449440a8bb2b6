// ─────────────────────────────────────────────────────────────────────────────
//  rubber-new  -  create a blank GameMaker project
//
//  USAGE
//  ─────
//    rubber-new path/to/folder        → path/to/folder/folder.yyp
//    rubber-new path/to/game.yyp
// ─────────────────────────────────────────────────────────────────────────────

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use log::LevelFilter;

use rubber::scaffold;

#[derive(Parser)]
#[command(
    name    = "rubber-new",
    version = env!("CARGO_PKG_VERSION"),
    about   = "Create a new GameMaker project",
)]
struct Cli {
    /// Target folder, or the .yyp file to create
    path: PathBuf,

    /// Print every file written
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose { LevelFilter::Debug } else { LevelFilter::Warn })
        .parse_default_env()
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let target = std::path::absolute(&cli.path)
        .with_context(|| format!("cannot resolve {}", cli.path.display()))?;
    let yyp = scaffold::descriptor_path(&target);

    println!("{} project at {}", "Generating".cyan().bold(), yyp.display());

    scaffold::make_blank_project(&yyp)
        .with_context(|| format!("failed to generate {}", yyp.display()))?;

    println!("{} finished", "✓".green().bold());
    println!(
        "  {}",
        "Not all metadata is generated yet; open the project in the IDE once before editing it.".dimmed()
    );
    Ok(())
}
