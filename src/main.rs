// ─────────────────────────────────────────────────────────────────────────────
//  rubber  -  build GameMaker projects from the command line
//
//  USAGE
//  ─────
//    rubber                                 test-run the project in .
//    rubber game/ out.zip -Z                package for Windows
//    rubber game.yyp out.exe -I --yyc       Windows installer, YYC
//    rubber game.yyp -p mac --target-device-name mini
//    rubber game.yyp --clear                drop the project's build cache
// ─────────────────────────────────────────────────────────────────────────────

use std::path::{Path, PathBuf};

use clap::Parser;
use colored::Colorize;
use log::LevelFilter;

use rubber::build::launch;
use rubber::{cache, project};
use rubber::{
    assemble, BuildEnvironment, BuildKind, BuildRequest, Platform, Result, RubberError, Settings,
};

// ─────────────────────────────────────────────────────────────────────────────
//  CLI definition (clap derive)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name    = "rubber",
    version = env!("CARGO_PKG_VERSION"),
    about   = "Build GameMaker projects without opening the IDE",
    long_about = None,
)]
struct Cli {
    /// Project file (.yyp) or a directory containing one
    #[arg(default_value = ".")]
    project: PathBuf,

    /// Output file for zip / installer builds
    output: Option<String>,

    /// Create a zip archive
    #[arg(short = 'Z', long, conflicts_with = "installer")]
    zip: bool,

    /// Create an installer package (Windows only)
    #[arg(short = 'I', long)]
    installer: bool,

    /// Compile with YYC instead of the VM
    #[arg(short = 'y', long)]
    yyc: bool,

    /// IDE configuration to build
    #[arg(short = 'c', long)]
    config: Option<String>,

    /// Clear the project's build cache and exit
    #[arg(long)]
    clear: bool,

    /// Clear the remote build client's cache
    #[arg(long)]
    clear_remote: bool,

    /// Export platform
    #[arg(short = 'p', long, value_enum)]
    platform: Option<Platform>,

    /// Same as --platform linux
    #[arg(short = 'l', long, conflicts_with = "platform")]
    linux: bool,

    /// Alternative GameMaker install directory
    #[arg(long, value_name = "PATH")]
    gms_dir: Option<PathBuf>,

    /// Alternative GameMaker ProgramData directory
    #[arg(long, value_name = "PATH")]
    gms_data_dir: Option<PathBuf>,

    /// Runtime to use (default: the active one)
    #[arg(long, value_name = "NAME")]
    runtime: Option<String>,

    /// Runtime directory, bypassing the runtime index
    #[arg(long, value_name = "PATH")]
    runtime_location: Option<String>,

    /// Target device config file
    #[arg(long, value_name = "PATH")]
    device_config_dir: Option<PathBuf>,

    /// Target device (default: the first one listed)
    #[arg(long, value_name = "NAME")]
    target_device_name: Option<String>,

    /// Use the early-access IDE
    #[arg(long)]
    ea: bool,

    /// Enable the debugger on this port
    #[arg(long, value_name = "PORT")]
    debug: Option<u16>,

    /// Wait for the compiler and exit with its status
    #[arg(long)]
    wait: bool,

    /// Verbose compiler and log output
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Suppress progress output
    #[arg(long)]
    quiet: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
//  Entry point
// ─────────────────────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    env_logger::Builder::new()
        .filter_level(if cli.verbose { LevelFilter::Debug } else { LevelFilter::Warn })
        .parse_default_env()
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load()?;
    let env = BuildEnvironment::from_process(&settings);

    let project_file = find_project(&cli.project)?;

    if cli.clear {
        let dir = cache::clear(&env, &project_file)?;
        if !cli.quiet {
            println!("{} cleared project cache {}", "✓".green().bold(), dir.display().to_string().dimmed());
        }
        return Ok(());
    }

    let req = request(&cli, project_file);
    let plan = assemble(&req, &env)?;

    if !cli.quiet {
        println!(
            "{} {} {} {}",
            if req.clean_remote { "Cleaning".cyan().bold() } else { "Building".cyan().bold() },
            format!("[{}]", req.project_path.display()).dimmed(),
            format!("[platform: {}]", req.platform).dimmed(),
            format!("[{} {}]", plan.component, plan.action).dimmed(),
        );
        if let Some(device) = &plan.device {
            println!("  {} {}", "device:".dimmed(), device);
        }
        println!("  {} {}", "runtime:".dimmed(), plan.runtime_location);
        println!("  {} {}", "scratch:".dimmed(), plan.scratch_dir.display());
        println!("{}", "─".repeat(60).dimmed());
    }

    plan.materialize()?;
    let child = launch::launch(&plan.invocation)?;

    if cli.wait {
        launch::wait_for(child)?;
        if !cli.quiet {
            println!("{} compiler finished", "✓".green().bold());
        }
    } else {
        log::warn!("compiler launched detached; its exit status is not checked (use --wait)");
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
//  Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn find_project(path: &Path) -> Result<PathBuf> {
    let path = if path.is_absolute() { path.to_path_buf() } else { std::env::current_dir()?.join(path) };

    if !path.exists() {
        return Err(RubberError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Project does not exist at {}", path.display()),
        )));
    }

    project::find_project(&path).ok_or_else(|| {
        RubberError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Project at {} is invalid, or in a newer format", path.display()),
        ))
    })
}

fn request(cli: &Cli, project_file: PathBuf) -> BuildRequest {
    let platform = cli.platform
        .unwrap_or(if cli.linux { Platform::Linux } else { Platform::Windows });

    let kind = if cli.zip {
        BuildKind::Zip
    } else if cli.installer {
        BuildKind::Installer
    } else {
        BuildKind::Test
    };

    let mut req = BuildRequest::new(project_file, platform, kind);
    req.output_path      = cli.output.clone().unwrap_or_default();
    req.yyc              = cli.yyc;
    req.debug_port       = cli.debug;
    req.verbose          = cli.verbose;
    req.early_access     = cli.ea;
    req.config           = cli.config.clone();
    req.runtime          = cli.runtime.clone();
    req.runtime_location = cli.runtime_location.clone();
    req.install_dir      = cli.gms_dir.clone();
    req.data_dir         = cli.gms_data_dir.clone();
    req.device_config    = cli.device_config_dir.clone();
    req.target_device    = cli.target_device_name.clone();
    req.clean_remote     = cli.clear_remote;
    req
}
