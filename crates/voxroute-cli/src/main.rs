//! Voxroute console entry point.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use voxroute_cli::app::App;
use voxroute_cli::cli::{Cli, Commands};
use voxroute_cli::commands;
use voxroute_cli::console::Console;
use voxroute_cli::error::Result;
use voxroute_core::RouterSettings;

fn main() {
    // .env.local may carry backend URLs
    voxroute_core::load_env_files();

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string()));

    fmt().with_env_filter(filter).with_target(false).init();

    let result = match &cli.command {
        None | Some(Commands::Console) => run_console(&cli),
        Some(cmd) => commands::execute(&cli, cmd),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_console(cli: &Cli) -> Result<()> {
    let settings = RouterSettings::from_env()?;
    if cli.state_dir.is_none() {
        voxroute_core::ensure_all_dirs()?;
    }
    let state_dir = cli.state_dir();

    let runtime = tokio::runtime::Runtime::new()?;
    let app = {
        let _guard = runtime.enter();
        App::build(&settings, &state_dir, &cli.audit_dir(), cli.offline)?
    };

    Console::new(runtime, app, state_dir.join("console_history.txt"))?.run()
}
