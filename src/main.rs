use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use gitid::{
    app::App,
    cli::{Cli, Commands},
    commands,
    config::AppConfig,
    error::AppError,
    menu::run_menu,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("{}", err.to_string().red());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = AppConfig::resolve(&cli.global)?;
    let app = App::new(config);

    match cli.command {
        Some(Commands::Switch { name }) => commands::switch_identity(&app, &name).await,
        Some(Commands::Add { name, username, email }) => {
            commands::add_identity(&app, &name, &username, &email)
        }
        Some(Commands::Delete { name }) => commands::delete_identity(&app, &name),
        Some(Commands::Current) => commands::show_current_identity(&app).await,
        Some(Commands::List) => commands::list_all_identities(&app),
        Some(Commands::Wizard { json: true }) => commands::serve_wizard(&app).await,
        Some(Commands::Wizard { json: false }) => commands::run_wizard(&app).await,
        None => run_menu(&app).await,
    }
}

/// Logs go to stderr so the wizard's JSON mode keeps stdout clean
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
