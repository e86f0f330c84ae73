mod api;
mod logger;
mod nav;
mod session;
mod ui;
mod util;
mod vault;
mod version;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use directories::{BaseDirs, ProjectDirs};
use log::info;
use rollcall_config::doc::Document;
use rollcall_config::Config;

use crate::api::Api;
use crate::logger::Logger;
use crate::nav::NavStack;
use crate::session::SessionManager;
use crate::ui::{Ctx, Terminal};
use crate::vault::Vault;
use crate::version::{NAME, VERSION};

#[derive(Debug, Default, clap::Parser)]
enum Command {
    /// Run the client interactively (default).
    #[default]
    Run,
    /// Forget the stored login session and the server's cookies.
    Logout,
    /// Compact and clean up vault.
    Gc,
    /// Print config documentation as markdown.
    HelpConfig,
}

#[derive(Debug, clap::Parser)]
#[command(version)]
struct Args {
    /// Show more detailed log messages.
    #[arg(long, short)]
    verbose: bool,

    /// Path to the config file.
    ///
    /// Relative paths are interpreted relative to the current directory.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Path to a directory for rollcall to store its data in.
    ///
    /// Relative paths are interpreted relative to the current directory.
    #[arg(long, short)]
    data_dir: Option<PathBuf>,

    /// If set, rollcall won't remember the login session.
    #[arg(long, short)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

fn config_path(args: &Args, dirs: &ProjectDirs) -> PathBuf {
    args.config
        .clone()
        .unwrap_or_else(|| dirs.config_dir().join("config.toml"))
}

fn data_dir(config: &Config, dirs: &ProjectDirs) -> PathBuf {
    config
        .data_dir
        .clone()
        .unwrap_or_else(|| dirs.data_dir().to_path_buf())
}

fn update_config_with_args(config: &mut Config, args: &Args) -> anyhow::Result<()> {
    if let Some(data_dir) = args.data_dir.clone() {
        // Relative to the current directory, no resolving needed.
        config.data_dir = Some(data_dir);
    } else if let Some(data_dir) = &config.data_dir {
        // Relative to the user's home directory.
        let base_dirs = BaseDirs::new().context("failed to find home directory")?;
        config.data_dir = Some(base_dirs.home_dir().join(data_dir));
    }

    config.ephemeral |= args.ephemeral;
    Ok(())
}

fn open_vault(config: &Config, dirs: &ProjectDirs) -> anyhow::Result<Vault> {
    let vault = if config.ephemeral {
        vault::launch_in_memory()?
    } else {
        let data_dir = data_dir(config, dirs);
        eprintln!("Data dir:    {}", data_dir.to_string_lossy());
        vault::launch(&data_dir.join("vault.db"))?
    };

    Ok(vault)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let (logger, logger_guard) = Logger::init(args.verbose);
    let dirs = ProjectDirs::from("org", "rollcall", "rollcall")
        .context("failed to find config directory")?;

    // Locate config
    let config_path = config_path(&args, &dirs);
    eprintln!("Config file: {}", config_path.to_string_lossy());

    // Load config
    let mut config = Config::load(&config_path)
        .with_context(|| format!("failed to load {}", config_path.to_string_lossy()))?;
    update_config_with_args(&mut config, &args)?;
    let config = Box::leak(Box::new(config));

    match args.command.unwrap_or_default() {
        Command::Run => run(logger, config, &dirs).await?,
        Command::Logout => logout(config, &dirs).await?,
        Command::Gc => gc(config, &dirs).await?,
        Command::HelpConfig => help_config(),
    }

    // Errors are printed here so they survive leaving the terminal ui.
    drop(logger_guard);

    eprintln!("Goodbye!");
    Ok(())
}

async fn run(logger: Logger, config: &'static Config, dirs: &ProjectDirs) -> anyhow::Result<()> {
    info!("Welcome to {NAME} {VERSION}");

    let time_zone =
        util::load_time_zone(config.time_zone_ref()).context("failed to load time zone")?;

    let vault = open_vault(config, dirs)?;
    if vault.ephemeral() {
        info!("running in ephemeral mode, the session will be forgotten on exit");
    }

    let session = SessionManager::hydrate(Arc::new(vault.session()))
        .await
        .context("failed to load session")?;
    let api = Api::new(&config.api, session.clone(), vault.session()).await?;
    let mut terminal = Terminal::new()?;
    let mut nav = NavStack::for_session(&session.get());

    let mut ctx = Ctx {
        session: &session,
        backend: &api,
        prompt: &mut terminal,
        logger: &logger,
        time_zone: &time_zone,
    };
    ui::run(&mut ctx, &mut nav).await?;
    drop(terminal);

    vault.close().await;
    Ok(())
}

async fn logout(config: &'static Config, dirs: &ProjectDirs) -> anyhow::Result<()> {
    let vault = open_vault(config, dirs)?;

    eprintln!("Logging out");
    let session = SessionManager::hydrate(Arc::new(vault.session())).await?;
    session.logout().await?;
    vault.session().clear_cookies(None).await?;

    vault.close().await;
    Ok(())
}

async fn gc(config: &'static Config, dirs: &ProjectDirs) -> anyhow::Result<()> {
    let vault = open_vault(config, dirs)?;

    eprintln!("Cleaning up and compacting vault");
    eprintln!("This may take a while...");
    vault.gc().await?;

    vault.close().await;
    Ok(())
}

fn help_config() {
    print!("{}", Config::doc().as_markdown());
}
