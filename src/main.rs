use anyhow::{Context, Result, anyhow};
use beehive_chat::analytics::render_report;
use beehive_chat::common::Role;
use beehive_chat::config::{self, AppConfig};
use beehive_chat::network::{ApiClient, ApiWorker};
use beehive_chat::session::{ChatController, Timings};
use beehive_chat::terminal::run_terminal;
use beehive_chat::ui::ChatApp;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(
    name = "beehive_chat",
    version,
    about = "Admin/user support chat client"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Overrides the configured user id
    #[arg(long)]
    user_id: Option<String>,
    /// Overrides the configured role (admin or user)
    #[arg(long)]
    role: Option<Role>,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq, Default)]
enum Mode {
    /// Desktop chat window
    #[default]
    Gui,
    /// Line-mode chat on stdin/stdout
    Terminal,
    /// Print the admin analytics summary and exit
    Analytics,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config);
    app_config.apply_env();
    if let Some(user_id) = cli.user_id {
        app_config.user_id = Some(user_id);
    }
    if let Some(role) = cli.role {
        app_config.role = Some(role);
    }

    match cli.mode.unwrap_or_default() {
        Mode::Gui => run_gui(app_config).await,
        Mode::Terminal => {
            let participant = app_config.participant()?;
            run_terminal(&app_config, participant).await
        }
        Mode::Analytics => print_analytics(&app_config).await,
    }
}

async fn print_analytics(app_config: &AppConfig) -> Result<()> {
    let api = ApiClient::from_config(app_config)?;
    let report = api
        .fetch_analytics()
        .await
        .context("failed to load analytics")?;
    println!("{}", render_report(&report));
    Ok(())
}

async fn run_gui(app_config: AppConfig) -> Result<()> {
    let participant = app_config.participant()?;
    let api = ApiClient::from_config(&app_config)?;

    // UI -> network
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // network -> UI
    let (event_tx, event_rx) = mpsc::channel(100);

    tokio::spawn(ApiWorker::new(api, event_tx.clone(), cmd_rx).run());

    log::info!(
        "Starting chat as {} ({})",
        participant.user_id,
        participant.role
    );
    let controller = ChatController::new(
        participant,
        Timings::from_config(&app_config),
        cmd_tx,
        event_tx,
        Handle::current(),
    );

    let options = eframe::NativeOptions::default();
    let mut parts = Some((controller, event_rx));

    eframe::run_native(
        "Beehive Chat",
        options,
        Box::new(move |cc| {
            let (controller, event_receiver) = parts
                .take()
                .ok_or_else(|| anyhow!("chat window created twice"))?;
            Ok(Box::new(ChatApp::new(cc, controller, event_receiver)))
        }),
    )
    .map_err(|err| anyhow!("GUI terminated: {err}"))
}
