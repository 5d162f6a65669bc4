use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod client;
mod config;
mod dashboard;
mod format;
mod insights;
mod kpi;
mod models;
mod report;
mod settings;
mod status;
mod trends;

use client::ApiClient;
use config::Config;
use dashboard::{DashboardState, DashboardView};
use models::TimeWindow;

#[derive(Parser)]
#[command(name = "ragent-dashboard")]
#[command(about = "Operator dashboard for the RAG chat platform", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct WindowArg {
    /// Reporting window: 24h, 7d or 30d
    #[arg(long, default_value = "24h")]
    window: TimeWindow,
}

#[derive(Subcommand)]
enum Commands {
    /// Print system health, metric tones, KPIs and insights
    Status {
        #[command(flatten)]
        window: WindowArg,
        /// Emit the derived view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reload on an interval and print health and insights after each pass
    Watch {
        #[command(flatten)]
        window: WindowArg,
        #[arg(long, default_value_t = 60)]
        interval_secs: u64,
    },
    /// Write a markdown dashboard report
    Report {
        #[command(flatten)]
        window: WindowArg,
        #[arg(long, default_value = "dashboard.md")]
        out: PathBuf,
    },
    /// Export trend series as CSV
    ExportTrends {
        #[command(flatten)]
        window: WindowArg,
        #[arg(long, default_value = "trends.csv")]
        out: PathBuf,
        /// Include the comparison overlay series
        #[arg(long)]
        compare: bool,
    },
    /// Show the platform's read-only system settings
    Settings,
    /// Log in and print the session token
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// End the session held by RAGENT_TOKEN
    Logout,
    /// Show the user behind RAGENT_TOKEN
    Whoami,
}

async fn load_view(
    client: &ApiClient,
    config: &Config,
    window: TimeWindow,
) -> anyhow::Result<DashboardView> {
    let mut state = DashboardState::new(window);
    state.set_window(window, client, config.display_offset).await;
    if let Some(message) = &state.error {
        anyhow::bail!("{message} (window {window})");
    }
    Ok(DashboardView::derive(&state))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let client = ApiClient::new(&config)?;

    match cli.command {
        Commands::Status { window, json } => {
            let view = load_view(&client, &config, window.window).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
                return Ok(());
            }

            println!("{} ({})", view.health.title, view.health.description);
            println!(
                "Tones: success {:?}, latency {:?}, error {:?}, no-doc {:?}",
                view.metric_status.success,
                view.metric_status.latency,
                view.metric_status.error,
                view.metric_status.no_doc
            );
            for card in &view.kpis {
                let change = card
                    .change
                    .as_ref()
                    .and_then(kpi::change_text)
                    .unwrap_or_else(|| "--".to_string());
                println!("- {}: {} {} [{:?}]", card.label, card.value, change, card.status);
            }
            println!("Insights ({}, {}):", view.window_label, view.last_updated);
            for item in &view.insights {
                println!(
                    "- [{}] {}: {} {}",
                    item.kind.label(),
                    item.title,
                    item.metric,
                    item.change
                );
            }
        }
        Commands::Watch {
            window,
            interval_secs,
        } => {
            let mut state = DashboardState::new(window.window);
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
            loop {
                ticker.tick().await;
                state.refresh(&client, config.display_offset).await;
                if let Some(message) = &state.error {
                    // previous payloads stay in `state`; retry on the next tick
                    eprintln!("{message}");
                    continue;
                }
                let view = DashboardView::derive(&state);
                println!(
                    "[{}] {}: {}",
                    view.last_updated, view.health.title, view.health.description
                );
                for item in &view.insights {
                    println!("  - [{}] {} {}", item.kind.label(), item.title, item.change);
                }
            }
        }
        Commands::Report { window, out } => {
            let view = load_view(&client, &config, window.window).await?;
            let report = report::build_report(&view);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::ExportTrends {
            window,
            out,
            compare,
        } => {
            let view = load_view(&client, &config, window.window).await?;
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            let rows = report::write_trend_csv(file, &view.charts, compare)?;
            println!("Exported {rows} trend points to {}.", out.display());
        }
        Commands::Settings => {
            let system = client.system_settings().await?;
            print!("{}", settings::render_settings(&system));
        }
        Commands::Login { username, password } => {
            let user = client.login(&username, &password).await?;
            tracing::info!(user_id = %user.user_id, role = %user.role, "logged in");
            println!("{}", user.token);
            let me = client.with_token(user.token).current_user().await?;
            println!("Signed in as {} ({}).", me.username.as_deref().unwrap_or("-"), me.role);
        }
        Commands::Logout => {
            anyhow::ensure!(config.token.is_some(), "RAGENT_TOKEN is not set");
            client.logout().await?;
            println!("Logged out.");
        }
        Commands::Whoami => {
            let user = client.current_user().await?;
            println!(
                "{} ({}, role {})",
                user.username.as_deref().unwrap_or("-"),
                user.user_id,
                user.role
            );
        }
    }

    Ok(())
}
