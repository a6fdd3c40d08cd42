//! costsight - Cost insights from saved cloud billing exports

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use costsight::{
    cli::{Cli, Command},
    insights::{CostInsights, last_complete_billing_date},
    output::get_formatter,
    types::DailyDate,
};
use costsight_provider_json::DataLoader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Quiet by default; --verbose overrides RUST_LOG
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("costsight=info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let formatter = get_formatter(cli.json);

    match &cli.command {
        Command::BillingDate => {
            let today = DailyDate::new(Local::now().date_naive());
            println!(
                "{}",
                formatter.format_billing_date(last_complete_billing_date(today)?)
            );
            return Ok(());
        }
        Command::Profiles => {
            let profiles = cli
                .support_profiles()
                .context("Failed to load support profiles")?;
            println!("{}", formatter.format_profiles(&profiles));
            return Ok(());
        }
        _ => {}
    }

    let config = cli
        .insights_config()
        .context("Invalid configuration")?;
    let show_progress = !cli.json && is_terminal::is_terminal(std::io::stderr());
    let loader = match &cli.data_path {
        Some(path) => DataLoader::from_path(path.clone()),
        None => DataLoader::new().context("Set --data-path or COSTSIGHT_DATA_PATH")?,
    }
    .with_progress(show_progress);
    info!("Reading billing exports from {}", loader.data_path().display());

    let insights = CostInsights::new(loader, config)?;

    match &cli.command {
        Command::Daily { intervals, group } => {
            info!("Running daily cost report");
            let cost = insights.group_daily_cost(group, intervals).await?;
            println!("{}", formatter.format_cost(&cost));
        }
        Command::Project { project, intervals } => {
            info!("Running project cost report");
            let cost = insights.project_daily_cost(project, intervals).await?;
            println!("{}", formatter.format_cost(&cost));
        }
        Command::Product { product, intervals } => {
            info!("Running product insights");
            let entity = insights.product_insights(product, intervals).await?;
            println!("{}", formatter.format_entity(&entity));
        }
        Command::BillingDate | Command::Profiles => {}
    }

    Ok(())
}
