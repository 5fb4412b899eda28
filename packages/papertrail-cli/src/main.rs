//! Papertrail reconciliation CLI
//!
//! Creates, inspects or deletes a set of systems, a group and a saved search,
//! and on obtain writes the search's events for a time window to a file.

mod config;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use papertrail_client::{Papertrail, PapertrailClient};
use papertrail_sync::{Options, Orchestrator};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::output::{print_json, print_report, Response};

#[derive(Parser, Debug)]
#[command(name = "papertrail")]
#[command(about = "Reconcile Papertrail systems, groups and saved searches")]
struct Cli {
    /// Group name
    #[arg(short = 'g', long, default_value = "my-log-group")]
    group_name: String,

    /// Systems, separated by ", "; "*" leaves systems untouched
    #[arg(short = 'w', long, default_value = "*")]
    system_wildcard: String,

    /// Syslog destination port for hostname systems
    #[arg(short = 'p', long, default_value_t = 0)]
    destination_port: u16,

    /// Syslog destination id for hostname systems
    #[arg(short = 'I', long, default_value_t = 0)]
    destination_id: i64,

    /// IP address for ip-address systems
    #[arg(short = 'i', long, default_value = "")]
    ip_address: String,

    /// System type: hostname (h) or ip-address (i)
    #[arg(short = 't', long, default_value = "hostname")]
    system_type: String,

    /// Saved search name
    #[arg(short = 'S', long, default_value = "default search")]
    search: String,

    /// Saved search query
    #[arg(short = 'q', long, default_value = "*")]
    query: String,

    /// Action: create (c), obtain (o) or delete (d)
    #[arg(short = 'a', long, default_value = "c")]
    action: String,

    /// On delete, remove the whole group and with it every search
    #[arg(short = 'd', long)]
    delete_all_searches: bool,

    /// On delete, also remove the systems in the wildcard
    #[arg(long)]
    delete_all_systems: bool,

    /// On delete, remove only the systems in the wildcard
    #[arg(long)]
    delete_only_systems: bool,

    /// Window start, "MM/DD/YYYY hh:mm:ss" UTC (default: 24 hours ago)
    #[arg(short = 's', long)]
    start_date: Option<String>,

    /// Window end, "MM/DD/YYYY hh:mm:ss" UTC (default: now)
    #[arg(short = 'e', long)]
    end_date: Option<String>,

    /// Directory for retrieved events
    #[arg(long, default_value = ".")]
    path: PathBuf,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn into_options(self) -> Options {
        let defaults = Options::default();
        Options {
            group_name: self.group_name,
            system_wildcard: self.system_wildcard,
            destination_port: self.destination_port,
            destination_id: self.destination_id,
            ip_address: self.ip_address,
            system_type: self.system_type,
            search: self.search,
            query: self.query,
            action: self.action,
            delete_all_searches: self.delete_all_searches,
            delete_all_systems: self.delete_all_systems,
            delete_only_systems: self.delete_only_systems,
            start_date: self.start_date.unwrap_or(defaults.start_date),
            end_date: self.end_date.unwrap_or(defaults.end_date),
            path: self.path,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so the report on stdout stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,papertrail_sync=info,papertrail_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let json = cli.json;
    let options = cli.into_options();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(api_url = %config.api_url, "Configuration loaded");
    let client = PapertrailClient::new(config.api_token)
        .context("Failed to create Papertrail client")?
        .with_base_url(config.api_url);
    let orchestrator = Orchestrator::new(Papertrail::new(client));

    match orchestrator.run(&options).await {
        Ok(report) => {
            if json {
                print_json(&Response {
                    success: true,
                    action: Some(report.action.name()),
                    items: &report.items,
                    error: None,
                })?;
            } else {
                print_report(report.action, &report.items);
            }
            Ok(())
        }
        Err(failure) => {
            if json {
                print_json(&Response {
                    success: false,
                    action: failure.action.map(|action| action.name()),
                    items: &failure.items,
                    error: Some(failure.error.to_string()),
                })?;
            } else if !failure.items.is_empty() {
                println!("Completed before the failure:");
                for item in &failure.items {
                    println!("{}", output::item_line(item));
                }
            }
            Err(anyhow::Error::new(failure).context("Run failed"))
        }
    }
}
