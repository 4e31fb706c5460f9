//! CLI commands over the client core

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use cartpath_sdk::{
    BrandGroup, DealApi, DealSelection, HttpBackend, KeyValueStore, RouteCache, RouteHistoryItem,
    SelectionStrategy, SqliteStore, WatchlistStore,
};
use clap::Subcommand;
use tracing::info;

use crate::config::Config;

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Refresh and show plan history
    History,

    /// Complete a plan, keeping only the listed (purchased) items.
    /// Without items, the items already checked off are kept.
    Complete {
        /// Plan ID
        plan_id: String,
        /// Purchased item IDs
        items: Vec<String>,
    },

    /// Delete a plan
    Delete {
        /// Plan ID
        plan_id: String,
    },

    /// Manage the watchlist
    #[command(subcommand)]
    Watch(WatchCommands),

    /// Compare deals for item names and auto-select one option each
    Deals {
        /// Strategy (cheapest, maxSavings, closest)
        strategy: String,
        /// Item names
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Show deals for a scan and auto-select one option each
    Scan {
        /// Strategy (cheapest, maxSavings, closest)
        strategy: String,
        /// Scan ID
        scan_id: String,
    },
}

/// Watchlist operations
#[derive(Debug, Subcommand)]
pub enum WatchCommands {
    /// Show watched items
    List,
    /// Start watching an item
    Add { name: String },
    /// Stop watching an item
    Remove { name: String },
    /// Look up current deals for every watched item
    Refresh,
}

/// Wired-up client core
pub struct App {
    pub backend: Arc<HttpBackend>,
    pub routes: RouteCache,
    pub watchlist: WatchlistStore,
}

impl App {
    /// Connect to the backend and restore the local mirror
    pub fn open(config: &Config) -> anyhow::Result<Self> {
        let backend = Arc::new(HttpBackend::connect(config.api_config())?);
        let store: Arc<dyn KeyValueStore> = Arc::new(
            SqliteStore::open(&config.storage.data_dir).context("Failed to open local store")?,
        );

        let routes = RouteCache::new(backend.clone(), store.clone());
        routes.load_cached();
        if let Some(ref user_id) = config.session.user_id {
            routes.sign_in(user_id.clone());
        }

        let watchlist = WatchlistStore::load(store);

        Ok(Self {
            backend,
            routes,
            watchlist,
        })
    }
}

/// Run one command and return its printable output
pub async fn execute_command(app: &App, cmd: Commands) -> anyhow::Result<String> {
    match cmd {
        Commands::History => {
            app.routes.refresh_history().await?;
            let stats = app.routes.lifetime_stats();
            let mut out = format!(
                "{} trips, ${:.2} saved\n",
                stats.total_trips, stats.total_savings
            );
            for plan in app.routes.history() {
                out.push_str(&format_plan(&plan));
            }
            Ok(out)
        }

        Commands::Complete { plan_id, items } => {
            if app.routes.find_plan(&plan_id).is_none() {
                return Err(anyhow!("No plan {} in history", plan_id));
            }
            if items.is_empty() {
                app.routes.complete_checked(&plan_id).await?;
            } else {
                let checked: HashSet<String> = items.into_iter().collect();
                app.routes.complete_plan(&plan_id, &checked).await?;
            }
            let plan = app
                .routes
                .find_plan(&plan_id)
                .ok_or_else(|| anyhow!("Plan {} disappeared", plan_id))?;
            Ok(format_plan(&plan))
        }

        Commands::Delete { plan_id } => {
            app.routes.delete_plan_and_wait(&plan_id).await?;
            info!(%plan_id, "Plan deleted");
            Ok(format!("Deleted {}\n", plan_id))
        }

        Commands::Watch(watch) => execute_watch(app, watch).await,

        Commands::Deals { strategy, items } => {
            let strategy = parse_strategy(&strategy)?;
            let groups = app.backend.compare_items(&items).await?;
            Ok(format_selection(&groups, strategy))
        }

        Commands::Scan { strategy, scan_id } => {
            let strategy = parse_strategy(&strategy)?;
            let groups = app.backend.scan_deals(&scan_id).await?;
            Ok(format_selection(&groups, strategy))
        }
    }
}

async fn execute_watch(app: &App, cmd: WatchCommands) -> anyhow::Result<String> {
    match cmd {
        WatchCommands::List => Ok(format_watchlist(app)),
        WatchCommands::Add { name } => match app.watchlist.save_item(&name) {
            Some(item) => Ok(format!("Watching {} ({})\n", item.name, item.id)),
            None => Ok(format!("Already watching {}\n", name)),
        },
        WatchCommands::Remove { name } => {
            if app.watchlist.remove_item_by_name(&name) {
                Ok(format!("Stopped watching {}\n", name))
            } else {
                Ok(format!("Not watching {}\n", name))
            }
        }
        WatchCommands::Refresh => {
            let updated = app.watchlist.refresh_deals(app.backend.as_ref()).await?;
            info!(updated, "Watchlist refreshed");
            Ok(format_watchlist(app))
        }
    }
}

fn parse_strategy(s: &str) -> anyhow::Result<SelectionStrategy> {
    SelectionStrategy::from_str(s)
        .ok_or_else(|| anyhow!("Unknown strategy '{}' (cheapest, maxSavings, closest)", s))
}

fn format_plan(plan: &RouteHistoryItem) -> String {
    let mut out = format!(
        "{} [{}] {} - ${:.2} saved, {}\n",
        plan.id,
        plan.status,
        plan.date.format("%Y-%m-%d %H:%M"),
        plan.route.total_savings,
        plan.route.est_time
    );
    for stop in &plan.route.stops {
        let _ = writeln!(out, "  {}. {} ({} items)", stop.sequence, stop.store, stop.items.len());
        for item in &stop.items {
            let mark = if item.checked { "x" } else { " " };
            let _ = writeln!(out, "     [{}] {} {} ${:.2}", mark, item.id, item.name, item.price);
        }
    }
    out
}

fn format_watchlist(app: &App) -> String {
    let mut out = String::new();
    for item in app.watchlist.items() {
        let badge = item.badge.as_deref().unwrap_or("");
        let _ = writeln!(out, "{} {} {}: {} - {}", badge, item.name, item.id, item.status, item.subtitle);
    }
    if out.is_empty() {
        out.push_str("Watchlist is empty\n");
    }
    out
}

pub fn format_selection(groups: &[BrandGroup], strategy: SelectionStrategy) -> String {
    let mut selection = DealSelection::new();
    selection.apply_strategy(groups, strategy);

    let mut out = String::new();
    for (index, group) in groups.iter().enumerate() {
        let chosen = selection.choice(index);
        let _ = writeln!(out, "{} ({})", group.item_name, group.status);
        for option in &group.options {
            let mark = if Some(option.id.as_str()) == chosen { "*" } else { " " };
            let price = option
                .price
                .map(|p| format!("${:.2}", p))
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(out, "  {} {} {} {}", mark, option.id, option.brand_name, price);
        }
    }
    let _ = writeln!(
        out,
        "Strategy {}: est. savings ${:.2}",
        strategy,
        selection.estimated_savings(groups)
    );
    out
}
