//! FarmLog entry point
//!
//! Loads configuration, installs the logger, then prints a dashboard summary
//! for the configured backend.

use std::sync::Arc;

use farmlog::config::AppConfig;
use farmlog::connectivity::Connectivity;
use farmlog::context::AppContext;
use farmlog::dates::{format_date, DEFAULT_PATTERN};
use farmlog::view::Dashboard;
use farmlog_data::notify::LogNotifier;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let _ = rolling_logger::error(&format!("FarmLog exited with error: {}", e));
        eprintln!("farmlog: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    rolling_logger::init_logger(&config.log_dir, "FarmLog")?;

    let ctx = AppContext::from_config(&config, Arc::new(LogNotifier)).await?;

    let mut connectivity = Connectivity::open(ctx.store.clone(), ctx.clock.clone(), true).await?;
    connectivity.went_online().await?;

    let mut dashboard = Dashboard::new(ctx.clone());
    dashboard.load().await?;
    dashboard.load_weather().await;

    let summary = dashboard.summary();
    if dashboard.is_welcome() {
        println!("Welcome to FarmLog! Add your first farm to get started.");
    } else {
        println!("Farms:             {}", summary.farm_count);
        println!("Active crops:      {}", summary.active_crops);
        println!("Upcoming tasks:    {}", summary.upcoming_tasks);
        println!("Monthly expenses:  ${:.2}", summary.monthly_expenses);
        for task in &dashboard.upcoming {
            println!(
                "  - {} ({}, due {}) [{}]",
                task.title,
                dashboard.farm_name(task.farm_id),
                format_date(Some(task.due_date), DEFAULT_PATTERN),
                dashboard.task_status(task).label()
            );
        }
    }
    if let Some(weather) = &dashboard.weather {
        println!(
            "Weather in {}: {}°F, {}",
            weather.location, weather.current.temp, weather.current.condition
        );
    }
    log::info!("Last sync {}", connectivity.last_sync());
    Ok(())
}
