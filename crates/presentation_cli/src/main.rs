//! Weathervane CLI
//!
//! Runs the update scheduler and exposes one-shot administration commands.

#![allow(clippy::print_stdout)]

use anyhow::{Context, bail};
use clap::Parser;
use domain::value_objects::LocationKey;
use infrastructure::config::AppConfig;
use infrastructure::{TelemetryConfig, init_telemetry, pipeline_scheduler};
use presentation_cli::{
    Cli, Commands, Pipeline, log_filter_from_verbosity, save_forecast, start_or_shutdown,
};
use tokio::signal;
use tracing::info;

/// Trend window printed by `summary`
const SUMMARY_TREND_DAYS: u32 = 7;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config).context("Failed to load configuration")?;

    let telemetry = TelemetryConfig {
        json: config.telemetry.json,
        ..TelemetryConfig::default()
    }
    .with_filter(log_filter_from_verbosity(
        cli.verbose,
        &config.telemetry.log_filter,
    ));
    init_telemetry(&telemetry)?;

    info!("🌦️  Weathervane v{} starting...", env!("CARGO_PKG_VERSION"));

    let pipeline = Pipeline::build(config)?;

    match &cli.command {
        Commands::Run => run(&pipeline).await?,

        Commands::Update {
            locations,
            all_default,
        } => {
            let targets = if *all_default || locations.is_empty() {
                pipeline.config.scheduler.all_locations()
            } else {
                locations.clone()
            };
            println!("🔄 Updating {} location(s)...", targets.len());

            let outcome = pipeline.updates.run(&targets).await;

            println!("{}", serde_json::to_string_pretty(&outcome.result)?);
            if outcome.alerts.is_empty() {
                println!("✅ No new alerts");
            } else {
                println!("⚠️  {} new alert(s):", outcome.alerts.len());
                for alert in &outcome.alerts {
                    println!("   [{}] {}: {}", alert.severity, alert.location_name, alert.title);
                }
            }
            if !outcome.result.success && outcome.result.total_locations > 0 {
                bail!("no location could be updated");
            }
        },

        Commands::Forecast {
            location,
            days,
            output,
        } => {
            let days = days.unwrap_or(pipeline.config.provider.forecast_days);

            pipeline.admission.admit().await;
            let forecast = pipeline.fetcher.fetch_forecast(location, days).await?;
            let stored = pipeline.readings.store_forecast(&forecast).await?;

            println!(
                "📍 {}, {} ({} day(s) stored)",
                forecast.location.name, forecast.location.country, stored
            );
            println!(
                "   Now: {:.1}°C, {}",
                forecast.current.temperature_c, forecast.current.condition
            );
            for day in &forecast.days {
                println!(
                    "📅 {}: {}, {:.1}°C to {:.1}°C, rain {}%, wind up to {:.0} km/h",
                    day.date,
                    day.condition,
                    day.min_temp_c,
                    day.max_temp_c,
                    day.chance_of_rain,
                    day.max_wind_kph
                );
            }

            if let Some(path) = output {
                save_forecast(path, &forecast)?;
                println!("📊 Forecast data saved to {}", path.display());
            }
        },

        cmd @ Commands::Monitor { location, .. } => {
            let requests = cmd.threshold_requests();
            if requests.is_empty() {
                bail!("give at least one of --temp-high, --temp-low, --wind-speed or --humidity");
            }

            for (metric, min, max) in requests {
                let threshold = pipeline
                    .engine
                    .set_custom_threshold(location, metric, min, max, None)
                    .await?;
                println!("🎯 {}: {}", threshold.metric, threshold.message);
            }
        },

        Commands::Summary { location } => {
            let key = location.as_deref().map(LocationKey::new).transpose()?;

            let summary = pipeline.reports.active_alert_summary(key.clone()).await?;
            println!("🚨 Active Alerts:");
            println!("{}", serde_json::to_string_pretty(&summary)?);

            if let Some(key) = key {
                let report = pipeline
                    .reports
                    .daily_report(std::slice::from_ref(&key), SUMMARY_TREND_DAYS)
                    .await;
                match report.trends.first() {
                    Some(trends) => {
                        println!("📈 Trends ({SUMMARY_TREND_DAYS} days):");
                        println!("{}", serde_json::to_string_pretty(trends)?);
                    },
                    None => println!("📈 No readings for {key} in the last {SUMMARY_TREND_DAYS} days"),
                }
            }
        },

        Commands::Cleanup { days } => {
            let days = days.unwrap_or(pipeline.config.scheduler.retention_days);
            println!("🧹 Removing data older than {days} day(s)...");

            let report = pipeline.readings.cleanup(days).await?;

            println!("{}", serde_json::to_string_pretty(&report)?);
            println!("✅ {} row(s) deleted", report.total());
        },

        Commands::Status => {
            let stats = pipeline.readings.get_stats().await?;
            let last_success = pipeline.readings.last_successful_update().await?;
            let scheduler = &pipeline.config.scheduler;

            let status = serde_json::json!({
                "storage": stats,
                "last_successful_update": last_success,
                "tiers": {
                    "frequent": { "locations": scheduler.frequent, "interval_secs": scheduler.frequent_interval_secs },
                    "normal": { "locations": scheduler.normal, "interval_secs": scheduler.normal_interval_secs },
                    "background": { "locations": scheduler.background, "interval_secs": scheduler.background_interval_secs },
                },
                "daily_cron": scheduler.daily_cron,
                "weekly_cron": scheduler.weekly_cron,
                "health_interval_secs": scheduler.health_interval_secs,
                "retention_days": scheduler.retention_days,
                "forecast_refresh_secs": scheduler.forecast_refresh_enabled.then_some(scheduler.forecast_refresh_secs),
            });

            println!("📊 System Status:");
            println!("{}", serde_json::to_string_pretty(&status)?);
        },
    }

    Ok(())
}

/// Start the scheduler and block until a shutdown signal arrives
async fn run(pipeline: &Pipeline) -> anyhow::Result<()> {
    let config = &pipeline.config;
    let scheduler = pipeline_scheduler(
        &config.scheduler,
        &config.alerts,
        config.provider.forecast_days,
        pipeline.jobs(),
    )?;

    let mut shutdown = Box::pin(shutdown_signal());
    if !start_or_shutdown(&scheduler, &mut shutdown).await {
        info!("👋 Shut down before the scheduler started");
        return Ok(());
    }
    info!(
        locations = config.scheduler.all_locations().len(),
        "🚀 Scheduler running"
    );

    shutdown.await;

    info!(
        "⏳ Waiting up to {:?} for running jobs...",
        config.scheduler.stop_timeout()
    );
    scheduler.stop().await;
    info!("👋 Scheduler stopped");
    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("📥 Received Ctrl+C, shutting down...");
        }
        () = terminate => {
            info!("📥 Received SIGTERM, shutting down...");
        }
    }
}
