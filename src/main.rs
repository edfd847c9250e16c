use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;

use lazyslot::config::Config;
use lazyslot::geometry::frame;
use lazyslot::renderer::drive_renderer;
use lazyslot::scheduler::LazyLoadScheduler;
use lazyslot::sim::{Feed, FeedItemKind, Simulation};

mod cli;

use cli::Cli;
use cli::commands::Commands;
use cli::console::ConsoleRenderer;

fn setup_logging(to_stderr: bool) -> Result<()> {
    // Everything passes the backend filter; the configured level is applied via max_level
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace"));

    if to_stderr {
        builder.target(env_logger::Target::Stderr).init();
        return Ok(());
    }

    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lazyslot")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("lazyslot.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Narrow logging to the configured level unless RUST_LOG is set.
fn apply_log_level(config: &Config) -> Result<()> {
    if std::env::var_os("RUST_LOG").is_some() {
        return Ok(());
    }
    let level = config.log_level_filter().context("Invalid log level")?;
    log::set_max_level(level);
    Ok(())
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        None => handle_simulate_command(None, false, cli.is_verbose(), config),
        Some(Commands::Simulate { scroll_speed, json }) => {
            handle_simulate_command(*scroll_speed, *json, cli.is_verbose(), config)
        }
        Some(Commands::Zones {
            viewport_y,
            viewport_height,
        }) => handle_zones_command(*viewport_y, *viewport_height, config),
        Some(Commands::Feed) => handle_feed_command(config),
    }
}

fn handle_simulate_command(scroll_speed: Option<f64>, json: bool, verbose: bool, config: &Config) -> Result<()> {
    let mut sim_config = config.simulation.clone();
    if let Some(speed) = scroll_speed {
        sim_config.scroll_speed = speed;
    }
    info!("Running simulation: {:?}", sim_config);

    let scheduler_config = config.scheduler_config().context("Invalid scheduler configuration")?;
    let simulation = Simulation::new(Feed::build(&sim_config), sim_config);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    let report = runtime.block_on(async {
        let scheduler = LazyLoadScheduler::new(scheduler_config)?;

        if json {
            let report = simulation
                .run(scheduler, |timed| match serde_json::to_string(timed) {
                    Ok(line) => println!("{}", line),
                    Err(e) => log::warn!("Failed to serialize change: {}", e),
                })
                .await;
            return Ok::<_, eyre::Report>(report);
        }

        println!("{}", "Scrolling feed...".cyan());
        let renderer = ConsoleRenderer::new();
        let events = scheduler.subscribe_all();
        let (report, dispatched) = tokio::join!(simulation.run(scheduler, |_| {}), drive_renderer(events, &renderer));
        info!("Renderer handled {} change(s)", dispatched);
        Ok::<_, eyre::Report>(report)
    })?;

    if !json {
        println!(
            "{} {} frames, {} visibility checks, {} changes",
            "Done:".green(),
            report.frames,
            report.checks_run,
            report.changes.len()
        );
        if verbose {
            for (ad_id, _) in simulation.feed().ad_slots() {
                let history: Vec<String> = report.history(ad_id).iter().map(|s| s.to_string()).collect();
                println!("  {}: {}", ad_id, history.join(" -> "));
            }
        }
    }
    Ok(())
}

fn handle_zones_command(viewport_y: f64, viewport_height: Option<f64>, config: &Config) -> Result<()> {
    let thresholds = config.thresholds().context("Invalid zone thresholds")?;
    let height = viewport_height.unwrap_or(config.simulation.viewport_height);
    let viewport = frame(0.0, viewport_y, config.simulation.viewport_width, height);
    let zones = thresholds.zones_for(viewport);
    info!("Zones for viewport {:?}: {:?}", viewport, zones);

    println!("{} y {:.0} .. {:.0}", "viewport:".green(), zones.viewport.y0, zones.viewport.y1);
    println!("{} y {:.0} .. {:.0}", "display: ".green(), zones.display.y0, zones.display.y1);
    println!("{} y {:.0} .. {:.0}", "fetch:   ".green(), zones.fetch.y0, zones.fetch.y1);
    println!("{} y {:.0} .. {:.0}", "unload:  ".green(), zones.unload.y0, zones.unload.y1);

    if !thresholds.has_hysteresis() {
        println!(
            "{} unload threshold is smaller than fetch/display; slots may unload and re-fetch repeatedly",
            "Warning:".yellow()
        );
    }
    Ok(())
}

fn handle_feed_command(config: &Config) -> Result<()> {
    let feed = Feed::build(&config.simulation);
    info!("Feed has {} items", feed.items().len());

    for item in feed.items() {
        match &item.kind {
            FeedItemKind::Ad { ad_id } => println!(
                "{:>8.0} .. {:<8.0} {}",
                item.frame.y0,
                item.frame.y1,
                ad_id.as_str().cyan()
            ),
            FeedItemKind::Article { index } => {
                println!("{:>8.0} .. {:<8.0} article {}", item.frame.y0, item.frame.y1, index + 1)
            }
        }
    }
    println!(
        "{} {:.0} tall, {} ad slots",
        "Feed:".green(),
        feed.content_height(),
        feed.ad_slots().count()
    );
    Ok(())
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging before the config is loaded so its fallbacks are recorded
    setup_logging(cli.log_stderr).context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    apply_log_level(&config)?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
