use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};

use traffic_viz::{
    config::{Validate, VisualizerConfig},
    driver::FrameDriver,
    graphics::{HeadlessRenderer, Renderer},
    remote::{HttpSimulationClient, SimulationClient, SnapshotSource, TaskFetcher},
};

#[derive(Parser)]
#[command(name = "traffic-viz")]
#[command(about = "Live 3D visualization client for a remote traffic simulation")]
struct Args {
    /// Visualizer configuration file
    #[arg(short, long, default_value = "visualizer.toml")]
    config: String,

    /// Override the simulation server base URL
    #[arg(long)]
    server: Option<String>,

    /// Override the seed used for derived building placement
    #[arg(short, long)]
    seed: Option<u64>,

    /// Stop after this many frames (runs until Ctrl-C otherwise)
    #[arg(short, long)]
    frames: Option<u64>,

    /// Enable verbose logging for detailed synchronization progress
    #[arg(short, long)]
    verbose: bool,
}

struct Application {
    driver: FrameDriver<TaskFetcher<HttpSimulationClient>>,
    renderer: HeadlessRenderer,
    frame_period: Duration,
    max_frames: Option<u64>,
}

impl Application {
    async fn new(args: &Args) -> Result<Self> {
        let mut config = VisualizerConfig::load_from_file(&args.config)?;
        if let Some(server) = &args.server {
            config.server.base_url = server.clone();
        }
        if let Some(seed) = args.seed {
            config.scene.seed = seed;
        }
        config.validate()?;

        info!("Loaded configuration from {}", args.config);
        if args.verbose {
            info!(
                "Model: {} agents on a {}x{} grid",
                config.model.agents, config.model.width, config.model.height
            );
            info!(
                "Snapshot interval: {} ms, target {:.0} FPS",
                config.timing.snapshot_interval_ms, config.timing.target_fps
            );
            info!("Polled categories: {:?}", config.sync.poll_categories);
        }

        let client = HttpSimulationClient::new(&config.server)?;
        info!("Simulation server: {} ({})", client.base_url(), client.get_name());

        // A failed init is not fatal: the server may already hold a model,
        // and fetch failures are retried every interval anyway.
        match client.initialize(&config.model).await {
            Ok(message) => info!("Model initialized: {}", message),
            Err(e) => warn!("Model initialization failed: {}", e),
        }

        let mut driver = FrameDriver::new(&config, TaskFetcher::new(client));
        driver.request_initial_sync();

        let renderer = HeadlessRenderer::new(config.performance.log_interval_frames);
        info!("Renderer: {}, snapshot source: {}", renderer.get_name(), driver.source().get_name());

        Ok(Self {
            driver,
            renderer,
            frame_period: config.timing.frame_period(),
            max_frames: args.frames,
        })
    }

    async fn run(&mut self) -> Result<()> {
        let mut ticker = interval(self.frame_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_frame = Instant::now();

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted - stopping visualization");
                    break;
                }
            }

            let now = Instant::now();
            let delta = now.duration_since(last_frame);
            last_frame = now;

            self.driver.tick(delta, &mut self.renderer);

            if self.max_frames.is_some_and(|max| self.driver.frame() >= max) {
                info!("Frame budget reached");
                break;
            }
        }

        Ok(())
    }

    fn report(&self) {
        let tracker = self.driver.tracker();
        let state = self.driver.state();
        info!("Visualization finished");
        info!("Total frames: {}", tracker.total_frames());
        info!(
            "Fetches: {} completed, {} failed",
            tracker.fetches_completed(),
            tracker.fetches_failed()
        );
        info!(
            "Average frame work: {:.3}ms (~{:.0} FPS headroom), render {:.3}ms, reconcile {:.3}ms, compose {:.3}ms",
            tracker.average_frame_time().as_secs_f64() * 1000.0,
            tracker.fps(),
            tracker.average_render_time().as_secs_f64() * 1000.0,
            tracker.average_reconcile_time().as_secs_f64() * 1000.0,
            tracker.average_compose_time().as_secs_f64() * 1000.0
        );
        for (category, count) in state.get_category_counts() {
            info!("  {}: {}", category, count);
        }
        if let Some(step) = state.step {
            info!("Last simulation step: {}", step);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .init();
    info!("Starting Traffic Visualizer");

    let mut app = Application::new(&args).await?;
    app.run().await?;
    app.report();

    Ok(())
}
