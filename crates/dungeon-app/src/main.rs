//! Infinite Dungeon: the demo scenes in a window.
//!
//! Run with:
//!   cargo run -p dungeon-app -- --config config.example.yaml
//!
//! Controls:
//!   Title menu -- Up/Down to select, Enter to start
//!   Balls      -- hold left mouse to size a ball, hold right to spray, Q for the menu
//!   Gravity    -- drag to throw a body, C for a comet, wheel to zoom, Q for the menu
//!   Image      -- Enter to type a prompt, Enter again to generate, Esc to quit

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dungeon_engine::config::Config;
use dungeon_engine::logging;
use dungeon_engine::machine::SceneMachine;
use dungeon_engine::render::run_windowed;
use dungeon_engine::scene::{Deps, SceneId};
use dungeon_engine::scenes::default_registry;
use dungeon_engine::shutdown::ShutdownFlag;
use dungeon_imagegen::prelude::*;

#[derive(Parser)]
#[command(name = "dungeon")]
#[command(about = "Physics and image generation demo scenes", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    logging::init(&config.log)?;
    tracing::info!(config = %cli.config.display(), "starting");

    let shutdown = ShutdownFlag::new();
    shutdown.install_interrupt_handler()?;

    let service: Arc<dyn ImageService> = Arc::new(ComfyUiService::new(ComfyUiClient::new(
        config.comfyui.base_url.clone(),
        config.comfyui.workflow_folder.clone(),
    )));
    let window = config.render.window.clone();
    let deps = Arc::new(Deps::with_image_service(config, Arc::clone(&service)));

    let machine = SceneMachine::new(default_registry(deps), SceneId::Title, shutdown)?;
    let result = run_windowed(machine, &window);

    service.stop();
    tracing::info!("shut down");
    result
}
