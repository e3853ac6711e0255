use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use face_sticker::{FrameCompositor, FsStickerPack, LandmarkStore, Viewport};
use tracing_subscriber::EnvFilter;

use crate::api::FrameSlot;
use crate::config::AppConfig;
use crate::render::{RenderLoop, RenderThread};
use crate::software::SoftwareBackend;

mod api;
mod config;
mod render;
mod software;

#[derive(Parser)]
struct Options {
    #[arg(long, default_value = "127.0.0.1:8888")]
    pub api_bind: String,
    /// Directory containing the sticker manifest and frames.
    #[arg(long, short = 's')]
    pub sticker_pack: PathBuf,
    #[arg(long, short = 'f', default_value = "30")]
    pub output_fps: u32,
    #[arg(long, short = 'W', default_value = "720")]
    pub output_width: u32,
    #[arg(long, short = 'H', default_value = "1280")]
    pub output_height: u32,
    #[arg(long, default_value = "1")]
    pub max_faces: usize,
    /// Draw the landmark points over each face.
    #[arg(long)]
    pub debug_points: bool,
    /// Don't read back composited frames for `GET /v1/frame`.
    #[arg(long)]
    pub no_capture: bool,
    /// JSON file with pose and compositor tuning.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown: {}", err);
    }
    tracing::info!("shutting down");
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let options = Options::parse();

    let mut config = AppConfig::load(options.config.as_deref())?;
    if options.debug_points {
        config.compositor.debug_points = true;
    }
    if options.no_capture {
        config.compositor.capture = false;
    }

    let pack = FsStickerPack::open(&options.sticker_pack)
        .with_context(|| format!("failed to open sticker pack {}", options.sticker_pack.display()))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let store = Arc::new(LandmarkStore::new(options.max_faces));
    let frames = Arc::new(FrameSlot::default());
    let (api_state, queue) = api::ApiState::new(store.clone(), frames.clone());

    let compositor = FrameCompositor::new(
        store,
        Box::new(pack),
        Viewport::new(options.output_width, options.output_height),
        config.pose,
        config.compositor,
    );
    let backend = SoftwareBackend::new(options.output_width, options.output_height);
    let render_thread = RenderThread::spawn(RenderLoop::new(compositor, backend, queue, frames), options.output_fps)?;

    let api_addr: SocketAddr = options.api_bind.parse()?;
    let served = runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(api_addr).await?;
        tracing::info!(%api_addr, "serving API");
        axum::serve(listener, api::new_api().with_state(api_state))
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        anyhow::Ok(())
    });

    render_thread.stop()?;
    served
}
