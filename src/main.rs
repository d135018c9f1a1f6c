mod app;
mod core;
mod playback;
mod triggers;
mod video;

use std::path::PathBuf;
use app::LooperApp;
use crate::core::AppConfig;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args_os().nth(1) {
        Some(path) => AppConfig::load_from(&PathBuf::from(path))?,
        None => AppConfig::load()?,
    };

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| anyhow::anyhow!("Failed to start timer runtime: {}", e))?;

    let app = match LooperApp::new(config, runtime.handle().clone()) {
        Ok(app) => app,
        Err(e) => {
            log::error!("Failed to start looper: {:#}", e);
            return Err(e);
        }
    };

    app.run()
}
