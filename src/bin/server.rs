use std::path::PathBuf;
use tethercam::config::AppConfig;
use tethercam::web::{self, AppState};

const DEFAULT_PORT: u16 = 5555;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<PathBuf> = None;
    let mut port = DEFAULT_PORT;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| anyhow::anyhow!("--config requires a path"))?;
                config_path = Some(PathBuf::from(value));
            }
            "--port" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| anyhow::anyhow!("--port requires a number"))?;
                port = value.parse()?;
            }
            other => {
                eprintln!("Usage: tethercam-server [--config <path>] [--port <port>]");
                anyhow::bail!("unknown argument: {other}");
            }
        }
        i += 1;
    }

    let config = AppConfig::load_or_default(config_path.unwrap_or_else(AppConfig::default_path));
    tethercam::init_logging(&config.log_settings.console_level);

    let state = AppState::new(config.clone());
    // Best effort; no-op while no camera is connected.
    state.settings.apply_startup_settings(&config).await;

    web::run(state, port).await
}
