use tracing::{info, warn};

use video_downloader_web::core::AppConfig;
use video_downloader_web::server::{self, AppState};
use video_downloader_web::utils::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let config = load_initial_config();
    let addr = config.listen_addr();

    std::fs::create_dir_all(&config.download.output_directory).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create download directory {:?}: {}",
            config.download.output_directory,
            e
        )
    })?;

    info!("🎬 Video Downloader Web App");
    info!(
        "📁 Downloads will be saved to: {:?}",
        config.download.output_directory
    );
    info!("🌐 Starting server on http://{}", addr);

    let state = AppState::new(config);
    server::serve(state, &addr).await
}

/// Load the on-disk configuration, falling back to defaults on any failure
/// so a broken config file never prevents startup.
fn load_initial_config() -> AppConfig {
    match AppConfig::load() {
        Ok(config) => {
            if let Err(err) = config.validate() {
                warn!(
                    "Invalid configuration detected ({}), falling back to defaults",
                    err
                );
                AppConfig::default()
            } else {
                config
            }
        }
        Err(err) => {
            warn!(
                "Failed to load configuration from disk: {}. Using defaults",
                err
            );
            AppConfig::default()
        }
    }
}
