mod app;
mod pattern;

use twinview_engine::logging::{init_logging, LoggingConfig};

use app::ViewerConfig;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig {
        env_filter: std::env::var("TWINVIEW_LOG").ok(),
        ..LoggingConfig::default()
    });

    log::info!("space toggles the bottom screen signal, F flips, Esc quits");
    app::run(ViewerConfig::default())
}
