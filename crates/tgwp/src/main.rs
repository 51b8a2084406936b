use std::sync::Arc;

use tracing::{error, info};

use tgwp_core::{config::Config, pipeline::Republisher};
use tgwp_telegram::TelegramSource;
use tgwp_wordpress::WordPressClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), tgwp_core::Error> {
    let cfg = Config::load()?;
    tgwp_core::logging::init("tgwp", cfg.log_file.as_deref())?;

    info!(config = ?cfg, "starting republisher");
    info!(token = %cfg.token_hint(), "telegram bot token");

    let source = Arc::new(TelegramSource::new(&cfg)?);
    let platform = Arc::new(WordPressClient::new(&cfg)?);
    let republisher = Republisher::new(&cfg, source, platform);

    // A failed pass is logged; the next scheduled run starts from the saved cursor.
    match republisher.run_once().await {
        Ok(report) => info!(
            fetched = report.fetched,
            skipped = report.skipped,
            published = report.published,
            failed = report.failed,
            empty = report.empty,
            cursor = ?report.cursor.map(|m| m.0),
            "run finished"
        ),
        Err(e) => error!("run aborted: {e:?}"),
    }

    Ok(())
}
