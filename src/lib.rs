pub mod modules;
mod schema;
pub mod shared;

use modules::reviews::{PgProductStore, RetryPolicy, ReviewLedger};
use shared::{utils::init_logger, AppConfig, Database};
use std::sync::Arc;


/// Wire the ledger to PostgreSQL and bring the stored aggregates up to date.
///
/// Migrations run before anything else touches the table. When
/// `REPAIR_ON_STARTUP` is set, every product's derived statistics are
/// rebuilt from its review list; products that fail the sweep are logged and
/// skipped rather than aborting startup.
pub async fn run() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    init_logger();

    let config = AppConfig::from_env()?;

    let database = Arc::new(Database::new(&config.database)?);
    database.run_migrations()?;

    let store = Arc::new(PgProductStore::new(Arc::clone(&database)));
    let ledger = ReviewLedger::new(store)
        .with_retry_policy(RetryPolicy::from_config(&config.ledger));

    if config.repair_on_startup {
        let summary = ledger.recompute_all().await?;
        for failure in &summary.failed {
            log_warn!(
                "Product {} needs manual attention: {}",
                failure.product_id,
                failure.error
            );
        }
    } else {
        log_info!("Startup consistency sweep disabled");
    }

    let status = database.pool_status();
    log_info!(
        "Review ledger ready ({} of {} pooled connections open)",
        status.connections,
        status.max_size
    );

    Ok(())
}
