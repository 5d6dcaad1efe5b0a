//! Engine bootstrap: connects to the store, ensures the schema, and seeds
//! the payroll parameters and default contribution rules.

use dotenvy::dotenv;
use payroll_core::{
    config::{
        database::{create_connection, create_tables},
        payroll::{default_seed, load_seed_config, seed_payroll},
    },
    errors::Result,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const SEED_FILE: &str = "payroll.toml";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal - env vars can be set externally
    dotenv().ok();

    // 3. Connect and make sure the schema exists
    let db = create_connection().await?;
    create_tables(&db).await?;
    info!("database initialized");

    // 4. Seed payroll parameters and default contribution rules
    let seed = match load_seed_config(SEED_FILE) {
        Ok(seed) => seed,
        Err(err) => {
            warn!(error = %err, "no usable {SEED_FILE}, using built-in defaults");
            default_seed()
        }
    };
    let outcome = seed_payroll(&db, &seed).await?;
    info!(
        parameters_created = outcome.parameters_created,
        rules_added = outcome.rules_added,
        "payroll seeding complete"
    );

    Ok(())
}
