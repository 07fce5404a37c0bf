use common::env_config::DatabaseConfig;
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
};
use std::{str::FromStr, sync::Arc};

pub mod store;
pub mod subscription;

pub mod models {
    pub mod subscription;
}

pub mod dtos {
    pub mod subscription;
}

pub use store::SubscriptionStore;
pub use subscription::PgSubscriptionStore;

fn connect_options(
    config: &DatabaseConfig,
    database: &str,
) -> Result<PgConnectOptions, sqlx::Error> {
    let ssl_mode = PgSslMode::from_str(&config.ssl_mode)?;
    Ok(PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(database)
        .ssl_mode(ssl_mode))
}

/// Connects to the configured database, creating it first if it does not
/// exist yet, and applies the embedded migrations.
pub async fn setup(config: &DatabaseConfig) -> Result<Arc<PgPool>, Box<dyn std::error::Error>> {
    let admin_pool = PgPool::connect_with(connect_options(config, "postgres")?).await?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&config.name)
            .fetch_one(&admin_pool)
            .await?;

    if !exists {
        log::info!("Creating database \"{}\"", config.name);
        sqlx::query(&format!("CREATE DATABASE \"{}\"", config.name.replace('"', "\"\"")))
            .execute(&admin_pool)
            .await?;
    }

    admin_pool.close().await;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(connect_options(config, &config.name)?)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!(
        "Connected to database \"{}\" at {}:{}",
        config.name,
        config.host,
        config.port
    );

    Ok(Arc::new(pool))
}
