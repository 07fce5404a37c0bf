mod cors;

use std::sync::Arc;

use actix_web::{
    App, HttpServer,
    web::{self},
};
use common::env_config::Config;
use db::{PgSubscriptionStore, SubscriptionStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();

    // init logger
    if config.log.enabled {
        logger::setup(&config.log).expect("Failed to set up logger");
    }

    // init db connection and schema
    let pool = db::setup(&config.database)
        .await
        .expect("Failed to set up database");
    let store: Arc<dyn SubscriptionStore> = Arc::new(PgSubscriptionStore::new(pool.clone()));

    let origin = config.cors_allowed_origin.clone();
    let base_path = config.base_path.clone();
    let log_config = config.log.clone();
    if config.is_production() && origin == "*" {
        log::warn!("CORS_ALLOWED_ORIGIN is \"*\" in production");
    }

    log::info!(
        "Listening on {}:{}{} ({} environment)",
        config.server_host,
        config.server_port,
        base_path,
        config.environment
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(store.clone()))
            .wrap(logger::middleware(&log_config)) // 3rd
            .wrap(logger::request_id_middleware()) // 2nd
            .wrap(cors::middleware(&origin)) // 1st
            .service(web::scope(&base_path).service(api_subs::mount_subscriptions()))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .shutdown_timeout(config.shutdown_timeout_secs)
    .run()
    .await?;

    log::info!("Server stopped, closing database pool");
    pool.close().await;
    Ok(())
}
