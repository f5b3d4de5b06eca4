// src/main.rs
use actix_web::{App, HttpServer, middleware, web};
use log::info;
use promptmint::config::AppConfig;
use promptmint::{AppState, configure_routes};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting PromptMint service...");

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();
    info!(
        "Using chain {} (id {}), contract {}, mint fee {} wei",
        config.contract.chain,
        config.contract.chain.chain_id(),
        config.contract.address,
        config.contract.mint_fee
    );

    let app_state = AppState::from_config(config);

    info!("Starting HTTP server on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().limit(4 * 1024 * 1024))
            .wrap(middleware::Logger::default())
            .configure(configure_routes)
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}
