// src/lib.rs
use actix_web::web;
use std::sync::Arc;

pub mod config;
pub mod contract;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;

#[cfg(test)]
mod test_support;

use crate::config::AppConfig;
use crate::handlers::{
    generate_image, get_asset_details, get_collection_stats, get_highest_offer, get_token,
    get_token_uri, health_check, list_models, mint, prepare_mint, service_status,
    validate_prompt_handler,
};
use crate::services::{
    ChainClient, ImageProcessor, LocalChain, NftImagePipeline, OpenSeaService, VeniceService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub venice: Arc<VeniceService>,
    pub opensea: Arc<OpenSeaService>,
    pub pipeline: Arc<NftImagePipeline>,
    pub chain: Arc<dyn ChainClient>,
}

impl AppState {
    /// Wires every service from one config. The chain client is the local
    /// contract model, owned by the configured contract address.
    pub fn from_config(config: AppConfig) -> Self {
        let venice = Arc::new(VeniceService::new(config.venice.clone()));
        let opensea = Arc::new(OpenSeaService::new(config.opensea.clone()));
        let image_processor = Arc::new(ImageProcessor::new());
        let pipeline = Arc::new(NftImagePipeline::new(
            venice.clone(),
            image_processor,
            config.image.clone(),
        ));
        let chain: Arc<dyn ChainClient> = Arc::new(LocalChain::new(
            config.contract.address,
            config.contract.mint_fee,
        ));

        AppState {
            config: Arc::new(config),
            venice,
            opensea,
            pipeline,
            chain,
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/prompts/validate", web::post().to(validate_prompt_handler))
            .route("/images/generate", web::post().to(generate_image))
            .route("/models", web::get().to(list_models))
            .route("/status", web::get().to(service_status))
            .route("/mint/prepare", web::post().to(prepare_mint))
            .route("/mint", web::post().to(mint))
            .route("/tokens/{token_id}", web::get().to(get_token))
            .route("/tokens/{token_id}/uri", web::get().to(get_token_uri))
            .route(
                "/offers/{contract}/{token_id}",
                web::get().to(get_highest_offer),
            )
            .route(
                "/assets/{contract}/{token_id}",
                web::get().to(get_asset_details),
            )
            .route(
                "/collections/{slug}/stats",
                web::get().to(get_collection_stats),
            ),
    )
    .route("/health", web::get().to(health_check));
}
