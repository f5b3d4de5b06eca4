// src/handlers.rs
use crate::services::MintCall;
use crate::services::prompt_validator::validate_prompt;
use crate::{AppState, errors::*, models::*};
use actix_web::{HttpResponse, web};
use alloy_primitives::{Address, U256};
use log::info;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

type HandlerResult = Result<HttpResponse, PromptMintError>;

#[derive(Debug, Deserialize)]
pub struct ChainQuery {
    chain: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MintBody {
    prompt: Option<Value>,
    #[serde(default)]
    image_data: String,
    model_id: Option<String>,
    caller: Option<Address>,
    value: Option<String>,
}

pub async fn validate_prompt_handler(body: web::Json<Value>) -> HandlerResult {
    validate_prompt(body.get("prompt"))?;
    Ok(HttpResponse::Ok().json(json!({ "valid": true })))
}

pub async fn generate_image(body: web::Json<Value>, data: web::Data<AppState>) -> HandlerResult {
    let body = body.into_inner();
    validate_prompt(body.get("prompt"))?;

    let request: GenerationRequest = serde_json::from_value(body)
        .map_err(|e| ValidationError::Invalid(format!("Invalid generation request: {}", e)))?;

    let request_id = Uuid::new_v4();
    info!("[{}] Generating NFT image", request_id);

    let nft_image = data.pipeline.generate_nft_image(request).await?;

    info!(
        "[{}] Generated {} byte {} image",
        request_id, nft_image.image.byte_length, nft_image.image.format
    );

    Ok(HttpResponse::Ok().json(json!({
        "request_id": request_id,
        "generation": nft_image.generation,
        "image": nft_image.image,
    })))
}

pub async fn list_models(data: web::Data<AppState>) -> HandlerResult {
    let models = data.venice.list_image_models().await?;
    Ok(HttpResponse::Ok().json(json!({
        "models": models,
        "default": data.venice.default_model(),
    })))
}

pub async fn service_status(data: web::Data<AppState>) -> HttpResponse {
    let venice = data.venice.health_check().await;
    HttpResponse::Ok().json(json!({
        "venice": venice,
        "chain": data.config.contract.chain,
        "contract": data.config.contract.address,
    }))
}

pub async fn prepare_mint(body: web::Json<MintBody>, data: web::Data<AppState>) -> HandlerResult {
    let call = mint_call(&body, &data)?;
    Ok(HttpResponse::Ok().json(&call))
}

pub async fn mint(body: web::Json<MintBody>, data: web::Data<AppState>) -> HandlerResult {
    let caller = body
        .caller
        .ok_or_else(|| ValidationError::Invalid("caller address is required".to_string()))?;
    let call = mint_call(&body, &data)?;

    let receipt = data.chain.submit_mint(caller, &call).await?;
    let total_supply = data.chain.total_supply().await?;

    Ok(HttpResponse::Ok().json(json!({
        "token_id": receipt.token_id.to_string(),
        "creator": receipt.creator,
        "fee_paid": receipt.fee_paid.to_string(),
        "total_supply": total_supply.to_string(),
    })))
}

pub async fn get_token(path: web::Path<String>, data: web::Data<AppState>) -> HandlerResult {
    let token_id = parse_token_id(&path)?;
    let token = data.chain.token_data(token_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "token_id": token_id.to_string(),
        "data": token,
    })))
}

pub async fn get_token_uri(path: web::Path<String>, data: web::Data<AppState>) -> HandlerResult {
    let token_id = parse_token_id(&path)?;
    let uri = data.chain.token_uri(token_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "token_id": token_id.to_string(),
        "token_uri": uri,
    })))
}

pub async fn get_highest_offer(
    path: web::Path<(String, String)>,
    query: web::Query<ChainQuery>,
    data: web::Data<AppState>,
) -> HandlerResult {
    let (contract, token_id) = path.into_inner();
    let chain = resolve_chain(&query, &data)?;
    let offer = data
        .opensea
        .get_highest_offer(&contract, &token_id, chain)
        .await?;
    Ok(found_or_404(offer))
}

pub async fn get_asset_details(
    path: web::Path<(String, String)>,
    query: web::Query<ChainQuery>,
    data: web::Data<AppState>,
) -> HandlerResult {
    let (contract, token_id) = path.into_inner();
    let chain = resolve_chain(&query, &data)?;
    let asset = data
        .opensea
        .get_asset_details(&contract, &token_id, chain)
        .await?;
    Ok(found_or_404(asset))
}

pub async fn get_collection_stats(
    path: web::Path<String>,
    query: web::Query<ChainQuery>,
    data: web::Data<AppState>,
) -> HandlerResult {
    let chain = resolve_chain(&query, &data)?;
    let stats = data.opensea.get_collection_stats(&path, chain).await?;
    Ok(found_or_404(stats))
}

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "promptmint",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn mint_call(body: &MintBody, data: &AppState) -> Result<MintCall, PromptMintError> {
    validate_prompt(body.prompt.as_ref())?;
    let prompt = body.prompt.as_ref().and_then(|p| p.as_str()).unwrap_or_default();
    let model_id = body
        .model_id
        .as_deref()
        .unwrap_or(data.venice.default_model());

    let call = MintCall::new(&data.config.contract, prompt, &body.image_data, model_id)?;
    match &body.value {
        Some(value) => {
            let value: U256 = value
                .parse()
                .map_err(|_| ValidationError::Invalid(format!("Invalid value: {}", value)))?;
            Ok(call.with_value(value))
        }
        None => Ok(call),
    }
}

fn parse_token_id(raw: &str) -> Result<U256, PromptMintError> {
    raw.parse::<U256>()
        .map_err(|_| ValidationError::Invalid(format!("Invalid token id: {}", raw)).into())
}

fn resolve_chain(query: &ChainQuery, data: &AppState) -> Result<Chain, PromptMintError> {
    match &query.chain {
        Some(chain) => chain.parse(),
        None => Ok(data.config.contract.chain),
    }
}

fn found_or_404<T: serde::Serialize>(value: Option<T>) -> HttpResponse {
    match value {
        Some(value) => HttpResponse::Ok().json(value),
        None => HttpResponse::NotFound().json(json!({ "error": "not_found" })),
    }
}
