// src/models.rs
use crate::errors::PromptMintError;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub seed: Option<i64>,
    pub steps: Option<u32>,
    #[serde(alias = "guidance_scale")]
    pub cfg_scale: Option<f32>,
    pub negative_prompt: Option<String>,
    pub model: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        GenerationRequest {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub b64_json: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub images: Vec<GeneratedImage>,
    pub model: String,
    pub seed: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = PromptMintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            other => Err(PromptMintError::Config(format!(
                "Unsupported image format: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedImage {
    pub base64: String,
    pub format: OutputFormat,
    pub byte_length: usize,
    pub width: u32,
    pub height: u32,
    pub source_width: u32,
    pub source_height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationInfo {
    pub model: String,
    pub seed: i64,
    pub source_width: u32,
    pub source_height: u32,
}

/// A generated image shrunk down to what gets stored on-chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftImage {
    pub generation: GenerationInfo,
    pub image: NormalizedImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Sepolia,
}

impl Chain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Sepolia => "sepolia",
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Chain::Ethereum => 1,
            Chain::Sepolia => 11_155_111,
        }
    }

    pub fn from_chain_id(chain_id: u64) -> Result<Self, PromptMintError> {
        match chain_id {
            1 => Ok(Chain::Ethereum),
            11_155_111 => Ok(Chain::Sepolia),
            other => Err(PromptMintError::Config(format!(
                "Unsupported chain id: {}",
                other
            ))),
        }
    }
}

impl FromStr for Chain {
    type Err = PromptMintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ethereum" => Ok(Chain::Ethereum),
            "sepolia" => Ok(Chain::Sepolia),
            other => Err(PromptMintError::Validation(
                crate::errors::ValidationError::Invalid(format!("Unsupported chain: {}", other)),
            )),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub order_hash: Option<String>,
    pub price_wei: String,
    pub formatted_price: String,
    pub maker: Option<String>,
    pub expiration_time: Option<i64>,
    pub chain: Chain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDetails {
    pub identifier: String,
    pub collection: Option<String>,
    pub contract: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub metadata_url: Option<String>,
    pub opensea_url: Option<String>,
    pub owners: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub volume: f64,
    pub sales: u64,
    pub average_price: f64,
    pub num_owners: u64,
    pub market_cap: f64,
    pub floor_price: Option<f64>,
    pub floor_price_symbol: Option<String>,
}

/// Everything the contract stores per token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenData {
    pub prompt: String,
    pub image_data: String,
    pub generation: u32,
    pub token_type: String,
    pub creator: Address,
    pub model_id: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintReceipt {
    pub token_id: U256,
    pub creator: Address,
    pub fee_paid: U256,
}
