// src/config.rs
use crate::errors::PromptMintError;
use crate::models::{Chain, OutputFormat};
use alloy_primitives::{Address, U256};
use std::env;

pub const DEFAULT_VENICE_BASE: &str = "https://api.venice.ai/api/v1";
pub const DEFAULT_VENICE_MODEL: &str = "fluently-xl";
pub const OPENSEA_MAINNET_BASE: &str = "https://api.opensea.io/api/v2";
pub const OPENSEA_TESTNET_BASE: &str = "https://testnets-api.opensea.io/api/v2";

/// 0.0003 ETH
pub const DEFAULT_MINT_FEE_WEI: u64 = 300_000_000_000_000;

/// Smallest canvas the generation API accepts.
pub const MIN_GENERATION_SIZE: u32 = 256;
pub const DEFAULT_NFT_IMAGE_SIZE: u32 = 128;
pub const DEFAULT_JPEG_QUALITY: u8 = 70;

#[derive(Debug, Clone)]
pub struct VeniceConfig {
    pub api_key: String,
    pub base_url: String,
    pub default_model: String,
}

impl VeniceConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        VeniceConfig {
            api_key: api_key.into(),
            base_url: DEFAULT_VENICE_BASE.to_string(),
            default_model: DEFAULT_VENICE_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }
}

#[derive(Debug, Clone)]
pub struct OpenSeaConfig {
    pub api_key: Option<String>,
    pub mainnet_base: String,
    pub testnet_base: String,
}

impl Default for OpenSeaConfig {
    fn default() -> Self {
        OpenSeaConfig {
            api_key: None,
            mainnet_base: OPENSEA_MAINNET_BASE.to_string(),
            testnet_base: OPENSEA_TESTNET_BASE.to_string(),
        }
    }
}

impl OpenSeaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Points both networks at the same base, mostly useful for tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        self.mainnet_base = base_url.clone();
        self.testnet_base = base_url;
        self
    }

    pub fn base_url(&self, chain: Chain) -> &str {
        match chain {
            Chain::Ethereum => &self.mainnet_base,
            Chain::Sepolia => &self.testnet_base,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContractConfig {
    pub address: Address,
    pub chain: Chain,
    pub mint_fee: U256,
}

impl Default for ContractConfig {
    fn default() -> Self {
        ContractConfig {
            address: Address::ZERO,
            chain: Chain::Sepolia,
            mint_fee: U256::from(DEFAULT_MINT_FEE_WEI),
        }
    }
}

impl ContractConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    pub fn with_chain(mut self, chain: Chain) -> Self {
        self.chain = chain;
        self
    }

    pub fn with_mint_fee(mut self, mint_fee: U256) -> Self {
        self.mint_fee = mint_fee;
        self
    }
}

/// Target the normalizer shrinks generated images to before minting.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageConfig {
    pub generation_size: u32,
    pub target_size: u32,
    pub format: OutputFormat,
    pub quality: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        ImageConfig {
            generation_size: MIN_GENERATION_SIZE,
            target_size: DEFAULT_NFT_IMAGE_SIZE,
            format: OutputFormat::Jpeg,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ImageConfig {
    /// Reads `NFT_IMAGE_SIZE`, `NFT_IMAGE_FORMAT` and `NFT_IMAGE_QUALITY`
    /// through `lookup`. Unset keys keep their defaults; set but unusable
    /// values are errors.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, PromptMintError> {
        let mut image = ImageConfig::default();
        if let Some(size) = lookup("NFT_IMAGE_SIZE") {
            image.target_size = size
                .trim()
                .parse()
                .ok()
                .filter(|size: &u32| *size > 0)
                .ok_or_else(|| PromptMintError::Config(format!("Invalid NFT_IMAGE_SIZE: {}", size)))?;
        }
        if let Some(format) = lookup("NFT_IMAGE_FORMAT") {
            image.format = format.parse()?;
        }
        if let Some(quality) = lookup("NFT_IMAGE_QUALITY") {
            image.quality = quality
                .trim()
                .parse()
                .ok()
                .filter(|quality: &u8| (1..=100).contains(quality))
                .ok_or_else(|| {
                    PromptMintError::Config(format!("Invalid NFT_IMAGE_QUALITY: {}", quality))
                })?;
        }
        Ok(image)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub venice: VeniceConfig,
    pub opensea: OpenSeaConfig,
    pub contract: ContractConfig,
    pub image: ImageConfig,
}

impl AppConfig {
    pub fn new(venice: VeniceConfig) -> Self {
        AppConfig {
            bind_addr: "0.0.0.0:8080".to_string(),
            venice,
            opensea: OpenSeaConfig::default(),
            contract: ContractConfig::default(),
            image: ImageConfig::default(),
        }
    }

    pub fn with_opensea(mut self, opensea: OpenSeaConfig) -> Self {
        self.opensea = opensea;
        self
    }

    pub fn with_contract(mut self, contract: ContractConfig) -> Self {
        self.contract = contract;
        self
    }

    pub fn with_image(mut self, image: ImageConfig) -> Self {
        self.image = image;
        self
    }

    pub fn from_env() -> Result<Self, PromptMintError> {
        let api_key = env::var("VENICE_API_KEY")
            .map_err(|_| PromptMintError::Config("VENICE_API_KEY must be set".to_string()))?;

        let mut venice = VeniceConfig::new(api_key);
        if let Ok(base) = env::var("VENICE_API_BASE") {
            venice = venice.with_base_url(base);
        }
        if let Ok(model) = env::var("VENICE_MODEL") {
            venice = venice.with_model(model);
        }

        let mut opensea = OpenSeaConfig::new();
        opensea.api_key = env::var("OPENSEA_API_KEY").ok().filter(|k| !k.is_empty());
        if let Ok(base) = env::var("OPENSEA_MAINNET_BASE") {
            opensea.mainnet_base = base.trim_end_matches('/').to_string();
        }
        if let Ok(base) = env::var("OPENSEA_TESTNET_BASE") {
            opensea.testnet_base = base.trim_end_matches('/').to_string();
        }

        let mut contract = ContractConfig::new();
        if let Ok(address) = env::var("NFT_CONTRACT_ADDRESS") {
            contract.address = address.parse().map_err(|e| {
                PromptMintError::Config(format!("Invalid NFT_CONTRACT_ADDRESS: {}", e))
            })?;
        }
        if let Ok(chain_id) = env::var("CHAIN_ID") {
            let chain_id: u64 = chain_id
                .parse()
                .map_err(|_| PromptMintError::Config(format!("Invalid CHAIN_ID: {}", chain_id)))?;
            contract.chain = Chain::from_chain_id(chain_id)?;
        }
        if let Ok(fee) = env::var("MINT_FEE_WEI") {
            contract.mint_fee = fee
                .parse()
                .map_err(|_| PromptMintError::Config(format!("Invalid MINT_FEE_WEI: {}", fee)))?;
        }

        let image = ImageConfig::from_lookup(|key| env::var(key).ok())?;

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        Ok(AppConfig {
            bind_addr,
            venice,
            opensea,
            contract,
            image,
        })
    }
}
