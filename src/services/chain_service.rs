// src/services/chain_service.rs
use crate::config::ContractConfig;
use crate::contract::{NftContract, encode_mint_call};
use crate::errors::{ContractError, PromptMintError};
use crate::models::{MintReceipt, TokenData};
use crate::services::prompt_validator::validate_prompt_str;
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use log::info;
use serde::Serialize;
use std::sync::Mutex;

/// A single payable `mint` call, ready to hand to a wallet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MintCall {
    pub to: Address,
    pub chain_id: u64,
    pub value: String,
    pub prompt: String,
    pub image_data: String,
    pub model_id: String,
    pub data: String,
    #[serde(skip)]
    pub fee: U256,
}

impl MintCall {
    /// Only the prompt is re-checked here; the contract enforces the rest.
    pub fn new(
        config: &ContractConfig,
        prompt: &str,
        image_data: &str,
        model_id: &str,
    ) -> Result<Self, PromptMintError> {
        validate_prompt_str(prompt)?;
        if image_data.is_empty() {
            return Err(PromptMintError::Contract(ContractError::EmptyImage));
        }

        let prompt = prompt.trim();
        let calldata = encode_mint_call(prompt, image_data, model_id);

        Ok(MintCall {
            to: config.address,
            chain_id: config.chain.chain_id(),
            value: config.mint_fee.to_string(),
            prompt: prompt.to_string(),
            image_data: image_data.to_string(),
            model_id: model_id.to_string(),
            data: format!("0x{}", hex::encode(calldata)),
            fee: config.mint_fee,
        })
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.fee = value;
        self.value = value.to_string();
        self
    }
}

/// Whatever actually talks to the chain. Signing and broadcasting live with
/// the wallet; implementations only submit and read.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn submit_mint(
        &self,
        caller: Address,
        call: &MintCall,
    ) -> Result<MintReceipt, PromptMintError>;

    async fn token_data(&self, token_id: U256) -> Result<TokenData, PromptMintError>;

    async fn token_uri(&self, token_id: U256) -> Result<String, PromptMintError>;

    async fn total_supply(&self) -> Result<U256, PromptMintError>;
}

/// Development chain backed by the in-process contract model.
pub struct LocalChain {
    contract: Mutex<NftContract>,
}

impl LocalChain {
    pub fn new(owner: Address, mint_fee: U256) -> Self {
        Self {
            contract: Mutex::new(NftContract::new(owner, mint_fee)),
        }
    }

    fn with_contract<T>(
        &self,
        f: impl FnOnce(&mut NftContract) -> Result<T, ContractError>,
    ) -> Result<T, PromptMintError> {
        let mut contract = self
            .contract
            .lock()
            .map_err(|e| ContractError::Unavailable(e.to_string()))?;
        Ok(f(&mut contract)?)
    }
}

#[async_trait]
impl ChainClient for LocalChain {
    async fn submit_mint(
        &self,
        caller: Address,
        call: &MintCall,
    ) -> Result<MintReceipt, PromptMintError> {
        let timestamp = chrono::Utc::now().timestamp();
        let token_id = self.with_contract(|contract| {
            contract.mint(
                caller,
                call.fee,
                &call.prompt,
                &call.image_data,
                &call.model_id,
                timestamp,
            )
        })?;

        info!("Minted token {} for {}", token_id, caller);

        Ok(MintReceipt {
            token_id,
            creator: caller,
            fee_paid: call.fee,
        })
    }

    async fn token_data(&self, token_id: U256) -> Result<TokenData, PromptMintError> {
        self.with_contract(|contract| contract.get_token_data(token_id).cloned())
    }

    async fn token_uri(&self, token_id: U256) -> Result<String, PromptMintError> {
        self.with_contract(|contract| contract.token_uri(token_id))
    }

    async fn total_supply(&self) -> Result<U256, PromptMintError> {
        self.with_contract(|contract| Ok(contract.total_supply()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ValidationError;
    use base64::{Engine as _, engine::general_purpose};

    const IMAGE: &str = "/9j/4AAQSkZJRgABAQAAAQABAAD";

    fn config() -> ContractConfig {
        ContractConfig::new()
            .with_address(Address::repeat_byte(0xAB))
            .with_mint_fee(U256::from(300_000_000_000_000u64))
    }

    #[test]
    fn mint_call_carries_fee_and_calldata() {
        let call = MintCall::new(&config(), "  a cat  ", IMAGE, "fluently-xl").unwrap();
        assert_eq!(call.prompt, "a cat");
        assert_eq!(call.value, "300000000000000");
        assert_eq!(call.chain_id, 11_155_111);
        assert!(call.data.starts_with("0x"));
        assert_eq!(call.data, format!("0x{}", hex::encode(encode_mint_call("a cat", IMAGE, "fluently-xl"))));
    }

    #[test]
    fn mint_call_rejects_bad_prompt_and_empty_image() {
        assert!(matches!(
            MintCall::new(&config(), "   ", IMAGE, "m"),
            Err(PromptMintError::Validation(ValidationError::EmptyPrompt))
        ));
        assert!(matches!(
            MintCall::new(&config(), "a cat", "", "m"),
            Err(PromptMintError::Contract(ContractError::EmptyImage))
        ));
    }

    #[actix_web::test]
    async fn local_chain_mint_then_read_back() {
        let chain = LocalChain::new(Address::repeat_byte(0x01), config().mint_fee);
        let caller = Address::repeat_byte(0x02);
        let call = MintCall::new(&config(), "A cosmic dragon flying through space", IMAGE, "fluently-xl").unwrap();

        let before = chain.total_supply().await.unwrap();
        let receipt = chain.submit_mint(caller, &call).await.unwrap();
        let after = chain.total_supply().await.unwrap();

        assert_eq!(after, before + U256::from(1u64));
        assert_eq!(receipt.token_id, U256::from(1u64));
        assert_eq!(receipt.creator, caller);

        let uri = chain.token_uri(receipt.token_id).await.unwrap();
        let payload = uri.strip_prefix("data:application/json;base64,").unwrap();
        let metadata: serde_json::Value =
            serde_json::from_slice(&general_purpose::STANDARD.decode(payload).unwrap()).unwrap();
        assert!(metadata["image"].as_str().unwrap().contains(IMAGE));

        let data = chain.token_data(receipt.token_id).await.unwrap();
        assert_eq!(data.creator, caller);
        assert_eq!(data.model_id, "fluently-xl");
    }

    #[actix_web::test]
    async fn underpaid_mint_surfaces_contract_error() {
        let chain = LocalChain::new(Address::repeat_byte(0x01), config().mint_fee);
        let call = MintCall::new(&config(), "a cat", IMAGE, "m")
            .unwrap()
            .with_value(U256::from(1u64));

        let err = chain
            .submit_mint(Address::repeat_byte(0x02), &call)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PromptMintError::Contract(ContractError::InsufficientFee { .. })
        ));
        assert_eq!(chain.total_supply().await.unwrap(), U256::ZERO);
    }
}
