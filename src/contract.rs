// src/contract.rs
// In-process model of the PromptMint ERC-721 contract. Ownership transfer
// and enumeration stay with the standard ERC-721 base and are only modelled
// as far as minting needs.
use crate::errors::ContractError;
use crate::models::TokenData;
use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, sol};
use base64::{Engine as _, engine::general_purpose};
use std::collections::HashMap;

pub const COLLECTION_NAME: &str = "PromptMint";
pub const TOKEN_TYPE: &str = "OG";

sol! {
    function mint(string prompt, string image_data, string model_id) external payable returns (uint256);
}

/// ABI calldata for `mint(string,string,string)`.
pub fn encode_mint_call(prompt: &str, image_data: &str, model_id: &str) -> Vec<u8> {
    mintCall {
        prompt: prompt.to_string(),
        image_data: image_data.to_string(),
        model_id: model_id.to_string(),
    }
    .abi_encode()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractEvent {
    NftMinted {
        token_id: U256,
        creator: Address,
        prompt: String,
    },
    GenerationRequested {
        requester: Address,
        prompt: String,
        fee: U256,
    },
    MintFeeUpdated {
        fee: U256,
    },
    GenerationUpdated {
        generation: u32,
    },
    Withdrawn {
        to: Address,
        amount: U256,
    },
}

#[derive(Debug, Clone)]
pub struct NftContract {
    owner: Address,
    mint_fee: U256,
    generation: u32,
    next_token_id: U256,
    total_supply: U256,
    balance: U256,
    tokens: HashMap<U256, TokenData>,
    owners: HashMap<U256, Address>,
    events: Vec<ContractEvent>,
}

impl NftContract {
    pub fn new(owner: Address, mint_fee: U256) -> Self {
        NftContract {
            owner,
            mint_fee,
            generation: 1,
            next_token_id: U256::from(1u64),
            total_supply: U256::ZERO,
            balance: U256::ZERO,
            tokens: HashMap::new(),
            owners: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn mint_fee(&self) -> U256 {
        self.mint_fee
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    pub fn balance(&self) -> U256 {
        self.balance
    }

    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    /// All checks run before any state is touched, so a revert leaves the
    /// contract unchanged.
    pub fn mint(
        &mut self,
        caller: Address,
        value: U256,
        prompt: &str,
        image_data: &str,
        model_id: &str,
        timestamp: i64,
    ) -> Result<U256, ContractError> {
        if value < self.mint_fee {
            return Err(ContractError::InsufficientFee {
                required: self.mint_fee,
                provided: value,
            });
        }
        if prompt.is_empty() {
            return Err(ContractError::EmptyPrompt);
        }
        if image_data.is_empty() {
            return Err(ContractError::EmptyImage);
        }

        let token_id = self.next_token_id;
        self.next_token_id += U256::from(1u64);
        self.total_supply += U256::from(1u64);
        self.balance += value;

        self.owners.insert(token_id, caller);
        self.tokens.insert(
            token_id,
            TokenData {
                prompt: prompt.to_string(),
                image_data: image_data.to_string(),
                generation: self.generation,
                token_type: TOKEN_TYPE.to_string(),
                creator: caller,
                model_id: model_id.to_string(),
                timestamp,
            },
        );
        self.events.push(ContractEvent::NftMinted {
            token_id,
            creator: caller,
            prompt: prompt.to_string(),
        });

        Ok(token_id)
    }

    /// Fee-only bookkeeping entry point; nothing is stored.
    pub fn request_generation(
        &mut self,
        caller: Address,
        value: U256,
        prompt: &str,
    ) -> Result<(), ContractError> {
        if value < self.mint_fee {
            return Err(ContractError::InsufficientFee {
                required: self.mint_fee,
                provided: value,
            });
        }
        if prompt.is_empty() {
            return Err(ContractError::EmptyPrompt);
        }

        self.balance += value;
        self.events.push(ContractEvent::GenerationRequested {
            requester: caller,
            prompt: prompt.to_string(),
            fee: value,
        });
        Ok(())
    }

    pub fn owner_of(&self, token_id: U256) -> Result<Address, ContractError> {
        self.owners
            .get(&token_id)
            .copied()
            .ok_or(ContractError::NonexistentToken(token_id))
    }

    pub fn get_token_data(&self, token_id: U256) -> Result<&TokenData, ContractError> {
        self.tokens
            .get(&token_id)
            .ok_or(ContractError::NonexistentToken(token_id))
    }

    pub fn token_uri(&self, token_id: U256) -> Result<String, ContractError> {
        let data = self.get_token_data(token_id)?;
        let json = token_metadata_json(token_id, data);
        Ok(format!(
            "data:application/json;base64,{}",
            general_purpose::STANDARD.encode(json)
        ))
    }

    pub fn set_mint_fee(&mut self, caller: Address, fee: U256) -> Result<(), ContractError> {
        self.only_owner(caller)?;
        self.mint_fee = fee;
        self.events.push(ContractEvent::MintFeeUpdated { fee });
        Ok(())
    }

    pub fn set_generation(&mut self, caller: Address, generation: u32) -> Result<(), ContractError> {
        self.only_owner(caller)?;
        self.generation = generation;
        self.events.push(ContractEvent::GenerationUpdated { generation });
        Ok(())
    }

    pub fn withdraw(&mut self, caller: Address) -> Result<U256, ContractError> {
        self.only_owner(caller)?;
        if self.balance.is_zero() {
            return Err(ContractError::NothingToWithdraw);
        }
        let amount = self.balance;
        self.balance = U256::ZERO;
        self.events.push(ContractEvent::Withdrawn { to: caller, amount });
        Ok(amount)
    }

    fn only_owner(&self, caller: Address) -> Result<(), ContractError> {
        if caller != self.owner {
            return Err(ContractError::NotOwner(caller));
        }
        Ok(())
    }
}

/// Escapes quotes, backslashes and control characters so free text can be
/// spliced into the metadata JSON.
pub fn escape_json(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if (c as u32) < 0x20 => escaped.push_str(&format!("\\u{:04x}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Stored payloads are bare base64; PNG is recognised by its signature and
/// everything else is labelled JPEG.
fn image_mime(image_data: &str) -> &'static str {
    if image_data.starts_with("iVBORw0KGgo") {
        "image/png"
    } else {
        "image/jpeg"
    }
}

fn token_metadata_json(token_id: U256, data: &TokenData) -> String {
    let prompt = escape_json(&data.prompt);
    let model_id = escape_json(&data.model_id);

    let mut json = String::new();
    json.push_str(&format!(r#"{{"name":"{} #{}","#, COLLECTION_NAME, token_id));
    json.push_str(&format!(r#""description":"{}","#, prompt));
    json.push_str(&format!(
        r#""image":"data:{};base64,{}","#,
        image_mime(&data.image_data),
        data.image_data
    ));
    json.push_str(r#""attributes":["#);
    json.push_str(&format!(r#"{{"trait_type":"Prompt","value":"{}"}},"#, prompt));
    json.push_str(&format!(
        r#"{{"trait_type":"Generation","value":{}}},"#,
        data.generation
    ));
    json.push_str(&format!(
        r#"{{"trait_type":"Type","value":"{}"}},"#,
        escape_json(&data.token_type)
    ));
    json.push_str(&format!(
        r#"{{"trait_type":"Creator","value":"{}"}},"#,
        data.creator
    ));
    json.push_str(&format!(r#"{{"trait_type":"Model","value":"{}"}},"#, model_id));
    json.push_str(&format!(
        r#"{{"display_type":"date","trait_type":"Created","value":{}}}"#,
        data.timestamp
    ));
    json.push_str("]}");
    json
}
