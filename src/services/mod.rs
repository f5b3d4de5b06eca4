// src/services/mod.rs
pub mod chain_service;
pub mod image_processor;
pub mod opensea_service;
pub mod pipeline;
pub mod prompt_validator;
pub mod venice_service;

pub use chain_service::{ChainClient, LocalChain, MintCall};
pub use image_processor::ImageProcessor;
pub use opensea_service::OpenSeaService;
pub use pipeline::NftImagePipeline;
pub use venice_service::VeniceService;
