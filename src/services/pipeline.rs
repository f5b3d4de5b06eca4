// src/services/pipeline.rs
use crate::config::ImageConfig;
use crate::errors::{NO_IMAGE_DATA, PromptMintError};
use crate::models::*;
use crate::services::prompt_validator::validate_prompt_str;
use crate::services::{ImageProcessor, VeniceService};
use log::info;
use std::sync::Arc;

/// Validate, generate at the smallest remote canvas, then shrink the first
/// image down to the on-chain target. Each stage waits for the previous one.
pub struct NftImagePipeline {
    venice: Arc<VeniceService>,
    image_processor: Arc<ImageProcessor>,
    config: ImageConfig,
}

impl NftImagePipeline {
    pub fn new(
        venice: Arc<VeniceService>,
        image_processor: Arc<ImageProcessor>,
        config: ImageConfig,
    ) -> Self {
        Self {
            venice,
            image_processor,
            config,
        }
    }

    pub async fn generate_nft_image(
        &self,
        request: GenerationRequest,
    ) -> Result<NftImage, PromptMintError> {
        validate_prompt_str(&request.prompt)?;

        let request = GenerationRequest {
            prompt: request.prompt.trim().to_string(),
            width: Some(self.config.generation_size),
            height: Some(self.config.generation_size),
            ..request
        };

        let result = self.venice.generate_image(&request).await?;
        let first = result.images.first().ok_or_else(|| {
            PromptMintError::generation(
                "Image generation returned no images",
                None,
                Some(NO_IMAGE_DATA.to_string()),
            )
        })?;

        let image = self.image_processor.normalize(
            &first.b64_json,
            self.config.target_size,
            self.config.target_size,
            self.config.format,
            self.config.quality,
        )?;

        info!(
            "Prepared {}x{} {} NFT image ({} bytes) with model {}",
            image.width, image.height, image.format, image.byte_length, result.model
        );

        Ok(NftImage {
            generation: GenerationInfo {
                model: result.model,
                seed: result.seed,
                source_width: image.source_width,
                source_height: image.source_height,
            },
            image,
        })
    }
}
