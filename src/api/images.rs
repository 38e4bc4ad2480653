use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ApiClient;

/// Models offered before the backend answers.
pub const DEFAULT_MODELS: [&str; 3] = ["flux", "turbo", "stable-diffusion"];

pub const MIN_DIMENSION: u32 = 256;
pub const MAX_DIMENSION: u32 = 2048;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelList {
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub current_model: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
}

pub const PRESETS: [Resolution; 4] = [
    Resolution { label: "512x512", width: 512, height: 512 },
    Resolution { label: "1024x1024", width: 1024, height: 1024 },
    Resolution { label: "16:9", width: 1920, height: 1080 },
    Resolution { label: "9:16", width: 1080, height: 1920 },
];

pub fn preset(label: &str) -> Option<Resolution> {
    PRESETS.iter().copied().find(|p| p.label == label)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub model: String,
    pub width: u32,
    pub height: u32,
    pub enhance: bool,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            width: 1024,
            height: 1024,
            enhance: false,
        }
    }

    pub fn with_resolution(mut self, res: Resolution) -> Self {
        self.width = res.width;
        self.height = res.height;
        self
    }

    /// Same checks the backend applies, done before the round trip.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(anyhow!("prompt is required"));
        }
        let range = MIN_DIMENSION..=MAX_DIMENSION;
        if !range.contains(&self.width) || !range.contains(&self.height) {
            return Err(anyhow!(
                "width and height must be between {} and {}",
                MIN_DIMENSION,
                MAX_DIMENSION
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratedImage {
    pub image_url: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[async_trait]
pub trait ImageApi {
    async fn list_models(&self) -> Result<ModelList>;
    async fn set_model(&self, model: &str) -> Result<()>;
    async fn generate(&self, req: &GenerateRequest) -> Result<GeneratedImage>;
}

#[async_trait]
impl ImageApi for ApiClient {
    async fn list_models(&self) -> Result<ModelList> {
        self.get_json("/api/image/models").await
    }

    async fn set_model(&self, model: &str) -> Result<()> {
        let path = "/api/image/model";
        let req = self.http().post(self.url(path)).query(&[("model", model)]);
        let _: Value = self.send_json(req, path).await?;
        Ok(())
    }

    async fn generate(&self, req: &GenerateRequest) -> Result<GeneratedImage> {
        req.validate()?;
        let path = "/api/image/generate";
        let http = self.http().post(self.url(path)).json(req);
        self.send_json(http, path).await
    }
}
