use anyhow::Result;

use crate::api::images::{GenerateRequest, GeneratedImage, ImageApi, Resolution, DEFAULT_MODELS, PRESETS};
use crate::logging::{self, obj, v_num, v_str, Domain};

pub struct ImagePanel<A: ImageApi> {
    api: A,
    models: Vec<String>,
    selected: String,
    resolution: Resolution,
    enhance: bool,
    last_image: Option<GeneratedImage>,
}

impl<A: ImageApi> ImagePanel<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            selected: DEFAULT_MODELS[0].to_string(),
            resolution: PRESETS[1],
            enhance: false,
            last_image: None,
        }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn selected_model(&self) -> &str {
        &self.selected
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn set_resolution(&mut self, res: Resolution) {
        self.resolution = res;
    }

    pub fn set_enhance(&mut self, enhance: bool) {
        self.enhance = enhance;
    }

    pub fn last_image(&self) -> Option<&GeneratedImage> {
        self.last_image.as_ref()
    }

    /// Pull the model list. The built-in defaults stay when the backend has
    /// none or cannot be reached.
    pub async fn load_models(&mut self) -> Result<()> {
        let list = self.api.list_models().await?;
        if !list.models.is_empty() {
            self.models = list.models;
        }
        if let Some(current) = list.current_model.filter(|m| !m.is_empty()) {
            self.selected = current;
        }
        Ok(())
    }

    pub async fn select_model(&mut self, model: &str) -> Result<()> {
        self.api.set_model(model).await?;
        self.selected = model.to_string();
        logging::info(Domain::Panel, "image_model_selected", obj(&[("model", v_str(model))]));
        Ok(())
    }

    pub async fn generate(&mut self, prompt: &str) -> Result<&GeneratedImage> {
        let mut req = GenerateRequest::new(prompt, self.selected.clone()).with_resolution(self.resolution);
        req.enhance = self.enhance;
        req.validate()?;
        let image = self.api.generate(&req).await?;
        logging::info(
            Domain::Panel,
            "image_generated",
            obj(&[
                ("model", v_str(&req.model)),
                ("width", v_num(req.width as f64)),
                ("height", v_num(req.height as f64)),
            ]),
        );
        Ok(&*self.last_image.insert(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::images::{preset, ModelList};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubImages {
        listing: Option<ModelList>,
        selected: Mutex<Option<String>>,
        requests: Mutex<Vec<GenerateRequest>>,
    }

    #[async_trait]
    impl ImageApi for StubImages {
        async fn list_models(&self) -> Result<ModelList> {
            self.listing.clone().ok_or_else(|| anyhow!("connection refused"))
        }

        async fn set_model(&self, model: &str) -> Result<()> {
            *self.selected.lock().unwrap() = Some(model.to_string());
            Ok(())
        }

        async fn generate(&self, req: &GenerateRequest) -> Result<GeneratedImage> {
            self.requests.lock().unwrap().push(req.clone());
            Ok(GeneratedImage {
                image_url: format!("https://img.example/{}.png", req.model),
                model: Some(req.model.clone()),
                width: Some(req.width),
                height: Some(req.height),
            })
        }
    }

    #[tokio::test]
    async fn test_defaults_survive_unreachable_backend() {
        let mut panel = ImagePanel::new(StubImages::default());
        assert!(panel.load_models().await.is_err());
        assert_eq!(panel.models(), &["flux", "turbo", "stable-diffusion"]);
        assert_eq!(panel.selected_model(), "flux");
    }

    #[tokio::test]
    async fn test_backend_models_replace_defaults() {
        let stub = StubImages {
            listing: Some(ModelList {
                models: vec!["flux".into(), "kontext".into()],
                current_model: Some("kontext".into()),
            }),
            ..Default::default()
        };
        let mut panel = ImagePanel::new(stub);
        panel.load_models().await.unwrap();
        assert_eq!(panel.models().len(), 2);
        assert_eq!(panel.selected_model(), "kontext");
    }

    #[tokio::test]
    async fn test_generate_uses_selected_model_and_resolution() {
        let mut panel = ImagePanel::new(StubImages::default());
        panel.select_model("turbo").await.unwrap();
        panel.set_resolution(preset("9:16").unwrap());
        let url = panel.generate("a lighthouse").await.unwrap().image_url.clone();
        assert_eq!(url, "https://img.example/turbo.png");

        let sent = panel.api.requests.lock().unwrap();
        assert_eq!((sent[0].width, sent[0].height), (1080, 1920));
        assert_eq!(panel.api.selected.lock().unwrap().as_deref(), Some("turbo"));
    }

    #[tokio::test]
    async fn test_blank_prompt_never_reaches_backend() {
        let mut panel = ImagePanel::new(StubImages::default());
        assert!(panel.generate("").await.is_err());
        assert!(panel.api.requests.lock().unwrap().is_empty());
        assert!(panel.last_image().is_none());
    }
}
