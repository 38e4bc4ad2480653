use anyhow::Result;

use crate::api::behaviors::{AssignTarget, BehaviorApi, BehaviorConfig, Persona};
use crate::logging::{self, obj, v_str, Domain};

/// Persona editor state. Every mutation goes to the backend and then the
/// local copy is brought back in line with it.
pub struct BehaviorPanel<A: BehaviorApi> {
    api: A,
    config: BehaviorConfig,
    loaded: bool,
}

impl<A: BehaviorApi> BehaviorPanel<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            config: BehaviorConfig::default(),
            loaded: false,
        }
    }

    pub fn config(&self) -> &BehaviorConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn persona_label<'a>(&'a self, persona_id: &'a str) -> &'a str {
        self.config.persona_label(persona_id)
    }

    /// Replace the local copy with the backend's. On failure the previous
    /// copy is kept.
    pub async fn load(&mut self) -> Result<()> {
        match self.api.fetch_config().await {
            Ok(config) => {
                self.config = config;
                self.loaded = true;
                Ok(())
            }
            Err(e) => {
                logging::warn(
                    Domain::Panel,
                    "behaviors_load_failed",
                    obj(&[("error", v_str(&e.to_string()))]),
                );
                Err(e)
            }
        }
    }

    /// Optimistic: the local copy changes first. If the backend refuses, the
    /// panel reloads so it does not show an edit that never landed.
    pub async fn save_persona(&mut self, id: &str, persona: Persona) -> Result<()> {
        self.config.personas.insert(id.to_string(), persona.clone());
        if let Err(e) = self.api.save_persona(id, &persona).await {
            logging::warn(
                Domain::Panel,
                "persona_save_failed",
                obj(&[("persona_id", v_str(id)), ("error", v_str(&e.to_string()))]),
            );
            let _ = self.load().await;
            return Err(e);
        }
        Ok(())
    }

    /// New persona with an empty prompt. Blank names are ignored.
    pub async fn create_persona(&mut self, name: &str) -> Result<Option<String>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        let id = format!("p_{}", logging::ts_epoch_ms());
        let persona = Persona {
            name: name.to_string(),
            prompt: String::new(),
        };
        self.save_persona(&id, persona).await?;
        Ok(Some(id))
    }

    pub async fn delete_persona(&mut self, id: &str) -> Result<()> {
        self.api.delete_persona(id).await?;
        logging::info(Domain::Panel, "persona_deleted", obj(&[("persona_id", v_str(id))]));
        self.load().await
    }

    pub async fn assign(&mut self, kind: AssignTarget, target: &str, persona_id: &str) -> Result<()> {
        self.api.assign(kind, target, persona_id).await?;
        self.load().await
    }

    pub async fn unassign(&mut self, kind: AssignTarget, target: &str) -> Result<()> {
        self.assign(kind, target, "").await
    }

    pub async fn set_default(&mut self, persona_id: &str) -> Result<()> {
        self.api.set_default(persona_id).await?;
        self.load().await
    }

    pub async fn save_guidelines(&mut self, text: &str) -> Result<()> {
        self.api.save_guidelines(text).await?;
        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory backend. `reject_saves` makes persona writes fail.
    #[derive(Default)]
    struct MemoryBackend {
        config: Mutex<BehaviorConfig>,
        reject_saves: bool,
        fetches: Mutex<u32>,
    }

    #[async_trait]
    impl BehaviorApi for MemoryBackend {
        async fn fetch_config(&self) -> Result<BehaviorConfig> {
            *self.fetches.lock().unwrap() += 1;
            Ok(self.config.lock().unwrap().clone())
        }

        async fn save_persona(&self, id: &str, persona: &Persona) -> Result<()> {
            if self.reject_saves {
                return Err(anyhow!("HTTP 500"));
            }
            self.config
                .lock()
                .unwrap()
                .personas
                .insert(id.to_string(), persona.clone());
            Ok(())
        }

        async fn delete_persona(&self, id: &str) -> Result<()> {
            self.config.lock().unwrap().personas.remove(id);
            Ok(())
        }

        async fn assign(&self, kind: AssignTarget, target: &str, persona_id: &str) -> Result<()> {
            let mut cfg = self.config.lock().unwrap();
            let map = match kind {
                AssignTarget::User => &mut cfg.assignments.users,
                AssignTarget::Role => &mut cfg.assignments.roles,
            };
            if persona_id.is_empty() {
                map.remove(target);
            } else {
                map.insert(target.to_string(), persona_id.to_string());
            }
            Ok(())
        }

        async fn set_default(&self, persona_id: &str) -> Result<()> {
            self.config.lock().unwrap().default_persona = Some(persona_id.to_string());
            Ok(())
        }

        async fn save_guidelines(&self, text: &str) -> Result<()> {
            self.config.lock().unwrap().global_guidelines = text.to_string();
            Ok(())
        }
    }

    fn persona(name: &str, prompt: &str) -> Persona {
        Persona {
            name: name.to_string(),
            prompt: prompt.to_string(),
        }
    }

    #[tokio::test]
    async fn test_load_and_label() {
        let backend = MemoryBackend::default();
        backend
            .config
            .lock()
            .unwrap()
            .personas
            .insert("normal".into(), persona("Normal Bella", "Be kind."));
        let mut panel = BehaviorPanel::new(backend);
        assert!(!panel.is_loaded());
        panel.load().await.unwrap();
        assert!(panel.is_loaded());
        assert_eq!(panel.persona_label("normal"), "Normal Bella");
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back_by_refetch() {
        let backend = MemoryBackend {
            reject_saves: true,
            ..Default::default()
        };
        let mut panel = BehaviorPanel::new(backend);
        let err = panel.save_persona("x", persona("X", "")).await;
        assert!(err.is_err());
        assert!(!panel.config().personas.contains_key("x"));
        assert_eq!(*panel.api().fetches.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_persona() {
        let mut panel = BehaviorPanel::new(MemoryBackend::default());
        assert_eq!(panel.create_persona("   ").await.unwrap(), None);

        let id = panel.create_persona(" Sassy ").await.unwrap().unwrap();
        assert!(id.starts_with("p_"));
        let created = &panel.config().personas[&id];
        assert_eq!(created.name, "Sassy");
        assert!(created.prompt.is_empty());
    }

    #[tokio::test]
    async fn test_assign_unassign_and_default() {
        let mut panel = BehaviorPanel::new(MemoryBackend::default());
        panel.save_persona("normal", persona("Normal", "hi")).await.unwrap();
        panel.assign(AssignTarget::Role, "Admin", "normal").await.unwrap();
        assert_eq!(panel.config().assignments.roles.get("Admin").map(String::as_str), Some("normal"));

        panel.unassign(AssignTarget::Role, "Admin").await.unwrap();
        assert!(panel.config().assignments.roles.is_empty());

        panel.set_default("normal").await.unwrap();
        assert_eq!(panel.config().default_persona.as_deref(), Some("normal"));
    }

    #[tokio::test]
    async fn test_delete_and_guidelines_refetch() {
        let mut panel = BehaviorPanel::new(MemoryBackend::default());
        panel.save_persona("gone", persona("Gone", "")).await.unwrap();
        panel.delete_persona("gone").await.unwrap();
        assert!(panel.config().personas.is_empty());

        panel.save_guidelines("Be brief.").await.unwrap();
        assert_eq!(panel.config().global_guidelines, "Be brief.");
    }
}
