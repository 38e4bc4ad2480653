use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use super::ApiClient;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Persona {
    pub name: String,
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Assignments {
    #[serde(default)]
    pub users: BTreeMap<String, String>,
    #[serde(default)]
    pub roles: BTreeMap<String, String>,
}

/// Full behavior configuration as served by `/api/behaviors/config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BehaviorConfig {
    #[serde(default)]
    pub personas: BTreeMap<String, Persona>,
    #[serde(default)]
    pub assignments: Assignments,
    #[serde(default)]
    pub default_persona: Option<String>,
    #[serde(default)]
    pub global_guidelines: String,
}

impl BehaviorConfig {
    /// Persona name for display, or the raw id when it is unknown.
    pub fn persona_label<'a>(&'a self, persona_id: &'a str) -> &'a str {
        self.personas
            .get(persona_id)
            .map(|p| p.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(persona_id)
    }

    /// Persona that applies to a user: direct assignment, then the first of
    /// `roles` that has an assignment, then the default.
    pub fn resolve_persona(&self, user_id: &str, roles: &[&str]) -> Option<&str> {
        self.assignments
            .users
            .get(user_id)
            .filter(|pid| !pid.is_empty())
            .or_else(|| {
                roles
                    .iter()
                    .filter_map(|role| self.assignments.roles.get(*role))
                    .find(|pid| !pid.is_empty())
            })
            .or(self.default_persona.as_ref().filter(|pid| !pid.is_empty()))
            .map(String::as_str)
    }

    /// Preview of the system instruction the bot would build for this user.
    pub fn resolve_instruction(&self, user_id: &str, roles: &[&str]) -> String {
        let prompt = self
            .resolve_persona(user_id, roles)
            .and_then(|pid| self.personas.get(pid))
            .map(|p| p.prompt.as_str())
            .unwrap_or("");
        format!("{}\n\n{}", prompt, self.global_guidelines)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignTarget {
    User,
    Role,
}

impl AssignTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignTarget::User => "user",
            AssignTarget::Role => "role",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(AssignTarget::User),
            "role" => Some(AssignTarget::Role),
            _ => None,
        }
    }
}

/// Body for `/api/behaviors/assign/{user|role}`. The backend reads `userId`
/// or `role` depending on the route, so both carry the target.
pub fn assign_body(target: &str, persona_id: &str) -> Value {
    json!({ "userId": target, "role": target, "personaId": persona_id })
}

/// `/api/behaviors/persona/{id}` with `id` percent-encoded as one segment.
pub fn persona_path(id: &str) -> Result<String> {
    let mut url = Url::parse("http://localhost/api/behaviors/persona")?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("cannot build persona path"))?
        .push(id);
    Ok(url.path().to_string())
}

#[async_trait]
pub trait BehaviorApi {
    async fn fetch_config(&self) -> Result<BehaviorConfig>;
    async fn save_persona(&self, id: &str, persona: &Persona) -> Result<()>;
    async fn delete_persona(&self, id: &str) -> Result<()>;
    /// An empty `persona_id` removes the assignment.
    async fn assign(&self, kind: AssignTarget, target: &str, persona_id: &str) -> Result<()>;
    async fn set_default(&self, persona_id: &str) -> Result<()>;
    async fn save_guidelines(&self, text: &str) -> Result<()>;
}

#[async_trait]
impl BehaviorApi for ApiClient {
    async fn fetch_config(&self) -> Result<BehaviorConfig> {
        self.get_json("/api/behaviors/config").await
    }

    async fn save_persona(&self, id: &str, persona: &Persona) -> Result<()> {
        let path = "/api/behaviors/persona";
        let req = self
            .http()
            .post(self.url(path))
            .json(&json!({ "id": id, "name": persona.name, "prompt": persona.prompt }));
        let _: Value = self.send_json(req, path).await?;
        Ok(())
    }

    async fn delete_persona(&self, id: &str) -> Result<()> {
        let path = persona_path(id)?;
        let req = self.http().delete(self.url(&path));
        let _: Value = self.send_json(req, &path).await?;
        Ok(())
    }

    async fn assign(&self, kind: AssignTarget, target: &str, persona_id: &str) -> Result<()> {
        let path = format!("/api/behaviors/assign/{}", kind.as_str());
        let req = self.http().post(self.url(&path)).json(&assign_body(target, persona_id));
        let _: Value = self.send_json(req, &path).await?;
        Ok(())
    }

    async fn set_default(&self, persona_id: &str) -> Result<()> {
        let path = "/api/behaviors/default";
        let req = self.http().post(self.url(path)).json(&json!({ "personaId": persona_id }));
        let _: Value = self.send_json(req, path).await?;
        Ok(())
    }

    async fn save_guidelines(&self, text: &str) -> Result<()> {
        let path = "/api/behaviors/guidelines";
        let req = self.http().post(self.url(path)).json(&json!({ "text": text }));
        let _: Value = self.send_json(req, path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BehaviorConfig {
        serde_json::from_value(json!({
            "personas": {
                "normal": {"name": "Normal Bella", "prompt": "Be kind."},
                "devoted": {"name": "Devoted", "prompt": "Serve the owner."},
                "p_1": {"name": "", "prompt": ""}
            },
            "assignments": {
                "users": {"42": "normal"},
                "roles": {"Admin": "devoted", "Owner": "devoted"}
            },
            "default_persona": "normal",
            "global_guidelines": "No spoilers."
        }))
        .unwrap()
    }

    #[test]
    fn test_config_tolerates_missing_fields() {
        let cfg: BehaviorConfig = serde_json::from_value(json!({"personas": {}})).unwrap();
        assert!(cfg.assignments.users.is_empty());
        assert_eq!(cfg.default_persona, None);
    }

    #[test]
    fn test_persona_label_falls_back_to_id() {
        let cfg = sample();
        assert_eq!(cfg.persona_label("devoted"), "Devoted");
        assert_eq!(cfg.persona_label("ghost"), "ghost");
        assert_eq!(cfg.persona_label("p_1"), "p_1");
    }

    #[test]
    fn test_user_assignment_wins() {
        let cfg = sample();
        assert_eq!(cfg.resolve_persona("42", &["Admin"]), Some("normal"));
    }

    #[test]
    fn test_role_then_default() {
        let cfg = sample();
        assert_eq!(cfg.resolve_persona("7", &["Member", "Admin"]), Some("devoted"));
        assert_eq!(cfg.resolve_persona("7", &["Member"]), Some("normal"));
    }

    #[test]
    fn test_resolve_instruction_appends_guidelines() {
        let cfg = sample();
        assert_eq!(cfg.resolve_instruction("7", &["Owner"]), "Serve the owner.\n\nNo spoilers.");
    }

    #[test]
    fn test_persona_path_encodes_id() {
        assert_eq!(persona_path("p_1").unwrap(), "/api/behaviors/persona/p_1");
        assert_eq!(
            persona_path("a/b c?").unwrap(),
            "/api/behaviors/persona/a%2Fb%20c%3F"
        );
    }

    #[test]
    fn test_assign_body_carries_both_keys() {
        let body = assign_body("Admin", "devoted");
        assert_eq!(body["role"], "Admin");
        assert_eq!(body["userId"], "Admin");
        assert_eq!(body["personaId"], "devoted");
    }
}
