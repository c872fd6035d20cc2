use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Id of the JSON data island carrying the page configuration.
pub const CONFIG_ISLAND: &str = "ops-console-config";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PageConfig {
    pub endpoints: Endpoints,
    pub permissions: Permissions,
    /// Total shown in the results label; 0 means "use the row count"
    pub total_suppliers: usize,
    pub csrf_token: Option<String>,
    pub toast_duration_ms: u64,
    pub filter_debounce_ms: u64,
    pub search_debounce_ms: u64,
    pub catalog_debounce_ms: u64,
    pub banner_duration_ms: u64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            permissions: Permissions::default(),
            total_suppliers: 0,
            csrf_token: None,
            toast_duration_ms: 3200,
            filter_debounce_ms: 200,
            search_debounce_ms: 300,
            catalog_debounce_ms: 250,
            banner_duration_ms: 4000,
        }
    }
}

impl PageConfig {
    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    pub fn filter_debounce(&self) -> Duration {
        Duration::from_millis(self.filter_debounce_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn catalog_debounce(&self) -> Duration {
        Duration::from_millis(self.catalog_debounce_ms)
    }

    pub fn banner_duration(&self) -> Duration {
        Duration::from_millis(self.banner_duration_ms)
    }
}

/// Endpoint templates. `{id}` is replaced by the record id; an empty
/// template disables the action that needs it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Endpoints {
    pub stats: String,
    pub evaluators: String,
    pub edit: String,
    pub deactivate: String,
    pub issue_history: String,
    pub add_issue_action: String,
    pub search_procedures: String,
    pub procedure_catalog: String,
    pub evolve: String,
    pub cancel_observation: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            stats: "/feedback/suppliers/api/supplier/{id}/stats".into(),
            evaluators: "/feedback/suppliers/api/supplier/{id}/evaluators".into(),
            edit: "/feedback/suppliers/edit/{id}".into(),
            deactivate: "/feedback/suppliers/delete/{id}".into(),
            issue_history: "/feedback/suppliers/api/issue-history/{id}".into(),
            add_issue_action: "/feedback/suppliers/add-issue-action/{id}".into(),
            search_procedures: "/nir/search_procedures".into(),
            procedure_catalog: "/nir/procedures/search".into(),
            evolve: "/nir/observacao/{id}/evoluir".into(),
            cancel_observation: "/nir/observacao/{id}/cancelar".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Permissions {
    pub manage_evaluators: bool,
    pub edit_procedures: bool,
}

/// Substitutes the first `{id}` placeholder. Returns `None` when either the
/// template or the id is empty.
pub fn build_url(template: &str, id: &str) -> Option<String> {
    if template.is_empty() || id.is_empty() {
        return None;
    }
    Some(template.replacen("{id}", id, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_replaces_placeholder() {
        assert_eq!(
            build_url("/suppliers/{id}/stats", "42").as_deref(),
            Some("/suppliers/42/stats")
        );
        assert_eq!(build_url("", "42"), None);
        assert_eq!(build_url("/x/{id}", ""), None);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: PageConfig = serde_json::from_str(
            r#"{"total_suppliers": 12, "permissions": {"manage_evaluators": true}}"#,
        )
        .unwrap();
        assert_eq!(config.total_suppliers, 12);
        assert!(config.permissions.manage_evaluators);
        assert!(!config.permissions.edit_procedures);
        assert_eq!(config.toast_duration_ms, 3200);
        assert_eq!(config.endpoints.evolve, "/nir/observacao/{id}/evoluir");
    }
}
