use crate::backend::error::ApiError;
use crate::backend::models::{
    ActionResponse, AssignedEvaluator, CatalogResponse, IssueHistoryResponse, ProcedureHit,
    ProcedureSearchResponse, SupplierSnapshot, UploadFile,
};
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Decodes a response body into `T`, naming the call in the error.
pub fn decode<T: DeserializeOwned>(body: &str, context: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|source| {
        warn!(context, error = %source, "response did not match the expected shape");
        ApiError::Decode { context: context.to_string(), source }
    })
}

/// Multipart payload of the tracking form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IssueActionPayload {
    pub csrf_token: Option<String>,
    pub action_type: String,
    pub description: String,
    pub attachments: Vec<UploadFile>,
}

/// Thin JSON client over `reqwest`. Relative paths are joined onto the page origin.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Option<Url>,
}

impl ApiClient {
    pub fn new(origin: &str) -> Self {
        let base = if origin.is_empty() {
            None
        } else {
            Url::parse(origin)
                .map_err(|e| warn!(%origin, error = %e, "page origin is not a valid url"))
                .ok()
        };
        Self { http: reqwest::Client::new(), base }
    }

    pub fn resolve(&self, path: &str) -> Result<Url, ApiError> {
        let joined = match &self.base {
            Some(base) => base.join(path),
            None => Url::parse(path),
        };
        joined.map_err(|e| ApiError::InvalidUrl { url: path.to_string(), reason: e.to_string() })
    }

    /// Resolves `path` and appends the search term as the `q` parameter.
    pub fn search_url(&self, path: &str, query: &str) -> Result<Url, ApiError> {
        let mut url = self.resolve(path)?;
        url.query_pairs_mut().append_pair("q", query);
        Ok(url)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: Url, context: &str) -> Result<T, ApiError> {
        debug!(%url, "GET");
        let resp = self.http.get(url.clone()).header("Accept", "application/json").send().await?;
        let status = resp.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "request failed");
            return Err(ApiError::Status { status: status.as_u16() });
        }
        let body = resp.text().await?;
        decode(&body, context)
    }

    pub async fn supplier_snapshot(&self, path: &str) -> Result<SupplierSnapshot, ApiError> {
        self.get_json(self.resolve(path)?, "supplier stats").await
    }

    pub async fn assigned_evaluators(&self, path: &str) -> Result<Vec<AssignedEvaluator>, ApiError> {
        self.get_json(self.resolve(path)?, "assigned evaluators").await
    }

    pub async fn issue_history(&self, path: &str) -> Result<IssueHistoryResponse, ApiError> {
        self.get_json(self.resolve(path)?, "issue history").await
    }

    pub async fn search_procedures(&self, path: &str, query: &str) -> Result<Vec<ProcedureHit>, ApiError> {
        let resp: ProcedureSearchResponse = self.get_json(self.search_url(path, query)?, "procedure search").await?;
        Ok(resp.results)
    }

    pub async fn search_catalog(&self, path: &str, query: &str) -> Result<Vec<ProcedureHit>, ApiError> {
        let resp: CatalogResponse = self.get_json(self.search_url(path, query)?, "procedure catalog").await?;
        Ok(resp.into_hits())
    }

    pub async fn add_issue_action(
        &self,
        path: &str,
        payload: IssueActionPayload,
    ) -> Result<ActionResponse, ApiError> {
        let url = self.resolve(path)?;
        let mut form = Form::new()
            .text("action_type", payload.action_type)
            .text("description", payload.description);
        if let Some(token) = payload.csrf_token {
            form = form.text("csrf_token", token);
        }
        for file in payload.attachments {
            let part = Part::bytes(file.bytes).file_name(file.name);
            let part = if file.mime_type.is_empty() { part } else { part.mime_str(&file.mime_type)? };
            form = form.part("attachments", part);
        }
        debug!(%url, "POST multipart");
        let resp = self.http.post(url.clone()).multipart(form).send().await?;
        let status = resp.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "add action failed");
            return Err(ApiError::Status { status: status.as_u16() });
        }
        let body = resp.text().await?;
        decode(&body, "add issue action")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_paths() {
        let api = ApiClient::new("https://hospital.local/");
        assert_eq!(api.resolve("/nir/observacao/3").unwrap().as_str(), "https://hospital.local/nir/observacao/3");
        assert_eq!(api.resolve("x").unwrap().as_str(), "https://hospital.local/x");
        assert_eq!(api.resolve("http://other/x").unwrap().as_str(), "http://other/x");
    }

    #[test]
    fn test_relative_path_without_origin_is_invalid() {
        let err = ApiClient::new("").resolve("/a").unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl { ref url, .. } if url == "/a"));
        assert_eq!(ApiClient::new("").resolve("http://h/a").unwrap().as_str(), "http://h/a");
    }

    #[test]
    fn test_search_query_is_form_encoded() {
        let api = ApiClient::new("https://hospital.local");
        let url = api.search_url("/nir/search_procedures", "04 ação&x").unwrap();
        assert_eq!(url.as_str(), "https://hospital.local/nir/search_procedures?q=04+a%C3%A7%C3%A3o%26x");

        let url = api.search_url("/nir/procedures/search?limit=5", "ab").unwrap();
        assert_eq!(url.query(), Some("limit=5&q=ab"));
    }

    #[test]
    fn test_decode_reports_context() {
        let err = decode::<IssueHistoryResponse>("{\"history\": 3}", "issue history").unwrap_err();
        assert!(matches!(err, ApiError::Decode { ref context, .. } if context == "issue history"));

        let ok: IssueHistoryResponse = decode(r#"{"success": true, "history": []}"#, "issue history").unwrap();
        assert!(ok.success);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_network_error() {
        let api = ApiClient::new("http://127.0.0.1:9");
        let err = api.issue_history("/feedback/suppliers/api/issue-history/1").await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }
}
