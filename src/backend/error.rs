use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    /// Request never produced a response (offline, CORS, DNS)
    Network(String),

    /// Server answered with a non-2xx status
    Status { status: u16 },

    /// Response body did not match the expected shape
    Decode { context: String, source: serde_json::Error },

    /// Endpoint could not be turned into an absolute url
    InvalidUrl { url: String, reason: String },

    /// No endpoint template configured for this action
    MissingEndpoint(&'static str),

    /// Server answered `success: false`
    Rejected(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "Falha de rede: {}", msg),
            ApiError::Status { status } => write!(f, "Erro {}", status),
            ApiError::Decode { context, source } => {
                write!(f, "Resposta inválida ({}): {}", context, source)
            }
            ApiError::InvalidUrl { url, reason } => write!(f, "URL inválida '{}': {}", url, reason),
            ApiError::MissingEndpoint(name) => {
                write!(f, "Endpoint '{}' não configurado", name)
            }
            ApiError::Rejected(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ApiError::Status { status: status.as_u16() },
            None => ApiError::Network(err.to_string()),
        }
    }
}

/// Failure reading one of the JSON data islands the server embeds in the page.
#[derive(Debug)]
pub enum DataError {
    Missing(String),
    Malformed { island: String, source: serde_json::Error },
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Missing(island) => write!(f, "Data island '{}' not found", island),
            DataError::Malformed { island, source } => {
                write!(f, "Data island '{}' is malformed: {}", island, source)
            }
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Malformed { source, .. } => Some(source),
            DataError::Missing(_) => None,
        }
    }
}

/// Decodes the text content of a data island, trimming surrounding whitespace.
pub fn decode_island<T: serde::de::DeserializeOwned>(
    island: &str,
    text: Option<&str>,
) -> Result<T, DataError> {
    let text = text.ok_or_else(|| DataError::Missing(island.to_string()))?;
    serde_json::from_str(text.trim()).map_err(|source| DataError::Malformed {
        island: island.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_status_error_reads_like_fetch_wrapper() {
        let err = ApiError::Status { status: 404 };
        assert_eq!(err.to_string(), "Erro 404");
    }

    #[test]
    fn test_decode_island_trims_and_parses() {
        let parsed: HashMap<String, u32> =
            decode_island("counts", Some("\n   {\"a\": 1}\n  ")).unwrap();
        assert_eq!(parsed["a"], 1);
    }

    #[test]
    fn test_decode_island_reports_missing_and_malformed() {
        let missing = decode_island::<Vec<u8>>("rows", None).unwrap_err();
        assert!(matches!(missing, DataError::Missing(ref id) if id == "rows"));

        let malformed = decode_island::<Vec<u8>>("rows", Some("{not json")).unwrap_err();
        assert!(matches!(malformed, DataError::Malformed { .. }));
        assert!(malformed.to_string().contains("rows"));
    }
}
