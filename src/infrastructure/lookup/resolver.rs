//! Remote ABI resolution via an explorer API or a lookup proxy

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{FetchedInterface, InterfaceSource, LookupError};
use crate::domain::network::Network;

/// Where lookups are sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupMode {
    /// `GET {url}?address=..&network=..`
    Proxy { url: String },
    /// `GET {network.api_url}?module=contract&action=getabi&address=..&apikey=..`
    Explorer { api_key: Option<String> },
}

/// `{status, result}` envelope shared by Etherscan and the proxy
#[derive(Debug, Deserialize)]
struct LookupResponse {
    status: Value,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Value,
}

/// HTTP resolver
pub struct ExplorerResolver {
    http: reqwest::Client,
    mode: LookupMode,
}

impl ExplorerResolver {
    pub fn new(mode: LookupMode) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self { http, mode }
    }

    fn request(&self, network: &Network, address: &str) -> reqwest::RequestBuilder {
        match &self.mode {
            LookupMode::Proxy { url } => self
                .http
                .get(url)
                .query(&[("address", address), ("network", network.name.as_str())]),
            LookupMode::Explorer { api_key } => {
                let mut params = vec![
                    ("module", "contract"),
                    ("action", "getabi"),
                    ("address", address),
                ];
                if let Some(key) = api_key.as_deref().filter(|key| !key.is_empty()) {
                    params.push(("apikey", key));
                }
                self.http.get(&network.api_url).query(&params)
            }
        }
    }
}

#[async_trait]
impl InterfaceSource for ExplorerResolver {
    async fn fetch(
        &self,
        network: &Network,
        address: &str,
        _refresh: bool,
    ) -> Result<FetchedInterface, LookupError> {
        tracing::debug!(network = %network.name, %address, "looking up interface");
        let response = self
            .request(network, address)
            .send()
            .await
            .map_err(|err| LookupError::Http(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Http(format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|err| LookupError::Http(err.to_string()))?;
        let abi_json = parse_lookup_response(&body)?;
        Ok(FetchedInterface {
            abi_json,
            from_cache: false,
        })
    }
}

/// Extract the description from a `{status, result}` body.
///
/// `result` is normally the description as a JSON-encoded string, but an
/// inline array is accepted too.
pub fn parse_lookup_response(body: &str) -> Result<String, LookupError> {
    let response: LookupResponse =
        serde_json::from_str(body).map_err(|err| LookupError::Malformed(err.to_string()))?;

    let ok = matches!(&response.status, Value::String(status) if status == "1");

    if !ok {
        let reason = match response.result {
            Value::String(text) if !text.is_empty() => text,
            Value::Null => response
                .message
                .unwrap_or_else(|| "lookup failed".to_string()),
            other => other.to_string(),
        };
        return Err(LookupError::Rejected(reason));
    }

    match response.result {
        Value::String(text) => Ok(text),
        Value::Array(_) | Value::Object(_) => Ok(response.result.to_string()),
        _ => Err(LookupError::Malformed("missing result".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_with_encoded_result() {
        let body = r#"{"status":"1","message":"OK","result":"[{\"type\":\"function\",\"name\":\"a\"}]"}"#;
        let abi = parse_lookup_response(body).unwrap();
        assert_eq!(abi, r#"[{"type":"function","name":"a"}]"#);
    }

    #[test]
    fn test_success_with_inline_array() {
        let body = r#"{"status":"1","result":[{"type":"function","name":"a"}]}"#;
        let abi = parse_lookup_response(body).unwrap();
        assert!(abi.starts_with('['));
    }

    #[test]
    fn test_numeric_status_is_rejected() {
        let body = r#"{"status":1,"result":[{"type":"function","name":"a"}]}"#;
        assert!(matches!(
            parse_lookup_response(body),
            Err(LookupError::Rejected(_))
        ));
    }

    #[test]
    fn test_rejected_status_carries_result() {
        let body = r#"{"status":"0","message":"NOTOK","result":"Contract source code not verified"}"#;
        assert_eq!(
            parse_lookup_response(body),
            Err(LookupError::Rejected(
                "Contract source code not verified".to_string()
            ))
        );
    }

    #[test]
    fn test_rejected_without_result_uses_message() {
        let body = r#"{"status":"0","message":"Invalid API Key"}"#;
        assert_eq!(
            parse_lookup_response(body),
            Err(LookupError::Rejected("Invalid API Key".to_string()))
        );
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(
            parse_lookup_response("<html>502</html>"),
            Err(LookupError::Malformed(_))
        ));
        assert!(matches!(
            parse_lookup_response(r#"{"status":"1","result":null}"#),
            Err(LookupError::Malformed(_))
        ));
    }
}
