use std::collections::HashSet;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use tracing::debug;

use navigator_core::config::GatewayConfig;
use navigator_core::error::{NavigatorError, Result};
use navigator_core::traits::{ExecutionGateway, PendingResult};

/// Posts operation chains to a Gaffer REST endpoint.
pub struct HttpGateway {
    http: Client,
    url: String,
    supported: Option<HashSet<String>>,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| NavigatorError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: config.execute_url(),
            supported: config
                .supported_operations
                .as_ref()
                .map(|classes| classes.iter().cloned().collect()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Reject bodies the service would refuse, before sending anything.
    fn validate(&self, body: &str) -> Result<()> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        if value.get("class").and_then(|c| c.as_str()).is_none() {
            return Err(NavigatorError::Rejected("missing chain class".into()));
        }
        let operations = value
            .get("operations")
            .and_then(|o| o.as_array())
            .ok_or_else(|| NavigatorError::Rejected("missing operations array".into()))?;
        if operations.is_empty() {
            return Err(NavigatorError::Rejected("chain has no operations".into()));
        }

        for op in operations {
            let class = op
                .get("class")
                .and_then(|c| c.as_str())
                .ok_or_else(|| NavigatorError::Rejected("operation without class".into()))?;
            if let Some(ref supported) = self.supported {
                if !supported.contains(class) {
                    return Err(NavigatorError::UnsupportedOperation(class.to_string()));
                }
            }
        }
        Ok(())
    }
}

impl ExecutionGateway for HttpGateway {
    fn submit(&self, body: String) -> Result<PendingResult> {
        self.validate(&body)?;

        let http = self.http.clone();
        let url = self.url.clone();
        Ok(Box::pin(async move {
            debug!(url = %url, bytes = body.len(), "Posting operation chain");
            let resp = http
                .post(&url)
                .header(CONTENT_TYPE, "application/json")
                .header(ACCEPT, "application/json")
                .body(body)
                .send()
                .await
                .map_err(|e| NavigatorError::GatewayRequest(e.to_string()))?;

            let status = resp.status();
            let text = resp
                .text()
                .await
                .map_err(|e| NavigatorError::GatewayRequest(e.to_string()))?;
            if !status.is_success() {
                return Err(NavigatorError::GatewayStatus {
                    status: status.as_u16(),
                    body: text,
                });
            }

            if text.trim().is_empty() {
                Ok(serde_json::Value::Null)
            } else {
                Ok(serde_json::from_str(&text)?)
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gateway(supported: Option<Vec<&str>>) -> HttpGateway {
        HttpGateway::new(&GatewayConfig {
            endpoint: "http://127.0.0.1:9".into(),
            timeout_secs: Some(2),
            supported_operations: supported.map(|s| s.into_iter().map(String::from).collect()),
            ..Default::default()
        })
        .unwrap()
    }

    fn body(classes: &[&str]) -> String {
        json!({
            "class": "uk.gov.gchq.gaffer.operation.OperationChain",
            "operations": classes.iter().map(|c| json!({"class": c})).collect::<Vec<_>>()
        })
        .to_string()
    }

    #[test]
    fn test_url_from_config() {
        assert_eq!(
            gateway(None).url(),
            "http://127.0.0.1:9/graph/operations/execute"
        );
    }

    #[test]
    fn test_malformed_body_rejected() {
        assert!(matches!(
            gateway(None).submit("{not json".into()),
            Err(NavigatorError::Json(_))
        ));
    }

    #[test]
    fn test_empty_chain_rejected() {
        assert!(matches!(
            gateway(None).submit(body(&[])),
            Err(NavigatorError::Rejected(_))
        ));
    }

    #[test]
    fn test_operation_without_class_rejected() {
        let raw = json!({"class": "c", "operations": [{"input": []}]}).to_string();
        assert!(matches!(
            gateway(None).submit(raw),
            Err(NavigatorError::Rejected(_))
        ));
    }

    #[test]
    fn test_unsupported_default_rejected() {
        let gw = gateway(Some(vec!["a.GetElements", "a.Limit"]));
        assert!(gw.submit(body(&["a.GetElements", "a.Limit"])).is_ok());
        match gw.submit(body(&["a.GetElements", "a.Limit", "a.ToSet"])) {
            Err(NavigatorError::UnsupportedOperation(class)) => assert_eq!(class, "a.ToSet"),
            other => panic!("expected rejection, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_unreachable_service_fails_asynchronously() {
        let pending = gateway(None).submit(body(&["a.GetElements"])).unwrap();
        assert!(matches!(
            pending.await,
            Err(NavigatorError::GatewayRequest(_))
        ));
    }
}
