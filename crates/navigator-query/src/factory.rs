use serde::Serialize;

use navigator_core::config::DefaultsConfig;
use navigator_core::error::{NavigatorError, Result};
use navigator_core::traits::OperationFactory;
use navigator_core::types::Operation;

pub const LIMIT_CLASS: &str = "uk.gov.gchq.gaffer.operation.impl.Limit";
pub const TO_SET_CLASS: &str = "uk.gov.gchq.gaffer.operation.impl.output.ToSet";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LimitOperation<'a> {
    class: &'a str,
    result_limit: u64,
    truncate: bool,
}

#[derive(Serialize)]
struct ToSetOperation<'a> {
    class: &'a str,
}

/// Builds Gaffer `Limit` and `ToSet` operations from the configured defaults.
pub struct GafferOperationFactory {
    defaults: DefaultsConfig,
}

impl GafferOperationFactory {
    pub fn new(defaults: DefaultsConfig) -> Self {
        Self { defaults }
    }
}

impl Default for GafferOperationFactory {
    fn default() -> Self {
        Self::new(DefaultsConfig::default())
    }
}

impl OperationFactory for GafferOperationFactory {
    fn create_limit_operation(&self) -> Result<Operation> {
        if self.defaults.result_limit == 0 {
            return Err(NavigatorError::DefaultOperation {
                operation: LIMIT_CLASS.to_string(),
                message: "result limit is not configured".to_string(),
            });
        }
        let op = LimitOperation {
            class: LIMIT_CLASS,
            result_limit: self.defaults.result_limit,
            truncate: self.defaults.truncate,
        };
        Ok(Operation::new(serde_json::to_value(op)?))
    }

    fn create_deduplicate_operation(&self) -> Result<Operation> {
        let op = ToSetOperation {
            class: TO_SET_CLASS,
        };
        Ok(Operation::new(serde_json::to_value(op)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_limit_uses_configured_values() {
        let factory = GafferOperationFactory::new(DefaultsConfig {
            result_limit: 50,
            truncate: false,
        });
        let op = factory.create_limit_operation().unwrap();
        assert_eq!(
            op.0,
            json!({"class": LIMIT_CLASS, "resultLimit": 50, "truncate": false})
        );
    }

    #[test]
    fn test_zero_limit_is_unavailable() {
        let factory = GafferOperationFactory::new(DefaultsConfig {
            result_limit: 0,
            truncate: true,
        });
        assert!(matches!(
            factory.create_limit_operation(),
            Err(NavigatorError::DefaultOperation { .. })
        ));
    }

    #[test]
    fn test_deduplicate_is_to_set() {
        let op = GafferOperationFactory::default()
            .create_deduplicate_operation()
            .unwrap();
        assert_eq!(op.class(), Some(TO_SET_CLASS));
    }
}
