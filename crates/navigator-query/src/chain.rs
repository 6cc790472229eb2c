use std::sync::Arc;

use navigator_core::error::{NavigatorError, Result};
use navigator_core::traits::OperationFactory;
use navigator_core::types::{Operation, OperationChain};

/// Wraps user operations into executable operation chains.
pub struct ChainBuilder {
    factory: Arc<dyn OperationFactory>,
}

impl ChainBuilder {
    pub fn new(factory: Arc<dyn OperationFactory>) -> Self {
        Self { factory }
    }

    /// Build a chain from `operations`, in order.
    ///
    /// With `append_defaults` the chain ends with a fresh limit operation
    /// followed by a fresh deduplicate operation.
    pub fn build_chain(
        &self,
        operations: &[Operation],
        append_defaults: bool,
    ) -> Result<OperationChain> {
        if operations.is_empty() {
            return Err(NavigatorError::InvalidChain(
                "chain needs at least one operation".into(),
            ));
        }

        let mut ops = operations.to_vec();
        if append_defaults {
            ops.push(self.factory.create_limit_operation()?);
            ops.push(self.factory.create_deduplicate_operation()?);
        }
        Ok(OperationChain::new(ops))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{GafferOperationFactory, LIMIT_CLASS, TO_SET_CLASS};
    use navigator_core::config::DefaultsConfig;
    use serde_json::json;

    fn builder() -> ChainBuilder {
        ChainBuilder::new(Arc::new(GafferOperationFactory::default()))
    }

    fn get_elements() -> Operation {
        Operation::new(json!({
            "class": "uk.gov.gchq.gaffer.operation.impl.get.GetElements",
            "input": [{"class": "uk.gov.gchq.gaffer.operation.data.EntitySeed", "vertex": "M5"}]
        }))
    }

    #[test]
    fn test_defaults_appended_in_order() {
        let op = get_elements();
        let chain = builder().build_chain(&[op.clone()], true).unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.operations()[0], op);
        assert_eq!(chain.operations()[1].class(), Some(LIMIT_CLASS));
        assert_eq!(chain.operations()[2].class(), Some(TO_SET_CLASS));
    }

    #[test]
    fn test_without_defaults_keeps_only_input() {
        let op = get_elements();
        let chain = builder().build_chain(&[op.clone()], false).unwrap();
        assert_eq!(chain.operations(), &[op]);
    }

    #[test]
    fn test_input_not_mutated() {
        let ops = vec![get_elements(), Operation::new(json!({"class": "x.Filter"}))];
        let before = ops.clone();
        let chain = builder().build_chain(&ops, true).unwrap();
        assert_eq!(ops, before);
        assert_eq!(&chain.operations()[..2], &before[..]);
    }

    #[test]
    fn test_repeated_builds_are_equal() {
        let ops = vec![get_elements()];
        let b = builder();
        assert_eq!(
            b.build_chain(&ops, true).unwrap(),
            b.build_chain(&ops, true).unwrap()
        );
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(
            builder().build_chain(&[], false),
            Err(NavigatorError::InvalidChain(_))
        ));
    }

    #[test]
    fn test_factory_failure_propagates() {
        let b = ChainBuilder::new(Arc::new(GafferOperationFactory::new(DefaultsConfig {
            result_limit: 0,
            truncate: true,
        })));
        assert!(b.build_chain(&[get_elements()], true).is_err());
        assert_eq!(b.build_chain(&[get_elements()], false).unwrap().len(), 1);
    }
}
