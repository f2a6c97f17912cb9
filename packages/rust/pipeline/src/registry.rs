//! Pipeline definitions and the name → definition registry.

use std::collections::HashMap;
use std::sync::Arc;

use pagelens_contract::Contract;

use crate::error::PipelineError;
use crate::stage::Stage;

/// A named pipeline: its ordered stage list and overall contracts.
pub struct PipelineDefinition {
    /// Lookup name (e.g. `"url-report"`).
    pub name: String,
    /// One-line human description for listings.
    pub description: String,
    /// Stages in execution order.
    pub stages: Vec<Arc<dyn Stage>>,
    /// Contract the caller's input must satisfy.
    pub input_contract: Contract,
    /// Contract the final value satisfies on success.
    pub output_contract: Contract,
}

impl std::fmt::Debug for PipelineDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineDefinition")
            .field("name", &self.name)
            .field("stages", &self.stages.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Maps pipeline names to their definitions.
///
/// Built once at startup and passed by reference to the runner — there is
/// no process-wide global. Writes happen only during registration; runs
/// only read.
#[derive(Debug, Default)]
pub struct Registry {
    pipelines: HashMap<String, Arc<PipelineDefinition>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pipeline definition under its name.
    pub fn register(&mut self, definition: PipelineDefinition) -> Result<(), PipelineError> {
        if self.pipelines.contains_key(&definition.name) {
            return Err(PipelineError::DuplicateName {
                name: definition.name,
            });
        }
        tracing::debug!(pipeline = %definition.name, stages = definition.stages.len(), "registered pipeline");
        self.pipelines
            .insert(definition.name.clone(), Arc::new(definition));
        Ok(())
    }

    /// Resolve a pipeline by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<PipelineDefinition>, PipelineError> {
        self.pipelines
            .get(name)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownPipeline {
                name: name.to_string(),
            })
    }

    /// Names of all registered pipelines, sorted for stable listings.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.pipelines.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use async_trait::async_trait;
    use pagelens_contract::Contract;
    use pagelens_shared::Result;
    use serde_json::Value;

    struct NoopStage {
        contract: Contract,
    }

    impl NoopStage {
        fn new() -> Self {
            Self {
                contract: Contract::new("anything"),
            }
        }
    }

    #[async_trait]
    impl Stage for NoopStage {
        fn name(&self) -> &str {
            "noop"
        }
        fn input_contract(&self) -> &Contract {
            &self.contract
        }
        fn output_contract(&self) -> &Contract {
            &self.contract
        }
        async fn execute(&self, input: Value) -> Result<Value> {
            Ok(input)
        }
    }

    fn definition(name: &str) -> PipelineDefinition {
        PipelineDefinition {
            name: name.into(),
            description: "test pipeline".into(),
            stages: vec![Arc::new(NoopStage::new())],
            input_contract: Contract::new("in"),
            output_contract: Contract::new("out"),
        }
    }

    #[test]
    fn register_and_resolve() {
        let mut registry = Registry::new();
        registry.register(definition("url-report")).expect("register");
        let def = registry.resolve("url-report").expect("resolve");
        assert_eq!(def.stages.len(), 1);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut registry = Registry::new();
        registry.register(definition("url-report")).expect("first");
        let err = registry.register(definition("url-report")).unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateName { .. }));
        assert_eq!(err.kind(), "duplicate_name");
    }

    #[test]
    fn resolve_unknown_is_not_found() {
        let registry = Registry::new();
        let err = registry.resolve("missing").unwrap_err();
        assert!(matches!(err, PipelineError::UnknownPipeline { .. }));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn names_are_sorted() {
        let mut registry = Registry::new();
        registry.register(definition("zeta")).expect("register");
        registry.register(definition("alpha")).expect("register");
        assert_eq!(registry.names(), vec!["alpha", "zeta"]);
    }
}
