use crate::config::PipelineConfig;
use crate::errors::TransformError;
use crate::storage_var::StorageVarLowering;
use std::time::{Duration, Instant};
use stowage_core::{AstContext, NodeId};
use tracing::{debug, info};

pub trait TransformPass {
    /// Mnemonic used to select the pass from configuration and the command line.
    fn key(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        "No description provided"
    }

    fn run(&mut self, ctx: &mut AstContext, module: NodeId) -> Result<(), TransformError>;
}

pub type PassConstructor = fn() -> Box<dyn TransformPass>;

fn storage_var_lowering() -> Box<dyn TransformPass> {
    Box::new(StorageVarLowering::new())
}

/// Every pass the pipeline knows, in default running order.
pub const PASSES: &[(&str, PassConstructor)] = &[("Sv", storage_var_lowering)];

pub fn lookup_pass(key: &str) -> Option<Box<dyn TransformPass>> {
    PASSES
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, construct)| construct())
}

#[derive(Debug, Clone)]
pub struct PassStatistics {
    pub key: String,
    pub name: String,
    pub duration: Duration,
    pub nodes_after: usize,
}

pub struct Pipeline {
    passes: Vec<Box<dyn TransformPass>>,
    verify_after_each: bool,
    collect_stats: bool,
    statistics: Vec<PassStatistics>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            verify_after_each: true,
            collect_stats: false,
            statistics: Vec::new(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, TransformError> {
        let mut pipeline = Self::new();
        pipeline.verify_after_each = config.verify_after_each;
        pipeline.collect_stats = config.collect_stats;
        for key in &config.passes {
            let pass = lookup_pass(key).ok_or_else(|| TransformError::UnknownPass(key.clone()))?;
            pipeline.passes.push(pass);
        }
        Ok(pipeline)
    }

    pub fn with_pass(mut self, pass: Box<dyn TransformPass>) -> Self {
        self.passes.push(pass);
        self
    }

    pub fn pass_keys(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.key()).collect()
    }

    pub fn statistics(&self) -> &[PassStatistics] {
        &self.statistics
    }

    pub fn run(&mut self, ctx: &mut AstContext, module: NodeId) -> Result<(), TransformError> {
        self.run_with_observer(ctx, module, |_, _, _| Ok(()))
    }

    /// Runs every pass in order and calls `observer` after each one with the rewritten tree.
    pub fn run_with_observer<F>(
        &mut self,
        ctx: &mut AstContext,
        module: NodeId,
        mut observer: F,
    ) -> Result<(), TransformError>
    where
        F: FnMut(&dyn TransformPass, &AstContext, NodeId) -> Result<(), TransformError>,
    {
        for pass in self.passes.iter_mut() {
            info!(key = pass.key(), pass = pass.name(), "Running pass");
            let start = Instant::now();

            pass.run(ctx, module)?;

            if self.verify_after_each {
                ctx.verify(module)
                    .map_err(|source| TransformError::Verification {
                        pass: pass.name().to_string(),
                        source,
                    })?;
                debug!(pass = pass.name(), nodes = ctx.len(), "Tree verified");
            }

            if self.collect_stats {
                self.statistics.push(PassStatistics {
                    key: pass.key().to_string(),
                    name: pass.name().to_string(),
                    duration: start.elapsed(),
                    nodes_after: ctx.len(),
                });
            }

            observer(&**pass, &*ctx, module)?;
            info!(pass = pass.name(), elapsed = ?start.elapsed(), "Finished pass");
        }
        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        let mut pipeline = Self::new();
        for (_, construct) in PASSES {
            pipeline.passes.push(construct());
        }
        pipeline
    }
}

/// Runs every registered pass over `module` with the default configuration.
pub fn lower_module(ctx: &mut AstContext, module: NodeId) -> Result<(), TransformError> {
    Pipeline::default().run(ctx, module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Counting {
        runs: usize,
    }

    impl TransformPass for Counting {
        fn key(&self) -> &'static str {
            "Ct"
        }

        fn name(&self) -> &'static str {
            "counting"
        }

        fn run(&mut self, _ctx: &mut AstContext, _module: NodeId) -> Result<(), TransformError> {
            self.runs += 1;
            Ok(())
        }
    }

    struct Corrupting;

    impl TransformPass for Corrupting {
        fn key(&self) -> &'static str {
            "Cx"
        }

        fn name(&self) -> &'static str {
            "corrupting"
        }

        fn run(&mut self, ctx: &mut AstContext, module: NodeId) -> Result<(), TransformError> {
            let stray = ctx.alloc_leaf(stowage_core::NodeKind::Pass, None);
            ctx.try_node_mut(module)?.parent = Some(stray);
            Ok(())
        }
    }

    fn empty_module(ctx: &mut AstContext) -> NodeId {
        stowage_core::builder::TreeBuilder::new(ctx)
            .module(vec![])
            .unwrap()
    }

    #[test]
    fn test_lookup_by_key() {
        assert_eq!(lookup_pass("Sv").map(|p| p.name()), Some("storage-var-lowering"));
        assert!(lookup_pass("Xx").is_none());
    }

    #[test]
    fn test_unknown_pass_key() {
        let config = PipelineConfig::default().with_passes(["Sv", "Cf"]);
        match Pipeline::from_config(&config) {
            Err(TransformError::UnknownPass(key)) => assert_eq!(key, "Cf"),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected an unknown pass error"),
        }
    }

    #[test]
    fn test_passes_run_in_order_with_observer() {
        let mut ctx = AstContext::new();
        let module = empty_module(&mut ctx);
        let mut pipeline = Pipeline::new()
            .with_pass(Box::new(Counting { runs: 0 }))
            .with_pass(lookup_pass("Sv").unwrap());

        let mut observed = Vec::new();
        pipeline
            .run_with_observer(&mut ctx, module, |pass, _, _| {
                observed.push(pass.key());
                Ok(())
            })
            .unwrap();

        assert_eq!(observed, vec!["Ct", "Sv"]);
        assert_eq!(pipeline.pass_keys(), vec!["Ct", "Sv"]);
    }

    #[test]
    fn test_verification_names_the_pass() {
        let mut ctx = AstContext::new();
        let module = empty_module(&mut ctx);
        let mut pipeline = Pipeline::new().with_pass(Box::new(Corrupting));

        match pipeline.run(&mut ctx, module) {
            Err(TransformError::Verification { pass, .. }) => assert_eq!(pass, "corrupting"),
            other => panic!("expected verification failure, got {:?}", other),
        }
    }

    #[test]
    fn test_statistics_collected_when_enabled() {
        let mut ctx = AstContext::new();
        let module = empty_module(&mut ctx);
        let config = PipelineConfig {
            collect_stats: true,
            ..PipelineConfig::default()
        };
        let mut pipeline = Pipeline::from_config(&config).unwrap();
        pipeline.run(&mut ctx, module).unwrap();

        assert_eq!(pipeline.statistics().len(), 1);
        assert_eq!(pipeline.statistics()[0].key, "Sv");
        assert_eq!(pipeline.statistics()[0].nodes_after, 1);
    }
}
