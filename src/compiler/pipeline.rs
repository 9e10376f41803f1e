//! Runs pipeline stages in order and records their results

use std::time::Instant;

use tracing::debug;

use super::error::CompileError;
use super::stage::{PipelineStage, StageContext, StageRecord};

/// Ordered list of stages
pub struct Pipeline {
    stages: Vec<Box<dyn PipelineStage>>,
}

impl Pipeline {
    /// Creates a pipeline with no stages
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Appends a stage
    pub fn add_stage<S: PipelineStage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Number of registered stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs every stage, stopping at the first failure
    ///
    /// Each stage's banner and result message are written to the context's
    /// log. On failure the error text is logged and returned.
    pub fn run(&self, ctx: &mut StageContext<'_>) -> Result<Vec<StageRecord>, CompileError> {
        let mut records = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            if let Some(banner) = stage.banner() {
                ctx.log.line(banner);
            }

            let start = Instant::now();
            let result = stage.run(ctx);
            let duration = start.elapsed();

            match result {
                Ok(outcome) => {
                    ctx.log.line(&outcome.message);
                    debug!(stage = stage.name(), ?duration, status = ?outcome.status, "Stage finished");
                    records.push(StageRecord {
                        name: stage.name(),
                        outcome,
                        duration,
                    });
                }
                Err(err) => {
                    ctx.log.error(err.to_string());
                    debug!(stage = stage.name(), ?duration, "Stage failed");
                    return Err(err);
                }
            }
        }

        Ok(records)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
