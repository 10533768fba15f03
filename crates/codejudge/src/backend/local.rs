use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use crate::backend::ExecutionBackend;
use crate::registry::LanguageRegistry;
use crate::runner::Runner;
use crate::types::ExecutionRequest;
use crate::verdict::{Judgement, Verdict};

/// Runs the local compile/execute pipeline
///
/// Each submission is judged on its own tokio task. If that task panics the
/// caller gets a `SystemError`, and if the caller goes away the task still
/// runs to completion and releases its workspace.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    runner: Arc<Runner>,
}

impl LocalBackend {
    pub fn new(runner: Runner) -> Self {
        Self {
            runner: Arc::new(runner),
        }
    }
}

#[async_trait]
impl ExecutionBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    fn registry(&self) -> &LanguageRegistry {
        self.runner.registry()
    }

    async fn judge(&self, request: ExecutionRequest) -> Judgement {
        let runner = Arc::clone(&self.runner);
        match tokio::spawn(async move { runner.judge(&request).await }).await {
            Ok(judgement) => judgement,
            Err(e) => {
                error!(error = %e, "judging task did not complete");
                Judgement::early(Verdict::SystemError)
            }
        }
    }
}
