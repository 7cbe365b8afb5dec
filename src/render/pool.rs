use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    path::{Path, PathBuf},
};

use rayon::prelude::*;

use crate::{
    foundation::{
        error::{CaseFailure, QcError, QcResult},
        ids::CaseId,
    },
    render::{
        engine::{RenderEngine, verify_artifact},
        job::{RenderJob, ensure_unique_outputs},
    },
};

/// Result of one render job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The engine succeeded and the artifact is a readable PNG.
    Rendered {
        /// Case label.
        case: CaseId,
        /// Written PNG.
        artifact: PathBuf,
    },
    /// The engine failed, panicked, or left no usable artifact.
    Failed(CaseFailure),
}

impl RenderOutcome {
    /// Case this outcome belongs to.
    pub fn case(&self) -> &CaseId {
        match self {
            Self::Rendered { case, .. } => case,
            Self::Failed(f) => &f.case,
        }
    }
}

/// Every job's outcome, in job order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// One entry per dispatched job.
    pub outcomes: Vec<RenderOutcome>,
}

impl RenderSummary {
    /// Cases with a confirmed artifact, paired with its path.
    pub fn rendered(&self) -> impl Iterator<Item = (&CaseId, &PathBuf)> {
        self.outcomes.iter().filter_map(|o| match o {
            RenderOutcome::Rendered { case, artifact } => Some((case, artifact)),
            RenderOutcome::Failed(_) => None,
        })
    }

    /// Failed cases.
    pub fn failures(&self) -> impl Iterator<Item = &CaseFailure> {
        self.outcomes.iter().filter_map(|o| match o {
            RenderOutcome::Failed(f) => Some(f),
            RenderOutcome::Rendered { .. } => None,
        })
    }

    /// True when no job failed.
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// `Ok(self)` when every job succeeded, otherwise one [`QcError::Render`]
    /// naming every failed case.
    pub fn into_result(self) -> QcResult<Self> {
        let failed: Vec<CaseFailure> = self.failures().cloned().collect();
        if failed.is_empty() {
            Ok(self)
        } else {
            Err(QcError::Render { failed })
        }
    }
}

/// Fixed-size worker pool that renders one job per case.
pub struct ParallelRenderer {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl std::fmt::Debug for ParallelRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelRenderer")
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

impl ParallelRenderer {
    /// Build a pool of exactly `workers` threads.
    pub fn new(workers: usize) -> QcResult<Self> {
        if workers == 0 {
            return Err(QcError::config("worker count must be >= 1"));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("skelqc-render-{i}"))
            .build()
            .map_err(|e| QcError::config(format!("failed to build render thread pool: {e}")))?;
        Ok(Self { pool, workers })
    }

    /// Configured pool size.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Render every job and wait for all of them, whatever their individual result.
    ///
    /// Only a malformed job list is an error here; job failures are reported
    /// through the returned [`RenderSummary`].
    #[tracing::instrument(level = "info", skip_all, fields(jobs = jobs.len(), workers = self.workers, engine = engine.name()))]
    pub fn render_all(
        &self,
        jobs: &[RenderJob],
        engine: &dyn RenderEngine,
    ) -> QcResult<RenderSummary> {
        ensure_unique_outputs(jobs)?;

        let outcomes = self.pool.install(|| {
            jobs.par_iter()
                .map(|job| render_one(job, engine))
                .collect::<Vec<_>>()
        });
        let summary = RenderSummary { outcomes };

        let failed = summary.failures().count();
        tracing::info!(
            rendered = summary.outcomes.len() - failed,
            failed,
            "render pass finished"
        );
        Ok(summary)
    }
}

fn render_one(job: &RenderJob, engine: &dyn RenderEngine) -> RenderOutcome {
    tracing::info!(case = %job.case, "rendering overlay");

    // An artifact left by an earlier run must not pass verification for this one.
    let result = clear_artifact(&job.output)
        .and_then(|()| {
            catch_unwind(AssertUnwindSafe(|| engine.render(job)))
                .unwrap_or_else(|panic| Err(QcError::render_job(panic_message(panic.as_ref()))))
        })
        .and_then(|()| verify_artifact(&job.output));

    match result {
        Ok(_) => RenderOutcome::Rendered {
            case: job.case.clone(),
            artifact: job.output.clone(),
        },
        Err(e) => {
            tracing::warn!(case = %job.case, error = %e, "render failed");
            RenderOutcome::Failed(CaseFailure {
                case: job.case.clone(),
                reason: e.to_string(),
            })
        }
    }
}

fn clear_artifact(path: &Path) -> QcResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed artifact from earlier run");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(QcError::render_job(format!(
            "failed to clear earlier artifact '{}': {e}",
            path.display()
        ))),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("engine panicked: {detail}")
}

#[cfg(test)]
#[path = "../../tests/unit/render/pool.rs"]
mod tests;
