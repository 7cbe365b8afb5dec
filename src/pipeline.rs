use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    cases::{
        caselist::read_cases,
        pairing::{ImageLayout, PairingMode, discover_images, pair},
    },
    coords::resolve::{ViewCoordinate, resolve_view_coordinate},
    foundation::error::{QcError, QcResult},
    render::{
        engine::RenderEngine,
        job::build_jobs,
        pool::{ParallelRenderer, RenderSummary},
    },
    report::html::{REPORT_FILE_NAME, Report, write_report},
};

/// Name of the per-modality output directory.
pub const OUTPUT_DIR_NAME: &str = "slicesdir";

/// What to do with the report when some cases fail to render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Write no report; the run fails with every failed case listed.
    #[default]
    Abort,
    /// Write a report of the rendered cases that flags the omitted ones, then fail.
    Partial,
}

/// Settings for one QC run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QcConfig {
    /// Study output directory containing one subdirectory per modality.
    pub root: PathBuf,
    /// Modality subdirectory (`FA`, `MD`, ...).
    pub modality: String,
    /// Case-list file; `None` means `<root>/log/caselist.txt`.
    pub cases_path: Option<PathBuf>,
    /// Render pool size.
    pub workers: usize,
    /// Coordinate spec: `enigma`, `fmrib`, `auto`, or `x,y,z`.
    pub cut_coords: String,
    /// Input file naming.
    pub layout: ImageLayout,
    /// Case-to-image assignment.
    pub pairing: PairingMode,
    /// Report behaviour on render failures.
    pub on_failure: FailurePolicy,
}

impl QcConfig {
    /// Defaults for everything except the study root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            modality: "FA".to_string(),
            cases_path: None,
            workers: 4,
            cut_coords: "auto".to_string(),
            layout: ImageLayout::default(),
            pairing: PairingMode::default(),
            on_failure: FailurePolicy::default(),
        }
    }

    /// Check settings that can be judged without touching the filesystem.
    pub fn validate(&self) -> QcResult<ViewCoordinate> {
        if self.modality.is_empty() {
            return Err(QcError::config("modality must not be empty"));
        }
        if self.workers == 0 {
            return Err(QcError::config("worker count must be >= 1"));
        }
        if self.layout.image_ext.is_empty() || self.layout.image_ext.starts_with('.') {
            return Err(QcError::config(
                "image extension must be non-empty and given without a leading '.'",
            ));
        }
        resolve_view_coordinate(&self.cut_coords)
    }

    /// `<root>/<modality>`
    pub fn modality_dir(&self) -> PathBuf {
        self.root.join(&self.modality)
    }

    /// `<root>/<modality>/slicesdir`
    pub fn output_dir(&self) -> PathBuf {
        self.modality_dir().join(OUTPUT_DIR_NAME)
    }

    /// Configured case list, or `<root>/log/caselist.txt`.
    pub fn cases_path(&self) -> PathBuf {
        self.cases_path
            .clone()
            .unwrap_or_else(|| self.root.join("log").join("caselist.txt"))
    }
}

/// Result of a fully successful run.
#[derive(Clone, Debug)]
pub struct PipelineReport {
    /// Written `summary.html`.
    pub report_path: PathBuf,
    /// Per-case render outcomes.
    pub summary: RenderSummary,
}

/// Resolve, pair, render every case, then write the report.
///
/// Any configuration or discovery problem fails before rendering starts. Render
/// failures never interrupt other jobs; they are reported together once every
/// job has finished, and [`FailurePolicy`] decides whether a report is written.
#[tracing::instrument(level = "info", skip_all, fields(root = %config.root.display(), modality = %config.modality))]
pub fn run_pipeline(config: &QcConfig, engine: &dyn RenderEngine) -> QcResult<PipelineReport> {
    let coords = config.validate()?;
    tracing::info!(%coords, "resolved view coordinate");

    let cases = read_cases(&config.cases_path())?;
    let images = discover_images(&config.modality_dir(), &config.layout)?;
    let pairs = pair(&images, &cases, config.pairing)?;

    let output_dir = config.output_dir();
    ensure_dir(&output_dir)?;
    let jobs = build_jobs(&pairs, coords, &output_dir)?;

    let renderer = ParallelRenderer::new(config.workers)?;
    let summary = renderer.render_all(&jobs, engine)?;

    let report = Report::from_summary(&summary);
    let summary = match summary.into_result() {
        Ok(summary) => summary,
        Err(err) => {
            if config.on_failure == FailurePolicy::Partial {
                write_report(&output_dir, &report)?;
            } else {
                tracing::warn!("render failures; report not written");
                remove_stale_report(&output_dir);
            }
            return Err(err);
        }
    };

    let report_path = write_report(&output_dir, &report)?;
    Ok(PipelineReport {
        report_path,
        summary,
    })
}

fn remove_stale_report(output_dir: &Path) {
    let path = output_dir.join(REPORT_FILE_NAME);
    match std::fs::remove_file(&path) {
        Ok(()) => tracing::info!(path = %path.display(), "removed report from an earlier run"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove earlier report"),
    }
}

fn ensure_dir(dir: &Path) -> QcResult<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory '{}'", dir.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
