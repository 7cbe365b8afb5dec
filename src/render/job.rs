use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use crate::{
    cases::pairing::CaseImages,
    coords::resolve::ViewCoordinate,
    foundation::{
        error::{QcError, QcResult},
        ids::CaseId,
    },
};

/// One overlay to render: a case's two volumes, the shared view, and where to write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderJob {
    /// Case label.
    pub case: CaseId,
    /// Skeleton overlay volume.
    pub foreground: PathBuf,
    /// Warped anatomical background volume.
    pub background: PathBuf,
    /// View shared by every job of a run.
    pub coords: ViewCoordinate,
    /// Always `<output_dir>/<case>.png`.
    pub output: PathBuf,
}

/// Artifact path for `case` under `output_dir`.
pub fn artifact_path(output_dir: &Path, case: &CaseId) -> PathBuf {
    output_dir.join(case.artifact_file_name())
}

/// Build one job per paired case, in pairing order.
///
/// Fails if a case id cannot name a file directly under `output_dir`, or if
/// two cases would write the same artifact.
pub fn build_jobs(
    pairs: &[CaseImages],
    coords: ViewCoordinate,
    output_dir: &Path,
) -> QcResult<Vec<RenderJob>> {
    if let Some((case, why)) = pairs
        .iter()
        .find_map(|p| p.case.file_stem_problem().map(|why| (&p.case, why)))
    {
        return Err(QcError::discovery(format!(
            "case id '{case}' {why}; it cannot name an artifact in '{}'",
            output_dir.display()
        )));
    }
    let jobs: Vec<RenderJob> = pairs
        .iter()
        .map(|p| RenderJob {
            case: p.case.clone(),
            foreground: p.foreground.clone(),
            background: p.background.clone(),
            coords,
            output: artifact_path(output_dir, &p.case),
        })
        .collect();
    ensure_unique_outputs(&jobs)?;
    Ok(jobs)
}

pub(crate) fn ensure_unique_outputs(jobs: &[RenderJob]) -> QcResult<()> {
    let mut seen = BTreeSet::new();
    for job in jobs {
        if !seen.insert(job.output.as_path()) {
            return Err(QcError::config(format!(
                "case '{}' would overwrite artifact '{}' of another job",
                job.case,
                job.output.display()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/job.rs"]
mod tests;
