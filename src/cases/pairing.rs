use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use crate::foundation::{
    error::{QcError, QcResult},
    ids::CaseId,
};

/// Subdirectory holding skeleton (foreground) images.
pub const SKELETON_DIR: &str = "skeleton";
/// Subdirectory holding warped anatomical (background) images.
pub const WARPED_DIR: &str = "warped";

/// File naming convention for one modality directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageLayout {
    /// Volume file extension without the leading dot.
    pub image_ext: String,
}

impl Default for ImageLayout {
    fn default() -> Self {
        Self {
            image_ext: "nii.gz".to_string(),
        }
    }
}

impl ImageLayout {
    /// Suffix shared by every foreground file name.
    pub fn skeleton_suffix(&self) -> String {
        format!("_to_target_skel.{}", self.image_ext)
    }

    /// Suffix shared by every background file name.
    pub fn warped_suffix(&self) -> String {
        format!("_to_target.{}", self.image_ext)
    }
}

/// A discovered volume file plus its name with the category suffix removed.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ImageRef {
    /// Stripped file name, used for case matching.
    pub stem: String,
    /// Full path to the volume.
    pub path: PathBuf,
}

/// Foreground and background files found under a modality directory, each sorted by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiscoveredImages {
    /// `skeleton/*_to_target_skel.<ext>`
    pub foreground: Vec<ImageRef>,
    /// `warped/*_to_target.<ext>`
    pub background: Vec<ImageRef>,
}

/// Input images for one case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseImages {
    /// Case label.
    pub case: CaseId,
    /// Skeleton overlay.
    pub foreground: PathBuf,
    /// Warped anatomical background.
    pub background: PathBuf,
}

/// How discovered files are assigned to cases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PairingMode {
    /// Match every case to its own files by id; fail on any gap or ambiguity.
    #[default]
    ByCase,
    /// Sort all three lists independently and zip by index, truncating to the shortest.
    Positional,
}

/// List the foreground and background files of a modality directory.
pub fn discover_images(modality_dir: &Path, layout: &ImageLayout) -> QcResult<DiscoveredImages> {
    let foreground = list_with_suffix(
        &modality_dir.join(SKELETON_DIR),
        &layout.skeleton_suffix(),
    )?;
    let background = list_with_suffix(&modality_dir.join(WARPED_DIR), &layout.warped_suffix())?;
    tracing::debug!(
        foreground = foreground.len(),
        background = background.len(),
        dir = %modality_dir.display(),
        "discovered images"
    );
    Ok(DiscoveredImages {
        foreground,
        background,
    })
}

fn list_with_suffix(dir: &Path, suffix: &str) -> QcResult<Vec<ImageRef>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        QcError::discovery(format!("failed to read image dir '{}': {e}", dir.display()))
    })?;

    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            QcError::discovery(format!("failed to list image dir '{}': {e}", dir.display()))
        })?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(stem) = name.strip_suffix(suffix) else {
            continue;
        };
        if stem.is_empty() {
            continue;
        }
        out.push(ImageRef {
            stem: stem.to_string(),
            path: entry.path(),
        });
    }
    out.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(out)
}

/// Assign images to cases using `mode`. Output is in sorted case order.
pub fn pair(
    images: &DiscoveredImages,
    cases: &[CaseId],
    mode: PairingMode,
) -> QcResult<Vec<CaseImages>> {
    match mode {
        PairingMode::ByCase => pair_by_case(images, cases),
        PairingMode::Positional => Ok(pair_positional(images, cases)),
    }
}

/// Sort foreground, background and cases independently and pair index `i` of each.
///
/// Pairs `min(len)` entries; any surplus in the longer lists is dropped.
pub fn pair_positional(images: &DiscoveredImages, cases: &[CaseId]) -> Vec<CaseImages> {
    let mut fg: Vec<&ImageRef> = images.foreground.iter().collect();
    let mut bg: Vec<&ImageRef> = images.background.iter().collect();
    let mut cases: Vec<&CaseId> = cases.iter().collect();
    fg.sort_by(|a, b| a.path.cmp(&b.path));
    bg.sort_by(|a, b| a.path.cmp(&b.path));
    cases.sort();

    if fg.len() != bg.len() || fg.len() != cases.len() {
        tracing::warn!(
            foreground = fg.len(),
            background = bg.len(),
            cases = cases.len(),
            "image and case counts differ; pairing truncates to the shortest list"
        );
    }

    fg.into_iter()
        .zip(bg)
        .zip(cases)
        .map(|((fg, bg), case)| CaseImages {
            case: case.clone(),
            foreground: fg.path.clone(),
            background: bg.path.clone(),
        })
        .collect()
}

/// Match every case to exactly one foreground and one background by id.
///
/// A file matches a case when its stem equals the id, or, failing any exact
/// match, when the id occurs in the stem bounded by non-alphanumeric characters.
/// All missing, ambiguous, and duplicate cases are reported together.
pub fn pair_by_case(images: &DiscoveredImages, cases: &[CaseId]) -> QcResult<Vec<CaseImages>> {
    let mut sorted: Vec<&CaseId> = cases.iter().collect();
    sorted.sort();

    let mut problems = Vec::new();
    let mut seen = BTreeSet::new();
    for case in &sorted {
        if !seen.insert(case.as_str()) {
            problems.push(format!("case '{case}' is listed more than once"));
        }
    }
    sorted.dedup();

    let mut claims: BTreeMap<&Path, Vec<&CaseId>> = BTreeMap::new();
    let mut out = Vec::with_capacity(sorted.len());
    for case in sorted {
        let fg = match_one(&images.foreground, case, "skeleton", &mut problems);
        let bg = match_one(&images.background, case, "warped", &mut problems);
        if let (Some(fg), Some(bg)) = (fg, bg) {
            claims.entry(fg.path.as_path()).or_default().push(case);
            claims.entry(bg.path.as_path()).or_default().push(case);
            out.push(CaseImages {
                case: case.clone(),
                foreground: fg.path.clone(),
                background: bg.path.clone(),
            });
        }
    }

    for (path, owners) in &claims {
        if owners.len() > 1 {
            let names: Vec<&str> = owners.iter().map(|c| c.as_str()).collect();
            problems.push(format!(
                "image '{}' matches several cases: {}",
                path.display(),
                names.join(", ")
            ));
        }
    }

    if !problems.is_empty() {
        return Err(QcError::discovery(format!(
            "cannot pair images with cases: {}",
            problems.join("; ")
        )));
    }
    Ok(out)
}

fn match_one<'a>(
    candidates: &'a [ImageRef],
    case: &CaseId,
    kind: &str,
    problems: &mut Vec<String>,
) -> Option<&'a ImageRef> {
    let id = case.as_str();
    let exact: Vec<&ImageRef> = candidates.iter().filter(|c| c.stem == id).collect();
    let found: Vec<&ImageRef> = if exact.is_empty() {
        candidates
            .iter()
            .filter(|c| contains_token(&c.stem, id))
            .collect()
    } else {
        exact
    };

    match found.as_slice() {
        [one] => Some(*one),
        [] => {
            problems.push(format!("case '{case}' has no {kind} image"));
            None
        }
        many => {
            let names: Vec<String> = many.iter().map(|c| c.path.display().to_string()).collect();
            problems.push(format!(
                "case '{case}' matches {} {kind} images: {}",
                many.len(),
                names.join(", ")
            ));
            None
        }
    }
}

fn contains_token(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
#[path = "../../tests/unit/cases/pairing.rs"]
mod tests;
