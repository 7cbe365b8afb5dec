use std::path::Path;

use crate::foundation::{
    error::{QcError, QcResult},
    ids::CaseId,
};

/// Read a case-list file (one id per line) and return the ids sorted.
///
/// Surrounding whitespace is trimmed; blank lines and `#` comments are skipped.
/// Every id must be usable as a file name inside the output directory.
pub fn read_cases(path: &Path) -> QcResult<Vec<CaseId>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        QcError::discovery(format!("failed to read case list '{}': {e}", path.display()))
    })?;

    let cases = parse_cases(&text);
    if cases.is_empty() {
        return Err(QcError::discovery(format!(
            "case list '{}' contains no case ids",
            path.display()
        )));
    }
    let bad: Vec<String> = cases
        .iter()
        .filter_map(|c| c.file_stem_problem().map(|why| format!("'{c}' {why}")))
        .collect();
    if !bad.is_empty() {
        return Err(QcError::discovery(format!(
            "case list '{}' has unusable case ids: {}",
            path.display(),
            bad.join("; ")
        )));
    }
    tracing::debug!(count = cases.len(), path = %path.display(), "loaded case list");
    Ok(cases)
}

/// Parse case-list text; see [`read_cases`].
pub fn parse_cases(text: &str) -> Vec<CaseId> {
    let mut cases: Vec<CaseId> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(CaseId::from)
        .collect();
    cases.sort();
    cases
}

#[cfg(test)]
#[path = "../../tests/unit/cases/caselist.rs"]
mod tests;
