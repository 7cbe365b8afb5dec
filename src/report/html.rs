use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::{
    foundation::{
        error::{CaseFailure, QcError, QcResult},
        ids::CaseId,
    },
    render::pool::RenderSummary,
};

/// File name of the report inside the output directory.
pub const REPORT_FILE_NAME: &str = "summary.html";

/// One case block in the report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportEntry {
    /// Case label.
    pub case: CaseId,
    /// Image reference, relative to the report.
    pub image: String,
}

/// Ordered report content.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    entries: Vec<ReportEntry>,
    omitted: Vec<CaseFailure>,
}

impl Report {
    /// One entry per case, in the given order, each pointing at `<case>.png`.
    ///
    /// Does not check that any artifact exists.
    pub fn from_cases(cases: &[CaseId]) -> Self {
        Self {
            entries: cases
                .iter()
                .map(|case| ReportEntry {
                    case: case.clone(),
                    image: case.artifact_file_name(),
                })
                .collect(),
            omitted: Vec::new(),
        }
    }

    /// Entries for confirmed artifacts only, sorted by case; failed cases are kept
    /// aside and listed as omitted.
    pub fn from_summary(summary: &RenderSummary) -> Self {
        let mut entries: Vec<ReportEntry> = summary
            .rendered()
            .map(|(case, artifact)| ReportEntry {
                case: case.clone(),
                image: artifact
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| case.artifact_file_name()),
            })
            .collect();
        entries.sort_by(|a, b| a.case.cmp(&b.case));

        let mut omitted: Vec<CaseFailure> = summary.failures().cloned().collect();
        omitted.sort_by(|a, b| a.case.cmp(&b.case));

        Self { entries, omitted }
    }

    /// Case blocks in output order.
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// Cases left out because they have no artifact.
    pub fn omitted(&self) -> &[CaseFailure] {
        &self.omitted
    }

    /// Serialize the whole document to `w`.
    pub fn write_html<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(HEADER.as_bytes())?;

        for entry in &self.entries {
            let label = escape_html(entry.case.as_str());
            let image = escape_html(&entry.image);
            write!(
                w,
                r#"<table cellspacing="1" style="width:100%;background-color:white;">
<tr>
<td> <FONT COLOR=BLUE FACE="Geneva, Arial" SIZE=4> {label} </FONT> </td>
</tr>
<tr>
<td><a href="{image}"><img src="{image}" width="100%" ></a></td>
</tr>
</table>
"#
            )?;
        }

        if !self.omitted.is_empty() {
            writeln!(
                w,
                r#"<table cellspacing="1" style="width:100%;background-color:white;">
<tr>
<td> <FONT COLOR=RED FACE="Geneva, Arial" SIZE=4> Not rendered ({}) </FONT> </td>
</tr>"#,
                self.omitted.len()
            )?;
            for failure in &self.omitted {
                writeln!(
                    w,
                    "<tr>\n<td><pre> {}: {} </pre></td>\n</tr>",
                    escape_html(failure.case.as_str()),
                    escape_html(&failure.reason)
                )?;
            }
            writeln!(w, "</table>")?;
        }

        w.write_all(FOOTER.as_bytes())
    }
}

const HEADER: &str = r#"<html>
<head>
<style type="text/css">
*
{
margin: 0px;
padding: 0px;
}
html,body
{
height: 100%;
}
</style>
</head>
<body>
<pre> This HTML file was generated by <b>skelqc</b>

</pre>
"#;

const FOOTER: &str = "</body>\n</html>\n";

/// Write `report` to `<output_dir>/summary.html`, replacing any earlier report.
#[tracing::instrument(level = "info", skip_all, fields(dir = %output_dir.display()))]
pub fn write_report(output_dir: &Path, report: &Report) -> QcResult<PathBuf> {
    let path = output_dir.join(REPORT_FILE_NAME);
    tracing::info!(
        path = %path.display(),
        entries = report.entries().len(),
        omitted = report.omitted().len(),
        "writing report"
    );

    let fail = |e: std::io::Error| {
        QcError::report_write(format!("failed to write '{}': {e}", path.display()))
    };
    let file = File::create(&path).map_err(fail)?;
    let mut w = BufWriter::new(file);
    report.write_html(&mut w).map_err(fail)?;
    w.flush().map_err(fail)?;
    Ok(path)
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/report/html.rs"]
mod tests;
