use crate::render::pool::RenderOutcome;

use super::*;

fn ids(list: &[&str]) -> Vec<CaseId> {
    list.iter().map(|s| CaseId::new(*s)).collect()
}

fn html(report: &Report) -> String {
    let mut buf = Vec::new();
    report.write_html(&mut buf).unwrap();
    String::from_utf8(buf).unwrap()
}

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("unit_report").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn one_table_per_case_in_order() {
    let doc = html(&Report::from_cases(&ids(&["s1", "s2", "s3"])));
    assert_eq!(doc.matches("<table").count(), 3);

    let p1 = doc.find(r#"src="s1.png""#).unwrap();
    let p2 = doc.find(r#"src="s2.png""#).unwrap();
    let p3 = doc.find(r#"src="s3.png""#).unwrap();
    assert!(p1 < p2 && p2 < p3);
    assert!(doc.contains(r#"<a href="s2.png">"#));
    assert!(doc.starts_with("<html>"));
    assert!(doc.contains("generated by <b>skelqc</b>"));
    assert!(doc.trim_end().ends_with("</html>"));
}

#[test]
fn empty_report_is_just_the_shell() {
    let doc = html(&Report::default());
    assert!(!doc.contains("<table"));
    assert!(doc.contains("<style type=\"text/css\">"));
}

#[test]
fn case_ids_are_escaped() {
    let doc = html(&Report::from_cases(&ids(&["a<b>&\"c"])));
    assert!(doc.contains("a&lt;b&gt;&amp;&quot;c"));
    assert!(!doc.contains("a<b>"));
}

#[test]
fn summary_report_lists_rendered_and_flags_omitted() {
    let summary = RenderSummary {
        outcomes: vec![
            RenderOutcome::Rendered {
                case: CaseId::new("s3"),
                artifact: PathBuf::from("out/s3.png"),
            },
            RenderOutcome::Failed(CaseFailure {
                case: CaseId::new("s2"),
                reason: "exit status 1".to_string(),
            }),
            RenderOutcome::Rendered {
                case: CaseId::new("s1"),
                artifact: PathBuf::from("out/s1.png"),
            },
        ],
    };
    let report = Report::from_summary(&summary);
    let cases: Vec<&str> = report.entries().iter().map(|e| e.case.as_str()).collect();
    assert_eq!(cases, ["s1", "s3"]);
    assert_eq!(report.entries()[0].image, "s1.png");
    assert_eq!(report.omitted().len(), 1);

    let doc = html(&report);
    assert!(!doc.contains("s2.png"));
    assert!(doc.contains("Not rendered (1)"));
    assert!(doc.contains("s2: exit status 1"));
}

#[test]
fn write_report_overwrites_previous_file() {
    let dir = scratch("overwrite");
    std::fs::write(dir.join(REPORT_FILE_NAME), "stale content that is long").unwrap();

    let path = write_report(&dir, &Report::from_cases(&ids(&["s1"]))).unwrap();
    assert_eq!(path, dir.join(REPORT_FILE_NAME));
    let doc = std::fs::read_to_string(&path).unwrap();
    assert!(!doc.contains("stale"));
    assert_eq!(doc.matches("<table").count(), 1);
}

#[test]
fn write_report_is_deterministic() {
    let dir = scratch("deterministic");
    let report = Report::from_cases(&ids(&["a", "b"]));
    let first = std::fs::read(write_report(&dir, &report).unwrap()).unwrap();
    let second = std::fs::read(write_report(&dir, &report).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn unwritable_destination_is_report_write_error() {
    let dir = scratch("unwritable").join("missing_subdir");
    let err = write_report(&dir, &Report::default()).unwrap_err();
    assert!(matches!(err, QcError::ReportWrite(_)));
}
