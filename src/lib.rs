//! skelqc renders a skeleton-over-anatomy screenshot for every case of a cohort
//! study and collects them into one browsable HTML report.
//!
//! # Pipeline overview
//!
//! 1. **Resolve**: coordinate spec (`enigma`, `fmrib`, `auto`, `x,y,z`) -> [`ViewCoordinate`]
//! 2. **Pair**: case list + `skeleton/` and `warped/` volumes -> [`CaseImages`]
//! 3. **Render**: one [`RenderJob`] per case on a fixed-size [`ParallelRenderer`] pool,
//!    driving a [`RenderEngine`] (usually an external program via [`CommandEngine`])
//! 4. **Assemble**: rendered cases -> `slicesdir/summary.html`
//!
//! The drawing itself is delegated: the crate only decides what gets rendered,
//! where it lands, and how results are reported. Every job runs to completion;
//! failures are collected and reported together after the pool drains.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod cases;
mod coords;
mod foundation;
mod pipeline;
mod render;
mod report;

pub use cases::caselist::{parse_cases, read_cases};
pub use cases::pairing::{
    CaseImages, DiscoveredImages, ImageLayout, ImageRef, PairingMode, SKELETON_DIR, WARPED_DIR,
    discover_images, pair, pair_by_case, pair_positional,
};
pub use coords::resolve::{PRESETS, ViewCoordinate, resolve_view_coordinate};
pub use foundation::error::{CaseFailure, QcError, QcResult};
pub use foundation::ids::CaseId;
pub use pipeline::{FailurePolicy, OUTPUT_DIR_NAME, PipelineReport, QcConfig, run_pipeline};
pub use render::engine::{
    CommandEngine, EngineSpec, RenderEngine, is_program_on_path, verify_artifact,
};
pub use render::job::{RenderJob, artifact_path, build_jobs};
pub use render::pool::{ParallelRenderer, RenderOutcome, RenderSummary};
pub use report::html::{REPORT_FILE_NAME, Report, ReportEntry, write_report};
