#![allow(dead_code)]

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    sync::Mutex,
};

use skelqc::{QcError, QcResult, RenderEngine, RenderJob, SKELETON_DIR, WARPED_DIR};

/// Fresh scratch directory under `target/`.
pub fn scratch(group: &str, name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join(group).join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_png(path: &Path, rgba: [u8; 4]) {
    image::RgbaImage::from_pixel(8, 6, image::Rgba(rgba))
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

/// Lay out `<root>/<modality>/{skeleton,warped}` and a case list for `cases`.
///
/// The "volumes" are small PNGs so a copying engine produces real artifacts.
pub fn study(root: &Path, modality: &str, cases: &[&str]) {
    let mod_dir = root.join(modality);
    std::fs::create_dir_all(mod_dir.join(SKELETON_DIR)).unwrap();
    std::fs::create_dir_all(mod_dir.join(WARPED_DIR)).unwrap();
    for (i, case) in cases.iter().enumerate() {
        let shade = (i as u8).wrapping_mul(40);
        write_png(
            &mod_dir
                .join(SKELETON_DIR)
                .join(format!("{case}_to_target_skel.nii.gz")),
            [shade, 200, 0, 255],
        );
        write_png(
            &mod_dir
                .join(WARPED_DIR)
                .join(format!("{case}_to_target.nii.gz")),
            [0, 0, shade, 255],
        );
    }

    std::fs::create_dir_all(root.join("log")).unwrap();
    let list: String = cases.iter().map(|c| format!("{c}\n")).collect();
    std::fs::write(root.join("log").join("caselist.txt"), list).unwrap();
}

/// In-process engine that writes a PNG per job and records what it saw.
pub struct FakeEngine {
    pub fail: BTreeSet<String>,
    /// Cases that report success without writing anything.
    pub silent: BTreeSet<String>,
    pub seen: Mutex<Vec<RenderJob>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            fail: BTreeSet::new(),
            silent: BTreeSet::new(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(cases: &[&str]) -> Self {
        Self {
            fail: cases.iter().map(|c| c.to_string()).collect(),
            ..Self::new()
        }
    }

    pub fn silent(cases: &[&str]) -> Self {
        Self {
            silent: cases.iter().map(|c| c.to_string()).collect(),
            ..Self::new()
        }
    }

    pub fn seen_cases(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .seen
            .lock()
            .unwrap()
            .iter()
            .map(|j| j.case.to_string())
            .collect();
        out.sort();
        out
    }
}

impl RenderEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    fn render(&self, job: &RenderJob) -> QcResult<()> {
        self.seen.lock().unwrap().push(job.clone());
        if self.fail.contains(job.case.as_str()) {
            return Err(QcError::render_job(format!(
                "bad image data for {}",
                job.case
            )));
        }
        if !self.silent.contains(job.case.as_str()) {
            write_png(&job.output, [255, 255, 255, 255]);
        }
        Ok(())
    }
}

pub fn png_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| n.ends_with(".png"))
        .collect();
    names.sort();
    names
}
