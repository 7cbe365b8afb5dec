use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::{
    foundation::error::{QcError, QcResult},
    render::job::RenderJob,
};

/// Black-box renderer: draws `job.foreground` over `job.background` at `job.coords`
/// and writes a PNG to `job.output`.
///
/// Implementations are shared by every worker of a pool and must not rely on
/// per-call mutable state.
pub trait RenderEngine: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Render one job. Returning `Ok` does not by itself count as success; the
    /// caller also checks the artifact.
    fn render(&self, job: &RenderJob) -> QcResult<()>;
}

/// External program plus argument templates, as loaded from an engine JSON file.
///
/// Templates may contain `{fg}`, `{bg}`, `{out}`, `{coords}` and `{case}`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EngineSpec {
    /// Program name (looked up on `PATH`) or path.
    pub program: String,
    /// Argument templates, expanded once per job.
    #[serde(default)]
    pub args: Vec<String>,
}

impl EngineSpec {
    /// Load a spec from a JSON file.
    pub fn from_json_file(path: &Path) -> QcResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            QcError::config(format!("failed to read engine spec '{}': {e}", path.display()))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            QcError::config(format!("invalid engine spec '{}': {e}", path.display()))
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Part {
    Lit(String),
    Foreground,
    Background,
    Output,
    Coords,
    Case,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ArgTemplate(Vec<Part>);

impl ArgTemplate {
    fn parse(raw: &str) -> QcResult<Self> {
        let mut parts = Vec::new();
        let mut rest = raw;
        while let Some(open) = rest.find('{') {
            if open > 0 {
                parts.push(Part::Lit(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                QcError::config(format!("engine argument '{raw}' has an unclosed '{{'"))
            })?;
            parts.push(match &after[..close] {
                "fg" => Part::Foreground,
                "bg" => Part::Background,
                "out" => Part::Output,
                "coords" => Part::Coords,
                "case" => Part::Case,
                other => {
                    return Err(QcError::config(format!(
                        "engine argument '{raw}' uses unknown placeholder '{{{other}}}'"
                    )));
                }
            });
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            parts.push(Part::Lit(rest.to_string()));
        }
        Ok(Self(parts))
    }

    fn mentions_output(&self) -> bool {
        self.0.contains(&Part::Output)
    }

    fn expand(&self, job: &RenderJob) -> OsString {
        let mut out = OsString::new();
        for part in &self.0 {
            match part {
                Part::Lit(s) => out.push(s),
                Part::Foreground => out.push(&job.foreground),
                Part::Background => out.push(&job.background),
                Part::Output => out.push(&job.output),
                Part::Coords => out.push(job.coords.to_string()),
                Part::Case => out.push(job.case.as_str()),
            }
        }
        out
    }
}

/// Renders by running an external program once per job.
#[derive(Clone, Debug)]
pub struct CommandEngine {
    program: String,
    args: Vec<ArgTemplate>,
}

impl CommandEngine {
    /// Validate `spec` and build an engine from it.
    pub fn new(spec: EngineSpec) -> QcResult<Self> {
        if spec.program.trim().is_empty() {
            return Err(QcError::config("engine program must not be empty"));
        }
        let args = spec
            .args
            .iter()
            .map(|a| ArgTemplate::parse(a))
            .collect::<QcResult<Vec<_>>>()?;
        if !args.iter().any(ArgTemplate::mentions_output) {
            return Err(QcError::config(
                "engine arguments must include the '{out}' placeholder",
            ));
        }
        Ok(Self {
            program: spec.program,
            args,
        })
    }

    /// Fail with a config error unless the program can be found.
    pub fn ensure_available(&self) -> QcResult<()> {
        if is_program_on_path(&self.program) {
            Ok(())
        } else {
            Err(QcError::config(format!(
                "render program '{}' was not found on PATH",
                self.program
            )))
        }
    }

    /// Argument list for `job` after placeholder expansion.
    pub fn expand_args(&self, job: &RenderJob) -> Vec<OsString> {
        self.args.iter().map(|a| a.expand(job)).collect()
    }
}

impl RenderEngine for CommandEngine {
    fn name(&self) -> &str {
        &self.program
    }

    fn render(&self, job: &RenderJob) -> QcResult<()> {
        let output = Command::new(&self.program)
            .args(self.expand_args(job))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                QcError::render_job(format!("failed to spawn '{}': {e}", self.program))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(QcError::render_job(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr_tail(&stderr)
            )));
        }
        Ok(())
    }
}

const STDERR_TAIL_LINES: usize = 8;

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}

/// Whether `program` resolves to an executable file, either directly or through `PATH`.
pub fn is_program_on_path(program: &str) -> bool {
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return is_executable(direct);
    }
    std::env::var_os("PATH")
        .map(|paths| {
            std::env::split_paths(&paths)
                .any(|dir| candidate_names(&dir, program).any(|p| is_executable(&p)))
        })
        .unwrap_or(false)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt as _;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn candidate_names<'a>(dir: &'a Path, program: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
    let plain = std::iter::once(dir.join(program));
    let exe = cfg!(windows).then(|| dir.join(format!("{program}.exe")));
    plain.chain(exe)
}

/// Check that `path` holds a readable PNG and return its dimensions.
pub fn verify_artifact(path: &Path) -> QcResult<(u32, u32)> {
    if !path.is_file() {
        return Err(QcError::render_job(format!(
            "engine reported success but '{}' was not written",
            path.display()
        )));
    }
    image::ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| QcError::render_job(format!("cannot open '{}': {e}", path.display())))
        .and_then(|r| match r.format() {
            Some(image::ImageFormat::Png) => r.into_dimensions().map_err(|e| {
                QcError::render_job(format!("'{}' is not a valid png: {e}", path.display()))
            }),
            _ => Err(QcError::render_job(format!(
                "'{}' is not a png file",
                path.display()
            ))),
        })
}

#[cfg(test)]
#[path = "../../tests/unit/render/engine.rs"]
mod tests;
