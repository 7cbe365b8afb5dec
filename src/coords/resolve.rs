use std::{fmt, str::FromStr};

use crate::foundation::error::{QcError, QcResult};

/// Anatomical point the engine slices through, in millimetres.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ViewCoordinate {
    /// Let the engine pick a view per image.
    Auto,
    /// Explicit `(x, y, z)` millimetre offsets.
    Mm(i32, i32, i32),
}

/// Named presets accepted by [`resolve_view_coordinate`].
pub const PRESETS: &[(&str, ViewCoordinate)] = &[
    ("enigma", ViewCoordinate::Mm(1, -19, 14)),
    ("fmrib", ViewCoordinate::Mm(-17, -24, 14)),
];

const AUTO: &str = "auto";

impl ViewCoordinate {
    /// Explicit millimetre triple, `None` for [`ViewCoordinate::Auto`].
    pub fn as_mm(self) -> Option<(i32, i32, i32)> {
        match self {
            Self::Auto => None,
            Self::Mm(x, y, z) => Some((x, y, z)),
        }
    }
}

/// Engine argument form: `auto` or `x,y,z`.
impl fmt::Display for ViewCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str(AUTO),
            Self::Mm(x, y, z) => write!(f, "{x},{y},{z}"),
        }
    }
}

impl FromStr for ViewCoordinate {
    type Err = QcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve_view_coordinate(s)
    }
}

/// Turn a coordinate specification into a [`ViewCoordinate`].
///
/// Accepts a preset name (`enigma`, `fmrib`), the literal `auto`, or exactly three
/// comma-separated integers with no whitespace (`1,-19,14`).
pub fn resolve_view_coordinate(spec: &str) -> QcResult<ViewCoordinate> {
    if spec == AUTO {
        return Ok(ViewCoordinate::Auto);
    }
    if let Some((_, preset)) = PRESETS.iter().find(|(name, _)| *name == spec) {
        return Ok(*preset);
    }

    let parts: Vec<&str> = spec.split(',').collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(QcError::config(format!(
            "cut coordinates '{spec}' must be a preset ({}), 'auto', or three comma-separated integers",
            preset_names()
        )));
    };

    Ok(ViewCoordinate::Mm(
        parse_axis(spec, x)?,
        parse_axis(spec, y)?,
        parse_axis(spec, z)?,
    ))
}

fn parse_axis(spec: &str, token: &str) -> QcResult<i32> {
    // i32::from_str already rejects embedded whitespace.
    token.parse::<i32>().map_err(|e| {
        QcError::config(format!(
            "cut coordinates '{spec}': component '{token}' is not an integer ({e})"
        ))
    })
}

fn preset_names() -> String {
    PRESETS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[path = "../../tests/unit/coords/resolve.rs"]
mod tests;
