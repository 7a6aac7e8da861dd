//! Scilab script holding the trim point and its linear model.

use std::fs;
use std::path::{Path, PathBuf};

use tl_solver::LinearModel;

use crate::format::{MatrixFormat, format_matrix, format_vector};
use crate::{ResultsError, ResultsResult};

pub const DEFAULT_SCRIPT_EXTENSION: &str = "sce";

/// Render the script defining `<name>.x0`, `.u0`, `.y0`, `.sys` and `.tfm`.
pub fn render_scilab_script(name: &str, model: &LinearModel, fmt: &MatrixFormat) -> String {
    let mut out = String::new();
    for (field, v) in [("x0", &model.x0), ("u0", &model.u0), ("y0", &model.y0)] {
        out.push_str(&format!("{name}.{field}=..\n{};\n", format_vector(v, fmt)));
    }
    out.push_str(&format!(
        "{name}.sys = syslin('c',..\n{},..\n{},..\n{},..\n{});\n",
        format_matrix(&model.a, fmt),
        format_matrix(&model.b, fmt),
        format_matrix(&model.c, fmt),
        format_matrix(&model.d, fmt),
    ));
    out.push_str(&format!("{name}.tfm = ss2tf({name}.sys);\n"));
    out
}

/// `<dir>/<identifier>_lin.<ext>`
pub fn script_path(dir: &Path, identifier: &str, extension: &str) -> ResultsResult<PathBuf> {
    if identifier.is_empty() || identifier.contains(['/', '\\']) {
        return Err(ResultsError::InvalidPath {
            message: format!("bad script identifier '{identifier}'"),
        });
    }
    let ext = extension.trim_start_matches('.');
    let ext = if ext.is_empty() { DEFAULT_SCRIPT_EXTENSION } else { ext };
    Ok(dir.join(format!("{identifier}_lin.{ext}")))
}

/// Scilab variable name derived from a model identifier.
fn variable_name(identifier: &str) -> String {
    let mut name: String = identifier
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.chars().next().is_none_or(|c| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// Render and write the script, creating `dir` if needed.
pub fn write_scilab_script(
    dir: &Path,
    identifier: &str,
    extension: &str,
    model: &LinearModel,
) -> ResultsResult<PathBuf> {
    let path = script_path(dir, identifier, extension)?;
    fs::create_dir_all(dir)?;
    let content = render_scilab_script(&variable_name(identifier), model, &MatrixFormat::script());
    fs::write(&path, content)?;
    tracing::info!(path = %path.display(), "wrote linear model script");
    Ok(path)
}
