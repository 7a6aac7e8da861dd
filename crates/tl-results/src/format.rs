//! Plain-text rendering of scalars, vectors and matrices.

use nalgebra::DMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Notation {
    /// `-1.2345678900e+02`
    #[default]
    Scientific,
    /// `-123.4567890000`
    Fixed,
}

/// Number formatting options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixFormat {
    /// Digits after the decimal point.
    pub precision: usize,
    /// Minimum field width of each entry.
    pub width: usize,
    pub notation: Notation,
    /// Write non-finite values as `%nan` / `%inf` (Scilab constants).
    pub percent_constants: bool,
}

impl MatrixFormat {
    /// Full precision for generated scripts.
    pub fn script() -> Self {
        Self {
            precision: 10,
            width: 20,
            notation: Notation::Scientific,
            percent_constants: true,
        }
    }

    /// Compact echo for terminals.
    pub fn console() -> Self {
        Self {
            precision: 3,
            width: 10,
            notation: Notation::Scientific,
            percent_constants: false,
        }
    }

    pub fn fixed(mut self) -> Self {
        self.notation = Notation::Fixed;
        self
    }
}

impl Default for MatrixFormat {
    fn default() -> Self {
        Self::console()
    }
}

fn non_finite(v: f64, percent: bool) -> String {
    let body = if v.is_nan() { "nan" } else { "inf" };
    let sign = if v.is_sign_negative() && !v.is_nan() { "-" } else { "" };
    let prefix = if percent { "%" } else { "" };
    format!("{sign}{prefix}{body}")
}

/// Single value without padding.
pub fn format_scalar(v: f64, fmt: &MatrixFormat) -> String {
    if !v.is_finite() {
        return non_finite(v, fmt.percent_constants);
    }
    match fmt.notation {
        Notation::Fixed => format!("{:.*}", fmt.precision, v),
        Notation::Scientific => {
            // Rust writes `1.5e2` / `1.5e-7`; pad to the C form `1.5e+02`.
            let s = format!("{:.*e}", fmt.precision, v);
            match s.split_once('e') {
                Some((mantissa, exp)) => {
                    let (sign, digits) = match exp.strip_prefix('-') {
                        Some(d) => ('-', d),
                        None => ('+', exp),
                    };
                    format!("{mantissa}e{sign}{digits:0>2}")
                }
                None => s,
            }
        }
    }
}

fn padded(v: f64, fmt: &MatrixFormat) -> String {
    format!("{:>width$}", format_scalar(v, fmt), width = fmt.width)
}

/// Bracketed matrix, one row per line.
pub fn format_matrix(m: &DMatrix<f64>, fmt: &MatrixFormat) -> String {
    if m.nrows() == 0 || m.ncols() == 0 {
        return "[]".to_string();
    }
    let rows: Vec<String> = m
        .row_iter()
        .map(|row| {
            row.iter()
                .map(|v| padded(*v, fmt))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();
    format!("[{}]", rows.join("\n "))
}

/// Bracketed column vector, one entry per line.
pub fn format_vector(v: &[f64], fmt: &MatrixFormat) -> String {
    format_matrix(&DMatrix::from_column_slice(v.len(), 1, v), fmt)
}
