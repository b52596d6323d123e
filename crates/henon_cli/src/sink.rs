//! CSV persistence for computed results.
//!
//! One `hamiltonians_<h>.csv` with rows `t, H_rk4, H_rk3, H_implicit2, H_leapfrog`
//! and one `poincare_<method>_<h>.csv` per method with rows `q2, p2`. No header;
//! values carry 10 significant digits.

use anyhow::{Context, Result};
use henon_core::compute::Output;
use henon_core::hamiltonian::HamiltonianTable;
use henon_core::poincare::PoincareSection;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const SIGNIFICANT_DIGITS: usize = 10;
const SEPARATOR: &str = ", ";

/// Writes every table present in `output` below `dir` and returns the paths written.
pub fn write_output(output: &Output, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let h = output.plan.h;
    let mut written = Vec::new();
    if let Some(table) = &output.hamiltonians {
        let path = dir.join(format!("hamiltonians_{h}.csv"));
        write_hamiltonians(table, &path)?;
        written.push(path);
    }
    if let Some(sections) = &output.sections {
        for section in sections {
            let path = dir.join(format!("poincare_{}_{h}.csv", section.method().name()));
            write_section(section, &path)?;
            written.push(path);
        }
    }
    for path in &written {
        info!("Wrote {}.", path.display());
    }
    Ok(written)
}

pub fn write_hamiltonians(table: &HamiltonianTable, path: &Path) -> Result<()> {
    write_rows(path, table.rows())
}

pub fn write_section(section: &PoincareSection, path: &Path) -> Result<()> {
    write_rows(path, section.iter().map(|point| [point.q2, point.p2]))
}

fn write_rows<const N: usize>(path: &Path, rows: impl Iterator<Item = [f64; N]>) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for row in rows {
        let line = row
            .iter()
            .map(|&value| format_significant(value, SIGNIFICANT_DIGITS))
            .collect::<Vec<_>>()
            .join(SEPARATOR);
        writeln!(writer, "{line}").with_context(|| format!("Failed to write {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Formats `value` like C's `%.{digits}g`: fixed notation for moderate
/// exponents, scientific otherwise, trailing zeros removed.
pub fn format_significant(value: f64, digits: usize) -> String {
    if value == 0.0 || !value.is_finite() {
        return if value == 0.0 { "0".to_string() } else { value.to_string() };
    }
    let digits = digits.max(1);
    let scientific = format!("{:.*e}", digits - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if exponent < -4 || exponent >= digits as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{sign}{:02}",
            trim_fraction(mantissa),
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (digits as i32 - 1 - exponent) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}
