use crate::models::Metrics;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Prefix cells a spreadsheet would evaluate as a formula.
fn neutralize(cell: &str) -> String {
    if cell.starts_with(['=', '+', '-', '@']) {
        format!("'{}", cell)
    } else {
        cell.to_string()
    }
}

/// Save table rows as CSV. Rows may have different lengths.
pub fn save_table_csv<P, R, C>(rows: R, path: P) -> Result<()>
where
    P: AsRef<Path>,
    R: IntoIterator,
    R::Item: IntoIterator<Item = C>,
    C: AsRef<str>,
{
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        let cells: Vec<String> = row.into_iter().map(|c| neutralize(c.as_ref())).collect();
        wtr.write_record(&cells)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save table rows as a pretty JSON array of arrays.
pub fn save_table_json<P: AsRef<Path>>(rows: &[Vec<String>], path: P) -> Result<()> {
    write_pretty(rows, path.as_ref())
}

/// Save metrics in the flat wire shape (`fuel_types`, `departments`, `averages_*`).
pub fn save_metrics_json<P: AsRef<Path>>(metrics: &Metrics, path: P) -> Result<()> {
    write_pretty(metrics, path.as_ref())
}

fn write_pretty<T: serde::Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let s = serde_json::to_string_pretty(value)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
