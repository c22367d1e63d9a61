//! Result output: console reports and file export.
//!
//! Console output from concurrent runs goes through a single [`OutputSink`]. Every line takes the
//! sink's lock on its own, so lines from different strategies never interleave mid-line, and no
//! run holds the lock for longer than one write.

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::PercentCalculus;
use crate::engine::RunReport;
use crate::errors::{Error, Result};
use crate::metrics::StatsMap;

/// Cloneable handle to a shared, line-serialized writer.
#[derive(Clone)]
pub struct OutputSink {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSink").finish_non_exhaustive()
    }
}

impl OutputSink {
    /// Wraps `writer`.
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Sink writing to the process's standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Writes one line under the lock.
    pub fn line(&self, args: fmt::Arguments<'_>) -> Result<()> {
        let mut writer = self.inner.lock().map_err(|e| Error::Mutex(e.to_string()))?;
        writer.write_fmt(args)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// Prints the summary of `report`, one line at a time.
pub fn write_report(sink: &OutputSink, report: &RunReport) -> Result<()> {
    sink.line(format_args!(
        "[{}] Final valuation: {:.2} ({:+.2}%)",
        report.name,
        report.final_valuation,
        report.initial_cash.change(report.final_valuation)
    ))?;
    for (name, value) in &report.metrics {
        sink.line(format_args!("[{}]  - {name}: {value:.6}", report.name))?;
    }
    Ok(())
}

/// Writes the valuation series as `index,valuation` rows.
pub fn write_values_csv<W: Write>(writer: W, values: &[f64]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["index", "valuation"])?;
    for (i, value) in values.iter().enumerate() {
        wtr.write_record([i.to_string(), value.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes metrics as `metric,value` rows.
pub fn write_metrics_csv<W: Write>(writer: W, metrics: &StatsMap) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["metric", "value"])?;
    for (name, value) in metrics {
        wtr.write_record([name.clone(), value.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Saves `<name>_pnl.csv` and `<name>_statistics.csv` into `dir`, creating it if needed.
///
/// ### Returns
/// The paths of the two files.
pub fn export_run_csv(dir: &Path, report: &RunReport) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)?;

    let values_path = dir.join(format!("{}_pnl.csv", report.name));
    write_values_csv(File::create(&values_path)?, &report.values)?;

    let metrics_path = dir.join(format!("{}_statistics.csv", report.name));
    write_metrics_csv(File::create(&metrics_path)?, &report.metrics)?;

    tracing::debug!(strategy = %report.name, dir = %dir.display(), "csv exported");
    Ok((values_path, metrics_path))
}

/// Serializes every successful report as pretty JSON.
#[cfg(feature = "serde")]
pub fn export_json(reports: &[RunReport]) -> Result<String> {
    serde_json::to_string_pretty(reports).map_err(Error::from)
}
