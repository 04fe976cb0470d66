use chrono::prelude::*;
use log::{debug, warn};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
pub mod chart;
pub mod error;
pub mod panel;
pub mod plot;

pub use error::RenderError;
use panel::{required_columns, SSTHRESH_COLUMNS};

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

pub const DT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const TIMESTAMP_COLUMN: &str = "TimestampMS";
pub const OUTPUT_EXTENSION: &str = "png";

/// Value the kernel reports for a slow-start threshold that was never set.
pub const SSTHRESH_SENTINEL: f64 = 2147483647.;

/// Size of the figure and optional display clamping.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// SSTHRESH values above this are drawn at this value; None draws them as-is
    pub ssthresh_clamp: Option<f64>,
}

impl Default for RenderConfig {
    fn default() -> RenderConfig {
        RenderConfig {
            width: 1200,
            height: 2000,
            ssthresh_clamp: None,
        }
    }
}

/// The metrics of both connection legs, one sample per row,
/// with the time axis relative to the first sample.
#[derive(Debug, Clone)]
pub struct MetricsTable {
    pub timestamp_ms: Vec<f64>,
    pub time_sec: Vec<f64>,
    columns: Vec<(&'static str, Vec<f64>)>,
}

impl MetricsTable {
    /// Init a MetricsTable from the csv written by the proxy logger.
    /// Header names are trimmed and matched ignoring case, extra columns are skipped.
    /// Empty metric cells become NAN, any other non-numeric cell is an error.
    pub fn from_csv(fin: &Path) -> Result<MetricsTable, RenderError> {
        if !fin.is_file() {
            return Err(RenderError::NotFound {
                path: fin.to_path_buf(),
            });
        }
        let file = File::open(fin).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RenderError::NotFound {
                path: fin.to_path_buf(),
            },
            _ => RenderError::Io {
                path: fin.to_path_buf(),
                source: e,
            },
        })?;
        MetricsTable::from_reader(file, fin)
    }

    /// Same as from_csv on any reader, `path` only labels the errors.
    pub fn from_reader<R: Read>(reader: R, path: &Path) -> Result<MetricsTable, RenderError> {
        let parse_error = |reason: String| RenderError::Parse {
            path: path.to_path_buf(),
            reason,
        };
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr
            .headers()
            .map_err(|e| parse_error(e.to_string()))?
            .clone();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(parse_error(String::from("no header row")));
        }

        let mut indices: Vec<(&'static str, usize)> = Vec::new();
        for name in required_columns() {
            match headers.iter().position(|h| h.eq_ignore_ascii_case(name)) {
                Some(i) => indices.push((name, i)),
                None => {
                    return Err(RenderError::MissingColumn {
                        column: name.to_string(),
                    })
                }
            }
        }
        debug!("{}: columns found at {:?}", path.display(), indices);

        let mut timestamp_ms: Vec<f64> = Vec::new();
        let mut values: Vec<Vec<f64>> = vec![Vec::new(); indices.len() - 1];
        for result in rdr.records() {
            let record = result.map_err(|e| parse_error(e.to_string()))?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            for (k, &(name, i)) in indices.iter().enumerate() {
                let cell = record.get(i).unwrap_or_default();
                let v = parse_cell(cell, k == 0).map_err(|reason| {
                    parse_error(format!("line {}: column {}: {}", line, name, reason))
                })?;
                if k == 0 {
                    timestamp_ms.push(v);
                } else {
                    values[k - 1].push(v);
                }
            }
        }
        if timestamp_ms.is_empty() {
            return Err(RenderError::EmptyTable {
                path: path.to_path_buf(),
            });
        }
        debug!("{}: read {} samples", path.display(), timestamp_ms.len());

        let columns: Vec<(&'static str, Vec<f64>)> = indices[1..]
            .iter()
            .map(|&(name, _)| name)
            .zip(values.into_iter())
            .collect();
        let table = MetricsTable {
            time_sec: relative_seconds(&timestamp_ms),
            timestamp_ms,
            columns,
        };
        table.warn_unusual();
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.timestamp_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamp_ms.is_empty()
    }

    /// values of a required column, by its canonical name
    pub fn column(&self, name: &str) -> Result<&[f64], RenderError> {
        self.columns
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| &v[..])
            .ok_or_else(|| RenderError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// consider all the values > max_value as out of the display range and draw them at max_value
    /// takes a mutable reference to modify the table in-place, returns how many were clamped
    pub fn clamp_display(&mut self, name: &str, max_value: f64) -> Result<usize, RenderError> {
        let column = self
            .columns
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
            .ok_or_else(|| RenderError::MissingColumn {
                column: name.to_string(),
            })?;
        let mut clamped = 0;
        for v in column.iter_mut() {
            if *v > max_value {
                *v = max_value;
                clamped += 1;
            }
        }
        debug!("{}: clamped {} values to {}", name, clamped, max_value);
        Ok(clamped)
    }

    /// the first timestamp, read as milliseconds since the unix epoch
    pub fn start_datetime(&self) -> Option<DateTime<Utc>> {
        let first = *self.timestamp_ms.first()?;
        Utc.timestamp_millis_opt(first as i64).single()
    }

    fn warn_unusual(&self) {
        if let Some(i) = self.timestamp_ms.windows(2).position(|w| w[1] < w[0]) {
            warn!(
                "timestamps go back in time after sample {}: {} -> {}",
                i,
                self.timestamp_ms[i],
                self.timestamp_ms[i + 1]
            );
        }
        for name in SSTHRESH_COLUMNS.iter() {
            if let Ok(v) = self.column(name) {
                if v.iter().any(|&x| x >= SSTHRESH_SENTINEL) {
                    warn!(
                        "{} holds the unset threshold {}, its panel will be stretched",
                        name, SSTHRESH_SENTINEL
                    );
                }
            }
        }
    }
}

fn parse_cell(cell: &str, is_timestamp: bool) -> Result<f64, String> {
    if cell.is_empty() {
        return if is_timestamp {
            Err(String::from("empty timestamp"))
        } else {
            Ok(f64::NAN)
        };
    }
    match cell.parse::<f64>() {
        Ok(v) if is_timestamp && !v.is_finite() => Err(format!("invalid timestamp {:?}", cell)),
        Ok(v) => Ok(v),
        Err(_) => Err(format!("invalid number {:?}", cell)),
    }
}

/// seconds elapsed since the first timestamp, so the first value is exactly 0
pub fn relative_seconds(timestamp_ms: &[f64]) -> Vec<f64> {
    let start = match timestamp_ms.first() {
        Some(&t) => t,
        None => return Vec::new(),
    };
    timestamp_ms.iter().map(|t| (t - start) / 1000.).collect()
}

/// the input path with its extension replaced by png
pub fn output_path(input: &Path) -> PathBuf {
    input.with_extension(OUTPUT_EXTENSION)
}

pub fn finite_min_and_max(s: &[f64]) -> Option<(f64, f64)> {
    let mut finite = s.iter().copied().filter(|v| v.is_finite());
    let first = finite.next()?;
    Some(finite.fold((first, first), |(min, max), v| (min.min(v), max.max(v))))
}

/// Read the metrics csv and draw the four panels next to it, with the default figure.
pub fn render(input: &Path) -> Result<PathBuf, RenderError> {
    render_with(input, &RenderConfig::default())
}

pub fn render_with(input: &Path, config: &RenderConfig) -> Result<PathBuf, RenderError> {
    // from_csv checks this too, but a missing input.png must be NotFound, not OutputIsInput
    if !input.is_file() {
        return Err(RenderError::NotFound {
            path: input.to_path_buf(),
        });
    }
    let pngout = output_path(input);
    if pngout == input {
        return Err(RenderError::OutputIsInput { path: pngout });
    }
    let mut table = MetricsTable::from_csv(input)?;
    if let Some(max_value) = config.ssthresh_clamp {
        for name in SSTHRESH_COLUMNS.iter() {
            table.clamp_display(name, max_value)?;
        }
    }
    chart::draw_panels(&table, &pngout, config).map_err(|e| RenderError::Draw(e.to_string()))?;
    debug!("{} written", pngout.display());
    Ok(pngout)
}
