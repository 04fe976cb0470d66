use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop a metrics file from becoming a chart.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("file {} not found", path.display())]
    NotFound { path: PathBuf },

    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed csv or a cell that is not a number.
    #[error("could not parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("required column {column} is missing")]
    MissingColumn { column: String },

    /// Header only, no samples to anchor the time axis.
    #[error("{} has no data rows", path.display())]
    EmptyTable { path: PathBuf },

    #[error("output path {} is the input file itself", path.display())]
    OutputIsInput { path: PathBuf },

    #[error("could not draw the chart: {0}")]
    Draw(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_single_lines() {
        let errors = vec![
            RenderError::NotFound {
                path: PathBuf::from("run1.csv"),
            },
            RenderError::Parse {
                path: PathBuf::from("run1.csv"),
                reason: String::from("row 3: column P2S_CWND: invalid number \"x\""),
            },
            RenderError::MissingColumn {
                column: String::from("C2P_RTT_ms"),
            },
            RenderError::EmptyTable {
                path: PathBuf::from("run1.csv"),
            },
        ];
        for e in errors {
            let msg = e.to_string();
            assert!(!msg.contains('\n'), "{}", msg);
        }
    }

    #[test]
    fn missing_column_names_the_column() {
        let e = RenderError::MissingColumn {
            column: String::from("P2S_SSTHRESH"),
        };
        assert!(e.to_string().contains("P2S_SSTHRESH"));
    }
}
