use crate::TIMESTAMP_COLUMN;

/// One leg of the proxied connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    ProxyServer,
    ClientProxy,
}

impl Segment {
    /// rgb triple, fixed per segment across all panels
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Segment::ProxyServer => (0, 0, 255),
            Segment::ClientProxy => (0, 128, 0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Segment::ProxyServer => "Proxy-Server",
            Segment::ClientProxy => "Client-Proxy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stroke {
    Solid,
    Dashed,
    Dotted,
}

impl Stroke {
    /// dash length and gap in pixels, None for a continuous line
    pub fn dash(self) -> Option<(u32, u32)> {
        match self {
            Stroke::Solid => None,
            Stroke::Dashed => Some((10, 6)),
            Stroke::Dotted => Some((2, 4)),
        }
    }
}

/// A column drawn as one line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSpec {
    pub column: &'static str,
    pub label: &'static str,
    pub segment: Segment,
    pub stroke: Stroke,
    pub width: u32,
    pub alpha: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelSpec {
    pub title: &'static str,
    pub y_desc: &'static str,
    pub series: &'static [SeriesSpec],
}

pub const SSTHRESH_COLUMNS: [&str; 2] = ["P2S_SSTHRESH", "C2P_SSTHRESH"];

/// Time axis label, drawn under the bottom panel only.
pub const X_DESC: &str = "time in seconds";

/// The four stacked panels as plain data, independent of the drawing backend.
pub const PANELS: [PanelSpec; 4] = [
    PanelSpec {
        title: "1. Connection throughput / goodput",
        y_desc: "Goodput (Mbps)",
        series: &[
            SeriesSpec {
                column: "P2S_Goodput_Mbps",
                label: "Proxy -> Server",
                segment: Segment::ProxyServer,
                stroke: Stroke::Solid,
                width: 2,
                alpha: 1.0,
            },
            SeriesSpec {
                column: "C2P_Goodput_Mbps",
                label: "Client -> Proxy",
                segment: Segment::ClientProxy,
                stroke: Stroke::Dashed,
                width: 1,
                alpha: 0.7,
            },
        ],
    },
    PanelSpec {
        title: "2. Latency (RTT)",
        y_desc: "RTT (ms)",
        series: &[
            SeriesSpec {
                column: "P2S_RTT_ms",
                label: "RTT (Proxy-Server)",
                segment: Segment::ProxyServer,
                stroke: Stroke::Solid,
                width: 1,
                alpha: 1.0,
            },
            SeriesSpec {
                column: "C2P_RTT_ms",
                label: "RTT (Client-Proxy)",
                segment: Segment::ClientProxy,
                stroke: Stroke::Dashed,
                width: 1,
                alpha: 0.5,
            },
        ],
    },
    PanelSpec {
        title: "3. Congestion window (CWND) vs SSTHRESH",
        y_desc: "Segments",
        series: &[
            SeriesSpec {
                column: "P2S_CWND",
                label: "CWND (Proxy-Server)",
                segment: Segment::ProxyServer,
                stroke: Stroke::Solid,
                width: 1,
                alpha: 1.0,
            },
            SeriesSpec {
                column: "C2P_CWND",
                label: "CWND (Client-Proxy)",
                segment: Segment::ClientProxy,
                stroke: Stroke::Solid,
                width: 1,
                alpha: 0.5,
            },
            // the kernel reports an unset threshold as i32::MAX, drawn unclipped
            SeriesSpec {
                column: "P2S_SSTHRESH",
                label: "Ssthresh (Proxy-Server)",
                segment: Segment::ProxyServer,
                stroke: Stroke::Dotted,
                width: 2,
                alpha: 1.0,
            },
            SeriesSpec {
                column: "C2P_SSTHRESH",
                label: "Ssthresh (Client-Proxy)",
                segment: Segment::ClientProxy,
                stroke: Stroke::Dotted,
                width: 1,
                alpha: 0.5,
            },
        ],
    },
    PanelSpec {
        title: "4. Cumulative TCP retransmissions",
        y_desc: "Retransmitted packets (total)",
        series: &[
            SeriesSpec {
                column: "P2S_Retrans",
                label: "Retransmissions (Proxy-Server)",
                segment: Segment::ProxyServer,
                stroke: Stroke::Solid,
                width: 2,
                alpha: 1.0,
            },
            SeriesSpec {
                column: "C2P_Retrans",
                label: "Retransmissions (Client-Proxy)",
                segment: Segment::ClientProxy,
                stroke: Stroke::Dashed,
                width: 1,
                alpha: 1.0,
            },
        ],
    },
];

/// Timestamp first, then every column of every panel in drawing order.
pub fn required_columns() -> Vec<&'static str> {
    let mut columns = vec![TIMESTAMP_COLUMN];
    for panel in PANELS.iter() {
        for s in panel.series {
            if !columns.contains(&s.column) {
                columns.push(s.column);
            }
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_columns_match_the_logger_header() {
        let columns = required_columns();
        assert_eq!(columns.len(), 11);
        assert_eq!(columns[0], "TimestampMS");
        for c in &[
            "P2S_Goodput_Mbps",
            "C2P_Goodput_Mbps",
            "P2S_RTT_ms",
            "C2P_RTT_ms",
            "P2S_CWND",
            "C2P_CWND",
            "P2S_SSTHRESH",
            "C2P_SSTHRESH",
            "P2S_Retrans",
            "C2P_Retrans",
        ] {
            assert!(columns.contains(c), "{} not required", c);
        }
    }

    #[test]
    fn series_count_per_panel() {
        let counts: Vec<usize> = PANELS.iter().map(|p| p.series.len()).collect();
        assert_eq!(counts, vec![2, 2, 4, 2]);
    }

    #[test]
    fn colors_follow_the_segment() {
        for panel in PANELS.iter() {
            let p2s = panel
                .series
                .iter()
                .filter(|s| s.column.starts_with("P2S_"))
                .all(|s| s.segment == Segment::ProxyServer);
            let c2p = panel
                .series
                .iter()
                .filter(|s| s.column.starts_with("C2P_"))
                .all(|s| s.segment == Segment::ClientProxy);
            assert!(p2s && c2p, "{}", panel.title);
        }
        assert_ne!(Segment::ProxyServer.rgb(), Segment::ClientProxy.rgb());
    }

    #[test]
    fn ssthresh_is_dotted_and_cwnd_is_solid() {
        for s in PANELS[2].series {
            if SSTHRESH_COLUMNS.contains(&s.column) {
                assert_eq!(s.stroke, Stroke::Dotted);
            } else {
                assert_eq!(s.stroke, Stroke::Solid);
            }
        }
    }

    #[test]
    fn client_proxy_is_the_lighter_trace() {
        for i in [0usize, 1, 3].iter() {
            let series = PANELS[*i].series;
            let (p2s, c2p) = (series[0], series[1]);
            assert_eq!(p2s.stroke, Stroke::Solid);
            assert_eq!(c2p.stroke, Stroke::Dashed);
            assert!(c2p.alpha <= p2s.alpha);
        }
    }
}
