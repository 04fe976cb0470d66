use crate::panel::{PanelSpec, SeriesSpec, Stroke, PANELS, X_DESC};
use crate::{finite_min_and_max, MetricsTable, RenderConfig, DT_FORMAT};
use log::debug;
use plotters::chart::SeriesAnno;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use std::ops::Range;
use std::path::Path;

type Chart<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;
type DrawResult<T> = Result<T, DrawingAreaErrorKind<<BitMapBackend<'static> as DrawingBackend>::ErrorType>>;

/// plots the four panels stacked on a shared time axis to png
pub fn draw_panels(
    table: &MetricsTable,
    fout: &Path,
    config: &RenderConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(fout, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)?;
    let body = root.titled(&caption(table), ("sans-serif", 28))?;
    let xrange = x_range(&table.time_sec);
    let areas = body.split_evenly((PANELS.len(), 1));
    for (i, (area, panel)) in areas.iter().zip(PANELS.iter()).enumerate() {
        let bottom = i + 1 == PANELS.len();
        draw_panel(area, table, panel, xrange.clone(), bottom)?;
    }
    root.present()?;
    Ok(())
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend, Shift>,
    table: &MetricsTable,
    panel: &PanelSpec,
    xrange: Range<f64>,
    bottom: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let columns = panel
        .series
        .iter()
        .map(|s| table.column(s.column))
        .collect::<Result<Vec<&[f64]>, _>>()?;
    let yrange = y_range(&columns);
    debug!("{}: x {:?}, y {:?}", panel.title, xrange, yrange);

    let mut chart = ChartBuilder::on(area)
        .caption(panel.title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(if bottom { 60 } else { 35 })
        .y_label_area_size(100)
        .build_cartesian_2d(xrange, yrange)?;

    chart
        .configure_mesh()
        .light_line_style(&BLACK.mix(0.05))
        .bold_line_style(BLACK.mix(0.2).stroke_width(1))
        .set_all_tick_mark_size(2)
        .label_style(("sans-serif", 16))
        .y_desc(panel.y_desc)
        .x_desc(if bottom { X_DESC } else { "" })
        .x_label_formatter(&|x: &f64| format!("{:.1}", x))
        .y_label_formatter(&|y: &f64| tick_label(*y))
        .draw()?;

    for (spec, values) in panel.series.iter().zip(columns.iter()) {
        draw_series(&mut chart, &table.time_sec, values, spec)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(("sans-serif", 16))
        .draw()?;
    Ok(())
}

/// one legend entry per series, however many gaps the data has
fn draw_series<'a, 'b: 'a>(
    chart: &mut Chart<'a, 'b>,
    time: &[f64],
    values: &[f64],
    spec: &SeriesSpec,
) -> DrawResult<()> {
    let (r, g, b) = spec.segment.rgb();
    let style = RGBColor(r, g, b).mix(spec.alpha).stroke_width(spec.width);
    let (on, off) = legend_dash(spec.stroke);

    let mut runs = finite_runs(time, values).into_iter();
    let first = runs.next().unwrap_or_default();
    draw_run(chart, first, spec.stroke, style)?
        .label(spec.label)
        .legend(move |(x, y)| {
            EmptyElement::at((x, y))
                + PathElement::new(vec![(0, 0), (on, 0)], style)
                + PathElement::new(vec![(on + off, 0), (2 * on + off, 0)], style)
        });
    for run in runs {
        draw_run(chart, run, spec.stroke, style)?;
    }
    Ok(())
}

fn draw_run<'c, 'a, 'b>(
    chart: &'c mut Chart<'a, 'b>,
    run: Vec<(f64, f64)>,
    stroke: Stroke,
    style: ShapeStyle,
) -> DrawResult<&'c mut SeriesAnno<'a, BitMapBackend<'b>>>
where
    'b: 'a,
{
    // a lone sample has no line to draw
    if run.len() == 1 {
        chart.draw_series(std::iter::once(Circle::new(run[0], 3, style.filled())))?;
    }
    match stroke.dash() {
        None => chart.draw_series(LineSeries::new(run, style)),
        Some((size, spacing)) => chart.draw_series(DashedLineSeries::new(run, size, spacing, style)),
    }
}

/// splits the series at the NAN values, dropping them
pub(crate) fn finite_runs(time: &[f64], values: &[f64]) -> Vec<Vec<(f64, f64)>> {
    let mut runs: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    for (&t, &v) in time.iter().zip(values.iter()) {
        if v.is_finite() {
            current.push((t, v));
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// the time span plus a 5% margin on each side
pub(crate) fn x_range(time_sec: &[f64]) -> Range<f64> {
    let (xmin, xmax) = finite_min_and_max(time_sec).unwrap_or((0., 0.));
    padded(xmin, xmax, 20., 1.)
}

/// the range of all the panel's series plus a 10% margin on each side
pub(crate) fn y_range(columns: &[&[f64]]) -> Range<f64> {
    let bounds = columns
        .iter()
        .filter_map(|c| finite_min_and_max(c))
        .fold(None, |acc: Option<(f64, f64)>, (lo, hi)| match acc {
            Some((min, max)) => Some((min.min(lo), max.max(hi))),
            None => Some((lo, hi)),
        });
    match bounds {
        Some((ymin, ymax)) => padded(ymin, ymax, 10., 1.),
        None => 0.0..1.0,
    }
}

/// axis bounds stay within +-AXIS_LIMIT, the tick marks need a finite span
const AXIS_LIMIT: f64 = f64::MAX / 4.;

/// widens min..max by span / parts on each side, or by `flat` when min == max
fn padded(min: f64, max: f64, parts: f64, flat: f64) -> Range<f64> {
    // max - min overflows for bounds near f64::MAX, the halves do not
    let half_span = max / 2. - min / 2.;
    let margin = if half_span > 0. {
        half_span / (parts / 2.)
    } else {
        flat
    };
    let lo = (min - margin).max(-AXIS_LIMIT);
    let hi = (max + margin).min(AXIS_LIMIT);
    if lo < hi {
        lo..hi
    } else {
        -AXIS_LIMIT..AXIS_LIMIT
    }
}

fn tick_label(v: f64) -> String {
    if v.abs() >= 1e5 {
        format!("{:.2e}", v)
    } else if v.fract() == 0. {
        format!("{:.0}", v)
    } else {
        format!("{:.2}", v)
    }
}

fn legend_dash(stroke: Stroke) -> (i32, i32) {
    match stroke {
        Stroke::Solid => (10, 0),
        Stroke::Dashed => (8, 4),
        Stroke::Dotted => (3, 4),
    }
}

fn caption(table: &MetricsTable) -> String {
    match table.start_datetime() {
        Some(start) => format!(
            "Proxy TCP metrics, capture started {} UTC",
            start.format(DT_FORMAT)
        ),
        None => String::from("Proxy TCP metrics"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_split_at_nan() {
        let time = [0., 1., 2., 3., 4., 5.];
        let values = [1., f64::NAN, 2., 3., f64::NAN, f64::NAN];
        let runs = finite_runs(&time, &values);
        assert_eq!(runs, vec![vec![(0., 1.)], vec![(2., 2.), (3., 3.)]]);
        assert!(finite_runs(&time, &[f64::NAN; 6]).is_empty());
    }

    #[test]
    fn x_range_has_margins() {
        assert_eq!(x_range(&[0., 10., 20.]), -1.0..21.0);
        assert_eq!(x_range(&[0.]), -1.0..1.0);
    }

    #[test]
    fn y_range_covers_every_series() {
        let a = [0., 50.];
        let b = [f64::NAN, 100.];
        assert_eq!(y_range(&[&a[..], &b[..]]), -10.0..110.0);
        assert_eq!(y_range(&[&[0., 0.][..]]), -1.0..1.0);
        assert_eq!(y_range(&[&[f64::NAN][..]]), 0.0..1.0);
    }

    #[test]
    fn extreme_values_keep_a_finite_span() {
        let r = y_range(&[&[1e308, -1e308][..]]);
        assert!(r.start.is_finite() && r.end.is_finite());
        assert!((r.end - r.start).is_finite());
        assert!(r.start < r.end);

        let r = y_range(&[&[f64::MAX, f64::MAX][..]]);
        assert!((r.end - r.start).is_finite());
        assert!(r.start < r.end);

        let r = x_range(&[0., 1.5e308]);
        assert!((r.end - r.start).is_finite());
        assert!(r.start < 0. && r.end > 0.);
    }

    #[test]
    fn sentinel_ticks_are_scientific() {
        assert_eq!(tick_label(2147483647.), "2.15e9");
        assert_eq!(tick_label(12.), "12");
        assert_eq!(tick_label(0.25), "0.25");
    }
}
