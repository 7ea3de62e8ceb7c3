//! Chart primitives over the plotters SVG backend.
//!
//! Every function draws one complete chart into one file and accepts empty
//! input, in which case only the axes are drawn.

use std::error::Error;
use std::ops::Range;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::analysis::Histogram;
use crate::analysis::stats::kernel_density;

/// Result of drawing one chart.
pub type DrawResult = Result<(), Box<dyn Error>>;

const SIZE: (u32, u32) = (960, 600);
const FONT: &str = "sans-serif";
const KDE_POINTS: usize = 64;

/// Title and axis descriptions of a chart.
#[derive(Debug, Clone, Copy)]
pub struct Labels<'a> {
    pub title: &'a str,
    pub x: &'a str,
    pub y: &'a str,
}

impl<'a> Labels<'a> {
    pub const fn new(title: &'a str, x: &'a str, y: &'a str) -> Self {
        Self { title, x, y }
    }
}

fn canvas(path: &Path) -> Result<DrawingArea<SVGBackend<'_>, Shift>, Box<dyn Error>> {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    Ok(root)
}

fn builder<'a, 'b>(
    root: &'a DrawingArea<SVGBackend<'b>, Shift>,
    labels: &Labels<'_>,
) -> ChartBuilder<'a, 'static, SVGBackend<'b>> {
    let mut builder = ChartBuilder::on(root);
    builder
        .caption(labels.title, (FONT, 22))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(70);
    builder
}

/// Pad `[min, max]` of `values` by 5% on each side.
fn padded_range<I>(values: I) -> Range<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return 0.0..1.0;
    }
    if lo == hi {
        return (lo - 1.0)..(hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}

/// `0..max` with headroom, never degenerate.
fn count_range(max: f64) -> Range<f64> {
    0.0..(max.max(1.0) * 1.1)
}

/// Segmented category axis; segment `i` holds label `i`.
fn category_axis(n: usize) -> Range<i32> {
    0..(n.max(1) as i32)
}

fn segment_label(value: &SegmentValue<i32>, labels: &[String]) -> String {
    match value {
        SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => usize::try_from(*i)
            .ok()
            .and_then(|i| labels.get(i))
            .cloned()
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    }
}

/// Bars over a fixed-width [`Histogram`].
pub fn histogram(path: &Path, labels: &Labels<'_>, hist: &Histogram) -> DrawResult {
    let root = canvas(path)?;
    let x_range = match (hist.edges.first(), hist.edges.last()) {
        (Some(lo), Some(hi)) => *lo..*hi,
        _ => 0.0..1.0,
    };

    let mut chart =
        builder(&root, labels).build_cartesian_2d(x_range, count_range(hist.max_count() as f64))?;
    chart
        .configure_mesh()
        .x_desc(labels.x)
        .y_desc(labels.y)
        .draw()?;

    chart.draw_series(hist.bins().map(|(left, right, count)| {
        let mut bar = Rectangle::new([(left, 0.0), (right, count as f64)], BLUE.mix(0.6).filled());
        bar.set_margin(0, 0, 1, 1);
        bar
    }))?;

    root.present()?;
    Ok(())
}

/// Points `(x, y)`.
pub fn scatter(path: &Path, labels: &Labels<'_>, points: &[(f64, f64)]) -> DrawResult {
    let root = canvas(path)?;
    let x_range = padded_range(points.iter().map(|p| p.0));
    let y_range = padded_range(points.iter().map(|p| p.1));

    let mut chart = builder(&root, labels).build_cartesian_2d(x_range, y_range)?;
    chart
        .configure_mesh()
        .x_desc(labels.x)
        .y_desc(labels.y)
        .draw()?;

    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 3, BLUE.mix(0.5).filled())),
    )?;

    root.present()?;
    Ok(())
}

/// Line with markers over integer x values (years).
pub fn line(path: &Path, labels: &Labels<'_>, points: &[(i32, f64)]) -> DrawResult {
    let root = canvas(path)?;
    let (x_lo, x_hi) = points
        .iter()
        .fold((i32::MAX, i32::MIN), |(lo, hi), p| (lo.min(p.0), hi.max(p.0)));
    let x_range = if x_lo > x_hi {
        0..1
    } else {
        (x_lo - 1)..(x_hi + 1)
    };
    let y_max = points.iter().map(|p| p.1).fold(0.0, f64::max);

    let mut chart = builder(&root, labels).build_cartesian_2d(x_range, count_range(y_max))?;
    chart
        .configure_mesh()
        .x_desc(labels.x)
        .y_desc(labels.y)
        .draw()?;

    chart.draw_series(LineSeries::new(points.iter().copied(), BLUE.stroke_width(2)))?;
    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 4, BLUE.filled())),
    )?;

    root.present()?;
    Ok(())
}

/// One vertical bar per category.
pub fn bars(path: &Path, labels: &Labels<'_>, bars: &[(String, f64)]) -> DrawResult {
    let names: Vec<String> = bars.iter().map(|b| b.0.clone()).collect();
    let y_max = bars.iter().map(|b| b.1).fold(0.0, f64::max);

    let root = canvas(path)?;
    let mut chart = builder(&root, labels)
        .build_cartesian_2d(category_axis(names.len()).into_segmented(), count_range(y_max))?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(names.len() + 1)
        .x_label_formatter(&|v: &SegmentValue<i32>| segment_label(v, &names))
        .x_desc(labels.x)
        .y_desc(labels.y)
        .draw()?;

    chart.draw_series(bars.iter().enumerate().map(|(i, (_, value))| {
        let i = i as i32;
        let mut bar = Rectangle::new(
            [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *value)],
            BLUE.mix(0.7).filled(),
        );
        bar.set_margin(0, 0, 6, 6);
        bar
    }))?;

    root.present()?;
    Ok(())
}

/// Stacked bars: one bar per category, one colored layer per series.
///
/// `series[k].1[i]` is the height of layer `k` in category `i`.
pub fn stacked_bars(
    path: &Path,
    labels: &Labels<'_>,
    categories: &[String],
    series: &[(String, Vec<f64>)],
) -> DrawResult {
    let totals: Vec<f64> = (0..categories.len())
        .map(|i| {
            series
                .iter()
                .map(|(_, values)| values.get(i).copied().unwrap_or(0.0))
                .sum()
        })
        .collect();
    let y_max = totals.iter().copied().fold(0.0, f64::max);

    let root = canvas(path)?;
    let mut chart = builder(&root, labels)
        .build_cartesian_2d(category_axis(categories.len()).into_segmented(), count_range(y_max))?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(categories.len() + 1)
        .x_label_formatter(&|v: &SegmentValue<i32>| segment_label(v, categories))
        .x_desc(labels.x)
        .y_desc(labels.y)
        .draw()?;

    let mut base = vec![0.0; categories.len()];
    for (k, (name, values)) in series.iter().enumerate() {
        let color = Palette99::pick(k).to_rgba();
        let layers: Vec<_> = base
            .iter_mut()
            .enumerate()
            .map(|(i, bottom)| {
                let height = values.get(i).copied().unwrap_or(0.0);
                let lower = *bottom;
                *bottom += height;
                let i = i as i32;
                let mut bar = Rectangle::new(
                    [(SegmentValue::Exact(i), lower), (SegmentValue::Exact(i + 1), lower + height)],
                    color.filled(),
                );
                bar.set_margin(0, 0, 6, 6);
                bar
            })
            .collect();

        chart
            .draw_series(layers)?
            .label(name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Box-and-whisker per group. Whiskers stop at 1.5 IQR; outliers are not
/// drawn. Groups without values are skipped.
pub fn boxplots(path: &Path, labels: &Labels<'_>, groups: &[(String, Vec<f64>)]) -> DrawResult {
    let groups: Vec<(&String, Quartiles)> = groups
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(name, values)| (name, Quartiles::new(values.as_slice())))
        .collect();
    let names: Vec<String> = groups.iter().map(|(name, _)| (*name).clone()).collect();

    let y_range = padded_range(
        groups
            .iter()
            .flat_map(|(_, q)| q.values())
            .map(f64::from),
    );
    let y_range = (y_range.start as f32)..(y_range.end as f32);

    let root = canvas(path)?;
    let mut chart = builder(&root, labels)
        .build_cartesian_2d(category_axis(names.len()).into_segmented(), y_range)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(names.len() + 1)
        .x_label_formatter(&|v: &SegmentValue<i32>| segment_label(v, &names))
        .x_desc(labels.x)
        .y_desc(labels.y)
        .draw()?;

    chart.draw_series(groups.iter().enumerate().map(|(i, (_, quartiles))| {
        Boxplot::new_vertical(SegmentValue::CenterOf(i as i32), quartiles)
            .width(30)
            .whisker_width(0.5)
            .style(BLUE.stroke_width(2))
    }))?;

    root.present()?;
    Ok(())
}

/// Mirrored kernel density per group, clipped to each group's data range.
pub fn violins(path: &Path, labels: &Labels<'_>, groups: &[(String, Vec<f64>)]) -> DrawResult {
    let names: Vec<String> = groups.iter().map(|g| g.0.clone()).collect();
    let y_range = padded_range(groups.iter().flat_map(|g| g.1.iter().copied()));
    let x_range = -0.5..(names.len().max(1) as f64 - 0.5);

    let root = canvas(path)?;
    let mut chart = builder(&root, labels).build_cartesian_2d(x_range, y_range)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(names.len() + 1)
        .x_label_formatter(&|v: &f64| {
            let idx = v.round();
            if (v - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            names.get(idx as usize).cloned().unwrap_or_default()
        })
        .x_desc(labels.x)
        .y_desc(labels.y)
        .draw()?;

    for (i, (_, values)) in groups.iter().enumerate() {
        let center = i as f64;
        let density = kernel_density(values, KDE_POINTS);
        let peak = density.iter().map(|d| d.1).fold(0.0, f64::max);
        if density.is_empty() || peak <= 0.0 {
            continue;
        }
        let color = Palette99::pick(i).to_rgba();

        if let [(y, _)] = density.as_slice() {
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(center - 0.4, *y), (center + 0.4, *y)],
                color.stroke_width(2),
            )))?;
            continue;
        }

        let half_width = |d: f64| 0.4 * d / peak;
        let mut outline: Vec<(f64, f64)> = density
            .iter()
            .map(|&(y, d)| (center - half_width(d), y))
            .collect();
        outline.extend(density.iter().rev().map(|&(y, d)| (center + half_width(d), y)));

        chart.draw_series(std::iter::once(Polygon::new(
            outline.clone(),
            color.mix(0.5).filled(),
        )))?;
        outline.push(outline[0]);
        chart.draw_series(std::iter::once(PathElement::new(outline, color.stroke_width(1))))?;
    }

    root.present()?;
    Ok(())
}

/// Annotated count matrix; `matrix[row][col]`.
pub fn heatmap(
    path: &Path,
    labels: &Labels<'_>,
    rows: &[String],
    cols: &[String],
    matrix: &[Vec<usize>],
) -> DrawResult {
    let peak = matrix.iter().flatten().copied().max().unwrap_or(0).max(1) as f64;

    let root = canvas(path)?;
    let mut chart = builder(&root, labels).build_cartesian_2d(
        category_axis(cols.len()).into_segmented(),
        category_axis(rows.len()).into_segmented(),
    )?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(cols.len() + 1)
        .y_labels(rows.len() + 1)
        .x_label_formatter(&|v: &SegmentValue<i32>| segment_label(v, cols))
        .y_label_formatter(&|v: &SegmentValue<i32>| segment_label(v, rows))
        .x_desc(labels.x)
        .y_desc(labels.y)
        .draw()?;

    for (r, row) in matrix.iter().enumerate() {
        for (c, &count) in row.iter().enumerate() {
            let (ri, ci) = (r as i32, c as i32);
            let shade = 255 - (200.0 * count as f64 / peak) as u8;
            chart.draw_series(std::iter::once(Rectangle::new(
                [
                    (SegmentValue::Exact(ci), SegmentValue::Exact(ri)),
                    (SegmentValue::Exact(ci + 1), SegmentValue::Exact(ri + 1)),
                ],
                RGBColor(255, shade, shade / 2 + 55).filled(),
            )))?;
            chart.draw_series(std::iter::once(Text::new(
                count.to_string(),
                (SegmentValue::CenterOf(ci), SegmentValue::CenterOf(ri)),
                (FONT, 14),
            )))?;
        }
    }

    root.present()?;
    Ok(())
}
