// src/panels/charts.rs
//! SVG rendering of panel data with plotters

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::stats::HistogramBin;
use super::{BoxGroup, CategoryCounts, ChartData, PieSlice};

const SIZE: (u32, u32) = (640, 420);
const FONT: &str = "sans-serif";

const ORANGE: RGBColor = RGBColor(255, 165, 0);
const DARK_ORANGE: RGBColor = RGBColor(204, 102, 0);
const FRAUD_RED: RGBColor = RGBColor(214, 39, 40);
const REAL_BLUE: RGBColor = RGBColor(31, 119, 180);
const PURPLE: RGBColor = RGBColor(128, 0, 128);
const SLICE_COLORS: [RGBColor; 2] = [REAL_BLUE, ORANGE];

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

/// Draw one chart as an SVG document.
pub fn render(title: &str, data: &ChartData) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        match data {
            ChartData::Histogram { bins, kde } => draw_histogram(&root, title, bins, kde.as_deref())?,
            ChartData::Pie { slices } => draw_pie(&root, title, slices)?,
            ChartData::HorizontalBar {
                x_label,
                y_label,
                bars,
            } => draw_horizontal_bars(&root, title, x_label, y_label, bars)?,
            ChartData::StackedBar { groups } => draw_stacked_bars(&root, title, groups)?,
            ChartData::Scatter {
                x_label,
                y_label,
                points,
            } => draw_scatter(&root, title, x_label, y_label, points)?,
            ChartData::BoxPlot { groups } => draw_boxplot(&root, title, groups)?,
            ChartData::Heatmap { columns, matrix } => draw_heatmap(&root, title, columns, matrix)?,
        }

        root.present()?;
    }
    Ok(svg)
}

fn centered(size: u32) -> TextStyle<'static> {
    TextStyle::from((FONT, size).into_font()).pos(Pos::new(HPos::Center, VPos::Center))
}

fn draw_histogram(
    root: &Area<'_>,
    title: &str,
    bins: &[HistogramBin],
    kde: Option<&[(f64, f64)]>,
) -> Result<()> {
    let max_bin = bins.iter().map(|b| b.count as f64).fold(0.0, f64::max);
    let max_kde = kde
        .map(|curve| curve.iter().map(|(_, y)| *y).fold(0.0, f64::max))
        .unwrap_or(0.0);
    let y_max = (max_bin.max(max_kde) * 1.1).max(1.0);

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..1f64, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Fraud Probability")
        .y_desc("Count")
        .draw()?;

    chart.draw_series(bins.iter().map(|bin| {
        Rectangle::new(
            [(bin.start, 0.0), (bin.end, bin.count as f64)],
            ORANGE.mix(0.7).filled(),
        )
    }))?;

    if let Some(curve) = kde {
        chart.draw_series(LineSeries::new(
            curve.iter().copied(),
            DARK_ORANGE.stroke_width(2),
        ))?;
    }
    Ok(())
}

fn draw_pie(root: &Area<'_>, title: &str, slices: &[PieSlice]) -> Result<()> {
    let area = root.titled(title, (FONT, 20))?;
    let (width, height) = area.dim_in_pixel();
    let center = (width as f64 / 2.0, height as f64 / 2.0);
    let radius = (width.min(height) as f64 / 2.0 - 40.0).max(10.0);

    let total: usize = slices.iter().map(|s| s.count).sum();
    if total == 0 {
        area.draw(&Text::new(
            "No rows to plot",
            (center.0 as i32, center.1 as i32),
            centered(16),
        ))?;
        return Ok(());
    }

    let point = |angle: f64, r: f64| -> (i32, i32) {
        let radians = angle.to_radians();
        (
            (center.0 + r * radians.cos()).round() as i32,
            (center.1 - r * radians.sin()).round() as i32,
        )
    };

    // counter-clockwise from twelve o'clock
    let mut start = 90.0;
    for (index, slice) in slices.iter().enumerate() {
        let sweep = 360.0 * slice.count as f64 / total as f64;
        let steps = (sweep / 2.0).ceil().max(1.0) as usize;

        let mut outline = vec![point(0.0, 0.0)];
        outline.extend((0..=steps).map(|i| point(start + sweep * i as f64 / steps as f64, radius)));

        let color = SLICE_COLORS[index % SLICE_COLORS.len()];
        area.draw(&Polygon::new(outline, color.filled()))?;

        let middle = start + sweep / 2.0;
        area.draw(&Text::new(
            slice.label.clone(),
            point(middle, radius + 20.0),
            centered(15),
        ))?;
        area.draw(&Text::new(
            format!("{:.1}%", slice.percent),
            point(middle, radius * 0.6),
            centered(14).color(&WHITE),
        ))?;

        start += sweep;
    }
    Ok(())
}

fn draw_horizontal_bars(
    root: &Area<'_>,
    title: &str,
    x_label: &str,
    y_label: &str,
    bars: &[(String, usize)],
) -> Result<()> {
    let n = bars.len().max(1);
    let x_max = bars.iter().map(|(_, count)| *count).max().unwrap_or(1) as f64 * 1.1;
    // first bar on top
    let label_at = |y: &f64| -> String {
        let rounded = y.round();
        if (y - rounded).abs() > 1e-6 || rounded < 0.0 {
            return String::new();
        }
        let index = n as i64 - 1 - rounded as i64;
        usize::try_from(index)
            .ok()
            .and_then(|i| bars.get(i))
            .map(|(label, _)| truncate_label(label, 28))
            .unwrap_or_default()
    };

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(200)
        .build_cartesian_2d(0f64..x_max.max(1.0), -0.5f64..(n as f64 - 0.5))?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n)
        .y_label_formatter(&label_at)
        .x_desc(x_label)
        .y_desc(y_label)
        .draw()?;

    chart.draw_series(bars.iter().enumerate().map(|(i, (_, count))| {
        let y = (n - 1 - i) as f64;
        Rectangle::new([(0.0, y - 0.4), (*count as f64, y + 0.4)], FRAUD_RED.filled())
    }))?;
    Ok(())
}

fn draw_stacked_bars(root: &Area<'_>, title: &str, groups: &[CategoryCounts]) -> Result<()> {
    let n = groups.len().max(1);
    let y_max = groups
        .iter()
        .map(|g| g.real + g.fraud)
        .max()
        .unwrap_or(1) as f64
        * 1.15;
    let label_at = |x: &f64| -> String {
        let rounded = x.round();
        if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
            return String::new();
        }
        groups
            .get(rounded as usize)
            .map(|g| truncate_label(&g.category, 14))
            .unwrap_or_default()
    };

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max.max(1.0))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&label_at)
        .x_desc("Employment Type")
        .y_desc("Listings")
        .draw()?;

    chart
        .draw_series(groups.iter().enumerate().map(|(i, g)| {
            let x = i as f64;
            Rectangle::new([(x - 0.35, 0.0), (x + 0.35, g.real as f64)], REAL_BLUE.filled())
        }))?
        .label("Real")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], REAL_BLUE.filled()));

    chart
        .draw_series(groups.iter().enumerate().map(|(i, g)| {
            let x = i as f64;
            let base = g.real as f64;
            Rectangle::new(
                [(x - 0.35, base), (x + 0.35, base + g.fraud as f64)],
                FRAUD_RED.filled(),
            )
        }))?
        .label("Fraud")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], FRAUD_RED.filled()));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    Ok(())
}

fn draw_scatter(
    root: &Area<'_>,
    title: &str,
    x_label: &str,
    y_label: &str,
    points: &[(f64, f64)],
) -> Result<()> {
    let x_max = points.iter().map(|(x, _)| *x).fold(0.0, f64::max);

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..(x_max * 1.1).max(1.0), 0f64..1f64)?;

    chart
        .configure_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .draw()?;

    chart.draw_series(
        points
            .iter()
            .map(|point| Circle::new(*point, 4, PURPLE.mix(0.5).filled())),
    )?;
    Ok(())
}

fn draw_boxplot(root: &Area<'_>, title: &str, groups: &[BoxGroup]) -> Result<()> {
    let n = groups.len().max(1);
    let y_max = groups
        .iter()
        .map(|g| g.summary.max)
        .fold(0.0, f64::max)
        .max(1.0)
        * 1.1;
    let label_at = |x: &f64| -> String {
        let rounded = x.round();
        if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
            return String::new();
        }
        groups
            .get(rounded as usize)
            .map(|g| g.label.clone())
            .unwrap_or_default()
    };

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&label_at)
        .x_desc("Prediction")
        .y_desc("Description Word Count")
        .draw()?;

    for (i, group) in groups.iter().enumerate() {
        let x = i as f64;
        let s = &group.summary;
        let color = if group.label == "Fraud" { FRAUD_RED } else { REAL_BLUE };

        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - 0.25, s.q1), (x + 0.25, s.q3)],
            color.mix(0.4).filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - 0.25, s.q1), (x + 0.25, s.q3)],
            color.stroke_width(1),
        )))?;
        chart.draw_series(
            [
                vec![(x - 0.25, s.median), (x + 0.25, s.median)],
                vec![(x, s.q3), (x, s.upper_whisker)],
                vec![(x, s.q1), (x, s.lower_whisker)],
                vec![(x - 0.1, s.upper_whisker), (x + 0.1, s.upper_whisker)],
                vec![(x - 0.1, s.lower_whisker), (x + 0.1, s.lower_whisker)],
            ]
            .into_iter()
            .map(|path| PathElement::new(path, BLACK.stroke_width(2))),
        )?;
        chart.draw_series(
            s.outliers
                .iter()
                .map(|y| Circle::new((x, *y), 3, BLACK.stroke_width(1))),
        )?;
    }
    Ok(())
}

fn draw_heatmap(
    root: &Area<'_>,
    title: &str,
    columns: &[String],
    matrix: &[Vec<Option<f64>>],
) -> Result<()> {
    let n = columns.len().max(1);
    let label_at = |v: &f64| -> String {
        let index = v.floor();
        if (v - index - 0.5).abs() > 1e-6 || index < 0.0 {
            return String::new();
        }
        columns
            .get(index as usize)
            .map(|c| truncate_label(c, 16))
            .unwrap_or_default()
    };
    // first column at the top, as in a matrix
    let row_label_at = |v: &f64| -> String { label_at(&(n as f64 - v)) };

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 20))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(130)
        .build_cartesian_2d(0f64..n as f64, 0f64..n as f64)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n * 2 + 1)
        .y_labels(n * 2 + 1)
        .x_label_formatter(&label_at)
        .y_label_formatter(&row_label_at)
        .draw()?;

    let cells = matrix.iter().enumerate().flat_map(|(row, values)| {
        values.iter().enumerate().map(move |(col, value)| {
            let x = col as f64;
            let y = (n - 1 - row) as f64;
            (x, y, *value)
        })
    });

    let cells: Vec<(f64, f64, Option<f64>)> = cells.collect();

    chart.draw_series(cells.iter().map(|(x, y, value)| {
        let color = value.map(coolwarm).unwrap_or(WHITE);
        Rectangle::new([(*x, *y), (x + 1.0, y + 1.0)], color.filled())
    }))?;

    chart.draw_series(cells.iter().filter_map(|(x, y, value)| {
        value.map(|v| Text::new(format!("{:.2}", v), (x + 0.5, y + 0.5), centered(12)))
    }))?;
    Ok(())
}

/// Diverging blue-white-red scale over [-1, 1].
fn coolwarm(value: f64) -> RGBColor {
    const COLD: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const NEUTRAL: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let v = value.clamp(-1.0, 1.0);
    let (from, to, t) = if v < 0.0 {
        (NEUTRAL, COLD, -v)
    } else {
        (NEUTRAL, WARM, v)
    };
    let mix = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        label.to_string()
    } else {
        let kept: String = label.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}
