// src/panels/mod.rs
//! Presentation panels computed from the augmented posting table

pub mod charts;
pub mod stats;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::table::{
    parse_number, PostingTable, DESCRIPTION, DESC_WORD_COUNT, EMPLOYMENT_TYPE, FRAUD_PREDICTION,
    FRAUD_PROBABILITY, LOCATION, TITLE, TITLE_LENGTH,
};
use stats::{FiveNumberSummary, HistogramBin};

pub const HISTOGRAM_BINS: usize = 20;
pub const TOP_N: usize = 10;
const KDE_POINTS: usize = 200;

pub const NO_FRAUD_MESSAGE: &str = "No listings were predicted as fraudulent.";
pub const NO_NUMERIC_MESSAGE: &str = "No numerical columns available for heatmap.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    ProbabilityHistogram,
    PredictionPie,
    TopFraudTitles,
    TopFraudLocations,
    EmploymentTypeBreakdown,
    TitleLengthScatter,
    DescriptionLengthBoxplot,
    CorrelationHeatmap,
}

impl PanelKind {
    pub fn all() -> Vec<PanelKind> {
        vec![
            PanelKind::ProbabilityHistogram,
            PanelKind::PredictionPie,
            PanelKind::TopFraudTitles,
            PanelKind::TopFraudLocations,
            PanelKind::EmploymentTypeBreakdown,
            PanelKind::TitleLengthScatter,
            PanelKind::DescriptionLengthBoxplot,
            PanelKind::CorrelationHeatmap,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            PanelKind::ProbabilityHistogram => "probability_histogram",
            PanelKind::PredictionPie => "prediction_pie",
            PanelKind::TopFraudTitles => "top_fraud_titles",
            PanelKind::TopFraudLocations => "top_fraud_locations",
            PanelKind::EmploymentTypeBreakdown => "employment_type_breakdown",
            PanelKind::TitleLengthScatter => "title_length_scatter",
            PanelKind::DescriptionLengthBoxplot => "description_length_boxplot",
            PanelKind::CorrelationHeatmap => "correlation_heatmap",
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            PanelKind::ProbabilityHistogram => "Fraud Probability Histogram",
            PanelKind::PredictionPie => "Fraud vs Real Pie Chart",
            PanelKind::TopFraudTitles => "Top Job Titles in Fraudulent Listings",
            PanelKind::TopFraudLocations => "Top Locations in Fraudulent Listings",
            PanelKind::EmploymentTypeBreakdown => "Fraud Predictions by Employment Type",
            PanelKind::TitleLengthScatter => "Title Length vs Fraud Probability",
            PanelKind::DescriptionLengthBoxplot => "Description Word Count by Prediction",
            PanelKind::CorrelationHeatmap => "Heatmap of Numerical Feature Correlations",
        }
    }

    /// Optional input column the panel needs, with the placeholder shown when it is absent.
    pub fn optional_column(&self) -> Option<(&'static str, &'static str)> {
        match self {
            PanelKind::TopFraudLocations => Some((
                LOCATION,
                "No 'location' column found for location analysis.",
            )),
            PanelKind::EmploymentTypeBreakdown => Some((
                EMPLOYMENT_TYPE,
                "No 'employment_type' column found for employment type analysis.",
            )),
            PanelKind::DescriptionLengthBoxplot => Some((
                DESCRIPTION,
                "No 'description' column found for description length analysis.",
            )),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCounts {
    pub category: String,
    pub real: usize,
    pub fraud: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxGroup {
    pub label: String,
    pub summary: FiveNumberSummary,
}

/// What a chart panel plots, independent of how it is drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "chart", rename_all = "snake_case")]
pub enum ChartData {
    Histogram {
        bins: Vec<HistogramBin>,
        #[serde(skip_serializing_if = "Option::is_none")]
        kde: Option<Vec<(f64, f64)>>,
    },
    Pie {
        slices: Vec<PieSlice>,
    },
    HorizontalBar {
        x_label: String,
        y_label: String,
        bars: Vec<(String, usize)>,
    },
    StackedBar {
        groups: Vec<CategoryCounts>,
    },
    Scatter {
        x_label: String,
        y_label: String,
        points: Vec<(f64, f64)>,
    },
    BoxPlot {
        groups: Vec<BoxGroup>,
    },
    Heatmap {
        columns: Vec<String>,
        matrix: Vec<Vec<Option<f64>>>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanelBody {
    Chart {
        data: ChartData,
        #[serde(skip)]
        svg: String,
    },
    Info {
        message: String,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Panel {
    pub id: &'static str,
    pub heading: &'static str,
    pub body: PanelBody,
}

/// Compute every configured panel. Panels never fail the page: a missing
/// optional column becomes an info placeholder, a drawing failure an error body.
pub fn build_panels(table: &PostingTable, kinds: &[PanelKind]) -> Vec<Panel> {
    build_panels_with(table, kinds, charts::render)
}

/// Same as [`build_panels`] with the SVG renderer supplied by the caller.
pub fn build_panels_with<F>(table: &PostingTable, kinds: &[PanelKind], render: F) -> Vec<Panel>
where
    F: Fn(&str, &ChartData) -> anyhow::Result<String>,
{
    kinds
        .iter()
        .map(|kind| Panel {
            id: kind.id(),
            heading: kind.heading(),
            body: build_body(table, *kind, &render),
        })
        .collect()
}

fn build_body<F>(table: &PostingTable, kind: PanelKind, render: &F) -> PanelBody
where
    F: Fn(&str, &ChartData) -> anyhow::Result<String>,
{
    if let Some((column, placeholder)) = kind.optional_column() {
        if !table.has_column(column) {
            return info(placeholder);
        }
    }

    let data = match compute(table, kind) {
        Ok(data) => data,
        Err(body) => return body,
    };

    match render(kind.heading(), &data) {
        Ok(svg) => PanelBody::Chart { data, svg },
        Err(e) => {
            warn!(panel = kind.id(), error = %e, "Failed to draw panel");
            PanelBody::Error {
                message: format!("Could not draw this chart: {}", e),
            }
        }
    }
}

fn info(message: &str) -> PanelBody {
    PanelBody::Info {
        message: message.to_string(),
    }
}

/// Aggregate for one panel, or the placeholder body to show instead.
pub fn compute(table: &PostingTable, kind: PanelKind) -> Result<ChartData, PanelBody> {
    let outputs = ModelOutputs::from_table(table)
        .ok_or_else(|| info("Predictions are not available for this upload."))?;

    match kind {
        PanelKind::ProbabilityHistogram => {
            let bins = stats::unit_histogram(&outputs.probabilities, HISTOGRAM_BINS);
            let kde = stats::kde_curve(
                &outputs.probabilities,
                1.0 / HISTOGRAM_BINS as f64,
                (0.0, 1.0),
                KDE_POINTS,
            );
            Ok(ChartData::Histogram { bins, kde })
        }
        PanelKind::PredictionPie => Ok(ChartData::Pie {
            slices: prediction_slices(&outputs.predictions),
        }),
        PanelKind::TopFraudTitles => {
            let bars = top_fraud_values(table, &outputs, TITLE);
            if bars.is_empty() {
                return Err(info(NO_FRAUD_MESSAGE));
            }
            Ok(ChartData::HorizontalBar {
                x_label: "Count".to_string(),
                y_label: "Job Title".to_string(),
                bars,
            })
        }
        PanelKind::TopFraudLocations => {
            let bars = top_fraud_values(table, &outputs, LOCATION);
            if bars.is_empty() {
                return Err(info(NO_FRAUD_MESSAGE));
            }
            Ok(ChartData::HorizontalBar {
                x_label: "Count".to_string(),
                y_label: "Location".to_string(),
                bars,
            })
        }
        PanelKind::EmploymentTypeBreakdown => Ok(ChartData::StackedBar {
            groups: employment_breakdown(table, &outputs),
        }),
        PanelKind::TitleLengthScatter => {
            let lengths = table
                .numeric_column(TITLE_LENGTH)
                .ok_or_else(|| info("Title lengths are not available for this upload."))?;
            let points = lengths
                .into_iter()
                .zip(&outputs.probabilities)
                .filter_map(|(length, p)| length.map(|l| (l, *p)))
                .collect();
            Ok(ChartData::Scatter {
                x_label: "Title Length".to_string(),
                y_label: "Fraud Probability".to_string(),
                points,
            })
        }
        PanelKind::DescriptionLengthBoxplot => {
            let counts = table
                .numeric_column(DESC_WORD_COUNT)
                .ok_or_else(|| info("Description word counts are not available."))?;
            Ok(ChartData::BoxPlot {
                groups: word_count_groups(&counts, &outputs.predictions),
            })
        }
        PanelKind::CorrelationHeatmap => {
            let columns = table.numeric_columns();
            if columns.is_empty() {
                return Err(info(NO_NUMERIC_MESSAGE));
            }
            let values: Vec<Vec<Option<f64>>> = columns
                .iter()
                .filter_map(|name| table.numeric_column(name))
                .collect();
            Ok(ChartData::Heatmap {
                matrix: stats::correlation_matrix(&values),
                columns,
            })
        }
    }
}

/// Model columns parsed back out of the augmented table.
struct ModelOutputs {
    probabilities: Vec<f64>,
    predictions: Vec<u8>,
}

impl ModelOutputs {
    fn from_table(table: &PostingTable) -> Option<Self> {
        let probabilities = table
            .column(FRAUD_PROBABILITY)?
            .into_iter()
            .map(parse_number)
            .collect::<Option<Vec<f64>>>()?;
        let predictions = table
            .column(FRAUD_PREDICTION)?
            .into_iter()
            .map(|cell| cell.trim().parse::<u8>().ok())
            .collect::<Option<Vec<u8>>>()?;
        Some(Self {
            probabilities,
            predictions,
        })
    }
}

pub fn class_label(prediction: u8) -> &'static str {
    if prediction == 1 {
        "Fraud"
    } else {
        "Real"
    }
}

/// Real then Fraud, only for classes present.
pub fn prediction_slices(predictions: &[u8]) -> Vec<PieSlice> {
    let total = predictions.len();
    [0u8, 1u8]
        .iter()
        .filter_map(|class| {
            let count = predictions.iter().filter(|p| **p == *class).count();
            (count > 0).then(|| PieSlice {
                label: class_label(*class).to_string(),
                count,
                percent: (count as f64 * 1000.0 / total as f64).round() / 10.0,
            })
        })
        .collect()
}

fn top_fraud_values(
    table: &PostingTable,
    outputs: &ModelOutputs,
    column: &str,
) -> Vec<(String, usize)> {
    let Some(cells) = table.column(column) else {
        return Vec::new();
    };
    let fraud_cells = cells
        .into_iter()
        .zip(&outputs.predictions)
        .filter(|(cell, prediction)| **prediction == 1 && !cell.trim().is_empty())
        .map(|(cell, _)| cell);
    stats::top_counts(fraud_cells, TOP_N)
}

fn employment_breakdown(table: &PostingTable, outputs: &ModelOutputs) -> Vec<CategoryCounts> {
    let Some(cells) = table.column(EMPLOYMENT_TYPE) else {
        return Vec::new();
    };

    let mut groups: Vec<CategoryCounts> = Vec::new();
    for (cell, prediction) in cells.into_iter().zip(&outputs.predictions) {
        let category = match cell.trim() {
            "" => "Unknown",
            value => value,
        };
        let position = match groups.iter().position(|g| g.category == category) {
            Some(position) => position,
            None => {
                groups.push(CategoryCounts {
                    category: category.to_string(),
                    real: 0,
                    fraud: 0,
                });
                groups.len() - 1
            }
        };
        if *prediction == 1 {
            groups[position].fraud += 1;
        } else {
            groups[position].real += 1;
        }
    }

    groups.sort_by(|a, b| (b.real + b.fraud).cmp(&(a.real + a.fraud)));
    groups
}

fn word_count_groups(counts: &[Option<f64>], predictions: &[u8]) -> Vec<BoxGroup> {
    [0u8, 1u8]
        .iter()
        .filter_map(|class| {
            let values: Vec<f64> = counts
                .iter()
                .zip(predictions)
                .filter(|(_, p)| **p == *class)
                .filter_map(|(count, _)| *count)
                .collect();
            stats::five_number_summary(&values).map(|summary| BoxGroup {
                label: class_label(*class).to_string(),
                summary,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn augmented(csv: &str, probabilities: &[f64], predictions: &[u8]) -> PostingTable {
        let mut table = PostingTable::from_csv_bytes(csv.as_bytes()).unwrap();
        table
            .set_column(
                FRAUD_PROBABILITY,
                probabilities.iter().map(|p| p.to_string()).collect(),
            )
            .unwrap();
        table
            .set_column(
                FRAUD_PREDICTION,
                predictions.iter().map(|p| p.to_string()).collect(),
            )
            .unwrap();
        table.add_derived_columns().unwrap();
        table
    }

    fn scenario() -> PostingTable {
        augmented(
            "title\nEngineer\nScam Job\nAnalyst\n",
            &[0.1, 0.9, 0.3],
            &[0, 1, 0],
        )
    }

    #[test]
    fn test_pie_counts_real_and_fraud() {
        let data = compute(&scenario(), PanelKind::PredictionPie).unwrap();
        let ChartData::Pie { slices } = data else {
            panic!("expected pie data");
        };
        assert_eq!(slices.len(), 2);
        assert_eq!((slices[0].label.as_str(), slices[0].count), ("Real", 2));
        assert_eq!((slices[1].label.as_str(), slices[1].count), ("Fraud", 1));
        assert_eq!(slices[0].percent, 66.7);
        assert_eq!(slices[1].percent, 33.3);
    }

    #[test]
    fn test_pie_only_shows_present_classes() {
        let slices = prediction_slices(&[0, 0]);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].label, "Real");
        assert_eq!(slices[0].percent, 100.0);
    }

    #[test]
    fn test_histogram_counts_every_row() {
        let data = compute(&scenario(), PanelKind::ProbabilityHistogram).unwrap();
        let ChartData::Histogram { bins, kde } = data else {
            panic!("expected histogram data");
        };
        assert_eq!(bins.len(), HISTOGRAM_BINS);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);
        assert!(kde.is_some());
    }

    #[test]
    fn test_top_titles_only_counts_fraud() {
        let table = augmented(
            "title\nDriver\nDriver\nAnalyst\nDriver\n",
            &[0.8, 0.7, 0.9, 0.1],
            &[1, 1, 1, 0],
        );
        let ChartData::HorizontalBar { bars, .. } = compute(&table, PanelKind::TopFraudTitles).unwrap()
        else {
            panic!("expected bar data");
        };
        assert_eq!(
            bars,
            vec![("Driver".to_string(), 2), ("Analyst".to_string(), 1)]
        );
    }

    #[test]
    fn test_top_titles_without_fraud_is_info() {
        let table = augmented("title\nA\nB\n", &[0.1, 0.2], &[0, 0]);
        assert!(matches!(
            compute(&table, PanelKind::TopFraudTitles),
            Err(PanelBody::Info { message }) if message == NO_FRAUD_MESSAGE
        ));
    }

    #[test]
    fn test_missing_optional_columns_render_placeholders() {
        let panels = build_panels(
            &scenario(),
            &[
                PanelKind::TopFraudLocations,
                PanelKind::EmploymentTypeBreakdown,
                PanelKind::DescriptionLengthBoxplot,
            ],
        );
        let messages: Vec<&str> = panels
            .iter()
            .map(|panel| match &panel.body {
                PanelBody::Info { message } => message.as_str(),
                other => panic!("expected placeholder, got {:?}", other),
            })
            .collect();
        assert_eq!(
            messages,
            vec![
                "No 'location' column found for location analysis.",
                "No 'employment_type' column found for employment type analysis.",
                "No 'description' column found for description length analysis.",
            ]
        );
    }

    #[test]
    fn test_draw_failure_is_isolated_to_its_panel() {
        let kinds = [
            PanelKind::ProbabilityHistogram,
            PanelKind::PredictionPie,
            PanelKind::TitleLengthScatter,
        ];
        let panels = build_panels_with(&scenario(), &kinds, |_, data| match data {
            ChartData::Pie { .. } => anyhow::bail!("backend exploded"),
            _ => Ok("<svg/>".to_string()),
        });

        let ids: Vec<&str> = panels.iter().map(|p| p.id).collect();
        assert_eq!(
            ids,
            vec!["probability_histogram", "prediction_pie", "title_length_scatter"]
        );
        assert!(matches!(&panels[0].body, PanelBody::Chart { svg, .. } if svg == "<svg/>"));
        assert!(matches!(
            &panels[1].body,
            PanelBody::Error { message } if message == "Could not draw this chart: backend exploded"
        ));
        assert!(matches!(&panels[2].body, PanelBody::Chart { .. }));
    }

    #[test]
    fn test_employment_breakdown() {
        let table = augmented(
            "title,employment_type\nA,Full-time\nB,Contract\nC,Full-time\nD,\n",
            &[0.1, 0.9, 0.8, 0.2],
            &[0, 1, 1, 0],
        );
        let ChartData::StackedBar { groups } =
            compute(&table, PanelKind::EmploymentTypeBreakdown).unwrap()
        else {
            panic!("expected stacked bar data");
        };
        assert_eq!(groups[0].category, "Full-time");
        assert_eq!((groups[0].real, groups[0].fraud), (1, 1));
        assert_eq!(groups[1].category, "Contract");
        assert_eq!(groups[2].category, "Unknown");
    }

    #[test]
    fn test_scatter_uses_title_length() {
        let ChartData::Scatter { points, .. } =
            compute(&scenario(), PanelKind::TitleLengthScatter).unwrap()
        else {
            panic!("expected scatter data");
        };
        assert_eq!(points, vec![(8.0, 0.1), (8.0, 0.9), (7.0, 0.3)]);
    }

    #[test]
    fn test_boxplot_groups_by_prediction() {
        let table = augmented(
            "title,description\nA,one two three\nB,one\nC,a b c d e f\n",
            &[0.1, 0.2, 0.9],
            &[0, 0, 1],
        );
        let ChartData::BoxPlot { groups } =
            compute(&table, PanelKind::DescriptionLengthBoxplot).unwrap()
        else {
            panic!("expected boxplot data");
        };
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "Real");
        assert_eq!(groups[0].summary.median, 2.0);
        assert_eq!(groups[1].summary.median, 6.0);
    }

    #[test]
    fn test_heatmap_includes_derived_columns() {
        let ChartData::Heatmap { columns, matrix } =
            compute(&scenario(), PanelKind::CorrelationHeatmap).unwrap()
        else {
            panic!("expected heatmap data");
        };
        assert_eq!(
            columns,
            vec!["fraud_probability", "fraud_prediction", "title_length"]
        );
        assert_eq!(matrix.len(), 3);
        assert!((matrix[0][0].unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_panel_kinds_follow_configured_order() {
        let kinds = [PanelKind::CorrelationHeatmap, PanelKind::PredictionPie];
        let panels = build_panels(&scenario(), &kinds);
        assert_eq!(panels[0].id, "correlation_heatmap");
        assert_eq!(panels[1].id, "prediction_pie");
    }
}
