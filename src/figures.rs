//! Chart-ready data for the five figures of the haptics analysis. Nothing in
//! here draws anything, see [crate::gui] for a terminal renderer or
//! [crate::report] for exporting the data to another plotting tool.

use crate::aggregator::{Condition, ConditionSeries, Study};
use crate::config::PerformanceMetric;
use crate::run_metrics::RunMetrics;
use crate::stats::{mean, BoxStats};

use serde::Serialize;

/// One box in a box plot, `stats` is `None` when the group was empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledBox {
    /// Tick label under the box
    pub label: String,
    /// Summary of the group
    pub stats: Option<BoxStats>,
}

/// A box plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxFigure {
    /// Figure title
    pub title: String,
    /// Label of the value axis
    pub y_label: String,
    /// Boxes from left to right
    pub boxes: Vec<LabeledBox>,
}

/// A named set of points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    /// Legend entry
    pub label: String,
    /// `(x, y)` pairs
    pub points: Vec<(f64, f64)>,
}

/// A scatter plot with one series per condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterFigure {
    /// Figure title
    pub title: String,
    /// Label of the horizontal axis
    pub x_label: String,
    /// Label of the vertical axis
    pub y_label: String,
    /// Series, without haptics first
    pub series: Vec<ScatterSeries>,
}

/// One panel of the learning curve: performance against repetition number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningPanel {
    /// Which condition the panel shows
    pub condition: Condition,
    /// Every run as `(repetition, performance)`, repetitions counted from 1
    pub points: Vec<(f64, f64)>,
    /// Mean performance per repetition, as `(repetition, mean)`. A
    /// repetition without any value has no mean.
    pub means: Vec<(f64, f64)>,
    /// Highest repetition number that has a value
    pub repetitions: usize,
}

/// Learning curves of both conditions, sharing the vertical axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningFigure {
    /// Figure title
    pub title: String,
    /// Label of the shared value axis
    pub y_label: String,
    /// Without haptics, then with haptics
    pub panels: Vec<LearningPanel>,
}

/// Any one of the figures, so they can be cycled through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Figure<'a> {
    /// A box plot
    Box(&'a BoxFigure),
    /// The learning curve
    Learning(&'a LearningFigure),
    /// A scatter plot
    Scatter(&'a ScatterFigure),
}

impl Figure<'_> {
    /// The title of whichever figure this is.
    pub fn title(&self) -> &str {
        match self {
            Figure::Box(f) => &f.title,
            Figure::Learning(f) => &f.title,
            Figure::Scatter(f) => &f.title,
        }
    }
}

/// All five figures of a study.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FigureSet {
    /// Which metric stands in for performance
    pub metric: PerformanceMetric,
    /// Performance, without vs with haptics
    pub performance: BoxFigure,
    /// Performance per repetition within a trial, for both conditions
    pub per_repetition: BoxFigure,
    /// Performance against repetition number
    pub learning: LearningFigure,
    /// Max velocity against performance
    pub velocity: ScatterFigure,
    /// Distance travelled against performance
    pub distance: ScatterFigure,
}

/// Pairs one value of each run with that run's performance. Runs missing
/// either value are left out.
fn run_pairs<F>(series: &ConditionSeries, metric: PerformanceMetric, x: F) -> Vec<(f64, f64)>
where
    F: Fn(&RunMetrics) -> Option<f64>,
{
    series
        .runs()
        .iter()
        .filter_map(|run| Some((x(run)?, ConditionSeries::run_performance(run, metric)?)))
        .collect()
}

fn metric_name(metric: PerformanceMetric) -> &'static str {
    match metric {
        PerformanceMetric::TimeAlive => "Time alive",
        PerformanceMetric::WeightedScore => "Weighted performance",
    }
}

impl FigureSet {
    /// Compute every figure for `study` using `metric` as performance.
    pub fn build(study: &Study, metric: PerformanceMetric) -> Self {
        let y_label = metric.axis_label().to_owned();
        let perf_title = "Performance - without and with haptics".to_owned();

        let performance = BoxFigure {
            title: perf_title.clone(),
            y_label: y_label.clone(),
            boxes: Condition::ALL
                .iter()
                .map(|&c| LabeledBox {
                    label: c.label().to_owned(),
                    stats: BoxStats::from_samples(&study.series(c).performance(metric)),
                })
                .collect(),
        };

        let per_repetition = BoxFigure {
            title: perf_title,
            y_label: y_label.clone(),
            boxes: Condition::ALL
                .iter()
                .flat_map(|&c| {
                    study
                        .series(c)
                        .by_repetition(metric)
                        .into_iter()
                        .enumerate()
                        .map(move |(i, values)| LabeledBox {
                            label: format!("Trial {} - {}", i + 1, c.label().to_lowercase()),
                            stats: BoxStats::from_samples(&values),
                        })
                })
                .collect(),
        };

        let learning = LearningFigure {
            title: "Learning curve - Performance".to_owned(),
            y_label: y_label.clone(),
            panels: Condition::ALL
                .iter()
                .map(|&c| {
                    let reps = study.series(c).by_repetition(metric);
                    let points = reps
                        .iter()
                        .enumerate()
                        .flat_map(|(i, values)| values.iter().map(move |&v| ((i + 1) as f64, v)))
                        .collect();
                    let means = reps
                        .iter()
                        .enumerate()
                        .filter_map(|(i, values)| Some(((i + 1) as f64, mean(values)?)))
                        .collect();
                    LearningPanel {
                        condition: c,
                        points,
                        means,
                        repetitions: reps.len(),
                    }
                })
                .collect(),
        };

        let scatter = |title: String, x_label: &str, x: fn(&RunMetrics) -> Option<f64>| {
            ScatterFigure {
                title,
                x_label: x_label.to_owned(),
                y_label: y_label.clone(),
                series: Condition::ALL
                    .iter()
                    .map(|&c| ScatterSeries {
                        label: c.label().to_owned(),
                        points: run_pairs(study.series(c), metric, x),
                    })
                    .collect(),
            }
        };

        let velocity = scatter(
            format!("Max. velocity vs. {}", metric_name(metric)),
            "Velocity",
            |r| r.max_velocity.first().copied(),
        );
        let distance = scatter(
            format!("Travelled distance vs. {}", metric_name(metric)),
            "Travelled distance",
            |r| r.distance_travelled.first().copied(),
        );

        FigureSet {
            metric,
            performance,
            per_repetition,
            learning,
            velocity,
            distance,
        }
    }

    /// The figures in display order.
    pub fn figures(&self) -> Vec<Figure<'_>> {
        vec![
            Figure::Box(&self.performance),
            Figure::Box(&self.per_repetition),
            Figure::Learning(&self.learning),
            Figure::Scatter(&self.velocity),
            Figure::Scatter(&self.distance),
        ]
    }
}
