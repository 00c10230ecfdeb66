//! Evaluation of predicted labels against the true labels.

use crate::error::{AnalysisError, Result};
use crate::types::dataset::LabelVector;
use crate::types::report::{ClassMetrics, ClassificationReport, StrategyReport};
use std::collections::BTreeMap;
use tracing::info;

/// Dataset classes: 0 = valid, 1 = fraud
pub const CLASSES: [u8; 2] = [0, 1];

/// 2x2 confusion matrix, `counts[actual][predicted]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfusionMatrix {
    counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    pub fn from_labels(actual: &[u8], predicted: &[u8]) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(AnalysisError::validation(format!(
                "label length {} != prediction length {}",
                actual.len(),
                predicted.len()
            )));
        }
        let mut counts = [[0usize; 2]; 2];
        for (i, (&a, &p)) in actual.iter().zip(predicted).enumerate() {
            if a > 1 || p > 1 {
                return Err(AnalysisError::validation(format!(
                    "row {}: labels must be 0 or 1 (actual {}, predicted {})",
                    i, a, p
                )));
            }
            counts[a as usize][p as usize] += 1;
        }
        Ok(Self { counts })
    }

    pub fn get(&self, actual: u8, predicted: u8) -> usize {
        self.counts[actual as usize][predicted as usize]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn true_positives(&self, class: u8) -> usize {
        self.get(class, class)
    }

    pub fn false_positives(&self, class: u8) -> usize {
        self.get(1 - class, class)
    }

    pub fn false_negatives(&self, class: u8) -> usize {
        self.get(class, 1 - class)
    }

    /// Rows whose true label is `class`
    pub fn support(&self, class: u8) -> usize {
        self.true_positives(class) + self.false_negatives(class)
    }

    /// Off-diagonal count
    pub fn mismatches(&self) -> usize {
        self.get(0, 1) + self.get(1, 0)
    }

    /// Precision, recall and F1 for one class. Zero denominators give 0.0
    /// and set `zero_division`.
    pub fn class_metrics(&self, class: u8) -> ClassMetrics {
        let tp = self.true_positives(class);
        let predicted = tp + self.false_positives(class);
        let support = self.support(class);

        let (precision, precision_undefined) = ratio(tp, predicted);
        let (recall, recall_undefined) = ratio(tp, support);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };

        ClassMetrics {
            precision,
            recall,
            f1,
            support,
            zero_division: precision_undefined || recall_undefined,
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> (f64, bool) {
    if denominator == 0 {
        (0.0, true)
    } else {
        (numerator as f64 / denominator as f64, false)
    }
}

/// Result of comparing one prediction vector with the truth
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub confusion: ConfusionMatrix,
    pub mismatches: usize,
    pub accuracy: f64,
    pub report: ClassificationReport,
}

/// Compare normalized predictions with the true labels.
pub fn evaluate(truth: &LabelVector, predicted: &[u8]) -> Result<Evaluation> {
    if truth.is_empty() {
        return Err(AnalysisError::validation("cannot evaluate an empty label vector"));
    }
    let confusion = ConfusionMatrix::from_labels(truth.as_slice(), predicted)?;

    let total = confusion.total();
    let mismatches = confusion.mismatches();
    let accuracy = 1.0 - mismatches as f64 / total as f64;

    let classes: BTreeMap<u8, ClassMetrics> = CLASSES
        .iter()
        .map(|&c| (c, confusion.class_metrics(c)))
        .collect();

    let macro_avg = average(&classes, total, |_| 1.0 / classes.len() as f64);
    let weighted_avg = average(&classes, total, |m| m.support as f64 / total as f64);

    Ok(Evaluation {
        confusion,
        mismatches,
        accuracy,
        report: ClassificationReport {
            classes,
            macro_avg,
            weighted_avg,
            accuracy,
            total,
        },
    })
}

fn average(
    classes: &BTreeMap<u8, ClassMetrics>,
    total: usize,
    weight: impl Fn(&ClassMetrics) -> f64,
) -> ClassMetrics {
    let mut avg = ClassMetrics {
        precision: 0.0,
        recall: 0.0,
        f1: 0.0,
        support: total,
        zero_division: false,
    };
    for m in classes.values() {
        let w = weight(m);
        avg.precision += w * m.precision;
        avg.recall += w * m.recall;
        avg.f1 += w * m.f1;
        avg.zero_division |= m.zero_division;
    }
    avg
}

/// Log a side-by-side comparison of every strategy
pub fn print_summary(reports: &[StrategyReport]) {
    info!("╔══════════════════════════════════════════════════════════════╗");
    info!("║          FRAUD OUTLIER DETECTION - STRATEGY COMPARISON       ║");
    info!("╠══════════════════════════════════════════════════════════════╣");
    for report in reports {
        let fraud = report.classification.class(1);
        info!(
            "║ {:<22} errors={:>6} accuracy={:>7.4} flagged={:>6} ║",
            report.strategy, report.mismatches, report.accuracy, report.outliers_flagged
        );
        if let Some(fraud) = fraud {
            info!(
                "║   fraud: precision={:>5.2} recall={:>5.2} f1={:>5.2} support={:>6} ║",
                fraud.precision, fraud.recall, fraud.f1, fraud.support
            );
        }
        info!("║   elapsed: {:>8} ms                                        ║", report.elapsed_ms);
    }
    info!("╚══════════════════════════════════════════════════════════════╝");
}
