//! Accuracy and per-class precision/recall/F1

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::RainLabel;
use crate::{Result, WeatherInsightsError};

/// Share of predictions equal to the truth; 0 for no rows
#[must_use]
pub fn accuracy(y_true: &[u8], y_pred: &[u8]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Metrics of one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: u8,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Rows of this class in the truth
    pub support: usize,
}

/// Averaged metrics over classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class metrics with accuracy and macro/weighted averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Classes seen in the truth or the predictions, ascending
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
}

impl ClassificationReport {
    /// Metrics of a class, if it occurred
    #[must_use]
    pub fn class(&self, label: u8) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.label == label)
    }
}

/// Build the report for binary truth and predictions.
///
/// An undefined precision, recall or F1 (zero denominator) is reported as 0.
pub fn classification_report(y_true: &[u8], y_pred: &[u8]) -> Result<ClassificationReport> {
    if y_true.len() != y_pred.len() {
        return Err(WeatherInsightsError::validation(format!(
            "Truth ({}) and predictions ({}) differ in length",
            y_true.len(),
            y_pred.len()
        )));
    }

    let mut labels: Vec<u8> = y_true.iter().chain(y_pred).copied().collect();
    labels.sort_unstable();
    labels.dedup();

    let classes: Vec<ClassMetrics> = labels
        .iter()
        .map(|&label| {
            let true_positive = y_true
                .iter()
                .zip(y_pred)
                .filter(|&(&t, &p)| t == label && p == label)
                .count();
            let predicted = y_pred.iter().filter(|&&p| p == label).count();
            let support = y_true.iter().filter(|&&t| t == label).count();

            let precision = ratio(true_positive, predicted);
            let recall = ratio(true_positive, support);
            ClassMetrics {
                label,
                precision,
                recall,
                f1: f1_score(precision, recall),
                support,
            }
        })
        .collect();

    let total = y_true.len();
    let n_classes = classes.len();

    let macro_avg = if n_classes == 0 {
        AverageMetrics {
            precision: 0.0,
            recall: 0.0,
            f1: 0.0,
            support: total,
        }
    } else {
        let n = n_classes as f64;
        AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / n,
            support: total,
        }
    };

    let weighted = |metric: fn(&ClassMetrics) -> f64| {
        if total == 0 {
            0.0
        } else {
            classes
                .iter()
                .map(|c| metric(c) * c.support as f64)
                .sum::<f64>()
                / total as f64
        }
    };
    let weighted_avg = AverageMetrics {
        precision: weighted(|c: &ClassMetrics| c.precision),
        recall: weighted(|c: &ClassMetrics| c.recall),
        f1: weighted(|c: &ClassMetrics| c.f1),
        support: total,
    };

    Ok(ClassificationReport {
        accuracy: accuracy(y_true, y_pred),
        classes,
        macro_avg,
        weighted_avg,
    })
}

fn class_name(label: u8) -> String {
    match label {
        0 | 1 => RainLabel::from_class(label).to_string(),
        other => other.to_string(),
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| class_name(c.label).len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(12);

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                class_name(c.label),
                c.precision,
                c.recall,
                c.f1,
                c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, avg) in [
            ("macro avg", &self.macro_avg),
            ("weighted avg", &self.weighted_avg),
        ] {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, avg.support
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_accuracy() {
        assert!(close(accuracy(&[1, 0, 1, 1], &[1, 0, 0, 1]), 0.75));
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_report_values() {
        // truth: 0 0 1 1, predicted: 0 1 1 1
        let report = classification_report(&[0, 0, 1, 1], &[0, 1, 1, 1]).unwrap();

        let no_rain = report.class(0).unwrap();
        assert!(close(no_rain.precision, 1.0));
        assert!(close(no_rain.recall, 0.5));
        assert!(close(no_rain.f1, 2.0 / 3.0));
        assert_eq!(no_rain.support, 2);

        let rain = report.class(1).unwrap();
        assert!(close(rain.precision, 2.0 / 3.0));
        assert!(close(rain.recall, 1.0));
        assert!(close(rain.f1, 0.8));

        assert!(close(report.accuracy, 0.75));
        assert!(close(report.macro_avg.precision, (1.0 + 2.0 / 3.0) / 2.0));
        assert!(close(report.weighted_avg.recall, 0.75));
        assert_eq!(report.weighted_avg.support, 4);
    }

    #[test]
    fn test_zero_division_yields_zero() {
        // class 1 is never predicted
        let report = classification_report(&[0, 1, 1], &[0, 0, 0]).unwrap();
        let rain = report.class(1).unwrap();
        assert_eq!(rain.precision, 0.0);
        assert_eq!(rain.recall, 0.0);
        assert_eq!(rain.f1, 0.0);
    }

    #[test]
    fn test_only_seen_classes_are_reported() {
        let report = classification_report(&[0, 0], &[0, 0]).unwrap();
        assert_eq!(report.classes.len(), 1);
        assert!(report.class(1).is_none());
        assert!(close(report.macro_avg.f1, 1.0));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(classification_report(&[0, 1], &[0]).is_err());
    }

    #[test]
    fn test_display_table() {
        let report = classification_report(&[0, 0, 1, 1], &[0, 1, 1, 1]).unwrap();
        let text = report.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("     No Rain      1.00      0.50      0.67         2"));
        assert!(text.contains("accuracy"));
        assert!(text.contains("weighted avg"));
    }
}
