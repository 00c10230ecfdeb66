//! Type definitions for the outlier analysis pipeline

pub mod dataset;
pub mod report;
pub mod transaction;

pub use dataset::{ClassBalance, ContaminationRatio, FeatureMatrix, LabelVector};
pub use report::{ClassMetrics, ClassificationReport, StrategyReport};
pub use transaction::TransactionTable;
