//! Lab table processing: classification, identifier transforms, replicate
//! mapping and reshape.
//!
//! # Pipeline
//!
//! 1. [`Classifier`] decides between flow cytometry and generic lab data
//! 2. [`detect_id_column`] finds the sample identifier column
//! 3. [`TableTransformer`] decodes identifiers into a validated table
//! 4. [`ReplicateMap`] aligns animals into replicate slots
//! 5. [`reshape`] emits replicate-aligned blocks per metric
//!
//! [`Pipeline`] runs stages 1 to 4 for one table; [`process_directory`]
//! runs a batch and keeps going past failed files.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use lab_core::Pipeline;
//! use lab_model::ProcessingOptions;
//!
//! let mut pipeline = Pipeline::new(ProcessingOptions::default())?;
//! let processed = pipeline.process_file(Path::new("plate.csv"))?;
//! for group in &processed.metric_groups {
//!     let blocks = processed.reshape_group(group)?;
//! }
//! ```

mod aggregate;
mod batch;
mod classify;
mod columns;
mod error;
mod frame;
mod pipeline;
mod replicate;
mod reshape;
mod transform;

// === Error Types ===
pub use error::{CoreError, Result};

// === Classification ===
pub use classify::{Classification, Classifier, FlowSignal};
pub use columns::{
    ColumnScore, LIKELY_IDENTIFIER_SCORE, MetricGroup, candidate_scores, detect_id_column,
    group_metrics, is_likely_identifier_column, metric_columns, metric_kind, score_column,
};

// === Transform ===
pub use transform::{
    TableTransformer, TransformOutcome, TransformStats, metric_column_indices,
    parse_lab_group, parse_lab_time, parse_metric_value, synthesize_sample_id, transform_flow,
    transform_generic, validate_flow, validate_generic,
};

// === Replicates and Reshape ===
pub use aggregate::{BlockSummary, summarize_block, summarize_blocks};
pub use replicate::{Dimensions, PartitionKey, ReplicateMap, TimeKey};
pub use reshape::{ReplicateSlot, ReshapeBlock, block_headers, reshape};

// === Output ===
pub use frame::structured_frame;

// === Pipeline ===
pub use batch::{BatchFailure, BatchReport, process_directory, process_files};
pub use pipeline::{Pipeline, ProcessedTable, process_file};
