//! Per-block summary statistics.

use serde::Serialize;

use crate::reshape::ReshapeBlock;

/// Mean, sample standard deviation, count and standard error of one block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlockSummary {
    pub mean: f64,
    /// Sample standard deviation (n - 1); zero below two values.
    pub std: f64,
    pub count: usize,
    /// `std / sqrt(n)` for n > 1, else zero.
    pub sem: f64,
}

impl BlockSummary {
    /// `None` for an empty input.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let count = values.len();
        if count == 0 {
            return None;
        }
        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = if count > 1 {
            let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (squares / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        let sem = if count > 1 { std / n.sqrt() } else { 0.0 };
        Some(Self {
            mean,
            std,
            count,
            sem,
        })
    }
}

pub fn summarize_block(block: &ReshapeBlock) -> Option<BlockSummary> {
    let values: Vec<f64> = block.values().collect();
    BlockSummary::from_values(&values)
}

/// Summaries for every block that has at least one value.
pub fn summarize_blocks(blocks: &[ReshapeBlock]) -> Vec<(&ReshapeBlock, BlockSummary)> {
    blocks
        .iter()
        .filter_map(|block| summarize_block(block).map(|summary| (block, summary)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_statistics() {
        let summary = BlockSummary::from_values(&[2.0, 4.0, 6.0]).unwrap();
        assert_eq!(summary.count, 3);
        assert!((summary.mean - 4.0).abs() < 1e-12);
        assert!((summary.std - 2.0).abs() < 1e-12);
        assert!((summary.sem - 2.0 / 3f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn single_value_has_no_spread() {
        let summary = BlockSummary::from_values(&[7.5]).unwrap();
        assert_eq!((summary.std, summary.sem), (0.0, 0.0));
        assert!(BlockSummary::from_values(&[]).is_none());
    }
}
