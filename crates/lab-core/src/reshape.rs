//! Reshape engine: structured rows to replicate-aligned blocks.
//!
//! Each block is one `(tissue, time, group)` combination of one metric and
//! holds exactly `replicate_count` slots. Blocks are emitted per metric in
//! the order given, then tissue, time and group ascending. Combinations
//! without any value are dropped.

use std::collections::BTreeMap;

use lab_model::StructuredTable;
use lab_parse::{TimeFormat, format_time};
use serde::Serialize;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::replicate::{ReplicateMap, TimeKey};

/// One replicate position: the value and the identifier it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplicateSlot {
    pub value: Option<f64>,
    /// Empty when no sample occupies the slot.
    pub sample_id: String,
}

impl ReplicateSlot {
    pub fn is_empty(&self) -> bool {
        self.sample_id.is_empty()
    }
}

/// One output row of the reshaped table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReshapeBlock {
    pub metric: String,
    /// Present only when the table spans several tissues.
    pub tissue: Option<String>,
    /// Present only for time-course tables.
    pub time: Option<f64>,
    pub group: i64,
    pub slots: Vec<ReplicateSlot>,
}

impl ReshapeBlock {
    /// Non-missing values in slot order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.slots.iter().filter_map(|slot| slot.value)
    }

    /// Number of slots occupied by a sample.
    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_empty()).count()
    }

    /// Flat record: `Tissue, Time, Group, Metric, Rep 1..N, ID 1..N`.
    pub fn record(&self, time_format: TimeFormat) -> Vec<String> {
        let mut record = Vec::with_capacity(4 + self.slots.len() * 2);
        record.push(self.tissue.clone().unwrap_or_default());
        record.push(
            self.time
                .map(|hours| format_time(hours, time_format))
                .unwrap_or_default(),
        );
        record.push(self.group.to_string());
        record.push(self.metric.clone());
        record.extend(self.slots.iter().map(|slot| {
            slot.value
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default()
        }));
        record.extend(self.slots.iter().map(|slot| slot.sample_id.clone()));
        record
    }
}

/// Header matching [`ReshapeBlock::record`].
pub fn block_headers(replicate_count: usize) -> Vec<String> {
    let mut headers: Vec<String> = ["Tissue", "Time", "Group", "Metric"]
        .into_iter()
        .map(String::from)
        .collect();
    headers.extend((1..=replicate_count).map(|i| format!("Rep {i}")));
    headers.extend((1..=replicate_count).map(|i| format!("ID {i}")));
    headers
}

type BlockKey = (Option<String>, Option<TimeKey>, i64);

/// Reshapes the given metric columns of a replicate-mapped table.
///
/// Rows without a replicate are ignored; call [`ReplicateMap::apply`] first.
pub fn reshape(
    table: &StructuredTable,
    map: &ReplicateMap,
    metrics: &[String],
) -> Result<Vec<ReshapeBlock>> {
    let dims = map.dimensions;
    let width = map.replicate_count;
    let mut blocks = Vec::new();

    for metric in metrics {
        let metric_idx = table
            .metric_index(metric)
            .ok_or_else(|| CoreError::MetricNotFound {
                column: metric.clone(),
            })?;

        let mut grouped: BTreeMap<BlockKey, Vec<ReplicateSlot>> = BTreeMap::new();
        for row in &table.rows {
            let (Some(group), Some(replicate)) = (row.group, row.replicate) else {
                continue;
            };
            let key = (
                dims.tissue.then(|| row.tissue.clone()),
                if dims.time { row.time_hours.map(TimeKey) } else { None },
                group,
            );
            let slots = grouped
                .entry(key)
                .or_insert_with(|| vec![ReplicateSlot::default(); width]);
            let Some(slot) = slots.get_mut((replicate as usize).saturating_sub(1)) else {
                continue;
            };
            if !slot.is_empty() {
                debug!(sample_id = %row.sample_id, replicate, "replicate slot already taken");
                continue;
            }
            *slot = ReplicateSlot {
                value: row.value(metric_idx),
                sample_id: row.sample_id.clone(),
            };
        }

        let before = blocks.len();
        blocks.extend(
            grouped
                .into_iter()
                .filter(|(_, slots)| slots.iter().any(|slot| slot.value.is_some()))
                .map(|((tissue, time, group), slots)| ReshapeBlock {
                    metric: metric.clone(),
                    tissue,
                    time: time.map(|key| key.0),
                    group,
                    slots,
                }),
        );
        debug!(metric = %metric, blocks = blocks.len() - before, "metric reshaped");
    }

    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab_model::{DataType, ProcessingOptions, StructuredRow};

    fn mapped(rows: Vec<(&str, i64, i64, Option<f64>)>) -> (StructuredTable, ReplicateMap) {
        let mut table =
            StructuredTable::new(DataType::FlowCytometry, "Sample", vec!["Count".to_string()]);
        for (idx, (id, group, animal, value)) in rows.into_iter().enumerate() {
            let mut row = StructuredRow::new(idx, id);
            row.group = Some(group);
            row.animal = Some(animal);
            row.tissue = "SP".to_string();
            row.values = vec![value];
            table.rows.push(row);
        }
        let map = ReplicateMap::build(&table, &ProcessingOptions::default()).unwrap();
        map.apply(&mut table);
        (table, map)
    }

    #[test]
    fn ragged_group_has_empty_slot() {
        let (table, map) = mapped(vec![
            ("1.1", 1, 1, Some(10.0)),
            ("1.2", 1, 2, Some(11.0)),
            ("1.3", 1, 3, Some(12.0)),
            ("2.1", 2, 1, Some(20.0)),
            ("2.2", 2, 2, Some(21.0)),
        ]);
        let blocks = reshape(&table, &map, &["Count".to_string()]).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].group, 2);
        assert_eq!(blocks[1].filled(), 2);
        assert_eq!(blocks[1].slots[2], ReplicateSlot::default());
    }

    #[test]
    fn valueless_blocks_are_dropped() {
        let (table, map) = mapped(vec![("1.1", 1, 1, Some(1.0)), ("2.1", 2, 1, None)]);
        let blocks = reshape(&table, &map, &["Count".to_string()]).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].group, 1);
    }

    #[test]
    fn unknown_metric_fails() {
        let (table, map) = mapped(vec![("1.1", 1, 1, Some(1.0))]);
        assert!(matches!(
            reshape(&table, &map, &["Median".to_string()]),
            Err(CoreError::MetricNotFound { .. })
        ));
    }

    #[test]
    fn records_align_with_headers() {
        let (table, map) = mapped(vec![("1.1", 1, 1, Some(1.5)), ("1.2", 1, 2, None)]);
        let blocks = reshape(&table, &map, &["Count".to_string()]).unwrap();
        let headers = block_headers(map.replicate_count);
        let record = blocks[0].record(TimeFormat::Hm);
        assert_eq!(headers.len(), record.len());
        assert_eq!(record, vec!["", "", "1", "Count", "1.5", "", "1.1", "1.2"]);
    }
}
