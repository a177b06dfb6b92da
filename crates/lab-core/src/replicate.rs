//! Replicate mapping.
//!
//! Animals are aligned into replicate slots so that groups with different
//! animal numbers line up column-wise in the reshaped output. Rows are
//! partitioned by `(time, group, tissue)`; inside each partition the distinct
//! animals are sorted and numbered from 1.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use lab_model::{
    LabError, ProcessingOptions, ReplicateMode, Result, StructuredRow, StructuredTable,
    ValidationInvariant,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Hours as a totally ordered map key.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TimeKey(pub f64);

impl PartialEq for TimeKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimeKey {}

impl PartialOrd for TimeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for TimeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// Partition a row belongs to. Dimensions that are not in use are `None`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PartitionKey {
    pub time: Option<TimeKey>,
    pub group: i64,
    pub tissue: Option<String>,
}

/// Which dimensions partition the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Dimensions {
    /// More than one distinct tissue code is present.
    pub tissue: bool,
    /// At least one row has a time value.
    pub time: bool,
}

impl Dimensions {
    /// Dimensions in use across `rows`.
    pub fn of<'a>(rows: impl IntoIterator<Item = &'a StructuredRow>) -> Self {
        let mut tissues = BTreeSet::new();
        let mut time = false;
        for row in rows {
            tissues.insert(row.tissue.as_str());
            time |= row.time_hours.is_some();
        }
        Self {
            tissue: tissues.len() > 1,
            time,
        }
    }

    /// Partition key of a row; `None` without a group.
    pub fn key(self, row: &StructuredRow) -> Option<PartitionKey> {
        Some(PartitionKey {
            time: if self.time { row.time_hours.map(TimeKey) } else { None },
            group: row.group?,
            tissue: self.tissue.then(|| row.tissue.clone()),
        })
    }
}

/// `(partition, animal) -> replicate index` with the dataset replicate count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicateMap {
    pub dimensions: Dimensions,
    /// Replicate slots per block.
    pub replicate_count: usize,
    /// Distinct animal counts differ between partitions.
    pub ragged: bool,
    #[serde(skip)]
    lookup: BTreeMap<(PartitionKey, i64), u32>,
}

impl ReplicateMap {
    /// Builds the mapping.
    ///
    /// Fails when the table has no groups or no animals. In manual mode the
    /// replicate list length fixes the replicate count and an explicit group
    /// list restricts the groups that are mapped.
    pub fn build(table: &StructuredTable, options: &ProcessingOptions) -> Result<Self> {
        let allowed: Option<BTreeSet<i64>> =
            options.groups.as_ref().map(|g| g.iter().copied().collect());
        let in_scope = |row: &&StructuredRow| {
            row.group
                .is_some_and(|g| allowed.as_ref().is_none_or(|allowed| allowed.contains(&g)))
        };

        let groups: BTreeSet<i64> = table
            .rows
            .iter()
            .filter(in_scope)
            .filter_map(|row| row.group)
            .collect();
        if groups.is_empty() {
            return Err(LabError::validation(
                ValidationInvariant::NoGroups,
                format!("no group found in {} rows", table.len()),
            ));
        }
        let has_animals = table
            .rows
            .iter()
            .filter(in_scope)
            .any(|row| row.animal.is_some());
        if !has_animals {
            return Err(LabError::validation(
                ValidationInvariant::NoAnimals,
                format!("no animal found in groups {groups:?}"),
            ));
        }

        // Rows the mapping will drop do not decide the partition shape.
        let dimensions = Dimensions::of(
            table
                .rows
                .iter()
                .filter(in_scope)
                .filter(|row| row.animal.is_some()),
        );
        let mut partitions: BTreeMap<PartitionKey, BTreeSet<i64>> = BTreeMap::new();
        for row in table.rows.iter().filter(in_scope) {
            if let (Some(key), Some(animal)) = (dimensions.key(row), row.animal) {
                partitions.entry(key).or_default().insert(animal);
            }
        }

        let largest = partitions.values().map(BTreeSet::len).max().unwrap_or(0);
        let smallest = partitions.values().map(BTreeSet::len).min().unwrap_or(0);
        let replicate_count = match (options.replicate_mode, options.replicates.as_ref()) {
            (ReplicateMode::Manual, Some(replicates)) => replicates.len(),
            _ => largest,
        };
        let ragged = smallest != largest;
        if ragged {
            warn!(
                min = smallest,
                max = largest,
                partitions = partitions.len(),
                "replicate counts differ between partitions"
            );
        }

        let mut lookup = BTreeMap::new();
        for (key, animals) in partitions {
            for (position, animal) in animals.into_iter().enumerate() {
                if position < replicate_count {
                    let replicate = u32::try_from(position + 1).unwrap_or(u32::MAX);
                    lookup.insert((key.clone(), animal), replicate);
                } else {
                    debug!(group = key.group, animal, "animal beyond the replicate count");
                }
            }
        }

        info!(
            groups = groups.len(),
            replicate_count,
            tissue = dimensions.tissue,
            time = dimensions.time,
            "replicates mapped"
        );
        Ok(Self {
            dimensions,
            replicate_count,
            ragged,
            lookup,
        })
    }

    /// Replicate index of a row, if its key is in the mapping.
    pub fn replicate_for(&self, row: &StructuredRow) -> Option<u32> {
        let key = self.dimensions.key(row)?;
        let animal = row.animal?;
        self.lookup.get(&(key, animal)).copied()
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    /// Sets each row's replicate and drops rows outside the mapping.
    /// Returns the number of dropped rows.
    pub fn apply(&self, table: &mut StructuredTable) -> usize {
        let before = table.rows.len();
        table.rows.retain_mut(|row| {
            row.replicate = self.replicate_for(row);
            row.replicate.is_some()
        });
        let dropped = before - table.rows.len();
        if dropped > 0 {
            warn!(dropped, "rows without a replicate assignment dropped");
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab_model::DataType;

    fn row(id: &str, group: i64, animal: i64, tissue: &str, time: Option<f64>) -> StructuredRow {
        let mut row = StructuredRow::new(0, id);
        row.group = Some(group);
        row.animal = Some(animal);
        row.tissue = tissue.to_string();
        row.time_hours = time;
        row
    }

    fn table(rows: Vec<StructuredRow>) -> StructuredTable {
        let mut table = StructuredTable::new(DataType::FlowCytometry, "Sample", Vec::new());
        table.rows = rows;
        table
    }

    #[test]
    fn ragged_groups_use_largest_partition() {
        let mut table = table(vec![
            row("a", 1, 1, "SP", None),
            row("b", 1, 2, "SP", None),
            row("c", 1, 3, "SP", None),
            row("d", 2, 4, "SP", None),
            row("e", 2, 7, "SP", None),
        ]);
        let map = ReplicateMap::build(&table, &ProcessingOptions::default()).unwrap();
        assert_eq!(map.replicate_count, 3);
        assert!(map.ragged);
        assert!(!map.dimensions.tissue);

        assert_eq!(map.apply(&mut table), 0);
        let replicates: Vec<_> = table.rows.iter().map(|r| r.replicate).collect();
        assert_eq!(replicates, vec![Some(1), Some(2), Some(3), Some(1), Some(2)]);
    }

    #[test]
    fn partitions_by_tissue_and_time() {
        let table = table(vec![
            row("a", 1, 5, "SP", Some(2.0)),
            row("b", 1, 5, "BM", Some(2.0)),
            row("c", 1, 6, "SP", Some(4.0)),
        ]);
        let map = ReplicateMap::build(&table, &ProcessingOptions::default()).unwrap();
        assert!(map.dimensions.tissue && map.dimensions.time);
        assert_eq!(map.replicate_count, 1);
        assert!(table.rows.iter().all(|r| map.replicate_for(r) == Some(1)));
    }

    #[test]
    fn manual_count_drops_extra_animals() {
        let mut table = table(vec![
            row("a", 1, 1, "SP", None),
            row("b", 1, 2, "SP", None),
            row("c", 1, 3, "SP", None),
            row("d", 2, 1, "SP", None),
        ]);
        let options = ProcessingOptions::default().with_manual_replicates(vec![1], vec![1, 2]);
        let map = ReplicateMap::build(&table, &options).unwrap();
        assert_eq!(map.replicate_count, 2);
        assert_eq!(map.apply(&mut table), 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn unparsed_rows_are_dropped() {
        let mut unparsed = StructuredRow::new(3, "junk");
        unparsed.tissue = "SP".to_string();
        let mut table = table(vec![row("a", 1, 1, "SP", None), unparsed]);
        let map = ReplicateMap::build(&table, &ProcessingOptions::default()).unwrap();
        assert_eq!(map.apply(&mut table), 1);
    }

    #[test]
    fn dropped_rows_do_not_add_dimensions() {
        let mut undecoded = StructuredRow::new(2, "Compensation");
        undecoded.tissue = "UNK".to_string();
        let mut table = table(vec![
            row("SP_1.1", 1, 1, "SP", None),
            row("SP_1.2", 1, 2, "SP", None),
            undecoded,
        ]);
        let map = ReplicateMap::build(&table, &ProcessingOptions::default()).unwrap();
        assert_eq!(map.dimensions, Dimensions::default());
        assert_eq!(map.apply(&mut table), 1);
        let key = map.dimensions.key(&table.rows[0]).unwrap();
        assert_eq!(key.tissue, None);
    }

    #[test]
    fn excluded_groups_do_not_add_dimensions() {
        let table = table(vec![
            row("SP_1.1", 1, 1, "SP", None),
            row("SP_1.2", 1, 2, "SP", None),
            row("BM_2.1_2h", 2, 1, "BM", Some(2.0)),
        ]);
        let options = ProcessingOptions::default().with_groups(vec![1]);
        let map = ReplicateMap::build(&table, &options).unwrap();
        assert!(!map.dimensions.tissue);
        assert!(!map.dimensions.time);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn no_groups_or_animals_fail() {
        let err =
            ReplicateMap::build(&table(Vec::new()), &ProcessingOptions::default()).unwrap_err();
        assert_eq!(err.invariant(), Some(ValidationInvariant::NoGroups));

        let mut no_animal = StructuredRow::new(0, "x");
        no_animal.group = Some(1);
        let err = ReplicateMap::build(&table(vec![no_animal]), &ProcessingOptions::default())
            .unwrap_err();
        assert_eq!(err.invariant(), Some(ValidationInvariant::NoAnimals));
    }
}
