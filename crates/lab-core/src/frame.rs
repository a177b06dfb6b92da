//! Structured table to polars `DataFrame`.

use lab_model::{MetadataColumn, StructuredTable};
use polars::prelude::{Column, DataFrame, NamedFrom, PlSmallStr, Series};

use crate::error::Result;

/// Builds the structured frame: `SampleID, Group, Animal, Tissue, Well,
/// Time, Replicate` followed by the metric columns in table order.
pub fn structured_frame(table: &StructuredTable) -> Result<DataFrame> {
    let rows = &table.rows;
    let name = |column: MetadataColumn| -> PlSmallStr { column.name().into() };

    let mut columns: Vec<Column> = Vec::with_capacity(7 + table.metric_columns.len());
    columns.push(
        Series::new(
            name(MetadataColumn::SampleId),
            rows.iter().map(|r| r.sample_id.clone()).collect::<Vec<_>>(),
        )
        .into(),
    );
    columns.push(
        Series::new(
            name(MetadataColumn::Group),
            rows.iter().map(|r| r.group).collect::<Vec<_>>(),
        )
        .into(),
    );
    columns.push(
        Series::new(
            name(MetadataColumn::Animal),
            rows.iter().map(|r| r.animal).collect::<Vec<_>>(),
        )
        .into(),
    );
    columns.push(
        Series::new(
            name(MetadataColumn::Tissue),
            rows.iter().map(|r| r.tissue.clone()).collect::<Vec<_>>(),
        )
        .into(),
    );
    columns.push(
        Series::new(
            name(MetadataColumn::Well),
            rows.iter().map(|r| r.well.clone()).collect::<Vec<_>>(),
        )
        .into(),
    );
    columns.push(
        Series::new(
            name(MetadataColumn::Time),
            rows.iter().map(|r| r.time_hours).collect::<Vec<_>>(),
        )
        .into(),
    );
    columns.push(
        Series::new(
            name(MetadataColumn::Replicate),
            rows.iter().map(|r| r.replicate).collect::<Vec<_>>(),
        )
        .into(),
    );

    for (idx, metric) in table.metric_columns.iter().enumerate() {
        let values: Vec<Option<f64>> = rows.iter().map(|r| r.value(idx)).collect();
        columns.push(Series::new(metric.as_str().into(), values).into());
    }

    Ok(DataFrame::new(columns)?)
}
