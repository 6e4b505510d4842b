use crate::domain::{Dimension, Transaction};
use crate::pipeline::schema::SalesSchema;
use crate::pipeline::tables::SalesTable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// User selection applied to the sales table. Unset bounds default to the full range;
/// a dimension left out of `dimensions` selects all of its values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub dimensions: BTreeMap<Dimension, BTreeSet<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

impl Filters {
    pub fn date_range(&self, table: &SalesTable) -> Option<DateRange> {
        let (lo, hi) = table.date_bounds()?;
        Some(DateRange {
            start: self.start.unwrap_or(lo),
            end: self.end.unwrap_or(hi),
        })
    }

    pub fn with_dimension<I, S>(mut self, dimension: Dimension, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dimensions
            .insert(dimension, allowed.into_iter().map(Into::into).collect());
        self
    }
}

/// Keeps rows whose order day lies in `[start, end]`. `start > end` keeps nothing.
pub fn filter_by_date<'a>(
    rows: &[&'a Transaction],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<&'a Transaction> {
    let range = DateRange { start, end };
    rows.iter()
        .copied()
        .filter(|t| range.contains(t.order_date.date()))
        .collect()
}

/// Keeps rows whose value is allowed for every filterable dimension the table has.
/// A dimension without an allow-list accepts any non-missing value; an empty allow-list
/// keeps nothing. Dimensions missing from the table are ignored.
pub fn filter_by_dimensions<'a>(
    rows: &[&'a Transaction],
    schema: &SalesSchema,
    selection: &BTreeMap<Dimension, BTreeSet<String>>,
) -> Vec<&'a Transaction> {
    let active: BTreeMap<Dimension, Option<&BTreeSet<String>>> = Dimension::FILTERABLE
        .into_iter()
        .chain(selection.keys().copied())
        .filter(|d| schema.has_dimension(*d))
        .map(|d| (d, selection.get(&d)))
        .collect();

    rows.iter()
        .copied()
        .filter(|t| {
            active.iter().all(|(d, allowed)| {
                t.dimension(*d)
                    .is_some_and(|value| allowed.map_or(true, |set| set.contains(value)))
            })
        })
        .collect()
}

pub fn apply<'a>(table: &'a SalesTable, filters: &Filters) -> Vec<&'a Transaction> {
    let all: Vec<&Transaction> = table.rows.iter().collect();
    let Some(range) = filters.date_range(table) else {
        return Vec::new();
    };
    let dated = filter_by_date(&all, range.start, range.end);
    filter_by_dimensions(&dated, &table.schema, &filters.dimensions)
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterOptions {
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub dimensions: BTreeMap<Dimension, Vec<String>>,
}

/// Full date range plus the sorted distinct values of each filterable dimension the
/// table has, taken from rows inside the requested date range.
pub fn filter_options(table: &SalesTable, filters: &Filters) -> Option<FilterOptions> {
    let (min_date, max_date) = table.date_bounds()?;
    let range = filters.date_range(table)?;
    let all: Vec<&Transaction> = table.rows.iter().collect();
    let dated = filter_by_date(&all, range.start, range.end);

    let mut dimensions = BTreeMap::new();
    for d in Dimension::FILTERABLE {
        if !table.schema.has_dimension(d) {
            continue;
        }
        let values: BTreeSet<&str> = dated.iter().filter_map(|t| t.dimension(d)).collect();
        dimensions.insert(d, values.into_iter().map(str::to_string).collect());
    }

    Some(FilterOptions {
        min_date,
        max_date,
        dimensions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::RawTable;

    fn table() -> SalesTable {
        let csv = "fecha_pedido,canal,categoria,estado_pedido\n\
                   01/03/2025,Web,Deco,Entregado\n\
                   02/03/2025,Instagram,Cocina,Cancelado\n\
                   03/03/2025,Web,Cocina,Entregado\n\
                   05/03/2025,,Deco,En tránsito\n";
        SalesTable::from_raw(&RawTable::from_csv(csv).unwrap()).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn date_filter_is_inclusive() {
        let t = table();
        let all: Vec<&Transaction> = t.rows.iter().collect();
        let out = filter_by_date(&all, day(2), day(3));
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| (day(2)..=day(3)).contains(&r.order_date.date())));
    }

    #[test]
    fn reversed_range_is_empty() {
        let t = table();
        let all: Vec<&Transaction> = t.rows.iter().collect();
        assert!(filter_by_date(&all, day(5), day(1)).is_empty());
    }

    #[test]
    fn dimension_filter_excludes_missing_values() {
        let t = table();
        let filters = Filters::default().with_dimension(Dimension::Channel, ["Web"]);
        let out = apply(&t, &filters);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.channel.as_deref() == Some("Web")));
    }

    #[test]
    fn empty_allow_list_selects_nothing() {
        let t = table();
        let filters = Filters::default().with_dimension(Dimension::Category, Vec::<String>::new());
        assert!(apply(&t, &filters).is_empty());
    }

    #[test]
    fn absent_dimension_is_skipped() {
        let t = table();
        let filters = Filters::default().with_dimension(Dimension::Province, ["Córdoba"]);
        assert_eq!(apply(&t, &filters).len(), 3);
    }

    #[test]
    fn unselected_dimension_still_drops_blank_values() {
        let t = table();
        let out = apply(&t, &Filters::default());
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|r| r.channel.is_some()));
    }

    #[test]
    fn default_filters_match_every_option_selected() {
        let t = table();
        let opts = filter_options(&t, &Filters::default()).unwrap();
        let everything = opts
            .dimensions
            .iter()
            .fold(Filters::default(), |f, (d, values)| {
                f.with_dimension(*d, values.iter().cloned())
            });
        assert_eq!(apply(&t, &Filters::default()), apply(&t, &everything));
    }

    #[test]
    fn dimensions_combine_with_date_range() {
        let t = table();
        let filters = Filters {
            start: Some(day(2)),
            end: Some(day(5)),
            ..Filters::default()
        }
        .with_dimension(Dimension::Category, ["Cocina"])
        .with_dimension(Dimension::Status, ["Entregado"]);
        let out = apply(&t, &filters);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].order_date.date(), day(3));
    }

    #[test]
    fn options_list_present_dimensions_sorted() {
        let t = table();
        let opts = filter_options(&t, &Filters::default()).unwrap();
        assert_eq!(opts.min_date, day(1));
        assert_eq!(opts.max_date, day(5));
        assert_eq!(opts.dimensions[&Dimension::Channel], vec!["Instagram", "Web"]);
        assert!(!opts.dimensions.contains_key(&Dimension::Province));
    }
}
