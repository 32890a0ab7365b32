use crate::error::{ArtifactError, ArtifactKind, Result};
use crate::schema::{
    CATALOG_DESCRIPTION_COLUMN, CATALOG_NAME_COLUMN, CATALOG_SIDE_EFFECTS_COLUMN,
    CATALOG_USES_COLUMN, MISSING_CELL,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugRecord {
    pub name: String,
    pub description: String,
    pub side_effects: String,
    pub usage_notes: String,
}

impl DrugRecord {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        side_effects: impl Into<String>,
        usage_notes: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            side_effects: side_effects.into(),
            usage_notes: usage_notes.into(),
        }
    }
}

/// Ordered drug records; row `i` pairs with row/column `i` of the similarity matrix.
#[derive(Debug, Clone, Default)]
pub struct DrugCatalog {
    records: Vec<DrugRecord>,
    by_name: HashMap<String, usize>,
}

impl DrugCatalog {
    pub fn new(records: Vec<DrugRecord>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            if record.name.is_empty() {
                return Err(ArtifactError::invalid(
                    ArtifactKind::Catalog,
                    format!("row {idx} has an empty drug name"),
                ));
            }
            if let Some(first) = by_name.insert(record.name.clone(), idx) {
                return Err(ArtifactError::invalid(
                    ArtifactKind::Catalog,
                    format!(
                        "duplicate drug name '{}' at rows {first} and {idx}",
                        record.name
                    ),
                ));
            }
        }
        Ok(Self { records, by_name })
    }

    /// Accepts a JSON array of row objects or a column-oriented object
    /// (`{"Drug Name": {"0": ..}}` or `{"Drug Name": [..]}`).
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|err| ArtifactError::parse(ArtifactKind::Catalog, err))?;
        let table = match value {
            Value::Array(rows) => Table::from_rows(rows)?,
            Value::Object(columns) => Table::from_columns(columns)?,
            _ => {
                return Err(ArtifactError::invalid(
                    ArtifactKind::Catalog,
                    "expected a JSON array of rows or an object of columns",
                ))
            }
        };
        Self::new(table.into_records()?)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&DrugRecord> {
        self.records.get(idx)
    }

    /// Exact, case-sensitive name lookup.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.name.as_str())
    }
}

/// Column name (whitespace-trimmed) to cells, one per row.
struct Table {
    columns: HashMap<String, Vec<Value>>,
    rows: usize,
}

impl Table {
    fn from_rows(rows: Vec<Value>) -> Result<Self> {
        let count = rows.len();
        let mut columns: HashMap<String, Vec<Value>> = HashMap::new();
        for (idx, row) in rows.into_iter().enumerate() {
            let Value::Object(fields) = row else {
                return Err(ArtifactError::invalid(
                    ArtifactKind::Catalog,
                    format!("row {idx} is not an object"),
                ));
            };
            for (key, cell) in fields {
                let column = columns
                    .entry(key.trim().to_string())
                    .or_insert_with(|| vec![Value::Null; count]);
                column[idx] = cell;
            }
        }
        Ok(Self {
            columns,
            rows: count,
        })
    }

    fn from_columns(raw: Map<String, Value>) -> Result<Self> {
        let mut columns = HashMap::with_capacity(raw.len());
        let mut rows = None;
        for (key, column) in raw {
            let name = key.trim().to_string();
            let cells = match column {
                Value::Array(cells) => cells,
                Value::Object(indexed) => indexed_cells(&name, indexed)?,
                _ => {
                    return Err(ArtifactError::invalid(
                        ArtifactKind::Catalog,
                        format!("column '{name}' is neither an array nor an index map"),
                    ))
                }
            };
            match rows {
                None => rows = Some(cells.len()),
                Some(expected) if expected != cells.len() => {
                    return Err(ArtifactError::invalid(
                        ArtifactKind::Catalog,
                        format!(
                            "column '{name}' has {} rows, expected {expected}",
                            cells.len()
                        ),
                    ))
                }
                Some(_) => {}
            }
            columns.insert(name, cells);
        }
        Ok(Self {
            columns,
            rows: rows.unwrap_or(0),
        })
    }

    fn into_records(mut self) -> Result<Vec<DrugRecord>> {
        let names = self.columns.remove(CATALOG_NAME_COLUMN).ok_or_else(|| {
            ArtifactError::invalid(
                ArtifactKind::Catalog,
                format!("missing required column '{CATALOG_NAME_COLUMN}'"),
            )
        })?;
        // Optional columns are resolved once here; an absent column yields N/A for every row.
        let mut descriptions = self.columns.remove(CATALOG_DESCRIPTION_COLUMN);
        let mut side_effects = self.columns.remove(CATALOG_SIDE_EFFECTS_COLUMN);
        let mut uses = self.columns.remove(CATALOG_USES_COLUMN);
        for (label, column) in [
            (CATALOG_DESCRIPTION_COLUMN, &descriptions),
            (CATALOG_SIDE_EFFECTS_COLUMN, &side_effects),
            (CATALOG_USES_COLUMN, &uses),
        ] {
            if column.is_none() {
                log::warn!("Catalog has no '{label}' column; using '{MISSING_CELL}'");
            }
        }

        let mut records = Vec::with_capacity(self.rows);
        for (idx, cell) in names.into_iter().enumerate() {
            let name = cell_text(cell).ok_or_else(|| {
                ArtifactError::invalid(
                    ArtifactKind::Catalog,
                    format!("row {idx} has no usable '{CATALOG_NAME_COLUMN}'"),
                )
            })?;
            records.push(DrugRecord {
                name,
                description: take_optional(&mut descriptions, idx),
                side_effects: take_optional(&mut side_effects, idx),
                usage_notes: take_optional(&mut uses, idx),
            });
        }
        Ok(records)
    }
}

fn take_optional(column: &mut Option<Vec<Value>>, idx: usize) -> String {
    column
        .as_mut()
        .and_then(|cells| cells.get_mut(idx))
        .map(Value::take)
        .and_then(cell_text)
        .unwrap_or_else(|| MISSING_CELL.to_string())
}

fn indexed_cells(column: &str, indexed: Map<String, Value>) -> Result<Vec<Value>> {
    let mut cells: Vec<(usize, Value)> = Vec::with_capacity(indexed.len());
    for (key, cell) in indexed {
        let idx = key.trim().parse::<usize>().map_err(|_| {
            ArtifactError::invalid(
                ArtifactKind::Catalog,
                format!("column '{column}' has non-integer row key '{key}'"),
            )
        })?;
        cells.push((idx, cell));
    }
    cells.sort_by_key(|(idx, _)| *idx);
    for (expected, (idx, _)) in cells.iter().enumerate() {
        if *idx != expected {
            return Err(ArtifactError::invalid(
                ArtifactKind::Catalog,
                format!("column '{column}' row keys are not contiguous from 0 (missing {expected})"),
            ));
        }
    }
    Ok(cells.into_iter().map(|(_, cell)| cell).collect())
}

fn cell_text(cell: Value) -> Option<String> {
    match cell {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_row_oriented_catalog() {
        let raw = json!([
            { "Drug Name": "Metformin", "Description": "Biguanide", "Side Effects": "Nausea", "Uses": "With meals" },
            { "Drug Name": "Glipizide", "Description": "Sulfonylurea", "Side Effects": "Hypoglycemia", "Uses": "Before breakfast" },
        ]);
        let catalog = DrugCatalog::from_slice(raw.to_string().as_bytes()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.position("Glipizide"), Some(1));
        assert_eq!(
            catalog.get(0).unwrap(),
            &DrugRecord::new("Metformin", "Biguanide", "Nausea", "With meals")
        );
    }

    #[test]
    fn parses_column_oriented_catalog_with_padded_headers() {
        let raw = json!({
            "Drug Name": { "1": "Glipizide", "0": "Metformin" },
            "  Description ": { "0": "Biguanide", "1": "Sulfonylurea" },
            "Uses": { "0": "With meals", "1": null },
        });
        let catalog = DrugCatalog::from_slice(raw.to_string().as_bytes()).unwrap();
        let names: Vec<_> = catalog.names().collect();
        assert_eq!(names, vec!["Metformin", "Glipizide"]);

        let glipizide = catalog.get(1).unwrap();
        assert_eq!(glipizide.description, "Sulfonylurea");
        assert_eq!(glipizide.side_effects, MISSING_CELL);
        assert_eq!(glipizide.usage_notes, MISSING_CELL);
    }

    #[test]
    fn parses_list_columns() {
        let raw = json!({
            "Drug Name": ["A", "B", "C"],
            "Side Effects": ["x", "y", "z"],
        });
        let catalog = DrugCatalog::from_slice(raw.to_string().as_bytes()).unwrap();
        assert_eq!(catalog.get(2).unwrap().side_effects, "z");
        assert_eq!(catalog.get(2).unwrap().description, MISSING_CELL);
    }

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        let catalog = DrugCatalog::new(vec![DrugRecord::new("Paracetamol", "", "", "")]).unwrap();
        assert_eq!(catalog.position("Paracetamol"), Some(0));
        assert_eq!(catalog.position("paracetamol"), None);
        assert_eq!(catalog.position("Paracetamol "), None);
    }

    #[test]
    fn rejects_duplicates_missing_names_and_ragged_columns() {
        let dup = json!([{ "Drug Name": "A" }, { "Drug Name": "A" }]);
        let err = DrugCatalog::from_slice(dup.to_string().as_bytes()).unwrap_err();
        assert!(err.to_string().contains("duplicate"), "{err}");

        let no_name = json!([{ "Description": "orphan" }]);
        assert!(DrugCatalog::from_slice(no_name.to_string().as_bytes()).is_err());

        let ragged = json!({ "Drug Name": ["A", "B"], "Uses": ["x"] });
        assert!(DrugCatalog::from_slice(ragged.to_string().as_bytes()).is_err());

        let gap = json!({ "Drug Name": { "0": "A", "2": "B" } });
        assert!(DrugCatalog::from_slice(gap.to_string().as_bytes()).is_err());
    }
}
