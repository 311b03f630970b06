//! Column resolution: schema validation, relation rewriting and formula
//! placement.
//!
//! Formulas are placed in five passes. Each pass sees the column order left by
//! the previous one, so the pass order is part of the contract:
//!
//! 1. `first` anchors, at index 0 (index 1 behind a numbering column)
//! 2. `last` anchors with `after = true`, just before the action column or at
//!    the end
//! 3. field anchors with `after = false`, at the target's current index
//! 4. field anchors with `after = true`, right after the target
//! 5. when pass 4 inserted anything, pass-2 columns move to the very end
//!
//! `last` anchors with `after = false` are placed last of all, in front of
//! whatever column is last at that point.

use tabula_core::{
    default_label, Anchor, Diagnose, FormulaSpec, RelationSpec, ACTION_COLUMN, NUMBERING_COLUMN,
};

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_json::json;

/// Display columns after relation rewriting and formula insertion.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedColumns {
    /// Field names in display order.
    pub columns: Vec<String>,

    /// Header label for every entry of `columns`.
    pub labels: IndexMap<String, String>,

    pub relations: RelationMeta,

    /// Names of the formula columns that were inserted.
    pub formulas: Vec<String>,
}

impl ResolvedColumns {
    pub fn position(&self, field: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.position(field).is_some()
    }

    pub fn has_action(&self) -> bool {
        self.contains(ACTION_COLUMN)
    }

    pub fn has_numbering(&self) -> bool {
        self.contains(NUMBERING_COLUMN)
    }

    pub fn is_formula(&self, field: &str) -> bool {
        self.formulas.iter().any(|f| f == field)
    }

    /// The requested field a display column came from: the relation alias for
    /// a rewritten column, otherwise the column itself.
    pub fn source_field<'a>(&'a self, column: &'a str) -> &'a str {
        self.relations
            .relations
            .iter()
            .find(|(_, link)| link.display_field == column)
            .map_or(column, |(alias, _)| alias.as_str())
    }

    /// Columns backed by the data source: everything except the numbering,
    /// action and formula columns.
    pub fn data_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .map(String::as_str)
            .filter(move |c| *c != NUMBERING_COLUMN && *c != ACTION_COLUMN && !self.is_formula(c))
    }
}

impl Diagnose for ResolvedColumns {
    fn diagnostics(&self) -> serde_json::Value {
        json!({
            "columns": self.columns,
            "formulas": self.formulas,
            "relations": self.relations.relations.keys().collect::<Vec<_>>(),
        })
    }
}

/// Relations that were actually used, keyed by alias.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RelationMeta {
    pub relations: IndexMap<String, RelationLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationLink {
    pub display_field: String,
    pub foreign_key: String,
}

/// Resolves requested column names into the final display order.
#[derive(Debug, Default, Clone)]
pub struct ColumnResolver {
    /// Known columns of the table. `None` accepts every requested field.
    schema: Option<IndexSet<String>>,

    /// Caller-supplied labels that win over every derived label.
    labels: IndexMap<String, String>,
}

impl ColumnResolver {
    pub fn new() -> ColumnResolver {
        ColumnResolver::default()
    }

    pub fn schema(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.schema = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn label(mut self, field: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(field.into(), label.into());
        self
    }

    pub fn resolve(
        &self,
        requested: &[String],
        relations: &[RelationSpec],
        formulas: &[FormulaSpec],
    ) -> ResolvedColumns {
        let mut labels = IndexMap::new();
        let mut meta = RelationMeta::default();

        let mut columns = self.rewrite_relations(requested, relations, &mut labels, &mut meta);
        let inserted = place_formulas(&mut columns, formulas);

        for formula in formulas {
            if inserted.contains(&formula.name) {
                labels.insert(formula.name.clone(), formula.label.clone());
            }
        }

        let labels = columns
            .iter()
            .map(|column| {
                let label = self
                    .labels
                    .get(column)
                    .or_else(|| labels.get(column))
                    .cloned()
                    .unwrap_or_else(|| match column.as_str() {
                        NUMBERING_COLUMN => "No".to_string(),
                        ACTION_COLUMN => "Action".to_string(),
                        other => default_label(other),
                    });
                (column.clone(), label)
            })
            .collect();

        ResolvedColumns {
            columns,
            labels,
            relations: meta,
            formulas: inserted,
        }
    }

    fn rewrite_relations(
        &self,
        requested: &[String],
        relations: &[RelationSpec],
        labels: &mut IndexMap<String, String>,
        meta: &mut RelationMeta,
    ) -> Vec<String> {
        let mut columns: Vec<String> = vec![];

        for field in requested {
            // Also covers a foreign key already emitted beside its display
            // column.
            if columns.contains(field) {
                tracing::debug!(field = %field, "ignoring duplicate requested column");
                continue;
            }

            if let Some(relation) = relations.iter().find(|r| &r.alias_field == field) {
                columns.push(relation.display_field.clone());
                labels.insert(
                    relation.display_field.clone(),
                    relation.display_label.clone(),
                );
                meta.relations.insert(
                    relation.alias_field.clone(),
                    RelationLink {
                        display_field: relation.display_field.clone(),
                        foreign_key: relation.foreign_key.clone(),
                    },
                );

                let keep_key = !requested.contains(&relation.foreign_key)
                    && !columns.contains(&relation.foreign_key)
                    && self.knows(&relation.foreign_key);
                if keep_key {
                    columns.push(relation.foreign_key.clone());
                }
                continue;
            }

            let special = field == NUMBERING_COLUMN || field == ACTION_COLUMN;
            if !special && !self.knows(field) {
                tracing::warn!(field = %field, "dropping requested column unknown to the table schema");
                continue;
            }

            columns.push(field.clone());
        }

        for relation in relations {
            if !meta.relations.contains_key(&relation.alias_field) {
                tracing::debug!(alias = %relation.alias_field, "relation not requested; ignoring");
            }
        }

        columns
    }

    fn knows(&self, field: &str) -> bool {
        self.schema
            .as_ref()
            .map_or(true, |schema| schema.contains(field))
    }
}

/// Inserts formula columns into `columns` and returns the names that were
/// inserted, in insertion order.
pub fn place_formulas(columns: &mut Vec<String>, formulas: &[FormulaSpec]) -> Vec<String> {
    let mut accepted: Vec<&FormulaSpec> = vec![];
    for formula in formulas {
        let duplicate = columns.contains(&formula.name)
            || accepted.iter().any(|f| f.name == formula.name);
        if duplicate {
            tracing::warn!(formula = %formula.name, "formula name collides with an existing column; skipping");
            continue;
        }
        accepted.push(formula);
    }

    let mut inserted = vec![];

    // 1. `first`
    let base = usize::from(columns.first().is_some_and(|c| c == NUMBERING_COLUMN));
    for (offset, formula) in accepted
        .iter()
        .filter(|f| f.placement.anchor == Anchor::First)
        .enumerate()
    {
        columns.insert(base + offset, formula.name.clone());
        inserted.push(formula.name.clone());
    }

    // 2. `last`, after
    let mut trailing = vec![];
    let action = columns.iter().position(|c| c == ACTION_COLUMN);
    for formula in accepted
        .iter()
        .filter(|f| f.placement.anchor == Anchor::Last && f.placement.after)
    {
        match action {
            Some(index) => columns.insert(index + trailing.len(), formula.name.clone()),
            None => columns.push(formula.name.clone()),
        }
        trailing.push(formula.name.clone());
        inserted.push(formula.name.clone());
    }

    // 3. field anchor, before
    for formula in accepted.iter().filter(|f| !f.placement.after) {
        let Anchor::Field(target) = &formula.placement.anchor else {
            continue;
        };
        let Some(mut index) = columns.iter().position(|c| c == target) else {
            warn_unanchored(formula, target);
            continue;
        };
        if target == ACTION_COLUMN && !trailing.is_empty() {
            index = index.saturating_sub(trailing.len());
        }
        columns.insert(index, formula.name.clone());
        inserted.push(formula.name.clone());
    }

    // 4. field anchor, after
    let mut anchored_after = 0;
    for formula in accepted.iter().filter(|f| f.placement.after) {
        let Anchor::Field(target) = &formula.placement.anchor else {
            continue;
        };
        let Some(index) = columns.iter().position(|c| c == target) else {
            warn_unanchored(formula, target);
            continue;
        };
        columns.insert(index + 1, formula.name.clone());
        inserted.push(formula.name.clone());
        anchored_after += 1;
    }

    // 5. reconcile
    if anchored_after > 0 && !trailing.is_empty() {
        columns.retain(|c| !trailing.contains(c));
        columns.extend(trailing.iter().cloned());
    }

    // `last`, before
    for formula in accepted
        .iter()
        .filter(|f| f.placement.anchor == Anchor::Last && !f.placement.after)
    {
        let index = columns.len().saturating_sub(1);
        columns.insert(index, formula.name.clone());
        inserted.push(formula.name.clone());
    }

    inserted
}

fn warn_unanchored(formula: &FormulaSpec, target: &str) {
    tracing::warn!(
        formula = %formula.name,
        anchor = %target,
        "formula anchor not found among resolved columns; skipping"
    );
}
