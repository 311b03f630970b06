pub mod expr;
pub mod image;
pub mod rule;

use crate::column::ResolvedColumns;
use crate::html;
use expr::Expr;
use image::FileProbe;

use tabula_core::{
    FormatRule, FormulaSpec, Row, RowAttributes, RowView, TableDescriptor, ACTION_COLUMN,
    NUMBERING_COLUMN,
};

/// CSS class given to rows carrying a soft-delete marker.
pub const DELETED_ROW_CLASS: &str = "row-deleted";

/// A source row paired with its rendered view.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedRow {
    pub source: Row,
    pub view: RowView,
}

/// Renders the cells of one row.
///
/// Nothing here fails: formula and format-rule failures render an empty
/// cell, and a missing image renders a placeholder.
#[derive(Debug)]
pub struct RowFormatter<'a> {
    descriptor: &'a TableDescriptor,
    probe: &'a dyn FileProbe,
}

impl<'a> RowFormatter<'a> {
    pub fn new(descriptor: &'a TableDescriptor, probe: &'a dyn FileProbe) -> RowFormatter<'a> {
        RowFormatter { descriptor, probe }
    }

    /// Renders `row` in the order of `resolved`.
    ///
    /// The numbering cell is left empty (it depends on the page offset) and
    /// the action cell is not produced here.
    pub fn format(
        &self,
        row: &Row,
        resolved: &ResolvedColumns,
        formulas: &[FormulaSpec],
        rules: &[FormatRule],
    ) -> FormattedRow {
        let mut view = RowView::default();

        for column in &resolved.columns {
            let cell = match column.as_str() {
                ACTION_COLUMN => continue,
                NUMBERING_COLUMN => String::new(),
                _ if resolved.is_formula(column) => self.formula_cell(column, row, formulas),
                _ => self.data_cell(column, row, resolved, rules),
            };
            view.cells.insert(column.clone(), cell);
        }

        if !row.value(&self.descriptor.soft_delete_field).is_null() {
            view.attributes = RowAttributes {
                class: Some(DELETED_ROW_CLASS.to_string()),
                ..RowAttributes::default()
            };
        }

        FormattedRow {
            source: row.clone(),
            view,
        }
    }

    fn formula_cell(&self, name: &str, row: &Row, formulas: &[FormulaSpec]) -> String {
        let Some(formula) = formulas.iter().find(|f| f.name == name) else {
            return String::new();
        };
        match evaluate(formula, row) {
            Ok(value) => html::escape(&value),
            Err(err) => {
                tracing::debug!(formula = %name, error = %err, "formula evaluation failed; rendering empty cell");
                String::new()
            }
        }
    }

    fn data_cell(
        &self,
        column: &str,
        row: &Row,
        resolved: &ResolvedColumns,
        rules: &[FormatRule],
    ) -> String {
        let value = row.value(column);
        let spec = self.descriptor.column_spec(resolved.source_field(column));
        let raw = value.render();

        let image_hint = spec.is_some_and(|spec| spec.image_hint);
        if !value.is_empty() && (image_hint || image::is_image(&raw)) {
            return image::resolve(column, row, self.probe).render();
        }

        let text = match rules.iter().find(|rule| rule.field == column) {
            Some(rule) if !value.is_empty() => match rule::apply(&rule.kind, value) {
                Ok(text) => text,
                Err(err) => {
                    tracing::debug!(field = %column, error = %err, "format rule failed; rendering empty cell");
                    String::new()
                }
            },
            _ => raw,
        };

        if spec.is_some_and(|spec| spec.raw_html) {
            text
        } else {
            html::escape(&text)
        }
    }
}

/// Evaluates one formula against a row, returning the rendered value.
pub fn evaluate(formula: &FormulaSpec, row: &Row) -> tabula_core::Result<String> {
    let expr = Expr::parse(&formula.expression, &formula.source_fields)?;
    Ok(expr.eval(row, &formula.source_fields)?.render())
}
