//! The monolithic compiler.
//!
//! Everything happens in one pass over a single builder: columns, labels,
//! query, cells and buttons. It shares only leaf helpers (escaping, formula
//! evaluation, format rules, image probing, formula placement) with the
//! modular [`Pipeline`](crate::Pipeline), so the two can be diffed against
//! each other by the parity harness.

use crate::action::{base_path, normalize_verb, Button};
use crate::column::place_formulas;
use crate::format::image::{self, DiskProbe, FileProbe};
use crate::format::{self, rule};
use crate::html;
use crate::pipeline::{Compiler, RELATED_KEY};

use tabula_core::{
    async_trait, default_label, CompilationContext, CompiledTable, CustomButtons, DataSource,
    Error, Join, PagingResponse, ResponseMeta, Result, Row, RowView, Search, SortOrder,
    TableQuery, Verb, ACTION_COLUMN, NUMBERING_COLUMN,
};

use indexmap::IndexMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct LegacyCompiler {
    probe: Arc<dyn FileProbe>,
}

impl LegacyCompiler {
    pub fn new(probe: Arc<dyn FileProbe>) -> LegacyCompiler {
        LegacyCompiler { probe }
    }
}

impl Default for LegacyCompiler {
    fn default() -> Self {
        LegacyCompiler::new(Arc::new(DiskProbe::new("public")))
    }
}

#[async_trait]
impl Compiler for LegacyCompiler {
    fn name(&self) -> &'static str {
        "legacy"
    }

    async fn compile(
        &self,
        ctx: &CompilationContext,
        source: &dyn DataSource,
    ) -> Result<CompiledTable> {
        let d = &ctx.descriptor;
        let Some(table) = ctx.table_name.as_deref() else {
            return Err(Error::table_not_found(""));
        };
        let Some(schema) = source.columns(table).await? else {
            return Err(Error::table_not_found(table));
        };

        let mut relations: Vec<tabula_core::RelationSpec> = vec![];
        for r in d.relations.iter().cloned().chain(source.relations(table).await?) {
            if !r.display_field.contains('.') {
                tracing::warn!(alias = %r.alias_field, "legacy: relation without table skipped");
            } else if !relations.iter().any(|known| known.alias_field == r.alias_field) {
                relations.push(r);
            }
        }

        // Buttons.
        let mut verbs: Vec<Verb> = Verb::ALL
            .into_iter()
            .filter(|v| d.actions.enabled_verbs.contains(v))
            .filter(|v| {
                !d.actions
                    .removed_verbs
                    .iter()
                    .any(|name| normalize_verb(name) == Some(*v))
            })
            .collect();
        let mut styles: IndexMap<Verb, Button> = IndexMap::new();
        let mut extra: Vec<Button> = vec![];
        let custom: Vec<Button> = match &d.actions.custom_buttons {
            CustomButtons::None => vec![],
            CustomButtons::Defaults => Verb::ALL.into_iter().map(Button::for_verb).collect(),
            CustomButtons::List(specs) => specs.iter().filter_map(|s| Button::parse(s)).collect(),
        };
        for button in custom {
            match button.verb {
                Some(verb) => {
                    if !verbs.contains(&verb) {
                        verbs.push(verb);
                    }
                    styles.insert(verb, button);
                }
                None if extra.iter().any(|b| b.name == button.name) => {}
                None => extra.push(button),
            }
        }
        verbs.sort();
        verbs.retain(|v| ctx.privileges.allows(*v));
        let mut buttons: Vec<Button> = verbs
            .iter()
            .map(|verb| {
                let mut button = Button::for_verb(*verb);
                if let Some(style) = styles.get(verb) {
                    button.color = style.color.clone();
                    button.icon = style.icon.clone();
                }
                button
            })
            .collect();
        buttons.extend(extra);
        buttons.retain(|b| b.verb != Some(Verb::Insert));
        let base = base_path::resolve(&ctx.route).unwrap_or_default();

        // Columns.
        let mut fields: Vec<String> = if d.columns.is_empty() {
            schema.clone()
        } else {
            d.columns.iter().map(|c| c.field.clone()).collect()
        };
        if d.numbering && !fields.iter().any(|f| f == NUMBERING_COLUMN) {
            fields.insert(0, NUMBERING_COLUMN.to_string());
        }
        if buttons.is_empty() {
            fields.retain(|f| f != ACTION_COLUMN);
        } else if !fields.iter().any(|f| f == ACTION_COLUMN) {
            fields.push(ACTION_COLUMN.to_string());
        }

        let mut columns: Vec<String> = vec![];
        let mut relation_labels: IndexMap<String, String> = IndexMap::new();
        // display field => (alias, foreign key)
        let mut joined: IndexMap<String, (String, String)> = IndexMap::new();
        for field in &fields {
            if columns.contains(field) {
                continue;
            }
            if let Some(r) = relations.iter().find(|r| &r.alias_field == field) {
                columns.push(r.display_field.clone());
                relation_labels.insert(r.display_field.clone(), r.display_label.clone());
                joined.insert(
                    r.display_field.clone(),
                    (r.alias_field.clone(), r.foreign_key.clone()),
                );
                if !fields.contains(&r.foreign_key)
                    && !columns.contains(&r.foreign_key)
                    && schema.contains(&r.foreign_key)
                {
                    columns.push(r.foreign_key.clone());
                }
            } else if field == NUMBERING_COLUMN || field == ACTION_COLUMN || schema.contains(field) {
                columns.push(field.clone());
            } else {
                tracing::warn!(field = %field, "legacy: unknown column dropped");
            }
        }
        let formula_names = place_formulas(&mut columns, &d.formulas);

        let source_of = |column: &str| -> String {
            joined
                .get(column)
                .map(|(alias, _)| alias.clone())
                .unwrap_or_else(|| column.to_string())
        };
        let spec_of = |column: &str| d.column_spec(&source_of(column)).cloned();
        let is_data = |column: &str| {
            column != NUMBERING_COLUMN
                && column != ACTION_COLUMN
                && !formula_names.iter().any(|f| f == column)
        };

        let mut labels: IndexMap<String, String> = IndexMap::new();
        for column in &columns {
            let label = if let Some(label) = d.column_spec(column).and_then(|c| c.label.clone()) {
                label
            } else if let Some(label) = relation_labels.get(column) {
                label.clone()
            } else if let Some(f) = d
                .formulas
                .iter()
                .find(|f| &f.name == column && formula_names.contains(column))
            {
                f.label.clone()
            } else if column == NUMBERING_COLUMN {
                "No".to_string()
            } else if column == ACTION_COLUMN {
                "Action".to_string()
            } else {
                default_label(column)
            };
            labels.insert(column.clone(), label);
        }

        // Query.
        let mut q = TableQuery::new(table);
        for column in columns.iter().filter(|c| is_data(c)) {
            if !q.select.contains(column) {
                q.select.push(column.clone());
            }
        }
        for f in d.formulas.iter().filter(|f| formula_names.contains(&f.name)) {
            for src in &f.source_fields {
                if (schema.contains(src) || columns.contains(src)) && !q.select.contains(src) {
                    q.select.push(src.clone());
                }
            }
        }
        let extras: Vec<String> = columns
            .iter()
            .filter(|c| is_data(c))
            .map(|c| image::sibling_field(c))
            .chain([d.row_identifier.clone(), d.soft_delete_field.clone()])
            .collect();
        for field in extras {
            if schema.contains(&field) && !q.select.contains(&field) {
                q.select.push(field);
            }
        }
        for (display, (_, fk)) in &joined {
            if let Some((related, _)) = display.split_once('.') {
                let join = Join {
                    table: related.to_string(),
                    foreign_key: fk.clone(),
                    target_key: RELATED_KEY.to_string(),
                };
                if !q.joins.contains(&join) {
                    q.joins.push(join);
                }
            }
        }
        if let Some(term) = ctx.paging.search_term.as_deref().map(str::trim) {
            if !term.is_empty() {
                q.search = Some(Search {
                    term: term.to_string(),
                    columns: columns
                        .iter()
                        .filter(|c| is_data(c))
                        .filter(|c| spec_of(c).map_or(true, |s| s.searchable))
                        .cloned()
                        .collect(),
                });
            }
        }
        if let Some(column) = ctx.paging.order_column_index.and_then(|i| columns.get(i)) {
            if is_data(column) && spec_of(column).map_or(true, |s| s.sortable) {
                q.order = Some(SortOrder {
                    column: column.clone(),
                    direction: ctx.paging.order_direction,
                });
            }
        }
        q.filters = ctx.effective_filters();
        q.offset = ctx.paging.start;
        q.limit = ctx.paging.limit();

        let result = source.query(&q).await?;

        // Rows.
        let clickable = d.clickable_columns.iter().any(|c| columns.contains(c));
        let mut data = vec![];
        for (i, row) in result.rows.iter().enumerate() {
            let mut view = RowView::default();
            for column in &columns {
                let cell = if column == ACTION_COLUMN {
                    view.action = Some(self.buttons_html(&buttons, &base, row, d));
                    continue;
                } else if column == NUMBERING_COLUMN {
                    (ctx.paging.start + i as u64 + 1).to_string()
                } else if !is_data(column) {
                    d.formulas
                        .iter()
                        .find(|f| &f.name == column)
                        .and_then(|f| format::evaluate(f, row).ok())
                        .map(|v| html::escape(&v))
                        .unwrap_or_default()
                } else {
                    self.cell(column, row, spec_of(column).as_ref(), d)
                };
                view.cells.insert(column.clone(), cell);
            }

            let mut classes: Vec<&str> = vec![];
            if !row.value(&d.soft_delete_field).is_null() {
                classes.push(format::DELETED_ROW_CLASS);
            }
            if clickable {
                classes.push(crate::response::CLICKABLE_ROW_CLASS);
                let id = row.value(&d.row_identifier);
                if !id.is_empty() {
                    view.attributes
                        .data
                        .insert("data-url".into(), format!("{base}/{}/view", id.render()));
                }
            }
            if !classes.is_empty() {
                view.attributes.class = Some(classes.join(" "));
            }
            data.push(view);
        }

        let names = |pred: fn(&tabula_core::ColumnSpec) -> bool| -> Vec<String> {
            d.columns.iter().filter(|c| pred(c)).map(|c| c.field.clone()).collect()
        };

        Ok(CompiledTable {
            response: PagingResponse {
                draw: ctx.paging.draw_counter,
                records_total: result.total,
                records_filtered: result.filtered,
                data,
            },
            meta: ResponseMeta {
                table: table.to_string(),
                columns,
                labels,
                hidden: names(|c| c.hidden),
                raw_html: names(|c| c.raw_html),
                sortable: names(|c| c.sortable),
                searchable: names(|c| c.searchable),
                clickable: d.clickable_columns.clone(),
                merged: d.merged_columns.clone(),
                fixed_columns: d.fixed_columns,
            },
        })
    }
}

impl LegacyCompiler {
    fn cell(
        &self,
        column: &str,
        row: &Row,
        spec: Option<&tabula_core::ColumnSpec>,
        d: &tabula_core::TableDescriptor,
    ) -> String {
        let value = row.value(column);
        let raw = value.render();
        if value.is_empty() {
            return html::escape(&raw);
        }
        if spec.is_some_and(|s| s.image_hint) || image::is_image(&raw) {
            return image::resolve(column, row, self.probe.as_ref()).render();
        }
        let text = match d.format_rules.iter().find(|r| r.field == column) {
            Some(r) => rule::apply(&r.kind, value).unwrap_or_default(),
            None => raw,
        };
        if spec.is_some_and(|s| s.raw_html) {
            text
        } else {
            html::escape(&text)
        }
    }

    fn buttons_html(
        &self,
        buttons: &[Button],
        base: &str,
        row: &Row,
        d: &tabula_core::TableDescriptor,
    ) -> String {
        let id = row.value(&d.row_identifier);
        if id.is_empty() {
            return String::new();
        }
        let id: String = url::form_urlencoded::byte_serialize(id.render().as_bytes()).collect();
        let trashed = !row.value(&d.soft_delete_field).is_null();

        let mut html = String::from(r#"<div class="action-buttons">"#);
        for b in buttons {
            let (name, color, icon) = if trashed && b.verb == Some(Verb::Delete) {
                ("restore", "warning", "recycle")
            } else {
                (b.name.as_str(), b.color.as_str(), b.icon.as_str())
            };
            html.push_str(&format!(
                r#"<a href="{}" class="btn btn-{} btn-xs btn-{}" title="{}"><i class="fa fa-{}"></i></a>"#,
                html::escape(&format!("{base}/{id}/{name}")),
                html::escape(color),
                html::escape(name),
                html::escape(&default_label(name)),
                html::escape(icon),
            ));
        }
        html.push_str("</div>");
        html
    }
}
