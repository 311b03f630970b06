//! The modular compiler: adapter output flows through the column resolver,
//! action resolver, row formatter and response builder in turn.

use crate::action::{base_path, ActionResolver, ActionSet};
use crate::column::{ColumnResolver, ResolvedColumns};
use crate::format::image::{self, DiskProbe, FileProbe};
use crate::format::RowFormatter;
use crate::response::ResponseBuilder;

use tabula_core::{
    async_trait, CompilationContext, CompiledTable, DataSource, Error, Join, RelationSpec,
    Result, Search, SortOrder, TableDescriptor, TableQuery, ACTION_COLUMN, NUMBERING_COLUMN,
};

use indexmap::IndexSet;
use std::fmt::Debug;
use std::sync::Arc;

/// Key column of a related table matched by a relation's foreign key.
pub const RELATED_KEY: &str = "id";

/// Turns a compilation context into a compiled table.
#[async_trait]
pub trait Compiler: Debug + Send + Sync {
    /// Short name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    async fn compile(
        &self,
        ctx: &CompilationContext,
        source: &dyn DataSource,
    ) -> Result<CompiledTable>;
}

/// The modular compiler.
#[derive(Debug, Clone)]
pub struct Pipeline {
    probe: Arc<dyn FileProbe>,
}

/// What the pipeline knows about a table before querying it.
#[derive(Debug)]
struct Plan {
    table: String,
    schema: Vec<String>,
    resolved: ResolvedColumns,
    actions: ActionSet,
}

impl Pipeline {
    pub fn new(probe: Arc<dyn FileProbe>) -> Pipeline {
        Pipeline { probe }
    }

    async fn plan(&self, ctx: &CompilationContext, source: &dyn DataSource) -> Result<Plan> {
        let descriptor = &ctx.descriptor;
        let table = ctx
            .table_name
            .clone()
            .ok_or_else(|| Error::table_not_found(""))?;
        let schema = source
            .columns(&table)
            .await?
            .ok_or_else(|| Error::table_not_found(&table))?;

        let relations = merge_relations(descriptor, source.relations(&table).await?);

        let actions = ActionSet {
            buttons: ActionResolver::new(ctx.privileges.clone()).resolve_config(&descriptor.actions),
            base_path: base_path::resolve(&ctx.route).unwrap_or_default(),
            row_identifier: descriptor.row_identifier.clone(),
            soft_delete_field: descriptor.soft_delete_field.clone(),
        };

        let mut requested = descriptor.requested_fields();
        if requested.is_empty() {
            requested = schema.clone();
        }
        if descriptor.numbering && !requested.iter().any(|f| f == NUMBERING_COLUMN) {
            requested.insert(0, NUMBERING_COLUMN.to_string());
        }
        let has_action = requested.iter().any(|f| f == ACTION_COLUMN);
        if actions.is_empty() {
            requested.retain(|f| f != ACTION_COLUMN);
        } else if !has_action {
            requested.push(ACTION_COLUMN.to_string());
        }

        let resolver = descriptor
            .columns
            .iter()
            .filter_map(|spec| spec.label.as_ref().map(|label| (&spec.field, label)))
            .fold(ColumnResolver::new().schema(schema.clone()), |resolver, (field, label)| {
                resolver.label(field.clone(), label.clone())
            });
        let resolved = resolver.resolve(&requested, &relations, &descriptor.formulas);

        Ok(Plan {
            table,
            schema,
            resolved,
            actions,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline::new(Arc::new(DiskProbe::new("public")))
    }
}

#[async_trait]
impl Compiler for Pipeline {
    fn name(&self) -> &'static str {
        "pipeline"
    }

    async fn compile(
        &self,
        ctx: &CompilationContext,
        source: &dyn DataSource,
    ) -> Result<CompiledTable> {
        let plan = self.plan(ctx, source).await?;
        let descriptor = &ctx.descriptor;

        let query = build_query(ctx, &plan.table, &plan.schema, &plan.resolved);
        let result = source.query(&query).await?;

        let formatter = RowFormatter::new(descriptor, self.probe.as_ref());
        let rows = result
            .rows
            .iter()
            .map(|row| {
                formatter.format(
                    row,
                    &plan.resolved,
                    &descriptor.formulas,
                    &descriptor.format_rules,
                )
            })
            .collect();

        let builder = ResponseBuilder::new(descriptor, &plan.actions);
        let response = builder.build(
            &ctx.paging,
            &plan.resolved,
            rows,
            result.total,
            result.filtered,
        );

        Ok(CompiledTable {
            response,
            meta: builder.meta(&plan.table, &plan.resolved),
        })
    }
}

/// Descriptor relations, then introspected relations for aliases the
/// descriptor does not declare. Relations without a `table.column` display
/// field are dropped.
fn merge_relations(descriptor: &TableDescriptor, discovered: Vec<RelationSpec>) -> Vec<RelationSpec> {
    let mut relations: Vec<RelationSpec> = vec![];
    for relation in descriptor.relations.iter().cloned().chain(discovered) {
        if relation.target_table().is_none() {
            let err = Error::invalid_descriptor(format!(
                "relation `{}` has no table in display field `{}`",
                relation.alias_field, relation.display_field
            ));
            tracing::warn!(error = %err, "skipping relation");
            continue;
        }
        if !relations.iter().any(|r| r.alias_field == relation.alias_field) {
            relations.push(relation);
        }
    }
    relations
}

/// Describes the page of rows needed to render `resolved`.
pub fn build_query(
    ctx: &CompilationContext,
    table: &str,
    schema: &[String],
    resolved: &ResolvedColumns,
) -> TableQuery {
    let descriptor = &ctx.descriptor;
    let in_schema = |field: &str| schema.iter().any(|c| c == field);
    let spec = |column: &str| descriptor.column_spec(resolved.source_field(column));

    let mut select: IndexSet<String> = resolved.data_columns().map(str::to_string).collect();

    for formula in &descriptor.formulas {
        if !resolved.is_formula(&formula.name) {
            continue;
        }
        for field in &formula.source_fields {
            if in_schema(field) || resolved.contains(field) {
                select.insert(field.clone());
            }
        }
    }

    for column in resolved.data_columns() {
        let sibling = image::sibling_field(column);
        if in_schema(&sibling) {
            select.insert(sibling);
        }
    }

    for field in [&descriptor.row_identifier, &descriptor.soft_delete_field] {
        if in_schema(field) {
            select.insert(field.clone());
        }
    }

    let mut joins: Vec<Join> = vec![];
    for link in resolved.relations.relations.values() {
        let Some((related, _)) = link.display_field.split_once('.') else {
            continue;
        };
        let join = Join {
            table: related.to_string(),
            foreign_key: link.foreign_key.clone(),
            target_key: RELATED_KEY.to_string(),
        };
        if !joins.contains(&join) {
            joins.push(join);
        }
    }

    let search = ctx
        .paging
        .search_term
        .as_ref()
        .filter(|term| !term.trim().is_empty())
        .map(|term| Search {
            term: term.trim().to_string(),
            columns: resolved
                .data_columns()
                .filter(|column| spec(column).map_or(true, |s| s.searchable))
                .map(str::to_string)
                .collect(),
        });

    let order = ctx
        .paging
        .order_column_index
        .and_then(|index| resolved.columns.get(index))
        .filter(|column| resolved.data_columns().any(|c| c == column.as_str()))
        .filter(|column| spec(column).map_or(true, |s| s.sortable))
        .map(|column| SortOrder {
            column: column.clone(),
            direction: ctx.paging.order_direction,
        });

    TableQuery {
        table: table.to_string(),
        select: select.into_iter().collect(),
        joins,
        search,
        filters: ctx.effective_filters(),
        order,
        offset: ctx.paging.start,
        limit: ctx.paging.limit(),
    }
}
