use crate::action::ActionSet;
use crate::column::ResolvedColumns;
use crate::format::FormattedRow;

use tabula_core::{
    PagingRequest, PagingResponse, ResponseMeta, Row, RowAttributes, TableDescriptor,
    NUMBERING_COLUMN,
};

/// CSS class marking a row the grid widget opens on click.
pub const CLICKABLE_ROW_CLASS: &str = "clickable-row";

/// Assembles the paginated payload and its metadata envelope.
#[derive(Debug)]
pub struct ResponseBuilder<'a> {
    descriptor: &'a TableDescriptor,
    actions: &'a ActionSet,
}

impl<'a> ResponseBuilder<'a> {
    pub fn new(descriptor: &'a TableDescriptor, actions: &'a ActionSet) -> ResponseBuilder<'a> {
        ResponseBuilder {
            descriptor,
            actions,
        }
    }

    pub fn build(
        &self,
        paging: &PagingRequest,
        resolved: &ResolvedColumns,
        rows: Vec<FormattedRow>,
        total: u64,
        filtered: u64,
    ) -> PagingResponse {
        let clickable = self
            .descriptor
            .clickable_columns
            .iter()
            .any(|field| resolved.contains(field));

        let data = rows
            .into_iter()
            .enumerate()
            .map(|(index, FormattedRow { source, mut view })| {
                if let Some(cell) = view.cells.get_mut(NUMBERING_COLUMN) {
                    *cell = (paging.start + index as u64 + 1).to_string();
                }
                if clickable {
                    view.attributes.merge_missing(self.click_attributes(&source));
                }
                if resolved.has_action() {
                    view.action = Some(self.actions.render(&source));
                }
                view
            })
            .collect();

        PagingResponse {
            draw: paging.draw_counter,
            records_total: total,
            records_filtered: filtered,
            data,
        }
    }

    fn click_attributes(&self, row: &Row) -> RowAttributes {
        let id = row.value(&self.descriptor.row_identifier);
        let mut attributes = RowAttributes {
            class: Some(CLICKABLE_ROW_CLASS.to_string()),
            ..RowAttributes::default()
        };
        if !id.is_empty() {
            attributes.data.insert(
                "data-url".to_string(),
                format!("{}/{}/view", self.actions.base_path, id.render()),
            );
        }
        attributes
    }

    /// Descriptor-level column flags, carried through as declared.
    pub fn meta(&self, table: &str, resolved: &ResolvedColumns) -> ResponseMeta {
        let flagged = |pred: fn(&tabula_core::ColumnSpec) -> bool| {
            self.descriptor
                .columns
                .iter()
                .filter(|spec| pred(spec))
                .map(|spec| spec.field.clone())
                .collect::<Vec<_>>()
        };

        ResponseMeta {
            table: table.to_string(),
            columns: resolved.columns.clone(),
            labels: resolved.labels.clone(),
            hidden: flagged(|spec| spec.hidden),
            raw_html: flagged(|spec| spec.raw_html),
            sortable: flagged(|spec| spec.sortable),
            searchable: flagged(|spec| spec.searchable),
            clickable: self.descriptor.clickable_columns.clone(),
            merged: self.descriptor.merged_columns.clone(),
            fixed_columns: self.descriptor.fixed_columns,
        }
    }
}
