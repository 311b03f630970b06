//! Common imports for test files
//!
//! This module provides a convenient way to import frequently used items
//! in test files with `use tests::prelude::*;`

// Re-export fixtures
pub use crate::{orders, orders_descriptor, orders_route, parity, RecordingSource};

// Re-export the compiler surface
pub use tabula::{
    Compiler, ContextAdapter, DiffReport, Inspector, LegacyCompiler, MemSource, Mode,
    ParityHarness, Pipeline, Severity, Tolerance,
};
pub use tabula_core::{CompilationContext, CompiledTable, DataSource, Row, RowView, TableDescriptor};

/// Cells of a row as `(field, value)` pairs, in display order.
pub fn cells(row: &RowView) -> Vec<(&str, &str)> {
    row.cells
        .iter()
        .map(|(field, value)| (field.as_str(), value.as_str()))
        .collect()
}

/// Builds a context the way a controller would: request parameters plus the
/// loose descriptor bag, routed to the orders index.
pub fn orders_context(params: &[(&str, &str)]) -> CompilationContext {
    ContextAdapter::new()
        .adapt(params.iter().copied(), &orders_descriptor(), vec![], None)
        .route(orders_route())
}
