pub mod action;
pub use action::{ActionResolver, ActionSet, Button};

pub mod adapter;
pub use adapter::ContextAdapter;

pub mod column;
pub use column::{ColumnResolver, ResolvedColumns};

pub mod config;
pub use config::{Config, Environment, InspectorConfig, ParityConfig};

pub mod format;
pub use format::{FormattedRow, RowFormatter};

pub mod guard;
pub use guard::{AllowAll, RequestGuard};

mod html;

pub mod legacy;
pub use legacy::LegacyCompiler;

pub mod mem;
pub use mem::MemSource;

pub mod parity;
pub use parity::{DiffReport, Inspector, Mode, Outcome, ParityHarness, Severity, Tolerance};

pub mod pipeline;
pub use pipeline::{Compiler, Pipeline};

pub mod response;
pub use response::ResponseBuilder;

pub use tabula_core::{
    CompilationContext, CompiledTable, DataSource, Error, PagingRequest, PagingResponse, Result,
    Row, TableDescriptor, Value,
};
