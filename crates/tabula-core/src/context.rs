use crate::{Diagnose, FilterSpec, PagingRequest, TableDescriptor, Verb};

use indexmap::IndexMap;
use serde_json::json;
use std::collections::BTreeSet;

/// Strongly-typed input to one compilation.
///
/// Produced by the context adapter from loosely-structured request
/// parameters and descriptor data, then shared read-only by every stage.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationContext {
    /// `None` when no table name could be resolved. The compiler reports
    /// this as a missing table.
    pub table_name: Option<String>,

    pub descriptor: TableDescriptor,

    pub paging: PagingRequest,

    /// Caller filters. See [`CompilationContext::effective_filters`].
    pub filters: Vec<FilterSpec>,

    pub filter_page: Option<String>,

    pub route: RouteContext,

    pub privileges: Privileges,

    /// Raw request parameters, kept for diagnostics only.
    pub request: IndexMap<String, String>,
}

impl CompilationContext {
    pub fn new(table_name: impl Into<String>, descriptor: TableDescriptor) -> CompilationContext {
        CompilationContext {
            table_name: Some(table_name.into()),
            descriptor,
            paging: PagingRequest::default(),
            filters: vec![],
            filter_page: None,
            route: RouteContext::default(),
            privileges: Privileges::default(),
            request: IndexMap::new(),
        }
    }

    pub fn paging(mut self, paging: PagingRequest) -> CompilationContext {
        self.paging = paging;
        self
    }

    pub fn route(mut self, route: RouteContext) -> CompilationContext {
        self.route = route;
        self
    }

    pub fn privileges(mut self, privileges: Privileges) -> CompilationContext {
        self.privileges = privileges;
        self
    }

    /// Descriptor filters followed by caller filters, keeping only those
    /// unscoped or scoped to the current filter page.
    pub fn effective_filters(&self) -> Vec<FilterSpec> {
        self.descriptor
            .filters
            .iter()
            .chain(&self.filters)
            .filter(|filter| match (&filter.page, &self.filter_page) {
                (None, _) => true,
                (Some(page), Some(current)) => page == current,
                (Some(_), None) => false,
            })
            .cloned()
            .collect()
    }

    /// Route label used in diagnostics: the route name when known, else the
    /// request path.
    pub fn route_label(&self) -> String {
        self.route
            .route_name
            .clone()
            .or_else(|| self.route.request_path.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

impl Diagnose for CompilationContext {
    fn diagnostics(&self) -> serde_json::Value {
        json!({
            "table": self.table_name,
            "route": self.route.diagnostics(),
            "paging": {
                "start": self.paging.start,
                "length": self.paging.length,
                "order_column_index": self.paging.order_column_index,
                "order_direction": self.paging.order_direction,
                "search": self.paging.search_term,
                "draw": self.paging.draw_counter,
            },
            "columns": self.descriptor.requested_fields(),
            "formulas": self.descriptor.formulas.iter().map(|f| &f.name).collect::<Vec<_>>(),
            "filters": self.filters.len(),
            "filter_page": self.filter_page,
            "roles": self.privileges.roles,
            "request": self.request,
        })
    }
}

/// Routing facts of the current request, used to resolve action URLs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RouteContext {
    /// Full referrer URL sent by the browser.
    pub referrer: Option<String>,

    /// URI pattern of the matched route, e.g. `admin/users/index`.
    pub route_uri: Option<String>,

    /// Dotted route name, e.g. `admin.users.index`.
    pub route_name: Option<String>,

    /// Raw request path.
    pub request_path: Option<String>,
}

impl RouteContext {
    pub fn referrer(mut self, referrer: impl Into<String>) -> RouteContext {
        self.referrer = Some(referrer.into());
        self
    }

    pub fn route_uri(mut self, uri: impl Into<String>) -> RouteContext {
        self.route_uri = Some(uri.into());
        self
    }

    pub fn route_name(mut self, name: impl Into<String>) -> RouteContext {
        self.route_name = Some(name.into());
        self
    }

    pub fn request_path(mut self, path: impl Into<String>) -> RouteContext {
        self.request_path = Some(path.into());
        self
    }
}

impl Diagnose for RouteContext {
    fn diagnostics(&self) -> serde_json::Value {
        json!({
            "referrer": self.referrer,
            "route_uri": self.route_uri,
            "route_name": self.route_name,
            "request_path": self.request_path,
        })
    }
}

/// Role name that bypasses verb grants.
pub const ROOT_ROLE: &str = "root";

/// Privileges of the current user, injected by the caller.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Privileges {
    pub roles: Vec<String>,

    /// Verbs the user may use. `None` grants every verb.
    pub grants: Option<BTreeSet<Verb>>,
}

impl Privileges {
    /// A user with every verb granted.
    pub fn unrestricted() -> Privileges {
        Privileges::default()
    }

    pub fn granting(roles: &[&str], verbs: impl IntoIterator<Item = Verb>) -> Privileges {
        Privileges {
            roles: roles.iter().map(|r| r.to_string()).collect(),
            grants: Some(verbs.into_iter().collect()),
        }
    }

    pub fn is_root(&self) -> bool {
        self.roles.iter().any(|role| role == ROOT_ROLE)
    }

    pub fn allows(&self, verb: Verb) -> bool {
        self.is_root()
            || self
                .grants
                .as_ref()
                .map_or(true, |grants| grants.contains(&verb))
    }
}
