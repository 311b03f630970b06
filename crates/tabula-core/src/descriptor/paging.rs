use serde::{Deserialize, Serialize};

/// Descriptor-level paging defaults, passed through to the grid widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    pub default_length: i64,
    pub length_menu: Vec<i64>,
}

impl Default for PagingConfig {
    fn default() -> Self {
        PagingConfig {
            default_length: 10,
            length_menu: vec![10, 25, 50, 100, -1],
        }
    }
}
