use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A computed column inserted into the display order at a declared anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaSpec {
    pub name: String,
    pub label: String,

    /// Fields the expression may reference.
    #[serde(alias = "field_lists")]
    pub source_fields: Vec<String>,

    /// Expression over the source fields. Empty means the sum of the source
    /// fields.
    #[serde(default, alias = "logic")]
    pub expression: String,

    #[serde(default)]
    pub placement: Placement,
}

impl FormulaSpec {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        source_fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> FormulaSpec {
        FormulaSpec {
            name: name.into(),
            label: label.into(),
            source_fields: source_fields.into_iter().map(Into::into).collect(),
            expression: String::new(),
            placement: Placement::default(),
        }
    }

    pub fn expression(mut self, expression: impl Into<String>) -> FormulaSpec {
        self.expression = expression.into();
        self
    }

    pub fn placement(mut self, anchor: impl Into<Anchor>, after: bool) -> FormulaSpec {
        self.placement = Placement {
            anchor: anchor.into(),
            after,
        };
        self
    }
}

/// Where a formula column lands in the display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    #[serde(alias = "location")]
    pub anchor: Anchor,
    #[serde(default = "default_after")]
    pub after: bool,
}

fn default_after() -> bool {
    true
}

impl Default for Placement {
    fn default() -> Self {
        Placement {
            anchor: Anchor::Last,
            after: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    First,
    Last,
    Field(String),
}

impl Anchor {
    pub fn as_str(&self) -> &str {
        match self {
            Anchor::First => "first",
            Anchor::Last => "last",
            Anchor::Field(field) => field,
        }
    }
}

impl From<&str> for Anchor {
    fn from(src: &str) -> Self {
        match src {
            "first" => Anchor::First,
            "last" => Anchor::Last,
            field => Anchor::Field(field.to_string()),
        }
    }
}

impl From<String> for Anchor {
    fn from(src: String) -> Self {
        match src.as_str() {
            "first" => Anchor::First,
            "last" => Anchor::Last,
            _ => Anchor::Field(src),
        }
    }
}

impl Serialize for Anchor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Anchor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Anchor::from)
    }
}
