use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A default CRUD verb that can appear as a row action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    View,
    Insert,
    Edit,
    Delete,
}

impl Verb {
    pub const ALL: [Verb; 4] = [Verb::View, Verb::Insert, Verb::Edit, Verb::Delete];

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::View => "view",
            Verb::Insert => "insert",
            Verb::Edit => "edit",
            Verb::Delete => "delete",
        }
    }

    /// The default verb set `{view, insert, edit, delete}`.
    pub fn defaults() -> BTreeSet<Verb> {
        Verb::ALL.into_iter().collect()
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row action configuration of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Verbs offered before removals. Defaults to every [`Verb`].
    pub enabled_verbs: BTreeSet<Verb>,

    /// Verbs to remove, in caller-facing synonyms (`show`, `create`,
    /// `update`, `destroy`, ...).
    pub removed_verbs: Vec<String>,

    /// Extra buttons, or the default verb buttons when configured as `true`.
    pub custom_buttons: CustomButtons,
}

impl ActionConfig {
    pub fn new() -> ActionConfig {
        ActionConfig::default()
    }

    /// No row actions at all.
    pub fn none() -> ActionConfig {
        ActionConfig {
            enabled_verbs: BTreeSet::new(),
            removed_verbs: vec![],
            custom_buttons: CustomButtons::None,
        }
    }

    pub fn enabled(mut self, verbs: impl IntoIterator<Item = Verb>) -> ActionConfig {
        self.enabled_verbs = verbs.into_iter().collect();
        self
    }

    pub fn remove(mut self, verb: impl Into<String>) -> ActionConfig {
        self.removed_verbs.push(verb.into());
        self
    }

    /// Adds a custom button using the `name|color|icon` grammar.
    pub fn button(mut self, spec: impl Into<String>) -> ActionConfig {
        match &mut self.custom_buttons {
            CustomButtons::List(list) => list.push(spec.into()),
            other => *other = CustomButtons::List(vec![spec.into()]),
        }
        self
    }
}

impl Default for ActionConfig {
    fn default() -> Self {
        ActionConfig {
            enabled_verbs: Verb::defaults(),
            removed_verbs: vec![],
            custom_buttons: CustomButtons::None,
        }
    }
}

/// Caller-supplied buttons.
///
/// Serialized as either a boolean (`true` expands to the default verb
/// buttons) or a list of `name|color|icon` strings.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CustomButtonsRepr", into = "CustomButtonsRepr")]
pub enum CustomButtons {
    #[default]
    None,
    Defaults,
    List(Vec<String>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CustomButtonsRepr {
    Flag(bool),
    List(Vec<String>),
}

impl From<CustomButtonsRepr> for CustomButtons {
    fn from(repr: CustomButtonsRepr) -> Self {
        match repr {
            CustomButtonsRepr::Flag(true) => CustomButtons::Defaults,
            CustomButtonsRepr::Flag(false) => CustomButtons::None,
            CustomButtonsRepr::List(list) => CustomButtons::List(list),
        }
    }
}

impl From<CustomButtons> for CustomButtonsRepr {
    fn from(buttons: CustomButtons) -> Self {
        match buttons {
            CustomButtons::None => CustomButtonsRepr::Flag(false),
            CustomButtons::Defaults => CustomButtonsRepr::Flag(true),
            CustomButtons::List(list) => CustomButtonsRepr::List(list),
        }
    }
}
