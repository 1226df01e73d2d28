//! Captured differences at transaction, object and property granularity.

use serde::Serialize;

/// Old-value text of a property that only exists after the change.
pub const ADDED_SENTINEL: &str = "<added>";

/// New-value text of a property that only existed before the change.
pub const REMOVED_SENTINEL: &str = "<removed>";

/// Change of one property.
///
/// Exactly one of these holds: the value changed, the property was added,
/// or the property was removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDiff {
    pub name: String,
    /// Dotted path of the property inside its object.
    pub path: String,
    pub old_value: String,
    pub new_value: String,
    pub added: bool,
    pub removed: bool,
}

impl PropertyDiff {
    pub fn changed(
        name: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            path: name.clone(),
            name,
            old_value: old_value.into(),
            new_value: new_value.into(),
            added: false,
            removed: false,
        }
    }

    pub fn added(name: impl Into<String>, new_value: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: name.clone(),
            name,
            old_value: ADDED_SENTINEL.to_string(),
            new_value: new_value.into(),
            added: true,
            removed: false,
        }
    }

    pub fn removed(name: impl Into<String>, old_value: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: name.clone(),
            name,
            old_value: old_value.into(),
            new_value: REMOVED_SENTINEL.to_string(),
            added: false,
            removed: true,
        }
    }
}

/// Changes of one object within a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectDiff {
    pub path: String,
    pub type_name: String,
    pub object_added: bool,
    pub object_removed: bool,
    pub properties: Vec<PropertyDiff>,
}

impl ObjectDiff {
    pub fn new(path: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            type_name: type_name.into(),
            object_added: false,
            object_removed: false,
            properties: Vec::new(),
        }
    }

    pub fn has_differences(&self) -> bool {
        self.object_added || self.object_removed || !self.properties.is_empty()
    }
}

/// Changes made by one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionDiff {
    /// Position of the transaction in the history queue.
    pub index: usize,
    pub title: String,
    pub context: String,
    pub objects: Vec<ObjectDiff>,
}

impl TransactionDiff {
    pub fn has_differences(&self) -> bool {
        self.objects.iter().any(ObjectDiff::has_differences)
    }
}

/// Serializes captured diffs as pretty-printed RON.
pub fn to_ron(diffs: &[TransactionDiff]) -> Result<String, ron::Error> {
    ron::ser::to_string_pretty(diffs, ron::ser::PrettyConfig::default())
}
