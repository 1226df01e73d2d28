//! Post-capture pruning of diff noise.
//!
//! A [`TeachingFilter`] has veto points at transaction, object and property
//! granularity. The provided methods compose bottom-up: children are filtered
//! first and a parent survives only while it still has differences. Filters
//! override whichever level they care about.
//!
//! - [`FilterChain`]: ordered list of filters applied in registration order
//! - [`AssetObjectFilter`]: drops edits to asset definitions, keeps instance edits
//! - [`EditablePropertyFilter`]: keeps only user-editable fields on gameplay types

use std::sync::Arc;

use mentor_core::reflect::TypeRegistry;
use serde::{Deserialize, Serialize};

use crate::diff::{ObjectDiff, PropertyDiff, TransactionDiff};

/// A rule that prunes captured diffs in place.
pub trait TeachingFilter: Send {
    fn description(&self) -> String;

    /// Filters the whole list, dropping transactions left without differences.
    fn filter_transactions(&self, transactions: &mut Vec<TransactionDiff>) {
        transactions.retain_mut(|transaction| self.filter_transaction(transaction));
    }

    /// Returns `false` to drop the transaction.
    fn filter_transaction(&self, transaction: &mut TransactionDiff) -> bool {
        self.filter_objects(&mut transaction.objects);
        transaction.has_differences()
    }

    fn filter_objects(&self, objects: &mut Vec<ObjectDiff>) {
        objects.retain_mut(|object| self.filter_object(object));
    }

    /// Returns `false` to drop the object.
    fn filter_object(&self, object: &mut ObjectDiff) -> bool {
        filter_object_properties(self, object)
    }

    fn filter_properties(&self, object_type: &str, properties: &mut Vec<PropertyDiff>) {
        properties.retain_mut(|property| self.filter_property(object_type, property));
    }

    /// Returns `false` to drop the property.
    fn filter_property(&self, _object_type: &str, _property: &mut PropertyDiff) -> bool {
        true
    }
}

/// The default object step: filter the properties, keep the object while it
/// still has differences.
///
/// Filters overriding [`TeachingFilter::filter_object`] call this to fall
/// through to property filtering.
pub fn filter_object_properties<F: TeachingFilter + ?Sized>(
    filter: &F,
    object: &mut ObjectDiff,
) -> bool {
    filter.filter_properties(&object.type_name, &mut object.properties);
    object.has_differences()
}

/// Passes everything through.
#[derive(Debug, Default, Clone, Copy)]
pub struct BaseFilter;

impl TeachingFilter for BaseFilter {
    fn description(&self) -> String {
        "Base Filter (No filtering)".to_string()
    }
}

/// Tunables of the built-in filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    /// Whether [`FilterChain::populate_defaults`] installs anything.
    pub default_filters: bool,
    /// Type-name marker of asset definition objects.
    pub asset_marker: String,
    /// Name suffix of types generated from assets.
    pub generated_suffix: String,
    /// Name prefix of engine-internal fields.
    pub internal_prefix: String,
    /// Base types whose subclasses get property filtering.
    pub interesting_types: Vec<String>,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            default_filters: true,
            asset_marker: "Blueprint".to_string(),
            generated_suffix: "_C".to_string(),
            internal_prefix: "__".to_string(),
            interesting_types: vec![
                "Actor".to_string(),
                "ActorComponent".to_string(),
                "GameplayAbility".to_string(),
            ],
        }
    }
}

/// Drops object diffs of asset definitions.
///
/// An object whose type name contains the asset marker is an edit to the
/// asset itself, unless its path carries the generated suffix, which marks
/// an instance of the generated type. Everything else falls through to
/// property filtering.
#[derive(Debug, Clone)]
pub struct AssetObjectFilter {
    marker: String,
    suffix: String,
}

impl AssetObjectFilter {
    pub fn new(marker: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            suffix: suffix.into(),
        }
    }

    pub fn from_rules(rules: &FilterRules) -> Self {
        Self::new(rules.asset_marker.clone(), rules.generated_suffix.clone())
    }

    fn is_asset_definition(&self, object: &ObjectDiff) -> bool {
        object.type_name.contains(&self.marker) && !object.path.contains(&self.suffix)
    }
}

impl Default for AssetObjectFilter {
    fn default() -> Self {
        Self::from_rules(&FilterRules::default())
    }
}

impl TeachingFilter for AssetObjectFilter {
    fn description(&self) -> String {
        format!(
            "{} Object Filter (removes {} asset changes, keeps instance changes)",
            self.marker, self.marker
        )
    }

    fn filter_object(&self, object: &mut ObjectDiff) -> bool {
        if self.is_asset_definition(object) {
            log::trace!("Filtering out asset object {}", object.path);
            return false;
        }
        filter_object_properties(self, object)
    }
}

/// Keeps only user-editable fields on gameplay types.
///
/// A type is filtered when it derives from one of the interesting types or
/// its name carries the generated suffix. For those, properties whose field
/// is not editable are dropped. When the type or field cannot be resolved,
/// only internal fields are dropped.
pub struct EditablePropertyFilter {
    registry: Arc<TypeRegistry>,
    interesting_types: Vec<String>,
    generated_suffix: String,
    internal_prefix: String,
}

impl EditablePropertyFilter {
    pub fn new(registry: Arc<TypeRegistry>, rules: &FilterRules) -> Self {
        Self {
            registry,
            interesting_types: rules.interesting_types.clone(),
            generated_suffix: rules.generated_suffix.clone(),
            internal_prefix: rules.internal_prefix.clone(),
        }
    }

    fn is_interesting(&self, type_name: &str) -> bool {
        if type_name.ends_with(&self.generated_suffix) {
            return true;
        }
        if self.interesting_types.iter().any(|t| t == type_name) {
            return true;
        }
        self.registry.get(type_name).is_some_and(|def| {
            self.interesting_types
                .iter()
                .any(|interesting| def.is_a(interesting))
        })
    }
}

impl TeachingFilter for EditablePropertyFilter {
    fn description(&self) -> String {
        "Editable Property Filter (keeps only editor-editable properties)".to_string()
    }

    fn filter_properties(&self, object_type: &str, properties: &mut Vec<PropertyDiff>) {
        if !self.is_interesting(object_type) {
            return;
        }
        properties.retain_mut(|property| self.filter_property(object_type, property));
    }

    fn filter_property(&self, object_type: &str, property: &mut PropertyDiff) -> bool {
        let field = self
            .registry
            .get(object_type)
            .and_then(|def| def.field(&property.name));
        match field {
            Some(field) => field.flags.is_editable(),
            None => !property.name.starts_with(&self.internal_prefix),
        }
    }
}

/// Ordered list of filters.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn TeachingFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, filter: Box<dyn TeachingFilter>) {
        let description = filter.description();
        self.filters.push(filter);
        log::info!("Added filter to chain: {description}");
    }

    pub fn clear(&mut self) {
        self.filters.clear();
        log::info!("Cleared all filters from chain");
    }

    /// Replaces the chain with the built-in filters: asset objects first,
    /// then editable properties.
    pub fn populate_defaults(&mut self, registry: Arc<TypeRegistry>, rules: &FilterRules) {
        self.clear();
        if !rules.default_filters {
            log::debug!("Default filters disabled");
            return;
        }
        self.add(Box::new(AssetObjectFilter::from_rules(rules)));
        self.add(Box::new(EditablePropertyFilter::new(registry, rules)));
    }

    /// Runs every filter over `transactions` in registration order.
    pub fn apply(&self, transactions: &mut Vec<TransactionDiff>) {
        log::info!(
            "Applying {} filters to {} transactions",
            self.filters.len(),
            transactions.len()
        );
        for filter in &self.filters {
            filter.filter_transactions(transactions);
            log::debug!(
                "After '{}': {} transactions",
                filter.description(),
                transactions.len()
            );
        }
        log::info!(
            "Filter chain complete. Final transaction count: {}",
            transactions.len()
        );
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.description()).collect()
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.descriptions())
            .finish()
    }
}
