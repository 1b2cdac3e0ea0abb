use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// One `addChangeListener` invocation lifted out of a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeListener {
    /// Observed attribute, as written between the quotes
    pub attribute: String,
    /// Handler body with its parameters renamed to the canonical value names
    pub body: String,
    /// Parameter the handler bound to the previous value, as written
    pub old_value_param: Option<String>,
    /// Parameter the handler bound to the current value, as written
    pub new_value_param: Option<String>,
}

/// Listeners in discovery order.
///
/// Repeated attribute names are kept; the generated `switch` only ever reaches the first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerRegistry {
    listeners: Vec<AttributeListener>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, listener: AttributeListener) {
        self.listeners.push(listener);
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeListener> {
        self.listeners.iter()
    }

    /// Attribute names in discovery order, duplicates included
    pub fn observed_attributes(&self) -> Vec<String> {
        self.listeners.iter().map(|l| l.attribute.clone()).collect()
    }

    /// Names that occur more than once, reported once each at their second occurrence
    pub fn duplicate_attributes(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut duplicates = Vec::new();
        for listener in &self.listeners {
            let name = listener.attribute.as_str();
            if !seen.insert(name) && reported.insert(name) {
                duplicates.push(name.to_string());
            }
        }
        duplicates
    }
}

/// Ambiguous but legal input, reported next to a successful translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TranslateWarning {
    /// More than one listener observes this attribute; only the first case runs
    #[serde(rename_all = "camelCase")]
    DuplicateAttribute { attribute: String },
    /// A load handler after the first; left in the class body as written
    IgnoredLoadHandler,
}

impl fmt::Display for TranslateWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslateWarning::DuplicateAttribute { attribute } => write!(
                f,
                "attribute \"{}\" has more than one change listener; only the first one runs",
                attribute
            ),
            TranslateWarning::IgnoredLoadHandler => {
                write!(f, "only the first load handler is used; later ones are left in place")
            }
        }
    }
}

/// State accumulated by the passes over one translation
#[derive(Debug, Clone, Default)]
pub struct TranslationMetadata {
    pub listeners: ListenerRegistry,
    pub load_handler: Option<String>,
    pub warnings: Vec<TranslateWarning>,
}

impl TranslationMetadata {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listener(attribute: &str) -> AttributeListener {
        AttributeListener {
            attribute: attribute.to_string(),
            body: String::new(),
            old_value_param: None,
            new_value_param: None,
        }
    }

    #[test]
    fn test_observed_attributes_keep_order_and_duplicates() {
        let mut registry = ListenerRegistry::new();
        for name in ["b", "a", "b", "b", "a"] {
            registry.push(listener(name));
        }
        assert_eq!(registry.observed_attributes(), vec!["b", "a", "b", "b", "a"]);
        assert_eq!(registry.duplicate_attributes(), vec!["b", "a"]);
    }

    #[test]
    fn test_warning_serialization() {
        let warning = TranslateWarning::DuplicateAttribute { attribute: "color".to_string() };
        assert_eq!(
            serde_json::to_value(&warning).unwrap(),
            serde_json::json!({"kind": "duplicateAttribute", "attribute": "color"})
        );
        assert_eq!(
            serde_json::to_value(TranslateWarning::IgnoredLoadHandler).unwrap(),
            serde_json::json!({"kind": "ignoredLoadHandler"})
        );
    }
}
