use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::{ConfigResult, ConfigurationError};

/// Ordered, non-empty set of text field names handed to the processor.
///
/// Processor calls are issued once per field in this order, and transformed
/// texts are written back to the same names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FieldSet(Vec<String>);

impl FieldSet {
    pub fn new<I, S>(names: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "batching.fields",
                "[]",
                "at least one text field is required",
            ));
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if name.trim().is_empty() || !seen.insert(name.as_str()) {
                return Err(ConfigurationError::invalid_value(
                    "batching.fields",
                    name.clone(),
                    "field names must be unique and non-blank",
                ));
            }
        }

        Ok(Self(names))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl TryFrom<Vec<String>> for FieldSet {
    type Error = ConfigurationError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        FieldSet::new(names)
    }
}

impl From<FieldSet> for Vec<String> {
    fn from(fields: FieldSet) -> Self {
        fields.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_set_preserves_order() {
        let fields = FieldSet::new(["question", "answer", "context"]).unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(
            fields.iter().collect::<Vec<_>>(),
            vec!["question", "answer", "context"]
        );
    }

    #[test]
    fn test_field_set_rejects_invalid_names() {
        assert!(FieldSet::new(Vec::<String>::new()).is_err());
        assert!(FieldSet::new(["question", "question"]).is_err());
        assert!(FieldSet::new(["question", ""]).is_err());
    }

    #[test]
    fn test_field_set_deserialize_validates() {
        let ok: FieldSet = serde_json::from_str(r#"["question","answer"]"#).unwrap();
        assert_eq!(ok.names(), &["question".to_string(), "answer".to_string()]);
        assert!(serde_json::from_str::<FieldSet>("[]").is_err());
    }
}
