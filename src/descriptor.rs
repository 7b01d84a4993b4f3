use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

/// One localizable message, as it appears in the manifest. Field order here
/// is the serialized order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MessageDescriptor {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(rename = "defaultMessage")]
    pub default_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

/// Where a descriptor was found, attached under `extractSourceLocation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

/// Partial descriptor produced by the builder; missing keys are allowed
/// until table insertion decides what is required.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DescriptorDraft {
    pub id: Option<String>,
    pub description: Option<Value>,
    pub default_message: Option<String>,
}

/// Why a draft could not be inserted. The extractor attaches the node
/// position when converting these into diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertError {
    MissingId,
    MissingDefaultMessage,
    MissingDescription,
    Duplicate { id: String },
}

/// File-scoped, insertion-ordered store of resolved descriptors, at most
/// one entry per id.
#[derive(Debug)]
pub struct MessageTable {
    optional_default_messages: bool,
    enforce_descriptions: bool,
    entries: Vec<MessageDescriptor>,
    index: HashMap<String, usize>,
}

impl MessageTable {
    pub fn new(optional_default_messages: bool, enforce_descriptions: bool) -> Self {
        Self {
            optional_default_messages,
            enforce_descriptions,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Insert a draft, enforcing the required-field and duplicate policies.
    /// A duplicate with identical description and defaultMessage is accepted
    /// without a second entry; any mismatch is a conflict.
    pub fn insert(
        &mut self,
        draft: DescriptorDraft,
        location: Option<SourceLocation>,
    ) -> Result<(), InsertError> {
        let id = match draft.id {
            Some(id) if !id.is_empty() => id,
            _ => return Err(InsertError::MissingId),
        };

        let default_message = draft.default_message.unwrap_or_default();
        if default_message.is_empty() && !self.optional_default_messages {
            return Err(InsertError::MissingDefaultMessage);
        }

        if self.enforce_descriptions && !has_description(draft.description.as_ref()) {
            return Err(InsertError::MissingDescription);
        }

        if let Some(&existing) = self.index.get(&id) {
            let stored = &self.entries[existing];
            if stored.description == draft.description
                && stored.default_message == default_message
            {
                return Ok(());
            }
            return Err(InsertError::Duplicate { id });
        }

        let (file, line, column) = match location {
            Some(loc) => (Some(loc.file), Some(loc.line), Some(loc.column)),
            None => (None, None, None),
        };

        self.index.insert(id.clone(), self.entries.len());
        self.entries.push(MessageDescriptor {
            id,
            description: draft.description,
            default_message,
            file,
            line,
            column,
        });
        Ok(())
    }

    pub fn messages(&self) -> &[MessageDescriptor] {
        &self.entries
    }

    pub fn into_messages(self) -> Vec<MessageDescriptor> {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

fn has_description(description: Option<&Value>) -> bool {
    match description {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(id: &str, message: &str) -> DescriptorDraft {
        DescriptorDraft {
            id: Some(id.to_string()),
            description: None,
            default_message: Some(message.to_string()),
        }
    }

    #[test]
    fn identical_duplicate_is_accepted_once() {
        let mut table = MessageTable::new(false, false);
        table.insert(draft("a", "Hi"), None).unwrap();
        table.insert(draft("a", "Hi"), None).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn conflicting_duplicate_is_rejected() {
        let mut table = MessageTable::new(false, false);
        table.insert(draft("a", "Hi"), None).unwrap();
        let err = table.insert(draft("a", "Bye"), None).unwrap_err();
        assert_eq!(err, InsertError::Duplicate { id: "a".to_string() });
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn conflicting_description_is_rejected() {
        let mut table = MessageTable::new(false, false);
        let mut first = draft("a", "Hi");
        first.description = Some(Value::String("for the header".into()));
        table.insert(first, None).unwrap();
        let err = table.insert(draft("a", "Hi"), None).unwrap_err();
        assert_eq!(err, InsertError::Duplicate { id: "a".to_string() });
    }

    #[test]
    fn missing_id_is_rejected() {
        let mut table = MessageTable::new(false, false);
        let err = table
            .insert(
                DescriptorDraft {
                    default_message: Some("Hi".into()),
                    ..Default::default()
                },
                None,
            )
            .unwrap_err();
        assert_eq!(err, InsertError::MissingId);
    }

    #[test]
    fn default_message_requirement_is_configurable() {
        let mut strict = MessageTable::new(false, false);
        let err = strict
            .insert(
                DescriptorDraft {
                    id: Some("a".into()),
                    ..Default::default()
                },
                None,
            )
            .unwrap_err();
        assert_eq!(err, InsertError::MissingDefaultMessage);

        let mut relaxed = MessageTable::new(true, false);
        relaxed
            .insert(
                DescriptorDraft {
                    id: Some("a".into()),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        assert_eq!(relaxed.messages()[0].default_message, "");
    }

    #[test]
    fn enforce_descriptions_rejects_blank_descriptions() {
        let mut table = MessageTable::new(false, true);
        let mut blank = draft("a", "Hi");
        blank.description = Some(Value::String("  ".into()));
        assert_eq!(
            table.insert(blank, None).unwrap_err(),
            InsertError::MissingDescription
        );

        let mut structured = draft("b", "Hi");
        structured.description = Some(serde_json::json!({ "context": "header" }));
        table.insert(structured, None).unwrap();
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut table = MessageTable::new(false, false);
        table.insert(draft("z", "Z"), None).unwrap();
        table.insert(draft("a", "A"), None).unwrap();
        let ids: Vec<_> = table.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["z", "a"]);
    }

    #[test]
    fn location_fields_serialize_flat_and_in_order() {
        let mut table = MessageTable::new(false, false);
        table
            .insert(
                draft("a", "Hi"),
                Some(SourceLocation {
                    file: "src/App.js".into(),
                    line: 3,
                    column: 7,
                }),
            )
            .unwrap();
        let json = serde_json::to_string(&table.messages()[0]).unwrap();
        assert_eq!(
            json,
            r#"{"id":"a","defaultMessage":"Hi","file":"src/App.js","line":3,"column":7}"#
        );
    }
}
