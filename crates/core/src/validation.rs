//! Field-scoped validation errors.
//!
//! Form checks never stop at the first failure: every rule runs and each
//! violation is recorded against the field it belongs to, so the caller can
//! surface all messages next to their inputs at once. Rules expressed with
//! `validator` derives are folded in through [`FormErrors::absorb`].

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use validator::ValidationErrors;

/// Message used for every `*_config` field whose text is not valid JSON.
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON";

/// Ordered mapping from field name to the messages raised against it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Fold the errors reported by a `validator` derive into this set.
    ///
    /// Only field-level errors are taken; the forms in this crate have no
    /// nested structs or lists.
    pub fn absorb(&mut self, errors: &ValidationErrors) {
        for (field, violations) in errors.field_errors() {
            for violation in violations.iter() {
                let message = violation
                    .message
                    .as_ref()
                    .map_or_else(|| violation.code.to_string(), ToString::to_string);
                self.add(field.to_string(), message);
            }
        }
    }

    /// Merge another error set into this one.
    pub fn extend(&mut self, other: FormErrors) {
        for (field, messages) in other.fields {
            self.fields.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Messages recorded for `field`, in insertion order.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Names of the fields that failed, sorted.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// `Ok(value)` when no errors were recorded, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}
