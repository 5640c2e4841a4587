//! Customer sets and the CSV upload that creates them.
//!
//! A customer set is created by uploading exactly one CSV file of at most
//! 5 MiB together with its metadata. Uploads that break these limits are
//! rejected here, before anything is sent.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::RecordId;
use crate::validation::FormErrors;

/* --------------------------------------------------------------------------
   Upload limits
   -------------------------------------------------------------------------- */

/// Largest accepted upload, in bytes (5 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 5_242_880;

/// Content types accepted for customer set files.
pub const ACCEPTED_CONTENT_TYPES: &[&str] = &["text/csv"];

pub const ONE_FILE_MESSAGE: &str = "Only one file is allowed.";
pub const FILE_SIZE_MESSAGE: &str = "File size should be less than 5MB.";
pub const FILE_TYPE_MESSAGE: &str = "Only .csv files are allowed.";

/* --------------------------------------------------------------------------
   Types
   -------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CustomerSetType {
    File,
}

impl CustomerSetType {
    pub fn as_str(self) -> &'static str {
        match self {
            CustomerSetType::File => "FILE",
        }
    }
}

impl fmt::Display for CustomerSetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CustomerSetType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FILE" => Ok(CustomerSetType::File),
            other => Err(CoreError::InvalidValue {
                field: "type",
                value: other.to_string(),
            }),
        }
    }
}

/// Ingestion state reported by the backend. Unknown values are preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CustomerSetStatus {
    Uploaded,
    Processed,
    Other(String),
}

impl From<String> for CustomerSetStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "UPLOADED" => CustomerSetStatus::Uploaded,
            "PROCESSED" => CustomerSetStatus::Processed,
            _ => CustomerSetStatus::Other(raw),
        }
    }
}

impl From<CustomerSetStatus> for String {
    fn from(status: CustomerSetStatus) -> Self {
        match status {
            CustomerSetStatus::Uploaded => "UPLOADED".to_string(),
            CustomerSetStatus::Processed => "PROCESSED".to_string(),
            CustomerSetStatus::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSet {
    pub id: RecordId,
    pub organization_id: RecordId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub set_type: CustomerSetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CustomerSetStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Metadata fields shared by the create and update forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSetForm {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub set_type: CustomerSetType,
}

/// Body of `PATCH /customer-sets/{id}`.
pub type UpdateCustomerSet = CustomerSetForm;

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// A customer set creation request that passed the upload rules.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerSetUpload {
    pub organization_id: RecordId,
    pub form: CustomerSetForm,
    pub file: UploadFile,
}

impl CustomerSetUpload {
    /// Check the selected files and pair the single accepted one with the
    /// metadata. Violations are keyed under `file`.
    pub fn new(
        organization_id: RecordId,
        form: CustomerSetForm,
        mut files: Vec<UploadFile>,
    ) -> Result<Self, CoreError> {
        check_files(&files)?;
        let file = files.remove(0);
        Ok(Self {
            organization_id,
            form,
            file,
        })
    }

    /// Text parts of the multipart body, in submission order.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("name", self.form.name.clone())];
        if let Some(description) = &self.form.description {
            fields.push(("description", description.clone()));
        }
        fields.push(("type", self.form.set_type.as_str().to_string()));
        fields.push(("organization_id", self.organization_id.clone()));
        fields
    }
}

/// Apply the one-file, size and content-type rules.
pub fn check_files(files: &[UploadFile]) -> Result<(), FormErrors> {
    let mut errors = FormErrors::new();
    match files {
        [file] => {
            if file.size() > MAX_UPLOAD_BYTES {
                errors.add("file", FILE_SIZE_MESSAGE);
            }
            if !ACCEPTED_CONTENT_TYPES.contains(&file.content_type.as_str()) {
                errors.add("file", FILE_TYPE_MESSAGE);
            }
        }
        _ => errors.add("file", ONE_FILE_MESSAGE),
    }
    errors.into_result(())
}
