use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The signed-in user. Their email partitions the persisted record collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub is_verified: bool,
}

impl Identity {
    pub fn new(email: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            full_name: full_name.into(),
            is_verified: true,
        }
    }
}

/// One captured photo: a card side, a form page, or an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub mime_type: String,
    /// Base64 payload without any `data:` prefix.
    pub data: String,
}

impl CapturedImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Encode raw image bytes.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, STANDARD.encode(bytes))
    }

    /// Parse a `data:<mime>;base64,<payload>` URL. A bare base64 string is
    /// accepted and treated as JPEG.
    pub fn from_data_url(url: &str) -> Option<Self> {
        let Some(rest) = url.strip_prefix("data:") else {
            if url.is_empty() {
                return None;
            }
            return Some(Self::new("image/jpeg", url));
        };
        let (header, payload) = rest.split_once(',')?;
        let mime = header.strip_suffix(";base64")?;
        if payload.is_empty() {
            return None;
        }
        let mime = if mime.is_empty() { "image/jpeg" } else { mime };
        Some(Self::new(mime, payload))
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Size of the decoded payload in bytes (approximate for padded input).
    pub fn byte_len(&self) -> usize {
        let padding = self.data.chars().rev().take_while(|c| *c == '=').count();
        (self.data.len() / 4 * 3).saturating_sub(padding)
    }
}

/// The text fields a vision model extracts from a card or inquiry form.
/// Absent fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadFields {
    pub company_name: String,
    pub contact_person: String,
    pub contact_number: String,
    pub email_id: String,
    pub inquiry_requirements: String,
    pub designation: String,
    pub website: String,
    pub corporate_address: String,
    pub factory_address: String,
    pub telephone_number: String,
}

impl LeadFields {
    /// Wire names of every field, in schema order.
    pub const FIELD_NAMES: [&'static str; 10] = [
        "companyName",
        "contactPerson",
        "contactNumber",
        "emailId",
        "inquiryRequirements",
        "designation",
        "website",
        "corporateAddress",
        "factoryAddress",
        "telephoneNumber",
    ];

    /// Fields the model is asked to always attempt.
    pub const REQUIRED_FIELDS: [&'static str; 4] =
        ["companyName", "contactPerson", "contactNumber", "emailId"];

    /// Mutable access by wire name.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        let slot = match name {
            "companyName" => &mut self.company_name,
            "contactPerson" => &mut self.contact_person,
            "contactNumber" => &mut self.contact_number,
            "emailId" => &mut self.email_id,
            "inquiryRequirements" => &mut self.inquiry_requirements,
            "designation" => &mut self.designation,
            "website" => &mut self.website,
            "corporateAddress" => &mut self.corporate_address,
            "factoryAddress" => &mut self.factory_address,
            "telephoneNumber" => &mut self.telephone_number,
            _ => return None,
        };
        Some(slot)
    }

    /// Read access by wire name.
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "companyName" => &self.company_name,
            "contactPerson" => &self.contact_person,
            "contactNumber" => &self.contact_number,
            "emailId" => &self.email_id,
            "inquiryRequirements" => &self.inquiry_requirements,
            "designation" => &self.designation,
            "website" => &self.website,
            "corporateAddress" => &self.corporate_address,
            "factoryAddress" => &self.factory_address,
            "telephoneNumber" => &self.telephone_number,
            _ => return None,
        };
        Some(value.as_str())
    }

    pub fn is_blank(&self) -> bool {
        Self::FIELD_NAMES
            .iter()
            .filter_map(|name| self.field(name))
            .all(|value| value.trim().is_empty())
    }
}

/// A finalized, immutable record owned by one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: LeadFields,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl LeadRecord {
    pub fn new(id: Uuid, fields: LeadFields, timestamp: i64) -> Self {
        Self { id, fields, timestamp }
    }
}

impl fmt::Display for LeadRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let company = if self.fields.company_name.is_empty() {
            "?"
        } else {
            &self.fields.company_name
        };
        write!(f, "{} ({})", company, self.fields.contact_person)
    }
}
