//! A single secret store entry with allow-listed accessors

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::kind::GENERAL_FIELDS;
use crate::{Error, ProfileKind, Result};

/// A raw entry as held by the secret store.
///
/// Fields are never read directly by callers: `general`, `custom` and
/// `attachment` enforce the allow-lists so a typo in a property name fails
/// loudly instead of reading as "not set".
#[derive(Clone, Default, Deserialize)]
pub struct SecretEntry {
    pub group: String,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "scalar_map")]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub attachments: BTreeMap<String, String>,
}

impl SecretEntry {
    pub fn new(group: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_attachment(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.attachments.insert(name.into(), text.into());
        self
    }

    /// Read one of the general fields (`username`, `password`, `url`).
    ///
    /// The field name is case-insensitive. Empty values read as `None`.
    pub fn general(&self, field: &str) -> Result<Option<&str>> {
        let value = match field.to_ascii_lowercase().as_str() {
            "username" => self.username.as_deref(),
            "password" => self.password.as_deref(),
            "url" => self.url.as_deref(),
            _ => {
                return Err(Error::UnsupportedField {
                    field: field.to_string(),
                    allowed: GENERAL_FIELDS,
                });
            }
        };
        Ok(non_empty(value))
    }

    /// Read a custom property, validated against the kind's allow-list.
    pub fn custom(&self, kind: ProfileKind, property: &str) -> Result<Option<&str>> {
        if !kind.allows(property) {
            return Err(Error::UnsupportedProperty {
                kind: kind.to_string(),
                property: property.to_string(),
            });
        }
        Ok(non_empty(self.properties.get(property).map(String::as_str)))
    }

    /// Read the text of a required attachment.
    pub fn attachment(&self, name: &str) -> Result<&str> {
        self.attachments
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| Error::AttachmentNotFound {
                name: name.to_string(),
            })
    }

    /// Read the text of an attachment that may legitimately be absent.
    pub fn optional_attachment(&self, name: &str) -> Option<&str> {
        non_empty(self.attachments.get(name).map(String::as_str))
    }
}

impl std::fmt::Debug for SecretEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretEntry")
            .field("group", &self.group)
            .field("title", &self.title)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .field("attachments", &self.attachments.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

/// Accept numbers and booleans for property values (`Port = 2222`).
fn scalar_map<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<String, Scalar>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                Scalar::Text(s) => s,
                Scalar::Integer(i) => i.to_string(),
                Scalar::Float(x) => x.to_string(),
                Scalar::Bool(b) => b.to_string(),
            };
            (key, text)
        })
        .collect())
}
