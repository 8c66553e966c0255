/*
 * Responsibility
 * - The field set exchanged during the SSO handshake (SsoPayload)
 * - Mapping between typed fields and wire key/value pairs
 * - Keys not known here are kept in `additional_fields` untouched
 * - Flags that are neither "true" nor "false" are kept there too, verbatim
 */
use std::collections::BTreeMap;

use serde::Serialize;

use crate::services::sso::error::EncodeError;

/// Wire prefix for host-defined custom fields (`custom.<key>`).
pub const CUSTOM_PREFIX: &str = "custom.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SsoPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_background_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_background_url: Option<String>,
    // Wire name `about_me`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_sso_url: Option<String>,
    // Comma separated group names, passed through as sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_groups: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_groups: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderator: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_force_update: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_activation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppress_welcome_message: Option<bool>,

    pub custom_fields: BTreeMap<String, String>,
    pub additional_fields: BTreeMap<String, String>,
}

const STRING_FIELDS: &[&str] = &[
    "nonce",
    "email",
    "username",
    "name",
    "external_id",
    "avatar_url",
    "profile_background_url",
    "card_background_url",
    "about_me",
    "title",
    "website",
    "location",
    "return_sso_url",
    "groups",
    "add_groups",
    "remove_groups",
];

const BOOL_FIELDS: &[&str] = &[
    "admin",
    "moderator",
    "avatar_force_update",
    "require_activation",
    "suppress_welcome_message",
];

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

impl SsoPayload {
    fn string_field(&self, key: &str) -> Option<&String> {
        match key {
            "nonce" => self.nonce.as_ref(),
            "email" => self.email.as_ref(),
            "username" => self.username.as_ref(),
            "name" => self.name.as_ref(),
            "external_id" => self.external_id.as_ref(),
            "avatar_url" => self.avatar_url.as_ref(),
            "profile_background_url" => self.profile_background_url.as_ref(),
            "card_background_url" => self.card_background_url.as_ref(),
            "about_me" => self.bio.as_ref(),
            "title" => self.title.as_ref(),
            "website" => self.website.as_ref(),
            "location" => self.location.as_ref(),
            "return_sso_url" => self.return_sso_url.as_ref(),
            "groups" => self.groups.as_ref(),
            "add_groups" => self.add_groups.as_ref(),
            "remove_groups" => self.remove_groups.as_ref(),
            _ => None,
        }
    }

    fn string_field_mut(&mut self, key: &str) -> Option<&mut Option<String>> {
        Some(match key {
            "nonce" => &mut self.nonce,
            "email" => &mut self.email,
            "username" => &mut self.username,
            "name" => &mut self.name,
            "external_id" => &mut self.external_id,
            "avatar_url" => &mut self.avatar_url,
            "profile_background_url" => &mut self.profile_background_url,
            "card_background_url" => &mut self.card_background_url,
            "about_me" => &mut self.bio,
            "title" => &mut self.title,
            "website" => &mut self.website,
            "location" => &mut self.location,
            "return_sso_url" => &mut self.return_sso_url,
            "groups" => &mut self.groups,
            "add_groups" => &mut self.add_groups,
            "remove_groups" => &mut self.remove_groups,
            _ => return None,
        })
    }

    fn bool_field(&self, key: &str) -> Option<bool> {
        match key {
            "admin" => self.admin,
            "moderator" => self.moderator,
            "avatar_force_update" => self.avatar_force_update,
            "require_activation" => self.require_activation,
            "suppress_welcome_message" => self.suppress_welcome_message,
            _ => None,
        }
    }

    fn bool_field_mut(&mut self, key: &str) -> Option<&mut Option<bool>> {
        Some(match key {
            "admin" => &mut self.admin,
            "moderator" => &mut self.moderator,
            "avatar_force_update" => &mut self.avatar_force_update,
            "require_activation" => &mut self.require_activation,
            "suppress_welcome_message" => &mut self.suppress_welcome_message,
            _ => return None,
        })
    }

    /// Whether an `additional_fields` entry would decode back somewhere else.
    fn shadows_typed_field(&self, key: &str, value: &str) -> bool {
        if key.starts_with(CUSTOM_PREFIX) || STRING_FIELDS.contains(&key) {
            return true;
        }
        // A raw flag may ride along only while the typed flag is unset and
        // the raw value does not parse as one.
        BOOL_FIELDS.contains(&key)
            && (self.bool_field(key).is_some() || parse_flag(value).is_some())
    }

    /// Flatten into wire pairs: typed fields (fixed order), `custom.*`, then the rest.
    pub fn to_pairs(&self) -> Result<Vec<(String, String)>, EncodeError> {
        let mut pairs = Vec::new();

        for key in STRING_FIELDS {
            if let Some(value) = self.string_field(key) {
                pairs.push((key.to_string(), value.clone()));
            }
        }

        for key in BOOL_FIELDS {
            if let Some(value) = self.bool_field(key) {
                pairs.push((key.to_string(), value.to_string()));
            }
        }

        for (key, value) in &self.custom_fields {
            pairs.push((format!("{CUSTOM_PREFIX}{key}"), value.clone()));
        }

        for (key, value) in &self.additional_fields {
            if self.shadows_typed_field(key, value) {
                return Err(EncodeError::ReservedField(key.clone()));
            }
            pairs.push((key.clone(), value.clone()));
        }

        Ok(pairs)
    }

    /// Route one decoded wire pair to its field.
    pub fn insert_pair(&mut self, key: String, value: String) {
        if let Some(custom_key) = key.strip_prefix(CUSTOM_PREFIX) {
            self.custom_fields.insert(custom_key.to_string(), value);
        } else if let Some(slot) = self.string_field_mut(&key) {
            *slot = Some(value);
        } else if let (Some(slot), Some(flag)) = (self.bool_field_mut(&key), parse_flag(&value)) {
            *slot = Some(flag);
        } else {
            self.additional_fields.insert(key, value);
        }
    }
}
