//! Static registry of field types.
//!
//! Each field type maps to a display name, a validator, a converter for stored
//! values and the keyword clients use to refer to it.

use std::sync::LazyLock;

use parley_shared::types::UserId;
use serde_json::Value;

use super::error::ProfileFieldError;
use super::types::{ProfileFieldType, RealmUserIndex};
use super::validators::{
    check_date, check_long_string, check_short_string, check_url, check_valid_user_ids,
    validate_select_field,
};

/// Validator that only needs the value.
pub type PlainValidator = fn(&str, &Value) -> Result<(), ProfileFieldError>;

/// Validator that also needs the field's `field_data`.
pub type ConfigValidator = fn(&str, &str, &Value) -> Result<(), ProfileFieldError>;

/// Validator that checks the value against the realm's users.
pub type RealmScopedValidator =
    fn(&RealmUserIndex, &Value, bool) -> Result<Vec<UserId>, ProfileFieldError>;

/// Validator attached to a field type.
#[derive(Debug, Clone, Copy)]
pub enum FieldValidator {
    /// `(var_name, value)`.
    Plain(PlainValidator),
    /// `(field name, field_data, value)`.
    WithConfig(ConfigValidator),
    /// `(realm users, value, allow_deactivated)`.
    RealmScoped(RealmScopedValidator),
}

/// How a stored value string is turned back into JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueConverter {
    /// The stored string is the value.
    Text,
    /// The stored string is a JSON list.
    JsonList,
}

impl ValueConverter {
    /// Converts a stored value.
    pub fn convert(self, raw: &str) -> Result<Value, ProfileFieldError> {
        match self {
            Self::Text => Ok(Value::String(raw.to_string())),
            Self::JsonList => serde_json::from_str(raw)
                .map_err(|e| ProfileFieldError::repository(format!("corrupt stored value: {e}"))),
        }
    }
}

/// Registry entry for one field type.
#[derive(Debug)]
pub struct FieldTypeEntry {
    /// The field type.
    pub field_type: ProfileFieldType,
    /// Human-readable name.
    pub display_name: &'static str,
    /// Value validator.
    pub validator: FieldValidator,
    /// Stored value converter.
    pub converter: ValueConverter,
    /// Symbolic keyword.
    pub keyword: &'static str,
}

static SHORT_TEXT: FieldTypeEntry = FieldTypeEntry {
    field_type: ProfileFieldType::ShortText,
    display_name: "Text (short)",
    validator: FieldValidator::Plain(check_short_string),
    converter: ValueConverter::Text,
    keyword: "SHORT_TEXT",
};

static LONG_TEXT: FieldTypeEntry = FieldTypeEntry {
    field_type: ProfileFieldType::LongText,
    display_name: "Text (long)",
    validator: FieldValidator::Plain(check_long_string),
    converter: ValueConverter::Text,
    keyword: "LONG_TEXT",
};

static SELECT: FieldTypeEntry = FieldTypeEntry {
    field_type: ProfileFieldType::Select,
    display_name: "List of options",
    validator: FieldValidator::WithConfig(validate_select_field),
    converter: ValueConverter::Text,
    keyword: "SELECT",
};

static DATE: FieldTypeEntry = FieldTypeEntry {
    field_type: ProfileFieldType::Date,
    display_name: "Date",
    validator: FieldValidator::Plain(check_date),
    converter: ValueConverter::Text,
    keyword: "DATE",
};

static URL: FieldTypeEntry = FieldTypeEntry {
    field_type: ProfileFieldType::Url,
    display_name: "Link",
    validator: FieldValidator::Plain(check_url),
    converter: ValueConverter::Text,
    keyword: "URL",
};

static USER: FieldTypeEntry = FieldTypeEntry {
    field_type: ProfileFieldType::User,
    display_name: "Users",
    validator: FieldValidator::RealmScoped(check_valid_user_ids),
    converter: ValueConverter::JsonList,
    keyword: "USER",
};

static EXTERNAL_ACCOUNT: FieldTypeEntry = FieldTypeEntry {
    field_type: ProfileFieldType::ExternalAccount,
    display_name: "External account",
    validator: FieldValidator::Plain(check_short_string),
    converter: ValueConverter::Text,
    keyword: "EXTERNAL_ACCOUNT",
};

static PRONOUNS: FieldTypeEntry = FieldTypeEntry {
    field_type: ProfileFieldType::Pronouns,
    display_name: "Pronouns",
    validator: FieldValidator::Plain(check_short_string),
    converter: ValueConverter::Text,
    keyword: "PRONOUNS",
};

/// Every entry, sorted by display name.
pub static ALL_FIELD_TYPES: LazyLock<Vec<&'static FieldTypeEntry>> = LazyLock::new(|| {
    let mut entries: Vec<_> = ProfileFieldType::ALL.into_iter().map(ProfileFieldType::entry).collect();
    entries.sort_by_key(|entry| entry.display_name);
    entries
});

impl ProfileFieldType {
    /// Registry entry for this type.
    #[must_use]
    pub fn entry(self) -> &'static FieldTypeEntry {
        match self {
            Self::ShortText => &SHORT_TEXT,
            Self::LongText => &LONG_TEXT,
            Self::Select => &SELECT,
            Self::Date => &DATE,
            Self::Url => &URL,
            Self::User => &USER,
            Self::ExternalAccount => &EXTERNAL_ACCOUNT,
            Self::Pronouns => &PRONOUNS,
        }
    }

    /// Looks a type up by keyword, e.g. `"SHORT_TEXT"`.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field_type| field_type.entry().keyword == keyword)
    }
}

/// `(type, display name)` pairs in display-name order.
#[must_use]
pub fn field_type_choices() -> Vec<(ProfileFieldType, &'static str)> {
    ALL_FIELD_TYPES
        .iter()
        .map(|entry| (entry.field_type, entry.display_name))
        .collect()
}
