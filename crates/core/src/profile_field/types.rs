//! Custom profile field domain types.

use std::collections::HashMap;
use std::fmt;

use parley_shared::types::{ProfileFieldId, RealmId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum length of a field name, in characters.
pub const NAME_MAX_LENGTH: usize = 40;

/// Maximum length of a field hint, in characters.
pub const HINT_MAX_LENGTH: usize = 80;

/// How many fields of a realm may be shown in profile summaries.
pub const MAX_DISPLAY_IN_PROFILE_SUMMARY_FIELDS: u64 = 2;

/// Type of a custom profile field.
///
/// The numeric values are stored in the database and exposed over the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
#[repr(i16)]
pub enum ProfileFieldType {
    /// Single-line text, up to 50 characters.
    ShortText = 1,
    /// Multi-line text, up to 500 characters.
    LongText = 2,
    /// One choice out of the options in `field_data`.
    Select = 3,
    /// Calendar date, `YYYY-MM-DD`.
    Date = 4,
    /// Absolute link.
    Url = 5,
    /// List of users of the same realm.
    User = 6,
    /// Account name on an external service.
    ExternalAccount = 7,
    /// Preferred pronouns.
    Pronouns = 8,
}

impl ProfileFieldType {
    /// All field types in declaration order.
    pub const ALL: [Self; 8] = [
        Self::ShortText,
        Self::LongText,
        Self::Select,
        Self::Date,
        Self::Url,
        Self::User,
        Self::ExternalAccount,
        Self::Pronouns,
    ];

    /// Converts a stored numeric type.
    #[must_use]
    pub const fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::ShortText),
            2 => Some(Self::LongText),
            3 => Some(Self::Select),
            4 => Some(Self::Date),
            5 => Some(Self::Url),
            6 => Some(Self::User),
            7 => Some(Self::ExternalAccount),
            8 => Some(Self::Pronouns),
            _ => None,
        }
    }

    /// Numeric representation.
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        self as i16
    }

    /// Whether values of this type are rendered as markdown.
    #[must_use]
    pub const fn is_renderable(self) -> bool {
        matches!(self, Self::ShortText | Self::LongText)
    }
}

impl TryFrom<i16> for ProfileFieldType {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::from_i16(value).ok_or_else(|| format!("Invalid field type: {value}"))
    }
}

impl From<ProfileFieldType> for i16 {
    fn from(value: ProfileFieldType) -> Self {
        value.as_i16()
    }
}

impl fmt::Display for ProfileFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entry().keyword)
    }
}

/// A field definition belonging to a realm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomProfileField {
    /// Field ID.
    pub id: ProfileFieldId,
    /// Owning realm.
    pub realm_id: RealmId,
    /// Display name, unique within the realm.
    pub name: String,
    /// Help text shown next to the input.
    pub hint: String,
    /// Sort position.
    pub order: i32,
    /// Whether the field shows up in profile summaries.
    pub display_in_profile_summary: bool,
    /// Field type.
    pub field_type: ProfileFieldType,
    /// Type-specific JSON configuration; empty when the type needs none.
    pub field_data: String,
}

impl CustomProfileField {
    /// Whether values of this field are rendered as markdown.
    #[must_use]
    pub const fn is_renderable(&self) -> bool {
        self.field_type.is_renderable()
    }

    /// API representation.
    #[must_use]
    pub fn as_dict(&self) -> ProfileFieldDict {
        ProfileFieldDict {
            id: self.id,
            name: self.name.clone(),
            field_type: self.field_type,
            hint: self.hint.clone(),
            field_data: self.field_data.clone(),
            order: self.order,
            display_in_profile_summary: self.display_in_profile_summary.then_some(true),
        }
    }
}

/// Serialized field definition.
///
/// `display_in_profile_summary` is only present when set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFieldDict {
    /// Field ID.
    pub id: ProfileFieldId,
    /// Display name.
    pub name: String,
    /// Field type.
    #[serde(rename = "type")]
    pub field_type: ProfileFieldType,
    /// Help text.
    pub hint: String,
    /// Type-specific configuration.
    pub field_data: String,
    /// Sort position.
    pub order: i32,
    /// Present and `true` for summary fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_in_profile_summary: Option<bool>,
}

/// Input for creating a field definition.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProfileFieldInput {
    /// Display name.
    pub name: String,
    /// Help text.
    #[serde(default)]
    pub hint: String,
    /// Field type.
    pub field_type: ProfileFieldType,
    /// Type-specific configuration.
    #[serde(default)]
    pub field_data: String,
    /// Whether the field shows up in profile summaries.
    #[serde(default)]
    pub display_in_profile_summary: bool,
}

/// Field definition ready to be stored, with its position assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfileField {
    /// Owning realm.
    pub realm_id: RealmId,
    /// Display name.
    pub name: String,
    /// Help text.
    pub hint: String,
    /// Sort position.
    pub order: i32,
    /// Whether the field shows up in profile summaries.
    pub display_in_profile_summary: bool,
    /// Field type.
    pub field_type: ProfileFieldType,
    /// Type-specific configuration.
    pub field_data: String,
}

/// One user's stored value for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFieldValue {
    /// User the value belongs to.
    pub user_id: UserId,
    /// Field the value belongs to.
    pub field_id: ProfileFieldId,
    /// Raw value; USER fields hold a JSON list.
    pub value: String,
    /// Sanitized HTML, only for renderable fields.
    pub rendered_value: Option<String>,
}

/// A `{id, value}` pair submitted by a user.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileDataUpdate {
    /// Field ID.
    pub id: ProfileFieldId,
    /// New value, shaped according to the field type.
    pub value: Value,
}

/// A value as returned to clients, converted according to its field type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileDataEntry {
    /// Field ID.
    pub id: ProfileFieldId,
    /// Converted value.
    pub value: Value,
    /// Rendered HTML when the field is renderable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendered_value: Option<String>,
}

/// The parts of a user the USER field validator looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealmUser {
    /// User ID.
    pub id: UserId,
    /// Whether the account is active.
    pub is_active: bool,
    /// Whether the account is a bot.
    pub is_bot: bool,
}

/// Users of one realm, keyed by ID.
#[derive(Debug, Clone, Default)]
pub struct RealmUserIndex {
    users: HashMap<UserId, RealmUser>,
}

impl RealmUserIndex {
    /// Looks up a user.
    #[must_use]
    pub fn get(&self, id: UserId) -> Option<&RealmUser> {
        self.users.get(&id)
    }

    /// Number of indexed users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl FromIterator<RealmUser> for RealmUserIndex {
    fn from_iter<I: IntoIterator<Item = RealmUser>>(iter: I) -> Self {
        Self {
            users: iter.into_iter().map(|user| (user.id, user)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(display_in_profile_summary: bool) -> CustomProfileField {
        CustomProfileField {
            id: ProfileFieldId::new(),
            realm_id: RealmId::new(),
            name: "Phone".to_string(),
            hint: "Work phone".to_string(),
            order: 3,
            display_in_profile_summary,
            field_type: ProfileFieldType::ShortText,
            field_data: String::new(),
        }
    }

    #[test]
    fn test_field_type_numeric_roundtrip() {
        for field_type in ProfileFieldType::ALL {
            assert_eq!(
                ProfileFieldType::from_i16(field_type.as_i16()),
                Some(field_type)
            );
        }
        assert_eq!(ProfileFieldType::from_i16(0), None);
        assert_eq!(ProfileFieldType::from_i16(9), None);
    }

    #[test]
    fn test_field_type_serializes_as_number() {
        let json = serde_json::to_value(ProfileFieldType::Pronouns).unwrap();
        assert_eq!(json, serde_json::json!(8));
        let parsed: ProfileFieldType = serde_json::from_value(serde_json::json!(3)).unwrap();
        assert_eq!(parsed, ProfileFieldType::Select);
        assert!(serde_json::from_value::<ProfileFieldType>(serde_json::json!(42)).is_err());
    }

    #[test]
    fn test_only_text_types_are_renderable() {
        let renderable: Vec<_> = ProfileFieldType::ALL
            .into_iter()
            .filter(|t| t.is_renderable())
            .collect();
        assert_eq!(
            renderable,
            vec![ProfileFieldType::ShortText, ProfileFieldType::LongText]
        );
    }

    #[test]
    fn test_as_dict_omits_summary_flag_when_unset() {
        let json = serde_json::to_value(field(false).as_dict()).unwrap();
        assert_eq!(json["name"], "Phone");
        assert_eq!(json["type"], 1);
        assert_eq!(json["order"], 3);
        assert!(json.get("display_in_profile_summary").is_none());
    }

    #[test]
    fn test_as_dict_includes_summary_flag_when_set() {
        let json = serde_json::to_value(field(true).as_dict()).unwrap();
        assert_eq!(json["display_in_profile_summary"], true);
    }

    #[test]
    fn test_realm_user_index_lookup() {
        let active = RealmUser {
            id: UserId::new(),
            is_active: true,
            is_bot: false,
        };
        let index: RealmUserIndex = [active].into_iter().collect();
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(active.id), Some(&active));
        assert!(index.get(UserId::new()).is_none());
    }
}
