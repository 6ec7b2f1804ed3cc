//! Value validators for custom profile fields.
//!
//! Every validator takes the name to report in error messages first and the
//! submitted JSON value last.

use chrono::NaiveDate;
use parley_shared::types::UserId;
use serde_json::{Map, Value};
use validator::ValidateUrl;

use super::error::ProfileFieldError;
use super::types::{ProfileFieldType, RealmUserIndex};

/// Maximum length of a short text value.
pub const SHORT_STRING_MAX_LENGTH: usize = 50;

/// Maximum length of a long text value.
pub const LONG_STRING_MAX_LENGTH: usize = 500;

const URL_SCHEMES: [&str; 4] = ["http", "https", "ftp", "ftps"];

const USERNAME_PLACEHOLDER: &str = "%(username)s";

const EXTERNAL_ACCOUNT_SUBTYPES: [&str; 3] = ["github", "twitter", "custom"];

/// Requires a JSON string.
pub fn check_string<'a>(var_name: &str, value: &'a Value) -> Result<&'a str, ProfileFieldError> {
    value
        .as_str()
        .ok_or_else(|| ProfileFieldError::validation(format!("{var_name} is not a string")))
}

/// Requires a string of at most `max_length` characters.
pub fn check_capped_string(
    max_length: usize,
    var_name: &str,
    value: &Value,
) -> Result<(), ProfileFieldError> {
    let s = check_string(var_name, value)?;
    if s.chars().count() > max_length {
        return Err(ProfileFieldError::validation(format!(
            "{var_name} is too long (limit: {max_length} characters)"
        )));
    }
    Ok(())
}

/// Short text, also used for external accounts and pronouns.
pub fn check_short_string(var_name: &str, value: &Value) -> Result<(), ProfileFieldError> {
    check_capped_string(SHORT_STRING_MAX_LENGTH, var_name, value)
}

/// Long text.
pub fn check_long_string(var_name: &str, value: &Value) -> Result<(), ProfileFieldError> {
    check_capped_string(LONG_STRING_MAX_LENGTH, var_name, value)
}

/// A real calendar date written exactly as `YYYY-MM-DD`.
pub fn check_date(var_name: &str, value: &Value) -> Result<(), ProfileFieldError> {
    let s = check_string(var_name, value)?;
    let not_a_date = || ProfileFieldError::validation(format!("{var_name} is not a date"));
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| not_a_date())?;
    if date.format("%Y-%m-%d").to_string() != s {
        return Err(not_a_date());
    }
    Ok(())
}

/// An absolute http, https, ftp or ftps URL with a host.
pub fn check_url(var_name: &str, value: &Value) -> Result<(), ProfileFieldError> {
    let s = check_string(var_name, value)?;
    if s.validate_url() && has_allowed_scheme_and_host(s) {
        Ok(())
    } else {
        Err(ProfileFieldError::validation(format!(
            "{var_name} is not a URL"
        )))
    }
}

fn has_allowed_scheme_and_host(url: &str) -> bool {
    let Some((scheme, rest)) = url.split_once("://") else {
        return false;
    };
    if !URL_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) {
        return false;
    }
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_and_port = authority.rsplit('@').next().unwrap_or_default();
    let host = if host_and_port.starts_with('[') {
        host_and_port.split(']').next().unwrap_or_default()
    } else {
        host_and_port.split(':').next().unwrap_or_default()
    };
    !host.is_empty()
}

/// The value must be one of the option keys stored in `field_data`.
///
/// `var_name` is the field's name.
pub fn validate_select_field(
    var_name: &str,
    field_data: &str,
    value: &Value,
) -> Result<(), ProfileFieldError> {
    let choice = check_string(var_name, value)?;
    let options: Map<String, Value> = serde_json::from_str(field_data).unwrap_or_default();
    if !options.contains_key(choice) {
        return Err(ProfileFieldError::validation(format!(
            "'{choice}' is not a valid choice for '{var_name}'."
        )));
    }
    Ok(())
}

/// Parses a JSON list of user IDs.
pub fn parse_user_ids(value: &Value) -> Result<Vec<UserId>, ProfileFieldError> {
    let items = value
        .as_array()
        .ok_or_else(|| ProfileFieldError::validation("User IDs is not a list"))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str()
                .and_then(|s| s.parse::<UserId>().ok())
                .ok_or_else(|| {
                    ProfileFieldError::validation(format!("User IDs[{i}] is not a user ID"))
                })
        })
        .collect()
}

/// Each listed user must exist in the realm, be active unless
/// `allow_deactivated`, and not be a bot.
///
/// Returns the IDs in the order they were given.
pub fn check_valid_user_ids(
    realm_users: &RealmUserIndex,
    value: &Value,
    allow_deactivated: bool,
) -> Result<Vec<UserId>, ProfileFieldError> {
    let user_ids = parse_user_ids(value)?;
    for &user_id in &user_ids {
        let user = realm_users.get(user_id).ok_or_else(|| {
            ProfileFieldError::validation(format!("Invalid user ID: {user_id}"))
        })?;
        if !allow_deactivated && !user.is_active {
            return Err(ProfileFieldError::validation(format!(
                "User with ID {user_id} is deactivated"
            )));
        }
        if user.is_bot {
            return Err(ProfileFieldError::validation(format!(
                "User with ID {user_id} is a bot"
            )));
        }
    }
    Ok(user_ids)
}

/// Checks the type-specific configuration of a new field.
pub fn validate_field_data(
    field_type: ProfileFieldType,
    field_data: &str,
) -> Result<(), ProfileFieldError> {
    match field_type {
        ProfileFieldType::Select => validate_select_options(field_data),
        ProfileFieldType::ExternalAccount => validate_external_account(field_data),
        _ if field_data.trim().is_empty() => Ok(()),
        _ => Err(ProfileFieldError::validation(
            "Field data is not supported for this field type",
        )),
    }
}

fn parse_field_data(field_data: &str) -> Result<Map<String, Value>, ProfileFieldError> {
    serde_json::from_str(field_data)
        .map_err(|_| ProfileFieldError::validation("field_data is not a dict"))
}

fn validate_select_options(field_data: &str) -> Result<(), ProfileFieldError> {
    let options = parse_field_data(field_data)?;
    if options.is_empty() {
        return Err(ProfileFieldError::validation(
            "Field must have at least one choice.",
        ));
    }

    let mut seen = Vec::with_capacity(options.len());
    for (key, option) in &options {
        let text = option.get("text").and_then(Value::as_str).ok_or_else(|| {
            ProfileFieldError::validation(format!("field_data[\"{key}\"][\"text\"] is not a string"))
        })?;
        if option.get("order").and_then(Value::as_str).is_none() {
            return Err(ProfileFieldError::validation(format!(
                "field_data[\"{key}\"][\"order\"] is not a string"
            )));
        }
        if text.is_empty() {
            return Err(ProfileFieldError::validation(format!(
                "field_data[\"{key}\"][\"text\"] cannot be blank."
            )));
        }
        if seen.contains(&text) {
            return Err(ProfileFieldError::validation(
                "Field must not have duplicate choices.",
            ));
        }
        seen.push(text);
    }
    Ok(())
}

fn validate_external_account(field_data: &str) -> Result<(), ProfileFieldError> {
    let data = parse_field_data(field_data)?;
    let subtype = data
        .get("subtype")
        .and_then(Value::as_str)
        .ok_or_else(|| ProfileFieldError::validation("Subtype is required"))?;
    if !EXTERNAL_ACCOUNT_SUBTYPES.contains(&subtype) {
        return Err(ProfileFieldError::validation("Invalid external account type"));
    }
    if subtype != "custom" {
        return Ok(());
    }

    let pattern = data
        .get("url_pattern")
        .and_then(Value::as_str)
        .ok_or_else(|| ProfileFieldError::validation("Custom external account must define URL pattern"))?;
    if pattern.matches(USERNAME_PLACEHOLDER).count() != 1 {
        return Err(ProfileFieldError::validation(
            "URL pattern must contain '%(username)s'.",
        ));
    }
    check_url("URL pattern", &Value::String(pattern.replace(USERNAME_PLACEHOLDER, "username")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile_field::types::RealmUser;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("2024-02-29", true)]
    #[case("1999-12-31", true)]
    #[case("2023-02-29", false)]
    #[case("2024-13-01", false)]
    #[case("2024-1-5", false)]
    #[case("05/01/2024", false)]
    #[case("", false)]
    fn test_check_date(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(check_date("Birthday", &json!(input)).is_ok(), ok);
    }

    #[rstest]
    #[case("https://example.com", true)]
    #[case("http://example.com/path?q=1#frag", true)]
    #[case("ftp://files.example.com/pub", true)]
    #[case("https://user@example.com:8443/", true)]
    #[case("javascript:alert(1)", false)]
    #[case("mailto:someone@example.com", false)]
    #[case("example.com", false)]
    #[case("not a url", false)]
    fn test_check_url(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(check_url("Website", &json!(input)).is_ok(), ok);
    }

    #[test]
    fn test_non_string_is_rejected() {
        let err = check_short_string("Phone", &json!(42)).unwrap_err();
        assert_eq!(err.to_string(), "Phone is not a string");
    }

    #[test]
    fn test_capped_string_counts_characters() {
        let fifty_accents = "é".repeat(50);
        assert!(check_short_string("Name", &json!(fifty_accents)).is_ok());
        let err = check_short_string("Name", &json!("x".repeat(51))).unwrap_err();
        assert_eq!(err.to_string(), "Name is too long (limit: 50 characters)");
        assert!(check_long_string("Bio", &json!("x".repeat(500))).is_ok());
        assert!(check_long_string("Bio", &json!("x".repeat(501))).is_err());
    }

    #[test]
    fn test_select_value_must_be_option_key() {
        let field_data = r#"{"0": {"text": "Vim", "order": "1"}, "1": {"text": "Emacs", "order": "2"}}"#;
        assert!(validate_select_field("Editor", field_data, &json!("1")).is_ok());
        let err = validate_select_field("Editor", field_data, &json!("Vim")).unwrap_err();
        assert_eq!(err.to_string(), "'Vim' is not a valid choice for 'Editor'.");
    }

    fn user(is_active: bool, is_bot: bool) -> RealmUser {
        RealmUser {
            id: UserId::new(),
            is_active,
            is_bot,
        }
    }

    #[test]
    fn test_user_ids_returned_unchanged() {
        let (a, b) = (user(true, false), user(true, false));
        let index: RealmUserIndex = [a, b].into_iter().collect();
        let value = json!([b.id.to_string(), a.id.to_string()]);
        assert_eq!(
            check_valid_user_ids(&index, &value, false).unwrap(),
            vec![b.id, a.id]
        );
    }

    #[test]
    fn test_unknown_user_is_rejected() {
        let stranger = UserId::new();
        let err = check_valid_user_ids(
            &RealmUserIndex::default(),
            &json!([stranger.to_string()]),
            false,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), format!("Invalid user ID: {stranger}"));
    }

    #[test]
    fn test_deactivated_user_depends_on_flag() {
        let gone = user(false, false);
        let index: RealmUserIndex = [gone].into_iter().collect();
        let value = json!([gone.id.to_string()]);

        let err = check_valid_user_ids(&index, &value, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("User with ID {} is deactivated", gone.id)
        );
        assert_eq!(check_valid_user_ids(&index, &value, true).unwrap(), vec![gone.id]);
    }

    #[test]
    fn test_bot_is_always_rejected() {
        let bot = user(true, true);
        let index: RealmUserIndex = [bot].into_iter().collect();
        let value = json!([bot.id.to_string()]);
        for allow_deactivated in [false, true] {
            let err = check_valid_user_ids(&index, &value, allow_deactivated).unwrap_err();
            assert_eq!(err.to_string(), format!("User with ID {} is a bot", bot.id));
        }
    }

    #[rstest]
    #[case(json!("not-a-list"), "User IDs is not a list")]
    #[case(json!([1, 2]), "User IDs[0] is not a user ID")]
    #[case(json!(["nope"]), "User IDs[0] is not a user ID")]
    fn test_parse_user_ids_rejects_malformed(#[case] value: Value, #[case] message: &str) {
        assert_eq!(parse_user_ids(&value).unwrap_err().to_string(), message);
    }

    #[rstest]
    #[case(ProfileFieldType::ShortText, "", true)]
    #[case(ProfileFieldType::Date, "{\"a\": 1}", false)]
    #[case(ProfileFieldType::Select, "{}", false)]
    #[case(ProfileFieldType::Select, "[]", false)]
    #[case(ProfileFieldType::Select, r#"{"0": {"text": "A", "order": "1"}}"#, true)]
    #[case(ProfileFieldType::Select, r#"{"0": {"text": "A"}}"#, false)]
    #[case(
        ProfileFieldType::Select,
        r#"{"0": {"text": "A", "order": "1"}, "1": {"text": "A", "order": "2"}}"#,
        false
    )]
    #[case(ProfileFieldType::ExternalAccount, r#"{"subtype": "github"}"#, true)]
    #[case(ProfileFieldType::ExternalAccount, r#"{"subtype": "myspace"}"#, false)]
    #[case(ProfileFieldType::ExternalAccount, r#"{"subtype": "custom"}"#, false)]
    #[case(
        ProfileFieldType::ExternalAccount,
        r#"{"subtype": "custom", "url_pattern": "https://git.example.com/%(username)s"}"#,
        true
    )]
    #[case(
        ProfileFieldType::ExternalAccount,
        r#"{"subtype": "custom", "url_pattern": "https://git.example.com/u"}"#,
        false
    )]
    #[case(
        ProfileFieldType::ExternalAccount,
        r#"{"subtype": "custom", "url_pattern": "https://x.com/%(username)s/%(username)s"}"#,
        false
    )]
    fn test_validate_field_data(
        #[case] field_type: ProfileFieldType,
        #[case] field_data: &str,
        #[case] ok: bool,
    ) {
        assert_eq!(validate_field_data(field_type, field_data).is_ok(), ok);
    }
}
