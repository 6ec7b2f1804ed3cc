//! Property-based tests for the field validators.

use proptest::prelude::*;
use serde_json::{Value, json};

use crate::profile_field::registry::{FieldValidator, PlainValidator};
use crate::profile_field::types::ProfileFieldType;
use crate::profile_field::validators::{check_date, check_long_string, check_short_string};

fn plain(field_type: ProfileFieldType) -> PlainValidator {
    match field_type.entry().validator {
        FieldValidator::Plain(validate) => validate,
        _ => panic!("{field_type} has no plain validator"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Short strings are accepted exactly up to 50 characters.
    #[test]
    fn prop_short_string_length_boundary(s in "\\PC{0,80}") {
        let ok = s.chars().count() <= 50;
        prop_assert_eq!(check_short_string("Field", &json!(s)).is_ok(), ok);
    }

    /// Long strings are accepted exactly up to 500 characters.
    #[test]
    fn prop_long_string_length_boundary(len in 0usize..700) {
        let s = "a".repeat(len);
        prop_assert_eq!(check_long_string("Field", &json!(s)).is_ok(), len <= 500);
    }

    /// Every valid calendar date in canonical form is accepted.
    #[test]
    fn prop_valid_dates_accepted(year in 1000i32..9999, ordinal in 1u32..=365) {
        let date = chrono::NaiveDate::from_yo_opt(year, ordinal).unwrap();
        let formatted = date.format("%Y-%m-%d").to_string();
        prop_assert!(check_date("Date", &json!(formatted)).is_ok());
    }

    /// Non-string values are rejected by every plain validator.
    #[test]
    fn prop_non_strings_rejected(n in any::<i64>(), b in any::<bool>()) {
        for field_type in [
            ProfileFieldType::ShortText,
            ProfileFieldType::LongText,
            ProfileFieldType::Date,
            ProfileFieldType::Url,
            ProfileFieldType::ExternalAccount,
            ProfileFieldType::Pronouns,
        ] {
            let validate = plain(field_type);
            prop_assert!(validate("Field", &json!(n)).is_err());
            prop_assert!(validate("Field", &json!(b)).is_err());
            prop_assert!(validate("Field", &Value::Null).is_err());
        }
    }
}
