use crate::domain::error::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;

static RELATION_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9]{15}$|^[a-zA-Z0-9]{18}$").expect("RELATION_ID_REGEX should compile")
});

/// Returns the candidate unchanged when it has the shape of a record id
/// (exactly 15 or 18 ASCII alphanumerics), `None` otherwise.
///
/// Never fails: a malformed id is treated as "no relation". Callers that
/// need to warn the user compare the result with their input.
pub fn validate_relation_id(candidate: Option<&str>) -> Option<String> {
    candidate
        .filter(|value| RELATION_ID_REGEX.is_match(value))
        .map(ToOwned::to_owned)
}

/// Strict form of [`validate_relation_id`] for values the user typed.
pub fn parse_relation_id(candidate: &str) -> Result<String, ValidationError> {
    if RELATION_ID_REGEX.is_match(candidate) {
        Ok(candidate.to_string())
    } else {
        Err(ValidationError::InvalidRelationId(candidate.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_fifteen_and_eighteen_character_ids() {
        assert_eq!(
            validate_relation_id(Some("001A000001abcde")),
            Some("001A000001abcde".to_string())
        );
        assert_eq!(
            validate_relation_id(Some("003A000001abcdeFGH")),
            Some("003A000001abcdeFGH".to_string())
        );
    }

    #[test]
    fn rejects_wrong_length_symbols_and_empty() {
        assert_eq!(validate_relation_id(Some("abc")), None);
        assert_eq!(validate_relation_id(Some("001A000001abcd")), None);
        assert_eq!(validate_relation_id(Some("001A000001abcde-GH")), None);
        assert_eq!(validate_relation_id(Some("001A000001abcde ")), None);
        assert_eq!(validate_relation_id(Some("")), None);
        assert_eq!(validate_relation_id(None), None);
    }

    #[test]
    fn rejects_non_ascii_alphanumerics() {
        assert_eq!(validate_relation_id(Some("가나다라마바사아자차카타파하가")), None);
    }

    #[test]
    fn parse_reports_the_rejected_value() {
        assert_eq!(
            parse_relation_id("001A000001abcde"),
            Ok("001A000001abcde".to_string())
        );
        let error = parse_relation_id("abc").expect_err("too short");
        assert_eq!(error, ValidationError::InvalidRelationId("abc".to_string()));
        assert!(error.to_string().contains("'abc'"));
    }

    proptest! {
        #[test]
        fn valid_shapes_are_returned_unchanged(candidate in "[a-zA-Z0-9]{15}|[a-zA-Z0-9]{18}") {
            prop_assert_eq!(validate_relation_id(Some(&candidate)), Some(candidate.clone()));
        }

        #[test]
        fn other_lengths_are_discarded(candidate in "[a-zA-Z0-9]{0,30}") {
            prop_assume!(candidate.len() != 15 && candidate.len() != 18);
            prop_assert_eq!(validate_relation_id(Some(&candidate)), None);
        }

        #[test]
        fn validation_is_idempotent(candidate in "\\PC{0,20}") {
            let once = validate_relation_id(Some(&candidate));
            let twice = validate_relation_id(once.as_deref());
            prop_assert_eq!(once, twice);
        }
    }
}
