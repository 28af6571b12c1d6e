//! Tests for the domain user model.

use super::*;
use chrono::TimeZone;
use rstest::{fixture, rstest};

#[fixture]
fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

#[rstest]
#[case(1)]
#[case(i64::MAX)]
fn user_id_accepts_positive_values(#[case] raw: i64) {
    let id = UserId::new(raw).expect("positive id");
    assert_eq!(i64::from(id), raw);
}

#[rstest]
#[case(0)]
#[case(-5)]
fn user_id_rejects_non_positive_values(#[case] raw: i64) {
    assert_eq!(UserId::new(raw), Err(UserValidationError::InvalidId));
}

#[rstest]
#[case("12", Ok(12))]
#[case(" 7 ", Ok(7))]
#[case("abc", Err(UserValidationError::InvalidId))]
#[case("-3", Err(UserValidationError::InvalidId))]
#[case("1.5", Err(UserValidationError::InvalidId))]
fn user_id_parses_path_segments(
    #[case] raw: &str,
    #[case] expected: Result<i64, UserValidationError>,
) {
    assert_eq!(raw.parse::<UserId>().map(UserId::get), expected);
}

#[rstest]
fn user_id_deserialises_through_validation() {
    assert!(serde_json::from_str::<UserId>("0").is_err());
    let id: UserId = serde_json::from_str("9").expect("valid id");
    assert_eq!(id.get(), 9);
}

#[rstest]
#[case("   ", UsernamePolicy::Create, UserValidationError::EmptyUsername)]
#[case("ab", UsernamePolicy::Create, UserValidationError::UsernameTooShort { min: 3 })]
#[case(
    &"a".repeat(51),
    UsernamePolicy::Create,
    UserValidationError::UsernameTooLong { max: 50 }
)]
#[case(
    &"a".repeat(21),
    UsernamePolicy::Update,
    UserValidationError::UsernameTooLong { max: 20 }
)]
fn username_rejects_invalid_input(
    #[case] raw: &str,
    #[case] policy: UsernamePolicy,
    #[case] expected: UserValidationError,
) {
    assert_eq!(Username::new(raw, policy), Err(expected));
}

#[rstest]
fn username_limits_depend_on_policy() {
    let name = "a".repeat(30);
    assert!(Username::new(name.clone(), UsernamePolicy::Create).is_ok());
    assert!(Username::new(name, UsernamePolicy::Update).is_err());
}

#[rstest]
fn username_counts_characters_not_bytes() {
    let name = "é".repeat(20);
    let username = Username::new(name.clone(), UsernamePolicy::Update).expect("20 characters");
    assert_eq!(username.as_str(), name);
}

#[rstest]
fn username_validation_messages_match_clients() {
    assert_eq!(
        UserValidationError::EmptyUsername.to_string(),
        "The name field is required"
    );
    assert_eq!(
        UserValidationError::UsernameTooShort { min: 3 }.to_string(),
        "Name must be at least 3 characters long"
    );
    assert_eq!(
        UserValidationError::UsernameTooLong { max: 20 }.to_string(),
        "Name must be at most 20 characters long"
    );
}

#[rstest]
#[case("Ada@Example.COM", "ada@example.com")]
#[case("  grace.hopper+navy@mail.example.org ", "grace.hopper+navy@mail.example.org")]
fn email_is_normalised(#[case] raw: &str, #[case] expected: &str) {
    let email = EmailAddress::new(raw).expect("valid email");
    assert_eq!(email.as_str(), expected);
}

#[rstest]
#[case("", UserValidationError::EmptyEmail)]
#[case("   ", UserValidationError::EmptyEmail)]
#[case("not-an-email", UserValidationError::InvalidEmail)]
#[case("missing@tld", UserValidationError::InvalidEmail)]
#[case("two@@example.com", UserValidationError::InvalidEmail)]
fn email_rejects_invalid_input(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(EmailAddress::new(raw), Err(expected));
}

#[rstest]
fn password_rejects_empty_input() {
    assert!(matches!(
        Password::new(""),
        Err(UserValidationError::EmptyPassword)
    ));
}

#[rstest]
fn password_debug_is_redacted() {
    let password = Password::new("s3cret").expect("non-empty");
    assert_eq!(format!("{password:?}"), "Password(***)");
}

#[rstest]
#[case(UserValidationError::UsernameTooLong { max: 50 }, "username", "too_long")]
#[case(UserValidationError::EmptyEmail, "email", "required")]
#[case(UserValidationError::InvalidEmail, "email", "invalid_format")]
#[case(UserValidationError::EmptyPassword, "password", "required")]
fn validation_errors_name_their_field(
    #[case] error: UserValidationError,
    #[case] field: &str,
    #[case] reason: &str,
) {
    assert_eq!(error.field(), field);
    assert_eq!(error.reason(), reason);
}

#[rstest]
fn user_exposes_components(created_at: DateTime<Utc>) {
    let user = User::new(
        UserId::new(3).expect("valid id"),
        Username::new("ada", UsernamePolicy::Create).expect("valid username"),
        EmailAddress::new("ada@example.com").expect("valid email"),
        created_at,
        created_at,
    );
    assert_eq!(user.id().get(), 3);
    assert_eq!(user.username().as_str(), "ada");
    assert_eq!(user.email().as_str(), "ada@example.com");
    assert_eq!(user.created_at(), user.updated_at());
}

#[rstest]
fn empty_changes_are_detected() {
    assert!(UserChanges::default().is_empty());
    let changes = UserChanges {
        email: Some(EmailAddress::new("x@example.com").expect("valid email")),
        ..UserChanges::default()
    };
    assert!(!changes.is_empty());
}
