//! Tests for the domain user model.

use super::*;
use crate::domain::auth::ProviderCredentials;
use chrono::{Duration, TimeZone};
use rstest::{fixture, rstest};

const VALID_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5)
        .single()
        .expect("valid timestamp")
}

#[fixture]
fn identity() -> OAuthIdentity {
    OAuthIdentity {
        provider: AuthProvider::Facebook,
        uid: ProviderUid::new("123456").expect("uid"),
        name: DisplayName::new("Ada Lovelace").expect("name"),
        email: Some("ada@example.com".to_owned()),
        image: Some("https://graph.facebook.com/123456/picture".to_owned()),
        gender: Some("female".to_owned()),
        locale: Some("en_GB".to_owned()),
        birthday: NaiveDate::from_ymd_opt(1815, 12, 10),
        link: None,
        credentials: ProviderCredentials {
            token: AccessToken::new("token-1"),
            expires_at: Some(now() + Duration::days(60)),
        },
    }
}

#[rstest]
#[case("", UserValidationError::EmptyId)]
#[case("not-a-uuid", UserValidationError::InvalidId)]
#[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", UserValidationError::InvalidId)]
fn invalid_ids_are_rejected(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(UserId::new(raw), Err(expected));
}

#[rstest]
fn user_id_serialises_as_string() {
    let id = UserId::new(VALID_ID).expect("valid id");
    let value = serde_json::to_value(&id).expect("serialise");
    assert_eq!(value, serde_json::json!(VALID_ID));
}

#[rstest]
#[case("", UserValidationError::EmptyDisplayName)]
#[case("   ", UserValidationError::EmptyDisplayName)]
fn blank_display_names_are_rejected(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(DisplayName::new(raw), Err(expected));
}

#[rstest]
fn display_names_accept_any_script_up_to_the_limit() {
    assert!(DisplayName::new("Zoë Ñandú 王").is_ok());
    let long = "x".repeat(DISPLAY_NAME_MAX + 1);
    assert_eq!(
        DisplayName::new(long),
        Err(UserValidationError::DisplayNameTooLong {
            max: DISPLAY_NAME_MAX
        })
    );
}

#[rstest]
fn new_users_mirror_the_identity(identity: OAuthIdentity) {
    let user = User::from_identity(&identity, now());
    assert_eq!(user.uid().as_ref(), "123456");
    assert_eq!(user.display_name().as_ref(), "Ada Lovelace");
    assert_eq!(user.profile().email.as_deref(), Some("ada@example.com"));
    assert!(!user.is_admin());
    assert!(!user.is_banned());
    assert_eq!(user.provider_data().cached_at, None);
    assert_eq!(user.created_at(), now());
}

#[rstest]
fn sign_in_refreshes_profile_and_token(identity: OAuthIdentity) {
    let mut user = User::from_identity(&identity, now());
    let original_id = user.id().clone();

    let mut refreshed = identity.clone();
    refreshed.name = DisplayName::new("Augusta Ada King").expect("name");
    refreshed.credentials.token = AccessToken::new("token-2");
    let later = now() + Duration::hours(1);
    user.update_info_from_identity(&refreshed, later);

    assert_eq!(user.id(), &original_id);
    assert_eq!(user.display_name().as_ref(), "Augusta Ada King");
    assert_eq!(user.access_token().map(AccessToken::expose), Some("token-2"));
    assert_eq!(user.updated_at(), later);
    assert_eq!(user.created_at(), now());
}

#[rstest]
fn expired_tokens_are_not_usable(identity: OAuthIdentity) {
    let user = User::from_identity(&identity, now());
    assert!(user.usable_access_token(now()).is_some());
    assert!(user.usable_access_token(now() + Duration::days(61)).is_none());
}

#[rstest]
fn provider_data_is_cached_with_timestamp(identity: OAuthIdentity) {
    let mut user = User::from_identity(&identity, now());
    user.cache_provider_data(
        ProviderData {
            friends_count: 42,
            likes: vec![ProviderLike {
                id: "1".to_owned(),
                name: "Carpooling".to_owned(),
            }],
        },
        now(),
    );
    let cache = user.provider_data();
    assert_eq!(cache.friends_count, Some(42));
    assert_eq!(cache.likes.len(), 1);
    assert_eq!(cache.cached_at, Some(now()));
}

#[rstest]
fn banning_and_promoting_touch_updated_at(identity: OAuthIdentity) {
    let mut user = User::from_identity(&identity, now());
    let later = now() + Duration::hours(1);

    user.set_banned(true, later);
    assert!(user.is_banned());
    user.promote_to_admin(later);
    assert!(user.is_admin());
    assert_eq!(user.updated_at(), later);

    user.set_banned(false, later);
    assert!(!user.is_banned());
}
