//! DTOs for decoding Graph API responses.
//!
//! Responses decode into these transport shapes first and are then mapped to
//! domain values in one pass.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::ProviderLike;

#[derive(Debug, Deserialize)]
pub(super) struct TokenDto {
    pub(super) access_token: String,
    /// Seconds until expiry; absent for long-lived tokens.
    pub(super) expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProfileDto {
    pub(super) id: String,
    pub(super) name: String,
    pub(super) email: Option<String>,
    pub(super) gender: Option<String>,
    pub(super) locale: Option<String>,
    /// `MM/DD/YYYY`, `MM/DD` or `YYYY` depending on what the user shares.
    pub(super) birthday: Option<String>,
    pub(super) link: Option<String>,
}

impl ProfileDto {
    /// Full birthdays only; partial dates are dropped.
    pub(super) fn birthday(&self) -> Option<NaiveDate> {
        self.birthday
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw, "%m/%d/%Y").ok())
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct FriendsDto {
    pub(super) summary: Option<FriendsSummaryDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FriendsSummaryDto {
    pub(super) total_count: u32,
}

#[derive(Debug, Deserialize)]
pub(super) struct LikesDto {
    #[serde(default)]
    pub(super) data: Vec<LikeDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LikeDto {
    pub(super) id: String,
    pub(super) name: String,
}

impl From<LikeDto> for ProviderLike {
    fn from(value: LikeDto) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

/// Error envelope returned by the Graph API on non-2xx responses.
#[derive(Debug, Deserialize)]
pub(super) struct GraphErrorDto {
    pub(super) error: GraphErrorBodyDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct GraphErrorBodyDto {
    pub(super) message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("08/31/1990"), NaiveDate::from_ymd_opt(1990, 8, 31))]
    #[case(Some("08/31"), None)]
    #[case(Some("1990"), None)]
    #[case(None, None)]
    fn only_full_birthdays_are_kept(
        #[case] raw: Option<&str>,
        #[case] expected: Option<NaiveDate>,
    ) {
        let profile = ProfileDto {
            id: "1".to_owned(),
            name: "Grace".to_owned(),
            email: None,
            gender: None,
            locale: None,
            birthday: raw.map(str::to_owned),
            link: None,
        };
        assert_eq!(profile.birthday(), expected);
    }

    #[rstest]
    fn likes_default_to_empty() {
        let likes: LikesDto = serde_json::from_str("{}").expect("decode");
        assert!(likes.data.is_empty());
    }
}
