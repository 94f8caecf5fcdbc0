//! Application settings loaded via OrthoConfig.
//!
//! Each group has its own environment prefix (`ICARE_`, `FACEBOOK_`, `MAP_`,
//! `ITINERARIES_`, `JOBS_`). Missing values fall back to the defaults below,
//! which describe a deployment centred on Italy.

use std::ffi::OsString;
use std::str::FromStr;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

use crate::domain::{GeoBounds, GeoValidationError, LatLng};

const PROGRAM_NAME: &str = "icare";
const DEFAULT_APP_NAME: &str = "Icare";
const DEFAULT_REPOSITORY_URL: &str = "http://github.com/diowa/icare";
const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_CURRENCY: &str = ".00 Rs";
const DEFAULT_FUEL_CONSUMPTION: f64 = 10.0;
const DEFAULT_FUEL_CURRENCY: &str = "Rs";
const DEFAULT_USER_IMAGE_PLACEHOLDER: &str =
    "https://fbstatic-a.akamaihd.net/rsrc.php/v2/yo/r/UlIqmHJn-SK.gif";
const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.facebook.com/v19.0/";
const DEFAULT_DIALOG_URL: &str = "https://www.facebook.com/v19.0/dialog/oauth";
const DEFAULT_MAP_CENTER: &str = "41.87194, 12.567379999999957";
const DEFAULT_MAP_ZOOM: u8 = 8;
const DEFAULT_MAP_BOUNDS_SW: &str = "35.49292010, 6.62672010";
const DEFAULT_MAP_BOUNDS_NE: &str = "47.0920, 18.52050150";
const DEFAULT_ITINERARY_BOUNDS_SW: &str = "40.69205729999999, 13.850980400000026";
const DEFAULT_ITINERARY_BOUNDS_NE: &str = "40.7615088, 13.966879699999936";
const DEFAULT_QUEUE_CAPACITY: usize = 128;

/// Errors raised while loading or interpreting settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to load {group} settings: {message}")]
    Load { group: &'static str, message: String },
    #[error("invalid {key}: {source}")]
    Geo {
        key: &'static str,
        #[source]
        source: GeoValidationError,
    },
    #[error("invalid {key}: {message}")]
    Url { key: &'static str, message: String },
}

fn load_group<T: OrthoConfig>(group: &'static str) -> Result<T, SettingsError> {
    T::load_from_iter([OsString::from(PROGRAM_NAME)]).map_err(|err| SettingsError::Load {
        group,
        message: err.to_string(),
    })
}

fn parse_point(key: &'static str, value: &str) -> Result<LatLng, SettingsError> {
    LatLng::from_str(value).map_err(|source| SettingsError::Geo { key, source })
}

fn parse_bounds(
    key: &'static str,
    sw: &str,
    ne: &str,
) -> Result<GeoBounds, SettingsError> {
    let sw = parse_point(key, sw)?;
    let ne = parse_point(key, ne)?;
    GeoBounds::new(sw, ne).map_err(|source| SettingsError::Geo { key, source })
}

fn parse_url(key: &'static str, value: &str) -> Result<Url, SettingsError> {
    Url::parse(value).map_err(|err| SettingsError::Url {
        key,
        message: err.to_string(),
    })
}

/// General application settings (`ICARE_*`).
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ICARE")]
pub struct AppSettings {
    pub app_name: Option<String>,
    pub repository_url: Option<String>,
    /// Public origin used to build OAuth redirect URIs.
    pub base_url: Option<String>,
    #[ortho_config(default = false)]
    pub demo_mode: bool,
    /// Lets clients show sponsored content.
    #[ortho_config(default = false)]
    pub advertising: bool,
    pub currency: Option<String>,
    /// Litres per 100 km used by clients to suggest a fuel cost.
    pub fuel_consumption: Option<f64>,
    pub fuel_currency: Option<String>,
    pub user_image_placeholder: Option<String>,
}

impl AppSettings {
    pub fn app_name(&self) -> &str {
        self.app_name.as_deref().unwrap_or(DEFAULT_APP_NAME)
    }

    pub fn repository_url(&self) -> &str {
        self.repository_url
            .as_deref()
            .unwrap_or(DEFAULT_REPOSITORY_URL)
    }

    pub fn base_url(&self) -> Result<Url, SettingsError> {
        parse_url(
            "ICARE_BASE_URL",
            self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
        )
    }

    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }

    pub fn fuel_consumption(&self) -> f64 {
        self.fuel_consumption.unwrap_or(DEFAULT_FUEL_CONSUMPTION)
    }

    pub fn fuel_currency(&self) -> &str {
        self.fuel_currency
            .as_deref()
            .unwrap_or(DEFAULT_FUEL_CURRENCY)
    }

    pub fn user_image_placeholder(&self) -> &str {
        self.user_image_placeholder
            .as_deref()
            .unwrap_or(DEFAULT_USER_IMAGE_PLACEHOLDER)
    }
}

/// Facebook application credentials (`FACEBOOK_*`).
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "FACEBOOK")]
pub struct FacebookSettings {
    pub app_id: Option<String>,
    pub secret: Option<String>,
    pub namespace: Option<String>,
    /// Overrides the callback derived from `ICARE_BASE_URL`.
    pub callback_url: Option<String>,
    pub graph_base_url: Option<String>,
    pub dialog_url: Option<String>,
}

/// Credentials and endpoints for the Graph API adapter.
#[derive(Debug, Clone)]
pub struct FacebookCredentials {
    pub app_id: String,
    pub secret: String,
    pub callback_url: Url,
    pub graph_base_url: Url,
    pub dialog_url: Url,
}

impl FacebookSettings {
    /// Resolve credentials; `None` when the app id or secret is missing.
    pub fn credentials(&self, base_url: &Url) -> Result<Option<FacebookCredentials>, SettingsError> {
        let (Some(app_id), Some(secret)) = (self.app_id.clone(), self.secret.clone()) else {
            return Ok(None);
        };
        let callback_url = match self.callback_url.as_deref() {
            Some(raw) => parse_url("FACEBOOK_CALLBACK_URL", raw)?,
            None => base_url
                .join(CALLBACK_PATH)
                .map_err(|err| SettingsError::Url {
                    key: "ICARE_BASE_URL",
                    message: err.to_string(),
                })?,
        };
        Ok(Some(FacebookCredentials {
            app_id,
            secret,
            callback_url,
            graph_base_url: parse_url(
                "FACEBOOK_GRAPH_BASE_URL",
                self.graph_base_url
                    .as_deref()
                    .unwrap_or(DEFAULT_GRAPH_BASE_URL),
            )?,
            dialog_url: parse_url(
                "FACEBOOK_DIALOG_URL",
                self.dialog_url.as_deref().unwrap_or(DEFAULT_DIALOG_URL),
            )?,
        }))
    }
}

/// Path of the OAuth callback, relative to the public origin.
pub const CALLBACK_PATH: &str = "/api/v1/users/auth/facebook/callback";

/// Map display settings (`MAP_*`).
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MAP")]
pub struct MapSettings {
    /// `"lat, lng"` of the initial map centre.
    pub center: Option<String>,
    pub zoom: Option<u8>,
    pub bounds_sw: Option<String>,
    pub bounds_ne: Option<String>,
}

impl MapSettings {
    pub fn center(&self) -> Result<LatLng, SettingsError> {
        parse_point(
            "MAP_CENTER",
            self.center.as_deref().unwrap_or(DEFAULT_MAP_CENTER),
        )
    }

    pub fn zoom(&self) -> u8 {
        self.zoom.unwrap_or(DEFAULT_MAP_ZOOM)
    }

    pub fn bounds(&self) -> Result<GeoBounds, SettingsError> {
        parse_bounds(
            "MAP_BOUNDS",
            self.bounds_sw.as_deref().unwrap_or(DEFAULT_MAP_BOUNDS_SW),
            self.bounds_ne.as_deref().unwrap_or(DEFAULT_MAP_BOUNDS_NE),
        )
    }
}

/// Itinerary publication settings (`ITINERARIES_*`).
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ITINERARIES")]
pub struct ItinerarySettings {
    /// Confine new itineraries to `bounds`.
    #[ortho_config(default = false)]
    pub geo_restricted: bool,
    pub bounds_sw: Option<String>,
    pub bounds_ne: Option<String>,
}

impl ItinerarySettings {
    pub fn bounds(&self) -> Result<GeoBounds, SettingsError> {
        parse_bounds(
            "ITINERARIES_BOUNDS",
            self.bounds_sw
                .as_deref()
                .unwrap_or(DEFAULT_ITINERARY_BOUNDS_SW),
            self.bounds_ne
                .as_deref()
                .unwrap_or(DEFAULT_ITINERARY_BOUNDS_NE),
        )
    }

    /// Bounds to enforce, or `None` when the restriction is disabled.
    pub fn restriction(&self) -> Result<Option<GeoBounds>, SettingsError> {
        if self.geo_restricted {
            self.bounds().map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Background job settings (`JOBS_*`).
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "JOBS")]
pub struct JobSettings {
    pub queue_capacity: Option<usize>,
}

impl JobSettings {
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
            .filter(|capacity| *capacity > 0)
            .unwrap_or(DEFAULT_QUEUE_CAPACITY)
    }
}

/// Full settings tree.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub app: AppSettings,
    pub facebook: FacebookSettings,
    pub map: MapSettings,
    pub itineraries: ItinerarySettings,
    pub jobs: JobSettings,
}

impl Settings {
    /// Load every group from the environment and configuration files.
    pub fn load() -> Result<Self, SettingsError> {
        Ok(Self {
            app: load_group("application")?,
            facebook: load_group("facebook")?,
            map: load_group("map")?,
            itineraries: load_group("itineraries")?,
            jobs: load_group("jobs")?,
        })
    }

    /// Settings safe to hand to clients. Secrets are never included.
    pub fn public(&self) -> Result<PublicSettings, SettingsError> {
        let map_bounds = self.map.bounds()?;
        Ok(PublicSettings {
            app_name: self.app.app_name().to_owned(),
            repository_url: self.app.repository_url().to_owned(),
            demo_mode: self.app.demo_mode,
            advertising: self.app.advertising,
            currency: self.app.currency().to_owned(),
            fuel_consumption: self.app.fuel_consumption(),
            fuel_currency: self.app.fuel_currency().to_owned(),
            user_image_placeholder: self.app.user_image_placeholder().to_owned(),
            map: PublicMapSettings {
                center: self.map.center()?,
                zoom: self.map.zoom(),
                bounds: map_bounds,
            },
            itineraries: PublicItinerarySettings {
                geo_restricted: self.itineraries.geo_restricted,
                bounds: self.itineraries.bounds()?,
            },
        })
    }
}

/// Client-facing map configuration.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicMapSettings {
    pub center: LatLng,
    pub zoom: u8,
    pub bounds: GeoBounds,
}

/// Client-facing itinerary configuration.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicItinerarySettings {
    pub geo_restricted: bool,
    pub bounds: GeoBounds,
}

/// Public subset of [`Settings`] served at `/api/v1/settings`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicSettings {
    pub app_name: String,
    pub repository_url: String,
    pub demo_mode: bool,
    pub advertising: bool,
    pub currency: String,
    pub fuel_consumption: f64,
    pub fuel_currency: String,
    pub user_image_placeholder: String,
    pub map: PublicMapSettings,
    pub itineraries: PublicItinerarySettings,
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;

    use env_lock::lock_env;
    use rstest::rstest;

    #[rstest]
    fn defaults_describe_italy() {
        let settings = Settings::default();
        let public = settings.public().expect("defaults are valid");
        assert_eq!(public.app_name, "Icare");
        assert_eq!(public.map.zoom, 8);
        assert!((public.map.center.lat() - 41.87194).abs() < 1e-9);
        assert!(!public.itineraries.geo_restricted);
        assert!(!public.advertising);
        assert_eq!(settings.itineraries.restriction().expect("valid"), None);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("ICARE_APP_NAME", Some("Carpool".to_owned())),
            ("ICARE_ADVERTISING", Some("true".to_owned())),
            ("ITINERARIES_GEO_RESTRICTED", Some("true".to_owned())),
            ("MAP_ZOOM", Some("11".to_owned())),
            ("JOBS_QUEUE_CAPACITY", Some("16".to_owned())),
        ]);

        let settings = Settings::load().expect("settings load");
        assert_eq!(settings.app.app_name(), "Carpool");
        assert!(settings.public().expect("valid").advertising);
        assert_eq!(settings.map.zoom(), 11);
        assert_eq!(settings.jobs.queue_capacity(), 16);
        let restriction = settings
            .itineraries
            .restriction()
            .expect("valid bounds")
            .expect("restriction enabled");
        let ischia = LatLng::new(40.73, 13.9).expect("point");
        assert!(restriction.contains(&ischia));
    }

    #[rstest]
    fn malformed_points_are_reported() {
        let map = MapSettings {
            center: Some("north of Rome".to_owned()),
            ..MapSettings::default()
        };
        let error = map.center().expect_err("malformed");
        assert!(error.to_string().contains("MAP_CENTER"));
    }

    #[rstest]
    fn facebook_credentials_require_id_and_secret() {
        let base = Url::parse("https://icare.example").expect("url");
        let partial = FacebookSettings {
            app_id: Some("1234".to_owned()),
            ..FacebookSettings::default()
        };
        assert!(partial.credentials(&base).expect("valid").is_none());

        let complete = FacebookSettings {
            app_id: Some("1234".to_owned()),
            secret: Some("shh".to_owned()),
            ..FacebookSettings::default()
        };
        let credentials = complete
            .credentials(&base)
            .expect("valid")
            .expect("complete");
        assert_eq!(
            credentials.callback_url.as_str(),
            "https://icare.example/api/v1/users/auth/facebook/callback"
        );
    }
}
