//! Geographic primitives used by itineraries and map settings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Mean Earth radius in kilometres used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Validation errors for coordinates and bounding boxes.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoValidationError {
    LatitudeOutOfRange { value: f64 },
    LongitudeOutOfRange { value: f64 },
    NonFinite,
    Malformed { input: String },
    InvertedBounds,
}

impl fmt::Display for GeoValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LatitudeOutOfRange { value } => {
                write!(f, "latitude {value} must be between -90 and 90")
            }
            Self::LongitudeOutOfRange { value } => {
                write!(f, "longitude {value} must be between -180 and 180")
            }
            Self::NonFinite => write!(f, "coordinates must be finite numbers"),
            Self::Malformed { input } => {
                write!(f, "expected \"lat, lng\" but received {input:?}")
            }
            Self::InvertedBounds => {
                write!(f, "south-west corner must lie south of the north-east corner")
            }
        }
    }
}

impl std::error::Error for GeoValidationError {}

/// WGS84 coordinate pair.
///
/// # Examples
/// ```
/// use icare::domain::LatLng;
///
/// let rome: LatLng = "41.9028, 12.4964".parse().expect("valid coordinates");
/// assert_eq!(rome.lat(), 41.9028);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "LatLngDto", into = "LatLngDto")]
pub struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Serialize, Deserialize)]
struct LatLngDto {
    lat: f64,
    lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeoValidationError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(GeoValidationError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(GeoValidationError::LatitudeOutOfRange { value: lat });
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(GeoValidationError::LongitudeOutOfRange { value: lng });
        }
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Great-circle distance in kilometres.
    pub fn distance_km(&self, other: &LatLng) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }

    /// Smallest box holding every point within `radius_km` of `self`.
    ///
    /// The longitude span widens with latitude and covers the whole circle
    /// once the radius reaches a pole. The box wraps the antimeridian when
    /// needed, following [`GeoBounds::contains`].
    pub fn bounds_within(&self, radius_km: f64) -> GeoBounds {
        let angular = (radius_km.max(0.0) / EARTH_RADIUS_KM).min(std::f64::consts::PI);
        let lat = self.lat.to_radians();
        let south = (lat - angular).to_degrees();
        let north = (lat + angular).to_degrees();
        let sin_ratio = angular.sin() / lat.cos();
        let (west, east) = if south <= -90.0 || north >= 90.0 || sin_ratio >= 1.0 {
            (-180.0, 180.0)
        } else {
            let span = sin_ratio.asin().to_degrees();
            (wrap_lng(self.lng - span), wrap_lng(self.lng + span))
        };
        GeoBounds {
            sw: LatLng {
                lat: south.max(-90.0),
                lng: west,
            },
            ne: LatLng {
                lat: north.min(90.0),
                lng: east,
            },
        }
    }
}

fn wrap_lng(lng: f64) -> f64 {
    if lng < -180.0 {
        lng + 360.0
    } else if lng > 180.0 {
        lng - 360.0
    } else {
        lng
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lat, self.lng)
    }
}

impl FromStr for LatLng {
    type Err = GeoValidationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let malformed = || GeoValidationError::Malformed {
            input: input.to_owned(),
        };
        let (lat, lng) = input.split_once(',').ok_or_else(malformed)?;
        let lat = lat.trim().parse::<f64>().map_err(|_| malformed())?;
        let lng = lng.trim().parse::<f64>().map_err(|_| malformed())?;
        Self::new(lat, lng)
    }
}

impl TryFrom<LatLngDto> for LatLng {
    type Error = GeoValidationError;

    fn try_from(value: LatLngDto) -> Result<Self, Self::Error> {
        Self::new(value.lat, value.lng)
    }
}

impl From<LatLng> for LatLngDto {
    fn from(value: LatLng) -> Self {
        Self {
            lat: value.lat,
            lng: value.lng,
        }
    }
}

/// Axis-aligned bounding box given by its south-west and north-east corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct GeoBounds {
    sw: LatLng,
    ne: LatLng,
}

impl GeoBounds {
    pub fn new(sw: LatLng, ne: LatLng) -> Result<Self, GeoValidationError> {
        if sw.lat > ne.lat {
            return Err(GeoValidationError::InvertedBounds);
        }
        Ok(Self { sw, ne })
    }

    pub fn sw(&self) -> LatLng {
        self.sw
    }

    pub fn ne(&self) -> LatLng {
        self.ne
    }

    /// Whether `point` lies inside the box, edges included.
    ///
    /// Boxes whose west edge is east of the east edge wrap the antimeridian.
    pub fn contains(&self, point: &LatLng) -> bool {
        let within_lat = (self.sw.lat..=self.ne.lat).contains(&point.lat);
        let within_lng = if self.sw.lng <= self.ne.lng {
            (self.sw.lng..=self.ne.lng).contains(&point.lng)
        } else {
            point.lng >= self.sw.lng || point.lng <= self.ne.lng
        };
        within_lat && within_lng
    }
}
