//! Domain values used across suites.

use chrono::Duration;

use super::clock::fixture_timestamp;
use crate::domain::{
    AccessToken, AuthProvider, DisplayName, Itinerary, ItineraryDraft, ItineraryId, LatLng,
    OAuthIdentity, Place, ProviderCredentials, ProviderUid, UserId,
};

fn place(address: &str, lat: f64, lng: f64) -> Place {
    match LatLng::new(lat, lng) {
        Ok(location) => Place {
            address: address.to_owned(),
            location,
        },
        Err(err) => panic!("fixture coordinates: {err}"),
    }
}

/// Ischia to Naples ride leaving two days after [`fixture_timestamp`].
pub fn itinerary_driven_by(driver: &UserId) -> Itinerary {
    let now = fixture_timestamp();
    let draft = ItineraryDraft {
        id: ItineraryId::random(),
        driver_id: driver.clone(),
        title: "Ischia to Naples".to_owned(),
        description: "Morning ferry, room for luggage".to_owned(),
        start: place("Ischia Porto", 40.7369, 13.9488),
        end: place("Napoli Beverello", 40.8377, 14.2551),
        leave_date: now + Duration::days(2),
        round_trip: false,
        return_date: None,
        daily: false,
        num_people: 3,
        fuel_cost: 0,
        tolls: 0,
        smoking_allowed: false,
        pets_allowed: false,
        pink: false,
        created_at: now,
        updated_at: now,
    };
    match Itinerary::restore(draft) {
        Ok(itinerary) => itinerary,
        Err(err) => panic!("fixture itinerary: {err}"),
    }
}

/// Facebook identity as the provider would report it.
pub fn facebook_identity(uid: &str, name: &str) -> OAuthIdentity {
    let (Ok(uid), Ok(name)) = (ProviderUid::new(uid), DisplayName::new(name)) else {
        panic!("fixture identity");
    };
    OAuthIdentity {
        provider: AuthProvider::Facebook,
        uid,
        name,
        email: None,
        image: None,
        gender: None,
        locale: None,
        birthday: None,
        link: None,
        credentials: ProviderCredentials {
            token: AccessToken::new("fixture-token"),
            expires_at: None,
        },
    }
}
