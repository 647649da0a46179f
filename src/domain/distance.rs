//! Great-circle distance using the Haversine formula
//! (<https://en.wikipedia.org/wiki/Haversine_formula>).
//!
//! Every composition step (unit conversion, differences, products, sums) runs on
//! `Decimal`. Only the transcendental functions go through `f64`, each one inside its
//! own helper below, and their results are converted straight back.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::coordinate::Coordinate;

pub const EARTH_RADIUS_KM: i64 = 6371;

const HALF_TURN_DEGREES: i64 = 180;

/// Decimal places used when a distance is reported or compared externally.
pub const DISTANCE_PRECISION: u32 = 3;

/// Distance in kilometers between two coordinates.
pub fn distance(from: &Coordinate, to: &Coordinate) -> Decimal {
    let two = Decimal::TWO;

    let latitude1 = to_radians(from.latitude());
    let longitude1 = to_radians(from.longitude());
    let latitude2 = to_radians(to.latitude());
    let longitude2 = to_radians(to.longitude());

    let latitude_diff = latitude2 - latitude1;
    let longitude_diff = longitude2 - longitude1;

    let half_latitude_sin = decimal_sin(latitude_diff / two);
    let half_longitude_sin = decimal_sin(longitude_diff / two);

    let a = half_latitude_sin * half_latitude_sin
        + decimal_cos(latitude1) * decimal_cos(latitude2) * half_longitude_sin * half_longitude_sin;
    let a = a.clamp(Decimal::ZERO, Decimal::ONE);

    let central_angle = decimal_atan2(decimal_sqrt(a), decimal_sqrt(Decimal::ONE - a)) * two;

    central_angle * Decimal::from(EARTH_RADIUS_KM)
}

/// Rounds a distance to [`DISTANCE_PRECISION`] places, half away from zero.
pub fn round_distance(distance: Decimal) -> Decimal {
    distance.round_dp_with_strategy(DISTANCE_PRECISION, RoundingStrategy::MidpointAwayFromZero)
}

fn to_radians(degrees: Decimal) -> Decimal {
    // deliberately `deg / 180 * PI` rather than `deg * PI / 180`: dividing first keeps the
    // product in range for any parsable input, results differ only near the 28th digit
    degrees / Decimal::from(HALF_TURN_DEGREES) * Decimal::PI
}

fn decimal_sin(value: Decimal) -> Decimal {
    from_f64(to_f64(value).sin())
}

fn decimal_cos(value: Decimal) -> Decimal {
    from_f64(to_f64(value).cos())
}

fn decimal_sqrt(value: Decimal) -> Decimal {
    from_f64(to_f64(value).sqrt())
}

fn decimal_atan2(y: Decimal, x: Decimal) -> Decimal {
    from_f64(to_f64(y).atan2(to_f64(x)))
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

// Inputs reaching the helpers are finite and the sqrt argument is clamped, so NaN never shows up here.
fn from_f64(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}
