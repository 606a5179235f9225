//! Location value object and its protobuf wire form.
//!
//! A [`Location`] is recorded wherever a sighting or place is logged. The
//! [`LocationCodec`] maps it to and from [`WireLocation`], the message used for
//! persistence and transport:
//!
//! ```text
//! message Location {
//!   double latitude      = 1;
//!   double longitude     = 2;
//!   string name          = 3;
//!   string specific_name = 4;
//!   string general_name  = 5;
//! }
//! ```
//!
//! The field mapping never validates or rewrites values. Coordinates are raw
//! `f64`s; use [`Location::is_within_bounds`] where a range check is wanted.

use prost::Message;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Valid latitude range in degrees.
pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;

/// Valid longitude range in degrees.
pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// A place where a sighting was recorded.
///
/// Immutable: the `with_*` helpers return a modified copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Human label, empty when not named.
    #[serde(default)]
    pub name: String,
    /// Most specific place name (e.g. a pond).
    #[serde(default)]
    pub specific_name: String,
    /// Broader place name (e.g. a wetland or region).
    #[serde(default)]
    pub general_name: String,
}

impl Location {
    /// Create an unnamed location at the given coordinates.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            ..Self::default()
        }
    }

    /// Copy with a different human label.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Copy with a different specific name.
    #[must_use]
    pub fn with_specific_name(mut self, specific_name: impl Into<String>) -> Self {
        self.specific_name = specific_name.into();
        self
    }

    /// Copy with a different general name.
    #[must_use]
    pub fn with_general_name(mut self, general_name: impl Into<String>) -> Self {
        self.general_name = general_name.into();
        self
    }

    /// Whether both coordinates fall inside their geographic ranges.
    ///
    /// `NaN` is never in range.
    #[must_use]
    pub fn is_within_bounds(&self) -> bool {
        LATITUDE_RANGE.contains(&self.latitude) && LONGITUDE_RANGE.contains(&self.longitude)
    }

    /// Reject coordinates outside [`LATITUDE_RANGE`] / [`LONGITUDE_RANGE`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::CoordinatesOutOfRange`] if [`Self::is_within_bounds`] is false.
    pub fn check_bounds(&self) -> Result<()> {
        if self.is_within_bounds() {
            Ok(())
        } else {
            Err(Error::CoordinatesOutOfRange {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)?;
        let labels: Vec<&str> = [&self.name, &self.specific_name, &self.general_name]
            .into_iter()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect();
        if !labels.is_empty() {
            write!(f, " {}", labels.join(" / "))?;
        }
        Ok(())
    }
}

/// Protobuf message for a [`Location`].
#[derive(Clone, PartialEq, Message)]
pub struct WireLocation {
    /// Latitude in degrees.
    #[prost(double, tag = "1")]
    pub latitude: f64,
    /// Longitude in degrees.
    #[prost(double, tag = "2")]
    pub longitude: f64,
    /// Human label.
    #[prost(string, tag = "3")]
    pub name: String,
    /// Most specific place name.
    #[prost(string, tag = "4")]
    pub specific_name: String,
    /// Broader place name.
    #[prost(string, tag = "5")]
    pub general_name: String,
}

/// Converts between [`Location`] and [`WireLocation`].
///
/// Stateless; pass an instance explicitly to whatever persists locations.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationCodec;

impl LocationCodec {
    /// Create a codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Value reported when nothing has been stored yet.
    #[must_use]
    pub fn default_value(&self) -> Location {
        Location::default()
    }

    /// Map a location onto its wire message.
    #[must_use]
    pub fn encode(&self, location: &Location) -> WireLocation {
        WireLocation {
            latitude: location.latitude,
            longitude: location.longitude,
            name: location.name.clone(),
            specific_name: location.specific_name.clone(),
            general_name: location.general_name.clone(),
        }
    }

    /// Map a wire message back to a location. Unset fields read as `0.0` / `""`.
    #[must_use]
    pub fn decode(&self, wire: WireLocation) -> Location {
        Location {
            latitude: wire.latitude,
            longitude: wire.longitude,
            name: wire.name,
            specific_name: wire.specific_name,
            general_name: wire.general_name,
        }
    }

    /// Canonical protobuf bytes for a location.
    ///
    /// Default-valued fields are omitted, so `-0.0` is written as absent and
    /// reads back as `+0.0`.
    #[must_use]
    pub fn to_bytes(&self, location: &Location) -> Vec<u8> {
        self.encode(location).encode_to_vec()
    }

    /// Parse protobuf bytes into a location.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LocationDecode`] if the bytes are not a valid message.
    pub fn from_bytes(&self, bytes: &[u8]) -> Result<Location> {
        let wire = WireLocation::decode(bytes)?;
        Ok(self.decode(wire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_bitwise_eq(a: &Location, b: &Location) {
        assert_eq!(a.latitude.to_bits(), b.latitude.to_bits());
        assert_eq!(a.longitude.to_bits(), b.longitude.to_bits());
        assert_eq!(a.name, b.name);
        assert_eq!(a.specific_name, b.specific_name);
        assert_eq!(a.general_name, b.general_name);
    }

    fn park() -> Location {
        Location::new(45.5, -73.6)
            .with_name("Park")
            .with_specific_name("Pond")
            .with_general_name("Wetland")
    }

    #[test]
    fn test_park_round_trip() {
        let codec = LocationCodec::new();
        let original = park();

        let decoded = codec.decode(codec.encode(&original));

        assert_eq!(decoded, original);
        assert_eq!(decoded.latitude.to_bits(), 45.5_f64.to_bits());
        assert_eq!(decoded.longitude.to_bits(), (-73.6_f64).to_bits());
        assert_eq!(decoded.name, "Park");
        assert_eq!(decoded.specific_name, "Pond");
        assert_eq!(decoded.general_name, "Wetland");
    }

    #[test]
    fn test_round_trip_boundary_floats() {
        let codec = LocationCodec::new();
        let values = [
            0.0,
            -0.0,
            f64::NAN,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::MAX,
            f64::MIN,
            f64::MIN_POSITIVE,
            f64::EPSILON,
            1e308,
            -1e-308,
        ];

        for &lat in &values {
            for &lon in &values {
                let original = Location::new(lat, lon);
                let decoded = codec.decode(codec.encode(&original));
                assert_bitwise_eq(&original, &decoded);
            }
        }
    }

    #[test]
    fn test_round_trip_empty_strings() {
        let codec = LocationCodec::new();
        let original = Location::new(1.0, 2.0);
        let decoded = codec.decode(codec.encode(&original));
        assert_eq!(decoded, original);
        assert!(decoded.name.is_empty());
    }

    #[test]
    fn test_encode_copies_fields_verbatim() {
        let codec = LocationCodec::new();
        let location = Location::new(123.0, -999.5).with_name("  spaced  ");
        let wire = codec.encode(&location);
        assert_eq!(wire.latitude, 123.0);
        assert_eq!(wire.longitude, -999.5);
        assert_eq!(wire.name, "  spaced  ");
        assert_eq!(wire.specific_name, "");
    }

    #[test]
    fn test_encode_decode_preserves_wire_fields() {
        let codec = LocationCodec::new();
        let wire = WireLocation {
            latitude: -12.25,
            longitude: 0.0,
            name: String::new(),
            specific_name: "Reef".to_string(),
            general_name: String::new(),
        };
        assert_eq!(codec.encode(&codec.decode(wire.clone())), wire);
    }

    #[test]
    fn test_decode_default_wire() {
        let codec = LocationCodec::new();
        let decoded = codec.decode(WireLocation::default());
        assert_eq!(decoded, codec.default_value());
        assert_eq!(decoded.latitude, 0.0);
        assert!(decoded.general_name.is_empty());
    }

    #[test]
    fn test_bytes_round_trip() {
        let codec = LocationCodec::new();
        let original = park();
        let bytes = codec.to_bytes(&original);
        assert_eq!(codec.from_bytes(&bytes).unwrap(), original);
    }

    #[test]
    fn test_bytes_round_trip_nan() {
        let codec = LocationCodec::new();
        let original = Location::new(f64::NAN, f64::NEG_INFINITY);
        let decoded = codec.from_bytes(&codec.to_bytes(&original)).unwrap();
        assert_bitwise_eq(&original, &decoded);
    }

    #[test]
    fn test_bytes_canonical_layout() {
        let codec = LocationCodec::new();
        let bytes = codec.to_bytes(&Location::new(1.0, 0.0).with_general_name("W"));

        let mut expected = vec![0x09];
        expected.extend_from_slice(&1.0_f64.to_le_bytes());
        expected.extend_from_slice(&[0x2a, 0x01, b'W']);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_default_location_encodes_empty() {
        let codec = LocationCodec::new();
        assert!(codec.to_bytes(&Location::default()).is_empty());
        assert!(codec.to_bytes(&Location::new(-0.0, -0.0)).is_empty());
    }

    #[test]
    fn test_from_bytes_empty_is_default() {
        let codec = LocationCodec::new();
        assert_eq!(codec.from_bytes(&[]).unwrap(), Location::default());
    }

    #[test]
    fn test_from_bytes_corrupt() {
        let codec = LocationCodec::new();
        let err = codec.from_bytes(&[0x1a, 0x10, b'P']).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_is_within_bounds() {
        assert!(park().is_within_bounds());
        assert!(Location::new(90.0, -180.0).is_within_bounds());
        assert!(!Location::new(90.5, 0.0).is_within_bounds());
        assert!(!Location::new(0.0, 180.1).is_within_bounds());
        assert!(!Location::new(f64::NAN, 0.0).is_within_bounds());
    }

    #[test]
    fn test_check_bounds() {
        assert!(park().check_bounds().is_ok());
        let err = Location::new(-91.0, 0.0).check_bounds().unwrap_err();
        assert!(matches!(err, Error::CoordinatesOutOfRange { .. }));
    }

    #[test]
    fn test_with_helpers_copy() {
        let base = Location::new(1.0, 2.0);
        let named = base.clone().with_name("Marsh");
        assert!(base.name.is_empty());
        assert_eq!(named.name, "Marsh");
        assert_eq!(named.latitude, base.latitude);
    }

    #[test]
    fn test_display() {
        assert_eq!(park().to_string(), "(45.5, -73.6) Park / Pond / Wetland");
        assert_eq!(Location::new(1.5, 2.0).to_string(), "(1.5, 2)");
    }

    #[test]
    fn test_serde_json_round_trip() {
        let json = serde_json::to_string(&park()).unwrap();
        assert!(json.contains("specific_name"));
        let back: Location = serde_json::from_str(&json).unwrap();
        assert_eq!(back, park());
    }

    #[test]
    fn test_serde_json_missing_names() {
        let back: Location = serde_json::from_str(r#"{"latitude": 1.0, "longitude": 2.0}"#).unwrap();
        assert_eq!(back, Location::new(1.0, 2.0));
    }
}
