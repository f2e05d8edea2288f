// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Range-checked setpoints accepted by update commands.
//!
//! Devices report whatever they like, so views carry plain integers. Commands
//! are validated on the way in: a setpoint outside the range the devices
//! accept is rejected with [`ValueError::OutOfRange`] at construction or
//! deserialization time.

use std::fmt;

use crate::error::ValueError;

macro_rules! setpoint {
    ($(#[$meta:meta])* $name:ident, $min:expr, $max:expr) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[serde(try_from = "i64", into = "i64")]
        pub struct $name(u8);

        impl $name {
            /// Lowest accepted value.
            pub const MIN: u8 = $min;

            /// Highest accepted value.
            pub const MAX: u8 = $max;

            /// Creates a setpoint.
            ///
            /// # Errors
            ///
            /// Returns `ValueError::OutOfRange` if `value` is outside the accepted range.
            pub fn new(value: i64) -> Result<Self, ValueError> {
                match u8::try_from(value) {
                    Ok(v) if (Self::MIN..=Self::MAX).contains(&v) => Ok(Self(v)),
                    _ => Err(ValueError::OutOfRange {
                        min: i64::from(Self::MIN),
                        max: i64::from(Self::MAX),
                        actual: value,
                    }),
                }
            }

            /// Returns the setpoint value.
            #[must_use]
            pub const fn value(&self) -> u8 {
                self.0
            }
        }

        impl TryFrom<i64> for $name {
            type Error = ValueError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                i64::from(value.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

setpoint!(
    /// Target temperature in degrees Celsius (16-30, step 1).
    ///
    /// # Examples
    ///
    /// ```
    /// use climate_sync::types::TargetTemperature;
    ///
    /// assert_eq!(TargetTemperature::new(24).unwrap().value(), 24);
    /// assert!(TargetTemperature::new(31).is_err());
    /// ```
    TargetTemperature,
    16,
    30
);

setpoint!(
    /// Target relative humidity in percent (40-90, step 1).
    TargetHumidity,
    40,
    90
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_bounds() {
        assert!(TargetTemperature::new(16).is_ok());
        assert!(TargetTemperature::new(30).is_ok());
        assert_eq!(
            TargetTemperature::new(15),
            Err(ValueError::OutOfRange {
                min: 16,
                max: 30,
                actual: 15
            })
        );
        assert!(TargetTemperature::new(-4).is_err());
        assert!(TargetTemperature::new(300).is_err());
    }

    #[test]
    fn humidity_bounds() {
        assert!(TargetHumidity::new(40).is_ok());
        assert!(TargetHumidity::new(90).is_ok());
        assert!(TargetHumidity::new(39).is_err());
        assert!(TargetHumidity::new(91).is_err());
    }

    #[test]
    fn deserialize_validates() {
        let t: TargetTemperature = serde_json::from_str("26").unwrap();
        assert_eq!(t.value(), 26);

        let err = serde_json::from_str::<TargetTemperature>("12").unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
