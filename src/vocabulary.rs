// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Translation between the device vocabulary and the exposed vocabulary.
//!
//! Devices speak in numeric codes with capitalized-word names (`MediumLow`,
//! `FixedUpperMiddle`). Clients see lowercase names with underscores
//! (`medium_low`, `fixed_upper_middle`) plus an extra `unknown` member.
//!
//! Each vocabulary is declared once as a static table. The table generates
//! the native enum (`Native*`), the exposed enum, and both directions of the
//! mapping. Translating towards the device is fallible: `unknown` and any
//! name outside the table yield [`ValueError::InvalidEnumValue`].
//!
//! # Examples
//!
//! ```
//! use climate_sync::vocabulary::{FanSpeed, NativeFanSpeed, Vocabulary};
//!
//! let speed: FanSpeed = "medium_low".parse().unwrap();
//! assert_eq!(speed.to_native().unwrap(), NativeFanSpeed::MediumLow);
//! assert_eq!(FanSpeed::from_native(NativeFanSpeed::High), FanSpeed::High);
//!
//! assert!(FanSpeed::Unknown.to_native().is_err());
//! assert!("warp_speed".parse::<FanSpeed>().is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// An exposed vocabulary paired with its native counterpart.
pub trait Vocabulary: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// The device-side enumeration.
    type Native: Copy + Eq + fmt::Debug;

    /// Vocabulary name used in error messages.
    const NAME: &'static str;

    /// Every member of the exposed vocabulary, `Unknown` last.
    const ALL: &'static [Self];

    /// Translates towards the device.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidEnumValue` for members with no native
    /// counterpart.
    fn to_native(self) -> Result<Self::Native, ValueError>;

    /// Translates from the device. Total over the native domain.
    fn from_native(native: Self::Native) -> Self;

    /// Returns the exposed name.
    fn as_str(&self) -> &'static str;
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $external:ident / $native:ident, $label:literal {
            $($variant:ident = $code:literal => $name:literal,)+
        }
    ) => {
        #[doc = concat!("Device-side ", $label, " codes.")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $native {
            $(
                #[doc = concat!("Code ", stringify!($code), ".")]
                $variant,
            )+
        }

        impl $native {
            /// Every native member in code order.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// Returns the numeric code sent over the wire.
            #[must_use]
            pub const fn code(&self) -> i64 {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            /// Returns the native member name.
            #[must_use]
            pub const fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)+
                }
            }

            /// Looks up a member by its wire code.
            ///
            /// # Errors
            ///
            /// Returns `ValueError::InvalidEnumValue` if no member has this code.
            pub fn from_code(code: i64) -> Result<Self, ValueError> {
                match code {
                    $($code => Ok(Self::$variant),)+
                    other => Err(ValueError::InvalidEnumValue {
                        vocabulary: $label,
                        value: other.to_string(),
                    }),
                }
            }
        }

        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "String", into = "&'static str")]
        pub enum $external {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
            /// No device counterpart.
            Unknown,
        }

        impl Vocabulary for $external {
            type Native = $native;

            const NAME: &'static str = $label;

            const ALL: &'static [Self] = &[$(Self::$variant,)+ Self::Unknown];

            fn to_native(self) -> Result<$native, ValueError> {
                match self {
                    $(Self::$variant => Ok($native::$variant),)+
                    Self::Unknown => Err(ValueError::InvalidEnumValue {
                        vocabulary: $label,
                        value: "unknown".to_string(),
                    }),
                }
            }

            fn from_native(native: $native) -> Self {
                match native {
                    $($native::$variant => Self::$variant,)+
                }
            }

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                    Self::Unknown => "unknown",
                }
            }
        }

        impl FromStr for $external {
            type Err = ValueError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    "unknown" => Ok(Self::Unknown),
                    other => Err(ValueError::InvalidEnumValue {
                        vocabulary: $label,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $external {
            type Error = ValueError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$external> for &'static str {
            fn from(value: $external) -> Self {
                value.as_str()
            }
        }

        impl From<$native> for $external {
            fn from(native: $native) -> Self {
                Self::from_native(native)
            }
        }

        impl fmt::Display for $external {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocabulary! {
    /// Operating mode.
    Mode / NativeMode, "mode" {
        Auto = 0 => "auto",
        Cool = 1 => "cool",
        Dry = 2 => "dry",
        Fan = 3 => "fan",
        Heat = 4 => "heat",
    }
}

vocabulary! {
    /// Fan speed level.
    FanSpeed / NativeFanSpeed, "fan_speed" {
        Auto = 0 => "auto",
        Low = 1 => "low",
        MediumLow = 2 => "medium_low",
        Medium = 3 => "medium",
        MediumHigh = 4 => "medium_high",
        High = 5 => "high",
    }
}

vocabulary! {
    /// Horizontal louver position.
    HorizontalSwing / NativeHorizontalSwing, "horizontal_swing" {
        Default = 0 => "default",
        FullSwing = 1 => "full_swing",
        Left = 2 => "left",
        LeftCenter = 3 => "left_center",
        Center = 4 => "center",
        RightCenter = 5 => "right_center",
        Right = 6 => "right",
    }
}

vocabulary! {
    /// Vertical louver position.
    VerticalSwing / NativeVerticalSwing, "vertical_swing" {
        Default = 0 => "default",
        FullSwing = 1 => "full_swing",
        FixedUpper = 2 => "fixed_upper",
        FixedUpperMiddle = 3 => "fixed_upper_middle",
        FixedMiddle = 4 => "fixed_middle",
        FixedLowerMiddle = 5 => "fixed_lower_middle",
        FixedLower = 6 => "fixed_lower",
        SwingUpper = 7 => "swing_upper",
        SwingUpperMiddle = 8 => "swing_upper_middle",
        SwingMiddle = 9 => "swing_middle",
        SwingLowerMiddle = 10 => "swing_lower_middle",
        SwingLower = 11 => "swing_lower",
    }
}
