// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device capabilities detection and configuration.
//!
//! Not every unit has every feature: a basic wall unit has no fresh-air
//! valve, and only dehumidifier-capable units report humidity. Capabilities
//! are detected from the first attribute set read after binding and stay
//! fixed until the device is bound again. Views report a feature as absent
//! (`null`) when the capability is missing.

use std::fmt;

use crate::link::{RawState, attr};

/// An optional on/off feature of a climate unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Maximum power for fast heating or cooling.
    Turbo,
    /// Reduced fan noise.
    Quiet,
    /// Display light.
    Light,
    /// Fresh-air valve.
    FreshAir,
    /// Dries the evaporator after switching off.
    XFan,
    /// Anion generator.
    Anion,
    /// Sleep program.
    Sleep,
    /// Power-saving mode.
    PowerSave,
    /// Audible confirmation of commands.
    Beep,
    /// Filter cleaning reminder. Read only.
    CleanFilter,
    /// Water tank full. Read only.
    WaterFull,
    /// Keeps the room at 8 degrees.
    SteadyHeat,
}

impl Feature {
    /// Every feature in view order.
    pub const ALL: [Self; 12] = [
        Self::Turbo,
        Self::Quiet,
        Self::Light,
        Self::FreshAir,
        Self::XFan,
        Self::Anion,
        Self::Sleep,
        Self::PowerSave,
        Self::Beep,
        Self::CleanFilter,
        Self::WaterFull,
        Self::SteadyHeat,
    ];

    /// Returns the native attribute key.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Turbo => attr::TURBO,
            Self::Quiet => attr::QUIET,
            Self::Light => attr::LIGHT,
            Self::FreshAir => attr::FRESH_AIR,
            Self::XFan => attr::XFAN,
            Self::Anion => attr::ANION,
            Self::Sleep => attr::SLEEP,
            Self::PowerSave => attr::POWER_SAVE,
            Self::Beep => attr::BEEP,
            Self::CleanFilter => attr::CLEAN_FILTER,
            Self::WaterFull => attr::WATER_FULL,
            Self::SteadyHeat => attr::STEADY_HEAT,
        }
    }

    /// Returns the exposed field name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Turbo => "turbo",
            Self::Quiet => "quiet",
            Self::Light => "light",
            Self::FreshAir => "fresh_air",
            Self::XFan => "xfan",
            Self::Anion => "anion",
            Self::Sleep => "sleep",
            Self::PowerSave => "power_save",
            Self::Beep => "beep",
            Self::CleanFilter => "clean_filter",
            Self::WaterFull => "water_full",
            Self::SteadyHeat => "steady_heat",
        }
    }

    /// Returns `true` if clients may set this feature.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        !matches!(self, Self::CleanFilter | Self::WaterFull)
    }

    const fn bit(self) -> u16 {
        1 << self as u16
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Capabilities of a climate unit.
///
/// # Examples
///
/// ```
/// use climate_sync::{Capabilities, Feature};
/// use climate_sync::link::{attr, RawState};
///
/// let raw = RawState::new()
///     .with(attr::POWER, 1)
///     .with(attr::TURBO, 0)
///     .with(attr::LIGHT, 1);
///
/// let caps = Capabilities::detect(&raw);
/// assert!(caps.supports(Feature::Turbo));
/// assert!(!caps.supports(Feature::FreshAir));
/// assert!(!caps.humidity);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Reports and accepts humidity.
    pub humidity: bool,

    /// Has a room temperature sensor.
    pub temperature_sensor: bool,

    features: u16,
}

impl Capabilities {
    /// Creates capabilities for a unit with no optional features.
    #[must_use]
    pub const fn basic() -> Self {
        Self {
            humidity: false,
            temperature_sensor: false,
            features: 0,
        }
    }

    /// Creates capabilities for a unit with every optional feature.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            humidity: true,
            temperature_sensor: true,
            features: (1 << Feature::ALL.len()) - 1,
        }
    }

    /// Detects capabilities from the attributes a device reports.
    ///
    /// A feature is supported when its attribute is present. Humidity is
    /// supported when either humidity attribute is present.
    #[must_use]
    pub fn detect(raw: &RawState) -> Self {
        let mut caps = Self::basic();
        caps.humidity = raw.contains(attr::TARGET_HUMIDITY) || raw.contains(attr::CURRENT_HUMIDITY);
        caps.temperature_sensor = raw.contains(attr::CURRENT_TEMPERATURE);
        for feature in Feature::ALL {
            if raw.contains(feature.key()) {
                caps.features |= feature.bit();
            }
        }
        caps
    }

    /// Returns whether the unit supports a feature.
    #[must_use]
    pub const fn supports(&self, feature: Feature) -> bool {
        self.features & feature.bit() != 0
    }

    /// Returns the supported features in view order.
    pub fn features(&self) -> impl Iterator<Item = Feature> + '_ {
        Feature::ALL.into_iter().filter(|f| self.supports(*f))
    }
}

/// Builder for creating custom capabilities.
#[derive(Debug, Default)]
pub struct CapabilitiesBuilder {
    inner: Capabilities,
}

impl CapabilitiesBuilder {
    /// Creates a new builder with no optional features.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables humidity support.
    #[must_use]
    pub fn with_humidity(mut self) -> Self {
        self.inner.humidity = true;
        self
    }

    /// Enables the room temperature sensor.
    #[must_use]
    pub fn with_temperature_sensor(mut self) -> Self {
        self.inner.temperature_sensor = true;
        self
    }

    /// Enables a feature.
    #[must_use]
    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.inner.features |= feature.bit();
        self
    }

    /// Builds the capabilities.
    #[must_use]
    pub fn build(self) -> Capabilities {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_capabilities() {
        let caps = Capabilities::basic();
        assert!(!caps.humidity);
        assert!(!caps.temperature_sensor);
        assert_eq!(caps.features().count(), 0);
    }

    #[test]
    fn full_capabilities() {
        let caps = Capabilities::full();
        assert!(caps.humidity);
        for feature in Feature::ALL {
            assert!(caps.supports(feature), "{feature} missing");
        }
    }

    #[test]
    fn detect_from_attributes() {
        let raw = RawState::new()
            .with(attr::POWER, 1)
            .with(attr::CURRENT_TEMPERATURE, 63)
            .with(attr::QUIET, 0)
            .with(attr::WATER_FULL, 0)
            .with(attr::CURRENT_HUMIDITY, 55);

        let caps = Capabilities::detect(&raw);
        assert!(caps.humidity);
        assert!(caps.temperature_sensor);
        assert_eq!(
            caps.features().collect::<Vec<_>>(),
            vec![Feature::Quiet, Feature::WaterFull]
        );
    }

    #[test]
    fn builder_pattern() {
        let caps = CapabilitiesBuilder::new()
            .with_humidity()
            .with_feature(Feature::Turbo)
            .with_feature(Feature::Beep)
            .build();

        assert!(caps.humidity);
        assert!(caps.supports(Feature::Turbo));
        assert!(caps.supports(Feature::Beep));
        assert!(!caps.supports(Feature::Sleep));
    }

    #[test]
    fn read_only_features() {
        let writable: Vec<_> = Feature::ALL.iter().filter(|f| f.is_writable()).collect();
        assert_eq!(writable.len(), 10);
        assert!(!Feature::CleanFilter.is_writable());
        assert!(!Feature::WaterFull.is_writable());
    }
}
