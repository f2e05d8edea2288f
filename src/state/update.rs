// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Partial update requests.

use serde_json::Value;

use crate::capabilities::Feature;
use crate::error::{Error, ValueError};
use crate::types::{TargetHumidity, TargetTemperature};
use crate::vocabulary::{FanSpeed, HorizontalSwing, Mode, VerticalSwing};

/// A partial update for one device.
///
/// Only the fields that are `Some` are touched. Read-only features
/// (`clean_filter`, `water_full`) cannot be set.
///
/// # Examples
///
/// ```
/// use climate_sync::state::DeviceUpdate;
/// use climate_sync::types::TargetTemperature;
/// use climate_sync::vocabulary::Mode;
///
/// let update = DeviceUpdate::new()
///     .with_power(true)
///     .with_mode(Mode::Heat)
///     .with_target_temperature(TargetTemperature::new(26).unwrap());
/// assert!(!update.is_empty());
///
/// let parsed: DeviceUpdate = serde_json::from_str(r#"{"target_temperature": 26}"#).unwrap();
/// assert_eq!(parsed.target_temperature.unwrap().value(), 26);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DeviceUpdate {
    pub power: Option<bool>,
    pub mode: Option<Mode>,
    pub target_temperature: Option<TargetTemperature>,
    pub target_humidity: Option<TargetHumidity>,
    pub fan_speed: Option<FanSpeed>,
    pub horizontal_swing: Option<HorizontalSwing>,
    pub vertical_swing: Option<VerticalSwing>,
    pub turbo: Option<bool>,
    pub quiet: Option<bool>,
    pub light: Option<bool>,
    pub fresh_air: Option<bool>,
    pub xfan: Option<bool>,
    pub anion: Option<bool>,
    pub sleep: Option<bool>,
    pub power_save: Option<bool>,
    pub beep: Option<bool>,
    pub steady_heat: Option<bool>,
}

impl DeviceUpdate {
    /// Creates an update that touches nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets power.
    #[must_use]
    pub fn with_power(mut self, power: bool) -> Self {
        self.power = Some(power);
        self
    }

    /// Sets the operating mode.
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Sets the target temperature.
    #[must_use]
    pub fn with_target_temperature(mut self, value: TargetTemperature) -> Self {
        self.target_temperature = Some(value);
        self
    }

    /// Sets the target humidity.
    #[must_use]
    pub fn with_target_humidity(mut self, value: TargetHumidity) -> Self {
        self.target_humidity = Some(value);
        self
    }

    /// Sets the fan speed.
    #[must_use]
    pub fn with_fan_speed(mut self, speed: FanSpeed) -> Self {
        self.fan_speed = Some(speed);
        self
    }

    /// Sets the horizontal swing.
    #[must_use]
    pub fn with_horizontal_swing(mut self, swing: HorizontalSwing) -> Self {
        self.horizontal_swing = Some(swing);
        self
    }

    /// Sets the vertical swing.
    #[must_use]
    pub fn with_vertical_swing(mut self, swing: VerticalSwing) -> Self {
        self.vertical_swing = Some(swing);
        self
    }

    /// Sets a writable feature. Read-only features are ignored.
    #[must_use]
    pub fn with_feature(mut self, feature: Feature, on: bool) -> Self {
        if let Some(slot) = self.feature_mut(feature) {
            *slot = Some(on);
        }
        self
    }

    /// Parses an update from the `data` object of a subscriber message.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCommandValue` if a value lies outside its
    /// vocabulary or range, and `Error::Json` for any other malformed input.
    pub fn from_json(data: Value) -> Result<Self, Error> {
        serde_json::from_value(data.clone()).map_err(|e| match rejected_value(&data) {
            Some(rejected) => Error::InvalidCommandValue(rejected),
            None => Error::from(e),
        })
    }

    /// Returns `true` if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns the features this update sets, in view order.
    #[must_use]
    pub fn features(&self) -> Vec<(Feature, bool)> {
        Feature::ALL
            .into_iter()
            .filter_map(|f| self.feature(f).map(|on| (f, on)))
            .collect()
    }

    fn feature(&self, feature: Feature) -> Option<bool> {
        match feature {
            Feature::Turbo => self.turbo,
            Feature::Quiet => self.quiet,
            Feature::Light => self.light,
            Feature::FreshAir => self.fresh_air,
            Feature::XFan => self.xfan,
            Feature::Anion => self.anion,
            Feature::Sleep => self.sleep,
            Feature::PowerSave => self.power_save,
            Feature::Beep => self.beep,
            Feature::SteadyHeat => self.steady_heat,
            Feature::CleanFilter | Feature::WaterFull => None,
        }
    }

    fn feature_mut(&mut self, feature: Feature) -> Option<&mut Option<bool>> {
        match feature {
            Feature::Turbo => Some(&mut self.turbo),
            Feature::Quiet => Some(&mut self.quiet),
            Feature::Light => Some(&mut self.light),
            Feature::FreshAir => Some(&mut self.fresh_air),
            Feature::XFan => Some(&mut self.xfan),
            Feature::Anion => Some(&mut self.anion),
            Feature::Sleep => Some(&mut self.sleep),
            Feature::PowerSave => Some(&mut self.power_save),
            Feature::Beep => Some(&mut self.beep),
            Feature::SteadyHeat => Some(&mut self.steady_heat),
            Feature::CleanFilter | Feature::WaterFull => None,
        }
    }
}

/// Finds the first field whose value its vocabulary or range rejects.
fn rejected_value(data: &Value) -> Option<ValueError> {
    let text = |key: &str| data.get(key).and_then(Value::as_str);
    let number = |key: &str| data.get(key).and_then(Value::as_i64);

    [
        text("mode").map(|s| s.parse::<Mode>().map(drop)),
        text("fan_speed").map(|s| s.parse::<FanSpeed>().map(drop)),
        text("horizontal_swing").map(|s| s.parse::<HorizontalSwing>().map(drop)),
        text("vertical_swing").map(|s| s.parse::<VerticalSwing>().map(drop)),
        number("target_temperature").map(|n| TargetTemperature::try_from(n).map(drop)),
        number("target_humidity").map(|n| TargetHumidity::try_from(n).map(drop)),
    ]
    .into_iter()
    .flatten()
    .find_map(Result::err)
}
