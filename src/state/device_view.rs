// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The exposed snapshot of one device.

use std::fmt;
use std::net::Ipv4Addr;

use crate::capabilities::{Capabilities, Feature};
use crate::error::ValueError;
use crate::link::{DeviceInfo, RawState, attr};
use crate::types::MacAddress;
use crate::vocabulary::{
    FanSpeed, HorizontalSwing, Mode, NativeFanSpeed, NativeHorizontalSwing, NativeMode,
    NativeVerticalSwing, VerticalSwing, Vocabulary,
};

/// Current state of a climate unit, in the exposed vocabulary.
///
/// Optional fields are `None` when the unit lacks the capability (or, for
/// sensors, reports no reading). Enumerated fields never hold a native
/// value; conversion from the raw attribute set goes through
/// [`Vocabulary::from_native`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct DeviceView {
    /// Hardware address.
    pub mac: MacAddress,
    /// IPv4 address.
    pub ip: Ipv4Addr,
    /// Power state.
    pub power: bool,
    /// Operating mode.
    pub mode: Mode,
    /// Room temperature in degrees Celsius.
    pub current_temperature: Option<i64>,
    /// Target temperature in degrees Celsius.
    pub target_temperature: i64,
    /// Room humidity in percent.
    pub current_humidity: Option<i64>,
    /// Target humidity in percent.
    pub target_humidity: Option<i64>,
    /// Fan speed.
    pub fan_speed: FanSpeed,
    /// Horizontal louver position.
    pub horizontal_swing: HorizontalSwing,
    /// Vertical louver position.
    pub vertical_swing: VerticalSwing,
    pub turbo: Option<bool>,
    pub quiet: Option<bool>,
    pub light: Option<bool>,
    pub fresh_air: Option<bool>,
    pub xfan: Option<bool>,
    pub anion: Option<bool>,
    pub sleep: Option<bool>,
    pub power_save: Option<bool>,
    pub beep: Option<bool>,
    pub clean_filter: Option<bool>,
    pub water_full: Option<bool>,
    pub steady_heat: Option<bool>,
}

impl DeviceView {
    /// Builds a view from the attributes a device reported.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::MissingAttribute` if a mandatory attribute is
    /// absent, or `ValueError::InvalidEnumValue` if an enumerated attribute
    /// carries a code outside the native vocabulary.
    pub fn from_raw(
        info: &DeviceInfo,
        caps: &Capabilities,
        raw: &RawState,
    ) -> Result<Self, ValueError> {
        let required =
            |key: &'static str| raw.get(key).ok_or(ValueError::MissingAttribute(key));

        let current_temperature = if caps.temperature_sensor {
            raw.get(attr::CURRENT_TEMPERATURE)
                .filter(|v| *v != 0)
                .map(|v| v - attr::TEMPERATURE_SENSOR_OFFSET)
        } else {
            None
        };
        let humidity = |key| {
            if caps.humidity {
                raw.get(key).filter(|v| *v != 0)
            } else {
                None
            }
        };

        let mut view = Self {
            mac: info.mac,
            ip: info.ip,
            power: required(attr::POWER)? != 0,
            mode: Mode::from_native(NativeMode::from_code(required(attr::MODE)?)?),
            current_temperature,
            target_temperature: required(attr::TARGET_TEMPERATURE)?,
            current_humidity: humidity(attr::CURRENT_HUMIDITY),
            target_humidity: humidity(attr::TARGET_HUMIDITY),
            fan_speed: FanSpeed::from_native(NativeFanSpeed::from_code(required(
                attr::FAN_SPEED,
            )?)?),
            horizontal_swing: HorizontalSwing::from_native(NativeHorizontalSwing::from_code(
                required(attr::HORIZONTAL_SWING)?,
            )?),
            vertical_swing: VerticalSwing::from_native(NativeVerticalSwing::from_code(
                required(attr::VERTICAL_SWING)?,
            )?),
            turbo: None,
            quiet: None,
            light: None,
            fresh_air: None,
            xfan: None,
            anion: None,
            sleep: None,
            power_save: None,
            beep: None,
            clean_filter: None,
            water_full: None,
            steady_heat: None,
        };

        for feature in caps.features() {
            *view.feature_mut(feature) = raw.get_bool(feature.key());
        }
        Ok(view)
    }

    /// Returns the state of an optional feature.
    #[must_use]
    pub fn feature(&self, feature: Feature) -> Option<bool> {
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
            Feature::CleanFilter => self.clean_filter,
            Feature::WaterFull => self.water_full,
            Feature::SteadyHeat => self.steady_heat,
        }
    }

    fn feature_mut(&mut self, feature: Feature) -> &mut Option<bool> {
        match feature {
            Feature::Turbo => &mut self.turbo,
            Feature::Quiet => &mut self.quiet,
            Feature::Light => &mut self.light,
            Feature::FreshAir => &mut self.fresh_air,
            Feature::XFan => &mut self.xfan,
            Feature::Anion => &mut self.anion,
            Feature::Sleep => &mut self.sleep,
            Feature::PowerSave => &mut self.power_save,
            Feature::Beep => &mut self.beep,
            Feature::CleanFilter => &mut self.clean_filter,
            Feature::WaterFull => &mut self.water_full,
            Feature::SteadyHeat => &mut self.steady_heat,
        }
    }

    /// Returns every field with its value, in declaration order.
    ///
    /// Enumerated fields are rendered by exposed name; absent optional
    /// fields are `None`.
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, Option<FieldValue>)> {
        let mut fields = vec![
            ("mac", Some(FieldValue::Text(self.mac.to_string()))),
            ("ip", Some(FieldValue::Text(self.ip.to_string()))),
            ("power", Some(FieldValue::Bool(self.power))),
            ("mode", Some(FieldValue::name(self.mode))),
            (
                "current_temperature",
                self.current_temperature.map(FieldValue::Int),
            ),
            (
                "target_temperature",
                Some(FieldValue::Int(self.target_temperature)),
            ),
            ("current_humidity", self.current_humidity.map(FieldValue::Int)),
            ("target_humidity", self.target_humidity.map(FieldValue::Int)),
            ("fan_speed", Some(FieldValue::name(self.fan_speed))),
            (
                "horizontal_swing",
                Some(FieldValue::name(self.horizontal_swing)),
            ),
            ("vertical_swing", Some(FieldValue::name(self.vertical_swing))),
        ];
        fields.extend(
            Feature::ALL
                .iter()
                .map(|f| (f.name(), self.feature(*f).map(FieldValue::Bool))),
        );
        fields
    }
}

/// One field value of a [`DeviceView`], as reported in change records.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A boolean field.
    Bool(bool),
    /// A numeric field.
    Int(i64),
    /// A textual field or an enumerated field rendered by name.
    Text(String),
}

impl FieldValue {
    fn name<V: Vocabulary>(value: V) -> Self {
        Self::Text(value.as_str().to_string())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{info, raw, view};
    use super::*;

    #[test]
    fn converts_raw_attributes() {
        let view = view();
        assert!(view.power);
        assert_eq!(view.mode, Mode::Cool);
        assert_eq!(view.target_temperature, 24);
        assert_eq!(view.current_temperature, Some(23));
        assert_eq!(view.fan_speed, FanSpeed::Auto);
        assert_eq!(view.turbo, Some(false));
        assert_eq!(view.light, Some(true));
        assert_eq!(view.quiet, None);
        assert_eq!(view.current_humidity, None);
    }

    #[test]
    fn capabilities_gate_features() {
        let raw = raw();
        let view = DeviceView::from_raw(&info(), &Capabilities::basic(), &raw).unwrap();
        assert_eq!(view.turbo, None);
        assert_eq!(view.light, None);
        assert_eq!(view.current_temperature, None);
    }

    #[test]
    fn zero_humidity_is_absent() {
        let raw = raw()
            .with(attr::CURRENT_HUMIDITY, 0)
            .with(attr::TARGET_HUMIDITY, 55);
        let view = DeviceView::from_raw(&info(), &Capabilities::detect(&raw), &raw).unwrap();
        assert_eq!(view.current_humidity, None);
        assert_eq!(view.target_humidity, Some(55));
    }

    #[test]
    fn unknown_code_is_rejected() {
        let raw = raw().with(attr::MODE, 17);
        let err = DeviceView::from_raw(&info(), &Capabilities::detect(&raw), &raw).unwrap_err();
        assert_eq!(
            err,
            ValueError::InvalidEnumValue {
                vocabulary: "mode",
                value: "17".to_string()
            }
        );
    }

    #[test]
    fn missing_attribute_is_rejected() {
        let raw: RawState = raw().iter().filter(|(k, _)| *k != attr::POWER).collect();
        let err = DeviceView::from_raw(&info(), &Capabilities::detect(&raw), &raw).unwrap_err();
        assert_eq!(err, ValueError::MissingAttribute(attr::POWER));
    }

    #[test]
    fn serializes_flat_with_exposed_names() {
        let json = serde_json::to_value(view()).unwrap();
        assert_eq!(json["mac"], "aabbccddeeff");
        assert_eq!(json["ip"], "192.168.1.40");
        assert_eq!(json["mode"], "cool");
        assert_eq!(json["horizontal_swing"], "default");
        assert_eq!(json["quiet"], serde_json::Value::Null);
    }

    #[test]
    fn fields_cover_every_attribute() {
        let fields = view().fields();
        assert_eq!(fields.len(), 23);
        assert_eq!(fields[3], ("mode", Some(FieldValue::Text("cool".into()))));
    }
}
