// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Native attribute keys.

/// Power, `0`/`1`.
pub const POWER: &str = "Pow";
/// Operating mode code.
pub const MODE: &str = "Mod";
/// Target temperature in degrees Celsius.
pub const TARGET_TEMPERATURE: &str = "SetTem";
/// Temperature sensor reading, offset by [`TEMPERATURE_SENSOR_OFFSET`].
pub const CURRENT_TEMPERATURE: &str = "TemSen";
/// Fan speed code.
pub const FAN_SPEED: &str = "WdSpd";
/// Horizontal swing code.
pub const HORIZONTAL_SWING: &str = "SwingLfRig";
/// Vertical swing code.
pub const VERTICAL_SWING: &str = "SwUpDn";
/// Target humidity in percent, `0` when unsupported.
pub const TARGET_HUMIDITY: &str = "Dwet";
/// Humidity sensor reading in percent, `0` when unsupported.
pub const CURRENT_HUMIDITY: &str = "DwatSen";

pub const TURBO: &str = "Tur";
pub const QUIET: &str = "Quiet";
pub const LIGHT: &str = "Lig";
pub const FRESH_AIR: &str = "Air";
pub const XFAN: &str = "Blo";
pub const ANION: &str = "Health";
pub const SLEEP: &str = "SwhSlp";
pub const POWER_SAVE: &str = "SvSt";
pub const BEEP: &str = "Buzzer_ON_OFF";
pub const CLEAN_FILTER: &str = "Dfltr";
pub const WATER_FULL: &str = "DwatFul";
pub const STEADY_HEAT: &str = "StHt";

/// Offset the temperature sensor adds to its reading.
pub const TEMPERATURE_SENSOR_OFFSET: i64 = 40;
