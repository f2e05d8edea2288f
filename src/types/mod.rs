// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validated value types.
//!
//! Each type checks its value at construction time and on deserialization,
//! so an out-of-range setpoint never reaches a device.
//!
//! # Types
//!
//! - [`MacAddress`] - Device identity (12 hex digits)
//! - [`TargetTemperature`] - Temperature setpoint in °C (16-30)
//! - [`TargetHumidity`] - Humidity setpoint in % (40-90)

mod mac;
mod setpoint;

pub use mac::MacAddress;
pub use setpoint::{TargetHumidity, TargetTemperature};
