// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device views, change detection and update requests.
//!
//! - [`DeviceView`]: the exposed snapshot of one device
//! - [`diff`]: field-by-field comparison of two views
//! - [`DeviceUpdate`]: a partial update request

mod change;
mod device_view;
mod update;

pub use change::{Change, ChangeSet, diff};
pub use device_view::{DeviceView, FieldValue};
pub use update::DeviceUpdate;

#[cfg(test)]
pub(crate) use device_view::fixtures;
