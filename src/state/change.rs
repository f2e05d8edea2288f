// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Change detection between two views of one device.
//!
//! [`diff`] compares every declared field of two [`DeviceView`]s and
//! reports each difference as a [`Change`]. Enumerated fields are reported
//! by exposed name, so notifications stay stable regardless of the native
//! codes behind them. An optional field going from absent to present (or
//! back) counts as a change.
//!
//! # Examples
//!
//! ```
//! use climate_sync::state::diff;
//! # use climate_sync::state::DeviceView;
//! # fn example(before: &DeviceView) {
//! let mut after = before.clone();
//! after.target_temperature += 1;
//!
//! let changes = diff(before, &after);
//! assert_eq!(changes.len(), 1);
//! assert!(changes.get("target_temperature").is_some());
//! # }
//! ```

use std::collections::BTreeMap;

use super::{DeviceView, FieldValue};

/// One field-level difference.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Change {
    /// Value before the change, `None` when absent.
    pub old: Option<FieldValue>,
    /// Value after the change, `None` when absent.
    pub new: Option<FieldValue>,
}

/// The set of changes between two views, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct ChangeSet(BTreeMap<&'static str, Change>);

impl ChangeSet {
    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of changed fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the change recorded for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Change> {
        self.0.get(field)
    }

    /// Iterates over `(field, change)` pairs in field name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Change)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    /// Returns the changed field names.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }
}

/// Computes the field-by-field difference between two views.
#[must_use]
pub fn diff(old: &DeviceView, new: &DeviceView) -> ChangeSet {
    let changes = old
        .fields()
        .into_iter()
        .zip(new.fields())
        .filter(|((_, before), (_, after))| before != after)
        .map(|((field, before), (_, after))| {
            (
                field,
                Change {
                    old: before,
                    new: after,
                },
            )
        })
        .collect();
    ChangeSet(changes)
}
