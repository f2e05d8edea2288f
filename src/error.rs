// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `climate_sync` library.
//!
//! The hierarchy separates the three places a failure can come from:
//! the device link ([`LinkError`]), client supplied values ([`ValueError`]),
//! and the operations of the synchronization engine ([`Error`]).

use thiserror::Error;

use crate::types::MacAddress;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A command value could not be translated to the device vocabulary
    /// or is outside the accepted range.
    #[error("invalid command value: {0}")]
    InvalidCommandValue(#[source] ValueError),

    /// No device with this identity is registered.
    #[error("device {0} not found")]
    DeviceNotFound(MacAddress),

    /// The command path exhausted its single rebind-and-retry.
    #[error("device communication error: {0}")]
    DeviceCommunication(#[source] LinkError),

    /// An unexpected failure while applying a command.
    #[error("command failed: {0}")]
    InternalCommand(String),

    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error reported by the device link outside the command path.
    #[error("link error: {0}")]
    Link(#[from] LinkError),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A subscriber message was well-formed JSON but not a valid request.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl Error {
    /// Returns the client-facing class of this error.
    ///
    /// Transports use the class to pick a response status without matching
    /// on every variant.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidCommandValue(_)
            | Self::Value(_)
            | Self::Json(_)
            | Self::InvalidMessage(_) => ErrorClass::Validation,
            Self::DeviceNotFound(_) => ErrorClass::NotFound,
            Self::DeviceCommunication(_) => ErrorClass::Unavailable,
            Self::InternalCommand(_) | Self::Link(_) => ErrorClass::Internal,
        }
    }
}

/// Coarse classification of [`Error`] for transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The request carried a value the engine cannot accept.
    Validation,
    /// The addressed device is not registered.
    NotFound,
    /// The device did not answer after a rebind.
    Unavailable,
    /// Anything else.
    Internal,
}

impl ErrorClass {
    /// Returns the HTTP status code conventionally used for this class.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Validation => 422,
            Self::NotFound => 404,
            Self::Unavailable => 503,
            Self::Internal => 500,
        }
    }
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
        /// The actual value that was provided.
        actual: i64,
    },

    /// A value names no member of the vocabulary.
    #[error("invalid {vocabulary} value: {value}")]
    InvalidEnumValue {
        /// The vocabulary that was searched (`mode`, `fan_speed`, ...).
        vocabulary: &'static str,
        /// The rejected value, rendered as text.
        value: String,
    },

    /// A device did not report an attribute every unit has.
    #[error("missing attribute {0}")]
    MissingAttribute(&'static str),

    /// A hardware address is not 12 hex digits.
    #[error("invalid MAC address: {0}")]
    InvalidMacAddress(String),
}

/// Errors reported by a [`DeviceLink`](crate::link::DeviceLink).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The device session is not (or no longer) bound.
    #[error("device is not bound")]
    NotBound,

    /// The device did not answer in time.
    #[error("device timed out")]
    Timeout,

    /// Any other link failure.
    #[error("{0}")]
    Other(String),
}

impl LinkError {
    /// Returns `true` for the failures a rebind may cure.
    #[must_use]
    pub fn is_communication(&self) -> bool {
        matches!(self, Self::NotBound | Self::Timeout)
    }
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
