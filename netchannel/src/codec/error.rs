//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Codec error types.
//!
//! Frame handlers report failures with [`SerializationError`] (outbound) and
//! [`DeserializationError`] (inbound). Both carry a message and an optional
//! boxed source so handler implementations can wrap whatever their encoding
//! library returns.

use std::fmt;
use thiserror::Error;

/// Error that occurs while encoding an outbound frame.
///
/// # Examples
///
/// ```rust
/// use netchannel::codec::SerializationError;
/// use std::io;
///
/// let error = SerializationError::with_source("header write failed", io::Error::other("full"));
/// assert!(error.to_string().contains("header write failed"));
/// ```
#[derive(Debug)]
pub struct SerializationError {
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SerializationError {
    /// Creates a new serialization error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new serialization error with a message and source.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the error message without its cause.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Serialization error: {}", self.message)?;
        if let Some(source) = &self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for SerializationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error that occurs while decoding an inbound frame header or body.
#[derive(Debug)]
pub struct DeserializationError {
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DeserializationError {
    /// Creates a new deserialization error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new deserialization error with a message and source.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the error message without its cause.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DeserializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deserialization error: {}", self.message)?;
        if let Some(source) = &self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for DeserializationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source("JSON serialization failed", err)
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for DeserializationError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source("JSON deserialization failed", err)
    }
}

/// Codec configuration errors, raised when building a
/// [`CodecConfig`](crate::codec::CodecConfig).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// One of the four frame roles was never registered.
    #[error("no {0} handler registered")]
    MissingHandler(&'static str),

    /// The receive-header handler declared a zero-length header.
    #[error("receive-header handler declares a zero-length header")]
    EmptyHeader,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_serialization_error_new() {
        let error = SerializationError::new("test error");
        assert_eq!(error.to_string(), "Serialization error: test error");
        assert_eq!(error.message(), "test error");
        assert!(error.source().is_none());
    }

    #[test]
    fn test_deserialization_error_with_source() {
        let source = std::io::Error::other("io error");
        let error = DeserializationError::with_source("bad header", source);
        assert_eq!(
            error.to_string(),
            "Deserialization error: bad header (caused by: io error)"
        );
        assert!(error.source().is_some());
    }

    #[test]
    fn test_missing_handler_message() {
        let error = ConfigError::MissingHandler("receive-body");
        assert_eq!(error.to_string(), "no receive-body handler registered");
    }
}
