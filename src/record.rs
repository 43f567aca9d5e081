// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Log record and severity levels.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use serde::Serialize;
use serde_json::Value;

use crate::Error;

/// Free-form structured context attached to a [`Record`].
pub type Context = BTreeMap<String, Value>;

/// An enum representing the available severity levels, from the least to the most severe.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Designates diagnostic information for developers.
    Debug = 0,
    /// Designates useful information.
    Info = 1,
    /// Designates hazardous situations.
    Warn = 2,
    /// Designates errors.
    Error = 3,
    /// Designates errors the application cannot recover from.
    Fatal = 4,
}

impl Level {
    /// All levels, from the least to the most severe.
    pub const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    /// Return the string representation of the `Level`.
    ///
    /// This returns the same string as the `fmt::Display` implementation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }

    /// Return the numeric rank of the `Level`.
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Level, Self::Err> {
        for level in Level::ALL {
            if s.eq_ignore_ascii_case(level.as_str()) {
                return Ok(level);
            }
        }

        Err(Error::new(format!("malformed level: {s:?}")))
    }
}

/// A structured description of an error attached to a [`Record`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    name: String,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stack: Vec<String>,
}

impl ErrorInfo {
    /// Create a new [`ErrorInfo`] with a name and a message.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: vec![],
        }
    }

    /// Append a frame to the stack.
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }

    /// The error name, usually its type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The messages of the error's source chain, outermost first.
    pub fn stack(&self) -> &[String] {
        &self.stack
    }
}

impl<E> From<&E> for ErrorInfo
where
    E: std::error::Error + ?Sized,
{
    fn from(err: &E) -> Self {
        let mut stack = vec![];
        let mut source = err.source();
        while let Some(cause) = source {
            stack.push(cause.to_string());
            source = cause.source();
        }

        Self {
            name: std::any::type_name::<E>().to_string(),
            message: err.to_string(),
            stack,
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// One log occurrence.
///
/// A record is never modified in place. Stages that want to change a record build a new one
/// from [`Record::to_builder`] or [`Record::into_builder`].
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    // the observed time
    timestamp: Timestamp,

    level: Level,
    message: Cow<'static, str>,
    error: Option<ErrorInfo>,

    // structural logging
    context: Context,
}

impl Record {
    /// The observed time.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// The severity of the record.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The message body.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The attached error, if any.
    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    /// The structured context. Empty when none was attached.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The context value under `key`, if any.
    pub fn context_value(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    /// Create a builder initialized with the current record's values.
    pub fn to_builder(&self) -> RecordBuilder {
        self.clone().into_builder()
    }

    /// Turn this record into a builder initialized with its values.
    pub fn into_builder(self) -> RecordBuilder {
        RecordBuilder { record: self }
    }

    /// Returns a new builder stamped with the current time.
    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }
}

/// Builder for [`Record`].
#[derive(Debug)]
pub struct RecordBuilder {
    record: Record,
}

impl Default for RecordBuilder {
    fn default() -> Self {
        RecordBuilder {
            record: Record {
                timestamp: Timestamp::now(),
                level: Level::Info,
                message: Cow::Borrowed(""),
                error: None,
                context: Context::new(),
            },
        }
    }
}

impl RecordBuilder {
    /// Set [`timestamp`](Record::timestamp).
    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.record.timestamp = timestamp;
        self
    }

    /// Set [`level`](Record::level).
    pub fn level(mut self, level: Level) -> Self {
        self.record.level = level;
        self
    }

    /// Set [`message`](Record::message).
    pub fn message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.record.message = message.into();
        self
    }

    /// Set [`error`](Record::error).
    pub fn error(mut self, error: impl Into<ErrorInfo>) -> Self {
        self.record.error = Some(error.into());
        self
    }

    /// Set or replace one [`context`](Record::context) entry.
    pub fn context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.record.context.insert(key.into(), value.into());
        self
    }

    /// Set or replace many [`context`](Record::context) entries.
    pub fn contexts<K, V>(mut self, kvs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.record
            .context
            .extend(kvs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Invoke the builder and return a `Record`
    pub fn build(self) -> Record {
        self.record
    }
}
