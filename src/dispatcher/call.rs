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

use std::borrow::Cow;
use std::future::IntoFuture;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::Dispatcher;
use crate::Error;
use crate::record::Context;
use crate::record::ErrorInfo;
use crate::record::Level;

/// A pending log call, returned by [`Dispatcher::log`] and the per-level methods.
///
/// Attach context or an error, then `.await` it to run the dispatch. The returned future
/// completes once every stage has run; delivery to backends may still be in flight.
///
/// # Examples
///
/// ```
/// # async fn run(dispatcher: &logrelay::Dispatcher) -> Result<(), logrelay::Error> {
/// let err = std::io::Error::other("connection reset");
/// dispatcher
///     .error("failed to sync cart")
///     .context("cart_id", 42)
///     .error(&err)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[must_use = "a log call does nothing unless it is awaited"]
#[derive(Debug)]
pub struct LogCall<'a> {
    dispatcher: &'a Dispatcher,
    level: Level,
    message: Cow<'static, str>,
    error: Option<ErrorInfo>,
    context: Context,
}

impl<'a> LogCall<'a> {
    pub(super) fn new(dispatcher: &'a Dispatcher, level: Level, message: Cow<'static, str>) -> Self {
        Self {
            dispatcher,
            level,
            message,
            error: None,
            context: Context::new(),
        }
    }

    /// Attach one context entry.
    pub fn context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attach many context entries.
    pub fn contexts<K, V>(mut self, kvs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.context
            .extend(kvs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Attach a structured error.
    pub fn error(mut self, error: impl Into<ErrorInfo>) -> Self {
        self.error = Some(error.into());
        self
    }
}

impl<'a> IntoFuture for LogCall<'a> {
    type Output = Result<(), Error>;
    type IntoFuture = BoxFuture<'a, Result<(), Error>>;

    fn into_future(self) -> Self::IntoFuture {
        let LogCall {
            dispatcher,
            level,
            message,
            error,
            context,
        } = self;

        dispatcher.dispatch(level, message, error, context).boxed()
    }
}
