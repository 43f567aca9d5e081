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

//! Deliver log records to various targets.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::Error;
use crate::record::Record;

mod stdio;
mod testing;

pub use self::stdio::Stderr;
pub use self::stdio::Stdout;
pub use self::testing::Testing;

/// A named delivery target for log records.
///
/// The dispatcher sends every surviving record to all registered backends concurrently. A
/// backend reports failure by returning an error; the dispatcher contains it, so one backend
/// failing never affects the others or the caller that logged the record.
#[async_trait]
pub trait Backend: fmt::Debug + Send + Sync + 'static {
    /// The unique name of this backend.
    ///
    /// It must stay the same for the lifetime of the backend.
    fn name(&self) -> &str;

    /// Deliver a log record.
    async fn send(&self, record: &Record) -> Result<(), Error>;

    /// Flush any buffered records.
    ///
    /// Default to a no-op.
    async fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}

#[async_trait]
impl<T: Backend + ?Sized> Backend for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn send(&self, record: &Record) -> Result<(), Error> {
        (**self).send(record).await
    }

    async fn flush(&self) -> Result<(), Error> {
        (**self).flush().await
    }
}
