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

//! Transform or drop log records before delivery.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::Error;
use crate::record::Record;

mod custom;
mod static_context;

pub use self::custom::AsyncFnStage;
pub use self::custom::FilterStage;
pub use self::custom::FnStage;
pub use self::static_context::StaticContext;

/// The outcome of a [`Stage`].
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Pass the record, possibly a new one, to the next stage.
    Continue(Record),
    /// Discard the record silently. No later stage and no backend sees it.
    Drop,
}

/// One step of the pipeline that runs before records are delivered.
///
/// Stages run one after another in registration order. A stage that returns an error aborts
/// the dispatch of that record and the error is returned to the caller of the log method.
#[async_trait]
pub trait Stage: fmt::Debug + Send + Sync + 'static {
    /// Process a record.
    async fn process(&self, record: Record) -> Result<Verdict, Error>;
}

#[async_trait]
impl<T: Stage + ?Sized> Stage for Arc<T> {
    async fn process(&self, record: Record) -> Result<Verdict, Error> {
        (**self).process(record).await
    }
}
