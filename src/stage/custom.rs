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

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::Error;
use crate::record::Record;
use crate::stage::Stage;
use crate::stage::Verdict;

type StageFn = dyn Fn(Record) -> Result<Verdict, Error> + Send + Sync + 'static;
type AsyncStageFn = dyn Fn(Record) -> BoxFuture<'static, Result<Verdict, Error>> + Send + Sync;
type Predicate = dyn Fn(&Record) -> bool + Send + Sync + 'static;

/// A stage made of a synchronous closure.
///
/// # Examples
///
/// ```
/// use logrelay::stage::FnStage;
/// use logrelay::stage::Verdict;
///
/// let stage = FnStage::new(|record| {
///     Ok(Verdict::Continue(record.into_builder().context("service", "billing").build()))
/// });
/// ```
pub struct FnStage {
    f: Box<StageFn>,
}

impl fmt::Debug for FnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FnStage {{ ... }}")
    }
}

impl FnStage {
    /// Create a new [`FnStage`].
    pub fn new(f: impl Fn(Record) -> Result<Verdict, Error> + Send + Sync + 'static) -> Self {
        FnStage { f: Box::new(f) }
    }
}

#[async_trait]
impl Stage for FnStage {
    async fn process(&self, record: Record) -> Result<Verdict, Error> {
        (self.f)(record)
    }
}

/// A stage made of a closure returning a future, for stages that wait on something.
///
/// # Examples
///
/// ```
/// use logrelay::stage::AsyncFnStage;
/// use logrelay::stage::Verdict;
///
/// let stage = AsyncFnStage::new(|record| async move {
///     // look up enrichment data here
///     Ok::<_, logrelay::Error>(Verdict::Continue(record))
/// });
/// ```
pub struct AsyncFnStage {
    f: Box<AsyncStageFn>,
}

impl fmt::Debug for AsyncFnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AsyncFnStage {{ ... }}")
    }
}

impl AsyncFnStage {
    /// Create a new [`AsyncFnStage`].
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Record) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Verdict, Error>> + Send + 'static,
    {
        AsyncFnStage {
            f: Box::new(move |record| f(record).boxed()),
        }
    }
}

#[async_trait]
impl Stage for AsyncFnStage {
    async fn process(&self, record: Record) -> Result<Verdict, Error> {
        (self.f)(record).await
    }
}

/// A stage that drops every record the predicate rejects.
///
/// # Examples
///
/// ```
/// use logrelay::stage::FilterStage;
///
/// let stage = FilterStage::new(|record| !record.message().contains("healthcheck"));
/// ```
pub struct FilterStage {
    f: Box<Predicate>,
}

impl fmt::Debug for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FilterStage {{ ... }}")
    }
}

impl FilterStage {
    /// Create a new [`FilterStage`]. Records for which `f` returns `false` are dropped.
    pub fn new(f: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self {
        FilterStage { f: Box::new(f) }
    }
}

#[async_trait]
impl Stage for FilterStage {
    async fn process(&self, record: Record) -> Result<Verdict, Error> {
        if (self.f)(&record) {
            Ok(Verdict::Continue(record))
        } else {
            Ok(Verdict::Drop)
        }
    }
}
