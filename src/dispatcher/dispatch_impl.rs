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

use std::any::Any;
use std::borrow::Cow;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use arc_swap::ArcSwap;
use futures::FutureExt;
use futures::future::join_all;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;

use crate::Backend;
use crate::Error;
use crate::Stage;
use crate::Trap;
use crate::Verdict;
use crate::dispatcher::LogCall;
use crate::record::Context;
use crate::record::ErrorInfo;
use crate::record::Level;
use crate::record::Record;

type Backends = Vec<Arc<dyn Backend>>;
type Stages = Vec<Arc<dyn Stage>>;

/// The dispatch core: gates records by level, runs them through the stage chain and fans the
/// survivors out to every backend.
///
/// Backends and stages can be changed at any time through [`add_backend`], [`remove_backend`]
/// and [`add_stage`]. A log call works on the configuration it observed when it reached each
/// step, so changes never affect records already past that step.
///
/// [`add_backend`]: Dispatcher::add_backend
/// [`remove_backend`]: Dispatcher::remove_backend
/// [`add_stage`]: Dispatcher::add_stage
#[derive(Debug)]
pub struct Dispatcher {
    min_level: Level,
    backends: ArcSwap<Backends>,
    stages: ArcSwap<Stages>,
    trap: Arc<dyn Trap>,
    // closed on construction so `wait` only waits for the tasks in flight
    deliveries: TaskTracker,
}

impl Dispatcher {
    pub(super) fn new(
        min_level: Level,
        backends: Backends,
        stages: Stages,
        trap: Arc<dyn Trap>,
    ) -> Result<Self, Error> {
        for (i, backend) in backends.iter().enumerate() {
            if backends[..i].iter().any(|b| b.name() == backend.name()) {
                return Err(Error::duplicate_backend(backend.name()));
            }
        }

        let deliveries = TaskTracker::new();
        deliveries.close();

        Ok(Self {
            min_level,
            backends: ArcSwap::from_pointee(backends),
            stages: ArcSwap::from_pointee(stages),
            trap,
            deliveries,
        })
    }

    /// The minimum level a record must have to be dispatched.
    pub fn min_level(&self) -> Level {
        self.min_level
    }

    /// Whether records of `level` pass the level gate.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    /// Start a log call at `level`.
    pub fn log(&self, level: Level, message: impl Into<Cow<'static, str>>) -> LogCall<'_> {
        LogCall::new(self, level, message.into())
    }

    /// Start a log call at [`Level::Debug`].
    pub fn debug(&self, message: impl Into<Cow<'static, str>>) -> LogCall<'_> {
        self.log(Level::Debug, message)
    }

    /// Start a log call at [`Level::Info`].
    pub fn info(&self, message: impl Into<Cow<'static, str>>) -> LogCall<'_> {
        self.log(Level::Info, message)
    }

    /// Start a log call at [`Level::Warn`].
    pub fn warn(&self, message: impl Into<Cow<'static, str>>) -> LogCall<'_> {
        self.log(Level::Warn, message)
    }

    /// Start a log call at [`Level::Error`].
    pub fn error(&self, message: impl Into<Cow<'static, str>>) -> LogCall<'_> {
        self.log(Level::Error, message)
    }

    /// Start a log call at [`Level::Fatal`].
    pub fn fatal(&self, message: impl Into<Cow<'static, str>>) -> LogCall<'_> {
        self.log(Level::Fatal, message)
    }

    /// Register a backend after construction.
    ///
    /// # Errors
    ///
    /// Return an error of kind [`DuplicateBackend`](crate::ErrorKind::DuplicateBackend) if a
    /// backend with the same name is registered. The registered backends are left unchanged.
    pub fn add_backend(&self, backend: impl Backend) -> Result<(), Error> {
        let backend: Arc<dyn Backend> = Arc::new(backend);

        let mut duplicate = false;
        self.backends.rcu(|current| {
            duplicate = current.iter().any(|b| b.name() == backend.name());
            if duplicate {
                Arc::clone(current)
            } else {
                let mut next = Backends::clone(current);
                next.push(Arc::clone(&backend));
                Arc::new(next)
            }
        });

        if duplicate {
            return Err(Error::duplicate_backend(backend.name()));
        }
        Ok(())
    }

    /// Remove the backend named `name`. Does nothing if there is none.
    pub fn remove_backend(&self, name: &str) {
        if !self.backends.load().iter().any(|b| b.name() == name) {
            return;
        }

        self.backends.rcu(|current| {
            current
                .iter()
                .filter(|b| b.name() != name)
                .cloned()
                .collect::<Backends>()
        });
    }

    /// The names of the registered backends, in registration order.
    pub fn backend_names(&self) -> Vec<String> {
        self.backends
            .load()
            .iter()
            .map(|b| b.name().to_string())
            .collect()
    }

    /// Append a stage to the chain.
    pub fn add_stage(&self, stage: impl Stage) {
        let stage: Arc<dyn Stage> = Arc::new(stage);
        self.stages.rcu(|current| {
            let mut next = Stages::clone(current);
            next.push(Arc::clone(&stage));
            next
        });
    }

    /// The number of stages in the chain.
    pub fn stage_count(&self) -> usize {
        self.stages.load().len()
    }

    /// Wait for every delivery in flight, then flush all backends.
    ///
    /// Flush failures are sent to the trap.
    pub async fn flush(&self) {
        self.deliveries.wait().await;

        let backends = self.backends.load_full();
        let trap = &self.trap;
        let flushes = backends.iter().map(|backend| async move {
            if let Err(err) = backend.flush().await {
                let err = Error::new("failed to flush backend")
                    .with_context("backend", backend.name())
                    .with_source(err);
                trap.trap(&err);
            }
        });
        join_all(flushes).await;
    }

    pub(super) async fn dispatch(
        &self,
        level: Level,
        message: Cow<'static, str>,
        error: Option<ErrorInfo>,
        context: Context,
    ) -> Result<(), Error> {
        if !self.enabled(level) {
            return Ok(());
        }

        let mut builder = Record::builder()
            .level(level)
            .message(message)
            .contexts(context);
        if let Some(error) = error {
            builder = builder.error(error);
        }
        let mut record = builder.build();

        let stages = self.stages.load_full();
        for (position, stage) in stages.iter().enumerate() {
            match stage.process(record).await {
                Ok(Verdict::Continue(next)) => record = next,
                Ok(Verdict::Drop) => return Ok(()),
                Err(err) => return Err(err.with_context("stage", position)),
            }
        }

        let backends = self.backends.load_full();
        if backends.is_empty() {
            return Ok(());
        }

        let delivery = deliver(backends, Arc::new(record), Arc::clone(&self.trap));
        if Handle::try_current().is_ok() {
            self.deliveries.spawn(delivery);
        } else {
            delivery.await;
        }
        Ok(())
    }
}

async fn deliver(backends: Arc<Backends>, record: Arc<Record>, trap: Arc<dyn Trap>) {
    let deliveries = backends.iter().map(|backend| {
        let record = &record;
        let trap = &trap;
        async move {
            let err = match AssertUnwindSafe(backend.send(record)).catch_unwind().await {
                Ok(Ok(())) => return,
                Ok(Err(err)) => err,
                Err(payload) => {
                    Error::new(format!("backend panicked: {}", panic_message(&*payload)))
                }
            };

            let err = Error::new("failed to deliver record")
                .with_context("backend", backend.name())
                .with_context("level", record.level())
                .with_source(err);
            trap.trap(&err);
        }
    });

    join_all(deliveries).await;
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}
