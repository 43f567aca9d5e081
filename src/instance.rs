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

//! Keep exactly one active dispatcher.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::Dispatcher;
use crate::DispatcherBuilder;
use crate::Error;

static GLOBAL: Instance = Instance::new();

/// A slot holding at most one active [`Dispatcher`].
///
/// The slot is either empty or active. [`initialize`](Instance::initialize) fills an empty
/// slot and refuses to replace an active dispatcher, so registered backends and stages are
/// never dropped silently. [`reset`](Instance::reset) empties it.
///
/// The crate owns one process-wide instance behind [`initialize`], [`get_active`] and
/// [`reset`]. Tests can create their own independent instances.
#[derive(Debug, Default)]
pub struct Instance {
    active: ArcSwapOption<Dispatcher>,
}

impl Instance {
    /// Create a new empty [`Instance`].
    pub const fn new() -> Self {
        Self {
            active: ArcSwapOption::const_empty(),
        }
    }

    /// Build a dispatcher from `builder` and make it the active one.
    ///
    /// # Errors
    ///
    /// Return an error of kind [`AlreadyInitialized`](crate::ErrorKind::AlreadyInitialized) if
    /// a dispatcher is already active; that dispatcher stays active and unchanged. Errors from
    /// [`DispatcherBuilder::build`] are returned as is, leaving the slot empty.
    pub fn initialize(&self, builder: DispatcherBuilder) -> Result<Arc<Dispatcher>, Error> {
        if self.active.load().is_some() {
            return Err(Error::already_initialized());
        }

        let dispatcher = Arc::new(builder.build()?);
        let previous = self.active.rcu(|current| match current {
            Some(active) => Some(Arc::clone(active)),
            None => Some(Arc::clone(&dispatcher)),
        });

        if previous.is_some() {
            return Err(Error::already_initialized());
        }
        Ok(dispatcher)
    }

    /// Return the active dispatcher.
    ///
    /// # Errors
    ///
    /// Return an error of kind [`NotInitialized`](crate::ErrorKind::NotInitialized) if no
    /// dispatcher is active.
    pub fn get_active(&self) -> Result<Arc<Dispatcher>, Error> {
        self.active.load_full().ok_or_else(Error::not_initialized)
    }

    /// Empty the slot, returning the dispatcher that was active, if any.
    ///
    /// Resetting an empty slot does nothing.
    pub fn reset(&self) -> Option<Arc<Dispatcher>> {
        self.active.swap(None)
    }
}

/// Build a dispatcher and make it the process-wide active one.
///
/// This should be called early in the execution of a program.
///
/// # Errors
///
/// See [`Instance::initialize`].
///
/// # Examples
///
/// ```
/// use logrelay::backend;
///
/// let dispatcher = logrelay::initialize(logrelay::builder().backend(backend::Stdout::default()))
///     .unwrap();
/// assert!(logrelay::initialize(logrelay::builder()).is_err());
/// # logrelay::reset();
/// ```
pub fn initialize(builder: DispatcherBuilder) -> Result<Arc<Dispatcher>, Error> {
    GLOBAL.initialize(builder)
}

/// Return the process-wide active dispatcher.
///
/// # Errors
///
/// See [`Instance::get_active`].
pub fn get_active() -> Result<Arc<Dispatcher>, Error> {
    GLOBAL.get_active()
}

/// Clear the process-wide active dispatcher. Intended for test harnesses.
pub fn reset() -> Option<Arc<Dispatcher>> {
    GLOBAL.reset()
}
