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

use std::env;
use std::sync::Arc;

use crate::Backend;
use crate::Dispatcher;
use crate::Error;
use crate::Stage;
use crate::Trap;
use crate::record::Level;
use crate::trap::DefaultTrap;

/// The environment variable read by [`DispatcherBuilder::min_level_from_default_env`].
pub const DEFAULT_LEVEL_ENV: &str = "LOGRELAY_LEVEL";

/// Create a new empty [`DispatcherBuilder`] instance for configuring a dispatcher.
///
/// # Examples
///
/// ```
/// use logrelay::backend;
/// use logrelay::record::Level;
///
/// let dispatcher = logrelay::builder()
///     .min_level(Level::Info)
///     .backend(backend::Stderr::default())
///     .build()
///     .unwrap();
/// ```
pub fn builder() -> DispatcherBuilder {
    DispatcherBuilder::default()
}

/// A builder for configuring a [`Dispatcher`]: the minimum level, the initial backends, the
/// stage chain, and the trap receiving delivery failures.
///
/// Pass it to [`initialize`](crate::initialize) to set up the process-wide dispatcher, or call
/// [`build`](DispatcherBuilder::build) to construct a standalone one.
#[must_use = "call `build` to construct a dispatcher or pass it to `initialize`"]
#[derive(Debug)]
pub struct DispatcherBuilder {
    min_level: Level,
    backends: Vec<Arc<dyn Backend>>,
    stages: Vec<Arc<dyn Stage>>,
    trap: Arc<dyn Trap>,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self {
            min_level: Level::Debug,
            backends: vec![],
            stages: vec![],
            trap: Arc::new(DefaultTrap::default()),
        }
    }
}

impl DispatcherBuilder {
    /// Set the minimum level. Records strictly below it are discarded before they are built.
    ///
    /// Default to [`Level::Debug`].
    pub fn min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Read the minimum level from the environment variable `name`.
    ///
    /// The current minimum level is kept if the variable is not set.
    ///
    /// # Errors
    ///
    /// Return an error if the variable is set but is not a level name.
    ///
    /// # Examples
    ///
    /// ```
    /// let builder = logrelay::builder().min_level_from_env("MY_APP_LOG_LEVEL").unwrap();
    /// ```
    pub fn min_level_from_env(mut self, name: &str) -> Result<Self, Error> {
        match env::var(name) {
            Ok(value) => {
                self.min_level = value
                    .trim()
                    .parse()
                    .map_err(|err: Error| err.with_context("env", name))?;
                Ok(self)
            }
            Err(env::VarError::NotPresent) => Ok(self),
            Err(err) => Err(Error::new("failed to read minimum level")
                .with_context("env", name)
                .with_source(err)),
        }
    }

    /// Read the minimum level from the [`DEFAULT_LEVEL_ENV`] environment variable.
    ///
    /// See [`min_level_from_env`](DispatcherBuilder::min_level_from_env).
    pub fn min_level_from_default_env(self) -> Result<Self, Error> {
        self.min_level_from_env(DEFAULT_LEVEL_ENV)
    }

    /// Register a backend. Backend names must be unique.
    pub fn backend(mut self, backend: impl Backend) -> Self {
        self.backends.push(Arc::new(backend));
        self
    }

    /// Append a stage to the chain.
    pub fn stage(mut self, stage: impl Stage) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Set the trap that receives delivery and flush failures.
    ///
    /// Default to [`DefaultTrap`].
    pub fn trap(mut self, trap: impl Trap) -> Self {
        self.trap = Arc::new(trap);
        self
    }

    /// Build the [`Dispatcher`].
    ///
    /// # Errors
    ///
    /// Return an error of kind [`DuplicateBackend`](crate::ErrorKind::DuplicateBackend) if two
    /// backends share a name.
    pub fn build(self) -> Result<Dispatcher, Error> {
        Dispatcher::new(self.min_level, self.backends, self.stages, self.trap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::backend::Stderr;

    #[test]
    fn test_defaults() {
        let dispatcher = builder().build().unwrap();
        assert_eq!(dispatcher.min_level(), Level::Debug);
        assert!(dispatcher.backend_names().is_empty());
        assert_eq!(dispatcher.stage_count(), 0);
    }

    #[test]
    fn test_duplicate_backend_names_are_rejected() {
        let err = builder()
            .backend(Stderr::default().with_name("console"))
            .backend(Stderr::default().with_name("console"))
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateBackend);
    }

    #[test]
    fn test_min_level_from_unset_env_keeps_level() {
        let builder = builder()
            .min_level(Level::Warn)
            .min_level_from_env("LOGRELAY_TEST_SURELY_UNSET_VARIABLE")
            .unwrap();
        assert_eq!(builder.build().unwrap().min_level(), Level::Warn);
    }

    #[test]
    fn test_min_level_from_malformed_env_fails() {
        // PATH is always set and never a level name
        let err = builder().min_level_from_env("PATH").unwrap_err();
        assert_eq!(err.context_value("env"), Some("PATH"));
        assert!(err.message().starts_with("malformed level"));
    }
}
