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

use std::io::Write;

use async_trait::async_trait;

use crate::Error;
use crate::backend::Backend;
use crate::layout::Layout;
use crate::layout::TextLayout;
use crate::record::Record;

/// A backend that writes log records to the standard output.
///
/// # Examples
///
/// ```
/// use logrelay::backend::Stdout;
///
/// let stdout_backend = Stdout::default();
/// ```
#[derive(Debug)]
pub struct Stdout {
    name: String,
    layout: Box<dyn Layout>,
}

impl Default for Stdout {
    fn default() -> Self {
        Self {
            name: "stdout".to_string(),
            layout: Box::new(TextLayout::default()),
        }
    }
}

impl Stdout {
    /// Set the layout for the [`Stdout`] backend.
    ///
    /// Default to [`TextLayout`].
    ///
    /// # Examples
    ///
    /// ```
    /// use logrelay::backend::Stdout;
    /// use logrelay::layout::JsonLayout;
    ///
    /// let stdout_backend = Stdout::default().with_layout(JsonLayout::default());
    /// ```
    pub fn with_layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Set the name of the [`Stdout`] backend.
    ///
    /// Default to `"stdout"`.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl Backend for Stdout {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, record: &Record) -> Result<(), Error> {
        let mut bytes = self.layout.format(record)?;
        bytes.push(b'\n');
        std::io::stdout()
            .write_all(&bytes)
            .map_err(Error::from_io_error)?;
        Ok(())
    }

    async fn flush(&self) -> Result<(), Error> {
        std::io::stdout().flush().map_err(Error::from_io_error)?;
        Ok(())
    }
}

/// A backend that writes log records to the standard error.
///
/// # Examples
///
/// ```
/// use logrelay::backend::Stderr;
///
/// let stderr_backend = Stderr::default();
/// ```
#[derive(Debug)]
pub struct Stderr {
    name: String,
    layout: Box<dyn Layout>,
}

impl Default for Stderr {
    fn default() -> Self {
        Self {
            name: "stderr".to_string(),
            layout: Box::new(TextLayout::default()),
        }
    }
}

impl Stderr {
    /// Set the layout for the [`Stderr`] backend.
    ///
    /// Default to [`TextLayout`].
    pub fn with_layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Set the name of the [`Stderr`] backend.
    ///
    /// Default to `"stderr"`.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl Backend for Stderr {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, record: &Record) -> Result<(), Error> {
        let mut bytes = self.layout.format(record)?;
        bytes.push(b'\n');
        std::io::stderr()
            .write_all(&bytes)
            .map_err(Error::from_io_error)?;
        Ok(())
    }

    async fn flush(&self) -> Result<(), Error> {
        std::io::stderr().flush().map_err(Error::from_io_error)?;
        Ok(())
    }
}
