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

//! Logrelay is a client-side log dispatch pipeline.
//!
//! # Overview
//!
//! Every log call is gated by a minimum level, turned into an immutable [`Record`], passed
//! through an ordered chain of [`Stage`]s that may transform or drop it, and finally delivered
//! to all registered [`Backend`]s concurrently. A failing backend never affects the other
//! backends or the caller: its error goes to a [`Trap`].
//!
//! One dispatcher is active per process. It is set up with [`initialize`], looked up with
//! [`get_active`], and cleared with [`reset`].
//!
//! # Examples
//!
//! ```
//! use logrelay::backend;
//! use logrelay::record::Level;
//! use logrelay::stage::StaticContext;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), logrelay::Error> {
//! let mut service = StaticContext::default();
//! service.insert("service", "checkout");
//!
//! let dispatcher = logrelay::builder()
//!     .min_level(Level::Info)
//!     .stage(service)
//!     .backend(backend::Stdout::default())
//!     .build()?;
//!
//! dispatcher.info("order placed").context("order_id", 1024).await?;
//! dispatcher.debug("cart details").await?; // below the minimum level
//! dispatcher.flush().await;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod backend;
pub mod layout;
pub mod record;
pub mod stage;
pub mod trap;

pub use backend::Backend;
pub use layout::Layout;
pub use record::Level;
pub use record::Record;
pub use stage::Stage;
pub use stage::Verdict;
pub use trap::Trap;

mod error;
pub use error::Error;
pub use error::ErrorKind;

mod dispatcher;
pub use dispatcher::*;

mod instance;
pub use instance::Instance;
pub use instance::get_active;
pub use instance::initialize;
pub use instance::reset;
