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

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::Error;
use crate::record::Record;
use crate::stage::Stage;
use crate::stage::Verdict;

/// A stage that attaches a fixed set of key-values to every record.
///
/// Keys the log call already set are left as they are.
///
/// # Examples
///
/// ```
/// use logrelay::stage::StaticContext;
///
/// let mut stage = StaticContext::default();
/// stage.insert("service", "billing");
/// stage.insert("version", 3);
/// ```
#[derive(Default, Debug, Clone)]
#[non_exhaustive]
pub struct StaticContext {
    kvs: BTreeMap<String, Value>,
}

impl StaticContext {
    /// Create a new [`StaticContext`] instance with a prebuilt key-value store.
    pub fn new(kvs: BTreeMap<String, Value>) -> Self {
        Self { kvs }
    }

    /// Insert a key-value pair into the static context.
    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.kvs.insert(key.into(), value.into());
    }

    /// Remove a key-value pair from the static context.
    pub fn remove(&mut self, key: &str) {
        self.kvs.remove(key);
    }
}

#[async_trait]
impl Stage for StaticContext {
    async fn process(&self, record: Record) -> Result<Verdict, Error> {
        let missing = self
            .kvs
            .iter()
            .filter(|(k, _)| record.context_value(k).is_none())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<Vec<_>>();

        if missing.is_empty() {
            return Ok(Verdict::Continue(record));
        }
        Ok(Verdict::Continue(record.into_builder().contexts(missing).build()))
    }
}
