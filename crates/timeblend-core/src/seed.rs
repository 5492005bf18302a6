//! Random-state location and perturbation over nested configurations.
//!
//! A [`SeedTree`] mirrors the shape of a nested configuration, keeping only
//! the paths that end in a random-seed parameter. New generations are built
//! by offsetting every leaf; the source tree is never mutated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Configuration key recognized as a random-seed parameter.
pub const RANDOM_STATE_KEY: &str = "random_state";

/// One node of a seed tree: either a seed value or a nested group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeedNode {
    Leaf(i64),
    Group(BTreeMap<String, SeedNode>),
}

impl SeedNode {
    fn generate(&self, offset: i64) -> SeedNode {
        match self {
            SeedNode::Leaf(seed) => SeedNode::Leaf(seed + offset),
            SeedNode::Group(children) => SeedNode::Group(
                children
                    .iter()
                    .map(|(k, v)| (k.clone(), v.generate(offset)))
                    .collect(),
            ),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            SeedNode::Leaf(seed) => Value::from(*seed),
            SeedNode::Group(children) => Value::Object(
                children
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
        }
    }
}

/// Seed parameters located in a nested configuration, keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedTree(pub BTreeMap<String, SeedNode>);

impl SeedTree {
    /// Scan a nested configuration for `key` at every depth.
    ///
    /// Every level holding `key` contributes a leaf with `initial` as its
    /// seed; object-valued entries are scanned recursively and attached when
    /// the recursion finds anything. An empty tree means the configuration
    /// exposes no fixed-seed knob and every run is unseeded.
    pub fn locate(config: &Value, key: &str, initial: i64) -> Self {
        match config {
            Value::Object(map) => Self(Self::locate_level(map, key, initial)),
            _ => Self::default(),
        }
    }

    fn locate_level(
        map: &serde_json::Map<String, Value>,
        key: &str,
        initial: i64,
    ) -> BTreeMap<String, SeedNode> {
        let mut found = BTreeMap::new();
        if map.contains_key(key) {
            found.insert(key.to_string(), SeedNode::Leaf(initial));
        }
        for (k, v) in map {
            if let Value::Object(inner) = v {
                let sub = Self::locate_level(inner, key, initial);
                if !sub.is_empty() {
                    found.insert(k.clone(), SeedNode::Group(sub));
                }
            }
        }
        found
    }

    /// Rebuild the tree with every leaf seed shifted by `offset`.
    pub fn generate(&self, offset: i64) -> Self {
        Self(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.generate(offset)))
                .collect(),
        )
    }

    /// Deep-merge this tree into a parameter object, seeds taking precedence.
    ///
    /// Groups merge recursively with any object already present under the
    /// same key; leaves overwrite. A non-object `params` is replaced
    /// wholesale.
    pub fn merge_into(&self, params: &mut Value) {
        if self.0.is_empty() {
            return;
        }
        if !params.is_object() {
            *params = Value::Object(serde_json::Map::new());
        }
        if let Value::Object(map) = params {
            Self::merge_level(&self.0, map);
        }
    }

    fn merge_level(
        overrides: &BTreeMap<String, SeedNode>,
        map: &mut serde_json::Map<String, Value>,
    ) {
        for (k, node) in overrides {
            match node {
                SeedNode::Leaf(_) => {
                    map.insert(k.clone(), node.to_value());
                }
                SeedNode::Group(children) => match map.get_mut(k) {
                    Some(Value::Object(existing)) => {
                        debug!("Combining seed overrides with caller params under '{}'", k);
                        Self::merge_level(children, existing);
                    }
                    _ => {
                        map.insert(k.clone(), node.to_value());
                    }
                },
            }
        }
    }

    /// Render the tree as a nested JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.iter().map(|(k, v)| (k.clone(), v.to_value())).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
