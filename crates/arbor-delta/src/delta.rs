//! Hierarchical difference reports.
//!
//! A [`Delta`] is a tree keyed by property name, iterable index or map key.
//! Every key holds exactly one of: a leaf difference, a circular-reference
//! marker, or a nested delta. [`DeltaVisitor`] is the only writer; it turns
//! the event stream of [`walk_pair`] into a report.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::DeltaConfig;
use crate::error::DeltaResult;
use crate::metadata::Metadata;
use crate::visitor::{PairEvent, PairVisitor, Segment, VisitorResult};
use crate::walk::{walk_pair, WalkOutcome};

/// Position of an entry within its parent delta.
///
/// Ordering puts properties first (by name), then indices (numerically),
/// then map keys (by key).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeltaKey {
    Property(String),
    Index(usize),
    Key(String),
}

impl DeltaKey {
    /// Extend a rendered path with this key.
    fn append_to(&self, path: &str) -> String {
        match self {
            Self::Property(name) if path.is_empty() => name.clone(),
            Self::Property(name) => format!("{path}.{name}"),
            Self::Index(index) => format!("{path}[{index}]"),
            Self::Key(key) => format!("{path}[{key:?}]"),
        }
    }
}

impl From<Segment<'_>> for DeltaKey {
    fn from(segment: Segment<'_>) -> Self {
        match segment {
            Segment::Property(name) => Self::Property(name.to_string()),
            Segment::Index(index) => Self::Index(index),
            Segment::Key(key) => Self::Key(key.to_string()),
        }
    }
}

impl fmt::Display for DeltaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.append_to(""))
    }
}

/// The two sides of a leaf difference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Difference {
    pub left: Value,
    pub right: Value,
}

/// What a delta holds under one key.
#[derive(Clone, Debug, PartialEq)]
pub enum DeltaEntry {
    /// The values differ.
    Changed(Difference),
    /// The comparison reached a pair already being compared.
    Circular,
    /// Differences inside a structured value, iterable or map.
    Nested(Delta),
}

/// Differences between two values of one type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Delta {
    entries: BTreeMap<DeltaKey, DeltaEntry>,
}

impl Delta {
    /// Compare `left` with `right` using the default [`DeltaConfig`].
    pub fn value_of<T: 'static>(left: &T, right: &T, metadata: &Metadata<T>) -> DeltaResult<Self> {
        Self::value_of_with(left, right, metadata, &DeltaConfig::default())
    }

    /// Compare `left` with `right`.
    pub fn value_of_with<T: 'static>(
        left: &T,
        right: &T,
        metadata: &Metadata<T>,
        config: &DeltaConfig,
    ) -> DeltaResult<Self> {
        let mut visitor = DeltaVisitor::with_config(config);
        walk_pair(left, right, metadata, &mut visitor, config)?;
        let delta = visitor.finish();
        debug!(
            type_name = metadata.type_name(),
            changes = delta.change_count(),
            "computed delta"
        );
        Ok(delta)
    }

    /// Returns `true` if `left` and `right` differ anywhere, stopping at the
    /// first difference. Agrees with `!value_of(..).is_empty()` under the
    /// default configuration.
    pub fn differs<T: 'static>(left: &T, right: &T, metadata: &Metadata<T>) -> DeltaResult<bool> {
        let mut first_difference = |event: PairEvent<'_>| match event {
            PairEvent::Leaf { left, right, .. } if left != right => VisitorResult::Stop,
            PairEvent::Cycle(_) => VisitorResult::Stop,
            _ => VisitorResult::Continue,
        };
        let outcome = walk_pair(left, right, metadata, &mut first_difference, &DeltaConfig::default())?;
        Ok(outcome == WalkOutcome::Stopped)
    }

    /// Returns `true` if no difference was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of direct entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of leaf differences and circular markers, at any depth.
    pub fn change_count(&self) -> usize {
        self.entries
            .values()
            .map(|entry| match entry {
                DeltaEntry::Nested(delta) => delta.change_count(),
                DeltaEntry::Changed(_) | DeltaEntry::Circular => 1,
            })
            .sum()
    }

    pub fn get(&self, key: &DeltaKey) -> Option<&DeltaEntry> {
        self.entries.get(key)
    }

    /// Entry for a named property.
    pub fn property(&self, name: &str) -> Option<&DeltaEntry> {
        self.entries.get(&DeltaKey::Property(name.to_string()))
    }

    /// Direct entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&DeltaKey, &DeltaEntry)> {
        self.entries.iter()
    }

    /// Every leaf difference and circular marker with its full path, in
    /// report order.
    pub fn flatten(&self) -> Vec<FlatChange> {
        let mut changes = Vec::new();
        self.flatten_into("", &mut changes);
        changes
    }

    fn flatten_into(&self, path: &str, changes: &mut Vec<FlatChange>) {
        for (key, entry) in &self.entries {
            let path = key.append_to(path);
            match entry {
                DeltaEntry::Changed(difference) => changes.push(FlatChange {
                    path,
                    change: Change::Changed {
                        left: difference.left.clone(),
                        right: difference.right.clone(),
                    },
                }),
                DeltaEntry::Circular => changes.push(FlatChange {
                    path,
                    change: Change::Circular,
                }),
                DeltaEntry::Nested(delta) => delta.flatten_into(&path, changes),
            }
        }
    }

    fn insert(&mut self, key: DeltaKey, entry: DeltaEntry) {
        self.entries.insert(key, entry);
    }
}

/// The flattened report, one `path [left,right]` or
/// `path <circular reference>` line per change. Values render as JSON and
/// map keys are quoted, so `tags[2]` and `notes["2"]` stay distinct.
impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for change in self.flatten() {
            writeln!(f, "{change}")?;
        }
        Ok(())
    }
}

/// A difference addressed by its full path, such as `contents[2].weight`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlatChange {
    pub path: String,
    #[serde(flatten)]
    pub change: Change,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    Changed { left: Value, right: Value },
    Circular,
}

impl fmt::Display for FlatChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.change {
            Change::Changed { left, right } => {
                write!(f, "{} [{left},{right}]", self.path)
            }
            Change::Circular => write!(f, "{} <circular reference>", self.path),
        }
    }
}

// ---------------------------------------------------------------
// DeltaVisitor
// ---------------------------------------------------------------

/// Builds a [`Delta`] from walk events.
///
/// Each `Enter` opens a nested delta on a stack; the matching `Exit` closes
/// it and attaches it to the delta below. The top of the stack is always
/// the delta currently being populated.
#[derive(Debug)]
pub struct DeltaVisitor {
    root: Delta,
    open: Vec<(DeltaKey, Delta)>,
    prune_empty: bool,
}

impl DeltaVisitor {
    pub fn new() -> Self {
        Self::with_config(&DeltaConfig::default())
    }

    pub fn with_config(config: &DeltaConfig) -> Self {
        Self {
            root: Delta::default(),
            open: Vec::new(),
            prune_empty: config.prune_empty,
        }
    }

    /// The delta currently being populated.
    pub fn current(&self) -> &Delta {
        self.open.last().map_or(&self.root, |(_, delta)| delta)
    }

    /// Number of open nested deltas.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Close whatever is still open, which happens after a stopped walk,
    /// and return the report.
    pub fn finish(mut self) -> Delta {
        while self.close() {}
        self.root
    }

    fn current_mut(&mut self) -> &mut Delta {
        match self.open.last_mut() {
            Some((_, delta)) => delta,
            None => &mut self.root,
        }
    }

    fn close(&mut self) -> bool {
        let Some((key, delta)) = self.open.pop() else {
            return false;
        };
        if !(self.prune_empty && delta.is_empty()) {
            self.current_mut().insert(key, DeltaEntry::Nested(delta));
        }
        true
    }
}

impl Default for DeltaVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl PairVisitor for DeltaVisitor {
    fn visit(&mut self, event: PairEvent<'_>) -> VisitorResult {
        match event {
            PairEvent::Enter(segment) => self.open.push((segment.into(), Delta::default())),
            PairEvent::Leaf {
                segment,
                left,
                right,
            } => {
                if left != right {
                    let difference = Difference {
                        left: left.clone(),
                        right: right.clone(),
                    };
                    self.current_mut()
                        .insert(segment.into(), DeltaEntry::Changed(difference));
                }
            }
            PairEvent::Cycle(segment) => self.current_mut().insert(segment.into(), DeltaEntry::Circular),
            PairEvent::Exit(segment) => {
                if !self.close() {
                    warn!(%segment, "exit without a matching enter");
                }
            }
        }
        VisitorResult::Continue
    }
}
