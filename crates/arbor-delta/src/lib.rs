//! Metadata-driven structural comparison for Arbor.
//!
//! Two values of the same type are walked in lock step, guided by a
//! [`Metadata`] that names the type's properties and says how to read them.
//! Differences are collected into a hierarchical [`Delta`] report keyed by
//! property name, iterable index and map key.
//!
//! # Key Types
//!
//! - [`Metadata`] -- Named property accessors for one type, built with [`MetadataBuilder`]
//! - [`MetadataRegistry`] -- Per-type metadata cache
//! - [`PairVisitor`] -- Consumer of the [`PairEvent`] stream produced by [`walk_pair`]
//! - [`DeltaVisitor`] -- The visitor that builds a [`Delta`]
//! - [`Delta`] -- Difference report; renders as `path [left,right]` lines
//! - [`DeltaConfig`] -- Cycle detection, depth bound and pruning settings

pub mod config;
pub mod delta;
pub mod error;
pub mod metadata;
pub mod registry;
pub mod visitor;
pub mod walk;

pub use config::DeltaConfig;
pub use delta::{Change, Delta, DeltaEntry, DeltaKey, DeltaVisitor, Difference, FlatChange};
pub use error::{DeltaError, DeltaResult};
pub use metadata::{
    Describe, Item, Metadata, MetadataBuilder, ObjectRef, Property, PropertyKind, PropertyValue,
};
pub use registry::MetadataRegistry;
pub use visitor::{PairEvent, PairVisitor, Segment, VisitorResult};
pub use walk::{walk_pair, WalkOutcome};
