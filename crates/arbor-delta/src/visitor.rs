//! The event protocol between the comparison walk and its consumers.
//!
//! A walk reports everything it sees as a [`PairEvent`] to a single
//! [`PairVisitor::visit`] callback. Structured values, iterables and maps
//! are bracketed by `Enter`/`Exit`; everything that cannot be descended into
//! arrives as one `Leaf` carrying both sides.

use std::fmt;

use serde_json::Value;

/// One step on the path from the compared pair to a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Segment<'e> {
    /// A named property.
    Property(&'e str),
    /// A position in an iterable.
    Index(usize),
    /// A key in a map.
    Key(&'e str),
}

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(name) => f.write_str(name),
            Self::Index(index) => write!(f, "[{index}]"),
            Self::Key(key) => write!(f, "[{key:?}]"),
        }
    }
}

/// Something the walk encountered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PairEvent<'e> {
    /// About to descend into a structured value, an iterable or a map.
    Enter(Segment<'e>),
    /// Two values that are compared as a whole. `left` and `right` may be
    /// equal; a structured value facing a null arrives rendered.
    Leaf {
        segment: Segment<'e>,
        left: &'e Value,
        right: &'e Value,
    },
    /// The pair under `segment` is already open on the current path.
    /// The walk does not descend into it again.
    Cycle(Segment<'e>),
    /// Finished with the value opened by the matching `Enter`.
    Exit(Segment<'e>),
}

/// What the walk should do after an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum VisitorResult {
    /// Keep going, descending where possible.
    #[default]
    Continue,
    /// Returned from `Enter`: do not descend, and send no matching `Exit`.
    /// Anywhere else it behaves like `Continue`.
    Skip,
    /// Abort the whole walk. No further events are sent, including the
    /// `Exit`s of values still open.
    Stop,
}

/// Consumer of a comparison walk.
///
/// Any `FnMut(PairEvent<'_>) -> VisitorResult` closure is a visitor.
pub trait PairVisitor {
    fn visit(&mut self, event: PairEvent<'_>) -> VisitorResult;
}

impl<F> PairVisitor for F
where
    F: FnMut(PairEvent<'_>) -> VisitorResult,
{
    fn visit(&mut self, event: PairEvent<'_>) -> VisitorResult {
        self(event)
    }
}
