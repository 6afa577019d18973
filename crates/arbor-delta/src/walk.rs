//! Lock-step, depth-first comparison of two values that share one
//! [`Metadata`].
//!
//! Structural correspondence comes from the metadata alone: the i-th
//! property of the left value is compared with the i-th property of the
//! right one, iterables are aligned by index and maps by key. Nothing is
//! matched by content, so reordered or renamed structure shows up as a
//! difference rather than a move.

use std::any::TypeId;
use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};

use serde_json::Value;
use tracing::{trace, warn};

use crate::config::DeltaConfig;
use crate::error::{DeltaError, DeltaResult};
use crate::metadata::{Item, Metadata, ObjectRef, Property, PropertyValue};
use crate::visitor::{PairEvent, PairVisitor, Segment, VisitorResult};

/// How a walk ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkOutcome {
    /// Every property pair was visited.
    Completed,
    /// The visitor returned [`VisitorResult::Stop`].
    Stopped,
}

/// Walk `left` and `right` in lock step, reporting to `visitor`.
///
/// Two things are never descended into:
///
/// - a pair where both sides are the same object, since nothing can differ;
/// - a pair already open on the current path, when cycle detection is on.
///   The visitor receives [`PairEvent::Cycle`] instead.
///
/// Accessor failures abort the walk and are returned as is.
pub fn walk_pair<T, V>(
    left: &T,
    right: &T,
    metadata: &Metadata<T>,
    visitor: &mut V,
    config: &DeltaConfig,
) -> DeltaResult<WalkOutcome>
where
    T: 'static,
    V: PairVisitor + ?Sized,
{
    if std::ptr::eq(left, right) {
        trace!(type_name = metadata.type_name(), "same value on both sides");
        return Ok(WalkOutcome::Completed);
    }

    let mut walker = Walker {
        visitor,
        config,
        open: HashSet::new(),
        depth: 0,
    };
    walker.open.insert((identity(left), identity(right)));

    let left_properties = metadata.read(left)?;
    let right_properties = metadata.read(right)?;
    match walker.properties(&left_properties, &right_properties)? {
        Flow::Continue => Ok(WalkOutcome::Completed),
        Flow::Stop => {
            warn!(type_name = metadata.type_name(), "comparison stopped by visitor");
            Ok(WalkOutcome::Stopped)
        }
    }
}

/// A value's type and address. Neither alone identifies it: a field at
/// offset zero shares its address with the struct that holds it.
type Identity = (TypeId, usize);

fn identity<T: 'static>(value: &T) -> Identity {
    (TypeId::of::<T>(), value as *const T as *const () as usize)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

impl From<VisitorResult> for Flow {
    fn from(result: VisitorResult) -> Self {
        match result {
            VisitorResult::Stop => Flow::Stop,
            VisitorResult::Continue | VisitorResult::Skip => Flow::Continue,
        }
    }
}

struct Walker<'w, V: ?Sized> {
    visitor: &'w mut V,
    config: &'w DeltaConfig,
    /// Identity pairs of the structured values open on the current path.
    open: HashSet<(Identity, Identity)>,
    depth: usize,
}

impl<V: PairVisitor + ?Sized> Walker<'_, V> {
    fn properties(&mut self, left: &[Property<'_>], right: &[Property<'_>]) -> DeltaResult<Flow> {
        if left.len() != right.len() {
            return Err(DeltaError::ShapeMismatch {
                left: format!("{} properties", left.len()),
                right: format!("{} properties", right.len()),
            });
        }
        for (l, r) in left.iter().zip(right) {
            if l.name != r.name {
                return Err(DeltaError::ShapeMismatch {
                    left: l.name.to_string(),
                    right: r.name.to_string(),
                });
            }
            if self.property(l.name, &l.value, &r.value)? == Flow::Stop {
                return Ok(Flow::Stop);
            }
        }
        Ok(Flow::Continue)
    }

    fn property(
        &mut self,
        name: &str,
        left: &PropertyValue<'_>,
        right: &PropertyValue<'_>,
    ) -> DeltaResult<Flow> {
        let segment = Segment::Property(name);
        match (left, right) {
            (PropertyValue::Single(l), PropertyValue::Single(r)) => self.item(segment, Some(l), Some(r)),
            (PropertyValue::Iterable(ls), PropertyValue::Iterable(rs)) => {
                if let Some(flow) = self.enter(segment) {
                    return Ok(flow);
                }
                for index in 0..ls.len().max(rs.len()) {
                    if self.item(Segment::Index(index), ls.get(index), rs.get(index))? == Flow::Stop {
                        return Ok(Flow::Stop);
                    }
                }
                Ok(self.exit(segment))
            }
            (PropertyValue::Map(lm), PropertyValue::Map(rm)) => {
                if let Some(flow) = self.enter(segment) {
                    return Ok(flow);
                }
                let keys: BTreeSet<&str> = lm.keys().chain(rm.keys()).map(String::as_str).collect();
                for key in keys {
                    if self.item(Segment::Key(key), lm.get(key), rm.get(key))? == Flow::Stop {
                        return Ok(Flow::Stop);
                    }
                }
                Ok(self.exit(segment))
            }
            _ => Err(DeltaError::ShapeMismatch {
                left: format!("{name}: {}", left.kind()),
                right: format!("{name}: {}", right.kind()),
            }),
        }
    }

    /// Compare one pair of items. A missing item counts as null.
    fn item(
        &mut self,
        segment: Segment<'_>,
        left: Option<&Item<'_>>,
        right: Option<&Item<'_>>,
    ) -> DeltaResult<Flow> {
        if let (Some(Item::Object(l)), Some(Item::Object(r))) = (left, right) {
            return self.nested(segment, l, r);
        }

        // At most one side is structured; with nothing to pair it against
        // it is compared in rendered form.
        let left = leaf_value(left);
        let right = leaf_value(right);
        trace!(%segment, %left, %right, "comparing leaf");
        let result = self.visitor.visit(PairEvent::Leaf {
            segment,
            left: &left,
            right: &right,
        });
        Ok(result.into())
    }

    fn nested(
        &mut self,
        segment: Segment<'_>,
        left: &ObjectRef<'_>,
        right: &ObjectRef<'_>,
    ) -> DeltaResult<Flow> {
        let pair = (left.identity(), right.identity());
        if pair.0 == pair.1 {
            return Ok(Flow::Continue);
        }
        if self.config.detect_cycles && self.open.contains(&pair) {
            warn!(%segment, type_name = left.meta().type_name(), "circular reference");
            return Ok(self.visitor.visit(PairEvent::Cycle(segment)).into());
        }
        if let Some(max_depth) = self.config.max_depth {
            if self.depth >= max_depth {
                return Err(DeltaError::DepthExceeded(max_depth));
            }
        }
        if let Some(flow) = self.enter(segment) {
            return Ok(flow);
        }

        let left_properties = left.meta().read_any(left.value())?;
        let right_properties = right.meta().read_any(right.value())?;

        self.open.insert(pair);
        self.depth += 1;
        let flow = self.properties(&left_properties, &right_properties)?;
        self.depth -= 1;
        self.open.remove(&pair);

        match flow {
            Flow::Stop => Ok(Flow::Stop),
            Flow::Continue => Ok(self.exit(segment)),
        }
    }

    /// `None` when the walk should descend into `segment`.
    fn enter(&mut self, segment: Segment<'_>) -> Option<Flow> {
        match self.visitor.visit(PairEvent::Enter(segment)) {
            VisitorResult::Continue => None,
            VisitorResult::Skip => Some(Flow::Continue),
            VisitorResult::Stop => Some(Flow::Stop),
        }
    }

    fn exit(&mut self, segment: Segment<'_>) -> Flow {
        self.visitor.visit(PairEvent::Exit(segment)).into()
    }
}

fn leaf_value<'i>(item: Option<&'i Item<'_>>) -> Cow<'i, Value> {
    match item {
        None | Some(Item::Null) => Cow::Owned(Value::Null),
        Some(Item::Scalar(value)) => Cow::Borrowed(value),
        Some(Item::Object(object)) => Cow::Owned(Value::String(object.render())),
    }
}
