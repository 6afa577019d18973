//! Property metadata driving structural comparison.
//!
//! A [`Metadata<T>`] lists the named properties of `T`, each with an accessor
//! closure supplied once through [`MetadataBuilder`]. Every property is
//! classified as a single value, an iterable or a map. Structured values are
//! handed out together with the metadata of their own type, so a comparison
//! can recurse through a graph without knowing any concrete type.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::{DeltaError, DeltaResult};

/// Shape of a property's value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// A single value, plain or structured.
    Scalar,
    /// An ordered sequence of values, compared by index.
    Iterable,
    /// A string-keyed mapping, compared by key.
    Map,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => f.write_str("scalar"),
            Self::Iterable => f.write_str("iterable"),
            Self::Map => f.write_str("map"),
        }
    }
}

// ---------------------------------------------------------------
// Erased values
// ---------------------------------------------------------------

/// Type-erased metadata, so values of any type can be nested in any other.
pub trait Describe: Send + Sync {
    /// Name of the described type, used in reports and errors.
    fn type_name(&self) -> &str;

    /// Read every property of `value`, in declaration order.
    ///
    /// Fails with [`DeltaError::TypeMismatch`] if `value` is not of the
    /// described type.
    fn read_any<'a>(&'a self, value: &'a dyn Any) -> DeltaResult<Vec<Property<'a>>>;

    /// Render `value` for a leaf difference.
    fn render_any(&self, value: &dyn Any) -> String;
}

#[derive(Clone)]
enum Target<'a> {
    Borrowed(&'a dyn Any),
    Shared(Arc<dyn Any + Send + Sync>),
}

/// A structured value together with the metadata that describes it.
#[derive(Clone)]
pub struct ObjectRef<'a> {
    target: Target<'a>,
    meta: &'a dyn Describe,
}

impl<'a> ObjectRef<'a> {
    /// Metadata of the referenced value.
    pub fn meta(&self) -> &'a dyn Describe {
        self.meta
    }

    /// The referenced value.
    pub fn value(&self) -> &dyn Any {
        match &self.target {
            Target::Borrowed(value) => *value,
            Target::Shared(value) => &**value,
        }
    }

    /// Address of the referenced value.
    pub fn address(&self) -> usize {
        self.value() as *const dyn Any as *const () as usize
    }

    /// Concrete type of the referenced value.
    pub fn type_id(&self) -> TypeId {
        Any::type_id(self.value())
    }

    /// Identity of the referenced value: its type and its address.
    ///
    /// A struct and a field stored at offset zero share an address, so the
    /// address alone does not identify a value.
    pub fn identity(&self) -> (TypeId, usize) {
        (self.type_id(), self.address())
    }

    /// The value rendered by its metadata.
    pub fn render(&self) -> String {
        self.meta.render_any(self.value())
    }
}

impl fmt::Debug for ObjectRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("type", &self.meta.type_name())
            .field("address", &format_args!("{:#x}", self.address()))
            .finish()
    }
}

/// One value produced by an accessor.
#[derive(Clone, Debug)]
pub enum Item<'a> {
    /// No value. Also stands in for the missing side of unequal-length
    /// iterables and maps.
    Null,
    /// A plain value.
    Scalar(Value),
    /// A structured value to recurse into.
    Object(ObjectRef<'a>),
}

impl<'a> Item<'a> {
    /// Returns `true` for [`Item::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The structured value, if this is one.
    pub fn as_object(&self) -> Option<&ObjectRef<'a>> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }
}

/// The full value of one property.
#[derive(Clone, Debug)]
pub enum PropertyValue<'a> {
    Single(Item<'a>),
    Iterable(Vec<Item<'a>>),
    Map(BTreeMap<String, Item<'a>>),
}

impl PropertyValue<'_> {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Single(_) => PropertyKind::Scalar,
            Self::Iterable(_) => PropertyKind::Iterable,
            Self::Map(_) => PropertyKind::Map,
        }
    }
}

/// A property name paired with the value read from one instance.
#[derive(Clone, Debug)]
pub struct Property<'a> {
    pub name: &'a str,
    pub value: PropertyValue<'a>,
}

// ---------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------

enum Raw<'a> {
    Null,
    Scalar(Value),
    Object(Target<'a>),
}

enum RawValue<'a> {
    Single(Raw<'a>),
    Iterable(Vec<Raw<'a>>),
    Map(BTreeMap<String, Raw<'a>>),
}

type Accessor<T> = Box<dyn for<'a> Fn(&'a T) -> DeltaResult<RawValue<'a>> + Send + Sync>;
type Renderer<T> = Box<dyn Fn(&T) -> String + Send + Sync>;

/// Where the metadata for a property's structured values comes from.
enum Schema {
    Plain,
    Nested(Arc<dyn Describe>),
    /// The values are of the owning type itself.
    Recursive,
}

struct PropertyDef<T> {
    name: String,
    kind: PropertyKind,
    schema: Schema,
    accessor: Accessor<T>,
}

/// Named property accessors for values of type `T`.
///
/// Built once per type with [`Metadata::builder`] and usually shared behind
/// an [`Arc`], either by nesting it in other metadata or through a
/// [`crate::MetadataRegistry`].
pub struct Metadata<T> {
    type_name: String,
    properties: Vec<PropertyDef<T>>,
    renderer: Option<Renderer<T>>,
}

impl<T: 'static> Metadata<T> {
    /// Start describing a type.
    pub fn builder(type_name: impl Into<String>) -> MetadataBuilder<T> {
        MetadataBuilder {
            type_name: type_name.into(),
            properties: Vec::new(),
            renderer: None,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Number of declared properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Declared properties and their kinds, in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, PropertyKind)> {
        self.properties.iter().map(|p| (p.name.as_str(), p.kind))
    }

    /// Kind of the named property.
    pub fn kind_of(&self, name: &str) -> Option<PropertyKind> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.kind)
    }

    /// Read every property of `value`, in declaration order.
    ///
    /// The first failing accessor aborts the read.
    pub fn read<'a>(&'a self, value: &'a T) -> DeltaResult<Vec<Property<'a>>> {
        self.properties
            .iter()
            .map(|def| -> DeltaResult<Property<'a>> {
                let raw = (def.accessor)(value)?;
                let meta: Option<&'a dyn Describe> = match &def.schema {
                    Schema::Plain => None,
                    Schema::Nested(meta) => Some(&**meta),
                    Schema::Recursive => Some(self),
                };
                Ok(Property {
                    name: &def.name,
                    value: attach(&def.name, raw, meta)?,
                })
            })
            .collect()
    }

    /// Render `value` with the configured renderer, or as the type name.
    pub fn render(&self, value: &T) -> String {
        match &self.renderer {
            Some(render) => render(value),
            None => self.type_name.clone(),
        }
    }
}

impl<T: 'static> Describe for Metadata<T> {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn read_any<'a>(&'a self, value: &'a dyn Any) -> DeltaResult<Vec<Property<'a>>> {
        let value = value
            .downcast_ref::<T>()
            .ok_or_else(|| DeltaError::TypeMismatch {
                expected: self.type_name.clone(),
            })?;
        self.read(value)
    }

    fn render_any(&self, value: &dyn Any) -> String {
        match value.downcast_ref::<T>() {
            Some(value) => self.render(value),
            None => self.type_name.clone(),
        }
    }
}

impl<T> fmt::Debug for Metadata<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let properties: Vec<(&str, PropertyKind)> = self
            .properties
            .iter()
            .map(|p| (p.name.as_str(), p.kind))
            .collect();
        f.debug_struct("Metadata")
            .field("type_name", &self.type_name)
            .field("properties", &properties)
            .finish()
    }
}

/// Pair raw accessor output with the metadata of its structured values.
fn attach<'a>(
    property: &str,
    raw: RawValue<'a>,
    meta: Option<&'a dyn Describe>,
) -> DeltaResult<PropertyValue<'a>> {
    let item = |raw: Raw<'a>| -> DeltaResult<Item<'a>> {
        match raw {
            Raw::Null => Ok(Item::Null),
            Raw::Scalar(value) => Ok(Item::Scalar(value)),
            Raw::Object(target) => meta
                .map(|meta| Item::Object(ObjectRef { target, meta }))
                .ok_or_else(|| DeltaError::Accessor {
                    property: property.to_string(),
                    message: "structured value without metadata".to_string(),
                }),
        }
    };
    Ok(match raw {
        RawValue::Single(raw) => PropertyValue::Single(item(raw)?),
        RawValue::Iterable(raws) => {
            PropertyValue::Iterable(raws.into_iter().map(&item).collect::<DeltaResult<_>>()?)
        }
        RawValue::Map(raws) => PropertyValue::Map(
            raws.into_iter()
                .map(|(key, raw)| -> DeltaResult<(String, Item<'a>)> { Ok((key, item(raw)?)) })
                .collect::<DeltaResult<_>>()?,
        ),
    })
}

fn to_scalar<V: Serialize>(property: &str, value: &V) -> DeltaResult<Raw<'static>> {
    serde_json::to_value(value)
        .map(Raw::Scalar)
        .map_err(|e| DeltaError::Accessor {
            property: property.to_string(),
            message: e.to_string(),
        })
}

fn borrowed<U: 'static>(value: Option<&U>) -> Raw<'_> {
    value.map_or(Raw::Null, |value| Raw::Object(Target::Borrowed(value)))
}

fn shared<'a, U: Send + Sync + 'static>(value: Option<Arc<U>>) -> Raw<'a> {
    value.map_or(Raw::Null, |value| Raw::Object(Target::Shared(value)))
}

// ---------------------------------------------------------------
// Builder
// ---------------------------------------------------------------

/// Builder for [`Metadata`]. Properties are compared in the order they are
/// declared; names should be unique.
pub struct MetadataBuilder<T> {
    type_name: String,
    properties: Vec<PropertyDef<T>>,
    renderer: Option<Renderer<T>>,
}

impl<T: 'static> MetadataBuilder<T> {
    fn push<F>(mut self, name: &str, kind: PropertyKind, schema: Schema, accessor: F) -> Self
    where
        F: for<'a> Fn(&'a T) -> DeltaResult<RawValue<'a>> + Send + Sync + 'static,
    {
        self.properties.push(PropertyDef {
            name: name.to_string(),
            kind,
            schema,
            accessor: Box::new(accessor),
        });
        self
    }

    /// A plain value, compared through its JSON form.
    pub fn scalar<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Serialize,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        let property = name.to_string();
        self.push(name, PropertyKind::Scalar, Schema::Plain, move |value| {
            Ok(RawValue::Single(to_scalar(&property, &accessor(value))?))
        })
    }

    /// A plain value whose accessor can fail. The failure aborts the
    /// comparison as [`DeltaError::Accessor`].
    pub fn try_scalar<V, E, F>(self, name: &str, accessor: F) -> Self
    where
        V: Serialize,
        E: fmt::Display,
        F: Fn(&T) -> Result<V, E> + Send + Sync + 'static,
    {
        let property = name.to_string();
        self.push(name, PropertyKind::Scalar, Schema::Plain, move |value| {
            let scalar = accessor(value).map_err(|e| DeltaError::Accessor {
                property: property.clone(),
                message: e.to_string(),
            })?;
            Ok(RawValue::Single(to_scalar(&property, &scalar)?))
        })
    }

    /// A sequence of plain values.
    pub fn scalars<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Serialize,
        F: Fn(&T) -> Vec<V> + Send + Sync + 'static,
    {
        let property = name.to_string();
        self.push(name, PropertyKind::Iterable, Schema::Plain, move |value| {
            let items: Vec<Raw<'_>> = accessor(value)
                .iter()
                .map(|item| to_scalar(&property, item))
                .collect::<DeltaResult<_>>()?;
            Ok(RawValue::Iterable(items))
        })
    }

    /// A string-keyed map of plain values.
    pub fn scalar_map<V, F>(self, name: &str, accessor: F) -> Self
    where
        V: Serialize,
        F: Fn(&T) -> BTreeMap<String, V> + Send + Sync + 'static,
    {
        let property = name.to_string();
        self.push(name, PropertyKind::Map, Schema::Plain, move |value| {
            let entries: BTreeMap<String, Raw<'_>> = accessor(value)
                .into_iter()
                .map(|(key, item)| -> DeltaResult<(String, Raw<'_>)> {
                    Ok((key, to_scalar(&property, &item)?))
                })
                .collect::<DeltaResult<_>>()?;
            Ok(RawValue::Map(entries))
        })
    }

    /// A structured value borrowed from `T`.
    pub fn object<U, F>(self, name: &str, metadata: Arc<Metadata<U>>, accessor: F) -> Self
    where
        U: 'static,
        F: Fn(&T) -> Option<&U> + Send + Sync + 'static,
    {
        self.push(name, PropertyKind::Scalar, Schema::Nested(metadata), move |value| {
            Ok(RawValue::Single(borrowed(accessor(value))))
        })
    }

    /// A structured value held behind an [`Arc`], as in shared or cyclic
    /// graphs.
    pub fn shared<U, F>(self, name: &str, metadata: Arc<Metadata<U>>, accessor: F) -> Self
    where
        U: Send + Sync + 'static,
        F: Fn(&T) -> Option<Arc<U>> + Send + Sync + 'static,
    {
        self.push(name, PropertyKind::Scalar, Schema::Nested(metadata), move |value| {
            Ok(RawValue::Single(shared(accessor(value))))
        })
    }

    /// A sequence of structured values; `None` items are nulls.
    pub fn objects<U, F>(self, name: &str, metadata: Arc<Metadata<U>>, accessor: F) -> Self
    where
        U: 'static,
        F: Fn(&T) -> Vec<Option<&U>> + Send + Sync + 'static,
    {
        self.push(name, PropertyKind::Iterable, Schema::Nested(metadata), move |value| {
            Ok(RawValue::Iterable(accessor(value).into_iter().map(borrowed).collect()))
        })
    }

    /// A sequence of structured values held behind [`Arc`]s.
    pub fn shared_objects<U, F>(self, name: &str, metadata: Arc<Metadata<U>>, accessor: F) -> Self
    where
        U: Send + Sync + 'static,
        F: Fn(&T) -> Vec<Option<Arc<U>>> + Send + Sync + 'static,
    {
        self.push(name, PropertyKind::Iterable, Schema::Nested(metadata), move |value| {
            Ok(RawValue::Iterable(accessor(value).into_iter().map(shared).collect()))
        })
    }

    /// A string-keyed map of structured values.
    pub fn object_map<U, F>(self, name: &str, metadata: Arc<Metadata<U>>, accessor: F) -> Self
    where
        U: 'static,
        F: Fn(&T) -> BTreeMap<String, Option<&U>> + Send + Sync + 'static,
    {
        self.push(name, PropertyKind::Map, Schema::Nested(metadata), move |value| {
            let entries = accessor(value)
                .into_iter()
                .map(|(key, item)| (key, borrowed(item)))
                .collect();
            Ok(RawValue::Map(entries))
        })
    }

    /// A value of the type being described, borrowed from `T`.
    pub fn recursive<F>(self, name: &str, accessor: F) -> Self
    where
        F: Fn(&T) -> Option<&T> + Send + Sync + 'static,
    {
        self.push(name, PropertyKind::Scalar, Schema::Recursive, move |value| {
            Ok(RawValue::Single(borrowed(accessor(value))))
        })
    }

    /// A sequence of values of the type being described.
    pub fn recursive_objects<F>(self, name: &str, accessor: F) -> Self
    where
        F: Fn(&T) -> Vec<Option<&T>> + Send + Sync + 'static,
    {
        self.push(name, PropertyKind::Iterable, Schema::Recursive, move |value| {
            Ok(RawValue::Iterable(accessor(value).into_iter().map(borrowed).collect()))
        })
    }

    /// A value of the type being described, held behind an [`Arc`]. This is
    /// how self-referencing graphs are described.
    pub fn recursive_shared<F>(self, name: &str, accessor: F) -> Self
    where
        T: Send + Sync,
        F: Fn(&T) -> Option<Arc<T>> + Send + Sync + 'static,
    {
        self.push(name, PropertyKind::Scalar, Schema::Recursive, move |value| {
            Ok(RawValue::Single(shared(accessor(value))))
        })
    }

    /// How a value of `T` renders when it appears in a leaf difference,
    /// which happens when the other side is null.
    pub fn describe<F>(mut self, render: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.renderer = Some(Box::new(render));
        self
    }

    pub fn build(self) -> Metadata<T> {
        Metadata {
            type_name: self.type_name,
            properties: self.properties,
            renderer: self.renderer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Engine {
        power: u32,
    }

    struct Car {
        model: String,
        engine: Option<Engine>,
        wheels: Vec<u8>,
        extras: BTreeMap<String, bool>,
        spare: Vec<Engine>,
    }

    fn engine_meta() -> Arc<Metadata<Engine>> {
        Arc::new(
            Metadata::<Engine>::builder("Engine")
                .scalar("power", |e| e.power)
                .describe(|e| format!("Engine({}hp)", e.power))
                .build(),
        )
    }

    fn car_meta() -> Metadata<Car> {
        Metadata::<Car>::builder("Car")
            .scalar("model", |c| c.model.clone())
            .object("engine", engine_meta(), |c| c.engine.as_ref())
            .scalars("wheels", |c| c.wheels.clone())
            .scalar_map("extras", |c| c.extras.clone())
            .objects("spare", engine_meta(), |c| c.spare.iter().map(Some).collect())
            .build()
    }

    fn car() -> Car {
        Car {
            model: "roadster".to_string(),
            engine: Some(Engine { power: 300 }),
            wheels: vec![17, 17, 18, 18],
            extras: BTreeMap::from([("sunroof".to_string(), true)]),
            spare: vec![Engine { power: 90 }],
        }
    }

    #[test]
    fn declared_properties_keep_order() {
        let meta = car_meta();
        let props: Vec<(&str, PropertyKind)> = meta.properties().collect();
        assert_eq!(
            props,
            vec![
                ("model", PropertyKind::Scalar),
                ("engine", PropertyKind::Scalar),
                ("wheels", PropertyKind::Iterable),
                ("extras", PropertyKind::Map),
                ("spare", PropertyKind::Iterable),
            ]
        );
        assert_eq!(meta.len(), 5);
        assert_eq!(meta.kind_of("extras"), Some(PropertyKind::Map));
        assert_eq!(meta.kind_of("doors"), None);
    }

    #[test]
    fn read_produces_erased_values() {
        let meta = car_meta();
        let car = car();
        let props = meta.read(&car).unwrap();
        assert_eq!(props.len(), 5);

        match &props[0].value {
            PropertyValue::Single(Item::Scalar(value)) => assert_eq!(value, &json!("roadster")),
            other => panic!("unexpected model value: {other:?}"),
        }
        match &props[1].value {
            PropertyValue::Single(Item::Object(engine)) => {
                assert_eq!(engine.meta().type_name(), "Engine");
                assert_eq!(engine.render(), "Engine(300hp)");
                let nested = engine.meta().read_any(engine.value()).unwrap();
                assert_eq!(nested[0].name, "power");
            }
            other => panic!("unexpected engine value: {other:?}"),
        }
        match &props[2].value {
            PropertyValue::Iterable(items) => assert_eq!(items.len(), 4),
            other => panic!("unexpected wheels value: {other:?}"),
        }
        match &props[3].value {
            PropertyValue::Map(entries) => {
                assert!(matches!(entries.get("sunroof"), Some(Item::Scalar(v)) if v == &json!(true)))
            }
            other => panic!("unexpected extras value: {other:?}"),
        }
        assert_eq!(props[4].value.kind(), PropertyKind::Iterable);
    }

    #[test]
    fn missing_object_reads_as_null() {
        let meta = car_meta();
        let car = Car {
            engine: None,
            ..car()
        };
        let props = meta.read(&car).unwrap();
        assert!(matches!(&props[1].value, PropertyValue::Single(item) if item.is_null()));
    }

    #[test]
    fn object_identity_is_type_and_address() {
        let meta = car_meta();
        let car = car();
        let props = meta.read(&car).unwrap();
        let PropertyValue::Single(Item::Object(engine)) = &props[1].value else {
            panic!("engine should be structured");
        };
        let expected = car.engine.as_ref().unwrap() as *const Engine as usize;
        assert_eq!(engine.address(), expected);
        assert_eq!(engine.identity(), (TypeId::of::<Engine>(), expected));
    }

    #[test]
    fn failing_accessor_is_reported() {
        let meta = Metadata::<Car>::builder("Car")
            .try_scalar("horn", |_c| Err::<u8, _>("horn not fitted"))
            .build();
        let err = meta.read(&car()).unwrap_err();
        assert_eq!(
            err,
            DeltaError::Accessor {
                property: "horn".to_string(),
                message: "horn not fitted".to_string(),
            }
        );
    }

    #[test]
    fn wrong_type_is_a_mismatch() {
        let meta = engine_meta();
        let not_an_engine = 42u32;
        let err = meta.read_any(&not_an_engine).unwrap_err();
        assert_eq!(
            err,
            DeltaError::TypeMismatch {
                expected: "Engine".to_string()
            }
        );
        assert_eq!(meta.render_any(&not_an_engine), "Engine");
    }

    #[test]
    fn render_defaults_to_type_name() {
        let meta = Metadata::<Engine>::builder("Engine").build();
        assert!(meta.is_empty());
        assert_eq!(meta.render(&Engine { power: 1 }), "Engine");
    }

    #[test]
    fn debug_lists_properties() {
        let rendered = format!("{:?}", engine_meta());
        assert!(rendered.contains("Engine"));
        assert!(rendered.contains("power"));
    }
}
