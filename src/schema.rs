//! Record type descriptions: the schema the compiler walks.
//!
//! A [`Record`] describes itself once as an ordered list of
//! [`FieldDescriptor`]s. Each descriptor carries a stable field name, the
//! field's semantic [`FieldType`], the raw tag string, and an accessor that
//! reaches the field's slot inside a live instance. The compiler reads a
//! [`RecordType`] and never mutates it.
//!
//! ```ignore
//! #[derive(Default, Clone)]
//! struct Server {
//!     host: String,
//!     port: u16,
//!     tls: Tls,
//! }
//!
//! impl Record for Server {
//!     fn record_type() -> RecordType {
//!         RecordType::builder::<Self>()
//!             .field("Host", "HOST,parser=nonempty-string", |s| &mut s.host)
//!             .field("Port", "PORT,parser=parse-int,default=8080", |s| &mut s.port)
//!             .record("Tls", "", |s| &mut s.tls)
//!             .build()
//!     }
//! }
//! ```

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

/// A data record that can be populated by a compiled parser.
///
/// `Default` supplies both the starting instance for
/// [`CompiledParser::parse`](crate::CompiledParser::parse) and the zero value a
/// field is reset to when nothing could be resolved for it.
pub trait Record: Default + Clone + 'static {
    fn record_type() -> RecordType;
}

/// Semantic type identity of a field. Compared by `TypeId`; the name is for messages.
#[derive(Clone, Copy)]
pub struct FieldType {
    id: TypeId,
    name: &'static str,
}

impl FieldType {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for FieldType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for FieldType {}

impl Hash for FieldType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Type-erased access to one field slot of a record instance.
///
/// Every method returns `None`/`false` when the instance is not of the record
/// type the slot was declared on.
pub(crate) trait Slot: Send + Sync {
    fn get_mut<'a>(&self, record: &'a mut dyn Any) -> Option<&'a mut dyn Any>;

    /// Clone the slot's current value out.
    fn read(&self, record: &mut dyn Any) -> Option<Box<dyn Any>>;

    /// Put the slot back to its type's `Default`.
    fn reset(&self, record: &mut dyn Any) -> bool;
}

struct FieldSlot<R, T> {
    access: fn(&mut R) -> &mut T,
}

impl<R: 'static, T: Clone + Default + 'static> Slot for FieldSlot<R, T> {
    fn get_mut<'a>(&self, record: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        let record = record.downcast_mut::<R>()?;
        Some((self.access)(record) as &mut dyn Any)
    }

    fn read(&self, record: &mut dyn Any) -> Option<Box<dyn Any>> {
        let record = record.downcast_mut::<R>()?;
        Some(Box::new((self.access)(record).clone()) as Box<dyn Any>)
    }

    fn reset(&self, record: &mut dyn Any) -> bool {
        match record.downcast_mut::<R>() {
            Some(record) => {
                *(self.access)(record) = T::default();
                true
            }
            None => false,
        }
    }
}

/// One field of a record type.
#[derive(Clone)]
pub struct FieldDescriptor {
    name: String,
    ty: FieldType,
    tag: String,
    nested: Option<fn() -> RecordType>,
    pub(crate) slot: Arc<dyn Slot>,
}

impl FieldDescriptor {
    /// Field name, used by `defaultFrom` references and duplicate detection.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.ty
    }

    /// Raw tag string, empty when the field is untagged.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The nested record description, for fields declared with
    /// [`RecordTypeBuilder::record`].
    pub fn nested_type(&self) -> Option<RecordType> {
        self.nested.map(|describe| describe())
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("tag", &self.tag)
            .field("nested", &self.nested.is_some())
            .finish()
    }
}

/// Ordered field descriptors for one record type.
#[derive(Clone, Debug)]
pub struct RecordType {
    ty: FieldType,
    fields: Vec<FieldDescriptor>,
}

impl RecordType {
    pub fn builder<R: Record>() -> RecordTypeBuilder<R> {
        RecordTypeBuilder {
            fields: Vec::new(),
            _record: PhantomData,
        }
    }

    /// Shorthand for `R::record_type()`.
    pub fn of<R: Record>() -> Self {
        R::record_type()
    }

    pub fn record(&self) -> FieldType {
        self.ty
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Builds a [`RecordType`] in declaration order.
pub struct RecordTypeBuilder<R> {
    fields: Vec<FieldDescriptor>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> RecordTypeBuilder<R> {
    /// Declare a field. Whether it is a leaf depends on the registry the
    /// record is compiled against.
    pub fn field<T: Clone + Default + 'static>(
        mut self,
        name: impl Into<String>,
        tag: impl Into<String>,
        access: fn(&mut R) -> &mut T,
    ) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            ty: FieldType::of::<T>(),
            tag: tag.into(),
            nested: None,
            slot: Arc::new(FieldSlot { access }),
        });
        self
    }

    /// Declare a field whose type is itself a record. Untagged nested records
    /// are compiled recursively; pass `""` as the tag.
    pub fn record<N: Record>(
        mut self,
        name: impl Into<String>,
        tag: impl Into<String>,
        access: fn(&mut R) -> &mut N,
    ) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            ty: FieldType::of::<N>(),
            tag: tag.into(),
            nested: Some(N::record_type),
            slot: Arc::new(FieldSlot { access }),
        });
        self
    }

    pub fn build(self) -> RecordType {
        RecordType {
            ty: FieldType::of::<R>(),
            fields: self.fields,
        }
    }
}
