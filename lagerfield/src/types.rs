//! Document metadata emitted by `#[derive(Document)]`.

use serde::{Serialize, de::DeserializeOwned};

/// Describes a stored document type: its collection and per-field rules.
#[derive(Debug, Default, Clone)]
pub struct DocumentDescriptor {
    pub collection: String,
    pub id_field: String,
    pub fields: Vec<FieldDescriptor>,
}

impl DocumentDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Fields whose values claim a unique key in the store.
    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| field.unique)
    }

    /// Whether clients may set this field through create/patch payloads.
    pub fn is_writable(&self, name: &str) -> bool {
        self.field(name).map(|field| field.writable).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FieldDescriptor {
    /// JSON name of the field (after any rename).
    pub name: String,
    pub field_type: FieldType,
    pub element_type: Option<FieldType>,
    pub optional: bool,
    pub is_id: bool,
    pub required: bool,
    pub trim: bool,
    pub lowercase: bool,
    pub unique: bool,
    pub writable: bool,
    /// Holds an upload URL eligible for image migration.
    pub media: bool,
    pub auto_created: bool,
    pub auto_updated: bool,
    pub validations: Vec<ValidationRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    #[default]
    Object,
    DateTime,
}

#[derive(Debug, Clone)]
pub enum ValidationRule {
    Length { min: Option<usize>, max: Option<usize> },
    Email,
    OneOf { allowed: Vec<String> },
}

/// A typed document persisted in a collection.
///
/// Implemented by `#[derive(Document)]`.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    fn descriptor() -> DocumentDescriptor;
}
