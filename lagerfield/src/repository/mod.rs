//! Typed repository over a [`DocumentStore`].
//!
//! Every write goes through the same pipeline: whitelist writable fields,
//! stamp managed timestamps, normalize (trim/lowercase), validate against the
//! document descriptor, round-trip through the Rust type, claim unique values,
//! then persist.

use std::{marker::PhantomData, sync::Arc};

use chrono::Utc;
use regex::Regex;
use serde_json::{Map, Value};

use crate::{
    errors::{RepoError, ValidationError, ValidationIssue, ValidationResult},
    id::generate_document_id,
    store::DocumentStore,
    types::{Document, DocumentDescriptor, FieldDescriptor, FieldType, ValidationRule},
    validators::is_valid_email,
};

pub struct Repo<T>
where
    T: Document,
{
    store: Arc<dyn DocumentStore>,
    descriptor: DocumentDescriptor,
    _marker: PhantomData<T>,
}

impl<T: Document> Clone for Repo<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            descriptor: self.descriptor.clone(),
            _marker: PhantomData,
        }
    }
}

/// How an update payload is folded into the stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpdateMode {
    /// Top-level keys replace existing values.
    Assign,
    /// Nested objects are merged key by key.
    Merge,
}

impl<T> Repo<T>
where
    T: Document,
{
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            descriptor: T::descriptor(),
            _marker: PhantomData,
        }
    }

    pub async fn get(&self, id: &str) -> Result<Option<T>, RepoError> {
        match self.store.get(T::COLLECTION, id).await? {
            Some(value) => Ok(Some(decode::<T>(value)?)),
            None => Ok(None),
        }
    }

    pub async fn require(&self, id: &str) -> Result<T, RepoError> {
        self.get(id).await?.ok_or_else(|| RepoError::NotFound {
            document_id: Some(id.to_string()),
        })
    }

    pub async fn list(&self) -> Result<Vec<T>, RepoError> {
        self.store
            .scan(T::COLLECTION)
            .await?
            .into_iter()
            .map(decode::<T>)
            .collect()
    }

    pub async fn count(&self) -> Result<u64, RepoError> {
        self.store.count(T::COLLECTION).await
    }

    /// Look a document up through the claim key of a unique field.
    pub async fn find_by_unique(&self, field: &str, value: &str) -> Result<Option<T>, RepoError> {
        match self.descriptor.field(field) {
            Some(descriptor) if descriptor.unique => {}
            _ => {
                return Err(RepoError::InvalidRequest {
                    message: format!("{field} is not a unique field of {}", T::COLLECTION),
                });
            }
        }
        match self.store.lookup_unique(T::COLLECTION, field, value.trim()).await? {
            Some(id) => self.get(&id).await,
            None => Ok(None),
        }
    }

    pub async fn find_first<F>(&self, predicate: F) -> Result<Option<T>, RepoError>
    where
        F: Fn(&T) -> bool,
    {
        Ok(self.list().await?.into_iter().find(|document| predicate(document)))
    }

    /// Stored values whose string `field` matches `pattern`, left undecoded.
    ///
    /// Callers decode each value with [`Repo::decode`], so one malformed
    /// document does not hide the others.
    pub async fn find_matching(&self, field: &str, pattern: &Regex) -> Result<Vec<Value>, RepoError> {
        Ok(self
            .store
            .scan(T::COLLECTION)
            .await?
            .into_iter()
            .filter(|value| {
                value
                    .get(field)
                    .and_then(Value::as_str)
                    .is_some_and(|candidate| pattern.is_match(candidate))
            })
            .collect())
    }

    pub fn decode(&self, value: Value) -> Result<T, RepoError> {
        decode::<T>(value)
    }

    /// Id of a stored value, read without decoding it.
    pub fn stored_id<'v>(&self, value: &'v Value) -> Option<&'v str> {
        value.get(&self.descriptor.id_field).and_then(Value::as_str)
    }

    /// Create a document from a client payload. Unknown and managed keys are dropped.
    pub async fn create(&self, input: Value) -> Result<T, RepoError> {
        let object = writable_subset(&self.descriptor, input)?;
        let id = generate_document_id();
        self.write(&id, Value::Object(object), None).await
    }

    /// Create a document built server-side. A preset id is kept.
    pub async fn insert(&self, document: T) -> Result<T, RepoError> {
        let id = if document.id().is_empty() {
            generate_document_id()
        } else {
            document.id().to_string()
        };
        if self.store.get(T::COLLECTION, &id).await?.is_some() {
            return Err(RepoError::InvalidRequest {
                message: format!("{} '{id}' already exists", T::COLLECTION),
            });
        }
        let value = serde_json::to_value(&document)?;
        self.write(&id, value, None).await
    }

    /// Shallow update from a client payload: each writable top-level key replaces the stored value.
    pub async fn patch(&self, id: &str, input: Value) -> Result<T, RepoError> {
        self.update(id, input, UpdateMode::Assign).await
    }

    /// Deep update from a client payload: nested objects are merged.
    pub async fn merge(&self, id: &str, input: Value) -> Result<T, RepoError> {
        self.update(id, input, UpdateMode::Merge).await
    }

    /// Replace an existing document with `document`.
    pub async fn save(&self, document: &T) -> Result<T, RepoError> {
        let id = document.id().to_string();
        let previous = self
            .store
            .get(T::COLLECTION, &id)
            .await?
            .ok_or_else(|| RepoError::NotFound {
                document_id: Some(id.clone()),
            })?;
        let value = serde_json::to_value(document)?;
        self.write(&id, value, Some(&previous)).await
    }

    /// Returns `true` when a document was removed.
    pub async fn delete(&self, id: &str) -> Result<bool, RepoError> {
        let Some(previous) = self.store.get(T::COLLECTION, id).await? else {
            return Ok(false);
        };
        let removed = self.store.delete(T::COLLECTION, id).await?;
        if removed {
            for (field, value) in unique_values(&self.descriptor, &previous) {
                self.store.release_unique(T::COLLECTION, &field, &value, id).await?;
            }
        }
        Ok(removed)
    }

    async fn update(&self, id: &str, input: Value, mode: UpdateMode) -> Result<T, RepoError> {
        let changes = writable_subset(&self.descriptor, input)?;
        let previous = self
            .store
            .get(T::COLLECTION, id)
            .await?
            .ok_or_else(|| RepoError::NotFound {
                document_id: Some(id.to_string()),
            })?;
        let mut next = previous.clone();
        if let Value::Object(target) = &mut next {
            for (key, value) in changes {
                match (mode, target.get_mut(&key)) {
                    (UpdateMode::Merge, Some(existing)) => merge_json_values(existing, value),
                    _ => {
                        target.insert(key, value);
                    }
                }
            }
        }
        self.write(id, next, Some(&previous)).await
    }

    async fn write(&self, id: &str, mut value: Value, previous: Option<&Value>) -> Result<T, RepoError> {
        let Some(object) = value.as_object_mut() else {
            return Err(ValidationError::single("__document", "validation.invalid_type", "expected a JSON object").into());
        };
        object.insert(self.descriptor.id_field.clone(), Value::String(id.to_string()));
        stamp_timestamps(&self.descriptor, object, previous);
        normalize_document(&self.descriptor, object);
        validate_document(&self.descriptor, object)?;

        let document: T = serde_json::from_value(value).map_err(|err| {
            RepoError::Validation(ValidationError::single(
                "__document",
                "validation.invalid_type",
                err.to_string(),
            ))
        })?;
        let canonical = serde_json::to_value(&document)?;

        let claimed = self.claim_unique_values(id, &canonical, previous).await?;
        if let Err(err) = self.store.put(T::COLLECTION, id, &canonical).await {
            for (field, value) in &claimed {
                self.store.release_unique(T::COLLECTION, field, value, id).await?;
            }
            return Err(err);
        }
        if let Some(previous) = previous {
            let current = unique_values(&self.descriptor, &canonical);
            for (field, value) in unique_values(&self.descriptor, previous) {
                let still_held = current
                    .iter()
                    .any(|(f, v)| f == &field && same_claim(v, &value));
                if !still_held {
                    self.store.release_unique(T::COLLECTION, &field, &value, id).await?;
                }
            }
        }
        Ok(document)
    }

    /// Claim every unique value of `document`; on conflict, roll back the claims made so far.
    async fn claim_unique_values(
        &self,
        id: &str,
        document: &Value,
        previous: Option<&Value>,
    ) -> Result<Vec<(String, String)>, RepoError> {
        let held = previous.map(|value| unique_values(&self.descriptor, value)).unwrap_or_default();
        let mut claimed: Vec<(String, String)> = Vec::new();
        for (field, value) in unique_values(&self.descriptor, document) {
            if held.iter().any(|(f, v)| f == &field && same_claim(v, &value)) {
                continue;
            }
            if let Some(existing_id) = self.store.claim_unique(T::COLLECTION, &field, &value, id).await? {
                for (claimed_field, claimed_value) in &claimed {
                    self.store
                        .release_unique(T::COLLECTION, claimed_field, claimed_value, id)
                        .await?;
                }
                return Err(RepoError::UniqueConstraintViolation {
                    field,
                    value,
                    existing_id,
                });
            }
            claimed.push((field, value));
        }
        Ok(claimed)
    }
}

fn decode<T: Document>(value: Value) -> Result<T, RepoError> {
    serde_json::from_value(value).map_err(|err| RepoError::Other {
        message: format!("failed to deserialize {}: {err}", T::COLLECTION).into(),
    })
}

/// Keep only the keys clients may write.
fn writable_subset(descriptor: &DocumentDescriptor, input: Value) -> Result<Map<String, Value>, RepoError> {
    match input {
        Value::Object(map) => Ok(map.into_iter().filter(|(key, _)| descriptor.is_writable(key)).collect()),
        _ => Err(ValidationError::single("__document", "validation.invalid_type", "expected a JSON object").into()),
    }
}

/// Claim keys fold case with `to_lowercase`, so two values share a claim exactly when this holds.
fn same_claim(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn unique_values(descriptor: &DocumentDescriptor, document: &Value) -> Vec<(String, String)> {
    descriptor
        .unique_fields()
        .filter_map(|field| {
            document
                .get(&field.name)
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
                .map(|value| (field.name.clone(), value.to_string()))
        })
        .collect()
}

fn stamp_timestamps(descriptor: &DocumentDescriptor, object: &mut Map<String, Value>, previous: Option<&Value>) {
    let now = Value::String(Utc::now().to_rfc3339());
    for field in &descriptor.fields {
        if field.auto_updated {
            object.insert(field.name.clone(), now.clone());
        } else if field.auto_created {
            let kept = previous.and_then(|prev| prev.get(&field.name)).filter(|value| !value.is_null());
            match kept {
                Some(value) => {
                    object.insert(field.name.clone(), value.clone());
                }
                None => {
                    let missing = object.get(&field.name).is_none_or(Value::is_null);
                    if missing {
                        object.insert(field.name.clone(), now.clone());
                    }
                }
            }
        }
    }
}

fn normalize_document(descriptor: &DocumentDescriptor, object: &mut Map<String, Value>) {
    for field in &descriptor.fields {
        if !field.trim && !field.lowercase {
            continue;
        }
        if let Some(value) = object.get_mut(&field.name) {
            normalize_value(field, value);
        }
    }
}

fn normalize_value(field: &FieldDescriptor, value: &mut Value) {
    match value {
        Value::String(text) => {
            let mut normalized = if field.trim { text.trim().to_string() } else { text.clone() };
            if field.lowercase {
                normalized = normalized.to_lowercase();
            }
            *text = normalized;
        }
        Value::Array(items) => {
            for item in items {
                normalize_value(field, item);
            }
        }
        _ => {}
    }
}

fn length_for_value(field_type: FieldType, value: &Value) -> Option<usize> {
    match field_type {
        FieldType::String | FieldType::DateTime => value.as_str().map(|s| s.chars().count()),
        FieldType::Array => value.as_array().map(|arr| arr.len()),
        _ => None,
    }
}

fn validate_rule_on_value(
    field_name: &str,
    field_type: FieldType,
    rule: &ValidationRule,
    value: &Value,
    issues: &mut Vec<ValidationIssue>,
) {
    match rule {
        ValidationRule::Length { min, max } => {
            if let Some(len) = length_for_value(field_type, value) {
                if let Some(min_len) = min
                    && len < *min_len
                {
                    issues.push(ValidationIssue::new(
                        field_name,
                        "validation.length",
                        format!("length must be at least {min_len}"),
                    ));
                }
                if let Some(max_len) = max
                    && len > *max_len
                {
                    issues.push(ValidationIssue::new(
                        field_name,
                        "validation.length",
                        format!("length must be at most {max_len}"),
                    ));
                }
            }
        }
        ValidationRule::Email => {
            if let Some(candidate) = value.as_str()
                && !candidate.is_empty()
                && !is_valid_email(candidate)
            {
                issues.push(ValidationIssue::new(
                    field_name,
                    "validation.email",
                    "value must be a valid email address",
                ));
            }
        }
        ValidationRule::OneOf { allowed } => {
            if let Some(candidate) = value.as_str()
                && !allowed.iter().any(|option| option == candidate)
            {
                issues.push(ValidationIssue::new(
                    field_name,
                    "validation.enum",
                    format!("value must be one of {allowed:?}"),
                ));
            }
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

fn validate_document(descriptor: &DocumentDescriptor, object: &Map<String, Value>) -> ValidationResult<()> {
    let mut issues = Vec::new();
    for field in &descriptor.fields {
        match object.get(&field.name) {
            Some(value) if !is_blank(value) => {
                for rule in &field.validations {
                    match (field.field_type, value) {
                        (FieldType::Array, Value::Array(items)) => {
                            let element_type = field.element_type.unwrap_or(FieldType::Object);
                            for item in items {
                                validate_rule_on_value(&field.name, element_type, rule, item, &mut issues);
                            }
                        }
                        _ => validate_rule_on_value(&field.name, field.field_type, rule, value, &mut issues),
                    }
                }
            }
            _ => {
                if field.required {
                    issues.push(ValidationIssue::new(
                        field.name.clone(),
                        "validation.required",
                        "field is required",
                    ));
                }
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(issues))
    }
}

fn merge_json_values(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                match target_map.get_mut(&key) {
                    Some(existing) => merge_json_values(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (target_slot, patch_value) => {
            *target_slot = patch_value;
        }
    }
}
