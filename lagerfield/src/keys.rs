/// Key-construction helpers for the Redis document store.
#[derive(Debug, Clone)]
pub struct KeyContext<'a> {
    pub prefix: &'a str,
    pub service: &'a str,
}

impl<'a> KeyContext<'a> {
    pub fn new(prefix: &'a str, service: &'a str) -> Self {
        Self { prefix, service }
    }

    pub fn document(&self, collection: &str, document_id: &str) -> String {
        format!("{}:{}:{}:{}", self.prefix, self.service, collection, document_id)
    }

    /// Glob matching every key of a collection, including unique claims.
    pub fn collection_pattern(&self, collection: &str) -> String {
        format!("{}:{}:{}:*", self.prefix, self.service, collection)
    }

    /// Prefix shared by all unique-claim keys of a collection.
    pub fn unique_prefix(&self, collection: &str) -> String {
        format!("{}:{}:{}:unique:", self.prefix, self.service, collection)
    }

    /// Claim key for one value of a unique field. Values are lowercased so claims are case-insensitive.
    pub fn unique(&self, collection: &str, field: &str, value: &str) -> String {
        format!(
            "{}{}:{}",
            self.unique_prefix(collection),
            field,
            value.to_lowercase()
        )
    }
}
