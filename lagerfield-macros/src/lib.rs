use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod parsed;

use parsed::ParsedDocument;

/// Derives `lagerfield::types::Document` for a struct with named fields.
///
/// Container attributes: `#[document(collection = "...", rename_all = "camelCase")]`.
/// Field attributes: `id`, `required`, `trim`, `lowercase`, `unique`, `email`,
/// `min_length = N`, `max_length = N`, `one_of("a", "b")`, `created_at`, `updated_at`,
/// `readonly`, `media`, `rename = "..."`.
///
/// Fields marked `media` additionally produce a `lagerfield::migration::MigratableRecord`
/// implementation so the image migration can read and rewrite them.
#[proc_macro_derive(Document, attributes(document))]
pub fn derive_document(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match ParsedDocument::from_input(&input) {
        Ok(parsed) => parsed.emit().into(),
        Err(err) => err.to_compile_error().into(),
    }
}
