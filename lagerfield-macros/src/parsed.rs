use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{
    Data, DeriveInput, Error, Field, Fields, GenericArgument, Ident, LitInt, LitStr, PathArguments, PathSegment,
    Result, Token, Type, parse::Parse, punctuated::Punctuated, spanned::Spanned,
};

const NUMERIC_TYPES: &[&str] = &[
    "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32", "i64", "i128", "isize", "f32", "f64",
];

pub(crate) struct ParsedDocument {
    name: Ident,
    collection: String,
    id_field: Ident,
    id_name: String,
    fields: Vec<ParsedField>,
}

struct ParsedField {
    ident: Ident,
    name: String,
    kind: FieldKind,
    element: Option<FieldKind>,
    optional: bool,
    is_id: bool,
    required: bool,
    trim: bool,
    lowercase: bool,
    unique: bool,
    readonly: bool,
    media: bool,
    created_at: bool,
    updated_at: bool,
    rules: Vec<RuleSpec>,
}

#[derive(Clone, Copy, PartialEq)]
enum FieldKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
    DateTime,
}

enum RuleSpec {
    Length { min: Option<usize>, max: Option<usize> },
    Email,
    OneOf(Vec<String>),
}

impl ParsedDocument {
    pub(crate) fn from_input(input: &DeriveInput) -> Result<Self> {
        let mut collection: Option<String> = None;
        let mut camel_case = false;

        for attr in &input.attrs {
            if !attr.path().is_ident("document") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("collection") {
                    let value: LitStr = meta.value()?.parse()?;
                    collection = Some(value.value());
                } else if meta.path.is_ident("rename_all") {
                    let value: LitStr = meta.value()?.parse()?;
                    match value.value().as_str() {
                        "camelCase" => camel_case = true,
                        "snake_case" => camel_case = false,
                        other => return Err(meta.error(format!("unsupported rename_all `{other}`"))),
                    }
                } else {
                    return Err(meta.error("unsupported document attribute"));
                }
                Ok(())
            })?;
        }

        let named = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(named) => named,
                _ => return Err(Error::new(input.ident.span(), "Document requires named fields")),
            },
            _ => return Err(Error::new(input.ident.span(), "Document can only be derived for structs")),
        };

        let mut fields = Vec::new();
        for field in &named.named {
            fields.push(ParsedField::from_field(field, camel_case)?);
        }

        let mut id: Option<(Ident, String)> = None;
        for field in &fields {
            if field.is_id {
                if id.is_some() {
                    return Err(Error::new(field.ident.span(), "Document allows exactly one #[document(id)] field"));
                }
                if field.kind != FieldKind::String || field.optional {
                    return Err(Error::new(field.ident.span(), "#[document(id)] field must be a String"));
                }
                id = Some((field.ident.clone(), field.name.clone()));
            }
        }
        let (id_field, id_name) = id.ok_or_else(|| {
            Error::new(input.ident.span(), "Document requires a field annotated with #[document(id)]")
        })?;

        Ok(Self {
            name: input.ident.clone(),
            collection: collection.unwrap_or_else(|| format!("{}s", to_snake_case(&input.ident.to_string()))),
            id_field,
            id_name,
            fields,
        })
    }

    pub(crate) fn emit(&self) -> TokenStream2 {
        let name = &self.name;
        let collection = LitStr::new(&self.collection, Span::call_site());
        let id_ident = &self.id_field;
        let id_name = LitStr::new(&self.id_name, Span::call_site());
        let field_inits = self.fields.iter().map(ParsedField::descriptor_tokens);
        let media_impl = self.media_impl();

        quote! {
            impl ::lagerfield::types::Document for #name {
                const COLLECTION: &'static str = #collection;

                fn id(&self) -> &str {
                    &self.#id_ident
                }

                fn descriptor() -> ::lagerfield::types::DocumentDescriptor {
                    ::lagerfield::types::DocumentDescriptor {
                        collection: #collection.to_string(),
                        id_field: #id_name.to_string(),
                        fields: vec![#(#field_inits),*],
                    }
                }
            }

            #media_impl
        }
    }

    fn media_impl(&self) -> TokenStream2 {
        let media: Vec<&ParsedField> = self.fields.iter().filter(|field| field.media).collect();
        if media.is_empty() {
            return TokenStream2::new();
        }
        let name = &self.name;
        let names: Vec<LitStr> = media
            .iter()
            .map(|field| LitStr::new(&field.name, Span::call_site()))
            .collect();
        let idents: Vec<&Ident> = media.iter().map(|field| &field.ident).collect();

        quote! {
            impl ::lagerfield::migration::MigratableRecord for #name {
                fn media_reference(&self, field: &str) -> ::std::option::Option<&str> {
                    match field {
                        #(#names => ::lagerfield::migration::MediaSlot::reference(&self.#idents),)*
                        _ => ::std::option::Option::None,
                    }
                }

                fn set_media_reference(&mut self, field: &str, url: ::std::string::String) -> bool {
                    match field {
                        #(#names => {
                            ::lagerfield::migration::MediaSlot::replace(&mut self.#idents, url);
                            true
                        })*
                        _ => false,
                    }
                }
            }
        }
    }
}

impl ParsedField {
    fn from_field(field: &Field, camel_case: bool) -> Result<Self> {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| Error::new(field.span(), "Document requires named fields"))?;
        let (optional, kind, element) = classify(&field.ty);
        let raw_name = ident.to_string();
        let name = if camel_case { to_camel_case(&raw_name) } else { raw_name };

        let mut parsed = Self {
            ident,
            name,
            kind,
            element,
            optional,
            is_id: false,
            required: false,
            trim: false,
            lowercase: false,
            unique: false,
            readonly: false,
            media: false,
            created_at: false,
            updated_at: false,
            rules: Vec::new(),
        };
        let mut min_length: Option<usize> = None;
        let mut max_length: Option<usize> = None;

        for attr in &field.attrs {
            if !attr.path().is_ident("document") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                let path = &meta.path;
                if path.is_ident("id") {
                    parsed.is_id = true;
                } else if path.is_ident("required") {
                    parsed.required = true;
                } else if path.is_ident("trim") {
                    parsed.trim = true;
                } else if path.is_ident("lowercase") {
                    parsed.lowercase = true;
                } else if path.is_ident("unique") {
                    parsed.unique = true;
                } else if path.is_ident("readonly") {
                    parsed.readonly = true;
                } else if path.is_ident("media") {
                    parsed.media = true;
                } else if path.is_ident("created_at") {
                    parsed.created_at = true;
                } else if path.is_ident("updated_at") {
                    parsed.updated_at = true;
                } else if path.is_ident("email") {
                    parsed.rules.push(RuleSpec::Email);
                } else if path.is_ident("min_length") {
                    let value: LitInt = meta.value()?.parse()?;
                    min_length = Some(value.base10_parse()?);
                } else if path.is_ident("max_length") {
                    let value: LitInt = meta.value()?.parse()?;
                    max_length = Some(value.base10_parse()?);
                } else if path.is_ident("one_of") {
                    let content;
                    syn::parenthesized!(content in meta.input);
                    let values: Punctuated<LitStr, Token![,]> =
                        content.parse_terminated(<LitStr as Parse>::parse, Token![,])?;
                    parsed
                        .rules
                        .push(RuleSpec::OneOf(values.into_iter().map(|lit| lit.value()).collect()));
                } else if path.is_ident("rename") {
                    let value: LitStr = meta.value()?.parse()?;
                    parsed.name = value.value();
                } else {
                    return Err(meta.error("unsupported document field attribute"));
                }
                Ok(())
            })?;
        }

        if min_length.is_some() || max_length.is_some() {
            parsed.rules.push(RuleSpec::Length {
                min: min_length,
                max: max_length,
            });
        }
        if parsed.media && parsed.kind != FieldKind::String {
            return Err(Error::new(
                parsed.ident.span(),
                "#[document(media)] fields must be String or Option<String>",
            ));
        }
        if (parsed.created_at || parsed.updated_at) && parsed.kind != FieldKind::DateTime {
            return Err(Error::new(
                parsed.ident.span(),
                "timestamp fields must be DateTime<Utc> or Option<DateTime<Utc>>",
            ));
        }

        Ok(parsed)
    }

    fn descriptor_tokens(&self) -> TokenStream2 {
        let name = LitStr::new(&self.name, Span::call_site());
        let field_type = self.kind.to_tokens();
        let element_type = match self.element {
            Some(kind) => {
                let tokens = kind.to_tokens();
                quote! { ::std::option::Option::Some(#tokens) }
            }
            None => quote! { ::std::option::Option::None },
        };
        let optional = self.optional;
        let is_id = self.is_id;
        let required = self.required;
        let trim = self.trim;
        let lowercase = self.lowercase;
        let unique = self.unique;
        let writable = !(self.readonly || self.is_id || self.created_at || self.updated_at);
        let media = self.media;
        let auto_created = self.created_at;
        let auto_updated = self.updated_at;
        let validations = self.rules.iter().map(RuleSpec::to_tokens);

        quote! {
            ::lagerfield::types::FieldDescriptor {
                name: #name.to_string(),
                field_type: #field_type,
                element_type: #element_type,
                optional: #optional,
                is_id: #is_id,
                required: #required,
                trim: #trim,
                lowercase: #lowercase,
                unique: #unique,
                writable: #writable,
                media: #media,
                auto_created: #auto_created,
                auto_updated: #auto_updated,
                validations: vec![#(#validations),*],
            }
        }
    }
}

impl FieldKind {
    fn to_tokens(self) -> TokenStream2 {
        match self {
            FieldKind::String => quote! { ::lagerfield::types::FieldType::String },
            FieldKind::Number => quote! { ::lagerfield::types::FieldType::Number },
            FieldKind::Boolean => quote! { ::lagerfield::types::FieldType::Boolean },
            FieldKind::Array => quote! { ::lagerfield::types::FieldType::Array },
            FieldKind::Object => quote! { ::lagerfield::types::FieldType::Object },
            FieldKind::DateTime => quote! { ::lagerfield::types::FieldType::DateTime },
        }
    }
}

impl RuleSpec {
    fn to_tokens(&self) -> TokenStream2 {
        match self {
            RuleSpec::Length { min, max } => {
                let min = option_usize(*min);
                let max = option_usize(*max);
                quote! { ::lagerfield::types::ValidationRule::Length { min: #min, max: #max } }
            }
            RuleSpec::Email => quote! { ::lagerfield::types::ValidationRule::Email },
            RuleSpec::OneOf(allowed) => {
                let values = allowed.iter().map(|value| LitStr::new(value, Span::call_site()));
                quote! {
                    ::lagerfield::types::ValidationRule::OneOf {
                        allowed: vec![#(#values.to_string()),*],
                    }
                }
            }
        }
    }
}

fn option_usize(value: Option<usize>) -> TokenStream2 {
    match value {
        Some(value) => quote! { ::std::option::Option::Some(#value) },
        None => quote! { ::std::option::Option::None },
    }
}

fn classify(ty: &Type) -> (bool, FieldKind, Option<FieldKind>) {
    if let Some(inner) = generic_inner(ty, "Option") {
        let (_, kind, element) = classify(inner);
        return (true, kind, element);
    }
    if let Some(inner) = generic_inner(ty, "Vec") {
        let (_, element, _) = classify(inner);
        return (false, FieldKind::Array, Some(element));
    }
    let kind = match last_segment(ty).map(|segment| segment.ident.to_string()) {
        Some(name) if name == "String" || name == "str" => FieldKind::String,
        Some(name) if name == "bool" => FieldKind::Boolean,
        Some(name) if name == "DateTime" => FieldKind::DateTime,
        Some(name) if NUMERIC_TYPES.contains(&name.as_str()) => FieldKind::Number,
        _ => FieldKind::Object,
    };
    (false, kind, None)
}

fn last_segment(ty: &Type) -> Option<&PathSegment> {
    match ty {
        Type::Path(path) => path.path.segments.last(),
        _ => None,
    }
}

fn generic_inner<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let segment = last_segment(ty)?;
    if segment.ident != wrapper {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        }),
        _ => None,
    }
}

fn to_camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper_next = false;
    for ch in snake.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn to_snake_case(pascal: &str) -> String {
    let mut out = String::with_capacity(pascal.len() + 4);
    for (index, ch) in pascal.chars().enumerate() {
        if ch.is_uppercase() {
            if index > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
