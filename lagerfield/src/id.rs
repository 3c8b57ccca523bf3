use nanoid::nanoid;

/// Alphabet for document identifiers (no ambiguous glyphs).
const DOCUMENT_ID_ALPHABET: &[char] = &[
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y',
    'Z', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'j', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];
const DOCUMENT_ID_LENGTH: usize = 20;

const DIGITS: &[char] = &['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

pub fn generate_document_id() -> String {
    nanoid!(DOCUMENT_ID_LENGTH, DOCUMENT_ID_ALPHABET)
}

/// Returns `true` when `value` has the shape of a generated document id.
///
/// Used to decide whether a path segment is an id or a slug.
pub fn is_document_id(value: &str) -> bool {
    value.chars().count() == DOCUMENT_ID_LENGTH && value.chars().all(|c| DOCUMENT_ID_ALPHABET.contains(&c))
}

/// Random decimal suffix used in upload file names.
pub fn random_digits(len: usize) -> String {
    nanoid!(len, DIGITS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_has_expected_length_and_charset() {
        let id = generate_document_id();
        assert_eq!(id.len(), DOCUMENT_ID_LENGTH);
        assert!(is_document_id(&id));
    }

    #[test]
    fn slugs_are_not_ids() {
        assert!(!is_document_id("wealth-management"));
        assert!(!is_document_id("advisory"));
    }

    #[test]
    fn random_digits_are_numeric() {
        let digits = random_digits(9);
        assert_eq!(digits.len(), 9);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }
}
