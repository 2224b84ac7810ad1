use heck::ToSnakeCase;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped in the local part of a CURIE.
const LOCAL_NAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// Build a compact identifier `prefix:escaped-local-name`.
pub fn generate_curie(prefix: &str, local_name: &str) -> String {
    format!("{}:{}", prefix, utf8_percent_encode(local_name, LOCAL_NAME))
}

/// `Class.member` identifier shared by slots and permissible values.
pub fn member_curie(prefix: &str, owner: &str, member: &str) -> String {
    generate_curie(prefix, &format!("{}.{}", owner, member))
}

/// Slot key derived from an attribute name or role label.
///
/// Names with no letters or digits have no snake_case form and are kept
/// as written.
pub fn slot_name(name: &str) -> String {
    let slug = name.to_snake_case();
    if slug.is_empty() {
        name.to_string()
    } else {
        slug
    }
}
