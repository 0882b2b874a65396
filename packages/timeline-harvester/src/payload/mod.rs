//! Payload-side extraction: classifying intercepted JSON blobs into known
//! shapes and decoding them into canonical records.

pub mod batch;
pub mod builders;
pub mod instruction;
pub mod shape;

pub use batch::{parse_batch, DecodedBatch};
pub use builders::{author_from_value, post_from_value};
pub use instruction::{decode_instructions, DecodedInstructions, Instruction, SectionTag};
pub use shape::{classify, extract_raw, unwrap_envelope, IgnoredKind, RawBatch, Shape};

use serde_json::Value;

pub(crate) fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Canonicalize an author object whose numeric id is carried under the
/// secondary `rest_id` key while the primary `id` key holds a non-numeric
/// opaque token: swap the two so the primary key is numeric.
pub fn normalize_author_id(user: &mut Value) {
    let primary = user.get("id").and_then(Value::as_str).map(str::to_string);
    let secondary = user
        .get("rest_id")
        .and_then(Value::as_str)
        .map(str::to_string);

    if let (Some(id), Some(rest_id)) = (primary, secondary) {
        if is_all_digits(&rest_id) && !is_all_digits(&id) {
            user["id"] = Value::String(rest_id);
            user["rest_id"] = Value::String(id);
        }
    }
}
