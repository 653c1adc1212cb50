//! `validator::ValidationErrors` -> flat `(path, message)` list.
//!
//! Path conventions:
//! - field error: `<part>.<field>`
//! - nested struct: `<part>.<field>.<inner>`
//! - list item: `<part>.<field>[<index>]`
//! - struct-level (`__all__`) errors name their field through the `field` param,
//!   otherwise they are reported on the part itself
//! - a field error with an `index` param points at that list element

use std::borrow::Cow;

use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::error::Violation;

const SCHEMA_KEY: &str = "__all__";

pub fn flatten(part: &str, errors: &ValidationErrors) -> Vec<Violation> {
    let mut out = Vec::new();
    collect(part, errors, &mut out);
    // HashMap order is not stable
    out.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.message.cmp(&b.message)));
    out
}

fn collect(prefix: &str, errors: &ValidationErrors, out: &mut Vec<Violation>) {
    for (field, kind) in errors.errors() {
        let field = field.to_string();
        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    out.push(Violation::new(path_of(prefix, &field, err), message_of(err)));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                collect(&format!("{prefix}.{field}"), inner, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(&format!("{prefix}.{field}[{index}]"), inner, out);
                }
            }
        }
    }
}

fn path_of(prefix: &str, field: &str, err: &ValidationError) -> String {
    let field = if field == SCHEMA_KEY {
        err.params.get("field").and_then(|v| v.as_str())
    } else {
        Some(field)
    };

    let mut path = match field {
        Some(f) => format!("{prefix}.{f}"),
        None => prefix.to_string(),
    };
    if let Some(index) = err.params.get("index").and_then(|v| v.as_u64()) {
        path.push_str(&format!("[{index}]"));
    }
    path
}

fn message_of(err: &ValidationError) -> String {
    match &err.message {
        Some(m) => m.to_string(),
        None => format!("failed '{}' check", err.code),
    }
}

/// Struct-level error attributed to one field (`<part>.<field>`).
pub fn schema_error(field: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new("schema").with_message(Cow::Borrowed(message));
    err.add_param(Cow::Borrowed("field"), &field);
    err
}

/// Field error attributed to one element of a list field (`<part>.<field>[index]`).
pub fn index_error(code: &'static str, index: usize, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code).with_message(Cow::Borrowed(message));
    err.add_param(Cow::Borrowed("index"), &index);
    err
}
