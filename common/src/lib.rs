pub mod config;
pub mod logger;

use std::collections::BTreeMap;

use validator::ValidationErrors;

/// One `field: message` line per failed rule, sorted by field, joined by `; `.
///
/// Rules without a message fall back to their code.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let fields: BTreeMap<_, _> = errors.field_errors().into_iter().collect();
    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{field}: {message}")
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}
