//! Recognized error signatures for schema-shape classification.
//!
//! Classification is driven by this small, explicit table instead of
//! free-form substring matching on whole messages: over-broad matching would
//! silently swallow real failures (permissions, outages) as schema drift.

use stockbook_store::StoreError;

/// SQLSTATE for "undefined column".
const UNDEFINED_COLUMN_SQLSTATE: &str = "42703";

/// SQLSTATE for "undefined function".
const UNDEFINED_FUNCTION_SQLSTATE: &str = "42883";

/// Message shapes meaning "that column does not exist". Every fragment of an
/// entry must appear (case-insensitive) for the entry to match.
const MISSING_COLUMN_MESSAGES: &[&[&str]] = &[
    &["column", "does not exist"],
    &["could not find", "column"],
    &["schema cache"],
];

/// Message shapes meaning "that procedure does not exist".
const MISSING_PROCEDURE_MESSAGES: &[&[&str]] = &[
    &["function", "does not exist"],
    &["could not find", "function"],
];

fn message_matches(message: &str, table: &[&[&str]]) -> bool {
    let lowered = message.to_ascii_lowercase();
    table
        .iter()
        .any(|fragments| fragments.iter().all(|f| lowered.contains(f)))
}

/// Does this store error mean the referenced column does not exist?
///
/// Only database-reported errors are classified; connection and decode
/// failures never match.
pub fn is_missing_column(err: &StoreError) -> bool {
    let Some((code, message)) = err.database_parts() else {
        return false;
    };
    if code == Some(UNDEFINED_COLUMN_SQLSTATE) {
        return true;
    }
    message_matches(message, MISSING_COLUMN_MESSAGES)
}

/// Does this store error mean the adjustment procedure was never deployed?
pub fn is_missing_procedure(err: &StoreError) -> bool {
    let Some((code, message)) = err.database_parts() else {
        return false;
    };
    if code == Some(UNDEFINED_FUNCTION_SQLSTATE) {
        return true;
    }
    message_matches(message, MISSING_PROCEDURE_MESSAGES)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db(code: Option<&str>, message: &str) -> StoreError {
        StoreError::database(code, message)
    }

    #[test]
    fn sqlstate_alone_is_sufficient() {
        assert!(is_missing_column(&db(Some("42703"), "anything")));
        assert!(is_missing_procedure(&db(Some("42883"), "anything")));
    }

    #[test]
    fn recognized_message_shapes_match_without_code() {
        assert!(is_missing_column(&db(
            None,
            "column \"stock\" does not exist"
        )));
        assert!(is_missing_column(&db(
            None,
            "Could not find the 'stock_quantity' column of 'products' in the schema cache"
        )));
        assert!(is_missing_procedure(&db(
            None,
            "function adjust_stock(uuid, numeric, text) does not exist"
        )));
    }

    #[test]
    fn unrelated_database_errors_do_not_match() {
        assert!(!is_missing_column(&db(
            Some("42501"),
            "permission denied for table products"
        )));
        assert!(!is_missing_procedure(&db(
            Some("57014"),
            "canceling statement due to statement timeout"
        )));
    }

    #[test]
    fn transport_failures_never_classify() {
        let err = StoreError::Connection("pool timed out".to_string());
        assert!(!is_missing_column(&err));
        assert!(!is_missing_procedure(&err));
    }

    #[test]
    fn column_wording_does_not_trip_the_procedure_table() {
        let err = db(None, "column \"stock\" does not exist");
        assert!(!is_missing_procedure(&err));
    }
}
