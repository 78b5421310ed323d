//! Quantity normalization rules.
//!
//! The backing store's quantity column is nullable and, across legacy
//! deployments, occasionally holds garbage. Every read goes through
//! [`normalize_quantity`] so the rest of the ledger only ever sees a finite,
//! non-negative number.

/// Coerce a raw stored quantity to a usable on-hand value.
///
/// `None` (SQL NULL) and non-finite values become `0.0`; negative values are
/// clamped to `0.0`.
pub fn normalize_quantity(raw: Option<f64>) -> f64 {
    match raw {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn null_is_zero() {
        assert_eq!(normalize_quantity(None), 0.0);
    }

    #[test]
    fn negative_is_clamped() {
        assert_eq!(normalize_quantity(Some(-3.5)), 0.0);
    }

    #[test]
    fn nan_and_infinities_are_zero() {
        assert_eq!(normalize_quantity(Some(f64::NAN)), 0.0);
        assert_eq!(normalize_quantity(Some(f64::INFINITY)), 0.0);
        assert_eq!(normalize_quantity(Some(f64::NEG_INFINITY)), 0.0);
    }

    #[test]
    fn positive_values_pass_through() {
        assert_eq!(normalize_quantity(Some(12.25)), 12.25);
    }

    proptest! {
        #[test]
        fn never_negative_and_always_finite(raw in proptest::option::of(proptest::num::f64::ANY)) {
            let q = normalize_quantity(raw);
            prop_assert!(q >= 0.0);
            prop_assert!(q.is_finite());
        }
    }
}
