//! Shared payload checks for the create/update forms.
//!
//! Every check appends to a [`FieldErrors`] instead of returning early, so a
//! single submission reports all offending fields at once.

use serde::{Deserialize, Deserializer};

use neurocore_core::FieldErrors;

pub(crate) fn require_text(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "cannot be empty");
    }
}

pub(crate) fn optional_text(errors: &mut FieldErrors, field: &str, value: Option<&str>) {
    if let Some(value) = value {
        require_text(errors, field, value);
    }
}

pub(crate) fn non_negative(errors: &mut FieldErrors, field: &str, value: i64) {
    if value < 0 {
        errors.add(field, "must be >= 0");
    }
}

pub(crate) fn positive(errors: &mut FieldErrors, field: &str, value: i64) {
    if value <= 0 {
        errors.add(field, "must be > 0");
    }
}

pub(crate) fn non_negative_amount(errors: &mut FieldErrors, field: &str, value: f64) {
    if !value.is_finite() || value < 0.0 {
        errors.add(field, "must be a finite amount >= 0");
    }
}

pub(crate) fn finite(errors: &mut FieldErrors, field: &str, value: f64) {
    if !value.is_finite() {
        errors.add(field, "must be a finite number");
    }
}

pub(crate) fn image_url(errors: &mut FieldErrors, value: Option<&str>) {
    if let Some(raw) = value {
        if url::Url::parse(raw).is_err() {
            errors.add("image_url", "must be a valid absolute URL");
        }
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
///
/// Use with `#[serde(default, deserialize_with = "...")]` on patch payloads.
pub(crate) fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_url_requires_absolute_url() {
        let mut errors = FieldErrors::new();
        image_url(&mut errors, Some("https://cdn.example.com/a.png"));
        assert!(errors.is_empty());

        image_url(&mut errors, Some("not a url"));
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["image_url"]);
    }

    #[test]
    fn amounts_reject_nan_and_negatives() {
        let mut errors = FieldErrors::new();
        non_negative_amount(&mut errors, "price", f64::NAN);
        non_negative_amount(&mut errors, "cost", -0.5);
        non_negative_amount(&mut errors, "fee", 0.0);
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["cost", "price"]);
    }
}
