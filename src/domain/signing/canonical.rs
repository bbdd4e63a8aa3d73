//! Canonical base strings for signing.

use serde::{Deserialize, Serialize};

use super::parameters::{ParameterSet, SIGNATURE_KEY};

/// How sorted parameters are joined into the signed base string.
///
/// An endpoint family uses exactly one form. Signing with one and verifying
/// with the other never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalForm {
    /// `key1value1key2value2`
    #[default]
    Concatenated,
    /// `key1=value1&key2=value2`
    QueryString,
}

/// Renders the base string for `params` in the given form.
///
/// Keys are sorted by raw bytes, the `s` key is skipped and values are used
/// exactly as given (no URL-encoding).
pub fn canonicalize(params: &ParameterSet, form: CanonicalForm) -> String {
    let pairs = params.iter().filter(|(k, _)| *k != SIGNATURE_KEY);

    match form {
        CanonicalForm::Concatenated => {
            let mut base = String::new();
            for (key, value) in pairs {
                base.push_str(key);
                base.push_str(&value.to_string());
            }
            base
        }
        CanonicalForm::QueryString => pairs
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> ParameterSet {
        ParameterSet::new()
            .with("planId", "membresia_basica")
            .with("apiKey", "KEY")
            .with("amount", 9990_i64)
    }

    #[test]
    fn concatenated_form_has_no_separators() {
        assert_eq!(
            canonicalize(&sample(), CanonicalForm::Concatenated),
            "amount9990apiKeyKEYplanIdmembresia_basica"
        );
    }

    #[test]
    fn query_string_form_joins_with_ampersand() {
        assert_eq!(
            canonicalize(&sample(), CanonicalForm::QueryString),
            "amount=9990&apiKey=KEY&planId=membresia_basica"
        );
    }

    #[test]
    fn signature_key_is_excluded() {
        let with_sig = sample().with("s", "deadbeef");
        assert_eq!(
            canonicalize(&with_sig, CanonicalForm::Concatenated),
            canonicalize(&sample(), CanonicalForm::Concatenated)
        );
    }

    #[test]
    fn values_are_not_url_encoded() {
        let params = ParameterSet::new()
            .with("name", "Membresía Básica")
            .with("urlSuccess", "https://x.cl/ok?a=1&b=2");

        assert_eq!(
            canonicalize(&params, CanonicalForm::QueryString),
            "name=Membresía Básica&urlSuccess=https://x.cl/ok?a=1&b=2"
        );
    }

    #[test]
    fn empty_set_canonicalizes_to_empty_string() {
        let params = ParameterSet::new();
        assert_eq!(canonicalize(&params, CanonicalForm::Concatenated), "");
        assert_eq!(canonicalize(&params, CanonicalForm::QueryString), "");
    }

    #[test]
    fn form_deserializes_from_snake_case() {
        let form: CanonicalForm = serde_json::from_str("\"query_string\"").unwrap();
        assert_eq!(form, CanonicalForm::QueryString);
    }

    proptest! {
        #[test]
        fn canonicalization_ignores_insertion_order(
            entries in proptest::collection::btree_map("[a-zA-Z]{1,8}", "[ -~]{0,12}", 0..12)
        ) {
            let forward = entries
                .iter()
                .fold(ParameterSet::new(), |set, (k, v)| set.with(k.clone(), v.clone()));
            let reversed = entries
                .iter()
                .rev()
                .fold(ParameterSet::new(), |set, (k, v)| set.with(k.clone(), v.clone()));

            for form in [CanonicalForm::Concatenated, CanonicalForm::QueryString] {
                let a = canonicalize(&forward, form);
                prop_assert_eq!(&a, &canonicalize(&reversed, form));
                prop_assert_eq!(&a, &canonicalize(&forward, form));
            }
        }
    }
}
