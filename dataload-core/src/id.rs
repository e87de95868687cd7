//! Typed identifiers for sources, batches and items.

use serde::{Deserialize, Serialize};
use std::fmt;

// Generates a string newtype usable as a map key. `Ord` lets the runner
// report timed-out sources in a stable order.
macro_rules! typed_key {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap a string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&$name> for $name {
            fn from(k: &$name) -> Self {
                k.clone()
            }
        }
    };
}

typed_key!(SourceName, "Name under which a source is registered in a loader.");
typed_key!(
    BatchKey,
    "Groups related item keys within one source (e.g. which table or query shape)."
);
typed_key!(ItemKey, "Identifies one requested value within a batch.");

// Numeric primary keys are the common case for item keys.
impl From<u64> for ItemKey {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl From<i64> for ItemKey {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_keys_from_numbers_match_string_form() {
        assert_eq!(ItemKey::from(42u64), ItemKey::new("42"));
        assert_eq!(ItemKey::from(-7i64), ItemKey::from("-7"));
    }

    #[test]
    fn keys_serialize_as_bare_strings() {
        let json = serde_json::to_string(&SourceName::new("users")).unwrap();
        assert_eq!(json, "\"users\"");
        let back: BatchKey = serde_json::from_str("\"by_id\"").unwrap();
        assert_eq!(back.as_str(), "by_id");
    }

    #[test]
    fn names_sort_lexically() {
        let mut names = vec![SourceName::from("b"), SourceName::from("a")];
        names.sort();
        assert_eq!(names, vec![SourceName::from("a"), SourceName::from("b")]);
    }
}
