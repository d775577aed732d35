use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Customer data that must not leak through `{:?}` or `{}` in log lines.
/// Serialization still writes the real value so rows and API bodies stay intact.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl From<String> for Masked<String> {
    fn from(value: String) -> Self {
        Masked(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_hides_value_but_serializes() {
        let email = Masked::from("traveler@example.com".to_string());
        assert_eq!(format!("{}", email), "********");
        assert_eq!(format!("{:?}", email), "********");
        assert_eq!(serde_json::to_value(&email).unwrap(), "traveler@example.com");
        assert_eq!(email.expose(), "traveler@example.com");
    }
}
