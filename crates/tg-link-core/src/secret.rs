use std::fmt;

/// Pre-shared credential proving the bot may call the backend linking endpoint.
///
/// The value is only exposed through [`SharedSecret::expose`]; `Debug` output is
/// redacted so the secret never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(String);

impl SharedSecret {
    /// Wrap a configured secret. Blank values are rejected and yield `None`.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_secret_is_rejected() {
        assert!(SharedSecret::new("").is_none());
        assert!(SharedSecret::new("   ").is_none());
    }

    #[test]
    fn debug_output_is_redacted() {
        let secret = SharedSecret::new("laundry-secret").unwrap();
        let rendered = format!("{secret:?}");
        assert!(!rendered.contains("laundry-secret"));
        assert_eq!(secret.expose(), "laundry-secret");
    }
}
