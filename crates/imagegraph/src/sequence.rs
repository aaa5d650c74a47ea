//! Capture sequences: ordered chains of image keys.

/// An ordered chain of image keys recorded along one capture path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    key: String,
    keys: Vec<String>,
}

impl Sequence {
    /// Create a sequence from its key and the image keys in capture order.
    #[must_use]
    pub fn new(key: impl Into<String>, keys: Vec<String>) -> Self {
        Self {
            key: key.into(),
            keys,
        }
    }

    /// The sequence key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Image keys in capture order.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Key of the image captured after `key`.
    #[must_use]
    pub fn find_next_key(&self, key: &str) -> Option<&str> {
        let index = self.position(key)?;
        self.keys.get(index + 1).map(String::as_str)
    }

    /// Key of the image captured before `key`.
    #[must_use]
    pub fn find_prev_key(&self, key: &str) -> Option<&str> {
        let index = self.position(key)?;
        index
            .checked_sub(1)
            .and_then(|i| self.keys.get(i))
            .map(String::as_str)
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence() -> Sequence {
        Sequence::new(
            "seq",
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
        )
    }

    #[test]
    fn test_find_next_key() {
        let seq = sequence();
        assert_eq!(seq.find_next_key("a"), Some("b"));
        assert_eq!(seq.find_next_key("b"), Some("c"));
        assert_eq!(seq.find_next_key("c"), None);
    }

    #[test]
    fn test_find_prev_key() {
        let seq = sequence();
        assert_eq!(seq.find_prev_key("a"), None);
        assert_eq!(seq.find_prev_key("c"), Some("b"));
    }

    #[test]
    fn test_unknown_key() {
        let seq = sequence();
        assert_eq!(seq.find_next_key("z"), None);
        assert_eq!(seq.find_prev_key("z"), None);
    }
}
