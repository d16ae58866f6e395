/// Latest full document body. Last write wins; there is no merge, no
/// version history, and no conflict detection — two concurrent editors
/// overwrite each other in the order their messages reach the hub.
#[derive(Debug, Default)]
pub struct DocumentStore {
    content: String,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole document unconditionally.
    pub fn set_content(&mut self, content: String) {
        self.content = content;
    }

    /// Current document body; empty until the first content change arrives.
    pub fn content(&self) -> &str {
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_before_first_write() {
        let document = DocumentStore::new();
        assert_eq!(document.content(), "");
    }

    #[test]
    fn last_write_wins() {
        let mut document = DocumentStore::new();
        document.set_content("hello".to_string());
        document.set_content("hello world".to_string());
        assert_eq!(document.content(), "hello world");
    }
}
