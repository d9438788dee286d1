//! Response bodies
//!
//! A [`Reply`] is the closed set of things the service answers with. Each
//! variant knows how to render itself in either encoding.

use serde_json::json;

use crate::data::ListEntry;

use super::encoding::Encoding;

/// Every response body the service produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Added(u64),
    Incremented(u64),
    Deleted(u64),
    Entry(ListEntry),
    EntryList(Vec<ListEntry>),
    Error(String),
}

impl Reply {
    /// Render the body in the given encoding
    pub fn render(&self, encoding: Encoding) -> String {
        match encoding {
            Encoding::PlainText => self.render_text(),
            Encoding::Json => self.render_json(),
        }
    }

    fn render_text(&self) -> String {
        match self {
            Reply::Added(n) => format!("ADDED {}\n", n),
            Reply::Incremented(n) => format!("INCREMENTED {}\n", n),
            Reply::Deleted(n) => format!("DELETED {}\n", n),
            Reply::Entry(entry) => format!("{}\n", entry.attempts),
            Reply::EntryList(entries) => entries
                .iter()
                .map(|entry| format!("{} {}\n", entry.item, entry.attempts))
                .collect(),
            Reply::Error(message) => format!("{}\n", message),
        }
    }

    fn render_json(&self) -> String {
        let value = match self {
            Reply::Added(n) => json!({ "added": n }),
            Reply::Incremented(n) => json!({ "incremented": n }),
            Reply::Deleted(n) => json!({ "deleted": n }),
            Reply::Entry(entry) => json!(entry),
            Reply::EntryList(entries) => json!({ "listentries": entries }),
            Reply::Error(message) => json!({ "error": message }),
        };
        format!("{}\n", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_counts() {
        assert_eq!(Reply::Added(3).render(Encoding::PlainText), "ADDED 3\n");
        assert_eq!(
            Reply::Incremented(1).render(Encoding::PlainText),
            "INCREMENTED 1\n"
        );
        assert_eq!(Reply::Deleted(0).render(Encoding::PlainText), "DELETED 0\n");
    }

    #[test]
    fn test_plain_text_entries() {
        let entry = ListEntry::new("kernel.tar.gz", 2);
        assert_eq!(Reply::Entry(entry.clone()).render(Encoding::PlainText), "2\n");

        let list = Reply::EntryList(vec![entry, ListEntry::new("libc.tar.gz", 0)]);
        assert_eq!(
            list.render(Encoding::PlainText),
            "kernel.tar.gz 2\nlibc.tar.gz 0\n"
        );
        assert_eq!(Reply::EntryList(Vec::new()).render(Encoding::PlainText), "");
    }

    #[test]
    fn test_plain_text_error() {
        assert_eq!(
            Reply::Error("Not found.".to_string()).render(Encoding::PlainText),
            "Not found.\n"
        );
    }

    #[test]
    fn test_json_bodies() {
        let parse = |reply: Reply| -> serde_json::Value {
            serde_json::from_str(&reply.render(Encoding::Json)).unwrap()
        };

        assert_eq!(parse(Reply::Added(2)), json!({"added": 2}));
        assert_eq!(parse(Reply::Incremented(1)), json!({"incremented": 1}));
        assert_eq!(parse(Reply::Deleted(5)), json!({"deleted": 5}));
        assert_eq!(
            parse(Reply::Entry(ListEntry::new("a", 4))),
            json!({"item": "a", "attempts": 4})
        );
        assert_eq!(
            parse(Reply::EntryList(vec![ListEntry::new("a", 0)])),
            json!({"listentries": [{"item": "a", "attempts": 0}]})
        );
        assert_eq!(
            parse(Reply::EntryList(Vec::new())),
            json!({"listentries": []})
        );
        assert_eq!(
            parse(Reply::Error("Not found.".to_string())),
            json!({"error": "Not found."})
        );
    }
}
