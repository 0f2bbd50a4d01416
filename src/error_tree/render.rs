use super::ErrorTree;

/// Structural output of [`render`], independent of any widget toolkit.
#[derive(Clone, Debug, PartialEq)]
pub enum Rendered {
    Placeholder,
    Text(String),
    List(Vec<ListEntry>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListEntry {
    pub key: EntryKey,
    pub content: EntryContent,
}

/// Stable identity of a list entry: position for sequences, key for maps.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum EntryKey {
    Index(usize),
    Key(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum EntryContent {
    Text(String),
    Nested(Rendered),
    Labeled { label: String, nested: Rendered },
}

/// Leaf values under a key render inline as `"key: value"`; sequences and maps
/// under a key render as a bare `"key:"` label followed by a nested list. The
/// rule holds at every depth.
pub fn render(tree: &ErrorTree) -> Rendered {
    match tree {
        ErrorTree::Empty => Rendered::Placeholder,
        ErrorTree::Leaf(scalar) => Rendered::Text(scalar.to_string()),
        ErrorTree::Sequence(items) => Rendered::List(
            items
                .iter()
                .enumerate()
                .map(|(index, item)| ListEntry {
                    key: EntryKey::Index(index),
                    content: match render(item) {
                        Rendered::Text(text) => EntryContent::Text(text),
                        nested => EntryContent::Nested(nested),
                    },
                })
                .collect(),
        ),
        ErrorTree::Keyed(entries) => Rendered::List(
            entries
                .iter()
                .map(|(key, value)| ListEntry {
                    key: EntryKey::Key(key.clone()),
                    content: match value {
                        ErrorTree::Leaf(scalar) => EntryContent::Text(format!("{key}: {scalar}")),
                        nested => EntryContent::Labeled {
                            label: format!("{key}:"),
                            nested: render(nested),
                        },
                    },
                })
                .collect(),
        ),
    }
}

impl Rendered {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Rendered::Placeholder)
    }

    pub fn entries(&self) -> &[ListEntry] {
        match self {
            Rendered::List(entries) => entries,
            _ => &[],
        }
    }

    /// Indented bullet list, two spaces per nesting level.
    pub fn to_plain_text(&self) -> String {
        match self {
            Rendered::Placeholder => String::new(),
            Rendered::Text(text) => text.clone(),
            Rendered::List(entries) => {
                let mut lines = Vec::new();
                push_plain_lines(entries, 0, &mut lines);
                lines.join("\n")
            }
        }
    }

    /// `<ul>`/`<li>` markup with text escaped for HTML.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        write_markup(self, &mut out);
        out
    }
}

impl ListEntry {
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            EntryContent::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match &self.content {
            EntryContent::Labeled { label, .. } => Some(label),
            _ => None,
        }
    }

    pub fn nested(&self) -> Option<&Rendered> {
        match &self.content {
            EntryContent::Nested(nested) | EntryContent::Labeled { nested, .. } => Some(nested),
            EntryContent::Text(_) => None,
        }
    }
}

fn push_plain_lines(entries: &[ListEntry], depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    for entry in entries {
        match &entry.content {
            EntryContent::Text(text) => lines.push(format!("{indent}- {text}")),
            EntryContent::Labeled { label, nested } => {
                lines.push(format!("{indent}- {label}"));
                push_nested_plain(nested, depth + 1, lines);
            }
            EntryContent::Nested(nested) => {
                lines.push(format!("{indent}-"));
                push_nested_plain(nested, depth + 1, lines);
            }
        }
    }
}

fn push_nested_plain(nested: &Rendered, depth: usize, lines: &mut Vec<String>) {
    match nested {
        Rendered::Placeholder => {}
        Rendered::Text(text) => lines.push(format!("{}{text}", "  ".repeat(depth))),
        Rendered::List(entries) => push_plain_lines(entries, depth, lines),
    }
}

fn write_markup(rendered: &Rendered, out: &mut String) {
    match rendered {
        Rendered::Placeholder => {}
        Rendered::Text(text) => out.push_str(&escape_html(text)),
        Rendered::List(entries) => {
            out.push_str("<ul>");
            for entry in entries {
                out.push_str("<li>");
                match &entry.content {
                    EntryContent::Text(text) => out.push_str(&escape_html(text)),
                    EntryContent::Nested(nested) => write_markup(nested, out),
                    EntryContent::Labeled { label, nested } => {
                        out.push_str(&escape_html(label));
                        write_markup(nested, out);
                    }
                }
                out.push_str("</li>");
            }
            out.push_str("</ul>");
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
