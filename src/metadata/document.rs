//! Typed model for the artist template artifact
//!
//! The template is a Kirby content file: `Key: value` field lines
//! separated by `----` lines, with a variable-length `Gallery:` block.
//! Parsing classifies each line; rendering an unmodified document
//! reproduces the input byte-for-byte, so substitution can never
//! disturb lines it does not own.

use crate::ident;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Uuid(String),
    Title(String),
    Fullname(String),
    Lastname(String),
    /// `Gallery:` header plus every line up to (not including) the next
    /// `----` separator.
    Gallery { inner: Vec<String> },
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDocument {
    lines: Vec<Line>,
}

impl TemplateDocument {
    /// Parse a template. Never fails: unrecognized lines are kept verbatim.
    pub fn parse(content: &str) -> Self {
        let mut lines = Vec::new();
        let mut iter = content.split('\n').peekable();

        while let Some(raw) = iter.next() {
            if let Some(value) = raw.strip_prefix("Uuid: ") {
                lines.push(Line::Uuid(value.to_string()));
            } else if let Some(value) = raw.strip_prefix("Title: ") {
                lines.push(Line::Title(value.to_string()));
            } else if let Some(value) = raw.strip_prefix("Fullname: ") {
                lines.push(Line::Fullname(value.to_string()));
            } else if let Some(value) = raw.strip_prefix("Lastname: ") {
                lines.push(Line::Lastname(value.to_string()));
            } else if raw == "Gallery:" {
                let mut inner = Vec::new();
                while let Some(line) = iter.next_if(|line| *line != "----") {
                    inner.push(line.to_string());
                }
                // A gallery block owns lines only up to a closing
                // separator. Without one the block would swallow the
                // rest of the file, so keep those lines verbatim.
                if iter.peek().is_some() {
                    lines.push(Line::Gallery { inner });
                } else {
                    lines.push(Line::Raw(raw.to_string()));
                    lines.extend(inner.into_iter().map(Line::Raw));
                }
            } else {
                lines.push(Line::Raw(raw.to_string()));
            }
        }

        Self { lines }
    }

    /// Render back to text. `render(parse(s)) == s` for any input.
    pub fn render(&self) -> String {
        let mut out: Vec<String> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            match line {
                Line::Uuid(value) => out.push(format!("Uuid: {value}")),
                Line::Title(value) => out.push(format!("Title: {value}")),
                Line::Fullname(value) => out.push(format!("Fullname: {value}")),
                Line::Lastname(value) => out.push(format!("Lastname: {value}")),
                Line::Gallery { inner } => {
                    out.push("Gallery:".to_string());
                    out.extend(inner.iter().cloned());
                }
                Line::Raw(value) => out.push(value.clone()),
            }
        }
        out.join("\n")
    }

    /// Replace the record identifier.
    pub fn set_uuid(&mut self, uuid: &str) {
        for line in &mut self.lines {
            if let Line::Uuid(value) = line {
                *value = uuid.to_string();
            }
        }
    }

    /// Set Title and Fullname to the artist name, Lastname to its last
    /// whitespace-separated word.
    pub fn set_artist_name(&mut self, name: &str) {
        let lastname = name.split_whitespace().last().unwrap_or(name).to_string();
        for line in &mut self.lines {
            match line {
                Line::Title(value) | Line::Fullname(value) => *value = name.to_string(),
                Line::Lastname(value) => *value = lastname.clone(),
                _ => {}
            }
        }
    }

    /// Rebuild the gallery block with one entry per identifier, in order.
    pub fn set_gallery(&mut self, uuids: &[String]) {
        for line in &mut self.lines {
            if let Line::Gallery { inner } = line {
                let mut block = vec![String::new()];
                for uuid in uuids {
                    block.push("-".to_string());
                    block.push("  image:".to_string());
                    block.push(format!("    - {}", ident::file_reference(uuid)));
                    block.push("  caption:".to_string());
                }
                *inner = block;
            }
        }
    }

    /// Whether the template carries a gallery block at all.
    pub fn has_gallery(&self) -> bool {
        self.lines
            .iter()
            .any(|line| matches!(line, Line::Gallery { .. }))
    }
}
