//! Daily-note block format
//!
//! Every memo becomes one markdown list item whose first line ends with an
//! identity marker:
//!
//! ```text
//! - 09:15 first line of the memo ^memo-12
//! 	second line
//! 	- ![[Attachments/12-photo.png]]
//! ```
//!
//! The marker doubles as an Obsidian block reference. It is recognised on
//! any line as a whitespace-preceded `^memo-<id>` token at the end of the
//! line, trailing whitespace ignored, so users may edit the memo text
//! freely as long as the marker stays.

use memosync_core::domain::{MemoId, ResourceRef};

use crate::calendar::DatedMemo;

pub const MARKER_PREFIX: &str = "^memo-";

/// How one attachment appears under its memo
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentLink {
    /// Image stored in the vault, shown inline
    Embed(String),
    /// Other file stored in the vault
    Link(String),
    /// File hosted elsewhere
    External { filename: String, url: String },
    /// Download or write failed
    Unresolved { filename: String },
}

impl AttachmentLink {
    /// The link a resource gets when its bytes land at `path`
    pub fn local(resource: &ResourceRef, path: String) -> Self {
        if resource.is_image() {
            Self::Embed(path)
        } else {
            Self::Link(path)
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Embed(path) => format!("![[{path}]]"),
            Self::Link(path) => format!("[[{path}]]"),
            Self::External { filename, url } => format!("[{filename}]({url})"),
            Self::Unresolved { filename } => format!("(unresolved attachment: {filename})"),
        }
    }
}

/// Rendered memo ready to be inserted into a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoBlock {
    /// Identity token without the `^memo-` prefix
    pub marker: String,
    /// Block text; every line ends with `\n`
    pub text: String,
}

pub fn marker_for(id: &MemoId) -> String {
    format!("{MARKER_PREFIX}{}", id.marker())
}

/// Vault-relative path for a downloaded attachment
pub fn attachment_path(folder: &str, id: &MemoId, filename: &str) -> String {
    let name = sanitize_filename(filename);
    let folder = folder.trim().trim_matches('/');
    if folder.is_empty() {
        format!("{}-{}", id.marker(), name)
    } else {
        format!("{}/{}-{}", folder, id.marker(), name)
    }
}

fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '[' | ']' | '#' | '^' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "attachment".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Renders a memo and its attachment links as a list item
pub fn render_block(memo: &DatedMemo, attachments: &[AttachmentLink]) -> MemoBlock {
    let marker = memo.memo.id.marker();
    let content = memo.memo.content.trim_end();
    let mut lines = content.lines().map(str::trim_end);

    let mut text = format!("- {}", memo.time_label());
    if let Some(first) = lines.next().filter(|l| !l.trim().is_empty()) {
        text.push(' ');
        text.push_str(first.trim_start());
    }
    text.push(' ');
    text.push_str(MARKER_PREFIX);
    text.push_str(&marker);
    text.push('\n');

    for line in lines {
        if line.is_empty() {
            text.push('\n');
        } else {
            text.push('\t');
            text.push_str(line);
            text.push('\n');
        }
    }

    for link in attachments {
        text.push_str("\t- ");
        text.push_str(&link.render());
        text.push('\n');
    }

    MemoBlock { marker, text }
}

/// Extracts the identity token from a line, if it carries one
pub fn parse_marker(line: &str) -> Option<&str> {
    let line = line.trim_end();
    let start = line.rfind(MARKER_PREFIX)?;
    let preceded_by_space = line[..start]
        .chars()
        .next_back()
        .map_or(false, char::is_whitespace);
    if !preceded_by_space {
        return None;
    }
    let token = &line[start + MARKER_PREFIX.len()..];
    let valid = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    valid.then_some(token)
}
