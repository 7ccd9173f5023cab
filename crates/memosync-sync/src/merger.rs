//! Section-aware document merge
//!
//! The merger owns exactly one section of a daily note: the configured
//! heading and everything up to the next heading of equal or higher rank.
//! Text outside that section is carried over byte for byte. Memos whose
//! identity marker already appears in the section are left alone, so
//! merging the same bucket twice is a no-op.

use std::collections::HashSet;

use crate::calendar::DatedMemo;
use crate::paginator::DateBucket;
use crate::render::{self, MemoBlock};

/// Result of merging a batch into a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedDocument {
    /// Full new document text
    pub text: String,
    pub changed: bool,
    /// Zero-based line index of the section heading in `text`, if present
    pub heading_line: Option<usize>,
    /// Number of memo blocks inserted
    pub added: usize,
}

#[derive(Debug, Clone)]
struct Heading {
    level: usize,
    title: String,
}

/// Located section of the configured heading
struct Section {
    heading: usize,
    /// Line index one past the section end
    end: usize,
}

#[derive(Debug, Clone)]
pub struct DocumentMerger {
    heading: Heading,
    heading_line: String,
}

impl DocumentMerger {
    /// Creates a merger for `header`
    ///
    /// A bare title such as `Memos` becomes a level-two heading; a header
    /// that already starts with `#` is used as written. Only a heading of
    /// the same level and title opens the section, so a `# Memos` note
    /// title is not mistaken for `## Memos`.
    pub fn new(header: &str) -> Self {
        let header = header.trim();
        match parse_heading(header) {
            Some(heading) => Self {
                heading,
                heading_line: header.to_string(),
            },
            None => Self {
                heading: Heading {
                    level: 2,
                    title: header.to_string(),
                },
                heading_line: format!("## {header}"),
            },
        }
    }

    /// The heading line written when the section is missing
    pub fn heading_line(&self) -> &str {
        &self.heading_line
    }

    /// Identity markers found in the section, empty when it is missing
    pub fn existing_markers(&self, text: &str) -> HashSet<String> {
        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        match self.locate(&lines) {
            Some(section) => lines[section.heading + 1..section.end]
                .iter()
                .filter_map(|line| render::parse_marker(line))
                .map(str::to_string)
                .collect(),
            None => HashSet::new(),
        }
    }

    /// Memos of `bucket` not yet present in `text`, in bucket order
    pub fn missing<'a>(&self, text: &str, bucket: &'a DateBucket) -> Vec<&'a DatedMemo> {
        let mut seen = self.existing_markers(text);
        bucket
            .memos
            .iter()
            .filter(|m| seen.insert(m.memo.id.marker()))
            .collect()
    }

    /// Merges a bucket, rendering attachments as their planned vault links
    pub fn merge(&self, text: &str, bucket: &DateBucket, attachment_folder: &str) -> MergedDocument {
        let blocks: Vec<MemoBlock> = self
            .missing(text, bucket)
            .into_iter()
            .map(|memo| {
                let links: Vec<_> = memo
                    .memo
                    .resources
                    .iter()
                    .map(|r| match r.external() {
                        Some(url) => render::AttachmentLink::External {
                            filename: r.filename.clone(),
                            url: url.to_string(),
                        },
                        None => render::AttachmentLink::local(
                            r,
                            render::attachment_path(attachment_folder, &memo.memo.id, &r.filename),
                        ),
                    })
                    .collect();
                render::render_block(memo, &links)
            })
            .collect();
        self.merge_blocks(text, &blocks)
    }

    /// Inserts rendered blocks whose marker is not yet in the section
    ///
    /// New blocks go after the last non-blank line of the section. A
    /// missing heading is appended to the end of the document first.
    pub fn merge_blocks(&self, text: &str, blocks: &[MemoBlock]) -> MergedDocument {
        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        let section = self.locate(&lines);

        let mut seen: HashSet<String> = match &section {
            Some(s) => lines[s.heading + 1..s.end]
                .iter()
                .filter_map(|line| render::parse_marker(line))
                .map(str::to_string)
                .collect(),
            None => HashSet::new(),
        };
        let fresh: Vec<&MemoBlock> = blocks
            .iter()
            .filter(|b| seen.insert(b.marker.clone()))
            .collect();

        if fresh.is_empty() {
            return MergedDocument {
                text: text.to_string(),
                changed: false,
                heading_line: section.map(|s| s.heading),
                added: 0,
            };
        }

        let mut out = String::with_capacity(
            text.len() + fresh.iter().map(|b| b.text.len()).sum::<usize>() + 64,
        );
        let heading_line;

        match section {
            Some(section) => {
                let mut at = section.end;
                while at > section.heading + 1 && lines[at - 1].trim().is_empty() {
                    at -= 1;
                }
                for line in &lines[..at] {
                    out.push_str(line);
                }
                if !out.ends_with('\n') {
                    out.push('\n');
                }
                for block in &fresh {
                    out.push_str(&block.text);
                }
                for line in &lines[at..] {
                    out.push_str(line);
                }
                heading_line = section.heading;
            }
            None => {
                out.push_str(text);
                if !out.is_empty() {
                    if !out.ends_with('\n') {
                        out.push('\n');
                    }
                    if !out.ends_with("\n\n") {
                        out.push('\n');
                    }
                }
                heading_line = out.matches('\n').count();
                out.push_str(&self.heading_line);
                out.push('\n');
                for block in &fresh {
                    out.push_str(&block.text);
                }
            }
        }

        MergedDocument {
            changed: out != text,
            text: out,
            heading_line: Some(heading_line),
            added: fresh.len(),
        }
    }

    fn locate(&self, lines: &[&str]) -> Option<Section> {
        let mut open_fence: Option<(char, usize)> = None;
        let mut found: Option<usize> = None;

        for (index, line) in lines.iter().enumerate() {
            if let Some((ch, len)) = open_fence {
                if closes_fence(line, ch, len) {
                    open_fence = None;
                }
                continue;
            }
            if let Some(opening) = fence(line) {
                open_fence = Some(opening);
                continue;
            }
            let Some(heading) = parse_heading(line) else {
                continue;
            };
            match found {
                None if heading.level == self.heading.level
                    && heading.title == self.heading.title =>
                {
                    found = Some(index)
                }
                Some(start) if heading.level <= self.heading.level => {
                    return Some(Section {
                        heading: start,
                        end: index,
                    });
                }
                _ => {}
            }
        }

        found.map(|start| Section {
            heading: start,
            end: lines.len(),
        })
    }
}

/// Code fence run: at most three spaces of indent, then three or more
/// backticks or tildes
fn fence(line: &str) -> Option<(char, usize)> {
    let line = line.trim_end();
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let body = &line[indent..];
    let ch = body.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let len = body.chars().take_while(|&c| c == ch).count();
    (len >= 3).then_some((ch, len))
}

fn closes_fence(line: &str, ch: char, len: usize) -> bool {
    match fence(line) {
        Some((c, l)) => c == ch && l >= len && line.trim().trim_start_matches(c).is_empty(),
        None => false,
    }
}

/// Parses an ATX heading (`#` to `######` followed by a space)
fn parse_heading(line: &str) -> Option<Heading> {
    let line = line.trim_end();
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let body = &line[indent..];
    let level = body.chars().take_while(|&c| c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &body[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let title = rest.trim().trim_end_matches('#').trim_end().to_string();
    Some(Heading { level, title })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone, Utc};
    use memosync_core::domain::{DateKey, Memo, MemoId, MemoStatus};

    fn dated(id: u32, content: &str) -> DatedMemo {
        DatedMemo {
            memo: Memo {
                id: MemoId::new(format!("memos/{id}")).unwrap(),
                created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
                content: content.to_string(),
                visibility: "PRIVATE".to_string(),
                status: MemoStatus::Normal,
                creator: "users/1".to_string(),
                resources: vec![],
            },
            date: "2024-03-01".parse::<DateKey>().unwrap(),
            local_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        }
    }

    fn bucket(memos: Vec<DatedMemo>) -> DateBucket {
        DateBucket {
            date: memos[0].date,
            memos,
        }
    }

    #[test]
    fn test_creates_heading_when_absent() {
        let merger = DocumentMerger::new("Memos");
        let merged = merger.merge("# Notes\n", &bucket(vec![dated(1, "hello")]), "Attachments");

        assert!(merged.changed);
        assert_eq!(merged.text, "# Notes\n\n## Memos\n- 09:00 hello ^memo-1\n");
        assert_eq!(merged.heading_line, Some(2));
        assert_eq!(merged.added, 1);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let merger = DocumentMerger::new("Memos");
        let b = bucket(vec![dated(2, "second"), dated(1, "first")]);

        let once = merger.merge("# Notes\n", &b, "Attachments");
        let twice = merger.merge(&once.text, &b, "Attachments");

        assert!(!twice.changed);
        assert_eq!(twice.text, once.text);
        assert_eq!(twice.added, 0);
        assert_eq!(twice.heading_line, once.heading_line);
    }

    #[test]
    fn test_empty_document() {
        let merger = DocumentMerger::new("Memos");
        let merged = merger.merge("", &bucket(vec![dated(1, "x")]), "A");
        assert_eq!(merged.text, "## Memos\n- 09:00 x ^memo-1\n");
        assert_eq!(merged.heading_line, Some(0));
    }

    #[test]
    fn test_appends_inside_section_only() {
        let merger = DocumentMerger::new("## Memos");
        let doc = "# Day\n\n## Memos\n- 08:00 old ^memo-1\n\n## Tasks\n- [ ] buy milk\n";
        let b = bucket(vec![dated(2, "new"), dated(1, "old")]);

        let merged = merger.merge(doc, &b, "A");

        assert_eq!(
            merged.text,
            "# Day\n\n## Memos\n- 08:00 old ^memo-1\n- 09:00 new ^memo-2\n\n## Tasks\n- [ ] buy milk\n"
        );
        assert_eq!(merged.added, 1);
        assert_eq!(merged.heading_line, Some(2));
    }

    #[test]
    fn test_marker_outside_section_does_not_count() {
        let merger = DocumentMerger::new("Memos");
        let doc = "## Journal\nquoted ^memo-1\n## Memos\n";
        let merged = merger.merge(doc, &bucket(vec![dated(1, "x")]), "A");

        assert_eq!(merged.added, 1);
        assert!(merged.text.ends_with("## Memos\n- 09:00 x ^memo-1\n"));
    }

    #[test]
    fn test_subheadings_stay_in_section() {
        let merger = DocumentMerger::new("Memos");
        let doc = "## Memos\n### Morning\n- 07:00 a ^memo-5\n# Next\n";
        let merged = merger.merge(doc, &bucket(vec![dated(5, "a"), dated(6, "b")]), "A");

        assert_eq!(
            merged.text,
            "## Memos\n### Morning\n- 07:00 a ^memo-5\n- 09:00 b ^memo-6\n# Next\n"
        );
    }

    #[test]
    fn test_user_edits_keep_identity() {
        let merger = DocumentMerger::new("Memos");
        let doc = "## Memos\n- 09:00 hello, edited by hand ^memo-1  \n";
        let merged = merger.merge(doc, &bucket(vec![dated(1, "hello")]), "A");

        assert!(!merged.changed);
        assert_eq!(merged.text, doc);
    }

    #[test]
    fn test_heading_in_code_fence_is_ignored() {
        let merger = DocumentMerger::new("Memos");
        let doc = "```\n## Memos\n```\n";
        let merged = merger.merge(doc, &bucket(vec![dated(1, "x")]), "A");

        assert_eq!(merged.text, "```\n## Memos\n```\n\n## Memos\n- 09:00 x ^memo-1\n");
    }

    #[test]
    fn test_fence_inside_memo_body_does_not_hide_next_heading() {
        let merger = DocumentMerger::new("Memos");
        let doc = "## Memos\n\n## Tasks\n- [ ] milk\n";

        let first = merger.merge(doc, &bucket(vec![dated(1, "snippet\n```\ncode\n```")]), "A");
        assert!(first.text.contains("\t```\n\tcode\n\t```\n"));

        let second = merger.merge(&first.text, &bucket(vec![dated(2, "later")]), "A");
        let later = second.text.find("^memo-2").unwrap();
        let tasks = second.text.find("## Tasks").unwrap();
        assert!(later < tasks, "memo 2 landed under ## Tasks:\n{}", second.text);
        assert!(second.text.ends_with("## Tasks\n- [ ] milk\n"));
    }

    #[test]
    fn test_tilde_line_does_not_close_backtick_fence() {
        let merger = DocumentMerger::new("Memos");
        let doc = "```\n~~~\n## Memos\n```\n## Memos\n";
        let merged = merger.merge(doc, &bucket(vec![dated(1, "x")]), "A");

        assert_eq!(merged.heading_line, Some(4));
        assert_eq!(merged.text, "```\n~~~\n## Memos\n```\n## Memos\n- 09:00 x ^memo-1\n");
    }

    #[test]
    fn test_heading_level_must_match() {
        let merger = DocumentMerger::new("Memos");
        let doc = "# Memos\n\n## Memos\n- 08:00 a ^memo-1\n";
        let merged = merger.merge(doc, &bucket(vec![dated(2, "b")]), "A");

        assert_eq!(merged.heading_line, Some(2));
        assert_eq!(merged.text, "# Memos\n\n## Memos\n- 08:00 a ^memo-1\n- 09:00 b ^memo-2\n");
    }

    #[test]
    fn test_fence_rules() {
        assert_eq!(fence("```rust"), Some(('`', 3)));
        assert_eq!(fence("   ~~~~"), Some(('~', 4)));
        assert!(fence("\t```").is_none());
        assert!(fence("    ```").is_none());
        assert!(fence("``").is_none());
        assert!(closes_fence("````", '`', 3));
        assert!(!closes_fence("``` rust", '`', 3));
        assert!(!closes_fence("~~~", '`', 3));
    }

    #[test]
    fn test_missing_text_without_trailing_newline() {
        let merger = DocumentMerger::new("Memos");
        let doc = "## Memos\n- 08:00 a ^memo-1";
        let merged = merger.merge(doc, &bucket(vec![dated(2, "b")]), "A");
        assert_eq!(merged.text, "## Memos\n- 08:00 a ^memo-1\n- 09:00 b ^memo-2\n");
    }

    #[test]
    fn test_missing_reports_bucket_order() {
        let merger = DocumentMerger::new("Memos");
        let b = bucket(vec![dated(3, "c"), dated(2, "b"), dated(1, "a")]);
        let missing = merger.missing("## Memos\n- 09:00 b ^memo-2\n", &b);
        let ids: Vec<_> = missing.iter().map(|m| m.memo.id.as_str()).collect();
        assert_eq!(ids, vec!["memos/3", "memos/1"]);
    }

    #[test]
    fn test_resources_render_planned_links() {
        let merger = DocumentMerger::new("Memos");
        let mut memo = dated(4, "pic");
        memo.memo.resources.push(memosync_core::domain::ResourceRef {
            id: "resources/9".to_string(),
            filename: "cat.png".to_string(),
            external_link: None,
            mime_type: Some("image/png".to_string()),
        });

        let merged = merger.merge("", &bucket(vec![memo]), "Attachments");
        assert!(merged.text.contains("\t- ![[Attachments/4-cat.png]]\n"));
    }

    #[test]
    fn test_parse_heading() {
        assert_eq!(parse_heading("## Memos").map(|h| h.level), Some(2));
        assert_eq!(parse_heading("   # Title #").map(|h| h.title), Some("Title".to_string()));
        assert!(parse_heading("#hashtag").is_none());
        assert!(parse_heading("    # code").is_none());
        assert!(parse_heading("####### seven").is_none());
    }
}
