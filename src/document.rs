use crate::ansi::{normalize, strip_ansi, StyledText};
use crate::diff::FileDiffRecord;

pub type NodeId = usize;

/// Marker stored on a section's node, found by the ancestor walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionTag {
    Status,
    File(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    tag: Option<SectionTag>,
}

/// One titled unit of the document. The status block has no title and is
/// always expanded; file sections start collapsed.
#[derive(Debug, Clone)]
pub struct Section {
    /// Node carrying this section's tag.
    pub node: NodeId,
    /// Untagged child node addressing the section's body text.
    pub body_node: NodeId,
    pub title: Option<String>,
    pub body: StyledText,
    pub collapsed: bool,
}

/// A fully-built status/diff document. Rebuilt wholesale on every refresh;
/// holders replace the old value, never patch it.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    pub status: Section,
    pub sections: Vec<Section>,
}

impl Document {
    pub fn empty() -> Self {
        assemble(StyledText::default(), Vec::new())
    }

    /// Identifier of the nearest enclosing file section, walking parent
    /// links toward the root. None when the node sits in the status block.
    pub fn current_file_for(&self, node: NodeId) -> Option<&str> {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            let n = self.nodes.get(id)?;
            if let Some(SectionTag::File(identifier)) = &n.tag {
                return Some(identifier);
            }
            cursor = n.parent;
        }
        None
    }

    /// Flip the collapse state of the file section owning `node`.
    /// The status block is always expanded and is not toggleable.
    #[allow(dead_code)]
    pub fn toggle(&mut self, node: NodeId) -> bool {
        for section in &mut self.sections {
            if section.node == node || section.body_node == node {
                section.collapsed = !section.collapsed;
                return true;
            }
        }
        false
    }
}

/// Compose normalized status text and parsed diff records into a Document.
///
/// The status block comes first, then one collapsed section per record in
/// record order, titled with the record's identifier.
pub fn assemble(status: StyledText, records: Vec<FileDiffRecord>) -> Document {
    let mut nodes = vec![Node {
        parent: None,
        tag: None,
    }];

    let status_node = add_node(&mut nodes, Some(0), Some(SectionTag::Status));
    let status_body = add_node(&mut nodes, Some(status_node), None);
    let status = Section {
        node: status_node,
        body_node: status_body,
        title: None,
        body: status,
        collapsed: false,
    };

    let mut sections = Vec::with_capacity(records.len());
    for record in records {
        let node = add_node(
            &mut nodes,
            Some(0),
            Some(SectionTag::File(record.file_identifier.clone())),
        );
        let body_node = add_node(&mut nodes, Some(node), None);
        let body = normalize(strip_duplicate_header(&record.body, &record.file_identifier));
        sections.push(Section {
            node,
            body_node,
            title: Some(record.file_identifier),
            body,
            collapsed: true,
        });
    }

    Document {
        nodes,
        status,
        sections,
    }
}

fn add_node(nodes: &mut Vec<Node>, parent: Option<NodeId>, tag: Option<SectionTag>) -> NodeId {
    nodes.push(Node { parent, tag });
    nodes.len() - 1
}

/// Drop the body's first line when it repeats the identifier shown as the
/// section title; otherwise keep every line.
fn strip_duplicate_header<'a>(body: &'a str, identifier: &str) -> &'a str {
    match body.split_once('\n') {
        Some((first, rest)) if strip_ansi(first).contains(identifier) => rest,
        None if strip_ansi(body).contains(identifier) => "",
        _ => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff;

    #[test]
    fn test_end_to_end_assembly() {
        let status = normalize("M foo.txt\n".trim_end());
        let records = diff::parse("foo.txt --- text\n@@ -1,1 +1,1 @@\n-old\n+new\n");
        let document = assemble(status, records);

        assert_eq!(document.sections.len(), 1);
        let section = &document.sections[0];
        assert_eq!(section.title.as_deref(), Some("foo.txt"));
        assert!(section.collapsed);
        assert!(section.body.plain.starts_with("@@ -1,1 +1,1 @@"));
        assert!(document.status.body.plain.contains("M foo.txt"));
    }

    #[test]
    fn test_no_records_yields_status_only() {
        let document = assemble(normalize("The working copy is clean"), Vec::new());
        assert!(document.sections.is_empty());
        assert_eq!(document.status.body.plain, "The working copy is clean");
        assert!(!document.status.collapsed);
    }

    #[test]
    fn test_duplicate_header_kept_when_absent() {
        let record = FileDiffRecord {
            file_identifier: "Changes".to_string(),
            body: "+orphan line\n+more".to_string(),
        };
        let document = assemble(StyledText::default(), vec![record]);
        assert_eq!(document.sections[0].body.plain, "+orphan line\n+more");
    }

    #[test]
    fn test_duplicate_header_stripped_despite_color() {
        let record = FileDiffRecord {
            file_identifier: "src/app.rs".to_string(),
            body: "\x1b[33msrc/app.rs\x1b[0m --- Rust\n1 fn run() {}".to_string(),
        };
        let document = assemble(StyledText::default(), vec![record]);
        assert_eq!(document.sections[0].body.plain, "1 fn run() {}");
    }

    #[test]
    fn test_single_line_body_matching_identifier_empties() {
        let record = FileDiffRecord {
            file_identifier: "foo.rs".to_string(),
            body: "foo.rs --- Rust".to_string(),
        };
        let document = assemble(StyledText::default(), vec![record]);
        assert_eq!(document.sections[0].body.plain, "");
    }

    #[test]
    fn test_section_order_follows_records() {
        let records = vec![
            FileDiffRecord {
                file_identifier: "z.rs".to_string(),
                body: "z.rs --- Rust\n+1".to_string(),
            },
            FileDiffRecord {
                file_identifier: "a.rs".to_string(),
                body: "a.rs --- Rust\n+2".to_string(),
            },
        ];
        let document = assemble(StyledText::default(), records);
        let titles: Vec<_> = document
            .sections
            .iter()
            .map(|s| s.title.as_deref().unwrap())
            .collect();
        assert_eq!(titles, ["z.rs", "a.rs"]);
    }

    #[test]
    fn test_current_file_for_walks_to_section() {
        let records = diff::parse("foo.txt --- text\n+new");
        let document = assemble(StyledText::default(), records);
        let section = &document.sections[0];
        assert_eq!(document.current_file_for(section.node), Some("foo.txt"));
        assert_eq!(document.current_file_for(section.body_node), Some("foo.txt"));
    }

    #[test]
    fn test_current_file_for_status_is_none() {
        let document = assemble(normalize("M foo.txt"), Vec::new());
        assert_eq!(document.current_file_for(document.status.node), None);
        assert_eq!(document.current_file_for(document.status.body_node), None);
    }

    #[test]
    fn test_current_file_for_unknown_node() {
        let document = Document::empty();
        assert_eq!(document.current_file_for(999), None);
    }

    #[test]
    fn test_toggle_flips_file_sections_only() {
        let records = diff::parse("foo.txt --- text\n+new");
        let mut document = assemble(normalize("M foo.txt"), records);
        let node = document.sections[0].node;

        assert!(document.toggle(node));
        assert!(!document.sections[0].collapsed);
        assert!(document.toggle(node));
        assert!(document.sections[0].collapsed);

        assert!(!document.toggle(document.status.node));
        assert!(!document.status.collapsed);
    }
}
