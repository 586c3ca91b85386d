use crate::types::{DocumentId, Section, SectionId, SectionNode};

/// Flatten a chunked document tree into storable sections.
///
/// Pre-order traversal with a single position counter shared across the whole
/// tree: positions are 0-based, unique per document and strictly increasing in
/// document order, never reset per sibling group. Section ids are assigned
/// here rather than by the store, so parent links can be wired before any row
/// exists. A branch that carries no content anywhere is skipped without being
/// visited further.
pub fn flatten(root: &SectionNode, document_id: DocumentId) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut position = 0;
    visit(root, document_id, None, &mut position, &mut sections);
    sections
}

fn visit(
    node: &SectionNode,
    document_id: DocumentId,
    parent: Option<SectionId>,
    position: &mut i32,
    out: &mut Vec<Section>,
) {
    if subtree_is_blank(node) {
        return;
    }

    let id = SectionId::new();
    out.push(Section {
        id,
        document_id,
        parent_section_id: parent,
        heading: node.heading.clone(),
        level: node.level,
        content: node.content.clone(),
        position: *position,
    });
    *position += 1;

    for child in &node.children {
        visit(child, document_id, Some(id), position, out);
    }
}

/// True when neither the node nor anything under it has content
fn subtree_is_blank(node: &SectionNode) -> bool {
    node.content.trim().is_empty() && node.children.iter().all(subtree_is_blank)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_id() -> DocumentId {
        DocumentId(uuid::Uuid::now_v7())
    }

    #[test]
    fn single_node_tree_yields_one_root_section() {
        let root = SectionNode::new("", 0, "all the content");
        let sections = flatten(&root, doc_id());

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].parent_section_id, None);
        assert_eq!(sections[0].position, 0);
        assert_eq!(sections[0].content, "all the content");
    }

    #[test]
    fn positions_follow_pre_order_across_the_whole_tree() {
        let root = SectionNode::new("", 0, "preamble").with_children(vec![
            SectionNode::new("A", 1, "a").with_children(vec![
                SectionNode::new("A1", 2, "a1"),
                SectionNode::new("A2", 2, "a2"),
            ]),
            SectionNode::new("B", 1, "b"),
        ]);
        let sections = flatten(&root, doc_id());

        let headings: Vec<&str> = sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["", "A", "A1", "A2", "B"]);

        // One counter for the whole traversal, not per sibling group.
        let positions: Vec<i32> = sections.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn positions_are_unique_per_document() {
        let root = SectionNode::new("", 0, "p").with_children(vec![
            SectionNode::new("A", 1, "a"),
            SectionNode::new("B", 1, "b").with_children(vec![SectionNode::new("B1", 2, "b1")]),
        ]);
        let sections = flatten(&root, doc_id());

        let mut positions: Vec<i32> = sections.iter().map(|s| s.position).collect();
        positions.dedup();
        assert_eq!(positions.len(), sections.len());
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn parent_links_point_at_the_retained_parent() {
        let root = SectionNode::new("", 0, "p")
            .with_children(vec![SectionNode::new("A", 1, "a")
                .with_children(vec![SectionNode::new("A1", 2, "a1")])]);
        let sections = flatten(&root, doc_id());

        assert_eq!(sections[0].parent_section_id, None);
        assert_eq!(sections[1].parent_section_id, Some(sections[0].id));
        assert_eq!(sections[2].parent_section_id, Some(sections[1].id));
    }

    #[test]
    fn blank_leaf_is_never_materialized() {
        let root = SectionNode::new("", 0, "p").with_children(vec![
            SectionNode::new("Empty", 1, "   "),
            SectionNode::new("Full", 1, "text"),
        ]);
        let sections = flatten(&root, doc_id());

        let headings: Vec<&str> = sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["", "Full"]);
    }

    #[test]
    fn blank_branch_is_pruned_entirely() {
        let root = SectionNode::new("", 0, "p").with_children(vec![
            SectionNode::new("Hollow", 1, "").with_children(vec![
                SectionNode::new("AlsoHollow", 2, ""),
                SectionNode::new("Deeper", 2, "  \n  "),
            ]),
            SectionNode::new("Real", 1, "text"),
        ]);
        let sections = flatten(&root, doc_id());

        let headings: Vec<&str> = sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["", "Real"]);
        assert_eq!(sections.last().unwrap().position, 1);
    }

    #[test]
    fn blank_node_above_real_content_is_retained() {
        // A heading with no body of its own still anchors its subsections.
        let root = SectionNode::new("", 0, "p")
            .with_children(vec![SectionNode::new("Parent", 1, "")
                .with_children(vec![SectionNode::new("Child", 2, "text")])]);
        let sections = flatten(&root, doc_id());

        let headings: Vec<&str> = sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["", "Parent", "Child"]);
        assert_eq!(sections[2].parent_section_id, Some(sections[1].id));
    }

    #[test]
    fn no_emitted_section_is_blank_with_no_retained_children() {
        let root = SectionNode::new("", 0, "p").with_children(vec![
            SectionNode::new("A", 1, "").with_children(vec![SectionNode::new("A1", 2, "")]),
            SectionNode::new("B", 1, "b"),
        ]);
        let sections = flatten(&root, doc_id());

        for section in &sections {
            let has_retained_child = sections
                .iter()
                .any(|s| s.parent_section_id == Some(section.id));
            assert!(
                !section.content.trim().is_empty() || has_retained_child,
                "section {:?} is blank and childless",
                section.heading
            );
        }
    }

    #[test]
    fn reflattening_reproduces_relative_order_with_fresh_ids() {
        let root = SectionNode::new("", 0, "p").with_children(vec![
            SectionNode::new("A", 1, "a").with_children(vec![SectionNode::new("A1", 2, "a1")]),
            SectionNode::new("B", 1, "b"),
        ]);
        let first = flatten(&root, doc_id());
        let second = flatten(&root, doc_id());

        let order = |sections: &[Section]| {
            sections
                .iter()
                .map(|s| (s.heading.clone(), s.position))
                .collect::<Vec<_>>()
        };
        assert_eq!(order(&first), order(&second));

        let first_ids: std::collections::HashSet<_> = first.iter().map(|s| s.id).collect();
        assert!(second.iter().all(|s| !first_ids.contains(&s.id)));
    }

    #[test]
    fn entirely_blank_tree_yields_nothing() {
        let root = SectionNode::new("", 0, "")
            .with_children(vec![SectionNode::new("Hollow", 1, "")]);
        assert!(flatten(&root, doc_id()).is_empty());
    }
}
