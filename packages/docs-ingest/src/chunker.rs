use std::ops::Range;

use pulldown_cmark::{Event, Options, Parser, Tag};

use crate::types::SectionNode;

/// Split raw markdown into an ordered tree of sections.
///
/// Headings become nodes, the text between a heading and the next heading
/// becomes that node's content, and deeper headings nest under the closest
/// shallower one. The root is a synthetic level-0 node holding any preamble
/// before the first heading. Content with no headings yields a single root
/// holding everything; malformed markup degrades to a best-effort flat
/// structure rather than failing. Pure and deterministic, no I/O.
pub fn chunk(content: &str) -> SectionNode {
    let headings = scan_headings(content);

    let mut root = SectionNode {
        heading: String::new(),
        level: 0,
        content: preamble(content, &headings),
        children: Vec::new(),
    };

    // Section bodies are sliced out of the source text by byte offset, so
    // lists, tables and code blocks survive verbatim.
    let mut stack: Vec<SectionNode> = Vec::new();
    for (idx, heading) in headings.iter().enumerate() {
        let body_end = headings
            .get(idx + 1)
            .map_or(content.len(), |next| next.span.start);
        let body = content[heading.span.end..body_end].trim();

        let node = SectionNode {
            heading: heading.text.trim().to_string(),
            level: heading.level,
            content: body.to_string(),
            children: Vec::new(),
        };

        while let Some(open) = stack.pop() {
            if open.level >= heading.level {
                attach(&mut root, &mut stack, open);
            } else {
                stack.push(open);
                break;
            }
        }
        stack.push(node);
    }
    while let Some(open) = stack.pop() {
        attach(&mut root, &mut stack, open);
    }

    root
}

fn attach(root: &mut SectionNode, stack: &mut [SectionNode], closed: SectionNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(closed),
        None => root.children.push(closed),
    }
}

struct RawHeading {
    level: i32,
    text: String,
    span: Range<usize>,
}

/// Collect every heading with its source byte range. The markdown parser
/// already knows a `#` inside a code fence is not a heading.
fn scan_headings(content: &str) -> Vec<RawHeading> {
    let mut headings = Vec::new();
    let mut current: Option<RawHeading> = None;

    for (event, span) in Parser::new_ext(content, Options::empty()).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading(level, _, _)) => {
                current = Some(RawHeading {
                    level: level as i32,
                    text: String::new(),
                    span,
                });
            }
            Event::End(Tag::Heading(..)) => {
                if let Some(heading) = current.take() {
                    headings.push(heading);
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(heading) = current.as_mut() {
                    heading.text.push_str(&text);
                }
            }
            _ => {}
        }
    }

    headings
}

fn preamble(content: &str, headings: &[RawHeading]) -> String {
    let end = headings.first().map_or(content.len(), |first| first.span.start);
    content[..end].trim().to_string()
}
