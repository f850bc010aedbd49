//! YAML cursor mapping over a range-annotated parse tree.
//!
//! `yaml-rust2`'s marked parser events carry character offsets; the small
//! AST assembled here keeps a start/end range per node so the descent can
//! decide "on the key", "in the value", or "in the gap between them"
//! (`:` and padding both resolve to the key's path).

use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::Marker;

use crate::path::Path;
use crate::position::{position_to_offset, CursorPosition};

// --------------------------- Annotated nodes ------------------------------ //

#[derive(Debug)]
enum Node {
    Scalar {
        value: String,
        start: usize,
        end: usize,
    },
    Mapping {
        entries: Vec<(Node, Node)>,
        start: usize,
        end: usize,
    },
    Sequence {
        items: Vec<Node>,
        start: usize,
        end: usize,
    },
}

impl Node {
    fn start(&self) -> usize {
        match self {
            Node::Scalar { start, .. }
            | Node::Mapping { start, .. }
            | Node::Sequence { start, .. } => *start,
        }
    }

    fn end(&self) -> usize {
        match self {
            Node::Scalar { end, .. } | Node::Mapping { end, .. } | Node::Sequence { end, .. } => {
                *end
            }
        }
    }

    fn is_container(&self) -> bool {
        matches!(self, Node::Mapping { .. } | Node::Sequence { .. })
    }
}

// ----------------------------- AST assembly ------------------------------- //

enum Frame {
    Mapping {
        start: usize,
        entries: Vec<(Node, Node)>,
        pending_key: Option<Node>,
    },
    Sequence {
        start: usize,
        items: Vec<Node>,
    },
}

/// Builds the annotated tree from marked parser events. Only the first
/// document of a stream is kept. Scalar end positions are start plus
/// rendered length (exact for plain scalars; the descent's gap rule
/// absorbs the slack quoting introduces).
#[derive(Default)]
struct AstBuilder {
    stack: Vec<Frame>,
    root: Option<Node>,
}

impl AstBuilder {
    fn attach(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(Frame::Mapping {
                entries,
                pending_key,
                ..
            }) => match pending_key.take() {
                Some(key) => entries.push((key, node)),
                None => *pending_key = Some(node),
            },
            Some(Frame::Sequence { items, .. }) => items.push(node),
            None => {
                if self.root.is_none() {
                    self.root = Some(node);
                }
            }
        }
    }
}

impl MarkedEventReceiver for AstBuilder {
    fn on_event(&mut self, event: Event, marker: Marker) {
        match event {
            Event::Scalar(value, ..) => {
                let start = marker.index();
                let end = start + value.chars().count();
                self.attach(Node::Scalar { value, start, end });
            }
            Event::MappingStart(..) => {
                self.stack.push(Frame::Mapping {
                    start: marker.index(),
                    entries: Vec::new(),
                    pending_key: None,
                });
            }
            Event::MappingEnd => {
                if let Some(Frame::Mapping { start, entries, .. }) = self.stack.pop() {
                    self.attach(Node::Mapping {
                        entries,
                        start,
                        end: marker.index(),
                    });
                }
            }
            Event::SequenceStart(..) => {
                self.stack.push(Frame::Sequence {
                    start: marker.index(),
                    items: Vec::new(),
                });
            }
            Event::SequenceEnd => {
                if let Some(Frame::Sequence { start, items }) = self.stack.pop() {
                    self.attach(Node::Sequence {
                        items,
                        start,
                        end: marker.index(),
                    });
                }
            }
            // An alias stands in for its anchor; for cursor mapping it is
            // just an addressable leaf.
            Event::Alias(..) => {
                let index = marker.index();
                self.attach(Node::Scalar {
                    value: String::new(),
                    start: index,
                    end: index,
                });
            }
            _ => {}
        }
    }
}

// ------------------------------- Descent ---------------------------------- //

/// Map a cursor position in YAML text to a document path. Parse failures
/// and positions outside every node yield `None`.
pub fn path_at_position(text: &str, position: CursorPosition) -> Option<Path> {
    let offset = position_to_offset(text, position.line, position.column);

    let mut builder = AstBuilder::default();
    let mut parser = Parser::new_from_str(text);
    parser.load(&mut builder, false).ok()?;

    find_path(&builder.root?, offset, &Path::root())
}

fn within(node: &Node, offset: usize) -> bool {
    offset >= node.start() && offset <= node.end()
}

fn find_path(node: &Node, offset: usize, current: &Path) -> Option<Path> {
    if !within(node, offset) {
        return None;
    }
    match node {
        Node::Mapping { entries, .. } => {
            for (key, value) in entries {
                // Only scalar keys are addressable; complex keys have no
                // path-string form.
                let Node::Scalar { value: key_text, .. } = key else {
                    continue;
                };
                let child = current.child(key_text.clone());
                if within(key, offset) {
                    return Some(child);
                }
                if within(value, offset) {
                    if value.is_container() {
                        if let Some(deeper) = find_path(value, offset, &child) {
                            return Some(deeper);
                        }
                    }
                    return Some(child);
                }
                // The gap: on the `:` or the padding between key and value.
                if offset >= key.start() && offset <= value.end() {
                    return Some(child);
                }
            }
            (!current.is_empty()).then(|| current.clone())
        }
        Node::Sequence { items, .. } => {
            for (index, item) in items.iter().enumerate() {
                let child = current.item(index);
                if within(item, offset) {
                    if item.is_container() {
                        if let Some(deeper) = find_path(item, offset, &child) {
                            return Some(deeper);
                        }
                    }
                    return Some(child);
                }
            }
            (!current.is_empty()).then(|| current.clone())
        }
        Node::Scalar { .. } => (!current.is_empty()).then(|| current.clone()),
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn at(text: &str, line: usize, column: usize) -> Option<String> {
        path_at_position(text, CursorPosition { line, column }).map(|p| p.to_string())
    }

    #[test]
    fn top_level_key() {
        assert_eq!(at("name: test\n", 1, 1).as_deref(), Some("name"));
    }

    #[test]
    fn nested_mapping_value() {
        assert_eq!(at("user:\n  email: x\n", 2, 8).as_deref(), Some("user.email"));
    }

    #[test]
    fn value_position_resolves_to_its_key() {
        assert_eq!(at("name: test\n", 1, 8).as_deref(), Some("name"));
    }

    #[test]
    fn colon_gap_resolves_to_the_key() {
        assert_eq!(at("name: test\n", 1, 5).as_deref(), Some("name"));
    }

    #[test]
    fn sequence_items_take_index_segments() {
        let text = "items:\n  - a\n  - b\n";
        assert_eq!(at(text, 2, 5).as_deref(), Some("items[0]"));
        assert_eq!(at(text, 3, 5).as_deref(), Some("items[1]"));
    }

    #[test]
    fn mapping_inside_sequence() {
        let text = "servers:\n  - host: a\n  - host: b\n";
        assert_eq!(at(text, 2, 6).as_deref(), Some("servers[0].host"));
        assert_eq!(at(text, 3, 12).as_deref(), Some("servers[1].host"));
    }

    #[test]
    fn unparsable_text_has_no_path() {
        assert_eq!(at("key: [1,\n", 1, 2), None);
    }

    #[test]
    fn scalar_document_has_no_path() {
        assert_eq!(at("just a scalar\n", 1, 3), None);
    }
}
