use std::borrow::Cow;
use std::cell::{Ref, RefCell};

use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, LocalName, Namespace, QualName};

use super::{Element, Node};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Elements that may never be stored inside block content.
const UNSUPPORTED_ELEMENTS: [&str; 3] = ["script", "style", "template"];

/// Markup that parses as HTML but cannot be stored as block content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkupError {
    #[error("Unsupported element <{0}> in block markup")]
    UnsupportedElement(String),
    #[error("Unsupported {0} in block markup")]
    UnsupportedNode(&'static str),
}

/// Parse a markup fragment into its top-level nodes.
///
/// Parsing follows the HTML fragment algorithm in a `<body>` context, so
/// stray `<`, unknown or prefixed tags and mis-nested end tags are recovered
/// the way a browser would. Comments are skipped, entities decoded, and
/// adjacent text merged.
pub fn parse_fragment(input: &str) -> Result<Vec<Node>, MarkupError> {
    let context = QualName::new(
        None,
        Namespace::from(HTML_NAMESPACE),
        LocalName::from("body"),
    );
    html5ever::parse_fragment(FragmentSink::new(), Default::default(), context, Vec::new())
        .one(input)
}

type Handle = usize;

const DOCUMENT: Handle = 0;

#[derive(Debug)]
enum SinkKind {
    Document,
    Element(Vec<(String, String)>),
    Text(String),
    Comment,
}

#[derive(Debug)]
struct SinkNode {
    name: QualName,
    kind: SinkKind,
    parent: Option<Handle>,
    children: Vec<Handle>,
}

/// Arena the HTML tree builder writes into; converted to [`Node`]s on finish.
struct FragmentSink {
    nodes: RefCell<Vec<SinkNode>>,
    unsupported: RefCell<Option<MarkupError>>,
    recovered: RefCell<Vec<Cow<'static, str>>>,
}

impl FragmentSink {
    fn new() -> Self {
        Self {
            nodes: RefCell::new(vec![SinkNode {
                name: unnamed(),
                kind: SinkKind::Document,
                parent: None,
                children: Vec::new(),
            }]),
            unsupported: RefCell::new(None),
            recovered: RefCell::new(Vec::new()),
        }
    }

    fn add(&self, name: QualName, kind: SinkKind) -> Handle {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(SinkNode {
            name,
            kind,
            parent: None,
            children: Vec::new(),
        });
        nodes.len() - 1
    }

    fn reject(&self, err: MarkupError) {
        self.unsupported.borrow_mut().get_or_insert(err);
    }

    fn detach(&self, handle: Handle) {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(parent) = nodes[handle].parent.take() {
            nodes[parent].children.retain(|child| *child != handle);
        }
    }

    /// Insert `child` under `parent`, before `sibling` or at the end, merging
    /// text into the preceding text node.
    fn insert(&self, parent: Handle, sibling: Option<Handle>, child: NodeOrText<Handle>) {
        match child {
            NodeOrText::AppendNode(handle) => {
                self.detach(handle);
                let mut nodes = self.nodes.borrow_mut();
                let at = position(&nodes[parent].children, sibling);
                nodes[parent].children.insert(at, handle);
                nodes[handle].parent = Some(parent);
            }
            NodeOrText::AppendText(text) => {
                {
                    let mut nodes = self.nodes.borrow_mut();
                    let siblings = &nodes[parent].children;
                    let previous = position(siblings, sibling)
                        .checked_sub(1)
                        .map(|index| siblings[index]);
                    if let Some(previous) = previous {
                        if let SinkKind::Text(existing) = &mut nodes[previous].kind {
                            existing.push_str(&text);
                            return;
                        }
                    }
                }
                let handle = self.add(unnamed(), SinkKind::Text(text.to_string()));
                self.insert(parent, sibling, NodeOrText::AppendNode(handle));
            }
        }
    }

    fn build(nodes: &[SinkNode], handle: Handle, out: &mut Vec<Node>) {
        let node = &nodes[handle];
        match &node.kind {
            SinkKind::Document | SinkKind::Comment => {}
            SinkKind::Text(text) => match out.last_mut() {
                Some(Node::Text(previous)) => previous.push_str(text),
                _ => out.push(Node::Text(text.clone())),
            },
            SinkKind::Element(attrs) => {
                let mut element = Element::new((*node.name.local).to_ascii_lowercase());
                element.attrs = attrs.clone();
                if !element.is_void() {
                    for child in &node.children {
                        Self::build(nodes, *child, &mut element.children);
                    }
                }
                out.push(Node::Element(element));
            }
        }
    }
}

impl TreeSink for FragmentSink {
    type Handle = Handle;
    type Output = Result<Vec<Node>, MarkupError>;
    type ElemName<'a> = Ref<'a, QualName>;

    fn finish(self) -> Self::Output {
        if let Some(err) = self.unsupported.into_inner() {
            return Err(err);
        }
        let recovered = self.recovered.into_inner();
        if !recovered.is_empty() {
            log::debug!("Recovered from {} markup error(s): {recovered:?}", recovered.len());
        }

        let nodes = self.nodes.into_inner();
        // Fragment parsing places everything under a synthetic <html> root.
        let roots = match nodes[DOCUMENT].children.as_slice() {
            [root] if &*nodes[*root].name.local == "html" => &nodes[*root].children,
            other => other,
        };
        let mut out = Vec::new();
        for handle in roots {
            Self::build(&nodes, *handle, &mut out);
        }
        Ok(out)
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        self.recovered.borrow_mut().push(msg);
    }

    fn get_document(&self) -> Handle {
        DOCUMENT
    }

    fn elem_name<'a>(&'a self, target: &'a Handle) -> Ref<'a, QualName> {
        Ref::map(self.nodes.borrow(), |nodes| &nodes[*target].name)
    }

    fn create_element(&self, name: QualName, attrs: Vec<Attribute>, _flags: ElementFlags) -> Handle {
        let tag = (*name.local).to_ascii_lowercase();
        if UNSUPPORTED_ELEMENTS.contains(&tag.as_str()) {
            self.reject(MarkupError::UnsupportedElement(tag));
        }
        let attrs = attrs
            .iter()
            .map(|attr| (attribute_name(&attr.name), attr.value.to_string()))
            .collect();
        self.add(name, SinkKind::Element(attrs))
    }

    fn create_comment(&self, _text: StrTendril) -> Handle {
        self.add(unnamed(), SinkKind::Comment)
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Handle {
        self.reject(MarkupError::UnsupportedNode("processing instruction"));
        self.add(unnamed(), SinkKind::Comment)
    }

    fn append(&self, parent: &Handle, child: NodeOrText<Handle>) {
        self.insert(*parent, None, child);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Handle,
        prev_element: &Handle,
        child: NodeOrText<Handle>,
    ) {
        let has_parent = self.nodes.borrow()[*element].parent.is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        self.reject(MarkupError::UnsupportedNode("doctype"));
    }

    fn get_template_contents(&self, target: &Handle) -> Handle {
        *target
    }

    fn same_node(&self, x: &Handle, y: &Handle) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &Handle, new_node: NodeOrText<Handle>) {
        let parent = self.nodes.borrow()[*sibling].parent;
        if let Some(parent) = parent {
            self.insert(parent, Some(*sibling), new_node);
        }
    }

    fn add_attrs_if_missing(&self, target: &Handle, attrs: Vec<Attribute>) {
        let mut nodes = self.nodes.borrow_mut();
        if let SinkKind::Element(existing) = &mut nodes[*target].kind {
            for attr in attrs {
                let name = attribute_name(&attr.name);
                if !existing.iter().any(|(present, _)| *present == name) {
                    existing.push((name, attr.value.to_string()));
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Handle) {
        self.detach(*target);
    }

    fn reparent_children(&self, node: &Handle, new_parent: &Handle) {
        let mut nodes = self.nodes.borrow_mut();
        let children = std::mem::take(&mut nodes[*node].children);
        for child in &children {
            nodes[*child].parent = Some(*new_parent);
        }
        nodes[*new_parent].children.extend(children);
    }
}

fn position(children: &[Handle], sibling: Option<Handle>) -> usize {
    sibling
        .and_then(|sibling| children.iter().position(|child| *child == sibling))
        .unwrap_or(children.len())
}

fn unnamed() -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(""))
}

fn attribute_name(name: &QualName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{prefix}:{}", name.local),
        None => (*name.local).to_ascii_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn only_element(markup: &str) -> Element {
        let nodes = parse_fragment(markup).unwrap();
        match nodes.as_slice() {
            [Node::Element(element)] => element.clone(),
            other => panic!("expected one element, got {other:?}"),
        }
    }

    #[test]
    fn parses_nested_elements_and_attributes() {
        let nodes = parse_fragment(r#"<P Class="o-lede">Hello <em>big</em> world</P>"#).unwrap();

        assert_eq!(
            nodes,
            vec![Node::Element(
                Element::new("p").with_attr("class", "o-lede").with_children(vec![
                    Node::text("Hello "),
                    Node::Element(Element::new("em").with_children(vec![Node::text("big")])),
                    Node::text(" world"),
                ])
            )]
        );
    }

    #[test]
    fn decodes_entities_in_text_and_attributes() {
        let link = only_element("<a href='?a=1&amp;b=2'>Fish &amp; chips</a>");

        assert_eq!(link.attr("href"), Some("?a=1&b=2"));
        assert_eq!(link.children, vec![Node::text("Fish & chips")]);
    }

    #[test]
    fn void_elements_have_no_children() {
        let nodes = parse_fragment("a<br>b<img src=x>c").unwrap();

        assert_eq!(nodes.len(), 5);
        assert_eq!(nodes[1], Node::Element(Element::new("br")));
        assert_eq!(
            nodes[3],
            Node::Element(Element::new("img").with_attr("src", "x"))
        );
    }

    #[test]
    fn skips_comments() {
        let nodes = parse_fragment("<!-- wp:paragraph --><p>x</p><!-- /wp:paragraph -->").unwrap();
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn unquoted_and_boolean_attributes() {
        let p = only_element("<p id=intro hidden>x</p>");

        assert_eq!(p.attr("id"), Some("intro"));
        assert_eq!(p.attr("hidden"), Some(""));
    }

    #[test]
    fn bare_less_than_is_text() {
        let p = only_element("<p>1 < 2</p>");
        assert_eq!(p.children, vec![Node::text("1 < 2")]);
    }

    #[test]
    fn prefixed_tags_from_word_are_kept_as_elements() {
        let p = only_element("<p>x<o:p></o:p></p>");

        assert_eq!(
            p.children,
            vec![Node::text("x"), Node::Element(Element::new("o:p"))]
        );
    }

    #[test]
    fn uppercase_closing_tags_close_their_element() {
        let nodes = parse_fragment("<P>one</P><H2>two</H2>").unwrap();

        assert_eq!(
            nodes,
            vec![
                Node::Element(Element::new("p").with_children(vec![Node::text("one")])),
                Node::Element(Element::new("h2").with_children(vec![Node::text("two")])),
            ]
        );
    }

    #[test]
    fn misnested_end_tags_are_recovered() {
        let p = only_element("<p><em>x</p></em>");

        assert_eq!(
            p.children,
            vec![Node::Element(Element::new("em").with_children(vec![Node::text("x")]))]
        );
    }

    #[test]
    fn unclosed_element_ends_with_the_fragment() {
        let p = only_element("<p>open");
        assert_eq!(p.children, vec![Node::text("open")]);
    }

    #[test]
    fn duplicate_attribute_keeps_the_first() {
        let p = only_element(r#"<p id="a" id="b">x</p>"#);
        assert_eq!(p.attr("id"), Some("a"));
    }

    #[test]
    fn rejects_scripts() {
        assert_eq!(
            parse_fragment("<p>x</p><script>alert(1)</script>"),
            Err(MarkupError::UnsupportedElement("script".into()))
        );
    }

    #[test]
    fn preserves_non_ascii_text() {
        let p = only_element("<p>héllo — wörld</p>");
        assert_eq!(p.children, vec![Node::text("héllo — wörld")]);
    }
}
