//! Text segmentation into animatable word units.
//!
//! Raw rumor text may carry inline HTML and `**emphasis**`. Segmentation produces a small
//! fragment tree in which every whitespace-delimited token of text is a [`Node::Word`]
//! while the surrounding markup nesting is preserved; whitespace stays plain text.

use std::sync::OnceLock;

use html5ever::{
    LocalName, Namespace, ParseOpts, QualName, parse_fragment, tendril::TendrilSink,
    tree_builder::TreeBuilderOpts,
};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::Regex;

use crate::content::Content;

/// How raw text markup is treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupMode {
    /// Inline tags in the input are parsed and kept.
    #[default]
    Parse,
    /// Input tags are neutralized and rendered as literal text.
    Escape,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Word(String),
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<Node>,
    },
}

const VOID_TAGS: [&str; 5] = ["br", "img", "hr", "wbr", "input"];
const EMPHASIS_CLASS: &str = "body-emphasis";
const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

impl Node {
    pub fn element(tag: &str, class: &str, children: Vec<Node>) -> Self {
        Self::Element {
            tag: tag.to_string(),
            attrs: vec![("class".to_string(), class.to_string())],
            children,
        }
    }

    fn collect_words<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Word(w) => out.push(w),
            Self::Text(_) => {}
            Self::Element { children, .. } => {
                for c in children {
                    c.collect_words(out);
                }
            }
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Self::Text(t) => out.push_str(&escape_html(t)),
            Self::Word(w) => {
                out.push_str("<span class=\"word\">");
                out.push_str(&escape_html(w));
                out.push_str("</span>");
            }
            Self::Element {
                tag,
                attrs,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                for (k, v) in attrs {
                    out.push_str(&format!(" {k}=\"{}\"", escape_html(v)));
                }
                out.push('>');
                if VOID_TAGS.contains(&tag.as_str()) {
                    return;
                }
                for c in children {
                    c.write_html(out);
                }
                out.push_str(&format!("</{tag}>"));
            }
        }
    }
}

/// Segmented markup for one component.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fragment {
    pub nodes: Vec<Node>,
}

impl Fragment {
    /// Word units in document order.
    pub fn words(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for n in &self.nodes {
            n.collect_words(&mut out);
        }
        out
    }

    pub fn word_count(&self) -> usize {
        self.words().len()
    }

    pub fn is_empty(&self) -> bool {
        self.word_count() == 0
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for n in &self.nodes {
            n.write_html(&mut out);
        }
        out
    }
}

fn regex(pattern: &'static str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid segmenter regex: {err}"))
}

fn emphasis_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r"\*\*(.+?)\*\*"))
}

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r"\S+|\s+"))
}

/// Segment one text field.
pub fn segment(text: &str, mode: MarkupMode) -> Fragment {
    let nodes = match mode {
        MarkupMode::Parse => parse_markup(&convert_emphasis(text)),
        MarkupMode::Escape => segment_plain(&decode_entities(text)),
    };
    Fragment { nodes }
}

/// Segment body content: one `span.line` per line, or a single `p`.
pub fn segment_content(content: &Content, mode: MarkupMode) -> Fragment {
    let nodes = match content {
        Content::Lines(lines) => lines
            .iter()
            .map(|line| Node::element("span", "line", segment(line, mode).nodes))
            .collect(),
        Content::Text(text) => vec![Node::Element {
            tag: "p".to_string(),
            attrs: Vec::new(),
            children: segment(text, mode).nodes,
        }],
    };
    Fragment { nodes }
}

/// `**x**` becomes an emphasis span ahead of markup parsing.
fn convert_emphasis(text: &str) -> String {
    emphasis_re()
        .replace_all(text, format!("<span class='{EMPHASIS_CLASS}'>$1</span>").as_str())
        .into_owned()
}

/// Parse `html` as the children of a `<body>` element.
fn parse_body_fragment(html: &str) -> RcDom {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            scripting_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    let context = QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from("body"));
    parse_fragment(RcDom::default(), opts, context, Vec::new()).one(html)
}

/// Top-level nodes of a parsed fragment; the parser hangs them off a synthetic `<html>`.
fn fragment_roots(dom: &RcDom) -> Vec<Handle> {
    dom.document
        .children
        .borrow()
        .iter()
        .flat_map(|root| root.children.borrow().clone())
        .collect()
}

/// Decode every HTML character reference, leaving any tag-like text literal.
pub fn decode_entities(text: &str) -> String {
    let dom = parse_body_fragment(&text.replace('<', "&lt;"));
    let mut out = String::with_capacity(text.len());
    for handle in fragment_roots(&dom) {
        if let NodeData::Text { contents } = &handle.data {
            out.push_str(&contents.borrow());
        }
    }
    out
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn split_words(text: &str) -> Vec<Node> {
    token_re()
        .find_iter(text)
        .map(|m| {
            let s = m.as_str();
            if s.trim().is_empty() {
                Node::Text(s.to_string())
            } else {
                Node::Word(s.to_string())
            }
        })
        .collect()
}

fn segment_plain(text: &str) -> Vec<Node> {
    let mut out = Vec::new();
    let mut cursor = 0;
    for caps in emphasis_re().captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.extend(split_words(&text[cursor..whole.start()]));
        out.push(Node::element(
            "span",
            EMPHASIS_CLASS,
            split_words(inner.as_str()),
        ));
        cursor = whole.end();
    }
    out.extend(split_words(&text[cursor..]));
    out
}

/// Markup-aware segmentation: the HTML parser builds the tree and decodes entities, then
/// every text node is split into word units. Comments and other non-element nodes drop out.
fn parse_markup(text: &str) -> Vec<Node> {
    let dom = parse_body_fragment(text);
    let mut out = Vec::new();
    for handle in fragment_roots(&dom) {
        convert_node(&handle, &mut out);
    }
    out
}

fn convert_node(handle: &Handle, out: &mut Vec<Node>) {
    match &handle.data {
        NodeData::Text { contents } => out.extend(split_words(&contents.borrow())),
        NodeData::Element { name, attrs, .. } => {
            let mut children = Vec::new();
            for child in handle.children.borrow().iter() {
                convert_node(child, &mut children);
            }
            let attrs = attrs
                .borrow()
                .iter()
                .map(|a| (a.name.local.to_string(), a.value.to_string()))
                .collect();
            out.push(Node::Element {
                tag: name.local.to_string(),
                attrs,
                children,
            });
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_text_into_words() {
        let f = segment("one  two three", MarkupMode::Parse);
        assert_eq!(f.words(), vec!["one", "two", "three"]);
        assert_eq!(
            f.to_html(),
            "<span class=\"word\">one</span>  <span class=\"word\">two</span> <span class=\"word\">three</span>"
        );
    }

    #[test]
    fn blank_input_has_no_words() {
        assert!(segment("", MarkupMode::Parse).is_empty());
        assert!(segment("   \t ", MarkupMode::Escape).is_empty());
    }

    #[test]
    fn emphasis_stays_wrapped_around_its_words() {
        let f = segment("the **blood moon** rises", MarkupMode::Parse);
        assert_eq!(f.word_count(), 4);
        assert_eq!(
            f.to_html(),
            "<span class=\"word\">the</span> <span class=\"body-emphasis\"><span class=\"word\">blood</span> <span class=\"word\">moon</span></span> <span class=\"word\">rises</span>"
        );
    }

    #[test]
    fn inline_tags_are_preserved_in_parse_mode() {
        let f = segment("<em>very</em> old &mdash; blood", MarkupMode::Parse);
        assert_eq!(f.words(), vec!["very", "old", "\u{2014}", "blood"]);
        assert!(f.to_html().starts_with("<em><span class=\"word\">very</span></em>"));
    }

    #[test]
    fn escape_mode_neutralizes_input_markup() {
        let f = segment("<b>bold</b> &amp; brave", MarkupMode::Escape);
        assert_eq!(f.words(), vec!["<b>bold</b>", "&", "brave"]);
        assert_eq!(
            f.to_html(),
            "<span class=\"word\">&lt;b&gt;bold&lt;/b&gt;</span> <span class=\"word\">&amp;</span> <span class=\"word\">brave</span>"
        );
        let f = segment("a **b** c", MarkupMode::Escape);
        assert_eq!(f.word_count(), 3);
        assert!(f.to_html().contains("body-emphasis"));
    }

    #[test]
    fn tolerant_parser_closes_and_drops_tags() {
        let f = segment("</i>a <span class=\"x\">b <br/>c", MarkupMode::Parse);
        assert_eq!(f.words(), vec!["a", "b", "c"]);
        assert_eq!(
            f.to_html(),
            "<span class=\"word\">a</span> <span class=\"x\"><span class=\"word\">b</span> <br><span class=\"word\">c</span></span>"
        );
    }

    #[test]
    fn content_lines_get_line_wrappers() {
        let f = segment_content(
            &Content::Lines(vec!["a b".into(), "c".into()]),
            MarkupMode::Parse,
        );
        assert_eq!(f.word_count(), 3);
        assert!(f.to_html().starts_with("<span class=\"line\">"));
        let f = segment_content(&Content::Text("x y".into()), MarkupMode::Parse);
        assert!(f.to_html().starts_with("<p>"));
    }

    #[test]
    fn numeric_and_unknown_entities() {
        assert_eq!(decode_entities("&#65;&#x42;&bogus;"), "AB&bogus;");
    }

    #[test]
    fn full_entity_set_decodes_once() {
        let f = segment(
            "&laquo;Hush&raquo; said the Prince &ndash; 3&times;",
            MarkupMode::Parse,
        );
        assert_eq!(
            f.words(),
            vec!["\u{ab}Hush\u{bb}", "said", "the", "Prince", "\u{2013}", "3\u{d7}"]
        );
        assert!(!f.to_html().contains("&amp;"));

        let f = segment("&laquo;<i>x</i>&raquo;", MarkupMode::Escape);
        assert_eq!(f.words(), vec!["\u{ab}<i>x</i>\u{bb}"]);
    }

    #[test]
    fn quoted_attribute_values_may_hold_angle_brackets() {
        let f = segment(r#"<span title="a>b">inside</span> out"#, MarkupMode::Parse);
        assert_eq!(f.words(), vec!["inside", "out"]);
        assert_eq!(
            f.to_html(),
            "<span title=\"a&gt;b\"><span class=\"word\">inside</span></span> <span class=\"word\">out</span>"
        );
    }

    #[test]
    fn comments_are_not_words() {
        let f = segment("seen <!-- editor note --> heard", MarkupMode::Parse);
        assert_eq!(f.words(), vec!["seen", "heard"]);
        assert!(!f.to_html().contains("editor"));
    }

    #[test]
    fn escaped_tags_in_parse_mode_stay_text() {
        let f = segment("&lt;b&gt;loud&lt;/b&gt;", MarkupMode::Parse);
        assert_eq!(f.words(), vec!["<b>loud</b>"]);
    }
}
