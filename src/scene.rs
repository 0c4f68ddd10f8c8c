use std::collections::BTreeMap;

use crate::{
    foundation::{
        core::{Role, Target},
        error::{ReelError, ReelResult},
    },
    segment::{Fragment, escape_html},
};

pub const CONTAINER_ID: &str = "rumor-container";
pub const SURTITLE_ID: &str = "rumor-surtitle";
pub const TITLE_ID: &str = "rumor-title";
pub const SUBTITLE_ID: &str = "rumor-subtitle";
pub const CONTENT_ID: &str = "rumor-content";

pub fn image_id(index: usize) -> String {
    format!("rumor-image-{index}")
}

/// Element holding the words of a text role.
pub fn text_element_id(role: Role) -> Option<&'static str> {
    match role {
        Role::Surtitle => Some(SURTITLE_ID),
        Role::Title => Some(TITLE_ID),
        Role::Subtitle => Some(SUBTITLE_ID),
        Role::Content => Some(CONTENT_ID),
        Role::Image => None,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub id: String,
    pub tag: String,
    pub classes: Vec<String>,
    pub fragment: Fragment,
    pub src: Option<String>,
    pub children: Vec<String>, // element ids, after the fragment
}

impl Element {
    fn new(tag: &str, id: &str) -> Self {
        Self {
            id: id.to_string(),
            tag: tag.to_string(),
            classes: Vec::new(),
            fragment: Fragment::default(),
            src: None,
            children: Vec::new(),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// In-memory render targets addressed by stable element id.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    elements: BTreeMap<String, Element>,
}

impl Scene {
    /// Scene with the pre-existing insertion points: the container holding title and content.
    pub fn with_container() -> Self {
        let mut scene = Self::default();
        let mut container = Element::new("div", CONTAINER_ID);
        container.classes.push(CONTAINER_ID.to_string());
        container.children = vec![TITLE_ID.to_string(), CONTENT_ID.to_string()];
        scene.elements.insert(CONTAINER_ID.to_string(), container);

        let mut title = Element::new("h1", TITLE_ID);
        title.classes.push(TITLE_ID.to_string());
        scene.elements.insert(TITLE_ID.to_string(), title);

        let mut content = Element::new("div", CONTENT_ID);
        content.classes.push(CONTENT_ID.to_string());
        scene.elements.insert(CONTENT_ID.to_string(), content);
        scene
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    fn element_mut(&mut self, id: &str) -> ReelResult<&mut Element> {
        self.elements
            .get_mut(id)
            .ok_or_else(|| ReelError::validation(format!("no element '#{id}' in scene")))
    }

    /// Create the element if needed and reset its class list to `base` plus the
    /// space-delimited `extra` classes.
    pub fn get_or_create(&mut self, tag: &str, id: &str, base: &str, extra: &str) -> &mut Element {
        let el = self
            .elements
            .entry(id.to_string())
            .or_insert_with(|| Element::new(tag, id));
        el.classes = std::iter::once(base)
            .chain(extra.split_whitespace())
            .map(str::to_string)
            .collect();
        el
    }

    /// Remove an element and its descendants; detaches it from its parent.
    pub fn remove(&mut self, id: &str) -> Option<Element> {
        let el = self.elements.remove(id)?;
        for child in &el.children {
            self.remove(child);
        }
        for other in self.elements.values_mut() {
            other.children.retain(|c| c != id);
        }
        Some(el)
    }

    pub fn clear_children(&mut self, id: &str) -> ReelResult<()> {
        let children = std::mem::take(&mut self.element_mut(id)?.children);
        for child in children {
            self.remove(&child);
        }
        Ok(())
    }

    pub fn contains(&self, parent: &str, child: &str) -> bool {
        self.element(parent)
            .is_some_and(|p| p.children.iter().any(|c| c == child))
    }

    pub fn append_child(&mut self, parent: &str, child: &str) -> ReelResult<()> {
        self.detach(child);
        self.element_mut(parent)?.children.push(child.to_string());
        Ok(())
    }

    pub fn insert_before(&mut self, parent: &str, child: &str, reference: &str) -> ReelResult<()> {
        self.insert_relative(parent, child, reference, 0)
    }

    pub fn insert_after(&mut self, parent: &str, child: &str, reference: &str) -> ReelResult<()> {
        self.insert_relative(parent, child, reference, 1)
    }

    fn insert_relative(
        &mut self,
        parent: &str,
        child: &str,
        reference: &str,
        offset: usize,
    ) -> ReelResult<()> {
        self.detach(child);
        let p = self.element_mut(parent)?;
        let pos = p
            .children
            .iter()
            .position(|c| c == reference)
            .ok_or_else(|| {
                ReelError::validation(format!("'#{reference}' is not a child of '#{parent}'"))
            })?;
        p.children.insert(pos + offset, child.to_string());
        Ok(())
    }

    fn detach(&mut self, child: &str) {
        for el in self.elements.values_mut() {
            el.children.retain(|c| c != child);
        }
    }

    pub fn set_fragment(&mut self, id: &str, fragment: Fragment) -> ReelResult<()> {
        self.element_mut(id)?.fragment = fragment;
        Ok(())
    }

    pub fn set_src(&mut self, id: &str, src: impl Into<String>) -> ReelResult<()> {
        self.element_mut(id)?.src = Some(src.into());
        Ok(())
    }

    pub fn add_class(&mut self, id: &str, class: &str) -> ReelResult<()> {
        let el = self.element_mut(id)?;
        if !el.has_class(class) {
            el.classes.push(class.to_string());
        }
        Ok(())
    }

    pub fn remove_classes(&mut self, id: &str, classes: &[String]) -> ReelResult<()> {
        self.element_mut(id)?
            .classes
            .retain(|c| !classes.contains(c));
        Ok(())
    }

    pub fn classes(&self, id: &str) -> Vec<String> {
        self.element(id)
            .map(|e| e.classes.clone())
            .unwrap_or_default()
    }

    /// Word-unit targets of an element, in document order. Empty for unknown ids.
    pub fn word_targets(&self, id: &str) -> Vec<Target> {
        let n = self.element(id).map_or(0, |e| e.fragment.word_count());
        (0..n).map(|i| Target::word(id, i)).collect()
    }

    /// Image elements inside the content block, in document order.
    pub fn image_ids(&self) -> Vec<String> {
        let Some(content) = self.element(CONTENT_ID) else {
            return Vec::new();
        };
        content
            .children
            .iter()
            .filter(|id| self.element(id).is_some_and(|e| e.tag == "img"))
            .cloned()
            .collect()
    }

    /// Serialized markup of an element subtree.
    pub fn to_html(&self, id: &str) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: &str, out: &mut String) {
        let Some(el) = self.element(id) else { return };
        out.push_str(&format!(
            "<{} id=\"{}\" class=\"{}\"",
            el.tag,
            escape_html(&el.id),
            escape_html(&el.classes.join(" "))
        ));
        if let Some(src) = &el.src {
            out.push_str(&format!(" src=\"{}\" alt=\"\"", escape_html(src)));
        }
        out.push('>');
        if el.tag == "img" {
            return;
        }
        out.push_str(&el.fragment.to_html());
        for child in &el.children {
            self.write_html(child, out);
        }
        out.push_str(&format!("</{}>", el.tag));
    }
}
