pub use kurbo::Vec2;

/// Component role inside a display cycle.
///
/// Ordering follows on-screen stacking (surtitle above title, content last, images inside
/// the content block).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Surtitle,
    Title,
    Subtitle,
    Content,
    Image,
}

impl Role {
    /// Roles whose text is split into word units.
    pub const TEXT: [Role; 4] = [Role::Surtitle, Role::Title, Role::Subtitle, Role::Content];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Surtitle => "surtitle",
            Self::Title => "title",
            Self::Subtitle => "subtitle",
            Self::Content => "content",
            Self::Image => "image",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something a tween can animate: a whole element or one word unit inside it.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    Element { id: String },
    Word { element: String, index: usize },
}

impl Target {
    pub fn element(id: impl Into<String>) -> Self {
        Self::Element { id: id.into() }
    }

    pub fn word(element: impl Into<String>, index: usize) -> Self {
        Self::Word {
            element: element.into(),
            index,
        }
    }

    /// Id of the element that owns this target.
    pub fn element_id(&self) -> &str {
        match self {
            Self::Element { id } => id,
            Self::Word { element, .. } => element,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Element { id } => write!(f, "#{id}"),
            Self::Word { element, index } => write!(f, "#{element} .word[{index}]"),
        }
    }
}

/// `a / b` when both operands are strictly positive and finite, `None` otherwise.
pub fn positive_ratio(a: f64, b: f64) -> Option<f64> {
    if a > 0.0 && b > 0.0 && a.is_finite() && b.is_finite() {
        Some(a / b)
    } else {
        None
    }
}

pub fn ms_to_secs(ms: f64) -> f64 {
    ms / 1000.0
}
