use std::collections::BTreeMap;

/// Animatable visual properties of an element or word unit.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Prop {
    Opacity,
    X,
    Y,
    XPercent,
    YPercent,
    Scale,
    Blur,
    Brightness,
    BgOpacity,
}

impl Prop {
    /// Value a target has before anything animates it.
    pub fn initial(self) -> f64 {
        match self {
            Self::Opacity | Self::Scale | Self::Brightness | Self::BgOpacity => 1.0,
            Self::X | Self::Y | Self::XPercent | Self::YPercent | Self::Blur => 0.0,
        }
    }
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// A sparse set of property values, used as tween endpoints.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Props(BTreeMap<Prop, f64>);

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, prop: Prop, value: f64) -> Self {
        self.0.insert(prop, value);
        self
    }

    pub fn opacity(self, v: f64) -> Self {
        self.with(Prop::Opacity, v)
    }

    pub fn x(self, v: f64) -> Self {
        self.with(Prop::X, v)
    }

    pub fn y(self, v: f64) -> Self {
        self.with(Prop::Y, v)
    }

    pub fn x_percent(self, v: f64) -> Self {
        self.with(Prop::XPercent, v)
    }

    pub fn y_percent(self, v: f64) -> Self {
        self.with(Prop::YPercent, v)
    }

    pub fn scale(self, v: f64) -> Self {
        self.with(Prop::Scale, v)
    }

    pub fn blur(self, v: f64) -> Self {
        self.with(Prop::Blur, v)
    }

    pub fn brightness(self, v: f64) -> Self {
        self.with(Prop::Brightness, v)
    }

    pub fn bg_opacity(self, v: f64) -> Self {
        self.with(Prop::BgOpacity, v)
    }

    pub fn get(&self, prop: Prop) -> Option<f64> {
        self.0.get(&prop).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Prop, f64)> + '_ {
        self.0.iter().map(|(p, v)| (*p, *v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Resolved style of one target at one instant. Unset properties read as [`Prop::initial`].
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct Style(BTreeMap<Prop, f64>);

impl Style {
    pub fn get(&self, prop: Prop) -> f64 {
        self.0.get(&prop).copied().unwrap_or_else(|| prop.initial())
    }

    pub fn set(&mut self, prop: Prop, value: f64) {
        self.0.insert(prop, value);
    }

    pub fn is_visible(&self) -> bool {
        self.get(Prop::Opacity) > 0.0
    }

    /// CSS `filter` rendition of the blur/brightness pair.
    pub fn css_filter(&self) -> String {
        format!(
            "blur({}px) brightness({})",
            self.get(Prop::Blur),
            self.get(Prop::Brightness)
        )
    }
}
