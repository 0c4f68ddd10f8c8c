//! Animation Registry: (CSS class, role) pairs mapped to custom timeline builders.
//!
//! Default profiles are not stored here; a component falls back to them only when
//! [`AnimationRegistry::lookup`] finds nothing.

use std::collections::HashMap;

use crate::{
    animation::{
        ease::Ease,
        props::Props,
        timeline::{Position, Timeline, Tween},
    },
    choreo::labels::{MasterLabelSet, TimingDescriptor},
    foundation::{core::Role, core::Target, error::ReelResult},
};

/// Everything an override gets to look at while building its timeline.
#[derive(Clone, Copy, Debug)]
pub struct OverrideInput<'a> {
    pub role: Role,
    /// Word units for text roles, the image itself for images.
    pub targets: &'a [Target],
    pub element: &'a Target,
    pub labels: &'a MasterLabelSet,
    pub classes: &'a [String],
    pub timing: &'a TimingDescriptor,
}

#[derive(Clone, Debug)]
pub struct OverrideOutput {
    pub timeline: Timeline,
    /// Natural (unscaled) offset where the fade-in ends, if the override knows it.
    pub fade_in_span: Option<f64>,
}

pub type OverrideFn = fn(&OverrideInput<'_>) -> ReelResult<OverrideOutput>;

/// How a component's sub-timeline gets built.
#[derive(Clone, Copy, Debug)]
pub enum AnimationSource<'a> {
    Default,
    Custom { class: &'a str, build: OverrideFn },
}

impl AnimationSource<'_> {
    pub fn describe(&self) -> String {
        match self {
            Self::Default => "default".to_string(),
            Self::Custom { class, .. } => format!("custom:{class}"),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AnimationRegistry {
    overrides: HashMap<(String, Role), OverrideFn>,
}

impl AnimationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the stock overrides (`blood-god` titles, `animate-slide-down`
    /// images).
    pub fn with_builtin() -> Self {
        let mut r = Self::new();
        r.register("blood-god", Role::Title, blood_god_title);
        r.register("animate-slide-down", Role::Image, slide_down_image);
        r
    }

    /// Replaces any override already registered for the same pair.
    pub fn register(&mut self, class: impl Into<String>, role: Role, build: OverrideFn) {
        self.overrides.insert((class.into(), role), build);
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// First class in list order with an override for `role` wins.
    pub fn lookup<'c>(&self, role: Role, classes: &'c [String]) -> Option<(&'c str, OverrideFn)> {
        classes.iter().find_map(|class| {
            self.overrides
                .get(&(class.clone(), role))
                .map(|f| (class.as_str(), *f))
        })
    }

    pub fn resolve<'c>(&self, role: Role, classes: &'c [String]) -> AnimationSource<'c> {
        match self.lookup(role, classes) {
            Some((class, build)) => AnimationSource::Custom { class, build },
            None => AnimationSource::Default,
        }
    }
}

/// Words drop in from double size while the title's background glows up behind them.
fn blood_god_title(input: &OverrideInput<'_>) -> ReelResult<OverrideOutput> {
    const START: f64 = 0.2;
    const FADE_IN: f64 = 0.6;
    const FADE_OUT: f64 = 0.5;
    const STAGGER_IN: f64 = 0.05;

    let words = input.targets.to_vec();
    let element = vec![input.element.clone()];
    let mut tl = Timeline::new("blood-god:title");

    tl.set(
        words.clone(),
        Props::new().opacity(0.0).scale(2.0).y(0.0),
        0.0,
    )?;
    tl.set(element.clone(), Props::new().bg_opacity(0.0), 0.0)?;

    tl.tween(
        Tween::to(words.clone(), Props::new().opacity(1.0).scale(1.0), FADE_IN)
            .ease(Ease::Power2Out)
            .stagger(STAGGER_IN),
        START,
    )?;

    let total_in = FADE_IN + words.len() as f64 * STAGGER_IN;
    let fade_in_end = START + total_in;
    let bg_start = START + total_in * 0.75;

    tl.tween(
        Tween::to(element.clone(), Props::new().bg_opacity(1.0), fade_in_end - bg_start)
            .ease(Ease::Power2Out),
        Position::PrevStartPercent(25.0),
    )?;
    tl.tween(
        Tween::to(words, Props::new().opacity(0.0).scale(0.8), FADE_OUT)
            .ease(Ease::Power2In)
            .stagger(0.04),
        fade_in_end,
    )?;
    tl.tween(
        Tween::to(element, Props::new().bg_opacity(0.0), FADE_OUT / 2.0).ease(Ease::Power2In),
        fade_in_end,
    )?;

    Ok(OverrideOutput {
        timeline: tl,
        fade_in_span: Some(fade_in_end),
    })
}

/// Image slides diagonally across the content block on a 100-unit timeline, fading out
/// shortly after the content's own fade-out begins.
fn slide_down_image(input: &OverrideInput<'_>) -> ReelResult<OverrideOutput> {
    const FADE: f64 = 35.0;

    let image = vec![input.element.clone()];
    let hidden = Props::new().opacity(0.0).scale(0.5).brightness(0.25);
    let mut tl = Timeline::fixed("animate-slide-down:image", 100.0);

    tl.set(image.clone(), hidden.clone(), 0.0)?;
    tl.tween(
        Tween::to(
            image.clone(),
            Props::new().opacity(1.0).scale(1.0).brightness(1.0),
            FADE,
        ),
        5.0,
    )?;
    tl.tween(
        Tween::from_to(
            image.clone(),
            Props::new().x_percent(-180.0).y_percent(-175.0),
            Props::new().x_percent(130.0).y_percent(-25.0),
            100.0,
        ),
        0.0,
    )?;
    tl.tween(Tween::to(image, hidden, FADE), input.timing.fade_out_start + 10.0)?;

    Ok(OverrideOutput {
        timeline: tl,
        fade_in_span: Some(5.0 + FADE),
    })
}
