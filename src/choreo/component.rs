//! Component Timeline Builder.
//!
//! Each component gets its own sub-timeline (custom override or default profile), which is
//! then time-scaled so its natural length exactly fills the window the master assigned it.

use crate::{
    animation::{
        props::Props,
        timeline::{Timeline, Tween},
    },
    choreo::{
        labels::{MasterLabelSet, TimingDescriptor, Window},
        profile::{FadeProfile, ProfileTable},
        registry::{AnimationRegistry, AnimationSource, OverrideInput},
    },
    config::ImageDefaults,
    foundation::{
        core::{Role, Target, positive_ratio},
        error::{ReelError, ReelResult},
    },
};

/// A built sub-timeline plus the numbers the correction stage needs.
#[derive(Clone, Debug)]
pub struct ComponentTimeline {
    pub role: Role,
    pub element: Target,
    pub timeline: Timeline,
    pub natural_duration: f64,
    pub desired_duration: f64,
    /// `natural / desired`, or `None` when either was non-positive and rescaling was skipped.
    pub applied_scale: Option<f64>,
    /// Offset inside the natural timeline where the fade-in completes.
    pub natural_fade_in_span: f64,
    pub source: String,
}

/// Set the playback rate so `tl` fills `desired` seconds of its parent.
pub fn rescale(tl: &mut Timeline, desired: f64) -> ReelResult<Option<f64>> {
    match positive_ratio(tl.duration(), desired) {
        Some(scale) => {
            tl.set_time_scale(scale)?;
            Ok(Some(scale))
        }
        None => Ok(None),
    }
}

/// One text component to build.
#[derive(Clone, Copy, Debug)]
pub struct ComponentRequest<'a> {
    pub role: Role,
    pub element: &'a Target,
    pub words: &'a [Target],
    pub classes: &'a [String],
}

pub struct ComponentBuilder<'a> {
    registry: &'a AnimationRegistry,
    profiles: &'a ProfileTable,
    images: &'a ImageDefaults,
}

impl<'a> ComponentBuilder<'a> {
    pub fn new(
        registry: &'a AnimationRegistry,
        profiles: &'a ProfileTable,
        images: &'a ImageDefaults,
    ) -> Self {
        Self {
            registry,
            profiles,
            images,
        }
    }

    /// `None` when the component has no words: nothing is attached for it.
    pub fn build(
        &self,
        req: &ComponentRequest<'_>,
        labels: &MasterLabelSet,
        timing: &TimingDescriptor,
    ) -> ReelResult<Option<ComponentTimeline>> {
        if req.words.is_empty() {
            return Ok(None);
        }
        let window = labels.window(req.role).ok_or_else(|| {
            ReelError::composition(format!("no label window for {} component", req.role))
        })?;
        let profile = self.profiles.get(req.role).ok_or_else(|| {
            ReelError::composition(format!("{} has no default profile", req.role))
        })?;

        let source = self.registry.resolve(req.role, req.classes);
        let (timeline, fade_in_span) = match source {
            AnimationSource::Custom { build, .. } => {
                let out = build(&OverrideInput {
                    role: req.role,
                    targets: req.words,
                    element: req.element,
                    labels,
                    classes: req.classes,
                    timing,
                })?;
                let span = out
                    .fade_in_span
                    .unwrap_or_else(|| profile.fade_in_span(req.words.len()));
                (out.timeline, span)
            }
            AnimationSource::Default => (
                default_words(req.role, req.words, profile)?,
                profile.fade_in_span(req.words.len()),
            ),
        };

        finish(
            req.role,
            req.element.clone(),
            timeline,
            window.span(),
            fade_in_span,
            source.describe(),
        )
        .map(Some)
    }

    /// Image animation against the corrected content window. Custom image timelines are
    /// stretched over the whole window; the default fade keeps natural speed.
    pub fn build_image(
        &self,
        image: &Target,
        classes: &[String],
        labels: &MasterLabelSet,
        timing: &TimingDescriptor,
    ) -> ReelResult<ComponentTimeline> {
        let window = labels.image_window();
        let source = self.registry.resolve(Role::Image, classes);
        match source {
            AnimationSource::Custom { build, .. } => {
                let out = build(&OverrideInput {
                    role: Role::Image,
                    targets: std::slice::from_ref(image),
                    element: image,
                    labels,
                    classes,
                    timing,
                })?;
                let span = out.fade_in_span.unwrap_or(0.0);
                finish(
                    Role::Image,
                    image.clone(),
                    out.timeline,
                    window.span(),
                    span,
                    source.describe(),
                )
            }
            AnimationSource::Default => {
                let tl = self.default_image(image, labels, &window)?;
                let natural = tl.duration();
                Ok(ComponentTimeline {
                    role: Role::Image,
                    element: image.clone(),
                    timeline: tl,
                    natural_duration: natural,
                    desired_duration: natural,
                    applied_scale: None,
                    natural_fade_in_span: self.images.fade_in.duration,
                    source: source.describe(),
                })
            }
        }
    }

    /// Fade in with the content, fade out when the hold completes.
    fn default_image(
        &self,
        image: &Target,
        labels: &MasterLabelSet,
        window: &Window,
    ) -> ReelResult<Timeline> {
        let target = vec![image.clone()];
        let mut tl = Timeline::new(format!("image:{}", image.element_id()));
        tl.tween(
            Tween::to(
                target.clone(),
                Props::new().opacity(1.0),
                self.images.fade_in.duration,
            )
            .ease(self.images.fade_in.ease),
            0.0,
        )?;
        tl.tween(
            Tween::to(
                target,
                Props::new().opacity(0.0),
                self.images.fade_out.duration,
            )
            .ease(self.images.fade_out.ease),
            (labels.hold_complete - window.fade_in_start).max(0.0),
        )?;
        Ok(tl)
    }
}

fn finish(
    role: Role,
    element: Target,
    mut timeline: Timeline,
    desired: f64,
    fade_in_span: f64,
    source: String,
) -> ReelResult<ComponentTimeline> {
    let natural = timeline.duration();
    let applied_scale = rescale(&mut timeline, desired)?;
    if applied_scale.is_none() {
        tracing::debug!(%role, natural, desired, "skipped rescale of degenerate component");
    }
    Ok(ComponentTimeline {
        role,
        element,
        timeline,
        natural_duration: natural,
        desired_duration: desired,
        applied_scale,
        natural_fade_in_span: fade_in_span,
        source,
    })
}

/// Staggered rise into view, then a staggered drift out starting as the last word lands.
fn default_words(
    role: Role,
    words: &[Target],
    profile: &FadeProfile,
) -> ReelResult<Timeline> {
    let mut tl = Timeline::new(format!("{role}:default"));
    let fade_in = profile.fade_in;
    let fade_out = profile.fade_out;
    tl.tween(
        Tween::to(words.to_vec(), Props::new().opacity(1.0).y(0.0), fade_in.duration)
            .ease(fade_in.ease)
            .stagger(fade_in.stagger),
        fade_in.delay,
    )?;
    tl.tween(
        Tween::to(
            words.to_vec(),
            Props::new().opacity(0.0).y(fade_out.y),
            fade_out.duration,
        )
        .ease(fade_out.ease)
        .stagger(fade_out.stagger),
        profile.fade_in_span(words.len()),
    )?;
    Ok(tl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        choreo::labels::{WordCounts, estimate},
        scene::{CONTENT_ID, TITLE_ID},
    };

    fn words(id: &str, n: usize) -> Vec<Target> {
        (0..n).map(|i| Target::word(id, i)).collect()
    }

    fn labels(title: usize, content: usize) -> MasterLabelSet {
        let counts = WordCounts {
            title,
            content,
            ..WordCounts::default()
        };
        estimate(&counts, 8.0, &ProfileTable::default()).labels
    }

    #[test]
    fn default_component_fills_its_window() {
        let registry = AnimationRegistry::with_builtin();
        let profiles = ProfileTable::default();
        let images = ImageDefaults::default();
        let builder = ComponentBuilder::new(&registry, &profiles, &images);

        let labels = labels(3, 12);
        let element = Target::element(CONTENT_ID);
        let w = words(CONTENT_ID, 12);
        let c = builder
            .build(
                &ComponentRequest {
                    role: Role::Content,
                    element: &element,
                    words: &w,
                    classes: &[],
                },
                &labels,
                &TimingDescriptor::placeholder(),
            )
            .unwrap()
            .unwrap();

        let window = labels.window(Role::Content).unwrap();
        assert!((c.natural_duration - profiles.content.natural_duration(12)).abs() < 1e-12);
        assert!((c.timeline.effective_duration() - window.span()).abs() < 1e-9);
        assert_eq!(c.source, "default");
    }

    #[test]
    fn override_is_used_for_matching_class() {
        let registry = AnimationRegistry::with_builtin();
        let profiles = ProfileTable::default();
        let images = ImageDefaults::default();
        let builder = ComponentBuilder::new(&registry, &profiles, &images);

        let labels = labels(2, 4);
        let element = Target::element(TITLE_ID);
        let w = words(TITLE_ID, 2);
        let classes = vec!["rumor-title".to_string(), "blood-god".to_string()];
        let c = builder
            .build(
                &ComponentRequest {
                    role: Role::Title,
                    element: &element,
                    words: &w,
                    classes: &classes,
                },
                &labels,
                &TimingDescriptor::placeholder(),
            )
            .unwrap()
            .unwrap();
        assert_eq!(c.source, "custom:blood-god");
        assert!((c.natural_fade_in_span - 0.9).abs() < 1e-12);
    }

    #[test]
    fn empty_component_is_skipped() {
        let registry = AnimationRegistry::new();
        let profiles = ProfileTable::default();
        let images = ImageDefaults::default();
        let builder = ComponentBuilder::new(&registry, &profiles, &images);
        let element = Target::element(TITLE_ID);
        let built = builder
            .build(
                &ComponentRequest {
                    role: Role::Surtitle,
                    element: &element,
                    words: &[],
                    classes: &[],
                },
                &MasterLabelSet::default(),
                &TimingDescriptor::placeholder(),
            )
            .unwrap();
        assert!(built.is_none());
    }

    #[test]
    fn rescale_skips_degenerate_windows() {
        let mut tl = Timeline::new("t");
        assert_eq!(rescale(&mut tl, 5.0).unwrap(), None);
        tl.tween(
            Tween::to(words("w", 1), Props::new().opacity(1.0), 2.0),
            0.0,
        )
        .unwrap();
        assert_eq!(rescale(&mut tl, 0.0).unwrap(), None);
        assert_eq!(rescale(&mut tl, -1.0).unwrap(), None);
        assert_eq!(tl.time_scale(), 1.0);
        assert_eq!(rescale(&mut tl, 4.0).unwrap(), Some(0.5));
        assert!((tl.effective_duration() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn default_image_fades_out_at_hold_complete() {
        let registry = AnimationRegistry::new();
        let profiles = ProfileTable::default();
        let images = ImageDefaults::default();
        let builder = ComponentBuilder::new(&registry, &profiles, &images);
        let labels = labels(1, 4);
        let image = Target::element("rumor-image-0");
        let c = builder
            .build_image(&image, &[], &labels, &TimingDescriptor::placeholder())
            .unwrap();
        let start = labels.window(Role::Content).unwrap().fade_in_start;
        assert!((c.timeline.duration() - (labels.hold_complete - start + 0.4)).abs() < 1e-12);
        assert_eq!(c.applied_scale, None);
    }
}
