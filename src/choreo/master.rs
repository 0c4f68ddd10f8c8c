//! Master Timeline Composer.
//!
//! `compose` runs the three label stages back to back: estimate, attach, correct. Images are
//! attached last because they align against the corrected content timing.

use crate::{
    animation::{
        ease::Ease,
        plan::Plan,
        playhead::Playhead,
        props::Props,
        timeline::{Position, Timeline, Tween},
    },
    choreo::{
        component::{ComponentBuilder, ComponentRequest, ComponentTimeline},
        labels::{
            self, ContainerMarks, Correction, Estimate, MasterLabelSet, TimingDescriptor,
            WordCounts,
        },
        registry::AnimationRegistry,
    },
    config::{ContainerConfig, ReelConfig},
    content::ContentRecord,
    foundation::{
        core::{Role, Target},
        error::ReelResult,
    },
    scene::{CONTAINER_ID, Scene, text_element_id},
};

/// One fully composed display cycle.
#[derive(Clone, Debug)]
pub struct ComposedCycle {
    pub key: String,
    pub master: Timeline,
    pub plan: Plan,
    pub estimate: Estimate,
    pub correction: Correction,
    pub components: Vec<ComponentTimeline>,
    /// Ambient playback rate the cycle's playhead runs at.
    pub time_scale: f64,
}

impl ComposedCycle {
    pub fn timing(&self) -> &TimingDescriptor {
        &self.correction.timing
    }

    pub fn labels(&self) -> &MasterLabelSet {
        &self.correction.labels
    }

    /// Natural length of the master timeline in timeline seconds.
    pub fn duration(&self) -> f64 {
        self.plan.duration()
    }

    pub fn component(&self, role: Role) -> Option<&ComponentTimeline> {
        self.components.iter().find(|c| c.role == role)
    }

    pub fn playhead(&self) -> Playhead {
        Playhead::new(self.duration(), self.time_scale)
    }

    pub fn report(&self) -> CycleReport<'_> {
        CycleReport {
            key: &self.key,
            duration: self.duration(),
            time_scale: self.time_scale,
            estimate: &self.estimate,
            corrected: &self.correction,
            components: self
                .components
                .iter()
                .map(|c| ComponentSummary {
                    role: c.role,
                    element: c.element.to_string(),
                    source: &c.source,
                    natural_duration: c.natural_duration,
                    desired_duration: c.desired_duration,
                    applied_scale: c.applied_scale,
                })
                .collect(),
        }
    }
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSummary<'a> {
    pub role: Role,
    pub element: String,
    pub source: &'a str,
    pub natural_duration: f64,
    pub desired_duration: f64,
    pub applied_scale: Option<f64>,
}

/// Serializable view of a composed cycle.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport<'a> {
    pub key: &'a str,
    pub duration: f64,
    pub time_scale: f64,
    pub estimate: &'a Estimate,
    pub corrected: &'a Correction,
    pub components: Vec<ComponentSummary<'a>>,
}

pub struct Composer<'a> {
    config: &'a ReelConfig,
    registry: &'a AnimationRegistry,
}

impl<'a> Composer<'a> {
    pub fn new(config: &'a ReelConfig, registry: &'a AnimationRegistry) -> Self {
        Self { config, registry }
    }

    /// Build the master timeline for a record already rendered into `scene`.
    #[tracing::instrument(skip_all, fields(key = %record.key))]
    pub fn compose(&self, record: &ContentRecord, scene: &Scene) -> ReelResult<ComposedCycle> {
        let cfg = self.config;
        let builder = ComponentBuilder::new(self.registry, &cfg.profiles, &cfg.images);

        let mut words: Vec<(Role, &'static str, Vec<Target>)> = Vec::with_capacity(4);
        let mut counts = WordCounts::default();
        for role in Role::TEXT {
            let Some(id) = text_element_id(role) else {
                continue;
            };
            let targets = scene.word_targets(id);
            counts.set(role, targets.len());
            words.push((role, id, targets));
        }

        // Pass 1
        let hold = cfg.hold.hold_secs(&record.value.content);
        let estimate = labels::estimate(&counts, hold, &cfg.profiles);

        let mut master = Timeline::new(format!("master:{}", record.key));
        container_motion(&mut master, &estimate.labels.container, &cfg.container)?;
        estimate.labels.apply(&mut master);

        let all_words: Vec<Target> = words.iter().flat_map(|(_, _, w)| w.clone()).collect();
        if !all_words.is_empty() {
            master.set(
                all_words,
                Props::new()
                    .opacity(cfg.initial_state.opacity)
                    .y(cfg.initial_state.y),
                0.0,
            )?;
        }
        let images: Vec<Target> = scene.image_ids().into_iter().map(Target::element).collect();
        if !images.is_empty() {
            master.set(images.clone(), Props::new().opacity(0.0), 0.0)?;
        }

        // Attach
        let placeholder = TimingDescriptor::placeholder();
        let mut components = Vec::new();
        for (role, id, targets) in &words {
            let element = Target::element(*id);
            let classes = scene.classes(id);
            let built = builder.build(
                &ComponentRequest {
                    role: *role,
                    element: &element,
                    words: targets,
                    classes: &classes,
                },
                &estimate.labels,
                &placeholder,
            )?;
            if let Some(c) = built {
                master.add(
                    c.timeline.clone(),
                    MasterLabelSet::fade_in_start_label(*role),
                )?;
                components.push(c);
            }
        }

        // Pass 2
        let content = components.iter().find(|c| c.role == Role::Content);
        let correction = labels::correct(&estimate.labels, content);
        correction.labels.apply(&mut master);

        let image_start = correction.labels.image_window().fade_in_start;
        for image in &images {
            let classes = scene.classes(image.element_id());
            let c = builder.build_image(image, &classes, &correction.labels, &correction.timing)?;
            master.add(c.timeline.clone(), image_start)?;
            components.push(c);
        }

        let plan = Plan::compile(&master);
        let cycle = ComposedCycle {
            key: record.key.clone(),
            master,
            plan,
            estimate,
            correction,
            components,
            time_scale: cfg.global_time_scale,
        };
        log_timing(&cycle, counts.content);
        Ok(cycle)
    }
}

/// Smoke, drift, waver and the container fade-out, scheduled at fractions of the estimated
/// total.
fn container_motion(
    master: &mut Timeline,
    marks: &ContainerMarks,
    cfg: &ContainerConfig,
) -> ReelResult<()> {
    let container = vec![Target::element(CONTAINER_ID)];
    master.set(
        container.clone(),
        Props::new()
            .opacity(1.0)
            .blur(cfg.smoke_in.blur)
            .brightness(cfg.smoke_in.brightness)
            .scale(cfg.smoke_in.scale),
        0.0,
    )?;
    master.tween(
        Tween::to(
            container.clone(),
            Props::new().x(cfg.drift.x).y(cfg.drift.y),
            marks.total,
        ),
        0.0,
    )?;
    master.tween(
        Tween::from_to(
            container.clone(),
            Props::new().y_percent(-cfg.waver_percent),
            Props::new().y_percent(cfg.waver_percent),
            marks.waver_period,
        )
        .repeat(cfg.waver_repeat)
        .yoyo(true)
        .ease(Ease::SineInOut),
        0.0,
    )?;
    master.tween(
        Tween::to(
            container.clone(),
            Props::new().blur(0.0).brightness(1.0).scale(1.0),
            marks.smoke_clear,
        )
        .ease(Ease::Power2Out),
        0.0,
    )?;
    master.tween(
        Tween::to(
            container,
            Props::new()
                .opacity(0.0)
                .blur(cfg.smoke_out.blur)
                .brightness(cfg.smoke_out.brightness)
                .scale(cfg.smoke_out.scale),
            marks.fade_out_duration,
        )
        .ease(Ease::Power2In),
        Position::At(marks.fade_out_start),
    )?;
    Ok(())
}

fn log_timing(cycle: &ComposedCycle, content_words: usize) {
    let c = &cycle.correction;
    let content = c.labels.window(Role::Content).copied().unwrap_or_default();
    let natural = cycle
        .component(Role::Content)
        .map_or(0.0, |c| c.natural_duration);
    tracing::debug!(
        key = %cycle.key,
        fade_in_start = content.fade_in_start,
        fade_in_complete = content.fade_in_complete,
        fade_out_start = content.fade_out_start,
        fade_out_end = content.fade_out_end,
        fade_in = c.fade_in,
        hold = c.hold,
        fade_out = c.fade_out,
        total = c.total,
        content_words,
        natural,
        time_scale = c.content_time_scale,
        timing = ?c.timing,
        "content timing"
    );
}
