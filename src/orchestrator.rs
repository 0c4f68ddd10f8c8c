//! Display Orchestrator: renders a record into the scene, composes its master timeline and
//! plays it on a virtual clock, one cycle at a time.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    animation::playhead::{Playhead, Step},
    choreo::{
        master::{ComposedCycle, Composer},
        registry::AnimationRegistry,
    },
    config::ReelConfig,
    content::{ContentRecord, Dataset},
    eval::{Evaluator, FrameState},
    foundation::error::ReelResult,
    rotation::RotationController,
    scene::{
        CONTAINER_ID, CONTENT_ID, SUBTITLE_ID, SURTITLE_ID, Scene, TITLE_ID, image_id,
    },
    segment::{segment, segment_content},
};

/// Per-cycle state. `Composing` only exists inside a tick.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum PlayerState {
    Idle,
    Composing,
    Playing,
    Paused,
    /// Master finished; counting down the inter-cycle delay.
    Completing { remaining: f64 },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum PlayerEvent {
    CycleStarted { cycle: u64, key: String, duration: f64 },
    CycleCompleted { cycle: u64, key: String },
    /// Composition failed; the record was already popped and is not requeued.
    CycleLost { cycle: u64, key: String, error: String },
    Paused,
    Resumed,
}

struct Active {
    cycle: ComposedCycle,
    playhead: Playhead,
}

pub struct Player {
    config: ReelConfig,
    registry: AnimationRegistry,
    dataset: Dataset,
    rotation: RotationController,
    scene: Scene,
    rng: StdRng,
    debug: bool,
    state: PlayerState,
    active: Option<Active>,
    cycles: u64,
}

impl Player {
    pub fn new(
        dataset: Dataset,
        config: ReelConfig,
        registry: AnimationRegistry,
        mut rng: StdRng,
    ) -> Self {
        let rotation = RotationController::new(&dataset, StdRng::seed_from_u64(rng.r#gen()));
        Self {
            config,
            registry,
            dataset,
            rotation,
            scene: Scene::with_container(),
            rng,
            debug: false,
            state: PlayerState::Idle,
            active: None,
            cycles: 0,
        }
    }

    pub fn seeded(dataset: Dataset, config: ReelConfig, seed: u64) -> Self {
        Self::new(
            dataset,
            config,
            AnimationRegistry::with_builtin(),
            StdRng::seed_from_u64(seed),
        )
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &ReelConfig {
        &self.config
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn current_cycle(&self) -> Option<&ComposedCycle> {
        self.active.as_ref().map(|a| &a.cycle)
    }

    /// Master time of the current cycle.
    pub fn time(&self) -> Option<f64> {
        self.active.as_ref().map(|a| a.playhead.time())
    }

    pub fn debug_mode(&self) -> bool {
        self.debug
    }

    /// Read by the rotation on the next pop.
    pub fn set_debug_mode(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Compose and start the first cycle. No-op unless idle.
    pub fn start(&mut self) -> Vec<PlayerEvent> {
        let mut events = Vec::new();
        if self.state == PlayerState::Idle {
            self.begin_cycle(&mut events);
        }
        events
    }

    pub fn pause(&mut self) -> Option<PlayerEvent> {
        if self.state != PlayerState::Playing {
            return None;
        }
        let active = self.active.as_mut()?;
        active.playhead.pause();
        self.state = PlayerState::Paused;
        Some(PlayerEvent::Paused)
    }

    pub fn resume(&mut self) -> Option<PlayerEvent> {
        if self.state != PlayerState::Paused {
            return None;
        }
        let active = self.active.as_mut()?;
        active.playhead.resume();
        self.state = PlayerState::Playing;
        Some(PlayerEvent::Resumed)
    }

    /// Advance by `dt` wall-clock seconds.
    pub fn tick(&mut self, dt: f64) -> Vec<PlayerEvent> {
        let mut events = Vec::new();
        match self.state {
            PlayerState::Idle | PlayerState::Composing | PlayerState::Paused => {}
            PlayerState::Playing => {
                let Some(active) = self.active.as_mut() else {
                    self.state = PlayerState::Idle;
                    return events;
                };
                if active.playhead.advance(dt) == Step::Completed {
                    let key = active.cycle.key.clone();
                    tracing::info!(cycle = self.cycles, %key, "cycle completed");
                    events.push(PlayerEvent::CycleCompleted {
                        cycle: self.cycles,
                        key,
                    });
                    self.state = PlayerState::Completing {
                        remaining: self.config.next_cycle_delay_secs(),
                    };
                }
            }
            PlayerState::Completing { remaining } => {
                let remaining = remaining - dt.max(0.0);
                if remaining > 0.0 {
                    self.state = PlayerState::Completing { remaining };
                } else {
                    self.state = PlayerState::Idle;
                    self.begin_cycle(&mut events);
                }
            }
        }
        events
    }

    /// Evaluated styles of the current cycle at its playhead.
    pub fn current_frame(&self) -> ReelResult<Option<FrameState>> {
        self.active
            .as_ref()
            .map(|a| Evaluator::sample(&a.cycle.plan, a.playhead.time()))
            .transpose()
    }

    fn begin_cycle(&mut self, events: &mut Vec<PlayerEvent>) {
        self.state = PlayerState::Composing;
        self.cycles += 1;
        let cycle = self.cycles;

        let record = match self.rotation.next(&self.dataset, self.debug).cloned() {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(cycle, error = %e, "no record to show");
                self.lose_cycle(events, cycle, String::new(), e.to_string());
                return;
            }
        };

        let composed = render(&mut self.scene, &record, &self.config, &mut self.rng).and_then(
            |()| Composer::new(&self.config, &self.registry).compose(&record, &self.scene),
        );
        match composed {
            Ok(composed) => {
                let duration = composed.duration();
                tracing::info!(cycle, key = %record.key, duration, "cycle started");
                events.push(PlayerEvent::CycleStarted {
                    cycle,
                    key: record.key.clone(),
                    duration,
                });
                let playhead = composed.playhead();
                self.active = Some(Active {
                    cycle: composed,
                    playhead,
                });
                self.state = PlayerState::Playing;
            }
            Err(e) => {
                tracing::warn!(cycle, key = %record.key, error = %e, "cycle lost");
                self.lose_cycle(events, cycle, record.key, e.to_string());
            }
        }
    }

    fn lose_cycle(&mut self, events: &mut Vec<PlayerEvent>, cycle: u64, key: String, error: String) {
        self.active = None;
        events.push(PlayerEvent::CycleLost { cycle, key, error });
        self.state = PlayerState::Completing {
            remaining: self.config.next_cycle_delay_secs(),
        };
    }
}

/// Write a record into the scene: position class, per-cycle surtitle/subtitle, reused
/// title/content, and freshly created images.
pub fn render(
    scene: &mut Scene,
    record: &ContentRecord,
    cfg: &ReelConfig,
    rng: &mut impl Rng,
) -> ReelResult<()> {
    let value = &record.value;
    let positions: Vec<String> = (1..=cfg.container_positions)
        .map(|i| format!("position-{i}"))
        .collect();
    scene.remove_classes(CONTAINER_ID, &positions)?;
    let position = rng.gen_range(1..=cfg.container_positions.max(1));
    scene.add_class(CONTAINER_ID, &format!("position-{position}"))?;

    scene.remove(SURTITLE_ID);
    scene.remove(SUBTITLE_ID);

    scene.get_or_create("h1", TITLE_ID, TITLE_ID, value.title_class.as_deref().unwrap_or(""));
    scene.get_or_create(
        "div",
        CONTENT_ID,
        CONTENT_ID,
        value.content_class.as_deref().unwrap_or(""),
    );
    for id in [TITLE_ID, CONTENT_ID] {
        if !scene.contains(CONTAINER_ID, id) {
            scene.append_child(CONTAINER_ID, id)?;
        }
    }

    if let Some(text) = value.surtitle.as_deref().filter(|s| !s.is_empty()) {
        scene.get_or_create(
            "span",
            SURTITLE_ID,
            SURTITLE_ID,
            value.surtitle_class.as_deref().unwrap_or(""),
        );
        scene.set_fragment(SURTITLE_ID, segment(text, cfg.markup))?;
        scene.insert_before(CONTAINER_ID, SURTITLE_ID, TITLE_ID)?;
    }

    scene.set_fragment(TITLE_ID, segment(record.title(), cfg.markup))?;

    if let Some(text) = value.subtitle.as_deref().filter(|s| !s.is_empty()) {
        scene.get_or_create(
            "span",
            SUBTITLE_ID,
            SUBTITLE_ID,
            value.subtitle_class.as_deref().unwrap_or(""),
        );
        scene.set_fragment(SUBTITLE_ID, segment(text, cfg.markup))?;
        scene.insert_after(CONTAINER_ID, SUBTITLE_ID, TITLE_ID)?;
    }

    scene.clear_children(CONTENT_ID)?;
    scene.set_fragment(CONTENT_ID, segment_content(&value.content, cfg.markup))?;

    for (i, img) in value.images.iter().enumerate() {
        let id = image_id(i);
        scene.get_or_create("img", &id, "content-image", img.class.as_deref().unwrap_or(""));
        scene.set_src(&id, cfg.assets.resolve_image(&img.src))?;
        scene.append_child(CONTENT_ID, &id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Content, ImageSpec, RumorValue};

    fn record() -> ContentRecord {
        let mut value = RumorValue::new(Content::Lines(vec![
            "first **bold** line".into(),
            "second line".into(),
        ]));
        value.surtitle = Some("Heard at Elysium".into());
        value.subtitle = Some("March 3rd".into());
        value.title_class = Some("blood-god".into());
        value.images = vec![ImageSpec {
            src: "crow.png".into(),
            class: Some("animate-slide-down".into()),
        }];
        ContentRecord {
            key: "The Crow".into(),
            value,
        }
    }

    #[test]
    fn render_builds_the_expected_scene() {
        let mut scene = Scene::with_container();
        let cfg = ReelConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        render(&mut scene, &record(), &cfg, &mut rng).unwrap();

        let container = scene.element(CONTAINER_ID).unwrap();
        assert_eq!(
            container.children,
            vec![SURTITLE_ID, TITLE_ID, SUBTITLE_ID, CONTENT_ID]
        );
        assert_eq!(
            container
                .classes
                .iter()
                .filter(|c| c.starts_with("position-"))
                .count(),
            1
        );
        assert_eq!(scene.classes(TITLE_ID), vec!["rumor-title", "blood-god"]);
        assert_eq!(scene.word_targets(CONTENT_ID).len(), 5);
        let img = scene.element(&image_id(0)).unwrap();
        assert_eq!(
            img.src.as_deref(),
            Some("/toronto-rising/assets/images/rumor/crow.png")
        );
        assert!(scene.to_html(CONTENT_ID).contains("body-emphasis"));
    }

    #[test]
    fn rerender_drops_stale_surtitle_and_images() {
        let mut scene = Scene::with_container();
        let cfg = ReelConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        render(&mut scene, &record(), &cfg, &mut rng).unwrap();

        let plain = ContentRecord {
            key: "Plain".into(),
            value: RumorValue::new(Content::Text("nothing to see".into())),
        };
        render(&mut scene, &plain, &cfg, &mut rng).unwrap();
        assert!(scene.element(SURTITLE_ID).is_none());
        assert!(scene.element(&image_id(0)).is_none());
        assert_eq!(scene.classes(TITLE_ID), vec!["rumor-title"]);
        assert_eq!(
            scene.element(CONTAINER_ID).unwrap().children,
            vec![TITLE_ID, CONTENT_ID]
        );
    }

    #[test]
    fn pause_only_from_playing() {
        let ds = Dataset::from_json_str(r#"{ "A": { "content": "one two three" } }"#).unwrap();
        let mut p = Player::seeded(ds, ReelConfig::default(), 9);
        assert!(p.pause().is_none());
        let events = p.start();
        assert!(matches!(events[0], PlayerEvent::CycleStarted { cycle: 1, .. }));
        assert_eq!(p.pause(), Some(PlayerEvent::Paused));
        let t = p.time().unwrap();
        p.tick(5.0);
        assert_eq!(p.time(), Some(t));
        assert_eq!(p.resume(), Some(PlayerEvent::Resumed));
        p.tick(1.0);
        assert!(p.time().unwrap() > t);
    }
}
