use std::{fs::File, io::BufReader, path::Path};

use crate::{
    animation::ease::Ease,
    choreo::profile::ProfileTable,
    content::Content,
    foundation::{
        core::{Vec2, ms_to_secs},
        error::{ReelError, ReelResult},
    },
    segment::MarkupMode,
};

/// How long a rumor stays fully visible between fade-in and fade-out.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HoldConfig {
    pub hold_duration_ms: f64, // fixed hold when `use_dynamic` is off
    pub base_time_ms: f64,
    pub multiplier_ms: f64, // per content unit (line or word)
    pub use_dynamic: bool,
}

impl Default for HoldConfig {
    fn default() -> Self {
        Self {
            hold_duration_ms: 12000.0,
            base_time_ms: 8000.0,
            multiplier_ms: 400.0,
            use_dynamic: true,
        }
    }
}

impl HoldConfig {
    pub fn hold_ms(&self, content: &Content) -> f64 {
        if self.use_dynamic {
            self.base_time_ms
                .max(content.unit_count() as f64 * self.multiplier_ms)
        } else {
            self.hold_duration_ms
        }
    }

    pub fn hold_secs(&self, content: &Content) -> f64 {
        ms_to_secs(self.hold_ms(content))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InitialState {
    pub opacity: f64,
    pub y: f64,
}

impl Default for InitialState {
    fn default() -> Self {
        Self {
            opacity: 0.0,
            y: 20.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageFade {
    pub duration: f64,
    pub ease: Ease,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageDefaults {
    pub fade_in: ImageFade,
    pub fade_out: ImageFade,
}

impl Default for ImageDefaults {
    fn default() -> Self {
        Self {
            fade_in: ImageFade {
                duration: 0.6,
                ease: Ease::Power2Out,
            },
            fade_out: ImageFade {
                duration: 0.4,
                ease: Ease::Power2In,
            },
        }
    }
}

/// Blur/brightness/scale of the container's "smoke" state.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Smoke {
    pub blur: f64,
    pub brightness: f64,
    pub scale: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerConfig {
    pub smoke_in: Smoke,
    pub smoke_out: Smoke,
    pub drift: Vec2, // total container travel over the cycle, px
    pub waver_percent: f64,
    pub waver_repeat: u32,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            smoke_in: Smoke {
                blur: 15.0,
                brightness: 0.3,
                scale: 0.35,
            },
            smoke_out: Smoke {
                blur: 20.0,
                brightness: 0.2,
                scale: 0.25,
            },
            drift: Vec2::new(500.0, -300.0),
            waver_percent: 10.0,
            waver_repeat: 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssetPaths {
    pub site_prefix: String,
    pub image_base: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            site_prefix: "/toronto-rising/".to_string(),
            image_base: "/toronto-rising/assets/images/rumor/".to_string(),
        }
    }
}

impl AssetPaths {
    /// Prefixed paths are kept, other absolute paths get the site prefix, bare filenames
    /// get the image base.
    pub fn resolve_image(&self, src: &str) -> String {
        if src.starts_with(&self.site_prefix) {
            src.to_string()
        } else if let Some(rest) = src.strip_prefix('/') {
            format!("{}{rest}", self.site_prefix)
        } else {
            format!("{}{src}", self.image_base)
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReelConfig {
    /// Playback-rate multiplier applied to every master timeline.
    pub global_time_scale: f64,
    pub hold: HoldConfig,
    pub initial_state: InitialState,
    pub profiles: ProfileTable,
    pub images: ImageDefaults,
    pub container: ContainerConfig,
    pub next_cycle_delay_ms: f64,
    pub markup: MarkupMode,
    pub assets: AssetPaths,
    /// Number of `position-N` classes the container rotates through.
    pub container_positions: u32,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            global_time_scale: 0.75,
            hold: HoldConfig::default(),
            initial_state: InitialState::default(),
            profiles: ProfileTable::default(),
            images: ImageDefaults::default(),
            container: ContainerConfig::default(),
            next_cycle_delay_ms: 500.0,
            markup: MarkupMode::Parse,
            assets: AssetPaths::default(),
            container_positions: 3,
        }
    }
}

impl ReelConfig {
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ReelError::config(format!("open config JSON '{}': {e}", path.display()))
        })?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> ReelResult<()> {
        if !(self.global_time_scale > 0.0 && self.global_time_scale.is_finite()) {
            return Err(ReelError::config(format!(
                "globalTimeScale must be finite and > 0 (got {})",
                self.global_time_scale
            )));
        }
        let non_negative = [
            ("hold.holdDurationMs", self.hold.hold_duration_ms),
            ("hold.baseTimeMs", self.hold.base_time_ms),
            ("hold.multiplierMs", self.hold.multiplier_ms),
            ("nextCycleDelayMs", self.next_cycle_delay_ms),
            ("images.fadeIn.duration", self.images.fade_in.duration),
            ("images.fadeOut.duration", self.images.fade_out.duration),
        ];
        for (name, v) in non_negative {
            if !(v >= 0.0 && v.is_finite()) {
                return Err(ReelError::config(format!(
                    "{name} must be finite and >= 0 (got {v})"
                )));
            }
        }
        if self.container_positions == 0 {
            return Err(ReelError::config("containerPositions must be >= 1"));
        }
        self.profiles.validate()
    }

    pub fn next_cycle_delay_secs(&self) -> f64 {
        ms_to_secs(self.next_cycle_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_hold_uses_line_count_for_multiline_content() {
        let hold = HoldConfig::default();
        let lines = Content::Lines(vec![
            "one two three four".into(),
            "five six seven eight".into(),
        ]);
        // max(8000, 2 * 400)
        assert_eq!(hold.hold_ms(&lines), 8000.0);
        let long = Content::Text(vec!["w"; 30].join(" "));
        assert_eq!(hold.hold_ms(&long), 12000.0);
    }

    #[test]
    fn fixed_hold_ignores_content() {
        let hold = HoldConfig {
            use_dynamic: false,
            ..HoldConfig::default()
        };
        assert_eq!(hold.hold_secs(&Content::Text("a".into())), 12.0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: ReelConfig =
            serde_json::from_str(r#"{ "globalTimeScale": 1.0, "markup": "escape" }"#).unwrap();
        assert_eq!(cfg.global_time_scale, 1.0);
        assert_eq!(cfg.markup, MarkupMode::Escape);
        assert_eq!(cfg.next_cycle_delay_ms, 500.0);
        cfg.validate().unwrap();
    }

    #[test]
    fn rejects_non_positive_time_scale() {
        let cfg = ReelConfig {
            global_time_scale: 0.0,
            ..ReelConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn image_paths_resolve_like_the_site() {
        let a = AssetPaths::default();
        assert_eq!(a.resolve_image("/toronto-rising/x.png"), "/toronto-rising/x.png");
        assert_eq!(a.resolve_image("/img/x.png"), "/toronto-rising/img/x.png");
        assert_eq!(
            a.resolve_image("x.png"),
            "/toronto-rising/assets/images/rumor/x.png"
        );
    }
}
