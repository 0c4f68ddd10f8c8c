/// Result of advancing a [`Playhead`] by one frame tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Running,
    Paused,
    /// Reached the end on this tick. Reported once.
    Completed,
    /// Already finished on an earlier tick.
    Finished,
}

/// Playback clock for one root timeline.
///
/// Wall-clock deltas are multiplied by `time_scale` before advancing; pausing freezes the
/// whole tree since children are sampled from this single clock.
#[derive(Clone, Debug)]
pub struct Playhead {
    time: f64,
    duration: f64,
    time_scale: f64,
    paused: bool,
    done: bool,
}

impl Playhead {
    pub fn new(duration: f64, time_scale: f64) -> Self {
        Self {
            time: 0.0,
            duration: duration.max(0.0),
            time_scale,
            paused: false,
            done: false,
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn advance(&mut self, wall_dt: f64) -> Step {
        if self.done {
            return Step::Finished;
        }
        if self.paused {
            return Step::Paused;
        }
        self.time = (self.time + wall_dt.max(0.0) * self.time_scale).min(self.duration);
        if self.time >= self.duration {
            self.done = true;
            return Step::Completed;
        }
        Step::Running
    }

    /// Wall-clock seconds left until completion at the current scale.
    pub fn remaining_wall(&self) -> f64 {
        if self.time_scale <= 0.0 {
            return f64::INFINITY;
        }
        (self.duration - self.time).max(0.0) / self.time_scale
    }
}
