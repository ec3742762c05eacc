/// Snapshot of the default sink at one point in time. Two snapshots compare
/// equal when neither the flat volume nor the mute flag moved, which is what
/// the monitor uses to drop uninteresting change events.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SinkState {
    /// Flat volume where 1.0 is 100%. PulseAudio allows boosted levels above
    /// 1.0, and those are passed through untouched.
    pub volume: f32,
    pub mute: bool,
}

impl SinkState {
    /// Highest volume still rendered as a percentage. Anything louder shows
    /// the literal `MAX` instead of "100%" variants.
    const PERCENT_CEILING: f32 = 0.999;

    pub fn new(volume: f32, mute: bool) -> Self {
        Self { volume, mute }
    }

    /// Progress value for the level bar. Deliberately unclamped: a boosted
    /// sink yields an over-full bar rather than an error.
    pub fn fill_percent(&self) -> f32 {
        self.volume * 100.0
    }

    /// Numeric label under the bar, centered in a 3-character field.
    pub fn label(&self) -> String {
        if self.volume <= Self::PERCENT_CEILING {
            format!("{:^3}", format!("{:.0}%", self.volume * 100.0))
        } else {
            String::from("MAX")
        }
    }
}
