use crate::constants::{
    ADAPT_DELTA, ADAPT_HIGH_SCORE, ADAPT_LOW_SCORE, SARCASM_FLOOR, TEMPERATURE_BASE,
    TEMPERATURE_SPREAD,
};

// The two scalars biasing prompt construction and sampling. Owned by the
// pipeline and passed explicitly, not a process-wide global; persisted by the
// store because each CLI invocation is a fresh process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorState {
    sarcasm_level: f32,
    empathy_level: f32,
}

impl Default for BehaviorState {
    fn default() -> Self {
        BehaviorState {
            sarcasm_level: 0.5,
            empathy_level: 0.5,
        }
    }
}

impl BehaviorState {
    pub fn new(sarcasm_level: f32, empathy_level: f32) -> Self {
        BehaviorState {
            sarcasm_level: sarcasm_level.clamp(0.0, 1.0),
            empathy_level: empathy_level.clamp(0.0, 1.0),
        }
    }

    pub fn sarcasm_level(&self) -> f32 {
        self.sarcasm_level
    }

    pub fn empathy_level(&self) -> f32 {
        self.empathy_level
    }

    // Slider inputs from the UI boundary set the scalars directly.
    pub fn set_sarcasm(&mut self, value: f32) {
        self.sarcasm_level = value.clamp(0.0, 1.0);
    }

    pub fn set_empathy(&mut self, value: f32) {
        self.empathy_level = value.clamp(0.0, 1.0);
    }

    // Bang-bang controller: a poor score tones the sarcasm down, a strong
    // score raises empathy, the band in between changes nothing.
    pub fn adapt(&mut self, score: f32) {
        if score < ADAPT_LOW_SCORE {
            self.sarcasm_level = (self.sarcasm_level - ADAPT_DELTA).max(SARCASM_FLOOR);
        } else if score > ADAPT_HIGH_SCORE {
            self.empathy_level = (self.empathy_level + ADAPT_DELTA).min(1.0);
        }
    }

    // Sarcasm feeds the generator's sampling temperature.
    pub fn temperature(&self) -> f64 {
        TEMPERATURE_BASE + f64::from(self.sarcasm_level) * TEMPERATURE_SPREAD
    }
}
