//! Per-tick input snapshot

use serde::{Deserialize, Serialize};

/// Buttons, axes and d-pad state of an input device at one instant
///
/// Devices differ in how many controls they report. Reading past the end
/// of any list is not an error: a missing button is released and a missing
/// axis is centered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    /// Button states, by device index
    #[serde(default)]
    pub buttons: Vec<bool>,
    /// Axis values in [-1.0, 1.0], by device index
    #[serde(default)]
    pub axes: Vec<f64>,
    /// Directional pad states as (x, y) in {-1, 0, 1}
    #[serde(default)]
    pub hats: Vec<(i8, i8)>,
}

impl InputSnapshot {
    /// A snapshot with nothing pressed and every axis centered
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Whether the button at `index` is held
    #[must_use]
    pub fn button(&self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(false)
    }

    /// Value of the axis at `index`
    ///
    /// Missing and non-finite axes read as 0.0; finite values are saturated
    /// into [-1.0, 1.0].
    #[must_use]
    pub fn axis(&self, index: usize) -> f64 {
        match self.axes.get(index) {
            Some(v) if v.is_finite() => v.clamp(-1.0, 1.0),
            _ => 0.0,
        }
    }

    /// State of the d-pad at `index`
    #[must_use]
    pub fn hat(&self, index: usize) -> (i8, i8) {
        self.hats.get(index).copied().unwrap_or((0, 0))
    }

    /// Builder: press the button at `index`, growing the list if needed
    pub fn with_button(mut self, index: usize) -> Self {
        if self.buttons.len() <= index {
            self.buttons.resize(index + 1, false);
        }
        self.buttons[index] = true;
        self
    }

    /// Builder: set the axis at `index`, growing the list if needed
    pub fn with_axis(mut self, index: usize, value: f64) -> Self {
        if self.axes.len() <= index {
            self.axes.resize(index + 1, 0.0);
        }
        self.axes[index] = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_controls_read_neutral() {
        let snapshot = InputSnapshot {
            buttons: vec![true],
            axes: vec![0.5],
            hats: vec![],
        };
        assert!(snapshot.button(0));
        assert!(!snapshot.button(7));
        assert_eq!(snapshot.axis(0), 0.5);
        assert_eq!(snapshot.axis(4), 0.0);
        assert_eq!(snapshot.hat(0), (0, 0));
    }

    #[test]
    fn test_axis_sanitized() {
        let snapshot = InputSnapshot::neutral()
            .with_axis(0, 1.7)
            .with_axis(1, -3.0)
            .with_axis(2, f64::NAN);
        assert_eq!(snapshot.axis(0), 1.0);
        assert_eq!(snapshot.axis(1), -1.0);
        assert_eq!(snapshot.axis(2), 0.0);
    }

    #[test]
    fn test_builders_grow_lists() {
        let snapshot = InputSnapshot::neutral().with_button(7).with_axis(4, -0.3);
        assert_eq!(snapshot.buttons.len(), 8);
        assert!(snapshot.button(7));
        assert!(!snapshot.button(6));
        assert_eq!(snapshot.axes, vec![0.0, 0.0, 0.0, 0.0, -0.3]);
    }

    #[test]
    fn test_deserialize_partial_json() {
        let snapshot: InputSnapshot =
            serde_json::from_str(r#"{"buttons": [false, true], "axes": [0.25]}"#).unwrap();
        assert!(snapshot.button(1));
        assert_eq!(snapshot.axis(0), 0.25);
        assert!(snapshot.hats.is_empty());
    }
}
