//! Input sources

use std::collections::VecDeque;

use crate::Result;

use super::InputSnapshot;

/// Something that yields one input snapshot per control tick
pub trait InputSource {
    /// Get the device name
    fn name(&self) -> &str;

    /// Read the current state of the device
    ///
    /// Must not block longer than a poll interval.
    fn poll(&mut self) -> Result<InputSnapshot>;
}

/// Replays a fixed sequence of snapshots, then holds the neutral state
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    queue: VecDeque<InputSnapshot>,
}

impl ScriptedInput {
    /// Create a source that replays `snapshots` in order
    pub fn new(snapshots: impl IntoIterator<Item = InputSnapshot>) -> Self {
        Self {
            queue: snapshots.into_iter().collect(),
        }
    }

    /// Queue another snapshot
    pub fn push(&mut self, snapshot: InputSnapshot) {
        self.queue.push_back(snapshot);
    }

    /// Snapshots not yet replayed
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl InputSource for ScriptedInput {
    fn name(&self) -> &str {
        "scripted"
    }

    fn poll(&mut self) -> Result<InputSnapshot> {
        Ok(self.queue.pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_replays_then_holds_neutral() {
        let mut source = ScriptedInput::new([
            InputSnapshot::neutral().with_button(0),
            InputSnapshot::neutral().with_axis(1, 0.5),
        ]);
        assert_eq!(source.remaining(), 2);

        assert!(source.poll().unwrap().button(0));
        assert_eq!(source.poll().unwrap().axis(1), 0.5);
        assert_eq!(source.poll().unwrap(), InputSnapshot::neutral());
        assert_eq!(source.remaining(), 0);
    }
}
