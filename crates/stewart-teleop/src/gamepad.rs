//! Physical gamepad input through gilrs
//!
//! Reports the first connected gamepad in the Xbox layout the default
//! mapping expects:
//!
//! | index | button | axis                 |
//! |-------|--------|----------------------|
//! | 0     | A      | left stick X         |
//! | 1     | B      | left stick Y (down)  |
//! | 2     | X      | left trigger         |
//! | 3     | Y      | right stick X        |
//! | 4     | LB     | right stick Y (down) |
//! | 5     | RB     | right trigger        |
//! | 6     | Back   |                      |
//! | 7     | Start  |                      |

use gilrs::{Axis, Button, Gamepad, Gilrs};
use stewart_core::{Error, InputSnapshot, InputSource, Result};

const BUTTONS: [Button; 8] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::Select,
    Button::Start,
];

/// First connected gamepad, in Xbox layout
pub struct GamepadInput {
    gilrs: Gilrs,
}

impl GamepadInput {
    /// Initialize gilrs and report the gamepad in use
    pub fn open() -> Result<Self> {
        let gilrs =
            Gilrs::new().map_err(|e| Error::Input(format!("gamepad init failed: {}", e)))?;
        match gilrs.gamepads().next() {
            Some((_, gamepad)) => tracing::info!("Using gamepad '{}'", gamepad.name()),
            None => tracing::warn!("No gamepad connected yet"),
        }
        Ok(Self { gilrs })
    }
}

/// Trigger travel in [0, 1] mapped to [-1, 1], released at -1
fn trigger(gamepad: &Gamepad<'_>, button: Button) -> f64 {
    let travel = gamepad.button_data(button).map_or(0.0, |data| data.value());
    f64::from(travel) * 2.0 - 1.0
}

fn snapshot(gamepad: &Gamepad<'_>) -> InputSnapshot {
    let pressed = |button| i8::from(gamepad.is_pressed(button));
    let hat_x = pressed(Button::DPadRight) - pressed(Button::DPadLeft);
    let hat_y = pressed(Button::DPadUp) - pressed(Button::DPadDown);

    InputSnapshot {
        buttons: BUTTONS.iter().map(|&b| gamepad.is_pressed(b)).collect(),
        axes: vec![
            f64::from(gamepad.value(Axis::LeftStickX)),
            -f64::from(gamepad.value(Axis::LeftStickY)),
            trigger(gamepad, Button::LeftTrigger2),
            f64::from(gamepad.value(Axis::RightStickX)),
            -f64::from(gamepad.value(Axis::RightStickY)),
            trigger(gamepad, Button::RightTrigger2),
        ],
        hats: vec![(hat_x, hat_y)],
    }
}

impl InputSource for GamepadInput {
    fn name(&self) -> &str {
        "gamepad"
    }

    fn poll(&mut self) -> Result<InputSnapshot> {
        // Drain pending events so the cached state is current
        while self.gilrs.next_event().is_some() {}

        match self.gilrs.gamepads().next() {
            Some((_, gamepad)) => Ok(snapshot(&gamepad)),
            None => Err(Error::Input("no gamepad connected".into())),
        }
    }
}
