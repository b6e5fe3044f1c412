//! Neuron layout of the reference controller.
//!
//! The controller wiring is resolved once at compile time: every sensor,
//! hidden neuron and actuator has a fixed slot, and genome fields are flat
//! arrays indexed through these enums. Labels are kept for diagnostics and
//! for the wire format's human-readable side.

use serde::{Deserialize, Serialize};

/// Sensor bank of the reference robot: four quadrant cameras, eight
/// proximity rays at 45 degree spacing, one downward ground sensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sensor {
    Camera0,
    Camera1,
    Camera2,
    Camera3,
    Proximity0,
    Proximity1,
    Proximity2,
    Proximity3,
    Proximity4,
    Proximity5,
    Proximity6,
    Proximity7,
    Ground0,
}

pub const SENSOR_LABELS: [&str; 13] = [
    "camera0",
    "camera1",
    "camera2",
    "camera3",
    "proximity0",
    "proximity1",
    "proximity2",
    "proximity3",
    "proximity4",
    "proximity5",
    "proximity6",
    "proximity7",
    "ground0",
];

impl Sensor {
    pub const ALL: [Sensor; 13] = [
        Sensor::Camera0,
        Sensor::Camera1,
        Sensor::Camera2,
        Sensor::Camera3,
        Sensor::Proximity0,
        Sensor::Proximity1,
        Sensor::Proximity2,
        Sensor::Proximity3,
        Sensor::Proximity4,
        Sensor::Proximity5,
        Sensor::Proximity6,
        Sensor::Proximity7,
        Sensor::Ground0,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        SENSOR_LABELS[self as usize]
    }
}

/// Hidden leaky-integrator neurons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hidden {
    Hidden0,
    Hidden1,
    Hidden2,
}

pub const HIDDEN_LABELS: [&str; 3] = ["hidden0", "hidden1", "hidden2"];

impl Hidden {
    pub const ALL: [Hidden; 3] = [Hidden::Hidden0, Hidden::Hidden1, Hidden::Hidden2];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        HIDDEN_LABELS[self as usize]
    }
}

/// Actuators: two wheel motors and two signalling LEDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Actuator {
    Wheels0,
    Wheels1,
    RearLed0,
    FrontLed0,
}

pub const ACTUATOR_LABELS: [&str; 4] = ["wheels0", "wheels1", "rear_led0", "front_led0"];

impl Actuator {
    pub const ALL: [Actuator; 4] = [
        Actuator::Wheels0,
        Actuator::Wheels1,
        Actuator::RearLed0,
        Actuator::FrontLed0,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        ACTUATOR_LABELS[self as usize]
    }
}

pub const NUM_SENSORS: usize = SENSOR_LABELS.len();
pub const NUM_HIDDEN: usize = HIDDEN_LABELS.len();
pub const NUM_ACTUATORS: usize = ACTUATOR_LABELS.len();
