use remote_state::STEPPER_CONTROL_PATH;
use shared::domain::{ActuatorId, STEPPER_ACTUATOR};

/// Static description of an actuator wired into the control subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actuator {
    pub id: ActuatorId,
    pub name: &'static str,
    /// Key of the actuator inside the `kontrol` subtree.
    pub control_key: &'static str,
    /// Full key-path the dispatcher writes commands to.
    pub control_path: &'static str,
    pub icon: &'static str,
}

pub const ACTUATORS: &[Actuator] = &[Actuator {
    id: STEPPER_ACTUATOR,
    name: "Stepper Motor",
    control_key: "stepper",
    control_path: STEPPER_CONTROL_PATH,
    icon: "fa-motorcycle",
}];

pub fn find_actuator(id: ActuatorId) -> Option<&'static Actuator> {
    ACTUATORS.iter().find(|actuator| actuator.id == id)
}
