use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(ActuatorId);
id_newtype!(SensorId);

impl fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The only actuator wired to the control subtree today.
pub const STEPPER_ACTUATOR: ActuatorId = ActuatorId(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Foreman,
    Leader,
    Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewTelemetry,
    ControlActuators,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Foreman, Role::Leader, Role::Viewer];

    /// Maps an external role label onto the closed role set. Anything that is not one of
    /// the privileged labels is treated as a viewer.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "foreman" => Role::Foreman,
            "leader" => Role::Leader,
            _ => Role::Viewer,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Foreman => "foreman",
            Role::Leader => "leader",
            Role::Viewer => "viewer",
        }
    }

    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Role::Admin | Role::Foreman | Role::Leader => {
                &[Capability::ViewTelemetry, Capability::ControlActuators]
            }
            Role::Viewer => &[Capability::ViewTelemetry],
        }
    }

    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Capability {
    /// Roles granted this capability. An empty result never happens for the current
    /// mapping; `ViewTelemetry` is granted to every role.
    pub fn permitted_roles(self) -> Vec<Role> {
        Role::ALL.into_iter().filter(|role| role.can(self)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub role: Role,
}

impl Identity {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Forward,
    Backward,
    Stop,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Forward, Direction::Backward, Direction::Stop];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "FORWARD",
            Direction::Backward => "BACKWARD",
            Direction::Stop => "STOP",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated command for one actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorCommand {
    pub actuator_id: ActuatorId,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown direction '{0}'")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_uppercase();
        Direction::ALL
            .into_iter()
            .find(|direction| direction.as_str() == normalized)
            .ok_or(ParseDirectionError(normalized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_role_labels_collapse_to_viewer() {
        assert_eq!(Role::from_label("Admin"), Role::Admin);
        assert_eq!(Role::from_label(" leader "), Role::Leader);
        assert_eq!(Role::from_label("operator"), Role::Viewer);
        assert_eq!(Role::from_label(""), Role::Viewer);
    }

    #[test]
    fn control_is_limited_to_privileged_roles() {
        assert_eq!(
            Capability::ControlActuators.permitted_roles(),
            vec![Role::Admin, Role::Foreman, Role::Leader]
        );
        assert_eq!(Capability::ViewTelemetry.permitted_roles(), Role::ALL.to_vec());
    }

    #[test]
    fn direction_parsing_normalizes_case() {
        assert_eq!("forward".parse::<Direction>(), Ok(Direction::Forward));
        assert_eq!(" Stop ".parse::<Direction>(), Ok(Direction::Stop));
        assert_eq!(
            "sideways".parse::<Direction>(),
            Err(ParseDirectionError("SIDEWAYS".into()))
        );
    }

    #[test]
    fn direction_serializes_uppercase() {
        let json = serde_json::to_string(&Direction::Backward).expect("json");
        assert_eq!(json, "\"BACKWARD\"");
    }
}
