use serde::{Deserialize, Serialize};

/// Patrol mission verbs a session may issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatrolAction {
    /// Run the patrol route once.
    Single,
    /// Loop the patrol route until told otherwise.
    Repeat,
    /// Head back to the docking point.
    Return,
    /// Halt in place.
    Stop,
}

impl PatrolAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatrolAction::Single => "single",
            PatrolAction::Repeat => "repeat",
            PatrolAction::Return => "return",
            PatrolAction::Stop => "stop",
        }
    }

    /// True for the verbs that begin a fresh patrol run.
    pub fn starts_run(&self) -> bool {
        matches!(self, PatrolAction::Single | PatrolAction::Repeat)
    }
}

/// Bus payload for a patrol command (`std_msgs/String` shape: the verb
/// travels as the `data` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatrolCommand {
    pub data: PatrolAction,
}

impl PatrolCommand {
    pub fn new(action: PatrolAction) -> Self {
        Self { data: action }
    }
}
