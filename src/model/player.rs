use serde::{Deserialize, Serialize};

/// One seat at the table. `role` and `is_human` are fixed at setup; `status`
/// only ever flips from Alive to Dead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub role: Role,
    pub status: PlayerStatus,
    pub is_human: bool,
}

impl Player {
    pub fn new(id: impl Into<String>, role: Role, is_human: bool) -> Self {
        Self {
            id: id.into(),
            role,
            status: PlayerStatus::Alive,
            is_human,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status == PlayerStatus::Alive
    }

    pub fn alignment(&self) -> Alignment {
        self.role.alignment()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Impostor,
    Villager,
    Investigator,
}

impl Role {
    pub fn alignment(self) -> Alignment {
        match self {
            Role::Impostor => Alignment::Evil,
            Role::Villager | Role::Investigator => Alignment::Good,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Impostor => write!(f, "Impostor"),
            Role::Villager => write!(f, "Villager"),
            Role::Investigator => write!(f, "Investigator"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerStatus {
    Alive,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Good,
    Evil,
}

impl std::fmt::Display for Alignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Alignment::Good => write!(f, "Good"),
            Alignment::Evil => write!(f, "Evil"),
        }
    }
}
