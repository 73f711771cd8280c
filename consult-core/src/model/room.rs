use crate::utils::MAX_ROOM_ID_LEN;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("room id is empty")]
    Empty,

    #[error("room id is {0} bytes, limit is {MAX_ROOM_ID_LEN}")]
    TooLong(usize),

    #[error("room id contains control characters")]
    ControlCharacter,
}

/// Call identifier handed out by the scheduling service for one appointment.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(ParseError::Empty);
        }
        if value.len() > MAX_ROOM_ID_LEN {
            return Err(ParseError::TooLong(value.len()));
        }
        if value.chars().any(char::is_control) {
            return Err(ParseError::ControlCharacter);
        }
        Ok(Self(value))
    }
}

impl FromStr for RoomId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl From<RoomId> for String {
    fn from(id: RoomId) -> Self {
        id.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
