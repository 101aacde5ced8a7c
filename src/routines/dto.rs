use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{catalog::ApplicationTime, error::ClientError, products::dto::Product};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoutineType {
    #[serde(rename = "DIA")]
    Day,
    #[serde(rename = "NOCHE")]
    Night,
}

impl RoutineType {
    pub(crate) fn path_segment(self) -> &'static str {
        match self {
            RoutineType::Day => "day",
            RoutineType::Night => "night",
        }
    }

    pub fn application_time(self) -> ApplicationTime {
        match self {
            RoutineType::Day => ApplicationTime::Dia,
            RoutineType::Night => ApplicationTime::Noche,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            RoutineType::Day => "Rutina de día",
            RoutineType::Night => "Rutina de noche",
        }
    }
}

impl fmt::Display for RoutineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

impl FromStr for RoutineType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "dia" | "día" => Ok(RoutineType::Day),
            "night" | "noche" => Ok(RoutineType::Night),
            other => Err(ClientError::Validation(format!("unknown routine type: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: i64,
    pub routine_type: RoutineType,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub products: Vec<Product>,
}
