//! Fixed vocabularies shared by the product and routine screens.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Product categories as shown in the category chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    ContornoOjos,
    Tonicos,
    Hidratantes,
    Serums,
    ProtectoresSolares,
    Limpiadores,
    Mascarillas,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::ContornoOjos,
        Category::Tonicos,
        Category::Hidratantes,
        Category::Serums,
        Category::ProtectoresSolares,
        Category::Limpiadores,
        Category::Mascarillas,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::ContornoOjos => "CONTORNO_OJOS",
            Category::Tonicos => "TONICOS",
            Category::Hidratantes => "HIDRATANTES",
            Category::Serums => "SERUMS",
            Category::ProtectoresSolares => "PROTECTORES_SOLARES",
            Category::Limpiadores => "LIMPIADORES",
            Category::Mascarillas => "MASCARILLAS",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::ContornoOjos => "Contorno de ojos",
            Category::Tonicos => "Tónicos",
            Category::Hidratantes => "Hidratantes",
            Category::Serums => "Serums",
            Category::ProtectoresSolares => "Protectores solares",
            Category::Limpiadores => "Limpiadores",
            Category::Mascarillas => "Mascarillas",
        }
    }

    /// Matches a category as the backend reports it, tolerating labels and case.
    pub fn matches(self, raw: &str) -> bool {
        raw.eq_ignore_ascii_case(self.as_str()) || raw.to_lowercase() == self.label().to_lowercase()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.matches(s) || c.as_str().replace('_', "-").eq_ignore_ascii_case(s))
            .ok_or_else(|| ClientError::Validation(format!("unknown category: {s}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkinType {
    Normal,
    Seca,
    Grasa,
    Mixta,
    Sensible,
}

impl SkinType {
    pub const ALL: [SkinType; 5] = [
        SkinType::Normal,
        SkinType::Seca,
        SkinType::Grasa,
        SkinType::Mixta,
        SkinType::Sensible,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SkinType::Normal => "NORMAL",
            SkinType::Seca => "SECA",
            SkinType::Grasa => "GRASA",
            SkinType::Mixta => "MIXTA",
            SkinType::Sensible => "SENSIBLE",
        }
    }
}

impl FromStr for SkinType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SkinType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ClientError::Validation(format!("unknown skin type: {s}")))
    }
}

impl fmt::Display for SkinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Goal {
    Textura,
    Manchas,
    Irritacion,
    LineasExpresion,
    Poros,
}

impl Goal {
    pub const ALL: [Goal; 5] = [
        Goal::Textura,
        Goal::Manchas,
        Goal::Irritacion,
        Goal::LineasExpresion,
        Goal::Poros,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Goal::Textura => "TEXTURA",
            Goal::Manchas => "MANCHAS",
            Goal::Irritacion => "IRRITACION",
            Goal::LineasExpresion => "LINEAS_EXPRESION",
            Goal::Poros => "POROS",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Goal::Textura => "Mejorar la textura de mi piel",
            Goal::Manchas => "Reducir manchas",
            Goal::Irritacion => "Reducir rojeces e irritación",
            Goal::LineasExpresion => "Prevenir y tratar lineas de expresión",
            Goal::Poros => "Minimizar poros",
        }
    }
}

impl FromStr for Goal {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Goal::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ClientError::Validation(format!("unknown goal: {s}")))
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time of day a product is applied at, as used by recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationTime {
    Dia,
    Noche,
}

impl ApplicationTime {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationTime::Dia => "DIA",
            ApplicationTime::Noche => "NOCHE",
        }
    }
}

/// Routine steps in the order they are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StepKind {
    Cleanser,
    Toner,
    Serum,
    EyeContour,
    Moisturizer,
    Mask,
    Sunscreen,
}

impl StepKind {
    pub const ALL: [StepKind; 7] = [
        StepKind::Cleanser,
        StepKind::Toner,
        StepKind::Serum,
        StepKind::EyeContour,
        StepKind::Moisturizer,
        StepKind::Mask,
        StepKind::Sunscreen,
    ];

    pub fn id(self) -> u8 {
        self.order()
    }

    pub fn order(self) -> u8 {
        match self {
            StepKind::Cleanser => 1,
            StepKind::Toner => 2,
            StepKind::Serum => 3,
            StepKind::EyeContour => 4,
            StepKind::Moisturizer => 5,
            StepKind::Mask => 6,
            StepKind::Sunscreen => 7,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StepKind::Cleanser => "Limpiador",
            StepKind::Toner => "Tónico",
            StepKind::Serum => "Serum",
            StepKind::EyeContour => "Contorno de ojos",
            StepKind::Moisturizer => "Hidratante",
            StepKind::Mask => "Mascarilla",
            StepKind::Sunscreen => "Protector solar",
        }
    }

    pub fn category(self) -> Category {
        match self {
            StepKind::Cleanser => Category::Limpiadores,
            StepKind::Toner => Category::Tonicos,
            StepKind::Serum => Category::Serums,
            StepKind::EyeContour => Category::ContornoOjos,
            StepKind::Moisturizer => Category::Hidratantes,
            StepKind::Mask => Category::Mascarillas,
            StepKind::Sunscreen => Category::ProtectoresSolares,
        }
    }

    pub fn day_only(self) -> bool {
        matches!(self, StepKind::Sunscreen)
    }

    pub fn for_category(raw: &str) -> Option<StepKind> {
        StepKind::ALL.into_iter().find(|s| s.category().matches(raw))
    }

    pub fn from_id(id: u8) -> Option<StepKind> {
        StepKind::ALL.into_iter().find(|s| s.id() == id)
    }
}

impl FromStr for StepKind {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(step) = s.parse::<u8>().ok().and_then(StepKind::from_id) {
            return Ok(step);
        }
        let key = s.to_lowercase();
        let step = match key.as_str() {
            "cleanser" | "limpiador" => StepKind::Cleanser,
            "toner" | "tonico" | "tónico" => StepKind::Toner,
            "serum" => StepKind::Serum,
            "eye-contour" | "contorno" | "contorno de ojos" => StepKind::EyeContour,
            "moisturizer" | "hidratante" => StepKind::Moisturizer,
            "mask" | "mascarilla" => StepKind::Mask,
            "sunscreen" | "protector" | "protector solar" => StepKind::Sunscreen,
            _ => return Err(ClientError::Validation(format!("unknown routine step: {s}"))),
        };
        Ok(step)
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
