use serde::{Deserialize, Deserializer, Serialize};

/// Reduced product used by list views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub brand: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub category: String,
}

/// Full product as shown on the detail screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub brand: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub application_time: String,
    #[serde(default, deserialize_with = "ingredient_list")]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub skin_types: Vec<String>,
}

impl From<Product> for ProductSummary {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            brand: p.brand,
            image_url: p.image_url,
            category: p.category,
        }
    }
}

impl ProductSummary {
    /// Case-insensitive match of `needle` against name or brand.
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        needle.is_empty()
            || self.name.to_lowercase().contains(&needle)
            || self.brand.to_lowercase().contains(&needle)
    }
}

// The backend has shipped ingredients both as one comma separated string and as a list.
fn ingredient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        List(Vec<String>),
        Null(Option<()>),
    }

    let items = match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s.split(',').map(str::to_string).collect(),
        Raw::List(v) => v,
        Raw::Null(_) => Vec::new(),
    };
    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}
