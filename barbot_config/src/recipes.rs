//! Cocktail recipe document.
//!
//! Expected shape (JSON object, one entry per cocktail, document order kept):
//!
//! ```json
//! {
//!   "Mojito": {
//!     "ingredients": [
//!       { "name": "White rum", "motor": 1, "quantity": 45 },
//!       { "name": "Lime juice", "motor": 4, "quantity": 20 }
//!     ],
//!     "imgpath": "img/mojito.jpg",
//!     "image_url": "https://example.invalid/mojito.jpg"
//!   }
//! }
//! ```
use std::fmt;
use std::path::Path;

use eyre::WrapErr;
use serde::Deserialize;
use serde::de::{self, Deserializer, MapAccess, Visitor};

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct IngredientDoc {
    pub name: String,
    /// Logical motor number, 1-based.
    pub motor: u32,
    /// Millilitres to pour.
    pub quantity: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RecipeDoc {
    pub ingredients: Vec<IngredientDoc>,
    /// Local image path, preferred by front ends over `image_url`.
    #[serde(default)]
    pub imgpath: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// All cocktails in the order they appear in the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeDocument {
    pub cocktails: Vec<(String, RecipeDoc)>,
}

impl<'de> Deserialize<'de> for RecipeDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DocVisitor;

        impl<'de> Visitor<'de> for DocVisitor {
            type Value = RecipeDocument;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping cocktail names to recipes")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut cocktails: Vec<(String, RecipeDoc)> =
                    Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, recipe)) = map.next_entry::<String, RecipeDoc>()? {
                    if cocktails.iter().any(|(n, _)| *n == name) {
                        return Err(de::Error::custom(format!("duplicate cocktail {name:?}")));
                    }
                    cocktails.push((name, recipe));
                }
                Ok(RecipeDocument { cocktails })
            }
        }

        deserializer.deserialize_map(DocVisitor)
    }
}

impl RecipeDocument {
    pub fn get(&self, name: &str) -> Option<&RecipeDoc> {
        self.cocktails
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r)
    }

    pub fn len(&self) -> usize {
        self.cocktails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cocktails.is_empty()
    }
}

pub fn load_recipes_json(s: &str) -> Result<RecipeDocument, serde_json::Error> {
    serde_json::from_str(s)
}

pub fn load_recipes_file(path: &Path) -> eyre::Result<RecipeDocument> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read recipes {}", path.display()))?;
    load_recipes_json(&text).wrap_err_with(|| format!("parse recipes {}", path.display()))
}
