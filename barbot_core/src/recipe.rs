//! In-memory recipe store. Loaded once, read-only afterwards.

/// One pour: `quantity_ml` of `name` from pump `motor`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ingredient {
    pub name: String,
    /// Logical motor number, 1-based.
    pub motor: u32,
    pub quantity_ml: f64,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, motor: u32, quantity_ml: f64) -> Self {
        Self {
            name: name.into(),
            motor,
            quantity_ml,
        }
    }
}

/// Where a front end can find the cocktail's picture. Never fetched here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRef {
    pub path: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub name: String,
    pub ingredients: Vec<Ingredient>,
    pub image: ImageRef,
}

impl Recipe {
    pub fn new(name: impl Into<String>, ingredients: Vec<Ingredient>) -> Self {
        Self {
            name: name.into(),
            ingredients,
            image: ImageRef::default(),
        }
    }

    /// Total volume of the drink in mL.
    pub fn total_ml(&self) -> f64 {
        self.ingredients.iter().map(|i| i.quantity_ml).sum()
    }
}

/// Cocktails in presentation order.
#[derive(Debug, Clone, Default)]
pub struct RecipeBook {
    recipes: Vec<Recipe>,
}

impl RecipeBook {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self { recipes }
    }

    pub fn get(&self, name: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.recipes.iter().map(|r| r.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

impl FromIterator<Recipe> for RecipeBook {
    fn from_iter<T: IntoIterator<Item = Recipe>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
