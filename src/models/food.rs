use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A food item as returned by the food catalogue. Nutrient values are per 100 g.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(rename = "energyKJ", default)]
    pub energy_kj: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub carbohydrate: f64,
}

impl Food {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            brand: None,
            energy_kj: 0.0,
            protein: 0.0,
            fat: 0.0,
            carbohydrate: 0.0,
        }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_nutrients(mut self, energy_kj: f64, protein: f64, fat: f64, carbohydrate: f64) -> Self {
        self.energy_kj = energy_kj;
        self.protein = protein;
        self.fat = fat;
        self.carbohydrate = carbohydrate;
        self
    }
}

/// Serving choice for a logged food, with the nutrient totals it works out to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChosenOptions {
    /// Grams per serving.
    pub serving_size: f64,
    /// Number of servings.
    pub chosen_amount: f64,
    #[serde(rename = "energyKJ", default)]
    pub energy_kj: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub carbohydrate: f64,
}

impl ChosenOptions {
    /// Computes totals for `chosen_amount` servings of `serving_size` grams.
    pub fn compute(food: &Food, serving_size: f64, chosen_amount: f64) -> Self {
        let grams = serving_size * chosen_amount;
        let scale = |per_100g: f64| per_100g * grams / 100.0;
        Self {
            serving_size,
            chosen_amount,
            energy_kj: scale(food.energy_kj),
            protein: scale(food.protein),
            fat: scale(food.fat),
            carbohydrate: scale(food.carbohydrate),
        }
    }
}

/// A food placed in one of an entry's lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub chosen_food: Food,
    pub chosen_options: ChosenOptions,
}

impl FoodEntry {
    /// Creates an entry with a fresh id, as the guest path does.
    pub fn new(food: Food, chosen_options: ChosenOptions) -> Self {
        Self::from_new(NewFoodEntry::new(food, chosen_options))
    }

    pub fn from_new(new: NewFoodEntry) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            chosen_food: new.food,
            chosen_options: new.chosen_options,
        }
    }
}

/// A food about to be added to a list; it has no id until stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFoodEntry {
    pub food: Food,
    pub chosen_options: ChosenOptions,
}

impl NewFoodEntry {
    pub fn new(food: Food, chosen_options: ChosenOptions) -> Self {
        Self {
            food,
            chosen_options,
        }
    }
}
