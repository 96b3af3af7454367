use clap::Args;

use dietdiary::models::{ChosenOptions, DiaryEntry, Food, FoodEntry, ListName, NewFoodEntry};
use dietdiary::store::{DiaryError, DiaryStore};

use super::{parse_date, OutputFormat};

#[derive(Args)]
pub struct ShowArgs {
    /// Date (YYYY-MM-DD), defaults to today
    #[arg(long, short)]
    date: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl ShowArgs {
    pub async fn run(&self, store: &dyn DiaryStore) -> Result<(), Box<dyn std::error::Error>> {
        let date = parse_date(self.date.as_deref())?;
        let view = store.read(date).await?;

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&view.entry)?);
            }
            OutputFormat::Text => {
                println!("{}", date);
                println!("{}", "-".repeat(10));
                print!("{}", view.entry);
            }
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct AddArgs {
    /// Date (YYYY-MM-DD), defaults to today
    #[arg(long, short)]
    date: Option<String>,

    /// List to add to (eaten, toEat)
    #[arg(long, short, default_value = "eaten")]
    list: ListName,

    /// Food ID from the food database
    #[arg(long)]
    food_id: String,

    /// Food name
    #[arg(long)]
    name: String,

    /// Food brand
    #[arg(long)]
    brand: Option<String>,

    /// Energy per 100 g, in kJ
    #[arg(long, default_value = "0")]
    energy_kj: f64,

    /// Protein per 100 g, in grams
    #[arg(long, default_value = "0")]
    protein: f64,

    /// Fat per 100 g, in grams
    #[arg(long, default_value = "0")]
    fat: f64,

    /// Carbohydrate per 100 g, in grams
    #[arg(long, default_value = "0")]
    carbs: f64,

    /// Serving size in grams
    #[arg(long, default_value = "100")]
    serving_size: f64,

    /// Number of servings
    #[arg(long, default_value = "1")]
    amount: f64,
}

impl AddArgs {
    pub async fn run(&self, store: &dyn DiaryStore) -> Result<(), Box<dyn std::error::Error>> {
        let date = parse_date(self.date.as_deref())?;
        if self.serving_size <= 0.0 || self.amount <= 0.0 {
            return Err("Serving size and amount must be positive".into());
        }

        let mut food = Food::new(&self.food_id, &self.name).with_nutrients(
            self.energy_kj,
            self.protein,
            self.fat,
            self.carbs,
        );
        if let Some(brand) = &self.brand {
            food = food.with_brand(brand);
        }
        let options = ChosenOptions::compute(&food, self.serving_size, self.amount);

        let entry = store
            .add_food(date, self.list, NewFoodEntry::new(food, options))
            .await?;

        println!("Added '{}' to {} on {}", self.name, self.list, date);
        println!();
        print!("{}", entry);
        Ok(())
    }
}

#[derive(Args)]
pub struct RemoveArgs {
    /// Date (YYYY-MM-DD), defaults to today
    #[arg(long, short)]
    date: Option<String>,

    /// IDs of the foods to remove
    #[arg(required = true)]
    ids: Vec<String>,
}

impl RemoveArgs {
    pub async fn run(&self, store: &dyn DiaryStore) -> Result<(), Box<dyn std::error::Error>> {
        let date = parse_date(self.date.as_deref())?;
        let entry = store.remove_foods(date, &self.ids).await?;

        println!("Removed {} food(s) from {}", self.ids.len(), date);
        println!();
        print!("{}", entry);
        Ok(())
    }
}

#[derive(Args)]
pub struct MoveArgs {
    /// Date (YYYY-MM-DD), defaults to today
    #[arg(long, short)]
    date: Option<String>,

    /// ID of the food to move
    id: String,

    /// Destination list (eaten, toEat)
    #[arg(long)]
    to: ListName,
}

impl MoveArgs {
    pub async fn run(&self, store: &dyn DiaryStore) -> Result<(), Box<dyn std::error::Error>> {
        let date = parse_date(self.date.as_deref())?;
        let entry = store.move_food(date, &self.id, self.to).await?;

        println!("Moved {} to {}", self.id, self.to);
        println!();
        print!("{}", entry);
        Ok(())
    }
}

#[derive(Args)]
pub struct ReorderArgs {
    /// Date (YYYY-MM-DD), defaults to today
    #[arg(long, short)]
    date: Option<String>,

    /// Food IDs of the eaten list, in their new order
    #[arg(long, num_args = 0..)]
    eaten: Vec<String>,

    /// Food IDs of the to-eat list, in their new order
    #[arg(long = "to-eat", num_args = 0..)]
    to_eat: Vec<String>,
}

impl ReorderArgs {
    pub async fn run(&self, store: &dyn DiaryStore) -> Result<(), Box<dyn std::error::Error>> {
        let date = parse_date(self.date.as_deref())?;
        let current = store.read(date).await?.entry;
        let (eaten, to_eat) = arrange(&current, &self.eaten, &self.to_eat)?;

        let entry = store.reorder(date, eaten, to_eat).await?;

        println!("Reordered foods on {}", date);
        println!();
        print!("{}", entry);
        Ok(())
    }
}

/// Builds both lists from `eaten` and `to_eat` ids, which together must name
/// every food of `entry` exactly once.
fn arrange(
    entry: &DiaryEntry,
    eaten: &[String],
    to_eat: &[String],
) -> Result<(Vec<FoodEntry>, Vec<FoodEntry>), Box<dyn std::error::Error>> {
    let total = entry.eaten.len() + entry.to_eat.len();
    let mut seen = std::collections::HashSet::new();
    if eaten.len() + to_eat.len() != total
        || !eaten.iter().chain(to_eat).all(|id| seen.insert(id.as_str()))
    {
        return Err(format!("Reorder must list each of the {} food(s) exactly once", total).into());
    }

    let pick = |ids: &[String]| -> Result<Vec<FoodEntry>, DiaryError> {
        ids.iter()
            .map(|id| {
                entry
                    .find(id)
                    .map(|(_, item)| item.clone())
                    .ok_or_else(|| DiaryError::FoodNotFound(id.clone()))
            })
            .collect()
    };
    Ok((pick(eaten)?, pick(to_eat)?))
}
