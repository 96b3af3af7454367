mod diary_entry;
mod food;
mod list_name;

pub use diary_entry::{DiaryEntry, EntryPatch};
pub use food::{ChosenOptions, Food, FoodEntry, NewFoodEntry};
pub use list_name::ListName;
