use serde::{Deserialize, Serialize};
use std::fmt;

use super::food::FoodEntry;
use super::list_name::ListName;

/// The diary for one calendar date.
///
/// Missing fields deserialize to their empty values, so an absent entry and
/// `{}` both read as `{eaten: [], toEat: [], note: ""}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
    #[serde(default)]
    pub eaten: Vec<FoodEntry>,
    #[serde(default)]
    pub to_eat: Vec<FoodEntry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub note: String,
    /// Server-computed energy total; see [`DiaryEntry::eaten_kj`].
    #[serde(
        rename = "totalEatenKJ",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub total_eaten_kj: Option<f64>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl DiaryEntry {
    pub fn list(&self, name: ListName) -> &[FoodEntry] {
        match name {
            ListName::Eaten => &self.eaten,
            ListName::ToEat => &self.to_eat,
        }
    }

    pub fn list_mut(&mut self, name: ListName) -> &mut Vec<FoodEntry> {
        match name {
            ListName::Eaten => &mut self.eaten,
            ListName::ToEat => &mut self.to_eat,
        }
    }

    /// Finds a food in either list.
    pub fn find(&self, id: &str) -> Option<(ListName, &FoodEntry)> {
        [ListName::Eaten, ListName::ToEat]
            .into_iter()
            .find_map(|name| {
                self.list(name)
                    .iter()
                    .find(|item| item.id == id)
                    .map(|item| (name, item))
            })
    }

    /// Energy eaten, preferring the server's figure when it sent one.
    pub fn eaten_kj(&self) -> f64 {
        self.total_eaten_kj.unwrap_or_else(|| {
            self.eaten
                .iter()
                .map(|item| item.chosen_options.energy_kj)
                .sum()
        })
    }

    /// Merges a patch field by field. Lists are replaced, never merged.
    pub fn apply(&mut self, patch: &EntryPatch) {
        if let Some(note) = &patch.note {
            self.note = note.clone();
        }
        if let Some(eaten) = &patch.eaten {
            self.eaten = eaten.clone();
        }
        if let Some(to_eat) = &patch.to_eat {
            self.to_eat = to_eat.clone();
        }
        // Any local list change invalidates the server total.
        if patch.eaten.is_some() {
            self.total_eaten_kj = None;
        }
    }

    /// Builds the patch that drops `ids` from both lists, keeping order.
    pub fn without_foods(&self, ids: &[String]) -> EntryPatch {
        let keep = |item: &&FoodEntry| !ids.contains(&item.id);
        EntryPatch::lists(
            self.eaten.iter().filter(keep).cloned().collect(),
            self.to_eat.iter().filter(keep).cloned().collect(),
        )
    }

    /// Builds the patch that moves food `id` to the end of `to`.
    ///
    /// Returns `None` when no food has that id. Moving into the list the
    /// food is already in is a no-op patch carrying both lists unchanged.
    pub fn with_food_moved(&self, id: &str, to: ListName) -> Option<EntryPatch> {
        let (from, item) = self.find(id)?;
        let mut next = self.clone();
        if from != to {
            let item = item.clone();
            next.list_mut(from).retain(|food| food.id != id);
            next.list_mut(to).push(item);
        }
        Some(EntryPatch::lists(next.eaten, next.to_eat))
    }
}

impl fmt::Display for DiaryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in [ListName::Eaten, ListName::ToEat] {
            let heading = match name {
                ListName::Eaten => "Eaten",
                ListName::ToEat => "To Eat",
            };
            writeln!(f, "{}", heading)?;
            let items = self.list(name);
            if items.is_empty() {
                writeln!(f, "  (none)")?;
            }
            for item in items {
                writeln!(
                    f,
                    "  {}  {} x {}g  {:.0} kJ  [{}]",
                    item.chosen_food.name,
                    item.chosen_options.chosen_amount,
                    item.chosen_options.serving_size,
                    item.chosen_options.energy_kj,
                    item.id
                )?;
            }
        }
        writeln!(f, "\nTotal eaten: {:.0} kJ", self.eaten_kj())?;
        if !self.note.is_empty() {
            writeln!(f, "\nNote: {}", self.note)?;
        }
        Ok(())
    }
}

/// A partial update of a diary entry. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eaten: Option<Vec<FoodEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_eat: Option<Vec<FoodEntry>>,
}

impl EntryPatch {
    pub fn note(note: impl Into<String>) -> Self {
        Self {
            note: Some(note.into()),
            ..Self::default()
        }
    }

    pub fn lists(eaten: Vec<FoodEntry>, to_eat: Vec<FoodEntry>) -> Self {
        Self {
            note: None,
            eaten: Some(eaten),
            to_eat: Some(to_eat),
        }
    }
}
