use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two food lists of a diary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListName {
    #[serde(rename = "eaten")]
    Eaten,
    #[serde(rename = "toEat")]
    ToEat,
}

impl ListName {
    /// Name used on the wire and in query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            ListName::Eaten => "eaten",
            ListName::ToEat => "toEat",
        }
    }
}

impl fmt::Display for ListName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ListName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "eaten" => Ok(ListName::Eaten),
            "toeat" | "to-eat" | "to_eat" => Ok(ListName::ToEat),
            _ => Err(format!(
                "Invalid list '{}'. Valid options: eaten, toEat",
                s
            )),
        }
    }
}
