use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CartEntry;

/// One line of a completed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(rename = "itemName")]
    pub item_name: String,
    pub quantity: u32,
}

impl OrderLine {
    pub fn new(item_id: impl Into<String>, item_name: impl Into<String>, quantity: u32) -> Self {
        Self {
            item_id: item_id.into(),
            item_name: item_name.into(),
            quantity,
        }
    }
}

impl From<&CartEntry> for OrderLine {
    fn from(entry: &CartEntry) -> Self {
        Self::new(entry.item.id.clone(), entry.item.name.clone(), entry.quantity)
    }
}

/// The most recently completed order. Each new order replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastOrder {
    pub lines: Vec<OrderLine>,
    #[serde(rename = "placedAt")]
    pub placed_at: DateTime<Utc>,
}

impl LastOrder {
    pub fn new(lines: Vec<OrderLine>) -> Self {
        Self {
            lines,
            placed_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.placed_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}
