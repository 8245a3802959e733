use serde::{Deserialize, Serialize};

/// Stored treatment length: either minutes or free text such as `"1 hour 30 mins"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Minutes(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    Amount(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub duration: Option<DurationValue>,
    #[serde(default)]
    pub price: Option<PriceValue>,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// A promotion books like a service; a positive `duration` overrides the
/// computed length of the whole booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub price: Option<PriceValue>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Promotion {
    pub fn override_minutes(&self) -> Option<u32> {
        self.duration.filter(|minutes| *minutes > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub full_name: String,
}

fn default_active() -> bool {
    true
}
