use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeEntry {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    pub name: String,
    pub price: f64,
    pub description: String,
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Promotion {
    pub title: String,
    pub description: String,
    pub valid_until: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Partner {
    pub name: String,
    pub category: String,
    pub description: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ad {
    pub title: String,
    pub link: Option<String>,
}

/// What the assistant may tell visitors beyond the academy settings.
/// Only active and unexpired rows end up here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    pub knowledge: Vec<KnowledgeEntry>,
    pub plans: Vec<Plan>,
    pub promotions: Vec<Promotion>,
    pub partners: Vec<Partner>,
    pub ads: Vec<Ad>,
}
