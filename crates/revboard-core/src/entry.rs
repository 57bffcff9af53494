use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// One revenue stream contributing to a day's total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RevenueSource {
    pub id: String,

    pub name: String,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub url: Option<String>,

    pub revenue: f64,
}

/// One calendar day's aggregated revenue plus its source breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevenueEntry {
    pub day: u32,

    pub date: NaiveDate,

    pub total_revenue: f64,

    #[serde(default, rename = "revenueComposition", alias = "composition")]
    pub composition: Vec<RevenueSource>,
}

impl RevenueEntry {
    pub fn new(day: u32, date: NaiveDate, total_revenue: f64) -> Self {
        Self {
            day,
            date,
            total_revenue,
            composition: vec![],
        }
    }

    pub fn with_source(mut self, id: &str, name: &str, url: Option<&str>, revenue: f64) -> Self {
        self.composition.push(RevenueSource {
            id: id.to_string(),
            name: name.to_string(),
            url: url.map(str::to_string),
            revenue,
        });
        self
    }

    pub fn composition_total(&self) -> f64 {
        self.composition.iter().map(|source| source.revenue).sum()
    }

    pub fn has_revenue(&self) -> bool {
        self.total_revenue > 0.0
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|url| !url.trim().is_empty()))
}
