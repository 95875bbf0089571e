use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutricheck_core::models::{Nutrient, NutrientProfile, StatusMap};

#[derive(Tabled)]
pub(crate) struct NutrientRow {
    #[tabled(rename = "Nutrient")]
    nutrient: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Amounts carry their display unit: whole kcal for calories, one
/// decimal of grams or milligrams for everything else.
pub(crate) fn format_amount(nutrient: Nutrient, value: f64) -> String {
    match nutrient {
        Nutrient::Calories => format!("{value:.0} kcal"),
        _ => format!("{value:.1} {}", nutrient.unit()),
    }
}

pub(crate) fn print_nutrient_table(profile: &NutrientProfile, status: &StatusMap) {
    let rows: Vec<NutrientRow> = Nutrient::ALL
        .iter()
        .map(|&nutrient| NutrientRow {
            nutrient: nutrient.name().to_string(),
            amount: format_amount(nutrient, profile.get(nutrient)),
            status: status.get(nutrient).as_str().to_string(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

/// Compact local timestamp for table rows; falls back to the raw string
/// when it does not parse as RFC 3339.
pub(crate) fn format_logged_at(logged_at: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(logged_at)
        .map_or_else(|_| logged_at.to_string(), |dt| {
            dt.format("%Y-%m-%d %H:%M").to_string()
        })
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
