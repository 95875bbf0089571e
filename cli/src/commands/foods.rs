use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutricheck_core::catalog::CatalogEntry;
use nutricheck_core::models::Nutrient;
use nutricheck_core::service::NutritionService;

use super::helpers::{format_amount, truncate};

pub(crate) fn cmd_foods(svc: &NutritionService, search: Option<&str>, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Fat")]
        fat: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fiber")]
        fiber: String,
        #[tabled(rename = "Sugar")]
        sugar: String,
        #[tabled(rename = "Sodium")]
        sodium: String,
    }

    let query = search.map(str::to_lowercase);
    let entries: Vec<&CatalogEntry> = svc
        .catalog()
        .entries()
        .iter()
        .filter(|e| {
            query
                .as_deref()
                .is_none_or(|q| e.name.to_lowercase().contains(q))
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        match search {
            Some(q) => eprintln!("No foods match '{q}'"),
            None => eprintln!("The catalog is empty"),
        }
        process::exit(2);
    }

    let rows: Vec<FoodRow> = entries
        .iter()
        .map(|e| {
            let p = &e.profile;
            FoodRow {
                name: truncate(&e.name, 35),
                calories: format!("{:.0}", p.calories),
                protein: format!("{:.1}g", p.protein),
                fat: format!("{:.1}g", p.fat),
                carbs: format!("{:.1}g", p.carbohydrates),
                fiber: format!("{:.1}g", p.fiber),
                sugar: format!("{:.1}g", p.sugar),
                sodium: format!("{:.1}mg", p.sodium),
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

pub(crate) fn cmd_thresholds(svc: &NutritionService, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct ThresholdRow {
        #[tabled(rename = "Nutrient")]
        nutrient: String,
        #[tabled(rename = "Low")]
        low: String,
        #[tabled(rename = "High")]
        high: String,
    }

    let thresholds = svc.thresholds();

    if json {
        println!("{}", serde_json::to_string_pretty(thresholds)?);
        return Ok(());
    }

    let rows: Vec<ThresholdRow> = Nutrient::ALL
        .iter()
        .map(|&nutrient| {
            let pair = thresholds.get(nutrient);
            ThresholdRow {
                nutrient: nutrient.name().to_string(),
                low: format_amount(nutrient, pair.low),
                high: format_amount(nutrient, pair.high),
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
