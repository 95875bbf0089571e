use anyhow::Result;
use serde::Serialize;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutricheck_core::service::NutritionService;

use super::helpers::{format_logged_at, print_nutrient_table};

pub(crate) fn cmd_weekly(svc: &NutritionService, json: bool) -> Result<()> {
    let weekly = svc.weekly_summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&weekly)?);
        return Ok(());
    }

    if weekly.meal_count == 0 {
        eprintln!("No meals logged yet");
        process::exit(2);
    }

    let count = weekly.meal_count;
    println!("=== Weekly summary ({count} meals) ===\n");
    print_nutrient_table(&weekly.totals, &weekly.status);
    Ok(())
}

pub(crate) fn cmd_history(svc: &NutritionService, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct HistoryRow {
        #[tabled(rename = "Logged")]
        logged: String,
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

    let records = svc.records();

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        eprintln!("No meals logged yet");
        process::exit(2);
    }

    let rows: Vec<HistoryRow> = records
        .iter()
        .map(|r| {
            let t = &r.totals;
            HistoryRow {
                logged: format_logged_at(&r.logged_at),
                calories: format!("{:.0}", t.calories),
                protein: format!("{:.1}g", t.protein),
                fat: format!("{:.1}g", t.fat),
                carbs: format!("{:.1}g", t.carbohydrates),
                fiber: format!("{:.1}g", t.fiber),
                sugar: format!("{:.1}g", t.sugar),
                sodium: format!("{:.1}mg", t.sodium),
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

pub(crate) fn cmd_clear(svc: &mut NutritionService, json: bool) -> Result<()> {
    #[derive(Serialize)]
    struct ClearResult {
        cleared: bool,
        records_removed: usize,
    }

    let removed = svc.clear_history()?;

    if json {
        let result = ClearResult {
            cleared: true,
            records_removed: removed,
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Cleared {removed} logged meal(s)");
    Ok(())
}
