use anyhow::Result;

use nutricheck_core::service::NutritionService;

use super::helpers::print_nutrient_table;

pub(crate) fn cmd_check(svc: &mut NutritionService, meal: &str, json: bool) -> Result<()> {
    let report = svc.check_nutrition(meal)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for token in &report.unmatched {
        eprintln!("Note: no catalog match for '{token}' (contributed nothing)");
    }

    print_nutrient_table(&report.record.totals, &report.record.status);
    Ok(())
}
