//! Report rendering for every view. Pure: renders already-fetched data and
//! never touches the store.

use chrono::{Datelike, NaiveDate};

use crate::ledger::{capitalize, CategoryTotals};
use crate::store::Record;

/// Render an amount the way the chat shows numbers: integral values drop the
/// decimal point, everything else prints as-is.
pub fn format_amount(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// One line per category in fixed order: `"Vegetables 0\n…Coffee 0\n"`.
pub fn totals_table(totals: &CategoryTotals) -> String {
    let mut out = String::new();
    for (category, value) in totals.iter() {
        out.push_str(&capitalize(category));
        out.push(' ');
        out.push_str(&format_amount(value));
        out.push('\n');
    }
    out
}

/// Shown when the yesterday view has nothing to report.
pub fn no_records() -> &'static str {
    "There are not records yet!. Eat healthy my friend!"
}

/// Bullet list of today's meals: handler code then meal name.
pub fn meals_list(records: &[Record]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&format!(
            "• {} {}\n",
            record.text("Handler").unwrap_or_default(),
            record.text("Meal").unwrap_or_default()
        ));
    }
    out
}

/// Vitals lines: `` • `M/D` => <Weight>/<Fat> `` with no zero padding on the
/// month or day. Records whose date does not parse are skipped.
pub fn vitals_list(records: &[Record]) -> String {
    let mut out = String::new();
    for record in records {
        let date = record
            .text("Date")
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
        let Some(date) = date else { continue };
        let weight = record.number("Weight").unwrap_or(0.0);
        let fat = record.number("Fat").unwrap_or(0.0);
        out.push_str(&format!(
            "• `{}/{}` => {}/{}\n",
            date.month(),
            date.day(),
            format_amount(weight),
            format_amount(fat)
        ));
    }
    out
}

/// Confirmation after a successful delete.
pub fn deleted(meal_name: &str) -> String {
    format!("Record \"{meal_name}\" was Deleted.")
}

/// Confirmation after a successful add.
pub fn added(meal_name: &str) -> String {
    format!("Added \"{meal_name}\" to PSAS Meals.")
}

/// Whole-add rejection naming the bad token.
pub fn invalid_category(token: &str) -> String {
    format!("\"{token}\" is not a valid category. Nothing was posted.")
}

/// Fixed usage text for the help view.
pub fn help_text() -> &'static str {
    "Valid commands: `add`, `today`, `meals`, and `help`.\n\
     • To add a new entry: `/psas add \"meal name\", cat amt, cat amt,`\n\
     • To get today's totals: `/psas today`\n\
     • To get today's meals: `/psas meals`\n\
     • To delete meal: `/psas delete \"4-digit code\"`\n\
     • To get Vitals: `/psas vitals`\n\
     • To get Yesterday entries: `/psas yesterday`\n"
}

/// Fixed reply for unrecognised commands.
pub fn unknown_text() -> &'static str {
    "Wow, I missed that. Valid commands: `add`, `today`, `meals`, and `help`"
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_totals_table_lists_every_category_in_order() {
        let table = totals_table(&CategoryTotals::zero());
        assert_eq!(
            table,
            "Vegetables 0\nFruits 0\nMilk 0\nFlour 0\nMeat 0\nBeans 0\nOil 0\nSugar 0\nAlcohol 0\nExercise 0\nCoffee 0\n"
        );
    }

    #[test]
    fn totals_print_without_trailing_decimals() {
        assert_eq!(format_amount(3.0), "3");
        assert_eq!(format_amount(2.5), "2.5");
        assert_eq!(format_amount(f64::NAN), "NaN");
    }

    #[test]
    fn meals_list_bullets_handler_and_name() {
        let record: Record = serde_json::from_value(json!({
            "id": "rec1",
            "fields": {"Handler": "AB12", "Meal": "Pasta"}
        }))
        .unwrap();
        assert_eq!(meals_list(&[record]), "• AB12 Pasta\n");
    }

    #[test]
    fn vitals_lines_use_unpadded_month_and_day() {
        let record: Record = serde_json::from_value(json!({
            "id": "rec1",
            "fields": {"Date": "2026-03-05", "Weight": 80.5, "Fat": 21}
        }))
        .unwrap();
        assert_eq!(vitals_list(&[record]), "• `3/5` => 80.5/21\n");
    }

    #[test]
    fn confirmations_name_the_meal() {
        assert_eq!(deleted("Pasta"), "Record \"Pasta\" was Deleted.");
        assert_eq!(added("Oatmeal"), "Added \"Oatmeal\" to PSAS Meals.");
        assert_eq!(
            invalid_category("cookies"),
            "\"cookies\" is not a valid category. Nothing was posted."
        );
    }

    #[test]
    fn help_text_enumerates_all_commands() {
        let help = help_text();
        for needle in ["add", "today", "meals", "delete", "vitals", "yesterday"] {
            assert!(help.contains(needle), "missing {needle}");
        }
    }
}
