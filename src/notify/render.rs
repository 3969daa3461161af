use std::fmt::Write;

use time::{macros::format_description, Date};

use crate::dates::parse_date;
use crate::upstream::{DailyMeals, ShoppingGap};

fn long_date(date: Date) -> String {
    date.format(format_description!("[month repr:long] [day padding:none], [year]"))
        .unwrap_or_else(|_| date.to_string())
}

fn day_heading(raw: &str) -> String {
    match parse_date(raw) {
        Some(d) => format!("{}, {}", d.weekday(), long_date(d)),
        None => raw.to_string(),
    }
}

/// Slack mrkdwn body for one week's plan.
pub(crate) fn render_meal_plan(
    week_start: Date,
    days: &[DailyMeals],
    gaps: &[ShoppingGap],
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        ":spiral_calendar_pad: *Meal plan for the week of {}*",
        long_date(week_start)
    );

    for day in days {
        let _ = writeln!(out);
        let _ = writeln!(out, "*{}*", day_heading(&day.date));
        for (label, meal) in [
            ("Breakfast", &day.breakfast),
            ("Lunch", &day.lunch),
            ("Dinner", &day.dinner),
        ] {
            let _ = writeln!(out, "• {label}: {} _({})_", meal.title, meal.ingredients_summary);
        }
    }

    if !gaps.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, ":shopping_trolley: *Missing ingredients*");
        for gap in gaps {
            let _ = write!(out, "• {} ({})", gap.ingredient, gap.quantity_needed);
            if !gap.used_for_meals.is_empty() {
                let _ = write!(out, " for {}", gap.used_for_meals.join(", "));
            }
            let _ = writeln!(out);
        }
    }

    out.trim_end().to_string()
}
