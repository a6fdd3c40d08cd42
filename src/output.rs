//! Output formatting module for costsight
//!
//! This module provides formatters for displaying cost insights in different
//! formats:
//! - Table format for human-readable terminal output
//! - JSON format for dashboards and other tools
//!
//! # Examples
//!
//! ```
//! use costsight::output::get_formatter;
//! use costsight::types::DailyDate;
//!
//! let date = DailyDate::parse("2021-09-01").unwrap();
//! assert!(get_formatter(false).format_billing_date(date).contains("2021-09-01"));
//! assert!(get_formatter(true).format_billing_date(date).contains("\"date\""));
//! ```

use colored::Colorize;
use costsight_core::aggregation_types::{
    ChangeStatistic, Cost, Entity, KeyedCostSeries, Totals,
};
use costsight_core::types::DailyDate;
use costsight_support::SupportProfiles;
use prettytable::{Cell, Row, Table, format, row};
use serde::Serialize;
use serde_json::json;

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format the daily cost of a group or project
    fn format_cost(&self, cost: &Cost) -> String;

    /// Format a product's two-period comparison
    fn format_entity(&self, entity: &Entity) -> String;

    /// Format the last complete billing date
    fn format_billing_date(&self, date: DailyDate) -> String;

    /// Format the configured support profiles
    fn format_profiles(&self, profiles: &SupportProfiles) -> String;
}

/// Table formatter for human-readable output
pub struct TableFormatter;

impl TableFormatter {
    fn format_currency(amount: f64) -> String {
        if amount < 0.0 {
            format!("-${:.2}", -amount)
        } else {
            format!("${amount:.2}")
        }
    }

    /// Signed percentage, red for growth and green for savings
    fn format_ratio(change: &ChangeStatistic) -> String {
        match change.ratio {
            Some(ratio) => {
                let text = format!("{:+.1}%", ratio * 100.0);
                if ratio > 0.0 {
                    text.red().to_string()
                } else if ratio < 0.0 {
                    text.green().to_string()
                } else {
                    text
                }
            }
            None => "n/a".dimmed().to_string(),
        }
    }

    fn format_change(change: &ChangeStatistic) -> String {
        let sign = if change.amount < 0.0 { "-" } else { "+" };
        format!(
            "{}${:.2} ({})",
            sign,
            change.amount.abs(),
            Self::format_ratio(change)
        )
    }

    fn breakdown_table(title: &str, series: &[KeyedCostSeries]) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![b -> title, b -> "Days", b -> "Cost"]);

        let mut rows: Vec<(&str, Totals)> = series
            .iter()
            .map(|s| (s.id.as_str(), Totals::from_series(&s.aggregation)))
            .collect();
        rows.sort_by(|a, b| b.1.total_cost.total_cmp(&a.1.total_cost));

        for (id, totals) in rows {
            table.add_row(row![
                id,
                r -> totals.days,
                r -> Self::format_currency(totals.total_cost)
            ]);
        }
        table.to_string()
    }
}

impl OutputFormatter for TableFormatter {
    fn format_cost(&self, cost: &Cost) -> String {
        let mut output = format!("\n=== {} ===\n", cost.id.bold());

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![b -> "Date", b -> "Cost"]);
        for point in &cost.aggregation {
            table.add_row(row![
                point.date.format("%Y-%m-%d"),
                r -> Self::format_currency(point.amount)
            ]);
        }

        let totals = Totals::from_series(&cost.aggregation);
        table.add_row(Row::new(vec![Cell::new(""); 2]));
        table.add_row(row![
            b -> format!("TOTAL ({} days)", totals.days),
            br -> Self::format_currency(totals.total_cost)
        ]);
        output.push_str(&table.to_string());

        output.push_str(&format!("\nChange: {}\n", Self::format_change(&cost.change)));
        output.push_str(&format!(
            "Trend: {} per day\n",
            Self::format_currency(cost.trendline.slope * 86_400.0)
        ));

        if let Some(grouped) = &cost.grouped_costs {
            if !grouped.product.is_empty() {
                output.push_str("\nBy product\n");
                output.push_str(&Self::breakdown_table("Product", &grouped.product));
            }
            if !grouped.project.is_empty() {
                output.push_str("\nBy project\n");
                output.push_str(&Self::breakdown_table("Project", &grouped.project));
            }
        }
        output
    }

    fn format_entity(&self, entity: &Entity) -> String {
        let mut output = format!("\n=== {} ===\n", entity.id.bold());

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![
            b -> "Entity",
            b -> "Before",
            b -> "After",
            b -> "Change",
            b -> "Ratio"
        ]);
        for item in &entity.entities {
            table.add_row(row![
                item.id,
                r -> Self::format_currency(item.aggregation[0]),
                r -> Self::format_currency(item.aggregation[1]),
                r -> Self::format_currency(item.change.amount),
                r -> Self::format_ratio(&item.change)
            ]);
        }
        table.add_row(Row::new(vec![Cell::new(""); 5]));
        table.add_row(row![
            b -> "TOTAL",
            br -> Self::format_currency(entity.aggregation[0]),
            br -> Self::format_currency(entity.aggregation[1]),
            br -> Self::format_currency(entity.change.amount),
            r -> Self::format_ratio(&entity.change)
        ]);

        output.push_str(&table.to_string());
        output
    }

    fn format_billing_date(&self, date: DailyDate) -> String {
        format!("Last complete billing date: {date}")
    }

    fn format_profiles(&self, profiles: &SupportProfiles) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![
            b -> "Account Type",
            b -> "Minimum",
            b -> "From",
            b -> "To",
            b -> "Rate"
        ]);

        for profile in profiles.iter() {
            let mut first = true;
            for tier in &profile.tiers {
                let (name, minimum) = if first {
                    (
                        profile.account_type.clone(),
                        Self::format_currency(profile.minimum),
                    )
                } else {
                    (String::new(), String::new())
                };
                first = false;

                let upper = if tier.is_unbounded() {
                    "-".to_string()
                } else {
                    Self::format_currency(tier.upper_bound)
                };
                table.add_row(row![
                    name,
                    r -> minimum,
                    r -> Self::format_currency(tier.lower_bound),
                    r -> upper,
                    r -> format!("{:.1}%", tier.rate * 100.0)
                ]);
            }
        }
        table.to_string()
    }
}

/// JSON formatter for machine-readable output
///
/// Structures serialize in the camelCase shape dashboards consume.
pub struct JsonFormatter;

impl JsonFormatter {
    fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string_pretty(value)
            .unwrap_or_else(|e| json!({ "error": e.to_string() }).to_string())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_cost(&self, cost: &Cost) -> String {
        Self::to_json(cost)
    }

    fn format_entity(&self, entity: &Entity) -> String {
        Self::to_json(entity)
    }

    fn format_billing_date(&self, date: DailyDate) -> String {
        Self::to_json(&json!({ "date": date }))
    }

    fn format_profiles(&self, profiles: &SupportProfiles) -> String {
        Self::to_json(profiles)
    }
}

/// Get appropriate formatter based on JSON flag
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use costsight_core::aggregation_types::{
        DateAggregation, EntityAggregation, GroupedCosts, Trendline,
    };

    fn date(s: &str) -> DailyDate {
        DailyDate::parse(s).unwrap()
    }

    fn sample_cost() -> Cost {
        Cost {
            id: "default-group".to_string(),
            format: "number".to_string(),
            aggregation: vec![
                DateAggregation {
                    date: date("2021-01-01"),
                    amount: 10.0,
                },
                DateAggregation {
                    date: date("2021-01-02"),
                    amount: 12.5,
                },
            ],
            change: ChangeStatistic {
                ratio: Some(0.25),
                amount: 2.5,
            },
            trendline: Trendline {
                slope: 2.5 / 86_400.0,
                intercept: 0.0,
            },
            grouped_costs: Some(GroupedCosts {
                product: vec![KeyedCostSeries {
                    id: "AWS Lambda".to_string(),
                    aggregation: vec![DateAggregation {
                        date: date("2021-01-01"),
                        amount: 4.0,
                    }],
                }],
                project: Vec::new(),
            }),
        }
    }

    fn sample_entity() -> Entity {
        Entity {
            id: "EC2".to_string(),
            aggregation: [10.0, 5.0],
            change: ChangeStatistic {
                ratio: Some(-0.5),
                amount: -5.0,
            },
            entities: vec![EntityAggregation {
                id: "Product$api".to_string(),
                aggregation: [10.0, 5.0],
                change: ChangeStatistic {
                    ratio: Some(-0.5),
                    amount: -5.0,
                },
            }],
        }
    }

    #[test]
    fn test_currency_formatting() {
        assert_eq!(TableFormatter::format_currency(12.345), "$12.35");
        assert_eq!(TableFormatter::format_currency(0.0), "$0.00");
        assert_eq!(TableFormatter::format_currency(-5.0), "-$5.00");
    }

    #[test]
    fn test_ratio_formatting() {
        let up = ChangeStatistic {
            ratio: Some(0.125),
            amount: 1.0,
        };
        assert!(TableFormatter::format_ratio(&up).contains("+12.5%"));

        let down = ChangeStatistic {
            ratio: Some(-0.5),
            amount: -1.0,
        };
        assert!(TableFormatter::format_ratio(&down).contains("-50.0%"));

        assert!(TableFormatter::format_ratio(&ChangeStatistic::default()).contains("n/a"));
    }

    #[test]
    fn test_table_formatter_cost() {
        let output = TableFormatter.format_cost(&sample_cost());
        assert!(output.contains("2021-01-02"));
        assert!(output.contains("$22.50"));
        assert!(output.contains("TOTAL (2 days)"));
        assert!(output.contains("+$2.50"));
        assert!(output.contains("$2.50 per day"));
        assert!(output.contains("AWS Lambda"));
        assert!(!output.contains("By project"));
    }

    #[test]
    fn test_table_formatter_entity() {
        let output = TableFormatter.format_entity(&sample_entity());
        assert!(output.contains("Product$api"));
        assert!(output.contains("-$5.00"));
        assert!(output.contains("-50.0%"));
    }

    #[test]
    fn test_table_formatter_profiles() {
        let output = TableFormatter.format_profiles(&SupportProfiles::aws_defaults());
        assert!(output.contains("BUSINESS"));
        assert!(output.contains("$15000.00"));
        assert!(output.contains("10.0%"));
    }

    #[test]
    fn test_json_formatter_cost() {
        let output = JsonFormatter.format_cost(&sample_cost());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["id"], "default-group");
        assert_eq!(value["aggregation"][1]["amount"], 12.5);
        assert_eq!(value["groupedCosts"]["product"][0]["id"], "AWS Lambda");
        assert!(value["groupedCosts"].get("project").is_none());
    }

    #[test]
    fn test_json_formatter_entity_and_date() {
        let value: serde_json::Value =
            serde_json::from_str(&JsonFormatter.format_entity(&sample_entity())).unwrap();
        assert_eq!(value["aggregation"][1], 5.0);
        assert_eq!(value["entities"][0]["change"]["ratio"], -0.5);

        let value: serde_json::Value =
            serde_json::from_str(&JsonFormatter.format_billing_date(date("2021-09-01"))).unwrap();
        assert_eq!(value["date"], "2021-09-01");
    }

    #[test]
    fn test_get_formatter() {
        let profiles = SupportProfiles::aws_defaults();
        assert!(get_formatter(true).format_profiles(&profiles).contains("\"accountType\""));
        assert!(get_formatter(false).format_profiles(&profiles).contains("DEVELOPER"));
    }
}
