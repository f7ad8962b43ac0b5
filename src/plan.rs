//! Purchase Plan

use std::{fmt::Write as _, io};

use decimal_percentage::Percentage;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::solution::{PathStep, Solution};

/// Errors that can occur when writing a purchase plan.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Amount does not fit in the currency's minor units.
    #[error("amount {amount} is out of range for display")]
    AmountOutOfRange {
        /// The offending amount
        amount: Decimal,
    },

    /// IO error
    #[error("IO error")]
    IO,
}

/// Human-readable view of a [`Solution`]: what to buy from whom.
#[derive(Debug, Clone, Copy)]
pub struct PurchasePlan<'a> {
    solution: &'a Solution,
    currency: &'static Currency,
    color: bool,
}

impl<'a> PurchasePlan<'a> {
    /// Plan for `solution`, displayed in euros without terminal colours.
    pub fn new(solution: &'a Solution) -> Self {
        Self {
            solution,
            currency: iso::EUR,
            color: false,
        }
    }

    /// Display amounts in `currency`. No conversion is applied.
    #[must_use]
    pub fn with_currency(mut self, currency: &'static Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Emit ANSI colours for terminal output.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Shipping as a fraction of the total cost.
    pub fn shipping_share(&self) -> Percentage {
        let total = self.solution.total_cost();

        if total.is_zero() {
            return Percentage::from(0.0);
        }

        Percentage::from(self.solution.shipping_total() / total)
    }

    /// Writes the plan table followed by its summary.
    ///
    /// # Errors
    ///
    /// Returns an error if an amount cannot be displayed or the writer fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), PlanError> {
        if self.solution.is_empty() {
            return writeln!(out, "Nothing to buy.").map_err(|_err| PlanError::IO);
        }

        let mut builder = Builder::default();

        builder.push_record(["", "Item", "Seller", "Country", "Price", "Shipping", "Link"]);

        let mut seller_boundary_rows: SmallVec<[usize; 16]> = SmallVec::new();
        let mut row = 1;
        let mut position = 0;

        for assignment in self.solution.assignments() {
            seller_boundary_rows.push(row);

            for step in self
                .solution
                .steps()
                .iter()
                .filter(|step| step.seller == assignment.seller)
            {
                position += 1;
                builder.push_record(self.step_cells(position, step)?);
                row += 1;
            }
        }

        self.write_table(&mut out, builder, &seller_boundary_rows)?;
        self.write_summary(&mut out)
    }

    /// Renders the plan to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if an amount cannot be displayed.
    pub fn render(&self) -> Result<String, PlanError> {
        let mut buf = Vec::new();

        self.write_to(&mut buf)?;

        String::from_utf8(buf).map_err(|_err| PlanError::IO)
    }

    fn step_cells(&self, position: usize, step: &PathStep) -> Result<[String; 7], PlanError> {
        Ok([
            format!("#{position:<3}"),
            step.item_name.clone(),
            step.seller.clone(),
            step.country.to_string(),
            self.money(step.price)?,
            self.money(step.shipping)?,
            step.link.clone().unwrap_or_default(),
        ])
    }

    fn money(&self, amount: Decimal) -> Result<String, PlanError> {
        let minor = amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|value| value.round_dp(0).to_i64())
            .ok_or(PlanError::AmountOutOfRange { amount })?;

        Ok(format!("{}", Money::from_minor(minor, self.currency)))
    }

    fn write_table(
        &self,
        out: &mut impl io::Write,
        builder: Builder,
        seller_boundary_rows: &[usize],
    ) -> Result<(), PlanError> {
        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());
        let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

        theme.remove_horizontal_lines();
        theme.insert_horizontal_line(1, separator);

        for &row in seller_boundary_rows {
            if row > 1 {
                theme.insert_horizontal_line(row, separator);
            }
        }

        table.with(theme);
        table.modify(Columns::new(4..6), Alignment::right());

        let table_str = if self.color {
            table.modify(Rows::first(), Color::BOLD);

            colorize_borders(&table.to_string())
        } else {
            table.to_string()
        };

        writeln!(out, "\n{table_str}").map_err(|_err| PlanError::IO)
    }

    fn write_summary(&self, out: &mut impl io::Write) -> Result<(), PlanError> {
        let share = percent_points(self.shipping_share());

        let lines = [
            (" Goods:", self.money(self.solution.goods_total())?),
            (
                " Shipping:",
                format!("({share:.2}%) {}", self.money(self.solution.shipping_total())?),
            ),
            (" Total:", self.money(self.solution.total_cost())?),
        ];

        let label_width = lines.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        let value_width = lines.iter().map(|(_, value)| value.len()).max().unwrap_or(0);

        for (label, value) in &lines {
            let value = if self.color && *label == " Total:" {
                format!("\x1b[1m{value:>value_width$}\x1b[0m")
            } else {
                format!("{value:>value_width$}")
            };

            writeln!(out, "{label:>label_width$}  {value}  ").map_err(|_err| PlanError::IO)?;
        }

        let excluded = self.solution.excluded_sellers();

        if !excluded.is_empty() {
            writeln!(
                out,
                "\n {} seller(s) skipped for lack of shipping: {}",
                excluded.len(),
                excluded.join(", ")
            )
            .map_err(|_err| PlanError::IO)?;
        }

        writeln!(out).map_err(|_err| PlanError::IO)
    }
}

/// Converts a fractional percentage to percent points for display.
fn percent_points(percentage: Percentage) -> Decimal {
    ((percentage * Decimal::ONE) * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Wraps runs of box-drawing characters (U+2500..U+257F) in ANSI dark-grey escape codes.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            _ = out.write_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            _ = out.write_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        _ = out.write_str("\x1b[0m");
    }

    out
}
