//! Amount-in-words rendering for printed documents
//!
//! Produces the English wording used on invoices and returns, e.g.
//! `SAR One Thousand, Two Hundred And Thirty Four and Fifty Halala only.`
//!
//! Grouping follows the short scale (thousand, million, billion, ...). A
//! remainder below one hundred is joined to the preceding group with "and",
//! larger remainders with a comma. Every word is title-cased.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::money::{Currency, MoneyError};

const ONES: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

const SCALES: [&str; 9] = [
    "",
    "thousand",
    "million",
    "billion",
    "trillion",
    "quadrillion",
    "quintillion",
    "sextillion",
    "septillion",
];

/// Spells out `amount` in `currency`, always using its absolute value.
///
/// The amount is rounded to the currency's precision first; the fractional
/// part is spelled out separately with the currency's minor unit name.
///
/// # Errors
///
/// Returns `MoneyError::Overflow` for amounts beyond the septillions.
pub fn money_in_words(amount: Decimal, currency: Currency) -> Result<String, MoneyError> {
    let dp = currency.decimal_places();
    let rounded = amount.abs().round_dp(dp);

    let main = rounded.trunc();
    let fraction = ((rounded - main) * Decimal::from(10_u64.pow(dp))).round();

    let main = main.to_u128().ok_or(MoneyError::Overflow)?;
    let fraction = fraction.to_u128().ok_or(MoneyError::Overflow)?;

    let mut out = if main == 0 && fraction == 0 {
        format!("{} Zero", currency.code())
    } else if main == 0 {
        format!("{} {}", title_case(&in_words(fraction)?), currency.fraction_unit())
    } else {
        let mut text = format!("{} {}", currency.code(), title_case(&in_words(main)?));
        if fraction > 0 {
            text.push_str(&format!(
                " and {} {}",
                title_case(&in_words(fraction)?),
                currency.fraction_unit()
            ));
        }
        text
    };

    out.push_str(" only.");
    Ok(out)
}

/// Spells out a non-negative integer in lower-case English words.
pub fn in_words(number: u128) -> Result<String, MoneyError> {
    if number == 0 {
        return Ok(ONES[0].to_string());
    }

    let mut groups = Vec::new();
    let mut rest = number;
    while rest > 0 {
        groups.push((rest % 1000) as u16);
        rest /= 1000;
    }
    if groups.len() > SCALES.len() {
        return Err(MoneyError::Overflow);
    }

    let mut out = String::new();
    for (scale, group) in groups.iter().enumerate().rev() {
        if *group == 0 {
            continue;
        }

        let mut chunk = below_thousand(*group);
        if scale > 0 {
            chunk.push(' ');
            chunk.push_str(SCALES[scale]);
        }

        if !out.is_empty() {
            // Only the last group can be joined with "and"
            if scale == 0 && *group < 100 {
                out.push_str(" and ");
            } else {
                out.push_str(", ");
            }
        }
        out.push_str(&chunk);
    }

    Ok(out)
}

fn below_thousand(n: u16) -> String {
    let hundreds = n / 100;
    let rest = n % 100;

    match (hundreds, rest) {
        (0, r) => below_hundred(r),
        (h, 0) => format!("{} hundred", ONES[h as usize]),
        (h, r) => format!("{} hundred and {}", ONES[h as usize], below_hundred(r)),
    }
}

fn below_hundred(n: u16) -> String {
    if n < 20 {
        return ONES[n as usize].to_string();
    }
    let tens = TENS[(n / 10) as usize];
    match n % 10 {
        0 => tens.to_string(),
        unit => format!("{} {}", tens, ONES[unit as usize]),
    }
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
