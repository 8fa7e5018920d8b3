use serde::{Deserialize, Serialize};

use crate::config::Config;

/// ISO 4217 currency representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display symbol and whether a space separates it from the digits.
    pub fn symbol(&self) -> (String, bool) {
        match self.as_str() {
            "NPR" => ("Rs.".into(), true),
            "INR" => ("₹".into(), false),
            "USD" => ("$".into(), false),
            "EUR" => ("€".into(), false),
            other => (other.to_string(), true),
        }
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("NPR")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NegativeStyle {
    Sign,
    Parentheses,
}

/// Digit grouping: `1,234,567` or the lakh/crore style `12,34,567`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GroupingStyle {
    Western,
    SouthAsian,
}

impl GroupingStyle {
    pub fn for_locale(locale: &str) -> Self {
        let language = locale.split(['-', '_']).next().unwrap_or_default();
        if matches!(language, "ne" | "hi") || locale.eq_ignore_ascii_case("en-IN") {
            GroupingStyle::SouthAsian
        } else {
            GroupingStyle::Western
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormatOptions {
    pub currency: CurrencyCode,
    pub grouping: GroupingStyle,
    pub negative_style: NegativeStyle,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            currency: CurrencyCode::default(),
            grouping: GroupingStyle::SouthAsian,
            negative_style: NegativeStyle::Sign,
        }
    }
}

impl FormatOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            currency: CurrencyCode::new(config.currency.clone()),
            grouping: GroupingStyle::for_locale(&config.locale),
            negative_style: NegativeStyle::Sign,
        }
    }
}

/// Formats `amount` with two decimals, currency symbol and grouping.
pub fn format_amount(amount: f64, options: &FormatOptions) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let negative = amount < 0.0 && cents > 0;
    let digits = group_digits(cents / 100, options.grouping);
    let (symbol, spaced) = options.currency.symbol();
    let separator = if spaced { " " } else { "" };
    let body = format!("{symbol}{separator}{digits}.{:02}", cents % 100);
    match (negative, options.negative_style) {
        (false, _) => body,
        (true, NegativeStyle::Sign) => format!("-{body}"),
        (true, NegativeStyle::Parentheses) => format!("({body})"),
    }
}

fn group_digits(value: u64, style: GroupingStyle) -> String {
    let raw = value.to_string();
    if raw.len() <= 3 {
        return raw;
    }
    let (head, tail) = raw.split_at(raw.len() - 3);
    let chunk = match style {
        GroupingStyle::Western => 3,
        GroupingStyle::SouthAsian => 2,
    };
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(chunk);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}
