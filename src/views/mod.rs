pub mod detail;
pub mod listing;

pub use detail::{ContactLinks, Gallery, PropertyDetail};
pub use listing::{ListingView, PropertyCard};

use chrono::{DateTime, Utc};

/// `$1,250,000` for whole amounts, `$1,250.50` otherwise
pub fn format_currency(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let (sign, cents) = if cents < 0 { ("-", -cents) } else { ("", cents) };

    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match cents % 100 {
        0 => format!("{sign}${grouped}"),
        fraction => format!("{sign}${grouped}.{fraction:02}"),
    }
}

/// "March 5, 2024"
pub fn format_listed_date(at: &DateTime<Utc>) -> String {
    at.format("%B %-d, %Y").to_string()
}

/// encodeURIComponent-style escaping for link parameters
pub(crate) fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
