//! Profile card rendering helpers

mod age;
mod svg;

pub use age::{Age, age_between};
pub use svg::{CardValues, RenderError, overwrite_card, tspan_texts};

/// Format an integer with `,` thousands separators.
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `format_thousands`, left-aligned in at least `width` columns.
pub fn padded_count(value: u64, width: usize) -> String {
    format!("{:<width$}", format_thousands(value as i64), width = width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_separators() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
        assert_eq!(format_thousands(-98765), "-98,765");
    }

    #[test]
    fn padded_counts() {
        assert_eq!(padded_count(12, 4), "12  ");
        assert_eq!(padded_count(12345, 2), "12,345");
    }
}
