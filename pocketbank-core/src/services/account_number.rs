//! Account number generation

use chrono::{Local, NaiveDate};
use rand::Rng;

use crate::domain::result::Result;
use crate::domain::AccountNumber;
use crate::ports::AccountNumberGenerator;

/// Generates `YYYYMMDD` + six random digits (100000-999999).
///
/// Roughly one in 900,000 candidates collides with another account opened
/// the same day; registration retries on collision.
#[derive(Debug, Clone, Default)]
pub struct DateRandomGenerator {
    fixed_date: Option<NaiveDate>,
}

impl DateRandomGenerator {
    /// Use the local date at generation time
    pub fn new() -> Self {
        Self { fixed_date: None }
    }

    /// Always use the given date component
    pub fn with_date(date: NaiveDate) -> Self {
        Self {
            fixed_date: Some(date),
        }
    }
}

impl AccountNumberGenerator for DateRandomGenerator {
    fn generate(&self) -> Result<AccountNumber> {
        let date = self
            .fixed_date
            .unwrap_or_else(|| Local::now().date_naive());
        let suffix: u32 = rand::thread_rng().gen_range(100_000..=999_999);
        AccountNumber::from_parts(date, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ACCOUNT_NUMBER_LEN;

    #[test]
    fn test_generated_format() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let generator = DateRandomGenerator::with_date(date);

        for _ in 0..200 {
            let number = generator.generate().unwrap();
            let s = number.as_str();
            assert_eq!(s.len(), ACCOUNT_NUMBER_LEN);
            assert!(s.starts_with("20241231"));
            let suffix: u32 = s[8..].parse().unwrap();
            assert!((100_000..=999_999).contains(&suffix));
        }
    }

    #[test]
    fn test_uses_today_by_default() {
        let before = Local::now().date_naive().format("%Y%m%d").to_string();
        let number = DateRandomGenerator::new().generate().unwrap();
        let after = Local::now().date_naive().format("%Y%m%d").to_string();
        // Either read is fine if the test straddles midnight
        assert!(number.as_str().starts_with(&before) || number.as_str().starts_with(&after));
    }
}
