use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Navigable page sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppSection {
    Home,
    Catalog,
    Booking,
    Quote,
    Contact,
}

impl AppSection {
    pub const ALL: [AppSection; 5] = [
        AppSection::Home,
        AppSection::Catalog,
        AppSection::Booking,
        AppSection::Quote,
        AppSection::Contact,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppSection::Home => "home",
            AppSection::Catalog => "catalog",
            AppSection::Booking => "booking",
            AppSection::Quote => "quote",
            AppSection::Contact => "contact",
        }
    }
}

impl fmt::Display for AppSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppSection {
    type Err = String;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        AppSection::ALL
            .into_iter()
            .find(|section| section.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unknown section {needle:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Booking".parse::<AppSection>(), Ok(AppSection::Booking));
        assert_eq!(" quote ".parse::<AppSection>(), Ok(AppSection::Quote));
        assert!("pricing".parse::<AppSection>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&AppSection::Catalog).unwrap(),
            "\"catalog\""
        );
    }
}
