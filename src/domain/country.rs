use serde::Serialize;

/// A selectable billing country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Country {
    /// ISO 3166-1 alpha-2 code.
    pub code: &'static str,
    pub name: &'static str,
    /// International dialing prefix, including the leading '+'.
    pub dialing_code: &'static str,
}

const COUNTRIES: &[Country] = &[
    Country { code: "AE", name: "United Arab Emirates", dialing_code: "+971" },
    Country { code: "AR", name: "Argentina", dialing_code: "+54" },
    Country { code: "AT", name: "Austria", dialing_code: "+43" },
    Country { code: "AU", name: "Australia", dialing_code: "+61" },
    Country { code: "BE", name: "Belgium", dialing_code: "+32" },
    Country { code: "BR", name: "Brazil", dialing_code: "+55" },
    Country { code: "CA", name: "Canada", dialing_code: "+1" },
    Country { code: "CH", name: "Switzerland", dialing_code: "+41" },
    Country { code: "CN", name: "China", dialing_code: "+86" },
    Country { code: "CZ", name: "Czechia", dialing_code: "+420" },
    Country { code: "DE", name: "Germany", dialing_code: "+49" },
    Country { code: "DK", name: "Denmark", dialing_code: "+45" },
    Country { code: "EG", name: "Egypt", dialing_code: "+20" },
    Country { code: "ES", name: "Spain", dialing_code: "+34" },
    Country { code: "FI", name: "Finland", dialing_code: "+358" },
    Country { code: "FR", name: "France", dialing_code: "+33" },
    Country { code: "GB", name: "United Kingdom", dialing_code: "+44" },
    Country { code: "GR", name: "Greece", dialing_code: "+30" },
    Country { code: "HK", name: "Hong Kong", dialing_code: "+852" },
    Country { code: "IE", name: "Ireland", dialing_code: "+353" },
    Country { code: "IL", name: "Israel", dialing_code: "+972" },
    Country { code: "IN", name: "India", dialing_code: "+91" },
    Country { code: "IT", name: "Italy", dialing_code: "+39" },
    Country { code: "JP", name: "Japan", dialing_code: "+81" },
    Country { code: "KR", name: "South Korea", dialing_code: "+82" },
    Country { code: "LU", name: "Luxembourg", dialing_code: "+352" },
    Country { code: "MX", name: "Mexico", dialing_code: "+52" },
    Country { code: "NL", name: "Netherlands", dialing_code: "+31" },
    Country { code: "NO", name: "Norway", dialing_code: "+47" },
    Country { code: "NZ", name: "New Zealand", dialing_code: "+64" },
    Country { code: "PL", name: "Poland", dialing_code: "+48" },
    Country { code: "PT", name: "Portugal", dialing_code: "+351" },
    Country { code: "RO", name: "Romania", dialing_code: "+40" },
    Country { code: "SA", name: "Saudi Arabia", dialing_code: "+966" },
    Country { code: "SE", name: "Sweden", dialing_code: "+46" },
    Country { code: "SG", name: "Singapore", dialing_code: "+65" },
    Country { code: "TR", name: "Turkey", dialing_code: "+90" },
    Country { code: "US", name: "United States", dialing_code: "+1" },
    Country { code: "ZA", name: "South Africa", dialing_code: "+27" },
];

/// The ordered country picker.
///
/// Position 0 is reserved for the placeholder entry and never maps to a
/// country; positions `1..=len` map to the entries in order.
#[derive(Debug, Clone)]
pub struct CountryList {
    placeholder: String,
    countries: Vec<Country>,
}

impl CountryList {
    pub const PLACEHOLDER_POSITION: usize = 0;

    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            countries: COUNTRIES.to_vec(),
        }
    }

    pub fn with_countries(placeholder: impl Into<String>, countries: Vec<Country>) -> Self {
        Self {
            placeholder: placeholder.into(),
            countries,
        }
    }

    /// Number of positions, placeholder included.
    pub fn len(&self) -> usize {
        self.countries.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn at(&self, position: usize) -> Option<&Country> {
        position.checked_sub(1).and_then(|i| self.countries.get(i))
    }

    pub fn by_code(&self, code: &str) -> Option<&Country> {
        self.countries.iter().find(|c| c.code == code)
    }

    /// Picker position of a country code, or the placeholder position.
    pub fn position_of(&self, code: &str) -> usize {
        self.countries
            .iter()
            .position(|c| c.code == code)
            .map(|i| i + 1)
            .unwrap_or(Self::PLACEHOLDER_POSITION)
    }

    /// Display labels for every position, placeholder first.
    pub fn labels(&self) -> Vec<String> {
        std::iter::once(self.placeholder.clone())
            .chain(self.countries.iter().map(|c| c.name.to_string()))
            .collect()
    }
}

impl Default for CountryList {
    fn default() -> Self {
        Self::new("Country")
    }
}
