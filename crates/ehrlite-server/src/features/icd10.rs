//! ICD-10 code format checks and the small keyword catalogue used by the
//! keyword coder.

use std::sync::LazyLock;

use regex::Regex;

// One letter, two digits, optional dot, up to four more digits.
static CODE_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][0-9]{2}\.?[0-9]{0,4}$").expect("valid ICD-10 pattern")
});

/// Returns `true` when `code` is shaped like an ICD-10 code.
///
/// This is a format check only; it does not consult a code table.
pub fn is_valid_code(code: &str) -> bool {
    CODE_FORMAT.is_match(code)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogueEntry {
    pub keyword: &'static str,
    pub code: &'static str,
    pub description: &'static str,
}

/// Keyword to code mapping, in match priority order.
pub const KEYWORD_CATALOGUE: &[CatalogueEntry] = &[
    CatalogueEntry {
        keyword: "fever",
        code: "R50.9",
        description: "Fever, unspecified",
    },
    CatalogueEntry {
        keyword: "headache",
        code: "R51",
        description: "Headache",
    },
    CatalogueEntry {
        keyword: "diabetes",
        code: "E11.9",
        description: "Type 2 diabetes mellitus without complications",
    },
    CatalogueEntry {
        keyword: "hypertension",
        code: "I10",
        description: "Essential (primary) hypertension",
    },
    CatalogueEntry {
        keyword: "cough",
        code: "R05",
        description: "Cough",
    },
];

/// Returned when no keyword matches.
pub const FALLBACK: CatalogueEntry = CatalogueEntry {
    keyword: "",
    code: "Z00.00",
    description: "General medical examination",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_codes() {
        for code in ["R05", "R50.9", "E11.9", "I10", "Z00.00", "S72.0012"] {
            assert!(is_valid_code(code), "{code} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_codes() {
        for code in ["", "r05", "R5", "RR5.0", "R50.12345", "50.9", "R50.9 "] {
            assert!(!is_valid_code(code), "{code:?} should be invalid");
        }
    }

    #[test]
    fn catalogue_codes_are_well_formed() {
        for entry in KEYWORD_CATALOGUE.iter().chain([&FALLBACK]) {
            assert!(is_valid_code(entry.code), "{}", entry.code);
        }
    }
}
