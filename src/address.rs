//! Heuristic decomposition of free-text addresses
//!
//! The roster prints street, city, state, and zip run together in one column.
//! Decomposition peels the state/zip off the end, then splits street from city
//! using, in order: mail-routing markers, the last comma, PO Box shapes, and a
//! street-suffix scan. The split is best effort; inputs like "Avenue B" or
//! embedded corporate mail codes can land on the wrong side and are accepted
//! as residual error rather than guessed around.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// The four components of a decomposed address. Any may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// Trailing `STATE ZIP` (2-letter state, 5-digit or ZIP+4).
static STATE_ZIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([A-Z]{2})\s+(\d{5}(?:-\d{4})?)$").unwrap());

/// Corporate mail-routing markers: "ATTN ...", "Attn: ...", "MC 1234".
static ATTN_MC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+(attn:?|mc\s*\d)").unwrap());

/// "street? [PO] Box NNN city"
static BOX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.*?)\s*((?:PO\s+)?Box\s+\d+)\s+(.+)$").unwrap());

/// A simple capitalized word, the most likely city name after a mail code.
static CAP_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][a-z]+$").unwrap());

/// Unit/suite designators that consume a following short number or letter.
static UNIT_NUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#?\d+[A-Za-z]?|[A-Za-z])$").unwrap());

/// Words that can end a street portion.
static STREET_SUFFIXES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "st", "st.", "street", "ave", "ave.", "avenue", "rd", "rd.", "road", "dr", "dr.", "drive",
        "ln", "ln.", "lane", "ct", "ct.", "court", "blvd", "blvd.", "boulevard", "way", "pl",
        "pl.", "place", "cir", "cir.", "circle", "hwy", "hwy.", "highway", "pkwy", "pkwy.",
        "parkway", "ter", "ter.", "terrace", "trl", "trl.", "trail", "ste", "suite", "unit",
        "apt", "apt.", "floor", "fl", "fl.", "room", "rm", "rm.", "#",
    ]
    .into_iter()
    .collect()
});

/// Designators that take a trailing unit token ("Ste 110", "Hwy 15", "Apt B").
const UNIT_WORDS: &[&str] = &[
    "ste", "suite", "unit", "apt", "room", "rm", "floor", "fl", "hwy", "highway", "route", "rt",
];

/// Split a raw address into street, city, state, and zip.
///
/// Returns partial results rather than failing: with no recognizable state/zip
/// tail, the whole input is treated as street.
pub fn decompose_address(raw: &str) -> AddressParts {
    let mut parts = AddressParts::default();
    let raw = raw.trim();
    if raw.is_empty() {
        return parts;
    }

    let Some(caps) = STATE_ZIP_RE.captures(raw) else {
        parts.street = raw.to_string();
        return parts;
    };
    parts.state = caps[1].to_string();
    parts.zip = caps[2].to_string();

    let tail_start = caps.get(0).map_or(raw.len(), |w| w.start());
    let street_city = raw[..tail_start].trim().trim_end_matches(',').trim();
    if street_city.is_empty() {
        return parts;
    }

    // Mail-routing info: street before the marker, city is the last plain
    // place-name word after it
    if let Some(attn) = ATTN_MC_RE.find(street_city) {
        parts.street = street_city[..attn.start()].trim().to_string();
        let words: Vec<&str> = street_city.split_whitespace().collect();
        for word in words.iter().rev() {
            if CAP_WORD_RE.is_match(word) {
                parts.city = word.to_string();
                return parts;
            }
        }
        if let Some(last) = words.last() {
            parts.city = last.to_string();
        }
        return parts;
    }

    // Comma-formatted addresses: city is whatever follows the last comma
    if let Some(idx) = street_city.rfind(',') {
        parts.street = street_city[..idx].trim().trim_end_matches(',').to_string();
        parts.city = street_city[idx + 1..].trim().to_string();
        return parts;
    }

    // "Street Address [PO] Box XXX City": the box belongs to the street
    if let Some(caps) = BOX_RE.captures(street_city) {
        let street_part = caps[1].trim();
        let box_part = &caps[2];
        parts.street = if street_part.is_empty() {
            box_part.to_string()
        } else {
            format!("{street_part} {box_part}")
        };
        parts.city = caps[3].trim().to_string();
        return parts;
    }

    // Last street suffix ends the street; the remainder is city
    let words: Vec<&str> = street_city.split_whitespace().collect();
    let mut street_end: Option<usize> = None;
    for (i, word) in words.iter().enumerate() {
        let lower = word.to_lowercase();
        let lower = lower.trim_end_matches([',', '.']);
        if STREET_SUFFIXES.contains(lower) {
            street_end = Some(i);
        }
        if UNIT_WORDS.contains(&lower) {
            // Pull the unit token after it ("Ste A", "Suite 100", "Hwy 15")
            if let Some(next) = words.get(i + 1) {
                if UNIT_NUM_RE.is_match(next) {
                    street_end = Some(i + 1);
                }
            }
        }
    }

    match street_end {
        Some(i) if i < words.len() - 1 => {
            parts.street = words[..=i].join(" ");
            parts.city = words[i + 1..].join(" ");
        }
        _ => {
            // Fallback: last word before the state is the city
            if words.len() > 1 {
                parts.street = words[..words.len() - 1].join(" ");
                parts.city = words[words.len() - 1].to_string();
            } else {
                parts.city = street_city.to_string();
            }
        }
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_delimited_address() {
        let parts = decompose_address("123 MAIN ST, LINCOLN, NE 68508");
        assert_eq!(parts.street, "123 MAIN ST");
        assert_eq!(parts.city, "LINCOLN");
        assert_eq!(parts.state, "NE");
        assert_eq!(parts.zip, "68508");
    }

    #[test]
    fn test_suffix_split_without_commas() {
        let parts = decompose_address("2809 S 125TH AVE OMAHA NE 68144");
        assert_eq!(parts.street, "2809 S 125TH AVE");
        assert_eq!(parts.city, "OMAHA");
        assert_eq!(parts.state, "NE");
        assert_eq!(parts.zip, "68144");
    }

    #[test]
    fn test_zip_plus_four() {
        let parts = decompose_address("1919 N 90TH ST OMAHA NE 68114-1234");
        assert_eq!(parts.zip, "68114-1234");
        assert_eq!(parts.state, "NE");
    }

    #[test]
    fn test_unit_token_stays_with_street() {
        let parts = decompose_address("300 CENTER RD STE 110 BELLEVUE NE 68005");
        assert_eq!(parts.street, "300 CENTER RD STE 110");
        assert_eq!(parts.city, "BELLEVUE");
    }

    #[test]
    fn test_po_box_folds_into_street() {
        let parts = decompose_address("PO Box 81 Gretna NE 68028");
        assert_eq!(parts.street, "PO Box 81");
        assert_eq!(parts.city, "Gretna");
    }

    #[test]
    fn test_street_plus_box() {
        let parts = decompose_address("404 Elm St Box 12 Wahoo NE 68066");
        assert_eq!(parts.street, "404 Elm St Box 12");
        assert_eq!(parts.city, "Wahoo");
    }

    #[test]
    fn test_attn_routing_code() {
        let parts = decompose_address("100 Plaza Dr ATTN RX DEPT Kearney NE 68845");
        assert_eq!(parts.street, "100 Plaza Dr");
        assert_eq!(parts.city, "Kearney");
    }

    #[test]
    fn test_no_state_zip_tail_is_all_street() {
        let parts = decompose_address("GENERAL DELIVERY");
        assert_eq!(parts.street, "GENERAL DELIVERY");
        assert_eq!(parts.city, "");
        assert_eq!(parts.state, "");
        assert_eq!(parts.zip, "");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(decompose_address("   "), AddressParts::default());
    }

    #[test]
    fn test_fallback_last_word_is_city() {
        let parts = decompose_address("RR 2 GENOA NE 68640");
        assert_eq!(parts.street, "RR 2");
        assert_eq!(parts.city, "GENOA");
    }

    #[test]
    fn test_reconstruction_of_clean_input() {
        let raw = "2809 S 125TH AVE OMAHA NE 68144";
        let parts = decompose_address(raw);
        let rebuilt = format!(
            "{} {} {} {}",
            parts.street, parts.city, parts.state, parts.zip
        );
        assert_eq!(rebuilt, raw);
    }
}
