use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::models::AddressInfo;

/// Locality fields of a reverse-geocoding response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAddress {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub county: Option<String>,
    pub state_district: Option<String>,
    pub suburb: Option<String>,
    pub neighbourhood: Option<String>,
    pub road: Option<String>,
    pub residential: Option<String>,
}

struct Patterns {
    zone_ward: Regex,
    admin_words: Regex,
    greater_prefix: Regex,
    noise: Regex,
    whitespace: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();

    PATTERNS.get_or_init(|| Patterns {
        zone_ward: Regex::new(r"(?i)\b(?:zone|ward)\s*(?:no\.?\s*)?[-:]?\s*\d+\b").expect("valid regex"),
        admin_words: Regex::new(
            r"(?i)\b(?:district|corporation|municipal|municipality|taluk|tehsil|division)\b",
        )
        .expect("valid regex"),
        greater_prefix: Regex::new(r"(?i)^\s*greater\s+").expect("valid regex"),
        noise: Regex::new(r"(?i)\b(?:zone|ward)\b").expect("valid regex"),
        whitespace: Regex::new(r"\s+").expect("valid regex"),
    })
}

/// Strip administrative prefixes and suffixes from a place name
///
/// `"Zone 3 Madhavaram"` becomes `"Madhavaram"`,
/// `"Greater Chennai Corporation"` becomes `"Chennai"`.
pub fn normalize_place_name(name: &str) -> String {
    let p = patterns();

    let cleaned = p.zone_ward.replace_all(name, " ");
    let cleaned = p.admin_words.replace_all(&cleaned, " ");
    let cleaned = p.greater_prefix.replace(&cleaned, "");
    let cleaned = p.whitespace.replace_all(&cleaned, " ");

    cleaned
        .trim_matches(|c: char| c.is_whitespace() || c == ',' || c == '-')
        .to_string()
}

fn has_admin_noise(name: &str) -> bool {
    patterns().noise.is_match(name)
}

fn first_non_empty<'a>(candidates: &[&'a Option<String>]) -> &'a str {
    candidates
        .iter()
        .copied()
        .filter_map(Option::as_deref)
        .map(str::trim)
        .find(|c| !c.is_empty())
        .unwrap_or("")
}

/// "area, city" with empty parts dropped and the area omitted when it
/// repeats the city
pub fn compose_display_name(area: &str, city: &str) -> String {
    match (area.is_empty(), city.is_empty()) {
        (true, true) => String::new(),
        (true, false) => city.to_string(),
        (false, true) => area.to_string(),
        (false, false) if area.eq_ignore_ascii_case(city) => city.to_string(),
        (false, false) => format!("{}, {}", area, city),
    }
}

/// Pick a best-effort city and area out of a reverse-geocoded address
///
/// Returns `None` when neither could be determined.
pub fn extract_address(raw: &RawAddress) -> Option<AddressInfo> {
    let city = normalize_place_name(first_non_empty(&[
        &raw.city,
        &raw.town,
        &raw.village,
        &raw.county,
        &raw.state_district,
    ]));

    let area_candidate = first_non_empty(&[
        &raw.suburb,
        &raw.neighbourhood,
        &raw.road,
        &raw.residential,
    ]);
    let normalized_area = normalize_place_name(area_candidate);
    let county = normalize_place_name(raw.county.as_deref().unwrap_or(""));

    let noisy = area_candidate.is_empty() || has_admin_noise(area_candidate) || normalized_area.is_empty();
    let area = if noisy && !county.is_empty() {
        county
    } else {
        normalized_area
    };

    if city.is_empty() && area.is_empty() {
        return None;
    }

    let display_name = compose_display_name(&area, &city);

    Some(AddressInfo {
        city,
        area,
        display_name,
    })
}
