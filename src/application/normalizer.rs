//! Field normalizer: raw registry records to the common intermediate shape
//!
//! Pure per-record validation and cleanup. Rejections are explicit reasons
//! counted as skips by the orchestrator, never errors that abort a run.
//! Reject priority: missing identifier/name, unparsable coordinate,
//! out-of-region coordinate, unsupported industry category.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::constants::region;
use crate::domain::restaurant::{NormalizedRecord, RawRecord, RejectReason, Source};

/// Industry categories accepted from the good-price registries. These
/// registries list businesses well outside food service (laundries,
/// hairdressers); everything not on this list is skipped.
pub const ALLOWED_INDUSTRIES: &[&str] = &[
    "한식", "중식", "일식", "제과", "분식", "기타요식업", "카페", "양식",
];

static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]").expect("valid pattern"));

/// Converts one raw record into the common normalized shape, or rejects it.
pub fn normalize(raw: &RawRecord) -> Result<NormalizedRecord, RejectReason> {
    match raw.source {
        Source::TourismApi => normalize_tourism(raw),
        Source::MapSearch => normalize_map_search(raw),
        Source::GoodPriceJeju | Source::GoodPriceSeogwipo => normalize_good_price(raw),
    }
}

fn normalize_tourism(raw: &RawRecord) -> Result<NormalizedRecord, RejectReason> {
    let external_id = require(raw, "contentsid")?;
    let name = require(raw, "title")?;
    let (latitude, longitude) = coordinates(raw, "latitude", "longitude")?;

    Ok(NormalizedRecord {
        source: raw.source,
        external_id: external_id.to_string(),
        name: name.to_string(),
        category: "기타요식업".to_string(),
        address: normalize_address(raw.str_field("roadaddress").or_else(|| raw.str_field("address")).unwrap_or_default()),
        latitude,
        longitude,
        phone: raw.str_field("phoneno").map(normalize_phone),
        menu_text: raw.str_field("alltag").map(str::to_string),
    })
}

fn normalize_map_search(raw: &RawRecord) -> Result<NormalizedRecord, RejectReason> {
    let external_id = require(raw, "id")?;
    let name = require(raw, "place_name")?;
    let (latitude, longitude) = coordinates(raw, "y", "x")?;

    // "음식점 > 한식 > 국수": only food establishments pass, and the second
    // segment becomes the stored category.
    let category_name = raw.str_field("category_name").unwrap_or_default();
    let mut segments = category_name.split('>').map(str::trim);
    if segments.next() != Some("음식점") {
        return Err(RejectReason::UnsupportedCategory(category_name.to_string()));
    }
    let category = segments.next().unwrap_or("기타요식업").to_string();

    Ok(NormalizedRecord {
        source: raw.source,
        external_id: external_id.to_string(),
        name: name.to_string(),
        category,
        address: normalize_address(raw.str_field("road_address_name").unwrap_or_default()),
        latitude,
        longitude,
        phone: raw.str_field("phone").map(normalize_phone),
        menu_text: Some(category_name.to_string()),
    })
}

fn normalize_good_price(raw: &RawRecord) -> Result<NormalizedRecord, RejectReason> {
    let external_id = require(raw, "sn")?;
    let name = require(raw, "conmNm")?;
    let (latitude, longitude) = coordinates(raw, "latitude", "longitude")?;

    let industry = raw.str_field("indutyNm").unwrap_or_default();
    if !ALLOWED_INDUSTRIES.contains(&industry) {
        return Err(RejectReason::UnsupportedCategory(industry.to_string()));
    }

    Ok(NormalizedRecord {
        source: raw.source,
        external_id: external_id.to_string(),
        name: name.to_string(),
        category: industry.to_string(),
        address: normalize_address(raw.str_field("adres").unwrap_or_default()),
        latitude,
        longitude,
        phone: raw.str_field("telno").map(normalize_phone),
        menu_text: raw.str_field("mainMenuNm").map(str::to_string),
    })
}

fn require<'a>(raw: &'a RawRecord, key: &'static str) -> Result<&'a str, RejectReason> {
    raw.str_field(key)
        .ok_or(RejectReason::MissingRequiredField(key))
}

fn coordinates(
    raw: &RawRecord,
    lat_key: &str,
    lon_key: &str,
) -> Result<(f64, f64), RejectReason> {
    let parse = |key: &str| -> Result<f64, RejectReason> {
        raw.f64_field(key).ok_or_else(|| {
            let shown = raw
                .payload
                .get(key)
                .map(std::string::ToString::to_string)
                .unwrap_or_else(|| "<absent>".to_string());
            RejectReason::InvalidCoordinate(format!("{key}={shown}"))
        })
    };
    let latitude = parse(lat_key)?;
    let longitude = parse(lon_key)?;

    if !region::contains(latitude, longitude) {
        return Err(RejectReason::OutOfRegion { latitude, longitude });
    }
    Ok((latitude, longitude))
}

/// Strips a phone number to digits, re-hyphenating only numbers laid out
/// with the regional area code. Anything else passes through digits-only.
pub fn normalize_phone(raw: &str) -> String {
    let digits = NON_DIGITS.replace_all(raw, "").into_owned();
    if digits.starts_with(region::AREA_CODE) {
        match digits.len() {
            10 => return format!("{}-{}-{}", &digits[..3], &digits[3..6], &digits[6..]),
            11 => return format!("{}-{}-{}", &digits[..3], &digits[3..7], &digits[7..]),
            _ => {}
        }
    }
    digits
}

/// Drops the redundant top-level administrative token so every address
/// starts with its city+district prefix (the display convention used
/// throughout the catalog). Handles both the full province name and the
/// short form the map-search registry uses.
pub fn normalize_address(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut tokens = trimmed.split_whitespace();
    match (tokens.next(), tokens.clone().next()) {
        (Some(first), Some(second))
            if (first == region::PROVINCE_PREFIX || first == "제주도" || first == "제주")
                && second.ends_with('시') =>
        {
            tokens.collect::<Vec<_>>().join(" ")
        }
        _ => trimmed.to_string(),
    }
}
