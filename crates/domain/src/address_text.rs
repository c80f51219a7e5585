//! Heuristic text matching for Indonesian free-text addresses.
//!
//! Everything here is a pure function over strings and already-fetched
//! [`SuggestItem`] rows; no network orchestration leaks in. The rules are
//! tuned for the way people actually type addresses: street-type prefixes
//! (`Jalan`, `Jl`, `Gang`), RT/RW tokens in a dozen spellings, house
//! numbers, and labels mixing administrative levels with commas.

use std::sync::LazyLock;

use regex::Regex;

use crate::address::{AddressDetail, RegionSelector, SuggestItem};

#[allow(clippy::unwrap_used)]
pub(crate) fn compile(pattern: &str) -> Regex {
    // Patterns are literals; an invalid one is a programming error.
    Regex::new(pattern).unwrap()
}

static RT_TOKEN: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\brt[.\s-]*\d{1,3}\b"));
static RW_TOKEN: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\brw[.\s-]*\d{1,3}\b"));
static HOUSE_NUMBER: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\bno\.?\s*\d+\b"));
static STREET_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\b(jalan|jl|jln|gang|gg)\b\.?"));
static RAYA_WORD: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\braya\b"));
static MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| compile(r"\s{2,}"));

static RT_SPELLED: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\br\s*\.?\s*t\s*[:.\-/ ]*0*([0-9]{1,3})\b"));
static RT_BEFORE_SLASH_RW: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\b0*([0-9]{1,3})\s*/\s*rw"));
static RW_SPELLED: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\br\s*\.?\s*w\s*[:.\-/ ]*0*([0-9]{1,3})\b"));
static RW_AFTER_RT_SLASH: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\brt\s*[:.\-/ ]*0*[0-9]{1,3}\s*/\s*0*([0-9]{1,3})\b"));

static POSTAL_5: LazyLock<Regex> = LazyLock::new(|| compile(r"(^|\D)(\d{5})(\D|$)"));

static STREETISH_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)jalan|jl|jln|highway|tol|arteri|raya"));

/// Administrative stop-words removed before containment matching.
const ADMIN_STOP_WORDS: &[&str] = &[
    "provinsi",
    "province",
    "daerah",
    "khusus",
    "ibukota",
    "kota",
    "kabupaten",
    "regency",
    "special",
    "region",
    "of",
    "d.i.",
    "istimewa",
];

fn collapse_spaces(value: &str) -> String {
    MULTI_SPACE.replace_all(value, " ").trim().to_owned()
}

/// Normalizes an administrative name for containment matching:
/// lowercase, punctuation to space, stop-words dropped.
#[must_use]
pub fn normalize_admin(value: &str) -> String {
    value
        .to_lowercase()
        .replace(['.', ','], " ")
        .split_whitespace()
        .filter(|token| !ADMIN_STOP_WORDS.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds search-query candidates from raw address input.
///
/// The base candidate strips RT/RW and house-number tokens; variants drop
/// street-type prefixes, swap the last two words, and drop the word
/// "raya". Candidates keep insertion order and are de-duplicated.
#[must_use]
pub fn build_candidates(text: &str) -> Vec<String> {
    let base = text.trim();
    if base.is_empty() {
        return Vec::new();
    }

    let clean = {
        let value = RT_TOKEN.replace_all(base, "");
        let value = RW_TOKEN.replace_all(&value, "");
        let value = HOUSE_NUMBER.replace_all(&value, "");
        collapse_spaces(&value.replace(['(', ')', ','], " "))
    };

    let mut candidates: Vec<String> = Vec::new();
    let mut push = |candidate: String| {
        if !candidate.is_empty() && !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    };

    push(clean.clone());

    let no_prefix = collapse_spaces(&STREET_PREFIX.replace_all(&clean, ""));
    push(no_prefix.clone());

    let words: Vec<&str> = no_prefix.split_whitespace().collect();
    if let [head @ .., second_last, last] = words.as_slice() {
        let mut swapped: Vec<&str> = head.to_vec();
        swapped.push(last);
        swapped.push(second_last);
        push(swapped.join(" "));
    }

    push(collapse_spaces(&RAYA_WORD.replace_all(&clean, "")));

    candidates
}

/// Extracts RT and RW unit numbers from free text, leading zeros removed.
///
/// Tolerates mixed spellings: `RT.004`, `R T 09`, `RT04/08`, `rt 4 / rw 8`.
#[must_use]
pub fn extract_rt_rw(text: &str) -> (Option<String>, Option<String>) {
    let capture = |regex: &Regex| {
        regex
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|group| group.as_str().to_owned())
    };

    let rt = capture(&RT_SPELLED).or_else(|| capture(&RT_BEFORE_SLASH_RW));
    let rw = capture(&RW_SPELLED).or_else(|| capture(&RW_AFTER_RT_SLASH));

    (rt, rw)
}

/// Backfills RT/RW on a detail record from ordered text sources,
/// stopping once both are present.
#[must_use]
pub fn enrich_rt_rw<'a, I>(mut detail: AddressDetail, sources: I) -> AddressDetail
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    for source in sources.into_iter().flatten() {
        if detail.rt.is_some() && detail.rw.is_some() {
            break;
        }

        let (rt, rw) = extract_rt_rw(source);
        if detail.rt.is_none() {
            detail.rt = rt;
        }
        if detail.rw.is_none() {
            detail.rw = rw;
        }
    }

    detail
}

/// Extracts the first standalone 5-digit run from text.
#[must_use]
pub fn extract_postal5(text: &str) -> Option<String> {
    POSTAL_5
        .captures(text)
        .and_then(|captures| captures.get(2))
        .map(|group| group.as_str().to_owned())
}

/// Resolves an item's 5-digit postal code from the raw postcode, the
/// label, then the raw name, in that order.
#[must_use]
pub fn item_postal5(item: &SuggestItem) -> Option<String> {
    item.raw_str("postcode")
        .and_then(extract_postal5)
        .or_else(|| extract_postal5(&item.label))
        .or_else(|| item.raw_str("name").and_then(extract_postal5))
}

/// Expands a city name into its match tokens.
///
/// "Jakarta Barat", "Jakarta Timur" and friends all gain the canonical
/// `jakarta` core so provider rows tagged with either spelling match.
#[must_use]
pub fn city_cores(name: &str) -> Vec<String> {
    let normalized = normalize_admin(name);
    if normalized.is_empty() {
        return Vec::new();
    }

    let mut cores = vec![normalized.clone()];
    if normalized.split_whitespace().any(|token| token == "jakarta") && normalized != "jakarta" {
        cores.push("jakarta".to_owned());
    }

    cores
}

fn raw_chain(item: &SuggestItem, keys: &[&str]) -> String {
    normalize_admin(
        keys.iter()
            .find_map(|key| item.raw_str(key))
            .unwrap_or_default(),
    )
}

/// Returns whether an item plausibly lies in the province: the raw
/// administrative field or the display label contains the normalized name.
#[must_use]
pub fn item_in_province(item: &SuggestItem, province_name: Option<&str>) -> bool {
    let key = normalize_admin(province_name.unwrap_or_default());
    if key.is_empty() {
        return true;
    }

    let admin = raw_chain(item, &["state", "region", "state_district"]);
    let label = normalize_admin(&item.label);
    (!admin.is_empty() && admin.contains(&key)) || (!label.is_empty() && label.contains(&key))
}

/// Returns whether an item plausibly lies in the city, using the
/// expanded city cores.
#[must_use]
pub fn item_in_city(item: &SuggestItem, city_name: Option<&str>) -> bool {
    let cores = city_cores(city_name.unwrap_or_default());
    if cores.is_empty() {
        return true;
    }

    let admin = raw_chain(item, &["city", "town", "municipality", "county"]);
    let label = normalize_admin(&item.label);
    cores
        .iter()
        .any(|core| admin.contains(core.as_str()) || label.contains(core.as_str()))
}

/// Returns whether an item plausibly lies in the district.
#[must_use]
pub fn item_in_district(item: &SuggestItem, district_name: Option<&str>) -> bool {
    let key = normalize_admin(district_name.unwrap_or_default());
    if key.is_empty() {
        return true;
    }

    let admin = raw_chain(item, &["district", "city_district", "subdistrict"]);
    let label = normalize_admin(&item.label);
    (!admin.is_empty() && admin.contains(&key)) || (!label.is_empty() && label.contains(&key))
}

fn keep_or_fallback(items: Vec<SuggestItem>, predicate: impl Fn(&SuggestItem) -> bool) -> Vec<SuggestItem> {
    let kept: Vec<SuggestItem> = items.iter().filter(|item| predicate(item)).cloned().collect();
    if kept.is_empty() { items } else { kept }
}

/// Filters results by the selected region.
///
/// Province, city, and district filtering are best-effort: a step that
/// would eliminate every result falls back to the previous set. The
/// postal code filter is strict and can legitimately return nothing.
#[must_use]
pub fn filter_by_region(items: Vec<SuggestItem>, region: &RegionSelector) -> Vec<SuggestItem> {
    let mut keep = items;

    keep = keep_or_fallback(keep, |item| item_in_province(item, region.province_name()));
    keep = keep_or_fallback(keep, |item| item_in_city(item, region.city_name()));
    keep = keep_or_fallback(keep, |item| item_in_district(item, region.district_name()));

    if let Some(want) = region
        .postal_code
        .as_deref()
        .and_then(extract_postal5)
        .filter(|code| !code.is_empty())
    {
        keep.retain(|item| item_postal5(item).is_some_and(|code| code == want));
    }

    keep
}

/// Re-ranks results so labels containing the province name sort first,
/// keeping relative order otherwise. No-op when the province is absent or
/// no label matches.
#[must_use]
pub fn prioritize_by_province(
    items: Vec<SuggestItem>,
    region: &RegionSelector,
) -> Vec<SuggestItem> {
    let key = normalize_admin(region.province_name().unwrap_or_default());
    if key.is_empty() {
        return items;
    }

    let (mut hits, rest): (Vec<SuggestItem>, Vec<SuggestItem>) = items
        .into_iter()
        .partition(|item| normalize_admin(&item.label).contains(&key));

    if hits.is_empty() {
        return rest;
    }

    hits.extend(rest);
    hits
}

/// Heuristically picks a village name from a display label: the shortest
/// comma-separated segment that does not look like a street or highway
/// and stays under 40 characters.
#[must_use]
pub fn village_from_label(label: &str) -> Option<String> {
    label
        .split(',')
        .map(str::trim)
        .filter(|segment| {
            !segment.is_empty() && segment.len() <= 40 && !STREETISH_SEGMENT.is_match(segment)
        })
        .min_by_key(|segment| segment.len())
        .map(ToOwned::to_owned)
}
