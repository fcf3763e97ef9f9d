//! Rule-based constraint extraction from free-text Polish queries.
//!
//! Turns "dwupokojowe mieszkanie w Warszawie z balkonem do 850 tysięcy"
//! into a [`QueryFilter`]. Deliberately a heuristic layer, not an NLU
//! pipeline: every rule is a pattern over diacritics-folded tokens, so
//! behavior is inspectable and testable. Extraction never fails;
//! unmatched categories stay unconstrained and the ranker must cope
//! with a fully empty filter.

use std::sync::LazyLock;

use regex::Regex;

use crate::query::filter::QueryFilter;
use crate::query::gazetteer::{MAX_PHRASE_TOKENS, fold_diacritics, match_city, match_district};
use crate::types::{Amenity, ListingType};

static RE_ROOMS_ATTACHED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})-?pokojow\w*$").expect("static regex"));

static RE_ROOM_NOUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(pokojow\w*|pokoje|pokoi|pokoj|pok)$").expect("static regex"));

static RE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+([.,]\d+)?$").expect("static regex"));

static RE_DIGIT_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}$").expect("static regex"));

/// Word-number prefixes for "dwupokojowe"-style room phrases.
const WORD_ROOMS: &[(&str, u32)] = &[
    ("jedno", 1),
    ("dwu", 2),
    ("trzy", 3),
    ("cztero", 4),
    ("piecio", 5),
    ("szescio", 6),
];

const MAX_TRIGGERS: &[&str] = &["do", "ponizej", "max", "maks", "maksymalnie", "najwyzej"];
const MIN_TRIGGERS: &[&str] = &["od", "powyzej", "min", "minimum", "przynajmniej"];
const THOUSAND_WORDS: &[&str] = &["tys", "tysiecy", "tysiace", "tysiac", "k"];
const MILLION_WORDS: &[&str] = &["mln", "milion", "miliona", "miliony", "milionow"];
const CURRENCY_WORDS: &[&str] = &["zl", "zlotych", "pln"];

struct Token<'a> {
    raw: &'a str,
    norm: String,
    consumed: bool,
}

/// Extracts a structured filter from a raw query.
///
/// The residual `semantic_text` is the query with matched structural
/// tokens stripped; when stripping leaves nothing, the full original
/// query is used instead so the semantic arm always has a phrase.
#[must_use]
pub fn extract(query: &str) -> QueryFilter {
    let mut filter = QueryFilter::default();
    let mut tokens: Vec<Token> = query
        .split_whitespace()
        .map(|raw| Token {
            raw,
            norm: normalize_token(raw),
            consumed: false,
        })
        .collect();

    extract_listing_type(&mut tokens, &mut filter);
    extract_rooms(&mut tokens, &mut filter);
    extract_price(&mut tokens, &mut filter);
    extract_locations(&mut tokens, &mut filter);
    extract_amenities(&mut tokens, &mut filter);

    let residual: Vec<&str> = tokens
        .iter()
        .filter(|t| !t.consumed)
        .map(|t| t.raw)
        .collect();
    let residual = residual.join(" ");
    filter.semantic_text = if residual.trim().is_empty() {
        query.trim().to_string()
    } else {
        residual
    };

    filter
}

/// Strips surrounding punctuation and folds diacritics.
fn normalize_token(raw: &str) -> String {
    let trimmed = raw.trim_matches(|c: char| !c.is_alphanumeric());
    fold_diacritics(trimmed)
}

fn extract_listing_type(tokens: &mut [Token], filter: &mut QueryFilter) {
    for token in tokens.iter_mut() {
        if token.consumed {
            continue;
        }
        let n = token.norm.as_str();
        let detected = if n.starts_with("kup") || n.starts_with("zakup") || n.starts_with("sprzeda")
        {
            Some(ListingType::Sale)
        } else if n.starts_with("wynaj") || n == "najem" || n == "najmu" {
            Some(ListingType::Rent)
        } else {
            None
        };
        if let Some(listing_type) = detected {
            // First intent verb wins; later mentions are still stripped.
            filter.listing_type.get_or_insert(listing_type);
            token.consumed = true;
        }
    }
}

fn extract_rooms(tokens: &mut [Token], filter: &mut QueryFilter) {
    let len = tokens.len();
    for i in 0..len {
        if tokens[i].consumed {
            continue;
        }
        let norm = tokens[i].norm.clone();

        if norm.starts_with("kawalerk") {
            filter.set_exact_rooms(1);
            tokens[i].consumed = true;
            continue;
        }

        if let Some(caps) = RE_ROOMS_ATTACHED.captures(&norm) {
            if let Ok(rooms) = caps[1].parse::<u32>() {
                filter.set_exact_rooms(rooms);
                tokens[i].consumed = true;
                continue;
            }
        }

        if let Some((_, rooms)) = WORD_ROOMS
            .iter()
            .find(|(prefix, _)| {
                norm.strip_prefix(prefix)
                    .is_some_and(|rest| rest.trim_start_matches('-').starts_with("pokojow"))
            })
            .copied()
        {
            filter.set_exact_rooms(rooms);
            tokens[i].consumed = true;
            continue;
        }

        // "2 pokoje": bare small integer immediately before a room noun.
        if i + 1 < len
            && !tokens[i + 1].consumed
            && RE_ROOM_NOUN.is_match(&tokens[i + 1].norm)
            && let Ok(rooms) = norm.parse::<u32>()
            && (1..=10).contains(&rooms)
        {
            filter.set_exact_rooms(rooms);
            tokens[i].consumed = true;
            tokens[i + 1].consumed = true;
        }
    }
}

fn parse_number(norm: &str) -> Option<f64> {
    if !RE_NUMBER.is_match(norm) {
        return None;
    }
    norm.replace(',', ".").parse().ok()
}

fn extract_price(tokens: &mut [Token], filter: &mut QueryFilter) {
    let len = tokens.len();
    let mut i = 0;
    while i < len {
        if tokens[i].consumed {
            i += 1;
            continue;
        }
        let Some(mut value) = parse_number(&tokens[i].norm) else {
            i += 1;
            continue;
        };

        // Absorb "850 000"-style digit groups following the head number.
        let mut end = i;
        while end + 1 < len
            && !tokens[end + 1].consumed
            && RE_DIGIT_GROUP.is_match(&tokens[end + 1].norm)
        {
            value = value * 1000.0 + tokens[end + 1].norm.parse::<f64>().unwrap_or(0.0);
            end += 1;
        }

        let mut has_marker = false;
        if end + 1 < len && !tokens[end + 1].consumed {
            let next = tokens[end + 1].norm.as_str();
            if THOUSAND_WORDS.contains(&next) {
                value *= 1_000.0;
                has_marker = true;
                end += 1;
            } else if MILLION_WORDS.contains(&next) {
                value *= 1_000_000.0;
                has_marker = true;
                end += 1;
            }
        }
        if end + 1 < len
            && !tokens[end + 1].consumed
            && CURRENCY_WORDS.contains(&tokens[end + 1].norm.as_str())
        {
            has_marker = true;
            end += 1;
        }

        let trigger = (i > 0 && !tokens[i - 1].consumed)
            .then(|| tokens[i - 1].norm.as_str())
            .map(|prev| {
                if MAX_TRIGGERS.contains(&prev) {
                    Some(Bound::Max)
                } else if MIN_TRIGGERS.contains(&prev) {
                    Some(Bound::Min)
                } else {
                    None
                }
            })
            .unwrap_or(None);

        // A bare number with neither a direction word nor a price
        // marker is left for the semantic phrase; it is as likely an
        // area or a street number as a price.
        let bound = match (trigger, has_marker) {
            (Some(b), _) => Some(b),
            (None, true) => Some(Bound::Max),
            (None, false) => None,
        };

        if let Some(bound) = bound {
            match bound {
                Bound::Max => filter.max_price = Some(value),
                Bound::Min => filter.min_price = Some(value),
            }
            if trigger.is_some() {
                tokens[i - 1].consumed = true;
            }
            for token in tokens.iter_mut().take(end + 1).skip(i) {
                token.consumed = true;
            }
        }
        i = end + 1;
    }
}

#[derive(Clone, Copy)]
enum Bound {
    Min,
    Max,
}

fn extract_locations(tokens: &mut [Token], filter: &mut QueryFilter) {
    let len = tokens.len();
    // Longest-phrase-first so "Nowa Huta" is not eaten token by token.
    for width in (1..=MAX_PHRASE_TOKENS).rev() {
        let mut i = 0;
        while i + width <= len {
            if tokens[i..i + width].iter().any(|t| t.consumed) {
                i += 1;
                continue;
            }
            let phrase = tokens[i..i + width]
                .iter()
                .map(|t| t.norm.as_str())
                .collect::<Vec<_>>()
                .join(" ");

            if let Some(city) = match_city(&phrase) {
                filter.city.get_or_insert_with(|| city.to_string());
                for token in &mut tokens[i..i + width] {
                    token.consumed = true;
                }
                i += width;
                continue;
            }
            if let Some(district) = match_district(&phrase) {
                if !filter.districts.iter().any(|d| d == district) {
                    filter.districts.push(district.to_string());
                }
                for token in &mut tokens[i..i + width] {
                    token.consumed = true;
                }
                i += width;
                continue;
            }
            i += 1;
        }
    }
}

fn amenity_for(norm: &str) -> Option<Amenity> {
    if norm.starts_with("balkon") || norm.starts_with("taras") || norm == "loggia" {
        return Some(Amenity::Balcony);
    }
    if norm.starts_with("garaz") {
        return Some(Amenity::Garage);
    }
    if norm.starts_with("parking") {
        return Some(Amenity::Parking);
    }
    if matches!(norm, "winda" | "windy" | "winde" | "windzie") {
        return Some(Amenity::Elevator);
    }
    if norm.starts_with("klimatyzacj") || norm == "klima" {
        return Some(Amenity::AirConditioning);
    }
    if norm.starts_with("umeblowan") || norm == "meblami" {
        return Some(Amenity::Furnished);
    }
    if norm.starts_with("zwierz")
        || matches!(norm, "pies" | "psem" | "psy" | "psami" | "kot" | "kotem" | "koty")
    {
        return Some(Amenity::PetsAllowed);
    }
    None
}

fn extract_amenities(tokens: &mut [Token], filter: &mut QueryFilter) {
    for token in tokens.iter_mut() {
        if token.consumed {
            continue;
        }
        if let Some(amenity) = amenity_for(&token.norm) {
            if !filter.required_amenities.contains(&amenity) {
                filter.required_amenities.push(amenity);
            }
            token.consumed = true;
        }
    }
}
