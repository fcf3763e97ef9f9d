//! Gazetteer of Polish cities and districts, with diacritics folding.
//!
//! Lookup is over diacritics-folded lowercase forms; each entry lists
//! the nominative plus the locative/genitive inflections that show up
//! in queries ("w Warszawie", "do Krakowa"). The canonical value keeps
//! proper spelling, matching what the scraper stores on listings.

/// Folds Polish diacritics to ASCII and lowercases.
#[must_use]
pub fn fold_diacritics(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'ą' => 'a',
            'ć' => 'c',
            'ę' => 'e',
            'ł' => 'l',
            'ń' => 'n',
            'ó' => 'o',
            'ś' => 's',
            'ź' | 'ż' => 'z',
            other => other,
        })
        .collect()
}

/// (canonical name, folded surface forms)
type Entry = (&'static str, &'static [&'static str]);

static CITIES: &[Entry] = &[
    ("Warszawa", &["warszawa", "warszawie", "warszawy", "warszawe"]),
    ("Kraków", &["krakow", "krakowie", "krakowa"]),
    ("Gdańsk", &["gdansk", "gdansku", "gdanska"]),
    ("Gdynia", &["gdynia", "gdyni", "gdynie"]),
    ("Sopot", &["sopot", "sopocie", "sopotu"]),
    ("Wrocław", &["wroclaw", "wroclawiu", "wroclawia"]),
    ("Poznań", &["poznan", "poznaniu", "poznania"]),
    ("Łódź", &["lodz", "lodzi"]),
    ("Katowice", &["katowice", "katowicach", "katowic"]),
    ("Lublin", &["lublin", "lublinie", "lublina"]),
    ("Szczecin", &["szczecin", "szczecinie", "szczecina"]),
    ("Białystok", &["bialystok", "bialymstoku", "bialegostoku"]),
];

static DISTRICTS: &[Entry] = &[
    // Warszawa
    ("Mokotów", &["mokotow", "mokotowie", "mokotowa"]),
    ("Wola", &["wola", "woli"]),
    ("Ursynów", &["ursynow", "ursynowie"]),
    ("Praga", &["praga", "pradze", "pragi"]),
    ("Żoliborz", &["zoliborz", "zoliborzu"]),
    ("Ochota", &["ochota", "ochocie"]),
    ("Bemowo", &["bemowo", "bemowie"]),
    ("Wilanów", &["wilanow", "wilanowie"]),
    ("Śródmieście", &["srodmiescie", "srodmiesciu"]),
    // Kraków
    ("Kazimierz", &["kazimierz", "kazimierzu"]),
    ("Podgórze", &["podgorze", "podgorzu"]),
    ("Nowa Huta", &["nowa huta", "nowej hucie"]),
    // Gdańsk
    ("Wrzeszcz", &["wrzeszcz", "wrzeszczu"]),
    ("Oliwa", &["oliwa", "oliwie"]),
    ("Przymorze", &["przymorze", "przymorzu"]),
];

fn lookup(table: &[Entry], folded: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(_, forms)| forms.contains(&folded))
        .map(|(canonical, _)| *canonical)
}

/// Resolves a folded token (or token phrase) to a canonical city name.
#[must_use]
pub fn match_city(folded: &str) -> Option<&'static str> {
    lookup(CITIES, folded)
}

/// Resolves a folded token (or token phrase) to a canonical district
/// name.
#[must_use]
pub fn match_district(folded: &str) -> Option<&'static str> {
    lookup(DISTRICTS, folded)
}

/// Longest phrase length (in tokens) any gazetteer entry spans.
pub const MAX_PHRASE_TOKENS: usize = 2;
