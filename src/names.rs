use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::config::AliasMap;

// Lowercase Latin letters with diacritics seen in UEFA club names, folded to
// ASCII. Uppercase input is lowercased before lookup.
static FOLD: Lazy<HashMap<char, &'static str>> = Lazy::new(|| {
    let groups: &[(&str, &'static str)] = &[
        ("àáâãäāăą", "a"),
        ("å", "a"),
        ("æ", "ae"),
        ("çćčĉċ", "c"),
        ("ďđ", "d"),
        ("èéêëēĕėęě", "e"),
        ("ĝğġģ", "g"),
        ("ĥħ", "h"),
        ("ìíîïĩīĭįı", "i"),
        ("ĵ", "j"),
        ("ķ", "k"),
        ("ĺļľŀł", "l"),
        ("ñńņňŉ", "n"),
        ("òóôõöōŏő", "o"),
        ("ø", "o"),
        ("œ", "oe"),
        ("ŕŗř", "r"),
        ("śŝşšș", "s"),
        ("ß", "ss"),
        ("ţťŧț", "t"),
        ("ùúûüũūŭůűų", "u"),
        ("ŵ", "w"),
        ("ýÿŷ", "y"),
        ("źżž", "z"),
    ];
    let mut map = HashMap::new();
    for (chars, ascii) in groups {
        for c in chars.chars() {
            map.insert(c, *ascii);
        }
    }
    map
});

/// Lowercases and strips diacritics (`"Bodø/Glimt"` → `"bodo/glimt"`).
pub fn fold_diacritics(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars().flat_map(char::to_lowercase) {
        match FOLD.get(&c) {
            Some(ascii) => out.push_str(ascii),
            // Stray combining marks from decomposed input.
            None if ('\u{0300}'..='\u{036f}').contains(&c) => {}
            None => out.push(c),
        }
    }
    out
}

/// Canonical team key: folded, trimmed, inner whitespace collapsed, then
/// passed through the operator's alias map.
pub fn norm_key(raw: &str, aliases: &AliasMap) -> String {
    let folded = fold_diacritics(raw);
    let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");
    aliases.resolve(&collapsed).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_nordic_and_slavic_letters() {
        assert_eq!(fold_diacritics("Bodø/Glimt"), "bodo/glimt");
        assert_eq!(fold_diacritics("København"), "kobenhavn");
        assert_eq!(fold_diacritics("Legia Warszawa Łódź"), "legia warszawa lodz");
        assert_eq!(fold_diacritics("Fenerbahçe"), "fenerbahce");
        assert_eq!(fold_diacritics("Slavia Praha Plzeň"), "slavia praha plzen");
    }

    #[test]
    fn strips_combining_marks() {
        // "e" followed by U+0301 COMBINING ACUTE ACCENT.
        assert_eq!(fold_diacritics("Atle\u{0301}tico"), "atletico");
    }

    #[test]
    fn norm_key_applies_aliases_after_folding() {
        let aliases = AliasMap::default();
        assert_eq!(norm_key("  Atlético   Madrid ", &aliases), "atletico");
        assert_eq!(norm_key("Real", &aliases), "real madrid");
        assert_eq!(norm_key("Bodø/Glimt", &aliases), "bodo/glimt");
        assert_eq!(norm_key("Arsenal", &aliases), "arsenal");
    }

    #[test]
    fn empty_alias_map_only_normalises() {
        assert_eq!(norm_key("Real", &AliasMap::empty()), "real");
    }
}
