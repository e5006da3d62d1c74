//! Filename and album-name tokenisation used by cover scoring.

/// Keywords marking a front cover, best first.
pub const FRONT_KEYWORDS: [&str; 3] = ["cover", "front", "folder"];

/// Keywords marking artwork that is not the front cover.
pub const NON_FRONT_KEYWORDS: [&str; 13] = [
    "back",
    "tray",
    "cd",
    "disc",
    "inlay",
    "inlet",
    "insert",
    "booklet",
    "book",
    "spine",
    "rear",
    "inside",
    "tracklisting",
];

/// Split a name into lowercase ASCII alphanumeric tokens, breaking on
/// punctuation, whitespace and camelCase boundaries (`FrontCover` -> `front cover`,
/// `CDFront` -> `cd front`).
pub fn name_tokens(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut spaced = String::with_capacity(name.len() + 8);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase() || (prev.is_ascii_uppercase() && next_is_lower) {
                spaced.push(' ');
            }
        }
        spaced.push(if c.is_ascii_alphanumeric() { c } else { ' ' });
    }

    spaced
        .split_whitespace()
        .map(|t| t.to_ascii_lowercase())
        .collect()
}

/// Tokens of an album directory name worth matching against image names:
/// pure numbers, very short tokens and audio extensions are dropped.
pub fn album_tokens(name: &str, audio_extensions: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in name_tokens(name) {
        if token.len() <= 2 || token.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        if audio_extensions.iter().any(|e| e.eq_ignore_ascii_case(&token)) {
            continue;
        }
        if !out.contains(&token) {
            out.push(token);
        }
    }
    out
}

/// Rank of the first front keyword contained in the (lowercased) file stem.
pub fn front_keyword_rank(stem: &str) -> Option<usize> {
    let lower = stem.to_ascii_lowercase();
    FRONT_KEYWORDS.iter().position(|kw| lower.contains(kw))
}

/// Non-front keywords present as whole tokens.
pub fn non_front_hits(tokens: &[String]) -> Vec<&'static str> {
    NON_FRONT_KEYWORDS
        .iter()
        .copied()
        .filter(|kw| tokens.iter().any(|t| t == kw))
        .collect()
}

/// File tokens found in the album name, over the album's token count,
/// capped at 1.
pub fn album_overlap(file_tokens: &[String], album: &[String]) -> f64 {
    if album.is_empty() {
        return 0.0;
    }
    let hits = file_tokens.iter().filter(|t| album.contains(t)).count();
    (hits as f64 / album.len() as f64).min(1.0)
}

/// Whether a directory name looks like a disc folder (`CD1`, `Disc 2`, `disk02`).
pub fn is_disc_folder_name(name: &str) -> bool {
    let tokens = name_tokens(name);
    let Some(first) = tokens.first() else {
        return false;
    };
    ["cd", "disc", "disk"].iter().any(|prefix| {
        first
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.bytes().all(|b| b.is_ascii_digit()))
    })
}
