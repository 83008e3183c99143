// SPDX-License-Identifier: GPL-3.0-or-later

use unicode_normalization::UnicodeNormalization;

/// Canonical form of a track title for comparison.
///
/// Lower-cases, drops everything from the first `(` on ("(Live)", "(Remastered)"),
/// deletes apostrophes, turns commas and periods into spaces and collapses
/// whitespace. Composed (NFC) so accents compare equal however they were typed.
pub fn normalize(title: &str) -> String {
    let lowered: String = title.nfc().collect::<String>().to_lowercase();
    let head = match lowered.find('(') {
        Some(index) => &lowered[..index],
        None => lowered.as_str(),
    };

    head.chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}'))
        .map(|c| if matches!(c, ',' | '.') { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
