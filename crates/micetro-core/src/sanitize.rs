/// Characters replaced by `_` when turning property names and values into
/// group identifiers. `-` and `_` are kept.
const REPLACED: &[char] = &[
    ' ', '/', '\\', '&', '*', '^', '%', '$', '#', '@', '!', '+', '=', '`', '~', ':', ';', '<', '>',
    '?', ',', '.', '"', '\'', '(', ')', '[', ']', '{', '}',
];

/// Lowercase `input` and replace every reserved character with `_`.
///
/// Idempotent: the output contains no reserved characters and no
/// uppercase letters.
pub fn sanitize(input: &str) -> String {
    input
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if REPLACED.contains(&c) { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_and_space_become_underscores() {
        assert_eq!(sanitize("New York, NY"), "new_york__ny");
    }

    #[test]
    fn dashes_and_underscores_survive() {
        assert_eq!(sanitize("rack-12_b"), "rack-12_b");
    }

    #[test]
    fn every_reserved_character_is_replaced() {
        let all: String = REPLACED.iter().collect();
        assert_eq!(sanitize(&all), "_".repeat(REPLACED.len()));
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in [
            "",
            "Location",
            "New York, NY",
            "172.16.17.0/24",
            "a\\b&c*d^e%f$g#h@i!j+k=l`m~n:o;p<q>r?s,t.u\"v'w(x)y[z]{}",
            "ÄÖÜ Straße",
            "İstanbul",
        ] {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input: {input:?}");
        }
    }
}
