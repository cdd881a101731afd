use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

// Matched independently; overlapping hits are deduplicated by the set.
static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"%\{[^}]+\}",      // %{name}
        r"\{\{[^}]+\}\}",   // {{count}}
        r"\{[^}]+\}",       // {count}
        r"%[sd]",           // %s, %d
        r"%[0-9]+\$[sd]",   // %1$s
        r"%[0-9]+[sd]",     // %1s
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Every placeholder-looking token in `text`, normalized as a sorted set.
pub fn extract_placeholders(text: &str) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    for pattern in PATTERNS.iter() {
        for m in pattern.find_iter(text) {
            found.insert(m.as_str().to_string());
        }
    }
    found
}

/// A correction must carry exactly the placeholders of the original.
pub fn placeholders_preserved(original: &str, corrected: &str) -> Result<(), String> {
    let orig = extract_placeholders(original);
    let corr = extract_placeholders(corrected);
    if orig != corr {
        return Err(format!(
            "placeholder mismatch: original {orig:?}, corrected {corr:?}"
        ));
    }
    Ok(())
}
