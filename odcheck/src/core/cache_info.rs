//! Checksum mutation of the dalvik-cache descriptor.
//!
//! Rewriting one dependency's recorded checksum makes the descriptor look
//! stale without a real package upgrade, which is enough to provoke a full
//! recompilation on the next odrefresh run. The matching strategy is a
//! structural regex kept behind [`replace_dependency_checksum`] so it can be
//! swapped for an XML parse without affecting callers.

use regex::Regex;

use crate::core::failure::Failure;

/// Replace the recorded checksum of `dependency` with `new_value`.
///
/// The first line whose `/apex/<dependency>` entry carries a
/// `checksums="..."` attribute has the quoted value replaced; every other
/// line is returned byte-identical and the trailing-newline convention is
/// preserved. A line whose checksum already equals `new_value` does not
/// match, so reapplying the mutation fails with `PatternNotFound` — the
/// state change is one-shot and detectable.
pub fn replace_dependency_checksum(
    text: &str,
    dependency: &str,
    new_value: &str,
) -> Result<String, Failure> {
    let pattern = format!(
        r#"^(.*/apex/{}.*checksums=")([^"]*)(".*)$"#,
        regex::escape(dependency)
    );
    let matcher = Regex::new(&pattern).map_err(|err| Failure::ParseError {
        message: format!("invalid checksum pattern for '{dependency}': {err}"),
    })?;

    let (body, had_trailing_newline) = match text.strip_suffix('\n') {
        Some(stripped) => (stripped, true),
        None => (text, false),
    };

    let mut replaced = false;
    let mut lines = Vec::new();
    for line in body.split('\n') {
        match matcher.captures(line) {
            Some(caps) if !replaced && &caps[2] != new_value => {
                lines.push(format!("{}{}{}", &caps[1], new_value, &caps[3]));
                replaced = true;
            }
            _ => lines.push(line.to_string()),
        }
    }

    if !replaced {
        return Err(Failure::PatternNotFound {
            dependency: dependency.to_string(),
        });
    }

    let mut output = lines.join("\n");
    if had_trailing_newline {
        output.push('\n');
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CACHE_INFO: &str = "<cacheInfo>\n\
        <module name=\"/apex/com.android.ipsec/javalib/ike.jar\" checksums=\"12ab34cd\"/>\n\
        <module name=\"/apex/com.android.wifi/javalib/wifi.jar\" checksums=\"56ef78aa\"/>\n\
        </cacheInfo>\n";

    #[test]
    fn replaces_only_target_dependency_checksum() {
        let mutated = replace_dependency_checksum(CACHE_INFO, "com.android.wifi", "aaaaaaaa")
            .expect("mutate");
        assert!(mutated.contains("com.android.wifi/javalib/wifi.jar\" checksums=\"aaaaaaaa\""));
        assert!(mutated.contains("com.android.ipsec/javalib/ike.jar\" checksums=\"12ab34cd\""));
    }

    #[test]
    fn preserves_untouched_lines_and_trailing_newline() {
        let mutated = replace_dependency_checksum(CACHE_INFO, "com.android.wifi", "aaaaaaaa")
            .expect("mutate");
        assert!(mutated.ends_with("</cacheInfo>\n"));
        assert_eq!(mutated.lines().count(), CACHE_INFO.lines().count());
    }

    #[test]
    fn missing_dependency_is_pattern_not_found() {
        let err = replace_dependency_checksum(CACHE_INFO, "com.android.adbd", "aaaaaaaa")
            .expect_err("must fail");
        assert_eq!(
            err,
            Failure::PatternNotFound {
                dependency: "com.android.adbd".to_string(),
            }
        );
    }

    #[test]
    fn mutation_is_one_shot() {
        let mutated = replace_dependency_checksum(CACHE_INFO, "com.android.wifi", "aaaaaaaa")
            .expect("first mutation");
        let err = replace_dependency_checksum(&mutated, "com.android.wifi", "aaaaaaaa")
            .expect_err("already-mutated checksum must not match");
        assert!(matches!(err, Failure::PatternNotFound { .. }));
    }

    #[test]
    fn distinct_sentinels_can_remutate() {
        let mutated = replace_dependency_checksum(CACHE_INFO, "com.android.wifi", "aaaaaaaa")
            .expect("first mutation");
        let remutated = replace_dependency_checksum(&mutated, "com.android.wifi", "bbbbbbbb")
            .expect("distinct sentinel");
        assert!(remutated.contains("checksums=\"bbbbbbbb\""));
    }

    #[test]
    fn input_without_trailing_newline_stays_that_way() {
        let input = CACHE_INFO.trim_end_matches('\n');
        let mutated =
            replace_dependency_checksum(input, "com.android.wifi", "aaaaaaaa").expect("mutate");
        assert!(!mutated.ends_with('\n'));
    }
}
