//! Extraction of artifact paths from a process memory-map dump.

use std::collections::BTreeSet;

/// Collect the distinct artifact paths mapped by a process.
///
/// `maps_text` is the raw line-oriented `/proc/<pid>/maps` dump. A line
/// participates only if it contains `filter`; anonymous regions (quoted in
/// square brackets, e.g. `[anon:dalvik-zygote-space]`) are excluded even when
/// they match. The retained value is the line's suffix starting at the first
/// occurrence of `prefix`; a matching line without the prefix yields no entry
/// rather than an error.
///
/// The result is deduplicated and deterministically ordered.
pub fn mapped_artifacts(maps_text: &str, filter: &str, prefix: &str) -> BTreeSet<String> {
    let mut artifacts = BTreeSet::new();
    for line in maps_text.lines() {
        if !line.contains(filter) || line.contains('[') {
            continue;
        }
        if let Some(start) = line.find(prefix) {
            artifacts.insert(line[start..].to_string());
        }
    }
    artifacts
}

#[cfg(test)]
mod tests {
    use super::*;

    const CACHE_ROOT: &str = "/data/misc/apexdata/com.android.art/dalvik-cache";

    fn maps_line(path: &str) -> String {
        format!("7f0c2000-7f0c5000 r--p 00000000 fe:01 1234    {path}")
    }

    #[test]
    fn extracts_cache_relative_suffix_of_matching_lines() {
        let text = [
            maps_line(&format!("{CACHE_ROOT}/arm64/boot-framework.art")),
            "7f1a0000-7f1a1000 rw-p 00000000 00:00 0       [anon:dalvik-zygote-space]".to_string(),
        ]
        .join("\n");

        let artifacts = mapped_artifacts(&text, "dalvik-cache", CACHE_ROOT);
        assert_eq!(artifacts.len(), 1);
        assert!(artifacts.contains(&format!("{CACHE_ROOT}/arm64/boot-framework.art")));
    }

    #[test]
    fn anonymous_regions_excluded_even_when_filter_matches() {
        let text = maps_line("[anon:dalvik-cache-table]");
        let artifacts = mapped_artifacts(&text, "dalvik-cache", CACHE_ROOT);
        assert!(artifacts.is_empty());
    }

    #[test]
    fn duplicate_mappings_collapse_to_one_entry() {
        let path = format!("{CACHE_ROOT}/arm64/boot-framework.oat");
        let text = [maps_line(&path), maps_line(&path), maps_line(&path)].join("\n");

        let artifacts = mapped_artifacts(&text, "boot-framework", CACHE_ROOT);
        assert_eq!(artifacts.len(), 1);
    }

    #[test]
    fn matching_line_without_prefix_yields_no_entry() {
        let text = maps_line("/system/framework/oat/arm64/dalvik-cache-shim.oat");
        let artifacts = mapped_artifacts(&text, "dalvik-cache", CACHE_ROOT);
        assert!(artifacts.is_empty());
    }

    #[test]
    fn non_matching_lines_are_skipped() {
        let text = [
            maps_line("/system/lib64/libc.so"),
            maps_line(&format!("{CACHE_ROOT}/arm64/boot-framework.vdex")),
        ]
        .join("\n");

        let artifacts = mapped_artifacts(&text, "dalvik-cache", CACHE_ROOT);
        assert_eq!(artifacts.len(), 1);
    }
}
