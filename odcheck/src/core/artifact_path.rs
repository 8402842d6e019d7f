//! Deterministic mapping from classpath elements to expected artifact paths.
//!
//! An element such as `/system/framework/services.jar` compiled for `arm64`
//! lands in the cache as
//! `<cache root>/arm64/system@framework@services.jar@classes.odex`: the
//! leading separator is stripped, remaining separators become literal `@`,
//! and the name is suffixed with `@classes` plus the artifact extension.

/// Escape a classpath element into its cache file-name form.
///
/// Strips the leading `/` and replaces every remaining `/` with `@`. The
/// transform is bijective over absolute paths, so distinct elements never
/// collide.
pub fn escape_classpath_element(element: &str) -> String {
    element.trim_start_matches('/').replace('/', "@")
}

/// Derive the expected on-disk artifact path for one classpath element.
pub fn expected_artifact_path(
    cache_root: &str,
    isa: &str,
    element: &str,
    extension: &str,
) -> String {
    format!(
        "{cache_root}/{isa}/{}@classes{extension}",
        escape_classpath_element(element)
    )
}

/// Recover the instruction-set segment from an artifact path.
///
/// Classpath artifacts live directly under `<cache root>/<isa>/`, so the ISA
/// is the second-to-last path component. Returns `None` when the path has
/// fewer than two components.
pub fn isa_from_artifact_path(path: &str) -> Option<&str> {
    let mut components = path.rsplit('/');
    components.next()?;
    components.next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const CACHE_ROOT: &str = "/data/misc/apexdata/com.android.art/dalvik-cache";

    #[test]
    fn escape_strips_leading_separator_and_replaces_the_rest() {
        assert_eq!(
            escape_classpath_element("/system/framework/services.jar"),
            "system@framework@services.jar"
        );
    }

    #[test]
    fn escape_handles_separator_heavy_paths() {
        assert_eq!(
            escape_classpath_element("/apex/com.android.permission/javalib/service-permission.jar"),
            "apex@com.android.permission@javalib@service-permission.jar"
        );
        assert_eq!(escape_classpath_element("/a/b/c/d/e"), "a@b@c@d@e");
    }

    #[test]
    fn expected_path_combines_root_isa_and_escaped_element() {
        let path = expected_artifact_path(
            CACHE_ROOT,
            "arm64",
            "/system/framework/services.jar",
            ".odex",
        );
        assert_eq!(
            path,
            format!("{CACHE_ROOT}/arm64/system@framework@services.jar@classes.odex")
        );
    }

    #[test]
    fn derivation_is_injective_over_elements_and_extensions() {
        let elements = [
            "/system/framework/services.jar",
            "/system/framework/ethernet-service.jar",
            "/apex/com.android.ipsec/javalib/android.net.ipsec.ike.jar",
        ];
        let extensions = [".art", ".odex", ".vdex"];

        let mut derived = HashSet::new();
        for element in elements {
            for extension in extensions {
                assert!(
                    derived.insert(expected_artifact_path(CACHE_ROOT, "arm64", element, extension)),
                    "collision for ({element}, {extension})"
                );
            }
        }
        assert_eq!(derived.len(), elements.len() * extensions.len());
    }

    #[test]
    fn isa_is_second_to_last_component() {
        let path = format!("{CACHE_ROOT}/arm64/system@framework@services.jar@classes.odex");
        assert_eq!(isa_from_artifact_path(&path), Some("arm64"));
    }

    #[test]
    fn isa_recovery_inverts_derivation() {
        let path = expected_artifact_path(CACHE_ROOT, "x86_64", "/system/framework/a.jar", ".art");
        assert_eq!(isa_from_artifact_path(&path), Some("x86_64"));
    }

    #[test]
    fn isa_missing_for_bare_file_name() {
        assert_eq!(isa_from_artifact_path("boot-framework.oat"), None);
    }
}
