//! Verification of observed artifact sets against expectations.
//!
//! Two modes: boot-extension mode checks a fixed triple for one logical boot
//! image name; classpath mode derives expected paths for every element of a
//! running classpath and checks membership plus suffix validity. Failures are
//! accumulated, never short-circuited, so one pass reports everything.

use std::collections::BTreeSet;

use crate::core::artifact_path::{expected_artifact_path, isa_from_artifact_path};
use crate::core::failure::{Failure, VerificationReport};
use crate::core::types::{APP_ARTIFACT_KINDS, ArtifactKind, BOOT_ARTIFACT_KINDS};

/// Verify the boot-extension artifact triple for `boot_extension_name`.
///
/// The observed set must contain exactly one artifact per boot extension
/// (`.art`, `.oat`, `.vdex`) and nothing else.
pub fn verify_boot_extension_artifacts(
    observed: &BTreeSet<String>,
    boot_extension_name: &str,
) -> VerificationReport {
    let mut report = VerificationReport::new(format!("boot-extension:{boot_extension_name}"));

    let mut missing = Vec::new();
    for kind in BOOT_ARTIFACT_KINDS {
        let artifact = format!("{boot_extension_name}{}", kind.extension());
        if !observed.iter().any(|path| path.ends_with(&artifact)) {
            missing.push(kind.extension().to_string());
        }
    }

    if observed.len() != BOOT_ARTIFACT_KINDS.len() || !missing.is_empty() {
        report.push(Failure::IncompleteArtifactSet {
            name: boot_extension_name.to_string(),
            expected: BOOT_ARTIFACT_KINDS.len(),
            found: observed.len(),
            missing,
        });
    }

    report
}

/// Verify every classpath element has its complete artifact triple mapped.
///
/// The instruction-set segment is derived from an arbitrary observed member,
/// so the observed set must be non-empty. Two passes always run: membership
/// of every derived expected path, and suffix validity of every observed
/// member. Their failures are combined in the final report.
pub fn verify_classpath_artifacts(
    observed: &BTreeSet<String>,
    classpath: &[String],
    cache_root: &str,
) -> VerificationReport {
    let mut report = VerificationReport::new("classpath-artifacts");

    let Some(sample) = observed.iter().next() else {
        report.push(Failure::EmptyObservedSet);
        return report;
    };
    let Some(isa) = isa_from_artifact_path(sample) else {
        report.push(Failure::ParseError {
            message: format!("cannot derive instruction set from '{sample}'"),
        });
        return report;
    };

    for element in classpath {
        for kind in APP_ARTIFACT_KINDS {
            let expected = expected_artifact_path(cache_root, isa, element, kind.extension());
            if !observed.contains(&expected) {
                report.push(Failure::MissingArtifact { path: expected });
            }
        }
    }

    for artifact in observed {
        if ArtifactKind::from_path(artifact, &APP_ARTIFACT_KINDS).is_none() {
            report.push(Failure::UnrecognizedArtifactKind {
                path: artifact.clone(),
            });
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const CACHE_ROOT: &str = "/data/misc/apexdata/com.android.art/dalvik-cache";

    fn boot_set(extensions: &[&str]) -> BTreeSet<String> {
        extensions
            .iter()
            .map(|ext| format!("{CACHE_ROOT}/arm64/boot-framework{ext}"))
            .collect()
    }

    fn classpath_set(elements: &[&str]) -> BTreeSet<String> {
        let mut observed = BTreeSet::new();
        for element in elements {
            for kind in APP_ARTIFACT_KINDS {
                observed.insert(expected_artifact_path(
                    CACHE_ROOT,
                    "arm64",
                    element,
                    kind.extension(),
                ));
            }
        }
        observed
    }

    #[test]
    fn boot_triple_passes() {
        let observed = boot_set(&[".art", ".oat", ".vdex"]);
        let report = verify_boot_extension_artifacts(&observed, "boot-framework");
        assert!(report.is_pass(), "{report}");
    }

    #[test]
    fn boot_missing_oat_is_incomplete() {
        let observed = boot_set(&[".art", ".vdex"]);
        let report = verify_boot_extension_artifacts(&observed, "boot-framework");
        assert_eq!(
            report.failures,
            vec![Failure::IncompleteArtifactSet {
                name: "boot-framework".to_string(),
                expected: 3,
                found: 2,
                missing: vec![".oat".to_string()],
            }]
        );
    }

    #[test]
    fn boot_extra_member_fails_cardinality() {
        let mut observed = boot_set(&[".art", ".oat", ".vdex"]);
        observed.insert(format!("{CACHE_ROOT}/arm64/boot-framework.oat.bak"));
        let report = verify_boot_extension_artifacts(&observed, "boot-framework");
        assert_eq!(
            report.failures,
            vec![Failure::IncompleteArtifactSet {
                name: "boot-framework".to_string(),
                expected: 3,
                found: 4,
                missing: Vec::new(),
            }]
        );
    }

    #[test]
    fn classpath_with_complete_triples_passes() {
        let elements = vec![
            "/system/framework/services.jar".to_string(),
            "/apex/com.android.ipsec/javalib/ike.jar".to_string(),
        ];
        let observed = classpath_set(&["/system/framework/services.jar",
            "/apex/com.android.ipsec/javalib/ike.jar"]);
        let report = verify_classpath_artifacts(&observed, &elements, CACHE_ROOT);
        assert!(report.is_pass(), "{report}");
    }

    #[test]
    fn classpath_missing_member_reports_each_absent_path() {
        let elements = vec!["/system/framework/services.jar".to_string()];
        let mut observed = classpath_set(&["/system/framework/services.jar"]);
        let odex = expected_artifact_path(
            CACHE_ROOT,
            "arm64",
            "/system/framework/services.jar",
            ".odex",
        );
        observed.remove(&odex);

        let report = verify_classpath_artifacts(&observed, &elements, CACHE_ROOT);
        assert_eq!(report.failures, vec![Failure::MissingArtifact { path: odex }]);
    }

    #[test]
    fn classpath_unrecognized_suffix_reported_alongside_missing() {
        let elements = vec!["/system/framework/services.jar".to_string()];
        let mut observed = classpath_set(&["/system/framework/services.jar"]);
        let art = expected_artifact_path(
            CACHE_ROOT,
            "arm64",
            "/system/framework/services.jar",
            ".art",
        );
        observed.remove(&art);
        observed.insert(format!("{CACHE_ROOT}/arm64/rogue@classes.oat"));

        let report = verify_classpath_artifacts(&observed, &elements, CACHE_ROOT);
        // Both passes run; neither masks the other.
        assert!(report.failures.contains(&Failure::MissingArtifact { path: art }));
        assert!(report.failures.contains(&Failure::UnrecognizedArtifactKind {
            path: format!("{CACHE_ROOT}/arm64/rogue@classes.oat"),
        }));
        assert_eq!(report.failures.len(), 2);
    }

    #[test]
    fn classpath_empty_observed_set_is_explicit_failure() {
        let elements = vec!["/system/framework/services.jar".to_string()];
        let report = verify_classpath_artifacts(&BTreeSet::new(), &elements, CACHE_ROOT);
        assert_eq!(report.failures, vec![Failure::EmptyObservedSet]);
    }
}
