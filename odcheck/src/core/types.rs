//! Shared deterministic types for artifact verification core logic.
//!
//! These types define stable contracts between core components. They should not
//! depend on external state or I/O and must remain deterministic across runs.

use serde::{Deserialize, Serialize};

/// Recognized on-disk suffix for an AOT-compiled artifact.
///
/// Boot-classpath images carry `.oat` code files while application-level
/// classpath entries (system server) carry `.odex`; both share `.art` and
/// `.vdex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Art,
    Oat,
    Odex,
    Vdex,
}

impl ArtifactKind {
    /// The file extension for this kind, including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Art => ".art",
            ArtifactKind::Oat => ".oat",
            ArtifactKind::Odex => ".odex",
            ArtifactKind::Vdex => ".vdex",
        }
    }

    /// Classify `path` by suffix against a set of candidate kinds.
    pub fn from_path(path: &str, kinds: &[ArtifactKind]) -> Option<ArtifactKind> {
        kinds
            .iter()
            .copied()
            .find(|kind| path.ends_with(kind.extension()))
    }
}

/// Artifact triple required for every boot-classpath extension.
pub const BOOT_ARTIFACT_KINDS: [ArtifactKind; 3] =
    [ArtifactKind::Art, ArtifactKind::Oat, ArtifactKind::Vdex];

/// Artifact triple required for every system-server classpath element.
pub const APP_ARTIFACT_KINDS: [ArtifactKind; 3] =
    [ArtifactKind::Art, ArtifactKind::Odex, ArtifactKind::Vdex];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_suffix_picks_matching_kind() {
        let kind = ArtifactKind::from_path("/a/b/boot-framework.oat", &BOOT_ARTIFACT_KINDS);
        assert_eq!(kind, Some(ArtifactKind::Oat));
    }

    #[test]
    fn classify_rejects_kind_outside_candidate_set() {
        // `.oat` is a boot kind, not an app kind.
        let kind = ArtifactKind::from_path("/a/b/boot-framework.oat", &APP_ARTIFACT_KINDS);
        assert_eq!(kind, None);
    }

    #[test]
    fn classify_rejects_unknown_suffix() {
        let kind = ArtifactKind::from_path("/a/b/boot-framework.txt", &BOOT_ARTIFACT_KINDS);
        assert_eq!(kind, None);
    }
}
