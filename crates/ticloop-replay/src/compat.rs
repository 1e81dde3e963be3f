//! Demo-compatibility guard.
//!
//! Decides whether a non-vanilla demo extension may be used. Recording
//! with an extension needs only a non-strict policy. Playing one back
//! additionally requires the demo to come from a raw capture file; demos
//! bundled inside a packaged archive are expected to be vanilla and are
//! played without the extension.

use std::path::Path;

use log::warn;

/// Where a demo being played back came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DemoSource {
    /// A standalone capture file (`.lmp`).
    RawCapture,
    /// A demo bundled inside a packaged archive.
    Packaged,
}

impl DemoSource {
    /// Classify a demo by its file path. A path whose extension is `lmp`,
    /// in any letter case, is a raw capture.
    pub fn from_path(path: &Path) -> Self {
        let raw = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("lmp"));
        if raw {
            Self::RawCapture
        } else {
            Self::Packaged
        }
    }
}

/// Compatibility policy for demo extensions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DemoPolicy {
    /// Refuse every non-vanilla extension.
    pub strict: bool,
}

impl DemoPolicy {
    /// A policy that refuses every extension.
    pub fn strict() -> Self {
        Self { strict: true }
    }

    /// Whether a recording may use `feature`.
    ///
    /// `conditional` is whether the recording wants the extension at all.
    pub fn allow_record_extension(&self, conditional: bool, feature: &str) -> bool {
        if !conditional || self.strict {
            return false;
        }
        warn!(
            "recording a demo with a non-vanilla extension ({feature}); \
             use a strict demo policy to disable it"
        );
        true
    }

    /// Whether playback of a demo from `source` may honour `feature`.
    ///
    /// `conditional` is whether the demo uses the extension.
    pub fn allow_playback_extension(
        &self,
        conditional: bool,
        source: DemoSource,
        feature: &str,
    ) -> bool {
        if !conditional || self.strict {
            return false;
        }
        if source == DemoSource::Packaged {
            warn!("packaged demo uses a non-vanilla extension ({feature})");
            return false;
        }
        warn!(
            "playing back a demo with a non-vanilla extension ({feature}); \
             use a strict demo policy to disable it"
        );
        true
    }
}
