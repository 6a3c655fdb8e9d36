//! Platform definition registry.
//!
//! The four built-in definitions are compiled into the binary. A directory of
//! TOML files can replace any of them without a rebuild.

use crate::definition::PlatformDefinition;
use crate::error::{Result, ScrapeError};
use scout_core::Platform;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

const BUILTIN: [(&str, &str); 4] = [
    ("github.toml", include_str!("../definitions/github.toml")),
    ("behance.toml", include_str!("../definitions/behance.toml")),
    (
        "stackoverflow.toml",
        include_str!("../definitions/stackoverflow.toml"),
    ),
    ("devto.toml", include_str!("../definitions/devto.toml")),
];

/// Lookup table from platform to its definition.
#[derive(Debug, Clone)]
pub struct PlatformRegistry {
    definitions: HashMap<Platform, PlatformDefinition>,
}

impl PlatformRegistry {
    /// Registry holding the compiled-in definitions for every platform.
    pub fn builtin() -> Result<Self> {
        let mut definitions = HashMap::new();
        for (origin, source) in BUILTIN {
            let definition = parse_definition(source, origin)?;
            definitions.insert(definition.platform, definition);
        }
        Ok(Self { definitions })
    }

    /// Replace built-ins with any valid `*.toml` definitions found in `dir`.
    ///
    /// Files that fail to parse or validate are logged and skipped.
    pub fn with_overrides_from(mut self, dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(ScrapeError::DirectoryNotFound {
                path: dir.display().to_string(),
            });
        }

        let mut replaced = 0usize;
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                continue;
            }

            let origin = path.display().to_string();
            let loaded = std::fs::read_to_string(&path)
                .map_err(ScrapeError::from)
                .and_then(|source| parse_definition(&source, &origin));

            match loaded {
                Ok(definition) => {
                    debug!(
                        platform = %definition.platform,
                        path = %origin,
                        "overriding built-in platform definition"
                    );
                    self.definitions.insert(definition.platform, definition);
                    replaced += 1;
                }
                Err(e) => {
                    warn!(path = %origin, error = %e, "skipping invalid platform definition");
                }
            }
        }

        info!(count = replaced, dir = %dir.display(), "loaded platform definition overrides");
        Ok(self)
    }

    /// Definition for `platform`, if registered.
    #[must_use]
    pub fn get(&self, platform: Platform) -> Option<&PlatformDefinition> {
        self.definitions.get(&platform)
    }

    /// Number of registered platforms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether no platform is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Parse and validate one definition. `origin` names the source in errors.
pub fn parse_definition(source: &str, origin: &str) -> Result<PlatformDefinition> {
    let definition: PlatformDefinition =
        toml::from_str(source).map_err(|e| ScrapeError::DefinitionParse {
            origin: origin.to_string(),
            source: e,
        })?;
    definition.validate()?;
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_covers_every_platform() {
        let registry = PlatformRegistry::builtin().expect("built-in definitions are valid");
        assert_eq!(registry.len(), Platform::ALL.len());
        for platform in Platform::ALL {
            let definition = registry.get(platform).expect("definition registered");
            assert_eq!(definition.platform, platform);
            assert_eq!(definition.label, platform.label());
        }
    }

    #[test]
    fn test_builtin_details() {
        let registry = PlatformRegistry::builtin().expect("built-in definitions are valid");

        let github = registry.get(Platform::Github).expect("github");
        assert_eq!(github.discovery.strategies.len(), 4);
        assert!(github.skills.is_some());
        assert_eq!(github.fields.bio.truncate, Some(500));

        let behance = registry.get(Platform::Behance).expect("behance");
        assert!(behance.discovery.strategies.is_empty());
        assert_eq!(behance.search.scrolls, 3);
        assert_eq!(behance.search.timeout_ms, 45000);

        let devto = registry.get(Platform::Devto).expect("devto");
        assert!(devto.profile.marker.is_some());
    }

    #[test]
    fn test_parse_rejects_bad_regex() {
        let source = include_str!("../definitions/github.toml").replace(
            r#"fallback_pattern = 'href="(/[a-zA-Z0-9_-]+)"'"#,
            r#"fallback_pattern = 'href="(/[a-z'"#,
        );
        let err = parse_definition(&source, "broken.toml").expect_err("bad regex must fail");
        assert!(matches!(err, ScrapeError::InvalidDefinition { .. }));
    }

    #[test]
    fn test_parse_reports_origin() {
        let err = parse_definition("platform = 42", "numbers.toml").expect_err("must fail");
        assert!(err.to_string().contains("numbers.toml"));
    }

    #[test]
    fn test_overrides_replace_and_skip_invalid() {
        let tmp = TempDir::new().expect("create temp dir");
        let custom = include_str!("../definitions/devto.toml").replace("scrolls = 3", "scrolls = 7");
        std::fs::write(tmp.path().join("devto.toml"), custom).expect("write override");
        std::fs::write(tmp.path().join("broken.toml"), "platform = ").expect("write broken");
        std::fs::write(tmp.path().join("notes.txt"), "ignored").expect("write non-toml");

        let registry = PlatformRegistry::builtin()
            .expect("builtin")
            .with_overrides_from(tmp.path())
            .expect("overrides load");

        assert_eq!(registry.get(Platform::Devto).expect("devto").search.scrolls, 7);
        assert_eq!(registry.get(Platform::Behance).expect("behance").search.scrolls, 3);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_overrides_missing_dir() {
        let tmp = TempDir::new().expect("create temp dir");
        let result = PlatformRegistry::builtin()
            .expect("builtin")
            .with_overrides_from(&tmp.path().join("absent"));
        assert!(matches!(result, Err(ScrapeError::DirectoryNotFound { .. })));
    }
}
