//! Field extraction from a loaded profile page.

use crate::definition::{FieldChain, PlatformDefinition, SkillsConfig};
use scout_browser::PageActions;
use scout_core::{CandidateUrl, Platform, PlatformProfile};
use tracing::debug;

/// Applies a platform's field chains to profile pages.
#[derive(Debug, Clone)]
pub struct Extractor {
    definition: PlatformDefinition,
}

impl Extractor {
    /// Extractor driven by `definition`.
    #[must_use]
    pub fn new(definition: PlatformDefinition) -> Self {
        Self { definition }
    }

    fn platform(&self) -> Platform {
        self.definition.platform
    }

    /// Whether the loaded page is a profile. Pages are assumed to be profiles
    /// unless the definition names a marker selector.
    pub async fn is_profile_page(&self, page: &dyn PageActions) -> bool {
        let Some(marker) = &self.definition.profile.marker else {
            return true;
        };
        match page.exists(marker).await {
            Ok(present) => present,
            Err(e) => {
                debug!(platform = %self.platform(), error = %e, "profile marker check failed");
                false
            }
        }
    }

    /// Best-effort record for the page at `url`. Never fails; fields with no
    /// accepted strategy stay empty.
    pub async fn extract(&self, page: &dyn PageActions, url: &CandidateUrl) -> PlatformProfile {
        let fields = &self.definition.fields;
        let mut profile = PlatformProfile::new(url.as_str());

        profile.full_name = self.first_match(page, "name", &fields.name).await;
        profile.bio = self.first_match(page, "bio", &fields.bio).await;
        profile.location = self.first_match(page, "location", &fields.location).await;
        profile.company = self.first_match(page, "company", &fields.company).await;
        profile.website = self.first_match(page, "website", &fields.website).await;

        if let Some(skills) = &self.definition.skills {
            self.harvest_skills(page, skills, &mut profile).await;
        }

        profile
    }

    /// Try each strategy in order; the first accepted value wins.
    async fn first_match(&self, page: &dyn PageActions, field: &str, chain: &FieldChain) -> String {
        for (index, strategy) in chain.strategies.iter().enumerate() {
            match page.query_text(&strategy.selector).await {
                Ok(Some(raw)) => {
                    if let Some(value) = strategy.accept(&raw) {
                        debug!(
                            platform = %self.platform(),
                            field,
                            strategy = index,
                            selector = %strategy.selector,
                            "field matched"
                        );
                        return chain.apply_truncate(value);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    debug!(
                        platform = %self.platform(),
                        field,
                        selector = %strategy.selector,
                        error = %e,
                        "field strategy failed"
                    );
                }
            }
        }
        String::new()
    }

    async fn harvest_skills(
        &self,
        page: &dyn PageActions,
        skills: &SkillsConfig,
        profile: &mut PlatformProfile,
    ) {
        let texts = match page.query_all_text(&skills.selector).await {
            Ok(texts) => texts,
            Err(e) => {
                debug!(platform = %self.platform(), error = %e, "skills strategy failed");
                return;
            }
        };

        for raw in texts.iter().take(skills.limit) {
            let skill = raw.trim();
            if skills
                .max_len
                .is_some_and(|max| skill.chars().count() > max)
            {
                continue;
            }
            profile.push_skill(skill);
        }
    }
}
