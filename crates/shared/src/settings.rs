//! Provider configuration and session defaults.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostClass {
    Free,
    Metered,
    Premium,
}

/// Static description of one AI backend. The orchestrator walks the ordered
/// descriptor list on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub id: String,
    pub display_name: String,
    /// Approximate prompt-size ceiling in estimator units, not real tokens.
    pub prompt_token_ceiling: usize,
    pub supports_images: bool,
    pub cost_class: CostClass,
}

/// Settings a session is created with. The provider list is ordered by
/// preference; the free-tier entry is the terminal rung of the fallback
/// ladder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    pub providers: Vec<ProviderDescriptor>,
    pub default_provider: String,
    /// Id of the free-tier default. Once the ladder lands here, its failure
    /// is surfaced instead of hopping again.
    pub free_tier_provider: String,
    /// Base URL of the generation API.
    pub api_base_url: String,
    /// Fixed per-call ceiling after which an attempt is aborted as a timeout.
    pub request_timeout_secs: u64,
}

impl SessionSettings {
    pub fn descriptor(&self, id: &str) -> Option<&ProviderDescriptor> {
        self.providers.iter().find(|p| p.id == id)
    }

    /// Next provider in preference order after `current` that can serve the
    /// request's modality.
    pub fn fallback_after(&self, current: &str, needs_images: bool) -> Option<&ProviderDescriptor> {
        let pos = self.providers.iter().position(|p| p.id == current)?;
        self.providers[pos + 1..]
            .iter()
            .find(|p| !needs_images || p.supports_images)
    }

    pub fn is_free_tier(&self, id: &str) -> bool {
        id == self.free_tier_provider
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            providers: vec![
                ProviderDescriptor {
                    id: "atlas-pro".into(),
                    display_name: "Atlas Pro".into(),
                    prompt_token_ceiling: 32_000,
                    supports_images: true,
                    cost_class: CostClass::Premium,
                },
                ProviderDescriptor {
                    id: "atlas-mini".into(),
                    display_name: "Atlas Mini".into(),
                    prompt_token_ceiling: 16_000,
                    supports_images: true,
                    cost_class: CostClass::Metered,
                },
                ProviderDescriptor {
                    id: "community-free".into(),
                    display_name: "Community (free)".into(),
                    prompt_token_ceiling: 8_000,
                    supports_images: false,
                    cost_class: CostClass::Free,
                },
            ],
            default_provider: "atlas-pro".into(),
            free_tier_provider: "community-free".into(),
            api_base_url: "https://api.kanvas.app/v1".into(),
            request_timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_walks_preference_order() {
        let settings = SessionSettings::default();
        let next = settings.fallback_after("atlas-pro", false).unwrap();
        assert_eq!(next.id, "atlas-mini");
    }

    #[test]
    fn fallback_skips_providers_without_image_support() {
        let settings = SessionSettings::default();
        // community-free cannot take images, so there is nowhere to go.
        assert!(settings.fallback_after("atlas-mini", true).is_none());
        let next = settings.fallback_after("atlas-mini", false).unwrap();
        assert_eq!(next.id, "community-free");
    }

    #[test]
    fn fallback_from_unknown_provider_is_none() {
        let settings = SessionSettings::default();
        assert!(settings.fallback_after("nope", false).is_none());
    }
}
