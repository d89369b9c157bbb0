//! Provider registry — static specs for the supported completion services.
//!
//! Each `ProviderSpec` describes how to reach one OpenAI-compatible
//! `/chat/completions` endpoint: default API base, default model, the env
//! var holding its key. Every provider takes a bearer token unless
//! `completion.authHeader` names another header.

// ─────────────────────────────────────────────
// ProviderSpec — static metadata for one provider
// ─────────────────────────────────────────────

/// Static description of one completion provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal name used in config (e.g. `"deepseek"`).
    pub name: &'static str,
    /// Human-readable name for logs. E.g. `"DeepSeek"`.
    pub display_name: &'static str,
    /// Environment variable for the API key. E.g. `"DEEPSEEK_API_KEY"`.
    pub env_key: &'static str,
    /// Default API base URL. `None` means it must come from config.
    pub default_api_base: Option<&'static str>,
    /// Model used when the config does not name one.
    pub default_model: &'static str,
}

// ─────────────────────────────────────────────
// Supported providers
// ─────────────────────────────────────────────

/// Every supported provider.
pub static PROVIDERS: &[ProviderSpec] = &[
    // DeepSeek — the default
    ProviderSpec {
        name: "deepseek",
        display_name: "DeepSeek",
        env_key: "DEEPSEEK_API_KEY",
        default_api_base: Some("https://api.deepseek.com"),
        default_model: "deepseek-chat",
    },
    ProviderSpec {
        name: "openai",
        display_name: "OpenAI",
        env_key: "OPENAI_API_KEY",
        default_api_base: Some("https://api.openai.com/v1"),
        default_model: "gpt-4o-mini",
    },
    // OpenRouter — gateway, model names carry a vendor prefix
    ProviderSpec {
        name: "openrouter",
        display_name: "OpenRouter",
        env_key: "OPENROUTER_API_KEY",
        default_api_base: Some("https://openrouter.ai/api/v1"),
        default_model: "deepseek/deepseek-chat",
    },
    ProviderSpec {
        name: "groq",
        display_name: "Groq",
        env_key: "GROQ_API_KEY",
        default_api_base: Some("https://api.groq.com/openai/v1"),
        default_model: "llama-3.3-70b-versatile",
    },
    // Custom — any OpenAI-compatible endpoint; apiBase and model are required
    ProviderSpec {
        name: "custom",
        display_name: "Custom",
        env_key: "CUSTOM_API_KEY",
        default_api_base: None,
        default_model: "",
    },
];

// ─────────────────────────────────────────────
// Lookup
// ─────────────────────────────────────────────

/// Find a provider spec by its config name (case-insensitive).
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    let name = name.trim().to_lowercase();
    PROVIDERS.iter().find(|spec| spec.name == name)
}

/// Names of all supported providers, for error messages.
pub fn provider_names() -> Vec<&'static str> {
    PROVIDERS.iter().map(|spec| spec.name).collect()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_name() {
        let spec = find_by_name("deepseek").unwrap();
        assert_eq!(spec.display_name, "DeepSeek");
        assert_eq!(spec.default_api_base, Some("https://api.deepseek.com"));
        assert_eq!(spec.default_model, "deepseek-chat");
    }

    #[test]
    fn test_find_by_name_case_insensitive() {
        assert_eq!(find_by_name(" OpenRouter ").unwrap().name, "openrouter");
    }

    #[test]
    fn test_find_by_name_unknown() {
        assert!(find_by_name("anthropic").is_none());
    }

    #[test]
    fn test_env_keys_follow_naming() {
        for spec in PROVIDERS {
            assert_eq!(
                spec.env_key,
                format!("{}_API_KEY", spec.name.to_uppercase()),
                "{} has an unexpected env key",
                spec.name
            );
        }
    }

    #[test]
    fn test_all_providers_have_unique_names() {
        let mut names = provider_names();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), PROVIDERS.len());
    }

    #[test]
    fn test_only_custom_lacks_defaults() {
        for spec in PROVIDERS {
            if spec.name == "custom" {
                assert!(spec.default_api_base.is_none());
            } else {
                assert!(spec.default_api_base.is_some());
                assert!(!spec.default_model.is_empty());
            }
        }
    }
}
