//! LLM provider implementations.
//!
//! Concrete [`LlmProvider`](personachat_core::llm::provider::LlmProvider)
//! implementations for Anthropic and the OpenAI-compatible vendors, plus the
//! factory that assembles an [`LlmDispatcher`] from whichever API keys are
//! present in the environment.

pub mod anthropic;
pub mod openai_compat;

use std::collections::HashMap;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use personachat_core::llm::box_provider::BoxLlmProvider;
use personachat_core::llm::dispatcher::LlmDispatcher;
use personachat_types::config::LlmConfig;
use personachat_types::llm::{LlmError, ProviderKind};

use self::anthropic::AnthropicProvider;
use self::openai_compat::OpenAiCompatibleProvider;

/// Provider API keys, one per vendor, read from the environment.
///
/// Keys are held as [`SecretString`] and never appear in `Debug` output.
#[derive(Default)]
pub struct ProviderKeys {
    keys: HashMap<ProviderKind, SecretString>,
}

impl ProviderKeys {
    /// Read `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `GOOGLE_API_KEY` and
    /// `MISTRAL_API_KEY`. Empty values count as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let keys = ProviderKind::ALL
            .into_iter()
            .filter_map(|kind| {
                lookup(kind.api_key_env())
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .map(|v| (kind, SecretString::from(v)))
            })
            .collect();
        Self { keys }
    }

    pub fn with_key(mut self, kind: ProviderKind, key: impl Into<String>) -> Self {
        self.keys.insert(kind, SecretString::from(key.into()));
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&SecretString> {
        self.keys.get(&kind)
    }

    pub fn is_set(&self, kind: ProviderKind) -> bool {
        self.keys.contains_key(&kind)
    }
}

impl std::fmt::Debug for ProviderKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let set: Vec<_> = ProviderKind::ALL
            .into_iter()
            .filter(|k| self.is_set(*k))
            .collect();
        f.debug_struct("ProviderKeys").field("set", &set).finish()
    }
}

/// Create the client for one vendor.
pub fn create_provider(
    kind: ProviderKind,
    api_key: SecretString,
    timeout: Duration,
) -> Result<BoxLlmProvider, LlmError> {
    let provider = match kind {
        ProviderKind::Anthropic => BoxLlmProvider::new(AnthropicProvider::new(api_key, timeout)?),
        ProviderKind::OpenAi => BoxLlmProvider::new(OpenAiCompatibleProvider::openai(api_key, timeout)),
        ProviderKind::Google => BoxLlmProvider::new(OpenAiCompatibleProvider::gemini(api_key, timeout)),
        ProviderKind::Mistral => {
            BoxLlmProvider::new(OpenAiCompatibleProvider::mistral(api_key, timeout))
        }
    };
    Ok(provider)
}

/// Build a dispatcher with a client registered for every vendor whose key is set.
///
/// A vendor whose client fails to build is logged and left unregistered,
/// so requests for its models fail with `NotConfigured`.
pub fn build_dispatcher(config: &LlmConfig, keys: &ProviderKeys) -> LlmDispatcher {
    let timeout = Duration::from_secs(config.timeout_secs);
    let mut dispatcher = LlmDispatcher::new(config.max_tokens, Some(config.temperature));

    for kind in ProviderKind::ALL {
        let Some(key) = keys.get(kind) else {
            info!(provider = %kind, env = kind.api_key_env(), "LLM provider not configured");
            continue;
        };
        let key = SecretString::from(key.expose_secret().to_owned());
        match create_provider(kind, key, timeout) {
            Ok(provider) => {
                info!(provider = %kind, "LLM provider configured");
                dispatcher.register(kind, provider);
            }
            Err(e) => warn!(provider = %kind, error = %e, "Failed to initialise LLM provider"),
        }
    }

    dispatcher
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_keys_from_lookup_ignores_blank() {
        let keys = ProviderKeys::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("ANTHROPIC_API_KEY", "   "),
            ("MISTRAL_API_KEY", "m-key"),
        ]));
        assert!(keys.is_set(ProviderKind::OpenAi));
        assert!(!keys.is_set(ProviderKind::Anthropic));
        assert!(!keys.is_set(ProviderKind::Google));
        assert!(keys.is_set(ProviderKind::Mistral));
    }

    #[test]
    fn test_keys_debug_hides_values() {
        let keys = ProviderKeys::default().with_key(ProviderKind::OpenAi, "sk-very-secret");
        let debug = format!("{keys:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("OpenAi"));
    }

    #[test]
    fn test_create_provider_names() {
        let t = Duration::from_secs(5);
        for (kind, name) in [
            (ProviderKind::OpenAi, "openai"),
            (ProviderKind::Anthropic, "anthropic"),
            (ProviderKind::Google, "google"),
            (ProviderKind::Mistral, "mistral"),
        ] {
            let provider = create_provider(kind, SecretString::from("k"), t).unwrap();
            assert_eq!(provider.name(), name);
        }
    }

    #[test]
    fn test_build_dispatcher_registers_only_keyed_vendors() {
        let keys = ProviderKeys::default()
            .with_key(ProviderKind::Anthropic, "a")
            .with_key(ProviderKind::Google, "g");
        let dispatcher = build_dispatcher(&LlmConfig::default(), &keys);

        assert_eq!(
            dispatcher.configured(),
            vec![ProviderKind::Anthropic, ProviderKind::Google]
        );
        assert!(!dispatcher.is_configured(ProviderKind::OpenAi));
    }

    #[test]
    fn test_build_dispatcher_without_keys() {
        let dispatcher = build_dispatcher(&LlmConfig::default(), &ProviderKeys::default());
        assert!(dispatcher.configured().is_empty());
    }
}
