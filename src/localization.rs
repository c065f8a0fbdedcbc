use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use unic_langid::LanguageIdentifier;
use anyhow::{anyhow, Result};

/// Language used when the user's is unknown or unsupported
pub const DEFAULT_LANGUAGE: &str = "es";

/// Bundled resources, one per supported language
const RESOURCES: [(&str, &str); 2] = [
    ("es", include_str!("../locales/es/main.ftl")),
    ("en", include_str!("../locales/en/main.ftl")),
];

/// Localization manager for the bot
pub struct LocalizationManager {
    bundles: HashMap<String, Arc<FluentBundle<FluentResource>>>,
}

impl LocalizationManager {
    /// Create a new localization manager with every bundled language
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for (code, source) in RESOURCES {
            let locale: LanguageIdentifier = code.parse()?;
            let bundle = Self::create_bundle(&locale, source)?;
            bundles.insert(code.to_string(), Arc::new(bundle));
        }

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(locale: &LanguageIdentifier, source: &str) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Plain-text replies; no bidi isolation marks around arguments
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("invalid {locale} resource: {errors:?}"))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("duplicate {locale} messages: {errors:?}"))?;

        Ok(bundle)
    }

    /// Whether a language has a bundle
    pub fn supports(&self, language: &str) -> bool {
        self.bundles.contains_key(language)
    }

    /// Get a localized message in a given language, falling back to the default
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let bundle = match self
            .bundles
            .get(language)
            .or_else(|| self.bundles.get(DEFAULT_LANGUAGE))
        {
            Some(bundle) => bundle,
            None => return format!("Missing translation: {}", key),
        };

        let msg = match bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let fluent_args = args.map(|args| {
            let mut fluent_args = FluentArgs::new();
            for (k, v) in args {
                fluent_args.set(*k, FluentValue::from(*v));
            }
            fluent_args
        });

        let mut errors = vec![];
        bundle
            .format_pattern(pattern, fluent_args.as_ref(), &mut errors)
            .into_owned()
    }

    /// Get a localized message with simple string arguments
    pub fn get_message_with_args(&self, key: &str, args: &[(&str, &str)], language: &str) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message_in_language(key, language, Some(&args_map))
    }
}

/// Global localization instance, built once
static LOCALIZATION_MANAGER: OnceLock<LocalizationManager> = OnceLock::new();

/// Initialize the global localization manager eagerly, surfacing resource errors
pub fn init_localization() -> Result<()> {
    if LOCALIZATION_MANAGER.get().is_none() {
        let manager = LocalizationManager::new()?;
        // Lost race: another caller installed an identical manager
        let _ = LOCALIZATION_MANAGER.set(manager);
    }
    Ok(())
}

/// Get the global localization manager, building it on first use
pub fn get_localization_manager() -> &'static LocalizationManager {
    LOCALIZATION_MANAGER.get_or_init(|| {
        LocalizationManager::new().unwrap_or_else(|e| {
            tracing::error!(error = %e, "Bundled translations failed to load");
            LocalizationManager {
                bundles: HashMap::new(),
            }
        })
    })
}

/// Map a Telegram language code (`es`, `en-US`, ...) to a supported language
pub fn detect_language(language_code: Option<&str>) -> &'static str {
    let primary = language_code
        .and_then(|code| code.split(['-', '_']).next())
        .map(|code| code.to_lowercase());

    RESOURCES
        .iter()
        .map(|(code, _)| *code)
        .find(|code| primary.as_deref() == Some(*code))
        .unwrap_or(DEFAULT_LANGUAGE)
}

/// Convenience function to get a localized message for a user's language
pub fn t_lang(key: &str, language_code: Option<&str>) -> String {
    get_localization_manager().get_message_in_language(key, detect_language(language_code), None)
}

/// Convenience function to get a localized message with arguments for a user's language
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
    get_localization_manager().get_message_with_args(key, args, detect_language(language_code))
}
