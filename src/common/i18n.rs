// src/common/i18n.rs

use std::collections::HashMap;

use anyhow::Context;

pub const DEFAULT_LANG: &str = "en";

// Catálogos embutidos no binário: não dependem do diretório de execução.
const CATALOGS: [(&str, &str); 2] = [
    ("pt", include_str!("../../locales/pt.json")),
    ("en", include_str!("../../locales/en.json")),
];

/// Catálogo de mensagens por idioma (ex: "pt" -> "not_found.consumer" -> "Consumidor não encontrado.")
#[derive(Debug, Clone, Default)]
pub struct I18nStore {
    messages: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut messages = HashMap::new();
        for (lang, raw) in CATALOGS {
            let catalog: HashMap<String, String> = serde_json::from_str(raw)
                .with_context(|| format!("Catálogo de traduções '{}' inválido", lang))?;
            messages.insert(lang.to_string(), catalog);
        }
        Ok(Self { messages })
    }

    /// Idioma pedido -> inglês -> o próprio código.
    pub fn translate(&self, lang: &str, code: &str) -> String {
        [lang, DEFAULT_LANG]
            .iter()
            .find_map(|l| self.messages.get(*l).and_then(|catalog| catalog.get(code)))
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogs_share_the_same_keys() {
        let store = I18nStore::load().expect("catálogos válidos");
        let pt = &store.messages["pt"];
        let en = &store.messages["en"];

        let mut missing: Vec<&String> = pt.keys().filter(|k| !en.contains_key(*k)).collect();
        missing.extend(en.keys().filter(|k| !pt.contains_key(*k)));

        assert!(missing.is_empty(), "chaves sem tradução: {missing:?}");
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        let store = I18nStore::load().expect("catálogos válidos");

        assert_eq!(store.translate("de", "not_found.generator"), "Generator not found.");
        assert_eq!(store.translate("pt", "not_found.generator"), "Gerador não encontrado.");
    }

    #[test]
    fn unknown_code_is_returned_as_is() {
        let store = I18nStore::load().expect("catálogos válidos");

        assert_eq!(store.translate("pt", "does.not.exist"), "does.not.exist");
    }
}
