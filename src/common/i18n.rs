// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "pt";

const EMBEDDED: [(&str, &str); 2] = [
    ("pt", include_str!("../../locales/pt.json")),
    ("en", include_str!("../../locales/en.json")),
];

/// Catálogo de mensagens por idioma.
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    /// Carrega os catálogos embutidos no binário.
    pub fn embedded() -> anyhow::Result<Self> {
        let mut catalogs = HashMap::new();
        for (lang, raw) in EMBEDDED {
            let catalog: HashMap<String, String> = serde_json::from_str(raw)
                .map_err(|e| anyhow::anyhow!("Catálogo de mensagens '{}' inválido: {}", lang, e))?;
            catalogs.insert(lang.to_string(), catalog);
        }
        Ok(Self { catalogs })
    }

    /// Traduz a chave. Cai para o idioma padrão e, por último, para a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.catalogs
            .get(lang)
            .and_then(|c| c.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|c| c.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogs_have_the_same_keys() {
        let store = I18nStore::embedded().unwrap();
        let pt = &store.catalogs["pt"];
        let en = &store.catalogs["en"];
        for key in pt.keys() {
            assert!(en.contains_key(key), "chave '{key}' sem tradução em inglês");
        }
        assert_eq!(pt.len(), en.len());
    }

    #[test]
    fn unknown_language_falls_back_to_portuguese() {
        let store = I18nStore::embedded().unwrap();
        assert_eq!(
            store.translate("de", "invalid_credentials"),
            store.translate("pt", "invalid_credentials")
        );
        assert_eq!(store.translate("en", "sem_chave"), "sem_chave");
    }
}
