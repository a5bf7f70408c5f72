//! Best-effort text translation.
//!
//! [`TranslationGateway`] never fails: an error from the underlying
//! [`Translator`] is logged and the original text is returned unchanged.

use std::cell::Cell;

use thiserror::Error;
use tracing::warn;

mod libre;

pub use libre::LibreTranslateClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    En,
    Es,
}

impl Language {
    /// Two-letter code used by translation services.
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }

    /// Upper-case tag stored in migrated records.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::En => "EN",
            Self::Es => "ES",
        }
    }
}

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("translation request failed: {0}")]
    Request(String),
    #[error("translation service returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("translation service returned an invalid response: {0}")]
    InvalidResponse(String),
    #[error("unsupported language pair {from}-{to}")]
    UnsupportedPair { from: &'static str, to: &'static str },
}

pub trait Translator {
    fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, TranslationError>;
}

/// Returns every input unchanged. Used when no translation backend is
/// configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughTranslator;

impl Translator for PassthroughTranslator {
    fn translate(
        &self,
        text: &str,
        _source: Language,
        _target: Language,
    ) -> Result<String, TranslationError> {
        Ok(text.to_string())
    }
}

pub struct TranslationGateway<'a> {
    translator: &'a dyn Translator,
    calls: Cell<usize>,
    failures: Cell<usize>,
}

impl<'a> TranslationGateway<'a> {
    pub fn new(translator: &'a dyn Translator) -> Self {
        Self {
            translator,
            calls: Cell::new(0),
            failures: Cell::new(0),
        }
    }

    pub fn translate(&self, text: &str, source: Language, target: Language) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        self.calls.set(self.calls.get() + 1);
        match self.translator.translate(text, source, target) {
            Ok(translated) => translated,
            Err(err) => {
                self.failures.set(self.failures.get() + 1);
                warn!(
                    source = source.code(),
                    target = target.code(),
                    error = %err,
                    "translation failed, keeping original text"
                );
                text.to_string()
            }
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn failures(&self) -> usize {
        self.failures.get()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FailingTranslator, UppercaseTranslator};
    use super::*;

    #[test]
    fn blank_input_skips_the_dependency() {
        let failing = FailingTranslator::default();
        let gateway = TranslationGateway::new(&failing);

        assert_eq!(gateway.translate("", Language::En, Language::Es), "");
        assert_eq!(gateway.translate("  \n\t", Language::En, Language::Es), "");
        assert_eq!(failing.attempts.get(), 0);
        assert_eq!(gateway.calls(), 0);
    }

    #[test]
    fn failure_returns_original_text() {
        let failing = FailingTranslator::default();
        let gateway = TranslationGateway::new(&failing);

        let result = gateway.translate("Hola mundo", Language::Es, Language::En);

        assert_eq!(result, "Hola mundo");
        assert_eq!(failing.attempts.get(), 1);
        assert_eq!(gateway.failures(), 1);
    }

    #[test]
    fn success_returns_translated_text() {
        let gateway = TranslationGateway::new(&UppercaseTranslator);
        assert_eq!(gateway.translate("hello", Language::En, Language::Es), "HELLO");
        assert_eq!(gateway.calls(), 1);
        assert_eq!(gateway.failures(), 0);
    }

    #[test]
    fn passthrough_keeps_text() {
        let gateway = TranslationGateway::new(&PassthroughTranslator);
        assert_eq!(gateway.translate("Buenos días", Language::Es, Language::En), "Buenos días");
    }

    #[test]
    fn language_codes_and_tags() {
        assert_eq!(Language::En.code(), "en");
        assert_eq!(Language::Es.tag(), "ES");
    }
}
