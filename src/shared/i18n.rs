//! Localized user-facing text.
//!
//! Every message the bot sends goes through [`Translations`]. The English table is
//! exhaustive over [`TextKey`], so a lookup can always fall back to it; other
//! languages may be partial.

use crate::shared::validation::LANGUAGE_TAG_REGEX;

/// Languages with a built-in translation table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    En,
    Ru,
    Es,
    Zh,
}

impl Language {
    pub const DEFAULT: Language = Language::En;

    pub const ALL: [Language; 4] = [Language::En, Language::Ru, Language::Es, Language::Zh];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ru => "ru",
            Language::Es => "es",
            Language::Zh => "zh",
        }
    }

    /// Exact two-letter code lookup (case-insensitive)
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Language::En),
            "ru" => Some(Language::Ru),
            "es" => Some(Language::Es),
            "zh" => Some(Language::Zh),
            _ => None,
        }
    }

    /// Lookup by IETF tag, using only the primary subtag (`ru-RU` -> `ru`)
    pub fn from_tag(tag: &str) -> Option<Self> {
        LANGUAGE_TAG_REGEX
            .captures(tag.trim())
            .and_then(|c| c.get(1))
            .and_then(|m| Self::from_code(m.as_str()))
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Keys of every localized string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKey {
    Welcome,
    SelectService,
    PaymentError,
    RateLimited,
    GenericError,
    InvalidSelection,
    PaymentLink,
    PaymentButton,
    PaymentReceived,
    PaymentFailed,
    StartHint,
    Help,
    Cancelled,
    LanguageChanged,
    LanguageUnsupported,
    ServiceInsurance,
    ServiceTranslations,
    ServiceRestaurants,
    ServiceFlights,
    ServiceHotels,
    ServiceOther,
}

/// Translation table restricted to the configured language set
#[derive(Debug, Clone)]
pub struct Translations {
    supported: Vec<Language>,
}

impl Translations {
    pub fn new(supported: Vec<Language>) -> Self {
        Self { supported }
    }

    pub fn supported(&self) -> &[Language] {
        &self.supported
    }

    /// Text for `key` in `language`.
    ///
    /// Languages outside the configured set, and keys missing from a language's
    /// table, fall back to the default language. Free-form codes reach this as a
    /// `Language` through `negotiate`, `parse_supported` or `Language::from_code`.
    pub fn text(&self, key: TextKey, language: Language) -> &'static str {
        if !self.supported.contains(&language) {
            return english(key);
        }

        let localized = match language {
            Language::En => None,
            Language::Ru => russian(key),
            Language::Es => spanish(key),
            Language::Zh => chinese(key),
        };

        localized.unwrap_or_else(|| english(key))
    }

    /// Language for a first-seen client locale, or the default language
    pub fn negotiate(&self, locale: Option<&str>) -> Language {
        locale
            .and_then(Language::from_tag)
            .filter(|l| self.supported.contains(l))
            .unwrap_or(Language::DEFAULT)
    }

    /// Supported language for an explicit user request, if any
    pub fn parse_supported(&self, tag: &str) -> Option<Language> {
        Language::from_tag(tag).filter(|l| self.supported.contains(l))
    }
}

fn english(key: TextKey) -> &'static str {
    match key {
        TextKey::Welcome => "Welcome to Travel Assistant!",
        TextKey::SelectService => "Please select a service:",
        TextKey::PaymentError => "Payment error occurred.",
        TextKey::RateLimited => "Too many requests. Please try again later.",
        TextKey::GenericError => "An error occurred. Please try again later.",
        TextKey::InvalidSelection => {
            "Please choose a service from the menu. Send /start to see it again."
        }
        TextKey::PaymentLink => "Your payment is ready. Tap the button below to pay.",
        TextKey::PaymentButton => "Pay now",
        TextKey::PaymentReceived => "Payment received. Thank you!",
        TextKey::PaymentFailed => "Payment was not completed. Send /start to try again.",
        TextKey::StartHint => "Send /start to see the available services.",
        TextKey::Help => {
            "Send /start to choose a service, /cancel to reset, /language <code> to switch language."
        }
        TextKey::Cancelled => "Cancelled. Send /start to begin again.",
        TextKey::LanguageChanged => "Language updated.",
        TextKey::LanguageUnsupported => "This language is not supported. Available:",
        TextKey::ServiceInsurance => "Insurance",
        TextKey::ServiceTranslations => "Translations",
        TextKey::ServiceRestaurants => "Restaurants",
        TextKey::ServiceFlights => "Flights",
        TextKey::ServiceHotels => "Hotels",
        TextKey::ServiceOther => "Other",
    }
}

fn russian(key: TextKey) -> Option<&'static str> {
    let text = match key {
        TextKey::Welcome => "Добро пожаловать в помощник путешественника!",
        TextKey::SelectService => "Пожалуйста, выберите услугу:",
        TextKey::PaymentError => "Произошла ошибка оплаты.",
        TextKey::RateLimited => "Слишком много запросов. Пожалуйста, попробуйте позже.",
        TextKey::GenericError => "Произошла ошибка. Пожалуйста, попробуйте позже.",
        TextKey::InvalidSelection => {
            "Пожалуйста, выберите услугу из меню. Отправьте /start, чтобы увидеть его снова."
        }
        TextKey::PaymentLink => "Ваш платёж готов. Нажмите кнопку ниже, чтобы оплатить.",
        TextKey::PaymentButton => "Оплатить",
        TextKey::PaymentReceived => "Оплата получена. Спасибо!",
        TextKey::PaymentFailed => "Оплата не завершена. Отправьте /start, чтобы попробовать снова.",
        TextKey::StartHint => "Отправьте /start, чтобы увидеть доступные услуги.",
        TextKey::Help => {
            "Отправьте /start, чтобы выбрать услугу, /cancel для сброса, /language <код> для смены языка."
        }
        TextKey::Cancelled => "Отменено. Отправьте /start, чтобы начать заново.",
        TextKey::LanguageChanged => "Язык обновлён.",
        TextKey::LanguageUnsupported => "Этот язык не поддерживается. Доступные:",
        TextKey::ServiceInsurance => "Страховка",
        TextKey::ServiceTranslations => "Переводы",
        TextKey::ServiceRestaurants => "Рестораны",
        TextKey::ServiceFlights => "Авиабилеты",
        TextKey::ServiceHotels => "Отели",
        TextKey::ServiceOther => "Другое",
    };
    Some(text)
}

fn spanish(key: TextKey) -> Option<&'static str> {
    let text = match key {
        TextKey::Welcome => "¡Bienvenido al Asistente de Viajes!",
        TextKey::SelectService => "Por favor, seleccione un servicio:",
        TextKey::PaymentError => "Ocurrió un error en el pago.",
        TextKey::RateLimited => "Demasiadas solicitudes. Por favor, inténtelo más tarde.",
        TextKey::GenericError => "Ocurrió un error. Por favor, inténtelo más tarde.",
        TextKey::InvalidSelection => {
            "Por favor, elija un servicio del menú. Envíe /start para verlo de nuevo."
        }
        TextKey::PaymentLink => "Su pago está listo. Pulse el botón de abajo para pagar.",
        TextKey::PaymentButton => "Pagar",
        TextKey::PaymentReceived => "Pago recibido. ¡Gracias!",
        TextKey::PaymentFailed => "El pago no se completó. Envíe /start para intentarlo de nuevo.",
        TextKey::StartHint => "Envíe /start para ver los servicios disponibles.",
        TextKey::Help => {
            "Envíe /start para elegir un servicio, /cancel para reiniciar, /language <código> para cambiar de idioma."
        }
        TextKey::Cancelled => "Cancelado. Envíe /start para empezar de nuevo.",
        TextKey::LanguageChanged => "Idioma actualizado.",
        TextKey::LanguageUnsupported => "Este idioma no está disponible. Disponibles:",
        TextKey::ServiceInsurance => "Seguro",
        TextKey::ServiceTranslations => "Traducciones",
        TextKey::ServiceRestaurants => "Restaurantes",
        TextKey::ServiceFlights => "Vuelos",
        TextKey::ServiceHotels => "Hoteles",
        TextKey::ServiceOther => "Otro",
    };
    Some(text)
}

// Partial table: missing keys fall back to English.
fn chinese(key: TextKey) -> Option<&'static str> {
    let text = match key {
        TextKey::Welcome => "欢迎使用旅行助手！",
        TextKey::SelectService => "请选择服务：",
        TextKey::PaymentError => "支付发生错误。",
        TextKey::RateLimited => "请求过多，请稍后再试。",
        TextKey::GenericError => "发生错误，请稍后再试。",
        TextKey::PaymentButton => "立即支付",
        TextKey::PaymentReceived => "已收到付款，谢谢！",
        TextKey::ServiceInsurance => "保险",
        TextKey::ServiceTranslations => "翻译",
        TextKey::ServiceRestaurants => "餐厅",
        TextKey::ServiceFlights => "机票",
        TextKey::ServiceHotels => "酒店",
        TextKey::ServiceOther => "其他",
        _ => return None,
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KEYS: [TextKey; 21] = [
        TextKey::Welcome,
        TextKey::SelectService,
        TextKey::PaymentError,
        TextKey::RateLimited,
        TextKey::GenericError,
        TextKey::InvalidSelection,
        TextKey::PaymentLink,
        TextKey::PaymentButton,
        TextKey::PaymentReceived,
        TextKey::PaymentFailed,
        TextKey::StartHint,
        TextKey::Help,
        TextKey::Cancelled,
        TextKey::LanguageChanged,
        TextKey::LanguageUnsupported,
        TextKey::ServiceInsurance,
        TextKey::ServiceTranslations,
        TextKey::ServiceRestaurants,
        TextKey::ServiceFlights,
        TextKey::ServiceHotels,
        TextKey::ServiceOther,
    ];

    fn all_languages() -> Translations {
        Translations::new(Language::ALL.to_vec())
    }

    #[test]
    fn test_text_is_never_empty_for_any_language_string() {
        let translations = all_languages();
        for code in ["en", "ru", "es", "zh", "de", "", "RU", "xx-YY", "🙂"] {
            let language = translations.negotiate(Some(code));
            for key in ALL_KEYS {
                assert!(
                    !translations.text(key, language).is_empty(),
                    "empty text for {:?} in '{}'",
                    key,
                    code
                );
            }
        }
    }

    #[test]
    fn test_text_uses_requested_language() {
        let translations = all_languages();
        assert_eq!(
            translations.text(TextKey::Welcome, Language::Ru),
            "Добро пожаловать в помощник путешественника!"
        );
        assert_eq!(
            translations.text(TextKey::SelectService, Language::Es),
            "Por favor, seleccione un servicio:"
        );
    }

    #[test]
    fn test_unknown_language_falls_back_to_english() {
        let translations = all_languages();
        let language = translations.negotiate(Some("de"));
        assert_eq!(
            translations.text(TextKey::Welcome, language),
            "Welcome to Travel Assistant!"
        );
    }

    #[test]
    fn test_missing_key_falls_back_to_english() {
        let translations = all_languages();
        assert_eq!(
            translations.text(TextKey::Cancelled, Language::Zh),
            "Cancelled. Send /start to begin again."
        );
        assert_eq!(
            translations.text(TextKey::Welcome, Language::Zh),
            "欢迎使用旅行助手！"
        );
    }

    #[test]
    fn test_unsupported_configured_language_falls_back_to_english() {
        let translations = Translations::new(vec![Language::En, Language::Es]);
        assert_eq!(
            translations.text(TextKey::PaymentError, Language::Ru),
            "Payment error occurred."
        );
        assert_eq!(translations.negotiate(Some("ru")), Language::En);
        assert_eq!(translations.parse_supported("ru"), None);
    }

    #[test]
    fn test_negotiate_locale() {
        let translations = all_languages();
        assert_eq!(translations.negotiate(Some("ru")), Language::Ru);
        assert_eq!(translations.negotiate(Some("ru-RU")), Language::Ru);
        assert_eq!(translations.negotiate(Some("zh-hans")), Language::Zh);
        assert_eq!(translations.negotiate(Some("pt-br")), Language::En);
        assert_eq!(translations.negotiate(None), Language::En);
    }

    #[test]
    fn test_language_code_round_trip() {
        for language in Language::ALL {
            assert_eq!(Language::from_code(language.code()), Some(language));
        }
        assert_eq!(Language::from_code("ES"), Some(Language::Es));
        assert_eq!(Language::from_code("de"), None);
    }
}
