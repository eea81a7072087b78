use rust_decimal::Decimal;

use crate::shared::constants::PAYMENT_DESCRIPTION_PREFIX;
use crate::shared::i18n::{Language, TextKey, Translations};

/// An entry of the fixed service menu
#[derive(Debug, PartialEq, Eq)]
pub struct ServiceOption {
    pub label: TextKey,
    pub emoji: &'static str,
    /// English name, used in vendor descriptions
    pub name: &'static str,
    price_cents: i64,
}

pub const SERVICE_CATALOG: [ServiceOption; 6] = [
    ServiceOption {
        label: TextKey::ServiceInsurance,
        emoji: "🛡",
        name: "Insurance",
        price_cents: 3000,
    },
    ServiceOption {
        label: TextKey::ServiceTranslations,
        emoji: "🌐",
        name: "Translations",
        price_cents: 2500,
    },
    ServiceOption {
        label: TextKey::ServiceRestaurants,
        emoji: "🍽",
        name: "Restaurants",
        price_cents: 1500,
    },
    ServiceOption {
        label: TextKey::ServiceFlights,
        emoji: "✈️",
        name: "Flights",
        price_cents: 12000,
    },
    ServiceOption {
        label: TextKey::ServiceHotels,
        emoji: "🏨",
        name: "Hotels",
        price_cents: 15000,
    },
    ServiceOption {
        label: TextKey::ServiceOther,
        emoji: "🔎",
        name: "Other",
        price_cents: 2000,
    },
];

impl ServiceOption {
    pub fn price(&self) -> Decimal {
        Decimal::new(self.price_cents, 2)
    }

    /// Vendor-facing description, always in English
    pub fn description(&self) -> String {
        format!("{}: {}", PAYMENT_DESCRIPTION_PREFIX, self.name)
    }

    pub fn button(&self, translations: &Translations, language: Language) -> String {
        format!("{} {}", self.emoji, translations.text(self.label, language))
    }

    /// Menu entry named by `text` in any language, ignoring emoji and case
    pub fn find(text: &str, translations: &Translations) -> Option<&'static ServiceOption> {
        let wanted = normalize(text);
        if wanted.is_empty() {
            return None;
        }

        SERVICE_CATALOG.iter().find(|option| {
            normalize(option.name) == wanted
                || Language::ALL
                    .iter()
                    .any(|language| normalize(translations.text(option.label, *language)) == wanted)
        })
    }
}

/// Reply keyboard rows, two buttons per row
pub fn service_menu(translations: &Translations, language: Language) -> Vec<Vec<String>> {
    SERVICE_CATALOG
        .chunks(2)
        .map(|row| {
            row.iter()
                .map(|option| option.button(translations, language))
                .collect()
        })
        .collect()
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
