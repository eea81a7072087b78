/// Transport-independent outgoing message
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub markup: ReplyMarkup,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplyMarkup {
    None,
    /// Reply keyboard with the service menu
    ServiceMenu(Vec<Vec<String>>),
    /// Single URL button leading to the vendor checkout
    PaymentLink { label: String, url: String },
    RemoveKeyboard,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: ReplyMarkup::None,
        }
    }

    pub fn with_markup(mut self, markup: ReplyMarkup) -> Self {
        self.markup = markup;
        self
    }
}
