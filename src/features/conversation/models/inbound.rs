/// What the user sent, stripped of transport details
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Start,
    Help,
    Cancel,
    /// `/language <code>`; the argument may be empty
    Language(String),
    Text(String),
}

impl Input {
    /// Label used for `commands_total` and `response_time_seconds`
    pub fn name(&self) -> &'static str {
        match self {
            Input::Start => "start",
            Input::Help => "help",
            Input::Cancel => "cancel",
            Input::Language(_) => "language",
            Input::Text(_) => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundUpdate {
    /// Telegram chat id
    pub identity: i64,
    /// IETF tag reported by the client, e.g. `ru-RU`
    pub locale: Option<String>,
    pub input: Input,
}
