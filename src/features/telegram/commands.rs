use teloxide::utils::command::BotCommands;

use crate::features::conversation::Input;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "choose a travel service")]
    Start,
    #[command(description = "show help")]
    Help,
    #[command(description = "cancel the current selection")]
    Cancel,
    #[command(description = "switch language, e.g. /language ru")]
    Language(String),
}

impl From<Command> for Input {
    fn from(command: Command) -> Self {
        match command {
            Command::Start => Input::Start,
            Command::Help => Input::Help,
            Command::Cancel => Input::Cancel,
            Command::Language(tag) => Input::Language(tag.trim().to_string()),
        }
    }
}
