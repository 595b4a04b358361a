//! User-facing error text.

use crate::client::ApiError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Sv,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "en-us" | "en-gb" | "english" => Ok(Locale::En),
            "sv" | "sv-se" | "swedish" | "svenska" => Ok(Locale::Sv),
            _ => Err(format!("Unsupported locale: {}", s)),
        }
    }
}

/// Message catalogue entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Network,
    Server,
    Timeout,
    RateLimited,
    Generic,
    EmptyMessage,
    MessageTooLong(usize),
    ConnectionRestored,
    CacheCleared,
}

impl Locale {
    pub fn text(self, notice: Notice) -> String {
        match (self, notice) {
            (Locale::En, Notice::Network) => {
                "Could not connect to the server. Check your internet connection.".into()
            }
            (Locale::En, Notice::Server) => "A server error occurred. Please try again later.".into(),
            (Locale::En, Notice::Timeout) => "The request took too long. Please try again.".into(),
            (Locale::En, Notice::RateLimited) => {
                "You are sending too many messages. Wait a moment and try again.".into()
            }
            (Locale::En, Notice::Generic) => "An unexpected error occurred. Please try again.".into(),
            (Locale::En, Notice::EmptyMessage) => "Type a message before sending.".into(),
            (Locale::En, Notice::MessageTooLong(max)) => {
                format!("The message is too long. Maximum {} characters.", max)
            }
            (Locale::En, Notice::ConnectionRestored) => "Connection restored.".into(),
            (Locale::En, Notice::CacheCleared) => "Cache cleared.".into(),

            (Locale::Sv, Notice::Network) => {
                "Kunde inte ansluta till servern. Kontrollera internetanslutningen.".into()
            }
            (Locale::Sv, Notice::Server) => "Ett serverfel inträffade. Försök igen senare.".into(),
            (Locale::Sv, Notice::Timeout) => "Begäran tog för lång tid. Försök igen.".into(),
            (Locale::Sv, Notice::RateLimited) => {
                "Du skickar för många meddelanden. Vänta en stund och försök igen.".into()
            }
            (Locale::Sv, Notice::Generic) => "Ett oväntat fel inträffade. Försök igen.".into(),
            (Locale::Sv, Notice::EmptyMessage) => "Skriv ett meddelande innan du skickar.".into(),
            (Locale::Sv, Notice::MessageTooLong(max)) => {
                format!("Meddelandet är för långt. Maximalt {} tecken.", max)
            }
            (Locale::Sv, Notice::ConnectionRestored) => "Anslutningen återställdes.".into(),
            (Locale::Sv, Notice::CacheCleared) => "Cache rensad.".into(),
        }
    }

    /// Text to show the user for a failed request.
    ///
    /// Checked in order: 429, timeout (including 408 and 504), 5xx, transport
    /// failure, local validation (its own message), then the server's message
    /// or the generic fallback.
    pub fn describe(self, error: &ApiError) -> String {
        match error {
            ApiError::Http { status: 429, .. } => self.text(Notice::RateLimited),
            ApiError::Timeout(_) | ApiError::Http { status: 408 | 504, .. } => {
                self.text(Notice::Timeout)
            }
            ApiError::Http { status, .. } if *status >= 500 => self.text(Notice::Server),
            ApiError::Network(_) => self.text(Notice::Network),
            ApiError::Validation { message, .. } => message.clone(),
            ApiError::Http { message, .. } if !message.trim().is_empty() => message.clone(),
            _ => self.text(Notice::Generic),
        }
    }
}
