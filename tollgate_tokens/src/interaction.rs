use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a token should be obtained when it cannot be obtained silently
///
/// Only [`Popup`][InteractionType::Popup] and
/// [`Redirect`][InteractionType::Redirect] are usable as a fallback.
/// [`Silent`][InteractionType::Silent] is accepted in configuration so that
/// it can be reported as a misconfiguration when a token is first needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionType {
    /// Prompt the user in a separate window and resume the request
    Popup,
    /// Navigate away to the identity provider, abandoning the request
    Redirect,
    /// No interaction
    Silent,
}

/// The interactive mode requested of an identity provider
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InteractiveMode {
    /// Prompt the user in a separate window
    Popup,
    /// Navigate away to the identity provider
    Redirect,
}

impl InteractionType {
    /// Resolves the interactive mode to fall back to
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInteractionType`] when the interaction type cannot be
    /// used for interactive acquisition.
    pub fn interactive_mode(self) -> Result<InteractiveMode, InvalidInteractionType> {
        match self {
            Self::Popup => Ok(InteractiveMode::Popup),
            Self::Redirect => Ok(InteractiveMode::Redirect),
            Self::Silent => Err(InvalidInteractionType { provided: self }),
        }
    }
}

impl From<InteractiveMode> for InteractionType {
    #[inline]
    fn from(mode: InteractiveMode) -> Self {
        match mode {
            InteractiveMode::Popup => Self::Popup,
            InteractiveMode::Redirect => Self::Redirect,
        }
    }
}

/// The configured interaction type cannot be used to acquire tokens interactively
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("Invalid interaction type provided to the access token interceptor. InteractionType.Popup, InteractionType.Redirect must be provided in the interceptor configuration")]
pub struct InvalidInteractionType {
    provided: InteractionType,
}

impl InvalidInteractionType {
    /// The stable code identifying this error
    pub const ERROR_CODE: &'static str = "invalid_interaction_type";

    /// The stable code identifying this error
    #[inline]
    pub fn error_code(&self) -> &'static str {
        Self::ERROR_CODE
    }

    /// The interaction type that was rejected
    #[inline]
    pub fn provided(&self) -> InteractionType {
        self.provided
    }
}
