use serde::Serialize;

/// Post-payment page states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JourneyState {
    Loading,
    Verified,
    GeneratingBrief,
    BriefReady,
    VerificationFailed,
    ErrorDisplayed,
}

/// Tracks one post-payment page from verification to a ready brief.
///
/// Brief generation may start at most once per journey, even when the
/// verification step is retried.
#[derive(Debug, Clone)]
pub struct Journey {
    state: JourneyState,
    generation_started: bool,
    error: Option<String>,
}

impl Journey {
    pub fn new() -> Self {
        Self {
            state: JourneyState::Loading,
            generation_started: false,
            error: None,
        }
    }

    pub fn state(&self) -> JourneyState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn generation_started(&self) -> bool {
        self.generation_started
    }

    /// Transition: Loading → Verified
    pub fn mark_verified(&mut self) -> Result<(), JourneyError> {
        self.expect(JourneyState::Loading, JourneyState::Verified)?;
        self.state = JourneyState::Verified;
        Ok(())
    }

    /// Transition: Loading → VerificationFailed
    pub fn mark_verification_failed(&mut self, reason: impl Into<String>) -> Result<(), JourneyError> {
        self.expect(JourneyState::Loading, JourneyState::VerificationFailed)?;
        self.state = JourneyState::VerificationFailed;
        self.error = Some(reason.into());
        Ok(())
    }

    /// Transition: Verified → GeneratingBrief
    pub fn begin_generation(&mut self) -> Result<(), JourneyError> {
        if self.generation_started {
            return Err(JourneyError::GenerationAlreadyStarted);
        }
        self.expect(JourneyState::Verified, JourneyState::GeneratingBrief)?;
        self.generation_started = true;
        self.state = JourneyState::GeneratingBrief;
        Ok(())
    }

    /// Transition: GeneratingBrief → BriefReady
    pub fn mark_brief_ready(&mut self) -> Result<(), JourneyError> {
        self.expect(JourneyState::GeneratingBrief, JourneyState::BriefReady)?;
        self.state = JourneyState::BriefReady;
        Ok(())
    }

    /// Any state except BriefReady can show an error.
    pub fn display_error(&mut self, message: impl Into<String>) -> Result<(), JourneyError> {
        if self.state == JourneyState::BriefReady {
            return Err(self.invalid(JourneyState::ErrorDisplayed));
        }
        self.state = JourneyState::ErrorDisplayed;
        self.error = Some(message.into());
        Ok(())
    }

    /// "Check status again": back to Loading from a failed state. The
    /// generation flag is kept.
    pub fn retry(&mut self) -> Result<(), JourneyError> {
        if !matches!(self.state, JourneyState::VerificationFailed | JourneyState::ErrorDisplayed) {
            return Err(self.invalid(JourneyState::Loading));
        }
        self.state = JourneyState::Loading;
        self.error = None;
        Ok(())
    }

    fn expect(&self, from: JourneyState, to: JourneyState) -> Result<(), JourneyError> {
        if self.state != from {
            return Err(self.invalid(to));
        }
        Ok(())
    }

    fn invalid(&self, to: JourneyState) -> JourneyError {
        JourneyError::InvalidTransition {
            from: format!("{:?}", self.state),
            to: format!("{:?}", to),
        }
    }
}

impl Default for Journey {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JourneyError {
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Brief generation already started")]
    GenerationAlreadyStarted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut journey = Journey::new();

        journey.mark_verified().unwrap();
        journey.begin_generation().unwrap();
        assert_eq!(journey.state(), JourneyState::GeneratingBrief);

        journey.mark_brief_ready().unwrap();
        assert_eq!(journey.state(), JourneyState::BriefReady);
        assert!(journey.display_error("late failure").is_err());
    }

    #[test]
    fn test_failed_verification_shows_error() {
        let mut journey = Journey::new();
        journey.mark_verification_failed("card declined").unwrap();
        journey.display_error("Payment verification failed: card declined").unwrap();

        assert_eq!(journey.state(), JourneyState::ErrorDisplayed);
        assert_eq!(journey.error(), Some("Payment verification failed: card declined"));
    }

    #[test]
    fn test_generation_starts_once_across_retries() {
        let mut journey = Journey::new();
        journey.mark_verified().unwrap();
        journey.begin_generation().unwrap();
        journey.display_error("timeout").unwrap();

        journey.retry().unwrap();
        journey.mark_verified().unwrap();
        assert!(matches!(journey.begin_generation(), Err(JourneyError::GenerationAlreadyStarted)));
    }

    #[test]
    fn test_invalid_transition() {
        let mut journey = Journey::new();
        // Cannot generate before verification
        let result = journey.begin_generation();
        assert!(matches!(result, Err(JourneyError::InvalidTransition { .. })));
        assert!(journey.retry().is_err());
    }
}
