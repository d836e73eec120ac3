//! Rate limiting types

use std::fmt;
use std::str::FromStr;

/// Route category for rate-limit accounting
///
/// Each category gets its own ceiling; entries for different categories
/// from the same address do not interfere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteCategory {
    Login,
    Registration,
    Confirmation,
    EmailResend,
    PasswordRecovery,
    NewPassword,
}

impl RouteCategory {
    /// Database string for this category
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteCategory::Login => "login",
            RouteCategory::Registration => "registration",
            RouteCategory::Confirmation => "registration-confirmation",
            RouteCategory::EmailResend => "email-resend",
            RouteCategory::PasswordRecovery => "password-recovery",
            RouteCategory::NewPassword => "new-password",
        }
    }
}

impl fmt::Display for RouteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RouteCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(RouteCategory::Login),
            "registration" => Ok(RouteCategory::Registration),
            "registration-confirmation" => Ok(RouteCategory::Confirmation),
            "email-resend" => Ok(RouteCategory::EmailResend),
            "password-recovery" => Ok(RouteCategory::PasswordRecovery),
            "new-password" => Ok(RouteCategory::NewPassword),
            _ => Err(anyhow::anyhow!("Invalid route category: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_from_str_roundtrip() {
        for category in [
            RouteCategory::Login,
            RouteCategory::Registration,
            RouteCategory::Confirmation,
            RouteCategory::EmailResend,
            RouteCategory::PasswordRecovery,
            RouteCategory::NewPassword,
        ] {
            let parsed = RouteCategory::from_str(category.as_str()).unwrap();
            assert_eq!(parsed, category);
        }
        assert!(RouteCategory::from_str("unknown").is_err());
    }
}
