// Identity provider seam
//
// The core never checks credentials. `PhoneIdentity` reproduces the two-step
// phone number / verification code screen: any long-enough number and code sign in.

use log::info;
use thiserror::Error;

/// Minimum phone number length accepted by the sign-in screen
pub const MIN_PHONE_LENGTH: usize = 10;
/// Minimum verification code length
pub const MIN_CODE_LENGTH: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Phone number must be at least 10 characters")]
    PhoneTooShort,

    #[error("Verification code must be at least 4 characters")]
    CodeTooShort,

    #[error("No sign-in in progress; request a code first")]
    NoPendingSignIn,
}

pub trait IdentityProvider {
    fn is_authenticated(&self) -> bool;

    /// Start sign-in for `phone`; a code is "sent" to it
    fn request_code(&mut self, phone: &str) -> Result<(), IdentityError>;

    /// Finish sign-in with the received code
    fn verify(&mut self, code: &str) -> Result<(), IdentityError>;

    fn sign_out(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthStep {
    #[default]
    Phone,
    Code { phone: String },
    Authenticated { phone: String },
}

#[derive(Debug, Default)]
pub struct PhoneIdentity {
    step: AuthStep,
}

impl PhoneIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> &AuthStep {
        &self.step
    }

    pub fn phone(&self) -> Option<&str> {
        match &self.step {
            AuthStep::Phone => None,
            AuthStep::Code { phone } | AuthStep::Authenticated { phone } => Some(phone),
        }
    }
}

impl IdentityProvider for PhoneIdentity {
    fn is_authenticated(&self) -> bool {
        matches!(self.step, AuthStep::Authenticated { .. })
    }

    fn request_code(&mut self, phone: &str) -> Result<(), IdentityError> {
        let phone = phone.trim();
        if phone.chars().count() < MIN_PHONE_LENGTH {
            return Err(IdentityError::PhoneTooShort);
        }

        info!("Verification code requested for {}", phone);
        self.step = AuthStep::Code {
            phone: phone.to_string(),
        };
        Ok(())
    }

    fn verify(&mut self, code: &str) -> Result<(), IdentityError> {
        let phone = match &self.step {
            AuthStep::Code { phone } => phone.clone(),
            _ => return Err(IdentityError::NoPendingSignIn),
        };
        if code.trim().chars().count() < MIN_CODE_LENGTH {
            return Err(IdentityError::CodeTooShort);
        }

        info!("Signed in as {}", phone);
        self.step = AuthStep::Authenticated { phone };
        Ok(())
    }

    fn sign_out(&mut self) {
        if let Some(phone) = self.phone() {
            info!("Signed out {}", phone);
        }
        self.step = AuthStep::Phone;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_step_sign_in() {
        let mut identity = PhoneIdentity::new();
        assert!(!identity.is_authenticated());

        assert_eq!(identity.request_code("555-123"), Err(IdentityError::PhoneTooShort));
        assert_eq!(identity.verify("1234"), Err(IdentityError::NoPendingSignIn));

        identity.request_code("+1 (555) 123-4567").expect("phone accepted");
        assert_eq!(identity.verify("12"), Err(IdentityError::CodeTooShort));
        assert!(!identity.is_authenticated());

        identity.verify("1234").expect("code accepted");
        assert!(identity.is_authenticated());
        assert_eq!(identity.phone(), Some("+1 (555) 123-4567"));

        identity.sign_out();
        assert_eq!(identity.step(), &AuthStep::Phone);
    }
}
