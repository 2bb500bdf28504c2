//! Field rules for inbound requests.

use identity_gateway_sdk::{
    MdnValidateRequest, OtpForwardRequest, OtpRequest, OtpValidateRequest, SessionInitRequest,
};

use super::error::ApiError;

const MSISDN_MIN_DIGITS: usize = 10;
const MSISDN_MAX_DIGITS: usize = 15;

pub trait Validate {
    /// # Errors
    /// `ApiError::Validation` naming the first offending field.
    fn validate(&self) -> Result<(), ApiError>;
}

fn require_non_blank(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} must not be blank")));
    }
    Ok(())
}

fn require_msisdn(value: &str) -> Result<(), ApiError> {
    require_non_blank("msisdn", value)?;
    let digits = value.len();
    if !value.bytes().all(|b| b.is_ascii_digit())
        || !(MSISDN_MIN_DIGITS..=MSISDN_MAX_DIGITS).contains(&digits)
    {
        return Err(ApiError::Validation(format!(
            "msisdn must be {MSISDN_MIN_DIGITS} to {MSISDN_MAX_DIGITS} digits"
        )));
    }
    Ok(())
}

fn require_identity(uuid: &str, msisdn: &str) -> Result<(), ApiError> {
    require_non_blank("uuid", uuid)?;
    require_msisdn(msisdn)
}

impl Validate for SessionInitRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require_identity(&self.uuid, &self.msisdn)
    }
}

impl Validate for MdnValidateRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require_identity(&self.uuid, &self.msisdn)
    }
}

impl Validate for OtpRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require_identity(&self.uuid, &self.msisdn)
    }
}

impl Validate for OtpValidateRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require_identity(&self.uuid, &self.msisdn)?;
        require_non_blank("otp", &self.otp)?;
        if !self.otp.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ApiError::Validation("otp must contain digits only".to_owned()));
        }
        Ok(())
    }
}

impl Validate for OtpForwardRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require_identity(&self.uuid, &self.msisdn)
    }
}
