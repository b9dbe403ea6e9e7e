use crate::exception::CoreRsResult;

pub trait Validator {
    fn validate(&self) -> CoreRsResult<()>;
}

pub fn require(condition: bool, message: impl Into<String>) -> CoreRsResult<()> {
    if condition {
        Ok(())
    } else {
        Err(validation_error!(message = message.into()))
    }
}

#[cfg(test)]
mod tests {
    use crate::exception::error_code;

    #[test]
    fn require() {
        assert!(super::require(true, "unused").is_ok());
        let error = super::require(false, "max_volume must be positive").err().unwrap();
        assert!(error.has_code(error_code::VALIDATION_ERROR));
        assert_eq!(error.message, "max_volume must be positive");
    }
}
