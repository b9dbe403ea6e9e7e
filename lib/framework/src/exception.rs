use std::error::Error;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;

pub mod error_code;

pub type CoreRsResult<T> = Result<T, Exception>;

pub struct Exception {
    pub severity: Severity,
    pub code: Option<&'static str>,
    pub message: String,
    pub location: Option<String>,
    pub source: Option<Box<Exception>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warn,
    Error,
}

impl Exception {
    pub fn has_code(&self, code: &str) -> bool {
        self.code == Some(code)
    }

    /// Warn exceptions carry a message meant for the caller, everything else is an internal failure.
    pub fn is_rejection(&self) -> bool {
        self.severity == Severity::Warn && self.code.is_some()
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warn => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

impl Debug for Exception {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Exception {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut current = Some(self);
        let mut depth = 0;
        while let Some(exception) = current {
            if depth > 0 {
                write!(f, "\ncaused by: ")?;
            }
            write!(f, "{}", exception.severity)?;
            if let Some(code) = exception.code {
                write!(f, " [{code}]")?;
            }
            write!(f, " {}", exception.message)?;
            if let Some(ref location) = exception.location {
                write!(f, " at {location}")?;
            }
            depth += 1;
            current = exception.source.as_deref();
        }
        Ok(())
    }
}

#[macro_export]
macro_rules! exception {
    ($(severity = $severity:expr,)? $(code = $code:expr,)? message = $message:expr $(, source = $source:expr)?) => {{
        #[allow(unused_variables)]
        let severity = $crate::exception::Severity::Error;
        $(
            let severity = $severity;
        )?
        #[allow(unused_variables)]
        let code: Option<&'static str> = None;
        $(
            let code: Option<&'static str> = Some($code);
        )?
        #[allow(unused_variables)]
        let source: Option<Box<$crate::exception::Exception>> = None;
        $(
            let source = Some(Box::new($source.into()));
        )?
        $crate::exception::Exception {
            severity,
            code,
            message: $message.to_string(),
            location: Some(format!("{}:{}", file!(), line!())),
            source,
        }
    }};
}

/// Rejection of caller input, logged as warning and reported back verbatim.
#[macro_export]
macro_rules! validation_error {
    ($(code = $code:expr,)? message = $message:expr) => {{
        #[allow(unused_variables)]
        let code: &'static str = $crate::exception::error_code::VALIDATION_ERROR;
        $(
            let code: &'static str = $code;
        )?
        $crate::exception!(severity = $crate::exception::Severity::Warn, code = code, message = $message)
    }};
}

fn chain(error: Option<&(dyn Error + 'static)>) -> Option<Box<Exception>> {
    let error = error?;
    Some(Box::new(Exception {
        severity: Severity::Error,
        code: None,
        message: error.to_string(),
        location: None,
        source: chain(error.source()),
    }))
}

impl<T> From<T> for Exception
where
    T: Error + 'static,
{
    fn from(error: T) -> Self {
        Exception {
            severity: Severity::Error,
            code: None,
            message: error.to_string(),
            location: None,
            source: chain(error.source()),
        }
    }
}
