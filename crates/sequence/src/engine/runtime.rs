use crate::consts::{CODEPOINT_URI, ERR_NS};
use crate::engine::collation::{Collation, CollationRegistry};
use crate::xdm::ExpandedName;
use core::fmt;
use std::sync::Arc;

/// Error codes emitted by the sequence engine.
///
/// Only a small subset of the XPath/XQuery error vocabulary is needed here: iterators and
/// comparers fail with type errors, missing dynamic context, or resource limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    FOER0000, // generic error
    FOCH0002, // collation does not exist
    FOTY0013, // atomization of a function item
    FOTY0014, // string value of a function item
    XPTY0004, // type error (incomparable operands)
    XPDY0002, // required part of the dynamic context is absent
    XPDY0130, // implementation-defined limit exceeded
    // Fallback / unknown (kept last)
    Unknown,
}

/// Coarse classification of errors, used by callers to decide whether a retry makes sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Incomparable or wrong-shaped operands.
    Type,
    /// A comparer needs a dynamic context that has not been supplied yet.
    ContextRequired,
    /// A sequence length exceeds the representable bound.
    ResourceLimit,
    /// Anything else.
    Dynamic,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::FOER0000 => "FOER0000",
            ErrorCode::FOCH0002 => "FOCH0002",
            ErrorCode::FOTY0013 => "FOTY0013",
            ErrorCode::FOTY0014 => "FOTY0014",
            ErrorCode::XPTY0004 => "XPTY0004",
            ErrorCode::XPDY0002 => "XPDY0002",
            ErrorCode::XPDY0130 => "XPDY0130",
            ErrorCode::Unknown => "UNKNOWN",
        }
    }

    /// Returns the QName (ExpandedName) for this error code.
    pub fn qname(&self) -> ExpandedName {
        ExpandedName::new(Some(ERR_NS.to_string()), self.as_str())
    }

    pub fn from_code(s: &str) -> Self {
        use ErrorCode::*;
        match s.strip_prefix("err:").unwrap_or(s) {
            "FOER0000" => FOER0000,
            "FOCH0002" => FOCH0002,
            "FOTY0013" => FOTY0013,
            "FOTY0014" => FOTY0014,
            "XPTY0004" => XPTY0004,
            "XPDY0002" => XPDY0002,
            "XPDY0130" => XPDY0130,
            _ => Unknown,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::XPTY0004 | ErrorCode::FOTY0013 | ErrorCode::FOTY0014 => ErrorKind::Type,
            ErrorCode::XPDY0002 => ErrorKind::ContextRequired,
            ErrorCode::XPDY0130 => ErrorKind::ResourceLimit,
            _ => ErrorKind::Dynamic,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub struct Error {
    pub code: ExpandedName,
    pub message: String,
    #[source]
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>, // optional chained cause
}

impl Error {
    pub fn new_qname(code: ExpandedName, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), source: None }
    }

    pub fn from_code(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self::new_qname(code.qname(), msg)
    }

    /// Type error naming both operand type descriptions.
    pub fn incomparable(context: &str, left: &str, right: &str) -> Self {
        Self::from_code(ErrorCode::XPTY0004, format!("{context} are of non-comparable types ({left} and {right})"))
    }

    pub fn context_required(what: impl Into<String>) -> Self {
        Self::from_code(ErrorCode::XPDY0002, what)
    }

    pub fn resource_limit(what: impl Into<String>) -> Self {
        Self::from_code(ErrorCode::XPDY0130, what)
    }

    pub fn code_enum(&self) -> ErrorCode {
        if self.code.ns_uri.as_deref() == Some(ERR_NS) { ErrorCode::from_code(&self.code.local) } else { ErrorCode::Unknown }
    }

    pub fn kind(&self) -> ErrorKind {
        self.code_enum().kind()
    }

    pub fn is_type_error(&self) -> bool {
        self.kind() == ErrorKind::Type
    }

    /// Format the code as a human-readable string (err:LOCAL or Q{ns}local).
    pub fn format_code(&self) -> String {
        if self.code.ns_uri.as_deref() == Some(ERR_NS) {
            format!("err:{}", self.code.local)
        } else if let Some(ns) = &self.code.ns_uri {
            format!("Q{{{}}}{}", ns, self.code.local)
        } else {
            self.code.local.clone()
        }
    }

    /// Compose an error with a source cause.
    pub fn with_source(mut self, source: impl Into<Option<Arc<dyn std::error::Error + Send + Sync>>>) -> Self {
        self.source = source.into();
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: {} ({})", self.message, self.format_code())
    }
}

/// Dynamic evaluation context consumed by comparers and key expressions.
///
/// Comparers built without a context defer collation lookup and implicit-timezone
/// resolution until [`crate::engine::compare::AtomicComparer::provide_context`] is called.
#[derive(Clone)]
pub struct DynamicContext {
    pub collations: Arc<CollationRegistry>,
    pub default_collation: Option<String>,
    pub implicit_timezone: Option<chrono::FixedOffset>,
}

impl Default for DynamicContext {
    fn default() -> Self {
        Self {
            collations: Arc::new(CollationRegistry::default()),
            default_collation: None,
            implicit_timezone: chrono::FixedOffset::east_opt(0),
        }
    }
}

impl fmt::Debug for DynamicContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicContext")
            .field("default_collation", &self.default_collation)
            .field("implicit_timezone", &self.implicit_timezone)
            .finish_non_exhaustive()
    }
}

impl DynamicContext {
    /// Resolve a collation URI, falling back to the default collation and finally to codepoint.
    pub fn collation(&self, uri: Option<&str>) -> Result<Arc<dyn Collation>, Error> {
        let uri = uri.or(self.default_collation.as_deref()).unwrap_or(CODEPOINT_URI);
        self.collations
            .get(uri)
            .ok_or_else(|| Error::from_code(ErrorCode::FOCH0002, format!("unknown collation URI: {uri}")))
    }
}

pub struct DynamicContextBuilder {
    ctx: DynamicContext,
}

impl Default for DynamicContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicContextBuilder {
    pub fn new() -> Self {
        Self { ctx: DynamicContext::default() }
    }

    pub fn with_default_collation(mut self, uri: impl Into<String>) -> Self {
        self.ctx.default_collation = Some(uri.into());
        self
    }

    pub fn with_collations(mut self, reg: Arc<CollationRegistry>) -> Self {
        self.ctx.collations = reg;
        self
    }

    /// Implicit timezone as an offset in minutes east of UTC. Out-of-range offsets are ignored.
    pub fn with_timezone(mut self, offset_minutes: i32) -> Self {
        if let Some(tz) = offset_minutes.checked_mul(60).and_then(chrono::FixedOffset::east_opt) {
            self.ctx.implicit_timezone = Some(tz);
        }
        self
    }

    /// Remove the implicit timezone; comparisons of timezone-less dates then fail.
    pub fn without_timezone(mut self) -> Self {
        self.ctx.implicit_timezone = None;
        self
    }

    pub fn build(self) -> DynamicContext {
        self.ctx
    }
}
