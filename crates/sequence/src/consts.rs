/// Namespace of the W3C-defined XPath/XQuery error codes.
pub const ERR_NS: &str = "http://www.w3.org/2005/xqt-errors";

pub const CODEPOINT_URI: &str = "http://www.w3.org/2005/xpath-functions/collation/codepoint";
pub const SIMPLE_CASE_URI: &str = "urn:xpath-sequence:collation:simple-case";
pub const SIMPLE_ACCENT_URI: &str = "urn:xpath-sequence:collation:simple-accent";
pub const SIMPLE_CASE_ACCENT_URI: &str = "urn:xpath-sequence:collation:simple-case-accent";

/// Upper bound on the number of items a single range may produce.
pub const MAX_SEQUENCE_LENGTH: i64 = i32::MAX as i64;
