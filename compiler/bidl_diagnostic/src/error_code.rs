//! Error codes for all compiler diagnostics.
//!
//! Each error code is a unique identifier (e.g., `E2001`) with the first
//! digit indicating the compiler phase.

use std::fmt;

/// Error codes for all compiler diagnostics.
///
/// Format: E#### where the first digit indicates the phase:
/// - E0xxx: Lexer errors
/// - E1xxx: Parser errors
/// - E2xxx: Type and structural validation errors
/// - E3xxx: Import errors
/// - E4xxx: Transaction-id and method errors
/// - E5xxx: Backend legality errors
/// - E6xxx: Constant-evaluation errors
/// - E7xxx: API compatibility errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Lexer errors (E0xxx)
    /// Invalid character in source
    E0001,
    /// Malformed literal
    E0002,

    // Parser errors (E1xxx)
    /// Unexpected token
    E1001,
    /// Expected identifier
    E1002,
    /// Invalid integer literal
    E1003,
    /// More than one defined type in a file
    E1004,
    /// No defined type in a file
    E1005,
    /// Unknown annotation name
    E1006,
    /// Unknown annotation parameter
    E1007,
    /// Duplicate annotation parameter
    E1008,
    /// Annotation parameter has the wrong type
    E1009,

    // Type / structural validation errors (E2xxx)
    /// Unresolved type reference
    E2001,
    /// Ambiguous type reference
    E2002,
    /// Wrong number of generic type arguments
    E2003,
    /// Type does not accept generic arguments
    E2004,
    /// `nullable` on a primitive or enum non-array type
    E2005,
    /// `utf8`/`utf8InCpp` on a non-String type
    E2006,
    /// Map key type must be String
    E2007,
    /// Arrays of binder types are forbidden
    E2008,
    /// Oneway method with a non-void return type
    E2009,
    /// Oneway method with out parameters
    E2010,
    /// Duplicate argument or field name
    E2011,
    /// Duplicate method name
    E2012,
    /// Duplicate constant name
    E2013,
    /// Invalid constant declaration type
    E2014,
    /// Constant value not representable in its declared type
    E2015,
    /// Duplicate generic type parameter
    E2016,
    /// Name uses the reserved internal prefix
    E2017,
    /// Duplicate defined-type name
    E2018,
    /// Invalid enum backing type
    E2019,
    /// Duplicate enumerator name
    E2020,
    /// Invalid use of `void`
    E2021,
    /// Annotation not applicable to this declaration
    E2022,

    // Import errors (E3xxx)
    /// Two imports share a simple name
    E3001,
    /// Import could not be located
    E3002,
    /// Import found in multiple include roots
    E3003,

    // Transaction-id and method errors (E4xxx)
    /// Duplicate transaction id
    E4001,
    /// Transaction id out of the user-assignable range
    E4002,
    /// Transaction ids assigned to only some methods
    E4003,
    /// Collision with a reserved meta-method signature
    E4004,

    // Backend legality errors (E5xxx)
    /// Unstructured parcelable requires a native header for this backend
    E5001,
    /// `List` cannot be an array element for this backend
    E5002,
    /// Primitive generic type argument
    E5003,
    /// Name is a reserved word in the target language
    E5004,
    /// Unstructured parcelable encountered in structured mode
    E5005,

    // Constant-evaluation errors (E6xxx)
    /// Division or modulo by zero
    E6001,
    /// Operand types invalid for operator
    E6002,
    /// Value out of range for the target type
    E6003,
    /// Array elements have incompatible types
    E6004,
    /// Structurally invalid constant expression
    E6005,

    // API compatibility errors (E7xxx)
    /// Type present in the old API is missing from the new one
    E7001,
    /// Type changed kind between API versions
    E7002,
    /// Method removed or changed incompatibly
    E7003,
    /// Constant removed or its value changed
    E7004,
    /// Structured parcelable field removed, reordered, or changed
    E7005,
    /// Enumerator removed or its value changed
    E7006,
    /// Annotation set changed
    E7007,
    /// Enum backing type changed
    E7008,
}

impl ErrorCode {
    /// The compiler phase that owns this code.
    pub fn phase(self) -> &'static str {
        let code = format!("{self}");
        match code.as_bytes()[1] {
            b'0' => "lexer",
            b'1' => "parser",
            b'2' => "validation",
            b'3' => "import",
            b'4' => "method",
            b'5' => "backend",
            b'6' => "constant",
            b'7' => "compatibility",
            _ => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_matches_debug_name() {
        assert_eq!(ErrorCode::E2001.to_string(), "E2001");
        assert_eq!(ErrorCode::E7005.to_string(), "E7005");
    }

    #[test]
    fn phase_from_leading_digit() {
        assert_eq!(ErrorCode::E0001.phase(), "lexer");
        assert_eq!(ErrorCode::E1001.phase(), "parser");
        assert_eq!(ErrorCode::E4002.phase(), "method");
        assert_eq!(ErrorCode::E7001.phase(), "compatibility");
    }
}
