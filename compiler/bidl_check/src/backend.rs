//! Target backends and their legality rules.

use std::fmt;
use std::str::FromStr;

/// Code-generation target the unit is being checked for.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Backend {
    #[default]
    Java,
    Cpp,
    Ndk,
}

impl Backend {
    /// Unstructured parcelables need an externally supplied native header on
    /// the native backends.
    pub(crate) fn requires_native_header(self) -> bool {
        matches!(self, Backend::Cpp | Backend::Ndk)
    }

    /// The native backends have no representation for an array of `List`.
    pub(crate) fn rejects_list_array(self) -> bool {
        matches!(self, Backend::Cpp | Backend::Ndk)
    }

    /// Words that cannot be used as declared names in generated code.
    pub(crate) fn reserved_words(self) -> &'static [&'static str] {
        match self {
            Backend::Java => JAVA_RESERVED,
            Backend::Cpp | Backend::Ndk => CPP_RESERVED,
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "java" => Ok(Backend::Java),
            "cpp" => Ok(Backend::Cpp),
            "ndk" => Ok(Backend::Ndk),
            other => Err(format!(
                "unknown backend `{other}` (expected java, cpp, or ndk)"
            )),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::Java => "java",
            Backend::Cpp => "cpp",
            Backend::Ndk => "ndk",
        };
        write!(f, "{name}")
    }
}

static JAVA_RESERVED: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class",
    "const", "continue", "default", "do", "double", "else", "enum", "extends", "final",
    "finally", "float", "for", "goto", "if", "implements", "import", "instanceof", "int",
    "interface", "long", "native", "new", "package", "private", "protected", "public",
    "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this",
    "throw", "throws", "transient", "try", "void", "volatile", "while",
];

static CPP_RESERVED: &[&str] = &[
    "alignas", "alignof", "and", "asm", "auto", "bitand", "bitor", "bool", "break", "case",
    "catch", "char", "class", "compl", "const", "constexpr", "continue", "decltype",
    "default", "delete", "do", "double", "dynamic_cast", "else", "enum", "explicit",
    "export", "extern", "false", "float", "for", "friend", "goto", "if", "inline", "int",
    "long", "mutable", "namespace", "new", "noexcept", "not", "nullptr", "operator", "or",
    "private", "protected", "public", "register", "reinterpret_cast", "return", "short",
    "signed", "sizeof", "static", "static_cast", "struct", "switch", "template", "this",
    "throw", "true", "try", "typedef", "typeid", "typename", "union", "unsigned", "using",
    "virtual", "void", "volatile", "wchar_t", "while", "xor",
];

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_backend_names() {
        assert_eq!("java".parse(), Ok(Backend::Java));
        assert_eq!("ndk".parse(), Ok(Backend::Ndk));
        assert!(Backend::from_str("rust").is_err());
    }

    #[test]
    fn native_backends_need_headers() {
        assert!(!Backend::Java.requires_native_header());
        assert!(Backend::Cpp.requires_native_header());
        assert!(Backend::Ndk.requires_native_header());
    }
}
