//! Diagnostic codes for resolution, inference and layout.

use minigo_common::{Diagnostic, Label, Span};

/// Analysis error codes (2xxx range).
///
/// - 2000-2099: name resolution
/// - 2100-2199: type errors found at the point of use
/// - 2200-2299: inference
/// - 2300-2399: layout
/// - 2900: constructs that are recognized but not implemented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum TypeError {
    // === Resolution (2000-2099) ===
    Undefined = 2000,
    /// `pkg.Name` where `pkg` has no such member.
    UndefinedQualified = 2001,
    NotAType = 2002,
    /// A type name used where a value is expected.
    TypeNotValue = 2003,
    UnknownPackage = 2004,
    Redeclared = 2005,
    UndefinedReceiverType = 2006,
    DuplicateMethod = 2007,
    NoNewVariables = 2008,

    // === Types (2100-2199) ===
    MismatchedTypes = 2100,
    InvalidOperation = 2101,
    NotAStruct = 2102,
    UnknownField = 2103,
    UnknownMethod = 2104,
    NotIndexable = 2105,
    NotCallable = 2106,
    WrongArgCount = 2107,
    AssignCountMismatch = 2108,
    InvalidConversion = 2109,
    NotAnInterface = 2110,
    NotAPointer = 2111,
    WrongResultCount = 2112,
    NotIterable = 2113,
    NotConstant = 2114,
    InvalidArrayLength = 2115,
    NonBoolCondition = 2116,
    InvalidMake = 2117,
    InvalidBuiltinArg = 2118,
    NotSliceable = 2119,
    NoValue = 2120,
    MissingMethod = 2121,
    DivisionByZero = 2122,

    // === Inference (2200-2299) ===
    CannotInfer = 2200,
    InitializationCycle = 2201,
    UntypedNil = 2202,

    // === Layout (2300-2399) ===
    RecursiveType = 2300,
    TooManyArgWords = 2301,
    TooManyResultWords = 2302,
    TypeTooLarge = 2303,

    // === Unsupported (2900) ===
    NotYetImplemented = 2900,
}

impl TypeError {
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn message(self) -> &'static str {
        match self {
            TypeError::Undefined => "undefined name",
            TypeError::UndefinedQualified => "undefined package member",
            TypeError::NotAType => "not a type",
            TypeError::TypeNotValue => "type is not an expression",
            TypeError::UnknownPackage => "unknown package",
            TypeError::Redeclared => "name redeclared in this block",
            TypeError::UndefinedReceiverType => "undefined receiver type",
            TypeError::DuplicateMethod => "method redeclared",
            TypeError::NoNewVariables => "no new variables on left side of :=",
            TypeError::MismatchedTypes => "mismatched types",
            TypeError::InvalidOperation => "invalid operation",
            TypeError::NotAStruct => "not a struct",
            TypeError::UnknownField => "unknown field",
            TypeError::UnknownMethod => "unknown method",
            TypeError::NotIndexable => "cannot index expression",
            TypeError::NotCallable => "cannot call non-function",
            TypeError::WrongArgCount => "wrong number of arguments",
            TypeError::AssignCountMismatch => "assignment count mismatch",
            TypeError::InvalidConversion => "invalid conversion",
            TypeError::NotAnInterface => "not an interface",
            TypeError::NotAPointer => "cannot dereference non-pointer",
            TypeError::WrongResultCount => "wrong number of return values",
            TypeError::NotIterable => "cannot range over expression",
            TypeError::NotConstant => "not a constant expression",
            TypeError::InvalidArrayLength => "invalid array length",
            TypeError::NonBoolCondition => "non-boolean condition",
            TypeError::InvalidMake => "invalid argument to make",
            TypeError::InvalidBuiltinArg => "invalid argument to builtin",
            TypeError::NotSliceable => "cannot slice expression",
            TypeError::NoValue => "expression has no value",
            TypeError::MissingMethod => "type does not implement interface",
            TypeError::DivisionByZero => "division by zero",
            TypeError::CannotInfer => "cannot infer type",
            TypeError::InitializationCycle => "initialization cycle",
            TypeError::UntypedNil => "use of untyped nil",
            TypeError::RecursiveType => "invalid recursive type",
            TypeError::TooManyArgWords => "too many argument words",
            TypeError::TooManyResultWords => "too many result words",
            TypeError::TypeTooLarge => "type too large",
            TypeError::NotYetImplemented => "not yet implemented",
        }
    }

    pub fn diagnostic(self) -> Diagnostic {
        Diagnostic::error(self.message()).with_code(self.code())
    }

    pub fn at(self, span: impl Into<Span>) -> Diagnostic {
        Diagnostic::error(self.message())
            .with_code(self.code())
            .with_label(Label::primary(span))
    }

    pub fn at_with_message(self, span: impl Into<Span>, message: impl Into<String>) -> Diagnostic {
        Diagnostic::error(message)
            .with_code(self.code())
            .with_label(Label::primary(span))
    }

    /// Message mentioning a name.
    pub fn with_name(self, name: &str) -> String {
        match self {
            TypeError::Undefined => format!("undefined: {}", name),
            TypeError::UndefinedQualified => format!("undefined: {}", name),
            TypeError::NotAType => format!("{} is not a type", name),
            TypeError::TypeNotValue => format!("{} (type) is not an expression", name),
            TypeError::UnknownPackage => format!("unknown package {}", name),
            TypeError::Redeclared => format!("{} redeclared in this block", name),
            TypeError::UndefinedReceiverType => format!("undefined receiver type: {}", name),
            TypeError::DuplicateMethod => format!("method {} redeclared", name),
            TypeError::UnknownField => format!("unknown field {}", name),
            TypeError::UnknownMethod => format!("unknown method {}", name),
            TypeError::CannotInfer => format!("cannot infer type of {}", name),
            TypeError::InitializationCycle => format!("initialization cycle involving {}", name),
            TypeError::RecursiveType => format!("invalid recursive type {}", name),
            TypeError::TypeTooLarge => format!("type {} too large", name),
            TypeError::NotYetImplemented => format!("not yet implemented: {}", name),
            _ => self.message().to_owned(),
        }
    }

    /// Shorthand for `at_with_message(span, self.with_name(name))`.
    pub fn named_at(self, span: impl Into<Span>, name: &str) -> Diagnostic {
        self.at_with_message(span, self.with_name(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(TypeError::Undefined.code(), 2000);
        assert_eq!(TypeError::MismatchedTypes.code(), 2100);
        assert_eq!(TypeError::CannotInfer.code(), 2200);
        assert_eq!(TypeError::RecursiveType.code(), 2300);
        assert_eq!(TypeError::NotYetImplemented.code(), 2900);
    }

    #[test]
    fn test_named_messages() {
        assert_eq!(TypeError::Undefined.with_name("foo"), "undefined: foo");
        let diag = TypeError::Redeclared.named_at(3u32..4u32, "x");
        assert_eq!(diag.code, Some(2005));
        assert_eq!(diag.message, "x redeclared in this block");
        assert_eq!(diag.labels.len(), 1);
    }
}
