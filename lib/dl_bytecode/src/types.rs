//! Java types as written in descriptors (`I`, `[J`, `Ljava/lang/String;`, ...).

use crate::errors::{BytecodeError, BytecodeResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Type {
    /// `void` type, only valid for return types.
    Void,
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    /// Array of the given dimension over a non-array element type.
    Array(usize, Box<Self>),
    /// Fully qualified class name, in `pkg/Name` form.
    Class(String),
}

impl Type {
    /// Builds a class type from a `pkg/Name` internal name.
    #[must_use]
    pub fn class(name: &str) -> Self {
        Self::Class(name.to_string())
    }

    /// Builds the array type whose elements are of type `self`.
    #[must_use]
    pub fn array_of(self) -> Self {
        match self {
            Self::Array(n, elt) => Self::Array(n + 1, elt),
            t => Self::Array(1, Box::new(t)),
        }
    }

    /// Returns the type of the elements of an array type.
    #[must_use]
    pub fn element_type(&self) -> Option<Self> {
        match self {
            Self::Array(1, elt) => Some(elt.as_ref().clone()),
            Self::Array(n, elt) => Some(Self::Array(n - 1, elt.clone())),
            _ => None,
        }
    }

    /// Values of wide types occupy a register pair.
    #[must_use]
    pub const fn is_wide(&self) -> bool {
        matches!(self, Self::Long | Self::Double)
    }

    #[must_use]
    pub const fn is_reference(&self) -> bool {
        matches!(self, Self::Array(_, _) | Self::Class(_))
    }

    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Self::Array(_, _))
    }

    /// Types held as 32-bit integers in registers.
    #[must_use]
    pub const fn is_int_like(&self) -> bool {
        matches!(
            self,
            Self::Boolean | Self::Byte | Self::Short | Self::Char | Self::Int
        )
    }

    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        !self.is_reference() && !matches!(self, Self::Void)
    }

    /// Number of register slots needed to hold a value of this type.
    #[must_use]
    pub const fn slots(&self) -> usize {
        match self {
            Self::Void => 0,
            Self::Long | Self::Double => 2,
            _ => 1,
        }
    }

    /// Returns the class name of a class type.
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Self::Class(name) => Some(name),
            _ => None,
        }
    }

    /// Returns a java-like representation of the type, used when printing
    /// IR bodies.
    #[must_use]
    pub fn to_java_string(&self) -> String {
        match self {
            Self::Void => "void".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::Byte => "byte".to_string(),
            Self::Short => "short".to_string(),
            Self::Char => "char".to_string(),
            Self::Int => "int".to_string(),
            Self::Long => "long".to_string(),
            Self::Float => "float".to_string(),
            Self::Double => "double".to_string(),
            Self::Array(n, elt) => {
                let mut s = elt.to_java_string();
                for _ in 0..*n {
                    s.push_str("[]");
                }
                s
            }
            Self::Class(name) => name.replace('/', "."),
        }
    }

    /// Parses a descriptor prefix, returning the type with the rest of the
    /// input.
    fn parse_prefix(s: &str) -> BytecodeResult<(Self, &str)> {
        let invalid = || BytecodeError::InvalidDescriptor(s.to_string());
        let dims = s.bytes().take_while(|b| *b == b'[').count();
        if dims > 255 {
            return Err(invalid());
        }
        let rest = &s[dims..];
        let (elt, rest) = match rest.as_bytes().first() {
            Some(b'V') if dims == 0 => (Self::Void, &rest[1..]),
            Some(b'Z') => (Self::Boolean, &rest[1..]),
            Some(b'B') => (Self::Byte, &rest[1..]),
            Some(b'S') => (Self::Short, &rest[1..]),
            Some(b'C') => (Self::Char, &rest[1..]),
            Some(b'I') => (Self::Int, &rest[1..]),
            Some(b'J') => (Self::Long, &rest[1..]),
            Some(b'F') => (Self::Float, &rest[1..]),
            Some(b'D') => (Self::Double, &rest[1..]),
            Some(b'L') => {
                let end = rest.find(';').ok_or_else(invalid)?;
                if end == 1 {
                    return Err(invalid());
                }
                (Self::Class(rest[1..end].to_string()), &rest[end + 1..])
            }
            _ => return Err(invalid()),
        };
        if dims == 0 {
            Ok((elt, rest))
        } else {
            Ok((Self::Array(dims, Box::new(elt)), rest))
        }
    }

    /// Parses a method prototype descriptor, e.g. `(I[JLjava/lang/String;)V`.
    pub fn parse_proto(s: &str) -> BytecodeResult<(Vec<Self>, Self)> {
        let invalid = || BytecodeError::InvalidDescriptor(s.to_string());
        let mut rest = s.strip_prefix('(').ok_or_else(invalid)?;
        let mut params = Vec::new();
        while !rest.starts_with(')') {
            let (param, next) = Self::parse_prefix(rest)?;
            if param == Self::Void {
                return Err(invalid());
            }
            params.push(param);
            rest = next;
        }
        let (ret, rest) = Self::parse_prefix(&rest[1..])?;
        if rest.is_empty() {
            Ok((params, ret))
        } else {
            Err(invalid())
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Void => write!(f, "V"),
            Self::Boolean => write!(f, "Z"),
            Self::Byte => write!(f, "B"),
            Self::Short => write!(f, "S"),
            Self::Char => write!(f, "C"),
            Self::Int => write!(f, "I"),
            Self::Long => write!(f, "J"),
            Self::Float => write!(f, "F"),
            Self::Double => write!(f, "D"),
            Self::Array(n, elt) => {
                for _ in 0..*n {
                    write!(f, "[")?;
                }
                write!(f, "{elt}")
            }
            Self::Class(name) => write!(f, "L{name};"),
        }
    }
}

impl TryFrom<&str> for Type {
    type Error = BytecodeError;

    fn try_from(s: &str) -> BytecodeResult<Self> {
        match Self::parse_prefix(s)? {
            (t, "") => Ok(t),
            _ => Err(BytecodeError::InvalidDescriptor(s.to_string())),
        }
    }
}

impl TryFrom<String> for Type {
    type Error = BytecodeError;

    fn try_from(s: String) -> BytecodeResult<Self> {
        Self::try_from(s.as_str())
    }
}

impl From<Type> for String {
    fn from(t: Type) -> Self {
        t.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors() {
        assert_eq!(Type::try_from("I").ok(), Some(Type::Int));
        assert_eq!(
            Type::try_from("[[Ljava/lang/String;").ok(),
            Some(Type::Array(2, Box::new(Type::class("java/lang/String"))))
        );
        assert!(Type::try_from("[V").is_err());
        assert!(Type::try_from("L;").is_err());
        assert!(Type::try_from("II").is_err());
        assert_eq!(Type::class("a/B").array_of().to_string(), "[La/B;");
    }

    #[test]
    fn element_types() {
        let t = Type::try_from("[[I").unwrap();
        assert_eq!(t.element_type(), Some(Type::Array(1, Box::new(Type::Int))));
        assert_eq!(t.element_type().and_then(|t| t.element_type()), Some(Type::Int));
        assert_eq!(Type::Int.element_type(), None);
    }

    #[test]
    fn prototypes() {
        let (params, ret) = Type::parse_proto("(I[JLa/B;)V").unwrap();
        assert_eq!(
            params,
            vec![Type::Int, Type::Array(1, Box::new(Type::Long)), Type::class("a/B")]
        );
        assert_eq!(ret, Type::Void);
        assert!(Type::parse_proto("(V)V").is_err());
        assert!(Type::parse_proto("I)V").is_err());
    }

    #[test]
    fn java_strings() {
        assert_eq!(Type::try_from("[Ljava/lang/Object;").unwrap().to_java_string(), "java.lang.Object[]");
    }
}
