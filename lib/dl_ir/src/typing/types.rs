//! The register type lattice used by the solver.

use crate::repo::SymbolTable;
use dl_bytecode::types::Type;
use lazy_static::lazy_static;
use std::fmt;

lazy_static! {
    pub static ref JAVA_LANG_OBJECT: Type = Type::class("java/lang/Object");
    pub static ref JAVA_LANG_THROWABLE: Type = Type::class("java/lang/Throwable");
    pub static ref JAVA_LANG_STRING: Type = Type::class("java/lang/String");
    pub static ref JAVA_LANG_CLASS: Type = Type::class("java/lang/Class");
    pub static ref JAVA_LANG_INVOKE_METHOD_HANDLE: Type =
        Type::class("java/lang/invoke/MethodHandle");
    pub static ref JAVA_LANG_INVOKE_METHOD_TYPE: Type = Type::class("java/lang/invoke/MethodType");
}

/// What is known about the type of a value.
///
/// Partial hints are what bytecode tells about untyped operations: a
/// literal zero may be an integer, a float or a null reference, a 32-bit
/// move may copy an integer or a float, and so on. Merging a hint with a
/// compatible one refines it; concrete types are joined (int-like types
/// to `I`, references to their common superclass).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegType {
    /// Nothing known yet.
    Top,
    /// Int-like, float or reference.
    Zero,
    /// Int-like or float.
    Narrow,
    /// Long or double.
    Wide,
    /// Int-like.
    Integral,
    /// Any reference.
    Reference,
    Concrete(Type),
}

impl fmt::Display for RegType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Top => write!(f, "⊤"),
            Self::Zero => write!(f, "zero"),
            Self::Narrow => write!(f, "narrow"),
            Self::Wide => write!(f, "wide"),
            Self::Integral => write!(f, "integral"),
            Self::Reference => write!(f, "reference"),
            Self::Concrete(t) => write!(f, "{t}"),
        }
    }
}

impl From<Type> for RegType {
    fn from(t: Type) -> Self {
        Self::Concrete(t)
    }
}

impl From<&Type> for RegType {
    fn from(t: &Type) -> Self {
        Self::Concrete(t.clone())
    }
}

fn fits_narrow(t: &Type) -> bool {
    t.is_int_like() || matches!(t, Type::Float)
}

fn fits_zero(t: &Type) -> bool {
    fits_narrow(t) || t.is_reference()
}

impl RegType {
    /// The hint of a register holding a value of `slots` register slots,
    /// with no more information.
    #[must_use]
    pub const fn of_width(slots: usize) -> Self {
        if slots == 2 {
            Self::Wide
        } else {
            Self::Narrow
        }
    }

    #[must_use]
    pub const fn is_top(&self) -> bool {
        matches!(self, Self::Top)
    }

    /// Merges two hints of the same value, returning `None` when they are
    /// incompatible.
    #[must_use]
    pub fn merge(&self, other: &Self, symbols: &dyn SymbolTable) -> Option<Self> {
        use RegType::{Concrete, Integral, Narrow, Reference, Top, Wide, Zero};

        match (self, other) {
            (Top, t) | (t, Top) => Some(t.clone()),
            (Concrete(a), Concrete(b)) => join(a, b, symbols).map(Concrete),
            (Concrete(t), hint) | (hint, Concrete(t)) => {
                let fits = match hint {
                    Zero => fits_zero(t),
                    Narrow => fits_narrow(t),
                    Integral => t.is_int_like(),
                    Wide => t.is_wide(),
                    Reference => t.is_reference(),
                    Top | Concrete(_) => true,
                };
                fits.then(|| Concrete(t.clone()))
            }
            (a, b) if a == b => Some(a.clone()),
            (Zero, t @ (Narrow | Integral | Reference)) | (t @ (Narrow | Integral | Reference), Zero) => {
                Some(t.clone())
            }
            (Narrow, Integral) | (Integral, Narrow) => Some(Integral),
            _ => None,
        }
    }

    /// The type a solved value gets when only this hint is known about it.
    #[must_use]
    pub fn default_type(&self) -> Option<Type> {
        match self {
            Self::Top => None,
            Self::Zero | Self::Narrow | Self::Integral => Some(Type::Int),
            Self::Wide => Some(Type::Long),
            Self::Reference => Some(JAVA_LANG_OBJECT.clone()),
            Self::Concrete(t) => Some(t.clone()),
        }
    }
}

/// Joins two concrete types, returning `None` if they are incompatible.
#[must_use]
pub fn join(a: &Type, b: &Type, symbols: &dyn SymbolTable) -> Option<Type> {
    if a == b {
        return Some(a.clone());
    }
    if a.is_int_like() && b.is_int_like() {
        return Some(Type::Int);
    }
    match (a, b) {
        (Type::Class(x), Type::Class(y)) => Some(common_superclass(x, y, symbols)),
        (Type::Array(_, _) | Type::Class(_), Type::Array(_, _) | Type::Class(_)) => {
            Some(JAVA_LANG_OBJECT.clone())
        }
        _ => None,
    }
}

fn superclass_chain<'a>(class: &'a str, symbols: &'a dyn SymbolTable) -> Vec<&'a str> {
    let mut chain = vec![class];
    let mut current = class;
    while let Some(parent) = symbols.superclass(current) {
        // malformed hierarchies may loop
        if chain.contains(&parent) {
            break;
        }
        chain.push(parent);
        current = parent;
    }
    chain
}

fn common_superclass(a: &str, b: &str, symbols: &dyn SymbolTable) -> Type {
    let ancestors = superclass_chain(b, symbols);
    superclass_chain(a, symbols)
        .into_iter()
        .find(|class| ancestors.contains(class))
        .map_or_else(|| JAVA_LANG_OBJECT.clone(), Type::class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dl_bytecode::pools::Pools;

    #[test]
    fn partial_hints() {
        let pools = Pools::default();
        let int = RegType::Concrete(Type::Int);
        assert_eq!(RegType::Zero.merge(&RegType::Narrow, &pools), Some(RegType::Narrow));
        assert_eq!(RegType::Narrow.merge(&RegType::Integral, &pools), Some(RegType::Integral));
        assert_eq!(RegType::Zero.merge(&RegType::Reference, &pools), Some(RegType::Reference));
        assert_eq!(RegType::Integral.merge(&int, &pools), Some(int.clone()));
        assert_eq!(RegType::Top.merge(&RegType::Wide, &pools), Some(RegType::Wide));
        assert_eq!(RegType::Narrow.merge(&RegType::Reference, &pools), None);
        assert_eq!(RegType::Wide.merge(&RegType::Zero, &pools), None);
        assert_eq!(
            RegType::Integral.merge(&RegType::Concrete(Type::Float), &pools),
            None
        );
        assert_eq!(
            RegType::Zero.merge(&RegType::Concrete(JAVA_LANG_STRING.clone()), &pools),
            Some(RegType::Concrete(JAVA_LANG_STRING.clone()))
        );
    }

    #[test]
    fn merge_is_symmetric() {
        let pools = Pools::default();
        let hints = [
            RegType::Top,
            RegType::Zero,
            RegType::Narrow,
            RegType::Wide,
            RegType::Integral,
            RegType::Reference,
            RegType::Concrete(Type::Boolean),
            RegType::Concrete(Type::Int),
            RegType::Concrete(Type::Float),
            RegType::Concrete(Type::Long),
            RegType::Concrete(JAVA_LANG_STRING.clone()),
        ];
        for a in &hints {
            for b in &hints {
                assert_eq!(a.merge(b, &pools), b.merge(a, &pools), "{a} / {b}");
            }
        }
    }

    #[test]
    fn concrete_joins() {
        let pools = Pools::default();
        assert_eq!(join(&Type::Boolean, &Type::Char, &pools), Some(Type::Int));
        assert_eq!(join(&Type::Int, &Type::Float, &pools), None);
        assert_eq!(join(&Type::Long, &Type::Double, &pools), None);
        assert_eq!(
            join(&Type::Int.array_of(), &JAVA_LANG_STRING, &pools),
            Some(JAVA_LANG_OBJECT.clone())
        );
        assert_eq!(
            join(&JAVA_LANG_STRING, &JAVA_LANG_CLASS, &pools),
            Some(JAVA_LANG_OBJECT.clone())
        );
    }

    #[test]
    fn defaults() {
        assert_eq!(RegType::Zero.default_type(), Some(Type::Int));
        assert_eq!(RegType::Wide.default_type(), Some(Type::Long));
        assert_eq!(RegType::Reference.default_type(), Some(JAVA_LANG_OBJECT.clone()));
        assert_eq!(RegType::Top.default_type(), None);
    }
}
