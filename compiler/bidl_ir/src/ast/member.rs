//! Interface and parcelable members: methods, arguments, constants, fields.

use super::type_spec::TypeSpecifier;
use crate::{ConstExprId, Location};
use std::fmt;

/// Argument direction.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Direction {
    #[default]
    In,
    Out,
    Inout,
}

impl Direction {
    pub fn is_in(self) -> bool {
        matches!(self, Direction::In | Direction::Inout)
    }

    pub fn is_out(self) -> bool {
        matches!(self, Direction::Out | Direction::Inout)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            Direction::In => "in",
            Direction::Out => "out",
            Direction::Inout => "inout",
        };
        write!(f, "{word}")
    }
}

/// A method argument.
#[derive(Clone, Debug, PartialEq)]
pub struct Argument {
    pub direction: Direction,
    /// Whether the direction keyword was written in source. Implicit
    /// direction is `in`; some validity checks only fire on explicit use.
    pub direction_explicit: bool,
    pub ty: TypeSpecifier,
    pub name: String,
    pub location: Location,
}

impl Argument {
    /// Canonical rendering for dumps: `direction type name`, the direction
    /// written only when explicit in source.
    pub fn canonical_string(&self) -> String {
        if self.direction_explicit {
            format!("{} {} {}", self.direction, self.ty.canonical_string(), self.name)
        } else {
            format!("{} {}", self.ty.canonical_string(), self.name)
        }
    }
}

/// A method's transaction id: the wire dispatch number.
///
/// Assigned exactly once, either by the user (`= N`) or by auto-fill, and
/// immutable afterwards.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct TransactionId {
    pub value: i32,
    /// True when the id was written in source.
    pub explicit: bool,
}

/// Smallest id a user may assign.
pub const MIN_USER_TRANSACTION_ID: i32 = 0;
/// Largest id a user may assign; everything above is reserved for meta
/// transactions (`getInterfaceVersion` and friends).
pub const MAX_USER_TRANSACTION_ID: i32 = 16_777_114;

/// An interface method.
#[derive(Clone, Debug, PartialEq)]
pub struct Method {
    pub comment: Option<String>,
    pub oneway: bool,
    pub ret: TypeSpecifier,
    pub name: String,
    args: Vec<Argument>,
    id: Option<TransactionId>,
    pub location: Location,
}

impl Method {
    pub fn new(
        comment: Option<String>,
        oneway: bool,
        ret: TypeSpecifier,
        name: String,
        args: Vec<Argument>,
        explicit_id: Option<i32>,
        location: Location,
    ) -> Self {
        Method {
            comment,
            oneway,
            ret,
            name,
            args,
            id: explicit_id.map(|value| TransactionId {
                value,
                explicit: true,
            }),
            location,
        }
    }

    pub fn args(&self) -> &[Argument] {
        &self.args
    }

    /// Mutable view for the resolver; the argument list itself is fixed
    /// after parsing.
    pub fn args_mut(&mut self) -> &mut [Argument] {
        &mut self.args
    }

    /// Arguments visible to the callee (`in` and `inout`), borrowed from the
    /// single owned list.
    pub fn in_args(&self) -> impl Iterator<Item = &Argument> {
        self.args.iter().filter(|a| a.direction.is_in())
    }

    /// Arguments written back to the caller (`out` and `inout`).
    pub fn out_args(&self) -> impl Iterator<Item = &Argument> {
        self.args.iter().filter(|a| a.direction.is_out())
    }

    pub fn id(&self) -> Option<TransactionId> {
        self.id
    }

    pub fn has_explicit_id(&self) -> bool {
        self.id.is_some_and(|id| id.explicit)
    }

    /// Auto-assign a transaction id.
    ///
    /// # Panics
    /// Panics if an id was already assigned — ids are immutable once set.
    pub fn assign_id(&mut self, value: i32) {
        assert!(
            self.id.is_none(),
            "transaction id of `{}` assigned twice",
            self.name
        );
        self.id = Some(TransactionId {
            value,
            explicit: false,
        });
    }

    /// Method signature used for lookup and compatibility: name plus the
    /// ordered bare argument types. Return type is deliberately excluded.
    pub fn signature(&self) -> String {
        let args: Vec<String> = self.args.iter().map(|a| a.ty.bare_string()).collect();
        format!("{}({})", self.name, args.join(", "))
    }
}

/// A typed named constant owned by an interface.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantDecl {
    pub comment: Option<String>,
    pub ty: TypeSpecifier,
    pub name: String,
    pub value: ConstExprId,
    pub location: Location,
}

/// A structured parcelable field.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableDecl {
    pub comment: Option<String>,
    pub ty: TypeSpecifier,
    pub name: String,
    pub default: Option<ConstExprId>,
    pub location: Location,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn loc() -> Location {
        Location::new(Arc::from("t.bidl"), 1, 1)
    }

    fn arg(direction: Direction, explicit: bool, ty: &str, name: &str) -> Argument {
        Argument {
            direction,
            direction_explicit: explicit,
            ty: TypeSpecifier::new(ty.into(), loc()),
            name: name.into(),
            location: loc(),
        }
    }

    fn method(args: Vec<Argument>) -> Method {
        Method::new(
            None,
            false,
            TypeSpecifier::new("void".into(), loc()),
            "foo".into(),
            args,
            None,
            loc(),
        )
    }

    #[test]
    fn direction_views_share_ownership() {
        let m = method(vec![
            arg(Direction::In, true, "int", "a"),
            arg(Direction::Out, true, "String", "b"),
            arg(Direction::Inout, true, "long", "c"),
        ]);
        let ins: Vec<&str> = m.in_args().map(|a| a.name.as_str()).collect();
        let outs: Vec<&str> = m.out_args().map(|a| a.name.as_str()).collect();
        assert_eq!(ins, vec!["a", "c"]);
        assert_eq!(outs, vec!["b", "c"]);
        assert_eq!(m.args().len(), 3);
    }

    #[test]
    fn signature_excludes_names_and_return_type() {
        let m = method(vec![
            arg(Direction::In, false, "int", "a"),
            arg(Direction::In, false, "String", "b"),
        ]);
        assert_eq!(m.signature(), "foo(int, String)");
    }

    #[test]
    fn id_assignment_is_once() {
        let mut m = method(vec![]);
        assert_eq!(m.id(), None);
        m.assign_id(3);
        assert_eq!(
            m.id(),
            Some(TransactionId {
                value: 3,
                explicit: false
            })
        );
        assert!(!m.has_explicit_id());
    }

    #[test]
    #[should_panic(expected = "assigned twice")]
    fn reassigning_id_panics() {
        let mut m = method(vec![]);
        m.assign_id(0);
        m.assign_id(1);
    }
}
