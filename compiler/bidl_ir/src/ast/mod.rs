//! AST node model.

pub mod annotation;
pub mod builtin;
pub mod defined_type;
pub mod member;
pub mod type_spec;

pub use annotation::{sorted_kinds, Annotation, AnnotationKind, AnnotationParam, ParamType};
pub use defined_type::{
    comment_has_hide, DefinedType, DefinedTypeKind, Document, EnumDecl, Enumerator, Import,
    Interface, StructuredParcelable, UnstructuredParcelable,
};
pub use member::{
    Argument, ConstantDecl, Direction, Method, TransactionId, VariableDecl,
    MAX_USER_TRANSACTION_ID, MIN_USER_TRANSACTION_ID,
};
pub use type_spec::TypeSpecifier;
