//! The type layer: type representations, size/layout queries and symbols.

mod symbols;
pub(crate) mod types;

pub use symbols::{Symbol, SymbolKind, SymbolTable};
pub use types::{
    bytes_to_words, word_align, ArrayType, EnumType, FuncType, IntegerType, PointerType,
    StructMember, StructType, TypeInfo,
};
