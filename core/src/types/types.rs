//! Type representations and size queries.
//!
//! Types are immutable and arena-interned: named types (builtins, structs,
//! enums, functions) are constructed once by symbol generation and shared
//! as `&'a TypeInfo<'a>`, so identity comparison is pointer comparison.
//!
//! Memory is word-granular: every stack slot is word-sized and struct
//! members are word-aligned, so member offsets (stored in bytes) are always
//! word multiples.

use core::fmt;

use bumpalo::Bump;

use crate::vm::WORD_SIZE;

/// Round `bytes` up to the next word boundary.
pub fn word_align(bytes: i64) -> i64 {
    let align = WORD_SIZE as i64;
    (bytes + align - 1) & !(align - 1)
}

/// Number of words needed to hold `bytes` bytes.
pub fn bytes_to_words(bytes: i64) -> i64 {
    (bytes + WORD_SIZE as i64 - 1) / WORD_SIZE as i64
}

#[derive(Debug)]
pub enum TypeInfo<'a> {
    Integer(IntegerType<'a>),
    Bool,
    Struct(StructType<'a>),
    Enum(EnumType<'a>),
    Func(FuncType<'a>),
    Array(ArrayType<'a>),
    Pointer(PointerType<'a>),
}

#[derive(Debug)]
pub struct IntegerType<'a> {
    pub name: &'a str,
    pub bits: u32,
    pub signed: bool,
}

#[derive(Debug)]
pub struct StructType<'a> {
    pub name: &'a str,
    pub members: &'a [StructMember<'a>],
    /// Word-aligned total size in bytes.
    pub size: i64,
}

#[derive(Debug)]
pub struct StructMember<'a> {
    pub name: &'a str,
    /// Byte offset from the start of the struct; always a word multiple.
    pub offset: i64,
    pub ty: &'a TypeInfo<'a>,
}

#[derive(Debug)]
pub struct EnumType<'a> {
    pub name: &'a str,
    pub members: &'a [&'a str],
}

#[derive(Debug)]
pub struct FuncType<'a> {
    pub name: &'a str,
    pub params: &'a [(&'a str, &'a TypeInfo<'a>)],
    pub ret: &'a TypeInfo<'a>,
    /// Builtin compiler functions invoked with `@`; they have no body and
    /// are never emitted.
    pub is_comptime: bool,
}

#[derive(Debug)]
pub struct ArrayType<'a> {
    pub element: &'a TypeInfo<'a>,
    pub elements: i64,
}

#[derive(Debug)]
pub struct PointerType<'a> {
    pub pointee: &'a TypeInfo<'a>,
}

impl<'a> StructType<'a> {
    /// Lay out `members` in declaration order, word-aligning each offset.
    pub fn with_layout(
        arena: &'a Bump,
        name: &'a str,
        members: Vec<(&'a str, &'a TypeInfo<'a>)>,
    ) -> Self {
        let mut offset = 0;
        let laid_out = members.into_iter().map(|(member_name, ty)| {
            let member = StructMember {
                name: member_name,
                offset,
                ty,
            };
            offset = word_align(offset + ty.byte_size());
            member
        });
        let members = arena.alloc_slice_fill_iter(laid_out);
        StructType {
            name,
            members,
            size: offset,
        }
    }

    pub fn member(&self, name: &str) -> Option<&StructMember<'a>> {
        self.members.iter().find(|m| m.name == name)
    }
}

impl<'a> EnumType<'a> {
    /// The integer constant a member stands for: its declaration index.
    pub fn ordinal(&self, name: &str) -> Option<i64> {
        self.members.iter().position(|m| *m == name).map(|i| i as i64)
    }
}

impl<'a> TypeInfo<'a> {
    /// Size in bytes of a value of this type.
    pub fn byte_size(&self) -> i64 {
        match self {
            TypeInfo::Integer(int) => int.bits as i64 / 8,
            TypeInfo::Bool => 1,
            TypeInfo::Struct(s) => s.size,
            // Enum members are small integer constants.
            TypeInfo::Enum(_) => 4,
            TypeInfo::Pointer(_) => WORD_SIZE as i64,
            TypeInfo::Array(a) => a.elements * word_align(a.element.byte_size()),
            // Function types never appear as values.
            TypeInfo::Func(_) => 0,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, TypeInfo::Integer(_))
    }

    /// Types whose values fit a single stack word: everything the call
    /// convention and arithmetic operate on directly.
    pub fn is_word_scalar(&self) -> bool {
        matches!(
            self,
            TypeInfo::Integer(_) | TypeInfo::Bool | TypeInfo::Enum(_)
        )
    }

    /// Whether a value of `self` can be assigned from a value of `other`.
    ///
    /// Integers of any width are mutually assignable (stack cells are
    /// words either way); named types must be the same interned type.
    pub fn assignable_from(&self, other: &TypeInfo<'a>) -> bool {
        match (self, other) {
            (TypeInfo::Integer(_), TypeInfo::Integer(_)) => true,
            // Enum values are integer constants.
            (TypeInfo::Integer(_), TypeInfo::Enum(_)) => true,
            (TypeInfo::Bool, TypeInfo::Bool) => true,
            (TypeInfo::Struct(_), TypeInfo::Struct(_))
            | (TypeInfo::Enum(_), TypeInfo::Enum(_)) => core::ptr::eq(self, other),
            _ => false,
        }
    }
}

impl fmt::Display for TypeInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeInfo::Integer(int) => f.write_str(int.name),
            TypeInfo::Bool => f.write_str("bool"),
            TypeInfo::Struct(s) => f.write_str(s.name),
            TypeInfo::Enum(e) => f.write_str(e.name),
            TypeInfo::Func(func) => write!(f, "func {}", func.name),
            TypeInfo::Array(a) => write!(f, "{}[{}]", a.element, a.elements),
            TypeInfo::Pointer(p) => write!(f, "^{}", p.pointee),
        }
    }
}
