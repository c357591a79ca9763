//! The value type system and the static tables built on it.

pub mod binop;
pub mod constructors;
pub mod linalg;
pub mod unop;

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Int,
    Num,
    Bool,
    Vec2,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
    Quat,
}

impl Type {
    pub const ALL: [Type; 9] = [
        Type::Int, Type::Num, Type::Bool,
        Type::Vec2, Type::Vec3, Type::Vec4,
        Type::Mat3, Type::Mat4, Type::Quat,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Type::Int  => "int",
            Type::Num  => "num",
            Type::Bool => "bool",
            Type::Vec2 => "vec2",
            Type::Vec3 => "vec3",
            Type::Vec4 => "vec4",
            Type::Mat3 => "mat3",
            Type::Mat4 => "mat4",
            Type::Quat => "quat",
        }
    }

    pub fn from_name(name: &str) -> Option<Type> {
        Type::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Int | Type::Num)
    }

    /// Component count of an indexable type. Every component is a `num`.
    pub fn component_count(self) -> Option<usize> {
        match self {
            Type::Vec2 => Some(2),
            Type::Vec3 => Some(3),
            Type::Vec4 | Type::Quat => Some(4),
            Type::Mat3 => Some(9),
            Type::Mat4 => Some(16),
            Type::Int | Type::Num | Type::Bool => None,
        }
    }

    pub fn is_indexable(self) -> bool {
        self.component_count().is_some()
    }

    /// Element type of `self[i]`.
    pub fn element(self) -> Option<Type> {
        self.component_count().map(|_| Type::Num)
    }

    /// Whether a value of type `self` may be passed where `expected` is
    /// wanted: identical types, or int and num in either direction.
    pub fn compatible(self, expected: Type) -> bool {
        self == expected || (self.is_numeric() && expected.is_numeric())
    }

    /// Whether a value of type `self` may be stored in a slot of type
    /// `slot`. Only int widens to num.
    pub fn assignable_to(self, slot: Type) -> bool {
        self == slot || (self == Type::Int && slot == Type::Num)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
