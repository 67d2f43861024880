use derive_more::{Display, FromStr};
use proc_macro2::TokenStream;
use quote::quote;
use serde::{Deserialize, Serialize};

///
/// Primitive
///
/// Named value types with a fixed runtime representation. Every other named
/// type is resolved against the schema or emitted verbatim.
///

#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    FromStr,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[remain::sorted]
pub enum Primitive {
    Bool,
    Char,
    Float32,
    Float64,
    Int8,
    Int16,
    Int32,
    Int64,
    Nat8,
    Nat16,
    Nat32,
    Nat64,
    Text,
}

impl Primitive {
    /// Resolve a primitive from its schema name (`Int32`, `Text`, ...).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    // Scalars are compared by identity and returned by value.
    #[must_use]
    pub const fn supports_copy(self) -> bool {
        !matches!(self, Self::Text)
    }

    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    #[must_use]
    pub const fn is_signed_int(self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    #[must_use]
    pub const fn is_unsigned_int(self) -> bool {
        matches!(self, Self::Nat8 | Self::Nat16 | Self::Nat32 | Self::Nat64)
    }

    #[must_use]
    pub const fn is_int(self) -> bool {
        self.is_signed_int() || self.is_unsigned_int()
    }

    /// The zero value used when a property declares no default.
    #[must_use]
    pub fn zero(self) -> Literal {
        match self {
            Self::Bool => Literal::Bool(false),
            Self::Char => Literal::Text("\0".to_string()),
            Self::Float32 | Self::Float64 => Literal::Float(0.0),
            Self::Text => Literal::Text(String::new()),
            _ => Literal::Int(0),
        }
    }

    /// Whether a literal can initialise a property of this primitive.
    #[must_use]
    pub fn accepts(self, literal: &Literal) -> bool {
        match (self, literal) {
            (Self::Bool, Literal::Bool(_)) => true,
            (Self::Char, Literal::Text(s)) => s.chars().count() == 1,
            (Self::Text, Literal::Text(_)) => true,
            (p, Literal::Int(_)) if p.is_int() || p.is_float() => true,
            (p, Literal::Float(_)) => p.is_float(),
            _ => false,
        }
    }

    #[must_use]
    pub fn as_type(self) -> TokenStream {
        match self {
            Self::Bool => quote!(bool),
            Self::Char => quote!(char),
            Self::Float32 => quote!(f32),
            Self::Float64 => quote!(f64),
            Self::Int8 => quote!(i8),
            Self::Int16 => quote!(i16),
            Self::Int32 => quote!(i32),
            Self::Int64 => quote!(i64),
            Self::Nat8 => quote!(u8),
            Self::Nat16 => quote!(u16),
            Self::Nat32 => quote!(u32),
            Self::Nat64 => quote!(u64),
            Self::Text => quote!(::std::string::String),
        }
    }
}

///
/// PropertyKind
///
/// Storage shape of a property. Collection kinds own a live container that
/// tracks its own modification state; every other kind stores one value plus
/// an explicit is-set flag.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    #[default]
    Plain,
    Complex,
    Item,
    Reference,
    Array,
    List,
    Map,
    Derived,
}

impl PropertyKind {
    /// List and map properties report is-set as "container modified".
    #[must_use]
    pub const fn is_collection(self) -> bool {
        matches!(self, Self::List | Self::Map)
    }

    /// Kinds whose `null` normalises to an empty value.
    #[must_use]
    pub const fn empty_default(self) -> bool {
        matches!(self, Self::Array | Self::List | Self::Map)
    }

    /// Kinds whose `null` normalises to the declared default when not nullable.
    #[must_use]
    pub const fn normalizes_null(self) -> bool {
        matches!(self, Self::Plain | Self::Complex)
    }

    /// Kinds that may expose a keyed getter.
    #[must_use]
    pub const fn supports_key(self) -> bool {
        matches!(self, Self::List | Self::Map | Self::Array)
    }
}

///
/// Literal
///
/// Default value literal as written in a schema file.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Literal>),
}
