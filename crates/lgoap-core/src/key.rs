use core::fmt;
use core::ops::BitOr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Value kind of a blackboard key. The set is closed.
///
/// `Invalid` only exists in authored data (an unassigned type tag) and never survives validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum KeyType {
    #[default]
    Invalid,
    Boolean,
    Float,
    Integer,
    Object,
    Vector,
    Quaternion,
}

impl KeyType {
    pub const fn size(self) -> usize {
        match self {
            KeyType::Invalid => 0,
            KeyType::Boolean => 1,
            KeyType::Float | KeyType::Integer | KeyType::Object => 4,
            KeyType::Vector => 12,
            KeyType::Quaternion => 16,
        }
    }

    pub const fn is_valid(self) -> bool {
        !matches!(self, KeyType::Invalid)
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyType::Invalid => "invalid",
            KeyType::Boolean => "boolean",
            KeyType::Float => "float",
            KeyType::Integer => "integer",
            KeyType::Object => "object",
            KeyType::Vector => "vector",
            KeyType::Quaternion => "quaternion",
        };
        f.write_str(name)
    }
}

/// Largest encoded value, used for stack scratch space during change detection.
pub const MAX_VALUE_SIZE: usize = KeyType::Quaternion.size();

/// Per-key behavior flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct KeyTraits(u8);

impl KeyTraits {
    pub const NONE: Self = Self(0);
    /// Writes are shared by every instance compiled from the same layout.
    pub const INSTANCE_SYNCED: Self = Self(1 << 0);
    /// A host write that changes the value raises an unexpected-change signal.
    pub const BROADCAST_ON_UNEXPECTED_CHANGE: Self = Self(1 << 1);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl BitOr for KeyTraits {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Host-owned object reference. The blackboard stores only this id; `0` means "none".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct ObjectId(pub u32);

impl ObjectId {
    pub const NONE: Self = Self(0);

    pub fn is_some(self) -> bool {
        self.0 != 0
    }
}

pub type Vector3 = [f32; 3];
pub type Quaternion = [f32; 4];

/// A value that can live in a compiled blackboard slot.
pub trait BlackboardValue: Copy + PartialEq + 'static {
    const KEY_TYPE: KeyType;

    /// `bytes.len() == Self::KEY_TYPE.size()`
    fn decode(bytes: &[u8]) -> Self;

    /// `out.len() == Self::KEY_TYPE.size()`
    fn encode(self, out: &mut [u8]);
}

fn le_words<const N: usize>(bytes: &[u8]) -> [f32; N] {
    let mut out = [0.0; N];
    for (i, chunk) in bytes.chunks_exact(4).take(N).enumerate() {
        out[i] = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    out
}

fn write_words(words: &[f32], out: &mut [u8]) {
    for (chunk, word) in out.chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
}

impl BlackboardValue for bool {
    const KEY_TYPE: KeyType = KeyType::Boolean;

    fn decode(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }

    fn encode(self, out: &mut [u8]) {
        out[0] = u8::from(self);
    }
}

impl BlackboardValue for f32 {
    const KEY_TYPE: KeyType = KeyType::Float;

    fn decode(bytes: &[u8]) -> Self {
        f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn encode(self, out: &mut [u8]) {
        out.copy_from_slice(&self.to_le_bytes());
    }
}

impl BlackboardValue for i32 {
    const KEY_TYPE: KeyType = KeyType::Integer;

    fn decode(bytes: &[u8]) -> Self {
        i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn encode(self, out: &mut [u8]) {
        out.copy_from_slice(&self.to_le_bytes());
    }
}

impl BlackboardValue for ObjectId {
    const KEY_TYPE: KeyType = KeyType::Object;

    fn decode(bytes: &[u8]) -> Self {
        ObjectId(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn encode(self, out: &mut [u8]) {
        out.copy_from_slice(&self.0.to_le_bytes());
    }
}

impl BlackboardValue for Vector3 {
    const KEY_TYPE: KeyType = KeyType::Vector;

    fn decode(bytes: &[u8]) -> Self {
        le_words(bytes)
    }

    fn encode(self, out: &mut [u8]) {
        write_words(&self, out);
    }
}

impl BlackboardValue for Quaternion {
    const KEY_TYPE: KeyType = KeyType::Quaternion;

    fn decode(bytes: &[u8]) -> Self {
        le_words(bytes)
    }

    fn encode(self, out: &mut [u8]) {
        write_words(&self, out);
    }
}

/// Dynamically typed key value, used for authored defaults and by-name host access.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum KeyValue {
    Boolean(bool),
    Float(f32),
    Integer(i32),
    Object(ObjectId),
    Vector(Vector3),
    Quaternion(Quaternion),
}

impl KeyValue {
    /// Zero value of `key_type`; `None` for [`KeyType::Invalid`].
    pub fn zero(key_type: KeyType) -> Option<Self> {
        Some(match key_type {
            KeyType::Invalid => return None,
            KeyType::Boolean => KeyValue::Boolean(false),
            KeyType::Float => KeyValue::Float(0.0),
            KeyType::Integer => KeyValue::Integer(0),
            KeyType::Object => KeyValue::Object(ObjectId::NONE),
            KeyType::Vector => KeyValue::Vector([0.0; 3]),
            KeyType::Quaternion => KeyValue::Quaternion([0.0, 0.0, 0.0, 1.0]),
        })
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            KeyValue::Boolean(_) => KeyType::Boolean,
            KeyValue::Float(_) => KeyType::Float,
            KeyValue::Integer(_) => KeyType::Integer,
            KeyValue::Object(_) => KeyType::Object,
            KeyValue::Vector(_) => KeyType::Vector,
            KeyValue::Quaternion(_) => KeyType::Quaternion,
        }
    }

    pub fn encode(&self, out: &mut [u8]) {
        match *self {
            KeyValue::Boolean(v) => v.encode(out),
            KeyValue::Float(v) => v.encode(out),
            KeyValue::Integer(v) => v.encode(out),
            KeyValue::Object(v) => v.encode(out),
            KeyValue::Vector(v) => v.encode(out),
            KeyValue::Quaternion(v) => v.encode(out),
        }
    }

    pub fn decode(key_type: KeyType, bytes: &[u8]) -> Option<Self> {
        Some(match key_type {
            KeyType::Invalid => return None,
            KeyType::Boolean => KeyValue::Boolean(bool::decode(bytes)),
            KeyType::Float => KeyValue::Float(f32::decode(bytes)),
            KeyType::Integer => KeyValue::Integer(i32::decode(bytes)),
            KeyType::Object => KeyValue::Object(ObjectId::decode(bytes)),
            KeyType::Vector => KeyValue::Vector(Vector3::decode(bytes)),
            KeyType::Quaternion => KeyValue::Quaternion(Quaternion::decode(bytes)),
        })
    }
}

/// One authored key: name, type, traits and default value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyDecl {
    pub name: String,
    pub key_type: KeyType,
    #[cfg_attr(feature = "serde", serde(default))]
    pub traits: KeyTraits,
    /// Falls back to the type's zero value.
    #[cfg_attr(feature = "serde", serde(default))]
    pub default: Option<KeyValue>,
}

impl KeyDecl {
    pub fn new(name: impl Into<String>, key_type: KeyType) -> Self {
        Self {
            name: name.into(),
            key_type,
            traits: KeyTraits::NONE,
            default: None,
        }
    }

    fn with_default(name: impl Into<String>, value: KeyValue) -> Self {
        Self {
            default: Some(value),
            ..Self::new(name, value.key_type())
        }
    }

    pub fn boolean(name: impl Into<String>, default: bool) -> Self {
        Self::with_default(name, KeyValue::Boolean(default))
    }

    pub fn float(name: impl Into<String>, default: f32) -> Self {
        Self::with_default(name, KeyValue::Float(default))
    }

    pub fn integer(name: impl Into<String>, default: i32) -> Self {
        Self::with_default(name, KeyValue::Integer(default))
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, KeyType::Object)
    }

    pub fn vector(name: impl Into<String>, default: Vector3) -> Self {
        Self::with_default(name, KeyValue::Vector(default))
    }

    pub fn quaternion(name: impl Into<String>, default: Quaternion) -> Self {
        Self::with_default(name, KeyValue::Quaternion(default))
    }

    pub fn with_traits(mut self, traits: KeyTraits) -> Self {
        self.traits = self.traits | traits;
        self
    }

    pub fn broadcast(self) -> Self {
        self.with_traits(KeyTraits::BROADCAST_ON_UNEXPECTED_CHANGE)
    }

    pub fn synced(self) -> Self {
        self.with_traits(KeyTraits::INSTANCE_SYNCED)
    }

    pub fn default_value(&self) -> Option<KeyValue> {
        self.default.or_else(|| KeyValue::zero(self.key_type))
    }
}
