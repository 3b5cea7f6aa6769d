// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use bytes::{BufMut, Bytes};

use super::Decoder;
use super::constant_pool::ConstantPool;
use crate::error::Result;

/// Class, field and method access flags.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessFlags(pub u16);

impl AccessFlags {
    /// `public`
    pub const PUBLIC: Self = Self(0x0001);
    /// `private`
    pub const PRIVATE: Self = Self(0x0002);
    /// `protected`
    pub const PROTECTED: Self = Self(0x0004);
    /// `static`
    pub const STATIC: Self = Self(0x0008);
    /// `final`
    pub const FINAL: Self = Self(0x0010);
    /// `synchronized` on methods, `super` on classes.
    pub const SYNCHRONIZED: Self = Self(0x0020);
    /// `native`
    pub const NATIVE: Self = Self(0x0100);
    /// `abstract`
    pub const ABSTRACT: Self = Self(0x0400);

    /// Returns `true` if every flag in `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for AccessFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for AccessFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessFlags({:#06x})", self.0)
    }
}

/// An attribute whose contents are kept as opaque bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeInfo {
    /// Index of the attribute name in the constant pool.
    pub name_index: u16,
    /// The attribute payload, without the name and length header.
    pub info: Bytes,
}

impl AttributeInfo {
    pub(crate) fn decode(d: &mut Decoder) -> Result<Self> {
        let name_index = d.u16("attribute name")?;
        let len = d.len_u32("attribute length")?;
        let info = d.take(len, "attribute payload")?;
        Ok(Self { name_index, info })
    }

    pub(crate) fn decode_list(d: &mut Decoder) -> Result<Vec<Self>> {
        let count = d.u16("attribute count")?;
        (0..count).map(|_| Self::decode(d)).collect()
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.put_u16(self.name_index);
        #[expect(clippy::cast_possible_truncation, reason = "Attribute payloads are bounded by the class-file format")]
        out.put_u32(self.info.len() as u32);
        out.put_slice(&self.info);
    }

    pub(crate) fn encode_list(attributes: &[Self], out: &mut Vec<u8>) {
        #[expect(clippy::cast_possible_truncation, reason = "Attribute counts come from a u16")]
        out.put_u16(attributes.len() as u16);
        for attribute in attributes {
            attribute.encode(out);
        }
    }

    /// Returns `true` if the attribute is named `name`.
    #[must_use]
    pub fn is_named(&self, pool: &ConstantPool, name: &str) -> bool {
        pool.utf8(self.name_index).is_ok_and(|n| n == name)
    }
}

/// A field or method declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberInfo {
    /// Access and property flags.
    pub access_flags: AccessFlags,
    /// Index of the simple name in the constant pool.
    pub name_index: u16,
    /// Index of the descriptor in the constant pool.
    pub descriptor_index: u16,
    /// Attributes, including `Code` for methods with a body.
    pub attributes: Vec<AttributeInfo>,
}

impl MemberInfo {
    pub(crate) fn decode(d: &mut Decoder) -> Result<Self> {
        Ok(Self {
            access_flags: AccessFlags(d.u16("member access flags")?),
            name_index: d.u16("member name")?,
            descriptor_index: d.u16("member descriptor")?,
            attributes: AttributeInfo::decode_list(d)?,
        })
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.put_u16(self.access_flags.0);
        out.put_u16(self.name_index);
        out.put_u16(self.descriptor_index);
        AttributeInfo::encode_list(&self.attributes, out);
    }

    /// Returns the member's simple name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedClassFile`](crate::Error::MalformedClassFile) if the name index is invalid.
    pub fn name(&self, pool: &ConstantPool) -> Result<String> {
        pool.utf8(self.name_index)
    }

    /// Returns the member's descriptor string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedClassFile`](crate::Error::MalformedClassFile) if the descriptor index is invalid.
    pub fn descriptor(&self, pool: &ConstantPool) -> Result<String> {
        pool.utf8(self.descriptor_index)
    }

    /// Returns the position of the `Code` attribute, if the method has a body.
    #[must_use]
    pub fn code_position(&self, pool: &ConstantPool) -> Option<usize> {
        self.attributes.iter().position(|a| a.is_named(pool, CodeAttribute::NAME))
    }
}

/// The decoded form of a method's `Code` attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeAttribute {
    /// Maximum operand stack depth.
    pub max_stack: u16,
    /// Number of local variable slots, parameters included.
    pub max_locals: u16,
    /// The bytecode.
    pub code: Vec<u8>,
    /// The raw exception table: `(start_pc, end_pc, handler_pc, catch_type)` entries.
    pub exception_table: Vec<[u16; 4]>,
    /// Nested attributes such as `LineNumberTable`.
    pub attributes: Vec<AttributeInfo>,
}

impl CodeAttribute {
    /// The attribute name.
    pub const NAME: &'static str = "Code";

    /// Decodes the payload of a `Code` attribute.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedClassFile`](crate::Error::MalformedClassFile) if the payload is truncated or has trailing bytes.
    pub fn decode(info: &Bytes) -> Result<Self> {
        let mut d = Decoder::new(info.clone());
        let max_stack = d.u16("max stack")?;
        let max_locals = d.u16("max locals")?;
        let code_len = d.len_u32("code length")?;
        let code = d.take(code_len, "bytecode")?.to_vec();
        let handlers = d.u16("exception table length")?;
        let exception_table = (0..handlers)
            .map(|_| -> Result<[u16; 4]> {
                Ok([
                    d.u16("handler start")?,
                    d.u16("handler end")?,
                    d.u16("handler pc")?,
                    d.u16("handler catch type")?,
                ])
            })
            .collect::<Result<_>>()?;
        let attributes = AttributeInfo::decode_list(&mut d)?;
        d.finish("Code attribute")?;
        Ok(Self {
            max_stack,
            max_locals,
            code,
            exception_table,
            attributes,
        })
    }

    /// Encodes this attribute under the constant pool entry `name_index`.
    #[must_use]
    pub fn to_attribute(&self, name_index: u16) -> AttributeInfo {
        let mut out = Vec::with_capacity(12 + self.code.len());
        out.put_u16(self.max_stack);
        out.put_u16(self.max_locals);
        #[expect(clippy::cast_possible_truncation, reason = "Generated bodies are a handful of bytes")]
        out.put_u32(self.code.len() as u32);
        out.put_slice(&self.code);
        #[expect(clippy::cast_possible_truncation, reason = "Exception table lengths come from a u16")]
        out.put_u16(self.exception_table.len() as u16);
        for entry in &self.exception_table {
            for value in entry {
                out.put_u16(*value);
            }
        }
        AttributeInfo::encode_list(&self.attributes, &mut out);
        AttributeInfo {
            name_index,
            info: Bytes::from(out),
        }
    }
}
