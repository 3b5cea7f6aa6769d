// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! An in-memory model of the JVM class-file format.
//!
//! Decoding keeps every attribute as opaque bytes, so [`ClassFile::to_bytes`] reproduces the
//! decoded input exactly. Only the parts needed to find a method and swap its `Code` attribute
//! are interpreted.

use bytes::{Buf, BufMut, Bytes};

pub use self::constant_pool::{Constant, ConstantPool};
pub use self::member::{AccessFlags, AttributeInfo, CodeAttribute, MemberInfo};
use crate::error::{Error, Result};

mod constant_pool;
mod member;

/// The class-file magic number.
pub const MAGIC: u32 = 0xCAFE_BABE;

/// A decoded class file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassFile {
    /// Minor version.
    pub minor_version: u16,
    /// Major version (52 is Java 8).
    pub major_version: u16,
    /// The constant pool.
    pub constant_pool: ConstantPool,
    /// Class access flags.
    pub access_flags: AccessFlags,
    /// Constant pool index of this class.
    pub this_class: u16,
    /// Constant pool index of the superclass, or 0 for `java.lang.Object`.
    pub super_class: u16,
    /// Constant pool indexes of the direct superinterfaces.
    pub interfaces: Vec<u16>,
    /// Declared fields.
    pub fields: Vec<MemberInfo>,
    /// Declared methods.
    pub methods: Vec<MemberInfo>,
    /// Class-level attributes.
    pub attributes: Vec<AttributeInfo>,
}

impl ClassFile {
    /// Decodes a class file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedClassFile`] if the bytes are not a well-formed class file,
    /// including when bytes remain after the last attribute.
    pub fn parse(bytes: impl Into<Bytes>) -> Result<Self> {
        let mut d = Decoder::new(bytes.into());

        let magic = d.u32("magic")?;
        if magic != MAGIC {
            return Err(Error::malformed(format!("bad magic {magic:#010x}")));
        }
        let minor_version = d.u16("minor version")?;
        let major_version = d.u16("major version")?;
        let constant_pool = ConstantPool::decode(&mut d)?;
        let access_flags = AccessFlags(d.u16("class access flags")?);
        let this_class = d.u16("this class")?;
        let super_class = d.u16("super class")?;
        let interface_count = d.u16("interface count")?;
        let interfaces = (0..interface_count).map(|_| d.u16("interface")).collect::<Result<_>>()?;
        let field_count = d.u16("field count")?;
        let fields = (0..field_count).map(|_| MemberInfo::decode(&mut d)).collect::<Result<_>>()?;
        let method_count = d.u16("method count")?;
        let methods = (0..method_count).map(|_| MemberInfo::decode(&mut d)).collect::<Result<_>>()?;
        let attributes = AttributeInfo::decode_list(&mut d)?;
        d.finish("class file")?;

        let class = Self {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        };
        // Fails early on a dangling this_class index.
        class.internal_name()?;
        Ok(class)
    }

    /// Encodes the class file.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.put_u32(MAGIC);
        out.put_u16(self.minor_version);
        out.put_u16(self.major_version);
        self.constant_pool.encode(&mut out);
        out.put_u16(self.access_flags.0);
        out.put_u16(self.this_class);
        out.put_u16(self.super_class);
        put_len(&mut out, self.interfaces.len());
        for interface in &self.interfaces {
            out.put_u16(*interface);
        }
        put_len(&mut out, self.fields.len());
        for field in &self.fields {
            field.encode(&mut out);
        }
        put_len(&mut out, self.methods.len());
        for method in &self.methods {
            method.encode(&mut out);
        }
        AttributeInfo::encode_list(&self.attributes, &mut out);
        out
    }

    /// Returns the internal name of this class (`org/apache/avro/Schema`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedClassFile`] if `this_class` is not a `Class` constant.
    pub fn internal_name(&self) -> Result<String> {
        self.constant_pool.class_name(self.this_class)
    }

    /// Returns the binary name of this class (`org.apache.avro.Schema`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedClassFile`] if `this_class` is not a `Class` constant.
    pub fn binary_name(&self) -> Result<String> {
        Ok(self.internal_name()?.replace('/', "."))
    }
}

#[expect(clippy::cast_possible_truncation, reason = "Member and interface counts come from a u16")]
fn put_len(out: &mut Vec<u8>, len: usize) {
    out.put_u16(len as u16);
}

/// A bounds-checked big-endian reader.
///
/// Every read names what it was reading so truncation errors say where the bytes ran out.
#[derive(Debug)]
pub(crate) struct Decoder {
    buf: Bytes,
}

impl Decoder {
    pub(crate) fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    fn need(&self, n: usize, what: &str) -> Result<()> {
        if self.buf.remaining() < n {
            return Err(Error::malformed(format!(
                "truncated while reading {what}: needed {n} bytes, {} left",
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    pub(crate) fn u8(&mut self, what: &str) -> Result<u8> {
        self.need(1, what)?;
        Ok(self.buf.get_u8())
    }

    pub(crate) fn u16(&mut self, what: &str) -> Result<u16> {
        self.need(2, what)?;
        Ok(self.buf.get_u16())
    }

    pub(crate) fn u32(&mut self, what: &str) -> Result<u32> {
        self.need(4, what)?;
        Ok(self.buf.get_u32())
    }

    pub(crate) fn u64(&mut self, what: &str) -> Result<u64> {
        self.need(8, what)?;
        Ok(self.buf.get_u64())
    }

    /// Reads a `u4` length field.
    pub(crate) fn len_u32(&mut self, what: &str) -> Result<usize> {
        let len = self.u32(what)?;
        usize::try_from(len).map_err(|e| Error::malformed(format!("{what} {len} does not fit in memory: {e}")))
    }

    pub(crate) fn take(&mut self, n: usize, what: &str) -> Result<Bytes> {
        self.need(n, what)?;
        Ok(self.buf.split_to(n))
    }

    pub(crate) fn finish(&self, what: &str) -> Result<()> {
        if self.buf.has_remaining() {
            return Err(Error::malformed(format!(
                "{} trailing bytes after {what}",
                self.buf.remaining()
            )));
        }
        Ok(())
    }
}
