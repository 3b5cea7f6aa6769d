// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use bytes::{BufMut, Bytes};

use super::Decoder;
use crate::error::{Error, Result};

const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELD_REF: u8 = 9;
const TAG_METHOD_REF: u8 = 10;
const TAG_INTERFACE_METHOD_REF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;
const TAG_METHOD_HANDLE: u8 = 15;
const TAG_METHOD_TYPE: u8 = 16;
const TAG_DYNAMIC: u8 = 17;
const TAG_INVOKE_DYNAMIC: u8 = 18;
const TAG_MODULE: u8 = 19;
const TAG_PACKAGE: u8 = 20;

/// One constant pool entry.
///
/// Numeric constants keep their raw bit patterns so that a decoded pool re-encodes exactly.
#[derive(Clone, Debug, PartialEq, Eq)]
#[expect(missing_docs, reason = "Field names follow the JVM class-file format")]
pub enum Constant {
    /// Raw modified UTF-8 bytes.
    Utf8(Bytes),
    Integer(u32),
    Float(u32),
    Long(u64),
    Double(u64),
    Class { name_index: u16 },
    String { string_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
    /// Index 0, and the slot following a `Long` or `Double`.
    Unusable,
}

/// The constant pool of a class file, indexed from 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstantPool {
    // entries[0] is the reserved slot, so entries.len() is the encoded constant_pool_count.
    entries: Vec<Constant>,
}

impl ConstantPool {
    pub(crate) fn decode(d: &mut Decoder) -> Result<Self> {
        let count = usize::from(d.u16("constant pool count")?);
        if count == 0 {
            return Err(Error::malformed("constant pool count is zero"));
        }

        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable);
        while entries.len() < count {
            let index = entries.len();
            let tag = d.u8("constant tag")?;
            let constant = match tag {
                TAG_UTF8 => {
                    let len = usize::from(d.u16("utf8 length")?);
                    Constant::Utf8(d.take(len, "utf8 bytes")?)
                }
                TAG_INTEGER => Constant::Integer(d.u32("integer constant")?),
                TAG_FLOAT => Constant::Float(d.u32("float constant")?),
                TAG_LONG => Constant::Long(d.u64("long constant")?),
                TAG_DOUBLE => Constant::Double(d.u64("double constant")?),
                TAG_CLASS => Constant::Class {
                    name_index: d.u16("class name index")?,
                },
                TAG_STRING => Constant::String {
                    string_index: d.u16("string index")?,
                },
                TAG_FIELD_REF => Constant::FieldRef {
                    class_index: d.u16("fieldref class")?,
                    name_and_type_index: d.u16("fieldref name and type")?,
                },
                TAG_METHOD_REF => Constant::MethodRef {
                    class_index: d.u16("methodref class")?,
                    name_and_type_index: d.u16("methodref name and type")?,
                },
                TAG_INTERFACE_METHOD_REF => Constant::InterfaceMethodRef {
                    class_index: d.u16("interface methodref class")?,
                    name_and_type_index: d.u16("interface methodref name and type")?,
                },
                TAG_NAME_AND_TYPE => Constant::NameAndType {
                    name_index: d.u16("name and type name")?,
                    descriptor_index: d.u16("name and type descriptor")?,
                },
                TAG_METHOD_HANDLE => Constant::MethodHandle {
                    reference_kind: d.u8("method handle kind")?,
                    reference_index: d.u16("method handle reference")?,
                },
                TAG_METHOD_TYPE => Constant::MethodType {
                    descriptor_index: d.u16("method type descriptor")?,
                },
                TAG_DYNAMIC => Constant::Dynamic {
                    bootstrap_method_attr_index: d.u16("dynamic bootstrap method")?,
                    name_and_type_index: d.u16("dynamic name and type")?,
                },
                TAG_INVOKE_DYNAMIC => Constant::InvokeDynamic {
                    bootstrap_method_attr_index: d.u16("invokedynamic bootstrap method")?,
                    name_and_type_index: d.u16("invokedynamic name and type")?,
                },
                TAG_MODULE => Constant::Module {
                    name_index: d.u16("module name")?,
                },
                TAG_PACKAGE => Constant::Package {
                    name_index: d.u16("package name")?,
                },
                other => return Err(Error::malformed(format!("unknown constant tag {other} at index {index}"))),
            };

            let wide = matches!(constant, Constant::Long(_) | Constant::Double(_));
            entries.push(constant);
            if wide {
                if entries.len() >= count {
                    return Err(Error::malformed(format!("8-byte constant at index {index} overruns the pool")));
                }
                entries.push(Constant::Unusable);
            }
        }

        Ok(Self { entries })
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        #[expect(clippy::cast_possible_truncation, reason = "Pool growth is capped at u16::MAX entries")]
        out.put_u16(self.entries.len() as u16);

        for constant in &self.entries {
            match constant {
                Constant::Unusable => {}
                Constant::Utf8(bytes) => {
                    out.put_u8(TAG_UTF8);
                    #[expect(clippy::cast_possible_truncation, reason = "Decoded and interned strings fit in u16")]
                    out.put_u16(bytes.len() as u16);
                    out.put_slice(bytes);
                }
                Constant::Integer(v) => {
                    out.put_u8(TAG_INTEGER);
                    out.put_u32(*v);
                }
                Constant::Float(v) => {
                    out.put_u8(TAG_FLOAT);
                    out.put_u32(*v);
                }
                Constant::Long(v) => {
                    out.put_u8(TAG_LONG);
                    out.put_u64(*v);
                }
                Constant::Double(v) => {
                    out.put_u8(TAG_DOUBLE);
                    out.put_u64(*v);
                }
                Constant::Class { name_index } => put_tagged(out, TAG_CLASS, &[*name_index]),
                Constant::String { string_index } => put_tagged(out, TAG_STRING, &[*string_index]),
                Constant::FieldRef {
                    class_index,
                    name_and_type_index,
                } => put_tagged(out, TAG_FIELD_REF, &[*class_index, *name_and_type_index]),
                Constant::MethodRef {
                    class_index,
                    name_and_type_index,
                } => put_tagged(out, TAG_METHOD_REF, &[*class_index, *name_and_type_index]),
                Constant::InterfaceMethodRef {
                    class_index,
                    name_and_type_index,
                } => put_tagged(out, TAG_INTERFACE_METHOD_REF, &[*class_index, *name_and_type_index]),
                Constant::NameAndType {
                    name_index,
                    descriptor_index,
                } => put_tagged(out, TAG_NAME_AND_TYPE, &[*name_index, *descriptor_index]),
                Constant::MethodHandle {
                    reference_kind,
                    reference_index,
                } => {
                    out.put_u8(TAG_METHOD_HANDLE);
                    out.put_u8(*reference_kind);
                    out.put_u16(*reference_index);
                }
                Constant::MethodType { descriptor_index } => put_tagged(out, TAG_METHOD_TYPE, &[*descriptor_index]),
                Constant::Dynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                } => put_tagged(out, TAG_DYNAMIC, &[*bootstrap_method_attr_index, *name_and_type_index]),
                Constant::InvokeDynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                } => put_tagged(out, TAG_INVOKE_DYNAMIC, &[*bootstrap_method_attr_index, *name_and_type_index]),
                Constant::Module { name_index } => put_tagged(out, TAG_MODULE, &[*name_index]),
                Constant::Package { name_index } => put_tagged(out, TAG_PACKAGE, &[*name_index]),
            }
        }
    }

    /// Returns the encoded `constant_pool_count`: one more than the highest valid index.
    #[must_use]
    pub fn count(&self) -> u16 {
        #[expect(clippy::cast_possible_truncation, reason = "Pool growth is capped at u16::MAX entries")]
        let count = self.entries.len() as u16;
        count
    }

    /// Returns the constant at `index`, or `None` for index 0, an unusable slot or an index past
    /// the end.
    #[must_use]
    pub fn get(&self, index: u16) -> Option<&Constant> {
        match self.entries.get(usize::from(index)) {
            Some(Constant::Unusable) | None => None,
            Some(constant) => Some(constant),
        }
    }

    /// Decodes the `Utf8` constant at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedClassFile`] if the slot does not hold a decodable `Utf8`
    /// constant.
    pub fn utf8(&self, index: u16) -> Result<String> {
        match self.get(index) {
            Some(Constant::Utf8(bytes)) => decode_modified_utf8(bytes)
                .ok_or_else(|| Error::malformed(format!("constant {index} is not valid modified UTF-8"))),
            _ => Err(Error::malformed(format!("constant {index} is not a Utf8 entry"))),
        }
    }

    /// Returns the internal name (`java/lang/String`) of the `Class` constant at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedClassFile`] if the slot does not hold a `Class` constant.
    pub fn class_name(&self, index: u16) -> Result<String> {
        match self.get(index) {
            Some(Constant::Class { name_index }) => self.utf8(*name_index),
            _ => Err(Error::malformed(format!("constant {index} is not a Class entry"))),
        }
    }

    /// Returns the index of the `Utf8` constant holding `value`, without adding it.
    #[must_use]
    pub fn find_utf8(&self, value: &str) -> Option<u16> {
        let encoded = encode_modified_utf8(value);
        self.position(|c| matches!(c, Constant::Utf8(bytes) if bytes[..] == encoded[..]))
    }

    /// Returns the index of a `Utf8` constant holding `value`, adding one if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedClassFile`] if the pool is full or `value` is too long to encode.
    pub fn add_utf8(&mut self, value: &str) -> Result<u16> {
        let encoded = encode_modified_utf8(value);
        if let Some(index) = self.position(|c| matches!(c, Constant::Utf8(bytes) if bytes[..] == encoded[..])) {
            return Ok(index);
        }
        if encoded.len() > usize::from(u16::MAX) {
            return Err(Error::malformed("string constant is too long"));
        }
        self.push(Constant::Utf8(Bytes::from(encoded)))
    }

    /// Returns the index of a `Class` constant for `internal_name`, adding entries if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedClassFile`] if the pool is full.
    pub fn add_class(&mut self, internal_name: &str) -> Result<u16> {
        let name_index = self.add_utf8(internal_name)?;
        self.intern(Constant::Class { name_index })
    }

    /// Returns the index of a `NameAndType` constant, adding entries if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedClassFile`] if the pool is full.
    pub fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16> {
        let name_index = self.add_utf8(name)?;
        let descriptor_index = self.add_utf8(descriptor)?;
        self.intern(Constant::NameAndType {
            name_index,
            descriptor_index,
        })
    }

    /// Returns the index of a `Methodref` constant, adding entries if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedClassFile`] if the pool is full.
    pub fn add_method_ref(&mut self, owner_internal_name: &str, name: &str, descriptor: &str) -> Result<u16> {
        let class_index = self.add_class(owner_internal_name)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.intern(Constant::MethodRef {
            class_index,
            name_and_type_index,
        })
    }

    fn intern(&mut self, constant: Constant) -> Result<u16> {
        match self.position(|c| *c == constant) {
            Some(index) => Ok(index),
            None => self.push(constant),
        }
    }

    fn position(&self, predicate: impl Fn(&Constant) -> bool) -> Option<u16> {
        self.entries
            .iter()
            .position(|c| !matches!(c, Constant::Unusable) && predicate(c))
            .and_then(|i| u16::try_from(i).ok())
    }

    fn push(&mut self, constant: Constant) -> Result<u16> {
        let index = u16::try_from(self.entries.len())
            .ok()
            .filter(|&i| i < u16::MAX)
            .ok_or_else(|| Error::malformed("constant pool is full"))?;
        self.entries.push(constant);
        Ok(index)
    }
}

fn put_tagged(out: &mut Vec<u8>, tag: u8, indexes: &[u16]) {
    out.put_u8(tag);
    for index in indexes {
        out.put_u16(*index);
    }
}

/// Decodes the JVM's modified UTF-8: `NUL` is two bytes and supplementary characters are
/// surrogate pairs.
fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return Some(s.to_owned());
    }

    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            0x01..=0x7f => {
                units.push(u16::from(b));
                i += 1;
            }
            0xc0..=0xdf => {
                let b2 = continuation(bytes, i + 1)?;
                units.push((u16::from(b & 0x1f) << 6) | b2);
                i += 2;
            }
            0xe0..=0xef => {
                let b2 = continuation(bytes, i + 1)?;
                let b3 = continuation(bytes, i + 2)?;
                units.push((u16::from(b & 0x0f) << 12) | (b2 << 6) | b3);
                i += 3;
            }
            _ => return None,
        }
    }
    String::from_utf16(&units).ok()
}

fn continuation(bytes: &[u8], i: usize) -> Option<u16> {
    let b = *bytes.get(i)?;
    (b & 0xc0 == 0x80).then_some(u16::from(b & 0x3f))
}

#[expect(clippy::cast_possible_truncation, reason = "Each byte is masked to its payload bits")]
fn encode_modified_utf8(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007f => out.push(unit as u8),
            0x0000 | 0x0080..=0x07ff => {
                out.push(0xc0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            }
            _ => {
                out.push(0xe0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3f) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            }
        }
    }
    out
}
