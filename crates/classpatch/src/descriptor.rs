// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! JVM field and method descriptors.

use std::fmt;

/// The type of a field, parameter or return value as the JVM sees it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// `byte`
    Byte,
    /// `char`
    Char,
    /// `double`
    Double,
    /// `float`
    Float,
    /// `int`
    Int,
    /// `long`
    Long,
    /// `short`
    Short,
    /// `boolean`
    Boolean,
    /// A class or interface, by internal name (`java/lang/String`).
    Object(String),
    /// An array of the component type.
    Array(Box<Self>),
}

impl FieldType {
    /// A class or interface type from its binary name (`java.lang.String`).
    #[must_use]
    pub fn object(binary_name: &str) -> Self {
        Self::Object(binary_name.replace('.', "/"))
    }

    /// `java.lang.String`, the type most validation helpers traffic in.
    #[must_use]
    pub fn string() -> Self {
        Self::object("java.lang.String")
    }

    /// Parses a type as written in Java source: `int`, `java.lang.String`, `byte[][]`.
    ///
    /// Returns `None` for `void` and for malformed names.
    #[must_use]
    pub fn from_java_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if let Some(component) = name.strip_suffix("[]") {
            return Self::from_java_name(component).map(|c| Self::Array(Box::new(c)));
        }
        let primitive = match name {
            "byte" => Some(Self::Byte),
            "char" => Some(Self::Char),
            "double" => Some(Self::Double),
            "float" => Some(Self::Float),
            "int" => Some(Self::Int),
            "long" => Some(Self::Long),
            "short" => Some(Self::Short),
            "boolean" => Some(Self::Boolean),
            _ => None,
        };
        if primitive.is_some() {
            return primitive;
        }
        let valid = !name.is_empty()
            && name.split('.').all(|segment| {
                let mut chars = segment.chars();
                chars
                    .next()
                    .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
                    && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
            });
        (valid && name != "void").then(|| Self::object(name))
    }

    /// Parses a single field descriptor (`Ljava/lang/String;`, `[I`).
    #[must_use]
    pub fn parse(descriptor: &str) -> Option<Self> {
        let (field, rest) = Self::parse_prefix(descriptor)?;
        rest.is_empty().then_some(field)
    }

    fn parse_prefix(descriptor: &str) -> Option<(Self, &str)> {
        let mut chars = descriptor.chars();
        let tag = chars.next()?;
        let rest = chars.as_str();
        let field = match tag {
            'B' => Self::Byte,
            'C' => Self::Char,
            'D' => Self::Double,
            'F' => Self::Float,
            'I' => Self::Int,
            'J' => Self::Long,
            'S' => Self::Short,
            'Z' => Self::Boolean,
            'L' => {
                let end = rest.find(';')?;
                if end == 0 {
                    return None;
                }
                return Some((Self::Object(rest[..end].to_owned()), &rest[end + 1..]));
            }
            '[' => {
                let (component, rest) = Self::parse_prefix(rest)?;
                return Some((Self::Array(Box::new(component)), rest));
            }
            _ => return None,
        };
        Some((field, rest))
    }

    /// Returns the descriptor string for this type.
    #[must_use]
    pub fn descriptor(&self) -> String {
        let mut out = String::new();
        self.write_descriptor(&mut out);
        out
    }

    fn write_descriptor(&self, out: &mut String) {
        match self {
            Self::Byte => out.push('B'),
            Self::Char => out.push('C'),
            Self::Double => out.push('D'),
            Self::Float => out.push('F'),
            Self::Int => out.push('I'),
            Self::Long => out.push('J'),
            Self::Short => out.push('S'),
            Self::Boolean => out.push('Z'),
            Self::Object(name) => {
                out.push('L');
                out.push_str(name);
                out.push(';');
            }
            Self::Array(component) => {
                out.push('[');
                component.write_descriptor(out);
            }
        }
    }

    /// Returns the number of local variable / operand stack slots a value occupies.
    #[must_use]
    pub const fn slots(&self) -> u16 {
        match self {
            Self::Long | Self::Double => 2,
            _ => 1,
        }
    }

    /// The opcode family used to load a local of this type: `iload`, `lload`, `fload`,
    /// `dload` or `aload`.
    pub(crate) const fn load_kind(&self) -> u8 {
        match self {
            Self::Byte | Self::Char | Self::Short | Self::Boolean | Self::Int => 0,
            Self::Long => 1,
            Self::Float => 2,
            Self::Double => 3,
            Self::Object(_) | Self::Array(_) => 4,
        }
    }
}

impl fmt::Display for FieldType {
    /// Formats the type the way Java source spells it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Byte => f.write_str("byte"),
            Self::Char => f.write_str("char"),
            Self::Double => f.write_str("double"),
            Self::Float => f.write_str("float"),
            Self::Int => f.write_str("int"),
            Self::Long => f.write_str("long"),
            Self::Short => f.write_str("short"),
            Self::Boolean => f.write_str("boolean"),
            Self::Object(name) => f.write_str(&name.replace('/', ".")),
            Self::Array(component) => write!(f, "{component}[]"),
        }
    }
}

/// A method descriptor: parameter types and return type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    /// Parameter types, in declaration order.
    pub params: Vec<FieldType>,
    /// Return type; `None` for `void`.
    pub ret: Option<FieldType>,
}

impl MethodDescriptor {
    /// Creates a descriptor from its parts.
    #[must_use]
    pub const fn new(params: Vec<FieldType>, ret: Option<FieldType>) -> Self {
        Self { params, ret }
    }

    /// Parses a method descriptor such as `(Ljava/lang/String;I)V`.
    #[must_use]
    pub fn parse(descriptor: &str) -> Option<Self> {
        let mut rest = descriptor.strip_prefix('(')?;
        let mut params = Vec::new();
        while !rest.starts_with(')') {
            let (param, tail) = FieldType::parse_prefix(rest)?;
            params.push(param);
            rest = tail;
        }
        let ret = match &rest[1..] {
            "V" => None,
            other => Some(FieldType::parse(other)?),
        };
        Some(Self { params, ret })
    }

    /// Returns the descriptor string.
    #[must_use]
    pub fn descriptor(&self) -> String {
        let mut out = String::from("(");
        for param in &self.params {
            param.write_descriptor(&mut out);
        }
        out.push(')');
        match &self.ret {
            Some(ret) => ret.write_descriptor(&mut out),
            None => out.push('V'),
        }
        out
    }

    /// Returns the local variable slots occupied by the parameters of a static method.
    #[must_use]
    pub fn param_slots(&self) -> u16 {
        self.params.iter().map(FieldType::slots).sum()
    }

    /// Returns the local variable slot of parameter `index` in a static method.
    #[must_use]
    pub fn slot_of(&self, index: usize) -> Option<u16> {
        (index < self.params.len()).then(|| self.params[..index].iter().map(FieldType::slots).sum())
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}
