// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Hand-assembled class files and helpers for inspecting rewrite results.

#![allow(dead_code, reason = "Each test binary uses a different subset")]

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use xxhash_rust::xxh3::Xxh3;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const PRIVATE_STATIC: u16 = 0x000a;
pub const PUBLIC: u16 = 0x0001;
pub const PUBLIC_STATIC: u16 = 0x0009;
pub const PRIVATE_STATIC_NATIVE: u16 = 0x010a;
pub const PRIVATE_STATIC_FINAL: u16 = 0x001a;

/// Assembles a class file byte by byte, without going through the crate under test.
pub struct ClassBuilder {
    pool: Vec<u8>,
    next_index: u16,
    utf8: HashMap<String, u16>,
    this_class: u16,
    super_class: u16,
    fields: Vec<Vec<u8>>,
    methods: Vec<Vec<u8>>,
    attributes: Vec<Vec<u8>>,
}

impl ClassBuilder {
    pub fn new(internal_name: &str) -> Self {
        let mut builder = Self {
            pool: Vec::new(),
            next_index: 1,
            utf8: HashMap::new(),
            this_class: 0,
            super_class: 0,
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        };
        builder.this_class = builder.class(internal_name);
        builder.super_class = builder.class("java/lang/Object");
        builder
    }

    fn entry(&mut self, bytes: &[u8], slots: u16) -> u16 {
        let index = self.next_index;
        self.pool.extend_from_slice(bytes);
        self.next_index += slots;
        index
    }

    pub fn utf8(&mut self, value: &str) -> u16 {
        if let Some(&index) = self.utf8.get(value) {
            return index;
        }
        let mut bytes = vec![1];
        bytes.extend_from_slice(&u16::try_from(value.len()).unwrap().to_be_bytes());
        bytes.extend_from_slice(value.as_bytes());
        let index = self.entry(&bytes, 1);
        self.utf8.insert(value.to_owned(), index);
        index
    }

    pub fn class(&mut self, internal_name: &str) -> u16 {
        let name = self.utf8(internal_name);
        let mut bytes = vec![7];
        bytes.extend_from_slice(&name.to_be_bytes());
        self.entry(&bytes, 1)
    }

    pub fn string(&mut self, value: &str) -> u16 {
        let utf8 = self.utf8(value);
        let mut bytes = vec![8];
        bytes.extend_from_slice(&utf8.to_be_bytes());
        self.entry(&bytes, 1)
    }

    pub fn long(&mut self, value: i64) -> u16 {
        let mut bytes = vec![5];
        bytes.extend_from_slice(&value.to_be_bytes());
        self.entry(&bytes, 2)
    }

    pub fn double(&mut self, value: f64) -> u16 {
        let mut bytes = vec![6];
        bytes.extend_from_slice(&value.to_bits().to_be_bytes());
        self.entry(&bytes, 2)
    }

    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(owner);
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        let mut nat = vec![12];
        nat.extend_from_slice(&name.to_be_bytes());
        nat.extend_from_slice(&descriptor.to_be_bytes());
        let nat = self.entry(&nat, 1);
        let mut bytes = vec![10];
        bytes.extend_from_slice(&class.to_be_bytes());
        bytes.extend_from_slice(&nat.to_be_bytes());
        self.entry(&bytes, 1)
    }

    fn attribute(&mut self, name: &str, info: &[u8]) -> Vec<u8> {
        let mut out = self.utf8(name).to_be_bytes().to_vec();
        out.extend_from_slice(&u32::try_from(info.len()).unwrap().to_be_bytes());
        out.extend_from_slice(info);
        out
    }

    fn member(&mut self, flags: u16, name: &str, descriptor: &str, attributes: &[Vec<u8>]) -> Vec<u8> {
        let mut out = flags.to_be_bytes().to_vec();
        out.extend_from_slice(&self.utf8(name).to_be_bytes());
        out.extend_from_slice(&self.utf8(descriptor).to_be_bytes());
        out.extend_from_slice(&u16::try_from(attributes.len()).unwrap().to_be_bytes());
        for attribute in attributes {
            out.extend_from_slice(attribute);
        }
        out
    }

    pub fn field(&mut self, flags: u16, name: &str, descriptor: &str, constant_value: Option<u16>) -> &mut Self {
        let attributes: Vec<Vec<u8>> = constant_value
            .map(|index| self.attribute("ConstantValue", &index.to_be_bytes()))
            .into_iter()
            .collect();
        let field = self.member(flags, name, descriptor, &attributes);
        self.fields.push(field);
        self
    }

    /// Adds a method with a body and a one-entry `LineNumberTable`.
    pub fn method(
        &mut self,
        flags: u16,
        name: &str,
        descriptor: &str,
        max_stack: u16,
        max_locals: u16,
        code: &[u8],
    ) -> &mut Self {
        let line_numbers = self.attribute("LineNumberTable", &[0, 1, 0, 0, 0, 42]);
        let mut info = Vec::new();
        info.extend_from_slice(&max_stack.to_be_bytes());
        info.extend_from_slice(&max_locals.to_be_bytes());
        info.extend_from_slice(&u32::try_from(code.len()).unwrap().to_be_bytes());
        info.extend_from_slice(code);
        info.extend_from_slice(&0u16.to_be_bytes());
        info.extend_from_slice(&1u16.to_be_bytes());
        info.extend_from_slice(&line_numbers);
        let code_attribute = self.attribute("Code", &info);
        let exceptions = {
            let class = self.class("java/lang/IllegalArgumentException");
            let mut info = 1u16.to_be_bytes().to_vec();
            info.extend_from_slice(&class.to_be_bytes());
            self.attribute("Exceptions", &info)
        };
        let method = self.member(flags, name, descriptor, &[code_attribute, exceptions]);
        self.methods.push(method);
        self
    }

    /// Adds a method without a `Code` attribute.
    pub fn bodyless_method(&mut self, flags: u16, name: &str, descriptor: &str) -> &mut Self {
        let method = self.member(flags, name, descriptor, &[]);
        self.methods.push(method);
        self
    }

    pub fn source_file(&mut self, file: &str) -> &mut Self {
        let index = self.utf8(file);
        let attribute = self.attribute("SourceFile", &index.to_be_bytes());
        self.attributes.push(attribute);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = 0xCAFE_BABE_u32.to_be_bytes().to_vec();
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&52u16.to_be_bytes());
        out.extend_from_slice(&self.next_index.to_be_bytes());
        out.extend_from_slice(&self.pool);
        out.extend_from_slice(&0x0021u16.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        for members in [&self.fields, &self.methods, &self.attributes] {
            out.extend_from_slice(&u16::try_from(members.len()).unwrap().to_be_bytes());
            for member in members {
                out.extend_from_slice(member);
            }
        }
        out
    }
}

/// A stand-in for `org.apache.avro.Schema`: a constructor, the validation helper, a public
/// overload with a different descriptor, an instance method and two constant fields.
pub fn schema_builder() -> ClassBuilder {
    let mut b = ClassBuilder::new("org/apache/avro/Schema");
    let serial = b.long(-5_867_332_116_924_036_153);
    let reserved = b.string("__reserved");
    let object_init = b.method_ref("java/lang/Object", "<init>", "()V");
    let length = b.method_ref("java/lang/String", "length", "()I");
    let [init_hi, init_lo] = object_init.to_be_bytes();
    let [len_hi, len_lo] = length.to_be_bytes();

    b.field(PRIVATE_STATIC_FINAL, "serialVersionUID", "J", Some(serial))
        .field(PRIVATE_STATIC_FINAL, "RESERVED", "Ljava/lang/String;", Some(reserved))
        .method(PUBLIC, "<init>", "()V", 1, 1, &[0x2a, 0xb7, init_hi, init_lo, 0xb1])
        .method(
            PRIVATE_STATIC,
            "validateName",
            "(Ljava/lang/String;)Ljava/lang/String;",
            1,
            1,
            // name.length(); return name;
            &[0x2a, 0xb6, len_hi, len_lo, 0x57, 0x2a, 0xb0],
        )
        .method(
            PUBLIC_STATIC,
            "validateName",
            "(Ljava/lang/String;Z)Ljava/lang/String;",
            1,
            2,
            &[0x2a, 0xb0],
        )
        .method(PUBLIC, "getName", "()Ljava/lang/String;", 1, 1, &[0x01, 0xb0])
        .source_file("Schema.java");
    b
}

pub fn schema_class() -> Vec<u8> {
    schema_builder().build()
}

/// A value on the operand stack or in a local variable slot.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Ref(Option<String>),
}

/// Runs straight-line code made of loads and one return against `args`.
///
/// Panics on any other opcode, which is what a test wants.
pub fn eval_pass_through(code: &[u8], max_locals: u16, args: &[Value]) -> Option<Value> {
    let mut locals: Vec<Option<Value>> = vec![None; usize::from(max_locals)];
    let mut slot = 0;
    for arg in args {
        locals[slot] = Some(arg.clone());
        slot += if matches!(arg, Value::Long(_) | Value::Double(_)) { 2 } else { 1 };
    }

    let mut stack = Vec::new();
    let mut pc = 0;
    loop {
        let op = code[pc];
        match op {
            0x1a..=0x2d => {
                stack.push(locals[usize::from((op - 0x1a) % 4)].clone().unwrap());
                pc += 1;
            }
            0x15..=0x19 => {
                stack.push(locals[usize::from(code[pc + 1])].clone().unwrap());
                pc += 2;
            }
            0xac..=0xb0 => return stack.pop(),
            0xb1 => return None,
            other => panic!("unexpected opcode {other:#04x} at {pc}"),
        }
    }
}

/// Hashes every file under `root` together with its relative path, in file-name order.
pub fn dir_checksum(root: &Path) -> u64 {
    let mut hasher = Xxh3::new();
    for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
        let entry = entry.unwrap();
        if entry.file_type().is_file() {
            let relative = entry.path().strip_prefix(root).unwrap();
            hasher.update(relative.to_string_lossy().as_bytes());
            hasher.update(&std::fs::read(entry.path()).unwrap());
        }
    }
    hasher.digest()
}

/// Writes `bytes` as the artifact for `class_name` under `root`, creating directories.
pub fn put_class(root: &Path, class_name: &str, bytes: &[u8]) -> PathBuf {
    let path = classpatch::resolve_artifact_path(class_name, root).unwrap();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Writes a jar at `path` holding `bytes` as the class file for `class_name`, next to a manifest.
pub fn put_jar(path: &Path, class_name: &str, bytes: &[u8]) {
    let mut jar = ZipWriter::new(std::fs::File::create(path).unwrap());
    jar.start_file("META-INF/MANIFEST.MF", SimpleFileOptions::default()).unwrap();
    jar.write_all(b"Manifest-Version: 1.0\r\n").unwrap();
    jar.start_file(format!("{}.class", class_name.replace('.', "/")), SimpleFileOptions::default())
        .unwrap();
    jar.write_all(bytes).unwrap();
    let _ = jar.finish().unwrap();
}
