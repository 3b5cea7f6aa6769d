// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{Level, event};

use crate::class_file::{AccessFlags, ClassFile, CodeAttribute, ConstantPool};
use crate::classpath::Classpath;
use crate::descriptor::{FieldType, MethodDescriptor};
use crate::error::{Error, Result};
use crate::locator::{ArtifactTarget, delete_stale_artifact};

const WIDE: u8 = 0xc4;
const ILOAD: u8 = 0x15;
const ILOAD_0: u8 = 0x1a;
const IRETURN: u8 = 0xac;
const RETURN: u8 = 0xb1;
const INVOKESTATIC: u8 = 0xb8;

/// Selects the one method a rewrite applies to.
///
/// A method matches when its name and descriptor are equal to the matcher's and it is both
/// `private` and `static`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodMatcher {
    name: String,
    descriptor: MethodDescriptor,
}

impl MethodMatcher {
    /// Access flags a matching method must carry.
    pub const REQUIRED_FLAGS: AccessFlags = AccessFlags(AccessFlags::PRIVATE.0 | AccessFlags::STATIC.0);

    /// Matches `private static <returns> <name>(<params>)`; `returns` is `None` for `void`.
    #[must_use]
    pub fn new(name: impl Into<String>, params: Vec<FieldType>, returns: Option<FieldType>) -> Self {
        Self {
            name: name.into(),
            descriptor: MethodDescriptor::new(params, returns),
        }
    }

    /// Returns the method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the method descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }
}

impl fmt::Display for MethodMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("private static ")?;
        match &self.descriptor.ret {
            Some(ret) => write!(f, "{ret}")?,
            None => f.write_str("void")?,
        }
        write!(f, " {}(", self.name)?;
        for (i, param) in self.descriptor.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")
    }
}

/// The body installed in place of the matched method's original one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Replacement {
    /// Return the argument at this index unchanged.
    ReturnArgument(usize),

    /// Forward every argument to a static method and return its result.
    Delegate {
        /// Binary name of the class declaring the delegate.
        owner: String,
        /// Delegate method name.
        name: String,
        /// Delegate descriptor; must equal the matched method's.
        descriptor: MethodDescriptor,
    },
}

impl Replacement {
    fn check(&self, class_name: &str, matcher: &MethodMatcher) -> Result<()> {
        let target = matcher.descriptor();
        let reason = match self {
            Self::ReturnArgument(index) => match (target.params.get(*index), &target.ret) {
                (None, _) => Some(format!("the method has no argument {index}")),
                (Some(_), None) => Some("the method returns void".to_owned()),
                (Some(arg), Some(ret)) if arg != ret => {
                    Some(format!("argument {index} is {arg} but the method returns {ret}"))
                }
                _ => None,
            },
            Self::Delegate { owner, name, descriptor } => {
                if descriptor != target {
                    Some(format!("delegate descriptor {descriptor} differs from {target}"))
                } else if !matches!(FieldType::from_java_name(owner), Some(FieldType::Object(_))) {
                    Some(format!("delegate owner {owner:?} is not a class name"))
                } else if owner == class_name && name == matcher.name() {
                    Some("the delegate is the method itself".to_owned())
                } else {
                    None
                }
            }
        };

        match reason {
            Some(reason) => Err(Error::IncompatibleReplacement {
                class_name: class_name.to_owned(),
                method: matcher.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }

    fn emit(&self, pool: &mut ConstantPool, target: &MethodDescriptor) -> Result<CodeAttribute> {
        let mut code = Vec::new();
        let max_stack = match self {
            Self::ReturnArgument(index) => {
                let arg = &target.params[*index];
                let slot = target.slot_of(*index).unwrap_or_default();
                push_load(&mut code, arg, slot);
                push_return(&mut code, Some(arg));
                arg.slots()
            }
            Self::Delegate { owner, name, descriptor } => {
                let mut slot = 0;
                for param in &target.params {
                    push_load(&mut code, param, slot);
                    slot += param.slots();
                }
                let method_ref = pool.add_method_ref(&owner.replace('.', "/"), name, &descriptor.descriptor())?;
                code.push(INVOKESTATIC);
                code.extend_from_slice(&method_ref.to_be_bytes());
                push_return(&mut code, target.ret.as_ref());
                slot.max(target.ret.as_ref().map_or(0, FieldType::slots))
            }
        };

        Ok(CodeAttribute {
            max_stack,
            max_locals: target.param_slots(),
            code,
            exception_table: Vec::new(),
            attributes: Vec::new(),
        })
    }
}

fn push_load(code: &mut Vec<u8>, field: &FieldType, slot: u16) {
    let kind = field.load_kind();
    match u8::try_from(slot) {
        Ok(short @ 0..=3) => code.push(ILOAD_0 + kind * 4 + short),
        Ok(byte) => code.extend_from_slice(&[ILOAD + kind, byte]),
        Err(_) => {
            code.extend_from_slice(&[WIDE, ILOAD + kind]);
            code.extend_from_slice(&slot.to_be_bytes());
        }
    }
}

fn push_return(code: &mut Vec<u8>, ret: Option<&FieldType>) {
    code.push(ret.map_or(RETURN, |r| IRETURN + r.load_kind()));
}

/// One targeted method-body replacement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewriteSpec {
    class_name: String,
    matcher: MethodMatcher,
    replacement: Replacement,
}

impl RewriteSpec {
    /// Describes a rewrite of the method selected by `matcher` in the class with binary name
    /// `class_name`.
    #[must_use]
    pub fn new(class_name: impl Into<String>, matcher: MethodMatcher, replacement: Replacement) -> Self {
        Self {
            class_name: class_name.into(),
            matcher,
            replacement,
        }
    }

    /// Returns the binary name of the target class.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Returns the method matcher.
    #[must_use]
    pub fn matcher(&self) -> &MethodMatcher {
        &self.matcher
    }

    /// Returns the replacement behavior.
    #[must_use]
    pub fn replacement(&self) -> &Replacement {
        &self.replacement
    }
}

/// Replaces the body of the method selected by `spec` and returns the new class file.
///
/// Only the matched method's `Code` attribute changes; constants the new body needs are appended
/// to the pool. Every other member and attribute is carried over byte for byte. Applying the
/// same spec to the output again yields the same bytes.
///
/// # Errors
///
/// * [`Error::MalformedClassFile`] if `original` is not a class file.
/// * [`Error::ClassNotResolvable`] if it defines a class other than the one `spec` names.
/// * [`Error::TargetMethodNotFound`] if zero or several methods match.
/// * [`Error::IncompatibleReplacement`] if the replacement does not fit the matched method, or
///   the method has no body.
pub fn rewrite_class(original: &[u8], spec: &RewriteSpec) -> Result<Vec<u8>> {
    let mut class = ClassFile::parse(Bytes::copy_from_slice(original))?;

    let defined = class.binary_name()?;
    if defined != spec.class_name {
        return Err(Error::ClassNotResolvable {
            class_name: spec.class_name.clone(),
            reason: format!("the artifact defines {defined}"),
        });
    }

    let matcher = &spec.matcher;
    let wanted = matcher.descriptor.descriptor();
    let mut candidates = Vec::new();
    for (index, method) in class.methods.iter().enumerate() {
        if method.access_flags.contains(MethodMatcher::REQUIRED_FLAGS)
            && method.name(&class.constant_pool)? == matcher.name
            && method.descriptor(&class.constant_pool)? == wanted
        {
            candidates.push(index);
        }
    }

    let &[index] = candidates.as_slice() else {
        return Err(Error::TargetMethodNotFound {
            class_name: spec.class_name.clone(),
            method: matcher.to_string(),
            candidates: candidates.len(),
        });
    };
    event!(Level::DEBUG, message = "method matched", class = %spec.class_name, method = %matcher);

    spec.replacement.check(&spec.class_name, matcher)?;

    let Some(code_at) = class.methods[index].code_position(&class.constant_pool) else {
        return Err(Error::IncompatibleReplacement {
            class_name: spec.class_name.clone(),
            method: matcher.to_string(),
            reason: "the method has no body".to_owned(),
        });
    };

    let code = spec.replacement.emit(&mut class.constant_pool, &matcher.descriptor)?;
    let method = &mut class.methods[index];
    let name_index = method.attributes[code_at].name_index;
    method.attributes[code_at] = code.to_attribute(name_index);

    Ok(class.to_bytes())
}

/// What [`MethodRewriteEngine::rewrite_method`] produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// The class file the original bytes came from.
    pub origin: PathBuf,
    /// The artifact that now holds the rewritten class.
    pub artifact: PathBuf,
    /// Size of the rewritten class file.
    pub len: usize,
}

/// Resolves a class on a [`Classpath`], rewrites it and emits the result into a class-output
/// directory.
#[derive(Clone, Debug)]
pub struct MethodRewriteEngine {
    classpath: Classpath,
}

impl MethodRewriteEngine {
    /// Creates an engine that resolves classes on `classpath`.
    #[must_use]
    pub fn new(classpath: Classpath) -> Self {
        Self { classpath }
    }

    /// Returns the classpath classes are resolved on.
    #[must_use]
    pub fn classpath(&self) -> &Classpath {
        &self.classpath
    }

    /// Rewrites the class `spec` targets and writes it under `class_output_dir`.
    ///
    /// The transform runs before anything on disk changes, so every error other than
    /// [`Error::ArtifactWriteFailure`] leaves the output directory as it was. The new artifact is
    /// written to a temporary sibling and renamed into place.
    ///
    /// # Errors
    ///
    /// Any error of [`rewrite_class`], [`Error::ClassNotResolvable`] if the class is not on the
    /// classpath, and [`Error::ArtifactWriteFailure`] if the artifact cannot be replaced.
    pub fn rewrite_method(&self, spec: &RewriteSpec, class_output_dir: impl AsRef<Path>) -> Result<RewriteOutcome> {
        let target = ArtifactTarget::new(spec.class_name(), class_output_dir)?;
        let loaded = self.classpath.load(spec.class_name())?;
        let rewritten = rewrite_class(&loaded.bytes, spec)?;

        delete_stale_artifact(target.path())?;
        write_artifact(target.path(), &rewritten)?;

        event!(
            Level::INFO,
            message = "method body replaced",
            class = spec.class_name(),
            method = %spec.matcher(),
            artifact = %target.path().display(),
            len = rewritten.len()
        );

        Ok(RewriteOutcome {
            origin: loaded.origin,
            artifact: target.path().to_path_buf(),
            len: rewritten.len(),
        })
    }
}

fn write_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::write_failure(parent, e))?;
    }

    let staging = path.with_extension("class.tmp");
    std::fs::write(&staging, bytes).map_err(|e| Error::write_failure(&staging, e))?;
    if let Err(e) = std::fs::rename(&staging, path) {
        // The staging file is useless without the rename.
        let _ = std::fs::remove_file(&staging);
        return Err(Error::write_failure(path, e));
    }
    Ok(())
}
