//! Field tables for struct mapping and named argument lookup.
//!
//! `#[derive(FromRow)]` and `#[derive(ToArgs)]` generate a static [`FieldInfo`] table per
//! type. Column names and token names are resolved against that table:
//!
//! 1. a field whose `#[xdb(col = "...")]` tag equals the key,
//! 2. else a field whose name equals the key ignoring case and underscores,
//! 3. else, depth first, the fields of `#[xdb(embed)]` members.
//!
//! The first match wins.

use crate::arg::{Arg, ToArg};
use crate::decode::DecodeRaw;
use crate::error::{XdbError, XdbResult};
use std::collections::{BTreeMap, HashMap};

/// Static description of one struct field.
#[derive(Debug, Clone, Copy)]
pub struct FieldInfo {
    pub name: &'static str,
    pub tag: Option<&'static str>,
    /// Field table of an embedded member; `None` for plain fields.
    pub embedded: Option<&'static [FieldInfo]>,
}

impl FieldInfo {
    pub const fn field(name: &'static str, tag: Option<&'static str>) -> Self {
        Self {
            name,
            tag,
            embedded: None,
        }
    }

    pub const fn embed(name: &'static str, fields: &'static [FieldInfo]) -> Self {
        Self {
            name,
            tag: None,
            embedded: Some(fields),
        }
    }
}

/// A struct that result rows can be mapped into.
///
/// Derive it with `#[derive(FromRow)]`:
///
/// ```ignore
/// #[derive(Default, FromRow)]
/// struct User {
///     #[xdb(col = "user_id")]
///     id: i64,
///     user_name: String,
///     #[xdb(embed)]
///     audit: Audit,
/// }
/// ```
pub trait FromRow: Default {
    const FIELDS: &'static [FieldInfo];

    /// The field at `path` (indices into `FIELDS` and embedded tables).
    fn field_mut(&mut self, path: &[usize]) -> Option<&mut dyn DecodeRaw>;
}

/// A struct whose fields can be bound to named tokens.
pub trait ToArgs {
    const FIELDS: &'static [FieldInfo];

    /// The argument for the field at `path`.
    fn field_arg(&self, path: &[usize]) -> Option<Arg>;
}

/// Anything `reflect_args` can draw arguments from.
pub trait ArgSource {
    /// A ready positional list. When present, tokens are ignored.
    fn positional(&self) -> Option<Vec<Arg>> {
        None
    }

    /// The argument bound to a named token, if the source has one.
    fn lookup(&self, token: &str) -> Option<Arg>;

    /// Resolve `tokens` in order. Unresolved tokens bind [`Arg::Null`].
    fn resolve_args(&self, tokens: &[String]) -> Vec<Arg> {
        if let Some(args) = self.positional() {
            return args;
        }
        tokens
            .iter()
            .map(|token| self.lookup(token).unwrap_or(Arg::Null))
            .collect()
    }
}

/// Look a token up on a [`ToArgs`] struct; used by the derived [`ArgSource`] impl.
pub fn lookup_field<T: ToArgs + ?Sized>(source: &T, token: &str) -> Option<Arg> {
    let path = resolve(T::FIELDS, token)?;
    source.field_arg(&path)
}

/// Compare ignoring ASCII case and underscores.
pub fn names_match(a: &str, b: &str) -> bool {
    let a = a.chars().filter(|c| *c != '_').map(|c| c.to_ascii_lowercase());
    let b = b.chars().filter(|c| *c != '_').map(|c| c.to_ascii_lowercase());
    a.eq(b)
}

/// Resolve `key` to a field path in `fields`.
pub fn resolve(fields: &'static [FieldInfo], key: &str) -> Option<Vec<usize>> {
    let plain = || {
        fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.embedded.is_none())
    };

    if let Some((i, _)) = plain().find(|(_, f)| f.tag == Some(key)) {
        return Some(vec![i]);
    }
    if let Some((i, _)) = plain().find(|(_, f)| names_match(f.name, key)) {
        return Some(vec![i]);
    }
    fields.iter().enumerate().find_map(|(i, f)| {
        let inner = f.embedded?;
        let mut path = resolve(inner, key)?;
        path.insert(0, i);
        Some(path)
    })
}

/// Column index → field path, resolved once per result set.
#[derive(Debug, Clone)]
pub(crate) struct ColumnMap {
    paths: Vec<Option<Vec<usize>>>,
}

impl ColumnMap {
    pub(crate) fn new(fields: &'static [FieldInfo], columns: &[String]) -> Self {
        let mut paths: Vec<Option<Vec<usize>>> = Vec::with_capacity(columns.len());
        for column in columns {
            let path = resolve(fields, column).filter(|p| !paths.iter().flatten().any(|q| q == p));
            paths.push(path);
        }
        Self { paths }
    }

    /// Assign every mapped column of `values` into `target`.
    pub(crate) fn apply<T: FromRow>(
        &self,
        target: &mut T,
        values: &[crate::Value],
    ) -> crate::XdbResult<()> {
        for (path, value) in self.paths.iter().zip(values) {
            let Some(path) = path else { continue };
            let field = target.field_mut(path).ok_or_else(|| {
                crate::XdbError::shape(format!(
                    "{} has no field at {:?}",
                    std::any::type_name::<T>(),
                    path
                ))
            })?;
            field.decode_raw(value.raw());
        }
        Ok(())
    }
}

/// An element of a `reflect_rows` destination vector.
///
/// Plain structs are written in place (`#[derive(FromRow)]` implements this for the
/// struct itself); `Box`ed and `Option`al elements are allocated when empty.
pub trait RowSlot {
    type Target: FromRow;

    fn new_slot() -> Self;
    fn target(&mut self) -> &mut Self::Target;
}

impl<T: FromRow> RowSlot for Box<T> {
    type Target = T;

    fn new_slot() -> Self {
        Box::default()
    }

    fn target(&mut self) -> &mut T {
        self
    }
}

impl<T: FromRow> RowSlot for Option<T> {
    type Target = T;

    fn new_slot() -> Self {
        None
    }

    fn target(&mut self) -> &mut T {
        self.get_or_insert_with(T::default)
    }
}

// ===== ArgSource impls =====

impl<T: ArgSource + ?Sized> ArgSource for &T {
    fn positional(&self) -> Option<Vec<Arg>> {
        (**self).positional()
    }

    fn lookup(&self, token: &str) -> Option<Arg> {
        (**self).lookup(token)
    }
}

impl ArgSource for [Arg] {
    fn positional(&self) -> Option<Vec<Arg>> {
        Some(self.to_vec())
    }

    fn lookup(&self, _token: &str) -> Option<Arg> {
        None
    }
}

impl ArgSource for Vec<Arg> {
    fn positional(&self) -> Option<Vec<Arg>> {
        Some(self.clone())
    }

    fn lookup(&self, _token: &str) -> Option<Arg> {
        None
    }
}

impl<const N: usize> ArgSource for [Arg; N] {
    fn positional(&self) -> Option<Vec<Arg>> {
        Some(self.to_vec())
    }

    fn lookup(&self, _token: &str) -> Option<Arg> {
        None
    }
}

impl<K, V, S> ArgSource for HashMap<K, V, S>
where
    K: std::borrow::Borrow<str> + std::hash::Hash + Eq,
    V: ToArg,
    S: std::hash::BuildHasher,
{
    fn lookup(&self, token: &str) -> Option<Arg> {
        self.get(token).map(ToArg::to_arg)
    }
}

impl<K, V> ArgSource for BTreeMap<K, V>
where
    K: std::borrow::Borrow<str> + Ord,
    V: ToArg,
{
    fn lookup(&self, token: &str) -> Option<Arg> {
        self.get(token).map(ToArg::to_arg)
    }
}

impl ArgSource for serde_json::Map<String, serde_json::Value> {
    fn lookup(&self, token: &str) -> Option<Arg> {
        self.get(token).map(json_arg)
    }
}

impl ArgSource for serde_json::Value {
    fn positional(&self) -> Option<Vec<Arg>> {
        match self {
            serde_json::Value::Array(items) => Some(items.iter().map(json_arg).collect()),
            _ => None,
        }
    }

    fn lookup(&self, token: &str) -> Option<Arg> {
        match self {
            serde_json::Value::Object(map) => map.lookup(token),
            _ => None,
        }
    }
}

/// Arguments drawn from any `serde::Serialize` value through its JSON form.
///
/// Fields and map keys are looked up by their serialized name, exactly; a value that
/// serializes to a sequence is used positionally.
///
/// ```ignore
/// q.reflect_args(&Serialized::new(&filter)?);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Serialized(serde_json::Value);

impl Serialized {
    pub fn new<T: serde::Serialize + ?Sized>(value: &T) -> XdbResult<Self> {
        serde_json::to_value(value)
            .map(Self)
            .map_err(|e| XdbError::Serialization(e.to_string()))
    }
}

impl ArgSource for Serialized {
    fn positional(&self) -> Option<Vec<Arg>> {
        self.0.positional()
    }

    fn lookup(&self, token: &str) -> Option<Arg> {
        self.0.lookup(token)
    }
}

/// Scalars bind as their natural type; arrays and objects bind as JSON.
fn json_arg(value: &serde_json::Value) -> Arg {
    use serde_json::Value as J;
    match value {
        J::Null => Arg::Null,
        J::Bool(b) => Arg::Bool(*b),
        J::Number(n) => {
            if let Some(i) = n.as_i64() {
                Arg::Int(i)
            } else if let Some(u) = n.as_u64() {
                Arg::UInt(u)
            } else {
                Arg::Float(n.as_f64().unwrap_or_default())
            }
        }
        J::String(s) => Arg::Text(s.clone()),
        J::Array(_) | J::Object(_) => Arg::Json(value.clone()),
    }
}
