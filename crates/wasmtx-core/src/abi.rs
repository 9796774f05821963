//! ABI definitions and binary action decoding
//!
//! A contract ABI is stored as a JSON document describing type aliases,
//! structs and the struct type of each action. Decoding walks the action's
//! struct against the little-endian payload and produces a
//! `serde_json::Value` with one field per struct member.
//!
//! Decoding is strict: an unknown action or type, a truncated payload,
//! trailing bytes or nesting beyond the depth limit are all errors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codec::Reader;
use crate::name::Name;
use crate::{Error, Result};

/// Default bound on struct/array nesting while decoding
pub const DEFAULT_MAX_DEPTH: usize = 32;

const MAX_ALIAS_CHAIN: usize = 32;

/// Top-level ABI document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbiDef {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub types: Vec<TypeDef>,
    #[serde(default)]
    pub structs: Vec<StructDef>,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
}

/// Type alias: `new_type_name` stands for `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    pub new_type_name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDef {
    pub name: String,
    #[serde(default)]
    pub base: String,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Maps an action name to the struct type of its payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    pub name: Name,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub ricardian_contract: String,
}

/// Decode `data` as the arguments of `action` using the ABI blob `abi`.
pub fn unpack(abi: &[u8], action: Name, data: &[u8], max_depth: usize) -> Result<Value> {
    AbiSerializer::from_slice(abi, max_depth)?.unpack_action(action, data)
}

// ── Serializer ────────────────────────────────────────────

/// Decoder bound to one parsed ABI
pub struct AbiSerializer {
    def: AbiDef,
    max_depth: usize,
}

impl AbiSerializer {
    pub fn new(def: AbiDef, max_depth: usize) -> Self {
        AbiSerializer { def, max_depth }
    }

    /// Parse an ABI blob (JSON text)
    pub fn from_slice(abi: &[u8], max_depth: usize) -> Result<Self> {
        let def: AbiDef = serde_json::from_slice(abi)
            .map_err(|e| Error::AbiDecode(format!("invalid abi document: {}", e)))?;
        Ok(Self::new(def, max_depth))
    }

    /// Struct type carried by an action, if the ABI declares it
    pub fn action_type(&self, action: Name) -> Option<&str> {
        self.def
            .actions
            .iter()
            .find(|a| a.name == action)
            .map(|a| a.type_name.as_str())
    }

    /// Decode a full action payload. Every byte must be consumed.
    pub fn unpack_action(&self, action: Name, data: &[u8]) -> Result<Value> {
        let type_name = self.action_type(action).ok_or_else(|| {
            Error::AbiDecode(format!("action '{}' is not declared in the abi", action))
        })?;
        let mut reader = Reader::new(data);
        let value = self.read_value(type_name, &mut reader, 0)?;
        if !reader.is_at_end() {
            return Err(Error::AbiDecode(format!(
                "{} trailing bytes after action '{}'",
                reader.remaining(),
                action
            )));
        }
        Ok(value)
    }

    fn resolve_type<'s>(&'s self, mut type_name: &'s str) -> Result<&'s str> {
        for _ in 0..MAX_ALIAS_CHAIN {
            match self.def.types.iter().find(|t| t.new_type_name == type_name) {
                Some(alias) => type_name = &alias.type_name,
                None => return Ok(type_name),
            }
        }
        Err(Error::AbiDecode(format!("type alias chain too long at '{}'", type_name)))
    }

    fn find_struct(&self, name: &str) -> Option<&StructDef> {
        self.def.structs.iter().find(|s| s.name == name)
    }

    fn read_value(&self, type_name: &str, reader: &mut Reader<'_>, depth: usize) -> Result<Value> {
        if depth > self.max_depth {
            return Err(Error::AbiDecode(format!(
                "nesting deeper than {} while decoding '{}'",
                self.max_depth, type_name
            )));
        }
        let type_name = self.resolve_type(type_name)?;

        if let Some(element) = type_name.strip_suffix("[]") {
            let count = reader.read_varuint32()? as usize;
            // every element occupies at least one byte
            if count > reader.remaining() {
                return Err(Error::AbiDecode(format!(
                    "array of {} '{}' exceeds remaining {} bytes",
                    count,
                    element,
                    reader.remaining()
                )));
            }
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(self.read_value(element, reader, depth + 1)?);
            }
            return Ok(Value::Array(items));
        }

        if let Some(inner) = type_name.strip_suffix('?') {
            return match reader.read_u8()? {
                0 => Ok(Value::Null),
                1 => self.read_value(inner, reader, depth + 1),
                flag => Err(Error::AbiDecode(format!("invalid optional flag {}", flag))),
            };
        }

        if let Some(value) = read_builtin(type_name, reader)? {
            return Ok(value);
        }

        let def = self
            .find_struct(type_name)
            .ok_or_else(|| Error::AbiDecode(format!("unknown type '{}'", type_name)))?;
        let mut object = Map::new();
        self.read_struct(def, reader, depth, &mut object)?;
        Ok(Value::Object(object))
    }

    fn read_struct(
        &self,
        def: &StructDef,
        reader: &mut Reader<'_>,
        depth: usize,
        object: &mut Map<String, Value>,
    ) -> Result<()> {
        if depth > self.max_depth {
            return Err(Error::AbiDecode(format!(
                "struct base chain deeper than {} at '{}'",
                self.max_depth, def.name
            )));
        }
        if !def.base.is_empty() {
            let base_name = self.resolve_type(&def.base)?;
            let base = self.find_struct(base_name).ok_or_else(|| {
                Error::AbiDecode(format!("unknown base '{}' of '{}'", def.base, def.name))
            })?;
            self.read_struct(base, reader, depth + 1, object)?;
        }
        for field in &def.fields {
            let value = self.read_value(&field.type_name, reader, depth + 1)?;
            object.insert(field.name.clone(), value);
        }
        Ok(())
    }
}

// ── Built-in types ────────────────────────────────────────

fn read_builtin(type_name: &str, reader: &mut Reader<'_>) -> Result<Option<Value>> {
    let value = match type_name {
        "bool" => match reader.read_u8()? {
            0 => Value::Bool(false),
            1 => Value::Bool(true),
            other => return Err(Error::AbiDecode(format!("invalid bool byte {}", other))),
        },
        "int8" => Value::from(reader.read_i8()?),
        "uint8" => Value::from(reader.read_u8()?),
        "int16" => Value::from(reader.read_i16()?),
        "uint16" => Value::from(reader.read_u16()?),
        "int32" => Value::from(reader.read_i32()?),
        "uint32" => Value::from(reader.read_u32()?),
        "int64" => Value::from(reader.read_i64()?),
        "uint64" => Value::from(reader.read_u64()?),
        "varuint32" => Value::from(reader.read_varuint32()?),
        "name" => Value::String(Name(reader.read_u64()?).to_string()),
        "string" => Value::String(reader.read_string()?),
        "bytes" => Value::String(hex::encode(reader.read_blob()?)),
        "checksum256" => Value::String(hex::encode(reader.read_bytes(32)?)),
        "symbol" => {
            let raw = reader.read_u64()?;
            Value::String(format!("{},{}", raw & 0xff, symbol_code(raw >> 8)?))
        }
        "symbol_code" => Value::String(symbol_code(reader.read_u64()?)?),
        "asset" => {
            let amount = reader.read_i64()?;
            let symbol = reader.read_u64()?;
            let precision = (symbol & 0xff) as u8;
            Value::String(format_asset(amount, precision, &symbol_code(symbol >> 8)?)?)
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

/// Uppercase ticker packed little-endian into the low bytes of `raw`
fn symbol_code(mut raw: u64) -> Result<String> {
    let mut code = String::new();
    while raw != 0 {
        let c = (raw & 0xff) as u8;
        if !c.is_ascii_uppercase() {
            return Err(Error::AbiDecode(format!("invalid symbol character {:#x}", c)));
        }
        code.push(c as char);
        raw >>= 8;
    }
    if code.is_empty() {
        return Err(Error::AbiDecode("empty symbol code".into()));
    }
    Ok(code)
}

fn format_asset(amount: i64, precision: u8, code: &str) -> Result<String> {
    if precision > 18 {
        return Err(Error::AbiDecode(format!("asset precision {} too large", precision)));
    }
    let sign = if amount < 0 { "-" } else { "" };
    let digits = amount.unsigned_abs().to_string();
    let precision = precision as usize;
    if precision == 0 {
        return Ok(format!("{}{} {}", sign, digits, code));
    }
    let padded = format!("{:0>width$}", digits, width = precision + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - precision);
    Ok(format!("{}{}.{} {}", sign, int_part, frac_part, code))
}
