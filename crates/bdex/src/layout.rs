//! Record layouts for the CLI.
//!
//! A layout is a comma-separated list of fields, each `[name:]kind[count]`:
//! `ver:ver,id:u40,name:str,samples:f32[4]`. Arrays carry no count on the
//! wire, so the count lives in the layout.

use std::fmt;
use std::str::FromStr;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    /// Signed integer, width in bytes.
    Int(u8),
    /// Unsigned integer, width in bytes.
    Uint(u8),
    F32,
    F64,
    Length,
    Version,
    Str,
    Bytes,
}

impl Kind {
    pub fn is_numeric(self) -> bool {
        matches!(self, Kind::Int(_) | Kind::Uint(_) | Kind::F32 | Kind::F64)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Int(width) => write!(f, "i{}", u32::from(*width) * 8),
            Kind::Uint(width) => write!(f, "u{}", u32::from(*width) * 8),
            Kind::F32 => f.write_str("f32"),
            Kind::F64 => f.write_str("f64"),
            Kind::Length => f.write_str("len"),
            Kind::Version => f.write_str("ver"),
            Kind::Str => f.write_str("str"),
            Kind::Bytes => f.write_str("bytes"),
        }
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "f32" => return Ok(Kind::F32),
            "f64" => return Ok(Kind::F64),
            "len" => return Ok(Kind::Length),
            "ver" => return Ok(Kind::Version),
            "str" => return Ok(Kind::Str),
            "bytes" => return Ok(Kind::Bytes),
            _ => {}
        }

        let (signed, bits) = if let Some(bits) = s.strip_prefix('i') {
            (true, bits)
        } else if let Some(bits) = s.strip_prefix('u') {
            (false, bits)
        } else {
            return Err(format!("unknown field kind: {s}"));
        };

        let bits: u32 = bits
            .parse()
            .map_err(|_| format!("unknown field kind: {s}"))?;
        if bits == 0 || bits > 64 || bits % 8 != 0 {
            return Err(format!(
                "unsupported integer width {bits} (expected 8, 16, ..., 64)"
            ));
        }

        let width = (bits / 8) as u8;
        Ok(if signed {
            Kind::Int(width)
        } else {
            Kind::Uint(width)
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub kind: Kind,
    /// Element count for arrays; `None` for a scalar.
    pub count: Option<usize>,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.count {
            Some(count) => write!(f, "{}[{count}]", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub fields: Vec<Field>,
}

impl Layout {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = Vec::new();
        for (index, spec) in s.split(',').enumerate() {
            let spec = spec.trim();
            if spec.is_empty() {
                return Err(format!("empty field at position {index}"));
            }
            fields.push(parse_field(index, spec)?);
        }
        Ok(Self { fields })
    }
}

fn parse_field(index: usize, spec: &str) -> Result<Field, String> {
    let (name, rest) = match spec.split_once(':') {
        Some((name, rest)) if !name.trim().is_empty() => (name.trim().to_string(), rest.trim()),
        Some(_) => return Err(format!("empty field name in '{spec}'")),
        None => (format!("field{index}"), spec),
    };

    let (kind, count) = match rest.split_once('[') {
        Some((kind, count)) => {
            let count = count
                .strip_suffix(']')
                .ok_or_else(|| format!("unterminated array count in '{spec}'"))?;
            let count: usize = count
                .trim()
                .parse()
                .map_err(|_| format!("invalid array count in '{spec}'"))?;
            (kind.trim(), Some(count))
        }
        None => (rest, None),
    };

    let kind: Kind = kind.parse()?;
    if count.is_some() && !kind.is_numeric() {
        return Err(format!("{kind} fields cannot be arrays"));
    }

    Ok(Field { name, kind, count })
}
