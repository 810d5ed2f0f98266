//! Encoding and decoding whole records against a [`Layout`].

use std::fmt;

use bdex_codec::{ByteSink, ByteSource, Decoder, Encoder, MAX_LENGTH};
use serde::{Serialize, Serializer};

use crate::exit::{CliError, CliResult, DATA_INVALID};
use crate::layout::{Field, Kind, Layout};

/// A decoded field value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Uint(u64),
    Float(f64),
    Text(String),
    Bytes(#[serde(serialize_with = "serialize_hex")] Vec<u8>),
    List(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Uint(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v:?}"),
            Value::Bytes(v) => write!(f, "0x{}", hex::encode(v)),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

#[allow(clippy::ptr_arg)]
fn serialize_hex<S: Serializer>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}

#[derive(Clone, Debug, Serialize)]
pub struct DecodedField {
    pub name: String,
    pub kind: String,
    pub value: Value,
}

/// Encode one value per layout field.
///
/// Values are checked against their declared width first, so the encoder is
/// only ever handed values that fit.
pub fn encode_record<S: ByteSink>(
    encoder: &mut Encoder<S>,
    layout: &Layout,
    values: &[String],
) -> CliResult<()> {
    if values.len() != layout.len() {
        return Err(CliError::usage(format!(
            "layout has {} fields but {} values were given",
            layout.len(),
            values.len()
        )));
    }

    for (field, text) in layout.fields.iter().zip(values) {
        match field.count {
            Some(count) => encode_array(encoder, field, count, text)?,
            None => encode_scalar(encoder, field, text)?,
        }
    }
    Ok(())
}

fn encode_scalar<S: ByteSink>(
    encoder: &mut Encoder<S>,
    field: &Field,
    text: &str,
) -> CliResult<()> {
    match field.kind {
        Kind::Int(width) => put_int(encoder, width, parse_int(field, width, text)?),
        Kind::Uint(width) => put_uint(encoder, width, parse_uint(field, width, text)?),
        Kind::F32 => {
            encoder.put_f32(parse_float(field, text)? as f32);
        }
        Kind::F64 => {
            encoder.put_f64(parse_float(field, text)?);
        }
        Kind::Length => {
            let len = parse_uint(field, 4, text)?;
            if len > MAX_LENGTH as u64 {
                return Err(invalid_value(field, text, "length exceeds 31 bits"));
            }
            encoder.put_length(len as usize);
        }
        Kind::Version => {
            let version = parse_uint(field, 1, text)?;
            encoder.put_version(version as u32);
        }
        Kind::Str => {
            encoder.put_string(text);
        }
        Kind::Bytes => {
            let bytes = hex::decode(text.trim_start_matches("0x"))
                .map_err(|err| invalid_value(field, text, &err.to_string()))?;
            encoder.put_byte_string(&bytes);
        }
    }
    Ok(())
}

fn encode_array<S: ByteSink>(
    encoder: &mut Encoder<S>,
    field: &Field,
    count: usize,
    text: &str,
) -> CliResult<()> {
    let items: Vec<&str> = if text.trim().is_empty() {
        Vec::new()
    } else {
        text.split(',').map(str::trim).collect()
    };
    if items.len() != count {
        return Err(invalid_value(
            field,
            text,
            &format!("expected {count} elements, got {}", items.len()),
        ));
    }

    match field.kind {
        Kind::Int(width) => {
            let values = items
                .iter()
                .map(|item| parse_int(field, width, item))
                .collect::<CliResult<Vec<_>>>()?;
            put_int_array(encoder, width, &values);
        }
        Kind::Uint(width) => {
            let values = items
                .iter()
                .map(|item| parse_uint(field, width, item))
                .collect::<CliResult<Vec<_>>>()?;
            put_uint_array(encoder, width, &values);
        }
        Kind::F32 => {
            let values = items
                .iter()
                .map(|item| parse_float(field, item).map(|v| v as f32))
                .collect::<CliResult<Vec<_>>>()?;
            encoder.put_f32_array(&values);
        }
        Kind::F64 => {
            let values = items
                .iter()
                .map(|item| parse_float(field, item))
                .collect::<CliResult<Vec<_>>>()?;
            encoder.put_f64_array(&values);
        }
        other => return Err(CliError::usage(format!("{other} fields cannot be arrays"))),
    }
    Ok(())
}

/// Decode every layout field, stopping at the first field that invalidates
/// the stream.
pub fn decode_record<S: ByteSource>(
    decoder: &mut Decoder<S>,
    layout: &Layout,
) -> CliResult<Vec<DecodedField>> {
    let mut fields = Vec::with_capacity(layout.len());
    for field in &layout.fields {
        let value = match field.count {
            Some(count) => decode_array(decoder, field.kind, count),
            None => decode_scalar(decoder, field.kind),
        };
        if let Some(cause) = decoder.failure() {
            return Err(CliError::new(
                DATA_INVALID,
                format!("decode failed at field '{}' ({field}): {cause}", field.name),
            ));
        }
        fields.push(DecodedField {
            name: field.name.clone(),
            kind: field.to_string(),
            value,
        });
    }
    Ok(fields)
}

/// Elements decoded per array read.
const ARRAY_BATCH: usize = 4096;

fn decode_scalar<S: ByteSource>(decoder: &mut Decoder<S>, kind: Kind) -> Value {
    match kind {
        Kind::Int(width) => Value::Int(get_int(decoder, width)),
        Kind::Uint(width) => Value::Uint(get_uint(decoder, width)),
        Kind::F32 => {
            let mut value = 0f64;
            decoder.get_f32(&mut value);
            Value::Float(value)
        }
        Kind::F64 => {
            let mut value = 0f64;
            decoder.get_f64(&mut value);
            Value::Float(value)
        }
        Kind::Length => {
            let mut len = 0usize;
            decoder.get_length(&mut len);
            Value::Uint(len as u64)
        }
        Kind::Version => {
            let mut version = 0u64;
            decoder.get_version(&mut version);
            Value::Uint(version)
        }
        Kind::Str => {
            let mut text = String::new();
            decoder.get_string(&mut text);
            Value::Text(text)
        }
        Kind::Bytes => {
            let mut bytes = Vec::new();
            decoder.get_byte_string(&mut bytes);
            Value::Bytes(bytes)
        }
    }
}

fn decode_array<S: ByteSource>(decoder: &mut Decoder<S>, kind: Kind, count: usize) -> Value {
    let items = match kind {
        Kind::Int(width) => get_int_array(decoder, width, count)
            .into_iter()
            .map(Value::Int)
            .collect(),
        Kind::Uint(width) => get_uint_array(decoder, width, count)
            .into_iter()
            .map(Value::Uint)
            .collect(),
        Kind::F32 => read_batched(decoder, count, |decoder, out: &mut [f64], n| {
            decoder.get_f32_array(out, n);
        })
        .into_iter()
        .map(Value::Float)
        .collect(),
        Kind::F64 => read_batched(decoder, count, |decoder, out: &mut [f64], n| {
            decoder.get_f64_array(out, n);
        })
        .into_iter()
        .map(Value::Float)
        .collect(),
        // The layout parser only admits numeric arrays.
        _ => Vec::new(),
    };
    Value::List(items)
}

fn put_int<S: ByteSink>(encoder: &mut Encoder<S>, width: u8, value: i64) {
    match width {
        1 => encoder.put_i8(value as i8),
        2 => encoder.put_i16(value as i16),
        3 => encoder.put_i24(value as i32),
        4 => encoder.put_i32(value as i32),
        5 => encoder.put_i40(value),
        6 => encoder.put_i48(value),
        7 => encoder.put_i56(value),
        _ => encoder.put_i64(value),
    };
}

fn put_uint<S: ByteSink>(encoder: &mut Encoder<S>, width: u8, value: u64) {
    match width {
        1 => encoder.put_u8(value as u8),
        2 => encoder.put_u16(value as u16),
        3 => encoder.put_u24(value as u32),
        4 => encoder.put_u32(value as u32),
        5 => encoder.put_u40(value),
        6 => encoder.put_u48(value),
        7 => encoder.put_u56(value),
        _ => encoder.put_u64(value),
    };
}

fn put_int_array<S: ByteSink>(encoder: &mut Encoder<S>, width: u8, values: &[i64]) {
    fn narrow<T>(values: &[i64], cast: impl Fn(i64) -> T) -> Vec<T> {
        values.iter().map(|&v| cast(v)).collect()
    }

    match width {
        1 => encoder.put_i8_array(&narrow(values, |v| v as i8)),
        2 => encoder.put_i16_array(&narrow(values, |v| v as i16)),
        3 => encoder.put_i24_array(&narrow(values, |v| v as i32)),
        4 => encoder.put_i32_array(&narrow(values, |v| v as i32)),
        5 => encoder.put_i40_array(values),
        6 => encoder.put_i48_array(values),
        7 => encoder.put_i56_array(values),
        _ => encoder.put_i64_array(values),
    };
}

fn put_uint_array<S: ByteSink>(encoder: &mut Encoder<S>, width: u8, values: &[u64]) {
    fn narrow<T>(values: &[u64], cast: impl Fn(u64) -> T) -> Vec<T> {
        values.iter().map(|&v| cast(v)).collect()
    }

    match width {
        1 => encoder.put_u8_array(&narrow(values, |v| v as u8)),
        2 => encoder.put_u16_array(&narrow(values, |v| v as u16)),
        3 => encoder.put_u24_array(&narrow(values, |v| v as u32)),
        4 => encoder.put_u32_array(&narrow(values, |v| v as u32)),
        5 => encoder.put_u40_array(values),
        6 => encoder.put_u48_array(values),
        7 => encoder.put_u56_array(values),
        _ => encoder.put_u64_array(values),
    };
}

fn get_int<S: ByteSource>(decoder: &mut Decoder<S>, width: u8) -> i64 {
    let mut value = 0i64;
    match width {
        1 => decoder.get_i8(&mut value),
        2 => decoder.get_i16(&mut value),
        3 => decoder.get_i24(&mut value),
        4 => decoder.get_i32(&mut value),
        5 => decoder.get_i40(&mut value),
        6 => decoder.get_i48(&mut value),
        7 => decoder.get_i56(&mut value),
        _ => decoder.get_i64(&mut value),
    };
    value
}

fn get_uint<S: ByteSource>(decoder: &mut Decoder<S>, width: u8) -> u64 {
    let mut value = 0u64;
    match width {
        1 => decoder.get_u8(&mut value),
        2 => decoder.get_u16(&mut value),
        3 => decoder.get_u24(&mut value),
        4 => decoder.get_u32(&mut value),
        5 => decoder.get_u40(&mut value),
        6 => decoder.get_u48(&mut value),
        7 => decoder.get_u56(&mut value),
        _ => decoder.get_u64(&mut value),
    };
    value
}

fn get_int_array<S: ByteSource>(decoder: &mut Decoder<S>, width: u8, count: usize) -> Vec<i64> {
    read_batched(decoder, count, |decoder, out: &mut [i64], n| {
        match width {
            1 => decoder.get_i8_array(out, n),
            2 => decoder.get_i16_array(out, n),
            3 => decoder.get_i24_array(out, n),
            4 => decoder.get_i32_array(out, n),
            5 => decoder.get_i40_array(out, n),
            6 => decoder.get_i48_array(out, n),
            7 => decoder.get_i56_array(out, n),
            _ => decoder.get_i64_array(out, n),
        };
    })
}

fn get_uint_array<S: ByteSource>(decoder: &mut Decoder<S>, width: u8, count: usize) -> Vec<u64> {
    read_batched(decoder, count, |decoder, out: &mut [u64], n| {
        match width {
            1 => decoder.get_u8_array(out, n),
            2 => decoder.get_u16_array(out, n),
            3 => decoder.get_u24_array(out, n),
            4 => decoder.get_u32_array(out, n),
            5 => decoder.get_u40_array(out, n),
            6 => decoder.get_u48_array(out, n),
            7 => decoder.get_u56_array(out, n),
            _ => decoder.get_u64_array(out, n),
        };
    })
}

/// Read `count` elements at most [`ARRAY_BATCH`] at a time.
///
/// The count comes from the layout, not the input, so buffers grow only as
/// bytes actually arrive. Stops at the first batch that invalidates the
/// decoder.
fn read_batched<S, T>(
    decoder: &mut Decoder<S>,
    count: usize,
    mut read: impl FnMut(&mut Decoder<S>, &mut [T], usize),
) -> Vec<T>
where
    S: ByteSource,
    T: Copy + Default,
{
    let mut items = Vec::with_capacity(count.min(ARRAY_BATCH));
    let mut batch = vec![T::default(); count.min(ARRAY_BATCH)];
    let mut left = count;
    while left > 0 {
        let n = left.min(ARRAY_BATCH);
        read(&mut *decoder, &mut batch[..], n);
        if !decoder.is_valid() {
            break;
        }
        items.extend_from_slice(&batch[..n]);
        left -= n;
    }
    items
}

fn parse_int(field: &Field, width: u8, text: &str) -> CliResult<i64> {
    let value: i64 = text
        .trim()
        .parse()
        .map_err(|_| invalid_value(field, text, "not a signed integer"))?;
    let bits = u32::from(width) * 8;
    if bits < 64 {
        let min = -(1i64 << (bits - 1));
        let max = (1i64 << (bits - 1)) - 1;
        if !(min..=max).contains(&value) {
            return Err(invalid_value(
                field,
                text,
                &format!("out of range for {bits}-bit signed ({min}..={max})"),
            ));
        }
    }
    Ok(value)
}

fn parse_uint(field: &Field, width: u8, text: &str) -> CliResult<u64> {
    let text_trimmed = text.trim();
    let parsed = match text_trimmed.strip_prefix("0x") {
        Some(digits) => u64::from_str_radix(digits, 16),
        None => text_trimmed.parse(),
    };
    let value = parsed.map_err(|_| invalid_value(field, text, "not an unsigned integer"))?;
    let bits = u32::from(width) * 8;
    if bits < 64 && value >> bits != 0 {
        return Err(invalid_value(
            field,
            text,
            &format!("out of range for {bits}-bit unsigned"),
        ));
    }
    Ok(value)
}

fn parse_float(field: &Field, text: &str) -> CliResult<f64> {
    text.trim()
        .parse()
        .map_err(|_| invalid_value(field, text, "not a number"))
}

fn invalid_value(field: &Field, text: &str, reason: &str) -> CliError {
    CliError::usage(format!(
        "invalid value '{text}' for field '{}' ({field}): {reason}",
        field.name
    ))
}
