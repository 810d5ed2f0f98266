use std::fs::File;
use std::io::{BufReader, Read};

use bdex_codec::{Decoder, DecoderConfig, MAX_LENGTH};
use bdex_transport::{ByteSource, IoSource, SliceSource};
use tracing::{debug, warn};

use crate::cmd::{parse_layout, DecodeArgs};
use crate::exit::{io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::layout::Layout;
use crate::output::{print_record, OutputFormat};
use crate::record::{decode_record, DecodedField};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let layout = parse_layout(&args.layout)?;
    let config = DecoderConfig {
        max_string_len: args.max_string_len.unwrap_or(MAX_LENGTH),
    };

    let (fields, bytes_read) = if let Some(text) = &args.hex {
        let bytes = parse_hex(text)?;
        let mut decoder = Decoder::with_config(SliceSource::new(&bytes), config);
        decode_all(&mut decoder, &layout, args.allow_trailing)?
    } else if let Some(path) = &args.file {
        let file = File::open(path)
            .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
        decode_stream(BufReader::new(file), config, &layout, args.allow_trailing)?
    } else {
        decode_stream(
            std::io::stdin().lock(),
            config,
            &layout,
            args.allow_trailing,
        )?
    };

    print_record(&fields, bytes_read, format);
    Ok(SUCCESS)
}

fn parse_hex(text: &str) -> CliResult<Vec<u8>> {
    let text = text.trim();
    let text = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(text).map_err(|err| CliError::usage(format!("invalid --hex input: {err}")))
}

/// Decode from a reader, reporting read failures ahead of the truncation
/// they cause.
fn decode_stream<R: Read>(
    reader: R,
    config: DecoderConfig,
    layout: &Layout,
    allow_trailing: bool,
) -> CliResult<(Vec<DecodedField>, usize)> {
    let mut decoder = Decoder::with_config(IoSource::new(reader), config);
    let result = decode_all(&mut decoder, layout, allow_trailing);
    if let Some(err) = decoder.get_mut().take_error() {
        return Err(io_error("failed reading input", err));
    }
    result
}

fn decode_all<S: ByteSource>(
    decoder: &mut Decoder<S>,
    layout: &Layout,
    allow_trailing: bool,
) -> CliResult<(Vec<DecodedField>, usize)> {
    debug!(fields = layout.len(), "decoding record");
    let fields = decode_record(decoder, layout).inspect_err(|err| {
        warn!(bytes_read = decoder.bytes_read(), error = %err, "decode failed");
    })?;
    let bytes_read = decoder.bytes_read();

    if !allow_trailing {
        let mut probe = [0u8; 1];
        if decoder.get_mut().pull_bytes(&mut probe) > 0 {
            return Err(CliError::new(
                DATA_INVALID,
                format!("unexpected trailing bytes after {bytes_read} decoded bytes"),
            ));
        }
    }

    debug!(bytes_read, "record decoded");
    Ok((fields, bytes_read))
}
