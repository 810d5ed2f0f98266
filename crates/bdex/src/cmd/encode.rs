use std::fs::File;
use std::io::BufWriter;

use bdex_codec::Encoder;
use bdex_transport::{ByteSink, IoSink};
use tracing::{debug, info};

use crate::cmd::{parse_layout, EncodeArgs};
use crate::exit::{codec_error, io_error, CliResult, SUCCESS};
use crate::output::print_raw;
use crate::record::encode_record;

pub fn run(args: EncodeArgs) -> CliResult<i32> {
    let layout = parse_layout(&args.layout)?;
    debug!(fields = layout.len(), "encoding record");

    // Encode into memory first so a bad value never leaves a partial file.
    let mut encoder = Encoder::new(Vec::new());
    encode_record(&mut encoder, &layout, &args.values)?;
    let bytes = encoder
        .finish()
        .map_err(|err| codec_error("encode failed", err))?;

    if let Some(path) = &args.out {
        let file = File::create(path)
            .map_err(|err| io_error(&format!("failed creating {}", path.display()), err))?;
        let mut sink = IoSink::new(BufWriter::new(file));
        sink.put_bytes(&bytes)
            .and_then(|()| sink.flush())
            .map_err(|err| {
                codec_error(
                    &format!("failed writing {}", path.display()),
                    err.into(),
                )
            })?;
        info!(path = %path.display(), bytes = bytes.len(), "record written");
        return Ok(SUCCESS);
    }

    let written = if args.raw {
        print_raw(&bytes)
    } else {
        print_raw(format!("{}\n", hex::encode(&bytes)).as_bytes())
    };
    written.map_err(|err| io_error("failed writing stdout", err))?;
    debug!(bytes = bytes.len(), "record encoded");
    Ok(SUCCESS)
}
