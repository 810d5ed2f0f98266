use std::io::{self, IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use crate::record::DecodedField;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct RecordOutput<'a> {
    schema_id: &'a str,
    bytes_read: usize,
    fields: &'a [DecodedField],
}

pub fn print_record(fields: &[DecodedField], bytes_read: usize, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = RecordOutput {
                schema_id: "https://schemas.3leaps.dev/bdex/cli/v1/decoded-record.schema.json",
                bytes_read,
                fields,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "KIND", "VALUE"]);
            for field in fields {
                table.add_row(vec![
                    field.name.clone(),
                    field.kind.clone(),
                    field.value.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for field in fields {
                println!("{} ({}) = {}", field.name, field.kind, field.value);
            }
        }
    }
}

/// Write encoder output to stdout. Unlike the record printers, failures
/// are returned: the bytes are the whole result.
pub fn print_raw(data: &[u8]) -> io::Result<()> {
    write_raw(&mut std::io::stdout().lock(), data)
}

fn write_raw<W: Write>(out: &mut W, data: &[u8]) -> io::Result<()> {
    out.write_all(data)?;
    out.flush()
}
