#![cfg(feature = "cli")]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

fn bdex(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bdex"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .output()
        .expect("bdex should run")
}

fn bdex_with_stdin(args: &[&str], input: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_bdex"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("bdex should start");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(input)
        .expect("stdin should accept input");
    child.wait_with_output().expect("bdex should finish")
}

fn unique_temp_file(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "bdex-{tag}-{}-{}.bin",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ))
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout should be UTF-8")
}

#[test]
fn encode_prints_network_order_hex() {
    let output = bdex(&[
        "encode",
        "--layout",
        "ver,u40,str,i16[2]",
        "3",
        "4294967296",
        "hi",
        "-1,2",
    ]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_text(&output).trim(), "030100000000026869ffff0002");
}

#[test]
fn encode_uses_long_length_above_127() {
    let output = bdex(&["encode", "--layout", "len", "128"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_text(&output).trim(), "80000080");
}

#[test]
fn decode_prints_json_record() {
    let output = bdex(&[
        "--format",
        "json",
        "decode",
        "--layout",
        "ver:ver,name:str,delta:i8",
        "--hex",
        "03026869ff",
    ]);

    assert_eq!(output.status.code(), Some(0));
    let json: serde_json::Value =
        serde_json::from_str(stdout_text(&output).trim()).expect("output should be JSON");
    assert_eq!(json["bytes_read"], 5);
    assert_eq!(json["fields"][0]["name"], "ver");
    assert_eq!(json["fields"][0]["value"], 3);
    assert_eq!(json["fields"][1]["value"], "hi");
    assert_eq!(json["fields"][2]["kind"], "i8");
    assert_eq!(json["fields"][2]["value"], -1);
}

#[test]
fn decode_reads_stdin() {
    let output = bdex_with_stdin(
        &["--format", "json", "decode", "--layout", "u16[2]"],
        &[0x00, 0x01, 0xFF, 0xFF],
    );

    assert_eq!(output.status.code(), Some(0));
    let json: serde_json::Value =
        serde_json::from_str(stdout_text(&output).trim()).expect("output should be JSON");
    assert_eq!(json["fields"][0]["value"], serde_json::json!([1, 65535]));
}

#[test]
fn encode_to_file_then_decode_file() {
    let path = unique_temp_file("roundtrip");
    let path_arg = path.to_str().expect("temp path should be UTF-8");

    let encoded = bdex(&[
        "encode",
        "--layout",
        "i24,f64",
        "--out",
        path_arg,
        "-8388608",
        "0.5",
    ]);
    assert_eq!(encoded.status.code(), Some(0));
    assert_eq!(
        std::fs::read(&path).expect("output file should exist"),
        vec![0x80, 0x00, 0x00, 0x3F, 0xE0, 0, 0, 0, 0, 0, 0]
    );

    let decoded = bdex(&[
        "--format",
        "json",
        "decode",
        "--layout",
        "i24,f64",
        "--file",
        path_arg,
    ]);
    let _ = std::fs::remove_file(&path);

    assert_eq!(decoded.status.code(), Some(0));
    let json: serde_json::Value =
        serde_json::from_str(stdout_text(&decoded).trim()).expect("output should be JSON");
    assert_eq!(json["fields"][0]["value"], -8_388_608);
    assert_eq!(json["fields"][1]["value"], 0.5);
}

#[test]
fn truncated_input_exits_data_invalid() {
    let output = bdex(&["decode", "--layout", "u32", "--hex", "0102"]);

    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("decode failed at field 'field0'"));
}

#[test]
fn trailing_bytes_are_rejected_unless_allowed() {
    let rejected = bdex(&["decode", "--layout", "u8", "--hex", "0102"]);
    assert_eq!(rejected.status.code(), Some(60));

    let allowed = bdex(&[
        "--format",
        "json",
        "decode",
        "--layout",
        "u8",
        "--hex",
        "0102",
        "--allow-trailing",
    ]);
    assert_eq!(allowed.status.code(), Some(0));
}

#[test]
fn oversized_string_exits_data_invalid() {
    let output = bdex(&[
        "decode",
        "--layout",
        "str",
        "--hex",
        "03616263",
        "--max-string-len",
        "2",
    ]);

    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn bad_layout_exits_usage() {
    let output = bdex(&["encode", "--layout", "i12", "1"]);

    assert_eq!(output.status.code(), Some(64));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid --layout"));
}

#[test]
fn out_of_range_value_exits_usage() {
    let output = bdex(&["encode", "--layout", "i8", "200"]);

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn huge_array_count_exits_data_invalid() {
    let output = bdex(&["decode", "--layout", "u8[4000000000000]", "--hex", "00"]);

    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn huge_array_count_over_stdin_exits_data_invalid() {
    let output = bdex_with_stdin(&["decode", "--layout", "u64[4000000000000]"], &[0; 12]);

    assert_eq!(output.status.code(), Some(60));
}
