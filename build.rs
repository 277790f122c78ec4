use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const ENV_PREFIX: &str = "WORKLOG_";
const COMPILE_TIME_MACRO: &str = "env!(";

fn collect_rs_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out)?;
        } else if path.extension().and_then(|ext| ext.to_str()) == Some("rs") {
            out.push(path);
        }
    }
    Ok(())
}

/// A literal names a runtime key only when it is the whole key, e.g.
/// `"WORKLOG_MODEL"`. Messages that mention a key do not count.
fn is_env_key(literal: &str) -> bool {
    literal.strip_prefix(ENV_PREFIX).is_some_and(|rest| {
        !rest.is_empty()
            && !rest.starts_with('_')
            && !rest.ends_with('_')
            && rest
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
    })
}

/// End of a plain string literal opened at `start`, past the closing quote.
fn skip_string(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// End of a raw string `r"..."` or `r#"..."#` whose `r` sits at `start`.
fn skip_raw_string(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    let mut hashes = 0usize;
    while bytes.get(i) == Some(&b'#') {
        hashes += 1;
        i += 1;
    }
    if bytes.get(i) != Some(&b'"') {
        return None;
    }
    i += 1;
    while i < bytes.len() {
        if bytes[i] == b'"' && bytes[i + 1..].iter().take(hashes).filter(|b| **b == b'#').count() == hashes {
            return Some(i + 1 + hashes);
        }
        i += 1;
    }
    Some(bytes.len())
}

fn collect_env_keys(source: &str, out: &mut BTreeSet<String>) {
    let bytes = source.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'\'' if bytes.get(i + 1) == Some(&b'\\') => {
                i += 3;
                while i < bytes.len() && bytes[i] != b'\'' {
                    i += 1;
                }
                i += 1;
            }
            b'\'' if bytes.get(i + 2) == Some(&b'\'') => i += 3,
            b'r' if i == 0 || !(bytes[i - 1].is_ascii_alphanumeric() || bytes[i - 1] == b'_') => {
                i = skip_raw_string(bytes, i).unwrap_or(i + 1);
            }
            b'"' => {
                let end = skip_string(bytes, i);
                let literal = source.get(i + 1..end.saturating_sub(1)).unwrap_or("");
                let compile_time = source[..i].trim_end().ends_with(COMPILE_TIME_MACRO);
                if !compile_time && is_env_key(literal) {
                    out.insert(literal.to_string());
                }
                i = end;
            }
            _ => i += 1,
        }
    }
}

fn write_generated_allowlist() -> std::io::Result<()> {
    let mut rs_files = Vec::new();
    collect_rs_files(Path::new("src"), &mut rs_files)?;

    let mut keys = BTreeSet::new();
    for file in rs_files {
        let content = fs::read_to_string(&file)?;
        collect_env_keys(&content, &mut keys);
    }

    let out_dir = env::var("OUT_DIR").map_err(std::io::Error::other)?;
    let generated = Path::new(&out_dir).join("worklog_env_allowlist.rs");
    let mut f = fs::File::create(generated)?;
    writeln!(f, "pub const GENERATED_WORKLOG_ENV_ALLOWLIST: &[&str] = &[")?;
    for key in keys {
        writeln!(f, "    {key:?},")?;
    }
    writeln!(f, "];")?;
    Ok(())
}

fn main() {
    if let Err(err) = write_generated_allowlist() {
        panic!("failed to generate WORKLOG env allowlist: {err}");
    }

    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    println!("cargo:rustc-env=WORKLOG_BUILD_ID={:x}-{:x}", now.as_secs(), now.subsec_nanos());
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src");
}
