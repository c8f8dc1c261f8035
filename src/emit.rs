use std::collections::HashSet;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("WriteFailed: {0}")]
    WriteFailed(String),
    #[error("ReadFailed: {0}")]
    ReadFailed(String),
    #[error("InvalidMeta: {0}")]
    Meta(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitPaths {
    pub txt_path: PathBuf,
    pub meta_path: PathBuf,
    pub text_sha256: String,
}

/// Write `<doc_id>.txt` and `<doc_id>.meta.json` into `outdir`.
///
/// `meta` must be a JSON object. It is written with two extra keys:
/// `text_sha256`, the digest [`verify_output`] checks later, and
/// `meta_fingerprint`, a digest of the meta itself minus its `timestamps`, so
/// two runs over the same input produce the same fingerprint. Each file is
/// written to a temporary sibling first and renamed into place.
pub fn emit_files(text: &str, meta: &Value, outdir: &Path, doc_id: &str) -> Result<EmitPaths, EmitError> {
    let Value::Object(fields) = meta else {
        return Err(EmitError::Meta("meta must be a JSON object".into()));
    };
    let mut fields = fields.clone();
    let text_sha256 = sha256_hex(text.as_bytes());
    fields.insert("text_sha256".into(), Value::from(text_sha256.clone()));

    let mut stable = fields.clone();
    stable.remove("timestamps");
    let stable_bytes = serde_json::to_vec(&stable).map_err(|e| EmitError::Meta(e.to_string()))?;
    fields.insert("meta_fingerprint".into(), Value::from(sha256_hex(&stable_bytes)));
    let meta_bytes = serde_json::to_vec_pretty(&Value::Object(fields)).map_err(|e| EmitError::Meta(e.to_string()))?;

    std::fs::create_dir_all(outdir).map_err(|e| EmitError::WriteFailed(format!("{}: {}", outdir.display(), e)))?;
    let txt_path = outdir.join(format!("{}.txt", doc_id));
    let meta_path = outdir.join(format!("{}.meta.json", doc_id));
    write_via_rename(&txt_path, text.as_bytes())?;
    write_via_rename(&meta_path, &meta_bytes)?;

    Ok(EmitPaths { txt_path, meta_path, text_sha256 })
}

fn write_via_rename(path: &Path, bytes: &[u8]) -> Result<(), EmitError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".tmp.{}", std::process::id()));
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes)
        .and_then(|_| std::fs::rename(&tmp, path))
        .map_err(|e| EmitError::WriteFailed(format!("{}: {}", path.display(), e)))
}

/// Lower-case hex SHA-256.
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes).iter().fold(String::with_capacity(64), |mut hex, byte| {
        let _ = write!(hex, "{:02x}", byte);
        hex
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyReport {
    pub expected: String,
    pub actual: String,
    pub ok: bool,
}

/// Recompute the digest of an emitted text file and compare it with the
/// `text_sha256` recorded in its meta JSON.
pub fn verify_output(txt_path: &Path, meta_path: &Path) -> Result<VerifyReport, EmitError> {
    let text = std::fs::read(txt_path).map_err(|e| EmitError::ReadFailed(format!("{}: {}", txt_path.display(), e)))?;
    let raw_meta =
        std::fs::read_to_string(meta_path).map_err(|e| EmitError::ReadFailed(format!("{}: {}", meta_path.display(), e)))?;
    let meta: Value = serde_json::from_str(&raw_meta).map_err(|e| EmitError::Meta(e.to_string()))?;
    let expected = meta
        .get("text_sha256")
        .and_then(|v| v.as_str())
        .ok_or_else(|| EmitError::Meta("missing text_sha256".into()))?
        .to_string();
    let actual = sha256_hex(&text);
    let ok = expected == actual;
    Ok(VerifyReport { expected, actual, ok })
}

/// Lower-case ASCII slug of a file stem. Vietnamese diacritics are folded
/// ("Đồng Bằng" -> "dong-bang"); other characters become single dashes.
pub fn slugify(base: &str) -> String {
    let folded: String = base
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' => 'd',
            'Đ' => 'D',
            other => other,
        })
        .collect::<String>()
        .to_lowercase();

    let mut slug = String::with_capacity(folded.len());
    let mut prev_dash = true;
    for ch in folded.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "doc".to_string()
    } else {
        slug.to_string()
    }
}

/// `slug`, or `slug-1`, `slug-2` ... when already taken.
pub fn unique_slug(slug: String, used: &mut HashSet<String>) -> String {
    if used.insert(slug.clone()) {
        return slug;
    }
    let mut i = 1;
    loop {
        let candidate = format!("{}-{}", slug, i);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        i += 1;
    }
}
