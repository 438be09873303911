//! Email recovery for a single student.

use crate::crypto::FieldCipher;
use crate::models::{display_value, StudentRecord};
use crate::pipeline::validator::is_valid_email;
use anyhow::{anyhow, Context, Result};
use std::io::{BufRead, Write};
use tracing::warn;

/// Find the record whose `id` renders as `id`.
pub fn find_by_id<'a>(records: &'a [StudentRecord], id: &str) -> Option<&'a StudentRecord> {
    records
        .iter()
        .find(|record| display_value(record.get("id")) == id)
}

/// Decrypt the stored email of student `id`.
pub fn decrypt_email(records: &[StudentRecord], id: &str, cipher: &FieldCipher) -> Result<String> {
    let record = find_by_id(records, id).ok_or_else(|| anyhow!("No student with id {}", id))?;
    let stored = record
        .get_str("email")
        .ok_or_else(|| anyhow!("Student {} has no stored email", id))?;

    let email = cipher
        .decrypt(stored)
        .with_context(|| format!("Failed to decrypt email of student {}", id))?;

    if !is_valid_email(&email) {
        warn!(
            "Decrypted value for student {} is not an email, the key is probably wrong",
            id
        );
    }

    Ok(email)
}

/// Print `label` and read one trimmed line.
pub fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> Result<String> {
    write!(output, "{}: ", label)?;
    output.flush()?;

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    if read == 0 {
        return Err(anyhow!("No input for {}", label));
    }
    Ok(line.trim().to_string())
}
