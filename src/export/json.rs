use crate::error::ExportError;
use std::io::Write;

/// Pretty-printed JSON followed by a newline
pub fn write_json<T, W>(data: &T, writer: &mut W) -> Result<(), ExportError>
where
    T: serde::Serialize + ?Sized,
    W: Write,
{
    serde_json::to_writer_pretty(&mut *writer, data)?;
    writeln!(writer)?;
    Ok(())
}

/// Pretty-printed JSON as a string
pub fn to_json_string<T>(data: &T) -> Result<String, ExportError>
where
    T: serde::Serialize + ?Sized,
{
    Ok(serde_json::to_string_pretty(data)?)
}
