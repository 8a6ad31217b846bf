//! Minimal CSV output: comma separated, `\n` terminated, quoting only the
//! fields that need it.

use std::io::{self, BufWriter, IntoInnerError, Write};

pub struct CsvWriter<W: Write> {
    inner: BufWriter<W>,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: BufWriter::new(writer),
        }
    }

    pub fn write_record<I, T>(&mut self, fields: I) -> io::Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        for (index, field) in fields.into_iter().enumerate() {
            if index > 0 {
                self.inner.write_all(b",")?;
            }
            write_field(&mut self.inner, field.as_ref())?;
        }
        self.inner.write_all(b"\n")
    }

    /// Flush buffered output and return the underlying writer.
    pub fn finish(self) -> io::Result<W> {
        self.inner.into_inner().map_err(IntoInnerError::into_error)
    }
}

fn needs_quotes(field: &str) -> bool {
    field.contains([',', '"', '\r', '\n']) || field.starts_with(char::is_whitespace)
}

fn write_field(out: &mut impl Write, field: &str) -> io::Result<()> {
    if !needs_quotes(field) {
        return out.write_all(field.as_bytes());
    }

    out.write_all(b"\"")?;
    for (index, part) in field.split('"').enumerate() {
        if index > 0 {
            out.write_all(b"\"\"")?;
        }
        out.write_all(part.as_bytes())?;
    }
    out.write_all(b"\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(records: &[&[&str]]) -> String {
        let mut writer = CsvWriter::new(Vec::new());
        for record in records {
            writer.write_record(record.iter()).unwrap();
        }
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn plain_fields_are_not_quoted() {
        assert_eq!(render(&[&["06/13/2021", "12:15", "15"]]), "06/13/2021,12:15,15\n");
    }

    #[test]
    fn commas_and_quotes_are_escaped() {
        assert_eq!(
            render(&[&["Bothell, WA", r#"say "hi""#, "x"]]),
            "\"Bothell, WA\",\"say \"\"hi\"\"\",x\n"
        );
    }

    #[test]
    fn line_breaks_and_leading_space_are_quoted() {
        assert_eq!(render(&[&["a\nb", " lead", ""]]), "\"a\nb\",\" lead\",\n");
    }

    #[test]
    fn records_end_with_newline() {
        assert_eq!(render(&[&["a"], &["b"]]), "a\nb\n");
    }
}
