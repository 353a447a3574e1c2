use super::types::{DirectiveFormat, RepairDirective};
use std::io::{self, Write};

/// Destination for repair directives.
///
/// `write_record` receives all directives of one divergence record at once and
/// must write them contiguously.
pub trait DirectiveSink: Send + 'static {
    fn write_record(&mut self, directives: &[RepairDirective]) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes directives as lines to any `Write`, flushing after every record so
/// a downstream executor sees them as soon as they are found.
pub struct WriterSink<W> {
    writer: W,
    format: DirectiveFormat,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, format: DirectiveFormat) -> Self {
        Self { writer, format }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send + 'static> DirectiveSink for WriterSink<W> {
    fn write_record(&mut self, directives: &[RepairDirective]) -> io::Result<()> {
        for directive in directives {
            match self.format {
                DirectiveFormat::Command => writeln!(self.writer, "{}", directive)?,
                DirectiveFormat::Json => {
                    serde_json::to_writer(&mut self.writer, directive)?;
                    self.writer.write_all(b"\n")?;
                }
            }
        }
        self.writer.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Collects directives in memory.
impl DirectiveSink for Vec<RepairDirective> {
    fn write_record(&mut self, directives: &[RepairDirective]) -> io::Result<()> {
        self.extend_from_slice(directives);
        Ok(())
    }
}
