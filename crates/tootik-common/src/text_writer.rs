//! The `text::Writer` collaborator interface.
//!
//! The concrete Gemini/Gopher/Finger line-format encoders are external
//! collaborators; this crate only specifies the trait surface the
//! frontend renders against, plus the status vocabulary it drives.

use crate::error::StatusFamily;

/// A line-oriented output sink for one request/response cycle.
///
/// Implementations translate these calls into the wire format of whichever
/// text protocol served the request (Gemini, Gopher, or Finger). A `Writer`
/// is single-owner for the lifetime of a request; it is never shared across
/// concurrent requests.
pub trait Writer: Send {
    /// Emit the final status line (e.g. `20 text/gemini`) and switch the
    /// writer into body-emitting mode. Must be called at most once.
    fn ok(&mut self, mime: &str);

    /// Emit a bare status line with no body, for non-`20` responses.
    fn status(&mut self, family: StatusFamily, detail: &str);

    /// Emit a page title line (`# <text>`-equivalent).
    fn title(&mut self, level: u8, text: &str);

    /// Emit a subtitle line, one level below `title`.
    fn subtitle(&mut self, text: &str);

    /// Emit a plain text line.
    fn text(&mut self, text: &str);

    /// Emit a `format!`-style plain text line.
    fn textf(&mut self, text: std::fmt::Arguments<'_>);

    /// Emit a menu item line with no associated URL.
    fn item(&mut self, text: &str);

    /// Emit a `format!`-style menu item line.
    fn itemf(&mut self, text: std::fmt::Arguments<'_>);

    /// Emit a navigable link.
    fn link(&mut self, url: &str, text: &str);

    /// Emit a `format!`-style navigable link.
    fn linkf(&mut self, url: &str, text: std::fmt::Arguments<'_>);

    /// Emit a quoted (indented) body line.
    fn quote(&mut self, text: &str);

    /// Emit raw, pre-formatted bytes with no line processing.
    fn raw(&mut self, bytes: &[u8]);

    /// Emit a visible separator between sections.
    fn separator(&mut self);

    /// Emit a blank line.
    fn empty(&mut self);

    /// Emit a redirect to another URL on the same or a different host.
    fn redirect(&mut self, url: &str);

    /// Emit an error using the given status family and detail message.
    fn error(&mut self, family: StatusFamily, detail: &str);
}

/// An in-memory `Writer` used by the response cache and by
/// tests: records every call so the bytes can be replayed or inspected.
#[derive(Debug, Default)]
pub struct BufferWriter {
    /// The rendered lines, in emission order.
    pub lines: Vec<String>,
    /// The status line, if one was emitted.
    pub status_line: Option<String>,
}

impl BufferWriter {
    /// Create an empty buffer writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the buffered lines as a single byte string, newline-joined.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out.into_bytes()
    }
}

impl Writer for BufferWriter {
    fn ok(&mut self, mime: &str) {
        self.status_line = Some(format!("{} {mime}", StatusFamily::Success.code()));
    }

    fn status(&mut self, family: StatusFamily, detail: &str) {
        self.status_line = Some(format!("{} {detail}", family.code()));
    }

    fn title(&mut self, level: u8, text: &str) {
        self.lines.push(format!("{} {text}", "#".repeat(level.max(1) as usize)));
    }

    fn subtitle(&mut self, text: &str) {
        self.lines.push(format!("## {text}"));
    }

    fn text(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }

    fn textf(&mut self, args: std::fmt::Arguments<'_>) {
        self.lines.push(std::fmt::format(args));
    }

    fn item(&mut self, text: &str) {
        self.lines.push(format!("* {text}"));
    }

    fn itemf(&mut self, args: std::fmt::Arguments<'_>) {
        self.lines.push(format!("* {}", std::fmt::format(args)));
    }

    fn link(&mut self, url: &str, text: &str) {
        self.lines.push(format!("=> {url} {text}"));
    }

    fn linkf(&mut self, url: &str, args: std::fmt::Arguments<'_>) {
        self.lines.push(format!("=> {url} {}", std::fmt::format(args)));
    }

    fn quote(&mut self, text: &str) {
        self.lines.push(format!("> {text}"));
    }

    fn raw(&mut self, bytes: &[u8]) {
        self.lines.push(String::from_utf8_lossy(bytes).into_owned());
    }

    fn separator(&mut self) {
        self.lines.push("---".to_string());
    }

    fn empty(&mut self) {
        self.lines.push(String::new());
    }

    fn redirect(&mut self, url: &str) {
        self.status_line = Some(format!("{} {url}", StatusFamily::Redirect.code()));
    }

    fn error(&mut self, family: StatusFamily, detail: &str) {
        self.status_line = Some(format!("{} {detail}", family.code()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_writer_records_status_and_body() {
        let mut w = BufferWriter::new();
        w.ok("text/gemini");
        w.title(1, "Home");
        w.link("/local", "Local timeline");
        assert_eq!(w.status_line.as_deref(), Some("20 text/gemini"));
        assert_eq!(w.lines, vec!["# Home", "=> /local Local timeline"]);
    }
}
