use std::fmt;

/// Log a raw payload, one line of text per log row.
pub(crate) fn log_data(data: &[u8]) {
    if !log_enabled!(log::Level::Debug) {
        return;
    }

    if data.is_empty() {
        debug!("<empty payload>");
        return;
    }

    for line in data.split(|b| *b == b'\n') {
        debug!("{:?}", Row(line));
    }
}

struct Row<'a>(&'a [u8]);

impl<'a> fmt::Debug for Row<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = self.0.strip_suffix(b"\r").unwrap_or(self.0);
        write!(f, "{}", String::from_utf8_lossy(line))
    }
}

#[cfg(feature = "http-exchange")]
pub(crate) fn find_crlf(b: &[u8]) -> Option<usize> {
    b.windows(2).position(|w| w == b"\r\n")
}
