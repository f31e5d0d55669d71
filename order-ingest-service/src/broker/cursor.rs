//! Read position tracking for the stream.

use tracing::warn;

/// Start position meaning "only entries appended after the read begins".
pub const START_AT_LATEST: &str = "$";

/// Parses a stream entry id (`ms-seq`) into its ordered numeric pair.
fn parse_entry_id(id: &str) -> Option<(u64, u64)> {
    let (ms, seq) = id.split_once('-')?;
    Some((ms.parse().ok()?, seq.parse().ok()?))
}

/// Last handled position in the stream, the sole source of truth for what
/// the next read call asks for.
///
/// The cursor lives in memory for one session: a fresh process starts from
/// the configured start position again. It only ever moves forward, so a
/// redelivered or out-of-order entry id can never rewind the read window.
#[derive(Debug, Clone)]
pub struct StreamCursor {
    position: String,
}

impl StreamCursor {
    /// Cursor over entries appended after the session begins.
    pub fn latest() -> Self {
        Self::from_id(START_AT_LATEST)
    }

    /// Cursor pinned to an explicit start position.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self { position: id.into() }
    }

    /// Position to hand to the next read call.
    pub fn position(&self) -> &str {
        &self.position
    }

    /// Moves the cursor to `id`, the position of the entry just handled.
    ///
    /// Only strictly forward moves are applied; a regression or an
    /// unparseable id is logged and ignored.
    pub fn advance(&mut self, id: &str) {
        let Some(next) = parse_entry_id(id) else {
            warn!(id = %id, "ignoring cursor advance to unparseable entry id");
            return;
        };
        if let Some(current) = parse_entry_id(&self.position) {
            if next <= current {
                warn!(
                    id = %id,
                    position = %self.position,
                    "ignoring non-forward cursor advance"
                );
                return;
            }
        }
        self.position = id.to_owned();
    }
}

impl Default for StreamCursor {
    fn default() -> Self {
        Self::latest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_ids_order_numerically() {
        assert!(parse_entry_id("10-0") > parse_entry_id("9-99"));
        assert!(parse_entry_id("5-2") > parse_entry_id("5-1"));
        assert_eq!(parse_entry_id("junk"), None);
        assert_eq!(parse_entry_id("1-2-3"), None);
    }

    #[test]
    fn starts_at_latest() {
        assert_eq!(StreamCursor::latest().position(), "$");
        assert_eq!(StreamCursor::default().position(), "$");
    }

    #[test]
    fn first_advance_replaces_latest() {
        let mut cursor = StreamCursor::latest();
        cursor.advance("1000-0");
        assert_eq!(cursor.position(), "1000-0");
    }

    #[test]
    fn never_regresses() {
        let mut cursor = StreamCursor::from_id("1000-1");
        cursor.advance("1000-1");
        assert_eq!(cursor.position(), "1000-1");
        cursor.advance("999-9");
        assert_eq!(cursor.position(), "1000-1");
        cursor.advance("1000-2");
        assert_eq!(cursor.position(), "1000-2");
    }

    #[test]
    fn compares_numerically_not_lexically() {
        let mut cursor = StreamCursor::from_id("9-0");
        cursor.advance("10-0");
        assert_eq!(cursor.position(), "10-0");
    }

    #[test]
    fn unparseable_id_never_advances() {
        let mut cursor = StreamCursor::from_id("5-0");
        cursor.advance("not-an-id");
        assert_eq!(cursor.position(), "5-0");
    }
}
