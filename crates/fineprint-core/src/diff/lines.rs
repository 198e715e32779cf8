//! Line splitting shared by the diff engine and the patch applier.

/// Split `text` on `\n`, keeping each terminator with its line
///
/// A trailing line without a terminator is kept as is; the empty string
/// yields no lines. `\r` is not treated specially.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}
