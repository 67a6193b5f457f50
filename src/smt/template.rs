//! Marker-based patching of the board template.

use super::SmtError;

pub const MARKER_PCB_NAME: &str = "PCBNAME=";
pub const MARKER_PROFILES_END: &str = "End_of_FD";
pub const MARKER_PLACEMENTS: &str = "&B.OPT";

/// Insert `content` immediately before the first occurrence of `marker`.
pub fn insert_before(text: &mut String, marker: &'static str, content: &str) -> Result<(), SmtError> {
    let at = text.find(marker).ok_or(SmtError::MissingMarker(marker))?;
    text.insert_str(at, content);
    Ok(())
}

/// Overwrite the characters after `marker` with `value`.
///
/// The overwrite stops at the end of the marker's line; whatever is left of
/// `value` is inserted there, so the line break is never consumed.
pub fn overwrite_after(text: &mut String, marker: &'static str, value: &str) -> Result<(), SmtError> {
    let start = text.find(marker).ok_or(SmtError::MissingMarker(marker))? + marker.len();
    let line_end = text[start..]
        .find(['\r', '\n'])
        .map_or(text.len(), |i| start + i);

    let line = &text[start..line_end];
    let cut = line
        .char_indices()
        .nth(value.chars().count())
        .map_or(line.len(), |(i, _)| i);

    text.replace_range(start..start + cut, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_before_marker() {
        let mut text = String::from("A\nEnd_of_FD\nB\n");
        insert_before(&mut text, MARKER_PROFILES_END, "P1\n").unwrap();
        insert_before(&mut text, MARKER_PROFILES_END, "P2\n").unwrap();
        assert_eq!(text, "A\nP1\nP2\nEnd_of_FD\nB\n");
    }

    #[test]
    fn test_missing_marker() {
        let mut text = String::from("nothing");
        assert!(matches!(
            insert_before(&mut text, MARKER_PLACEMENTS, "x"),
            Err(SmtError::MissingMarker("&B.OPT"))
        ));
        assert_eq!(text, "nothing");
    }

    #[test]
    fn test_overwrite_same_length() {
        let mut text = String::from("PCBNAME=GTMxxx01\nNEXT\n");
        overwrite_after(&mut text, MARKER_PCB_NAME, "GTM10201").unwrap();
        assert_eq!(text, "PCBNAME=GTM10201\nNEXT\n");
    }

    #[test]
    fn test_overwrite_shorter_and_longer() {
        let mut text = String::from("PCBNAME=GTMxxx01\nNEXT\n");
        overwrite_after(&mut text, MARKER_PCB_NAME, "AB").unwrap();
        assert_eq!(text, "PCBNAME=ABMxxx01\nNEXT\n");

        let mut text = String::from("PCBNAME=GTMxxx01\r\nNEXT\n");
        overwrite_after(&mut text, MARKER_PCB_NAME, "LONGBOARD-NAME").unwrap();
        assert_eq!(text, "PCBNAME=LONGBOARD-NAME\r\nNEXT\n");
    }
}
