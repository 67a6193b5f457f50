//! Fixed-width placement record formatting.

use super::SmtError;

/// Width of a numeric field, excluding the trailing separator space.
const FIELD_WIDTH: usize = 8;

/// Column the decimal point is aligned to.
const POINT_COLUMN: usize = 5;

/// Literal between the rotation field and the head index.
const RECORD_FLAGS: &str = "0A0000FFFF0001000";

/// Width of the designator annotation, excluding the newline.
const ANNOTATION_WIDTH: usize = 19;

/// Align a decimal number on its point inside an 8-character field.
///
/// The value starts at column `5 - p`, where `p` is the position of the
/// decimal point, is cut at 8 characters and followed by one space.
/// `None` if there is no point, it comes first, or it sits past column 5.
pub fn number_field(text: &str) -> Option<String> {
    let point = text.chars().position(|c| c == '.')?;
    if point == 0 || point > POINT_COLUMN {
        return None;
    }

    let aligned: String = " "
        .repeat(POINT_COLUMN - point)
        .chars()
        .chain(text.chars())
        .take(FIELD_WIDTH)
        .collect();
    Some(format!("{:<width$} ", aligned, width = FIELD_WIDTH))
}

fn with_decimals(text: &str) -> String {
    if text.contains('.') {
        text.to_string()
    } else {
        format!("{}.00", text)
    }
}

/// Normalise a rotation: a full turn becomes 0 and integers get `.00`.
pub fn normalize_rotation(text: &str) -> String {
    let text = text.trim();
    if text.parse::<f64>().is_ok_and(|r| r == 360.0) {
        return "0.00".to_string();
    }
    with_decimals(text)
}

/// One placement ready to be written.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    pub x: &'a str,
    pub y: &'a str,
    pub rotation: &'a str,
    pub designator: &'a str,
    pub part_ref: &'a str,
    /// Head number from the profile, 1–8
    pub head: u8,
    /// Profile slot
    pub slot: usize,
}

impl Record<'_> {
    fn field(&self, name: &'static str, value: &str) -> Result<String, SmtError> {
        number_field(value).ok_or_else(|| SmtError::Field {
            field: name,
            value: value.to_string(),
            designator: self.designator.to_string(),
        })
    }

    /// Render the record line including its annotation and newline.
    pub fn render(&self) -> Result<String, SmtError> {
        let mut out = String::new();
        out.push_str(&self.field("X", &with_decimals(self.x.trim()))?);
        out.push_str(&self.field("Y", &with_decimals(self.y.trim()))?);
        out.push_str(&self.field("zero", "0.00")?);
        out.push_str(&self.field("rotation", &normalize_rotation(self.rotation))?);

        out.push_str(RECORD_FLAGS);
        out.push_str(&self.head.saturating_sub(1).to_string());
        if self.slot < 16 {
            out.push_str(&format!("00FFFF0000000{:X}", self.slot));
        } else {
            out.push_str(&format!("00FFFF000000{:02X}", self.slot));
        }
        out.push(' ');

        let annotation = format!("{}>>>{}", self.designator, self.part_ref);
        out.push_str(&format!("{:<width$}\n", annotation, width = ANNOTATION_WIDTH));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_field_alignment() {
        assert_eq!(number_field("1.50").unwrap(), "    1.50 ");
        assert_eq!(number_field("12.50").unwrap(), "   12.50 ");
        assert_eq!(number_field("123.456").unwrap(), "  123.45 ");
        assert_eq!(number_field("-12.5").unwrap(), "  -12.5  ");
        assert_eq!(number_field("12345.6789").unwrap(), "12345.67 ");
    }

    #[test]
    fn test_number_field_rejects_bad_point() {
        assert_eq!(number_field(".5"), None);
        assert_eq!(number_field("12"), None);
        assert_eq!(number_field("123456.7"), None);
    }

    #[test]
    fn test_rotation_normalisation() {
        assert_eq!(normalize_rotation("360"), "0.00");
        assert_eq!(number_field(&normalize_rotation("360")).unwrap(), "    0.00 ");
        assert_eq!(normalize_rotation("90"), "90.00");
        assert_eq!(normalize_rotation("270.5"), "270.5");
    }

    #[test]
    fn test_render_record() {
        let record = Record {
            x: "12.5",
            y: "3",
            rotation: "360",
            designator: "R1",
            part_ref: "100-0001",
            head: 3,
            slot: 0,
        };
        let line = record.render().unwrap();
        assert_eq!(
            line,
            "   12.5      3.00     0.00     0.00 0A0000FFFF0001000200FFFF00000000 R1>>>100-0001      \n"
        );
    }

    #[test]
    fn test_render_two_digit_slot() {
        let record = Record {
            x: "1.00",
            y: "1.00",
            rotation: "0",
            designator: "C12",
            part_ref: "P",
            head: 1,
            slot: 26,
        };
        let line = record.render().unwrap();
        assert!(line.contains("0A0000FFFF0001000000FFFF0000001A "));
    }

    #[test]
    fn test_render_reports_bad_field() {
        let record = Record {
            x: "1234567.0",
            y: "1.00",
            rotation: "0",
            designator: "U7",
            part_ref: "P",
            head: 1,
            slot: 0,
        };
        match record.render() {
            Err(SmtError::Field { field, designator, .. }) => {
                assert_eq!(field, "X");
                assert_eq!(designator, "U7");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
