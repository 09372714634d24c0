//! Line-oriented `FIELD: value` extraction.
//!
//! Instance headers and run artifacts share one grammar:
//!
//! ```text
//! line  = ws* name ws* ':' ws* value (ws rest)?
//! name  = [A-Za-z0-9_]+
//! value = non-whitespace+
//! ```
//!
//! Anything that does not match is not a field and is skipped by callers.

/// Field carrying the instance label in an instance header.
pub const NAME: &str = "NAME";
/// Field carrying the tour length in a run artifact.
pub const DISTANCE: &str = "DISTANCE";
/// Field carrying the solver wall-clock time, in seconds, in a run artifact.
pub const TIME: &str = "TIME";

/// A `name: value` pair borrowed from a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

/// Parse one line, returning `None` if it is not a field.
pub fn parse_line(line: &str) -> Option<Field<'_>> {
    let line = line.trim_start();

    let name_len = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(line.len());
    if name_len == 0 {
        return None;
    }
    let (name, rest) = line.split_at(name_len);

    let rest = rest.trim_start().strip_prefix(':')?;
    let value = rest.split_whitespace().next()?;

    Some(Field { name, value })
}

/// Value of the field `name` on this line, if the line is that field.
pub fn field_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    parse_line(line)
        .filter(|field| field.name == name)
        .map(|field| field.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_field() {
        assert_eq!(
            parse_line("NAME: berlin52"),
            Some(Field {
                name: "NAME",
                value: "berlin52"
            })
        );
    }

    #[test]
    fn whitespace_around_the_colon_is_tolerated() {
        assert_eq!(field_value("NAME : berlin52", NAME), Some("berlin52"));
        assert_eq!(field_value("NAME:berlin52", NAME), Some("berlin52"));
        assert_eq!(field_value("  NAME\t:\tberlin52  ", NAME), Some("berlin52"));
    }

    #[test]
    fn value_is_the_first_token() {
        assert_eq!(
            field_value("COMMENT : 52 locations in Berlin", "COMMENT"),
            Some("52")
        );
    }

    #[test]
    fn field_names_match_exactly() {
        assert_eq!(field_value("FILENAME: x.tsp", NAME), None);
        assert_eq!(field_value("NAMES: x", NAME), None);
        assert_eq!(field_value("name: x", NAME), None);
    }

    #[test]
    fn non_fields_are_rejected() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("TOUR_SECTION"), None);
        assert_eq!(parse_line("1 565.0 575.0"), None);
        assert_eq!(parse_line(": value"), None);
        assert_eq!(parse_line("NAME:"), None);
        assert_eq!(parse_line("NAME:   "), None);
    }

    #[test]
    fn artifact_fields() {
        assert_eq!(field_value("DISTANCE: 7542.00", DISTANCE), Some("7542.00"));
        assert_eq!(field_value("TIME: 1.25", TIME), Some("1.25"));
    }
}
