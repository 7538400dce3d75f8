//! Semicolon-delimited CSV line tokenizer
//!
//! The catalog file dialect: fields split on `;`, optionally wrapped in
//! double quotes so descriptions can embed the delimiter, and a doubled
//! quote inside a quoted region decodes to one literal quote
//! (`"FECHO 3"" REF:839"` → `FECHO 3" REF:839`). Every field is trimmed.
//!
//! Deliberately not an RFC 4180 reader: fields are whitespace-trimmed, a
//! quote that is never closed swallows the rest of the line instead of
//! erroring, and scope is a single line (the caller splits the file).

/// Split one line into its fields.
///
/// Never returns an empty vector: an empty line is one empty field.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    // Doubled quote inside a quoted region: one literal quote
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ';' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_fields() {
        assert_eq!(parse_line("A;B;C"), vec!["A", "B", "C"]);
    }

    #[test]
    fn trims_whitespace_around_fields() {
        assert_eq!(parse_line("  A ; B ;C  "), vec!["A", "B", "C"]);
    }

    #[test]
    fn empty_line_yields_one_empty_field() {
        assert_eq!(parse_line(""), vec![""]);
    }

    #[test]
    fn preserves_empty_fields() {
        assert_eq!(parse_line(";;"), vec!["", "", ""]);
        assert_eq!(parse_line("A;;C"), vec!["A", "", "C"]);
    }

    #[test]
    fn quoted_field_keeps_delimiter_literal() {
        assert_eq!(
            parse_line("\"a;b\";c"),
            vec!["a;b", "c"]
        );
    }

    #[test]
    fn doubled_quote_decodes_to_literal_quote() {
        assert_eq!(
            parse_line("\"FECHO 3\"\" REF:839\";CODE1;X"),
            vec!["FECHO 3\" REF:839", "CODE1", "X"]
        );
    }

    #[test]
    fn unbalanced_quote_consumes_rest_of_line() {
        assert_eq!(parse_line("\"a;b;c"), vec!["a;b;c"]);
    }

    #[test]
    fn quotes_mid_field_toggle_state() {
        // An unquoted field containing a quoted run
        assert_eq!(parse_line("ab\"c;d\"e;f"), vec!["abc;de", "f"]);
    }

    #[test]
    fn reparses_requoted_output() {
        // Round trip: parse, re-join with quoting, parse again
        let original = "\"FECHO 3\"\" REF:839\";CODE1;  X ";
        let fields = parse_line(original);

        let rejoined: Vec<String> = fields
            .iter()
            .map(|f| {
                if f.contains(';') || f.contains('"') {
                    format!("\"{}\"", f.replace('"', "\"\""))
                } else {
                    f.clone()
                }
            })
            .collect();
        let reparsed = parse_line(&rejoined.join(";"));
        assert_eq!(reparsed, fields);
    }
}
