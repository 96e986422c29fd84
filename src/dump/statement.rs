// ABOUTME: Quote-aware SQL statement splitting and order-preserving partitioning
// ABOUTME: Keeps separators inside literals and comments from breaking statements

/// Split dump text into individual SQL statements on top-level `;` separators.
///
/// The splitter tracks enough MariaDB lexical state that a `;` inside a
/// string literal, a backtick-quoted identifier, or a `--` line comment never
/// ends a statement:
/// - single- and double-quoted strings, with backslash escapes and doubled
///   quotes (`''` / `""`)
/// - backtick-quoted identifiers, with doubled backticks
/// - `--` line comments (only when followed by whitespace or end of line,
///   per MariaDB rules); comment text is consumed, since dump headers are
///   human-readable only
///
/// Block comments and `#` comments are not recognized; the exporter never
/// emits them, and dumps containing them are outside this splitter's
/// precondition. Statements are trimmed and blank segments dropped.
///
/// # Examples
///
/// ```
/// # use mariadb_dump_toolkit::dump::split_statements;
/// let statements = split_statements("INSERT INTO t VALUES ('a;b');\nDROP TABLE t;");
/// assert_eq!(statements.len(), 2);
/// assert_eq!(statements[0], "INSERT INTO t VALUES ('a;b')");
/// ```
pub fn split_statements(sql: &str) -> Vec<String> {
    enum Mode {
        Normal,
        SingleQuote,
        DoubleQuote,
        Backtick,
        LineComment,
    }

    let mut statements = Vec::new();
    let mut current = String::new();
    let mut mode = Mode::Normal;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match mode {
            Mode::Normal => match c {
                ';' => {
                    push_statement(&mut statements, &mut current);
                }
                '\'' => {
                    mode = Mode::SingleQuote;
                    current.push(c);
                }
                '"' => {
                    mode = Mode::DoubleQuote;
                    current.push(c);
                }
                '`' => {
                    mode = Mode::Backtick;
                    current.push(c);
                }
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    // "--" opens a comment only before whitespace or EOL
                    match chars.peek() {
                        None => mode = Mode::LineComment,
                        Some(next) if next.is_whitespace() => mode = Mode::LineComment,
                        Some(_) => current.push_str("--"),
                    }
                }
                _ => current.push(c),
            },
            Mode::SingleQuote => match c {
                '\\' => {
                    current.push(c);
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                }
                '\'' => {
                    current.push(c);
                    if chars.peek() == Some(&'\'') {
                        current.push(chars.next().unwrap());
                    } else {
                        mode = Mode::Normal;
                    }
                }
                _ => current.push(c),
            },
            Mode::DoubleQuote => match c {
                '\\' => {
                    current.push(c);
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                }
                '"' => {
                    current.push(c);
                    if chars.peek() == Some(&'"') {
                        current.push(chars.next().unwrap());
                    } else {
                        mode = Mode::Normal;
                    }
                }
                _ => current.push(c),
            },
            Mode::Backtick => {
                current.push(c);
                if c == '`' {
                    if chars.peek() == Some(&'`') {
                        current.push(chars.next().unwrap());
                    } else {
                        mode = Mode::Normal;
                    }
                }
            }
            Mode::LineComment => {
                if c == '\n' {
                    mode = Mode::Normal;
                    current.push('\n');
                }
            }
        }
    }

    push_statement(&mut statements, &mut current);

    statements
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
    current.clear();
}

/// Partition statements into `chunks` contiguous, order-preserving slices.
///
/// The result is a disjoint cover of the input: concatenating the chunks in
/// order reproduces the original sequence exactly, and chunk sizes differ by
/// at most one (earlier chunks take the remainder). Chunks may be empty when
/// there are fewer statements than chunks. A statement is never split.
///
/// # Examples
///
/// ```
/// # use mariadb_dump_toolkit::dump::partition_statements;
/// let statements: Vec<String> = (0..5).map(|i| format!("S{}", i)).collect();
/// let chunks = partition_statements(&statements, 3);
/// assert_eq!(chunks.len(), 3);
/// assert_eq!(chunks[0].len(), 2);
/// assert_eq!(chunks[2].len(), 1);
/// ```
pub fn partition_statements(statements: &[String], chunks: usize) -> Vec<Vec<String>> {
    if chunks == 0 {
        return Vec::new();
    }

    let base = statements.len() / chunks;
    let extra = statements.len() % chunks;

    let mut partitions = Vec::with_capacity(chunks);
    let mut index = 0;
    for chunk in 0..chunks {
        let take = base + usize::from(chunk < extra);
        partitions.push(statements[index..index + take].to_vec());
        index += take;
    }

    partitions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_basic_statements() {
        let statements = split_statements("CREATE TABLE t (id INT);\nDROP TABLE t;");
        assert_eq!(statements, vec!["CREATE TABLE t (id INT)", "DROP TABLE t"]);
    }

    #[test]
    fn test_split_keeps_semicolon_inside_single_quotes() {
        let statements = split_statements("INSERT INTO t VALUES ('a;b');INSERT INTO t VALUES (2);");
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], "INSERT INTO t VALUES ('a;b')");
    }

    #[test]
    fn test_split_keeps_semicolon_inside_double_quotes_and_backticks() {
        let statements = split_statements("SELECT \"x;y\" FROM `odd;name`;SELECT 1;");
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], "SELECT \"x;y\" FROM `odd;name`");
    }

    #[test]
    fn test_split_handles_doubled_quote_escape() {
        let statements = split_statements("INSERT INTO t VALUES ('O''Hare; gate 12');");
        assert_eq!(statements, vec!["INSERT INTO t VALUES ('O''Hare; gate 12')"]);
    }

    #[test]
    fn test_split_handles_backslash_escape() {
        let statements = split_statements(r"INSERT INTO t VALUES ('it\'s; fine');SELECT 1;");
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], r"INSERT INTO t VALUES ('it\'s; fine')");
    }

    #[test]
    fn test_split_consumes_comments() {
        let sql = "-- Database dump generated; do not edit\nCREATE TABLE t (id INT);\n-- trailing note\n";
        let statements = split_statements(sql);
        assert_eq!(statements, vec!["CREATE TABLE t (id INT)"]);
    }

    #[test]
    fn test_split_double_dash_without_whitespace_is_not_a_comment() {
        let statements = split_statements("SELECT 5--3;");
        assert_eq!(statements, vec!["SELECT 5--3"]);
    }

    #[test]
    fn test_split_drops_blank_segments() {
        let statements = split_statements(";;  ;\nSELECT 1;\n;");
        assert_eq!(statements, vec!["SELECT 1"]);
    }

    #[test]
    fn test_split_keeps_trailing_statement_without_separator() {
        let statements = split_statements("SELECT 1;\nSELECT 2");
        assert_eq!(statements, vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_partition_even_split() {
        let statements: Vec<String> = (0..100).map(|i| format!("S{}", i)).collect();
        let chunks = partition_statements(&statements, 4);

        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|chunk| chunk.len() == 25));

        let reassembled: Vec<String> = chunks.into_iter().flatten().collect();
        assert_eq!(reassembled, statements);
    }

    #[test]
    fn test_partition_uneven_split() {
        let statements: Vec<String> = (0..5).map(|i| format!("S{}", i)).collect();
        let chunks = partition_statements(&statements, 3);

        let sizes: Vec<usize> = chunks.iter().map(|chunk| chunk.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);

        let reassembled: Vec<String> = chunks.into_iter().flatten().collect();
        assert_eq!(reassembled, statements);
    }

    #[test]
    fn test_partition_more_chunks_than_statements() {
        let statements: Vec<String> = vec!["A".to_string(), "B".to_string()];
        let chunks = partition_statements(&statements, 4);

        assert_eq!(chunks.len(), 4);
        let sizes: Vec<usize> = chunks.iter().map(|chunk| chunk.len()).collect();
        assert_eq!(sizes, vec![1, 1, 0, 0]);
    }

    #[test]
    fn test_partition_zero_chunks() {
        let statements = vec!["A".to_string()];
        assert!(partition_statements(&statements, 0).is_empty());
    }
}
