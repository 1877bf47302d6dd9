//! Replacement-pattern table: loading, compilation, and application.
//!
//! The table is data, not code: one rule per CSV row, columns
//! `source_dialect, target_dialect, pattern_search, pattern_replace`,
//! standard double-quote quoting. Rule order is load order and is
//! semantically significant: earlier rules fire first.
//!
//! The default table ships embedded in the binary and is compiled once
//! into a process-wide cache; [`RuleTable::parse`] accepts replacement
//! tables for tests and embedders.

use std::collections::HashMap;
use std::sync::OnceLock;

use super::pattern::{Pattern, Replacement};
use super::quoting::literal_mask;
use super::TranslateError;
use crate::dialect::Dialect;

/// The replacement-pattern table bundled with the crate.
const EMBEDDED_TABLE: &str = include_str!("../../resources/replacement_patterns.csv");

static DEFAULT_TABLE: OnceLock<RuleTable> = OnceLock::new();

/// The compiled default rule table.
pub fn default_table() -> &'static RuleTable {
    DEFAULT_TABLE.get_or_init(|| {
        RuleTable::parse(EMBEDDED_TABLE).expect("embedded replacement pattern table is malformed")
    })
}

/// A single compiled translation rule.
#[derive(Debug, Clone)]
pub struct Rule {
    search: Pattern,
    replace: Replacement,
}

impl Rule {
    fn compile(search: &str, replace: &str) -> Result<Rule, String> {
        let search = Pattern::compile(search)?;
        let replace = Replacement::compile(replace);
        for name in replace.capture_names() {
            if !search.capture_names().any(|n| n == name) {
                let shown = if name.is_empty() {
                    "@@@".to_string()
                } else {
                    format!("@@@{}", name)
                };
                return Err(format!(
                    "replacement references {} which the search pattern does not capture",
                    shown
                ));
            }
        }
        Ok(Rule { search, replace })
    }

    /// Apply this rule across `sql`: scan left-to-right, substitute each
    /// match, and resume scanning at the end of the substituted text so a
    /// replacement containing its own match cannot loop.
    pub(crate) fn apply(&self, sql: &str) -> String {
        let mut result = sql.to_string();
        let mut pos = 0;
        while pos <= result.len() {
            let mask = literal_mask(&result);
            let Some(m) = self.search.find(&result, &mask, pos) else {
                break;
            };
            let substituted = self.replace.render(&result, &m);
            let next = m.start + substituted.len();
            result.replace_range(m.start..m.end, &substituted);
            // Guarantee forward progress even for degenerate rules.
            pos = next.max(m.start + 1);
        }
        result
    }
}

/// An ordered rule list per target dialect.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: HashMap<Dialect, Vec<Rule>>,
}

impl RuleTable {
    /// A table with no rules: translation through it is the identity
    /// (before the temp-table and hint transforms).
    pub fn empty() -> RuleTable {
        RuleTable::default()
    }

    /// Parse a CSV pattern table.
    ///
    /// The header row is required. Rows whose target dialect is unknown
    /// are skipped (the table format is shared across engine versions with
    /// different dialect sets); rows whose source dialect is unknown are
    /// load errors, as are rows with the wrong column count and patterns
    /// that fail to compile.
    pub fn parse(csv: &str) -> Result<RuleTable, TranslateError> {
        let records = parse_csv(csv)?;
        let mut records = records.into_iter();

        let (header_line, header) = records.next().ok_or(TranslateError::RuleLoad {
            message: "missing header row".to_string(),
            line: 1,
        })?;
        let expected = [
            "source_dialect",
            "target_dialect",
            "pattern_search",
            "pattern_replace",
        ];
        let header_ok = header.len() == expected.len()
            && header
                .iter()
                .zip(expected)
                .all(|(got, want)| got.trim().eq_ignore_ascii_case(want));
        if !header_ok {
            return Err(TranslateError::RuleLoad {
                message: format!("expected header {}", expected.join(",")),
                line: header_line,
            });
        }

        let mut rules: HashMap<Dialect, Vec<Rule>> = HashMap::new();
        for (line, fields) in records {
            if fields.len() != 4 {
                return Err(TranslateError::RuleLoad {
                    message: format!("expected 4 columns, found {}", fields.len()),
                    line,
                });
            }
            let source = Dialect::from_name(&fields[0]).map_err(|_| TranslateError::RuleLoad {
                message: format!("unknown source dialect '{}'", fields[0].trim()),
                line,
            })?;
            // Only rules rooted in the canonical dialect can ever fire.
            if source != Dialect::SqlServer {
                continue;
            }
            let Ok(target) = Dialect::from_name(&fields[1]) else {
                continue;
            };
            let rule = Rule::compile(&fields[2], &fields[3])
                .map_err(|message| TranslateError::RuleLoad { message, line })?;
            rules.entry(target).or_default().push(rule);
        }

        Ok(RuleTable { rules })
    }

    /// The ordered rule list for a target dialect.
    pub(crate) fn rules_for(&self, dialect: Dialect) -> &[Rule] {
        self.rules.get(&dialect).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of loaded rules across all dialects.
    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    /// True if the table holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.values().all(Vec::is_empty)
    }
}

/// Parse CSV text into `(starting line, fields)` records. Quoted fields
/// may contain commas, newlines, and doubled quotes. Blank lines are
/// skipped.
fn parse_csv(text: &str) -> Result<Vec<(usize, Vec<String>)>, TranslateError> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut record_line = 1;
    let mut line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if !field.is_empty() {
                    return Err(TranslateError::RuleLoad {
                        message: "quote inside unquoted field".to_string(),
                        line,
                    });
                }
                loop {
                    match chars.next() {
                        Some('"') => {
                            if chars.peek() == Some(&'"') {
                                chars.next();
                                field.push('"');
                            } else {
                                break;
                            }
                        }
                        Some('\n') => {
                            line += 1;
                            field.push('\n');
                        }
                        Some(other) => field.push(other),
                        None => {
                            return Err(TranslateError::RuleLoad {
                                message: "unterminated quoted field".to_string(),
                                line: record_line,
                            });
                        }
                    }
                }
                match chars.peek() {
                    Some(',') | Some('\n') | Some('\r') | None => {}
                    Some(_) => {
                        return Err(TranslateError::RuleLoad {
                            message: "unexpected character after closing quote".to_string(),
                            line,
                        });
                    }
                }
            }
            ',' => {
                fields.push(std::mem::take(&mut field));
            }
            '\r' => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                let blank = fields.len() == 1 && fields[0].trim().is_empty();
                if !blank {
                    records.push((record_line, std::mem::take(&mut fields)));
                } else {
                    fields.clear();
                }
                line += 1;
                record_line = line;
            }
            other => field.push(other),
        }
    }

    // Final record without a trailing newline.
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        let blank = fields.len() == 1 && fields[0].trim().is_empty();
        if !blank {
            records.push((record_line, fields));
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "source_dialect,target_dialect,pattern_search,pattern_replace\n";

    fn table(rows: &str) -> RuleTable {
        RuleTable::parse(&format!("{}{}", HEADER, rows)).unwrap()
    }

    #[test]
    fn test_parse_simple_table() {
        let t = table("sql server,oracle,GETDATE(),CURRENT_DATE\n");
        assert_eq!(t.len(), 1);
        assert_eq!(t.rules_for(Dialect::Oracle).len(), 1);
        assert!(t.rules_for(Dialect::Sqlite).is_empty());
    }

    #[test]
    fn test_parse_quoted_fields() {
        let t = table(
            "sql server,oracle,\"DATEDIFF(dd,@@@a,@@@b)\",\"(CAST(@@@b AS DATE) - CAST(@@@a AS DATE))\"\n",
        );
        let rule = &t.rules_for(Dialect::Oracle)[0];
        assert_eq!(
            rule.apply("DATEDIFF(dd,a,b)"),
            "(CAST(b AS DATE) - CAST(a AS DATE))"
        );
    }

    #[test]
    fn test_parse_doubled_quotes_in_field() {
        let t = table("sql server,postgresql,\"'x'\",\"'y'\"\n");
        let rule = &t.rules_for(Dialect::PostgreSql)[0];
        assert_eq!(rule.apply("SELECT 'x'"), "SELECT 'y'");
    }

    #[test]
    fn test_rule_order_is_load_order() {
        let t = table(
            "sql server,oracle,A B,first\nsql server,oracle,A,second\n",
        );
        let rules = t.rules_for(Dialect::Oracle);
        // Earlier rule fires first: "A B" never survives to the second.
        let mut sql = "A B".to_string();
        for rule in rules {
            sql = rule.apply(&sql);
        }
        assert_eq!(sql, "first");
    }

    #[test]
    fn test_unknown_target_row_is_ignored() {
        let t = table("sql server,mysql,GETDATE(),NOW()\n");
        assert!(t.is_empty());
    }

    #[test]
    fn test_unknown_source_row_errors() {
        let err =
            RuleTable::parse(&format!("{}{}", HEADER, "ansi,oracle,a,b\n")).unwrap_err();
        assert!(matches!(err, TranslateError::RuleLoad { line: 2, .. }));
    }

    #[test]
    fn test_non_canonical_source_row_is_ignored() {
        let t = table("oracle,postgresql,SYSDATE,CURRENT_DATE\n");
        assert!(t.is_empty());
    }

    #[test]
    fn test_missing_header_errors() {
        let err = RuleTable::parse("sql server,oracle,a,b\n").unwrap_err();
        assert!(matches!(err, TranslateError::RuleLoad { line: 1, .. }));
    }

    #[test]
    fn test_wrong_column_count_errors() {
        let err = RuleTable::parse(&format!("{}{}", HEADER, "sql server,oracle,a\n")).unwrap_err();
        assert!(matches!(err, TranslateError::RuleLoad { line: 2, .. }));
    }

    #[test]
    fn test_unterminated_quote_errors() {
        let err =
            RuleTable::parse(&format!("{}{}", HEADER, "sql server,oracle,\"a,b\n")).unwrap_err();
        assert!(matches!(err, TranslateError::RuleLoad { .. }));
    }

    #[test]
    fn test_bad_replacement_reference_errors() {
        let err = RuleTable::parse(&format!("{}{}", HEADER, "sql server,oracle,LEN(@@@a),@@@b\n"))
            .unwrap_err();
        match err {
            TranslateError::RuleLoad { message, line } => {
                assert_eq!(line, 2);
                assert!(message.contains("@@@b"));
            }
            other => panic!("expected rule load error, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_lines_skipped() {
        let t = RuleTable::parse(&format!(
            "{}\n{}\n\n",
            HEADER.trim_end(),
            "sql server,oracle,GETDATE(),CURRENT_DATE"
        ))
        .unwrap();
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_rule_apply_advances_past_replacement() {
        // The replacement contains its own search pattern; application
        // must not loop.
        let t = table("sql server,oracle,X,XX\n");
        let rule = &t.rules_for(Dialect::Oracle)[0];
        assert_eq!(rule.apply("X and X"), "XX and XX");
    }

    #[test]
    fn test_rule_apply_rewrites_all_occurrences() {
        let t = table("sql server,postgresql,GETDATE(),CURRENT_TIMESTAMP\n");
        let rule = &t.rules_for(Dialect::PostgreSql)[0];
        assert_eq!(
            rule.apply("SELECT GETDATE(), getdate() FROM t"),
            "SELECT CURRENT_TIMESTAMP, CURRENT_TIMESTAMP FROM t"
        );
    }

    #[test]
    fn test_default_table_loads() {
        let t = default_table();
        assert!(!t.is_empty());
        // Every emulation-relevant dialect has at least a handful of rules.
        assert!(!t.rules_for(Dialect::Oracle).is_empty());
        assert!(!t.rules_for(Dialect::PostgreSql).is_empty());
        assert!(!t.rules_for(Dialect::BigQuery).is_empty());
    }
}
