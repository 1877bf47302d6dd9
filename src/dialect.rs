//! Target dialect registry.
//!
//! The engine accepts one canonical input dialect (a SQL-Server-flavored
//! superset) and translates to the fixed set of targets below. Most
//! dialect-specific behavior lives in the replacement pattern table; the
//! enum carries only the properties the built-in transforms need:
//!
//! - whether the dialect lacks true session-local temp tables and needs
//!   `#name` references emulated,
//! - identifier length limits for the emulated names,
//! - whether MPP distribution/sort hints apply.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::translate::TranslateError;

/// A supported target dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// The canonical input dialect; translation to it is the identity.
    #[serde(rename = "sql server")]
    SqlServer,
    #[serde(rename = "oracle")]
    Oracle,
    #[serde(rename = "postgresql")]
    PostgreSql,
    #[serde(rename = "redshift")]
    Redshift,
    #[serde(rename = "pdw")]
    Pdw,
    #[serde(rename = "impala")]
    Impala,
    #[serde(rename = "netezza")]
    Netezza,
    #[serde(rename = "bigquery")]
    BigQuery,
    #[serde(rename = "snowflake")]
    Snowflake,
    #[serde(rename = "synapse")]
    Synapse,
    #[serde(rename = "spark")]
    Spark,
    #[serde(rename = "sqlite")]
    Sqlite,
    #[serde(rename = "sqlite extended")]
    SqliteExtended,
    #[serde(rename = "iris")]
    Iris,
}

impl Dialect {
    /// Every supported dialect, in declaration order.
    pub const ALL: [Dialect; 14] = [
        Dialect::SqlServer,
        Dialect::Oracle,
        Dialect::PostgreSql,
        Dialect::Redshift,
        Dialect::Pdw,
        Dialect::Impala,
        Dialect::Netezza,
        Dialect::BigQuery,
        Dialect::Snowflake,
        Dialect::Synapse,
        Dialect::Spark,
        Dialect::Sqlite,
        Dialect::SqliteExtended,
        Dialect::Iris,
    ];

    /// Canonical lowercase name, as used in the pattern table.
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::SqlServer => "sql server",
            Dialect::Oracle => "oracle",
            Dialect::PostgreSql => "postgresql",
            Dialect::Redshift => "redshift",
            Dialect::Pdw => "pdw",
            Dialect::Impala => "impala",
            Dialect::Netezza => "netezza",
            Dialect::BigQuery => "bigquery",
            Dialect::Snowflake => "snowflake",
            Dialect::Synapse => "synapse",
            Dialect::Spark => "spark",
            Dialect::Sqlite => "sqlite",
            Dialect::SqliteExtended => "sqlite extended",
            Dialect::Iris => "iris",
        }
    }

    /// Parse a dialect name (case-insensitive, surrounding whitespace
    /// ignored). `postgres` is accepted as a shorthand for `postgresql`.
    pub fn from_name(name: &str) -> Result<Dialect, TranslateError> {
        let normalized = name.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "sql server" => Ok(Dialect::SqlServer),
            "oracle" => Ok(Dialect::Oracle),
            "postgresql" | "postgres" => Ok(Dialect::PostgreSql),
            "redshift" => Ok(Dialect::Redshift),
            "pdw" => Ok(Dialect::Pdw),
            "impala" => Ok(Dialect::Impala),
            "netezza" => Ok(Dialect::Netezza),
            "bigquery" => Ok(Dialect::BigQuery),
            "snowflake" => Ok(Dialect::Snowflake),
            "synapse" => Ok(Dialect::Synapse),
            "spark" => Ok(Dialect::Spark),
            "sqlite" => Ok(Dialect::Sqlite),
            "sqlite extended" => Ok(Dialect::SqliteExtended),
            "iris" => Ok(Dialect::Iris),
            _ => Err(TranslateError::UnknownDialect(name.trim().to_string())),
        }
    }

    /// Whether `#name` temp-table references must be rewritten into
    /// schema-qualified, session-salted names for this dialect.
    pub fn requires_temp_table_emulation(&self) -> bool {
        matches!(
            self,
            Dialect::Oracle
                | Dialect::BigQuery
                | Dialect::Impala
                | Dialect::Spark
                | Dialect::Snowflake
        )
    }

    /// Maximum length of the `name` part of a `#name` reference under
    /// emulation. Oracle's 30-character unquoted-identifier limit leaves 22
    /// characters once the salt and separator are accounted for; everyone
    /// else gets the conventional 128-character budget.
    pub fn max_temp_name_len(&self) -> usize {
        match self {
            Dialect::Oracle => 22,
            _ => 119,
        }
    }

    /// Whether `--HINT DISTRIBUTE_ON_KEY` / `--HINT SORT_ON_KEY` comments
    /// rewrite the following statement for this dialect.
    pub fn supports_mpp_hints(&self) -> bool {
        matches!(self, Dialect::Pdw | Dialect::Synapse | Dialect::Redshift)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Dialect {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dialect::from_name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for dialect in Dialect::ALL {
            assert_eq!(Dialect::from_name(dialect.name()).unwrap(), dialect);
        }
    }

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(Dialect::from_name("Oracle").unwrap(), Dialect::Oracle);
        assert_eq!(Dialect::from_name("SQL Server").unwrap(), Dialect::SqlServer);
        assert_eq!(
            Dialect::from_name("  BigQuery  ").unwrap(),
            Dialect::BigQuery
        );
    }

    #[test]
    fn test_postgres_shorthand() {
        assert_eq!(Dialect::from_name("postgres").unwrap(), Dialect::PostgreSql);
    }

    #[test]
    fn test_unknown_dialect_errors() {
        let err = Dialect::from_name("mysql").unwrap_err();
        assert_eq!(err, TranslateError::UnknownDialect("mysql".to_string()));
    }

    #[test]
    fn test_display_matches_name() {
        assert_eq!(Dialect::SqliteExtended.to_string(), "sqlite extended");
        assert_eq!(Dialect::PostgreSql.to_string(), "postgresql");
    }

    #[test]
    fn test_temp_emulation_dialects() {
        assert!(Dialect::Oracle.requires_temp_table_emulation());
        assert!(Dialect::BigQuery.requires_temp_table_emulation());
        assert!(Dialect::Impala.requires_temp_table_emulation());
        assert!(Dialect::Spark.requires_temp_table_emulation());
        assert!(Dialect::Snowflake.requires_temp_table_emulation());
        assert!(!Dialect::SqlServer.requires_temp_table_emulation());
        assert!(!Dialect::PostgreSql.requires_temp_table_emulation());
        assert!(!Dialect::Redshift.requires_temp_table_emulation());
    }

    #[test]
    fn test_mpp_hint_dialects() {
        assert!(Dialect::Pdw.supports_mpp_hints());
        assert!(Dialect::Synapse.supports_mpp_hints());
        assert!(Dialect::Redshift.supports_mpp_hints());
        assert!(!Dialect::Oracle.supports_mpp_hints());
        assert!(!Dialect::SqlServer.supports_mpp_hints());
    }

    #[test]
    fn test_oracle_temp_name_budget() {
        assert_eq!(Dialect::Oracle.max_temp_name_len(), 22);
        assert!(Dialect::Snowflake.max_temp_name_len() > 22);
    }
}
