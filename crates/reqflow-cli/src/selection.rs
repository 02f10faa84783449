//! Filter arguments to [`FilterExpr`]

use anyhow::{bail, Result};
use clap::ArgMatches;
use reqflow_index::FilterExpr;

/// Split `field=value`
///
/// # Errors
/// Returns error when `=` is missing or the field name is empty
pub fn parse_pair(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.to_string()))
        }
        _ => bail!("expected FIELD=VALUE, got {raw:?}"),
    }
}

/// Conditions given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// `--eq` conditions
    pub exact: Vec<(String, String)>,
    /// `--prefix` conditions
    pub prefix: Vec<(String, String)>,
    /// `--contains` conditions
    pub contains: Vec<(String, String)>,
    /// Combine with OR instead of AND
    pub any: bool,
}

impl Selection {
    /// Read filter arguments from parsed matches
    ///
    /// # Errors
    /// Returns error on a malformed `FIELD=VALUE` pair
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let pairs = |name: &str| -> Result<Vec<(String, String)>> {
            matches
                .get_many::<String>(name)
                .into_iter()
                .flatten()
                .map(|raw| parse_pair(raw))
                .collect()
        };

        Ok(Self {
            exact: pairs("eq")?,
            prefix: pairs("prefix")?,
            contains: pairs("contains")?,
            any: matches.get_flag("any"),
        })
    }

    /// Combined filter, `None` when no condition was given
    #[must_use]
    pub fn to_filter(&self) -> Option<FilterExpr> {
        let mut conditions: Vec<FilterExpr> = Vec::new();
        conditions.extend(self.exact.iter().map(|(f, v)| FilterExpr::equals(f, v)));
        conditions.extend(self.prefix.iter().map(|(f, v)| FilterExpr::prefix(f, v)));
        conditions.extend(self.contains.iter().map(|(f, v)| FilterExpr::contains(f, v)));

        match conditions.len() {
            0 => None,
            1 => conditions.pop(),
            _ if self.any => Some(FilterExpr::Or(conditions)),
            _ => Some(FilterExpr::And(conditions)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pair_parsing() {
        assert_eq!(
            parse_pair("plannedVersion=v1.2").unwrap(),
            ("plannedVersion".to_string(), "v1.2".to_string())
        );
        assert_eq!(
            parse_pair("title=a=b").unwrap(),
            ("title".to_string(), "a=b".to_string())
        );
        assert!(parse_pair("title").is_err());
        assert!(parse_pair("=x").is_err());
    }

    #[test]
    fn conditions_combine() {
        let mut selection = Selection {
            exact: vec![("status".into(), "open".into())],
            prefix: vec![("title".into(), "hello".into())],
            ..Selection::default()
        };
        assert_eq!(
            selection.to_filter(),
            Some(FilterExpr::And(vec![
                FilterExpr::equals("status", "open"),
                FilterExpr::prefix("title", "hello"),
            ]))
        );

        selection.any = true;
        assert!(matches!(selection.to_filter(), Some(FilterExpr::Or(_))));
        assert_eq!(Selection::default().to_filter(), None);
    }
}
