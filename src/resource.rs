use std::str::FromStr;

use crate::error::DescribeError;
use crate::report::EntityKind;

const PREFIX: &str = "postgres://database/";

/// An addressable structural snapshot:
/// `postgres://database/{database}/tables` or `postgres://database/{database}/views`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub database: String,
    pub kind: EntityKind,
}

impl Resource {
    pub fn uri(&self) -> String {
        let database: String =
            percent_encoding::utf8_percent_encode(&self.database, percent_encoding::NON_ALPHANUMERIC)
                .collect();
        format!("{PREFIX}{database}/{}", self.kind.plural())
    }
}

impl FromStr for Resource {
    type Err = DescribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DescribeError::InvalidResource(s.to_string());

        let rest = s.strip_prefix(PREFIX).ok_or_else(invalid)?;
        let (database, kind) = rest.rsplit_once('/').ok_or_else(invalid)?;
        let kind = match kind {
            "tables" => EntityKind::Table,
            "views" => EntityKind::View,
            _ => return Err(invalid()),
        };
        if database.is_empty() || database.contains('/') {
            return Err(invalid());
        }

        let database = percent_encoding::percent_decode_str(database)
            .decode_utf8()
            .map_err(|_| invalid())?
            .into_owned();
        Ok(Resource { database, kind })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resources() {
        let tables: Resource = "postgres://database/shop/tables".parse().unwrap();
        assert_eq!(tables.database, "shop");
        assert_eq!(tables.kind, EntityKind::Table);

        let views: Resource = "postgres://database/my%20shop/views".parse().unwrap();
        assert_eq!(views.database, "my shop");
        assert_eq!(views.kind, EntityKind::View);
        assert_eq!(views.uri(), "postgres://database/my%20shop/views");
    }

    #[test]
    fn test_invalid_resources() {
        for uri in [
            "postgres://database/shop",
            "postgres://database//tables",
            "postgres://database/shop/indexes",
            "postgres://database/a/b/tables",
            "mysql://database/shop/tables",
        ] {
            assert!(
                matches!(uri.parse::<Resource>(), Err(DescribeError::InvalidResource(_))),
                "{uri} should be rejected"
            );
        }
    }
}
