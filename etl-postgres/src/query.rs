use crate::schema::TableName;

/// Builds the statement streaming every row of `table` as one JSON document.
///
/// Rows are rendered by the server with `row_to_json` and cast to text, so the client never
/// decodes column values. `limit` caps the number of rows, otherwise the whole table is read.
pub fn build_select_query(table: &TableName, limit: Option<u64>) -> String {
    let mut query = format!(
        "select row_to_json(t)::text from {} as t",
        table.as_quoted_identifier()
    );

    if let Some(limit) = limit {
        query.push_str(&format!(" limit {limit}"));
    }

    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_unbounded_scan() {
        let table = TableName::parse("public.orders").unwrap();

        assert_eq!(
            build_select_query(&table, None),
            "select row_to_json(t)::text from public.orders as t"
        );
    }

    #[test]
    fn builds_limited_scan_with_quoted_identifier() {
        let table = TableName::parse("Orders").unwrap();

        assert_eq!(
            build_select_query(&table, Some(50)),
            r#"select row_to_json(t)::text from "Orders" as t limit 50"#
        );
    }
}
