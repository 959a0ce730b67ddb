use serde::de::DeserializeOwned;

/// Parse an UPPERCASE enum value using serde-deserialization.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let normalized = raw.trim().to_ascii_uppercase();
    serde_json::from_value(serde_json::Value::String(normalized))
        .map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}

#[cfg(test)]
mod tests {
    use rowlog_core::Operation;

    use super::parse_enum;

    #[test]
    fn parses_any_case() {
        let op: Operation = parse_enum("delete", "operation").expect("operation should parse");
        assert_eq!(op, Operation::Delete);
        let op: Operation = parse_enum("UPDATE", "operation").expect("operation should parse");
        assert_eq!(op, Operation::Update);
    }

    #[test]
    fn rejects_unknown_value() {
        let err = parse_enum::<Operation>("upsert", "operation").unwrap_err();
        assert!(err.to_string().contains("invalid operation 'upsert'"));
    }
}
