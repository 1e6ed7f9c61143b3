/// "N min read" at 200 words per minute, rounded up, never below one
/// minute.
pub fn calculate_read_time(content: &str) -> String {
    let words = content.split_whitespace().count();
    let minutes = (words + 199) / 200;
    format!("{} min read", minutes.max(1))
}

/// Tags arrive either as an array or as one comma-separated string;
/// normalize to trimmed, non-empty entries.
pub fn normalize_tags(raw: &serde_json::Value) -> Vec<String> {
    match raw {
        serde_json::Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_content_is_one_minute() {
        assert_eq!(calculate_read_time(""), "1 min read");
        assert_eq!(calculate_read_time("   "), "1 min read");
    }

    #[test]
    fn read_time_rounds_up() {
        let two_hundred_one = vec!["word"; 201].join(" ");
        assert_eq!(calculate_read_time(&two_hundred_one), "2 min read");
        let exactly_two_hundred = vec!["word"; 200].join(" ");
        assert_eq!(calculate_read_time(&exactly_two_hundred), "1 min read");
    }

    #[test]
    fn tags_parse_from_comma_string() {
        assert_eq!(
            normalize_tags(&json!("emi, loans , ,budget")),
            vec!["emi", "loans", "budget"]
        );
    }

    #[test]
    fn tags_parse_from_array() {
        assert_eq!(
            normalize_tags(&json!(["sip", " mutual funds "])),
            vec!["sip", "mutual funds"]
        );
    }

    #[test]
    fn other_shapes_yield_no_tags() {
        assert!(normalize_tags(&json!(42)).is_empty());
        assert!(normalize_tags(&json!(null)).is_empty());
    }
}
