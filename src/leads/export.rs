use time::format_description::well_known::Rfc3339;

use super::repo::Lead;

/// RFC 4180-style field escaping: quote when the value contains a
/// comma, quote, or newline; double embedded quotes.
fn escape_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn leads_to_csv(leads: &[Lead]) -> String {
    let mut out = String::from("id,full_name,mobile,email,city,income,consent,created_at\n");
    for lead in leads {
        let created = lead
            .created_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| lead.created_at.to_string());
        let row = [
            lead.id.to_string(),
            escape_field(&lead.full_name),
            escape_field(&lead.mobile),
            escape_field(lead.email.as_deref().unwrap_or("")),
            escape_field(lead.city.as_deref().unwrap_or("")),
            escape_field(lead.income.as_deref().unwrap_or("")),
            lead.consent.to_string(),
            created,
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn lead(name: &str, city: Option<&str>) -> Lead {
        Lead {
            id: Uuid::nil(),
            full_name: name.to_string(),
            mobile: "9999999999".into(),
            email: Some("x@example.com".into()),
            city: city.map(str::to_string),
            income: None,
            consent: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn plain_fields_pass_through() {
        assert_eq!(escape_field("Mumbai"), "Mumbai");
    }

    #[test]
    fn commas_and_quotes_are_escaped() {
        assert_eq!(escape_field("Pune, MH"), "\"Pune, MH\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn csv_has_header_and_one_row_per_lead() {
        let csv = leads_to_csv(&[lead("A B", None), lead("C, D", Some("Pune"))]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,full_name,mobile"));
        assert!(lines[2].contains("\"C, D\""));
    }

    #[test]
    fn missing_optionals_become_empty_fields() {
        let csv = leads_to_csv(&[lead("A", None)]);
        assert!(csv.lines().nth(1).unwrap().contains(",,"));
    }
}
