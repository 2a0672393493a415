use std::collections::HashMap;

/// Substitutes `{{name}}` placeholders in `content` with the values in
/// `variables`.
///
/// Substitution is deliberately permissive: a placeholder with no matching
/// variable is left verbatim in the output rather than treated as an error,
/// and variables that match nothing are ignored. Rendering the same input
/// twice yields identical output.
pub fn render(content: &str, variables: &HashMap<String, String>) -> String {
    let mut rendered = content.to_string();
    for (name, value) in variables {
        rendered = rendered.replace(&format!("{{{{{name}}}}}"), value);
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_named_placeholders() {
        let out = render(
            "{{service}} on {{host}} is {{status}}",
            &vars(&[("service", "api"), ("host", "web-1"), ("status", "down")]),
        );
        assert_eq!(out, "api on web-1 is down");
    }

    #[test]
    fn unmatched_placeholders_pass_through() {
        let out = render("{{service}} is {{status}}", &vars(&[("service", "api")]));
        assert_eq!(out, "api is {{status}}");
    }

    #[test]
    fn repeated_placeholder_is_replaced_everywhere() {
        let out = render("{{x}} and {{x}}", &vars(&[("x", "1")]));
        assert_eq!(out, "1 and 1");
    }

    #[test]
    fn rendering_is_idempotent() {
        let variables = vars(&[("service", "api")]);
        let once = render("{{service}} is {{status}}", &variables);
        let twice = render(&once, &variables);
        assert_eq!(once, twice);
    }

    #[test]
    fn no_variables_leaves_content_unchanged() {
        let out = render("plain message", &HashMap::new());
        assert_eq!(out, "plain message");
    }
}
