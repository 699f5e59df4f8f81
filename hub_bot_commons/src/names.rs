use std::fmt::Write;

/// Tries to print a person in the prettiest way possible: `@username` if
/// there is one, otherwise their full name, optionally with their ID.
///
/// Names are not HTML-escaped; escape the result if it goes into an HTML
/// message.
#[must_use]
pub fn person_prettyprint(
    username: Option<&str>,
    first_name: Option<&str>,
    last_name: Option<&str>,
    id: Option<i64>,
) -> String {
    let mut name = match (username, first_name) {
        (Some(username), _) if !username.is_empty() => format!("@{username}"),
        (_, Some(first_name)) if !first_name.is_empty() => {
            let mut full_name = first_name.to_string();
            if let Some(last_name) = last_name.filter(|x| !x.is_empty()) {
                full_name.push(' ');
                full_name.push_str(last_name);
            }
            full_name
        }
        // Shouldn't happen, but eh.
        _ => "a nameless user".to_string(),
    };

    if let Some(id) = id {
        write!(name, " (userid {id})").expect("Writing to a String never fails");
    }

    name
}
