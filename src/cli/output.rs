//! Text rendering of session responses.

use crate::core::{Action, Response};
use crate::domain::Item;

const TITLE_WIDTH: usize = 32;
const AUTHOR_WIDTH: usize = 22;

/// Message for any response. Item lists render as a table, or as a
/// "no results" line when empty.
pub fn describe(response: &Response) -> String {
    match response {
        Response::Added(item) => format!("Item added: {}", item),
        Response::DuplicateKey { key } => {
            format!("Item with key '{}' already exists. Not added.", key)
        }
        Response::Issued(item) => format!("Item issued: {} (Status: ISSUED)", item.title()),
        Response::Returned(item) => {
            format!("Item returned: {} (Status: AVAILABLE)", item.title())
        }
        Response::NotFound { key, action } => {
            format!("Cannot {}: no item with key '{}'.", action.as_str(), key)
        }
        Response::AlreadyInState { item, action } => format!(
            "Cannot {}: '{}' is already {}.",
            action.as_str(),
            item.title(),
            item.status()
        ),
        Response::Items(items) if items.is_empty() => {
            "No items found matching your search.".to_string()
        }
        Response::Items(items) => render_table(items),
        Response::InvalidInput { reason } => format!("Invalid input: {}", reason),
        Response::Closed => "Goodbye.".to_string(),
    }
}

/// Listing of the whole catalog
pub fn describe_listing(items: &[Item]) -> String {
    if items.is_empty() {
        "The catalog is currently empty.".to_string()
    } else {
        format!("{}\n\nTotal: {} items", render_table(items), items.len())
    }
}

/// Whether the response means the request did not do what was asked
pub fn is_failure(response: &Response) -> bool {
    matches!(
        response,
        Response::DuplicateKey { .. }
            | Response::NotFound { .. }
            | Response::AlreadyInState { .. }
            | Response::InvalidInput { .. }
    )
}

/// One-line label for an action, used in prompts
pub fn action_label(action: Action) -> &'static str {
    match action {
        Action::Issue => "Issue Item",
        Action::Return => "Return Item",
    }
}

fn render_table(items: &[Item]) -> String {
    let mut lines = Vec::with_capacity(items.len() + 2);
    lines.push(format!(
        "{:<16} {:<10} {:<width_t$} {:<width_a$}",
        "KEY",
        "STATUS",
        "TITLE",
        "AUTHOR",
        width_t = TITLE_WIDTH,
        width_a = AUTHOR_WIDTH
    ));
    lines.push("-".repeat(16 + 10 + TITLE_WIDTH + AUTHOR_WIDTH + 3));

    for item in items {
        lines.push(format!(
            "{:<16} {:<10} {:<width_t$} {:<width_a$}",
            item.key(),
            item.status().as_str(),
            truncate(item.title(), TITLE_WIDTH),
            truncate(item.author(), AUTHOR_WIDTH),
            width_t = TITLE_WIDTH,
            width_a = AUTHOR_WIDTH
        ));
    }

    lines.join("\n")
}

/// Shorten to `width` characters, marking the cut with "..."
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemStatus;

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Les Misérables et cetera", 10), "Les Mis...");
    }

    #[test]
    fn test_describe_distinguishes_failures() {
        let item = Item::new("ISBN1", "Dune", "Herbert").with_status(ItemStatus::Issued);

        let not_found = Response::NotFound {
            key: "X".to_string(),
            action: Action::Issue,
        };
        let already = Response::AlreadyInState {
            item,
            action: Action::Issue,
        };

        assert_eq!(describe(&not_found), "Cannot issue: no item with key 'X'.");
        assert_eq!(describe(&already), "Cannot issue: 'Dune' is already issued.");
        assert!(is_failure(&not_found));
        assert!(is_failure(&already));
    }

    #[test]
    fn test_table_lists_every_item() {
        let items = vec![
            Item::new("ISBN1", "Dune", "Herbert"),
            Item::new("ISBN2", "Emma", "Austen"),
        ];
        let text = describe(&Response::Items(items.clone()));

        assert!(text.starts_with("KEY"));
        assert!(text.contains("ISBN1"));
        assert!(text.contains("Austen"));
        assert!(describe_listing(&items).ends_with("Total: 2 items"));
        assert_eq!(describe_listing(&[]), "The catalog is currently empty.");
    }
}
