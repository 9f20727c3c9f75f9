//! Table output formatting for CLI commands.
//!
//! Renders student lists, single-record details, and validation errors
//! using comfy-table.

use comfy_table::{presets, Attribute, Cell, ContentArrangement, Table};

use crate::api::FieldErrors;
use crate::models::Student;
use crate::pagination::Pager;

/// Format a page of students as a table.
pub fn student_table(students: &[Student]) -> String {
    let mut table = base_table();

    table.set_header(vec![
        Cell::new("ID").add_attribute(Attribute::Bold),
        Cell::new("Name").add_attribute(Attribute::Bold),
        Cell::new("Email").add_attribute(Attribute::Bold),
        Cell::new("Gender").add_attribute(Attribute::Bold),
        Cell::new("Country").add_attribute(Attribute::Bold),
        Cell::new("BTC Address").add_attribute(Attribute::Bold),
    ]);

    for student in students {
        table.add_row(vec![
            Cell::new(student.id.to_string()),
            Cell::new(student.full_name()),
            Cell::new(&student.email),
            Cell::new(student.gender.as_str()),
            Cell::new(&student.country),
            Cell::new(truncate_text(&student.btc_address, 20)),
        ]);
    }

    table.to_string()
}

/// Format a single student as a field/value table.
pub fn student_detail(student: &Student) -> String {
    let mut table = base_table();

    table.set_header(vec![
        Cell::new("Field").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);

    table.add_row(vec!["ID", &student.id.to_string()]);
    table.add_row(vec!["First Name", &student.first_name]);
    table.add_row(vec!["Last Name", &student.last_name]);
    table.add_row(vec!["Email", &student.email]);
    table.add_row(vec!["Gender", student.gender.as_str()]);
    table.add_row(vec!["Country", &student.country]);
    table.add_row(vec!["Avatar", &student.avatar]);
    table.add_row(vec!["BTC Address", &student.btc_address]);

    table.to_string()
}

/// Format validation errors, one row per rejected field.
pub fn field_errors_table(errors: &FieldErrors) -> String {
    let mut table = base_table();

    table.set_header(vec![
        Cell::new("Field").add_attribute(Attribute::Bold),
        Cell::new("Problem").add_attribute(Attribute::Bold),
    ]);

    for (field, message) in errors.iter() {
        table.add_row(vec![field, message]);
    }

    table.to_string()
}

/// One-line pager summary: the current page bracketed, with `<` and `>`
/// markers when a previous or next page exists.
pub fn pager_line(pager: &Pager) -> String {
    if pager.total_pages == 0 {
        return "No pages".to_string();
    }

    let mut parts = Vec::new();
    if pager.prev().is_some() {
        parts.push("<".to_string());
    }
    for link in pager.links() {
        if link.active {
            parts.push(format!("[{}]", link.page));
        } else {
            parts.push(link.page.to_string());
        }
    }
    if pager.next().is_some() {
        parts.push(">".to_string());
    }

    format!(
        "Page {} of {}: {}",
        pager.current,
        pager.total_pages,
        parts.join(" ")
    )
}

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Truncate text to max length with ellipsis.
fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;
    use crate::models::StudentField;

    #[test]
    fn test_student_table_lists_every_row() {
        let students = vec![
            MemoryBackend::sample_student(1),
            MemoryBackend::sample_student(2),
        ];
        let output = student_table(&students);
        assert!(output.contains("Student1 Example"));
        assert!(output.contains("student2@example.com"));
        assert!(output.contains("Country"));
    }

    #[test]
    fn test_student_detail_shows_all_fields() {
        let output = student_detail(&MemoryBackend::sample_student(9));
        for field in ["First Name", "Email", "Avatar", "BTC Address"] {
            assert!(output.contains(field), "missing {}", field);
        }
        assert!(output.contains("Norway"));
    }

    #[test]
    fn test_field_errors_table_rows() {
        let errors: FieldErrors = [(
            StudentField::Email.as_str().to_string(),
            "Email is invalid".to_string(),
        )]
        .into_iter()
        .collect();
        let output = field_errors_table(&errors);
        assert!(output.contains("email"));
        assert!(output.contains("Email is invalid"));
    }

    #[test]
    fn test_pager_line_brackets_current_page() {
        let middle = Pager {
            current: 2,
            total_pages: 3,
        };
        assert_eq!(pager_line(&middle), "Page 2 of 3: < 1 [2] 3 >");

        let first = Pager {
            current: 1,
            total_pages: 3,
        };
        assert_eq!(pager_line(&first), "Page 1 of 3: [1] 2 3 >");

        let last = Pager {
            current: 3,
            total_pages: 3,
        };
        assert_eq!(pager_line(&last), "Page 3 of 3: < 1 2 [3]");

        let only = Pager {
            current: 1,
            total_pages: 1,
        };
        assert_eq!(pager_line(&only), "Page 1 of 1: [1]");

        let empty = Pager {
            current: 1,
            total_pages: 0,
        };
        assert_eq!(pager_line(&empty), "No pages");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("this is a very long text", 10), "this is...");
        assert_eq!(truncate_text("exactly10!", 10), "exactly10!");
    }
}
