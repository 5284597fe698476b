//! HTML parsing for the course directory pages.

use crate::directory::StudentRef;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

// Static selectors for parsing - compiled once
static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static ROW_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static COURSE_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-([A-Z0-9]+)\.").unwrap());
static STUDENT_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b[a-z]{2,3}[0-9]{2}[0-9a-z]*\b").unwrap());

/// Shortest token accepted as a student identifier.
const MIN_ID_LEN: usize = 5;

/// A course page reduced to its course code and listed students.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoursePage {
    pub course_code: String,
    pub students: Vec<StudentRef>,
}

/// Course page links on the index page for one semester.
///
/// Keeps hrefs that start with `prefix` (e.g. `"2502-"`) and end in
/// `.shtml` or `.html`, in page order without repeats.
pub fn extract_course_links(html: &str, prefix: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();

    document
        .select(&LINK_SELECTOR)
        .filter_map(|link| link.value().attr("href"))
        .filter(|href| href.starts_with(prefix))
        .filter(|href| href.ends_with(".shtml") || href.ends_with(".html"))
        .filter(|href| seen.insert(href.to_string()))
        .map(str::to_string)
        .collect()
}

/// Course code from a link such as `2502-COL106.shtml`.
pub fn course_code_from_link(link: &str) -> Option<String> {
    COURSE_CODE_REGEX
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extracts the students listed on a course page.
///
/// Every identifier-shaped token in the page text counts, lowercased and
/// de-duplicated. Table rows whose first cell is an identifier supply the
/// student's name from the second cell.
pub fn parse_course_page(course_code: &str, html: &str) -> CoursePage {
    let document = Html::parse_document(html);
    let mut students: Vec<StudentRef> = Vec::new();
    let mut index = std::collections::HashMap::new();

    for row in document.select(&ROW_SELECTOR) {
        let cells: Vec<String> = row
            .select(&CELL_SELECTOR)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect();
        let [first, second, ..] = cells.as_slice() else {
            continue;
        };
        if let Some(id) = as_student_id(first) {
            if !index.contains_key(&id) {
                index.insert(id.clone(), students.len());
                students.push(StudentRef {
                    id,
                    name: second.clone(),
                });
            }
        }
    }

    let text = document.root_element().text().collect::<Vec<_>>().join(" ");
    for m in STUDENT_ID_REGEX.find_iter(&text) {
        let id = m.as_str().to_lowercase();
        if id.len() >= MIN_ID_LEN && !index.contains_key(&id) {
            index.insert(id.clone(), students.len());
            students.push(StudentRef {
                id,
                name: String::new(),
            });
        }
    }

    CoursePage {
        course_code: course_code.to_string(),
        students,
    }
}

/// The cell text as a lowercase identifier, if the whole cell is one.
fn as_student_id(cell: &str) -> Option<String> {
    let m = STUDENT_ID_REGEX.find(cell)?;
    (m.start() == 0 && m.end() == cell.len() && cell.len() >= MIN_ID_LEN)
        .then(|| cell.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_course_links() {
        let html = r#"
            <html><body>
              <a href="2502-COL106.shtml">COL106</a>
              <a href="2502-MTL100.html">MTL100</a>
              <a href="2502-COL106.shtml">again</a>
              <a href="2401-COL106.shtml">old</a>
              <a href="2502-notes.pdf">pdf</a>
              <a>no href</a>
            </body></html>
        "#;
        assert_eq!(
            extract_course_links(html, "2502-"),
            vec!["2502-COL106.shtml", "2502-MTL100.html"]
        );
    }

    #[test]
    fn test_course_code_from_link() {
        assert_eq!(
            course_code_from_link("2502-COL106.shtml"),
            Some("COL106".to_string())
        );
        assert_eq!(course_code_from_link("2502-col106.shtml"), None);
        assert_eq!(course_code_from_link("index.html"), None);
    }

    #[test]
    fn test_parse_course_page_names_and_loose_ids() {
        let html = r#"
            <html><body>
              <h1>COL106 students</h1>
              <table>
                <tr><th>Kerberos</th><th>Name</th></tr>
                <tr><td>CS1230456</td><td>Asha Rao</td></tr>
                <tr><td>ee1230001</td><td>Vikram Sen</td></tr>
              </table>
              <p>Also enrolled: mt6190123, cs1230456, ab12</p>
            </body></html>
        "#;
        let page = parse_course_page("COL106", html);
        let ids: Vec<_> = page.students.iter().map(|s| s.id.as_str()).collect();

        assert!(ids.contains(&"cs1230456"));
        assert!(ids.contains(&"ee1230001"));
        assert!(ids.contains(&"mt6190123"));
        assert!(!ids.contains(&"ab12"));
        assert_eq!(ids.iter().filter(|id| **id == "cs1230456").count(), 1);
        assert_eq!(page.students[0].name, "Asha Rao");
        assert_eq!(
            page.students
                .iter()
                .find(|s| s.id == "mt6190123")
                .map(|s| s.name.as_str()),
            Some("")
        );
    }
}
