use scraper::{ElementRef, Html, Selector};

use crate::models::{GradeRecord, DEFAULT_WEIGHT};

// The register marks grade rows with this attribute and sticks the weight,
// when there is one, in a small badge inside the grade cell.
const GRADE_ROW_SELECTOR: &str = r#"tr[data-tipo="voto"]"#;
const WEIGHT_BADGE_SELECTOR: &str = "div.margin-top-small.small.border.round.padding-xsmall";

// Whether the portal answered with its login page, which is how it signals
// both rejected credentials and an expired session.
pub fn is_login_page(html: &str) -> bool {
    page_title(html).contains("Login")
}

pub fn page_title(html: &str) -> String {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").unwrap();
    document
        .select(&selector)
        .next()
        .map(|title| title.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

// Reads the value of a hidden input by name; the portal embeds the session
// markers this way in the post-login page.
pub fn hidden_input(html: &str, name: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(&format!(r#"input[name="{name}"]"#)).unwrap();
    document
        .select(&selector)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(str::to_string)
}

// Extracts every well-formed grade row from the grades page. The register
// lists grades newest first; the returned records are oldest first. A row
// missing a numeric grade or a subject is skipped on its own, a malformed row
// must never lose the rest of the page.
pub fn parse_grades(html: &str) -> Vec<GradeRecord> {
    let document = Html::parse_document(html);
    let row_selector = Selector::parse(GRADE_ROW_SELECTOR).unwrap();
    let cell_selector = Selector::parse("td").unwrap();
    let strong_selector = Selector::parse("strong").unwrap();
    let badge_selector = Selector::parse(WEIGHT_BADGE_SELECTOR).unwrap();

    let mut records = Vec::new();
    for row in document.select(&row_selector) {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        // Summary rows carry fewer cells than real grade rows.
        if cells.len() < 3 {
            continue;
        }
        let value = match cells[0].select(&strong_selector).next() {
            Some(strong) => match strong.text().collect::<String>().trim().parse::<f64>() {
                Ok(value) => value,
                Err(_) => continue,
            },
            None => continue,
        };
        let subject = match cells[2].select(&strong_selector).next() {
            Some(strong) => strong.text().collect::<String>().trim().to_string(),
            None => continue,
        };
        if subject.is_empty() {
            continue;
        }
        let weight = cells[0]
            .select(&badge_selector)
            .next()
            .map(|badge| badge_weight(&badge.text().collect::<String>()))
            .unwrap_or(DEFAULT_WEIGHT);
        records.push(GradeRecord {
            value,
            subject,
            weight,
        });
    }
    records.reverse();
    records
}

// "peso 50%" -> 50. A badge without digits falls back to the default weight
// rather than failing the row.
fn badge_weight(text: &str) -> u32 {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        DEFAULT_WEIGHT
    } else {
        digits.parse().unwrap_or(DEFAULT_WEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade_row(value: &str, subject: &str, badge: Option<&str>) -> String {
        let badge = badge
            .map(|text| {
                format!(
                    r#"<div class="margin-top-small small border round padding-xsmall">{text}</div>"#
                )
            })
            .unwrap_or_default();
        format!(
            r#"<tr data-tipo="voto"><td><strong>{value}</strong>{badge}</td><td>12/03/2024</td><td><strong>{subject}</strong></td></tr>"#
        )
    }

    fn grades_page(rows: &[String]) -> String {
        format!(
            "<html><head><title>Registro Famiglie</title></head><body><table>{}</table></body></html>",
            rows.join("")
        )
    }

    #[test]
    fn returns_records_oldest_first() {
        let page = grades_page(&[
            grade_row("8", "Storia", None),
            grade_row("7", "Matematica", None),
            grade_row("6.5", "Inglese", None),
        ]);
        let records = parse_grades(&page);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].subject, "Inglese");
        assert_eq!(records[2].subject, "Storia");
        assert_eq!(records[2].value, 8.0);
    }

    #[test]
    fn parses_value_subject_and_weight_badge() {
        let page = grades_page(&[grade_row("7.5", "Matematica", Some("peso 80%"))]);
        let records = parse_grades(&page);
        assert_eq!(
            records,
            vec![GradeRecord {
                value: 7.5,
                subject: "Matematica".to_string(),
                weight: 80,
            }]
        );
    }

    #[test]
    fn weight_defaults_to_100_without_badge() {
        let page = grades_page(&[grade_row("6", "Fisica", None)]);
        assert_eq!(parse_grades(&page)[0].weight, 100);
    }

    #[test]
    fn weight_defaults_to_100_when_badge_has_no_digits() {
        let page = grades_page(&[grade_row("6", "Fisica", Some("peso"))]);
        assert_eq!(parse_grades(&page)[0].weight, 100);
    }

    #[test]
    fn badge_text_is_reduced_to_its_digits() {
        let page = grades_page(&[grade_row("6", "Fisica", Some("peso 50%"))]);
        assert_eq!(parse_grades(&page)[0].weight, 50);
    }

    #[test]
    fn skips_rows_with_non_numeric_grade() {
        let page = grades_page(&[
            grade_row("N/A", "Storia", None),
            grade_row("7", "Matematica", None),
        ]);
        let records = parse_grades(&page);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].subject, "Matematica");
    }

    #[test]
    fn skips_rows_without_bolded_grade() {
        let page = grades_page(&[
            r#"<tr data-tipo="voto"><td>8</td><td>12/03/2024</td><td><strong>Storia</strong></td></tr>"#.to_string(),
            grade_row("7", "Matematica", None),
        ]);
        assert_eq!(parse_grades(&page).len(), 1);
    }

    #[test]
    fn skips_rows_without_bolded_subject() {
        let page = grades_page(&[
            r#"<tr data-tipo="voto"><td><strong>8</strong></td><td>12/03/2024</td><td>Storia</td></tr>"#.to_string(),
        ]);
        assert!(parse_grades(&page).is_empty());
    }

    #[test]
    fn skips_rows_with_fewer_than_three_cells() {
        let page = grades_page(&[
            r#"<tr data-tipo="voto"><td><strong>8</strong></td><td>media</td></tr>"#.to_string(),
            grade_row("7", "Matematica", None),
        ]);
        assert_eq!(parse_grades(&page).len(), 1);
    }

    #[test]
    fn ignores_rows_without_the_grade_marker() {
        let page = grades_page(&[
            r#"<tr><td><strong>8</strong></td><td>12/03/2024</td><td><strong>Storia</strong></td></tr>"#.to_string(),
        ]);
        assert!(parse_grades(&page).is_empty());
    }

    #[test]
    fn empty_page_yields_empty_list() {
        let page = grades_page(&[]);
        assert!(parse_grades(&page).is_empty());
    }

    #[test]
    fn page_title_is_trimmed() {
        let html = "<html><head><title>  Registro  </title></head><body></body></html>";
        assert_eq!(page_title(html), "Registro");
    }

    #[test]
    fn missing_title_reads_as_empty() {
        assert_eq!(page_title("<html><body></body></html>"), "");
    }

    #[test]
    fn login_page_is_detected_by_title() {
        let html = "<html><head><title>Login - Registro</title></head><body>anything</body></html>";
        assert!(is_login_page(html));
        assert!(!is_login_page(
            "<html><head><title>Registro</title></head><body></body></html>"
        ));
    }

    #[test]
    fn hidden_input_reads_value_by_name() {
        let html = r#"<html><body><form>
            <input type="hidden" name="current_key" value="abc123">
            <input type="hidden" name="current_user" value="4567">
        </form></body></html>"#;
        assert_eq!(hidden_input(html, "current_key").as_deref(), Some("abc123"));
        assert_eq!(hidden_input(html, "current_user").as_deref(), Some("4567"));
        assert_eq!(hidden_input(html, "missing"), None);
    }
}
