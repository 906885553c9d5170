//! HTML extraction for LinkedIn search/detail pages and GitHub README tables.
//!
//! Every function here is pure: it takes a raw HTML document and returns the
//! structured candidates found with a fixed set of CSS selectors tied to the
//! target site's markup.

use crate::filters::FilterCriteria;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

static JOB_CARD: Lazy<Selector> = Lazy::new(|| selector("main div ul li"));
static JOB_CARD_TITLE: Lazy<Selector> = Lazy::new(|| selector("span.screen-reader-text"));
static JOB_CARD_COMPANY: Lazy<Selector> =
    Lazy::new(|| selector("a.job-result-card__subtitle-link"));
static JOB_CARD_LINK: Lazy<Selector> = Lazy::new(|| selector("a.result-card__full-card-link"));
static CITY_CODE_INPUT: Lazy<Selector> = Lazy::new(|| selector(r#"input[name="f_PP"]"#));
static DETAIL_COMPANY: Lazy<Selector> = Lazy::new(|| selector("a.sub-nav-cta__optional-url"));
static DETAIL_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| selector("div.show-more-less-html__markup"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static README_ROW: Lazy<Selector> = Lazy::new(|| selector("article table tbody tr"));
static TABLE_CELL: Lazy<Selector> = Lazy::new(|| selector("td"));

/// Boundary after which LinkedIn apply URLs vary between scrapes of the same posting.
const REF_ID_MARKER: &str = "&refId";

/// A job card found on a LinkedIn search results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCard {
    pub company: String,
    pub title: String,
    pub link: String,
}

/// Company and description parsed from a LinkedIn job detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDetail {
    pub company: String,
    pub description: String,
}

/// `(company, title)` pairs already seen during one scraping session.
#[derive(Debug, Default)]
pub struct SeenJobs(HashSet<(String, String)>);

impl SeenJobs {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn contains(&self, company: &str, title: &str) -> bool {
        self.0.contains(&(company.to_string(), title.to_string()))
    }

    fn insert(&mut self, company: String, title: String) {
        self.0.insert((company, title));
    }
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_text(card: ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .map(text_of)
        .filter(|t| !t.is_empty())
}

/// Extract job cards whose title passes the criteria, skipping `(company, title)`
/// pairs already recorded in `seen`.
///
/// Cards missing a title, a company or the full-card link are skipped.
/// Results are in first-seen order.
pub fn extract_job_card_links(
    html: &str,
    criteria: &FilterCriteria,
    seen: &mut SeenJobs,
) -> Vec<JobCard> {
    let document = Html::parse_document(html);
    let mut cards = Vec::new();

    for card in document.select(&JOB_CARD) {
        let title = first_text(card, &JOB_CARD_TITLE);
        if let Some(ref t) = title {
            if !criteria.title_matches(t) {
                continue;
            }
        }
        let company = first_text(card, &JOB_CARD_COMPANY);

        let (Some(company), Some(title)) = (company, title) else {
            continue;
        };
        if seen.contains(&company, &title) {
            continue;
        }
        let Some(link) = card
            .select(&JOB_CARD_LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
        else {
            continue;
        };

        seen.insert(company.clone(), title.clone());
        cards.push(JobCard {
            company,
            title,
            link: link.to_string(),
        });
    }

    cards
}

/// Collect the LinkedIn city codes (`f_PP` form values) in first-seen order.
pub fn extract_city_codes(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&CITY_CODE_INPUT)
        .filter_map(|input| input.value().attr("value"))
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .unique()
        .collect()
}

/// Parse the company and description from a job detail page.
pub fn extract_job_detail(html: &str) -> Option<JobDetail> {
    let document = Html::parse_document(html);

    let company = document
        .select(&DETAIL_COMPANY)
        .next()?
        .value()
        .attr("title")?
        .trim()
        .to_string();
    if company.is_empty() {
        return None;
    }

    let description = document
        .select(&DETAIL_DESCRIPTION)
        .next()?
        .text()
        .collect::<Vec<_>>()
        .join(" ");

    Some(JobDetail {
        company,
        description,
    })
}

/// Find the first anchor pointing at LinkedIn's external apply redirect.
pub fn extract_external_apply_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.contains("externalApply"))
        .map(str::to_string)
}

/// Drop everything after the `&refId` marker, keeping the marker itself.
pub fn truncate_ref_id(link: &str) -> String {
    match link.find(REF_ID_MARKER) {
        Some(index) => link[..index + REF_ID_MARKER.len()].to_string(),
        None => link.to_string(),
    }
}

/// Walk the internship table of a GitHub README.
///
/// The first cell of each row names the company; every link in the row yields
/// one `(company, link)` pair. Absolute links are kept exactly as written;
/// relative links are resolved against `base_url`.
pub fn extract_github_table(html: &str, base_url: &Url) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let mut rows = Vec::new();

    for row in document.select(&README_ROW) {
        let cells: Vec<ElementRef<'_>> = row.select(&TABLE_CELL).collect();
        let Some(company) = cells.first().map(|cell| text_of(*cell)) else {
            continue;
        };
        if company.is_empty() {
            continue;
        }

        for cell in &cells {
            for anchor in cell.select(&ANCHOR) {
                let Some(href) = anchor.value().attr("href") else {
                    continue;
                };
                let href = href.trim();
                if href.is_empty() {
                    continue;
                }
                // Absolute links are kept verbatim so merged lines stay stable.
                if Url::parse(href).is_ok() {
                    rows.push((company.clone(), href.to_string()));
                } else if let Ok(resolved) = base_url.join(href) {
                    rows.push((company.clone(), resolved.to_string()));
                }
            }
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intern_criteria() -> FilterCriteria {
        FilterCriteria::new(&["intern".to_string()], &["senior".to_string()], &[], &[])
    }

    fn card(company: &str, title: &str, link: &str) -> String {
        format!(
            r#"<li>
                <a class="result-card__full-card-link" href="{link}">
                    <span class="screen-reader-text">{title}</span>
                </a>
                <h4><a class="job-result-card__subtitle-link" href="/company">{company}</a></h4>
            </li>"#
        )
    }

    fn search_page(cards: &[String]) -> String {
        format!(
            "<html><body><main><div><ul>{}</ul></div></main></body></html>",
            cards.concat()
        )
    }

    #[test]
    fn test_job_cards_dedup_in_first_seen_order() {
        let html = search_page(&[
            card("Acme", "Software Intern", "https://linkedin.com/jobs/1"),
            card("Beta", "Data Intern", "https://linkedin.com/jobs/2"),
            card("Acme", "Software Intern", "https://linkedin.com/jobs/3"),
            card("Gamma", "ML Intern", "https://linkedin.com/jobs/4"),
            card("Beta", "Data Intern", "https://linkedin.com/jobs/5"),
        ]);
        let mut seen = SeenJobs::default();
        let cards = extract_job_card_links(&html, &intern_criteria(), &mut seen);

        let links: Vec<_> = cards.iter().map(|c| c.link.as_str()).collect();
        assert_eq!(
            links,
            vec![
                "https://linkedin.com/jobs/1",
                "https://linkedin.com/jobs/2",
                "https://linkedin.com/jobs/4"
            ]
        );
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_job_cards_dedup_across_calls() {
        let first = search_page(&[card("Acme", "Software Intern", "https://l/1")]);
        let second = search_page(&[
            card("Acme", "Software Intern", "https://l/2"),
            card("Acme", "Hardware Intern", "https://l/3"),
        ]);
        let criteria = intern_criteria();
        let mut seen = SeenJobs::default();

        assert_eq!(extract_job_card_links(&first, &criteria, &mut seen).len(), 1);
        let cards = extract_job_card_links(&second, &criteria, &mut seen);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title, "Hardware Intern");
    }

    #[test]
    fn test_job_cards_filtered_by_title() {
        let html = search_page(&[
            card("Acme", "Senior Software Intern", "https://l/1"),
            card("Beta", "Software Engineer", "https://l/2"),
            card("Gamma", "Intern, Finance", "https://l/3"),
        ]);
        let cards = extract_job_card_links(&html, &intern_criteria(), &mut SeenJobs::default());
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].company, "Gamma");
    }

    #[test]
    fn test_job_cards_missing_parts_are_skipped() {
        let no_company = r#"<li><a class="result-card__full-card-link" href="https://l/1">
            <span class="screen-reader-text">Intern</span></a></li>"#;
        let no_title = r#"<li><a class="result-card__full-card-link" href="https://l/2"></a>
            <a class="job-result-card__subtitle-link">Acme</a></li>"#;
        let no_link = r#"<li><span class="screen-reader-text">Intern</span>
            <a class="job-result-card__subtitle-link">Beta</a></li>"#;
        let html = search_page(&[no_company.to_string(), no_title.to_string(), no_link.to_string()]);

        let mut seen = SeenJobs::default();
        let cards = extract_job_card_links(&html, &intern_criteria(), &mut seen);
        assert!(cards.is_empty());
        assert_eq!(seen.len(), 0);
    }

    #[test]
    fn test_job_cards_outside_main_are_ignored() {
        let html = format!(
            "<html><body><div><ul>{}</ul></div></body></html>",
            card("Acme", "Intern", "https://l/1")
        );
        assert!(extract_job_card_links(&html, &intern_criteria(), &mut SeenJobs::default()).is_empty());
    }

    #[test]
    fn test_city_codes_unique_in_order() {
        let html = r#"<form>
            <input type="checkbox" name="f_PP" value="104116203">
            <input type="checkbox" name="f_PP" value="100720695">
            <input type="checkbox" name="f_PP" value="104116203">
            <input type="checkbox" name="f_TPR" value="r86400">
            <input type="checkbox" name="f_PP">
        </form>"#;
        assert_eq!(extract_city_codes(html), vec!["104116203", "100720695"]);
    }

    #[test]
    fn test_city_codes_empty_page() {
        assert!(extract_city_codes("").is_empty());
    }

    #[test]
    fn test_job_detail() {
        let html = r#"<html><body>
            <a class="sub-nav-cta__optional-url" title="Acme Corp" href="/company/acme">Acme</a>
            <div class="show-more-less-html__markup">
                <p>Build <strong>Rust</strong> services.</p><p>Remote OK</p>
            </div>
        </body></html>"#;
        let detail = extract_job_detail(html).unwrap();
        assert_eq!(detail.company, "Acme Corp");
        assert_eq!(
            detail.description.split_whitespace().collect::<Vec<_>>().join(" "),
            "Build Rust services. Remote OK"
        );
    }

    #[test]
    fn test_job_detail_requires_both_elements() {
        let no_description =
            r#"<a class="sub-nav-cta__optional-url" title="Acme" href="/c">Acme</a>"#;
        let no_company = r#"<div class="show-more-less-html__markup">Text</div>"#;
        let no_title_attr = r#"<a class="sub-nav-cta__optional-url" href="/c">Acme</a>
            <div class="show-more-less-html__markup">Text</div>"#;
        assert_eq!(extract_job_detail(no_description), None);
        assert_eq!(extract_job_detail(no_company), None);
        assert_eq!(extract_job_detail(no_title_attr), None);
    }

    #[test]
    fn test_external_apply_link() {
        let html = r#"<a href="/jobs/view/1">View</a>
            <a href="https://www.linkedin.com/jobs/view/externalApply/1?url=x&amp;refId=abc">Apply</a>
            <a href="https://www.linkedin.com/jobs/view/externalApply/2">Other</a>"#;
        assert_eq!(
            extract_external_apply_link(html).as_deref(),
            Some("https://www.linkedin.com/jobs/view/externalApply/1?url=x&refId=abc")
        );
        assert_eq!(extract_external_apply_link(r#"<a href="/jobs">x</a>"#), None);
    }

    #[test]
    fn test_truncate_ref_id() {
        assert_eq!(
            truncate_ref_id("https://l.co/apply?x=1&refId=abcxyz&other=2"),
            "https://l.co/apply?x=1&refId"
        );
        assert_eq!(truncate_ref_id("https://l.co/apply?x=1"), "https://l.co/apply?x=1");
    }

    #[test]
    fn test_truncate_ref_id_is_stable_across_scrapes() {
        let a = truncate_ref_id("https://l.co/apply?x=1&refId=first&trk=a");
        let b = truncate_ref_id("https://l.co/apply?x=1&refId=second&trk=b");
        assert_eq!(a, b);
    }

    #[test]
    fn test_github_table() {
        let html = r#"<article><table>
            <thead><tr><th>Name</th><th>Location</th><th>Notes</th></tr></thead>
            <tbody>
                <tr><td><a href="https://a.co/apply">Acme</a></td><td>NYC</td><td></td></tr>
                <tr><td>Beta</td><td><a href="https://b.co/1">SF</a></td>
                    <td><a href="https://b.co/2">Seattle</a></td></tr>
                <tr><td></td><td><a href="https://orphan.co">x</a></td></tr>
            </tbody>
        </table></article>"#;
        let base = Url::parse("https://github.com/pittcsc/Summer2021-Internships").unwrap();
        let rows = extract_github_table(html, &base);
        assert_eq!(
            rows,
            vec![
                ("Acme".to_string(), "https://a.co/apply".to_string()),
                ("Beta".to_string(), "https://b.co/1".to_string()),
                ("Beta".to_string(), "https://b.co/2".to_string()),
            ]
        );
    }

    #[test]
    fn test_github_table_resolves_relative_links() {
        let html = r#"<article><table><tbody>
            <tr><td>Acme</td><td><a href="/acme/jobs">Apply</a></td></tr>
        </tbody></table></article>"#;
        let base = Url::parse("https://github.com/org/repo").unwrap();
        assert_eq!(
            extract_github_table(html, &base),
            vec![("Acme".to_string(), "https://github.com/acme/jobs".to_string())]
        );
    }

    #[test]
    fn test_github_table_keeps_absolute_links_verbatim() {
        let html = r##"<article><table><tbody>
            <tr><td>Acme</td>
                <td><a href="https://a.co">Site</a></td>
                <td><a href=" https://b.co/Jobs?q=a b ">Search</a></td>
                <td><a href="#notes">Notes</a></td></tr>
        </tbody></table></article>"##;
        let base = Url::parse("https://github.com/org/repo").unwrap();
        assert_eq!(
            extract_github_table(html, &base),
            vec![
                ("Acme".to_string(), "https://a.co".to_string()),
                ("Acme".to_string(), "https://b.co/Jobs?q=a b".to_string()),
                ("Acme".to_string(), "https://github.com/org/repo#notes".to_string()),
            ]
        );
    }
}
