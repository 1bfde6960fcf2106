use askama_actix::Template;
use sea_orm::{ConnectionTrait, DbErr, PaginatorTrait, SelectorTrait};
use serde::Deserialize;

/// Posts shown on one listing page.
pub const POSTS_PER_PAGE: u64 = 10;

const PAGINATOR_LOOK_AHEAD: i64 = 2;

/// The `?page=` query parameter. Kept as a string so junk values fall back to page 1.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn number(&self) -> u64 {
        parse_page_number(self.page.as_deref())
    }
}

/// One slice of an ordered result set.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually served.
    pub number: u64,
    pub num_pages: u64,
    /// Item count across all pages.
    pub count: u64,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_page_number(&self) -> Option<u64> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<u64> {
        self.has_previous().then(|| self.number - 1)
    }

    /// Navigation links for this page below `base_url`.
    pub fn paginator(&self, base_url: &str) -> Paginator {
        Paginator {
            base_url: base_url.to_owned(),
            this_page: self.number as i64,
            page_count: self.num_pages as i64,
        }
    }
}

/// Reads a page number. Anything that is not a positive integer is page 1.
pub fn parse_page_number(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1)
}

/// Clamps a requested page into `1..=num_pages`. There is always at least one page.
pub fn clamp_page(requested: u64, num_pages: u64) -> u64 {
    requested.clamp(1, num_pages.max(1))
}

/// Fetches page `requested` of `query`, clamped to the pages that exist.
pub async fn paginate<'db, C, S>(
    query: S,
    db: &'db C,
    requested: u64,
) -> Result<Page<<S::Selector as SelectorTrait>::Item>, DbErr>
where
    C: ConnectionTrait,
    S: PaginatorTrait<'db, C>,
{
    let paginator = query.paginate(db, POSTS_PER_PAGE);
    let totals = paginator.num_items_and_pages().await?;
    let num_pages = totals.number_of_pages.max(1);
    let number = clamp_page(requested, num_pages);
    let items = paginator.fetch_page(number - 1).await?;

    Ok(Page {
        items,
        number,
        num_pages,
        count: totals.number_of_items,
    })
}

/// A single entry of the page navigation.
#[derive(Debug, PartialEq, Eq)]
pub struct PageLink {
    pub number: i64,
    pub current: bool,
    /// Stands for skipped pages; `number` is meaningless.
    pub gap: bool,
}

/// [1] 2 3 ... 13
/// 1 2 [3] 4 5 ... 13
/// 1 ... 4 5 [6] 7 8 ... 13
/// 1 ... 9 10 [11] 12 13
#[derive(Debug)]
pub struct Paginator {
    pub base_url: String,
    pub this_page: i64,
    pub page_count: i64,
}

#[derive(Template)]
#[template(path = "util/paginator.html")]
struct PaginatorTemplate<'a> {
    paginator: &'a Paginator,
    links: Vec<PageLink>,
}

impl Paginator {
    pub fn has_pages(&self) -> bool {
        self.page_count > 1
    }

    /// Pages to render in order, with gaps where runs of pages are skipped.
    pub fn links(&self) -> Vec<PageLink> {
        let first = 1;
        let last = self.page_count.max(1);
        let window_start = (self.this_page - PAGINATOR_LOOK_AHEAD).max(first);
        let window_end = (self.this_page + PAGINATOR_LOOK_AHEAD).min(last);

        let mut numbers: Vec<i64> = Vec::new();
        numbers.push(first);
        numbers.extend(window_start..=window_end);
        numbers.push(last);
        numbers.sort_unstable();
        numbers.dedup();

        let mut links = Vec::with_capacity(numbers.len() + 2);
        let mut previous: Option<i64> = None;
        for number in numbers {
            if let Some(previous) = previous {
                if number - previous > 1 {
                    links.push(PageLink {
                        number: 0,
                        current: false,
                        gap: true,
                    });
                }
            }
            links.push(PageLink {
                number,
                current: number == self.this_page,
                gap: false,
            });
            previous = Some(number);
        }
        links
    }

    pub fn url_for(&self, number: &i64) -> String {
        format!("{}?page={}", self.base_url, number)
    }

    pub fn as_html(&self) -> String {
        if !self.has_pages() {
            return "".to_owned();
        }

        let template = PaginatorTemplate {
            paginator: self,
            links: self.links(),
        };
        let mut buffer = String::new();
        if template.render_into(&mut buffer).is_err() {
            "[Paginator Util Error]".to_owned()
        } else {
            buffer
        }
    }
}
