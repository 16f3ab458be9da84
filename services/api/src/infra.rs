use chrono::{Duration, NaiveDate};
use metrics_exporter_prometheus::PrometheusHandle;
use polls_cms::content::{
    Choice, ContentTree, HomePage, NewAuthor, NewPage, Page, PageContent, PollsIndexPage,
    PollsPage, RichText, TreeError,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

struct DemoQuestion {
    slug: &'static str,
    title: &'static str,
    days_from_today: i64,
    live: bool,
    choices: &'static [&'static str],
}

const DEMO_QUESTIONS: [DemoQuestion; 3] = [
    DemoQuestion {
        slug: "favourite-season",
        title: "Favourite season?",
        days_from_today: -2,
        live: true,
        choices: &["Spring", "Summer", "Autumn", "Winter"],
    },
    DemoQuestion {
        slug: "office-lunch",
        title: "What should we order for lunch?",
        days_from_today: -1,
        live: true,
        choices: &["Pizza", "Curry", "Salad"],
    },
    DemoQuestion {
        slug: "offsite",
        title: "Where should the offsite be?",
        days_from_today: 7,
        live: false,
        choices: &["Mountains", "Seaside"],
    },
];

/// Pages created by [`seed_demo_site`].
pub(crate) struct DemoSite {
    pub(crate) index: Page,
    pub(crate) questions: Vec<Page>,
}

/// Builds a home page, one listing page, an author, and three question pages
/// dated around `today`. The last question is future-dated and stays a draft.
pub(crate) fn seed_demo_site<T>(tree: &T, today: NaiveDate) -> Result<DemoSite, TreeError>
where
    T: ContentTree + ?Sized,
{
    let author = tree.insert_author(NewAuthor {
        name: "Ada Lovelace".to_string(),
        image: None,
    })?;

    let home = tree.insert(
        None,
        NewPage {
            title: "Home".to_string(),
            slug: "home".to_string(),
            live: true,
            content: PageContent::Home(HomePage {
                body: RichText::new("<p>Welcome to the polls site.</p>"),
            }),
        },
    )?;
    let index = tree.insert(
        Some(home.id),
        NewPage {
            title: "Polls".to_string(),
            slug: "polls".to_string(),
            live: true,
            content: PageContent::PollsIndex(PollsIndexPage {
                intro: RichText::new("<p>Tell us what you think.</p>"),
            }),
        },
    )?;

    let questions = DEMO_QUESTIONS
        .iter()
        .map(|question| {
            tree.insert(
                Some(index.id),
                NewPage {
                    title: question.title.to_string(),
                    slug: question.slug.to_string(),
                    live: question.live,
                    content: PageContent::Polls(PollsPage {
                        date: today + Duration::days(question.days_from_today),
                        authors: vec![author.id],
                        choices: question.choices.iter().map(|text| Choice::new(*text)).collect(),
                    }),
                },
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DemoSite { index, questions })
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
