use crate::infra::seed_demo_site;
use chrono::{NaiveDate, TimeZone, Utc};
use clap::Args;
use polls_cms::content::{page_url, ContentTree, InMemoryContentTree, TreeError};
use polls_cms::error::AppError;
use polls_cms::polls::{
    cast_vote, listing, result_context, ListingPolicy, Viewer, VoteForm, VoteOutcome,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date the demo runs as (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());
    let now = today
        .and_hms_opt(12, 0, 0)
        .map(|noon| Utc.from_utc_datetime(&noon))
        .unwrap_or_else(Utc::now);

    let tree = InMemoryContentTree::default();
    let site = seed_demo_site(&tree, today)?;
    let drafts = site.questions.iter().filter(|page| !page.live).count();

    println!("Polls demo ({today})");
    let summaries = listing(
        &tree,
        &site.index,
        now,
        &Viewer::Anonymous,
        ListingPolicy::default(),
    )?;
    println!(
        "\n{} lists {} question(s) publicly ({} draft hidden)",
        page_url(&tree, &site.index)?,
        summaries.len(),
        drafts
    );
    for summary in &summaries {
        println!("  {} {} -> {}", summary.date, summary.title, summary.url);
    }

    let Some(first) = summaries.first() else {
        println!("\nNothing to vote on.");
        return Ok(());
    };
    let page = tree.page(first.id)?.ok_or(TreeError::NotFound)?;
    let polls = page.as_polls().ok_or(TreeError::NotFound)?;
    let choice = polls
        .ordered_choices()
        .first()
        .map(|choice| (choice.id, choice.choice_text.clone()))
        .ok_or(TreeError::NotFound)?;

    println!("\nVoting for '{}' on '{}'", choice.1, page.title);
    match cast_vote(&tree, &page, &first.url, VoteForm::for_choice(choice.0))? {
        VoteOutcome::Recorded { redirect, .. } => println!("  302 Found -> {redirect}"),
        VoteOutcome::MissingSelection(context) => {
            println!("  re-rendered: {}", context.error_message.unwrap_or_default())
        }
    }

    let page = tree.page(page.id)?.ok_or(TreeError::NotFound)?;
    let polls = page.as_polls().ok_or(TreeError::NotFound)?;
    let results = result_context(&tree, &page, polls, &first.url)?;
    println!("\nResults for '{}' ({} vote(s))", results.title, results.total_votes);
    for tally in &results.choices {
        println!("  {:<10} {}", tally.choice_text, tally.votes);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_runs_for_a_fixed_date() {
        let args = DemoArgs {
            today: NaiveDate::from_ymd_opt(2024, 3, 14),
        };
        run_demo(args).expect("demo completes");
    }
}
