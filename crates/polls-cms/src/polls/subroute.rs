/// Path suffix of the vote sub-route, relative to a question page URL.
pub const VOTE_ROUTE: &str = "vote/";
/// Path suffix of the result sub-route, relative to a question page URL.
pub const RESULT_ROUTE: &str = "result/";

/// Sub-routes a question page answers below its own URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollsSubroute {
    Index,
    Vote,
    Result,
}

impl PollsSubroute {
    /// Match the path segments left over after page resolution.
    pub fn parse(remainder: &[String]) -> Option<Self> {
        match remainder {
            [] => Some(PollsSubroute::Index),
            [segment] if segment == "vote" => Some(PollsSubroute::Vote),
            [segment] if segment == "result" => Some(PollsSubroute::Result),
            _ => None,
        }
    }

    /// Absolute URL of this sub-route for a page served at `page_url`.
    pub fn reverse(self, page_url: &str) -> String {
        match self {
            PollsSubroute::Index => page_url.to_string(),
            PollsSubroute::Vote => format!("{page_url}{VOTE_ROUTE}"),
            PollsSubroute::Result => format!("{page_url}{RESULT_ROUTE}"),
        }
    }
}
