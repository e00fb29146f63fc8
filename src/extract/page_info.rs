//! Pagination info extraction from list pages.

use crate::model::ListPageInfo;
use crate::query::{find_first, TreeNode, TreeQuery};

const PAGE_PATH_PREFIX: &str = "/predictions/page/";

/// Read the pagination facts off a list page.
///
/// The last-page number comes from the "go to last page" link inside the
/// pagination nav. A page without that link is the terminal page, so
/// `last_page` collapses to `index`; a link that exists but does not look
/// like a page address yields 0, which the crawler treats as unusable.
pub fn page_info<N: TreeNode>(root: N, index: u64) -> ListPageInfo {
    let last_link = find_first(root, &TreeQuery::new().tag("nav").attr("class", "pagination"))
        .and_then(|nav| find_first(nav, &TreeQuery::class("last")))
        .and_then(|last| find_first(last, &TreeQuery::new().tag("a")));

    let last_page = match last_link.and_then(|link| link.attr("href").map(str::to_owned)) {
        Some(href) => href
            .strip_prefix(PAGE_PATH_PREFIX)
            .and_then(|rest| rest.parse::<u64>().ok())
            .unwrap_or(0),
        None => index,
    };

    ListPageInfo { index, last_page }
}
